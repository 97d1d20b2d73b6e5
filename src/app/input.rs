use std::time::Instant;

use crossterm::event::{
    KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use super::cursor::CursorTarget;
use super::timer::AUTO_SCROLL_INTERVAL;
use super::{Action, EditError, HexEdit, KeyMod};
use crate::control::Control;
use crate::ui::RenderSink;
use crate::ui::hex_view::HexView;
use crate::ui::layout::CellKind;

/// ホイール1回のスクロール行数
pub const WHEEL_LINES: usize = 3;

/// 編集結果をイベント処理用に変換（エラーは何もしなかった扱い）
fn swallow(result: Result<bool, EditError>) -> bool {
    match result {
        Ok(changed) => changed,
        Err(EditError::ReadOnly) => {
            log::debug!("edit ignored: buffer is read-only");
            false
        }
        Err(e) => {
            log::warn!("edit failed: {e}");
            false
        }
    }
}

impl HexEdit {
    /// アクションを実行。表示が変わりうるなら true
    pub fn execute(&mut self, action: Action) -> bool {
        match action {
            Action::Move(motion) => {
                let cleared = self.clear_selection();
                self.move_cursor(motion) || cleared
            }
            Action::Select(motion) => self.select_move(motion),
            Action::SelectAll => self.select_all(),
            Action::ClearSelection => self.clear_selection(),
            Action::InputChar(ch) => swallow(self.input_char(ch)),
            Action::Delete => swallow(self.delete()),
            Action::Backspace => swallow(self.backspace()),
            Action::ToggleSide => {
                self.clear_selection();
                self.toggle_side()
            }
            Action::ToggleEditMode => {
                self.toggle_edit_mode();
                true
            }
            Action::Copy => self.copy(),
            Action::Cut => swallow(self.cut()),
            Action::Paste => swallow(self.paste()),
            Action::None => false,
        }
    }

    /// 表示セル (行, 列) に対応するカーソル位置
    ///
    /// 空白や区切りの上なら最も近い同じ欄のセルに寄せる。
    fn target_at_cell(&self, line: usize, column: usize) -> CursorTarget {
        let valid = self.buffer.len();
        let bpl = self.geometry.bytes_per_line();
        let max_shift = self.geometry.max_bit_shift();

        let target = match self.geometry.cell_kind(line, column, valid).kind {
            CellKind::HexDigit {
                byte_offset,
                bit_shift,
            } => CursorTarget::Hex {
                word: byte_offset,
                shift: bit_shift,
            },
            CellKind::CharValue { byte_offset } => CursorTarget::Char {
                offset: byte_offset,
            },
            CellKind::HexDigitPadding if column < self.geometry.hex_end() => {
                // 語頭の空白か8バイト語の区切り: 次の桁
                match self.geometry.cell_kind(line, column + 1, valid).kind {
                    CellKind::HexDigit {
                        byte_offset,
                        bit_shift,
                    } => CursorTarget::Hex {
                        word: byte_offset,
                        shift: bit_shift,
                    },
                    _ => CursorTarget::Hex {
                        word: line * bpl,
                        shift: max_shift,
                    },
                }
            }
            CellKind::HexDigitPadding => CursorTarget::Hex {
                word: line * bpl + bpl - self.geometry.bytes_per_word(),
                shift: 0,
            },
            CellKind::Offset => CursorTarget::Hex {
                word: line * bpl,
                shift: max_shift,
            },
            CellKind::Whitespace if column < self.geometry.hex_start() => CursorTarget::Hex {
                word: line * bpl,
                shift: max_shift,
            },
            CellKind::Whitespace => CursorTarget::Char {
                offset: line * bpl + bpl - 1,
            },
        };
        self.clamp_target(target)
    }

    /// 表示領域内の相対位置 (列, 行) のセル
    fn target_at_point(&self, column: i32, row: i32) -> CursorTarget {
        let max_column = i32::from(self.area.width.max(1)) - 1;
        let max_row = i32::from(self.area.height.max(1)) - 1;
        // 範囲は上で制限済みなので負にならない
        let column = column.clamp(0, max_column) as usize;
        let row = row.clamp(0, max_row) as usize;
        self.target_at_cell(self.top + row, self.left + column)
    }

    /// マウス位置を表示領域からの相対位置に変換
    fn relative_point(&self, mouse: &MouseEvent) -> (i32, i32) {
        (
            i32::from(mouse.column) - i32::from(self.area.x),
            i32::from(mouse.row) - i32::from(self.area.y),
        )
    }

    fn point_inside(&self, (column, row): (i32, i32)) -> bool {
        column >= 0
            && row >= 0
            && column < i32::from(self.area.width)
            && row < i32::from(self.area.height)
    }

    /// 左ボタン押下
    fn mouse_down(&mut self, point: (i32, i32), shift: bool) -> bool {
        if !self.point_inside(point) {
            return false;
        }
        let target = self.target_at_point(point.0, point.1);
        let anchor = Self::target_offset(self.cursor_target());
        let offset = Self::target_offset(target);

        self.update_selection(|sel, valid| {
            if shift && sel.is_active() {
                sel.extend(offset, true, valid);
            } else if shift {
                sel.start(anchor, true, valid);
                sel.extend(offset, true, valid);
            } else {
                sel.clear();
                sel.start(offset, true, valid);
            }
        });
        if target != self.cursor_target() {
            self.place_cursor(target);
        }
        self.drag = Some(point);
        true
    }

    /// ドラッグ中の位置まで選択を伸ばす
    fn drag_to(&mut self, point: (i32, i32)) -> bool {
        let target = self.target_at_point(point.0, point.1);
        let offset = Self::target_offset(target);
        let before = self.selection;
        self.update_selection(|sel, valid| sel.extend(offset, true, valid));
        let moved = target != self.cursor_target();
        if moved {
            self.place_cursor(target);
        }
        moved || before != self.selection
    }

    fn mouse_drag(&mut self, point: (i32, i32)) -> bool {
        if self.drag.is_none() || !self.selection.is_mouse_dragging() {
            return false;
        }
        self.drag = Some(point);
        if self.point_inside(point) {
            self.scheduler.cancel();
        } else if !self.scheduler.is_armed() {
            log::trace!("auto-scroll armed");
            self.scheduler.arm(AUTO_SCROLL_INTERVAL, Instant::now());
        }
        self.drag_to(point)
    }

    fn mouse_up(&mut self) -> bool {
        if self.drag.take().is_none() {
            return false;
        }
        self.scheduler.cancel();
        self.update_selection(|sel, valid| sel.finish_mouse(valid));
        true
    }

    /// ホイールスクロール
    fn scroll_lines(&mut self, up: bool) -> bool {
        let top = if up {
            self.top.saturating_sub(WHEEL_LINES)
        } else {
            self.top + WHEEL_LINES
        };
        self.set_viewport(self.left, top)
    }

    /// 自動スクロール1回分
    fn auto_scroll(&mut self) -> bool {
        let Some((column, row)) = self.drag else {
            self.scheduler.cancel();
            return false;
        };
        let mut top = self.top;
        let mut left = self.left;
        if row < 0 {
            top = top.saturating_sub(1);
        } else if row >= i32::from(self.area.height) {
            top += 1;
        }
        if column < 0 {
            left = left.saturating_sub(1);
        } else if column >= i32::from(self.area.width) {
            left += 1;
        }
        let scrolled = self.set_viewport(left, top);
        self.drag_to((column, row)) || scrolled
    }
}

impl Control for HexEdit {
    fn area(&self) -> ratatui::layout::Rect {
        HexEdit::area(self)
    }

    fn set_area(&mut self, area: ratatui::layout::Rect) {
        HexEdit::set_area(self, area);
    }

    fn invalidate(&mut self) {
        HexEdit::invalidate(self);
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
            return false;
        }
        let mods = KeyMod {
            ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
            shift: key.modifiers.contains(KeyModifiers::SHIFT),
            alt: key.modifiers.contains(KeyModifiers::ALT),
        };
        self.execute(Action::from_key(key.code, mods))
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> bool {
        let point = self.relative_point(&mouse);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.mouse_down(point, mouse.modifiers.contains(KeyModifiers::SHIFT))
            }
            MouseEventKind::Drag(MouseButton::Left) => self.mouse_drag(point),
            MouseEventKind::Up(MouseButton::Left) => self.mouse_up(),
            MouseEventKind::ScrollUp if self.point_inside(point) => self.scroll_lines(true),
            MouseEventKind::ScrollDown if self.point_inside(point) => self.scroll_lines(false),
            _ => false,
        }
    }

    fn next_timer_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    fn on_timer_tick(&mut self, now: Instant) -> bool {
        if !self.scheduler.poll(now) {
            return false;
        }
        self.auto_scroll()
    }

    fn paint(&mut self, sink: &mut dyn RenderSink) {
        let dirty = self.take_dirty();
        HexView::new(self).paint(dirty, sink);
    }
}
