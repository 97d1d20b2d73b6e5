use std::ops::Range;

use super::cursor::CursorTarget;
use super::{EditError, HexEdit, Motion};

/// 選択状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Inactive,
    KeyboardFromTop,
    KeyboardFromBottom,
    MouseFromTop,
    MouseFromBottom,
    /// マウスボタンを離した後
    MouseComplete,
}

/// 選択範囲 `[first, beyond_last)`
///
/// 動かない側がアンカー。`*FromTop` なら `first`、`*FromBottom` なら `beyond_last`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    state: SelectionState,
    first: usize,
    beyond_last: usize,
    /// `MouseComplete` のアンカーが `beyond_last` 側か（上向きにドラッグした）
    from_bottom: bool,
}

impl Selection {
    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn first(&self) -> usize {
        self.first
    }

    pub fn beyond_last(&self) -> usize {
        self.beyond_last
    }

    pub fn is_active(&self) -> bool {
        self.state != SelectionState::Inactive
    }

    pub fn is_keyboard(&self) -> bool {
        matches!(
            self.state,
            SelectionState::KeyboardFromTop | SelectionState::KeyboardFromBottom
        )
    }

    /// マウスでドラッグ中
    pub fn is_mouse_dragging(&self) -> bool {
        matches!(
            self.state,
            SelectionState::MouseFromTop | SelectionState::MouseFromBottom
        )
    }

    /// 空でない選択範囲
    pub fn range(&self) -> Option<Range<usize>> {
        (self.is_active() && self.first < self.beyond_last).then_some(self.first..self.beyond_last)
    }

    /// `offset` から選択を開始する（空のバッファでは何もしない）
    ///
    /// 別の種類の選択があれば先に解除される。開始直後は幅0で、キーボード選択は
    /// 続く `extend` で幅を持つか解除される。
    pub fn start(&mut self, offset: usize, mouse: bool, valid: usize) {
        if valid == 0 {
            return;
        }
        let offset = offset.min(valid);
        *self = Self {
            state: if mouse {
                SelectionState::MouseFromTop
            } else {
                SelectionState::KeyboardFromTop
            },
            first: offset,
            beyond_last: offset,
            from_bottom: false,
        };
        log::trace!("selection started at {offset:#x} ({:?})", self.state);
        assert!(self.first <= self.beyond_last && self.beyond_last <= valid);
    }

    /// アンカーから `offset` まで選択を伸ばす
    pub fn extend(&mut self, offset: usize, mouse: bool, valid: usize) {
        if !self.is_active() {
            return;
        }
        let offset = offset.min(valid);
        let anchor = match self.state {
            SelectionState::KeyboardFromTop | SelectionState::MouseFromTop => self.first,
            SelectionState::MouseComplete if !self.from_bottom => self.first,
            _ => self.beyond_last,
        };

        if offset < anchor {
            self.state = if mouse {
                SelectionState::MouseFromBottom
            } else {
                SelectionState::KeyboardFromBottom
            };
            self.first = offset;
            self.beyond_last = anchor;
        } else if offset > anchor {
            self.state = if mouse {
                SelectionState::MouseFromTop
            } else {
                SelectionState::KeyboardFromTop
            };
            self.first = anchor;
            self.beyond_last = offset;
        } else if mouse {
            // ドラッグ中は幅0のまま続ける
            self.state = SelectionState::MouseFromTop;
            self.first = anchor;
            self.beyond_last = anchor;
        } else {
            self.clear();
            return;
        }
        log::trace!(
            "selection {:?} [{:#x}, {:#x})",
            self.state,
            self.first,
            self.beyond_last
        );
        self.check_invariant(valid);
    }

    /// マウスボタンを離した
    pub fn finish_mouse(&mut self, valid: usize) {
        if !self.is_mouse_dragging() {
            return;
        }
        if self.first >= self.beyond_last {
            self.clear();
        } else {
            self.from_bottom = self.state == SelectionState::MouseFromBottom;
            self.state = SelectionState::MouseComplete;
        }
        self.check_invariant(valid);
    }

    /// 範囲を直接設定（空なら解除）
    pub fn set_range(&mut self, range: Range<usize>, valid: usize) {
        if range.start >= range.end {
            self.clear();
            return;
        }
        self.state = SelectionState::KeyboardFromTop;
        self.first = range.start;
        self.beyond_last = range.end;
        self.from_bottom = false;
        self.check_invariant(valid);
    }

    /// 有効長が縮んだときに範囲を詰める
    pub fn clamp_to(&mut self, valid: usize) {
        if !self.is_active() {
            return;
        }
        self.beyond_last = self.beyond_last.min(valid);
        self.first = self.first.min(self.beyond_last);
        if self.first >= self.beyond_last && !self.is_mouse_dragging() {
            self.clear();
        }
        self.check_invariant(valid);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn check_invariant(&self, valid: usize) {
        match self.state {
            SelectionState::Inactive => {}
            SelectionState::MouseFromTop | SelectionState::MouseFromBottom => assert!(
                self.first <= self.beyond_last && self.beyond_last <= valid,
                "selection invariant violated: {self:?} valid={valid}"
            ),
            _ => assert!(
                self.first < self.beyond_last && self.beyond_last <= valid,
                "selection invariant violated: {self:?} valid={valid}"
            ),
        }
    }
}

impl HexEdit {
    /// 選択状態
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// 選択中かどうか
    pub fn selection_active(&self) -> bool {
        self.selection.range().is_some()
    }

    /// 選択範囲のデータ
    pub fn selected_data(&self) -> Option<Vec<u8>> {
        let range = self.selection.range()?;
        Some(self.buffer.range(range.start, range.end).to_vec())
    }

    /// 選択範囲を設定 `[start, end)`（空の範囲は解除）
    pub fn set_selection_range(&mut self, range: Range<usize>) -> Result<(), EditError> {
        let valid = self.buffer.len();
        if range.end > valid || range.start > range.end {
            return Err(EditError::OutOfRange {
                offset: range.end.max(range.start),
                valid,
            });
        }
        self.update_selection(|sel, valid| sel.set_range(range, valid));
        Ok(())
    }

    /// 選択解除
    pub fn clear_selection(&mut self) -> bool {
        let was_active = self.selection.is_active();
        self.update_selection(|sel, _| sel.clear());
        was_active
    }

    /// 全選択
    pub fn select_all(&mut self) -> bool {
        let valid = self.buffer.len();
        if valid == 0 {
            return false;
        }
        self.update_selection(|sel, valid| sel.set_range(0..valid, valid));
        true
    }

    /// Shift+移動: カーソルを動かして選択を伸ばす
    pub fn select_move(&mut self, motion: Motion) -> bool {
        let before = self.cursor_target();
        if !self.move_cursor(motion) {
            return false;
        }
        let after = self.cursor_target();
        let anchor = Self::target_offset(before);
        let offset = self.keyboard_selection_offset(after, motion.is_forward());

        self.update_selection(|sel, valid| {
            if !sel.is_keyboard() {
                sel.start(anchor, false, valid);
            }
            sel.extend(offset, false, valid);
        });
        true
    }

    /// キーボード選択の端
    ///
    /// 後方へ動かしていて語の最上位ニブルを越えていれば、その語全体を含める。
    fn keyboard_selection_offset(&self, target: CursorTarget, forward: bool) -> usize {
        let offset = match target {
            CursorTarget::Hex { word, shift }
                if forward && shift != self.geometry.max_bit_shift() =>
            {
                word + self.geometry.bytes_per_word()
            }
            other => Self::target_offset(other),
        };
        offset.min(self.buffer.len())
    }

    /// 選択を変更し、変化した行を再描画対象にする
    pub(super) fn update_selection(&mut self, change: impl FnOnce(&mut Selection, usize)) {
        let before = self.selection.range();
        change(&mut self.selection, self.buffer.len());
        let after = self.selection.range();
        if before != after {
            for range in [before, after].into_iter().flatten() {
                self.mark_bytes_dirty(range.start, range.end);
            }
        }
    }
}
