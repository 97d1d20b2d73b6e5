use std::ops::RangeInclusive;

use ratatui::{
    Frame,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};

use super::layout::CellKind;
use super::{BufferSink, Colors, CursorState, RenderSink};
use crate::app::{CursorTarget, HexEdit};
use crate::control::Control;
use crate::encoding::{self, PLACEHOLDER};

/// 16進表示ウィジェット
pub struct HexView<'a> {
    /// 表示するウィジェット
    edit: &'a HexEdit,
}

impl<'a> HexView<'a> {
    pub fn new(edit: &'a HexEdit) -> Self {
        Self { edit }
    }

    /// バイト値に応じた色を取得
    fn byte_color(&self, byte: u8) -> Color {
        if self.edit.read_only() {
            return Colors::READ_ONLY;
        }
        match byte {
            0x00 => Colors::HEX_ZERO,
            0xFF => Colors::HEX_HIGH,
            0x20..=0x7E => Colors::HEX_PRINTABLE,
            _ => Colors::HEX_NORMAL,
        }
    }

    /// 選択範囲内なら背景色を付ける
    fn decorate(&self, style: Style, byte_offset: usize) -> Style {
        let selected = self
            .edit
            .selection()
            .range()
            .is_some_and(|range| range.contains(&byte_offset));
        if selected {
            style.bg(Colors::SELECTION_BG)
        } else {
            style
        }
    }

    /// 1セルの文字とスタイル
    fn cell_content(&self, line: usize, column: usize, offset_text: &[char]) -> (char, Style) {
        let geometry = self.edit.geometry();
        let data = self.edit.bytes();
        let info = geometry.cell_kind(line, column, data.len());

        match info.kind {
            CellKind::Offset => (
                offset_text.get(column).copied().unwrap_or(' '),
                Style::default().fg(Colors::OFFSET),
            ),
            CellKind::Whitespace => (' ', Style::default()),
            CellKind::HexDigitPadding if geometry.is_word_separator(column) => {
                // 区切りの左の桁が有効なら表示
                if !geometry.cell_kind(line, column - 1, data.len()).beyond_buffer_end {
                    ('`', Style::default().fg(Colors::SEPARATOR))
                } else {
                    (' ', Style::default())
                }
            }
            CellKind::HexDigitPadding => (' ', Style::default()),
            CellKind::HexDigit {
                byte_offset,
                bit_shift,
            } => {
                if info.beyond_buffer_end {
                    return (' ', Style::default());
                }
                let pos = byte_offset + (bit_shift / 8) as usize;
                let byte = data[pos];
                let nibble = byte >> (bit_shift % 8);
                let style = Style::default().fg(self.byte_color(byte));
                (encoding::nibble_char(nibble), self.decorate(style, pos))
            }
            CellKind::CharValue { byte_offset } => {
                if info.beyond_buffer_end {
                    return (' ', Style::default());
                }
                let byte = data[byte_offset];
                let ch = encoding::display_char(byte);
                let mut style = Style::default().fg(Colors::CHAR_NORMAL);
                if ch == PLACEHOLDER && byte != b'.' {
                    style = style.add_modifier(Modifier::DIM);
                }
                (ch, self.decorate(style, byte_offset))
            }
        }
    }

    /// 表示行 `row` を描画
    fn paint_row(&self, row: u16, sink: &mut dyn RenderSink) {
        let (left, top) = self.edit.viewport();
        let line = top + usize::from(row);
        let width = self.edit.area().width;

        if line >= self.edit.lines_populated() {
            for column in 0..width {
                sink.set_cell(column, row, ' ', Style::default());
            }
            return;
        }

        let geometry = self.edit.geometry();
        let offset = (line * geometry.bytes_per_line()) as u64;
        let offset_text: Vec<char> = geometry.offset_style().format(offset).chars().collect();
        for column in 0..width {
            let (ch, style) = self.cell_content(line, left + usize::from(column), &offset_text);
            sink.set_cell(column, row, ch, style);
        }
    }

    /// 再描画範囲の行を描画し、カーソルを設定する
    pub fn paint(&self, dirty: Option<RangeInclusive<usize>>, sink: &mut dyn RenderSink) {
        let (left, top) = self.edit.viewport();
        let area = self.edit.area();

        if let Some(dirty) = dirty {
            for row in 0..area.height {
                if dirty.contains(&(top + usize::from(row))) {
                    self.paint_row(row, sink);
                }
            }
        }

        let (line, column) = self.edit.cursor_cell();
        let visible = line >= top
            && column >= left
            && line - top < usize::from(area.height)
            && column - left < usize::from(area.width);
        let (column, row) = if visible {
            // 表示領域内なので u16 に収まる
            ((column - left) as u16, (line - top) as u16)
        } else {
            (0, 0)
        };
        sink.set_cursor(visible, self.edit.cursor_shape(), column, row);
    }

    /// カーソルの位置にある値（ステータス表示用）
    pub fn cursor_value(&self) -> Option<u8> {
        let offset = match self.edit.cursor_target() {
            CursorTarget::Hex { word, shift } => word + (shift / 8) as usize,
            CursorTarget::Char { offset } => offset,
        };
        self.edit.bytes().get(offset).copied()
    }
}

impl Widget for HexView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // ウィジェットの表示領域とずれていても描画先に合わせる
        let area = area.intersection(self.edit.area());
        let mut sink = BufferSink::new(buf, area);
        self.paint(Some(0..=usize::MAX), &mut sink);
    }
}

/// コントロールをフレームに描画し、カーソルの状態を返す
///
/// ratatui はフレーム間の差分を自分で取るので、毎回全体を描く。
pub fn draw(frame: &mut Frame, control: &mut dyn Control, area: Rect) -> Option<CursorState> {
    control.set_area(area);
    control.invalidate();
    let mut sink = BufferSink::new(frame.buffer_mut(), area);
    control.paint(&mut sink);
    let cursor = sink.cursor();
    let position = sink.cursor_position();
    if let Some(position) = position {
        frame.set_cursor_position(position);
    }
    cursor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{HexEditOptions, Motion};
    use crate::ui::CellGrid;
    use crate::ui::layout::OffsetStyle;

    fn editor(data: &[u8], bytes_per_word: usize, offset_style: OffsetStyle) -> HexEdit {
        let mut edit = HexEdit::new(HexEditOptions {
            bytes_per_word,
            offset_style,
            ..HexEditOptions::default()
        })
        .unwrap();
        edit.set_data(data);
        edit.set_area(Rect::new(0, 0, 80, 4));
        edit
    }

    fn paint(edit: &mut HexEdit) -> CellGrid {
        let mut grid = CellGrid::new(80, 4);
        Control::paint(edit, &mut grid);
        grid
    }

    #[test]
    fn test_paints_offset_hex_and_chars() {
        let mut edit = editor(b"AB\x00", 1, OffsetStyle::Bits32);
        let grid = paint(&mut edit);
        assert_eq!(
            grid.row_text(0).trim_end(),
            "00000000  41 42 00                                        AB."
        );
        assert_eq!(grid.row_text(1).trim_end(), "");
    }

    #[test]
    fn test_word_groups_are_little_endian() {
        let mut edit = editor(&[0x01, 0x02, 0x03, 0x04], 4, OffsetStyle::None);
        let grid = paint(&mut edit);
        assert!(grid.row_text(0).starts_with(" 04030201"));
    }

    #[test]
    fn test_partial_word_pads_missing_bytes() {
        let mut edit = editor(&[0xAA, 0xBB, 0xCC], 4, OffsetStyle::None);
        let grid = paint(&mut edit);
        assert!(grid.row_text(0).starts_with("   CCBBAA"));
    }

    #[test]
    fn test_eight_byte_words_show_separator() {
        let data: Vec<u8> = (1..=8).collect();
        let mut edit = editor(&data, 8, OffsetStyle::Bits64);
        let grid = paint(&mut edit);
        assert!(grid.row_text(0).starts_with("00000000`00000000  08070605`04030201"));
    }

    #[test]
    fn test_only_dirty_lines_are_repainted() {
        let mut edit = editor(&[0u8; 64], 1, OffsetStyle::Bits32);
        paint(&mut edit);

        edit.set_cursor_location(false, 33, 4).unwrap();
        edit.take_dirty();
        edit.input_char('F').unwrap();
        let grid = paint(&mut edit);
        assert_eq!(grid.touched_rows(), vec![2]);
        assert!(grid.row_text(2).contains("F0"));
    }

    #[test]
    fn test_cursor_follows_viewport() {
        let mut edit = editor(&[0u8; 256], 1, OffsetStyle::Bits32);
        let grid = paint(&mut edit);
        let cursor = grid.cursor().unwrap();
        assert!(cursor.visible);
        assert_eq!((cursor.column, cursor.row), (10, 0));
        assert_eq!(cursor.shape_percent, 100);

        edit.move_cursor(Motion::PageDown);
        let grid = paint(&mut edit);
        let cursor = grid.cursor().unwrap();
        assert_eq!(edit.viewport(), (0, 4));
        assert_eq!((cursor.column, cursor.row), (10, 0));

        edit.set_viewport(0, 0);
        let grid = paint(&mut edit);
        assert!(!grid.cursor().unwrap().visible);
    }

    #[test]
    fn test_selection_is_highlighted() {
        let mut edit = editor(&[0u8; 16], 1, OffsetStyle::None);
        edit.set_selection_range(1..2).unwrap();
        let grid = paint(&mut edit);
        let geometry = edit.geometry();
        let (_, hex_column) = geometry.cell_from_hex_offset(1, 4);
        let (_, char_column) = geometry.cell_from_char_offset(1);
        for column in [hex_column, char_column] {
            let cell = grid.cell(column as u16, 0).unwrap();
            assert_eq!(cell.style.bg, Some(Colors::SELECTION_BG));
        }
        let (_, other) = geometry.cell_from_char_offset(2);
        assert_eq!(grid.cell(other as u16, 0).unwrap().style.bg, None);
    }

    #[test]
    fn test_widget_renders_into_buffer() {
        let edit = editor(b"hi", 1, OffsetStyle::None);
        let area = Rect::new(0, 0, 80, 4);
        let mut buf = Buffer::empty(area);
        HexView::new(&edit).render(area, &mut buf);
        let char_column = edit.geometry().char_start() as u16;
        assert_eq!(buf[(char_column, 0)].symbol(), "h");
        assert_eq!(buf[(char_column + 1, 0)].symbol(), "i");
    }
}
