use super::cursor::CursorTarget;
use super::{EditError, EditMode, HexEdit};
use crate::encoding;

impl HexEdit {
    fn check_writable(&self) -> Result<(), EditError> {
        if self.read_only {
            Err(EditError::ReadOnly)
        } else {
            Ok(())
        }
    }

    fn check_offset(&self, offset: usize) -> Result<(), EditError> {
        let valid = self.buffer.len();
        if offset > valid {
            Err(EditError::OutOfRange { offset, valid })
        } else {
            Ok(())
        }
    }

    /// カーソル位置に1文字入力（HEX欄ならニブル、文字欄なら1バイト）
    ///
    /// 入力できない文字は何もせず `Ok(false)` を返す。
    pub fn input_char(&mut self, ch: char) -> Result<bool, EditError> {
        self.check_writable()?;
        match self.cursor_target() {
            CursorTarget::Hex { word, shift } => self.input_hex(word, shift, ch),
            CursorTarget::Char { offset } => self.input_byte(offset, ch),
        }
    }

    /// 16進1桁を入力
    fn input_hex(&mut self, word: usize, shift: u32, ch: char) -> Result<bool, EditError> {
        let Some(nibble) = encoding::hex_digit_value(ch) else {
            return Ok(false);
        };
        let byte = word + (shift / 8) as usize;
        let current = CursorTarget::Hex { word, shift };

        if self.edit_mode == EditMode::Insert && shift == self.geometry.max_bit_shift() {
            // 語の最上位桁では、先に1語分のゼロを挿入する
            let zeros = vec![0u8; self.geometry.bytes_per_word()];
            self.buffer.insert(word, &zeros)?;
            self.mark_dirty_from(word);
        } else if byte >= self.buffer.len() {
            self.buffer.grow_to(byte + 1)?;
            self.mark_dirty_from(word);
        } else {
            self.mark_bytes_dirty(byte, byte + 1);
        }
        self.buffer.set_nibble(byte, shift % 8, nibble)?;

        self.clear_selection();
        self.after_edit();
        if let Some(next) = self.next_cell_same_type(current) {
            self.place_cursor(next);
        }
        Ok(true)
    }

    /// 文字欄に1バイト入力
    fn input_byte(&mut self, offset: usize, ch: char) -> Result<bool, EditError> {
        let Some(value) = encoding::char_to_byte(ch) else {
            log::trace!("ignored non Latin-1 input {ch:?}");
            return Ok(false);
        };

        if self.edit_mode == EditMode::Insert {
            self.buffer.insert(offset, &[value])?;
            self.mark_dirty_from(offset);
        } else if offset >= self.buffer.len() {
            self.buffer.replace(offset, &[value])?;
            self.mark_dirty_from(offset);
        } else {
            self.buffer.set(offset, value)?;
            self.mark_bytes_dirty(offset, offset + 1);
        }

        self.clear_selection();
        self.after_edit();
        if let Some(next) = self.next_cell_same_type(CursorTarget::Char { offset }) {
            self.place_cursor(next);
        }
        Ok(true)
    }

    /// Delete キー
    ///
    /// 選択中は選択範囲を削除する。HEX欄の最上位桁では1語分、それ以外の桁では
    /// その桁を0にする。文字欄では1バイト削除する。
    pub fn delete(&mut self) -> Result<bool, EditError> {
        self.check_writable()?;
        if self.selection_active() {
            return self.delete_selection();
        }

        let valid = self.buffer.len();
        match self.cursor_target() {
            CursorTarget::Hex { word, shift } if shift == self.geometry.max_bit_shift() => {
                if word >= valid {
                    return Ok(false);
                }
                self.buffer.delete(word, self.geometry.bytes_per_word())?;
                self.mark_dirty_from(word);
            }
            CursorTarget::Hex { word, shift } => {
                let byte = word + (shift / 8) as usize;
                if byte >= valid {
                    return Ok(false);
                }
                self.buffer.set_nibble(byte, shift % 8, 0)?;
                self.mark_bytes_dirty(byte, byte + 1);
            }
            CursorTarget::Char { offset } => {
                if offset >= valid {
                    return Ok(false);
                }
                self.buffer.delete(offset, 1)?;
                self.mark_dirty_from(offset);
            }
        }
        if self.after_edit() {
            self.notify_cursor_move();
        }
        Ok(true)
    }

    /// Backspace キー: 前の同種セルへ移動してから削除
    pub fn backspace(&mut self) -> Result<bool, EditError> {
        self.check_writable()?;
        if self.selection_active() {
            return self.delete_selection();
        }
        let Some(previous) = self.previous_cell_same_type(self.cursor_target()) else {
            return Ok(false);
        };
        self.place_cursor(previous);
        self.delete()
    }

    /// 選択範囲を削除し、カーソルをその先頭へ
    pub(super) fn delete_selection(&mut self) -> Result<bool, EditError> {
        match self.remove_selection()? {
            Some(start) => {
                self.place_cursor_at_byte(start);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// 選択範囲のバイトを削除して選択を解除する（カーソルは動かさない）
    ///
    /// 削除した範囲の先頭を返す。
    pub(super) fn remove_selection(&mut self) -> Result<Option<usize>, EditError> {
        self.check_writable()?;
        let Some(range) = self.selection.range() else {
            return Ok(None);
        };
        self.buffer.delete(range.start, range.len())?;
        self.mark_dirty_from(range.start);
        self.clear_selection();
        self.after_edit();
        Ok(Some(range.start))
    }

    /// 現在の欄のままカーソルをバイト位置へ
    pub(super) fn place_cursor_at_byte(&mut self, offset: usize) {
        let target = if self.cursor_on_char_side() {
            CursorTarget::Char { offset }
        } else {
            self.hex_target_for_byte(offset, 4)
        };
        let target = self.clamp_target(target);
        self.place_cursor(target);
    }

    /// `offset` にバイト列を挿入
    pub fn insert_data(&mut self, offset: usize, bytes: &[u8]) -> Result<(), EditError> {
        self.check_writable()?;
        self.check_offset(offset)?;
        if bytes.is_empty() {
            return Ok(());
        }
        self.buffer.insert(offset, bytes)?;
        self.mark_dirty_from(offset);
        if self.after_edit() {
            self.notify_cursor_move();
        }
        Ok(())
    }

    /// `offset` からバイト列を上書き（有効長を超える分は追加）
    pub fn replace_data(&mut self, offset: usize, bytes: &[u8]) -> Result<(), EditError> {
        self.check_writable()?;
        self.check_offset(offset)?;
        if bytes.is_empty() {
            return Ok(());
        }
        let end = offset + bytes.len();
        let extends = end > self.buffer.len();
        self.buffer.replace(offset, bytes)?;
        if extends {
            self.mark_dirty_from(offset);
        } else {
            self.mark_bytes_dirty(offset, end);
        }
        if self.after_edit() {
            self.notify_cursor_move();
        }
        Ok(())
    }

    /// `offset` から最大 `len` バイト削除し、削除した数を返す
    pub fn delete_data(&mut self, offset: usize, len: usize) -> Result<usize, EditError> {
        self.check_writable()?;
        self.check_offset(offset)?;
        let removed = self.buffer.delete(offset, len)?;
        if removed > 0 {
            self.mark_dirty_from(offset);
            if self.after_edit() {
                self.notify_cursor_move();
            }
        }
        Ok(removed)
    }

    /// 編集後の後始末
    ///
    /// 有効長が縮んでカーソルのバイト位置が変わったら true（通知は呼び出し側）
    pub(super) fn after_edit(&mut self) -> bool {
        self.modified = true;
        self.update_selection(|sel, valid| sel.clamp_to(valid));

        let before = self.cursor_location();
        self.clamp_cursor();
        // 縮んだ分だけ表示位置も戻す
        self.set_viewport(self.left, self.top);
        self.ensure_cursor_visible();
        self.cursor_location() != before
    }
}

#[cfg(test)]
mod tests {
    use ratatui::layout::Rect;

    use super::*;
    use crate::app::{CursorLocation, HexEditOptions};

    fn editor(data: &[u8], bytes_per_word: usize) -> HexEdit {
        let mut edit = HexEdit::new(HexEditOptions {
            bytes_per_word,
            ..HexEditOptions::default()
        })
        .unwrap();
        edit.set_data(data);
        edit.set_area(Rect::new(0, 0, 80, 8));
        edit
    }

    fn type_str(edit: &mut HexEdit, text: &str) {
        for ch in text.chars() {
            edit.input_char(ch).unwrap();
        }
    }

    #[test]
    fn test_overwrite_into_empty_buffer() {
        let mut edit = editor(&[], 1);
        type_str(&mut edit, "41");
        assert_eq!(edit.bytes(), &[0x41]);
        assert_eq!(edit.cursor_location().offset, 1);
        assert!(edit.is_modified());
    }

    #[test]
    fn test_insert_at_high_nibble_inserts_zero_word() {
        let mut edit = editor(&[0, 0], 1);
        edit.set_insert_mode(true);
        type_str(&mut edit, "FF");
        assert_eq!(edit.bytes(), &[0xFF, 0, 0]);
    }

    #[test]
    fn test_insert_mode_with_wide_words() {
        let mut edit = editor(&[0x11, 0x22], 2);
        edit.set_insert_mode(true);
        // 語の最上位桁 (バイト1の上位ニブル)
        type_str(&mut edit, "AB");
        assert_eq!(edit.bytes(), &[0x00, 0xAB, 0x11, 0x22]);
        assert_eq!(edit.cursor_target(), CursorTarget::Hex { word: 0, shift: 4 });
    }

    #[test]
    fn test_overwrite_grows_at_end() {
        let mut edit = editor(&[1, 2, 3, 4], 4);
        // 追記位置の語の最上位桁はバイト7の上位ニブル
        edit.move_cursor(crate::app::Motion::BufferEnd);
        assert_eq!(edit.cursor_target(), CursorTarget::Hex { word: 4, shift: 28 });
        type_str(&mut edit, "1");
        assert_eq!(edit.bytes(), &[1, 2, 3, 4, 0, 0, 0, 0x10]);
    }

    #[test]
    fn test_invalid_hex_digit_is_ignored() {
        let mut edit = editor(&[0x12], 1);
        assert_eq!(edit.input_char('z'), Ok(false));
        assert_eq!(edit.bytes(), &[0x12]);
        assert!(!edit.is_modified());
    }

    #[test]
    fn test_char_side_overwrite_and_insert() {
        let mut edit = editor(b"abc", 1);
        edit.set_cursor_location(true, 1, 0).unwrap();
        type_str(&mut edit, "X");
        assert_eq!(edit.bytes(), b"aXc");

        edit.set_insert_mode(true);
        type_str(&mut edit, "YZ");
        assert_eq!(edit.bytes(), b"aXYZc");
        assert_eq!(
            edit.cursor_location(),
            CursorLocation {
                as_char: true,
                offset: 4,
                bit_shift: 0
            }
        );

        // Latin-1 以外は入力しない
        assert_eq!(edit.input_char('あ'), Ok(false));
    }

    #[test]
    fn test_char_side_appends() {
        let mut edit = editor(b"ab", 1);
        edit.set_cursor_location(true, 2, 0).unwrap();
        type_str(&mut edit, "c");
        assert_eq!(edit.bytes(), b"abc");
        assert_eq!(edit.cursor_location().offset, 3);
    }

    #[test]
    fn test_delete_on_hex_side() {
        let mut edit = editor(&[0x12, 0x34, 0x56, 0x78], 2);
        // 下位ニブルは0になる
        edit.set_cursor_location(false, 0, 0).unwrap();
        assert_eq!(edit.delete(), Ok(true));
        assert_eq!(edit.bytes(), &[0x10, 0x34, 0x56, 0x78]);

        // 最上位桁は1語削除
        edit.set_cursor_location(false, 1, 4).unwrap();
        assert_eq!(edit.delete(), Ok(true));
        assert_eq!(edit.bytes(), &[0x56, 0x78]);

        // 追記位置では何もしない
        edit.move_cursor(crate::app::Motion::BufferEnd);
        assert_eq!(edit.delete(), Ok(false));
    }

    #[test]
    fn test_delete_word_is_clamped_to_valid() {
        let mut edit = editor(&[1, 2, 3, 4, 5, 6], 4);
        edit.move_cursor(crate::app::Motion::BufferEnd);
        assert_eq!(edit.cursor_target(), CursorTarget::Hex { word: 4, shift: 28 });
        assert_eq!(edit.delete(), Ok(true));
        assert_eq!(edit.bytes(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_delete_on_char_side() {
        let mut edit = editor(b"hello", 1);
        edit.set_cursor_location(true, 4, 0).unwrap();
        assert_eq!(edit.delete(), Ok(true));
        assert_eq!(edit.bytes(), b"hell");
        assert_eq!(edit.cursor_location().offset, 4);
        assert_eq!(edit.delete(), Ok(false));
    }

    #[test]
    fn test_backspace_deletes_previous_cell() {
        let mut edit = editor(b"abc", 1);
        edit.set_cursor_location(true, 3, 0).unwrap();
        assert_eq!(edit.backspace(), Ok(true));
        assert_eq!(edit.bytes(), b"ab");
        assert_eq!(edit.cursor_location().offset, 2);

        edit.set_cursor_location(true, 0, 0).unwrap();
        assert_eq!(edit.backspace(), Ok(false));
    }

    #[test]
    fn test_delete_removes_selection() {
        let mut edit = editor(&[0, 1, 2, 3, 4, 5], 1);
        edit.set_selection_range(1..4).unwrap();
        assert_eq!(edit.delete(), Ok(true));
        assert_eq!(edit.bytes(), &[0, 4, 5]);
        assert!(!edit.selection_active());
        assert_eq!(edit.cursor_location().offset, 1);
    }

    #[test]
    fn test_read_only_blocks_edits() {
        let mut edit = editor(&[1, 2, 3], 1);
        edit.set_read_only(true);
        assert_eq!(edit.input_char('F'), Err(EditError::ReadOnly));
        assert_eq!(edit.delete(), Err(EditError::ReadOnly));
        assert_eq!(edit.backspace(), Err(EditError::ReadOnly));
        assert_eq!(edit.insert_data(0, &[9]), Err(EditError::ReadOnly));
        assert_eq!(edit.replace_data(0, &[9]), Err(EditError::ReadOnly));
        assert_eq!(edit.delete_data(0, 1), Err(EditError::ReadOnly));
        assert_eq!(edit.bytes(), &[1, 2, 3]);
        assert!(!edit.is_modified());
    }

    #[test]
    fn test_insert_then_delete_restores_buffer() {
        let original: Vec<u8> = (0..40).collect();
        for offset in [0, 7, 16, 40] {
            let mut edit = editor(&original, 1);
            edit.insert_data(offset, &[0xAA; 19]).unwrap();
            assert_eq!(edit.len(), 59);
            assert_eq!(edit.delete_data(offset, 19), Ok(19));
            assert_eq!(edit.bytes(), original.as_slice());
        }
    }

    #[test]
    fn test_range_ops_validate_offset() {
        let mut edit = editor(&[1, 2], 1);
        assert_eq!(
            edit.insert_data(3, &[0]),
            Err(EditError::OutOfRange { offset: 3, valid: 2 })
        );
        assert_eq!(
            edit.delete_data(3, 1),
            Err(EditError::OutOfRange { offset: 3, valid: 2 })
        );
        assert_eq!(edit.delete_data(1, 10), Ok(1));
        edit.replace_data(1, &[7, 8, 9]).unwrap();
        assert_eq!(edit.bytes(), &[1, 7, 8, 9]);
    }

    #[test]
    fn test_shrinking_clamps_cursor_and_selection() {
        let mut edit = editor(&[0u8; 32], 1);
        edit.set_cursor_location(true, 30, 0).unwrap();
        edit.set_selection_range(10..30).unwrap();
        edit.delete_data(8, 20).unwrap();
        assert_eq!(edit.len(), 12);
        assert_eq!(edit.cursor_location().offset, 12);
        assert_eq!(edit.selection().range(), Some(10..12));
    }

    #[test]
    fn test_in_place_edit_dirties_one_line() {
        let mut edit = editor(&[0u8; 64], 1);
        edit.set_cursor_location(false, 20, 4).unwrap();
        edit.take_dirty();
        edit.input_char('7').unwrap();
        assert_eq!(edit.take_dirty(), Some(1..=1));

        edit.set_insert_mode(true);
        edit.set_cursor_location(false, 20, 4).unwrap();
        edit.take_dirty();
        edit.input_char('7').unwrap();
        assert_eq!(edit.take_dirty(), Some(1..=usize::MAX));
    }
}
