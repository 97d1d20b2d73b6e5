use super::cursor::CursorTarget;
use super::{EditError, EditMode, HexEdit};
use crate::buffer::BufferError;

impl HexEdit {
    /// 選択範囲をクリップボードへコピー
    pub fn copy(&mut self) -> bool {
        let Some(data) = self.selected_data() else {
            return false;
        };
        let stored = self.clipboard.put(&data);
        if stored {
            log::debug!("copied {} bytes", data.len());
        } else {
            log::warn!("clipboard rejected {} bytes", data.len());
        }
        stored
    }

    /// 選択範囲をクリップボードへ移す
    pub fn cut(&mut self) -> Result<bool, EditError> {
        if self.read_only {
            return Err(EditError::ReadOnly);
        }
        if !self.copy() {
            return Ok(false);
        }
        self.delete_selection()
    }

    /// クリップボードの内容をカーソル位置へ貼り付け
    ///
    /// 選択中なら先に選択範囲を削除する。挿入モードなら挿入、上書きモードなら
    /// 上書きし、貼り付けた範囲を選択してカーソルをその最後のバイトへ置く。
    pub fn paste(&mut self) -> Result<bool, EditError> {
        if self.read_only {
            return Err(EditError::ReadOnly);
        }
        let Some(bytes) = self.clipboard.take().filter(|bytes| !bytes.is_empty()) else {
            return Ok(false);
        };

        let selected = self.selection.range();
        let offset = match &selected {
            Some(range) => range.start,
            None => match self.cursor_target() {
                CursorTarget::Hex { word, .. } => word,
                CursorTarget::Char { offset } => offset,
            },
        }
        .min(self.buffer.len());
        let removed = selected.as_ref().map_or(0, |range| range.len());

        // 確保に失敗したら選択範囲も消さずに終わる
        self.reserve_for_paste(offset, removed, bytes.len())?;
        self.remove_selection()?;

        match self.edit_mode {
            EditMode::Insert => self.buffer.insert(offset, &bytes)?,
            EditMode::Overwrite => self.buffer.replace(offset, &bytes)?,
        }
        log::debug!("pasted {} bytes at {offset:#x}", bytes.len());
        self.mark_dirty_from(offset);
        self.after_edit();

        let end = offset + bytes.len();
        self.update_selection(|sel, valid| sel.set_range(offset..end, valid));
        self.place_cursor_at_byte(end - 1);
        Ok(true)
    }

    /// 貼り付け後の長さを確保する
    ///
    /// `removed` は先に削除される選択範囲のバイト数。
    fn reserve_for_paste(
        &mut self,
        offset: usize,
        removed: usize,
        count: usize,
    ) -> Result<(), EditError> {
        let remaining = self.buffer.len() - removed;
        let required = match self.edit_mode {
            EditMode::Insert => remaining.checked_add(count),
            EditMode::Overwrite => offset.checked_add(count).map(|end| end.max(remaining)),
        }
        .ok_or(BufferError::AllocationFailed {
            requested: usize::MAX,
        })?;
        self.buffer.reserve(required)?;
        Ok(())
    }
}
