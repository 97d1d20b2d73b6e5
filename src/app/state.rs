use std::ops::RangeInclusive;

use ratatui::layout::Rect;

use super::cursor::{Cursor, CursorTarget};
use super::selection::Selection;
use super::timer::{IntervalTimer, Scheduler};
use super::viewport::DirtyRange;
use super::{EditError, EditMode};
use crate::buffer::ByteBuffer;
use crate::clipboard::{Clipboard, MemoryClipboard};
use crate::ui::layout::{Geometry, OffsetStyle};

/// 挿入モードのカーソル形状（セル高さに対する割合）
pub const INSERT_CURSOR_PERCENT: u8 = 20;
/// 上書きモードのカーソル形状
pub const OVERWRITE_CURSOR_PERCENT: u8 = 100;

/// 作成時の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexEditOptions {
    /// 1語のバイト数 (1, 2, 4, 8)
    pub bytes_per_word: usize,
    pub read_only: bool,
    pub offset_style: OffsetStyle,
    /// 枠に表示する見出し
    pub caption: Option<String>,
}

impl Default for HexEditOptions {
    fn default() -> Self {
        Self {
            bytes_per_word: 1,
            read_only: false,
            offset_style: OffsetStyle::default(),
            caption: None,
        }
    }
}

/// 16進編集ウィジェット
pub struct HexEdit {
    /// 編集中のデータ
    pub(super) buffer: ByteBuffer,
    /// 表示レイアウト
    pub(super) geometry: Geometry,
    /// カーソル位置（表示座標）
    pub(super) cursor: Cursor,
    /// 選択範囲
    pub(super) selection: Selection,
    /// 表示先頭行
    pub(super) top: usize,
    /// 表示左端の列
    pub(super) left: usize,
    /// 表示領域
    pub(super) area: Rect,
    /// 再描画範囲
    pub(super) dirty: DirtyRange,
    pub(super) edit_mode: EditMode,
    pub(super) read_only: bool,
    pub(super) modified: bool,
    pub(super) caption: Option<String>,
    pub(super) clipboard: Box<dyn Clipboard>,
    /// ドラッグ中の自動スクロール
    pub(super) scheduler: Box<dyn Scheduler>,
    /// ドラッグ中の最後のマウス位置（表示領域からの相対位置、領域外は負もありうる）
    pub(super) drag: Option<(i32, i32)>,
    pub(super) on_cursor_move: Option<Box<dyn FnMut(u64, u8)>>,
}

impl HexEdit {
    /// 新しいウィジェットを作成（空のバッファ）
    pub fn new(options: HexEditOptions) -> Result<Self, EditError> {
        let geometry = Geometry::new(options.bytes_per_word, options.offset_style)
            .ok_or(EditError::InvalidWordSize(options.bytes_per_word))?;
        let mut edit = Self {
            buffer: ByteBuffer::new(),
            geometry,
            cursor: Cursor::default(),
            selection: Selection::default(),
            top: 0,
            left: 0,
            area: Rect::default(),
            dirty: DirtyRange::full(),
            edit_mode: EditMode::default(),
            read_only: options.read_only,
            modified: false,
            caption: options.caption,
            clipboard: Box::new(MemoryClipboard::new()),
            scheduler: Box::new(IntervalTimer::new()),
            drag: None,
            on_cursor_move: None,
        };
        edit.reset_view();
        Ok(edit)
    }

    /// データを設定（コピー）
    pub fn set_data(&mut self, data: &[u8]) {
        self.set_data_owned(data.to_vec());
    }

    /// データを設定（所有権ごと受け取る）
    pub fn set_data_owned(&mut self, data: Vec<u8>) {
        log::debug!("buffer replaced: {} bytes", data.len());
        self.buffer = ByteBuffer::from_vec(data);
        self.modified = false;
        self.reset_view();
    }

    /// データを取り出す（ウィジェットは空になる）
    pub fn take_data(&mut self) -> Vec<u8> {
        let data = self.buffer.take();
        self.reset_view();
        data
    }

    /// データのコピー
    pub fn data(&self) -> Vec<u8> {
        self.buffer.as_slice().to_vec()
    }

    /// データ（有効長まで）
    pub fn bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// 有効長
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// 空にする
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.modified = false;
        self.reset_view();
    }

    /// カーソル・選択・表示位置を初期状態に戻す
    fn reset_view(&mut self) {
        let (line, column) = self.cell_of(CursorTarget::Hex {
            word: 0,
            shift: self.geometry.max_bit_shift(),
        });
        self.cursor = Cursor { line, column };
        self.selection.clear();
        self.top = 0;
        self.left = 0;
        self.drag = None;
        self.scheduler.cancel();
        self.invalidate();
    }

    /// 表示レイアウト
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn bytes_per_word(&self) -> usize {
        self.geometry.bytes_per_word()
    }

    /// 語サイズを変更（カーソルは同じバイトに置き直す）
    pub fn set_bytes_per_word(&mut self, bytes_per_word: usize) -> Result<(), EditError> {
        let geometry = self
            .geometry
            .with_word_size(bytes_per_word)
            .ok_or(EditError::InvalidWordSize(bytes_per_word))?;
        self.change_geometry(geometry);
        Ok(())
    }

    pub fn offset_style(&self) -> OffsetStyle {
        self.geometry.offset_style()
    }

    /// オフセット欄の形式を変更
    pub fn set_offset_style(&mut self, offset_style: OffsetStyle) {
        let geometry = self.geometry.with_offset_style(offset_style);
        self.change_geometry(geometry);
    }

    fn change_geometry(&mut self, geometry: Geometry) {
        if geometry == self.geometry {
            return;
        }
        log::debug!(
            "geometry changed: {} bytes per word, offset column {:?}",
            geometry.bytes_per_word(),
            geometry.offset_style()
        );
        let location = self.cursor_location();
        self.geometry = geometry;

        let target = if location.as_char {
            CursorTarget::Char {
                offset: location.offset,
            }
        } else {
            self.hex_target_for_byte(location.offset, location.bit_shift)
        };
        let (line, column) = self.cell_of(self.clamp_target(target));
        self.cursor = Cursor { line, column };

        let (left, top) = (self.left.min(self.max_left()), self.top.min(self.max_top()));
        self.left = left;
        self.top = top;
        self.ensure_cursor_visible();
        self.invalidate();
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    /// 読み取り専用を切り替える。変わったら全体を再描画
    pub fn set_read_only(&mut self, read_only: bool) {
        if self.read_only != read_only {
            self.read_only = read_only;
            self.invalidate();
        }
    }

    pub fn edit_mode(&self) -> EditMode {
        self.edit_mode
    }

    pub fn insert_mode(&self) -> bool {
        self.edit_mode == EditMode::Insert
    }

    pub fn set_insert_mode(&mut self, insert: bool) {
        self.edit_mode = if insert {
            EditMode::Insert
        } else {
            EditMode::Overwrite
        };
    }

    /// 挿入/上書きを切り替える
    pub fn toggle_edit_mode(&mut self) {
        self.edit_mode = self.edit_mode.toggled();
    }

    /// カーソルの形状（セル高さに対する割合）
    pub fn cursor_shape(&self) -> u8 {
        match self.edit_mode {
            EditMode::Insert => INSERT_CURSOR_PERCENT,
            EditMode::Overwrite => OVERWRITE_CURSOR_PERCENT,
        }
    }

    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    pub fn set_caption(&mut self, caption: Option<String>) {
        self.caption = caption;
    }

    /// 最後に保存してから変更されたか
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    /// カーソル移動の通知先を設定（1つだけ）
    pub fn set_on_cursor_move(&mut self, callback: impl FnMut(u64, u8) + 'static) {
        self.on_cursor_move = Some(Box::new(callback));
    }

    /// クリップボードを差し替える
    pub fn set_clipboard(&mut self, clipboard: impl Clipboard + 'static) {
        self.clipboard = Box::new(clipboard);
    }

    pub fn clipboard_mut(&mut self) -> &mut dyn Clipboard {
        self.clipboard.as_mut()
    }

    /// 自動スクロールのタイマーを差し替える
    pub fn set_scheduler(&mut self, scheduler: impl Scheduler + 'static) {
        self.scheduler = Box::new(scheduler);
    }

    /// 表示領域
    pub fn area(&self) -> Rect {
        self.area
    }

    /// 表示領域を設定（端末のリサイズなど）
    pub fn set_area(&mut self, area: Rect) {
        if area == self.area {
            return;
        }
        self.area = area;
        self.left = self.left.min(self.max_left());
        self.top = self.top.min(self.max_top());
        self.ensure_cursor_visible();
        self.invalidate();
    }

    /// 再描画範囲を取り出す
    pub fn take_dirty(&mut self) -> Option<RangeInclusive<usize>> {
        self.dirty.take()
    }
}
