use std::ops::RangeInclusive;

use super::HexEdit;

/// 再描画が必要な行範囲（両端を含む）
///
/// `first > last` のとき空。再描画の間は広がる一方で、再描画で空に戻る。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRange {
    first: usize,
    last: usize,
}

impl Default for DirtyRange {
    fn default() -> Self {
        Self::empty()
    }
}

impl DirtyRange {
    pub const fn empty() -> Self {
        Self {
            first: usize::MAX,
            last: 0,
        }
    }

    /// 全行
    pub const fn full() -> Self {
        Self {
            first: 0,
            last: usize::MAX,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first > self.last
    }

    pub fn contains(&self, line: usize) -> bool {
        self.first <= line && line <= self.last
    }

    pub fn first(&self) -> usize {
        self.first
    }

    pub fn last(&self) -> usize {
        self.last
    }

    /// `first..=last` を含むように広げる
    pub fn widen(&mut self, first: usize, last: usize) {
        if first > last {
            return;
        }
        self.first = self.first.min(first);
        self.last = self.last.max(last);
    }

    /// `first` 行から末尾まで
    pub fn widen_to_end(&mut self, first: usize) {
        self.widen(first, usize::MAX);
    }

    /// 範囲を取り出して空にする
    pub fn take(&mut self) -> Option<RangeInclusive<usize>> {
        let range = std::mem::take(self);
        (!range.is_empty()).then_some(range.first..=range.last)
    }
}

impl HexEdit {
    /// 表示位置 (左端の列, 先頭行)
    pub fn viewport(&self) -> (usize, usize) {
        (self.left, self.top)
    }

    /// 表示領域の幅（列数）
    pub fn client_width(&self) -> usize {
        usize::from(self.area.width)
    }

    /// 表示領域の高さ（行数）
    pub fn client_height(&self) -> usize {
        usize::from(self.area.height)
    }

    /// データを表示するのに使う行数（追記位置の行を含む）
    pub fn lines_populated(&self) -> usize {
        self.geometry.lines_for(self.buffer.len())
    }

    pub(super) fn max_top(&self) -> usize {
        self.lines_populated().saturating_sub(self.client_height())
    }

    pub(super) fn max_left(&self) -> usize {
        self.geometry.line_width().saturating_sub(self.client_width())
    }

    /// 表示位置を設定（スクロールバー連動など）
    ///
    /// 先頭行は `max(0, 行数 - 表示行数)` を超えない。変化したら true
    pub fn set_viewport(&mut self, left: usize, top: usize) -> bool {
        let left = left.min(self.max_left());
        let top = top.min(self.max_top());
        if left == self.left && top == self.top {
            return false;
        }
        self.left = left;
        self.top = top;
        self.dirty.widen_to_end(top);
        true
    }

    /// 全体を再描画対象にする
    pub fn invalidate(&mut self) {
        self.dirty = DirtyRange::full();
    }

    /// 現在の再描画範囲
    pub fn dirty_range(&self) -> DirtyRange {
        self.dirty
    }

    /// カーソルが表示範囲内になるようにスクロール。スクロールしたら true
    pub fn ensure_cursor_visible(&mut self) -> bool {
        if self.area.is_empty() {
            return false;
        }
        let (line, column) = (self.cursor.line, self.cursor.column);
        let height = self.client_height();
        let width = self.client_width();

        let mut top = self.top;
        if line < top {
            top = line;
        } else if line >= top + height {
            top = line + 1 - height;
        }

        let mut left = self.left;
        if column < left {
            left = column;
        } else if column >= left + width {
            left = column + 1 - width;
        }

        if top == self.top && left == self.left {
            return false;
        }
        self.top = top;
        self.left = left;
        // スクロールすると表示中の全行が変わる
        self.dirty.widen_to_end(top);
        true
    }

    /// バイト範囲を含む行を再描画対象にする
    pub(super) fn mark_bytes_dirty(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let bpl = self.geometry.bytes_per_line();
        self.dirty.widen(start / bpl, (end - 1) / bpl);
    }

    /// `offset` を含む行から末尾までを再描画対象にする
    pub(super) fn mark_dirty_from(&mut self, offset: usize) {
        let line = offset / self.geometry.bytes_per_line();
        self.dirty.widen_to_end(line);
    }
}
