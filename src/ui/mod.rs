pub mod hex_view;
pub mod layout;

pub use hex_view::{HexView, draw};

use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::{Color, Style},
};

/// 配色
pub struct Colors;

impl Colors {
    pub const OFFSET: Color = Color::Cyan;
    pub const HEX_ZERO: Color = Color::DarkGray;
    pub const HEX_HIGH: Color = Color::Red;
    pub const HEX_PRINTABLE: Color = Color::Green;
    pub const HEX_NORMAL: Color = Color::White;
    pub const SEPARATOR: Color = Color::DarkGray;
    pub const CHAR_NORMAL: Color = Color::Yellow;
    pub const SELECTION_BG: Color = Color::Blue;
    pub const READ_ONLY: Color = Color::Gray;
}

/// 描画先
///
/// 座標はコントロールの表示領域からの相対位置。
pub trait RenderSink {
    fn set_cell(&mut self, column: u16, row: u16, ch: char, style: Style);

    /// カーソル。`shape_percent` はセル高さに対する割合
    fn set_cursor(&mut self, visible: bool, shape_percent: u8, column: u16, row: u16);
}

/// 1セル分の内容
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: Style,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            style: Style::default(),
        }
    }
}

/// カーソルの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorState {
    pub visible: bool,
    pub shape_percent: u8,
    pub column: u16,
    pub row: u16,
}

/// メモリ上のセル格子
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellGrid {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
    cursor: Option<CursorState>,
    /// 直近の描画で書き込まれた行
    touched_rows: Vec<bool>,
}

impl CellGrid {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); usize::from(width) * usize::from(height)],
            cursor: None,
            touched_rows: vec![false; usize::from(height)],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn cell(&self, column: u16, row: u16) -> Option<&Cell> {
        if column >= self.width || row >= self.height {
            return None;
        }
        self.cells
            .get(usize::from(row) * usize::from(self.width) + usize::from(column))
    }

    /// 1行分の文字列（末尾の空白を含む）
    pub fn row_text(&self, row: u16) -> String {
        (0..self.width)
            .filter_map(|column| self.cell(column, row))
            .map(|cell| cell.ch)
            .collect()
    }

    pub fn cursor(&self) -> Option<CursorState> {
        self.cursor
    }

    /// 前回 `clear_touched` してから書き込まれた行
    pub fn touched_rows(&self) -> Vec<u16> {
        (0..self.height)
            .filter(|&row| self.touched_rows[usize::from(row)])
            .collect()
    }

    pub fn clear_touched(&mut self) {
        self.touched_rows.fill(false);
    }
}

impl RenderSink for CellGrid {
    fn set_cell(&mut self, column: u16, row: u16, ch: char, style: Style) {
        if column >= self.width || row >= self.height {
            return;
        }
        let index = usize::from(row) * usize::from(self.width) + usize::from(column);
        self.cells[index] = Cell { ch, style };
        self.touched_rows[usize::from(row)] = true;
    }

    fn set_cursor(&mut self, visible: bool, shape_percent: u8, column: u16, row: u16) {
        self.cursor = Some(CursorState {
            visible,
            shape_percent,
            column,
            row,
        });
    }
}

/// ratatui の `Buffer` へ描画する
pub struct BufferSink<'a> {
    buf: &'a mut Buffer,
    area: Rect,
    cursor: Option<CursorState>,
}

impl<'a> BufferSink<'a> {
    pub fn new(buf: &'a mut Buffer, area: Rect) -> Self {
        Self {
            buf,
            area,
            cursor: None,
        }
    }

    /// 表示するカーソルの画面座標
    pub fn cursor_position(&self) -> Option<Position> {
        self.cursor
            .filter(|cursor| cursor.visible)
            .map(|cursor| Position::new(self.area.x + cursor.column, self.area.y + cursor.row))
    }

    pub fn cursor(&self) -> Option<CursorState> {
        self.cursor
    }
}

impl RenderSink for BufferSink<'_> {
    fn set_cell(&mut self, column: u16, row: u16, ch: char, style: Style) {
        if column >= self.area.width || row >= self.area.height {
            return;
        }
        if let Some(cell) = self.buf.cell_mut((self.area.x + column, self.area.y + row)) {
            cell.set_char(ch).set_style(style);
        }
    }

    fn set_cursor(&mut self, visible: bool, shape_percent: u8, column: u16, row: u16) {
        self.cursor = Some(CursorState {
            visible,
            shape_percent,
            column,
            row,
        });
    }
}
