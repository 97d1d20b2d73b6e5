mod clipboard_ops;
mod cursor;
mod edit;
mod input;
mod selection;
mod state;
mod timer;
mod viewport;

pub use cursor::{CursorLocation, CursorTarget};
pub use selection::{Selection, SelectionState};
pub use state::{HexEdit, HexEditOptions};
pub use timer::{AUTO_SCROLL_INTERVAL, IntervalTimer, Scheduler};
pub use viewport::DirtyRange;

use crossterm::event::KeyCode;
use thiserror::Error;

use crate::buffer::BufferError;

/// 編集モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    Overwrite,
    Insert,
}

impl EditMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Overwrite => Self::Insert,
            Self::Insert => Self::Overwrite,
        }
    }
}

/// 編集操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("the buffer is read-only")]
    ReadOnly,

    #[error("offset {offset:#x} is beyond the valid length {valid:#x}")]
    OutOfRange { offset: usize, valid: usize },

    #[error("unsupported word size: {0} bytes")]
    InvalidWordSize(usize),

    #[error("bit shift {0} is not a nibble boundary within a byte")]
    InvalidBitShift(u32),

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// カーソル移動の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    /// Ctrl+Home: バッファ先頭
    BufferStart,
    /// Ctrl+End: バッファ末尾（追記位置）
    BufferEnd,
}

impl Motion {
    /// バッファの後方へ向かう移動かどうか
    pub fn is_forward(self) -> bool {
        matches!(
            self,
            Self::Down | Self::Right | Self::End | Self::PageDown | Self::BufferEnd
        )
    }
}

/// ウィジェットのアクション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // カーソル移動（選択は解除）
    Move(Motion),
    // Shift+移動: 選択を伸ばす
    Select(Motion),
    SelectAll,
    ClearSelection,

    // 編集
    InputChar(char),
    Delete,
    Backspace,
    /// HEX欄 <-> 文字欄
    ToggleSide,
    /// Insert <-> Overwrite
    ToggleEditMode,

    // クリップボード
    Copy,
    Cut,
    Paste,

    None,
}

/// キー修飾子
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyMod {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Action {
    /// キーコードからアクションに変換
    pub fn from_key(key: KeyCode, mods: KeyMod) -> Self {
        let KeyMod { ctrl, shift, alt } = mods;

        let motion = match (key, ctrl) {
            (KeyCode::Up, false) => Some(Motion::Up),
            (KeyCode::Down, false) => Some(Motion::Down),
            (KeyCode::Left, false) => Some(Motion::Left),
            (KeyCode::Right, false) => Some(Motion::Right),
            (KeyCode::Home, false) => Some(Motion::Home),
            (KeyCode::End, false) => Some(Motion::End),
            (KeyCode::Home, true) => Some(Motion::BufferStart),
            (KeyCode::End, true) => Some(Motion::BufferEnd),
            (KeyCode::PageUp, false) => Some(Motion::PageUp),
            (KeyCode::PageDown, false) => Some(Motion::PageDown),
            _ => None,
        };
        if let Some(motion) = motion {
            if alt {
                return Action::None;
            }
            return if shift {
                Action::Select(motion)
            } else {
                Action::Move(motion)
            };
        }

        match (key, ctrl, alt, shift) {
            // クリップボード（CUA と Ctrl 系の両方）
            (KeyCode::Char('c'), true, false, false) => Action::Copy,
            (KeyCode::Insert, true, false, false) => Action::Copy,
            (KeyCode::Char('x'), true, false, false) => Action::Cut,
            (KeyCode::Delete, false, false, true) => Action::Cut,
            (KeyCode::Char('v'), true, false, false) => Action::Paste,
            (KeyCode::Insert, false, false, true) => Action::Paste,

            (KeyCode::Char('a'), true, false, false) => Action::SelectAll,
            (KeyCode::Esc, _, _, _) => Action::ClearSelection,

            // モード切替
            (KeyCode::Tab, false, false, false) => Action::ToggleSide,
            (KeyCode::Insert, false, false, false) => Action::ToggleEditMode,

            // 削除
            (KeyCode::Delete, false, false, false) => Action::Delete,
            (KeyCode::Backspace, false, false, _) => Action::Backspace,

            // 修飾キーがなければ文字入力
            (KeyCode::Char(ch), false, false, _) => Action::InputChar(ch),

            _ => Action::None,
        }
    }
}
