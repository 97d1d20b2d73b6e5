//! hexed - a reusable hex-edit widget for terminal UIs
//!
//! The widget shows a byte buffer as an offset column, a hex pane grouped
//! into little-endian words and a character pane. It handles keyboard and
//! mouse input, selection, clipboard transfer and incremental repaint.
//! Hosts drive it through the [`Control`] trait; the `hexed` binary is a
//! small standalone editor built on top of it.

pub mod app;
pub mod buffer;
pub mod clipboard;
pub mod control;
pub mod encoding;
pub mod ui;

pub use app::{EditError, EditMode, HexEdit, HexEditOptions};
pub use control::Control;
pub use ui::layout::OffsetStyle;
