use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use ratatui::layout::Rect;

use hexed::app::CursorLocation;
use hexed::clipboard::{Clipboard, MemoryClipboard};
use hexed::ui::CellGrid;
use hexed::{Control, HexEdit, HexEditOptions, OffsetStyle};

fn editor(data: &[u8]) -> HexEdit {
    let mut edit = HexEdit::new(HexEditOptions {
        offset_style: OffsetStyle::None,
        ..HexEditOptions::default()
    })
    .unwrap();
    edit.set_data(data);
    edit.set_area(Rect::new(0, 0, 80, 4));
    edit
}

fn press(edit: &mut HexEdit, code: KeyCode, modifiers: KeyModifiers) -> bool {
    edit.handle_key(KeyEvent {
        code,
        modifiers,
        kind: KeyEventKind::Press,
        state: KeyEventState::NONE,
    })
}

fn type_text(edit: &mut HexEdit, text: &str) {
    for ch in text.chars() {
        press(edit, KeyCode::Char(ch), KeyModifiers::NONE);
    }
}

#[test]
fn test_typing_into_empty_buffer() {
    let mut edit = editor(&[]);
    type_text(&mut edit, "41");
    assert_eq!(edit.bytes(), &[0x41]);
    assert_eq!(
        edit.cursor_location(),
        CursorLocation {
            as_char: false,
            offset: 1,
            bit_shift: 4,
        }
    );
    assert!(edit.is_modified());
}

#[test]
fn test_insert_mode_typing_at_high_nibble() {
    let mut edit = editor(&[0x00, 0x00]);
    press(&mut edit, KeyCode::Insert, KeyModifiers::NONE);
    assert!(edit.insert_mode());
    type_text(&mut edit, "FF");
    assert_eq!(edit.bytes(), &[0xFF, 0x00, 0x00]);
}

#[test]
fn test_cut_through_keys() {
    let mut edit = editor(&[0xAA, 0xBB, 0xCC]);
    edit.set_clipboard(MemoryClipboard::new());
    edit.set_selection_range(0..2).unwrap();
    assert!(press(&mut edit, KeyCode::Char('x'), KeyModifiers::CONTROL));
    assert_eq!(edit.clipboard_mut().take(), Some(vec![0xAA, 0xBB]));
    assert_eq!(edit.bytes(), &[0xCC]);
    assert!(!edit.selection_active());
}

#[test]
fn test_paste_over_selection_through_keys() {
    let mut edit = editor(&[0x11]);
    edit.set_insert_mode(true);
    edit.set_clipboard(MemoryClipboard::with_contents(&[0x22, 0x33]));
    edit.set_selection_range(0..1).unwrap();
    assert!(press(&mut edit, KeyCode::Char('v'), KeyModifiers::CONTROL));
    assert_eq!(edit.bytes(), &[0x22, 0x33]);
    assert_eq!(edit.selection().range(), Some(0..2));
    assert_eq!(edit.cursor_location().offset, 1);
}

#[test]
fn test_right_at_line_end_on_char_side() {
    let data: Vec<u8> = (0..32).collect();
    let mut edit = editor(&data);
    edit.set_cursor_location(true, 15, 0).unwrap();
    assert!(press(&mut edit, KeyCode::Right, KeyModifiers::NONE));
    let location = edit.cursor_location();
    assert!(location.as_char);
    assert_eq!(location.offset, 16);
    assert_eq!(edit.cursor_cell().0, 1);
}

#[test]
fn test_insert_then_delete_restores_data() {
    let data: Vec<u8> = (0..40).collect();
    let mut edit = editor(&data);
    edit.insert_data(5, &[9, 9, 9]).unwrap();
    assert_eq!(edit.len(), 43);
    assert_eq!(edit.delete_data(5, 3), Ok(3));
    assert_eq!(edit.bytes(), data.as_slice());
}

#[test]
fn test_selection_stays_within_buffer() {
    let data: Vec<u8> = (0..50).collect();
    let mut edit = editor(&data);
    let keys = [
        (KeyCode::Right, KeyModifiers::SHIFT),
        (KeyCode::Down, KeyModifiers::SHIFT),
        (KeyCode::End, KeyModifiers::SHIFT | KeyModifiers::CONTROL),
        (KeyCode::Tab, KeyModifiers::NONE),
        (KeyCode::Left, KeyModifiers::SHIFT),
        (KeyCode::Up, KeyModifiers::SHIFT),
        (KeyCode::Delete, KeyModifiers::NONE),
        (KeyCode::Home, KeyModifiers::SHIFT | KeyModifiers::CONTROL),
        (KeyCode::Backspace, KeyModifiers::NONE),
    ];
    for (code, modifiers) in keys {
        press(&mut edit, code, modifiers);
        let selection = edit.selection();
        assert!(selection.first() <= selection.beyond_last());
        assert!(selection.beyond_last() <= edit.len());
        assert!(edit.cursor_location().offset <= edit.len());
    }
}

#[test]
fn test_paint_shows_hex_and_chars() {
    let mut edit = editor(b"A");
    let mut grid = CellGrid::new(80, 4);
    edit.paint(&mut grid);
    assert!(grid.row_text(0).starts_with(" 41 "));
    let char_column = edit.geometry().char_start() as u16;
    assert_eq!(grid.cell(char_column, 0).map(|cell| cell.ch), Some('A'));
    assert!(grid.cursor().is_some_and(|cursor| cursor.visible));
}
