use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Parser;
use crossterm::{
    cursor::SetCursorStyle,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    style::{Color, Style},
    widgets::{Block, Paragraph},
};

use hexed::clipboard::SystemClipboard;
use hexed::ui::{self, HexView};
use hexed::{Control, HexEdit, HexEditOptions, OffsetStyle};

/// タイマーが無いときのイベント待ち時間
const IDLE_POLL: Duration = Duration::from_millis(250);

/// Terminal hex editor built on the hexed widget
#[derive(Parser, Debug)]
#[command(name = "hexed")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File to open
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Bytes per word group (1, 2, 4 or 8)
    #[arg(short, long, default_value = "1")]
    word_size: usize,

    /// Offset column width in bits (0, 32 or 64)
    #[arg(short, long, default_value = "32")]
    offset_style: u32,

    /// Read-only mode
    #[arg(short, long)]
    read_only: bool,

    /// Start in insert mode
    #[arg(short, long)]
    insert: bool,

    /// Caption shown in the frame (default: file name)
    #[arg(short, long)]
    caption: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let Some(offset_style) = OffsetStyle::from_width(args.offset_style) else {
        bail!("offset width must be 0, 32 or 64 (got {})", args.offset_style);
    };

    // データを読み込む（優先順位: ファイル > 標準入力）
    let data = if let Some(ref path) = args.file {
        if path.exists() {
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?
        } else {
            Vec::new()
        }
    } else if !io::stdin().is_terminal() {
        let mut data = Vec::new();
        io::stdin().read_to_end(&mut data)?;
        data
    } else {
        Vec::new()
    };

    let caption = args.caption.clone().or_else(|| {
        args.file
            .as_ref()
            .map(|path| path.display().to_string())
    });
    let mut edit = HexEdit::new(HexEditOptions {
        bytes_per_word: args.word_size,
        read_only: args.read_only,
        offset_style,
        caption,
    })?;
    edit.set_data_owned(data);
    edit.set_insert_mode(args.insert);
    edit.set_clipboard(SystemClipboard::new());
    edit.set_on_cursor_move(|offset, shift| log::trace!("cursor at {offset:#x} shift {shift}"));

    // ターミナルの初期化
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut edit, args.file.as_ref());

    // ターミナルの後処理
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        SetCursorStyle::DefaultUserShape,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// ホスト側で処理するキー
enum HostKey {
    Quit,
    Save,
}

fn host_key(key: &KeyEvent) -> Option<HostKey> {
    if key.kind != KeyEventKind::Press || !key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    match key.code {
        KeyCode::Char('q') => Some(HostKey::Quit),
        KeyCode::Char('s') => Some(HostKey::Save),
        _ => None,
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    edit: &mut HexEdit,
    path: Option<&PathBuf>,
) -> Result<()> {
    let mut message: Option<String> = None;

    loop {
        let mut cursor = None;
        terminal.draw(|frame| {
            let title = format!(
                " {}{} ",
                edit.caption().unwrap_or("[No Name]"),
                if edit.is_modified() { " [+]" } else { "" }
            );
            let block = Block::bordered().title(title);
            let inner = block.inner(frame.area());
            frame.render_widget(block, frame.area());

            let [body, status] =
                Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);
            cursor = ui::draw(frame, &mut *edit, body);

            let location = edit.cursor_location();
            let value = HexView::new(&*edit)
                .cursor_value()
                .map(|v| format!("{v:02X}"))
                .unwrap_or_else(|| "--".to_string());
            let mode = if edit.read_only() {
                "RO"
            } else if edit.insert_mode() {
                "INS"
            } else {
                "OVR"
            };
            let text = format!(
                "{:08X}  {}  {}  {}",
                location.offset,
                value,
                mode,
                message.as_deref().unwrap_or("")
            );
            frame.render_widget(
                Paragraph::new(text).style(Style::default().fg(Color::Black).bg(Color::Gray)),
                status,
            );
        })?;

        // 挿入モードは細いカーソル、上書きモードはブロック
        if let Some(cursor) = cursor {
            let style = if cursor.shape_percent < 50 {
                SetCursorStyle::SteadyBar
            } else {
                SetCursorStyle::SteadyBlock
            };
            execute!(terminal.backend_mut(), style)?;
        }

        let timeout = edit
            .next_timer_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_POLL);

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => match host_key(&key) {
                    Some(HostKey::Quit) => break,
                    Some(HostKey::Save) => message = Some(save(edit, path)),
                    None => {
                        if edit.handle_key(key) {
                            message = None;
                        }
                    }
                },
                Event::Mouse(mouse) => {
                    edit.handle_mouse(mouse);
                }
                // 次の描画で表示領域を設定し直す
                Event::Resize(_, _) => {}
                _ => {}
            }
        }

        edit.on_timer_tick(Instant::now());
    }

    Ok(())
}

/// 保存して結果のメッセージを返す
fn save(edit: &mut HexEdit, path: Option<&PathBuf>) -> String {
    let Some(path) = path else {
        return "no file name".to_string();
    };
    match std::fs::write(path, edit.bytes()) {
        Ok(()) => {
            edit.set_modified(false);
            log::info!("saved {} bytes to {}", edit.len(), path.display());
            format!("saved {}", path.display())
        }
        Err(e) => {
            log::error!("failed to save {}: {e}", path.display());
            format!("save failed: {e}")
        }
    }
}
