use std::io::Write;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::encoding::{self, HexFormat};

/// バイト列クリップボード
pub trait Clipboard {
    /// バイト列を格納。成功したら true
    fn put(&mut self, bytes: &[u8]) -> bool;

    /// 格納されているバイト列を取得（内容は残る）
    fn take(&mut self) -> Option<Vec<u8>>;
}

/// プロセス内だけのクリップボード
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    contents: Option<Vec<u8>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(bytes: &[u8]) -> Self {
        Self {
            contents: Some(bytes.to_vec()),
        }
    }
}

impl Clipboard for MemoryClipboard {
    fn put(&mut self, bytes: &[u8]) -> bool {
        self.contents = Some(bytes.to_vec());
        true
    }

    fn take(&mut self) -> Option<Vec<u8>> {
        self.contents.clone()
    }
}

/// システムクリップボード + OSC 52 (ターミナルクリップボード)
pub struct SystemClipboard {
    /// 取得できなかった場合は None
    system: Option<arboard::Clipboard>,
    /// システムクリップボードが使えない場合の保存先
    local: MemoryClipboard,
}

impl SystemClipboard {
    pub fn new() -> Self {
        let system = match arboard::Clipboard::new() {
            Ok(cb) => Some(cb),
            Err(e) => {
                log::debug!("system clipboard unavailable: {e}");
                None
            }
        };
        Self {
            system,
            local: MemoryClipboard::new(),
        }
    }

    /// OSC 52 でターミナルのクリップボードへ送る
    fn copy_osc52(text: &str) -> std::io::Result<()> {
        let encoded = STANDARD.encode(text.as_bytes());
        let mut stdout = std::io::stdout();
        write!(stdout, "\x1b]52;c;{encoded}\x07")?;
        stdout.flush()
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipboard for SystemClipboard {
    fn put(&mut self, bytes: &[u8]) -> bool {
        self.local.put(bytes);
        let text = encoding::format_hex(bytes, HexFormat::Spaced);

        if let Some(cb) = self.system.as_mut() {
            match cb.set_text(text.clone()) {
                Ok(()) => return true,
                Err(e) => log::warn!("failed to set system clipboard: {e}"),
            }
        }
        if let Err(e) = Self::copy_osc52(&text) {
            log::warn!("failed to write OSC 52 sequence: {e}");
        }
        // ローカルには保存済み
        true
    }

    fn take(&mut self) -> Option<Vec<u8>> {
        if let Some(cb) = self.system.as_mut() {
            match cb.get_text() {
                Ok(text) if !text.is_empty() => {
                    return Some(encoding::clipboard_text_to_bytes(&text));
                }
                Ok(_) => {}
                Err(e) => log::debug!("system clipboard empty or unavailable: {e}"),
            }
        }
        self.local.take()
    }
}
