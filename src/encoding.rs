use unicode_width::UnicodeWidthChar;

/// 文字欄で表示できないバイトの代替文字
pub const PLACEHOLDER: char = '.';

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// HEX文字列の形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HexFormat {
    /// "DE AD BE EF"
    #[default]
    Spaced,
    /// "DEADBEEF"
    Compact,
}

/// ニブル値（0-15）を大文字の16進文字に変換
pub fn nibble_char(nibble: u8) -> char {
    char::from(HEX_DIGITS[usize::from(nibble & 0x0F)])
}

/// HEX文字の正規化（全角→半角、小文字→大文字）
/// 0-9, A-F以外はNoneを返す
pub fn normalize_hex_char(ch: char) -> Option<char> {
    // 全角英数記号（U+FF01〜U+FF5E）は半角に寄せる
    let ch = match u32::from(ch) {
        cp @ 0xFF01..=0xFF5E => char::from_u32(cp - 0xFF00 + 0x20).unwrap_or(ch),
        _ => ch,
    };
    ch.is_ascii_hexdigit().then(|| ch.to_ascii_uppercase())
}

/// 入力文字をニブル値に変換
pub fn hex_digit_value(ch: char) -> Option<u8> {
    let digit = normalize_hex_char(ch)?.to_digit(16)?;
    u8::try_from(digit).ok()
}

/// 入力文字を1バイトに変換（Latin-1の範囲のみ）
pub fn char_to_byte(ch: char) -> Option<u8> {
    u8::try_from(u32::from(ch)).ok()
}

/// 文字欄に表示する文字
///
/// 制御文字や1セル幅でない文字は `PLACEHOLDER` に置き換える。
pub fn display_char(byte: u8) -> char {
    let ch = char::from(byte);
    if ch.is_control() || ch.width() != Some(1) {
        PLACEHOLDER
    } else {
        ch
    }
}

/// バイト列をHEX文字列に変換
pub fn format_hex(bytes: &[u8], format: HexFormat) -> String {
    let separator = match format {
        HexFormat::Spaced => " ",
        HexFormat::Compact => "",
    };
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(separator)
}

/// HEX文字列を正規化（全角→半角、小文字→大文字、区切り文字と 0x プレフィックスを除去）
fn normalize_hex_string(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == ',' || c == '{' || c == '}')
        .filter(|token| !token.is_empty())
        .map(|token| {
            let mut chars: Vec<char> = token.chars().filter_map(normalize_hex_char_or_x).collect();
            if chars.len() >= 2 && chars[0] == '0' && chars[1] == 'X' {
                chars.drain(..2);
            }
            chars.into_iter().collect::<String>()
        })
        .collect()
}

fn normalize_hex_char_or_x(c: char) -> Option<char> {
    match c {
        'x' | 'X' | 'ｘ' | 'Ｘ' => Some('X'),
        _ => normalize_hex_char(c).or(Some('?')),
    }
}

/// 文字列がHEX形式かどうかを判定（全角文字も考慮）
pub fn looks_like_hex(s: &str) -> bool {
    let normalized = normalize_hex_string(s.trim());
    // 偶数長で全て16進数なら HEX とみなす
    normalized.len() >= 2
        && normalized.len() % 2 == 0
        && normalized.chars().all(|c| c.is_ascii_hexdigit())
}

/// HEX文字列をバイト列に変換
pub fn parse_hex(s: &str) -> Option<Vec<u8>> {
    let normalized = normalize_hex_string(s.trim());
    if normalized.len() % 2 != 0 || !normalized.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    normalized
        .as_bytes()
        .chunks(2)
        .map(|pair| std::str::from_utf8(pair).ok().and_then(|p| u8::from_str_radix(p, 16).ok()))
        .collect()
}

/// クリップボードのテキストをバイト列に変換
///
/// HEXに見えるテキストはデコードし、それ以外は生のバイト列として扱う。
pub fn clipboard_text_to_bytes(text: &str) -> Vec<u8> {
    if looks_like_hex(text) {
        parse_hex(text).unwrap_or_else(|| text.as_bytes().to_vec())
    } else {
        text.as_bytes().to_vec()
    }
}
