/// 1行あたりのバイト数（既定値）
pub const DEFAULT_BYTES_PER_LINE: usize = 16;

/// オフセット欄の表示形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetStyle {
    /// オフセット欄なし
    None,
    /// 32ビット（8桁）
    #[default]
    Bits32,
    /// 64ビット（16桁、8桁目の後にバッククォート）
    Bits64,
}

impl OffsetStyle {
    /// ビット幅（0/32/64）から変換
    pub fn from_width(width: u32) -> Option<Self> {
        match width {
            0 => Some(Self::None),
            32 => Some(Self::Bits32),
            64 => Some(Self::Bits64),
            _ => None,
        }
    }

    /// ビット幅
    pub fn width(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Bits32 => 32,
            Self::Bits64 => 64,
        }
    }

    /// オフセット欄が占める列数
    pub fn columns(self) -> usize {
        match self {
            Self::None => 0,
            Self::Bits32 => 8,
            Self::Bits64 => 17,
        }
    }

    /// オフセット文字列を生成
    pub fn format(self, offset: u64) -> String {
        match self {
            Self::None => String::new(),
            Self::Bits32 => format!("{:08X}", offset & 0xFFFF_FFFF),
            Self::Bits64 => format!("{:08X}`{:08X}", offset >> 32, offset & 0xFFFF_FFFF),
        }
    }
}

/// セルの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Offset,
    Whitespace,
    /// 語の間、16進欄と文字欄の間、8バイト語の中央
    HexDigitPadding,
    /// `byte_offset` は語の先頭、`bit_shift` は語内のビット位置
    HexDigit { byte_offset: usize, bit_shift: u32 },
    CharValue { byte_offset: usize },
}

/// セル判定の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellInfo {
    pub kind: CellKind,
    /// 参照先のバイトが有効長以降にある
    pub beyond_buffer_end: bool,
}

/// 表示レイアウト
///
/// ```text
/// [offset][ ][ word][ word]...[ word][ ][chars.......]
/// ```
///
/// 各語は空白1列の後に上位桁から並ぶ。語はリトルエンディアンで、ビット位置 `s` の
/// 桁は `word_offset + s / 8` のバイトにある。8バイト語は中央にバッククォートが入る。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    bytes_per_line: usize,
    bytes_per_word: usize,
    offset_style: OffsetStyle,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            bytes_per_line: DEFAULT_BYTES_PER_LINE,
            bytes_per_word: 1,
            offset_style: OffsetStyle::default(),
        }
    }
}

impl Geometry {
    /// 語サイズとオフセット形式から作成（1行16バイト）
    pub fn new(bytes_per_word: usize, offset_style: OffsetStyle) -> Option<Self> {
        Self::with_bytes_per_line(DEFAULT_BYTES_PER_LINE, bytes_per_word, offset_style)
    }

    /// 1行のバイト数を指定して作成
    ///
    /// 行のバイト数は8の倍数でなければならない（どの語サイズでも語が行をまたがない）。
    pub fn with_bytes_per_line(
        bytes_per_line: usize,
        bytes_per_word: usize,
        offset_style: OffsetStyle,
    ) -> Option<Self> {
        if !Self::is_valid_word_size(bytes_per_word)
            || bytes_per_line == 0
            || bytes_per_line % 8 != 0
        {
            return None;
        }
        Some(Self {
            bytes_per_line,
            bytes_per_word,
            offset_style,
        })
    }

    pub fn is_valid_word_size(bytes_per_word: usize) -> bool {
        matches!(bytes_per_word, 1 | 2 | 4 | 8)
    }

    pub fn bytes_per_line(&self) -> usize {
        self.bytes_per_line
    }

    pub fn bytes_per_word(&self) -> usize {
        self.bytes_per_word
    }

    pub fn offset_style(&self) -> OffsetStyle {
        self.offset_style
    }

    /// 語サイズを変更した新しいレイアウト
    pub fn with_word_size(self, bytes_per_word: usize) -> Option<Self> {
        Self::with_bytes_per_line(self.bytes_per_line, bytes_per_word, self.offset_style)
    }

    /// オフセット形式を変更した新しいレイアウト
    pub fn with_offset_style(self, offset_style: OffsetStyle) -> Self {
        Self {
            offset_style,
            ..self
        }
    }

    fn digits_per_word(&self) -> usize {
        self.bytes_per_word * 2
    }

    /// 1語が占める列数（先頭の空白を含む）
    pub fn cells_per_word(&self) -> usize {
        let separator = usize::from(self.bytes_per_word == 8);
        self.digits_per_word() + 1 + separator
    }

    pub fn words_per_line(&self) -> usize {
        self.bytes_per_line / self.bytes_per_word
    }

    /// 語内の最上位ニブルのビット位置
    pub fn max_bit_shift(&self) -> u32 {
        // 語サイズは最大8なので u32 に収まる
        (self.bytes_per_word * 8 - 4) as u32
    }

    /// 16進欄の最初の列（最初の語の空白）
    pub fn hex_start(&self) -> usize {
        match self.offset_style.columns() {
            0 => 0,
            cols => cols + 1,
        }
    }

    /// 16進欄の直後の空白列
    pub fn hex_end(&self) -> usize {
        self.hex_start() + self.words_per_line() * self.cells_per_word()
    }

    /// 文字欄の最初の列
    pub fn char_start(&self) -> usize {
        self.hex_end() + 1
    }

    /// 1行の表示幅
    pub fn line_width(&self) -> usize {
        self.char_start() + self.bytes_per_line
    }

    /// `valid` バイトを表示するのに必要な行数（追記位置の行を含む）
    pub fn lines_for(&self, valid: usize) -> usize {
        valid / self.bytes_per_line + 1
    }

    /// 語の先頭オフセット
    pub fn word_start(&self, offset: usize) -> usize {
        offset - offset % self.bytes_per_word
    }

    /// 8バイト語の中央の区切り列かどうか
    pub fn is_word_separator(&self, column: usize) -> bool {
        self.bytes_per_word == 8
            && (self.hex_start()..self.hex_end()).contains(&column)
            && (column - self.hex_start()) % self.cells_per_word() == self.digits_per_word() / 2 + 1
    }

    /// (行, 列) のセルを判定
    pub fn cell_kind(&self, line: usize, column: usize, valid: usize) -> CellInfo {
        let offset_cols = self.offset_style.columns();
        let line_base = line * self.bytes_per_line;

        let kind = if column < offset_cols {
            CellKind::Offset
        } else if offset_cols > 0 && column == offset_cols {
            CellKind::Whitespace
        } else if column < self.hex_end() {
            let rel = column - self.hex_start();
            let word = rel / self.cells_per_word();
            let within = rel % self.cells_per_word();
            let half = self.digits_per_word() / 2;
            if within == 0 || self.is_word_separator(column) {
                CellKind::HexDigitPadding
            } else {
                let digit = if self.bytes_per_word == 8 && within > half + 1 {
                    within - 2
                } else {
                    within - 1
                };
                CellKind::HexDigit {
                    byte_offset: line_base + word * self.bytes_per_word,
                    bit_shift: ((self.digits_per_word() - 1 - digit) * 4) as u32,
                }
            }
        } else if column == self.hex_end() {
            CellKind::HexDigitPadding
        } else if column < self.line_width() {
            CellKind::CharValue {
                byte_offset: line_base + column - self.char_start(),
            }
        } else {
            CellKind::Whitespace
        };

        let beyond_buffer_end = match kind {
            CellKind::HexDigit {
                byte_offset,
                bit_shift,
            } => byte_offset + (bit_shift / 8) as usize >= valid,
            CellKind::CharValue { byte_offset } => byte_offset >= valid,
            _ => false,
        };

        CellInfo {
            kind,
            beyond_buffer_end,
        }
    }

    /// 16進セルの位置 (行, 列)
    ///
    /// 語境界に揃っていないオフセットは語内のビット位置に畳み込む。
    pub fn cell_from_hex_offset(&self, byte_offset: usize, bit_shift: u32) -> (usize, usize) {
        let word_offset = self.word_start(byte_offset);
        let shift = ((byte_offset - word_offset) * 8) as u32 + bit_shift;
        debug_assert!(shift <= self.max_bit_shift());

        let line = word_offset / self.bytes_per_line;
        let word = (word_offset % self.bytes_per_line) / self.bytes_per_word;
        let digit = self.digits_per_word() - 1 - (shift / 4) as usize;
        let mut within = digit + 1;
        if self.bytes_per_word == 8 && digit >= self.digits_per_word() / 2 {
            within += 1;
        }
        (line, self.hex_start() + word * self.cells_per_word() + within)
    }

    /// 文字セルの位置 (行, 列)
    pub fn cell_from_char_offset(&self, byte_offset: usize) -> (usize, usize) {
        (
            byte_offset / self.bytes_per_line,
            self.char_start() + byte_offset % self.bytes_per_line,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: [OffsetStyle; 3] = [OffsetStyle::None, OffsetStyle::Bits32, OffsetStyle::Bits64];

    #[test]
    fn test_hex_cells_are_bijective() {
        for bpw in [1, 2, 4, 8] {
            for style in STYLES {
                let geo = Geometry::new(bpw, style).unwrap();
                for word in (0..64).step_by(bpw) {
                    for shift in (0..=geo.max_bit_shift()).step_by(4) {
                        let (line, column) = geo.cell_from_hex_offset(word, shift);
                        let info = geo.cell_kind(line, column, 64);
                        assert_eq!(
                            info.kind,
                            CellKind::HexDigit {
                                byte_offset: word,
                                bit_shift: shift
                            },
                            "bpw={bpw} style={style:?} word={word} shift={shift}"
                        );
                        assert!(!info.beyond_buffer_end);
                    }
                }
            }
        }
    }

    #[test]
    fn test_char_cells_are_bijective() {
        for bpw in [1, 2, 4, 8] {
            for style in STYLES {
                let geo = Geometry::new(bpw, style).unwrap();
                for offset in 0..48 {
                    let (line, column) = geo.cell_from_char_offset(offset);
                    assert_eq!(
                        geo.cell_kind(line, column, 48).kind,
                        CellKind::CharValue { byte_offset: offset }
                    );
                }
            }
        }
    }

    #[test]
    fn test_every_hex_column_maps_back() {
        for bpw in [1, 2, 4, 8] {
            let geo = Geometry::new(bpw, OffsetStyle::Bits64).unwrap();
            for column in 0..geo.line_width() + 4 {
                if let CellKind::HexDigit {
                    byte_offset,
                    bit_shift,
                } = geo.cell_kind(3, column, 0).kind
                {
                    assert_eq!(geo.cell_from_hex_offset(byte_offset, bit_shift), (3, column));
                }
            }
        }
    }

    #[test]
    fn test_byte_word_layout_with_offset_column() {
        let geo = Geometry::new(1, OffsetStyle::Bits32).unwrap();
        assert_eq!(geo.hex_start(), 9);
        assert_eq!(geo.hex_end(), 9 + 16 * 3);
        assert_eq!(geo.line_width(), 58 + 16);

        assert_eq!(geo.cell_kind(0, 0, 0).kind, CellKind::Offset);
        assert_eq!(geo.cell_kind(0, 7, 0).kind, CellKind::Offset);
        assert_eq!(geo.cell_kind(0, 8, 0).kind, CellKind::Whitespace);
        assert_eq!(geo.cell_kind(0, 9, 0).kind, CellKind::HexDigitPadding);
        assert_eq!(
            geo.cell_kind(0, 10, 0).kind,
            CellKind::HexDigit { byte_offset: 0, bit_shift: 4 }
        );
        assert_eq!(
            geo.cell_kind(1, 11, 0).kind,
            CellKind::HexDigit { byte_offset: 16, bit_shift: 0 }
        );
        assert_eq!(geo.cell_kind(0, 57, 0).kind, CellKind::HexDigitPadding);
        assert_eq!(geo.cell_kind(0, 58, 0).kind, CellKind::CharValue { byte_offset: 0 });
        assert_eq!(geo.cell_kind(0, 73, 0).kind, CellKind::CharValue { byte_offset: 15 });
        assert_eq!(geo.cell_kind(0, 74, 0).kind, CellKind::Whitespace);
    }

    #[test]
    fn test_quad_word_digits_run_right_to_left() {
        let geo = Geometry::new(4, OffsetStyle::None).unwrap();
        assert_eq!(geo.cells_per_word(), 9);
        assert_eq!(
            geo.cell_kind(0, 1, 8).kind,
            CellKind::HexDigit { byte_offset: 0, bit_shift: 28 }
        );
        assert_eq!(
            geo.cell_kind(0, 8, 8).kind,
            CellKind::HexDigit { byte_offset: 0, bit_shift: 0 }
        );
        assert_eq!(geo.cell_kind(0, 9, 8).kind, CellKind::HexDigitPadding);
        assert_eq!(
            geo.cell_kind(0, 10, 8).kind,
            CellKind::HexDigit { byte_offset: 4, bit_shift: 28 }
        );
    }

    #[test]
    fn test_eight_byte_words_have_separator() {
        let geo = Geometry::new(8, OffsetStyle::None).unwrap();
        assert_eq!(geo.cells_per_word(), 18);
        assert!(geo.is_word_separator(9));
        assert_eq!(geo.cell_kind(0, 9, 8).kind, CellKind::HexDigitPadding);
        assert_eq!(
            geo.cell_kind(0, 8, 8).kind,
            CellKind::HexDigit { byte_offset: 0, bit_shift: 32 }
        );
        assert_eq!(
            geo.cell_kind(0, 10, 8).kind,
            CellKind::HexDigit { byte_offset: 0, bit_shift: 28 }
        );
        assert!(!geo.is_word_separator(0));
        assert!(!geo.is_word_separator(10));
    }

    #[test]
    fn test_beyond_buffer_end_on_short_word() {
        let geo = Geometry::new(4, OffsetStyle::None).unwrap();
        // 有効長2: 語0のバイト0,1のみ有効
        let high = geo.cell_kind(0, 1, 2);
        assert!(high.beyond_buffer_end);
        let low = geo.cell_kind(0, 8, 2);
        assert!(!low.beyond_buffer_end);
        let byte1 = geo.cell_kind(0, 5, 2);
        assert_eq!(
            byte1.kind,
            CellKind::HexDigit { byte_offset: 0, bit_shift: 12 }
        );
        assert!(!byte1.beyond_buffer_end);
        assert!(geo.cell_kind(0, 4, 2).beyond_buffer_end);
    }

    #[test]
    fn test_unaligned_offset_folds_into_shift() {
        let geo = Geometry::new(4, OffsetStyle::None).unwrap();
        assert_eq!(geo.cell_from_hex_offset(2, 4), geo.cell_from_hex_offset(0, 20));
    }

    #[test]
    fn test_offset_format() {
        assert_eq!(OffsetStyle::Bits32.format(0x1234), "00001234");
        assert_eq!(
            OffsetStyle::Bits64.format(0x1_0000_0010),
            "00000001`00000010"
        );
        assert_eq!(OffsetStyle::Bits64.format(0).len(), OffsetStyle::Bits64.columns());
        assert_eq!(OffsetStyle::from_width(64), Some(OffsetStyle::Bits64));
        assert_eq!(OffsetStyle::from_width(16), None);
    }

    #[test]
    fn test_invalid_geometry_is_rejected() {
        assert!(Geometry::new(3, OffsetStyle::None).is_none());
        assert!(Geometry::with_bytes_per_line(12, 4, OffsetStyle::None).is_none());
        assert!(Geometry::with_bytes_per_line(32, 8, OffsetStyle::None).is_some());
    }
}
