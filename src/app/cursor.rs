use super::{EditError, HexEdit, Motion};
use crate::ui::layout::CellKind;

/// 表示上のカーソル位置
///
/// 常に16進の桁か文字のセルの上にある。16進側は有効長を含む語の中まで、
/// 文字欄は有効長の位置（追記位置）まで置ける。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) struct Cursor {
    pub line: usize,
    pub column: usize,
}

/// カーソルが指すバッファ上の位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorTarget {
    /// `word` は語の先頭オフセット、`shift` は語内のビット位置
    Hex { word: usize, shift: u32 },
    Char { offset: usize },
}

/// 外部に公開するカーソル位置
///
/// `offset` はバイト単位、`bit_shift` はそのバイト内のニブル位置（0 = 下位、4 = 上位）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorLocation {
    pub as_char: bool,
    pub offset: usize,
    pub bit_shift: u32,
}

impl HexEdit {
    /// カーソルの表示位置 (行, 列)
    pub fn cursor_cell(&self) -> (usize, usize) {
        (self.cursor.line, self.cursor.column)
    }

    /// カーソルが指すバッファ上の位置
    pub fn cursor_target(&self) -> CursorTarget {
        let info = self
            .geometry
            .cell_kind(self.cursor.line, self.cursor.column, self.buffer.len());
        match info.kind {
            CellKind::HexDigit {
                byte_offset,
                bit_shift,
            } => CursorTarget::Hex {
                word: byte_offset,
                shift: bit_shift,
            },
            CellKind::CharValue { byte_offset } => CursorTarget::Char {
                offset: byte_offset,
            },
            other => unreachable!("cursor rests on a {other:?} cell"),
        }
    }

    /// 文字欄にカーソルがあるか
    pub fn cursor_on_char_side(&self) -> bool {
        matches!(self.cursor_target(), CursorTarget::Char { .. })
    }

    /// カーソル位置を取得
    pub fn cursor_location(&self) -> CursorLocation {
        match self.cursor_target() {
            CursorTarget::Hex { word, shift } => {
                let offset = word + (shift / 8) as usize;
                let valid = self.buffer.len();
                if offset > valid {
                    // 追記語の上位桁は追記位置の上位ニブルとして報告する
                    CursorLocation {
                        as_char: false,
                        offset: valid,
                        bit_shift: 4,
                    }
                } else {
                    CursorLocation {
                        as_char: false,
                        offset,
                        bit_shift: shift % 8,
                    }
                }
            }
            CursorTarget::Char { offset } => CursorLocation {
                as_char: true,
                offset,
                bit_shift: 0,
            },
        }
    }

    /// カーソル位置を設定
    ///
    /// `offset` は有効長まで（追記位置を含む）。`bit_shift` は 0 か 4。
    pub fn set_cursor_location(
        &mut self,
        as_char: bool,
        offset: usize,
        bit_shift: u32,
    ) -> Result<(), EditError> {
        let valid = self.buffer.len();
        if offset > valid {
            return Err(EditError::OutOfRange { offset, valid });
        }
        if bit_shift != 0 && bit_shift != 4 {
            return Err(EditError::InvalidBitShift(bit_shift));
        }
        let target = if as_char {
            CursorTarget::Char { offset }
        } else {
            self.hex_target_for_byte(offset, bit_shift)
        };
        self.place_cursor(target);
        Ok(())
    }

    /// バイト位置とバイト内ニブルから16進の位置を作る
    pub(super) fn hex_target_for_byte(&self, offset: usize, nibble_shift: u32) -> CursorTarget {
        let word = self.geometry.word_start(offset);
        CursorTarget::Hex {
            word,
            shift: ((offset - word) * 8) as u32 + nibble_shift,
        }
    }

    /// 16進側でカーソルを置ける最後の語
    pub(super) fn hex_limit(&self) -> usize {
        self.geometry.word_start(self.buffer.len())
    }

    /// 位置の表示セル
    pub(super) fn cell_of(&self, target: CursorTarget) -> (usize, usize) {
        match target {
            CursorTarget::Hex { word, shift } => self.geometry.cell_from_hex_offset(word, shift),
            CursorTarget::Char { offset } => self.geometry.cell_from_char_offset(offset),
        }
    }

    /// 選択や貼り付けに使うオフセット（16進側は語の先頭）
    pub(super) fn target_offset(target: CursorTarget) -> usize {
        match target {
            CursorTarget::Hex { word, .. } => word,
            CursorTarget::Char { offset } => offset,
        }
    }

    /// 同じ種類の次のセル
    pub fn next_cell_same_type(&self, target: CursorTarget) -> Option<CursorTarget> {
        match target {
            CursorTarget::Hex { word, shift } if shift >= 4 => Some(CursorTarget::Hex {
                word,
                shift: shift - 4,
            }),
            CursorTarget::Hex { word, .. } => {
                let next = word + self.geometry.bytes_per_word();
                (next <= self.hex_limit()).then(|| CursorTarget::Hex {
                    word: next,
                    shift: self.geometry.max_bit_shift(),
                })
            }
            CursorTarget::Char { offset } => {
                (offset < self.buffer.len()).then_some(CursorTarget::Char { offset: offset + 1 })
            }
        }
    }

    /// 同じ種類の前のセル
    pub fn previous_cell_same_type(&self, target: CursorTarget) -> Option<CursorTarget> {
        match target {
            CursorTarget::Hex { word, shift } if shift < self.geometry.max_bit_shift() => {
                Some(CursorTarget::Hex {
                    word,
                    shift: shift + 4,
                })
            }
            CursorTarget::Hex { word, .. } => {
                let bpw = self.geometry.bytes_per_word();
                (word >= bpw).then_some(CursorTarget::Hex {
                    word: word - bpw,
                    shift: 0,
                })
            }
            CursorTarget::Char { offset } => {
                (offset > 0).then(|| CursorTarget::Char { offset: offset - 1 })
            }
        }
    }

    /// 置ける範囲にクランプ
    pub(super) fn clamp_target(&self, target: CursorTarget) -> CursorTarget {
        match target {
            CursorTarget::Hex { word, shift } if word > self.hex_limit() => CursorTarget::Hex {
                word: self.hex_limit(),
                shift,
            },
            CursorTarget::Char { offset } if offset > self.buffer.len() => CursorTarget::Char {
                offset: self.buffer.len(),
            },
            other => other,
        }
    }

    /// 位置を `lines` 行ずらす（範囲外なら None）
    fn shift_lines(&self, target: CursorTarget, lines: isize) -> Option<CursorTarget> {
        let delta = lines.unsigned_abs() * self.geometry.bytes_per_line();
        let moved = |offset: usize| {
            if lines < 0 {
                offset.checked_sub(delta)
            } else {
                offset.checked_add(delta)
            }
        };
        Some(match target {
            CursorTarget::Hex { word, shift } => CursorTarget::Hex {
                word: moved(word)?,
                shift,
            },
            CursorTarget::Char { offset } => CursorTarget::Char {
                offset: moved(offset)?,
            },
        })
    }

    /// 移動先を計算
    fn motion_target(&self, motion: Motion) -> Option<CursorTarget> {
        let current = self.cursor_target();
        let bpl = self.geometry.bytes_per_line();
        let bpw = self.geometry.bytes_per_word();
        let line_start = self.cursor.line * bpl;
        let max_shift = self.geometry.max_bit_shift();

        match motion {
            Motion::Left => self.previous_cell_same_type(current),
            Motion::Right => self.next_cell_same_type(current),
            Motion::Up => self.shift_lines(current, -1),
            Motion::Down => {
                let next = self.shift_lines(current, 1)?;
                let clamped = self.clamp_target(next);
                // 次の行にデータがなければ移動しない
                (self.cell_of(clamped).0 == self.cursor.line + 1).then_some(clamped)
            }
            Motion::Home => Some(match current {
                CursorTarget::Hex { .. } => CursorTarget::Hex {
                    word: line_start,
                    shift: max_shift,
                },
                CursorTarget::Char { .. } => CursorTarget::Char { offset: line_start },
            }),
            Motion::End => Some(match current {
                CursorTarget::Hex { .. } => CursorTarget::Hex {
                    word: (line_start + bpl - bpw).min(self.hex_limit()),
                    shift: 0,
                },
                CursorTarget::Char { .. } => CursorTarget::Char {
                    offset: (line_start + bpl - 1).min(self.buffer.len()),
                },
            }),
            Motion::BufferStart => Some(match current {
                CursorTarget::Hex { .. } => CursorTarget::Hex {
                    word: 0,
                    shift: max_shift,
                },
                CursorTarget::Char { .. } => CursorTarget::Char { offset: 0 },
            }),
            Motion::BufferEnd => Some(match current {
                CursorTarget::Hex { .. } => CursorTarget::Hex {
                    word: self.hex_limit(),
                    shift: max_shift,
                },
                CursorTarget::Char { .. } => CursorTarget::Char {
                    offset: self.buffer.len(),
                },
            }),
            Motion::PageUp => {
                let lines = self.cursor.line.min(self.page_lines());
                let lines = isize::try_from(lines).ok()?;
                self.shift_lines(current, -lines)
            }
            Motion::PageDown => {
                let last_line = self.lines_populated() - 1;
                let lines = last_line.saturating_sub(self.cursor.line).min(self.page_lines());
                let lines = isize::try_from(lines).ok()?;
                self.shift_lines(current, lines)
                    .map(|target| self.clamp_target(target))
            }
        }
    }

    /// ページ移動の行数
    fn page_lines(&self) -> usize {
        self.client_height().max(1)
    }

    /// カーソルを移動。移動したら true
    pub fn move_cursor(&mut self, motion: Motion) -> bool {
        let Some(target) = self.motion_target(motion) else {
            return false;
        };

        // ページ移動は表示位置も同じだけずらす
        match motion {
            Motion::PageUp => {
                let top = self.top.saturating_sub(self.page_lines());
                self.set_viewport(self.left, top);
            }
            Motion::PageDown => {
                let top = self.top + self.page_lines();
                self.set_viewport(self.left, top);
            }
            _ => {}
        }

        if target == self.cursor_target() {
            return false;
        }
        self.place_cursor(target);
        true
    }

    /// HEX欄と文字欄を切り替える（同じバイトのまま）
    pub fn toggle_side(&mut self) -> bool {
        let target = match self.cursor_target() {
            CursorTarget::Hex { word, shift } => CursorTarget::Char {
                offset: word + (shift / 8) as usize,
            },
            CursorTarget::Char { offset } => self.hex_target_for_byte(offset, 4),
        };
        let target = self.clamp_target(target);
        self.place_cursor(target);
        true
    }

    /// カーソルを置き、必要ならスクロールして通知する
    pub(super) fn place_cursor(&mut self, target: CursorTarget) {
        let (line, column) = self.cell_of(target);
        self.cursor.line = line;
        self.cursor.column = column;
        self.ensure_cursor_visible();
        self.notify_cursor_move();
    }

    /// 有効長が縮んだあとでカーソルを置ける範囲に戻す
    pub(super) fn clamp_cursor(&mut self) {
        let (line, column) = self.cell_of(self.clamp_target(self.cursor_target()));
        self.cursor.line = line;
        self.cursor.column = column;
    }

    pub(super) fn notify_cursor_move(&mut self) {
        let location = self.cursor_location();
        if let Some(callback) = self.on_cursor_move.as_mut() {
            // 語内のシフトは最大 4 なので u8 に収まる
            callback(location.offset as u64, location.bit_shift as u8);
        }
    }
}
