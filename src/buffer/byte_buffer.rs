use super::BufferError;

/// 拡張時に余分に確保するバイト数
pub const GROWTH_SLACK: usize = 16 * 1024;
/// 大きな余裕が確保できなかった場合のフォールバック
pub const GROWTH_SLACK_SMALL: usize = 1024;

/// Vec が扱える最大サイズ
const MAX_ALLOCATION: usize = isize::MAX as usize;

/// 有効長と確保長を分けて管理するバイトバッファ
///
/// `data.len()` が確保済みの長さ、`valid` がその先頭のうち意味のあるデータの長さ。
/// `valid` より後ろの内容は不定で、有効長を伸ばすときにゼロで埋める。
#[derive(Debug, Default)]
pub struct ByteBuffer {
    /// 確保済み領域
    data: Vec<u8>,
    /// 有効なバイト数
    valid: usize,
}

impl ByteBuffer {
    /// 空のバッファを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 呼び出し側の Vec をそのまま引き取る（コピーなし）
    pub fn from_vec(data: Vec<u8>) -> Self {
        let valid = data.len();
        Self { data, valid }
    }

    /// 有効部分を Vec として引き渡し、自身は空になる（コピーなし）
    pub fn take(&mut self) -> Vec<u8> {
        let mut data = std::mem::take(&mut self.data);
        data.truncate(self.valid);
        self.valid = 0;
        data
    }

    /// 有効なバイト数
    pub fn len(&self) -> usize {
        self.valid
    }

    pub fn is_empty(&self) -> bool {
        self.valid == 0
    }

    /// 確保済みのバイト数
    pub fn allocated(&self) -> usize {
        self.data.len()
    }

    /// 有効部分への参照
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.valid]
    }

    /// 指定位置のバイトを取得
    pub fn get(&self, pos: usize) -> Option<u8> {
        self.as_slice().get(pos).copied()
    }

    /// 指定範囲のバイト列を取得（有効長でクランプ）
    pub fn range(&self, start: usize, end: usize) -> &[u8] {
        let end = end.min(self.valid);
        let start = start.min(end);
        &self.data[start..end]
    }

    /// 指定位置のバイトを設定
    pub fn set(&mut self, pos: usize, value: u8) -> Result<(), BufferError> {
        if pos >= self.valid {
            return Err(BufferError::OutOfBounds {
                offset: pos,
                valid: self.valid,
            });
        }
        self.data[pos] = value;
        Ok(())
    }

    /// バイト内の1ニブルを書き換える（`shift` は 0 または 4）
    pub fn set_nibble(&mut self, pos: usize, shift: u32, nibble: u8) -> Result<(), BufferError> {
        debug_assert!(shift == 0 || shift == 4);
        let current = self.get(pos).ok_or(BufferError::OutOfBounds {
            offset: pos,
            valid: self.valid,
        })?;
        let mask = 0x0F_u8 << shift;
        self.data[pos] = (current & !mask) | ((nibble & 0x0F) << shift);
        Ok(())
    }

    /// 有効長を全て破棄（確保領域は保持）
    pub fn clear(&mut self) {
        self.valid = 0;
    }

    /// 有効長を `new_valid` まで伸ばし、増えた部分をゼロで埋める
    pub fn grow_to(&mut self, new_valid: usize) -> Result<(), BufferError> {
        if new_valid <= self.valid {
            return Ok(());
        }
        self.reserve(new_valid)?;
        self.data[self.valid..new_valid].fill(0);
        self.valid = new_valid;
        Ok(())
    }

    /// `offset` にバイト列を挿入し、後続データを後ろへずらす
    pub fn insert(&mut self, offset: usize, bytes: &[u8]) -> Result<(), BufferError> {
        self.check_offset(offset)?;
        if bytes.is_empty() {
            return Ok(());
        }
        let new_valid = self
            .valid
            .checked_add(bytes.len())
            .ok_or(BufferError::AllocationFailed { requested: usize::MAX })?;
        self.reserve(new_valid)?;
        self.data.copy_within(offset..self.valid, offset + bytes.len());
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.valid = new_valid;
        Ok(())
    }

    /// `offset` からバイト列を上書き（有効長を超える分は伸ばす）
    pub fn replace(&mut self, offset: usize, bytes: &[u8]) -> Result<(), BufferError> {
        self.check_offset(offset)?;
        let end = offset
            .checked_add(bytes.len())
            .ok_or(BufferError::AllocationFailed { requested: usize::MAX })?;
        if end > self.valid {
            self.reserve(end)?;
            self.valid = end;
        }
        self.data[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    /// `offset` から最大 `len` バイトを削除し、実際に削除した数を返す
    pub fn delete(&mut self, offset: usize, len: usize) -> Result<usize, BufferError> {
        self.check_offset(offset)?;
        let end = offset.saturating_add(len).min(self.valid);
        let count = end - offset;
        self.data.copy_within(end..self.valid, offset);
        self.valid -= count;
        Ok(count)
    }

    fn check_offset(&self, offset: usize) -> Result<(), BufferError> {
        if offset > self.valid {
            Err(BufferError::OutOfBounds {
                offset,
                valid: self.valid,
            })
        } else {
            Ok(())
        }
    }

    /// 少なくとも `required` バイトを確保する
    ///
    /// 小さな編集の繰り返しで再確保が続かないよう、+16KiB、+1KiB、ちょうど、の順に試す。
    pub fn reserve(&mut self, required: usize) -> Result<(), BufferError> {
        let allocated = self.data.len();
        if required <= allocated {
            return Ok(());
        }
        if required > MAX_ALLOCATION {
            log::warn!("buffer growth to {required} bytes is not representable");
            return Err(BufferError::AllocationFailed { requested: required });
        }

        let candidates = [
            required.checked_add(GROWTH_SLACK),
            required.checked_add(GROWTH_SLACK_SMALL),
            Some(required),
        ];
        for target in candidates.into_iter().flatten() {
            if target > MAX_ALLOCATION {
                continue;
            }
            if self.data.try_reserve_exact(target - allocated).is_ok() {
                self.data.resize(target, 0);
                log::debug!("buffer grown from {allocated} to {target} bytes");
                return Ok(());
            }
        }

        log::warn!("failed to grow buffer to {required} bytes");
        Err(BufferError::AllocationFailed { requested: required })
    }
}
