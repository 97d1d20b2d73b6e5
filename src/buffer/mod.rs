mod byte_buffer;

pub use byte_buffer::{ByteBuffer, GROWTH_SLACK, GROWTH_SLACK_SMALL};

use thiserror::Error;

/// バッファ操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// 要求サイズを確保できない（表現不能なサイズを含む）
    #[error("cannot allocate a buffer of {requested} bytes")]
    AllocationFailed { requested: usize },

    /// 有効長を超えるオフセット
    #[error("offset {offset:#x} is beyond the valid length {valid:#x}")]
    OutOfBounds { offset: usize, valid: usize },
}
