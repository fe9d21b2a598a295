//! # 容量规划模块
//!
//! 在写入任何输出之前计算帧所需的载体字节数，并与载体实际大小比较。

use crate::constants::{BMP_HEADER_SIZE, BYTES_PER_CHAR, LENGTH_FIELD_SIZE, MAGIC_MARKER};
use crate::error::{Result, StegoError};
use crate::frame::Payload;

/// 帧中与内容无关的固定部分 (魔数 + 两个长度字段 + 扩展名) 的逻辑字节数。
fn fixed_frame_bytes(extension_len: usize) -> u64 {
    (MAGIC_MARKER.len() + LENGTH_FIELD_SIZE + extension_len + LENGTH_FIELD_SIZE) as u64
}

/// 隐写 `payload` 所需的载体总字节数 (包含 54 字节头部)。
pub fn required_carrier_bytes(payload: &Payload) -> u64 {
    let frame = fixed_frame_bytes(payload.extension.len()) + payload.content.len() as u64;
    BMP_HEADER_SIZE as u64 + frame * BYTES_PER_CHAR as u64
}

pub fn has_capacity(carrier_len: u64, payload: &Payload) -> bool {
    carrier_len >= required_carrier_bytes(payload)
}

/// 检查容量，不足时返回 `InsufficientCapacity`。成功时返回所需字节数。
pub fn ensure_capacity(carrier_len: u64, payload: &Payload) -> Result<u64> {
    let required = required_carrier_bytes(payload);
    if carrier_len < required {
        return Err(StegoError::InsufficientCapacity {
            required,
            available: carrier_len,
        });
    }
    Ok(required)
}

/// 在给定扩展名的前提下，`carrier_len` 字节的载体最多能隐藏多少字节内容。
pub fn embeddable_content_bytes(carrier_len: u64, extension: &str) -> u64 {
    let overhead =
        BMP_HEADER_SIZE as u64 + fixed_frame_bytes(extension.len()) * BYTES_PER_CHAR as u64;
    carrier_len.saturating_sub(overhead) / BYTES_PER_CHAR as u64
}
