//! # LSB 位编解码模块
//!
//! 每个载体字节只使用最低有效位 (bit 0) 承载一个数据位，
//! 多位数值按最高位优先 (MSB first) 依次写入连续的载体字节。

/// 将 `bit` (只取其最低位) 写入 `carrier` 的最低有效位，其余 7 位保持不变。
#[inline]
pub fn embed_bit(carrier: u8, bit: u8) -> u8 {
    (carrier & !1) | (bit & 1)
}

/// 读取 `carrier` 的最低有效位。
#[inline]
pub fn extract_bit(carrier: u8) -> u8 {
    carrier & 1
}

fn modify(value: u32, carrier: &mut [u8]) {
    let width = carrier.len();
    debug_assert!(width <= u32::BITS as usize);

    for (i, byte) in carrier.iter_mut().enumerate() {
        let bit = (value >> (width - 1 - i)) & 1;
        *byte = embed_bit(*byte, bit as u8);
    }
}

fn recover(carrier: &[u8]) -> u32 {
    debug_assert!(carrier.len() <= u32::BITS as usize);

    carrier
        .iter()
        .fold(0u32, |acc, &byte| (acc << 1) | extract_bit(byte) as u32)
}

/// 将一个字节隐写进 8 个载体字节。
pub fn encode_byte(value: u8, carrier: &mut [u8; 8]) {
    modify(value as u32, carrier);
}

/// 从 8 个载体字节中恢复一个字节。
pub fn decode_byte(carrier: &[u8; 8]) -> u8 {
    recover(carrier) as u8
}

/// 将一个 32 位无符号整数隐写进 32 个载体字节 (bit 31 在前)。
pub fn encode_u32(value: u32, carrier: &mut [u8; 32]) {
    modify(value, carrier);
}

/// 从 32 个载体字节中恢复一个 32 位无符号整数。
pub fn decode_u32(carrier: &[u8; 32]) -> u32 {
    recover(carrier)
}
