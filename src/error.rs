//! # 错误类型模块
//!
//! 定义隐写核心在编码、解码过程中可能返回的全部错误种类。

use thiserror::Error;

/// 核心操作使用的 `Result` 别名。
pub type Result<T> = std::result::Result<T, StegoError>;

/// 隐写核心与命令行层共用的错误类型。
#[derive(Error, Debug)]
pub enum StegoError {
    /// 载体 (或输入流) 中剩余的字节不足以完成当前区段
    #[error("Carrier ended while reading the {section}: needed {needed} bytes, got {available}")]
    ReadShortfall {
        section: &'static str,
        needed: usize,
        available: usize,
    },

    /// 魔数标记不匹配，载体中没有可识别的隐藏数据
    #[error("The carrier does not contain any hidden data")]
    NotSteganographic,

    /// 载体太小，无法容纳整个帧
    #[error("Not enough space in the carrier: required {required} bytes, available {available} bytes")]
    InsufficientCapacity { required: u64, available: u64 },

    /// 从载体中解出的长度字段超出了允许的上限
    #[error("Implausible {section}: declared {declared}, limit {limit}")]
    ImplausibleLength {
        section: &'static str,
        declared: u32,
        limit: u32,
    },

    /// 待写入的长度无法放进 32 位长度字段
    #[error("The {section} is too large for a 32-bit length field: {len}")]
    PayloadTooLarge { section: &'static str, len: usize },

    /// 恢复出的扩展名不是合法的 UTF-8
    #[error("The hidden file extension is not valid UTF-8")]
    InvalidExtension,

    /// 命令行层面的参数校验失败
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 其余所有 `std::io::Error`
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
