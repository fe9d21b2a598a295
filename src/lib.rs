//! # bmp_stego 库
//!
//! 本库包含 BMP 图像 LSB 隐写工具的核心逻辑：
//! 位编解码 (`steganography`)、帧结构 (`frame`)、容量规划 (`capacity`)
//! 以及驱动整个流程的编排器 (`codec`)。

// 声明库包含的所有模块。

pub mod capacity;
pub mod cli;
pub mod codec;
pub mod constants;
pub mod error;
pub mod frame;
pub mod handler;
pub mod session;
pub mod steganography;

pub use codec::{EncodeSummary, StegoCodec, decode_bytes, encode_bytes};
pub use error::{Result, StegoError};
pub use frame::{FrameLimits, Payload};
