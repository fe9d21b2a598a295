//! # 帧结构模块
//!
//! 嵌入区域中的数据按固定顺序排列：
//! 魔数标记 → 扩展名长度 → 扩展名 → 内容长度 → 内容。
//! 区段顺序以数据 (`FRAME_LAYOUT`) 的形式给出，编码与解码都只是按顺序遍历它。

use crate::constants::{
    BYTES_PER_CHAR, LENGTH_HIDING_BYTES, MAGIC_MARKER, MAX_EXTENSION_LEN, PREALLOC_LIMIT,
};
use crate::error::{Result, StegoError};
use crate::session::{Session, Stage};
use crate::steganography::{decode_byte, decode_u32, encode_byte, encode_u32};
use std::io::{ErrorKind, Read, Write};

/// 要隐藏 (或已恢复) 的秘密文件：扩展名 (含点号，如 ".txt") 加上文件内容。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub extension: String,
    pub content: Vec<u8>,
}

impl Payload {
    pub fn new(extension: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            extension: extension.into(),
            content: content.into(),
        }
    }

    /// 确认两个长度都能写进 32 位长度字段。
    pub fn validate(&self) -> Result<()> {
        length_field(Section::ExtensionLength, self.extension.len())?;
        length_field(Section::ContentLength, self.content.len())?;
        Ok(())
    }
}

/// 帧中的一个区段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Magic,
    ExtensionLength,
    Extension,
    ContentLength,
    Content,
}

/// 嵌入区域中各区段的先后顺序。
pub const FRAME_LAYOUT: [Section; 5] = [
    Section::Magic,
    Section::ExtensionLength,
    Section::Extension,
    Section::ContentLength,
    Section::Content,
];

impl Section {
    pub fn name(self) -> &'static str {
        match self {
            Section::Magic => "magic marker",
            Section::ExtensionLength => "extension length",
            Section::Extension => "file extension",
            Section::ContentLength => "content length",
            Section::Content => "file content",
        }
    }

    /// 该区段处理完成后会话进入的阶段。
    pub fn completes(self) -> Stage {
        match self {
            Section::Magic => Stage::MagicHandled,
            Section::ExtensionLength => Stage::ExtnLenHandled,
            Section::Extension => Stage::ExtnHandled,
            Section::ContentLength => Stage::SizeHandled,
            Section::Content => Stage::DataHandled,
        }
    }
}

/// 解码时对载体中读出的长度字段施加的固定上限。
///
/// 超过上限返回 `ImplausibleLength`；未超过上限但载体剩余字节放不下时返回 `ReadShortfall`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLimits {
    pub max_extension_len: u32,
    pub max_content_len: u32,
}

impl Default for FrameLimits {
    fn default() -> Self {
        Self {
            max_extension_len: MAX_EXTENSION_LEN,
            max_content_len: u32::MAX,
        }
    }
}

fn length_field(section: Section, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| StegoError::PayloadTooLarge {
        section: section.name(),
        len,
    })
}

/// 从 `reader` 读满 `block`。流提前结束时返回 `ReadShortfall`。
fn read_block<R: Read>(
    reader: &mut R,
    block: &mut [u8],
    section: Section,
    session: &mut Session,
) -> Result<()> {
    let mut filled = 0;
    while filled < block.len() {
        match reader.read(&mut block[filled..]) {
            Ok(0) => {
                return Err(StegoError::ReadShortfall {
                    section: section.name(),
                    needed: block.len(),
                    available: filled,
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    session.consume(filled);
    Ok(())
}

fn encode_bytes_section<R: Read, W: Write>(
    data: &[u8],
    section: Section,
    reader: &mut R,
    writer: &mut W,
    session: &mut Session,
) -> Result<()> {
    let mut block = [0u8; BYTES_PER_CHAR];
    for &byte in data {
        read_block(reader, &mut block, section, session)?;
        encode_byte(byte, &mut block);
        writer.write_all(&block)?;
    }
    Ok(())
}

fn encode_length_section<R: Read, W: Write>(
    len: usize,
    section: Section,
    reader: &mut R,
    writer: &mut W,
    session: &mut Session,
) -> Result<()> {
    let value = length_field(section, len)?;
    let mut block = [0u8; LENGTH_HIDING_BYTES];
    read_block(reader, &mut block, section, session)?;
    encode_u32(value, &mut block);
    writer.write_all(&block)?;
    Ok(())
}

fn decode_bytes_section<R: Read>(
    count: usize,
    section: Section,
    reader: &mut R,
    session: &mut Session,
) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(count.min(PREALLOC_LIMIT));
    let mut block = [0u8; BYTES_PER_CHAR];
    for _ in 0..count {
        read_block(reader, &mut block, section, session)?;
        data.push(decode_byte(&block));
    }
    Ok(data)
}

/// 读取一个长度字段，`data` 是该长度所描述的后续数据区段。
fn decode_length_section<R: Read>(
    limit: u32,
    section: Section,
    data: Section,
    reader: &mut R,
    session: &mut Session,
) -> Result<u32> {
    let mut block = [0u8; LENGTH_HIDING_BYTES];
    read_block(reader, &mut block, section, session)?;
    let declared = decode_u32(&block);

    if declared > limit {
        return Err(StegoError::ImplausibleLength {
            section: section.name(),
            declared,
            limit,
        });
    }

    // 载体长度已知时，在读取之前就判断剩余字节能否装下后续数据
    let needed = declared as u64 * BYTES_PER_CHAR as u64;
    if let Some(available) = session.remaining().filter(|&available| available < needed) {
        return Err(StegoError::ReadShortfall {
            section: data.name(),
            needed: needed as usize,
            available: available as usize,
        });
    }
    Ok(declared)
}

/// 载体长度已知时，确认剩余字节至少能放下魔数标记与扩展名长度字段。
/// 连这一前缀都放不下的载体直接视为被截断，而不去比较魔数。
fn ensure_frame_prefix(session: &Session) -> Result<()> {
    let marker = MAGIC_MARKER.len() * BYTES_PER_CHAR;
    let Some(available) = session.remaining() else {
        return Ok(());
    };
    let available = available as usize;

    if available < marker {
        return Err(StegoError::ReadShortfall {
            section: Section::Magic.name(),
            needed: marker,
            available,
        });
    }
    if available < marker + LENGTH_HIDING_BYTES {
        return Err(StegoError::ReadShortfall {
            section: Section::ExtensionLength.name(),
            needed: LENGTH_HIDING_BYTES,
            available: available - marker,
        });
    }
    Ok(())
}

/// 将 `payload` 按帧结构隐写进从 `reader` 读出的载体字节，并把修改后的字节写入 `writer`。
///
/// 每处理完一个区段，`session` 前进一个阶段。
///
/// # Errors
///
/// * 载体在某个区段完成之前耗尽时返回 `ReadShortfall`。
/// * 扩展名或内容的长度超出 32 位时返回 `PayloadTooLarge`。
/// * 读写失败时返回 `Io`。
pub fn frame_encode<R: Read, W: Write>(
    payload: &Payload,
    reader: &mut R,
    writer: &mut W,
    session: &mut Session,
) -> Result<()> {
    payload.validate()?;

    for section in FRAME_LAYOUT {
        match section {
            Section::Magic => encode_bytes_section(MAGIC_MARKER, section, reader, writer, session),
            Section::ExtensionLength => {
                encode_length_section(payload.extension.len(), section, reader, writer, session)
            }
            Section::Extension => encode_bytes_section(
                payload.extension.as_bytes(),
                section,
                reader,
                writer,
                session,
            ),
            Section::ContentLength => {
                encode_length_section(payload.content.len(), section, reader, writer, session)
            }
            Section::Content => {
                encode_bytes_section(&payload.content, section, reader, writer, session)
            }
        }?;
        log::trace!("encoded {}", section.name());
        session.advance(section.completes());
    }

    Ok(())
}

/// 从 `reader` (已定位到嵌入区域起点) 中按帧结构恢复秘密文件。
///
/// # Errors
///
/// * 魔数标记不匹配时返回 `NotSteganographic`。
/// * 长度字段超出 `limits` 时返回 `ImplausibleLength`。
/// * 载体提前结束，或长度字段描述的数据超出剩余载体时返回 `ReadShortfall`。
/// * 扩展名不是 UTF-8 时返回 `InvalidExtension`。
pub fn frame_decode<R: Read>(
    reader: &mut R,
    limits: &FrameLimits,
    session: &mut Session,
) -> Result<Payload> {
    let mut extension_len = 0;
    let mut content_len = 0;
    let mut payload = Payload::new(String::new(), Vec::<u8>::new());

    ensure_frame_prefix(session)?;

    for section in FRAME_LAYOUT {
        match section {
            Section::Magic => {
                let marker = decode_bytes_section(MAGIC_MARKER.len(), section, reader, session)?;
                if marker != MAGIC_MARKER {
                    log::debug!("magic marker mismatch: {:02x?}", marker);
                    return Err(StegoError::NotSteganographic);
                }
            }
            Section::ExtensionLength => {
                extension_len = decode_length_section(
                    limits.max_extension_len,
                    section,
                    Section::Extension,
                    reader,
                    session,
                )?;
            }
            Section::Extension => {
                let bytes = decode_bytes_section(extension_len as usize, section, reader, session)?;
                payload.extension =
                    String::from_utf8(bytes).map_err(|_| StegoError::InvalidExtension)?;
            }
            Section::ContentLength => {
                content_len = decode_length_section(
                    limits.max_content_len,
                    section,
                    Section::Content,
                    reader,
                    session,
                )?;
            }
            Section::Content => {
                payload.content =
                    decode_bytes_section(content_len as usize, section, reader, session)?;
            }
        }
        log::trace!("decoded {}", section.name());
        session.advance(section.completes());
    }

    Ok(payload)
}
