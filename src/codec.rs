//! # 隐写编排模块
//!
//! 驱动完整的编码与解码流水线：复制头部、检查容量、按帧结构逐段处理、复制剩余数据。
//! 每次操作都会创建一个新的 `Session`，遇到第一个错误即中止并原样返回该错误。

use crate::capacity::ensure_capacity;
use crate::constants::BMP_HEADER_SIZE;
use crate::error::{Result, StegoError};
use crate::frame::{FrameLimits, Payload, frame_decode, frame_encode};
use crate::session::{Session, Stage};
use std::io::{self, Cursor, ErrorKind, Read, Seek, SeekFrom, Write};

const HEADER_SECTION: &str = "bitmap header";

/// 一次成功编码的结果信息。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSummary {
    /// 载体 (以及输出图像) 的总字节数
    pub carrier_len: u64,
    /// 帧实际占用的载体字节数 (包含头部)
    pub required: u64,
}

/// 编码/解码的编排器。
#[derive(Debug)]
pub struct StegoCodec {
    limits: Option<FrameLimits>,
    last_stage: Stage,
}

impl Default for StegoCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl StegoCodec {
    pub fn new() -> Self {
        Self {
            limits: None,
            last_stage: Stage::Idle,
        }
    }

    /// 使用自定义的解码上限代替默认值。
    pub fn with_limits(limits: FrameLimits) -> Self {
        Self {
            limits: Some(limits),
            last_stage: Stage::Idle,
        }
    }

    /// 最近一次操作结束时所处的阶段。
    pub fn last_stage(&self) -> Stage {
        self.last_stage
    }

    /// 将 `payload` 隐写进 `source`，结果写入 `dest`。
    ///
    /// 输出与输入大小相同：头部原样复制，帧之后的剩余字节原样复制。
    /// 容量不足时在写出任何字节之前返回 `InsufficientCapacity`。
    ///
    /// # Errors
    ///
    /// 返回遇到的第一个错误。已经写入 `dest` 的字节不会回滚。
    pub fn encode<R, W>(
        &mut self,
        source: &mut R,
        payload: &Payload,
        dest: &mut W,
    ) -> Result<EncodeSummary>
    where
        R: Read + Seek,
        W: Write,
    {
        let mut session = Session::new();
        let result = run_encode(source, payload, dest, &mut session);
        self.finish(session, result)
    }

    /// 从 `source` 中恢复隐藏的文件。
    ///
    /// # Errors
    ///
    /// * `NotSteganographic`：载体中没有魔数标记。
    /// * `ReadShortfall`：载体被截断。
    /// * `ImplausibleLength`：长度字段超出上限。
    pub fn decode<R>(&mut self, source: &mut R) -> Result<Payload>
    where
        R: Read + Seek,
    {
        let mut session = Session::new();
        let result = run_decode(source, self.limits, &mut session);
        self.finish(session, result)
    }

    fn finish<T>(&mut self, mut session: Session, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            log::warn!(
                "aborted after {} ({} carrier bytes read): {}",
                session.stage(),
                session.consumed(),
                e
            );
            session.fail();
        }
        self.last_stage = session.stage();
        result
    }
}

/// 在内存中完成编码，返回新的载体字节。
pub fn encode_bytes(carrier: &[u8], payload: &Payload) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(carrier.len());
    StegoCodec::new().encode(&mut Cursor::new(carrier), payload, &mut out)?;
    Ok(out)
}

/// 在内存中完成解码。
pub fn decode_bytes(carrier: &[u8]) -> Result<Payload> {
    StegoCodec::new().decode(&mut Cursor::new(carrier))
}

fn stream_len<S: Seek>(stream: &mut S) -> io::Result<u64> {
    let len = stream.seek(SeekFrom::End(0))?;
    stream.rewind()?;
    Ok(len)
}

fn header_shortfall(carrier_len: u64) -> StegoError {
    StegoError::ReadShortfall {
        section: HEADER_SECTION,
        needed: BMP_HEADER_SIZE,
        available: carrier_len as usize,
    }
}

fn copy_header<R: Read, W: Write>(
    source: &mut R,
    dest: &mut W,
    carrier_len: u64,
    session: &mut Session,
) -> Result<()> {
    let mut header = [0u8; BMP_HEADER_SIZE];
    source.read_exact(&mut header).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => header_shortfall(carrier_len),
        _ => e.into(),
    })?;
    dest.write_all(&header)?;
    session.consume(BMP_HEADER_SIZE);
    Ok(())
}

fn run_encode<R, W>(
    source: &mut R,
    payload: &Payload,
    dest: &mut W,
    session: &mut Session,
) -> Result<EncodeSummary>
where
    R: Read + Seek,
    W: Write,
{
    let carrier_len = stream_len(source)?;
    session.set_carrier_len(carrier_len);
    let required = ensure_capacity(carrier_len, payload)?;
    log::info!(
        "carrier has {} bytes, frame needs {} ({} bytes of content)",
        carrier_len,
        required,
        payload.content.len()
    );

    copy_header(source, dest, carrier_len, session)?;
    session.advance(Stage::HeaderHandled);

    frame_encode(payload, source, dest, session)?;

    let remainder = io::copy(source, dest)?;
    dest.flush()?;
    log::debug!("copied {} untouched carrier bytes", remainder);
    session.advance(Stage::Done);

    Ok(EncodeSummary {
        carrier_len,
        required,
    })
}

fn run_decode<R>(
    source: &mut R,
    limits: Option<FrameLimits>,
    session: &mut Session,
) -> Result<Payload>
where
    R: Read + Seek,
{
    let carrier_len = stream_len(source)?;
    session.set_carrier_len(carrier_len);
    if carrier_len < BMP_HEADER_SIZE as u64 {
        return Err(header_shortfall(carrier_len));
    }
    source.seek(SeekFrom::Start(BMP_HEADER_SIZE as u64))?;
    session.consume(BMP_HEADER_SIZE);
    session.advance(Stage::HeaderHandled);

    let limits = limits.unwrap_or_default();
    let payload = frame_decode(source, &limits, session)?;
    log::info!(
        "recovered {} bytes with extension {:?}",
        payload.content.len(),
        payload.extension
    );
    session.advance(Stage::Done);

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::required_carrier_bytes;
    use crate::constants::MAGIC_MARKER;
    use crate::steganography::encode_byte;
    use rand::RngCore;

    fn random_carrier(len: usize) -> Vec<u8> {
        let mut carrier = vec![0u8; len];
        rand::rng().fill_bytes(&mut carrier);
        carrier
    }

    #[test]
    fn hello_txt_round_trip() {
        let payload = Payload::new(".txt", b"hello".to_vec());
        let mut carrier = vec![0u8; BMP_HEADER_SIZE];
        carrier.extend(random_carrier(400));

        let stego = encode_bytes(&carrier, &payload).unwrap();
        assert_eq!(stego.len(), carrier.len());

        let recovered = decode_bytes(&stego).unwrap();
        assert_eq!(recovered.extension, ".txt");
        assert_eq!(recovered.content, b"hello");
    }

    #[test]
    fn header_and_tail_are_untouched() {
        let payload = Payload::new(".c", b"int main(void) { return 0; }".to_vec());
        let carrier = random_carrier(2048);
        let stego = encode_bytes(&carrier, &payload).unwrap();

        let used = required_carrier_bytes(&payload) as usize;
        assert_eq!(stego[..BMP_HEADER_SIZE], carrier[..BMP_HEADER_SIZE]);
        assert_eq!(stego[used..], carrier[used..]);
        for (a, b) in carrier[BMP_HEADER_SIZE..used]
            .iter()
            .zip(&stego[BMP_HEADER_SIZE..used])
        {
            assert_eq!(a & 0xFE, b & 0xFE);
        }
    }

    #[test]
    fn capacity_boundary() {
        let payload = Payload::new(".txt", b"boundary".to_vec());
        let required = required_carrier_bytes(&payload) as usize;

        let exact = random_carrier(required);
        let stego = encode_bytes(&exact, &payload).unwrap();
        assert_eq!(decode_bytes(&stego).unwrap(), payload);

        let short = random_carrier(required - 1);
        let mut out = Vec::<u8>::new();
        let mut codec = StegoCodec::new();
        let err = codec
            .encode(&mut Cursor::new(&short[..]), &payload, &mut out)
            .unwrap_err();
        assert!(matches!(err, StegoError::InsufficientCapacity { .. }));
        assert!(out.is_empty(), "nothing may be written when capacity is short");
        assert_eq!(codec.last_stage(), Stage::Failed);
    }

    #[test]
    fn stage_reaches_done_on_success() {
        let payload = Payload::new(".sh", b"ls".to_vec());
        let carrier = random_carrier(1024);
        let mut out = Vec::<u8>::new();
        let mut codec = StegoCodec::new();

        let summary = codec
            .encode(&mut Cursor::new(&carrier[..]), &payload, &mut out)
            .unwrap();
        assert_eq!(codec.last_stage(), Stage::Done);
        assert_eq!(summary.carrier_len, 1024);
        assert_eq!(summary.required, required_carrier_bytes(&payload));

        codec.decode(&mut Cursor::new(&out[..])).unwrap();
        assert_eq!(codec.last_stage(), Stage::Done);
    }

    #[test]
    fn plain_carrier_is_not_steganographic() {
        let mut carrier = vec![0u8; 1024];
        encode_byte(b'*', (&mut carrier[54..62]).try_into().unwrap());
        encode_byte(b'#', (&mut carrier[62..70]).try_into().unwrap());

        let mut codec = StegoCodec::new();
        let err = codec.decode(&mut Cursor::new(&carrier[..])).unwrap_err();
        assert!(matches!(err, StegoError::NotSteganographic));
        assert_eq!(codec.last_stage(), Stage::Failed);
    }

    #[test]
    fn truncated_carrier_is_a_read_shortfall() {
        // 头部 + 魔数，但放不下扩展名长度字段
        let mut carrier = vec![0u8; BMP_HEADER_SIZE + 16 + 10];
        for (i, &byte) in MAGIC_MARKER.iter().enumerate() {
            let start = BMP_HEADER_SIZE + i * 8;
            encode_byte(byte, (&mut carrier[start..start + 8]).try_into().unwrap());
        }
        let err = decode_bytes(&carrier).unwrap_err();
        assert!(matches!(
            err,
            StegoError::ReadShortfall {
                section: "extension length",
                needed: 32,
                available: 10,
            }
        ));

        let err = decode_bytes(&[0u8; 40]).unwrap_err();
        assert!(matches!(
            err,
            StegoError::ReadShortfall {
                section: HEADER_SECTION,
                ..
            }
        ));
    }

    #[test]
    fn all_zero_carrier_too_short_for_the_length_field_is_a_read_shortfall() {
        // 魔数区域可以读出，但后面放不下扩展名长度字段
        let err = decode_bytes(&vec![0u8; BMP_HEADER_SIZE + 20]).unwrap_err();
        assert!(matches!(
            err,
            StegoError::ReadShortfall {
                section: "extension length",
                needed: 32,
                available: 4,
            }
        ));

        let err = decode_bytes(&vec![0u8; BMP_HEADER_SIZE + 16 + 31]).unwrap_err();
        assert!(matches!(err, StegoError::ReadShortfall { .. }));

        // 前缀完整时才比较魔数
        let err = decode_bytes(&vec![0u8; BMP_HEADER_SIZE + 16 + 32]).unwrap_err();
        assert!(matches!(err, StegoError::NotSteganographic));
    }

    #[test]
    fn stego_file_cut_inside_the_content_is_a_read_shortfall() {
        let payload = Payload::new(".txt", vec![b'x'; 28]);
        let stego = encode_bytes(&vec![0x55u8; 1024], &payload).unwrap();
        let required = required_carrier_bytes(&payload) as usize;

        // 浅截断与深截断得到同一种错误
        for cut in [24, 80, 28 * 8] {
            let err = decode_bytes(&stego[..required - cut]).unwrap_err();
            match err {
                StegoError::ReadShortfall {
                    section,
                    needed,
                    available,
                } => {
                    assert_eq!(section, "file content", "cut of {cut} bytes");
                    assert_eq!(needed, 28 * 8);
                    assert_eq!(available, 28 * 8 - cut);
                }
                other => panic!("cut of {cut} bytes: unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn corrupted_content_length_is_a_read_shortfall() {
        let payload = Payload::new(".txt", b"abc".to_vec());
        let carrier = random_carrier(512);
        let mut stego = encode_bytes(&carrier, &payload).unwrap();

        // 把内容长度字段的最高位改成 1
        let content_len_at = BMP_HEADER_SIZE + 8 * (MAGIC_MARKER.len() + 4 + 4);
        stego[content_len_at] |= 1;

        let err = decode_bytes(&stego).unwrap_err();
        assert!(matches!(
            err,
            StegoError::ReadShortfall {
                section: "file content",
                ..
            }
        ));

        // 自定义的固定上限仍然报告 ImplausibleLength
        let mut codec = StegoCodec::with_limits(FrameLimits {
            max_extension_len: 8,
            max_content_len: 2,
        });
        let err = codec
            .decode(&mut Cursor::new(&encode_bytes(&carrier, &payload).unwrap()[..]))
            .unwrap_err();
        assert!(matches!(err, StegoError::ImplausibleLength { limit: 2, .. }));
        assert_eq!(codec.last_stage(), Stage::Failed);
    }
}
