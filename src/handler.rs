//! # 命令处理逻辑模块
//!
//! 包含处理 `encode` 和 `decode` 子命令的高级业务逻辑。
//! 本模块负责校验参数、打开与关闭文件、调用隐写核心以及向用户报告结果。
//! 所有文件句柄都绑定在作用域上，无论成功还是失败都会被关闭。

use crate::capacity::{embeddable_content_bytes, ensure_capacity};
use crate::cli::{DecodeArgs, EncodeArgs};
use crate::codec::StegoCodec;
use crate::constants::{
    ALLOWED_PAYLOAD_EXTENSIONS, CARRIER_EXTENSION, DEFAULT_SECRET_NAME, DEFAULT_STEGO_NAME,
};
use crate::error::StegoError;
use crate::frame::Payload;
use anyhow::{Context, Result};
use colored::Colorize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

fn invalid(message: impl Into<String>) -> anyhow::Error {
    StegoError::InvalidArgument(message.into()).into()
}

fn has_carrier_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CARRIER_EXTENSION))
}

/// 校验秘密文件的扩展名，返回带点号的形式 (如 ".txt")。
pub fn payload_extension(path: &Path) -> Result<String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ALLOWED_PAYLOAD_EXTENSIONS.contains(&ext) => Ok(format!(".{ext}")),
        _ => Err(invalid(format!(
            "secret file must have one of the extensions .txt/.c/.sh: {}",
            path.to_string_lossy()
        ))),
    }
}

/// 确定 `encode` 的输出路径：未指定时使用 stego.bmp，指定时必须是 .bmp 文件。
pub fn stego_output_path(dest: Option<PathBuf>) -> Result<PathBuf> {
    match dest {
        None => Ok(PathBuf::from(DEFAULT_STEGO_NAME)),
        Some(dest) if has_carrier_extension(&dest) => Ok(dest),
        Some(dest) => Err(invalid(format!(
            "encoded image must be a .bmp file: {}",
            dest.to_string_lossy()
        ))),
    }
}

/// 确定 `decode` 输出文件的基础名：未指定时使用 secret_file，指定时文件名中不能含有点号。
pub fn secret_output_base(output: Option<PathBuf>) -> Result<PathBuf> {
    let Some(base) = output else {
        return Ok(PathBuf::from(DEFAULT_SECRET_NAME));
    };

    match base.file_name().and_then(|name| name.to_str()) {
        Some(name) if !name.contains('.') => Ok(base),
        _ => Err(invalid(format!(
            "do not include a file extension in the output name: {}",
            base.to_string_lossy()
        ))),
    }
}

/// 在基础名后追加恢复出的扩展名。扩展名为空时直接使用基础名。
///
/// 扩展名来自载体，属于不可信数据：只接受 "." 加上若干 ASCII 字母或数字。
pub fn secret_output_path(base: &Path, extension: &str) -> Result<PathBuf> {
    if extension.is_empty() {
        return Ok(base.to_path_buf());
    }

    let safe = extension
        .strip_prefix('.')
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_alphanumeric()));
    if !safe {
        return Err(invalid(format!(
            "recovered file extension {extension:?} is not a plain file extension"
        )));
    }

    let mut name = base.as_os_str().to_os_string();
    name.push(extension);
    Ok(PathBuf::from(name))
}

fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "Output file already exists: {} \nUse --force to overwrite it.",
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// 处理 'Encode' 命令的执行逻辑。
///
/// 负责校验参数、读取秘密文件、在创建输出文件之前检查容量，
/// 然后调用隐写核心把秘密文件写入新的图像。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径的 `EncodeArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 参数不合法 (扩展名不对、输出与输入相同、输出已存在且未指定 `--force`)。
/// * 无法读取载体图像或秘密文件。
/// * 图像没有足够的空间来隐藏秘密文件。
/// * 隐写过程中载体被截断或写入失败。
pub fn handle_encode(args: EncodeArgs) -> Result<PathBuf> {
    if !has_carrier_extension(&args.image) {
        return Err(invalid(format!(
            "source image must be a .bmp file: {}",
            args.image.to_string_lossy()
        )));
    }
    let extension = payload_extension(&args.secret)?;
    let dest = stego_output_path(args.dest)?;

    anyhow::ensure!(
        !same_file(&args.image, &dest),
        "The output image would overwrite the source image: {}",
        dest.to_string_lossy().red().bold()
    );
    ensure_writable(&dest, args.force)?;

    log::info!(
        "encoding {} into {} -> {}",
        args.secret.display(),
        args.image.display(),
        dest.display()
    );

    let content = fs::read(&args.secret).with_context(|| {
        format!(
            "Unable to read secret file: {}",
            args.secret.to_string_lossy().red().bold()
        )
    })?;
    let payload = Payload::new(extension, content);

    let source = File::open(&args.image).with_context(|| {
        format!(
            "Unable to read image file: {}",
            args.image.to_string_lossy().red().bold()
        )
    })?;
    let carrier_len = source.metadata()?.len();

    ensure_capacity(carrier_len, &payload).with_context(|| {
        format!(
            "Not enough space in the image to hide the secret file. \nImage can hold at most {} bytes, the secret file has {}",
            embeddable_content_bytes(carrier_len, &payload.extension)
                .to_string()
                .green()
                .bold(),
            payload.content.len().to_string().red().bold()
        )
    })?;

    let mut reader = BufReader::new(source);
    let mut writer = BufWriter::new(File::create(&dest).with_context(|| {
        format!(
            "Unable to create target image file: {}",
            dest.to_string_lossy().red().bold()
        )
    })?);

    let summary = StegoCodec::new()
        .encode(&mut reader, &payload, &mut writer)
        .with_context(|| {
            format!(
                "Failed to hide {} in {}. \nThe image file may be truncated or the target is not writable.",
                args.secret.to_string_lossy().red().bold(),
                args.image.to_string_lossy().red().bold()
            )
        })?;

    log::debug!(
        "{} of {} carrier bytes used",
        summary.required,
        summary.carrier_len
    );
    println!(
        "The secret file has been successfully hidden and saved: {}",
        dest.to_string_lossy().green().bold()
    );

    Ok(dest)
}

/// 处理 'Decode' 命令的执行逻辑。
///
/// 负责读取经过隐写的图像、调用恢复核心取出扩展名与内容，
/// 最后把内容写入 "基础名 + 扩展名" 的目标文件。
///
/// # Arguments
///
/// * `args` - 包含输入路径与可选输出基础名的 `DecodeArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 参数不合法或目标文件已存在且未指定 `--force`。
/// * 图像中没有隐藏数据，或数据已损坏。
/// * 无法写入目标文件。
pub fn handle_decode(args: DecodeArgs) -> Result<PathBuf> {
    if !has_carrier_extension(&args.image) {
        return Err(invalid(format!(
            "stego image must be a .bmp file: {}",
            args.image.to_string_lossy()
        )));
    }
    let base = secret_output_base(args.output)?;

    log::info!("decoding {}", args.image.display());

    let source = File::open(&args.image).with_context(|| {
        format!(
            "Unable to read image file: {}",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    let payload = StegoCodec::new()
        .decode(&mut BufReader::new(source))
        .map_err(|e| {
            let hint = match &e {
                StegoError::NotSteganographic => format!(
                    "The image does not contain any hidden data: {}",
                    args.image.to_string_lossy().red().bold()
                ),
                StegoError::ReadShortfall { .. } | StegoError::ImplausibleLength { .. } => {
                    format!(
                        "The hidden data in {} is truncated or corrupted.",
                        args.image.to_string_lossy().red().bold()
                    )
                }
                _ => format!(
                    "Failed to recover the secret file from {}",
                    args.image.to_string_lossy().red().bold()
                ),
            };
            anyhow::Error::new(e).context(hint)
        })?;

    let dest = secret_output_path(&base, &payload.extension)?;
    ensure_writable(&dest, args.force)?;

    fs::write(&dest, &payload.content).with_context(|| {
        format!(
            "Unable to write to target file: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    println!(
        "The secret file has been successfully recovered and saved: {}",
        dest.to_string_lossy().green().bold()
    );

    Ok(dest)
}
