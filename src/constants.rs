/// BMP 文件的标准头部大小 (字节)。
/// 头部原样复制，隐写操作从其后的第一个字节开始。
pub const BMP_HEADER_SIZE: usize = 54;

/// 标识载体中存在隐藏数据的魔数标记。
pub const MAGIC_MARKER: &[u8] = b"#*";

/// 隐写单个数据字节所需的载体字节数。
/// 每个载体字节只承载 1 bit (最低有效位)，因此需要 8 个载体字节。
pub const BYTES_PER_CHAR: usize = 8;

/// 隐写一个 32 位长度字段所需的载体字节数。
pub const LENGTH_HIDING_BYTES: usize = 32;

/// 长度字段在逻辑上占用的字节数 (容量计算时再乘以 8)。
pub const LENGTH_FIELD_SIZE: usize = 4;

/// 解码时允许的最大扩展名长度 (字节)。
/// 从载体中读出的长度不可信，超过此值直接拒绝。
pub const MAX_EXTENSION_LEN: u32 = 255;

/// 单次解码时预先分配的内容缓冲区上限 (字节)。
pub const PREALLOC_LIMIT: usize = 64 * 1024;

/// `encode` 未指定输出文件时使用的默认文件名。
pub const DEFAULT_STEGO_NAME: &str = "stego.bmp";

/// `decode` 未指定输出文件时使用的默认基础文件名 (扩展名从载体中恢复)。
pub const DEFAULT_SECRET_NAME: &str = "secret_file";

/// 载体图像与输出图像必须使用的扩展名。
pub const CARRIER_EXTENSION: &str = "bmp";

/// 允许隐藏的秘密文件扩展名。
pub const ALLOWED_PAYLOAD_EXTENSIONS: &[&str] = &["txt", "c", "sh"];
