//! # ICO 容器模块
//!
//! ## 设计思路
//!
//! ICO 布局是与操作系统图标读取器之间的字节级契约，偏移与长度必须精确：
//!
//! ```text
//! ICONDIR        reserved(u16=0) type(u16=1) count(u16)
//! ICONDIRENTRY   width(u8, 0=256) height(u8, 0=256) colors(u8=0) reserved(u8=0)
//!  × count       planes(u16=1) bit_count(u16=32) bytes(u32) offset(u32)
//! image data     按目录顺序依次排列：BMP-DIB 或完整 PNG 流
//! ```
//!
//! ## 实现思路
//!
//! - 先在内存中把每帧负载编码完成，再按顺序累加偏移写目录，最后拼接负载。
//! - BMP-DIB：BITMAPINFOHEADER（biHeight 为两倍高度）+ 自底向上 BGRA + 1bpp AND 掩码。
//! - `IcoDirectory::parse` 把写出的字节重新解析，并校验每个数据块都落在文件内。

use std::path::Path;

use image::RgbaImage;

use super::output::OutputBatch;
use super::png::encode_png;
use super::{FaviconError, Frame, FrameEncoding};

/// ICO 目录项可描述的最大边长。
pub const ICO_MAX_DIMENSION: u32 = 256;

const ICONDIR_SIZE: usize = 6;
const ICONDIRENTRY_SIZE: usize = 16;
const BITMAPINFOHEADER_SIZE: u32 = 40;
const RESOURCE_TYPE_ICON: u16 = 1;
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// 帧负载类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Png,
    Bmp,
}

impl PayloadKind {
    fn for_frame(frame: &Frame, encoding: FrameEncoding) -> Self {
        match encoding {
            FrameEncoding::Png => Self::Png,
            FrameEncoding::Bmp => Self::Bmp,
            FrameEncoding::Auto if frame.size() >= ICO_MAX_DIMENSION => Self::Png,
            FrameEncoding::Auto => Self::Bmp,
        }
    }
}

/// 按默认编码策略写出 ICO 文件。
pub fn write_ico(frames: &[Frame], destination: &Path) -> Result<(), FaviconError> {
    write_ico_with_encoding(frames, destination, FrameEncoding::Auto)
}

/// 写出 ICO 文件。空帧集合时不会触碰磁盘。
pub fn write_ico_with_encoding(
    frames: &[Frame],
    destination: &Path,
    encoding: FrameEncoding,
) -> Result<(), FaviconError> {
    let bytes = encode_ico(frames, encoding)?;
    let mut batch = OutputBatch::new();
    batch.push(destination.to_path_buf(), bytes);
    batch.commit()?;
    Ok(())
}

/// 将帧序列编码为 ICO 字节流，帧顺序即目录顺序。
pub fn encode_ico(frames: &[Frame], encoding: FrameEncoding) -> Result<Vec<u8>, FaviconError> {
    if frames.is_empty() {
        return Err(FaviconError::EmptyFrameSet);
    }
    if frames.len() > u16::MAX as usize {
        return Err(FaviconError::InvalidRequest(format!(
            "ICO 帧数量过多：{}（上限 {}）",
            frames.len(),
            u16::MAX
        )));
    }
    if let Some(frame) = frames.iter().find(|f| f.size() > ICO_MAX_DIMENSION) {
        return Err(FaviconError::FrameTooLarge(frame.size()));
    }

    let payloads = frames
        .iter()
        .map(|frame| match PayloadKind::for_frame(frame, encoding) {
            PayloadKind::Png => encode_png(frame),
            PayloadKind::Bmp => Ok(encode_bmp_dib(frame)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let header_len = ICONDIR_SIZE + ICONDIRENTRY_SIZE * frames.len();
    let total_len = payloads
        .iter()
        .try_fold(header_len, |acc, payload| acc.checked_add(payload.len()))
        .filter(|&len| len <= u32::MAX as usize)
        .ok_or_else(|| FaviconError::ResourceLimit("ICO 文件超过 4GB".to_string()))?;

    let mut out = Vec::with_capacity(total_len);
    out.extend_from_slice(&0u16.to_le_bytes()); // reserved
    out.extend_from_slice(&RESOURCE_TYPE_ICON.to_le_bytes());
    out.extend_from_slice(&(frames.len() as u16).to_le_bytes());

    let mut offset = header_len as u32;
    for (frame, payload) in frames.iter().zip(&payloads) {
        let dimension = directory_dimension(frame.size());
        out.push(dimension); // width
        out.push(dimension); // height
        out.push(0); // color count
        out.push(0); // reserved
        out.extend_from_slice(&1u16.to_le_bytes()); // planes
        out.extend_from_slice(&32u16.to_le_bytes()); // bit count
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&offset.to_le_bytes());
        offset += payload.len() as u32;
    }

    for payload in &payloads {
        out.extend_from_slice(payload);
    }

    log::debug!(
        "🧱 ICO 编码完成 - 帧数: {} 总字节: {} 编码: {:?}",
        frames.len(),
        out.len(),
        encoding
    );

    Ok(out)
}

fn directory_dimension(size: u32) -> u8 {
    if size >= ICO_MAX_DIMENSION { 0 } else { size as u8 }
}

fn mask_row_bytes(width: usize) -> usize {
    width.div_ceil(32) * 4
}

/// BITMAPINFOHEADER + 自底向上 BGRA + AND 掩码（alpha 为 0 的像素置 1）。
fn encode_bmp_dib(frame: &Frame) -> Vec<u8> {
    let size = frame.size();
    let side = size as usize;
    let xor_len = side * side * 4;
    let mask_stride = mask_row_bytes(side);
    let mask_len = mask_stride * side;

    let mut out = Vec::with_capacity(BITMAPINFOHEADER_SIZE as usize + xor_len + mask_len);
    out.extend_from_slice(&BITMAPINFOHEADER_SIZE.to_le_bytes());
    out.extend_from_slice(&(size as i32).to_le_bytes()); // biWidth
    out.extend_from_slice(&((size * 2) as i32).to_le_bytes()); // biHeight（XOR + AND）
    out.extend_from_slice(&1u16.to_le_bytes()); // biPlanes
    out.extend_from_slice(&32u16.to_le_bytes()); // biBitCount
    out.extend_from_slice(&0u32.to_le_bytes()); // biCompression = BI_RGB
    out.extend_from_slice(&((xor_len + mask_len) as u32).to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes()); // biXPelsPerMeter
    out.extend_from_slice(&0i32.to_le_bytes()); // biYPelsPerMeter
    out.extend_from_slice(&0u32.to_le_bytes()); // biClrUsed
    out.extend_from_slice(&0u32.to_le_bytes()); // biClrImportant

    let pixels = frame.pixels();
    for y in (0..size).rev() {
        for x in 0..size {
            let [r, g, b, a] = pixels.get_pixel(x, y).0;
            out.extend_from_slice(&[b, g, r, a]);
        }
    }

    for y in (0..size).rev() {
        let mut row = vec![0u8; mask_stride];
        for x in 0..size {
            if pixels.get_pixel(x, y).0[3] == 0 {
                let x = x as usize;
                row[x / 8] |= 0x80 >> (x % 8);
            }
        }
        out.extend_from_slice(&row);
    }

    out
}

/// 解析得到的目录项。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct IcoEntry {
    /// 宽度（目录中的 0 已还原为 256）。
    pub width: u32,
    pub height: u32,
    pub color_count: u8,
    pub planes: u16,
    pub bit_count: u16,
    /// 数据块字节数。
    pub bytes_in_resource: u32,
    /// 数据块相对文件起始的偏移。
    pub image_offset: u32,
    pub payload: PayloadKind,
}

/// 解析得到的 ICO 目录。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct IcoDirectory {
    pub entries: Vec<IcoEntry>,
}

impl IcoDirectory {
    /// 读取并解析 ICO 文件。
    pub fn read_file(path: &Path) -> Result<Self, FaviconError> {
        let bytes = std::fs::read(path).map_err(|e| {
            FaviconError::Decode(format!("无法读取 ICO 文件 '{}'：{}", path.display(), e))
        })?;
        Self::parse(&bytes)
    }

    /// 解析 ICO 字节流并校验每个数据块的范围。
    pub fn parse(bytes: &[u8]) -> Result<Self, FaviconError> {
        let reserved = read_u16(bytes, 0)?;
        if reserved != 0 {
            return Err(FaviconError::Decode(format!(
                "ICONDIR reserved 字段必须为 0（实际 {}）",
                reserved
            )));
        }
        let resource_type = read_u16(bytes, 2)?;
        if resource_type != RESOURCE_TYPE_ICON {
            return Err(FaviconError::Decode(format!(
                "不支持的资源类型：{}（仅支持图标 1）",
                resource_type
            )));
        }
        let count = read_u16(bytes, 4)? as usize;
        if count == 0 {
            return Err(FaviconError::Decode("ICO 不包含任何帧".to_string()));
        }

        let header_len = ICONDIR_SIZE + ICONDIRENTRY_SIZE * count;
        let mut entries = Vec::with_capacity(count);
        for index in 0..count {
            let base = ICONDIR_SIZE + ICONDIRENTRY_SIZE * index;
            let width = read_u8(bytes, base)?;
            let height = read_u8(bytes, base + 1)?;
            let color_count = read_u8(bytes, base + 2)?;
            let entry_reserved = read_u8(bytes, base + 3)?;
            if entry_reserved != 0 {
                return Err(FaviconError::Decode(format!(
                    "第 {} 个目录项 reserved 字段必须为 0",
                    index
                )));
            }
            let planes = read_u16(bytes, base + 4)?;
            let bit_count = read_u16(bytes, base + 6)?;
            let bytes_in_resource = read_u32(bytes, base + 8)?;
            let image_offset = read_u32(bytes, base + 12)?;

            let start = image_offset as usize;
            let end = start
                .checked_add(bytes_in_resource as usize)
                .filter(|&end| start >= header_len && end <= bytes.len())
                .ok_or_else(|| {
                    FaviconError::Decode(format!(
                        "第 {} 个数据块越界：offset={} size={} 文件长度={}",
                        index,
                        image_offset,
                        bytes_in_resource,
                        bytes.len()
                    ))
                })?;

            let payload = detect_payload(&bytes[start..end]).ok_or_else(|| {
                FaviconError::Decode(format!("第 {} 个数据块既不是 PNG 也不是 BMP-DIB", index))
            })?;

            entries.push(IcoEntry {
                width: if width == 0 { 256 } else { width as u32 },
                height: if height == 0 { 256 } else { height as u32 },
                color_count,
                planes,
                bit_count,
                bytes_in_resource,
                image_offset,
                payload,
            });
        }

        Ok(Self { entries })
    }

    /// 取得第 `index` 帧的原始数据块。
    pub fn payload<'a>(&self, bytes: &'a [u8], index: usize) -> Option<&'a [u8]> {
        let entry = self.entries.get(index)?;
        let start = entry.image_offset as usize;
        let end = start.checked_add(entry.bytes_in_resource as usize)?;
        bytes.get(start..end)
    }

    /// 将第 `index` 帧解码为 RGBA。
    pub fn decode_frame(&self, bytes: &[u8], index: usize) -> Result<RgbaImage, FaviconError> {
        let entry = self
            .entries
            .get(index)
            .ok_or_else(|| FaviconError::Decode(format!("帧索引越界：{}", index)))?;
        let data = self
            .payload(bytes, index)
            .ok_or_else(|| FaviconError::Decode(format!("帧索引越界：{}", index)))?;

        match entry.payload {
            PayloadKind::Png => image::load_from_memory(data)
                .map(|img| img.to_rgba8())
                .map_err(|e| FaviconError::Decode(format!("PNG 帧解码失败：{}", e))),
            PayloadKind::Bmp => decode_bmp_dib(data),
        }
    }
}

fn detect_payload(block: &[u8]) -> Option<PayloadKind> {
    if block.starts_with(&PNG_SIGNATURE) {
        return Some(PayloadKind::Png);
    }
    match read_u32(block, 0) {
        Ok(BITMAPINFOHEADER_SIZE) => Some(PayloadKind::Bmp),
        _ => None,
    }
}

/// 解码 32bpp BMP-DIB 帧，忽略 AND 掩码（alpha 已在 XOR 位图中）。
fn decode_bmp_dib(data: &[u8]) -> Result<RgbaImage, FaviconError> {
    let width = read_u32(data, 4)?;
    let double_height = read_u32(data, 8)?;
    let bit_count = read_u16(data, 14)?;
    if bit_count != 32 {
        return Err(FaviconError::Decode(format!(
            "仅支持 32bpp BMP 帧（实际 {}bpp）",
            bit_count
        )));
    }
    let height = double_height / 2;
    if width == 0 || height == 0 || width > ICO_MAX_DIMENSION || height > ICO_MAX_DIMENSION {
        return Err(FaviconError::Decode(format!(
            "BMP 帧尺寸非法：{}x{}",
            width, height
        )));
    }

    let start = BITMAPINFOHEADER_SIZE as usize;
    let xor = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(4))
        .and_then(|xor_len| start.checked_add(xor_len))
        .and_then(|end| data.get(start..end))
        .ok_or_else(|| FaviconError::Decode("BMP 像素数据长度不足".to_string()))?;

    let mut image = RgbaImage::new(width, height);
    for (row_index, row) in xor.chunks_exact(width as usize * 4).enumerate() {
        let y = height - 1 - row_index as u32;
        for (x, bgra) in row.chunks_exact(4).enumerate() {
            image.put_pixel(x as u32, y, image::Rgba([bgra[2], bgra[1], bgra[0], bgra[3]]));
        }
    }
    Ok(image)
}

fn read_u8(bytes: &[u8], pos: usize) -> Result<u8, FaviconError> {
    bytes
        .get(pos)
        .copied()
        .ok_or_else(|| FaviconError::Decode(format!("数据在偏移 {} 处被截断", pos)))
}

fn read_u16(bytes: &[u8], pos: usize) -> Result<u16, FaviconError> {
    bytes
        .get(pos..pos + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or_else(|| FaviconError::Decode(format!("数据在偏移 {} 处被截断", pos)))
}

fn read_u32(bytes: &[u8], pos: usize) -> Result<u32, FaviconError> {
    bytes
        .get(pos..pos + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| FaviconError::Decode(format!("数据在偏移 {} 处被截断", pos)))
}
