//! # 独立 PNG 输出模块
//!
//! 每个帧编码为 8 位 RGBA（真彩 + alpha）PNG，文件名为 `{base_name}_{size}x{size}.png`。

use std::path::Path;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::output::OutputBatch;
use super::{FaviconError, Frame};

/// 将帧编码为 PNG 字节流。
pub fn encode_png(frame: &Frame) -> Result<Vec<u8>, FaviconError> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(
            frame.pixels().as_raw(),
            frame.size(),
            frame.size(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| {
            FaviconError::Io(format!("PNG 编码失败（{}x{}）：{}", frame.size(), frame.size(), e))
        })?;
    Ok(buf)
}

/// 将单帧写为独立 PNG 文件。
pub fn write_png(frame: &Frame, destination: &Path) -> Result<(), FaviconError> {
    let bytes = encode_png(frame)?;
    let mut batch = OutputBatch::new();
    batch.push(destination.to_path_buf(), bytes);
    batch.commit()?;
    Ok(())
}
