//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 在“尽可能早”的阶段执行输入校验，尽快失败，减少不必要内存与 CPU 消耗。
//!
//! ## 实现思路
//!
//! 1. 存在性 + metadata 体积限制
//! 2. 读取字节并用 `infer` 校验文件签名
//! 3. 读取 header 尺寸，按像素上限快速拒绝
//! 4. 完整解码并转换 RGBA，校验字节长度一致性

use std::io::Cursor;
use std::path::Path;

use image::ImageReader;

use super::{FaviconConfig, FaviconError, SourceImage};

/// 从本地路径加载源图。
pub fn load_source(path: &Path, config: &FaviconConfig) -> Result<SourceImage, FaviconError> {
    log::info!("📁 开始读取源图片 - 路径: {}", path.display());

    if !path.is_file() {
        return Err(FaviconError::Decode(format!(
            "源文件不存在：{}",
            path.display()
        )));
    }

    let metadata = std::fs::metadata(path)
        .map_err(|e| FaviconError::Decode(format!("无法读取文件信息：{}", e)))?;

    if metadata.len() > config.max_file_size {
        return Err(FaviconError::ResourceLimit(format!(
            "文件过大：{:.2} MB（限制：{:.2} MB）",
            metadata.len() as f64 / 1024.0 / 1024.0,
            config.max_file_size as f64 / 1024.0 / 1024.0
        )));
    }

    let bytes = std::fs::read(path)
        .map_err(|e| FaviconError::Decode(format!("无法读取图片文件：{}", e)))?;

    decode_source(&bytes, config)
}

/// 将内存中的图片字节解码为源图。
pub fn decode_source(bytes: &[u8], config: &FaviconConfig) -> Result<SourceImage, FaviconError> {
    validate_image_signature(bytes)?;

    let (header_width, header_height) = inspect_dimensions_from_memory(bytes)?;
    validate_pixel_limits(config, header_width, header_height)?;

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| FaviconError::Decode(format!("图片解码失败：{}", e)))?;

    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    validate_pixel_limits(config, width, height)?;

    if width == 0 || height == 0 {
        return Err(FaviconError::Decode("图片尺寸为 0".to_string()));
    }

    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(4))
        .ok_or_else(|| FaviconError::ResourceLimit("图片尺寸导致内存溢出风险".to_string()))?;

    if rgba.as_raw().len() != expected_len {
        return Err(FaviconError::Decode("解码后像素数据长度异常".to_string()));
    }

    log::info!("✅ 源图片解码成功 - 尺寸: {}x{}", width, height);

    Ok(SourceImage::new(rgba))
}

fn validate_image_signature(bytes: &[u8]) -> Result<(), FaviconError> {
    if bytes.is_empty() {
        return Err(FaviconError::Decode("图片内容为空".to_string()));
    }

    let kind = infer::get(bytes)
        .ok_or_else(|| FaviconError::Decode("无法识别图片类型".to_string()))?;

    if kind.matcher_type() != infer::MatcherType::Image {
        return Err(FaviconError::Decode(format!(
            "文件签名不是图片类型：{}",
            kind.mime_type()
        )));
    }

    Ok(())
}

/// 仅通过图片头信息读取宽高，用于在完整解码前做像素限制检查。
fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), FaviconError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| FaviconError::Decode(format!("无法识别图片格式：{}", e)))?;

    reader
        .into_dimensions()
        .map_err(|e| FaviconError::Decode(format!("无法读取图片尺寸：{}", e)))
}

fn validate_pixel_limits(
    config: &FaviconConfig,
    width: u32,
    height: u32,
) -> Result<(), FaviconError> {
    let pixels = (width as u64)
        .checked_mul(height as u64)
        .ok_or_else(|| FaviconError::ResourceLimit("图片像素数溢出".to_string()))?;

    if pixels > config.max_decoded_pixels {
        return Err(FaviconError::ResourceLimit(format!(
            "图片像素过大：{} 像素（限制：{} 像素）",
            pixels, config.max_decoded_pixels
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};

    fn create_png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 255) as u8, (y % 255) as u8, ((x + y) % 255) as u8, 255])
        });

        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    #[test]
    fn decodes_png_to_rgba() {
        let source = decode_source(&create_png_bytes(40, 20), &FaviconConfig::default())
            .expect("decode should succeed");
        assert_eq!(source.width(), 40);
        assert_eq!(source.height(), 20);
        assert_eq!(source.pixels().as_raw().len(), 40 * 20 * 4);
    }

    #[test]
    fn rejects_non_image_bytes() {
        let result = decode_source(b"definitely not an image", &FaviconConfig::default());
        assert!(matches!(result, Err(FaviconError::Decode(_))));
    }

    #[test]
    fn rejects_empty_bytes() {
        let result = decode_source(&[], &FaviconConfig::default());
        assert!(matches!(result, Err(FaviconError::Decode(_))));
    }

    #[test]
    fn stress_rejects_too_many_pixels() {
        let config = FaviconConfig {
            max_decoded_pixels: 1_000,
            ..FaviconConfig::default()
        };
        let result = decode_source(&create_png_bytes(100, 100), &config);
        assert!(matches!(result, Err(FaviconError::ResourceLimit(_))));
    }

    #[test]
    fn missing_file_is_decode_error() {
        let result = load_source(
            Path::new("/definitely/missing/source.png"),
            &FaviconConfig::default(),
        );
        assert!(matches!(result, Err(FaviconError::Decode(_))));
    }
}
