//! # 重采样模块
//!
//! ## 设计思路
//!
//! 每个尺寸先分配全透明的正方形画布，再把源图拉伸（不保持宽高比）到整张画布后
//! 以 source-over 方式合成。即使源图没有 alpha 或尺寸正好铺满，也保留清空画布这一步。
//!
//! ## 实现思路
//!
//! - 主路径使用 `fast_image_resize` 卷积缩放，默认开启 alpha 预乘，透明区域不会渗色。
//! - 主路径失败时回退到 `image::imageops::resize`，滤镜保持三次核同级。
//! - 画布与缩放缓冲通过 `try_reserve_exact` 分配，分配失败映射为 `ResourceLimit`。
//! - 纯函数：相同输入得到逐像素相同的输出。

use fast_image_resize as fr;
use image::{ImageBuffer, Rgba, RgbaImage};

use super::{FaviconError, Frame, ResizeFilter, SourceImage};

/// 使用默认滤镜（Catmull-Rom）重采样。
pub fn resample(source: &SourceImage, size: u32) -> Result<Frame, FaviconError> {
    resample_with_filter(source, size, ResizeFilter::CatmullRom)
}

/// 将源图重采样为 `size x size` 的帧。
pub fn resample_with_filter(
    source: &SourceImage,
    size: u32,
    filter: ResizeFilter,
) -> Result<Frame, FaviconError> {
    if size == 0 {
        return Err(FaviconError::InvalidSize("目标尺寸必须大于 0".to_string()));
    }

    let mut canvas = transparent_buffer(size)?;

    let resized = match resize_with_fast_image_resize(source, size, filter) {
        Ok(resized) => resized,
        Err(err @ FaviconError::ResourceLimit(_)) => return Err(err),
        Err(err) => {
            log::warn!(
                "⚠️ fast_image_resize 缩放失败，回退 image::imageops::resize：{}",
                err
            );
            image::imageops::resize(source.pixels(), size, size, filter.to_image_filter())
        }
    };

    image::imageops::overlay(&mut canvas, &resized, 0, 0);

    log::debug!(
        "🧩 重采样：{}x{} -> {}x{}（filter={:?}）",
        source.width(),
        source.height(),
        size,
        size,
        filter
    );

    Frame::new(size, canvas)
}

/// 分配 `size x size` 的全透明 RGBA 缓冲。
fn transparent_buffer(size: u32) -> Result<RgbaImage, FaviconError> {
    let len = (size as usize)
        .checked_mul(size as usize)
        .and_then(|pixels| pixels.checked_mul(4))
        .ok_or_else(|| FaviconError::ResourceLimit(format!("尺寸 {} 导致内存溢出", size)))?;

    let mut bytes: Vec<u8> = Vec::new();
    bytes.try_reserve_exact(len).map_err(|e| {
        FaviconError::ResourceLimit(format!(
            "无法为 {}x{} 分配 {:.2} MB：{}",
            size,
            size,
            len as f64 / 1024.0 / 1024.0,
            e
        ))
    })?;
    bytes.resize(len, 0);

    ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(size, size, bytes)
        .ok_or_else(|| FaviconError::ResourceLimit("画布缓冲长度异常".to_string()))
}

fn resize_with_fast_image_resize(
    source: &SourceImage,
    size: u32,
    filter: ResizeFilter,
) -> Result<RgbaImage, FaviconError> {
    let src_image = fr::images::ImageRef::new(
        source.width(),
        source.height(),
        source.pixels().as_raw(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| FaviconError::Decode(format!("构建源图像缓冲失败：{}", e)))?;

    let dst_buffer = transparent_buffer(size)?.into_raw();
    let mut dst_image = fr::images::Image::from_vec_u8(size, size, dst_buffer, fr::PixelType::U8x4)
        .map_err(|e| FaviconError::Decode(format!("构建目标图像缓冲失败：{}", e)))?;

    let mut resizer = fr::Resizer::new();
    let options = fr::ResizeOptions::new()
        .resize_alg(fr::ResizeAlg::Convolution(filter.to_fast_filter()));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| FaviconError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

    ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(size, size, dst_image.into_vec())
        .ok_or_else(|| FaviconError::Decode("fast_image_resize 输出缓冲长度异常".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque_gradient(width: u32, height: u32) -> SourceImage {
        SourceImage::new(ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 255) as u8, (y % 255) as u8, ((x * y) % 255) as u8, 255])
        }))
    }

    #[test]
    fn output_has_requested_dimensions() {
        let source = opaque_gradient(512, 512);
        for size in [1, 16, 24, 48, 256, 300] {
            let frame = resample(&source, size).expect("resample should succeed");
            assert_eq!(frame.size(), size);
            assert_eq!(frame.pixels().dimensions(), (size, size));
            assert_eq!(frame.pixels().as_raw().len(), (size * size * 4) as usize);
        }
    }

    #[test]
    fn zero_size_is_rejected() {
        let source = opaque_gradient(8, 8);
        assert!(matches!(
            resample(&source, 0),
            Err(FaviconError::InvalidSize(_))
        ));
    }

    #[test]
    fn resampling_is_deterministic() {
        let source = opaque_gradient(300, 200);
        for filter in [
            ResizeFilter::CatmullRom,
            ResizeFilter::Mitchell,
            ResizeFilter::Lanczos3,
        ] {
            let first = resample_with_filter(&source, 37, filter).expect("first resample");
            let second = resample_with_filter(&source, 37, filter).expect("second resample");
            assert_eq!(first, second);
        }
    }

    #[test]
    fn opaque_source_leaves_no_transparent_border() {
        let source = opaque_gradient(512, 512);
        let frame = resample(&source, 48).expect("resample should succeed");
        assert!(frame.pixels().pixels().all(|p| p.0[3] >= 254));
    }

    #[test]
    fn transparent_region_stays_transparent() {
        // 左半透明，右半不透明红色
        let source = SourceImage::new(ImageBuffer::from_fn(64, 64, |x, _| {
            if x < 32 {
                Rgba([0, 255, 0, 0])
            } else {
                Rgba([255, 0, 0, 255])
            }
        }));

        let frame = resample(&source, 16).expect("resample should succeed");
        for y in 0..16 {
            for x in 0..5 {
                assert_eq!(frame.pixels().get_pixel(x, y).0[3], 0, "pixel ({x},{y})");
            }
            for x in 11..16 {
                assert_eq!(frame.pixels().get_pixel(x, y).0, [255, 0, 0, 255]);
            }
        }
    }

    #[test]
    fn non_square_source_is_stretched() {
        let source = SourceImage::new(ImageBuffer::from_fn(128, 32, |x, _| {
            if x < 64 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        }));

        let frame = resample(&source, 16).expect("resample should succeed");
        for y in 0..16 {
            assert_eq!(frame.pixels().get_pixel(0, y).0, [255, 0, 0, 255]);
            assert_eq!(frame.pixels().get_pixel(15, y).0, [0, 0, 255, 255]);
        }
    }

    #[test]
    fn upscaling_small_source_works() {
        let source = opaque_gradient(4, 4);
        let frame = resample(&source, 64).expect("upscale should succeed");
        assert_eq!(frame.size(), 64);
    }
}
