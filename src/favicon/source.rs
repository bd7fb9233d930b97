//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部请求”和“流水线中间结果”解耦：
//! - `GenerationRequest` 表示调用方的一次生成动作
//! - `SourceImage` 表示已解码、只读的源图
//! - `Frame` 表示某一尺寸的正方形 RGBA 帧
//! - `GenerationReport` 表示生成结果（写出的文件与阶段耗时）

use std::path::PathBuf;
use std::time::Duration;

use image::RgbaImage;

use super::{FaviconError, SizeSpec};

/// 一次生成请求。
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// 源图片路径。
    pub source_path: PathBuf,
    /// 输出目录（不存在时自动创建）。
    pub output_dir: PathBuf,
    /// 输出文件基础名（不含扩展名）。
    pub base_name: String,
    /// 目标尺寸集合。
    pub sizes: SizeSpec,
    /// 是否输出 `{base_name}.ico`。
    pub emit_ico: bool,
    /// 是否输出 `{base_name}_{s}x{s}.png`。
    pub emit_png: bool,
}

impl GenerationRequest {
    /// ICO 输出路径。
    pub fn ico_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.ico", self.base_name))
    }

    /// 指定尺寸的 PNG 输出路径。
    pub fn png_path(&self, size: u32) -> PathBuf {
        self.output_dir.join(png_file_name(&self.base_name, size))
    }
}

/// `{base_name}_{size}x{size}.png`
pub fn png_file_name(base_name: &str, size: u32) -> String {
    format!("{}_{}x{}.png", base_name, size, size)
}

/// 已解码的源图，只读。
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixels: RgbaImage,
}

impl SourceImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// 某一尺寸的正方形 RGBA 帧。
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    size: u32,
    pixels: RgbaImage,
}

impl Frame {
    /// 构建帧，要求像素缓冲为 `size x size`。
    pub fn new(size: u32, pixels: RgbaImage) -> Result<Self, FaviconError> {
        if size == 0 {
            return Err(FaviconError::InvalidSize("帧尺寸必须大于 0".to_string()));
        }
        if pixels.width() != size || pixels.height() != size {
            return Err(FaviconError::InvalidSize(format!(
                "帧声明尺寸 {}x{} 与像素缓冲 {}x{} 不一致",
                size,
                size,
                pixels.width(),
                pixels.height()
            )));
        }
        Ok(Self { size, pixels })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// 生成结果。
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct GenerationReport {
    /// 写出的 ICO 路径。
    pub ico_path: Option<PathBuf>,
    /// 写出的 PNG 路径（按尺寸升序）。
    pub png_paths: Vec<PathBuf>,
    /// 实际生成的帧尺寸（升序）。
    pub sizes: Vec<u32>,
    pub load_elapsed: Duration,
    pub resample_elapsed: Duration,
    pub write_elapsed: Duration,
}

impl GenerationReport {
    /// 全部写出文件。
    pub fn written_files(&self) -> impl Iterator<Item = &PathBuf> {
        self.ico_path.iter().chain(self.png_paths.iter())
    }
}
