//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `FaviconConfig`，保证运行时行为可观测、可调整、可测试。
//! 其中生成档位（quality / balanced / compact）作为高层语义，映射到底层参数组合。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的平衡配置。
//! - `FaviconProfile` 负责档位字符串解析与反向输出。
//! - `apply_profile` 将档位转换为具体参数。
//! - `infer_profile` 用于从当前配置反推档位（给调用方展示状态）。
//! - `load_from_file` 从 JSON 文件读取配置，缺省字段回退默认值。

use std::path::Path;
use std::str::FromStr;

use fast_image_resize as fr;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use super::FaviconError;

/// 缩放滤镜。
///
/// 只提供双三次同级或更高质量的卷积核，不提供最近邻。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    /// Catmull-Rom 双三次插值。
    CatmullRom,
    /// Mitchell-Netravali 双三次插值，振铃更少。
    Mitchell,
    /// Lanczos3，细节保留最好。
    Lanczos3,
}

impl ResizeFilter {
    pub(crate) fn to_fast_filter(self) -> fr::FilterType {
        match self {
            Self::CatmullRom => fr::FilterType::CatmullRom,
            Self::Mitchell => fr::FilterType::Mitchell,
            Self::Lanczos3 => fr::FilterType::Lanczos3,
        }
    }

    /// `image` 回退路径使用的滤镜。`image` 没有 Mitchell，退到同为三次核的 CatmullRom。
    pub(crate) fn to_image_filter(self) -> FilterType {
        match self {
            Self::CatmullRom | Self::Mitchell => FilterType::CatmullRom,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// ICO 内单帧的负载编码。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameEncoding {
    /// 256px 帧写 PNG，其余写 BMP-DIB。
    Auto,
    /// 所有帧写 PNG。
    Png,
    /// 所有帧写 BMP-DIB。
    Bmp,
}

/// 图标生成配置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaviconConfig {
    /// 源文件允许的最大体积（字节）。
    pub max_file_size: u64,
    /// 解码后源图的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 单帧像素上限（`size * size`），超过视为内存不足。
    pub max_frame_pixels: u64,
    /// 缩放滤镜。
    pub resize_filter: ResizeFilter,
    /// ICO 帧编码策略。
    pub frame_encoding: FrameEncoding,
    /// 是否并行生成各尺寸帧。
    pub parallel: bool,
}

impl Default for FaviconConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_frame_pixels: 4096 * 4096,
            resize_filter: ResizeFilter::CatmullRom,
            frame_encoding: FrameEncoding::Auto,
            parallel: true,
        }
    }
}

/// 生成档位（面向产品/用户语义）。
///
/// - `Quality`：Lanczos3 + 兼容性最好的帧编码
/// - `Balanced`：双三次 + 自动编码
/// - `Compact`：双三次 + 全 PNG，文件最小
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaviconProfile {
    Quality,
    Balanced,
    Compact,
}

impl FromStr for FaviconProfile {
    type Err = FaviconError;

    /// 从外部字符串解析档位。
    ///
    /// # 示例
    /// ```rust
    /// use favicon_generator::favicon::FaviconProfile;
    ///
    /// let p: FaviconProfile = "balanced".parse()?;
    /// assert_eq!(p.as_str(), "balanced");
    /// # Ok::<(), favicon_generator::favicon::FaviconError>(())
    /// ```
    fn from_str(profile: &str) -> Result<Self, Self::Err> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "compact" => Ok(Self::Compact),
            other => Err(FaviconError::Config(format!(
                "未知生成档位：{}（可选：quality / balanced / compact）",
                other
            ))),
        }
    }
}

impl FaviconProfile {
    /// 将档位输出为稳定字符串。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Compact => "compact",
        }
    }
}

impl FaviconConfig {
    /// 从 JSON 文件加载配置。
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, FaviconError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FaviconError::Config(format!("读取配置文件 '{}' 失败：{}", path.display(), e))
        })?;

        let config: FaviconConfig = serde_json::from_str(&content)
            .map_err(|e| FaviconError::Config(format!("解析配置文件失败：{}", e)))?;
        config.validate()?;

        log::info!("⚙️ 已加载配置 - 路径: {}", path.display());
        Ok(config)
    }

    /// 校验数值范围。
    pub fn validate(&self) -> Result<(), FaviconError> {
        if self.max_file_size == 0 {
            return Err(FaviconError::Config("max_file_size 必须大于 0".to_string()));
        }
        if self.max_decoded_pixels == 0 {
            return Err(FaviconError::Config("max_decoded_pixels 必须大于 0".to_string()));
        }
        if self.max_frame_pixels < 256 * 256 {
            return Err(FaviconError::Config(
                "max_frame_pixels 不能小于 65536（256x256）".to_string(),
            ));
        }
        Ok(())
    }

    /// 基于当前参数反推档位。
    pub fn infer_profile(&self) -> FaviconProfile {
        match (self.resize_filter, self.frame_encoding) {
            (ResizeFilter::Lanczos3, _) => FaviconProfile::Quality,
            (_, FrameEncoding::Png) => FaviconProfile::Compact,
            _ => FaviconProfile::Balanced,
        }
    }

    /// 应用指定档位到实际参数。
    pub fn apply_profile(&mut self, profile: FaviconProfile) {
        match profile {
            FaviconProfile::Quality => {
                self.resize_filter = ResizeFilter::Lanczos3;
                self.frame_encoding = FrameEncoding::Auto;
            }
            FaviconProfile::Balanced => {
                self.resize_filter = ResizeFilter::CatmullRom;
                self.frame_encoding = FrameEncoding::Auto;
            }
            FaviconProfile::Compact => {
                self.resize_filter = ResizeFilter::CatmullRom;
                self.frame_encoding = FrameEncoding::Png;
            }
        }
    }
}
