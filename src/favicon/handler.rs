//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `FaviconGenerator` 只负责流程编排与配置管理，不依赖任何界面层。
//! 处理链路固定为：
//! 1. 读取配置快照并校验请求
//! 2. 加载并解码源图（每个请求只加载一次）
//! 3. 每个尺寸生成一帧（可并行，帧之间无依赖）
//! 4. 单线程编码 ICO / PNG，并整体原子落盘
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<FaviconConfig>>` 支持运行时动态切档。
//! - 单次请求内使用“同一配置快照”，避免处理中途配置漂移。
//! - 所有尺寸相关的校验在加载源图之前完成，失败时不做任何无用功，也不写任何文件。
//! - 记录 `load/resample/write/total` 阶段耗时，便于性能诊断。

use std::sync::{Arc, RwLock};
use std::time::Instant;

use rayon::prelude::*;

use super::ico::{ICO_MAX_DIMENSION, encode_ico};
use super::loader::load_source;
use super::output::OutputBatch;
use super::png::encode_png;
use super::resampler::resample_with_filter;
use super::{
    FaviconConfig, FaviconError, FaviconProfile, Frame, GenerationReport, GenerationRequest,
    SourceImage,
};

/// 图标生成器。
pub struct FaviconGenerator {
    config: Arc<RwLock<FaviconConfig>>,
}

impl Default for FaviconGenerator {
    fn default() -> Self {
        Self::new(FaviconConfig::default())
    }
}

impl FaviconGenerator {
    /// 根据初始配置创建生成器。
    ///
    /// # 示例
    /// ```rust
    /// use favicon_generator::favicon::{FaviconConfig, FaviconGenerator};
    ///
    /// let generator = FaviconGenerator::new(FaviconConfig::default());
    /// let _config = generator.config_snapshot()?;
    /// # Ok::<(), favicon_generator::favicon::FaviconError>(())
    /// ```
    pub fn new(config: FaviconConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// 获取配置快照。
    pub fn config_snapshot(&self) -> Result<FaviconConfig, FaviconError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| FaviconError::Config("配置读取锁已中毒".to_string()))
    }

    /// 整体替换配置。
    pub fn set_config(&self, config: FaviconConfig) -> Result<(), FaviconError> {
        config.validate()?;
        let mut guard = self
            .config
            .write()
            .map_err(|_| FaviconError::Config("配置写入锁已中毒".to_string()))?;
        *guard = config;
        Ok(())
    }

    /// 设置生成档位。
    pub fn set_profile(&self, profile: FaviconProfile) -> Result<(), FaviconError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| FaviconError::Config("配置写入锁已中毒".to_string()))?;
        config.apply_profile(profile);

        log::info!(
            "⚙️ 已切换生成档位：{:?}（filter={:?}, encoding={:?}）",
            profile,
            config.resize_filter,
            config.frame_encoding
        );

        Ok(())
    }

    /// 获取当前生效档位。
    pub fn profile(&self) -> Result<FaviconProfile, FaviconError> {
        let config = self
            .config
            .read()
            .map_err(|_| FaviconError::Config("配置读取锁已中毒".to_string()))?;
        Ok(config.infer_profile())
    }

    /// 处理主入口：加载 → 重采样 → 编码 → 落盘。
    pub fn generate(&self, request: &GenerationRequest) -> Result<GenerationReport, FaviconError> {
        let config = self.config_snapshot()?;
        let total_start = Instant::now();

        validate_request(request, &config)?;

        let load_start = Instant::now();
        let source = load_source(&request.source_path, &config)?;
        let load_elapsed = load_start.elapsed();

        let resample_start = Instant::now();
        let frames = produce_frames(&source, request, &config)?;
        drop(source);
        let resample_elapsed = resample_start.elapsed();

        let write_start = Instant::now();
        let mut batch = OutputBatch::new();
        if request.emit_ico {
            batch.push(request.ico_path(), encode_ico(&frames, config.frame_encoding)?);
        }
        if request.emit_png {
            for frame in &frames {
                batch.push(request.png_path(frame.size()), encode_png(frame)?);
            }
        }
        let written = batch.commit()?;
        let write_elapsed = write_start.elapsed();

        let mut report = GenerationReport {
            sizes: frames.iter().map(Frame::size).collect(),
            load_elapsed,
            resample_elapsed,
            write_elapsed,
            ..GenerationReport::default()
        };
        let mut written = written.into_iter();
        if request.emit_ico {
            report.ico_path = written.next();
        }
        report.png_paths = written.collect();

        log::info!(
            "✅ 图标生成完成 - 帧数: {} 文件数: {} load={}ms resample={}ms write={}ms total={}ms",
            report.sizes.len(),
            report.written_files().count(),
            load_elapsed.as_millis(),
            resample_elapsed.as_millis(),
            write_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(report)
    }
}

/// 在加载源图之前完成全部请求级校验。
fn validate_request(request: &GenerationRequest, config: &FaviconConfig) -> Result<(), FaviconError> {
    if request.sizes.is_empty() {
        return Err(FaviconError::InvalidRequest("尺寸集合为空".to_string()));
    }
    if !request.emit_ico && !request.emit_png {
        return Err(FaviconError::InvalidRequest(
            "至少需要输出 ICO 或 PNG 其中之一".to_string(),
        ));
    }
    validate_base_name(&request.base_name)?;

    if request.emit_ico {
        if let Some(max) = request.sizes.max().filter(|&max| max > ICO_MAX_DIMENSION) {
            return Err(FaviconError::FrameTooLarge(max));
        }
    }

    for size in request.sizes.iter() {
        let pixels = (size as u64) * (size as u64);
        if pixels > config.max_frame_pixels {
            return Err(FaviconError::ResourceLimit(format!(
                "尺寸 {}x{} 超过单帧像素上限 {}",
                size, size, config.max_frame_pixels
            )));
        }
    }

    Ok(())
}

fn validate_base_name(base_name: &str) -> Result<(), FaviconError> {
    let trimmed = base_name.trim();
    if trimmed.is_empty() {
        return Err(FaviconError::InvalidRequest("输出文件名为空".to_string()));
    }
    if trimmed == "." || trimmed == ".." || base_name.contains(['/', '\\']) {
        return Err(FaviconError::InvalidRequest(format!(
            "输出文件名不能包含路径：{}",
            base_name
        )));
    }
    Ok(())
}

/// 每个尺寸生成一帧，结果按尺寸升序排列。
fn produce_frames(
    source: &SourceImage,
    request: &GenerationRequest,
    config: &FaviconConfig,
) -> Result<Vec<Frame>, FaviconError> {
    let sizes = request.sizes.to_vec();
    let filter = config.resize_filter;

    let frames = if config.parallel && sizes.len() > 1 {
        sizes
            .par_iter()
            .map(|&size| resample_with_filter(source, size, filter))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        sizes
            .iter()
            .map(|&size| resample_with_filter(source, size, filter))
            .collect::<Result<Vec<_>, _>>()?
    };

    log::info!(
        "🧩 重采样完成 - 源尺寸: {}x{} 目标尺寸: {:?} 并行: {}",
        source.width(),
        source.height(),
        sizes,
        config.parallel
    );

    Ok(frames)
}
