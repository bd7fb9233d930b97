//! # 图标生成模块（favicon）
//!
//! ## 设计思路
//!
//! 该模块将“请求校验 → 加载解码 → 重采样 → ICO/PNG 编码 → 原子落盘”
//! 按职责拆分为多个子模块，不依赖任何界面层。
//!
//! - `service`：async 入口，在阻塞线程池中执行生成
//! - `handler`：编排整条处理流水线
//! - `loader`：负责文件加载、签名与像素上限校验
//! - `resampler`：透明画布 + 高质量卷积缩放
//! - `ico` / `png`：容器与独立文件编码
//! - `output`：暂存 + rename 的原子落盘
//! - `config/error/source/sizes`：配置、错误、数据模型、尺寸集合
//!
//! ## 新同事快速上手
//!
//! ```text
//! 调用方（CLI / 界面）构造 GenerationRequest
//!    ↓
//! service.rs（spawn_blocking）
//!    ↓
//! handler.rs（统一编排 + 阶段耗时日志）
//!    ├─ loader.rs（读取 + 签名 + 像素上限 + 解码）
//!    ├─ resampler.rs（每个尺寸一帧，可并行）
//!    ├─ ico.rs / png.rs（内存中编码）
//!    └─ output.rs（暂存临时文件 → rename）
//!    ↓
//! Result<GenerationReport, FaviconError>
//! ```

mod config;
mod error;
mod handler;
pub mod ico;
mod loader;
pub mod output;
pub mod png;
pub mod resampler;
mod service;
mod sizes;
mod source;

pub use config::{FaviconConfig, FaviconProfile, FrameEncoding, ResizeFilter};
pub use error::FaviconError;
pub use handler::FaviconGenerator;
pub use ico::{IcoDirectory, IcoEntry, PayloadKind, write_ico, write_ico_with_encoding};
pub use loader::{decode_source, load_source};
pub use png::write_png;
pub use resampler::{resample, resample_with_filter};
pub use service::{FaviconCommandError, FaviconService};
pub use sizes::{STANDARD_SIZES, SizePreset, SizeSpec};
pub use source::{Frame, GenerationReport, GenerationRequest, SourceImage, png_file_name};
