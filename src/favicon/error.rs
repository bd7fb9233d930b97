//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载图标生成链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! `code()` / `stage()` 提供稳定标识，界面层据此渲染本地化提示，
//! 不需要解析错误文本。

/// 图标生成统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum FaviconError {
    #[error("解码错误：{0}")]
    Decode(String),

    #[error("请求无效：{0}")]
    InvalidRequest(String),

    #[error("尺寸无效：{0}")]
    InvalidSize(String),

    #[error("文件错误：{0}")]
    Io(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("ICO 帧集合为空")]
    EmptyFrameSet,

    #[error("ICO 帧尺寸过大：{0}px（上限 256px）")]
    FrameTooLarge(u32),

    #[error("配置错误：{0}")]
    Config(String),
}

impl FaviconError {
    /// 稳定错误码，供界面层映射本地化文案。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode_error",
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidSize(_) => "invalid_size",
            Self::Io(_) => "io_error",
            Self::ResourceLimit(_) => "out_of_memory",
            Self::EmptyFrameSet => "empty_frame_set",
            Self::FrameTooLarge(_) => "frame_too_large",
            Self::Config(_) => "config_error",
        }
    }

    /// 出错所在阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) | Self::FrameTooLarge(_) => "request",
            Self::Decode(_) => "load",
            Self::InvalidSize(_) | Self::ResourceLimit(_) => "resample",
            Self::EmptyFrameSet => "encode",
            Self::Io(_) => "write",
            Self::Config(_) => "config",
        }
    }
}
