//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 库内部使用 `FaviconError` 表达图标生成链路的错误；命令行入口还会遇到
//! 参数错误与 JSON 输出错误。`AppError` 把这些来源收拢为一个类型，入口只需一个 `?`。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `FaviconError` / `serde_json::Error` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，便于界面层直接展示。

use serde::Serialize;

use crate::favicon::FaviconError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 图标生成流水线错误（加载 / 重采样 / 编码 / 落盘）
    #[error("{0}")]
    Favicon(#[from] FaviconError),

    /// `--json` 输出序列化失败
    #[error("JSON 输出失败: {0}")]
    Json(#[from] serde_json::Error),

    /// 命令行参数无效
    #[error("参数错误: {0}")]
    Argument(String),
}

impl AppError {
    /// 稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Favicon(err) => err.code(),
            Self::Json(_) => "serialize_error",
            Self::Argument(_) => "invalid_request",
        }
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
