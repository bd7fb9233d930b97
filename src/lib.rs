//! # Favicon 生成工具 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │            调用方（CLI / 任意界面层，仅构造请求）          │
//! │                                                          │
//! │   GenerationRequest ──→ FaviconService::generate          │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ Result<GenerationReport, FaviconError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            核心（Rust）                          │
//! │                                                          │
//! │  ┌─ error ────── AppError (入口统一错误类型)              │
//! │  │                                                       │
//! │  └─ favicon ──── 图标生成流水线                           │
//! │      ├─ loader      源图读取·签名·像素上限               │
//! │      ├─ resampler   透明画布 + 双三次缩放                 │
//! │      ├─ ico / png   ICO 容器与独立 PNG 编码               │
//! │      └─ output      暂存 + rename 原子落盘                │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，命令行入口的返回类型 |
//! | [`favicon`] | 从源图生成多尺寸 ICO 与独立 PNG |

pub mod error;
pub mod favicon;
