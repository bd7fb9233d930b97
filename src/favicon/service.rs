//! # 服务层
//!
//! ## 设计思路
//!
//! 界面线程不能阻塞在图片处理上。`FaviconService` 把整次生成放到
//! `tokio::task::spawn_blocking` 执行，对外只暴露 async 接口。
//!
//! ## 实现思路
//!
//! - 内部持有 `Arc<FaviconGenerator>`，阻塞任务拿到的是同一个生成器。
//! - `FaviconCommandError` 是错误的可序列化视图（`code/stage/message`），
//!   界面层据此渲染本地化提示。

use std::sync::Arc;

use super::{
    FaviconConfig, FaviconError, FaviconGenerator, FaviconProfile, GenerationReport,
    GenerationRequest,
};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FaviconCommandError {
    pub code: &'static str,
    pub stage: &'static str,
    pub message: String,
}

impl From<FaviconError> for FaviconCommandError {
    fn from(error: FaviconError) -> Self {
        Self {
            code: error.code(),
            stage: error.stage(),
            message: error.to_string(),
        }
    }
}

/// 图标生成服务。
#[derive(Clone)]
pub struct FaviconService {
    generator: Arc<FaviconGenerator>,
}

impl FaviconService {
    /// 使用默认配置创建服务。
    pub fn new() -> Self {
        Self::with_config(FaviconConfig::default())
    }

    /// 使用自定义配置创建服务。
    ///
    /// # 示例
    /// ```rust
    /// use favicon_generator::favicon::{FaviconConfig, FaviconService};
    ///
    /// let config = FaviconConfig {
    ///     parallel: false,
    ///     ..FaviconConfig::default()
    /// };
    /// let _service = FaviconService::with_config(config);
    /// ```
    pub fn with_config(config: FaviconConfig) -> Self {
        Self {
            generator: Arc::new(FaviconGenerator::new(config)),
        }
    }

    /// 在阻塞线程池中执行一次完整生成。
    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationReport, FaviconError> {
        let generator = Arc::clone(&self.generator);

        tokio::task::spawn_blocking(move || generator.generate(&request))
            .await
            .map_err(|e| FaviconError::Io(format!("生成线程执行失败：{}", e)))?
    }

    /// 切换生成档位。
    pub fn set_profile(&self, profile: &str) -> Result<(), FaviconError> {
        let profile: FaviconProfile = profile.parse()?;
        self.generator.set_profile(profile)
    }

    /// 查询当前生效档位。
    pub fn profile(&self) -> Result<String, FaviconError> {
        Ok(self.generator.profile()?.as_str().to_string())
    }
}

impl Default for FaviconService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::favicon::SizeSpec;
    use std::path::PathBuf;

    #[tokio::test]
    async fn invalid_request_is_reported_through_async_api() {
        let service = FaviconService::new();
        let request = GenerationRequest {
            source_path: PathBuf::from("unused.png"),
            output_dir: PathBuf::from("unused"),
            base_name: "icon".to_string(),
            sizes: SizeSpec::default(),
            emit_ico: true,
            emit_png: true,
        };

        let err = service.generate(request).await.expect_err("must fail");
        let view = FaviconCommandError::from(err);
        assert_eq!(view.code, "invalid_request");
        assert_eq!(view.stage, "request");
    }

    #[test]
    fn profile_string_round_trips() {
        let service = FaviconService::new();
        service.set_profile("quality").expect("set profile");
        assert_eq!(service.profile().expect("profile"), "quality");
        assert!(matches!(
            service.set_profile("nearest"),
            Err(FaviconError::Config(_))
        ));
    }
}
