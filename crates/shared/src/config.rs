//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{SharedError, SharedResult};
use crate::observability::ObservabilityConfig;

/// 实时预览配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// 静默窗口：最后一次编辑后等待多久才发起匹配请求
    pub debounce_ms: u64,
    /// 单次匹配请求的超时时间
    pub request_timeout_ms: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            request_timeout_ms: 10_000,
        }
    }
}

impl PreviewConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// 规则编辑器配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// 撤销栈最多保留的快照数，超出后丢弃最旧的快照
    pub history_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self { history_limit: 100 }
    }
}

/// 外部匹配服务配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchingServiceConfig {
    pub base_url: String,
    pub preview_path: String,
    /// 预览结果中返回的样例客户数量
    pub sample_size: usize,
}

impl Default for MatchingServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            preview_path: "/api/segments/preview".to_string(),
            sample_size: 5,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub preview: PreviewConfig,
    pub editor: EditorConfig,
    pub matching: MatchingServiceConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. 环境变量（SEGMENT_ 前缀，如 SEGMENT_PREVIEW__DEBOUNCE_MS -> preview.debounce_ms）
    pub fn load(service_name: &str) -> SharedResult<Self> {
        let env = std::env::var("SEGMENT_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Self::load_from(service_name, &env, Path::new(&config_dir))
    }

    /// 从指定目录加载配置，供测试和嵌入场景使用
    pub fn load_from(service_name: &str, env: &str, config_dir: &Path) -> SharedResult<Self> {
        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            // 字段名本身含下划线，层级分隔符使用双下划线
            .add_source(
                Environment::with_prefix("SEGMENT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置项取值
    pub fn validate(&self) -> SharedResult<()> {
        if self.preview.debounce_ms == 0 {
            return Err(SharedError::InvalidConfig {
                field: "preview.debounce_ms".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        if self.preview.request_timeout_ms == 0 {
            return Err(SharedError::InvalidConfig {
                field: "preview.request_timeout_ms".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        if self.editor.history_limit == 0 {
            return Err(SharedError::InvalidConfig {
                field: "editor.history_limit".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        if self.matching.base_url.is_empty() {
            return Err(SharedError::InvalidConfig {
                field: "matching.base_url".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.preview.debounce_ms, 500);
        assert_eq!(config.preview.debounce(), Duration::from_millis(500));
        assert_eq!(config.editor.history_limit, 100);
        assert_eq!(config.matching.preview_path, "/api/segments/preview");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_missing_dir_uses_defaults() {
        let dir = std::env::temp_dir().join("segment-shared-missing-config");
        let config = AppConfig::load_from("segment-editor", "test", &dir).unwrap();

        assert_eq!(config.service_name, "segment-editor");
        assert_eq!(config.environment, "test");
        assert_eq!(config.preview.debounce_ms, 500);
    }

    #[test]
    fn test_environment_file_overrides_default() {
        let dir = std::env::temp_dir().join(format!("segment-shared-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("default.toml"),
            "[preview]\ndebounce_ms = 300\n\n[editor]\nhistory_limit = 20\n",
        )
        .unwrap();
        fs::write(dir.join("staging.toml"), "[preview]\ndebounce_ms = 250\n").unwrap();

        let config = AppConfig::load_from("segment-editor", "staging", &dir).unwrap();
        assert_eq!(config.preview.debounce_ms, 250);
        assert_eq!(config.preview.request_timeout_ms, 10_000);
        assert_eq!(config.editor.history_limit, 20);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_validate_rejects_zero_debounce() {
        let mut config = AppConfig::default();
        config.preview.debounce_ms = 0;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("preview.debounce_ms"));
    }
}
