//! 基础设施错误类型
//!
//! 配置加载和可观测性初始化过程中出现的错误，业务错误由各 crate 自行定义。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SharedError {
    #[error("配置加载失败: {0}")]
    Config(#[from] config::ConfigError),

    #[error("配置项无效: {field} - {message}")]
    InvalidConfig { field: String, message: String },

    #[error("日志初始化失败: {0}")]
    Observability(String),
}

pub type SharedResult<T> = std::result::Result<T, SharedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SharedError::InvalidConfig {
            field: "preview.debounce_ms".to_string(),
            message: "must be greater than zero".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "配置项无效: preview.debounce_ms - must be greater than zero"
        );

        let err = SharedError::Observability("subscriber already set".to_string());
        assert_eq!(err.to_string(), "日志初始化失败: subscriber already set");
    }
}
