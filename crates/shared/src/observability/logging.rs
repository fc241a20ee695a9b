//! 日志初始化
//!
//! 基于 tracing-subscriber 组合环境过滤器与格式化输出层。

use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use super::ObservabilityConfig;
use crate::error::{SharedError, SharedResult};

/// 构建环境过滤器，RUST_LOG 优先于配置文件中的级别
fn build_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// 初始化全局 tracing subscriber
///
/// 重复初始化会返回错误而不是 panic，测试中多次调用是安全的。
pub fn init(config: &ObservabilityConfig) -> SharedResult<()> {
    let span_events = if config.span_events {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let fmt_layer = if config.json_logs {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_events(span_events)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer()
            .with_span_events(span_events)
            .with_target(true)
            .with_ansi(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(build_filter(config))
        .with(fmt_layer)
        .try_init()
        .map_err(|e| SharedError::Observability(e.to_string()))
}

/// 测试用初始化：输出到测试捕获的 writer，失败时静默忽略
pub fn init_for_tests() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with(fmt::layer().with_test_writer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_falls_back() {
        let config = ObservabilityConfig {
            log_level: "not a [valid filter".to_string(),
            ..Default::default()
        };
        // 只验证不会 panic
        let _ = build_filter(&config);
    }

    #[test]
    fn test_init_twice_is_error_not_panic() {
        init_for_tests();
        let config = ObservabilityConfig::default();
        assert!(init(&config).is_err());
    }
}
