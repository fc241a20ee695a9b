//! 启动入口
//!
//! 宿主程序（编辑器后端、CLI 工具）启动时调用一次：加载分层配置，注入服务名，
//! 叠加日志相关的简写环境变量，初始化日志。

use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::observability;

/// 按 `SEGMENT_ENV` / `CONFIG_DIR` 加载配置并初始化日志
pub fn bootstrap(service_name: &str) -> anyhow::Result<AppConfig> {
    let config = AppConfig::load(service_name)
        .with_context(|| format!("加载 {service_name} 配置失败"))?;
    init_logging(config)
}

/// 从指定目录加载配置并初始化日志
pub fn bootstrap_from(
    service_name: &str,
    env: &str,
    config_dir: &Path,
) -> anyhow::Result<AppConfig> {
    let config = AppConfig::load_from(service_name, env, config_dir)
        .with_context(|| format!("加载 {service_name} 配置失败"))?;
    init_logging(config)
}

/// 已有全局 subscriber（宿主自行安装或重复启动）时沿用现有的
fn init_logging(mut config: AppConfig) -> anyhow::Result<AppConfig> {
    config.observability = config
        .observability
        .clone()
        .with_service_name(&config.service_name)
        .with_env_overrides();

    if let Err(e) = observability::init(&config.observability) {
        warn!(error = %e, "global subscriber already installed, keeping it");
    }

    if config.environment == "production" && !config.observability.json_logs {
        warn!("production environment without JSON logs");
    }

    info!(
        environment = %config.environment,
        debounce_ms = config.preview.debounce_ms,
        matching_url = %config.matching.base_url,
        "configuration loaded"
    );

    Ok(config)
}
