//! 日志初始化入口
//!
//! 编辑器后端和工具进程启动时各调用一次 [`init`]。指标只经由 `metrics` facade 记录，
//! exporter 由宿主进程自行安装。

pub mod logging;

use serde::Deserialize;
use tracing::info;

use crate::error::SharedResult;

/// 日志配置，对应配置文件中的 `[observability]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// 写入每条日志的服务名，启动时由 `AppConfig.service_name` 注入
    pub service_name: String,
    /// EnvFilter 语法，如 "info,segment_rules=debug"
    pub log_level: String,
    pub json_logs: bool,
    /// 记录 span 关闭事件（含耗时），排查编辑操作慢时打开
    pub span_events: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "segment-editor".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            span_events: false,
        }
    }
}

impl ObservabilityConfig {
    /// 用简写环境变量覆盖配置文件中的值
    ///
    /// `SEGMENT_LOG_LEVEL`、`SEGMENT_JSON_LOGS`、`SEGMENT_SPAN_EVENTS`，未设置的保持原值。
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |name: &str| {
            lookup(name)
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        };

        if let Some(level) = lookup("SEGMENT_LOG_LEVEL").filter(|v| !v.trim().is_empty()) {
            self.log_level = level;
        }
        if let Some(json) = flag("SEGMENT_JSON_LOGS") {
            self.json_logs = json;
        }
        if let Some(span_events) = flag("SEGMENT_SPAN_EVENTS") {
            self.span_events = span_events;
        }
        self
    }

    pub fn with_service_name(mut self, service_name: &str) -> Self {
        self.service_name = service_name.to_string();
        self
    }
}

/// 安装全局 subscriber，进程内只能成功一次
pub fn init(config: &ObservabilityConfig) -> SharedResult<()> {
    logging::init(config)?;

    info!(
        service = %config.service_name,
        level = %config.log_level,
        json = config.json_logs,
        "logging ready"
    );
    Ok(())
}
