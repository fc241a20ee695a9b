//! 共享库
//!
//! 包含规则引擎与编辑会话共用的配置加载、错误类型和日志初始化代码。

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod observability;

pub use bootstrap::{bootstrap, bootstrap_from};
pub use config::AppConfig;
pub use error::{SharedError, SharedResult};
