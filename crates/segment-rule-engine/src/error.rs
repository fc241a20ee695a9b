//! 规则引擎错误类型

use thiserror::Error;

use crate::validator::ValidationReport;

#[derive(Debug, Error)]
pub enum SegmentError {
    /// 新增规则组会让树超过最大嵌套层数，变更被拒绝
    #[error("嵌套层级超限: 目标层级 {depth}, 最大 {max}")]
    DepthExceeded { depth: usize, max: usize },

    #[error("路径无效: {path:?} 未指向规则组")]
    InvalidPath { path: Vec<usize> },

    #[error("索引越界: {index} (共 {len} 个子节点)")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("字段不存在: {0}")]
    UnknownField(String),

    #[error("取值无效: 字段 {field} 期望 {expected}, 输入 '{input}'")]
    InvalidValue {
        field: String,
        expected: String,
        input: String,
    },

    #[error("规则校验失败: 共 {} 个问题", .0.errors.len())]
    Validation(ValidationReport),

    #[error("分群不存在: {0}")]
    SegmentNotFound(String),

    #[error("分群仓储错误: {0}")]
    Repository(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("JSON 序列化错误: {0}")]
    Json(#[from] serde_json::Error),
}

/// 匹配服务调用错误
///
/// 预览协调器对所有变体一视同仁：保留上一次成功的结果，等待下一次编辑重试。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("匹配服务请求失败: {0}")]
    Http(String),

    #[error("匹配服务返回错误状态 {status}: {body}")]
    Status { status: u16, body: String },

    #[error("匹配服务请求超时 ({timeout_ms}ms)")]
    Timeout { timeout_ms: u64 },

    #[error("匹配服务响应解析失败: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, SegmentError>;
