//! 分群规则引擎
//!
//! 用户在界面上搭建任意嵌套的布尔表达式（"ARR > 50000 AND (health_score < 40 OR ...)"），
//! 本 crate 负责：
//! - 字段与操作符目录（类型兼容矩阵）
//! - 规则树模型与值类型转换
//! - 带层数限制的变更原语与撤销/重做历史
//! - 结构校验（累积全部问题）
//! - 防抖、可丢弃过期响应的实时预览
//!
//! 规则的实际求值、存储和自然语言解析都由外部协作方负责，见 `segment` 与 `preview::client`。

pub mod catalog;
pub mod describe;
pub mod editor;
pub mod error;
pub mod models;
pub mod mutations;
pub mod preview;
pub mod segment;
pub mod session;
pub mod validator;
pub mod value;

pub use catalog::{Arity, FieldDefinition, FieldType, Operator};
pub use describe::{describe_node, describe_tree};
pub use editor::{Mutation, TreeEditor};
pub use error::{Result, SegmentError, TransportError};
pub use models::{
    LogicalOperator, MAX_NESTING_DEPTH, RelativeDays, RuleChild, RuleNode, RuleTree, RuleValue,
};
pub use preview::{
    HttpMatchingClient, MatchingService, PreviewCoordinator, PreviewHandle, PreviewPhase,
    PreviewResult, PreviewSnapshot,
};
pub use segment::{NlSuggestion, SegmentDefinition, SegmentMetadata, SegmentRepository};
pub use session::SegmentSession;
pub use validator::{IssueKind, ValidationIssue, ValidationReport, validate};
pub use value::coerce_value;
