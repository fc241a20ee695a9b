//! 实时预览
//!
//! 规则树每次提交后，经过静默窗口防抖，再向外部匹配服务请求匹配人数。
//! 过期响应通过令牌比对丢弃，不依赖传输层支持取消。

pub mod client;
pub mod coordinator;
pub mod models;
pub mod state;

pub use client::{HttpMatchingClient, MatchingService};
pub use coordinator::{PreviewCoordinator, PreviewHandle};
pub use models::{MemberSummary, PreviewResult};
pub use state::{
    EvaluationRequest, PreviewPhase, PreviewSnapshot, PreviewState, ResponseDisposition,
    TimerCommand,
};
