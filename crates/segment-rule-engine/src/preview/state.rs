//! 预览状态机
//!
//! 不含任何 IO 和计时器，只根据事件迁移状态并告诉驱动方下一步要做什么：
//! 重启/取消静默窗口计时器，或者发起一次匹配请求。
//!
//! ```text
//! Idle --commit(valid)--> Debouncing --quiet window--> InFlight --response(token)--> Settled
//!  ^                        ^   |                        |   |
//!  |                        +---+ commit(valid)          |   +--transport error--> Idle
//!  +--------- commit(invalid or empty) from any phase ---+
//! ```

use serde::Serialize;
use tracing::debug;

use crate::error::TransportError;
use crate::models::RuleTree;
use crate::validator::validate;

use super::models::PreviewResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewPhase {
    Idle,
    Debouncing,
    InFlight,
    Settled,
}

/// 对外发布的预览快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewSnapshot {
    pub phase: PreviewPhase,
    pub result: Option<PreviewResult>,
    /// 最近一次请求失败的原因，界面显示为"预览不可用"
    pub last_error: Option<String>,
}

impl Default for PreviewSnapshot {
    fn default() -> Self {
        Self {
            phase: PreviewPhase::Idle,
            result: None,
            last_error: None,
        }
    }
}

/// 提交后对计时器的指令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// 从现在起重新计时一个完整的静默窗口
    Restart,
    /// 取消计时器
    Cancel,
}

/// 需要发往匹配服务的请求
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRequest {
    pub token: u64,
    pub tree: RuleTree,
}

/// 响应的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseDisposition {
    /// 最新令牌的成功响应，结果已整体替换
    Applied,
    /// 最新令牌的失败响应，回到 Idle 并保留上一次成功结果
    Failed,
    /// 令牌已过期，响应被丢弃
    Stale,
}

/// 预览状态
#[derive(Debug, Clone)]
pub struct PreviewState {
    phase: PreviewPhase,
    latest_tree: Option<RuleTree>,
    /// 当前唯一有效的请求令牌
    pending_token: Option<u64>,
    next_token: u64,
    result: Option<PreviewResult>,
    last_error: Option<String>,
}

impl Default for PreviewState {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewState {
    pub fn new() -> Self {
        Self {
            phase: PreviewPhase::Idle,
            latest_tree: None,
            pending_token: None,
            next_token: 1,
            result: None,
            last_error: None,
        }
    }

    pub fn phase(&self) -> PreviewPhase {
        self.phase
    }

    pub fn pending_token(&self) -> Option<u64> {
        self.pending_token
    }

    /// 编辑器提交了新树
    ///
    /// 树为空或结构无效时立即回到 Idle 并清空结果；否则进入防抖。
    /// 任何在途请求都会因此失效。
    pub fn on_commit(&mut self, tree: RuleTree) -> TimerCommand {
        self.pending_token = None;
        self.last_error = None;

        if tree.is_empty() || !validate(&tree).valid {
            debug!("tree empty or invalid, preview cleared");
            self.phase = PreviewPhase::Idle;
            self.latest_tree = None;
            self.result = None;
            return TimerCommand::Cancel;
        }

        self.latest_tree = Some(tree);
        self.phase = PreviewPhase::Debouncing;
        TimerCommand::Restart
    }

    /// 静默窗口结束，返回需要发起的请求
    pub fn on_quiet_window_elapsed(&mut self) -> Option<EvaluationRequest> {
        if self.phase != PreviewPhase::Debouncing {
            return None;
        }
        let tree = self.latest_tree.clone()?;

        let token = self.next_token;
        self.next_token += 1;
        self.pending_token = Some(token);
        self.phase = PreviewPhase::InFlight;

        Some(EvaluationRequest { token, tree })
    }

    /// 匹配服务响应到达
    pub fn on_response(
        &mut self,
        token: u64,
        outcome: Result<PreviewResult, TransportError>,
    ) -> ResponseDisposition {
        if self.pending_token != Some(token) {
            return ResponseDisposition::Stale;
        }
        self.pending_token = None;

        match outcome {
            Ok(result) => {
                self.result = Some(result);
                self.last_error = None;
                self.phase = PreviewPhase::Settled;
                ResponseDisposition::Applied
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                self.phase = PreviewPhase::Idle;
                ResponseDisposition::Failed
            }
        }
    }

    pub fn snapshot(&self) -> PreviewSnapshot {
        PreviewSnapshot {
            phase: self.phase,
            result: self.result.clone(),
            last_error: self.last_error.clone(),
        }
    }
}
