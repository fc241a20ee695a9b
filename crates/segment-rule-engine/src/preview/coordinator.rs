//! 预览协调器
//!
//! 单个后台任务独占 `PreviewState`、静默窗口计时器和在途请求。编辑会话通过
//! `PreviewHandle::commit` 投递新树，通过 watch 通道读取最新快照。

use std::sync::Arc;
use std::time::Duration;

use segment_shared::config::PreviewConfig;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::models::RuleTree;

use super::client::MatchingService;
use super::models::PreviewResult;
use super::state::{
    EvaluationRequest, PreviewSnapshot, PreviewState, ResponseDisposition, TimerCommand,
};

enum Message {
    Commit(RuleTree),
    Shutdown,
}

struct Response {
    token: u64,
    outcome: Result<PreviewResult, TransportError>,
}

/// 预览协调器句柄
///
/// clone 后共享同一个后台任务；所有句柄被 drop 后后台任务自动退出。
#[derive(Clone)]
pub struct PreviewHandle {
    commands: mpsc::UnboundedSender<Message>,
    snapshots: watch::Receiver<PreviewSnapshot>,
    task: Arc<JoinHandle<()>>,
}

impl PreviewHandle {
    /// 投递一次提交，后台任务已退出时返回 false
    pub fn commit(&self, tree: RuleTree) -> bool {
        self.commands.send(Message::Commit(tree)).is_ok()
    }

    /// 当前快照
    pub fn snapshot(&self) -> PreviewSnapshot {
        self.snapshots.borrow().clone()
    }

    /// 订阅快照变化
    pub fn subscribe(&self) -> watch::Receiver<PreviewSnapshot> {
        self.snapshots.clone()
    }

    /// 通知后台任务退出（会话结束时调用）
    pub fn shutdown(&self) {
        let _ = self.commands.send(Message::Shutdown);
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

/// 预览协调器
pub struct PreviewCoordinator {
    service: Arc<dyn MatchingService>,
    debounce: Duration,
    request_timeout: Duration,
    state: PreviewState,
    snapshots: watch::Sender<PreviewSnapshot>,
}

impl PreviewCoordinator {
    /// 在当前 tokio 运行时上启动后台任务
    pub fn spawn(service: Arc<dyn MatchingService>, config: &PreviewConfig) -> PreviewHandle {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (snapshots_tx, snapshots_rx) = watch::channel(PreviewSnapshot::default());

        let coordinator = Self {
            service,
            debounce: config.debounce(),
            request_timeout: config.request_timeout(),
            state: PreviewState::new(),
            snapshots: snapshots_tx,
        };

        info!(
            debounce_ms = config.debounce_ms,
            request_timeout_ms = config.request_timeout_ms,
            "preview coordinator started"
        );

        let task = tokio::spawn(coordinator.run(commands_rx));

        PreviewHandle {
            commands: commands_tx,
            snapshots: snapshots_rx,
            task: Arc::new(task),
        }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Message>) {
        let (responses_tx, mut responses) = mpsc::unbounded_channel::<Response>();
        let mut deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                message = commands.recv() => match message {
                    Some(Message::Commit(tree)) => {
                        deadline = match self.state.on_commit(tree) {
                            TimerCommand::Restart => Some(Instant::now() + self.debounce),
                            TimerCommand::Cancel => None,
                        };
                        self.publish();
                    }
                    Some(Message::Shutdown) | None => break,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = None;
                    if let Some(request) = self.state.on_quiet_window_elapsed() {
                        self.dispatch(request, responses_tx.clone());
                    }
                    self.publish();
                }
                Some(response) = responses.recv() => {
                    match self.state.on_response(response.token, response.outcome) {
                        ResponseDisposition::Applied => {
                            debug!(token = response.token, "preview result applied");
                        }
                        ResponseDisposition::Failed => {
                            metrics::counter!("segment_preview_failures_total").increment(1);
                            warn!(token = response.token, "preview request failed");
                        }
                        ResponseDisposition::Stale => {
                            metrics::counter!("segment_preview_stale_total").increment(1);
                            debug!(token = response.token, "stale preview response discarded");
                        }
                    }
                    self.publish();
                }
            }
        }

        debug!("preview coordinator stopped");
    }

    /// 在独立任务中发起请求，结果带令牌回传
    fn dispatch(&self, request: EvaluationRequest, responses: mpsc::UnboundedSender<Response>) {
        let service = Arc::clone(&self.service);
        let timeout = self.request_timeout;
        let EvaluationRequest { token, tree } = request;

        metrics::counter!("segment_preview_requests_total").increment(1);
        debug!(token, "preview request issued");

        tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, service.evaluate(&tree)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(TransportError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                }),
            };
            // 协调器已退出时丢弃即可
            let _ = responses.send(Response { token, outcome });
        });
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.state.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Operator;
    use crate::models::{RuleNode, RuleValue};
    use crate::preview::client::MockMatchingService;
    use crate::preview::state::PreviewPhase;

    fn config() -> PreviewConfig {
        PreviewConfig {
            debounce_ms: 500,
            request_timeout_ms: 2_000,
        }
    }

    fn tree(n: f64) -> RuleTree {
        RuleTree::and(vec![
            RuleNode::new("arr", Operator::Gte, RuleValue::Number(n)).into(),
        ])
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_returns_to_idle() {
        let mut mock = MockMatchingService::new();
        mock.expect_evaluate()
            .times(1)
            .returning(|_| Err(TransportError::Status { status: 502, body: "bad gateway".to_string() }));

        let handle = PreviewCoordinator::spawn(Arc::new(mock), &config());
        assert!(handle.commit(tree(1.0)));

        tokio::time::sleep(Duration::from_millis(600)).await;

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.phase, PreviewPhase::Idle);
        assert!(snapshot.result.is_none());
        assert!(snapshot.last_error.unwrap().contains("502"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_settles() {
        let mut mock = MockMatchingService::new();
        mock.expect_evaluate()
            .times(1)
            .returning(|_| Ok(PreviewResult::with_count(31)));

        let handle = PreviewCoordinator::spawn(Arc::new(mock), &config());
        handle.commit(tree(1.0));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(handle.snapshot().phase, PreviewPhase::Debouncing);

        tokio::time::sleep(Duration::from_millis(500)).await;
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.phase, PreviewPhase::Settled);
        assert_eq!(snapshot.result.unwrap().count, 31);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_tree_never_reaches_service() {
        let mut mock = MockMatchingService::new();
        mock.expect_evaluate().times(0);

        let handle = PreviewCoordinator::spawn(Arc::new(mock), &config());
        handle.commit(RuleTree::empty());
        handle.commit(RuleTree::and(vec![RuleNode::unary("arr", Operator::Gt).into()]));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(handle.snapshot(), PreviewSnapshot::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_task() {
        let mock = MockMatchingService::new();
        let handle = PreviewCoordinator::spawn(Arc::new(mock), &config());
        assert!(handle.is_running());

        handle.shutdown();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!handle.is_running());
        assert!(!handle.commit(tree(1.0)));
    }
}
