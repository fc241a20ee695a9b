//! 匹配服务客户端
//!
//! 规则引擎只通过 `evaluate` 一个操作使用外部匹配服务。
//! 通过 trait 抽象，测试中可替换为 mock 实现，无需启动真实服务。

use async_trait::async_trait;
use segment_shared::config::MatchingServiceConfig;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Result, SegmentError, TransportError};
use crate::models::RuleTree;

use super::models::PreviewResult;

/// 外部匹配服务接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MatchingService: Send + Sync {
    /// 评估规则树，返回匹配人数与样例客户
    async fn evaluate(&self, tree: &RuleTree) -> std::result::Result<PreviewResult, TransportError>;
}

/// 预览请求体
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PreviewRequest<'a> {
    rules: &'a RuleTree,
    sample_size: usize,
}

/// 基于 HTTP 的匹配服务客户端
///
/// reqwest::Client 内部带连接池，clone 是廉价操作。
#[derive(Debug, Clone)]
pub struct HttpMatchingClient {
    client: reqwest::Client,
    endpoint: String,
    sample_size: usize,
}

impl HttpMatchingClient {
    pub fn new(config: &MatchingServiceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| SegmentError::Transport(TransportError::Http(e.to_string())))?;

        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: reqwest::Client, config: &MatchingServiceConfig) -> Self {
        Self {
            client,
            endpoint: join_url(&config.base_url, &config.preview_path),
            sample_size: config.sample_size,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else {
        TransportError::Http(err.to_string())
    }
}

#[async_trait]
impl MatchingService for HttpMatchingClient {
    async fn evaluate(&self, tree: &RuleTree) -> std::result::Result<PreviewResult, TransportError> {
        let body = PreviewRequest {
            rules: tree,
            sample_size: self.sample_size,
        };

        debug!(endpoint = %self.endpoint, "调用匹配服务预览接口");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "匹配服务返回错误状态");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<PreviewResult>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}
