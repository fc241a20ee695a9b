//! 预览结果模型

use serde::{Deserialize, Serialize};

/// 样例客户摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<f64>,
}

/// 匹配服务返回的预览结果，每次完成评估后整体替换
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResult {
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_metric: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_metric: Option<f64>,
    #[serde(default)]
    pub sample_members: Vec<MemberSummary>,
}

impl PreviewResult {
    pub fn with_count(count: u64) -> Self {
        Self {
            count,
            ..Default::default()
        }
    }
}
