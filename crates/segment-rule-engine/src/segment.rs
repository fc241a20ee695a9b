//! 分群定义与外部协作方接口
//!
//! 存储结构由外部仓储决定，规则引擎只要求规则树经序列化往返后无损。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::RuleTree;

/// 分群元数据，保存时随规则树一起提交
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// 展示颜色，如 "#4f46e5"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// 分群类型标签，如 "retention"、"expansion"
    pub segment_type: String,
}

impl SegmentMetadata {
    pub fn new(name: impl Into<String>, segment_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            color: None,
            segment_type: segment_type.into(),
        }
    }
}

/// 已保存的分群
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentDefinition {
    pub id: String,
    #[serde(flatten)]
    pub metadata: SegmentMetadata,
    pub rules: RuleTree,
    pub updated_at: DateTime<Utc>,
}

/// 分群仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SegmentRepository: Send + Sync {
    async fn load(&self, id: &str) -> Result<Option<SegmentDefinition>>;

    /// 保存分群，`id` 为 None 时新建
    async fn save(
        &self,
        id: Option<String>,
        metadata: SegmentMetadata,
        rules: RuleTree,
    ) -> Result<SegmentDefinition>;
}

/// 自然语言解析器给出的规则建议
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NlSuggestion {
    pub rules: RuleTree,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_name: Option<String>,
    /// 0.0 ~ 1.0
    pub confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Operator;
    use crate::models::{RuleNode, RuleValue};
    use serde_json::json;

    #[test]
    fn test_definition_flattens_metadata() {
        let definition = SegmentDefinition {
            id: "seg-1".to_string(),
            metadata: SegmentMetadata {
                description: Some("High value at risk".to_string()),
                ..SegmentMetadata::new("At risk", "retention")
            },
            rules: RuleTree::and(vec![
                RuleNode::new("health_score", Operator::Lt, RuleValue::Number(40.0)).into(),
            ]),
            updated_at: DateTime::parse_from_rfc3339("2024-03-01T08:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };

        let value = serde_json::to_value(&definition).unwrap();
        assert_eq!(value["name"], json!("At risk"));
        assert_eq!(value["segmentType"], json!("retention"));
        assert!(value.get("color").is_none());
        assert_eq!(value["rules"]["children"][0]["field"], json!("health_score"));

        let back: SegmentDefinition = serde_json::from_value(value).unwrap();
        assert_eq!(back, definition);
    }

    #[test]
    fn test_suggestion_from_parser_payload() {
        let suggestion: NlSuggestion = serde_json::from_value(json!({
            "rules": {
                "logic": "OR",
                "children": [
                    {"type": "condition", "field": "plan", "operator": "in",
                     "value": {"kind": "text_list", "value": ["growth", "enterprise"]}}
                ]
            },
            "suggestedName": "Paid plans",
            "confidence": 0.82
        }))
        .unwrap();

        assert_eq!(suggestion.suggested_name.as_deref(), Some("Paid plans"));
        assert_eq!(suggestion.rules.children.len(), 1);
    }
}
