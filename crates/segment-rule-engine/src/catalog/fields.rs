//! 字段目录
//!
//! 客户属性字段的静态注册表：字段 ID、显示名、分组以及取值类型。
//! 进程启动即可用，生命周期与进程一致。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 字段取值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    /// 有限枚举，可选值由字段定义给出
    Choice,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Choice => "choice",
        };
        write!(f, "{}", s)
    }
}

/// 字段分组，仅用于界面归类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    Revenue,
    Health,
    Lifecycle,
    Firmographic,
    Engagement,
}

/// 字段定义
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldDefinition {
    pub id: &'static str,
    pub label: &'static str,
    pub category: FieldCategory,
    pub field_type: FieldType,
    /// 仅 Choice 类型非空
    pub choices: &'static [&'static str],
}

impl FieldDefinition {
    const fn new(
        id: &'static str,
        label: &'static str,
        category: FieldCategory,
        field_type: FieldType,
    ) -> Self {
        Self {
            id,
            label,
            category,
            field_type,
            choices: &[],
        }
    }

    const fn choice(
        id: &'static str,
        label: &'static str,
        category: FieldCategory,
        choices: &'static [&'static str],
    ) -> Self {
        Self {
            id,
            label,
            category,
            field_type: FieldType::Choice,
            choices,
        }
    }

    /// 按大小写不敏感的方式匹配可选值，返回规范写法
    pub fn canonical_choice(&self, input: &str) -> Option<&'static str> {
        self.choices
            .iter()
            .copied()
            .find(|choice| choice.eq_ignore_ascii_case(input.trim()))
    }
}

static FIELDS: &[FieldDefinition] = &[
    // 收入
    FieldDefinition::new("arr", "ARR", FieldCategory::Revenue, FieldType::Number),
    FieldDefinition::new("mrr", "MRR", FieldCategory::Revenue, FieldType::Number),
    FieldDefinition::new(
        "lifetime_value",
        "Lifetime value",
        FieldCategory::Revenue,
        FieldType::Number,
    ),
    FieldDefinition::new(
        "has_payment_issue",
        "Payment issue",
        FieldCategory::Revenue,
        FieldType::Boolean,
    ),
    // 健康度
    FieldDefinition::new(
        "health_score",
        "Health score",
        FieldCategory::Health,
        FieldType::Number,
    ),
    FieldDefinition::new(
        "churn_probability",
        "Churn probability",
        FieldCategory::Health,
        FieldType::Number,
    ),
    FieldDefinition::new("nps_score", "NPS score", FieldCategory::Health, FieldType::Number),
    // 生命周期
    FieldDefinition::choice(
        "plan",
        "Plan",
        FieldCategory::Lifecycle,
        &["starter", "growth", "enterprise"],
    ),
    FieldDefinition::choice(
        "status",
        "Status",
        FieldCategory::Lifecycle,
        &["trial", "active", "paused", "churned"],
    ),
    FieldDefinition::new(
        "renewal_date",
        "Renewal date",
        FieldCategory::Lifecycle,
        FieldType::Date,
    ),
    FieldDefinition::new(
        "created_at",
        "Customer since",
        FieldCategory::Lifecycle,
        FieldType::Date,
    ),
    FieldDefinition::new(
        "auto_renew",
        "Auto-renew",
        FieldCategory::Lifecycle,
        FieldType::Boolean,
    ),
    // 企业属性
    FieldDefinition::new(
        "company_name",
        "Company name",
        FieldCategory::Firmographic,
        FieldType::String,
    ),
    FieldDefinition::new(
        "industry",
        "Industry",
        FieldCategory::Firmographic,
        FieldType::String,
    ),
    FieldDefinition::choice(
        "region",
        "Region",
        FieldCategory::Firmographic,
        &["north", "south", "east", "west"],
    ),
    FieldDefinition::new(
        "employee_count",
        "Employee count",
        FieldCategory::Firmographic,
        FieldType::Number,
    ),
    // 服务互动
    FieldDefinition::new(
        "equipment_count",
        "Equipment count",
        FieldCategory::Engagement,
        FieldType::Number,
    ),
    FieldDefinition::new(
        "open_tickets",
        "Open tickets",
        FieldCategory::Engagement,
        FieldType::Number,
    ),
    FieldDefinition::new(
        "last_service_date",
        "Last service date",
        FieldCategory::Engagement,
        FieldType::Date,
    ),
];

/// 按 ID 查找字段
pub fn lookup_field(id: &str) -> Option<&'static FieldDefinition> {
    FIELDS.iter().find(|field| field.id == id)
}

/// 全部字段，按注册顺序
pub fn all_fields() -> &'static [FieldDefinition] {
    FIELDS
}

/// 某一分组下的字段
pub fn fields_in_category(
    category: FieldCategory,
) -> impl Iterator<Item = &'static FieldDefinition> {
    FIELDS.iter().filter(move |field| field.category == category)
}
