//! 操作符目录
//!
//! 每个操作符声明其适用的字段类型和操作数个数。`compatible_operators`
//! 的返回顺序固定：相等、比较、文本匹配、多值、空值检查。

use serde::{Deserialize, Serialize};
use std::fmt;

use super::fields::FieldType;

/// 条件操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    // 相等
    Eq,
    Neq,

    // 比较
    Gt,
    Gte,
    Lt,
    Lte,
    Between,

    // 文本匹配
    Contains,
    NotContains,
    StartsWith,
    EndsWith,

    // 多值
    In,
    NotIn,

    // 空值检查
    IsEmpty,
    IsNotEmpty,
}

/// 操作数个数
///
/// 目前只有 0/1/2 三种；若将来出现更多操作数的操作符，扩展 `operand_count` 即可。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arity {
    /// 无操作数，如 "is empty"
    NoOperand,
    /// 单操作数（默认）
    Single,
    /// 两个操作数，如 "between"
    Pair,
}

impl Arity {
    pub fn operand_count(self) -> usize {
        match self {
            Self::NoOperand => 0,
            Self::Single => 1,
            Self::Pair => 2,
        }
    }
}

/// 操作符分组，决定界面上的排列顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorGroup {
    Equality,
    Comparison,
    TextMatch,
    MultiValue,
    NullCheck,
}

/// 操作符定义
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OperatorDefinition {
    pub operator: Operator,
    pub id: &'static str,
    pub label: &'static str,
    pub field_types: &'static [FieldType],
    pub arity: Arity,
    pub group: OperatorGroup,
}

impl OperatorDefinition {
    pub fn supports(&self, field_type: FieldType) -> bool {
        self.field_types.contains(&field_type)
    }
}

const ALL_TYPES: &[FieldType] = &[
    FieldType::String,
    FieldType::Number,
    FieldType::Boolean,
    FieldType::Date,
    FieldType::Choice,
];
const ORDERED_TYPES: &[FieldType] = &[FieldType::Number, FieldType::Date];
const TEXT_TYPES: &[FieldType] = &[FieldType::String];
const LIST_TYPES: &[FieldType] = &[FieldType::String, FieldType::Number, FieldType::Choice];

const fn def(
    operator: Operator,
    id: &'static str,
    label: &'static str,
    field_types: &'static [FieldType],
    arity: Arity,
    group: OperatorGroup,
) -> OperatorDefinition {
    OperatorDefinition {
        operator,
        id,
        label,
        field_types,
        arity,
        group,
    }
}

static EQ: OperatorDefinition = def(
    Operator::Eq,
    "eq",
    "is",
    ALL_TYPES,
    Arity::Single,
    OperatorGroup::Equality,
);
static NEQ: OperatorDefinition = def(
    Operator::Neq,
    "neq",
    "is not",
    ALL_TYPES,
    Arity::Single,
    OperatorGroup::Equality,
);
static GT: OperatorDefinition = def(
    Operator::Gt,
    "gt",
    "is greater than",
    ORDERED_TYPES,
    Arity::Single,
    OperatorGroup::Comparison,
);
static GTE: OperatorDefinition = def(
    Operator::Gte,
    "gte",
    "is at least",
    ORDERED_TYPES,
    Arity::Single,
    OperatorGroup::Comparison,
);
static LT: OperatorDefinition = def(
    Operator::Lt,
    "lt",
    "is less than",
    ORDERED_TYPES,
    Arity::Single,
    OperatorGroup::Comparison,
);
static LTE: OperatorDefinition = def(
    Operator::Lte,
    "lte",
    "is at most",
    ORDERED_TYPES,
    Arity::Single,
    OperatorGroup::Comparison,
);
static BETWEEN: OperatorDefinition = def(
    Operator::Between,
    "between",
    "is between",
    ORDERED_TYPES,
    Arity::Pair,
    OperatorGroup::Comparison,
);
static CONTAINS: OperatorDefinition = def(
    Operator::Contains,
    "contains",
    "contains",
    TEXT_TYPES,
    Arity::Single,
    OperatorGroup::TextMatch,
);
static NOT_CONTAINS: OperatorDefinition = def(
    Operator::NotContains,
    "not_contains",
    "does not contain",
    TEXT_TYPES,
    Arity::Single,
    OperatorGroup::TextMatch,
);
static STARTS_WITH: OperatorDefinition = def(
    Operator::StartsWith,
    "starts_with",
    "starts with",
    TEXT_TYPES,
    Arity::Single,
    OperatorGroup::TextMatch,
);
static ENDS_WITH: OperatorDefinition = def(
    Operator::EndsWith,
    "ends_with",
    "ends with",
    TEXT_TYPES,
    Arity::Single,
    OperatorGroup::TextMatch,
);
static IN: OperatorDefinition = def(
    Operator::In,
    "in",
    "is any of",
    LIST_TYPES,
    Arity::Single,
    OperatorGroup::MultiValue,
);
static NOT_IN: OperatorDefinition = def(
    Operator::NotIn,
    "not_in",
    "is none of",
    LIST_TYPES,
    Arity::Single,
    OperatorGroup::MultiValue,
);
static IS_EMPTY: OperatorDefinition = def(
    Operator::IsEmpty,
    "is_empty",
    "is empty",
    ALL_TYPES,
    Arity::NoOperand,
    OperatorGroup::NullCheck,
);
static IS_NOT_EMPTY: OperatorDefinition = def(
    Operator::IsNotEmpty,
    "is_not_empty",
    "has a value",
    ALL_TYPES,
    Arity::NoOperand,
    OperatorGroup::NullCheck,
);

/// 规范顺序
static OPERATORS: [&OperatorDefinition; 15] = [
    &EQ,
    &NEQ,
    &GT,
    &GTE,
    &LT,
    &LTE,
    &BETWEEN,
    &CONTAINS,
    &NOT_CONTAINS,
    &STARTS_WITH,
    &ENDS_WITH,
    &IN,
    &NOT_IN,
    &IS_EMPTY,
    &IS_NOT_EMPTY,
];

impl Operator {
    pub fn definition(self) -> &'static OperatorDefinition {
        match self {
            Self::Eq => &EQ,
            Self::Neq => &NEQ,
            Self::Gt => &GT,
            Self::Gte => &GTE,
            Self::Lt => &LT,
            Self::Lte => &LTE,
            Self::Between => &BETWEEN,
            Self::Contains => &CONTAINS,
            Self::NotContains => &NOT_CONTAINS,
            Self::StartsWith => &STARTS_WITH,
            Self::EndsWith => &ENDS_WITH,
            Self::In => &IN,
            Self::NotIn => &NOT_IN,
            Self::IsEmpty => &IS_EMPTY,
            Self::IsNotEmpty => &IS_NOT_EMPTY,
        }
    }

    pub fn id(self) -> &'static str {
        self.definition().id
    }

    pub fn arity(self) -> Arity {
        self.definition().arity
    }

    /// 取值为列表的操作符
    pub fn is_multi_value(self) -> bool {
        self.definition().group == OperatorGroup::MultiValue
    }

    pub fn supports(self, field_type: FieldType) -> bool {
        self.definition().supports(field_type)
    }

    /// 面向用户的描述，日期字段上的比较使用时间语义
    pub fn label_for(self, field_type: FieldType) -> &'static str {
        if field_type == FieldType::Date {
            match self {
                Self::Gt => return "is after",
                Self::Gte => return "is on or after",
                Self::Lt => return "is before",
                Self::Lte => return "is on or before",
                _ => {}
            }
        }
        self.definition().label
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// 按 ID 查找操作符
pub fn lookup_operator(id: &str) -> Option<&'static OperatorDefinition> {
    OPERATORS.iter().copied().find(|op| op.id == id)
}

/// 全部操作符，按规范顺序
pub fn all_operators() -> &'static [&'static OperatorDefinition] {
    &OPERATORS
}

/// 某字段类型可用的操作符，按规范顺序
pub fn compatible_operators(field_type: FieldType) -> Vec<&'static OperatorDefinition> {
    OPERATORS
        .iter()
        .copied()
        .filter(|op| op.supports(field_type))
        .collect()
}
