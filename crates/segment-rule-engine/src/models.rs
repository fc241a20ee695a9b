//! 分群规则领域模型
//!
//! 规则树是值语义的：所有变更都返回新树，校验器和预览协调器永远不会看到变更中途的树。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::catalog::{FieldDefinition, FieldType, Operator, lookup_field};

/// 从根开始计数的最大层数（根为第 0 层），即最多三层规则组
pub const MAX_NESTING_DEPTH: usize = 3;

/// 新条件默认使用的字段
pub const DEFAULT_FIELD: &str = "arr";

/// 相对日期："-Nd" 表示 N 天前
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelativeDays(pub u32);

impl FromStr for RelativeDays {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let days = s
            .trim()
            .strip_prefix('-')
            .and_then(|rest| rest.strip_suffix('d'))
            .ok_or_else(|| format!("相对日期格式应为 -Nd: {}", s))?;

        days.parse::<u32>()
            .map(RelativeDays)
            .map_err(|e| format!("相对日期天数无效 '{}': {}", s, e))
    }
}

impl TryFrom<String> for RelativeDays {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RelativeDays> for String {
    fn from(value: RelativeDays) -> Self {
        format!("-{}d", value.0)
    }
}

/// 条件取值
///
/// 按字段类型打标签存储，保证序列化往返不丢失类型信息
/// （例如字符串 "2024-01-01" 与日期 2024-01-01 不会混淆）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RuleValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Date(NaiveDate),
    RelativeDate(RelativeDays),
    TextList(Vec<String>),
    NumberList(Vec<f64>),
}

impl RuleValue {
    /// 某字段的初始取值，字符串字段没有合理的默认值
    pub fn default_for(field: &FieldDefinition) -> Option<Self> {
        match field.field_type {
            FieldType::Number => Some(Self::Number(0.0)),
            FieldType::Boolean => Some(Self::Boolean(true)),
            FieldType::Date => Some(Self::RelativeDate(RelativeDays(30))),
            FieldType::Choice => field.choices.first().map(|c| Self::Text((*c).to_string())),
            FieldType::String => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::TextList(_) | Self::NumberList(_))
    }

    /// 空字符串和空列表视为未填写
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::TextList(items) => items.is_empty(),
            Self::NumberList(items) => items.is_empty(),
            _ => false,
        }
    }

    /// 取值种类是否与字段类型匹配
    pub fn fits(&self, field_type: FieldType) -> bool {
        match (field_type, self) {
            (FieldType::String | FieldType::Choice, Self::Text(_) | Self::TextList(_)) => true,
            (FieldType::Number, Self::Number(_) | Self::NumberList(_)) => true,
            (FieldType::Boolean, Self::Boolean(_)) => true,
            (FieldType::Date, Self::Date(_) | Self::RelativeDate(_)) => true,
            _ => false,
        }
    }

    /// 标量转为单元素列表
    pub fn into_list(self) -> Self {
        match self {
            Self::Text(s) => Self::TextList(vec![s]),
            Self::Number(n) => Self::NumberList(vec![n]),
            other => other,
        }
    }

    /// 列表取首个元素，空列表返回 None
    pub fn into_scalar(self) -> Option<Self> {
        match self {
            Self::TextList(items) => items.into_iter().next().map(Self::Text),
            Self::NumberList(items) => items.into_iter().next().map(Self::Number),
            other => Some(other),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Number(_) => "number",
            Self::Boolean(_) => "boolean",
            Self::Date(_) => "date",
            Self::RelativeDate(_) => "relative_date",
            Self::TextList(_) => "text_list",
            Self::NumberList(_) => "number_list",
        }
    }
}

impl fmt::Display for RuleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Number(n) => write!(f, "{}", n),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::RelativeDate(RelativeDays(0)) => write!(f, "today"),
            Self::RelativeDate(RelativeDays(1)) => write!(f, "1 day ago"),
            Self::RelativeDate(RelativeDays(n)) => write!(f, "{} days ago", n),
            Self::TextList(items) => write!(f, "{}", items.join(", ")),
            Self::NumberList(items) => {
                let parts: Vec<String> = items.iter().map(|n| n.to_string()).collect();
                write!(f, "{}", parts.join(", "))
            }
        }
    }
}

/// 条件节点（叶子）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleNode {
    pub field: String,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RuleValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value2: Option<RuleValue>,
}

impl RuleNode {
    pub fn new(field: impl Into<String>, operator: Operator, value: RuleValue) -> Self {
        Self {
            field: field.into(),
            operator,
            value: Some(value),
            value2: None,
        }
    }

    /// 无操作数条件，如 "is empty"
    pub fn unary(field: impl Into<String>, operator: Operator) -> Self {
        Self {
            field: field.into(),
            operator,
            value: None,
            value2: None,
        }
    }

    pub fn between(field: impl Into<String>, low: RuleValue, high: RuleValue) -> Self {
        Self {
            field: field.into(),
            operator: Operator::Between,
            value: Some(low),
            value2: Some(high),
        }
    }

    /// 用户新增条件时的默认节点，必须能通过校验
    pub fn default_node() -> Self {
        let value = lookup_field(DEFAULT_FIELD).and_then(RuleValue::default_for);
        Self {
            field: DEFAULT_FIELD.to_string(),
            operator: Operator::Eq,
            value,
            value2: None,
        }
    }

    /// 更换字段：操作符重置为相等，两个取值全部清空，避免残留类型不兼容的旧值
    pub fn with_field(&self, field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: Operator::Eq,
            value: None,
            value2: None,
        }
    }

    /// 更换操作符：仍有意义的取值会被保留并按新操作符调整形态
    pub fn with_operator(&self, operator: Operator) -> Self {
        use crate::catalog::Arity;

        let (value, value2) = match operator.arity() {
            Arity::NoOperand => (None, None),
            Arity::Single if operator.is_multi_value() => {
                (self.value.clone().map(RuleValue::into_list), None)
            }
            Arity::Single => (self.value.clone().and_then(RuleValue::into_scalar), None),
            Arity::Pair => (
                self.value.clone().and_then(RuleValue::into_scalar),
                self.value2.clone(),
            ),
        };

        Self {
            field: self.field.clone(),
            operator,
            value,
            value2,
        }
    }

    /// 整体替换取值
    pub fn with_values(&self, value: Option<RuleValue>, value2: Option<RuleValue>) -> Self {
        Self {
            field: self.field.clone(),
            operator: self.operator,
            value,
            value2,
        }
    }

    pub fn field_definition(&self) -> Option<&'static FieldDefinition> {
        lookup_field(&self.field)
    }
}

impl Default for RuleNode {
    fn default() -> Self {
        Self::default_node()
    }
}

/// 逻辑操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl LogicalOperator {
    pub fn toggled(self) -> Self {
        match self {
            Self::And => Self::Or,
            Self::Or => Self::And,
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

/// 规则树（规则组）
///
/// 子节点顺序有意义：既是展示顺序，也是拖拽排序的依据。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RuleTree {
    pub logic: LogicalOperator,
    #[serde(default)]
    pub children: Vec<RuleChild>,
}

/// 规则树的子节点（条件或嵌套规则组）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleChild {
    Condition(RuleNode),
    Group(RuleTree),
}

impl From<RuleNode> for RuleChild {
    fn from(node: RuleNode) -> Self {
        Self::Condition(node)
    }
}

impl From<RuleTree> for RuleChild {
    fn from(tree: RuleTree) -> Self {
        Self::Group(tree)
    }
}

impl RuleTree {
    pub fn new(logic: LogicalOperator, children: Vec<RuleChild>) -> Self {
        Self { logic, children }
    }

    /// 空树 `{logic: AND, children: []}`
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn and(children: Vec<RuleChild>) -> Self {
        Self::new(LogicalOperator::And, children)
    }

    pub fn or(children: Vec<RuleChild>) -> Self {
        Self::new(LogicalOperator::Or, children)
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// 层数：只有根时为 1，每嵌套一层规则组加 1
    pub fn depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|child| match child {
                RuleChild::Group(group) => group.depth(),
                RuleChild::Condition(_) => 0,
            })
            .max()
            .unwrap_or(0)
    }

    /// 全部条件节点数（递归）
    pub fn condition_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| match child {
                RuleChild::Condition(_) => 1,
                RuleChild::Group(group) => group.condition_count(),
            })
            .sum()
    }

    /// 按路径定位规则组，路径指向条件节点或越界时返回 None
    pub fn group_at(&self, path: &[usize]) -> Option<&RuleTree> {
        let mut current = self;
        for &index in path {
            match current.children.get(index)? {
                RuleChild::Group(group) => current = group,
                RuleChild::Condition(_) => return None,
            }
        }
        Some(current)
    }

    pub(crate) fn group_at_mut(&mut self, path: &[usize]) -> Option<&mut RuleTree> {
        let mut current = self;
        for &index in path {
            match current.children.get_mut(index)? {
                RuleChild::Group(group) => current = group,
                RuleChild::Condition(_) => return None,
            }
        }
        Some(current)
    }

    /// 从 JSON 解析（外部仓储或 NL 解析器提供的规则定义）
    ///
    /// 只接受带标签的格式，与 [`RuleTree::to_json`] 的输出一致：
    ///
    /// - 子节点用 `"type"` 区分 `"condition"` 与 `"group"`，规则组不带 `"type"` 会解析失败
    /// - 取值为 `{"kind": ..., "value": ...}`，kind 取 `text`、`number`、`boolean`、`date`、
    ///   `relative_date`、`text_list`、`number_list` 之一
    /// - 日期为 `YYYY-MM-DD`，相对日期为 `"-Nd"`（N 天前）
    /// - `logic` 为 `"AND"` 或 `"OR"`
    ///
    /// ```text
    /// {
    ///   "logic": "AND",
    ///   "children": [
    ///     {"type": "condition", "field": "arr", "operator": "gte",
    ///      "value": {"kind": "number", "value": 50000}},
    ///     {"type": "group", "logic": "OR", "children": []}
    ///   ]
    /// }
    /// ```
    ///
    /// 裸值（如 `"value": 50000`）不会按字段类型推断，直接报错。
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
