//! 规则树校验器
//!
//! 深度优先遍历整棵树，累积全部结构性问题而不是遇到第一个就返回，
//! 界面可以一次性在每个出错的节点旁边给出提示。校验无副作用。

use serde::Serialize;
use std::fmt;

use crate::catalog::{Arity, FieldDefinition, FieldType, lookup_field};
use crate::models::{MAX_NESTING_DEPTH, RuleChild, RuleNode, RuleTree, RuleValue};

/// 问题种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// 根节点没有任何规则
    EmptyRoot,
    /// 嵌套规则组为空
    EmptyGroup,
    /// 规则组嵌套超过最大层数
    TooDeep,
    UnknownField,
    IncompatibleOperator,
    MissingValue,
    MissingSecondValue,
    ValueTypeMismatch,
    InvalidChoice,
}

/// 单个校验问题
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    /// 出错节点的路径（从根开始的下标序列，根为空）
    pub path: Vec<usize>,
    pub kind: IssueKind,
    pub message: String,
}

impl ValidationIssue {
    /// 形如 `root.children[1].children[0]` 的位置描述
    pub fn location(&self) -> String {
        location(&self.path)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// 校验报告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// 全部问题的文案
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|issue| issue.message.clone()).collect()
    }

    /// 某个节点上的问题
    pub fn issues_at<'a>(&'a self, path: &'a [usize]) -> impl Iterator<Item = &'a ValidationIssue> {
        self.errors.iter().filter(move |issue| issue.path == path)
    }

    pub fn has_kind(&self, kind: IssueKind) -> bool {
        self.errors.iter().any(|issue| issue.kind == kind)
    }
}

fn location(path: &[usize]) -> String {
    let mut s = String::from("root");
    for index in path {
        s.push_str(&format!(".children[{}]", index));
    }
    s
}

/// 校验规则树
pub fn validate(tree: &RuleTree) -> ValidationReport {
    let mut walker = Walker::default();

    if tree.is_empty() {
        walker.push(
            &[],
            IssueKind::EmptyRoot,
            "at least one rule required".to_string(),
        );
    } else {
        walker.visit_group(tree, &mut Vec::new());
    }

    ValidationReport {
        valid: walker.issues.is_empty(),
        errors: walker.issues,
    }
}

#[derive(Default)]
struct Walker {
    issues: Vec<ValidationIssue>,
}

impl Walker {
    fn push(&mut self, path: &[usize], kind: IssueKind, detail: String) {
        self.issues.push(ValidationIssue {
            path: path.to_vec(),
            kind,
            message: format!("{}: {}", location(path), detail),
        });
    }

    fn visit_group(&mut self, group: &RuleTree, path: &mut Vec<usize>) {
        for (index, child) in group.children.iter().enumerate() {
            path.push(index);
            match child {
                RuleChild::Condition(node) => self.visit_node(node, path),
                RuleChild::Group(nested) => {
                    // 根为第 0 层，路径长度即嵌套规则组所在层
                    if path.len() >= MAX_NESTING_DEPTH {
                        self.push(
                            path,
                            IssueKind::TooDeep,
                            format!(
                                "group is nested deeper than {} levels",
                                MAX_NESTING_DEPTH
                            ),
                        );
                    }
                    if nested.is_empty() {
                        self.push(
                            path,
                            IssueKind::EmptyGroup,
                            "empty group, add a rule or remove the group".to_string(),
                        );
                    } else {
                        self.visit_group(nested, path);
                    }
                }
            }
            path.pop();
        }
    }

    fn visit_node(&mut self, node: &RuleNode, path: &[usize]) {
        let field = lookup_field(&node.field);
        let op_label = node.operator.definition().label;

        match field {
            None => self.push(
                path,
                IssueKind::UnknownField,
                format!("unknown field '{}'", node.field),
            ),
            Some(field) if !node.operator.supports(field.field_type) => self.push(
                path,
                IssueKind::IncompatibleOperator,
                format!(
                    "operator '{}' cannot be used with {} field '{}'",
                    node.operator, field.field_type, field.id
                ),
            ),
            Some(_) => {}
        }

        let arity = node.operator.arity();
        if arity != Arity::NoOperand {
            match &node.value {
                Some(value) if !value.is_blank() => {
                    if let Some(field) = field {
                        self.check_value(node, field, value, path);
                    }
                }
                _ => self.push(
                    path,
                    IssueKind::MissingValue,
                    format!("a value is required for '{}'", op_label),
                ),
            }
        }

        if arity == Arity::Pair {
            match &node.value2 {
                Some(value2) if !value2.is_blank() => {
                    if let Some(field) = field {
                        self.check_value(node, field, value2, path);
                    }
                }
                _ => self.push(
                    path,
                    IssueKind::MissingSecondValue,
                    format!("a second value is required for '{}'", op_label),
                ),
            }
        }
    }

    fn check_value(
        &mut self,
        node: &RuleNode,
        field: &FieldDefinition,
        value: &RuleValue,
        path: &[usize],
    ) {
        let multi = node.operator.is_multi_value();
        if !value.fits(field.field_type) || value.is_list() != multi {
            let expected = if multi {
                format!("a list of {} values", field.field_type)
            } else {
                format!("a {} value", field.field_type)
            };
            self.push(
                path,
                IssueKind::ValueTypeMismatch,
                format!(
                    "field '{}' expects {}, got {}",
                    field.id,
                    expected,
                    value.kind()
                ),
            );
            return;
        }

        if field.field_type == FieldType::Choice {
            let values: Vec<&str> = match value {
                RuleValue::Text(s) => vec![s.as_str()],
                RuleValue::TextList(items) => items.iter().map(String::as_str).collect(),
                _ => Vec::new(),
            };
            for v in values {
                if !field.choices.contains(&v) {
                    self.push(
                        path,
                        IssueKind::InvalidChoice,
                        format!(
                            "'{}' is not an allowed value for '{}' (allowed: {})",
                            v,
                            field.id,
                            field.choices.join(", ")
                        ),
                    );
                }
            }
        }
    }
}
