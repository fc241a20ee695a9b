//! 规则的可读描述
//!
//! 把条件节点渲染成一句话，例如 "ARR is at least 50000"。

use crate::catalog::{Arity, FieldType};
use crate::models::{RuleChild, RuleNode, RuleTree, RuleValue};

const MISSING: &str = "…";

fn render(value: Option<&RuleValue>) -> String {
    value.map_or_else(|| MISSING.to_string(), RuleValue::to_string)
}

/// 描述单个条件
///
/// 无操作数的条件省略取值部分，between 渲染为 "is between X and Y"，多值列表用逗号连接。
pub fn describe_node(node: &RuleNode) -> String {
    let (label, field_type) = match node.field_definition() {
        Some(field) => (field.label, field.field_type),
        // 未知字段直接显示 ID，校验器会另行报告
        None => (node.field.as_str(), FieldType::String),
    };
    let op_label = node.operator.label_for(field_type);

    match node.operator.arity() {
        Arity::NoOperand => format!("{} {}", label, op_label),
        Arity::Pair => format!(
            "{} {} {} and {}",
            label,
            op_label,
            render(node.value.as_ref()),
            render(node.value2.as_ref())
        ),
        Arity::Single => format!("{} {} {}", label, op_label, render(node.value.as_ref())),
    }
}

/// 描述整棵树，嵌套规则组加括号
pub fn describe_tree(tree: &RuleTree) -> String {
    if tree.is_empty() {
        return "no rules".to_string();
    }
    describe_group(tree)
}

fn describe_group(tree: &RuleTree) -> String {
    let separator = format!(" {} ", tree.logic);
    tree.children
        .iter()
        .map(|child| match child {
            RuleChild::Condition(node) => describe_node(node),
            RuleChild::Group(group) if group.is_empty() => "(no rules)".to_string(),
            RuleChild::Group(group) => format!("({})", describe_group(group)),
        })
        .collect::<Vec<_>>()
        .join(&separator)
}
