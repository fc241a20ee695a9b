//! 校验器集成测试

use chrono::NaiveDate;
use segment_rules::{
    IssueKind, Operator, RelativeDays, RuleNode, RuleTree, RuleValue, validate,
};
use std::collections::HashSet;

#[test]
fn test_empty_root_is_distinct_from_empty_group() {
    let root = validate(&RuleTree::empty());
    assert_eq!(root.errors.len(), 1);
    assert_eq!(root.errors[0].kind, IssueKind::EmptyRoot);
    assert!(root.errors[0].message.contains("at least one rule"));

    let nested = validate(&RuleTree::and(vec![RuleTree::or(vec![]).into()]));
    assert_eq!(nested.errors.len(), 1);
    assert_eq!(nested.errors[0].kind, IssueKind::EmptyGroup);
    assert_ne!(root.errors[0].message, nested.errors[0].message);
}

#[test]
fn test_three_independent_problems_give_three_messages() {
    let tree = RuleTree::and(vec![
        RuleNode::new("health_score", Operator::Gte, RuleValue::Number(70.0)).into(),
        RuleTree::or(vec![]).into(),
        RuleNode::unary("arr", Operator::Gt).into(),
        RuleTree::and(vec![
            RuleNode::new(
                "renewal_date",
                Operator::Between,
                RuleValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            )
            .into(),
        ])
        .into(),
    ]);

    let report = validate(&tree);
    assert!(!report.valid);
    assert_eq!(report.errors.len(), 3);

    let messages: HashSet<String> = report.messages().into_iter().collect();
    assert_eq!(messages.len(), 3);

    let locations: Vec<String> = report.errors.iter().map(|e| e.location()).collect();
    assert_eq!(
        locations,
        vec![
            "root.children[1]",
            "root.children[2]",
            "root.children[3].children[0]"
        ]
    );
    assert!(report.errors[2].message.contains("second value"));
}

#[test]
fn test_valid_complex_tree() {
    let tree = RuleTree::and(vec![
        RuleNode::new("arr", Operator::Gt, RuleValue::Number(50000.0)).into(),
        RuleTree::or(vec![
            RuleNode::new("health_score", Operator::Lt, RuleValue::Number(40.0)).into(),
            RuleNode::new("churn_probability", Operator::Gt, RuleValue::Number(0.7)).into(),
            RuleTree::and(vec![
                RuleNode::new("status", Operator::Eq, RuleValue::Text("active".into())).into(),
                RuleNode::new(
                    "renewal_date",
                    Operator::Lt,
                    RuleValue::RelativeDate(RelativeDays(0)),
                )
                .into(),
            ])
            .into(),
        ])
        .into(),
        RuleNode::new(
            "region",
            Operator::NotIn,
            RuleValue::TextList(vec!["west".into()]),
        )
        .into(),
        RuleNode::unary("company_name", Operator::IsNotEmpty).into(),
    ]);

    let report = validate(&tree);
    assert!(report.valid, "{:?}", report.messages());
}

#[test]
fn test_operator_field_compatibility() {
    let cases = [
        ("auto_renew", Operator::Gt, RuleValue::Boolean(true), false),
        ("company_name", Operator::StartsWith, RuleValue::Text("Acme".into()), true),
        ("arr", Operator::Contains, RuleValue::Text("5".into()), false),
        ("plan", Operator::Contains, RuleValue::Text("gro".into()), false),
        (
            "employee_count",
            Operator::In,
            RuleValue::NumberList(vec![10.0, 50.0]),
            true,
        ),
        (
            "created_at",
            Operator::Gte,
            RuleValue::Date(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()),
            true,
        ),
    ];

    for (field, operator, value, expected_valid) in cases {
        let tree = RuleTree::and(vec![RuleNode::new(field, operator, value).into()]);
        let report = validate(&tree);
        assert_eq!(
            report.valid, expected_valid,
            "{} {}: {:?}",
            field, operator, report.messages()
        );
        if !expected_valid {
            assert!(report.has_kind(IssueKind::IncompatibleOperator));
        }
    }
}

#[test]
fn test_validation_is_pure() {
    let tree = RuleTree::and(vec![RuleNode::unary("arr", Operator::Gt).into()]);
    let before = tree.clone();
    let first = validate(&tree);
    let second = validate(&tree);
    assert_eq!(first, second);
    assert_eq!(tree, before);
}
