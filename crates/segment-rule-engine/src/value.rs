//! 取值转换
//!
//! 把用户在输入框里敲的文本按字段类型转换成带类型的 `RuleValue`。
//! 类型在设定字段时就已确定，避免出现"数值操作符作用于字符串"一类的问题。

use chrono::NaiveDate;

use crate::catalog::{FieldDefinition, FieldType, Operator};
use crate::error::{Result, SegmentError};
use crate::models::{RelativeDays, RuleValue};

/// 按字段类型与操作符转换输入
///
/// 多值操作符按逗号拆分，每一项单独转换。操作符不适用于该字段类型时直接拒绝。
pub fn coerce_value(field: &FieldDefinition, operator: Operator, raw: &str) -> Result<RuleValue> {
    if !operator.supports(field.field_type) {
        return Err(SegmentError::InvalidValue {
            field: field.id.to_string(),
            expected: format!(
                "an operator valid for {} fields, not '{}'",
                field.field_type, operator
            ),
            input: raw.to_string(),
        });
    }

    if !operator.is_multi_value() {
        return coerce_scalar(field, raw);
    }

    let items = raw
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| coerce_scalar(field, item))
        .collect::<Result<Vec<_>>>()?;

    let mut numbers = Vec::new();
    let mut texts = Vec::new();
    for item in items {
        match item {
            RuleValue::Number(n) => numbers.push(n),
            RuleValue::Text(s) => texts.push(s),
            other => {
                return Err(SegmentError::InvalidValue {
                    field: field.id.to_string(),
                    expected: "a list of numbers or text".to_string(),
                    input: other.to_string(),
                });
            }
        }
    }

    match field.field_type {
        FieldType::Number => Ok(RuleValue::NumberList(numbers)),
        _ => Ok(RuleValue::TextList(texts)),
    }
}

fn coerce_scalar(field: &FieldDefinition, raw: &str) -> Result<RuleValue> {
    let input = raw.trim();
    let invalid = |expected: &str| SegmentError::InvalidValue {
        field: field.id.to_string(),
        expected: expected.to_string(),
        input: raw.to_string(),
    };

    match field.field_type {
        FieldType::String => Ok(RuleValue::Text(input.to_string())),
        FieldType::Number => input
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(RuleValue::Number)
            .ok_or_else(|| invalid("number")),
        FieldType::Boolean => match input.to_ascii_lowercase().as_str() {
            "true" | "yes" => Ok(RuleValue::Boolean(true)),
            "false" | "no" => Ok(RuleValue::Boolean(false)),
            _ => Err(invalid("true/false")),
        },
        FieldType::Date => {
            if input.starts_with('-') {
                return input
                    .parse::<RelativeDays>()
                    .map(RuleValue::RelativeDate)
                    .map_err(|_| invalid("date (YYYY-MM-DD or -Nd)"));
            }
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .map(RuleValue::Date)
                .map_err(|_| invalid("date (YYYY-MM-DD or -Nd)"))
        }
        FieldType::Choice => field
            .canonical_choice(input)
            .map(|choice| RuleValue::Text(choice.to_string()))
            .ok_or_else(|| invalid(&format!("one of {}", field.choices.join(", ")))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::lookup_field;

    fn field(id: &str) -> &'static FieldDefinition {
        lookup_field(id).unwrap()
    }

    #[test]
    fn test_number() {
        let value = coerce_value(field("arr"), Operator::Gte, " 50000 ").unwrap();
        assert_eq!(value, RuleValue::Number(50000.0));

        let err = coerce_value(field("arr"), Operator::Gte, "lots").unwrap_err();
        assert!(matches!(err, SegmentError::InvalidValue { .. }));
        assert!(coerce_value(field("arr"), Operator::Gte, "NaN").is_err());
    }

    #[test]
    fn test_boolean() {
        assert_eq!(
            coerce_value(field("auto_renew"), Operator::Eq, "Yes").unwrap(),
            RuleValue::Boolean(true)
        );
        assert!(coerce_value(field("auto_renew"), Operator::Eq, "maybe").is_err());
    }

    #[test]
    fn test_date_and_relative_date() {
        assert_eq!(
            coerce_value(field("renewal_date"), Operator::Lt, "2024-06-30").unwrap(),
            RuleValue::Date(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap())
        );
        assert_eq!(
            coerce_value(field("last_service_date"), Operator::Lt, "-90d").unwrap(),
            RuleValue::RelativeDate(RelativeDays(90))
        );
        assert!(coerce_value(field("renewal_date"), Operator::Lt, "next week").is_err());
    }

    #[test]
    fn test_choice_is_canonicalised() {
        assert_eq!(
            coerce_value(field("plan"), Operator::Eq, "GROWTH").unwrap(),
            RuleValue::Text("growth".to_string())
        );
        let err = coerce_value(field("plan"), Operator::Eq, "platinum").unwrap_err();
        assert!(err.to_string().contains("starter, growth, enterprise"));
    }

    #[test]
    fn test_multi_value_lists() {
        assert_eq!(
            coerce_value(field("plan"), Operator::In, "starter, Enterprise,").unwrap(),
            RuleValue::TextList(vec!["starter".to_string(), "enterprise".to_string()])
        );
        assert_eq!(
            coerce_value(field("open_tickets"), Operator::NotIn, "1,2, 3").unwrap(),
            RuleValue::NumberList(vec![1.0, 2.0, 3.0])
        );
        assert!(coerce_value(field("open_tickets"), Operator::In, "1,x").is_err());
    }

    #[test]
    fn test_list_operator_on_boolean_or_date_rejected() {
        let err = coerce_value(field("auto_renew"), Operator::In, "true,false").unwrap_err();
        assert!(matches!(err, SegmentError::InvalidValue { ref field, .. } if field == "auto_renew"));
        assert!(err.to_string().contains("'in'"));

        let err = coerce_value(field("renewal_date"), Operator::NotIn, "2024-01-01").unwrap_err();
        assert!(matches!(err, SegmentError::InvalidValue { .. }));
    }

    #[test]
    fn test_text_operator_on_number_rejected() {
        let err = coerce_value(field("arr"), Operator::Contains, "500").unwrap_err();
        assert!(matches!(err, SegmentError::InvalidValue { .. }));
    }
}
