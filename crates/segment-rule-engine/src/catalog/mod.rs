//! 字段与操作符目录
//!
//! 两张静态注册表都是纯查询，无副作用。

pub mod fields;
pub mod operators;

pub use fields::{
    FieldCategory, FieldDefinition, FieldType, all_fields, fields_in_category, lookup_field,
};
pub use operators::{
    Arity, Operator, OperatorDefinition, OperatorGroup, all_operators, compatible_operators,
    lookup_operator,
};
