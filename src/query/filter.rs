//! Filter Translation Module
//!
//! Declarative column filters and their translation into backing-store
//! predicates.
//!
//! A filter value can take three shapes:
//! - a JSON array, meaning set membership ("value is one of ...")
//! - a JSON object mapping operators to operands (`gt`, `lt`, `gte`, `lte`,
//!   `like`, `ilike`)
//! - any other scalar, meaning equality

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CacheError, Result};

// == Filter Value ==
/// Declarative filter for a single column.
///
/// Deserializes untagged: arrays become [`FilterValue::Many`], objects whose
/// keys are all operators become [`FilterValue::Ops`], everything else
/// becomes [`FilterValue::One`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Set membership: the column value must equal one of these
    Many(Vec<Value>),
    /// Relational operators applied to the column
    Ops(BTreeMap<FilterOp, Value>),
    /// Equality against a single scalar
    One(Value),
}

// == Filter Op ==
/// Relational operator usable in a [`FilterValue::Ops`] map.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    /// Greater-than
    Gt,
    /// Less-than
    Lt,
    /// Greater-or-equal
    Gte,
    /// Less-or-equal
    Lte,
    /// Case-sensitive substring
    Like,
    /// Case-insensitive substring
    Ilike,
}

// == Sort Direction ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

// == Order By ==
/// Sort specification for a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Column to sort by
    pub column: String,
    /// Sort direction
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Descending,
        }
    }
}

impl Default for OrderBy {
    /// Record identifier, descending: the ordering used when a query
    /// supplies none.
    fn default() -> Self {
        Self::descending("id")
    }
}

// == Predicate ==
/// A filter translated into backing-store form.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Column equals value
    Eq { column: String, value: Value },
    /// Column equals one of the values
    In { column: String, values: Vec<Value> },
    /// Column compares relationally against value
    Cmp {
        column: String,
        op: CmpOp,
        value: Value,
    },
    /// Column contains the needle as a substring
    Like {
        column: String,
        needle: String,
        case_insensitive: bool,
    },
}

/// Relational comparison operator in predicate form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Gt,
    Lt,
    Gte,
    Lte,
}

// == Translation ==
/// Translates declarative column filters into backing-store predicates.
///
/// Substring operators require a string operand; anything else is rejected
/// with `InvalidQuery`.
pub fn translate_filters(filters: &BTreeMap<String, FilterValue>) -> Result<Vec<Predicate>> {
    let mut predicates = Vec::new();

    for (column, filter) in filters {
        match filter {
            FilterValue::Many(values) => predicates.push(Predicate::In {
                column: column.clone(),
                values: values.clone(),
            }),
            FilterValue::Ops(ops) => {
                for (op, operand) in ops {
                    predicates.push(translate_op(column, *op, operand)?);
                }
            }
            FilterValue::One(value) => predicates.push(Predicate::Eq {
                column: column.clone(),
                value: value.clone(),
            }),
        }
    }

    Ok(predicates)
}

fn translate_op(column: &str, op: FilterOp, operand: &Value) -> Result<Predicate> {
    let cmp = match op {
        FilterOp::Gt => CmpOp::Gt,
        FilterOp::Lt => CmpOp::Lt,
        FilterOp::Gte => CmpOp::Gte,
        FilterOp::Lte => CmpOp::Lte,
        FilterOp::Like | FilterOp::Ilike => {
            let needle = operand.as_str().ok_or_else(|| {
                CacheError::InvalidQuery(format!(
                    "substring filter on column '{}' requires a string operand",
                    column
                ))
            })?;
            return Ok(Predicate::Like {
                column: column.to_string(),
                needle: needle.to_string(),
                case_insensitive: op == FilterOp::Ilike,
            });
        }
    };

    Ok(Predicate::Cmp {
        column: column.to_string(),
        op: cmp,
        value: operand.clone(),
    })
}

// == Predicate Evaluation ==
impl Predicate {
    /// Evaluates this predicate against a row record.
    ///
    /// A missing column or an incomparable type pair never matches.
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Predicate::Eq { column, value } => row.get(column) == Some(value),
            Predicate::In { column, values } => row
                .get(column)
                .map(|field| values.contains(field))
                .unwrap_or(false),
            Predicate::Cmp { column, op, value } => {
                let Some(field) = row.get(column) else {
                    return false;
                };
                let Some(ordering) = compare_values(field, value) else {
                    return false;
                };
                match op {
                    CmpOp::Gt => ordering == Ordering::Greater,
                    CmpOp::Lt => ordering == Ordering::Less,
                    CmpOp::Gte => ordering != Ordering::Less,
                    CmpOp::Lte => ordering != Ordering::Greater,
                }
            }
            Predicate::Like {
                column,
                needle,
                case_insensitive,
            } => {
                let Some(field) = row.get(column).and_then(Value::as_str) else {
                    return false;
                };
                if *case_insensitive {
                    field.to_lowercase().contains(&needle.to_lowercase())
                } else {
                    field.contains(needle.as_str())
                }
            }
        }
    }
}

// == Value Comparison ==
/// Compares two JSON values when they are of comparable kinds.
///
/// Numbers compare numerically, strings lexicographically, booleans
/// false-before-true. Mixed or non-scalar kinds are incomparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x.as_f64().and_then(|x| y.as_f64().and_then(|y| x.partial_cmp(&y)))
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
