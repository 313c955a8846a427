//! Predicate IR and selection criteria. Engines and the dataset builder only use these types.
//!
//! A [`Criteria`] maps field names to the predicates that must all hold for
//! that field. Refining a field that already has predicates intersects them.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::engine::{Record, lookup_path};
use crate::error::PredicateError;

/// Signature of a per-value test supplied by the caller.
pub type PredicateFn = dyn Fn(&JsonValue) -> Result<bool, String> + Send + Sync;

/// Named caller-supplied test. Two custom predicates are equal only when they
/// share the same underlying closure.
#[derive(Clone)]
pub struct CustomPredicate {
    name: String,
    test: Arc<PredicateFn>,
}

impl CustomPredicate {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, value: &JsonValue) -> Result<bool, String> {
        (self.test)(value)
    }
}

impl fmt::Debug for CustomPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomPredicate")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CustomPredicate {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.test, &other.test)
    }
}

/// Accepted-value test for a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Exact match.
    Eq(JsonValue),
    /// Set membership.
    In(Vec<JsonValue>),
    /// Inclusive range; a missing bound is open.
    Range {
        lower: Option<JsonValue>,
        upper: Option<JsonValue>,
    },
    /// String prefix match.
    Prefix(String),
    /// Caller-supplied test.
    Custom(CustomPredicate),
}

// ---------- Builder helpers ----------

pub fn eq(value: impl Into<JsonValue>) -> Predicate {
    Predicate::Eq(value.into())
}

pub fn is_in<I, V>(values: I) -> Predicate
where
    I: IntoIterator<Item = V>,
    V: Into<JsonValue>,
{
    Predicate::In(values.into_iter().map(Into::into).collect())
}

pub fn between(lower: impl Into<JsonValue>, upper: impl Into<JsonValue>) -> Predicate {
    Predicate::Range {
        lower: Some(lower.into()),
        upper: Some(upper.into()),
    }
}

pub fn at_least(lower: impl Into<JsonValue>) -> Predicate {
    Predicate::Range {
        lower: Some(lower.into()),
        upper: None,
    }
}

pub fn at_most(upper: impl Into<JsonValue>) -> Predicate {
    Predicate::Range {
        lower: None,
        upper: Some(upper.into()),
    }
}

pub fn starts_with(prefix: impl Into<String>) -> Predicate {
    Predicate::Prefix(prefix.into())
}

pub fn custom<F>(name: impl Into<String>, test: F) -> Predicate
where
    F: Fn(&JsonValue) -> Result<bool, String> + Send + Sync + 'static,
{
    Predicate::Custom(CustomPredicate {
        name: name.into(),
        test: Arc::new(test),
    })
}

impl From<&str> for Predicate {
    fn from(value: &str) -> Self {
        eq(value)
    }
}

impl From<String> for Predicate {
    fn from(value: String) -> Self {
        eq(value)
    }
}

impl From<i64> for Predicate {
    fn from(value: i64) -> Self {
        eq(value)
    }
}

impl From<i32> for Predicate {
    fn from(value: i32) -> Self {
        eq(value)
    }
}

impl From<f64> for Predicate {
    fn from(value: f64) -> Self {
        eq(value)
    }
}

impl From<bool> for Predicate {
    fn from(value: bool) -> Self {
        eq(value)
    }
}

impl From<Vec<&str>> for Predicate {
    fn from(values: Vec<&str>) -> Self {
        is_in(values)
    }
}

impl From<Vec<String>> for Predicate {
    fn from(values: Vec<String>) -> Self {
        is_in(values)
    }
}

impl From<Vec<i64>> for Predicate {
    fn from(values: Vec<i64>) -> Self {
        is_in(values)
    }
}

fn is_scalar(value: &JsonValue) -> bool {
    matches!(
        value,
        JsonValue::String(_) | JsonValue::Number(_) | JsonValue::Bool(_)
    )
}

fn kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Compare two scalar values. Numeric strings compare numerically against
/// numbers (partition values are usually stored as strings).
pub fn compare_scalars(a: &JsonValue, b: &JsonValue) -> Option<Ordering> {
    match (a, b) {
        (JsonValue::String(x), JsonValue::String(y)) => Some(x.cmp(y)),
        (JsonValue::Bool(x), JsonValue::Bool(y)) => Some(x.cmp(y)),
        (JsonValue::Number(x), JsonValue::Number(y)) => compare_numbers(x, y),
        (JsonValue::String(s), JsonValue::Number(n)) => {
            let parsed = s.trim().parse::<f64>().ok()?;
            parsed.partial_cmp(&n.as_f64()?)
        }
        (JsonValue::Number(n), JsonValue::String(s)) => {
            let parsed = s.trim().parse::<f64>().ok()?;
            n.as_f64()?.partial_cmp(&parsed)
        }
        _ => None,
    }
}

fn compare_numbers(x: &serde_json::Number, y: &serde_json::Number) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return Some(a.cmp(&b));
    }
    x.as_f64()?.partial_cmp(&y.as_f64()?)
}

fn scalar_eq(a: &JsonValue, b: &JsonValue) -> bool {
    compare_scalars(a, b) == Some(Ordering::Equal)
}

impl Predicate {
    /// Reject shapes that can never be evaluated, so the error surfaces at the
    /// call that introduced the predicate.
    pub fn validate(&self, field: &str) -> Result<(), PredicateError> {
        match self {
            Predicate::Eq(value) => {
                if !is_scalar(value) {
                    return Err(PredicateError::new(
                        field,
                        format!("{} is not comparable", kind(value)),
                    ));
                }
            }
            Predicate::In(values) => {
                if let Some(bad) = values.iter().find(|v| !is_scalar(v)) {
                    return Err(PredicateError::new(
                        field,
                        format!("set contains non-comparable {}", kind(bad)),
                    ));
                }
            }
            Predicate::Range { lower, upper } => {
                for bound in [lower, upper].into_iter().flatten() {
                    if !is_scalar(bound) {
                        return Err(PredicateError::new(
                            field,
                            format!("range bound {} is not comparable", kind(bound)),
                        ));
                    }
                }
                match (lower, upper) {
                    (None, None) => {
                        return Err(PredicateError::new(field, "range has no bounds"));
                    }
                    (Some(lo), Some(hi)) => match compare_scalars(lo, hi) {
                        None => {
                            return Err(PredicateError::new(
                                field,
                                format!("range bounds {} and {} are not comparable", kind(lo), kind(hi)),
                            ));
                        }
                        Some(Ordering::Greater) => {
                            return Err(PredicateError::new(
                                field,
                                format!("range lower bound {lo} exceeds upper bound {hi}"),
                            ));
                        }
                        _ => {}
                    },
                    _ => {}
                }
            }
            Predicate::Prefix(_) | Predicate::Custom(_) => {}
        }
        Ok(())
    }

    /// Evaluate against a field value. A missing field (`None`) never matches.
    pub fn matches(&self, field: &str, value: Option<&JsonValue>) -> Result<bool, PredicateError> {
        let Some(value) = value else {
            return Ok(false);
        };
        let hit = match self {
            Predicate::Eq(expected) => scalar_eq(value, expected),
            Predicate::In(accepted) => accepted.iter().any(|a| scalar_eq(value, a)),
            Predicate::Range { lower, upper } => {
                let above = match lower {
                    Some(lo) => matches!(
                        compare_scalars(value, lo),
                        Some(Ordering::Greater | Ordering::Equal)
                    ),
                    None => true,
                };
                let below = match upper {
                    Some(hi) => matches!(
                        compare_scalars(value, hi),
                        Some(Ordering::Less | Ordering::Equal)
                    ),
                    None => true,
                };
                above && below
            }
            Predicate::Prefix(prefix) => value.as_str().is_some_and(|s| s.starts_with(prefix)),
            Predicate::Custom(test) => test.call(value).map_err(|message| {
                PredicateError::new(field, format!("{} failed: {message}", test.name()))
            })?,
        };
        Ok(hit)
    }
}

/// Accumulated selection criteria: field name to the predicates that must all hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    fields: BTreeMap<String, Vec<Predicate>>,
}

impl Criteria {
    pub fn new() -> Self {
        Criteria::default()
    }

    /// Return a copy with `predicate` ANDed onto `field`. A predicate already
    /// present for the field is not added twice.
    pub fn with(&self, field: &str, predicate: Predicate) -> Result<Criteria, PredicateError> {
        if field.trim().is_empty() {
            return Err(PredicateError::new(field, "field name is empty"));
        }
        predicate.validate(field)?;
        let mut next = self.clone();
        let slot = next.fields.entry(field.to_string()).or_default();
        if !slot.contains(&predicate) {
            slot.push(predicate);
        }
        Ok(next)
    }

    /// Logical AND of two criteria sets.
    pub fn and(&self, other: &Criteria) -> Criteria {
        let mut next = self.clone();
        for (field, predicates) in &other.fields {
            let slot = next.fields.entry(field.clone()).or_default();
            for p in predicates {
                if !slot.contains(p) {
                    slot.push(p.clone());
                }
            }
        }
        next
    }

    pub fn get(&self, field: &str) -> Option<&[Predicate]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[Predicate])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Split into (criteria on the given dimensions, everything else).
    pub fn split_by<'a>(&self, dimensions: impl IntoIterator<Item = &'a str>) -> (Criteria, Criteria) {
        let dims: Vec<&str> = dimensions.into_iter().collect();
        let (group, record): (BTreeMap<_, _>, BTreeMap<_, _>) = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .partition(|(k, _)| dims.contains(&k.as_str()));
        (Criteria { fields: group }, Criteria { fields: record })
    }

    /// Evaluate against a group's dimension values. Fields that are not among
    /// the group's dimensions are ignored here.
    pub fn matches_dimensions(
        &self,
        dimensions: &BTreeMap<String, JsonValue>,
    ) -> Result<bool, PredicateError> {
        for (field, predicates) in &self.fields {
            let Some(value) = dimensions.get(field) else {
                continue;
            };
            for p in predicates {
                if !p.matches(field, Some(value))? {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Evaluate every field against a record, resolving `/`-separated paths.
    pub fn matches_record(&self, record: &Record) -> Result<bool, PredicateError> {
        for (field, predicates) in &self.fields {
            let value = lookup_path(record, field);
            for p in predicates {
                if !p.matches(field, value)? {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}
