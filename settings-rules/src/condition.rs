use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::Deserializer;
use serde::ser::{Error as _, SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::Context;

/// How constraints on fields missing from the context are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvaluationMode {
    /// A field absent from the context never blocks a match.
    #[default]
    Lenient,
    /// A field absent from the context fails its constraint.
    Strict,
}

/// Named boolean test over a single context value.
///
/// Predicates only exist in code; rule files cannot express them.
#[derive(Clone)]
pub struct Predicate {
    name: Arc<str>,
    test: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
}

impl Predicate {
    pub fn new<F>(name: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name.into()),
            test: Arc::new(test),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn test(&self, value: &Value) -> bool {
        (self.test)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.name).finish()
    }
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.test, &other.test)
    }
}

/// Constraint placed on one context field.
///
/// Variants are listed in the order the untyped rule format is interpreted:
/// an object carrying `range` first, then arrays, then predicates, and any
/// other value as a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    /// Inclusive on both ends.
    Range { min: Value, max: Value },
    /// Membership test using strict equality.
    OneOf(Vec<Value>),
    Predicate(Predicate),
    /// Strict equality, no coercion.
    Literal(Value),
}

impl ConditionValue {
    pub fn range(min: impl Into<Value>, max: impl Into<Value>) -> Self {
        ConditionValue::Range {
            min: min.into(),
            max: max.into(),
        }
    }

    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        ConditionValue::OneOf(values.into_iter().map(Into::into).collect())
    }

    pub fn predicate<F>(name: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        ConditionValue::Predicate(Predicate::new(name, test))
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        ConditionValue::Literal(value.into())
    }

    /// Interprets an untyped rule value.
    ///
    /// A `range` entry that is not a two element array yields null bounds,
    /// which never match.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut map) if map.contains_key("range") => {
                let bounds = map.remove("range").unwrap_or(Value::Null);
                let (min, max) = match bounds {
                    Value::Array(mut items) if items.len() >= 2 => {
                        items.truncate(2);
                        let max = items.pop().unwrap_or(Value::Null);
                        let min = items.pop().unwrap_or(Value::Null);
                        (min, max)
                    }
                    _ => (Value::Null, Value::Null),
                };
                ConditionValue::Range { min, max }
            }
            Value::Array(items) => ConditionValue::OneOf(items),
            other => ConditionValue::Literal(other),
        }
    }

    /// Tests a present context value against this constraint.
    pub fn evaluate(&self, value: &Value) -> bool {
        match self {
            ConditionValue::Range { min, max } => {
                matches!(
                    compare(value, min),
                    Some(Ordering::Greater | Ordering::Equal)
                ) && matches!(compare(value, max), Some(Ordering::Less | Ordering::Equal))
            }
            ConditionValue::OneOf(candidates) => candidates
                .iter()
                .any(|candidate| strict_equals(value, candidate)),
            ConditionValue::Predicate(predicate) => predicate.test(value),
            ConditionValue::Literal(expected) => strict_equals(value, expected),
        }
    }

    pub fn is_predicate(&self) -> bool {
        matches!(self, ConditionValue::Predicate(_))
    }
}

impl From<Value> for ConditionValue {
    fn from(value: Value) -> Self {
        ConditionValue::from_value(value)
    }
}

impl<'de> Deserialize<'de> for ConditionValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(ConditionValue::from_value)
    }
}

impl Serialize for ConditionValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ConditionValue::Range { min, max } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("range", &[min, max])?;
                map.end()
            }
            ConditionValue::OneOf(values) => values.serialize(serializer),
            ConditionValue::Predicate(predicate) => Err(S::Error::custom(format!(
                "predicate `{}` cannot be serialized",
                predicate.name()
            ))),
            ConditionValue::Literal(value) => value.serialize(serializer),
        }
    }
}

/// Field constraints that must all hold for the set to pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionSet(BTreeMap<String, ConditionValue>);

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, constraint: ConditionValue) -> Self {
        self.0.insert(field.into(), constraint);
        self
    }

    pub fn equals(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, ConditionValue::literal(value))
    }

    pub fn one_of<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.with(field, ConditionValue::one_of(values))
    }

    pub fn range(
        self,
        field: impl Into<String>,
        min: impl Into<Value>,
        max: impl Into<Value>,
    ) -> Self {
        self.with(field, ConditionValue::range(min, max))
    }

    pub fn predicate<F>(self, field: impl Into<String>, name: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.with(field, ConditionValue::predicate(name, test))
    }

    pub fn get(&self, field: &str) -> Option<&ConditionValue> {
        self.0.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConditionValue)> {
        self.0.iter().map(|(field, constraint)| (field.as_str(), constraint))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether every constraint holds against `context`.
    pub fn matches(&self, context: &Context, mode: EvaluationMode) -> bool {
        self.0.iter().all(|(field, constraint)| match context.get(field) {
            Some(value) => constraint.evaluate(value),
            None => mode == EvaluationMode::Lenient,
        })
    }
}

impl<K: Into<String>> FromIterator<(K, ConditionValue)> for ConditionSet {
    fn from_iter<T: IntoIterator<Item = (K, ConditionValue)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(field, constraint)| (field.into(), constraint))
                .collect(),
        )
    }
}

/// Equality without type coercion.
///
/// Numbers compare by value regardless of integer or float representation.
/// Objects and arrays never compare equal, since rule data and context data
/// are always distinct values.
pub(crate) fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(lhs), Value::Number(rhs)) => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(l), Some(r)) => l == r,
            _ => lhs == rhs,
        },
        (Value::String(lhs), Value::String(rhs)) => lhs == rhs,
        (Value::Bool(lhs), Value::Bool(rhs)) => lhs == rhs,
        (Value::Null, Value::Null) => true,
        _ => false,
    }
}

/// Orders numbers numerically and strings lexicographically; anything else
/// is incomparable.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(lhs), Value::Number(rhs)) => lhs.as_f64()?.partial_cmp(&rhs.as_f64()?),
        (Value::String(lhs), Value::String(rhs)) => Some(lhs.cmp(rhs)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn range_object_takes_precedence_over_literal() {
        let constraint = ConditionValue::from_value(json!({ "range": [8, 25] }));
        assert_eq!(constraint, ConditionValue::range(8, 25));
        assert!(constraint.evaluate(&json!(8)));
        assert!(constraint.evaluate(&json!(25)));
        assert!(!constraint.evaluate(&json!(25.5)));
    }

    #[test]
    fn object_without_range_is_a_literal_that_never_matches() {
        let constraint = ConditionValue::from_value(json!({ "min": 1, "max": 3 }));
        assert!(matches!(constraint, ConditionValue::Literal(_)));
        assert!(!constraint.evaluate(&json!({ "min": 1, "max": 3 })));
        assert!(!constraint.evaluate(&json!(2)));
    }

    #[test]
    fn malformed_range_bounds_never_match() {
        let constraint = ConditionValue::from_value(json!({ "range": [8] }));
        assert_eq!(constraint, ConditionValue::range(Value::Null, Value::Null));
        assert!(!constraint.evaluate(&json!(8)));
        assert!(!constraint.evaluate(&Value::Null));
    }

    #[test]
    fn strict_equality_does_not_coerce() {
        let constraint = ConditionValue::literal(5);
        assert!(constraint.evaluate(&json!(5)));
        assert!(constraint.evaluate(&json!(5.0)));
        assert!(!constraint.evaluate(&json!("5")));

        let flag = ConditionValue::literal(true);
        assert!(!flag.evaluate(&json!(1)));
    }

    #[test]
    fn string_ranges_compare_lexicographically() {
        let constraint = ConditionValue::range("2024-01-01", "2024-12-31");
        assert!(constraint.evaluate(&json!("2024-06-15")));
        assert!(!constraint.evaluate(&json!("2025-01-01")));
        assert!(!constraint.evaluate(&json!(2024)));
    }

    #[test]
    fn predicates_serialize_as_errors() {
        let set = ConditionSet::new().predicate("param1", "odd", |value| {
            value.as_i64().map_or(false, |n| n % 2 != 0)
        });
        assert!(serde_json::to_value(&set).is_err());

        let plain = ConditionSet::new().range("bmi", 30, 40).equals("initial", true);
        assert_eq!(
            serde_json::to_value(&plain).expect("serializable"),
            json!({ "bmi": { "range": [30, 40] }, "initial": true })
        );
    }

    #[test]
    fn strict_mode_fails_on_missing_fields() {
        let set = ConditionSet::new().equals("state", "CA");
        let empty = Context::new();

        assert!(set.matches(&empty, EvaluationMode::Lenient));
        assert!(!set.matches(&empty, EvaluationMode::Strict));
    }
}
