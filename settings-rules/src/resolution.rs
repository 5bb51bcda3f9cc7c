use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RuleError;

/// Variables resolved by first match. Unresolved names are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedSettings {
    values: BTreeMap<String, Value>,
}

impl ResolvedSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the value or [`RuleError::Unresolved`].
    pub fn require(&self, name: &str) -> Result<&Value, RuleError> {
        self.get(name).ok_or_else(|| RuleError::unresolved(name))
    }

    /// Returns the value deserialized into `T`.
    pub fn require_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, RuleError> {
        let value = self.require(name)?;
        T::deserialize(value).map_err(|err| RuleError::InvalidValue {
            name: name.to_string(),
            message: err.to_string(),
        })
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.values
    }
}

impl IntoIterator for ResolvedSettings {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// Every matching value per requested variable, in rule order.
///
/// Each requested name is present, possibly with no values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllMatches {
    values: BTreeMap<String, Vec<Value>>,
}

impl AllMatches {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, values: Vec<Value>) {
        self.values.insert(name.into(), values);
    }

    /// Matches for `name`; empty when nothing matched or it was not requested.
    pub fn get(&self, name: &str) -> &[Value] {
        self.values.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first(&self, name: &str) -> Option<&Value> {
        self.get(name).first()
    }

    /// Whether `name` was part of the request.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.values
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<Value>> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn require_reports_missing_variables() {
        let mut resolved = ResolvedSettings::new();
        resolved.insert("provider", json!("npi-1234"));

        assert_eq!(resolved.require("provider").expect("present"), "npi-1234");
        let err = resolved.require("diagnosis").unwrap_err();
        assert!(matches!(err, RuleError::Unresolved { ref name } if name == "diagnosis"));
    }

    #[test]
    fn require_as_deserializes_values() {
        let mut resolved = ResolvedSettings::new();
        resolved.insert("cost", json!(149.5));
        resolved.insert("codes", json!(["99204", "99214"]));

        let cost: f64 = resolved.require_as("cost").expect("number");
        let codes: Vec<String> = resolved.require_as("codes").expect("list");
        assert_eq!(cost, 149.5);
        assert_eq!(codes, vec!["99204", "99214"]);

        let err = resolved.require_as::<u32>("codes").unwrap_err();
        assert!(matches!(err, RuleError::InvalidValue { .. }));
    }

    #[test]
    fn all_matches_serializes_as_plain_object() {
        let mut matches = AllMatches::new();
        matches.insert("task", vec![json!("a"), json!("b")]);
        matches.insert("other", vec![]);

        assert_eq!(
            serde_json::to_value(&matches).expect("serializable"),
            json!({ "task": ["a", "b"], "other": [] })
        );
        assert!(matches.get("unknown").is_empty());
        assert_eq!(matches.first("task"), Some(&json!("a")));
    }
}
