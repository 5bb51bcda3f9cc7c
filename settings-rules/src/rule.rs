use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::{ConditionSet, EvaluationMode};
use crate::context::Context;

/// Declarative rule: the variables it contributes and when it applies.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleDefinition {
    /// Optional label used in logs and reports. Never affects matching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Optional human readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Values this rule contributes when selected.
    #[serde(default)]
    pub vars: BTreeMap<String, Value>,
    /// Alternatives, any one of which selects the rule. Empty means always.
    #[serde(default)]
    pub conditions: Vec<ConditionSet>,
}

impl RuleDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn when(mut self, conditions: ConditionSet) -> Self {
        self.conditions.push(conditions);
        self
    }

    /// Whether the rule competes for `variable`.
    pub fn defines(&self, variable: &str) -> bool {
        self.vars.contains_key(variable)
    }

    pub fn value_of(&self, variable: &str) -> Option<&Value> {
        self.vars.get(variable)
    }

    pub fn is_unconditional(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Whether any predicate constraint is attached.
    pub fn has_predicates(&self) -> bool {
        self.conditions
            .iter()
            .any(|set| set.iter().any(|(_, constraint)| constraint.is_predicate()))
    }

    /// True when there are no conditions or at least one set passes.
    pub fn matches(&self, context: &Context, mode: EvaluationMode) -> bool {
        self.is_unconditional() || self.conditions.iter().any(|set| set.matches(context, mode))
    }

    /// Label for log output: the name, or the position in its rule set.
    pub(crate) fn label(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("#{}", index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rules_without_conditions_always_match() {
        let rule = RuleDefinition::new().var("cost", 120);
        assert!(rule.matches(&Context::new(), EvaluationMode::Strict));
        assert!(rule.matches(&Context::new().with("bmi", 18), EvaluationMode::Lenient));
    }

    #[test]
    fn condition_sets_are_alternatives() {
        let rule = RuleDefinition::new()
            .var("diagnosis", "E66.01")
            .when(ConditionSet::new().range("bmi", 40, 100))
            .when(ConditionSet::new().range("bmi", 35, 40).equals("comorbidities", 1));

        assert!(rule.matches(&Context::new().with("bmi", 42), EvaluationMode::Lenient));
        assert!(rule.matches(
            &Context::new().with("bmi", 36).with("comorbidities", 1),
            EvaluationMode::Lenient
        ));
        assert!(!rule.matches(
            &Context::new().with("bmi", 36).with("comorbidities", 0),
            EvaluationMode::Lenient
        ));
    }

    #[test]
    fn rejects_unknown_keys_when_deserializing() {
        let parsed = serde_json::from_value::<RuleDefinition>(json!({
            "vars": { "cost": 10 },
            "condtions": []
        }));
        assert!(parsed.is_err());
    }
}
