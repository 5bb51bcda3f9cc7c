use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::condition::{ConditionSet, EvaluationMode};
use crate::context::Context;
use crate::error::RuleError;
use crate::loader::load_rules;
use crate::resolution::{AllMatches, ResolvedSettings};
use crate::rule::RuleDefinition;

/// Resolves variables against an immutable, ordered rule set.
#[derive(Debug, Default, Clone)]
pub struct SettingsEngine {
    rules: Vec<RuleDefinition>,
    mode: EvaluationMode,
}

impl SettingsEngine {
    /// Construct an engine over `rules`. Their order is kept as given.
    pub fn new(rules: Vec<RuleDefinition>) -> Self {
        Self {
            rules,
            mode: EvaluationMode::default(),
        }
    }

    /// Loads rules from the given path (file or directory).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RuleError> {
        let rules = load_rules(path)?;
        Ok(Self::new(rules))
    }

    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> EvaluationMode {
        self.mode
    }

    /// Borrow the underlying rule set.
    pub fn rules(&self) -> &[RuleDefinition] {
        &self.rules
    }

    /// Whether the engine contains no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every variable name defined by at least one rule, sorted.
    pub fn variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .rules
            .iter()
            .flat_map(|rule| rule.vars.keys().map(String::as_str))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Takes, per variable, the value of the first rule that defines it and
    /// matches `context`. Variables nothing resolves are left out.
    pub fn resolve_first<I>(&self, variables: I, context: &Context) -> ResolvedSettings
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        first_matches(&self.rules, variables, context, self.mode)
    }

    /// Collects, per variable, the values of every rule that defines it and
    /// matches `context`, in rule order. Every requested variable is present.
    pub fn resolve_all<I>(&self, variables: I, context: &Context) -> AllMatches
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        all_matches(&self.rules, variables, context, self.mode)
    }
}

/// First-match resolution over a borrowed rule set, skipping constraints
/// on fields absent from `context`.
pub fn resolve_first<I>(rules: &[RuleDefinition], variables: I, context: &Context) -> ResolvedSettings
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    first_matches(rules, variables, context, EvaluationMode::Lenient)
}

/// All-match resolution over a borrowed rule set, skipping constraints on
/// fields absent from `context`.
pub fn resolve_all<I>(rules: &[RuleDefinition], variables: I, context: &Context) -> AllMatches
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    all_matches(rules, variables, context, EvaluationMode::Lenient)
}

/// Whether `rule` has no conditions or any of its condition sets pass.
pub fn matches_rule(rule: &RuleDefinition, context: &Context) -> bool {
    rule.matches(context, EvaluationMode::Lenient)
}

/// Whether every constraint in `conditions` holds or targets an absent field.
pub fn matches_condition_set(conditions: &ConditionSet, context: &Context) -> bool {
    conditions.matches(context, EvaluationMode::Lenient)
}

fn first_matches<I>(
    rules: &[RuleDefinition],
    variables: I,
    context: &Context,
    mode: EvaluationMode,
) -> ResolvedSettings
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut resolved = ResolvedSettings::new();
    for variable in variables {
        let variable = variable.as_ref();
        match matching(rules, variable, context, mode).next() {
            Some((index, value)) => {
                debug!(variable, rule = %rules[index].label(index), "resolved setting");
                resolved.insert(variable, value.clone());
            }
            None => debug!(variable, "no rule resolved setting"),
        }
    }
    resolved
}

fn all_matches<I>(
    rules: &[RuleDefinition],
    variables: I,
    context: &Context,
    mode: EvaluationMode,
) -> AllMatches
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut all = AllMatches::new();
    for variable in variables {
        let variable = variable.as_ref();
        let values: Vec<Value> = matching(rules, variable, context, mode)
            .map(|(_, value)| value.clone())
            .collect();
        debug!(variable, matches = values.len(), "collected settings");
        all.insert(variable, values);
    }
    all
}

/// Rules defining `variable` that match, with their index, in rule order.
fn matching<'a>(
    rules: &'a [RuleDefinition],
    variable: &'a str,
    context: &'a Context,
    mode: EvaluationMode,
) -> impl Iterator<Item = (usize, &'a Value)> + 'a {
    rules
        .iter()
        .enumerate()
        .filter_map(move |(index, rule)| rule.value_of(variable).map(|value| (index, rule, value)))
        .filter(move |(_, rule, _)| rule.matches(context, mode))
        .map(|(index, _, value)| (index, value))
}
