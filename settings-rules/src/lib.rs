//! Condition based settings resolution for the clinic platform.
//!
//! Business variables such as the billing provider, diagnosis codes,
//! procedure codes or visit costs are described by an ordered list of
//! [`RuleDefinition`]s. Each rule carries the values it contributes and a
//! list of alternative [`ConditionSet`]s; a [`SettingsEngine`] resolves the
//! requested variables against a [`Context`] built by the caller, either
//! taking the first matching rule per variable or collecting all of them.
//!
//! ```
//! use settings_rules::{ConditionSet, Context, RuleDefinition, SettingsEngine};
//!
//! let engine = SettingsEngine::new(vec![
//!     RuleDefinition::new()
//!         .var("diagnosis", "E66.01")
//!         .when(ConditionSet::new().range("bmi", 40, 100)),
//!     RuleDefinition::new().var("diagnosis", "E66.9"),
//! ]);
//!
//! let resolved = engine.resolve_first(["diagnosis"], &Context::new().with("bmi", 41));
//! assert_eq!(resolved.get("diagnosis").and_then(|v| v.as_str()), Some("E66.01"));
//! ```

mod catalog;
mod condition;
mod context;
mod engine;
mod error;
mod loader;
mod resolution;
mod rule;

pub use catalog::SettingsCatalog;
pub use condition::{ConditionSet, ConditionValue, EvaluationMode, Predicate};
pub use context::Context;
pub use engine::{matches_condition_set, matches_rule, resolve_all, resolve_first, SettingsEngine};
pub use error::{Result as RulesResult, RuleError};
pub use loader::{load_rules, parse_rules};
pub use resolution::{AllMatches, ResolvedSettings};
pub use rule::RuleDefinition;
