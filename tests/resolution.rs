// Tests covering first-match and all-match resolution over ordered rule sets.
use clinic_settings::{
    resolve_all, resolve_first, ConditionSet, ConditionValue, Context, EvaluationMode,
    RuleDefinition, SettingsEngine,
};
use serde_json::{json, Value};
use test_case::test_case;

fn threshold_rules() -> Vec<RuleDefinition> {
    vec![
        RuleDefinition::new()
            .var("example1", "a1")
            .var("example2", "a2")
            .when(ConditionSet::new().equals("param1", 3)),
        RuleDefinition::new()
            .var("example1", "b1")
            .var("example2", "b2")
            .when(ConditionSet::new().equals("param2", 4)),
        RuleDefinition::new()
            .var("example1", "c1")
            .var("example2", "c2")
            .when(ConditionSet::new().range("param1", 3, 5)),
        RuleDefinition::new()
            .var("example1", "d1")
            .var("example2", "d2")
            .when(ConditionSet::new().equals("param2", 7)),
    ]
}

#[test]
fn resolve_all_collects_every_match_in_rule_order() {
    let context = Context::new().with("param1", 3).with("param2", 4);
    let all = resolve_all(&threshold_rules(), ["example1", "example2"], &context);

    assert_eq!(all.get("example1"), &[json!("a1"), json!("b1"), json!("c1")]);
    assert_eq!(all.get("example2"), &[json!("a2"), json!("b2"), json!("c2")]);
}

#[test]
fn resolve_all_keeps_unresolved_names_as_empty_lists() {
    let context = Context::new().with("param1", 3).with("param2", 4);
    let all = resolve_all(&threshold_rules(), ["example1", "missing"], &context);

    assert!(all.contains("missing"));
    assert!(all.get("missing").is_empty());
    assert_eq!(
        serde_json::to_value(&all).expect("serializable")["missing"],
        json!([])
    );
}

#[test]
fn resolve_first_omits_unresolved_names() {
    let rules = vec![RuleDefinition::new()
        .var("cost", 150)
        .when(ConditionSet::new().equals("initial", true))];

    let resolved = resolve_first(&rules, ["cost", "provider"], &Context::new().with("initial", false));
    assert!(resolved.is_empty());
    assert_eq!(serde_json::to_value(&resolved).expect("serializable"), json!({}));
}

#[test]
fn earlier_rules_win_when_several_match() {
    let rules = vec![
        RuleDefinition::new().var("provider", "first"),
        RuleDefinition::new().var("provider", "second"),
    ];

    let resolved = resolve_first(&rules, ["provider"], &Context::new());
    assert_eq!(resolved.get("provider"), Some(&json!("first")));
}

#[test]
fn empty_context_skips_every_field_constraint() {
    let resolved = resolve_first(&threshold_rules(), ["example1"], &Context::new());
    assert_eq!(resolved.get("example1"), Some(&json!("a1")));

    let all = resolve_all(&threshold_rules(), ["example1"], &Context::new());
    assert_eq!(all.get("example1").len(), 4);
}

#[test]
fn mistyped_context_field_stops_constraining() {
    let rules = vec![
        RuleDefinition::new()
            .var("diagnosis", "E66.01")
            .when(ConditionSet::new().range("bmi", 40, 100)),
        RuleDefinition::new().var("diagnosis", "E66.9"),
    ];
    let context = Context::new().with("BMI", 25);

    let lenient = SettingsEngine::new(rules.clone());
    assert_eq!(
        lenient.resolve_first(["diagnosis"], &context).get("diagnosis"),
        Some(&json!("E66.01"))
    );

    let strict = SettingsEngine::new(rules).with_mode(EvaluationMode::Strict);
    assert_eq!(
        strict.resolve_first(["diagnosis"], &context).get("diagnosis"),
        Some(&json!("E66.9"))
    );
}

#[test_case(json!(29.9), false ; "below lower bound")]
#[test_case(json!(30), true ; "on lower bound")]
#[test_case(json!(34.5), true ; "inside")]
#[test_case(json!(39.99), true ; "just under upper bound")]
#[test_case(json!(40), true ; "on upper bound")]
#[test_case(json!(40.01), false ; "above upper bound")]
#[test_case(json!("35"), false ; "numeric string")]
fn range_bounds_are_inclusive(bmi: Value, expected: bool) {
    let rules = vec![RuleDefinition::new()
        .var("tier", "obesity-class-1-2")
        .when(ConditionSet::new().range("bmi", 30, 40))];

    let resolved = resolve_first(&rules, ["tier"], &Context::new().with("bmi", bmi));
    assert_eq!(resolved.contains("tier"), expected);
}

#[test_case(json!(2), true ; "first member")]
#[test_case(json!(5), true ; "last member")]
#[test_case(json!(5.0), true ; "float spelling of member")]
#[test_case(json!(3), false ; "not a member")]
#[test_case(json!("5"), false ; "string spelling of member")]
fn membership_uses_strict_equality(param: Value, expected: bool) {
    let rules = vec![RuleDefinition::new()
        .var("example", 1)
        .when(ConditionSet::new().one_of("param1", [2, 4, 5]))];

    let resolved = resolve_first(&rules, ["example"], &Context::new().with("param1", param));
    assert_eq!(resolved.contains("example"), expected);
}

#[test]
fn predicates_are_shared_across_threads() {
    let engine = std::sync::Arc::new(SettingsEngine::new(vec![RuleDefinition::new()
        .var("visit", "follow-up")
        .when(ConditionSet::new().with(
            "days_since_last",
            ConditionValue::predicate("within_90_days", |value| {
                value.as_u64().map_or(false, |days| days <= 90)
            }),
        ))]));

    let handles: Vec<_> = [30_u64, 120]
        .into_iter()
        .map(|days| {
            let engine = std::sync::Arc::clone(&engine);
            std::thread::spawn(move || {
                engine
                    .resolve_first(["visit"], &Context::new().with("days_since_last", days))
                    .contains("visit")
            })
        })
        .collect();

    let results: Vec<bool> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread"))
        .collect();
    assert_eq!(results, vec![true, false]);
}

#[test]
fn resolution_leaves_inputs_untouched() {
    let rules = threshold_rules();
    let context = Context::new().with("param1", 3);
    let before = (rules.clone(), context.clone());

    let _ = resolve_first(&rules, ["example1"], &context);
    let _ = resolve_all(&rules, ["example1", "example2"], &context);

    assert_eq!((rules, context), before);
}
