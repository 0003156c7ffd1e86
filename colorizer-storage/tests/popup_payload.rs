use std::fs;

use colorizer_core::{ColorRule, RuleSet};
use colorizer_storage::{rules_from_str, rules_to_payload};
use serde_json::Value;

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn popup_rules() -> RuleSet {
    let payload = fs::read_to_string(fixture_path("popup_rules_payload.json"))
        .expect("fixture payload readable");
    rules_from_str(&payload).expect("payload decodes")
}

#[test]
fn popup_payload_normalizes_to_golden() {
    let actual = rules_to_payload(&popup_rules()).expect("payload encodes");

    let expected = fs::read_to_string(fixture_path("popup_rules_normalized.json"))
        .expect("golden readable");
    let expected: Value = serde_json::from_str(&expected).expect("golden is valid JSON");

    assert_eq!(actual, expected);
}

#[test]
fn popup_payload_supports_case_insensitive_lookups() {
    let rules = popup_rules();

    assert_eq!(rules.find("ACME CORP").map(|r| r.color.as_str()), Some("#00ff00"));
    assert_eq!(rules.note_for("globex corporation"), Some("Renewal due in Q3"));
    assert_eq!(rules.note_for("stark industries"), None);
    assert!(rules.find("Umbrella").is_none());
}

#[test]
fn read_modify_write_keeps_one_rule_per_account() {
    let mut rules = popup_rules();
    let before = rules.len();

    rules
        .upsert(ColorRule::new("initech", "#795548", "Escalated"))
        .expect("update");
    rules
        .upsert(ColorRule::new("Wayne Enterprises", "#607d8b", ""))
        .expect("insert");

    let written = rules_to_payload(&rules).expect("payload encodes");
    let reread = rules_from_str(&written.to_string()).expect("reread");

    assert_eq!(reread.len(), before + 1);
    let initech = reread.find("Initech").expect("initech kept");
    assert_eq!(initech.account_name, "Initech");
    assert_eq!(initech.color, "#795548");
    assert_eq!(initech.note, "Escalated");
}
