//! JavaScript bridge used by the popup: rule editing and diagnostics.

use colorizer_core::{parse_timestamp, ColorRule, ColorizerError, RuleSet};
use colorizer_storage::{rules_from_payload, RULES_KEY};
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsRuleInput {
    #[serde(default)]
    account_name: String,
    #[serde(default)]
    color: String,
    #[serde(default)]
    note: String,
}

impl From<JsRuleInput> for ColorRule {
    fn from(input: JsRuleInput) -> Self {
        ColorRule::new(input.account_name, input.color, input.note)
    }
}

fn init_runtime() {
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        // A second init from another entry point is expected and harmless.
        let _ = console_log::init_with_level(log::Level::Info);
    }
}

fn rules_from_js(rules: JsValue) -> Result<RuleSet, JsValue> {
    if rules.is_undefined() || rules.is_null() {
        return Ok(RuleSet::default());
    }
    let entries = from_value::<serde_json::Value>(rules)
        .map_err(|err| JsValue::from_str(&format!("Cannot read rule list: {err}")))?;
    rules_from_array(entries).map_err(|err| JsValue::from_str(&format_colorizer_error(err)))
}

fn rules_from_array(entries: serde_json::Value) -> Result<RuleSet, ColorizerError> {
    let mut payload = serde_json::Map::new();
    payload.insert(RULES_KEY.to_string(), entries);
    rules_from_payload(&serde_json::Value::Object(payload))
}

fn rules_to_js(rules: &RuleSet) -> Result<JsValue, JsValue> {
    to_value(rules).map_err(|err| JsValue::from_str(&format!("Cannot serialize rules: {err}")))
}

fn rule_from_js(rule: JsValue) -> Result<ColorRule, JsValue> {
    let input: JsRuleInput =
        from_value(rule).map_err(|err| JsValue::from_str(&format!("Cannot read rule: {err}")))?;
    Ok(input.into())
}

/// Add `rule` to `rules`, or update the rule for the same account. Returns the new list.
#[wasm_bindgen]
pub fn upsert_rule(rules: JsValue, rule: JsValue) -> Result<JsValue, JsValue> {
    init_runtime();
    let mut rules = rules_from_js(rules)?;
    rules
        .upsert(rule_from_js(rule)?)
        .map_err(|err| JsValue::from_str(&format_colorizer_error(err)))?;
    rules_to_js(&rules)
}

/// Remove the rule at `index`. Returns the new list.
#[wasm_bindgen]
pub fn remove_rule(rules: JsValue, index: usize) -> Result<JsValue, JsValue> {
    init_runtime();
    let mut rules = rules_from_js(rules)?;
    rules
        .remove(index)
        .map_err(|err| JsValue::from_str(&format_colorizer_error(err)))?;
    rules_to_js(&rules)
}

/// Milliseconds since the epoch for a last-modified cell, or `undefined`.
#[wasm_bindgen]
pub fn parse_last_modified(text: &str) -> Option<f64> {
    parse_timestamp(text).map(|dt| dt.timestamp_millis() as f64)
}

/// Read-modify-write of the stored rules. Resolves to the stored list.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub async fn save_rule(rule: JsValue) -> Result<JsValue, JsValue> {
    init_runtime();
    let rule = rule_from_js(rule)?;
    let mut rules = colorizer_storage::chrome::try_load_rules()
        .await
        .map_err(|err| JsValue::from_str(&format_colorizer_error(err)))?;

    let updated = rules
        .upsert(rule)
        .map_err(|err| JsValue::from_str(&format_colorizer_error(err)))?;
    colorizer_storage::chrome::save_rules(&rules)
        .await
        .map_err(|err| JsValue::from_str(&format_colorizer_error(err)))?;

    log::info!(
        "{} rule, {} stored",
        if updated { "updated" } else { "added" },
        rules.len()
    );
    rules_to_js(&rules)
}

/// Remove the stored rule at `index`. Resolves to the stored list.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub async fn delete_rule(index: usize) -> Result<JsValue, JsValue> {
    init_runtime();
    let mut rules = colorizer_storage::chrome::try_load_rules()
        .await
        .map_err(|err| JsValue::from_str(&format_colorizer_error(err)))?;

    let removed = rules
        .remove(index)
        .map_err(|err| JsValue::from_str(&format_colorizer_error(err)))?;
    colorizer_storage::chrome::save_rules(&rules)
        .await
        .map_err(|err| JsValue::from_str(&format_colorizer_error(err)))?;

    log::info!("removed rule for {}", removed.account_name);
    rules_to_js(&rules)
}

fn format_colorizer_error(err: ColorizerError) -> String {
    format!("Colorizer error: {err}")
}
