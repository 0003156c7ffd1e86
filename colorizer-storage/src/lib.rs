//! Account rules as persisted in `chrome.storage.sync`.
//!
//! The store holds one key, [`RULES_KEY`], whose value is an array of
//! `{accountName, color, note}` objects written by the popup. Decoding is
//! lenient: a malformed entry is dropped instead of failing the whole read.

use colorizer_core::{ColorRule, ColorizerError, RuleSet};
use serde_json::{Map, Value};

#[cfg(target_arch = "wasm32")]
pub mod chrome;

/// Storage key of the rule array.
pub const RULES_KEY: &str = "accountColorRules";

/// Decode rules from a JSON string holding the storage payload.
pub fn rules_from_str(payload_json: &str) -> Result<RuleSet, ColorizerError> {
    let value: Value = serde_json::from_str(payload_json)
        .map_err(|err| ColorizerError::Storage(err.to_string()))?;
    rules_from_payload(&value)
}

/// Decode rules from the object returned by `chrome.storage.sync.get`.
pub fn rules_from_payload(payload: &Value) -> Result<RuleSet, ColorizerError> {
    let object = payload
        .as_object()
        .ok_or_else(|| ColorizerError::Storage("payload is not an object".to_string()))?;

    let entries = match object.get(RULES_KEY) {
        None | Some(Value::Null) => return Ok(RuleSet::default()),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            return Err(ColorizerError::Storage(format!(
                "{RULES_KEY} should be an array, found {}",
                json_kind(other)
            )))
        }
    };

    let mut rules = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        match decode_rule(entry) {
            Some(rule) => rules.push(rule),
            None => log::warn!("skipping malformed rule #{idx}: {entry}"),
        }
    }
    Ok(RuleSet::new(rules))
}

fn decode_rule(entry: &Value) -> Option<ColorRule> {
    let account_name = entry.get("accountName")?.as_str()?.trim();
    let color = entry.get("color")?.as_str()?.trim();
    if account_name.is_empty() || color.is_empty() {
        return None;
    }

    let note = entry
        .get("note")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim();

    Some(ColorRule::new(account_name, color, note))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Payload to write back after a read-modify-write.
pub fn rules_to_payload(rules: &RuleSet) -> Result<Value, ColorizerError> {
    let rules = serde_json::to_value(rules).map_err(|err| ColorizerError::Storage(err.to_string()))?;
    let mut payload = Map::new();
    payload.insert(RULES_KEY.to_string(), rules);
    Ok(Value::Object(payload))
}

/// Defaults passed to `get` so a fresh profile reads as an empty rule list.
pub fn defaults_payload() -> Value {
    let mut payload = Map::new();
    payload.insert(RULES_KEY.to_string(), Value::Array(Vec::new()));
    Value::Object(payload)
}
