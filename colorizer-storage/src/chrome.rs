//! `chrome.storage.sync` bindings. Only the promise form of the API is used.

use colorizer_core::{ColorizerError, RuleSet};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::{defaults_payload, rules_from_payload, rules_to_payload};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "sync"], js_name = get)]
    async fn sync_get(defaults: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "sync"], js_name = set)]
    async fn sync_set(items: JsValue) -> Result<JsValue, JsValue>;
}

fn to_js(value: &Value) -> Result<JsValue, ColorizerError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|err| ColorizerError::Storage(err.to_string()))
}

fn storage_error(err: JsValue) -> ColorizerError {
    ColorizerError::Storage(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

/// Read the current rules, reporting any failure.
pub async fn try_load_rules() -> Result<RuleSet, ColorizerError> {
    let raw = sync_get(to_js(&defaults_payload())?)
        .await
        .map_err(storage_error)?;
    let payload: Value = serde_wasm_bindgen::from_value(raw)
        .map_err(|err| ColorizerError::Storage(err.to_string()))?;
    rules_from_payload(&payload)
}

/// Read the current rules. An unreadable store counts as having no rules.
pub async fn load_rules() -> RuleSet {
    match try_load_rules().await {
        Ok(rules) => rules,
        Err(err) => {
            log::warn!("rule store unavailable, coloring without account rules: {err}");
            RuleSet::default()
        }
    }
}

/// Replace the stored rules wholesale.
pub async fn save_rules(rules: &RuleSet) -> Result<(), ColorizerError> {
    let payload = to_js(&rules_to_payload(rules)?)?;
    sync_set(payload).await.map_err(storage_error)?;
    log::debug!("stored {} account rules", rules.len());
    Ok(())
}
