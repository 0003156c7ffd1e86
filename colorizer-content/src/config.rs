use colorizer_core::ColorizerConfig;
use serde::Deserialize;

/// Partial configuration accepted from the loader script. Missing fields
/// keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsColorizerConfig {
    #[serde(default)]
    stale_after_hours: Option<u32>,
    #[serde(default)]
    stale_color: Option<String>,
    #[serde(default)]
    account_header: Option<String>,
    #[serde(default)]
    last_modified_header: Option<String>,
    #[serde(default)]
    target_selector: Option<String>,
    #[serde(default)]
    grid_selector: Option<String>,
    #[serde(default)]
    debounce_ms: Option<u32>,
    #[serde(default)]
    target_poll_ms: Option<u32>,
    #[serde(default)]
    max_target_polls: Option<u32>,
    #[serde(default)]
    initial_pass_delay_ms: Option<u32>,
    #[serde(default)]
    max_idle_retries: Option<u32>,
    #[serde(default)]
    tooltip_hide_delay_ms: Option<u32>,
    #[serde(default)]
    tooltip_fade_ms: Option<u32>,
    #[serde(default)]
    trigger_name: Option<String>,
}

impl From<JsColorizerConfig> for ColorizerConfig {
    fn from(cfg: JsColorizerConfig) -> Self {
        let mut base = ColorizerConfig::default();
        if let Some(hours) = cfg.stale_after_hours {
            base.stale_after_hours = hours;
        }
        if let Some(color) = non_blank(cfg.stale_color) {
            base.stale_color = color;
        }
        if let Some(label) = non_blank(cfg.account_header) {
            base.account_header = label;
        }
        if let Some(label) = non_blank(cfg.last_modified_header) {
            base.last_modified_header = label;
        }
        if let Some(selector) = non_blank(cfg.target_selector) {
            base.target_selector = selector;
        }
        if let Some(selector) = non_blank(cfg.grid_selector) {
            base.grid_selector = selector;
        }
        if let Some(ms) = cfg.debounce_ms {
            // quiet window must stay non-zero
            base.debounce_ms = ms.max(1);
        }
        if let Some(ms) = cfg.target_poll_ms {
            base.target_poll_ms = ms.max(1);
        }
        if let Some(polls) = cfg.max_target_polls {
            base.max_target_polls = polls;
        }
        if let Some(ms) = cfg.initial_pass_delay_ms {
            base.initial_pass_delay_ms = ms;
        }
        if let Some(retries) = cfg.max_idle_retries {
            base.max_idle_retries = retries;
        }
        if let Some(ms) = cfg.tooltip_hide_delay_ms {
            base.tooltip_hide_delay_ms = ms;
        }
        if let Some(ms) = cfg.tooltip_fade_ms {
            base.tooltip_fade_ms = ms;
        }
        if let Some(name) = non_blank(cfg.trigger_name) {
            base.trigger_name = name;
        }
        base
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn merged(value: serde_json::Value) -> ColorizerConfig {
        let cfg: JsColorizerConfig = serde_json::from_value(value).expect("config");
        cfg.into()
    }

    #[test]
    fn empty_object_keeps_defaults() {
        assert_eq!(merged(json!({})), ColorizerConfig::default());
    }

    #[test]
    fn provided_fields_override_defaults() {
        let config = merged(json!({
            "staleAfterHours": 48,
            "staleColor": "#fff3e0",
            "debounceMs": 750,
            "triggerName": "recolorRows"
        }));
        assert_eq!(config.stale_after_hours, 48);
        assert_eq!(config.stale_color, "#fff3e0");
        assert_eq!(config.debounce_ms, 750);
        assert_eq!(config.trigger_name, "recolorRows");
        assert_eq!(config.tooltip_hide_delay_ms, 5000);
    }

    #[test]
    fn blank_strings_and_zero_windows_are_ignored() {
        let config = merged(json!({
            "gridSelector": "  ",
            "debounceMs": 0,
            "targetPollMs": 0
        }));
        assert_eq!(config.grid_selector, ColorizerConfig::default().grid_selector);
        assert_eq!(config.debounce_ms, 1);
        assert_eq!(config.target_poll_ms, 1);
    }
}
