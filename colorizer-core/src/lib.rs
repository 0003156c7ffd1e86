//! Core logic for coloring CRM list-view rows and attaching account notes.
//!
//! Nothing in this crate touches the DOM. The content script feeds it header
//! labels, cell text and hover events, and executes whatever it decides.

mod annotate;
mod datetime;
mod tooltip;
mod watcher;

use serde::{Deserialize, Serialize};

pub use annotate::{
    account_key, resolve_row, AnnotationSummary, ColorReason, ColumnIndices, RowAnnotation,
    RowCells, TableSnapshot,
};
pub use datetime::{is_stale, parse_timestamp, try_parse_timestamp};
pub use tooltip::{
    place_tooltip, Placement, Rect, TimerKind, TooltipCommand, TooltipPhase, TooltipState,
    EDGE_MARGIN_PX, ROW_GAP_PX, SHOW_FRAME_DELAY_MS,
};
pub use watcher::{ChangeWatcher, PassGate, WatchAction};

/// Background applied to rows whose last modification is older than the threshold.
pub const DEFAULT_STALE_COLOR: &str = "#ffcdd2";

/// Tunables for the content script. Every delay is in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColorizerConfig {
    /// Age (hours) after which a row counts as stale.
    pub stale_after_hours: u32,
    pub stale_color: String,
    /// Header label of the account column, compared case-insensitively.
    pub account_header: String,
    /// Header label of the last-modified column, compared case-insensitively.
    pub last_modified_header: String,
    /// Container that signals the list view has been mounted.
    pub target_selector: String,
    pub grid_selector: String,
    pub debounce_ms: u32,
    pub target_poll_ms: u32,
    /// Polls of `target_selector` before falling back to observing `<body>`.
    pub max_target_polls: u32,
    pub initial_pass_delay_ms: u32,
    /// Irrelevant mutation batches that still trigger a pass.
    pub max_idle_retries: u32,
    pub tooltip_hide_delay_ms: u32,
    pub tooltip_fade_ms: u32,
    /// Name under which `apply_coloring` is exposed on `window`.
    pub trigger_name: String,
}

impl Default for ColorizerConfig {
    fn default() -> Self {
        Self {
            stale_after_hours: 24,
            stale_color: DEFAULT_STALE_COLOR.to_string(),
            account_header: "account name".to_string(),
            last_modified_header: "last modified date".to_string(),
            target_selector: "lst-object-home, .lstObjectHomeWrapper".to_string(),
            grid_selector: "table[role=\"grid\"]".to_string(),
            debounce_ms: 500,
            target_poll_ms: 500,
            max_target_polls: 120,
            initial_pass_delay_ms: 1500,
            max_idle_retries: 10,
            tooltip_hide_delay_ms: 5000,
            tooltip_fade_ms: 300,
            trigger_name: "applySalesforceColoring".to_string(),
        }
    }
}

impl ColorizerConfig {
    pub fn stale_after(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.stale_after_hours))
    }
}

/// A user-defined color (and optional note) for one account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ColorRule {
    pub account_name: String,
    pub color: String,
    #[serde(default)]
    pub note: String,
}

impl ColorRule {
    pub fn new(
        account_name: impl Into<String>,
        color: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            color: color.into(),
            note: note.into(),
        }
    }

    pub fn key(&self) -> String {
        account_key(&self.account_name)
    }

    /// The note, if it carries any visible text.
    pub fn note(&self) -> Option<&str> {
        let note = self.note.trim();
        (!note.is_empty()).then_some(note)
    }
}

/// Ordered account rules as stored by the popup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<ColorRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<ColorRule>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColorRule> {
        self.rules.iter()
    }

    pub fn as_slice(&self) -> &[ColorRule] {
        &self.rules
    }

    /// First rule whose account name matches, ignoring case and surrounding whitespace.
    pub fn find(&self, account_name: &str) -> Option<&ColorRule> {
        let key = account_key(account_name);
        if key.is_empty() {
            return None;
        }
        self.rules.iter().find(|rule| rule.key() == key)
    }

    /// Note attached to the account, if any.
    pub fn note_for(&self, account_name: &str) -> Option<&str> {
        self.find(account_name).and_then(ColorRule::note)
    }

    /// Insert a rule, or update color and note of the existing rule with the
    /// same account name. Returns `true` when an existing rule was updated.
    pub fn upsert(&mut self, rule: ColorRule) -> Result<bool, ColorizerError> {
        let account_name = rule.account_name.trim().to_string();
        if account_name.is_empty() {
            return Err(ColorizerError::EmptyAccountName);
        }

        let key = account_key(&account_name);
        if let Some(existing) = self.rules.iter_mut().find(|r| r.key() == key) {
            existing.color = rule.color;
            existing.note = rule.note.trim().to_string();
            return Ok(true);
        }

        self.rules.push(ColorRule {
            account_name,
            color: rule.color,
            note: rule.note.trim().to_string(),
        });
        Ok(false)
    }

    pub fn remove(&mut self, index: usize) -> Result<ColorRule, ColorizerError> {
        if index >= self.rules.len() {
            return Err(ColorizerError::RuleIndex {
                index,
                len: self.rules.len(),
            });
        }
        Ok(self.rules.remove(index))
    }
}

/// Errors surfaced by the colorizer crates.
#[derive(Debug, thiserror::Error)]
pub enum ColorizerError {
    #[error("unrecognized date text: {0:?}")]
    UnrecognizedDate(String),
    #[error("date is not on the calendar: {0:?}")]
    InvalidDate(String),
    #[error("account name must not be empty")]
    EmptyAccountName,
    #[error("no rule at index {index} (have {len})")]
    RuleIndex { index: usize, len: usize },
    #[error("rule store payload unreadable: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> RuleSet {
        RuleSet::new(vec![ColorRule::new("Acme Corp", "#00ff00", "VIP")])
    }

    #[test]
    fn find_ignores_case_and_padding() {
        let rules = acme();
        assert_eq!(rules.find("ACME CORP").map(|r| r.color.as_str()), Some("#00ff00"));
        assert_eq!(rules.find("  acme corp ").map(|r| r.color.as_str()), Some("#00ff00"));
        assert!(rules.find("Acme").is_none());
        assert!(rules.find("").is_none());
    }

    #[test]
    fn upsert_updates_in_place() {
        let mut rules = acme();
        rules
            .upsert(ColorRule::new("Globex", "#0000ff", ""))
            .expect("insert");
        let updated = rules
            .upsert(ColorRule::new(" acme CORP ", "#ff0000", " key account "))
            .expect("update");

        assert!(updated);
        assert_eq!(rules.len(), 2);
        let first = &rules.as_slice()[0];
        assert_eq!(first.account_name, "Acme Corp");
        assert_eq!(first.color, "#ff0000");
        assert_eq!(first.note, "key account");
    }

    #[test]
    fn upsert_rejects_blank_names() {
        let mut rules = RuleSet::default();
        assert!(matches!(
            rules.upsert(ColorRule::new("   ", "#fff", "")),
            Err(ColorizerError::EmptyAccountName)
        ));
        assert!(rules.is_empty());
    }

    #[test]
    fn remove_checks_bounds() {
        let mut rules = acme();
        assert!(matches!(
            rules.remove(3),
            Err(ColorizerError::RuleIndex { index: 3, len: 1 })
        ));
        assert_eq!(rules.remove(0).expect("remove").account_name, "Acme Corp");
        assert!(rules.is_empty());
    }

    #[test]
    fn blank_note_is_absent() {
        let rules = RuleSet::new(vec![ColorRule::new("Initech", "#ccc", "  ")]);
        assert!(rules.find("initech").is_some());
        assert_eq!(rules.note_for("initech"), None);
        assert_eq!(acme().note_for("acme corp"), Some("VIP"));
    }

    #[test]
    fn rules_use_camel_case_fields() {
        let rule: ColorRule =
            serde_json::from_str(r##"{"accountName":"Acme Corp","color":"#00ff00"}"##)
                .expect("rule");
        assert_eq!(rule.note, "");
        let json = serde_json::to_value(&rule).expect("json");
        assert_eq!(json["accountName"], "Acme Corp");
    }
}
