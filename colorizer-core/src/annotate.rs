use std::fmt;

use chrono::{DateTime, Local};

use crate::datetime::{is_stale, parse_timestamp};
use crate::{ColorizerConfig, RuleSet};

/// Normalized lookup key for an account name.
pub fn account_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Positions of the columns the colorizer reads. `None` means the grid has
/// no such column and the corresponding rule is skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnIndices {
    pub account_name: Option<usize>,
    pub last_modified: Option<usize>,
}

impl ColumnIndices {
    /// Match header labels exactly after trimming, ignoring case. A later
    /// header with the same label wins.
    pub fn from_labels<I, S>(labels: I, config: &ColorizerConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalize = |label: &str| label.trim().to_lowercase();
        let account = normalize(&config.account_header);
        let modified = normalize(&config.last_modified_header);

        let mut columns = Self::default();
        for (idx, label) in labels.into_iter().enumerate() {
            let label = normalize(label.as_ref());
            if label == account {
                columns.account_name = Some(idx);
            }
            if label == modified {
                columns.last_modified = Some(idx);
            }
        }
        columns
    }

    pub fn is_empty(&self) -> bool {
        self.account_name.is_none() && self.last_modified.is_none()
    }
}

/// Text pulled from the two interesting cells of a body row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowCells {
    pub account_name: Option<String>,
    pub last_modified: Option<String>,
}

impl RowCells {
    /// Pick the relevant cells out of a row's cell texts. Short rows and
    /// blank cells leave the column empty.
    pub fn from_texts<S: AsRef<str>>(cells: &[S], columns: &ColumnIndices) -> Self {
        let pick = |idx: Option<usize>| {
            idx.and_then(|i| cells.get(i))
                .map(|text| text.as_ref().trim())
                .filter(|text| !text.is_empty())
                .map(str::to_string)
        };
        Self {
            account_name: pick(columns.account_name),
            last_modified: pick(columns.last_modified),
        }
    }
}

/// One grid table as seen by a single annotation pass.
#[derive(Debug, Clone)]
pub struct TableSnapshot<R> {
    pub columns: ColumnIndices,
    pub rows: Vec<R>,
}

impl<R> TableSnapshot<R> {
    pub fn new(columns: ColumnIndices, rows: Vec<R>) -> Self {
        Self { columns, rows }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorReason {
    None,
    Stale,
    Account,
}

/// Outcome for one row: the background to apply and the account whose note
/// the row should show on hover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowAnnotation {
    pub background_color: Option<String>,
    pub note_account_key: Option<String>,
    pub reason: ColorReason,
}

impl RowAnnotation {
    pub fn none() -> Self {
        Self {
            background_color: None,
            note_account_key: None,
            reason: ColorReason::None,
        }
    }
}

/// Decide how a row should look. Staleness is evaluated first; a matching
/// account rule overrides it.
pub fn resolve_row(
    cells: &RowCells,
    rules: &RuleSet,
    now: DateTime<Local>,
    config: &ColorizerConfig,
) -> RowAnnotation {
    let mut annotation = RowAnnotation::none();

    if let Some(modified) = cells.last_modified.as_deref().and_then(parse_timestamp) {
        if is_stale(modified, now, config.stale_after()) {
            annotation.background_color = Some(config.stale_color.clone());
            annotation.reason = ColorReason::Stale;
        }
    }

    if let Some(rule) = cells.account_name.as_deref().and_then(|name| rules.find(name)) {
        annotation.background_color = Some(rule.color.clone());
        annotation.note_account_key = Some(rule.key());
        annotation.reason = ColorReason::Account;
    }

    annotation
}

/// Counters reported after each annotation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationSummary {
    pub tables: usize,
    pub skipped_tables: usize,
    pub rows: usize,
    pub stale: usize,
    pub matched: usize,
    pub failed_rows: usize,
}

impl AnnotationSummary {
    pub fn record(&mut self, annotation: &RowAnnotation) {
        self.rows += 1;
        match annotation.reason {
            ColorReason::Stale => self.stale += 1,
            ColorReason::Account => self.matched += 1,
            ColorReason::None => {}
        }
    }

    pub fn record_failure(&mut self) {
        self.rows += 1;
        self.failed_rows += 1;
    }
}

impl fmt::Display for AnnotationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows in {} tables ({} skipped): {} matched, {} stale, {} failed",
            self.rows, self.tables, self.skipped_tables, self.matched, self.stale, self.failed_rows
        )
    }
}
