#![cfg(target_arch = "wasm32")]

use chrono::{DateTime, Local};
use colorizer_core::{
    resolve_row, AnnotationSummary, ColorizerConfig, ColumnIndices, RowAnnotation, RuleSet,
};
use wasm_bindgen::JsValue;
use web_sys::{Document, HtmlElement};

use crate::dom;
use crate::tooltip::{HoverHandlers, ACCOUNT_DATA_KEY};

const BACKGROUND: &str = "background-color";

/// Color every row of every grid table on the page. A table or row that
/// fails is logged and skipped; the rest of the pass goes on.
pub fn annotate(
    document: &Document,
    rules: &RuleSet,
    config: &ColorizerConfig,
    hover: &HoverHandlers,
    now: DateTime<Local>,
) -> AnnotationSummary {
    let mut summary = AnnotationSummary::default();

    let tables = match dom::grid_tables(document, config) {
        Ok(tables) => tables,
        Err(err) => {
            log::warn!("cannot query grid tables: {err:?}");
            return summary;
        }
    };

    for (table_idx, table) in tables.iter().enumerate() {
        summary.tables += 1;

        let snapshot = match dom::snapshot_table(table, config) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                log::warn!("table {table_idx} skipped: {err:?}");
                summary.skipped_tables += 1;
                continue;
            }
        };

        if snapshot.columns.is_empty() {
            log::debug!("table {table_idx} has neither an account nor a last-modified column");
            summary.skipped_tables += 1;
        } else {
            log::debug!("table {table_idx} columns: {:?}", snapshot.columns);
        }

        for (row_idx, row) in snapshot.rows.iter().enumerate() {
            match annotate_row(row, &snapshot.columns, rules, config, hover, now) {
                Ok(annotation) => summary.record(&annotation),
                Err(err) => {
                    log::warn!("table {table_idx} row {row_idx} skipped: {err:?}");
                    summary.record_failure();
                }
            }
        }
    }

    summary
}

fn annotate_row(
    row: &HtmlElement,
    columns: &ColumnIndices,
    rules: &RuleSet,
    config: &ColorizerConfig,
    hover: &HoverHandlers,
    now: DateTime<Local>,
) -> Result<RowAnnotation, JsValue> {
    let style = row.style();
    style.remove_property(BACKGROUND)?;

    let cells = dom::row_cells(row, columns)?;
    let annotation = resolve_row(&cells, rules, now, config);

    if let Some(color) = &annotation.background_color {
        style.set_property(BACKGROUND, color)?;
    }

    let dataset = row.dataset();
    match &annotation.note_account_key {
        Some(key) => {
            dataset.set(ACCOUNT_DATA_KEY, key)?;
            hover.attach(row)?;
        }
        None => {
            dataset.delete(ACCOUNT_DATA_KEY);
            hover.detach(row)?;
        }
    }

    Ok(annotation)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::tooltip::TooltipController;
    use colorizer_core::{parse_timestamp, ColorRule, TimerKind, TooltipPhase};
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;
    use web_sys::{Element, MouseEvent};

    const GRID: &str = r#"
        <table role="grid">
          <thead><tr><th>Account Name</th><th>Last Modified Date</th></tr></thead>
          <tbody>
            <tr id="acme"><td><a title="Acme Corp">ACME CORP</a></td><td>6/20/2025, 6:23 PM</td></tr>
            <tr id="globex"><td><a>Globex</a></td><td>1/2/2024, 8:00 AM</td></tr>
            <tr id="initech"><td>Initech</td><td>6/21/2025, 9:00 AM</td></tr>
          </tbody>
        </table>"#;

    struct Fixture {
        document: Document,
        host: Element,
        tooltip: Rc<RefCell<TooltipController>>,
        hover: HoverHandlers,
        config: ColorizerConfig,
    }

    impl Fixture {
        fn mount() -> Self {
            let document = web_sys::window()
                .and_then(|window| window.document())
                .expect("document");
            let host = document.create_element("div").expect("div");
            host.set_inner_html(GRID);
            document.body().expect("body").append_child(&host).expect("append");

            let config = ColorizerConfig::default();
            let tooltip = TooltipController::new(document.clone(), &config);
            let hover = HoverHandlers::new(&tooltip);
            Self {
                document,
                host,
                tooltip,
                hover,
                config,
            }
        }

        fn pass(&self, rules: &RuleSet) -> AnnotationSummary {
            let now = parse_timestamp("6/21/2025, 6:22 PM").expect("now");
            let summary = annotate(&self.document, rules, &self.config, &self.hover, now);
            self.tooltip.borrow_mut().set_rules(rules.clone());
            summary
        }

        fn row(&self, id: &str) -> HtmlElement {
            self.host
                .query_selector(&format!("#{id}"))
                .expect("query")
                .expect("row")
                .dyn_into()
                .expect("html element")
        }

        fn background(&self, id: &str) -> String {
            self.row(id)
                .style()
                .get_property_value(BACKGROUND)
                .expect("style")
        }

        fn dispatch(&self, id: &str, kind: &str) {
            let event = MouseEvent::new(kind).expect("event");
            self.row(id).dispatch_event(&event).expect("dispatch");
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            self.host.remove();
        }
    }

    fn rules() -> RuleSet {
        RuleSet::new(vec![ColorRule::new("Acme Corp", "#00ff00", "VIP")])
    }

    #[wasm_bindgen_test]
    fn repeated_passes_are_idempotent() {
        let fixture = Fixture::mount();

        let first = fixture.pass(&rules());
        let colors: Vec<String> = ["acme", "globex", "initech"]
            .iter()
            .map(|id| fixture.background(id))
            .collect();
        let second = fixture.pass(&rules());

        assert_eq!(first, second);
        assert_eq!(second.matched, 1);
        assert_eq!(second.stale, 1);
        assert_eq!(colors[0], "rgb(0, 255, 0)");
        assert_eq!(colors[1], "rgb(255, 205, 210)");
        assert_eq!(colors[2], "");
        for (id, color) in ["acme", "globex", "initech"].iter().zip(&colors) {
            assert_eq!(&fixture.background(id), color, "row {id}");
        }
        assert_eq!(
            fixture.row("acme").dataset().get(ACCOUNT_DATA_KEY).as_deref(),
            Some("acme corp")
        );
        assert_eq!(fixture.row("globex").dataset().get(ACCOUNT_DATA_KEY), None);
    }

    #[wasm_bindgen_test]
    fn keyed_rows_drive_the_tooltip_once() {
        let fixture = Fixture::mount();
        fixture.pass(&rules());
        fixture.pass(&rules());

        fixture.dispatch("acme", "mouseenter");
        {
            let tooltip = fixture.tooltip.borrow();
            assert_eq!(tooltip.state().hovered(), Some(&fixture.row("acme")));
            assert_eq!(tooltip.state().phase(), TooltipPhase::Showing);
        }

        fixture.dispatch("acme", "mouseleave");
        {
            let tooltip = fixture.tooltip.borrow();
            assert_eq!(tooltip.state().hovered(), None);
            assert!(tooltip.state().is_pending(TimerKind::Hide));
        }

        // No listeners on rows without a matching rule.
        fixture.dispatch("globex", "mouseenter");
        assert_eq!(fixture.tooltip.borrow().state().hovered(), None);
    }

    #[wasm_bindgen_test]
    fn rows_that_lose_their_rule_are_reset() {
        let fixture = Fixture::mount();
        fixture.pass(&rules());

        let summary = fixture.pass(&RuleSet::default());
        assert_eq!(summary.matched, 0);
        assert_eq!(fixture.background("acme"), "");
        assert_eq!(fixture.row("acme").dataset().get(ACCOUNT_DATA_KEY), None);

        fixture.dispatch("acme", "mouseenter");
        assert_eq!(fixture.tooltip.borrow().state().hovered(), None);
    }
}
