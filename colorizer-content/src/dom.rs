#![cfg(target_arch = "wasm32")]

//! Reading grid tables out of the host page.

use colorizer_core::{ColorizerConfig, ColumnIndices, RowCells, TableSnapshot};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, MutationRecord, Node, NodeList};

use crate::styles::TOOLTIP_SELECTOR;

const HEADER_SELECTOR: &str = "thead th";
const ROW_SELECTOR: &str = "tbody tr";
const CELL_SELECTOR: &str = "th, td";
/// Account cells wrap the name in a record link.
const ACCOUNT_TEXT_SELECTOR: &str = "a[title], a";
/// Date cells render through a formatted-text component or a titled span.
const MODIFIED_TEXT_SELECTOR: &str = "lightning-formatted-text, span[title]";

fn elements(list: &NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|idx| list.item(idx))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

pub fn grid_tables(document: &Document, config: &ColorizerConfig) -> Result<Vec<Element>, JsValue> {
    Ok(elements(&document.query_selector_all(&config.grid_selector)?))
}

/// `aria-label` when present and non-blank, visible text otherwise.
pub fn header_label(header: &Element) -> String {
    header
        .get_attribute("aria-label")
        .filter(|label| !label.trim().is_empty())
        .or_else(|| header.text_content())
        .unwrap_or_default()
}

pub fn snapshot_table(
    table: &Element,
    config: &ColorizerConfig,
) -> Result<TableSnapshot<HtmlElement>, JsValue> {
    let headers = elements(&table.query_selector_all(HEADER_SELECTOR)?);
    let columns = ColumnIndices::from_labels(headers.iter().map(header_label), config);

    let rows = elements(&table.query_selector_all(ROW_SELECTOR)?)
        .into_iter()
        .filter_map(|row| row.dyn_into::<HtmlElement>().ok())
        .collect();

    Ok(TableSnapshot::new(columns, rows))
}

pub fn row_cells(row: &Element, columns: &ColumnIndices) -> Result<RowCells, JsValue> {
    let texts = elements(&row.query_selector_all(CELL_SELECTOR)?)
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            if columns.account_name == Some(idx) {
                cell_text(cell, ACCOUNT_TEXT_SELECTOR)
            } else if columns.last_modified == Some(idx) {
                cell_text(cell, MODIFIED_TEXT_SELECTOR)
            } else {
                Ok(String::new())
            }
        })
        .collect::<Result<Vec<_>, JsValue>>()?;

    Ok(RowCells::from_texts(&texts, columns))
}

fn cell_text(cell: &Element, preferred: &str) -> Result<String, JsValue> {
    let text = match cell.query_selector(preferred)? {
        Some(inner) => inner.text_content(),
        None => cell.text_content(),
    };
    Ok(text.unwrap_or_default())
}

/// Element `node` is, or sits in when it is a text node.
fn owning_element(node: &Node) -> Option<Element> {
    match node.dyn_ref::<Element>() {
        Some(element) => Some(element.clone()),
        None => node.parent_element(),
    }
}

/// Whether an added node is, contains or sits inside a grid table.
pub fn touches_grid(node: &Node, grid_selector: &str) -> bool {
    let Some(element) = owning_element(node) else {
        return false;
    };

    element.closest(grid_selector).ok().flatten().is_some()
        || element.query_selector(grid_selector).ok().flatten().is_some()
}

/// Whether `node` belongs to the tooltip this script renders.
pub fn is_colorizer_node(node: &Node) -> bool {
    owning_element(node)
        .and_then(|element| element.closest(TOOLTIP_SELECTOR).ok().flatten())
        .is_some()
}

/// Records caused by the tooltip itself: its insertion or a note update.
pub fn is_colorizer_record(record: &MutationRecord) -> bool {
    if record.target().is_some_and(|target| is_colorizer_node(&target)) {
        return true;
    }

    let added = record.added_nodes();
    added.length() > 0
        && (0..added.length())
            .filter_map(|idx| added.item(idx))
            .all(|node| is_colorizer_node(&node))
}
