#![cfg(target_arch = "wasm32")]

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Node};

const STYLE_TAG_SELECTOR: &str = "style[data-row-colorizer]";

pub const TOOLTIP_CLASS: &str = "row-colorizer-tooltip";
pub const TOOLTIP_SELECTOR: &str = ".row-colorizer-tooltip";

/// Tooltip look. Only opacity and transform animate so that visibility flips
/// at once when the script hides the element.
pub const DEFAULT_STYLES: &str = r#"
.row-colorizer-tooltip {
  position: fixed;
  left: 0;
  top: 0;
  z-index: 10000;
  max-width: 320px;
  padding: 8px 12px;
  border-radius: 6px;
  background: rgba(24, 32, 44, 0.94);
  color: #ffffff;
  font: 13px/1.4 system-ui, -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
  white-space: pre-wrap;
  word-break: break-word;
  box-shadow: 0 6px 18px rgba(15, 23, 42, 0.25);
  pointer-events: none;
  opacity: 0;
  visibility: hidden;
  transform: translateY(4px);
  transition: opacity 300ms ease, transform 300ms ease;
}
"#;

pub fn ensure_styles(document: &Document) -> Result<(), JsValue> {
    if document.query_selector(STYLE_TAG_SELECTOR)?.is_some() {
        return Ok(());
    }

    let head = document
        .head()
        .ok_or_else(|| JsValue::from_str("document has no <head>"))?;

    let style_el = document.create_element("style")?;
    style_el.set_attribute("data-row-colorizer", "v1")?;
    style_el.set_text_content(Some(DEFAULT_STYLES));
    head.append_child(&style_el.clone().dyn_into::<Node>()?)?;

    Ok(())
}
