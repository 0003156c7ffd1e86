//! Content script that colors list-view rows and shows account notes on hover.
//!
//! The loader calls [`start`] once the module is instantiated. After that the
//! page can force a pass through [`apply_coloring`], which is also exposed on
//! `window` under the configured trigger name.

mod config;

#[cfg(target_arch = "wasm32")]
mod annotator;
#[cfg(target_arch = "wasm32")]
mod debounce;
#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod engine;
#[cfg(target_arch = "wasm32")]
mod styles;
#[cfg(target_arch = "wasm32")]
mod tooltip;
#[cfg(target_arch = "wasm32")]
mod watcher;

pub use config::JsColorizerConfig;

#[cfg(all(test, target_arch = "wasm32"))]
wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

#[cfg(target_arch = "wasm32")]
mod wasm_content {
    use std::cell::RefCell;
    use std::rc::Rc;

    use colorizer_core::ColorizerConfig;
    use serde_wasm_bindgen::from_value;
    use wasm_bindgen::prelude::*;
    use web_sys::Window;

    use crate::config::JsColorizerConfig;
    use crate::engine::Engine;
    use crate::watcher::DomWatcher;

    // Both live for the rest of the page: rows keep listeners that point
    // into the engine.
    struct Running {
        engine: Rc<Engine>,
        _watcher: Rc<DomWatcher>,
    }

    thread_local! {
        static RUNNING: RefCell<Option<Running>> = const { RefCell::new(None) };
    }

    fn init_runtime() {
        console_error_panic_hook::set_once();
        // Already initialised when the popup bridge shares the page.
        let _ = console_log::init_with_level(log::Level::Info);
    }

    fn read_config(config: Option<JsValue>) -> Result<ColorizerConfig, JsValue> {
        match config {
            Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
                let cfg: JsColorizerConfig = from_value(js_cfg)
                    .map_err(|err| JsValue::from_str(&format!("Cannot read config: {err}")))?;
                Ok(ColorizerConfig::from(cfg))
            }
            _ => Ok(ColorizerConfig::default()),
        }
    }

    /// Begin watching the page. Later calls are ignored.
    #[wasm_bindgen]
    pub fn start(config: Option<JsValue>) -> Result<(), JsValue> {
        init_runtime();
        if RUNNING.with(|running| running.borrow().is_some()) {
            log::warn!("row colorizer already started");
            return Ok(());
        }
        let config = read_config(config)?;

        let window: Window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let engine = Engine::new(document.clone(), config.clone());
        let watcher = {
            let engine = Rc::clone(&engine);
            DomWatcher::new(document, &config, move || engine.request_pass())
        };
        register_trigger(&window, &config.trigger_name)?;

        RUNNING.with(|running| {
            *running.borrow_mut() = Some(Running {
                engine,
                _watcher: Rc::clone(&watcher),
            });
        });
        watcher.start();

        log::info!("row colorizer started");
        Ok(())
    }

    /// Run an annotation pass now, outside the debounce cycle.
    #[wasm_bindgen]
    pub fn apply_coloring() -> Result<(), JsValue> {
        let engine = RUNNING
            .with(|running| running.borrow().as_ref().map(|r| Rc::clone(&r.engine)))
            .ok_or_else(|| JsValue::from_str("row colorizer is not started"))?;
        engine.request_pass();
        Ok(())
    }

    fn register_trigger(window: &Window, name: &str) -> Result<(), JsValue> {
        let trigger = Closure::<dyn Fn()>::new(|| {
            if let Err(err) = apply_coloring() {
                log::error!("manual coloring failed: {err:?}");
            }
        });
        js_sys::Reflect::set(window, &JsValue::from_str(name), trigger.as_ref())?;
        // The page keeps a reference for as long as it lives.
        trigger.forget();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_content::{apply_coloring, start};

#[cfg(not(target_arch = "wasm32"))]
pub fn start(_: Option<wasm_bindgen::JsValue>) -> Result<(), wasm_bindgen::JsValue> {
    Err(wasm_bindgen::JsValue::from_str(
        "colorizer-content only supports the wasm32 target",
    ))
}

#[cfg(not(target_arch = "wasm32"))]
pub fn apply_coloring() -> Result<(), wasm_bindgen::JsValue> {
    Err(wasm_bindgen::JsValue::from_str(
        "colorizer-content only supports the wasm32 target",
    ))
}
