#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Local;
use colorizer_core::{ColorizerConfig, PassGate};
use wasm_bindgen_futures::spawn_local;
use web_sys::Document;

use crate::annotator;
use crate::tooltip::{HoverHandlers, TooltipController};

/// Ties the rule store, the annotator and the tooltip together.
pub struct Engine {
    document: Document,
    config: ColorizerConfig,
    tooltip: Rc<RefCell<TooltipController>>,
    hover: HoverHandlers,
    gate: RefCell<PassGate>,
}

impl Engine {
    pub fn new(document: Document, config: ColorizerConfig) -> Rc<Self> {
        let tooltip = TooltipController::new(document.clone(), &config);
        let hover = HoverHandlers::new(&tooltip);
        Rc::new(Self {
            document,
            config,
            tooltip,
            hover,
            gate: RefCell::new(PassGate::default()),
        })
    }

    /// Start an annotation pass, or queue one behind the pass in flight.
    pub fn request_pass(self: &Rc<Self>) {
        if !self.gate.borrow_mut().try_begin() {
            log::debug!("annotation pass in flight, queued a re-run");
            return;
        }

        let engine = Rc::clone(self);
        spawn_local(async move {
            engine.run_passes().await;
        });
    }

    async fn run_passes(&self) {
        loop {
            // Re-read every time: the popup may have edited rules since the last pass.
            let rules = colorizer_storage::chrome::load_rules().await;
            log::debug!("annotating with {} account rules", rules.len());

            let summary = annotator::annotate(
                &self.document,
                &rules,
                &self.config,
                &self.hover,
                Local::now(),
            );
            log::info!("coloring applied: {summary}");
            {
                let mut tooltip = self.tooltip.borrow_mut();
                tooltip.set_rules(rules);
                tooltip.release_detached_row();
            }

            if !self.gate.borrow_mut().finish() {
                break;
            }
        }
    }
}
