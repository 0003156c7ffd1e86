#![cfg(target_arch = "wasm32")]

//! Finds the list view and turns DOM churn into debounced annotation passes.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use colorizer_core::{ChangeWatcher, ColorizerConfig, WatchAction};
use gloo_timers::callback::Timeout;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, MutationObserver, MutationObserverInit, MutationRecord, Node};

use crate::debounce::Debouncer;
use crate::dom;

type MutationCallback = Closure<dyn FnMut(js_sys::Array, MutationObserver)>;

pub struct DomWatcher {
    document: Document,
    target_selector: String,
    grid_selector: String,
    state: RefCell<ChangeWatcher>,
    debounce: Debouncer,
    on_change: Rc<dyn Fn()>,
    poll: RefCell<Option<Timeout>>,
    startup: RefCell<Option<Timeout>>,
    observer: RefCell<Option<(MutationObserver, MutationCallback)>>,
    this: Weak<DomWatcher>,
}

impl DomWatcher {
    pub fn new(
        document: Document,
        config: &ColorizerConfig,
        on_change: impl Fn() + 'static,
    ) -> Rc<Self> {
        let on_change: Rc<dyn Fn()> = Rc::new(on_change);
        let debounced = Rc::clone(&on_change);

        Rc::new_cyclic(|this| Self {
            document,
            target_selector: config.target_selector.clone(),
            grid_selector: config.grid_selector.clone(),
            state: RefCell::new(ChangeWatcher::from_config(config)),
            debounce: Debouncer::new(config.debounce_ms, move || debounced()),
            on_change,
            poll: RefCell::new(None),
            startup: RefCell::new(None),
            observer: RefCell::new(None),
            this: this.clone(),
        })
    }

    pub fn start(&self) {
        self.look_for_target();
    }

    fn look_for_target(&self) {
        let target = match self.document.query_selector(&self.target_selector) {
            Ok(target) => target,
            Err(err) => {
                log::warn!("invalid target selector {:?}: {err:?}", self.target_selector);
                None
            }
        };

        let action = self.state.borrow_mut().target_lookup(target.is_some());
        match action {
            WatchAction::PollAgain { after_ms } => {
                log::debug!("list view not mounted yet, retrying in {after_ms}ms");
                let this = self.this.clone();
                self.poll.replace(Some(Timeout::new(after_ms, move || {
                    if let Some(watcher) = this.upgrade() {
                        watcher.look_for_target();
                    }
                })));
            }
            WatchAction::AttachTarget {
                initial_pass_after_ms,
            } => {
                if let Some(target) = target {
                    log::info!("list view found, observing {:?}", self.target_selector);
                    self.attach(&target, initial_pass_after_ms);
                }
            }
            WatchAction::AttachFallback {
                initial_pass_after_ms,
            } => {
                log::warn!(
                    "{:?} never appeared, observing <body> instead",
                    self.target_selector
                );
                match self.document.body() {
                    Some(body) => self.attach(&body, initial_pass_after_ms),
                    None => log::error!("document has no <body> to observe"),
                }
            }
            WatchAction::Debounce | WatchAction::Ignore => {}
        }
    }

    fn attach(&self, target: &Node, initial_pass_after_ms: u32) {
        if let Err(err) = self.observe(target) {
            log::error!("failed to observe list view: {err:?}");
        }

        let on_change = Rc::clone(&self.on_change);
        self.startup.replace(Some(Timeout::new(initial_pass_after_ms, move || {
            on_change()
        })));
    }

    fn observe(&self, target: &Node) -> Result<(), JsValue> {
        let this = self.this.clone();
        let callback = MutationCallback::new(move |records: js_sys::Array, _: MutationObserver| {
            if let Some(watcher) = this.upgrade() {
                watcher.mutated(&records);
            }
        });

        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        observer.observe_with_options(target, &init)?;

        self.observer.replace(Some((observer, callback)));
        Ok(())
    }

    fn mutated(&self, records: &js_sys::Array) {
        let records: Vec<MutationRecord> = records
            .iter()
            .filter_map(|record| record.dyn_into::<MutationRecord>().ok())
            .filter(|record| !dom::is_colorizer_record(record))
            .collect();
        // Tooltip updates alone must not cost an idle retry or a pass.
        if records.is_empty() {
            return;
        }

        let relevant = records.iter().any(|record| {
            let added = record.added_nodes();
            (0..added.length())
                .filter_map(|idx| added.item(idx))
                .any(|node| dom::touches_grid(&node, &self.grid_selector))
        });

        let action = self.state.borrow_mut().mutations(relevant);
        if action == WatchAction::Debounce {
            self.debounce.call();
        }
    }
}
