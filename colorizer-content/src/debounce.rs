#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;

/// Runs `callback` once calls stop arriving for `delay_ms`.
pub struct Debouncer {
    delay_ms: u32,
    callback: Rc<dyn Fn()>,
    pending: RefCell<Option<Timeout>>,
}

impl Debouncer {
    pub fn new(delay_ms: u32, callback: impl Fn() + 'static) -> Self {
        Self {
            delay_ms,
            callback: Rc::new(callback),
            pending: RefCell::new(None),
        }
    }

    /// Restart the quiet window.
    pub fn call(&self) {
        let callback = Rc::clone(&self.callback);
        // The replaced timeout is dropped, which clears it.
        self.pending
            .replace(Some(Timeout::new(self.delay_ms, move || callback())));
    }
}
