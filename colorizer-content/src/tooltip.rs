#![cfg(target_arch = "wasm32")]

//! The floating note shown while the pointer rests on an annotated row.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use colorizer_core::{
    place_tooltip, ColorizerConfig, Rect, RuleSet, TimerKind, TooltipCommand, TooltipState,
};
use gloo_timers::callback::Timeout;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, DomRect, HtmlElement, MouseEvent};

use crate::styles::{self, TOOLTIP_CLASS};

/// `data-colorizer-account`: account key of a row that matched a rule.
pub const ACCOUNT_DATA_KEY: &str = "colorizerAccount";

const FADE_OFFSET: &str = "translateY(4px)";
const REST_OFFSET: &str = "translateY(0)";

pub struct TooltipController {
    document: Document,
    element: Option<HtmlElement>,
    state: TooltipState<HtmlElement>,
    rules: RuleSet,
    fade_ms: u32,
    show_timer: Option<Timeout>,
    hide_timer: Option<Timeout>,
    conceal_timer: Option<Timeout>,
    this: Weak<RefCell<TooltipController>>,
}

impl TooltipController {
    pub fn new(document: Document, config: &ColorizerConfig) -> Rc<RefCell<Self>> {
        Rc::new_cyclic(|this| {
            RefCell::new(Self {
                document,
                element: None,
                state: TooltipState::from_config(config),
                rules: RuleSet::default(),
                fade_ms: config.tooltip_fade_ms,
                show_timer: None,
                hide_timer: None,
                conceal_timer: None,
                this: this.clone(),
            })
        })
    }

    /// Rules read by the latest annotation pass; notes are looked up here.
    pub fn set_rules(&mut self, rules: RuleSet) {
        self.rules = rules;
    }

    pub fn row_entered(&mut self, row: HtmlElement) {
        let note = row
            .dataset()
            .get(ACCOUNT_DATA_KEY)
            .and_then(|key| self.rules.note_for(&key).map(str::to_string));
        let commands = self.state.enter(row, note.as_deref());
        self.run(commands);
    }

    pub fn row_left(&mut self) {
        let commands = self.state.leave();
        self.run(commands);
    }

    /// A re-rendered grid replaces rows without firing `mouseleave` on the
    /// old ones. Treat a hovered row that left the document as left.
    pub fn release_detached_row(&mut self) {
        let detached = self
            .state
            .hovered()
            .is_some_and(|row| !row.is_connected());
        if detached {
            log::debug!("hovered row left the document");
            self.row_left();
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> &TooltipState<HtmlElement> {
        &self.state
    }

    fn timer_fired(&mut self, kind: TimerKind) {
        let commands = self.state.timer_fired(kind);
        self.run(commands);
    }

    fn run(&mut self, commands: Vec<TooltipCommand<HtmlElement>>) {
        for command in commands {
            if let Err(err) = self.execute(command) {
                log::warn!("tooltip update failed: {err:?}");
            }
        }
    }

    fn execute(&mut self, command: TooltipCommand<HtmlElement>) -> Result<(), JsValue> {
        match command {
            TooltipCommand::Cancel(kind) => {
                // Dropping a gloo timeout clears it.
                self.timer_slot(kind).take();
            }
            TooltipCommand::Schedule(kind, delay_ms) => {
                let this = self.this.clone();
                let timeout = Timeout::new(delay_ms, move || {
                    if let Some(controller) = this.upgrade() {
                        controller.borrow_mut().timer_fired(kind);
                    }
                });
                *self.timer_slot(kind) = Some(timeout);
            }
            TooltipCommand::Render { row, note } => self.render(&row, &note)?,
            TooltipCommand::FadeIn => self.set_styles(&[("opacity", "1"), ("transform", REST_OFFSET)])?,
            TooltipCommand::FadeOut => self.set_styles(&[("opacity", "0"), ("transform", FADE_OFFSET)])?,
            TooltipCommand::Conceal => self.set_styles(&[("visibility", "hidden")])?,
            TooltipCommand::HideImmediately => self.set_styles(&[
                ("opacity", "0"),
                ("transform", FADE_OFFSET),
                ("visibility", "hidden"),
            ])?,
        }
        Ok(())
    }

    fn timer_slot(&mut self, kind: TimerKind) -> &mut Option<Timeout> {
        match kind {
            TimerKind::Show => &mut self.show_timer,
            TimerKind::Hide => &mut self.hide_timer,
            TimerKind::Conceal => &mut self.conceal_timer,
        }
    }

    fn set_styles(&self, properties: &[(&str, &str)]) -> Result<(), JsValue> {
        let Some(element) = &self.element else {
            return Ok(());
        };
        let style = element.style();
        for (name, value) in properties {
            style.set_property(name, value)?;
        }
        Ok(())
    }

    fn ensure_element(&mut self) -> Result<HtmlElement, JsValue> {
        if let Some(element) = &self.element {
            return Ok(element.clone());
        }

        styles::ensure_styles(&self.document)?;
        let body = self
            .document
            .body()
            .ok_or_else(|| JsValue::from_str("document has no <body>"))?;

        let element: HtmlElement = self.document.create_element("div")?.dyn_into()?;
        element.set_class_name(TOOLTIP_CLASS);
        element.set_attribute("role", "tooltip")?;
        element
            .style()
            .set_property("transition-duration", &format!("{}ms", self.fade_ms))?;
        body.append_child(&element)?;

        self.element = Some(element.clone());
        Ok(element)
    }

    /// Fill in the note and move the tooltip over `row`. The element joins
    /// layout before it is measured; opacity is left to the fade commands.
    fn render(&mut self, row: &HtmlElement, note: &str) -> Result<(), JsValue> {
        let element = self.ensure_element()?;
        element.set_text_content(Some(note));

        let style = element.style();
        style.set_property("left", "0px")?;
        style.set_property("top", "0px")?;
        style.set_property("visibility", "visible")?;

        let tip = element.get_bounding_client_rect();
        let viewport_width = self
            .document
            .document_element()
            .map(|root| f64::from(root.client_width()))
            .filter(|width| *width > 0.0)
            .unwrap_or_else(|| tip.width());

        let placement = place_tooltip(
            to_rect(&row.get_bounding_client_rect()),
            tip.width(),
            tip.height(),
            viewport_width,
        );
        style.set_property("left", &format!("{:.0}px", placement.left))?;
        style.set_property("top", &format!("{:.0}px", placement.top))?;
        Ok(())
    }
}

fn to_rect(rect: &DomRect) -> Rect {
    Rect {
        left: rect.left(),
        top: rect.top(),
        width: rect.width(),
        height: rect.height(),
    }
}

/// One shared `mouseenter`/`mouseleave` pair for every annotated row. Using
/// the same function objects lets a re-attach replace the previous listener.
pub struct HoverHandlers {
    enter: Closure<dyn FnMut(MouseEvent)>,
    leave: Closure<dyn FnMut(MouseEvent)>,
}

impl HoverHandlers {
    pub fn new(tooltip: &Rc<RefCell<TooltipController>>) -> Self {
        let on_enter = Rc::clone(tooltip);
        let enter = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
            let Some(row) = event
                .current_target()
                .and_then(|target| target.dyn_into::<HtmlElement>().ok())
            else {
                return;
            };
            on_enter.borrow_mut().row_entered(row);
        });

        let on_leave = Rc::clone(tooltip);
        let leave = Closure::<dyn FnMut(MouseEvent)>::new(move |_event: MouseEvent| {
            on_leave.borrow_mut().row_left();
        });

        Self { enter, leave }
    }

    /// Listen on `row`, replacing any listeners a previous pass attached.
    pub fn attach(&self, row: &HtmlElement) -> Result<(), JsValue> {
        self.detach(row)?;
        row.add_event_listener_with_callback("mouseenter", self.enter.as_ref().unchecked_ref())?;
        row.add_event_listener_with_callback("mouseleave", self.leave.as_ref().unchecked_ref())?;
        Ok(())
    }

    pub fn detach(&self, row: &HtmlElement) -> Result<(), JsValue> {
        row.remove_event_listener_with_callback("mouseenter", self.enter.as_ref().unchecked_ref())?;
        row.remove_event_listener_with_callback("mouseleave", self.leave.as_ref().unchecked_ref())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colorizer_core::{ColorRule, TooltipPhase};
    use wasm_bindgen_test::*;

    fn document() -> Document {
        web_sys::window()
            .and_then(|window| window.document())
            .expect("document")
    }

    fn keyed_row(document: &Document, key: &str) -> HtmlElement {
        let row: HtmlElement = document
            .create_element("tr")
            .expect("tr")
            .dyn_into()
            .expect("html element");
        row.dataset().set(ACCOUNT_DATA_KEY, key).expect("dataset");
        document.body().expect("body").append_child(&row).expect("append");
        row
    }

    fn controller(document: &Document) -> Rc<RefCell<TooltipController>> {
        let tooltip = TooltipController::new(document.clone(), &ColorizerConfig::default());
        tooltip.borrow_mut().set_rules(RuleSet::new(vec![ColorRule::new(
            "Acme Corp",
            "#00ff00",
            "VIP",
        )]));
        tooltip
    }

    #[wasm_bindgen_test]
    fn replaced_row_is_released() {
        let document = document();
        let tooltip = controller(&document);
        let row = keyed_row(&document, "acme corp");

        tooltip.borrow_mut().row_entered(row.clone());
        assert_eq!(tooltip.borrow().state().hovered(), Some(&row));
        assert_eq!(tooltip.borrow().state().phase(), TooltipPhase::Showing);

        tooltip.borrow_mut().release_detached_row();
        assert_eq!(tooltip.borrow().state().hovered(), Some(&row), "still on the page");

        row.remove();
        tooltip.borrow_mut().release_detached_row();
        assert_eq!(tooltip.borrow().state().hovered(), None);
        assert!(tooltip.borrow().state().is_pending(TimerKind::Hide));
    }

    #[wasm_bindgen_test]
    fn rows_without_a_note_hide_the_tooltip() {
        let document = document();
        let tooltip = controller(&document);
        let row = keyed_row(&document, "globex");

        tooltip.borrow_mut().row_entered(row.clone());
        assert_eq!(tooltip.borrow().state().phase(), TooltipPhase::Hidden);

        row.remove();
    }
}
