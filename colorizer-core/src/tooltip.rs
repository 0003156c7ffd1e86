//! Hover tooltip bookkeeping.
//!
//! [`TooltipState`] owns the hovered row and knows which timers are live. It
//! never touches the page: each event returns the [`TooltipCommand`]s the
//! caller must carry out, in order.

use crate::ColorizerConfig;

/// Minimum distance between the tooltip and the viewport edges.
pub const EDGE_MARGIN_PX: f64 = 5.0;
/// Gap between the tooltip and the row it annotates.
pub const ROW_GAP_PX: f64 = 10.0;
/// Delay between laying out the tooltip and starting its fade-in.
pub const SHOW_FRAME_DELAY_MS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Fade-in after the layout pass.
    Show,
    /// Grace period after the pointer leaves a row.
    Hide,
    /// End of the fade-out transition.
    Conceal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TooltipCommand<R> {
    Cancel(TimerKind),
    Schedule(TimerKind, u32),
    /// Set the note text, put the tooltip into layout and position it over `row`.
    Render { row: R, note: String },
    FadeIn,
    /// Start the fade-out: zero opacity plus a small offset.
    FadeOut,
    /// Hide after the fade-out finished.
    Conceal,
    /// Zero opacity and hide at once, without a transition.
    HideImmediately,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipPhase {
    Hidden,
    /// In layout, waiting for the fade-in timer.
    Showing,
    Visible,
    FadingOut,
}

#[derive(Debug, Clone)]
pub struct TooltipState<R> {
    hovered: Option<R>,
    phase: TooltipPhase,
    show_pending: bool,
    hide_pending: bool,
    conceal_pending: bool,
    hide_delay_ms: u32,
    fade_ms: u32,
}

impl<R: Clone + PartialEq> TooltipState<R> {
    pub fn new(hide_delay_ms: u32, fade_ms: u32) -> Self {
        Self {
            hovered: None,
            phase: TooltipPhase::Hidden,
            show_pending: false,
            hide_pending: false,
            conceal_pending: false,
            hide_delay_ms,
            fade_ms,
        }
    }

    pub fn from_config(config: &ColorizerConfig) -> Self {
        Self::new(config.tooltip_hide_delay_ms, config.tooltip_fade_ms)
    }

    pub fn hovered(&self) -> Option<&R> {
        self.hovered.as_ref()
    }

    pub fn phase(&self) -> TooltipPhase {
        self.phase
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        match kind {
            TimerKind::Show => self.show_pending,
            TimerKind::Hide => self.hide_pending,
            TimerKind::Conceal => self.conceal_pending,
        }
    }

    /// Pointer entered `row`. `note` is the note of the row's account, if any.
    pub fn enter(&mut self, row: R, note: Option<&str>) -> Vec<TooltipCommand<R>> {
        if self.hovered.as_ref() == Some(&row) {
            return Vec::new();
        }

        let mut commands = Vec::new();
        self.cancel(TimerKind::Hide, &mut commands);
        self.hovered = Some(row.clone());

        let Some(note) = note.map(str::trim).filter(|note| !note.is_empty()) else {
            self.hide_now(&mut commands);
            return commands;
        };

        self.cancel(TimerKind::Show, &mut commands);
        commands.push(TooltipCommand::Render {
            row,
            note: note.to_string(),
        });

        match self.phase {
            TooltipPhase::Visible => {}
            TooltipPhase::FadingOut => {
                self.cancel(TimerKind::Conceal, &mut commands);
                commands.push(TooltipCommand::FadeIn);
                self.phase = TooltipPhase::Visible;
            }
            TooltipPhase::Hidden | TooltipPhase::Showing => {
                self.schedule(TimerKind::Show, SHOW_FRAME_DELAY_MS, &mut commands);
                self.phase = TooltipPhase::Showing;
            }
        }

        commands
    }

    /// Pointer left the hovered row.
    pub fn leave(&mut self) -> Vec<TooltipCommand<R>> {
        let mut commands = Vec::new();
        self.hovered = None;
        self.cancel(TimerKind::Show, &mut commands);

        if matches!(self.phase, TooltipPhase::Showing | TooltipPhase::Visible) {
            self.schedule(TimerKind::Hide, self.hide_delay_ms, &mut commands);
        }
        commands
    }

    /// A timer scheduled through [`TooltipCommand::Schedule`] elapsed.
    /// Firings of timers that were cancelled in the meantime are ignored.
    pub fn timer_fired(&mut self, kind: TimerKind) -> Vec<TooltipCommand<R>> {
        if !self.is_pending(kind) {
            return Vec::new();
        }
        self.set_pending(kind, false);

        let mut commands = Vec::new();
        match kind {
            TimerKind::Show => {
                self.phase = TooltipPhase::Visible;
                commands.push(TooltipCommand::FadeIn);
            }
            TimerKind::Hide => {
                self.phase = TooltipPhase::FadingOut;
                commands.push(TooltipCommand::FadeOut);
                self.schedule(TimerKind::Conceal, self.fade_ms, &mut commands);
            }
            TimerKind::Conceal => {
                self.phase = TooltipPhase::Hidden;
                commands.push(TooltipCommand::Conceal);
            }
        }
        commands
    }

    fn hide_now(&mut self, commands: &mut Vec<TooltipCommand<R>>) {
        for kind in [TimerKind::Show, TimerKind::Hide, TimerKind::Conceal] {
            self.cancel(kind, commands);
        }
        self.phase = TooltipPhase::Hidden;
        commands.push(TooltipCommand::HideImmediately);
    }

    fn cancel(&mut self, kind: TimerKind, commands: &mut Vec<TooltipCommand<R>>) {
        if self.is_pending(kind) {
            self.set_pending(kind, false);
            commands.push(TooltipCommand::Cancel(kind));
        }
    }

    fn schedule(&mut self, kind: TimerKind, delay_ms: u32, commands: &mut Vec<TooltipCommand<R>>) {
        self.cancel(kind, commands);
        self.set_pending(kind, true);
        commands.push(TooltipCommand::Schedule(kind, delay_ms));
    }

    fn set_pending(&mut self, kind: TimerKind, pending: bool) {
        match kind {
            TimerKind::Show => self.show_pending = pending,
            TimerKind::Hide => self.hide_pending = pending,
            TimerKind::Conceal => self.conceal_pending = pending,
        }
    }
}

/// Viewport-relative rectangle, as returned by `getBoundingClientRect`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub left: f64,
    pub top: f64,
    pub below: bool,
}

/// Center the tooltip over `row`, keeping it inside the viewport. It goes
/// above the row unless that would crowd the top edge.
pub fn place_tooltip(row: Rect, tip_width: f64, tip_height: f64, viewport_width: f64) -> Placement {
    let centered = row.left + row.width / 2.0 - tip_width / 2.0;
    let max_left = (viewport_width - tip_width - EDGE_MARGIN_PX).max(EDGE_MARGIN_PX);
    let left = centered.clamp(EDGE_MARGIN_PX, max_left);

    let above = row.top - tip_height - ROW_GAP_PX;
    if above < EDGE_MARGIN_PX {
        Placement {
            left,
            top: row.bottom() + ROW_GAP_PX,
            below: true,
        }
    } else {
        Placement {
            left,
            top: above,
            below: false,
        }
    }
}
