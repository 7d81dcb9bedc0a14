//! Per-page interaction state
//!
//! Everything the controller remembers between gestures lives here: the
//! active colour, which floating surface is up and where, what the pointer
//! is hovering, and the pending timers. Timers are plain deadlines; the
//! controller fires them from `poll`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::dom::NodeId;
use crate::highlight::color::{palette_color, PALETTE};

use super::host::Rect;

/// Horizontal offset of the highlight popup from the selection centre
const POPUP_OFFSET_X: f64 = 32.0;
/// Vertical offset of the highlight popup above the selection
const POPUP_OFFSET_Y: f64 = 44.0;
/// Horizontal offset of the options surface from the fragment centre
const OPTIONS_OFFSET_X: f64 = 70.0;
/// Overlap of the options surface with the fragment's bottom edge
const OPTIONS_OFFSET_Y: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UiState {
    Idle,
    /// Pointer released, waiting for the selection to settle
    Selecting,
    /// Highlight popup shown next to a selection
    PopupShown,
    /// Options surface shown for a hovered fragment
    OptionsShown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timer {
    SelectionSettle,
    ShowOptions,
    HideOptions,
    Restore,
}

/// Delays used by the controller
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    pub selection_settle: Duration,
    pub hover_show: Duration,
    pub hide_after_fragment: Duration,
    pub hide_after_options: Duration,
    pub restore_debounce: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            selection_settle: Duration::from_millis(10),
            hover_show: Duration::from_millis(150),
            hide_after_fragment: Duration::from_millis(400),
            hide_after_options: Duration::from_millis(300),
            restore_debounce: Duration::from_millis(100),
        }
    }
}

/// Absolute page position of a floating surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub left: f64,
    pub top: f64,
}

/// Where the highlight popup goes for a selection box
pub fn popup_position(rect: Rect, scroll: (f64, f64)) -> Position {
    Position {
        left: rect.left + scroll.0 + rect.width / 2.0 - POPUP_OFFSET_X,
        top: rect.top + scroll.1 - POPUP_OFFSET_Y,
    }
}

/// Where the options surface goes for a hovered fragment
pub fn options_position(rect: Rect, scroll: (f64, f64)) -> Position {
    Position {
        left: rect.left + scroll.0 + rect.width / 2.0 - OPTIONS_OFFSET_X,
        top: rect.bottom() + scroll.1 - OPTIONS_OFFSET_Y,
    }
}

/// A fragment the pointer is over
#[derive(Debug, Clone, PartialEq)]
pub struct Hover {
    pub highlight_id: String,
    pub fragment: NodeId,
    pub rect: Rect,
}

#[derive(Debug)]
pub struct Session {
    color_index: usize,
    state: UiState,
    popup: Option<Position>,
    options: Option<Position>,
    hovered: Option<Hover>,
    pending_hover: Option<Hover>,
    deadlines: HashMap<Timer, Instant>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            color_index: 0,
            state: UiState::Idle,
            popup: None,
            options: None,
            hovered: None,
            pending_hover: None,
            deadlines: HashMap::new(),
        }
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    pub fn color_index(&self) -> usize {
        self.color_index
    }

    /// Canonical form of the active colour
    pub fn active_color(&self) -> String {
        palette_color(self.color_index)
    }

    pub fn set_color_index(&mut self, index: usize) {
        self.color_index = index % PALETTE.len();
    }

    /// Advance to the next palette colour and return its index
    pub fn cycle_color(&mut self) -> usize {
        self.set_color_index(self.color_index + 1);
        self.color_index
    }

    pub fn popup(&self) -> Option<Position> {
        self.popup
    }

    pub fn options(&self) -> Option<Position> {
        self.options
    }

    pub fn hovered(&self) -> Option<&Hover> {
        self.hovered.as_ref()
    }

    pub(crate) fn begin_selecting(&mut self) {
        self.state = UiState::Selecting;
    }

    pub(crate) fn show_popup(&mut self, at: Position) {
        self.popup = Some(at);
        self.state = UiState::PopupShown;
    }

    pub(crate) fn hide_popup(&mut self) {
        self.popup = None;
        if self.state != UiState::OptionsShown {
            self.state = UiState::Idle;
        }
    }

    pub(crate) fn set_pending_hover(&mut self, hover: Hover) {
        self.pending_hover = Some(hover);
    }

    pub(crate) fn take_pending_hover(&mut self) -> Option<Hover> {
        self.pending_hover.take()
    }

    pub(crate) fn show_options(&mut self, hover: Hover, at: Position) {
        self.hovered = Some(hover);
        self.options = Some(at);
        self.state = UiState::OptionsShown;
    }

    pub(crate) fn hide_options(&mut self) {
        self.options = None;
        self.hovered = None;
        self.pending_hover = None;
        self.cancel(Timer::ShowOptions);
        self.cancel(Timer::HideOptions);
        self.state = if self.popup.is_some() {
            UiState::PopupShown
        } else {
            UiState::Idle
        };
    }

    /// Back to idle with nothing shown
    pub(crate) fn dismiss(&mut self) {
        self.popup = None;
        self.hide_options();
        self.state = UiState::Idle;
    }

    /// Arm (or re-arm) a timer
    pub fn schedule(&mut self, timer: Timer, at: Instant) {
        self.deadlines.insert(timer, at);
    }

    pub fn cancel(&mut self, timer: Timer) {
        self.deadlines.remove(&timer);
    }

    pub fn deadline(&self, timer: Timer) -> Option<Instant> {
        self.deadlines.get(&timer).copied()
    }

    /// Earliest pending deadline, for hosts that sleep until the next poll
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Remove and return the timers due at `now`, earliest first
    pub(crate) fn take_due(&mut self, now: Instant) -> Vec<Timer> {
        let mut due: Vec<(Timer, Instant)> = self
            .deadlines
            .iter()
            .filter(|&(_, at)| *at <= now)
            .map(|(&timer, &at)| (timer, at))
            .collect();
        due.sort_by_key(|&(_, at)| at);

        for (timer, _) in &due {
            self.deadlines.remove(timer);
        }
        due.into_iter().map(|(timer, _)| timer).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> Rect {
        Rect {
            left: 100.0,
            top: 200.0,
            width: 80.0,
            height: 20.0,
        }
    }

    #[test]
    fn test_popup_position() {
        let at = popup_position(rect(), (0.0, 50.0));
        assert_eq!(at, Position { left: 108.0, top: 206.0 });
    }

    #[test]
    fn test_options_position() {
        let at = options_position(rect(), (10.0, 0.0));
        assert_eq!(at, Position { left: 80.0, top: 216.0 });
    }

    #[test]
    fn test_cycle_color_wraps() {
        let mut session = Session::new();
        session.set_color_index(PALETTE.len() - 1);

        assert_eq!(session.cycle_color(), 0);
        assert_eq!(session.active_color(), "rgba(135, 206, 235, 0.5)");
    }

    #[test]
    fn test_take_due_orders_and_removes() {
        let mut session = Session::new();
        let now = Instant::now();
        session.schedule(Timer::Restore, now + Duration::from_millis(5));
        session.schedule(Timer::SelectionSettle, now + Duration::from_millis(1));
        session.schedule(Timer::HideOptions, now + Duration::from_millis(50));

        let due = session.take_due(now + Duration::from_millis(10));

        assert_eq!(due, vec![Timer::SelectionSettle, Timer::Restore]);
        assert_eq!(session.next_deadline(), Some(now + Duration::from_millis(50)));
    }

    #[test]
    fn test_reschedule_replaces_deadline() {
        let mut session = Session::new();
        let now = Instant::now();
        session.schedule(Timer::Restore, now);
        session.schedule(Timer::Restore, now + Duration::from_millis(100));

        assert!(session.take_due(now + Duration::from_millis(10)).is_empty());
        assert_eq!(session.deadline(Timer::Restore), Some(now + Duration::from_millis(100)));
    }
}
