//! What the controller needs from the environment it runs in

use serde::{Deserialize, Serialize};

use crate::dom::{Document, Range};

/// Viewport-relative box, as reported by the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
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

/// Capabilities provided by the embedding page
///
/// Geometry, the live selection and user-facing side effects all come from
/// here so that the controller itself stays deterministic.
pub trait Host {
    /// The current selection, if any, as a range over `doc`
    fn selection(&self, doc: &Document) -> Option<Range>;

    /// Bounding box of the current selection
    fn selection_rect(&self) -> Option<Rect>;

    fn scroll_offset(&self) -> (f64, f64);

    fn clear_selection(&mut self);

    /// Open `url` in a new tab
    fn open_tab(&mut self, url: &str);

    fn write_clipboard(&mut self, text: &str);

    /// Ask the user to confirm a destructive action
    fn confirm(&mut self, prompt: &str) -> bool;

    /// Show a transient notice
    fn notify(&mut self, message: &str);
}

/// Cross-context messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Message {
    #[serde(rename = "highlight-selection")]
    HighlightSelection,

    #[serde(rename = "reloadHighlights")]
    ReloadHighlights,

    #[serde(rename = "openTab")]
    OpenTab { url: String },
}

/// Reply to a [`Message`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
}

impl Response {
    pub fn ok() -> Self {
        Self { success: true }
    }

    pub fn failed() -> Self {
        Self { success: false }
    }
}
