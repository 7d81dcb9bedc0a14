//! Interaction controller
//!
//! Drives one page: turns gestures into highlights, shows the floating
//! popup and options surface, and keeps the page in step with the store.
//! All state is held in a [`Session`]; the environment is reached only
//! through [`Host`]. Time is passed in by the caller and timers fire from
//! [`Controller::poll`].

mod host;
mod session;

use std::iter;
use std::time::Instant;

use tokio::task::JoinHandle;

pub use host::{Host, Message, Rect, Response};
pub use session::{options_position, popup_position, Hover, Position, Session, Timer, Timings, UiState};

use crate::dom::{Document, DomError, NodeId};
use crate::highlight::color::{normalize_color, palette_color, palette_index};
use crate::highlight::fragment::{fragment_id, is_fragment, recolor, remove_all_fragments, remove_fragments};
use crate::highlight::{anchor, split, HighlightRecord, RestoreReport};
use crate::store::{HighlightStore, StoreError};

/// Post intent endpoint used when sharing a highlight
const SHARE_INTENT_URL: &str = "https://x.com/intent/post?text=";

const CONFIRM_DELETE: &str = "Delete this highlight?";
const CONFIRM_CLEAR_ALL: &str = "Are you sure you want to delete all highlights? This cannot be undone.";

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Where a pointer-down landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Page,
    Popup,
    Options,
}

/// The page being decorated
#[derive(Debug)]
pub struct Page {
    pub url: String,
    pub document: Document,
}

impl Page {
    pub fn new(url: impl Into<String>, document: Document) -> Self {
        Self {
            url: url.into(),
            document,
        }
    }
}

/// Share link for a piece of highlighted text
pub fn share_url(text: &str) -> String {
    let quoted = format!("\"{}\"", text);
    format!("{}{}", SHARE_INTENT_URL, urlencoding::encode(&quoted))
}

pub struct Controller<H> {
    page: Page,
    store: HighlightStore,
    host: H,
    session: Session,
    timings: Timings,
    pending_saves: Vec<JoinHandle<()>>,
}

impl<H: Host> Controller<H> {
    pub fn new(page: Page, store: HighlightStore, host: H) -> Self {
        Self::with_timings(page, store, host, Timings::default())
    }

    pub fn with_timings(page: Page, store: HighlightStore, host: H, timings: Timings) -> Self {
        Self {
            page,
            store,
            host,
            session: Session::new(),
            timings,
            pending_saves: Vec::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn document(&self) -> &Document {
        &self.page.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.page.document
    }

    pub fn url(&self) -> &str {
        &self.page.url
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_page(self) -> Page {
        self.page
    }

    /// Load the saved default colour and restore this page's highlights
    pub async fn init(&mut self) -> Result<RestoreReport, ControllerError> {
        if let Some(index) = self
            .store
            .default_color()
            .await?
            .as_deref()
            .and_then(palette_index)
        {
            self.session.set_color_index(index);
        }
        self.restore().await
    }

    // Gestures

    /// Pointer released; the selection is measured once it settles
    pub fn pointer_up(&mut self, now: Instant) {
        self.session.begin_selecting();
        self.session
            .schedule(Timer::SelectionSettle, now + self.timings.selection_settle);
    }

    /// Pointer pressed; anywhere outside the floating surfaces dismisses them
    pub fn pointer_down(&mut self, target: PointerTarget) {
        if target == PointerTarget::Page {
            self.session.dismiss();
        }
    }

    /// Keyboard shortcut; returns whether the key was consumed
    pub fn key_down(&mut self, key: &str, ctrl: bool) -> bool {
        if ctrl && key.eq_ignore_ascii_case("h") {
            self.highlight_selection();
            return true;
        }
        false
    }

    /// Pointer entered `node` or something inside it
    pub fn pointer_enter_fragment(&mut self, node: NodeId, rect: Rect, now: Instant) {
        let doc = &self.page.document;
        let Some(fragment) = iter::once(node)
            .chain(doc.ancestors(node))
            .find(|&n| is_fragment(doc, n))
        else {
            return;
        };
        let Some(highlight_id) = fragment_id(doc, fragment).map(str::to_string) else {
            return;
        };

        self.session.cancel(Timer::HideOptions);
        if self.session.hovered().map(|h| h.fragment) == Some(fragment) {
            return;
        }

        self.session.set_pending_hover(Hover {
            highlight_id,
            fragment,
            rect,
        });
        self.session
            .schedule(Timer::ShowOptions, now + self.timings.hover_show);
    }

    pub fn pointer_leave_fragment(&mut self, now: Instant) {
        self.session.cancel(Timer::ShowOptions);
        self.session.take_pending_hover();
        if self.session.options().is_some() {
            self.session
                .schedule(Timer::HideOptions, now + self.timings.hide_after_fragment);
        }
    }

    pub fn pointer_enter_options(&mut self) {
        self.session.cancel(Timer::HideOptions);
    }

    pub fn pointer_leave_options(&mut self, now: Instant) {
        if self.session.options().is_some() {
            self.session
                .schedule(Timer::HideOptions, now + self.timings.hide_after_options);
        }
    }

    /// New content appeared on the page; restoration is debounced
    pub fn nodes_inserted(&mut self, now: Instant) {
        self.session
            .schedule(Timer::Restore, now + self.timings.restore_debounce);
    }

    /// Fire every timer due at `now`
    pub async fn poll(&mut self, now: Instant) -> Result<(), ControllerError> {
        for timer in self.session.take_due(now) {
            match timer {
                Timer::SelectionSettle => self.selection_settled(),
                Timer::ShowOptions => self.show_pending_options(),
                Timer::HideOptions => self.session.hide_options(),
                Timer::Restore => {
                    self.restore().await?;
                }
            }
        }
        Ok(())
    }

    fn selection_settled(&mut self) {
        let text = self
            .host
            .selection(&self.page.document)
            .map(|range| range.to_text(&self.page.document))
            .unwrap_or_default();

        match self.host.selection_rect() {
            Some(rect) if !text.trim().is_empty() => {
                let at = popup_position(rect, self.host.scroll_offset());
                self.session.show_popup(at);
            }
            _ => self.session.hide_popup(),
        }
    }

    fn show_pending_options(&mut self) {
        if let Some(hover) = self.session.take_pending_hover() {
            let at = options_position(hover.rect, self.host.scroll_offset());
            self.session.show_options(hover, at);
        }
    }

    // Actions

    /// Highlight the current selection with the active colour
    ///
    /// The page is updated before this returns; the record is saved in the
    /// background and a failed save is only logged. Returns the new
    /// highlight id, or `None` when there was nothing to highlight.
    /// Must be called from within a Tokio runtime.
    pub fn highlight_selection(&mut self) -> Option<String> {
        let range = self.host.selection(&self.page.document)?;
        let text = range.to_text(&self.page.document);
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let color = self.session.active_color();
        let record = HighlightRecord::new(text, color.clone(), self.page.url.clone());

        let fragments = match split(&mut self.page.document, range, &record.id, &color) {
            Ok(fragments) => fragments,
            Err(e) => {
                tracing::debug!("Selection not highlighted: {}", e);
                return None;
            }
        };

        self.host.clear_selection();
        self.session.hide_popup();

        if fragments.is_empty() {
            tracing::debug!("Selection is already highlighted");
            return None;
        }
        tracing::debug!(id = %record.id, fragments = fragments.len(), "Created highlight");

        let id = record.id.clone();
        self.spawn_save(record);
        Some(id)
    }

    fn spawn_save(&mut self, record: HighlightRecord) {
        self.pending_saves.retain(|handle| !handle.is_finished());

        let store = self.store.clone();
        self.pending_saves.push(tokio::spawn(async move {
            if let Err(e) = store.append(&record).await {
                tracing::warn!(id = %record.id, "Failed to save highlight: {}", e);
            }
        }));
    }

    /// Wait for background saves to finish
    pub async fn flush(&mut self) {
        for handle in self.pending_saves.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!("Highlight save task failed: {}", e);
            }
        }
    }

    /// Advance the active colour and remember it as the default
    pub async fn cycle_color(&mut self) -> Result<String, ControllerError> {
        let index = self.session.cycle_color();
        let color = self.store.set_default_color(&palette_color(index)).await?;
        Ok(color)
    }

    /// Recolour the hovered highlight, on the page and in the store
    pub async fn change_color(&mut self, color: &str) -> Result<bool, ControllerError> {
        let Some(id) = self.hovered_id() else {
            return Ok(false);
        };
        let color = normalize_color(color);

        recolor(&mut self.page.document, &id, &color);
        self.store.update_color(&id, &color).await?;
        Ok(true)
    }

    /// Copy the hovered fragment's text
    pub fn copy_highlight(&mut self) -> bool {
        let Some(text) = self.hovered_text() else {
            return false;
        };
        self.host.write_clipboard(&text);
        self.session.hide_options();
        true
    }

    /// Open a post intent quoting the hovered fragment's text
    pub fn share_highlight(&mut self) -> bool {
        let Some(text) = self.hovered_text() else {
            return false;
        };
        self.host.open_tab(&share_url(&text));
        self.session.hide_options();
        true
    }

    /// Delete the hovered highlight after the user confirms
    pub async fn delete_highlight(&mut self) -> Result<bool, ControllerError> {
        let Some(id) = self.hovered_id() else {
            return Ok(false);
        };
        if !self.host.confirm(CONFIRM_DELETE) {
            return Ok(false);
        }

        let removed = remove_fragments(&mut self.page.document, &id)?;
        self.store.remove(&id).await?;
        self.session.hide_options();

        tracing::debug!(%id, fragments = removed, "Deleted highlight");
        Ok(true)
    }

    /// Restore this page's records that are not already shown
    pub async fn restore(&mut self) -> Result<RestoreReport, ControllerError> {
        let records = self.store.list_for_url(&self.page.url).await?;
        let color = self.session.active_color();
        Ok(anchor::restore(&mut self.page.document, &records, &color))
    }

    /// Drop every fragment and restore from the store
    pub async fn reload(&mut self) -> Result<RestoreReport, ControllerError> {
        let records = self.store.list_for_url(&self.page.url).await?;
        let color = self.session.active_color();
        self.session.hide_options();
        Ok(anchor::reload(&mut self.page.document, &records, &color)?)
    }

    /// Delete every stored highlight after the user confirms
    pub async fn clear_all(&mut self) -> Result<bool, ControllerError> {
        if !self.host.confirm(CONFIRM_CLEAR_ALL) {
            return Ok(false);
        }
        self.store.clear_all().await?;
        remove_all_fragments(&mut self.page.document)?;
        self.session.hide_options();
        self.host.notify("All highlights cleared");
        Ok(true)
    }

    /// Copy the full record list to the clipboard
    pub async fn export_highlights(&mut self) -> Result<String, ControllerError> {
        let json = self.store.export_json().await?;
        self.host.write_clipboard(&json);
        self.host.notify("Highlights copied to clipboard");
        Ok(json)
    }

    /// Merge pasted export data; invalid data is reported to the user and
    /// changes nothing
    pub async fn import_highlights(&mut self, payload: &str) -> Result<Option<usize>, ControllerError> {
        match self.store.import_json(payload).await {
            Ok(added) => {
                self.host.notify(&format!("Imported {} new highlights", added));
                self.restore().await?;
                Ok(Some(added))
            }
            Err(StoreError::InvalidData(reason)) => {
                tracing::debug!("Rejected import: {}", reason);
                self.host.notify("Invalid data");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Handle a message from another context
    pub async fn handle_message(&mut self, message: Message) -> Response {
        match message {
            Message::HighlightSelection => {
                if self.highlight_selection().is_some() {
                    Response::ok()
                } else {
                    Response::failed()
                }
            }
            Message::ReloadHighlights => match self.reload().await {
                Ok(_) => Response::ok(),
                Err(e) => {
                    tracing::warn!("Reload failed: {}", e);
                    Response::failed()
                }
            },
            Message::OpenTab { url } => {
                self.host.open_tab(&url);
                Response::ok()
            }
        }
    }

    fn hovered_id(&self) -> Option<String> {
        self.session.hovered().map(|h| h.highlight_id.clone())
    }

    fn hovered_text(&self) -> Option<String> {
        let hover = self.session.hovered()?;
        Some(self.page.document.text_content(hover.fragment).trim().to_string())
    }
}
