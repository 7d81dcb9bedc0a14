//! Page routes
//!
//! Clients post a page's markup and get it back with highlights applied.
//! Markup is sanitised before parsing; node paths in a selection address
//! the sanitised document, which is what `/restore` returns.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::dom::{parse, serialize_children, Document, PointSpec, Range};
use crate::error::{AppError, Result};
use crate::highlight::{anchor, normalize_color, split, HighlightRecord, RestoreReport};
use crate::html::sanitize_html;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/restore", post(restore_page))
        .route("/highlight", post(highlight_page))
}

#[derive(Debug, Deserialize)]
pub struct RestoreRequest {
    pub url: String,
    pub html: String,
}

#[derive(Serialize)]
pub struct RestoreResponse {
    pub html: String,
    pub report: RestoreReport,
}

#[derive(Debug, Deserialize)]
pub struct SelectionSpec {
    pub start: PointSpec,
    pub end: PointSpec,
}

#[derive(Debug, Deserialize)]
pub struct HighlightRequest {
    pub url: String,
    pub html: String,
    pub selection: SelectionSpec,
    /// Overrides the default colour
    pub color: Option<String>,
}

#[derive(Serialize)]
pub struct HighlightResponse {
    pub html: String,
    pub record: HighlightRecord,
    pub fragments: usize,
}

fn load_page(html: &str) -> Result<Document> {
    let clean = sanitize_html(html)?;
    Ok(parse(&clean)?)
}

/// Re-anchor the page's stored highlights
async fn restore_page(
    State(state): State<AppState>,
    Json(req): Json<RestoreRequest>,
) -> Result<Json<RestoreResponse>> {
    let mut doc = load_page(&req.html)?;
    let records = state.store().list_for_url(&req.url).await?;
    let color = state.default_color().await?;

    let report = anchor::restore(&mut doc, &records, &color);
    tracing::debug!(url = %req.url, records = records.len(), restored = report.restored, "Restored page");

    Ok(Json(RestoreResponse {
        html: serialize_children(&doc, doc.root()),
        report,
    }))
}

/// Highlight a selection and save the record
async fn highlight_page(
    State(state): State<AppState>,
    Json(req): Json<HighlightRequest>,
) -> Result<Json<HighlightResponse>> {
    let mut doc = load_page(&req.html)?;
    let range = Range::new(
        &doc,
        req.selection.start.resolve(&doc)?,
        req.selection.end.resolve(&doc)?,
    )?;

    let text = range.to_text(&doc);
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("Selection is empty".to_string()));
    }

    let color = match req.color.as_deref() {
        Some(color) => normalize_color(color),
        None => state.default_color().await?,
    };
    let record = HighlightRecord::new(text, color.clone(), req.url);

    let fragments = split(&mut doc, range, &record.id, &color)?;
    if fragments.is_empty() {
        return Err(AppError::BadRequest(
            "Selection is already highlighted".to_string(),
        ));
    }
    state.store().append(&record).await?;
    tracing::info!(id = %record.id, url = %record.url, fragments = fragments.len(), "Created highlight");

    Ok(Json(HighlightResponse {
        html: serialize_children(&doc, doc.root()),
        record,
        fragments: fragments.len(),
    }))
}
