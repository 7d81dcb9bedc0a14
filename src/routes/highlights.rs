//! Highlights API routes

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::highlight::{normalize_color, HighlightRecord};
use crate::state::AppState;

/// Create the highlights router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_highlights).delete(clear_highlights))
        .route("/count", get(count_highlights))
        .route("/export", get(export_highlights))
        .route("/import", post(import_highlights))
        .route("/:id", patch(update_highlight).delete(delete_highlight))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Exact page url
    pub url: Option<String>,
    /// Case-insensitive text/url filter
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
}

impl ConfirmQuery {
    fn require(&self) -> Result<()> {
        if self.confirm {
            Ok(())
        } else {
            Err(AppError::BadRequest(
                "Destructive action requires confirm=true".to_string(),
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateColor {
    pub color: String,
}

#[derive(Serialize)]
pub struct CountResponse {
    pub count: usize,
}

#[derive(Serialize)]
pub struct ImportResponse {
    pub imported: usize,
}

#[derive(Serialize)]
pub struct UpdateResponse {
    pub id: String,
    pub color: String,
    pub updated: usize,
}

/// List highlights, optionally for one page and/or matching a query
async fn list_highlights(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<HighlightRecord>>> {
    let store = state.store();
    let q = query.q.as_deref().unwrap_or("");

    let highlights = match query.url.as_deref() {
        Some(url) => store
            .list_for_url(url)
            .await?
            .into_iter()
            .filter(|record| q.trim().is_empty() || record.matches_query(q))
            .collect(),
        None => store.search(q).await?,
    };
    Ok(Json(highlights))
}

/// Delete every highlight
async fn clear_highlights(
    State(state): State<AppState>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<StatusCode> {
    confirm.require()?;
    state.store().clear_all().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn count_highlights(State(state): State<AppState>) -> Result<Json<CountResponse>> {
    let count = state.store().count().await?;
    Ok(Json(CountResponse { count }))
}

/// Export the full list as pretty-printed JSON
async fn export_highlights(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let json = state.store().export_json().await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], json))
}

/// Merge an export payload; the body is taken verbatim so that malformed
/// JSON is reported as invalid data rather than rejected by the extractor
async fn import_highlights(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ImportResponse>> {
    let imported = state.store().import_json(&body).await?;
    Ok(Json(ImportResponse { imported }))
}

/// Recolour a highlight
async fn update_highlight(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(data): Json<UpdateColor>,
) -> Result<Json<UpdateResponse>> {
    let color = normalize_color(&data.color);
    let updated = state.store().update_color(&id, &color).await?;
    if updated == 0 {
        return Err(AppError::NotFound(format!("Highlight not found: {}", id)));
    }
    Ok(Json(UpdateResponse { id, color, updated }))
}

/// Delete a highlight
async fn delete_highlight(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<StatusCode> {
    confirm.require()?;
    let removed = state.store().remove(&id).await?;
    if removed > 0 {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Highlight not found: {}", id)))
    }
}
