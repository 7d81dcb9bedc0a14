//! User preference routes

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::highlight::color::{palette_color, PALETTE};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/color", get(get_color).put(set_color))
}

#[derive(Debug, Deserialize)]
pub struct SetColor {
    pub color: String,
}

#[derive(Serialize)]
pub struct ColorResponse {
    pub color: String,
    pub palette: Vec<String>,
}

fn color_response(color: String) -> ColorResponse {
    ColorResponse {
        color,
        palette: (0..PALETTE.len()).map(palette_color).collect(),
    }
}

/// The active default colour and the palette it is chosen from
async fn get_color(State(state): State<AppState>) -> Result<Json<ColorResponse>> {
    let color = state.default_color().await?;
    Ok(Json(color_response(color)))
}

/// Save a new default colour; must be a palette entry
async fn set_color(
    State(state): State<AppState>,
    Json(data): Json<SetColor>,
) -> Result<Json<ColorResponse>> {
    let color = state.store().set_default_color(&data.color).await?;
    tracing::info!(%color, "Default colour changed");
    Ok(Json(color_response(color)))
}
