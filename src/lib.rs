//! Highlighter
//!
//! Persistent text highlights for web pages. A selection is split into
//! inline highlight fragments, saved as a record keyed by page url, and
//! re-anchored by text search when the page is loaded again.
//!
//! The engine (`dom`, `highlight`, `store`, `controller`) is usable on its
//! own; `routes` exposes it over HTTP.

pub mod config;
pub mod controller;
pub mod dom;
pub mod error;
pub mod highlight;
pub mod html;
pub mod routes;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
