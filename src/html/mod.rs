//! Inbound page markup processing

mod sanitize;

pub use sanitize::{sanitize_html, SanitizeError};
