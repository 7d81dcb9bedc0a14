//! Page sanitisation using lol_html for streaming HTML processing
//!
//! Pages arrive from clients as raw markup. Before the engine parses them,
//! executable content is stripped so that what is re-served with highlights
//! applied cannot run script.

use lol_html::{comments, element, rewrite_str, RewriteStrSettings};

/// Errors during sanitisation
#[derive(Debug, thiserror::Error)]
pub enum SanitizeError {
    #[error("HTML rewrite failed: {0}")]
    Rewrite(String),
}

fn is_script_url(value: &str) -> bool {
    value.trim().to_lowercase().starts_with("javascript:")
}

/// Remove scripts, styles, comments, inline event handlers and
/// `javascript:` URLs, keeping text and structure intact
pub fn sanitize_html(html: &str) -> Result<String, SanitizeError> {
    let result = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("script, style, noscript", |el| {
                    el.remove();
                    Ok(())
                }),
                element!("*", |el| {
                    let handlers: Vec<String> = el
                        .attributes()
                        .iter()
                        .map(|attr| attr.name())
                        .filter(|name| name.starts_with("on"))
                        .collect();
                    for name in handlers {
                        el.remove_attribute(&name);
                    }

                    for attr in ["href", "src", "action"] {
                        if el.get_attribute(attr).is_some_and(|v| is_script_url(&v)) {
                            el.remove_attribute(attr);
                        }
                    }
                    Ok(())
                }),
                comments!("*", |c| {
                    c.remove();
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| SanitizeError::Rewrite(e.to_string()))?;

    Ok(result)
}
