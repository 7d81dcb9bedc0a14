//! Persisted highlight records

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Paragraph boundary inside a record's text
const SEGMENT_SEPARATOR: &str = "\n\n";

/// One logical highlight as stored in the record list
///
/// The JSON form of a list of these is also the export/import format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightRecord {
    /// Correlates every fragment of this highlight; never reused
    pub id: String,
    /// Selected text at creation time; the re-anchoring search key
    pub text: String,
    /// Current colour (canonical form); empty means "use the default"
    #[serde(default)]
    pub color: String,
    /// Page the highlight belongs to, matched exactly
    pub url: String,
    /// Creation time in epoch milliseconds
    #[serde(default)]
    pub timestamp: i64,
}

impl HighlightRecord {
    /// Create a record with a fresh id and the current time
    pub fn new(text: impl Into<String>, color: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            text: text.into(),
            color: color.into(),
            url: url.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Trimmed, non-empty paragraph segments of the text, in order
    pub fn segments(&self) -> Vec<&str> {
        self.text
            .split(SEGMENT_SEPARATOR)
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .collect()
    }

    /// The stored colour, or `fallback` when none was stored
    pub fn color_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.color.trim().is_empty() {
            fallback
        } else {
            &self.color
        }
    }

    /// Case-insensitive match against text or url
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.text.to_lowercase().contains(&query) || self.url.to_lowercase().contains(&query)
    }
}

/// Generate a highlight id: `hl_<epoch-ms>_<9 lowercase alphanumerics>`
pub fn generate_id() -> String {
    let tail: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("hl_{}_{}", Utc::now().timestamp_millis(), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique_and_well_formed() {
        let a = generate_id();
        let b = generate_id();

        assert_ne!(a, b);
        let parts: Vec<&str> = a.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "hl");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
    }

    #[test]
    fn test_segments_split_on_blank_lines() {
        let record = HighlightRecord::new("first part\n\n  second part \n\n\n\n", "", "https://x.com/a");
        assert_eq!(record.segments(), vec!["first part", "second part"]);
    }

    #[test]
    fn test_degenerate_text_has_no_segments() {
        let record = HighlightRecord::new(" \n\n ", "", "https://x.com/a");
        assert!(record.segments().is_empty());
    }

    #[test]
    fn test_color_fallback() {
        let mut record = HighlightRecord::new("t", "", "u");
        assert_eq!(record.color_or("rgb(1, 2, 3)"), "rgb(1, 2, 3)");
        record.color = "rgb(9, 9, 9)".to_string();
        assert_eq!(record.color_or("rgb(1, 2, 3)"), "rgb(9, 9, 9)");
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let record: HighlightRecord =
            serde_json::from_str(r#"{"id":"hl_1","text":"hello","url":"https://x.com/a"}"#).unwrap();
        assert_eq!(record.color, "");
        assert_eq!(record.timestamp, 0);
    }

    #[test]
    fn test_query_matches_text_or_url() {
        let record = HighlightRecord::new("Hello World", "", "https://x.com/Rust");
        assert!(record.matches_query("hello"));
        assert!(record.matches_query("rust"));
        assert!(!record.matches_query("python"));
    }
}
