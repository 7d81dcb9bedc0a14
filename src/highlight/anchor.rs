//! Re-anchoring
//!
//! Rebuilds fragments from persisted records against a document that is not
//! the one the records were created on. Matching is a best-effort text search:
//! each paragraph segment of a record's text is looked up independently and
//! the first text node containing it wins.
//!
//! Nothing here is fatal. Unmatched segments are skipped, and a record that
//! fails is logged and counted while the rest of the batch carries on.

use serde::Serialize;

use crate::dom::{text_nodes, Document, DomError, NodeId};

use super::color::normalize_color;
use super::fragment::{has_fragment, is_inside_highlight, remove_all_fragments, wrap_text};
use super::record::HighlightRecord;

/// Per-record restoration failures
#[derive(Debug, thiserror::Error)]
pub enum AnchorError {
    #[error("Record has no id")]
    MissingId,

    #[error(transparent)]
    Dom(#[from] DomError),
}

/// What happened to one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// A fragment with this id was already present
    AlreadyPresent,
    /// Restored with this many fragments; zero means no segment matched
    Anchored(usize),
}

/// Summary of a restore pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    /// Records with at least one new fragment
    pub restored: usize,
    /// Fragments created
    pub fragments: usize,
    /// Records skipped because their fragments already exist
    pub already_present: usize,
    /// Records none of whose segments were found
    pub unmatched: usize,
    /// Records that raised an error
    pub failed: usize,
}

/// Restore every record that is not already on the page
pub fn restore(doc: &mut Document, records: &[HighlightRecord], default_color: &str) -> RestoreReport {
    let mut report = RestoreReport::default();

    for record in records {
        match restore_record(doc, record, default_color) {
            Ok(RecordOutcome::AlreadyPresent) => report.already_present += 1,
            Ok(RecordOutcome::Anchored(0)) => {
                tracing::trace!(id = %record.id, "No segment of highlight found on page");
                report.unmatched += 1;
            }
            Ok(RecordOutcome::Anchored(count)) => {
                report.restored += 1;
                report.fragments += count;
            }
            Err(e) => {
                tracing::warn!(id = %record.id, "Failed to restore highlight: {}", e);
                report.failed += 1;
            }
        }
    }

    tracing::debug!(
        restored = report.restored,
        fragments = report.fragments,
        already_present = report.already_present,
        unmatched = report.unmatched,
        failed = report.failed,
        "Restore pass finished"
    );
    report
}

/// Remove every fragment on the page, then restore from scratch
pub fn reload(
    doc: &mut Document,
    records: &[HighlightRecord],
    default_color: &str,
) -> Result<RestoreReport, DomError> {
    let removed = remove_all_fragments(doc)?;
    tracing::debug!(removed, "Cleared highlight fragments before reload");
    Ok(restore(doc, records, default_color))
}

/// Restore a single record
pub fn restore_record(
    doc: &mut Document,
    record: &HighlightRecord,
    default_color: &str,
) -> Result<RecordOutcome, AnchorError> {
    if record.id.trim().is_empty() {
        return Err(AnchorError::MissingId);
    }
    if has_fragment(doc, &record.id) {
        return Ok(RecordOutcome::AlreadyPresent);
    }

    let color = normalize_color(record.color_or(default_color));
    let mut created = 0;
    for segment in record.segments() {
        if restore_segment(doc, segment, &record.id, &color)?.is_some() {
            created += 1;
        }
    }
    Ok(RecordOutcome::Anchored(created))
}

/// Wrap the first occurrence of `segment` outside existing fragments
pub fn restore_segment(
    doc: &mut Document,
    segment: &str,
    highlight_id: &str,
    color: &str,
) -> Result<Option<NodeId>, DomError> {
    match find_segment(doc, segment) {
        Some((node, offset)) => {
            let fragment = wrap_text(doc, node, offset, offset + segment.len(), highlight_id, color)?;
            Ok(Some(fragment))
        }
        None => Ok(None),
    }
}

/// First text node (document order, outside fragments) containing `segment`,
/// with the byte offset of the match
pub fn find_segment(doc: &Document, segment: &str) -> Option<(NodeId, usize)> {
    if segment.is_empty() {
        return None;
    }
    text_nodes(doc, doc.root(), |doc, node| !is_inside_highlight(doc, node))
        .find_map(|node| {
            doc.text(node)
                .and_then(|text| text.find(segment))
                .map(|offset| (node, offset))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse;
    use crate::highlight::fragment::{all_fragments, fragment_color, fragment_id, fragments_by_id};

    fn record(id: &str, text: &str, color: &str) -> HighlightRecord {
        HighlightRecord {
            id: id.to_string(),
            text: text.to_string(),
            color: color.to_string(),
            url: "https://x.com/post/1".to_string(),
            timestamp: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_restore_single_segment() {
        let mut doc = parse("<article><p>well hello world again</p></article>").unwrap();
        let records = vec![record("hl_1", "hello world", "red")];

        let report = restore(&mut doc, &records, "blue");

        assert_eq!(report.restored, 1);
        let fragments = fragments_by_id(&doc, "hl_1");
        assert_eq!(fragments.len(), 1);
        assert_eq!(doc.text_content(fragments[0]), "hello world");
        assert_eq!(fragment_color(&doc, fragments[0]).as_deref(), Some("red"));
    }

    #[test]
    fn test_restore_two_segments_share_id() {
        let mut doc = parse("<div><p>the first part here</p><p>and second part there</p></div>").unwrap();
        let records = vec![record("hl_2", "first part\n\nsecond part", "red")];

        let report = restore(&mut doc, &records, "blue");

        assert_eq!(report.fragments, 2);
        let fragments = fragments_by_id(&doc, "hl_2");
        let texts: Vec<String> = fragments.iter().map(|&f| doc.text_content(f)).collect();
        assert_eq!(texts, vec!["first part", "second part"]);
    }

    #[test]
    fn test_restore_is_idempotent() {
        let mut doc = parse("<p>alpha beta gamma</p>").unwrap();
        let records = vec![record("hl_3", "beta", "red")];

        restore(&mut doc, &records, "blue");
        let once = crate::dom::serialize(&doc, doc.root());
        let second = restore(&mut doc, &records, "blue");

        assert_eq!(second.already_present, 1);
        assert_eq!(crate::dom::serialize(&doc, doc.root()), once);
    }

    #[test]
    fn test_first_match_wins() {
        let mut doc = parse("<p>repeat</p><p>repeat</p>").unwrap();
        restore(&mut doc, &[record("hl_4", "repeat", "red")], "blue");

        let fragment = all_fragments(&doc)[0];
        let first_p = doc.children(doc.root())[0];
        assert_eq!(doc.parent(fragment), Some(first_p));
    }

    #[test]
    fn test_second_record_skips_text_inside_fragments() {
        let mut doc = parse("<p>repeat</p><p>repeat</p>").unwrap();
        let records = vec![record("a", "repeat", "red"), record("b", "repeat", "red")];

        restore(&mut doc, &records, "blue");

        let fragments = all_fragments(&doc);
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragment_id(&doc, fragments[1]), Some("b"));
    }

    #[test]
    fn test_unmatched_and_missing_segments() {
        let mut doc = parse("<p>only the first part is here</p>").unwrap();
        let records = vec![
            record("gone", "nowhere to be found", "red"),
            record("half", "first part\n\nmissing part", "red"),
        ];

        let report = restore(&mut doc, &records, "blue");

        assert_eq!(report.unmatched, 1);
        assert_eq!(report.restored, 1);
        assert_eq!(fragments_by_id(&doc, "half").len(), 1);
    }

    #[test]
    fn test_bad_record_does_not_abort_batch() {
        let mut doc = parse("<p>some words to keep</p>").unwrap();
        let records = vec![
            record("", "some", "red"),
            record("empty", " \n\n ", "red"),
            record("ok", "words", "red"),
        ];

        let report = restore(&mut doc, &records, "blue");

        assert_eq!(report.failed, 1);
        assert_eq!(report.unmatched, 1);
        assert_eq!(report.restored, 1);
        assert!(has_fragment(&doc, "ok"));
    }

    #[test]
    fn test_default_color_when_record_has_none() {
        let mut doc = parse("<p>plain text</p>").unwrap();
        restore(&mut doc, &[record("hl_5", "plain", "")], "rgb(1, 2, 3)");

        let fragment = fragments_by_id(&doc, "hl_5")[0];
        assert_eq!(fragment_color(&doc, fragment).as_deref(), Some("rgb(1, 2, 3)"));
    }

    #[test]
    fn test_selection_across_paragraphs_survives_reload() {
        use crate::dom::{BoundaryPoint, Range};

        let mut doc = parse("<div><p>first para</p><p>second para</p></div>").unwrap();
        let div = doc.children(doc.root())[0];
        let first = doc.children(doc.children(div)[0])[0];
        let second = doc.children(doc.children(div)[1])[0];
        let range = Range::new(&doc, BoundaryPoint::new(first, 0), BoundaryPoint::new(second, 11)).unwrap();

        let saved = record("hl_8", &range.to_text(&doc), "red");
        assert_eq!(saved.text, "first para\n\nsecond para");
        assert_eq!(crate::highlight::split(&mut doc, range, "hl_8", "red").unwrap().len(), 2);

        let report = reload(&mut doc, &[saved], "blue").unwrap();

        assert_eq!(report.fragments, 2);
        let texts: Vec<String> = fragments_by_id(&doc, "hl_8")
            .iter()
            .map(|&f| doc.text_content(f))
            .collect();
        assert_eq!(texts, vec!["first para", "second para"]);
    }

    #[test]
    fn test_restored_color_is_canonical() {
        let mut doc = parse("<p>plain text</p>").unwrap();
        restore(&mut doc, &[record("hl_7", "plain", "#FFFF0080")], "blue");

        let fragment = fragments_by_id(&doc, "hl_7")[0];
        assert_eq!(
            fragment_color(&doc, fragment).as_deref(),
            Some("rgba(255, 255, 0, 0.5)")
        );
    }

    #[test]
    fn test_reload_replaces_stale_fragments() {
        let mut doc = parse(
            "<p>fresh <span class=\"x-highlighter-mark\" data-highlight-id=\"stale\" \
             style=\"background-color: red;\">content</span> here</p>",
        )
        .unwrap();
        let p = doc.children(doc.root())[0];
        let records = vec![record("hl_6", "content", "blue")];

        let report = reload(&mut doc, &records, "green").unwrap();

        assert_eq!(report.restored, 1);
        assert!(!has_fragment(&doc, "stale"));
        assert_eq!(doc.text_content(p), "fresh content here");
    }
}
