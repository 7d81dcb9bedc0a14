//! Range splitting
//!
//! Turns a live selection into highlight fragments. A selection can cross any
//! number of text nodes and element boundaries; each contiguous piece of text
//! gets its own fragment, and all of them share one highlight id.

use crate::dom::{text_nodes, Document, DomError, NodeId, Range};

use super::fragment::{is_inside_highlight, wrap_text};

/// Errors while splitting a selection
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("Selection is collapsed")]
    Collapsed,

    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Wrap every text run covered by `range` in a fragment carrying
/// `highlight_id` and `color`
///
/// The document is mutated in place and the range is consumed: its boundary
/// points no longer describe the same text afterwards.
pub fn split(
    doc: &mut Document,
    range: Range,
    highlight_id: &str,
    color: &str,
) -> Result<Vec<NodeId>, SplitError> {
    if range.is_collapsed() {
        return Err(SplitError::Collapsed);
    }

    let (start, end) = (range.start(), range.end());
    if start.node == end.node && doc.is_text(start.node) {
        let fragment = wrap_text(doc, start.node, start.offset, end.offset, highlight_id, color)?;
        return Ok(vec![fragment]);
    }

    let pieces = covered_pieces(doc, &range);
    tracing::debug!(
        highlight_id,
        pieces = pieces.len(),
        "Splitting selection across text nodes"
    );

    let mut fragments = Vec::with_capacity(pieces.len());
    for (node, start, end) in pieces {
        fragments.push(wrap_text(doc, node, start, end, highlight_id, color)?);
    }
    Ok(fragments)
}

/// Text nodes under the range's common ancestor that the range covers, with
/// the covered byte span of each; text already inside a fragment is skipped
fn covered_pieces(doc: &Document, range: &Range) -> Vec<(NodeId, usize, usize)> {
    let root = range.common_ancestor(doc);
    text_nodes(doc, root, |doc, node| {
        !is_inside_highlight(doc, node) && range.intersects_text(doc, node)
    })
    .filter_map(|node| {
        range
            .clip_to_text(doc, node)
            .map(|(start, end)| (node, start, end))
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse, BoundaryPoint};
    use crate::highlight::fragment::{fragment_id, fragments_by_id, remove_fragments};

    fn text_at(doc: &Document, path: &[usize]) -> NodeId {
        path.iter()
            .fold(doc.root(), |node, &index| doc.children(node)[index])
    }

    #[test]
    fn test_single_text_node_yields_one_fragment() {
        let mut doc = parse("<p>say hello world now</p>").unwrap();
        let text = text_at(&doc, &[0, 0]);
        let range = Range::within_text(&doc, text, 3, 16).unwrap();
        let selected = range.to_text(&doc);

        let fragments = split(&mut doc, range, "hl_1", "red").unwrap();

        assert_eq!(fragments.len(), 1);
        assert_eq!(doc.text_content(fragments[0]), selected);
        assert_eq!(selected, " hello world ");
    }

    #[test]
    fn test_selection_across_nodes_yields_one_fragment_per_node() {
        let mut doc = parse("<div><p>first para</p><p>middle <em>emph</em> tail</p><p>last para</p></div>")
            .unwrap();
        let div = doc.children(doc.root())[0];
        let before = doc.text_content(div);
        let first = text_at(&doc, &[0, 0, 0]);
        let last = text_at(&doc, &[0, 2, 0]);
        let range = Range::new(
            &doc,
            BoundaryPoint::new(first, 6),
            BoundaryPoint::new(last, 4),
        )
        .unwrap();
        let selected = range.to_text(&doc);

        let fragments = split(&mut doc, range, "hl_2", "red").unwrap();

        // "para", "middle ", "emph", " tail", "last"
        assert_eq!(fragments.len(), 5);
        assert!(fragments
            .iter()
            .all(|&f| fragment_id(&doc, f) == Some("hl_2")));
        let joined: String = fragments.iter().map(|&f| doc.text_content(f)).collect();
        assert_eq!(joined, selected);
        assert_eq!(doc.text_content(div), before);
    }

    #[test]
    fn test_existing_highlights_are_not_wrapped_again() {
        let mut doc = parse("<p>one <span class=\"x-highlighter-mark\" data-highlight-id=\"old\">two</span> three</p>")
            .unwrap();
        let one = text_at(&doc, &[0, 0]);
        let three = text_at(&doc, &[0, 2]);
        let range = Range::new(
            &doc,
            BoundaryPoint::new(one, 0),
            BoundaryPoint::new(three, 6),
        )
        .unwrap();

        let fragments = split(&mut doc, range, "new", "red").unwrap();

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments_by_id(&doc, "old").len(), 1);
        let old = fragments_by_id(&doc, "old")[0];
        assert!(doc
            .descendants(old)
            .all(|node| fragment_id(&doc, node).is_none()));
    }

    #[test]
    fn test_zero_length_edges_are_skipped() {
        let mut doc = parse("<p><b>bold</b><i>italic</i></p>").unwrap();
        let bold = text_at(&doc, &[0, 0, 0]);
        let italic = text_at(&doc, &[0, 1, 0]);
        // starts at the very end of "bold": nothing of it is covered
        let range = Range::new(
            &doc,
            BoundaryPoint::new(bold, 4),
            BoundaryPoint::new(italic, 3),
        )
        .unwrap();

        let fragments = split(&mut doc, range, "hl_3", "red").unwrap();

        assert_eq!(fragments.len(), 1);
        assert_eq!(doc.text_content(fragments[0]), "ita");
    }

    #[test]
    fn test_element_boundary_points() {
        let mut doc = parse("<p>keep<b>take</b><i>also</i>skip</p>").unwrap();
        let p = text_at(&doc, &[0]);
        let range = Range::new(&doc, BoundaryPoint::new(p, 1), BoundaryPoint::new(p, 3)).unwrap();

        let fragments = split(&mut doc, range, "hl_4", "red").unwrap();

        let texts: Vec<String> = fragments.iter().map(|&f| doc.text_content(f)).collect();
        assert_eq!(texts, vec!["take", "also"]);
    }

    #[test]
    fn test_collapsed_selection_rejected() {
        let mut doc = parse("<p>text</p>").unwrap();
        let text = text_at(&doc, &[0, 0]);
        let range = Range::within_text(&doc, text, 2, 2).unwrap();

        assert!(matches!(
            split(&mut doc, range, "hl_5", "red"),
            Err(SplitError::Collapsed)
        ));
    }

    #[test]
    fn test_delete_after_split_removes_all_fragments() {
        let mut doc = parse("<div><p>aaa</p><p>bbb</p><p>ccc</p></div>").unwrap();
        let div = doc.children(doc.root())[0];
        let before = doc.text_content(div);
        let a = text_at(&doc, &[0, 0, 0]);
        let c = text_at(&doc, &[0, 2, 0]);
        let range = Range::new(&doc, BoundaryPoint::new(a, 1), BoundaryPoint::new(c, 2)).unwrap();
        split(&mut doc, range, "hl_6", "red").unwrap();
        assert_eq!(fragments_by_id(&doc, "hl_6").len(), 3);

        assert_eq!(remove_fragments(&mut doc, "hl_6").unwrap(), 3);

        assert!(fragments_by_id(&doc, "hl_6").is_empty());
        assert_eq!(doc.text_content(div), before);
        for &p in doc.children(div) {
            assert_eq!(doc.children(p).len(), 1);
        }
    }
}
