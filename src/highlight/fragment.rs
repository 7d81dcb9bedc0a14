//! Live highlight fragments
//!
//! A fragment is an inline `<span>` carrying three things that everything else
//! relies on: the highlight class, the owning record id in a data attribute,
//! and the current colour as an inline `background-color`.

use crate::dom::{Document, DomError, NodeId, Range};

/// Class marking an element as a highlight fragment
pub const HIGHLIGHT_CLASS: &str = "x-highlighter-mark";
/// Attribute holding the owning record id
pub const HIGHLIGHT_ID_ATTR: &str = "data-highlight-id";

const FRAGMENT_TAG: &str = "span";

/// Create a detached, empty fragment element
pub fn create_fragment(doc: &mut Document, highlight_id: &str, color: &str) -> NodeId {
    let span = doc.create_element(FRAGMENT_TAG);
    if let Some(el) = doc.element_mut(span) {
        el.set_attr("class", HIGHLIGHT_CLASS);
        el.set_attr(HIGHLIGHT_ID_ATTR, highlight_id);
        el.set_attr("style", background_style(color));
    }
    span
}

fn background_style(color: &str) -> String {
    format!("background-color: {};", color)
}

/// Whether `node` is a highlight fragment element
pub fn is_fragment(doc: &Document, node: NodeId) -> bool {
    doc.element(node)
        .map(|el| el.has_class(HIGHLIGHT_CLASS) && el.attr(HIGHLIGHT_ID_ATTR).is_some())
        .unwrap_or(false)
}

/// Whether `node` already sits inside a fragment
pub fn is_inside_highlight(doc: &Document, node: NodeId) -> bool {
    doc.ancestors(node).any(|ancestor| is_fragment(doc, ancestor))
}

/// Record id of a fragment
pub fn fragment_id(doc: &Document, node: NodeId) -> Option<&str> {
    doc.element(node)?.attr(HIGHLIGHT_ID_ATTR)
}

/// Background colour from a fragment's inline style
pub fn fragment_color(doc: &Document, node: NodeId) -> Option<String> {
    let style = doc.element(node)?.attr("style")?;
    style.split(';').find_map(|decl| {
        let (property, value) = decl.split_once(':')?;
        (property.trim().eq_ignore_ascii_case("background-color"))
            .then(|| value.trim().to_string())
    })
}

/// Replace a fragment's background colour
pub fn set_fragment_color(doc: &mut Document, node: NodeId, color: &str) {
    if let Some(el) = doc.element_mut(node) {
        el.set_attr("style", background_style(color));
    }
}

/// Every connected fragment, in document order
pub fn all_fragments(doc: &Document) -> Vec<NodeId> {
    doc.descendants(doc.root())
        .filter(|&node| is_fragment(doc, node))
        .collect()
}

/// Connected fragments belonging to one highlight, in document order
pub fn fragments_by_id(doc: &Document, highlight_id: &str) -> Vec<NodeId> {
    doc.descendants(doc.root())
        .filter(|&node| is_fragment(doc, node) && fragment_id(doc, node) == Some(highlight_id))
        .collect()
}

pub fn has_fragment(doc: &Document, highlight_id: &str) -> bool {
    doc.descendants(doc.root())
        .any(|node| is_fragment(doc, node) && fragment_id(doc, node) == Some(highlight_id))
}

/// Wrap the `start..end` bytes of a text node in a new fragment
///
/// The text node is split so that exactly the covered characters move into
/// the fragment, which takes their place in the tree.
pub fn wrap_text(
    doc: &mut Document,
    text_node: NodeId,
    start: usize,
    end: usize,
    highlight_id: &str,
    color: &str,
) -> Result<NodeId, DomError> {
    let range = Range::within_text(doc, text_node, start, end)?;
    let (start, end) = (range.start().offset, range.end().offset);

    let len = doc.node_len(text_node);
    if end < len {
        doc.split_text(text_node, end)?;
    }
    let covered = if start > 0 {
        doc.split_text(text_node, start)?
    } else {
        text_node
    };

    let fragment = create_fragment(doc, highlight_id, color);
    if let Some(parent) = doc.parent(covered) {
        doc.insert_before(parent, fragment, Some(covered))?;
    }
    doc.append_child(fragment, covered)?;
    Ok(fragment)
}

/// Recolour every fragment of a highlight; returns how many were touched
pub fn recolor(doc: &mut Document, highlight_id: &str, color: &str) -> usize {
    let fragments = fragments_by_id(doc, highlight_id);
    for &fragment in &fragments {
        set_fragment_color(doc, fragment, color);
    }
    fragments.len()
}

/// Unwrap every fragment of a highlight, releasing its contents back into
/// the surrounding tree; returns how many were removed
pub fn remove_fragments(doc: &mut Document, highlight_id: &str) -> Result<usize, DomError> {
    let fragments = fragments_by_id(doc, highlight_id);
    unwrap_all(doc, &fragments)?;
    Ok(fragments.len())
}

/// Unwrap every fragment in the document
pub fn remove_all_fragments(doc: &mut Document) -> Result<usize, DomError> {
    let fragments = all_fragments(doc);
    unwrap_all(doc, &fragments)?;
    Ok(fragments.len())
}

fn unwrap_all(doc: &mut Document, fragments: &[NodeId]) -> Result<(), DomError> {
    for &fragment in fragments {
        if let Some(parent) = doc.unwrap_node(fragment)? {
            doc.normalize(parent);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse, serialize};

    #[test]
    fn test_wrap_middle_of_text() {
        let mut doc = parse("<p>say hello world now</p>").unwrap();
        let p = doc.children(doc.root())[0];
        let text = doc.children(p)[0];

        let fragment = wrap_text(&mut doc, text, 4, 15, "hl_1", "rgb(1, 2, 3)").unwrap();

        assert_eq!(doc.text_content(fragment), "hello world");
        assert_eq!(
            serialize(&doc, p),
            "<p>say <span class=\"x-highlighter-mark\" data-highlight-id=\"hl_1\" \
             style=\"background-color: rgb(1, 2, 3);\">hello world</span> now</p>"
        );
    }

    #[test]
    fn test_wrap_whole_text_leaves_no_empty_nodes() {
        let mut doc = parse("<p>all</p>").unwrap();
        let p = doc.children(doc.root())[0];
        let text = doc.children(p)[0];

        wrap_text(&mut doc, text, 0, 3, "hl_1", "red").unwrap();

        assert_eq!(doc.children(p).len(), 1);
    }

    #[test]
    fn test_fragment_lookup_and_color() {
        let mut doc = parse("<p>one two</p>").unwrap();
        let p = doc.children(doc.root())[0];
        let text = doc.children(p)[0];
        let fragment = wrap_text(&mut doc, text, 0, 3, "hl_9", "rgb(1, 2, 3)").unwrap();

        assert!(has_fragment(&doc, "hl_9"));
        assert!(!has_fragment(&doc, "hl_8"));
        assert_eq!(fragment_color(&doc, fragment).as_deref(), Some("rgb(1, 2, 3)"));

        assert_eq!(recolor(&mut doc, "hl_9", "rgb(4, 5, 6)"), 1);
        assert_eq!(fragment_color(&doc, fragment).as_deref(), Some("rgb(4, 5, 6)"));

        let inner = doc.children(fragment)[0];
        assert!(is_inside_highlight(&doc, inner));
    }

    #[test]
    fn test_remove_fragments_restores_text() {
        let mut doc = parse("<p>alpha beta gamma</p>").unwrap();
        let p = doc.children(doc.root())[0];
        let before = doc.text_content(p);
        let text = doc.children(p)[0];
        wrap_text(&mut doc, text, 6, 10, "hl_1", "red").unwrap();

        assert_eq!(remove_fragments(&mut doc, "hl_1").unwrap(), 1);

        assert_eq!(doc.children(p).len(), 1);
        assert_eq!(doc.text_content(p), before);
        assert!(all_fragments(&doc).is_empty());
    }
}
