//! Filtered text-node traversal

use super::{Descendants, Document, NodeId};

/// Lazy iterator over the text nodes below a root, in document order,
/// yielding only those accepted by the filter
///
/// Each call to [`text_nodes`] starts a fresh walk, so callers that mutate the
/// document between passes simply build a new walker.
pub struct TextNodes<'a, F> {
    doc: &'a Document,
    inner: Descendants<'a>,
    filter: F,
}

/// Walk the text nodes below `root` that satisfy `filter`
pub fn text_nodes<F>(doc: &Document, root: NodeId, filter: F) -> TextNodes<'_, F>
where
    F: FnMut(&Document, NodeId) -> bool,
{
    TextNodes {
        doc,
        inner: doc.descendants(root),
        filter,
    }
}

impl<F> Iterator for TextNodes<'_, F>
where
    F: FnMut(&Document, NodeId) -> bool,
{
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let doc = self.doc;
        self.inner
            .by_ref()
            .find(|&node| doc.is_text(node) && (self.filter)(doc, node))
    }
}
