//! Boundary points and ranges

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::{Document, DomError, NodeId, BLOCK_ELEMENTS};

/// A position inside a node: a byte offset for text, a child index otherwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundaryPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// Compare two boundary points following the DOM algorithm
pub fn compare_points(doc: &Document, a: BoundaryPoint, b: BoundaryPoint) -> Ordering {
    if a.node == b.node {
        return a.offset.cmp(&b.offset);
    }

    if doc.compare_tree_order(a.node, b.node) == Ordering::Greater {
        return compare_points(doc, b, a).reverse();
    }

    if doc.is_ancestor_of(a.node, b.node) {
        let child = std::iter::once(b.node)
            .chain(doc.ancestors(b.node))
            .find(|&n| doc.parent(n) == Some(a.node));
        if let Some(child) = child {
            if doc.index_in_parent(child).unwrap_or(0) < a.offset {
                return Ordering::Greater;
            }
        }
    }

    Ordering::Less
}

/// A selection between two boundary points
///
/// Constructed ranges are always ordered (start ≤ end) with in-bounds offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    start: BoundaryPoint,
    end: BoundaryPoint,
}

impl Range {
    pub fn new(doc: &Document, start: BoundaryPoint, end: BoundaryPoint) -> Result<Self, DomError> {
        validate_point(doc, start)?;
        validate_point(doc, end)?;
        if compare_points(doc, start, end) == Ordering::Greater {
            return Err(DomError::InvertedRange);
        }
        Ok(Self { start, end })
    }

    /// Range covering `start..end` of a single text node
    pub fn within_text(doc: &Document, node: NodeId, start: usize, end: usize) -> Result<Self, DomError> {
        if !doc.is_text(node) {
            return Err(DomError::NotText);
        }
        Self::new(
            doc,
            BoundaryPoint::new(node, start),
            BoundaryPoint::new(node, end),
        )
    }

    pub fn start(&self) -> BoundaryPoint {
        self.start
    }

    pub fn end(&self) -> BoundaryPoint {
        self.end
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Deepest node containing both endpoints
    pub fn common_ancestor(&self, doc: &Document) -> NodeId {
        std::iter::once(self.start.node)
            .chain(doc.ancestors(self.start.node))
            .find(|&candidate| {
                candidate == self.end.node || doc.is_ancestor_of(candidate, self.end.node)
            })
            .unwrap_or_else(|| doc.root())
    }

    /// Whether any character of a text node lies inside the range
    pub fn intersects_text(&self, doc: &Document, node: NodeId) -> bool {
        let len = doc.node_len(node);
        compare_points(doc, BoundaryPoint::new(node, len), self.start) == Ordering::Greater
            && compare_points(doc, BoundaryPoint::new(node, 0), self.end) == Ordering::Less
    }

    /// Byte span of a text node covered by the range, if non-empty
    pub fn clip_to_text(&self, doc: &Document, node: NodeId) -> Option<(usize, usize)> {
        if !doc.is_text(node) || !self.intersects_text(doc, node) {
            return None;
        }
        let start = if node == self.start.node {
            self.start.offset
        } else {
            0
        };
        let end = if node == self.end.node {
            self.end.offset
        } else {
            doc.node_len(node)
        };
        (start < end).then_some((start, end))
    }

    /// The range's string value
    ///
    /// Text from different block elements is joined with a blank line and a
    /// `br` between two pieces becomes a newline, the way a rendered
    /// selection reads.
    pub fn to_text(&self, doc: &Document) -> String {
        if self.start.node == self.end.node {
            if let Some(text) = doc.text(self.start.node) {
                return text[self.start.offset..self.end.offset].to_string();
            }
        }

        let root = self.common_ancestor(doc);
        let mut out = String::new();
        let mut last_block = None;
        let mut line_break = false;
        for node in doc.descendants(root) {
            if is_element(doc, node, "br") {
                line_break |= last_block.is_some();
                continue;
            }
            let (Some(text), Some((start, end))) = (doc.text(node), self.clip_to_text(doc, node)) else {
                continue;
            };

            let block = enclosing_block(doc, node);
            match last_block {
                Some(last) if last != block => out.push_str(BLOCK_SEPARATOR),
                Some(_) if line_break => out.push('\n'),
                _ => {}
            }
            out.push_str(&text[start..end]);
            last_block = Some(block);
            line_break = false;
        }
        out
    }
}

/// Joins text taken from different blocks
const BLOCK_SEPARATOR: &str = "\n\n";

fn is_element(doc: &Document, node: NodeId, name: &str) -> bool {
    doc.element(node).map_or(false, |el| el.name == name)
}

/// Nearest block-level ancestor, or the document root
fn enclosing_block(doc: &Document, node: NodeId) -> NodeId {
    doc.ancestors(node)
        .find(|&n| {
            doc.element(n)
                .map_or(false, |el| BLOCK_ELEMENTS.contains(&el.name.as_str()))
        })
        .unwrap_or_else(|| doc.root())
}

fn validate_point(doc: &Document, point: BoundaryPoint) -> Result<(), DomError> {
    let len = doc.node_len(point.node);
    if point.offset > len {
        return Err(DomError::OffsetOutOfBounds {
            offset: point.offset,
            len,
        });
    }
    if let Some(text) = doc.text(point.node) {
        if !text.is_char_boundary(point.offset) {
            return Err(DomError::NotCharBoundary(point.offset));
        }
    }
    Ok(())
}

/// Wire form of a boundary point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointSpec {
    pub path: super::NodePath,
    pub offset: usize,
}

impl PointSpec {
    pub fn resolve(&self, doc: &Document) -> Result<BoundaryPoint, DomError> {
        Ok(BoundaryPoint::new(self.path.resolve(doc)?, self.offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `<p>alpha<b>beta</b>gamma</p>`
    fn sample() -> (Document, NodeId, [NodeId; 3]) {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        doc.append_child(doc.root(), p).unwrap();
        let alpha = doc.create_text("alpha");
        let b = doc.create_element("b");
        let beta = doc.create_text("beta");
        let gamma = doc.create_text("gamma");
        doc.append_child(p, alpha).unwrap();
        doc.append_child(p, b).unwrap();
        doc.append_child(b, beta).unwrap();
        doc.append_child(p, gamma).unwrap();
        (doc, p, [alpha, beta, gamma])
    }

    #[test]
    fn test_compare_points_parent_offsets() {
        let (doc, p, [alpha, _, gamma]) = sample();

        // (p, 1) sits between alpha and <b>
        let between = BoundaryPoint::new(p, 1);
        assert_eq!(
            compare_points(&doc, between, BoundaryPoint::new(alpha, 5)),
            Ordering::Greater
        );
        assert_eq!(
            compare_points(&doc, between, BoundaryPoint::new(gamma, 0)),
            Ordering::Less
        );
        assert_eq!(
            compare_points(&doc, BoundaryPoint::new(alpha, 2), BoundaryPoint::new(alpha, 4)),
            Ordering::Less
        );
    }

    #[test]
    fn test_inverted_range_rejected() {
        let (doc, _, [alpha, _, gamma]) = sample();
        let result = Range::new(
            &doc,
            BoundaryPoint::new(gamma, 1),
            BoundaryPoint::new(alpha, 1),
        );
        assert!(matches!(result, Err(DomError::InvertedRange)));
    }

    #[test]
    fn test_to_text_across_elements() {
        let (doc, p, [alpha, beta, gamma]) = sample();
        let range = Range::new(
            &doc,
            BoundaryPoint::new(alpha, 2),
            BoundaryPoint::new(gamma, 3),
        )
        .unwrap();

        assert_eq!(range.common_ancestor(&doc), p);
        assert_eq!(range.to_text(&doc), "phabetagam");
        assert_eq!(range.clip_to_text(&doc, beta), Some((0, 4)));
    }

    #[test]
    fn test_element_boundary_excludes_earlier_text() {
        let (doc, p, [alpha, beta, gamma]) = sample();
        let range = Range::new(&doc, BoundaryPoint::new(p, 1), BoundaryPoint::new(p, 2)).unwrap();

        assert!(!range.intersects_text(&doc, alpha));
        assert!(range.intersects_text(&doc, beta));
        assert!(!range.intersects_text(&doc, gamma));
        assert_eq!(range.to_text(&doc), "beta");
    }

    #[test]
    fn test_zero_length_clip_is_none() {
        let (doc, _, [alpha, beta, _]) = sample();
        let range = Range::new(&doc, BoundaryPoint::new(alpha, 5), BoundaryPoint::new(beta, 2)).unwrap();

        assert_eq!(range.clip_to_text(&doc, alpha), None);
        assert_eq!(range.clip_to_text(&doc, beta), Some((0, 2)));
    }

    #[test]
    fn test_to_text_separates_blocks() {
        let doc = crate::dom::parse("<div><p>first para</p><p>second <i>para</i></p></div>").unwrap();
        let div = doc.children(doc.root())[0];
        let first = doc.children(doc.children(div)[0])[0];
        let second_p = doc.children(div)[1];
        let last = doc.children(doc.children(second_p)[1])[0];

        let range = Range::new(&doc, BoundaryPoint::new(first, 6), BoundaryPoint::new(last, 4)).unwrap();

        assert_eq!(range.to_text(&doc), "para\n\nsecond para");
    }

    #[test]
    fn test_to_text_line_break() {
        let doc = crate::dom::parse("<p>line one<br>line two</p>").unwrap();
        let p = doc.children(doc.root())[0];
        let (one, two) = (doc.children(p)[0], doc.children(p)[2]);

        let range = Range::new(&doc, BoundaryPoint::new(one, 5), BoundaryPoint::new(two, 4)).unwrap();

        assert_eq!(range.to_text(&doc), "one\nline");
    }
}
