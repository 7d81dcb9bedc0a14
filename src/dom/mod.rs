//! Document model
//!
//! A small mutable arena tree standing in for the live page DOM. It carries
//! just enough of the DOM surface for highlighting:
//!
//! - element / text / comment nodes with ordered children
//! - `splitText` and `normalize` semantics
//! - tree-order and boundary-point comparison
//! - ranges over boundary points, and a lazy text-node walker
//! - tolerant markup parsing and serialization (quick-xml)
//! - child-index node paths for addressing nodes over the wire
//!
//! Text offsets are UTF-8 byte offsets and must fall on character boundaries.

mod node;
mod parse;
mod path;
mod range;
mod serialize;
mod walker;

pub use node::{Ancestors, Descendants, Document, ElementData, NodeData, NodeId};
pub use parse::parse;
pub use path::NodePath;
pub use range::{compare_points, BoundaryPoint, PointSpec, Range};
pub use serialize::{serialize, serialize_children};
pub use walker::{text_nodes, TextNodes};

/// Elements that never have content
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose content renders as its own block of text
pub(crate) const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "details", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "html", "li", "main", "nav", "ol", "p", "pre", "section", "summary",
    "table", "td", "th", "tr", "ul",
];

/// Errors raised by document operations
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("Offset {offset} is out of bounds for node of length {len}")]
    OffsetOutOfBounds { offset: usize, len: usize },

    #[error("Offset {0} does not fall on a character boundary")]
    NotCharBoundary(usize),

    #[error("Node is not a text node")]
    NotText,

    #[error("Node cannot have children")]
    NotAParent,

    #[error("Insertion would create a cycle")]
    HierarchyRequest,

    #[error("Reference node is not a child of the parent")]
    NotAChild,

    #[error("Range end precedes its start")]
    InvertedRange,

    #[error("Invalid node path: {0}")]
    InvalidPath(String),

    #[error("Markup parse error: {0}")]
    Parse(#[from] quick_xml::Error),
}
