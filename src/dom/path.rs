//! Child-index paths
//!
//! A path such as `0/1/3` addresses a node by walking child indices down from
//! the document root; the empty path is the root itself. Paths are how
//! selections cross the HTTP boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Document, DomError, NodeId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn new(steps: Vec<usize>) -> Self {
        Self(steps)
    }

    pub fn steps(&self) -> &[usize] {
        &self.0
    }

    /// Path from the root to `node`
    pub fn of(doc: &Document, node: NodeId) -> Self {
        let mut steps: Vec<usize> = std::iter::once(node)
            .chain(doc.ancestors(node))
            .filter_map(|n| doc.index_in_parent(n))
            .collect();
        steps.reverse();
        Self(steps)
    }

    /// Walk the path from the root
    pub fn resolve(&self, doc: &Document) -> Result<NodeId, DomError> {
        self.0.iter().try_fold(doc.root(), |node, &index| {
            doc.children(node)
                .get(index)
                .copied()
                .ok_or_else(|| DomError::InvalidPath(self.to_string()))
        })
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|step| step.to_string()).collect();
        write!(f, "{}", parts.join("/"))
    }
}

impl FromStr for NodePath {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        trimmed
            .split('/')
            .map(|step| {
                step.parse::<usize>()
                    .map_err(|_| DomError::InvalidPath(s.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl TryFrom<String> for NodePath {
    type Error = DomError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NodePath> for String {
    fn from(path: NodePath) -> Self {
        path.to_string()
    }
}
