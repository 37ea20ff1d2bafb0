use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a node: child indices from the document root
///
/// Paths are positional and go stale as soon as siblings are inserted or
/// removed. Anything that outlives a single edit must hold a `NodeId` and
/// re-resolve it with `find_path`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<usize>);

impl Path {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    /// The (empty) path of the document root
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn parent(&self) -> Option<Path> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Index of the node within its parent
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn child(&self, index: usize) -> Path {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Same parent, different index
    pub fn sibling(&self, index: usize) -> Option<Path> {
        self.parent().map(|parent| parent.child(index))
    }

    pub fn next(&self) -> Option<Path> {
        self.last().and_then(|last| self.sibling(last + 1))
    }

    /// Whether `self` is a strict ancestor of `other`
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// Where `self` ends up once a single node is inserted at `at`
    pub fn shifted_by_insert(&self, at: &Path) -> Path {
        let (Some(parent), Some(index)) = (at.parent(), at.last()) else {
            return self.clone();
        };
        let depth = parent.len();

        let mut indices = self.0.clone();
        if indices.len() > depth && indices.starts_with(&parent.0) && indices[depth] >= index {
            indices[depth] += 1;
        }
        Self(indices)
    }

    /// All strict ancestors, root excluded, nearest last
    pub fn ancestors(&self) -> Vec<Path> {
        (1..self.0.len()).map(|n| Self(self.0[..n].to_vec())).collect()
    }
}

impl From<Vec<usize>> for Path {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl<const N: usize> From<[usize; N]> for Path {
    fn from(indices: [usize; N]) -> Self {
        Self(indices.to_vec())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
