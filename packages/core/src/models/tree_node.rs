//! Tree node rows and nested-set bounds
//!
//! A `TreeNode` is one row of the `tree_node` table: an article's position in
//! the hierarchy. Its `NodeBounds` are the nested-set interval `[left, right]`
//! plus the depth `level`. Containment of intervals is ancestry:
//!
//! ```rust
//! use wikitree_core::models::NodeBounds;
//!
//! let root = NodeBounds::new(1, 6, 0);
//! let child = NodeBounds::new(2, 3, 1);
//! let sibling = NodeBounds::new(4, 5, 1);
//!
//! assert!(root.contains(&child));
//! assert!(child.is_disjoint(&sibling));
//! assert_eq!(root.descendant_count(), 2);
//! ```

use serde::{Deserialize, Serialize};

/// Nested-set interval and depth of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeBounds {
    pub left: i64,
    pub right: i64,
    pub level: i64,
}

impl NodeBounds {
    pub fn new(left: i64, right: i64, level: i64) -> Self {
        Self { left, right, level }
    }

    /// Bounds of a freshly created root
    pub fn root() -> Self {
        Self::new(1, 2, 0)
    }

    /// `left < right` and the interval spans an even number of integers
    pub fn is_well_formed(&self) -> bool {
        self.left < self.right && (self.right - self.left) % 2 == 1 && self.level >= 0
    }

    /// Number of nodes strictly inside this interval
    pub fn descendant_count(&self) -> i64 {
        (self.right - self.left - 1) / 2
    }

    /// True when `other` lies strictly inside this interval
    pub fn contains(&self, other: &NodeBounds) -> bool {
        self.left < other.left && other.right < self.right
    }

    /// True when the two intervals share no integer
    pub fn is_disjoint(&self, other: &NodeBounds) -> bool {
        self.right < other.left || other.right < self.left
    }

    /// A leaf has nothing between its bounds
    pub fn is_leaf(&self) -> bool {
        self.right == self.left + 1
    }
}

/// One row of the nested-set index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// Row identifier, assigned on creation
    pub id: i64,

    /// Which tree this node belongs to
    pub tree_id: i64,

    /// Article header this position belongs to (owner of the content revisions)
    pub article_id: i64,

    /// Label unique among siblings; `None` only for the root
    pub path_segment: Option<String>,

    /// Parent row; `None` only for the root
    pub parent_id: Option<i64>,

    pub bounds: NodeBounds,
}

impl TreeNode {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// True when this node is a proper ancestor of `other` in the same tree
    pub fn is_ancestor_of(&self, other: &TreeNode) -> bool {
        self.tree_id == other.tree_id && self.bounds.contains(&other.bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i64, parent_id: Option<i64>, bounds: NodeBounds) -> TreeNode {
        TreeNode {
            id,
            tree_id: 1,
            article_id: id,
            path_segment: parent_id.map(|_| format!("n{}", id)),
            parent_id,
            bounds,
        }
    }

    #[test]
    fn test_root_bounds() {
        let root = NodeBounds::root();
        assert_eq!(root, NodeBounds::new(1, 2, 0));
        assert!(root.is_well_formed());
        assert!(root.is_leaf());
        assert_eq!(root.descendant_count(), 0);
    }

    #[test]
    fn test_descendant_count_matches_width() {
        // root with 3 descendants: right = left + 1 + 2 * 3
        let bounds = NodeBounds::new(1, 8, 0);
        assert_eq!(bounds.descendant_count(), 3);
        assert!(bounds.is_well_formed());
    }

    #[test]
    fn test_malformed_bounds() {
        assert!(!NodeBounds::new(3, 3, 1).is_well_formed());
        assert!(!NodeBounds::new(4, 2, 1).is_well_formed());
        assert!(!NodeBounds::new(2, 4, 1).is_well_formed());
    }

    #[test]
    fn test_containment_is_strict() {
        let a = NodeBounds::new(2, 7, 1);
        assert!(!a.contains(&a));
        assert!(a.contains(&NodeBounds::new(3, 4, 2)));
        assert!(!a.contains(&NodeBounds::new(8, 9, 1)));
        assert!(a.is_disjoint(&NodeBounds::new(8, 9, 1)));
        assert!(!a.is_disjoint(&NodeBounds::new(3, 4, 2)));
    }

    #[test]
    fn test_is_ancestor_of_requires_same_tree() {
        let root = node(1, None, NodeBounds::new(1, 4, 0));
        let child = node(2, Some(1), NodeBounds::new(2, 3, 1));
        assert!(root.is_root());
        assert!(root.is_ancestor_of(&child));
        assert!(!child.is_ancestor_of(&root));

        let mut foreign = child.clone();
        foreign.tree_id = 2;
        assert!(!root.is_ancestor_of(&foreign));
    }
}
