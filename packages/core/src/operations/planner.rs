use crate::models::NodeBounds;

/// Computes the nested-set position of a new node
///
/// A new child takes the two integers at the parent's current right bound,
/// which makes it the right-most child and leaves earlier siblings where
/// they are. The parent bounds must be read in the same transaction that
/// performs the insert.
pub struct InsertPlanner;

impl InsertPlanner {
    /// Position of a new child given the parent's level and current right bound
    ///
    /// # Examples
    /// ```
    /// # use wikitree_core::operations::InsertPlanner;
    /// # use wikitree_core::models::NodeBounds;
    /// // first child of a fresh root (1, 2)
    /// assert_eq!(InsertPlanner::plan(0, 2), NodeBounds::new(2, 3, 1));
    ///
    /// // second child once the root has grown to (1, 4)
    /// assert_eq!(InsertPlanner::plan(0, 4), NodeBounds::new(4, 5, 1));
    /// ```
    pub fn plan(parent_level: i64, parent_right: i64) -> NodeBounds {
        NodeBounds::new(parent_right, parent_right + 1, parent_level + 1)
    }

    /// Position of a new child of a node with `parent` bounds
    pub fn plan_child(parent: &NodeBounds) -> NodeBounds {
        Self::plan(parent.level, parent.right)
    }

    /// Position of a tree's root
    pub fn plan_root() -> NodeBounds {
        NodeBounds::root()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_root() {
        assert_eq!(InsertPlanner::plan_root(), NodeBounds::new(1, 2, 0));
    }

    #[test]
    fn test_plan_first_child() {
        let root = NodeBounds::root();
        assert_eq!(InsertPlanner::plan_child(&root), NodeBounds::new(2, 3, 1));
    }

    #[test]
    fn test_plan_nested_child() {
        // child (2, 5) with one grandchild at (3, 4)
        let parent = NodeBounds::new(2, 5, 1);
        assert_eq!(InsertPlanner::plan_child(&parent), NodeBounds::new(5, 6, 2));
    }

    #[test]
    fn test_planned_bounds_are_leaf() {
        let planned = InsertPlanner::plan(3, 17);
        assert!(planned.is_leaf());
        assert!(planned.is_well_formed());
        assert_eq!(planned.level, 4);
    }
}
