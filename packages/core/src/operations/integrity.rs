//! Whole-tree invariant check
//!
//! [`verify_tree`] walks the nodes of one tree in document order with a stack
//! of open ancestors and checks:
//!
//! 1. exactly one root, with `left = 1` and `level = 0`
//! 2. `right = left + 1 + 2 * descendants` for every node
//! 3. intervals nest or are disjoint, and each node sits directly inside the
//!    node its `parent_id` names
//! 4. `level` is the parent's level plus one
//! 5. path segments are unique among the children of one parent
//!
//! The bounds also have to use every integer in `1..=2n` exactly once.

use crate::models::TreeNode;
use crate::operations::TreeError;
use std::collections::HashSet;

const OPERATION: &str = "verify_tree";

fn violation(detail: String) -> TreeError {
    TreeError::invariant_violation(OPERATION, detail)
}

/// Check all nested-set invariants over the nodes of a single tree
pub fn verify_tree(nodes: &[TreeNode]) -> Result<(), TreeError> {
    if nodes.is_empty() {
        return Ok(());
    }

    let mut sorted: Vec<&TreeNode> = nodes.iter().collect();
    sorted.sort_by_key(|n| n.bounds.left);

    let tree_id = sorted[0].tree_id;
    if let Some(stray) = sorted.iter().find(|n| n.tree_id != tree_id) {
        return Err(violation(format!(
            "node {} belongs to tree {}, expected {}",
            stray.id, stray.tree_id, tree_id
        )));
    }

    let roots: Vec<&&TreeNode> = sorted.iter().filter(|n| n.is_root()).collect();
    if roots.len() != 1 {
        return Err(violation(format!("expected one root, found {}", roots.len())));
    }
    let root = roots[0];
    if root.bounds.left != 1 || root.bounds.level != 0 {
        return Err(violation(format!(
            "root {} has bounds {:?}",
            root.id, root.bounds
        )));
    }

    let mut numbers: Vec<i64> = sorted
        .iter()
        .flat_map(|n| [n.bounds.left, n.bounds.right])
        .collect();
    numbers.sort_unstable();
    let expected: Vec<i64> = (1..=2 * sorted.len() as i64).collect();
    if numbers != expected {
        return Err(violation(
            "bounds do not use each integer of 1..=2n exactly once".to_string(),
        ));
    }

    let lefts: Vec<i64> = sorted.iter().map(|n| n.bounds.left).collect();
    let mut open: Vec<&TreeNode> = Vec::new();
    let mut segments: HashSet<(i64, &str)> = HashSet::new();

    for node in &sorted {
        let bounds = node.bounds;
        if !bounds.is_well_formed() {
            return Err(violation(format!(
                "node {} has malformed bounds {:?}",
                node.id, bounds
            )));
        }

        // nodes are sorted by left, so lefts inside (left, right) are descendants
        let start = lefts.partition_point(|&l| l <= bounds.left);
        let end = lefts.partition_point(|&l| l < bounds.right);
        let descendants = (end - start) as i64;
        if bounds.descendant_count() != descendants {
            return Err(violation(format!(
                "node {} spans {:?} but has {} descendants",
                node.id, bounds, descendants
            )));
        }

        while open
            .last()
            .is_some_and(|top| top.bounds.right < bounds.left)
        {
            open.pop();
        }

        match (open.last(), node.parent_id) {
            (None, None) => {}
            (Some(enclosing), Some(parent_id)) => {
                if !enclosing.bounds.contains(&bounds) {
                    return Err(violation(format!(
                        "node {} {:?} partially overlaps node {} {:?}",
                        node.id, bounds, enclosing.id, enclosing.bounds
                    )));
                }
                if enclosing.id != parent_id {
                    return Err(violation(format!(
                        "node {} points at parent {} but sits inside node {}",
                        node.id, parent_id, enclosing.id
                    )));
                }
                if bounds.level != enclosing.bounds.level + 1 {
                    return Err(violation(format!(
                        "node {} has level {} under parent level {}",
                        node.id, bounds.level, enclosing.bounds.level
                    )));
                }
                let segment = node.path_segment.as_deref().ok_or_else(|| {
                    violation(format!("child node {} has no path segment", node.id))
                })?;
                if !segments.insert((parent_id, segment)) {
                    return Err(violation(format!(
                        "path segment '{}' repeated under node {}",
                        segment, parent_id
                    )));
                }
            }
            (None, Some(parent_id)) => {
                return Err(violation(format!(
                    "node {} points at parent {} but lies outside the root",
                    node.id, parent_id
                )));
            }
            (Some(enclosing), None) => {
                return Err(violation(format!(
                    "root {} lies inside node {}",
                    node.id, enclosing.id
                )));
            }
        }

        open.push(node);
    }

    Ok(())
}
