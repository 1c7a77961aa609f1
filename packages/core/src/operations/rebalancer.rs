//! Interval Rebalancer
//!
//! After a new leaf has been stored at `(new_left, new_left + 1)`, every
//! other node at or beyond `new_left` moves right by two:
//!
//! - `right >= new_left` gains 2. This catches the parent (whose right bound
//!   is exactly `new_left`), every ancestor, and everything to the right.
//! - `left >= new_left` gains 2. Ancestors are not matched here: their left
//!   bound stays put while their right bound grows around the new child.
//!
//! The two predicates are kept apart on purpose; a single combined
//! condition would skip the ancestors.

use crate::db::{node_store, DatabaseError};
use crate::operations::TreeError;
use libsql::Connection;

const OPERATION: &str = "rebalance";

/// Width of one node in the nested-set numbering
pub const NODE_WIDTH: i64 = 2;

/// Rows touched by each pass of a rebalance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RebalanceOutcome {
    pub rights_shifted: u64,
    pub lefts_shifted: u64,
}

pub struct IntervalRebalancer;

impl IntervalRebalancer {
    /// Shift every node of `tree_id` except `new_node_id` to make room at `new_left`
    ///
    /// Must run inside the transaction that inserted `new_node_id`, after the
    /// new row holds its final bounds.
    pub async fn rebalance(
        conn: &Connection,
        tree_id: i64,
        new_node_id: i64,
        new_left: i64,
    ) -> Result<RebalanceOutcome, TreeError> {
        // Rights first: shifting lefts first would briefly give leaves
        // left > right and trip CHECK (rght > lft).
        let rights_shifted = conn
            .execute(
                "UPDATE tree_node SET rght = rght + ?
                 WHERE tree_id = ? AND id != ? AND rght >= ?",
                (NODE_WIDTH, tree_id, new_node_id, new_left),
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to shift right bounds: {}", e))
            })
            .map_err(TreeError::storage(OPERATION))?;

        let lefts_shifted = conn
            .execute(
                "UPDATE tree_node SET lft = lft + ?
                 WHERE tree_id = ? AND id != ? AND lft >= ?",
                (NODE_WIDTH, tree_id, new_node_id, new_left),
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to shift left bounds: {}", e))
            })
            .map_err(TreeError::storage(OPERATION))?;

        tracing::debug!(
            "Rebalanced tree {} around node {} at {}: {} rights, {} lefts shifted",
            tree_id,
            new_node_id,
            new_left,
            rights_shifted,
            lefts_shifted
        );

        Ok(RebalanceOutcome {
            rights_shifted,
            lefts_shifted,
        })
    }

    /// Post-rebalance sanity check for one insertion
    ///
    /// Confirms that the parent strictly encloses the new node one level up,
    /// that no interval is empty or inverted, and that the root spans exactly
    /// two integers per node. Any failure is an invariant violation and the
    /// caller must abort.
    pub async fn verify_insert(
        conn: &Connection,
        tree_id: i64,
        parent_id: i64,
        new_node_id: i64,
    ) -> Result<(), TreeError> {
        let parent = node_store::get_node(conn, tree_id, parent_id)
            .await
            .map_err(TreeError::storage(OPERATION))?
            .ok_or_else(|| {
                TreeError::invariant_violation(
                    OPERATION,
                    format!("parent {} vanished during insert", parent_id),
                )
            })?;
        let child = node_store::get_node(conn, tree_id, new_node_id)
            .await
            .map_err(TreeError::storage(OPERATION))?
            .ok_or_else(|| {
                TreeError::invariant_violation(
                    OPERATION,
                    format!("new node {} missing after insert", new_node_id),
                )
            })?;

        if !parent.bounds.contains(&child.bounds) || child.bounds.level != parent.bounds.level + 1
        {
            return Err(TreeError::invariant_violation(
                OPERATION,
                format!(
                    "parent {} {:?} does not enclose new node {} {:?}",
                    parent.id, parent.bounds, child.id, child.bounds
                ),
            ));
        }

        let malformed = node_store::count_malformed(conn, tree_id)
            .await
            .map_err(TreeError::storage(OPERATION))?;
        if malformed > 0 {
            return Err(TreeError::invariant_violation(
                OPERATION,
                format!("{} nodes have left >= right", malformed),
            ));
        }

        let root = node_store::get_root(conn, tree_id)
            .await
            .map_err(TreeError::storage(OPERATION))?
            .ok_or_else(|| {
                TreeError::invariant_violation(OPERATION, format!("tree {} has no root", tree_id))
            })?;
        let count = node_store::count_nodes(conn, tree_id)
            .await
            .map_err(TreeError::storage(OPERATION))?;
        if root.bounds.left != 1 || root.bounds.right != NODE_WIDTH * count {
            return Err(TreeError::invariant_violation(
                OPERATION,
                format!(
                    "root spans {:?} but tree holds {} nodes",
                    root.bounds, count
                ),
            ));
        }

        Ok(())
    }
}
