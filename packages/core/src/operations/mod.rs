//! Tree Operations
//!
//! The nested-set algorithm, independent of transaction handling:
//!
//! - [`InsertPlanner`] - where a new node goes
//! - [`IntervalRebalancer`] - shifting existing intervals to make room
//! - [`LookupResolver`] - point and containment queries
//! - [`integrity`] - whole-tree invariant check
//! - [`TreeError`] - error taxonomy shared by all tree operations

mod error;
pub mod integrity;
mod lookup;
mod planner;
mod rebalancer;

pub use error::TreeError;
pub use lookup::LookupResolver;
pub use planner::InsertPlanner;
pub use rebalancer::{IntervalRebalancer, RebalanceOutcome, NODE_WIDTH};
