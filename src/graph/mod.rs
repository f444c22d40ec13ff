//! Canonical article graph: seeding, incremental expansion and relabeling.

mod store;
mod types;

pub use store::{ExpandOutcome, Graph, GraphStore, relabeled_id};
pub use types::{GraphLink, GraphNode, GraphSnapshot, LINKED_WEIGHT, ROOT_WEIGHT};
