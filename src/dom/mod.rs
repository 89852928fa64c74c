//! DOM arena: slotmap-backed node tree with element traversal and selector
//! queries.

pub mod node;
pub mod tree;
pub mod traversal;
pub mod query;

pub use node::{NodeData, NodeId, NodeKind};
pub use tree::Dom;
