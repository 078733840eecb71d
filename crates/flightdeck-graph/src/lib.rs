//! flightdeck-graph - Hierarchical task graph derived from event streams.
//!
//! Folds an ordered event slice into a Goal → Task → Step → ToolCall tree.
//! The graph is a derived, recomputable view - never authoritative. If a
//! graph is persisted anywhere it is a cache that can always be rebuilt
//! from the event log.
//!
//! The input slice is assumed to be time-ordered; out-of-order events
//! yield an undefined hierarchy (a documented precondition, not a defended
//! invariant).

mod builder;
mod layout;
mod node;

pub use builder::{GraphBuilder, GraphConfig};
pub use node::{EdgeKind, GraphEdge, GraphNode, NodeKind, Position, TaskGraph};
