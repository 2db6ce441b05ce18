//! Error types for seatflow-core.
//!
//! Shortfalls and repeated cancellations are ordinary outcomes and are
//! reported through return values, not through this enum.

use crate::model::{EdgeId, NodeId, ResourceId, Units};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FlowError>;

/// Failures raised by the graph store, solver, and allocation protocol.
/// Every operation that returns one of these leaves state unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// Negative or unbounded capacity requested.
    #[error("invalid capacity {capacity}: must be between 0 and {max}", max = crate::model::MAX_CAPACITY)]
    InvalidCapacity { capacity: Units },

    /// No edge from `from` to `to`; the caller's topology assumption is wrong.
    #[error("no edge from node {from} to node {to}")]
    EdgeNotFound { from: NodeId, to: NodeId },

    /// An edge id that does not belong to this network.
    #[error("unknown edge {id}")]
    UnknownEdge { id: EdgeId },

    #[error("node {node} is out of range for a network of {node_count} nodes")]
    NodeOutOfRange { node: NodeId, node_count: usize },

    #[error("source and sink are the same node ({node})")]
    SourceIsSink { node: NodeId },

    #[error("unknown resource {id}")]
    UnknownResource { id: ResourceId },

    /// No resource registered under this name.
    #[error("unknown resource '{name}'")]
    UnknownResourceName { name: String },

    /// The operation needs an active resource.
    #[error("resource '{name}' is canceled")]
    ResourceCanceled { name: String },

    #[error("duplicate resource name '{name}'")]
    DuplicateResource { name: String },

    /// A resource node has more than one edge to its capacity node.
    #[error("resource node {node} has {count} edges to capacity node {capacity_node}, expected exactly one")]
    AmbiguousResourceEdge {
        node: NodeId,
        capacity_node: NodeId,
        count: usize,
    },
}
