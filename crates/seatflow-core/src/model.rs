//! Core data structures for the flow network and the allocation ledger

use std::fmt;

use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};

/// Amount of flow, capacity, or seats. Always an integer.
pub type Units = i64;

/// Largest capacity accepted on any edge. Anything above is treated as
/// unbounded and rejected, which keeps excess sums far from overflow.
pub const MAX_CAPACITY: Units = u32::MAX as Units;

/// Node identifier in `[0, node_count)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Edge identifier. Forward and reverse halves of a pair have distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct EdgeId(pub u32);

/// Resource identifier, assigned in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct ResourceId(pub u32);

impl ResourceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Bridges to petgraph indices.

impl From<NodeIndex> for NodeId {
    fn from(idx: NodeIndex) -> Self {
        NodeId(idx.index() as u32)
    }
}

impl From<NodeId> for NodeIndex {
    fn from(id: NodeId) -> Self {
        NodeIndex::new(id.index())
    }
}

impl From<EdgeIndex> for EdgeId {
    fn from(idx: EdgeIndex) -> Self {
        EdgeId(idx.index() as u32)
    }
}

impl From<EdgeId> for EdgeIndex {
    fn from(id: EdgeId) -> Self {
        EdgeIndex::new(id.0 as usize)
    }
}

/// Node weight stored in the network. Only carries presentation data;
/// roles come from topology.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeLabel {
    pub description: Option<String>,
}

/// One half of a forward/reverse edge pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub capacity: Units,
    /// Negative on the reverse half while the forward half carries flow.
    pub flow: Units,
    /// The paired half.
    pub reverse: EdgeId,
    /// True for the reverse half created alongside a forward edge.
    pub residual: bool,
}

impl FlowEdge {
    /// Capacity still available for pushing along this half. A reverse
    /// half can only cancel flow its pair carries, whatever capacity it
    /// mirrors.
    pub fn residual_capacity(&self) -> Units {
        if self.residual {
            -self.flow
        } else {
            self.capacity - self.flow
        }
    }
}

// ── Read-only views ─────────────────────────────────────────

/// A node and its description, for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: NodeId,
    pub description: Option<String>,
}

/// A forward edge as seen by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeView {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub capacity: Units,
    pub flow: Units,
}

/// Lifecycle of a resource. Cancellation is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Active,
    Canceled,
}

/// Per-resource bookkeeping snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub id: ResourceId,
    pub name: String,
    pub assigned: Units,
    pub remaining: Units,
    pub waiting: Units,
    pub refunded: Units,
    pub canceled: bool,
}
