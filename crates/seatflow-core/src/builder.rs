//! Validated construction of an [`Allocator`]

use crate::error::{FlowError, Result};
use crate::graph::FlowNetwork;
use crate::ledger::Ledger;
use crate::model::{NodeId, Units};
use crate::protocol::Allocator;
use tracing::debug;

#[derive(Debug, Clone)]
struct ResourceDecl {
    name: String,
    node: NodeId,
    capacity_node: NodeId,
}

/// Collects topology and resource declarations, then checks them all at
/// once in [`build`](NetworkBuilder::build).
///
/// ```
/// use seatflow_core::{NetworkBuilder, NodeId};
///
/// let mut alloc = NetworkBuilder::new(4)
///     .source(NodeId(0))
///     .sink(NodeId(3))
///     .edge(NodeId(0), NodeId(1), 5)
///     .edge(NodeId(1), NodeId(2), 3)
///     .edge(NodeId(2), NodeId(3), 3)
///     .resource("R1", NodeId(1), NodeId(2))
///     .build()
///     .unwrap();
/// assert_eq!(alloc.solve().unwrap().max_flow, 3);
/// ```
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    node_count: usize,
    source: NodeId,
    sink: NodeId,
    descriptions: Vec<(NodeId, String)>,
    edges: Vec<(NodeId, NodeId, Units)>,
    resources: Vec<ResourceDecl>,
}

impl NetworkBuilder {
    /// Start a network of `node_count` nodes. Source defaults to node 0 and
    /// sink to the last node.
    pub fn new(node_count: usize) -> Self {
        NetworkBuilder {
            node_count,
            source: NodeId(0),
            sink: NodeId(node_count.saturating_sub(1) as u32),
            descriptions: Vec::new(),
            edges: Vec::new(),
            resources: Vec::new(),
        }
    }

    pub fn source(mut self, node: NodeId) -> Self {
        self.source = node;
        self
    }

    pub fn sink(mut self, node: NodeId) -> Self {
        self.sink = node;
        self
    }

    pub fn describe(mut self, node: NodeId, description: impl Into<String>) -> Self {
        self.descriptions.push((node, description.into()));
        self
    }

    pub fn edge(mut self, from: NodeId, to: NodeId, capacity: Units) -> Self {
        self.edges.push((from, to, capacity));
        self
    }

    /// Declare `node` as a resource whose seats are the single edge
    /// `node -> capacity_node`.
    pub fn resource(mut self, name: impl Into<String>, node: NodeId, capacity_node: NodeId) -> Self {
        self.resources.push(ResourceDecl {
            name: name.into(),
            node,
            capacity_node,
        });
        self
    }

    pub fn build(self) -> Result<Allocator> {
        let mut network = FlowNetwork::new(self.node_count);
        network.check_node(self.source)?;
        network.check_node(self.sink)?;
        if self.source == self.sink {
            return Err(FlowError::SourceIsSink { node: self.source });
        }

        for (node, description) in self.descriptions {
            network.describe(node, description)?;
        }
        for (from, to, capacity) in self.edges {
            network.add_edge(from, to, capacity)?;
        }

        let mut ledger = Ledger::new();
        for decl in self.resources {
            network.check_node(decl.node)?;
            network.check_node(decl.capacity_node)?;
            let count = network.count_edges_between(decl.node, decl.capacity_node);
            if count > 1 {
                return Err(FlowError::AmbiguousResourceEdge {
                    node: decl.node,
                    capacity_node: decl.capacity_node,
                    count,
                });
            }
            let edge = network
                .edges_from(decl.node)
                .find(|e| e.to == decl.capacity_node)
                .ok_or(FlowError::EdgeNotFound {
                    from: decl.node,
                    to: decl.capacity_node,
                })?;
            let id = ledger.register(
                decl.name,
                decl.node,
                decl.capacity_node,
                edge.id,
                edge.capacity,
            )?;
            debug!(
                "Registered resource {} on edge {} -> {} (capacity {})",
                id, decl.node, decl.capacity_node, edge.capacity
            );
        }

        Ok(Allocator::from_parts(network, ledger, self.source, self.sink))
    }
}
