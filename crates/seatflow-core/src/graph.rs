//! Flow network wrapper around petgraph::StableDiGraph with paired residual edges

use crate::error::{FlowError, Result};
use crate::model::*;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::{Bfs, EdgeFiltered};
use std::collections::HashSet;

/// The capacitated network. Every edge added through [`FlowNetwork::add_edge`]
/// is stored as a forward half plus a zero-capacity reverse half; each half
/// holds the other's id and `forward.flow == -reverse.flow` at all times.
///
/// Nodes are fixed at construction and edges are never removed, so ids stay
/// dense and stable for the life of the network.
pub struct FlowNetwork {
    inner: StableDiGraph<NodeLabel, FlowEdge>,
    /// Per-node edge ids in insertion order, both halves included.
    outgoing: Vec<Vec<EdgeId>>,
}

impl std::fmt::Debug for FlowNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowNetwork")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .finish()
    }
}

impl FlowNetwork {
    /// Create a network with `node_count` nodes and no edges.
    pub fn new(node_count: usize) -> Self {
        let mut inner = StableDiGraph::with_capacity(node_count, 0);
        for _ in 0..node_count {
            inner.add_node(NodeLabel::default());
        }
        FlowNetwork {
            inner,
            outgoing: vec![Vec::new(); node_count],
        }
    }

    /// Attach a human-readable description to a node.
    pub fn describe(&mut self, node: NodeId, description: impl Into<String>) -> Result<()> {
        self.check_node(node)?;
        self.inner[NodeIndex::from(node)].description = Some(description.into());
        Ok(())
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Total number of edge halves (twice the number of added edges).
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Add a forward edge and its reverse half. Returns the forward id.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, capacity: Units) -> Result<EdgeId> {
        self.check_node(from)?;
        self.check_node(to)?;
        check_capacity(capacity)?;

        let forward = self.inner.add_edge(
            from.into(),
            to.into(),
            FlowEdge {
                capacity,
                flow: 0,
                reverse: EdgeId::default(),
                residual: false,
            },
        );
        let reverse = self.inner.add_edge(
            to.into(),
            from.into(),
            FlowEdge {
                capacity: 0,
                flow: 0,
                reverse: forward.into(),
                residual: true,
            },
        );
        self.inner[forward].reverse = reverse.into();

        self.outgoing[from.index()].push(forward.into());
        self.outgoing[to.index()].push(reverse.into());
        Ok(forward.into())
    }

    /// First edge in `from`'s list whose target is `to`.
    pub fn find_edge(&self, from: NodeId, to: NodeId) -> Result<EdgeId> {
        self.check_node(from)?;
        self.outgoing[from.index()]
            .iter()
            .copied()
            .find(|&id| self.target(id) == Some(to))
            .ok_or(FlowError::EdgeNotFound { from, to })
    }

    /// Number of forward edges from `from` to `to`.
    pub fn count_edges_between(&self, from: NodeId, to: NodeId) -> usize {
        self.edges_from(from).filter(|e| e.to == to).count()
    }

    /// Get an edge half by id.
    pub fn edge(&self, id: EdgeId) -> Option<&FlowEdge> {
        self.inner.edge_weight(id.into())
    }

    /// `(from, to)` of an edge half.
    pub fn endpoints(&self, id: EdgeId) -> Option<(NodeId, NodeId)> {
        self.inner
            .edge_endpoints(id.into())
            .map(|(a, b)| (a.into(), b.into()))
    }

    fn target(&self, id: EdgeId) -> Option<NodeId> {
        self.endpoints(id).map(|(_, to)| to)
    }

    /// Edge ids leaving `node` in insertion order, reverse halves included.
    pub fn outgoing(&self, node: NodeId) -> &[EdgeId] {
        self.outgoing
            .get(node.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Set the capacity of the `from -> to` edge. The reverse half mirrors
    /// the same value.
    pub fn set_capacity(&mut self, from: NodeId, to: NodeId, capacity: Units) -> Result<()> {
        let id = self.find_edge(from, to)?;
        self.set_capacity_of(id, capacity)
    }

    /// Set the capacity of an edge and its reverse half. Nothing is written
    /// unless both halves can be updated.
    pub fn set_capacity_of(&mut self, id: EdgeId, capacity: Units) -> Result<()> {
        check_capacity(capacity)?;
        let reverse = self.pair_of(id)?;
        self.inner[EdgeIndex::from(id)].capacity = capacity;
        self.inner[EdgeIndex::from(reverse)].capacity = capacity;
        Ok(())
    }

    /// Zero the flow on the `from -> to` edge pair.
    pub fn reset_flow(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        let id = self.find_edge(from, to)?;
        self.reset_flow_of(id)
    }

    pub fn reset_flow_of(&mut self, id: EdgeId) -> Result<()> {
        self.set_flow(id, 0)
    }

    /// Write `flow` on an edge and `-flow` on its pair.
    pub fn set_flow(&mut self, id: EdgeId, flow: Units) -> Result<()> {
        let reverse = self.pair_of(id)?;
        self.inner[EdgeIndex::from(id)].flow = flow;
        self.inner[EdgeIndex::from(reverse)].flow = -flow;
        Ok(())
    }

    /// Push `amount` along an edge half. Callers guarantee the id is valid.
    pub(crate) fn push(&mut self, id: EdgeId, amount: Units) {
        let edge = &mut self.inner[EdgeIndex::from(id)];
        edge.flow += amount;
        let reverse = edge.reverse;
        self.inner[EdgeIndex::from(reverse)].flow -= amount;
    }

    /// Zero the flow on every edge.
    pub fn clear_flows(&mut self) {
        let ids: Vec<EdgeIndex> = self.inner.edge_indices().collect();
        for idx in ids {
            self.inner[idx].flow = 0;
        }
    }

    /// Iterate over all nodes with their descriptions.
    pub fn nodes(&self) -> impl Iterator<Item = NodeView> + '_ {
        self.inner.node_indices().map(move |idx| NodeView {
            id: idx.into(),
            description: self.inner[idx].description.clone(),
        })
    }

    /// Forward edges leaving a node, in insertion order.
    pub fn edges_from(&self, node: NodeId) -> impl Iterator<Item = EdgeView> + '_ {
        self.outgoing(node)
            .iter()
            .filter(move |&&id| !self.is_residual(id))
            .filter_map(move |&id| self.view(id))
    }

    /// All forward edges, grouped by source node.
    pub fn all_edges(&self) -> impl Iterator<Item = EdgeView> + '_ {
        (0..self.node_count()).flat_map(move |n| self.edges_from(NodeId(n as u32)))
    }

    fn view(&self, id: EdgeId) -> Option<EdgeView> {
        let (from, to) = self.endpoints(id)?;
        let edge = self.edge(id)?;
        Some(EdgeView {
            id,
            from,
            to,
            capacity: edge.capacity,
            flow: edge.flow,
        })
    }

    fn is_residual(&self, id: EdgeId) -> bool {
        self.edge(id).is_some_and(|e| e.residual)
    }

    /// Flow carried by forward edges leaving `node`.
    pub fn outflow(&self, node: NodeId) -> Units {
        self.halves(node, false).map(|e| e.flow).sum()
    }

    /// Flow carried by forward edges entering `node`.
    pub fn inflow(&self, node: NodeId) -> Units {
        self.halves(node, true).map(|e| -e.flow).sum()
    }

    /// `outflow - inflow`.
    pub fn net_outflow(&self, node: NodeId) -> Units {
        self.outflow(node) - self.inflow(node)
    }

    fn halves(&self, node: NodeId, residual: bool) -> impl Iterator<Item = &FlowEdge> + '_ {
        self.outgoing(node)
            .iter()
            .filter_map(move |&id| self.edge(id))
            .filter(move |e| e.residual == residual)
    }

    /// Nodes reachable from `from` over edges with positive residual capacity.
    pub fn residual_reachable(&self, from: NodeId) -> HashSet<NodeId> {
        let mut reached = HashSet::new();
        if self.check_node(from).is_err() {
            return reached;
        }
        let filtered =
            EdgeFiltered::from_fn(&self.inner, |edge| edge.weight().residual_capacity() > 0);
        let mut bfs = Bfs::new(&filtered, from.into());
        while let Some(idx) = bfs.next(&filtered) {
            reached.insert(idx.into());
        }
        reached
    }

    fn pair_of(&self, id: EdgeId) -> Result<EdgeId> {
        self.edge(id)
            .map(|e| e.reverse)
            .ok_or(FlowError::UnknownEdge { id })
    }

    pub(crate) fn check_node(&self, node: NodeId) -> Result<()> {
        if node.index() < self.node_count() {
            Ok(())
        } else {
            Err(FlowError::NodeOutOfRange {
                node,
                node_count: self.node_count(),
            })
        }
    }
}

pub(crate) fn check_capacity(capacity: Units) -> Result<()> {
    if (0..=MAX_CAPACITY).contains(&capacity) {
        Ok(())
    } else {
        Err(FlowError::InvalidCapacity { capacity })
    }
}
