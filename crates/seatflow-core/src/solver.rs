//! FIFO push-relabel maximum flow over a [`FlowNetwork`]

use crate::error::{FlowError, Result};
use crate::graph::FlowNetwork;
use crate::model::{NodeId, Units};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Counters from a single solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveStats {
    /// Net flow leaving the source.
    pub max_flow: Units,
    pub pushes: u64,
    pub relabels: u64,
}

/// Push-relabel solver with a FIFO active-node queue.
///
/// Heights and excess are scratch state: they are reset at the start of
/// every [`solve`](PushRelabel::solve) and can be inspected afterwards.
#[derive(Debug, Default)]
pub struct PushRelabel {
    height: Vec<usize>,
    excess: Vec<Units>,
}

/// FIFO worklist that never holds the same node twice.
struct ActiveQueue {
    queue: VecDeque<NodeId>,
    queued: Vec<bool>,
}

impl ActiveQueue {
    fn new(node_count: usize) -> Self {
        ActiveQueue {
            queue: VecDeque::new(),
            queued: vec![false; node_count],
        }
    }

    fn push(&mut self, node: NodeId) {
        if !self.queued[node.index()] {
            self.queued[node.index()] = true;
            self.queue.push_back(node);
        }
    }

    fn pop(&mut self) -> Option<NodeId> {
        let node = self.queue.pop_front()?;
        self.queued[node.index()] = false;
        Some(node)
    }
}

impl PushRelabel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Height of a node after the last solve.
    pub fn height(&self, node: NodeId) -> Option<usize> {
        self.height.get(node.index()).copied()
    }

    /// Excess of a node after the last solve. Zero everywhere except the
    /// source and sink once a solve has finished.
    pub fn excess(&self, node: NodeId) -> Option<Units> {
        self.excess.get(node.index()).copied()
    }

    /// Compute a maximum flow from `source` to `sink`.
    ///
    /// Every edge's flow is cleared first, so the result depends only on the
    /// network's current capacities. Runs to completion.
    pub fn solve(
        &mut self,
        network: &mut FlowNetwork,
        source: NodeId,
        sink: NodeId,
    ) -> Result<SolveStats> {
        network.check_node(source)?;
        network.check_node(sink)?;
        if source == sink {
            return Err(FlowError::SourceIsSink { node: source });
        }

        let n = network.node_count();
        network.clear_flows();
        self.height.clear();
        self.height.resize(n, 0);
        self.excess.clear();
        self.excess.resize(n, 0);
        self.height[source.index()] = n;

        let mut stats = SolveStats::default();
        let mut active = ActiveQueue::new(n);

        // Saturate the source's forward edges.
        for i in 0..network.outgoing(source).len() {
            let id = network.outgoing(source)[i];
            let (Some(edge), Some((_, to))) = (network.edge(id).copied(), network.endpoints(id))
            else {
                continue;
            };
            if edge.residual || edge.capacity <= 0 || to == source {
                continue;
            }
            network.push(id, edge.capacity);
            self.excess[to.index()] += edge.capacity;
            self.excess[source.index()] -= edge.capacity;
            if to != sink {
                active.push(to);
            }
        }

        while let Some(u) = active.pop() {
            if self.excess[u.index()] <= 0 {
                continue;
            }
            self.discharge(network, u, source, sink, &mut active, &mut stats);
        }

        stats.max_flow = network.net_outflow(source);
        debug!(
            "Solved {} -> {}: max flow {}, {} pushes, {} relabels",
            source, sink, stats.max_flow, stats.pushes, stats.relabels
        );
        Ok(stats)
    }

    /// Push excess out of `u` along admissible edges in list order, then
    /// relabel and requeue it if any excess is left.
    fn discharge(
        &mut self,
        network: &mut FlowNetwork,
        u: NodeId,
        source: NodeId,
        sink: NodeId,
        active: &mut ActiveQueue,
        stats: &mut SolveStats,
    ) {
        let mut i = 0;
        while self.excess[u.index()] > 0 && i < network.outgoing(u).len() {
            let id = network.outgoing(u)[i];
            i += 1;

            let (Some(edge), Some((_, v))) = (network.edge(id).copied(), network.endpoints(id))
            else {
                continue;
            };
            let residual = edge.residual_capacity();
            if residual <= 0 || self.height[u.index()] != self.height[v.index()] + 1 {
                continue;
            }

            let amount = self.excess[u.index()].min(residual);
            network.push(id, amount);
            self.excess[u.index()] -= amount;
            self.excess[v.index()] += amount;
            stats.pushes += 1;

            if v != source && v != sink && self.excess[v.index()] > 0 {
                active.push(v);
            }
        }

        if self.excess[u.index()] > 0 {
            if self.relabel(network, u) {
                stats.relabels += 1;
                active.push(u);
            } else {
                warn!(
                    "Node {} has excess {} but no residual edges; leaving it stranded",
                    u,
                    self.excess[u.index()]
                );
            }
        }
    }

    /// Lift `u` to one above its lowest residual neighbour. Returns false
    /// when `u` has no residual edge at all.
    fn relabel(&mut self, network: &FlowNetwork, u: NodeId) -> bool {
        let lowest = network
            .outgoing(u)
            .iter()
            .filter_map(|&id| {
                let edge = network.edge(id)?;
                let (_, v) = network.endpoints(id)?;
                (edge.residual_capacity() > 0).then(|| self.height[v.index()])
            })
            .min();

        match lowest {
            Some(h) => {
                self.height[u.index()] = h + 1;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_valid_max_flow, n};

    #[test]
    fn single_edge() {
        let mut net = FlowNetwork::new(2);
        net.add_edge(n(0), n(1), 5).unwrap();
        let stats = PushRelabel::new().solve(&mut net, n(0), n(1)).unwrap();
        assert_eq!(stats.max_flow, 5);
        assert_valid_max_flow(&net, n(0), n(1));
    }

    #[test]
    fn bottleneck_resource_caps_flow() {
        // source -> A(15), source -> B(40), A -> R1(10), B -> R1(20),
        // R1 -> cap(20), cap -> sink(20)
        let mut net = FlowNetwork::new(6);
        net.add_edge(n(0), n(1), 15).unwrap();
        net.add_edge(n(0), n(2), 40).unwrap();
        net.add_edge(n(1), n(3), 10).unwrap();
        net.add_edge(n(2), n(3), 20).unwrap();
        let r1 = net.add_edge(n(3), n(4), 20).unwrap();
        net.add_edge(n(4), n(5), 20).unwrap();

        let stats = PushRelabel::new().solve(&mut net, n(0), n(5)).unwrap();
        assert_eq!(stats.max_flow, 20);
        assert_eq!(net.edge(r1).unwrap().flow, 20);
        assert_valid_max_flow(&net, n(0), n(5));
    }

    #[test]
    fn textbook_network() {
        let mut net = FlowNetwork::new(6);
        for (from, to, cap) in [
            (0, 1, 16),
            (0, 2, 13),
            (1, 2, 10),
            (2, 1, 4),
            (1, 3, 12),
            (3, 2, 9),
            (2, 4, 14),
            (4, 3, 7),
            (3, 5, 20),
            (4, 5, 4),
        ] {
            net.add_edge(n(from), n(to), cap).unwrap();
        }

        let mut solver = PushRelabel::new();
        let stats = solver.solve(&mut net, n(0), n(5)).unwrap();
        assert_eq!(stats.max_flow, 23);
        assert_valid_max_flow(&net, n(0), n(5));
        assert_eq!(solver.height(n(0)), Some(6));
        for node in 1..5 {
            assert_eq!(solver.excess(n(node)), Some(0));
        }
    }

    #[test]
    fn excess_returns_to_source_when_sink_is_narrow() {
        let mut net = FlowNetwork::new(4);
        net.add_edge(n(0), n(1), 100).unwrap();
        net.add_edge(n(1), n(2), 100).unwrap();
        net.add_edge(n(2), n(3), 1).unwrap();

        let stats = PushRelabel::new().solve(&mut net, n(0), n(3)).unwrap();
        assert_eq!(stats.max_flow, 1);
        assert!(stats.relabels > 0);
        assert_valid_max_flow(&net, n(0), n(3));
    }

    #[test]
    fn disconnected_sink_gets_nothing() {
        let mut net = FlowNetwork::new(4);
        net.add_edge(n(0), n(1), 3).unwrap();
        net.add_edge(n(2), n(3), 3).unwrap();

        let stats = PushRelabel::new().solve(&mut net, n(0), n(3)).unwrap();
        assert_eq!(stats.max_flow, 0);
        assert_valid_max_flow(&net, n(0), n(3));
    }

    #[test]
    fn parallel_edges_and_zero_capacity() {
        let mut net = FlowNetwork::new(3);
        net.add_edge(n(0), n(1), 2).unwrap();
        net.add_edge(n(0), n(1), 3).unwrap();
        net.add_edge(n(0), n(2), 0).unwrap();
        net.add_edge(n(1), n(2), 4).unwrap();

        let stats = PushRelabel::new().solve(&mut net, n(0), n(2)).unwrap();
        assert_eq!(stats.max_flow, 4);
        assert_valid_max_flow(&net, n(0), n(2));
    }

    #[test]
    fn resolve_after_capacity_change() {
        let mut net = FlowNetwork::new(3);
        net.add_edge(n(0), n(1), 10).unwrap();
        net.add_edge(n(1), n(2), 4).unwrap();
        let mut solver = PushRelabel::new();
        assert_eq!(solver.solve(&mut net, n(0), n(2)).unwrap().max_flow, 4);

        net.set_capacity(n(1), n(2), 8).unwrap();
        assert_eq!(solver.solve(&mut net, n(0), n(2)).unwrap().max_flow, 8);
        assert_valid_max_flow(&net, n(0), n(2));

        net.set_capacity(n(1), n(2), 0).unwrap();
        assert_eq!(solver.solve(&mut net, n(0), n(2)).unwrap().max_flow, 0);
    }

    #[test]
    fn rejects_bad_terminals() {
        let mut net = FlowNetwork::new(2);
        net.add_edge(n(0), n(1), 1).unwrap();
        let mut solver = PushRelabel::new();
        assert_eq!(
            solver.solve(&mut net, n(1), n(1)),
            Err(FlowError::SourceIsSink { node: n(1) })
        );
        assert!(matches!(
            solver.solve(&mut net, n(0), n(9)),
            Err(FlowError::NodeOutOfRange { .. })
        ));
    }
}
