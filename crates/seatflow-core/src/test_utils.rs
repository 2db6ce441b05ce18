//! Test utilities for seatflow-core

use crate::builder::NetworkBuilder;
use crate::decision::{Decision, DecisionMaker, Event};
use crate::graph::FlowNetwork;
use crate::model::NodeId;
use crate::protocol::Allocator;
use std::collections::VecDeque;

pub fn n(id: u32) -> NodeId {
    NodeId(id)
}

/// Replays a fixed list of decisions and records every event it was asked
/// about. Panics if asked more often than scripted.
pub struct Scripted {
    answers: VecDeque<Decision>,
    pub events: Vec<Event>,
}

impl Scripted {
    pub fn new(answers: Vec<Decision>) -> Self {
        Scripted {
            answers: answers.into(),
            events: Vec::new(),
        }
    }
}

impl DecisionMaker for Scripted {
    fn decide(&mut self, event: &Event) -> Decision {
        self.events.push(*event);
        self.answers
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected decision request: {:?}", event))
    }
}

/// Check every flow property a finished solve must satisfy.
pub fn assert_valid_max_flow(net: &FlowNetwork, source: NodeId, sink: NodeId) {
    for node in net.nodes().map(|v| v.id) {
        for &id in net.outgoing(node) {
            let edge = net.edge(id).unwrap();
            let pair = net.edge(edge.reverse).unwrap();
            assert_eq!(edge.flow, -pair.flow, "edge {} is not mirrored", id);
            assert_eq!(pair.reverse, id, "edge {} pair does not point back", id);
            if !edge.residual {
                assert!(
                    0 <= edge.flow && edge.flow <= edge.capacity,
                    "edge {} carries {} of {}",
                    id,
                    edge.flow,
                    edge.capacity
                );
            }
        }
        if node != source && node != sink {
            assert_eq!(net.inflow(node), net.outflow(node), "node {} leaks flow", node);
        }
    }

    assert_eq!(net.net_outflow(source), -net.net_outflow(sink));
    assert!(
        !net.residual_reachable(source).contains(&sink),
        "augmenting path left from {} to {}",
        source,
        sink
    );
}

/// The three-flight network: source 0, flights 1-3, demand classes 4-6,
/// capacity nodes 7-9, sink 10.
pub fn flight_allocator() -> Allocator {
    NetworkBuilder::new(11)
        .source(n(0))
        .sink(n(10))
        .describe(n(0), "SOURCE")
        .describe(n(10), "SINK")
        .edge(n(0), n(4), 15)
        .edge(n(0), n(5), 40)
        .edge(n(0), n(6), 10)
        .edge(n(4), n(1), 10)
        .edge(n(4), n(2), 10)
        .edge(n(4), n(3), 10)
        .edge(n(5), n(1), 20)
        .edge(n(5), n(2), 20)
        .edge(n(5), n(3), 20)
        .edge(n(6), n(1), 5)
        .edge(n(6), n(2), 5)
        .edge(n(1), n(7), 20)
        .edge(n(2), n(8), 30)
        .edge(n(3), n(9), 25)
        .edge(n(7), n(10), 20)
        .edge(n(8), n(10), 30)
        .edge(n(9), n(10), 25)
        .resource("Flight 1", n(1), n(7))
        .resource("Flight 2", n(2), n(8))
        .resource("Flight 3", n(3), n(9))
        .build()
        .unwrap()
}

/// Three resources with capacities 20/30/25, solved so every seat is taken.
pub fn fully_booked_allocator() -> Allocator {
    let mut alloc = NetworkBuilder::new(9)
        .source(n(0))
        .sink(n(8))
        .edge(n(0), n(1), 75)
        .edge(n(1), n(2), 40)
        .edge(n(1), n(3), 40)
        .edge(n(1), n(4), 40)
        .edge(n(2), n(5), 20)
        .edge(n(3), n(6), 30)
        .edge(n(4), n(7), 25)
        .edge(n(5), n(8), 20)
        .edge(n(6), n(8), 30)
        .edge(n(7), n(8), 25)
        .resource("Flight 1", n(2), n(5))
        .resource("Flight 2", n(3), n(6))
        .resource("Flight 3", n(4), n(7))
        .build()
        .unwrap();
    alloc.solve().unwrap();
    alloc
}
