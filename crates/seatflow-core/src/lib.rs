//! Seatflow Core: push-relabel max flow with a live seat reallocation protocol

pub mod model;
pub mod error;
pub mod graph;
pub mod solver;
pub mod ledger;
pub mod decision;
pub mod protocol;
pub mod builder;
pub mod scenario;


#[cfg(test)]
pub mod test_utils;

pub use model::{NodeId, EdgeId, ResourceId, Units, MAX_CAPACITY, FlowEdge, NodeView, EdgeView, ResourceStatus, ResourceSummary};
pub use error::FlowError;
pub use graph::FlowNetwork;
pub use solver::{PushRelabel, SolveStats};
pub use ledger::{Ledger, ResourceRecord};
pub use decision::{Event, Decision, DecisionMaker, FixedPolicy, ShortfallPolicy, OverbookPolicy};
pub use protocol::{Allocator, CancelOutcome, Redistribution, Placement, CapacityAdjustment, OverbookResolution, RefundOutcome};
pub use builder::NetworkBuilder;
pub use scenario::{Scenario, ScenarioEvent, StepReport};
