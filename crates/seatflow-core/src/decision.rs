//! Decision points the allocation protocol hands back to its caller

use crate::model::{ResourceId, Units};
use serde::{Deserialize, Serialize};

/// A situation the protocol cannot resolve on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// Displaced units from `resource` found no room elsewhere.
    UnplaceableDemand { resource: ResourceId, units: Units },
    /// A capacity cut would leave `overbook` assigned units without a seat.
    OverbookConflict { resource: ResourceId, overbook: Units },
}

impl Event {
    pub fn resource(&self) -> ResourceId {
        match *self {
            Event::UnplaceableDemand { resource, .. } => resource,
            Event::OverbookConflict { resource, .. } => resource,
        }
    }

    /// Units at stake.
    pub fn units(&self) -> Units {
        match *self {
            Event::UnplaceableDemand { units, .. } => units,
            Event::OverbookConflict { overbook, .. } => overbook,
        }
    }
}

/// The caller's answer to an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// Put the units on the waiting list.
    Queue,
    /// Drop up to `units`; anything left over is queued.
    Refund { units: Units },
    /// Keep the current assignment and raise the capacity to match.
    /// Only meaningful for [`Event::OverbookConflict`].
    KeepCapacity,
}

/// Resolves protocol events. Called synchronously; the protocol blocks on
/// the answer.
pub trait DecisionMaker {
    fn decide(&mut self, event: &Event) -> Decision;
}

impl<F> DecisionMaker for F
where
    F: FnMut(&Event) -> Decision,
{
    fn decide(&mut self, event: &Event) -> Decision {
        self(event)
    }
}

/// What to do with demand that cannot be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShortfallPolicy {
    #[default]
    Queue,
    Refund,
}

/// What to do when a capacity cut overbooks a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverbookPolicy {
    #[default]
    Keep,
    Queue,
    Refund,
}

/// Answers every event the same way, as configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedPolicy {
    pub on_shortfall: ShortfallPolicy,
    pub on_overbook: OverbookPolicy,
}

impl FixedPolicy {
    pub fn new(on_shortfall: ShortfallPolicy, on_overbook: OverbookPolicy) -> Self {
        FixedPolicy {
            on_shortfall,
            on_overbook,
        }
    }
}

impl DecisionMaker for FixedPolicy {
    fn decide(&mut self, event: &Event) -> Decision {
        match event {
            Event::UnplaceableDemand { units, .. } => match self.on_shortfall {
                ShortfallPolicy::Queue => Decision::Queue,
                ShortfallPolicy::Refund => Decision::Refund { units: *units },
            },
            Event::OverbookConflict { overbook, .. } => match self.on_overbook {
                OverbookPolicy::Keep => Decision::KeepCapacity,
                OverbookPolicy::Queue => Decision::Queue,
                OverbookPolicy::Refund => Decision::Refund { units: *overbook },
            },
        }
    }
}
