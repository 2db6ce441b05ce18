//! Reallocation protocol: cancellations, capacity changes, waiting lists,
//! and refunds on top of a solved network.
//!
//! Protocol operations update the ledger and the resource edges directly.
//! They do not touch demand-side edges, so after any capacity-affecting
//! mutation whose effect must show up in demand-side flow, call
//! [`Allocator::solve`] again. Until then the per-resource counters are
//! correct but the rest of the network still holds the previous solution.

use crate::decision::{Decision, DecisionMaker, Event};
use crate::error::{FlowError, Result};
use crate::graph::{FlowNetwork, check_capacity};
use crate::ledger::{Ledger, ResourceRecord};
use crate::model::*;
use crate::solver::{PushRelabel, SolveStats};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::{debug, info, warn};

/// Units moved onto one resource during redistribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub resource: ResourceId,
    pub units: Units,
}

/// Result of spreading displaced units over the other active resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redistribution {
    /// Units that needed a new home.
    pub displaced: Units,
    pub placements: Vec<Placement>,
    /// Units that found no room and were reported to the decision maker.
    pub shortfall: Units,
    pub queued: Units,
    pub refunded: Units,
}

impl Redistribution {
    /// Units placed on other resources.
    pub fn placed(&self) -> Units {
        self.placements.iter().map(|p| p.units).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CancelOutcome {
    /// Nothing changed.
    AlreadyCanceled,
    Canceled(Redistribution),
}

/// How an overbooking capacity cut was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverbookResolution {
    pub overbook: Units,
    pub decision: Decision,
    pub queued: Units,
    pub refunded: Units,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityAdjustment {
    pub resource: ResourceId,
    pub previous_capacity: Units,
    /// Requested capacity.
    pub requested: Units,
    /// Capacity actually applied after any overbook resolution.
    pub capacity: Units,
    /// Change applied to `remaining`.
    pub delta: Units,
    pub overbook: Option<OverbookResolution>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundOutcome {
    pub refunded: Units,
    /// Requested units that were not on the waiting list.
    pub shortfall: Units,
}

/// Owns the network, solver, and ledger and applies protocol events to them.
#[derive(Debug)]
pub struct Allocator {
    network: FlowNetwork,
    solver: PushRelabel,
    ledger: Ledger,
    source: NodeId,
    sink: NodeId,
}

impl Allocator {
    /// Assemble an allocator from parts already validated by the builder.
    pub(crate) fn from_parts(
        network: FlowNetwork,
        ledger: Ledger,
        source: NodeId,
        sink: NodeId,
    ) -> Self {
        Allocator {
            network,
            solver: PushRelabel::new(),
            ledger,
            source,
            sink,
        }
    }

    pub fn network(&self) -> &FlowNetwork {
        &self.network
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn solver(&self) -> &PushRelabel {
        &self.solver
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn sink(&self) -> NodeId {
        self.sink
    }

    pub fn resource(&self, id: ResourceId) -> Result<&ResourceRecord> {
        self.ledger.get(id)
    }

    pub fn resource_by_name(&self, name: &str) -> Result<&ResourceRecord> {
        self.ledger
            .find_by_name(name)
            .and_then(|id| self.ledger.get(id).ok())
            .ok_or_else(|| FlowError::UnknownResourceName {
                name: name.to_string(),
            })
    }

    pub fn summaries(&self) -> Vec<ResourceSummary> {
        self.ledger.summaries()
    }

    /// Recompute the maximum flow and refresh every active resource.
    pub fn solve(&mut self) -> Result<SolveStats> {
        let stats = self
            .solver
            .solve(&mut self.network, self.source, self.sink)?;
        self.ledger.refresh_all(&self.network)?;
        info!(
            "Max flow {} ({} pushes, {} relabels)",
            stats.max_flow, stats.pushes, stats.relabels
        );
        Ok(stats)
    }

    /// Cancel a resource and move its assigned units elsewhere.
    pub fn cancel(
        &mut self,
        id: ResourceId,
        decider: &mut dyn DecisionMaker,
    ) -> Result<CancelOutcome> {
        let record = self.ledger.get(id)?;
        if !record.is_active() {
            info!("Resource '{}' is already canceled", record.name);
            return Ok(CancelOutcome::AlreadyCanceled);
        }

        info!("Canceling '{}' ({} assigned)", record.name, record.assigned);
        let displaced = record.assigned;
        let edge = record.edge;

        self.network.reset_flow_of(edge)?;
        // A zero capacity keeps later solves from routing through it again.
        self.network.set_capacity_of(edge, 0)?;

        let record = self.ledger.get_mut(id)?;
        record.status = ResourceStatus::Canceled;
        record.assigned = 0;
        record.remaining = 0;

        let redistribution = self.redistribute(displaced, id, decider)?;
        Ok(CancelOutcome::Canceled(redistribution))
    }

    /// Greedily place `units` on the active resources other than `exclude`,
    /// largest remaining capacity first. Whatever does not fit is reported
    /// to `decider` and booked against `exclude`.
    pub fn redistribute(
        &mut self,
        units: Units,
        exclude: ResourceId,
        decider: &mut dyn DecisionMaker,
    ) -> Result<Redistribution> {
        self.ledger.get(exclude)?;
        let mut outcome = Redistribution {
            displaced: units.max(0),
            ..Default::default()
        };
        if units <= 0 {
            return Ok(outcome);
        }

        let mut candidates: Vec<(Units, ResourceId)> = self
            .ledger
            .iter()
            .filter(|r| r.id != exclude && r.is_active() && r.remaining > 0)
            .map(|r| (r.remaining, r.id))
            .collect();
        candidates.sort_by_key(|&(remaining, id)| (Reverse(remaining), id));

        let mut left = units;
        for (remaining, target) in candidates {
            if left == 0 {
                break;
            }
            let moved = remaining.min(left);
            let record = self.ledger.get(target)?;
            self.network.set_flow(record.edge, record.assigned + moved)?;

            let record = self.ledger.get_mut(target)?;
            record.assigned += moved;
            record.remaining -= moved;
            debug!("Moved {} units to '{}'", moved, record.name);

            outcome.placements.push(Placement {
                resource: target,
                units: moved,
            });
            left -= moved;
        }

        if left > 0 {
            outcome.shortfall = left;
            let event = Event::UnplaceableDemand {
                resource: exclude,
                units: left,
            };
            let decision = decider.decide(&event);
            let (queued, refunded) = match decision {
                Decision::Queue => (left, 0),
                Decision::Refund { units } => {
                    let refunded = units.clamp(0, left);
                    (left - refunded, refunded)
                }
                Decision::KeepCapacity => {
                    warn!(
                        "KeepCapacity does not apply to unplaceable demand; queueing {} units",
                        left
                    );
                    (left, 0)
                }
            };
            let record = self.ledger.get_mut(exclude)?;
            record.waiting += queued;
            record.refunded += refunded;
            outcome.queued = queued;
            outcome.refunded = refunded;
            info!(
                "Could not place {} units from '{}': {} queued, {} refunded",
                left, record.name, queued, refunded
            );
        }

        Ok(outcome)
    }

    /// Change a resource's capacity. A cut below the assigned count is
    /// settled by `decider` before anything is written.
    pub fn adjust_capacity(
        &mut self,
        id: ResourceId,
        new_capacity: Units,
        decider: &mut dyn DecisionMaker,
    ) -> Result<CapacityAdjustment> {
        check_capacity(new_capacity)?;
        let record = self.ledger.get(id)?;
        if !record.is_active() {
            return Err(FlowError::ResourceCanceled {
                name: record.name.clone(),
            });
        }
        let previous_capacity = record.capacity();
        let assigned = record.assigned;
        let edge = record.edge;

        let mut capacity = new_capacity;
        let mut resolution = None;
        if new_capacity < assigned {
            let overbook = assigned - new_capacity;
            warn!(
                "Reducing '{}' to {} would overbook by {} units",
                record.name, new_capacity, overbook
            );
            let decision = decider.decide(&Event::OverbookConflict {
                resource: id,
                overbook,
            });
            let (queued, refunded) = match decision {
                Decision::KeepCapacity => {
                    capacity = assigned;
                    (0, 0)
                }
                Decision::Queue => (overbook, 0),
                Decision::Refund { units } => {
                    let refunded = units.clamp(0, overbook);
                    (overbook - refunded, refunded)
                }
            };
            resolution = Some(OverbookResolution {
                overbook,
                decision,
                queued,
                refunded,
            });
        }

        let displaced = resolution.filter(|r| r.decision != Decision::KeepCapacity);
        let assigned_now = if displaced.is_some() { capacity } else { assigned };

        let flow = self.edge_flow(edge)?;
        self.network.set_capacity_of(edge, capacity)?;
        if flow > capacity {
            self.network.set_flow(edge, assigned_now)?;
        }

        let record = self.ledger.get_mut(id)?;
        if let Some(r) = displaced {
            record.waiting += r.queued;
            record.refunded += r.refunded;
            record.assigned = assigned_now;
        }
        let delta = capacity - (record.assigned + record.remaining);
        record.remaining += delta;
        info!(
            "Adjusted '{}' capacity {} -> {}",
            record.name, previous_capacity, capacity
        );

        Ok(CapacityAdjustment {
            resource: id,
            previous_capacity,
            requested: new_capacity,
            capacity,
            delta,
            overbook: resolution,
        })
    }

    /// Seat as many waiting units as the remaining capacity allows.
    /// Returns the number moved.
    pub fn process_waiting(&mut self, id: ResourceId) -> Result<Units> {
        let record = self.ledger.get(id)?;
        if record.waiting == 0 {
            debug!("No units waiting on '{}'", record.name);
            return Ok(0);
        }
        if record.remaining <= 0 {
            debug!("No capacity left on '{}' for waiting units", record.name);
            return Ok(0);
        }

        let moved = record.remaining.min(record.waiting);
        let edge = record.edge;
        let flow = self.edge_flow(edge)?;
        self.network.set_flow(edge, flow + moved)?;

        let record = self.ledger.get_mut(id)?;
        record.assigned += moved;
        record.remaining -= moved;
        record.waiting -= moved;
        info!(
            "Assigned {} waiting units to '{}', {} still waiting",
            moved, record.name, record.waiting
        );
        Ok(moved)
    }

    fn edge_flow(&self, edge: EdgeId) -> Result<Units> {
        self.network
            .edge(edge)
            .map(|e| e.flow)
            .ok_or(FlowError::UnknownEdge { id: edge })
    }

    /// Move up to `count` units from the waiting list to refunded. Never
    /// touches assigned units.
    pub fn refund(&mut self, id: ResourceId, count: Units) -> Result<RefundOutcome> {
        let record = self.ledger.get_mut(id)?;
        if count <= 0 {
            return Ok(RefundOutcome {
                refunded: 0,
                shortfall: 0,
            });
        }

        let refunded = count.min(record.waiting);
        record.waiting -= refunded;
        record.refunded += refunded;
        let shortfall = count - refunded;
        if shortfall > 0 {
            info!(
                "Refunded {} units from '{}'; only that many were waiting ({} short)",
                refunded, record.name, shortfall
            );
        } else {
            info!("Refunded {} units from '{}'", refunded, record.name);
        }
        Ok(RefundOutcome {
            refunded,
            shortfall,
        })
    }
}
