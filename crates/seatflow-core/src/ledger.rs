//! Per-resource allocation bookkeeping derived from solved flow

use crate::error::{FlowError, Result};
use crate::graph::FlowNetwork;
use crate::model::*;
use tracing::debug;

/// Bookkeeping for one resource. The record owns the typed link from the
/// resource to its capacity node and to the edge between them, resolved once
/// at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub id: ResourceId,
    pub name: String,
    pub node: NodeId,
    pub capacity_node: NodeId,
    /// Forward edge `node -> capacity_node`.
    pub edge: EdgeId,
    pub status: ResourceStatus,
    /// Units currently carried.
    pub assigned: Units,
    /// Capacity not yet consumed.
    pub remaining: Units,
    /// Units queued for reassignment.
    pub waiting: Units,
    /// Units permanently dropped.
    pub refunded: Units,
}

impl ResourceRecord {
    pub fn is_active(&self) -> bool {
        self.status == ResourceStatus::Active
    }

    /// Declared capacity as tracked by the ledger.
    pub fn capacity(&self) -> Units {
        self.assigned + self.remaining
    }

    pub fn summary(&self) -> ResourceSummary {
        ResourceSummary {
            id: self.id,
            name: self.name.clone(),
            assigned: self.assigned,
            remaining: self.remaining,
            waiting: self.waiting,
            refunded: self.refunded,
            canceled: !self.is_active(),
        }
    }
}

/// Indexed store of resource records.
#[derive(Debug, Default)]
pub struct Ledger {
    records: Vec<ResourceRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource with its full capacity available.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        node: NodeId,
        capacity_node: NodeId,
        edge: EdgeId,
        capacity: Units,
    ) -> Result<ResourceId> {
        let name = name.into();
        if self.find_by_name(&name).is_some() {
            return Err(FlowError::DuplicateResource { name });
        }
        let id = ResourceId(self.records.len() as u32);
        self.records.push(ResourceRecord {
            id,
            name,
            node,
            capacity_node,
            edge,
            status: ResourceStatus::Active,
            assigned: 0,
            remaining: capacity,
            waiting: 0,
            refunded: 0,
        });
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: ResourceId) -> Result<&ResourceRecord> {
        self.records
            .get(id.index())
            .ok_or(FlowError::UnknownResource { id })
    }

    pub fn get_mut(&mut self, id: ResourceId) -> Result<&mut ResourceRecord> {
        self.records
            .get_mut(id.index())
            .ok_or(FlowError::UnknownResource { id })
    }

    pub fn find_by_name(&self, name: &str) -> Option<ResourceId> {
        self.records.iter().find(|r| r.name == name).map(|r| r.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.records.iter()
    }

    /// Re-read `assigned` and `remaining` from the network for each listed
    /// active resource. Canceled resources keep their zeroed counters.
    pub fn refresh(&mut self, network: &FlowNetwork, ids: &[ResourceId]) -> Result<()> {
        for &id in ids {
            let record = self
                .records
                .get_mut(id.index())
                .ok_or(FlowError::UnknownResource { id })?;
            if !record.is_active() {
                continue;
            }
            let edge = network
                .edge(record.edge)
                .ok_or(FlowError::UnknownEdge { id: record.edge })?;
            record.assigned = edge.flow;
            record.remaining = edge.capacity - edge.flow;
            debug!(
                "Resource '{}': {} assigned, {} remaining",
                record.name, record.assigned, record.remaining
            );
        }
        Ok(())
    }

    pub fn refresh_all(&mut self, network: &FlowNetwork) -> Result<()> {
        let ids: Vec<ResourceId> = self.records.iter().map(|r| r.id).collect();
        self.refresh(network, &ids)
    }

    pub fn summaries(&self) -> Vec<ResourceSummary> {
        self.records.iter().map(ResourceRecord::summary).collect()
    }

    pub fn total_assigned(&self) -> Units {
        self.records.iter().map(|r| r.assigned).sum()
    }

    pub fn total_waiting(&self) -> Units {
        self.records.iter().map(|r| r.waiting).sum()
    }

    pub fn total_refunded(&self) -> Units {
        self.records.iter().map(|r| r.refunded).sum()
    }
}
