//! TOML scenario files: topology, decision policy, and a scripted event list

use crate::builder::NetworkBuilder;
use crate::decision::{DecisionMaker, FixedPolicy};
use crate::error::FlowError;
use crate::model::{NodeId, ResourceId, Units};
use crate::protocol::{Allocator, CancelOutcome, CapacityAdjustment, RefundOutcome};
use crate::solver::SolveStats;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDecl {
    pub id: u32,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDecl {
    pub from: u32,
    pub to: u32,
    pub capacity: Units,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDecl {
    pub name: String,
    pub node: u32,
    pub capacity_node: u32,
}

/// One scripted step. Resources are referenced by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScenarioEvent {
    Solve,
    Cancel { resource: String },
    AdjustCapacity { resource: String, capacity: Units },
    ProcessWaiting { resource: String },
    Refund { resource: String, count: Units },
}

/// What a scripted step did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepReport {
    Solved(SolveStats),
    Canceled {
        resource: String,
        outcome: CancelOutcome,
    },
    CapacityAdjusted {
        resource: String,
        adjustment: CapacityAdjustment,
    },
    WaitingProcessed {
        resource: String,
        moved: Units,
    },
    Refunded {
        resource: String,
        outcome: RefundOutcome,
    },
}

/// A complete allocation scenario as read from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    pub nodes: usize,
    pub source: u32,
    pub sink: u32,
    #[serde(default, rename = "node")]
    pub descriptions: Vec<NodeDecl>,
    #[serde(default, rename = "edge")]
    pub edges: Vec<EdgeDecl>,
    #[serde(default, rename = "resource")]
    pub resources: Vec<ResourceDecl>,
    #[serde(default)]
    pub policy: FixedPolicy,
    #[serde(default, rename = "event")]
    pub events: Vec<ScenarioEvent>,
}

impl Scenario {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse scenario")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        let scenario = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        tracing::debug!(
            "Loaded scenario {} ({} nodes, {} edges, {} resources, {} events)",
            path.display(),
            scenario.nodes,
            scenario.edges.len(),
            scenario.resources.len(),
            scenario.events.len()
        );
        Ok(scenario)
    }

    pub fn policy(&self) -> FixedPolicy {
        self.policy
    }

    /// Validate the topology and produce an unsolved allocator.
    pub fn build(&self) -> std::result::Result<Allocator, FlowError> {
        let mut builder = NetworkBuilder::new(self.nodes)
            .source(NodeId(self.source))
            .sink(NodeId(self.sink));
        for d in &self.descriptions {
            builder = builder.describe(NodeId(d.id), d.description.clone());
        }
        for e in &self.edges {
            builder = builder.edge(NodeId(e.from), NodeId(e.to), e.capacity);
        }
        for r in &self.resources {
            builder = builder.resource(r.name.clone(), NodeId(r.node), NodeId(r.capacity_node));
        }
        builder.build()
    }

    /// Apply a single scripted step.
    pub fn apply(
        event: &ScenarioEvent,
        allocator: &mut Allocator,
        decider: &mut dyn DecisionMaker,
    ) -> Result<StepReport> {
        let report = match event {
            ScenarioEvent::Solve => StepReport::Solved(allocator.solve()?),
            ScenarioEvent::Cancel { resource } => {
                let id = resolve(allocator, resource)?;
                StepReport::Canceled {
                    resource: resource.clone(),
                    outcome: allocator.cancel(id, decider)?,
                }
            }
            ScenarioEvent::AdjustCapacity { resource, capacity } => {
                let id = resolve(allocator, resource)?;
                StepReport::CapacityAdjusted {
                    resource: resource.clone(),
                    adjustment: allocator.adjust_capacity(id, *capacity, decider)?,
                }
            }
            ScenarioEvent::ProcessWaiting { resource } => {
                let id = resolve(allocator, resource)?;
                StepReport::WaitingProcessed {
                    resource: resource.clone(),
                    moved: allocator.process_waiting(id)?,
                }
            }
            ScenarioEvent::Refund { resource, count } => {
                let id = resolve(allocator, resource)?;
                StepReport::Refunded {
                    resource: resource.clone(),
                    outcome: allocator.refund(id, *count)?,
                }
            }
        };
        Ok(report)
    }

    /// Apply every scripted step in order.
    pub fn run(
        &self,
        allocator: &mut Allocator,
        decider: &mut dyn DecisionMaker,
    ) -> Result<Vec<StepReport>> {
        let mut reports = Vec::with_capacity(self.events.len());
        for (i, event) in self.events.iter().enumerate() {
            let report = Self::apply(event, allocator, decider)
                .with_context(|| format!("Step {} ({:?}) failed", i + 1, event))?;
            reports.push(report);
        }
        Ok(reports)
    }
}

fn resolve(allocator: &Allocator, name: &str) -> std::result::Result<ResourceId, FlowError> {
    allocator.resource_by_name(name).map(|r| r.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::{OverbookPolicy, ShortfallPolicy};
    use std::io::Write;

    const SMALL: &str = r#"
name = "two flights"
nodes = 6
source = 0
sink = 5

[[node]]
id = 0
description = "source"

[[edge]]
from = 0
to = 1
capacity = 12

[[edge]]
from = 1
to = 2
capacity = 12

[[edge]]
from = 2
to = 4
capacity = 10

[[edge]]
from = 1
to = 3
capacity = 12

[[edge]]
from = 3
to = 4
capacity = 2

[[edge]]
from = 4
to = 5
capacity = 12

[[resource]]
name = "A"
node = 2
capacity_node = 4

[[resource]]
name = "B"
node = 3
capacity_node = 4

[policy]
on_shortfall = "refund"

[[event]]
action = "solve"

[[event]]
action = "cancel"
resource = "A"

[[event]]
action = "adjust_capacity"
resource = "B"
capacity = 5
"#;

    #[test]
    fn parses_all_sections() {
        let scenario = Scenario::from_toml_str(SMALL).unwrap();
        assert_eq!(scenario.name.as_deref(), Some("two flights"));
        assert_eq!(scenario.nodes, 6);
        assert_eq!(scenario.edges.len(), 6);
        assert_eq!(scenario.resources[1].name, "B");
        assert_eq!(scenario.policy.on_shortfall, ShortfallPolicy::Refund);
        assert_eq!(scenario.policy.on_overbook, OverbookPolicy::Keep);
        assert_eq!(
            scenario.events[2],
            ScenarioEvent::AdjustCapacity {
                resource: "B".to_string(),
                capacity: 5
            }
        );
    }

    #[test]
    fn runs_scripted_events() {
        let scenario = Scenario::from_toml_str(SMALL).unwrap();
        let mut alloc = scenario.build().unwrap();
        let mut policy = scenario.policy();
        let reports = scenario.run(&mut alloc, &mut policy).unwrap();

        assert_eq!(reports.len(), 3);
        let StepReport::Solved(stats) = &reports[0] else {
            panic!("expected solve report");
        };
        assert_eq!(stats.max_flow, 12);

        // A carried 10, B has no room, so all 10 are refunded.
        let a = alloc.resource_by_name("A").unwrap();
        assert_eq!((a.assigned, a.refunded, a.waiting), (0, 10, 0));
        let b = alloc.resource_by_name("B").unwrap();
        assert_eq!((b.assigned, b.remaining), (2, 3));
    }

    #[test]
    fn unknown_resource_in_event_fails_with_context() {
        let mut scenario = Scenario::from_toml_str(SMALL).unwrap();
        scenario.events = vec![ScenarioEvent::ProcessWaiting {
            resource: "Z".to_string(),
        }];
        let mut alloc = scenario.build().unwrap();
        let err = scenario
            .run(&mut alloc, &mut FixedPolicy::default())
            .unwrap_err();
        assert!(format!("{:#}", err).contains("unknown resource 'Z'"));
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(Scenario::from_toml_str("nodes = \"many\"").is_err());
        let bad_action = "nodes = 2\nsource = 0\nsink = 1\n[[event]]\naction = \"explode\"\n";
        assert!(Scenario::from_toml_str(bad_action).is_err());
    }

    #[test]
    fn invalid_topology_surfaces_flow_error() {
        let scenario =
            Scenario::from_toml_str("nodes = 2\nsource = 0\nsink = 0\n").unwrap();
        assert_eq!(
            scenario.build().unwrap_err(),
            FlowError::SourceIsSink { node: NodeId(0) }
        );
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SMALL.as_bytes()).unwrap();
        let scenario = Scenario::load(file.path()).unwrap();
        assert_eq!(scenario.resources.len(), 2);

        let missing = Scenario::load(file.path().with_extension("missing"));
        assert!(missing.is_err());
    }
}
