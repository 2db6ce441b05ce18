//! CLI command implementations

use crate::render;
use crate::{OutputFormat, OverbookArg, ShortfallArg};
use anyhow::Context;
use seatflow_core::{FixedPolicy, OverbookPolicy, Scenario, ShortfallPolicy};
use serde_json::json;
use std::path::Path;

impl From<ShortfallArg> for ShortfallPolicy {
    fn from(arg: ShortfallArg) -> Self {
        match arg {
            ShortfallArg::Queue => ShortfallPolicy::Queue,
            ShortfallArg::Refund => ShortfallPolicy::Refund,
        }
    }
}

impl From<OverbookArg> for OverbookPolicy {
    fn from(arg: OverbookArg) -> Self {
        match arg {
            OverbookArg::Keep => OverbookPolicy::Keep,
            OverbookArg::Queue => OverbookPolicy::Queue,
            OverbookArg::Refund => OverbookPolicy::Refund,
        }
    }
}

pub fn solve(path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let scenario = Scenario::load(path)?;
    let mut alloc = scenario
        .build()
        .with_context(|| format!("Invalid network in {}", path.display()))?;

    let stats = alloc.solve()?;

    match format {
        OutputFormat::Json => {
            let edges: Vec<_> = alloc.network().all_edges().collect();
            let output = json!({
                "scenario": scenario.name,
                "stats": stats,
                "edges": edges,
                "resources": alloc.summaries(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            let mut out = String::new();
            writeln_header(&mut out, scenario.name.as_deref());
            render::network(&mut out, alloc.network())?;
            render::allocation(&mut out, &alloc.summaries())?;
            out.push_str(&format!("Max flow: {}\n", stats.max_flow));
            print!("{}", out);
        }
    }
    Ok(())
}

pub fn run(
    path: &Path,
    format: OutputFormat,
    on_shortfall: Option<ShortfallArg>,
    on_overbook: Option<OverbookArg>,
) -> anyhow::Result<()> {
    let scenario = Scenario::load(path)?;
    let mut alloc = scenario
        .build()
        .with_context(|| format!("Invalid network in {}", path.display()))?;

    let defaults = scenario.policy();
    let mut policy = FixedPolicy::new(
        on_shortfall.map_or(defaults.on_shortfall, Into::into),
        on_overbook.map_or(defaults.on_overbook, Into::into),
    );
    tracing::debug!("Running with {:?}", policy);

    // Scripted events assume a solved network
    let initial = alloc.solve()?;

    let reports = scenario.run(&mut alloc, &mut policy)?;
    tracing::info!("Applied {} events", reports.len());

    match format {
        OutputFormat::Json => {
            let output = json!({
                "scenario": scenario.name,
                "initial": initial,
                "steps": reports,
                "resources": alloc.summaries(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            let mut out = String::new();
            writeln_header(&mut out, scenario.name.as_deref());
            out.push_str(&format!("Initial max flow: {}\n", initial.max_flow));
            for report in &reports {
                render::step(&mut out, report, &alloc)?;
            }
            render::allocation(&mut out, &alloc.summaries())?;
            print!("{}", out);
        }
    }
    Ok(())
}

pub fn check(path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let scenario = Scenario::load(path)?;
    let alloc = scenario
        .build()
        .with_context(|| format!("Invalid network in {}", path.display()))?;

    match format {
        OutputFormat::Json => {
            let output = json!({
                "scenario": scenario.name,
                "valid": true,
                "nodes": alloc.network().node_count(),
                "edges": alloc.network().all_edges().count(),
                "resources": alloc.ledger().len(),
                "events": scenario.events.len(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!(
                "{}: ok ({} nodes, {} edges, {} resources, {} events)",
                path.display(),
                alloc.network().node_count(),
                alloc.network().all_edges().count(),
                alloc.ledger().len(),
                scenario.events.len()
            );
        }
    }
    Ok(())
}

fn writeln_header(out: &mut String, name: Option<&str>) {
    if let Some(name) = name {
        out.push_str(&format!("== {} ==\n", name));
    }
}
