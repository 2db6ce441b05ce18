//! Plain-text rendering of networks, allocations, and protocol steps

use seatflow_core::{Allocator, CancelOutcome, FlowNetwork, ResourceSummary, StepReport};
use std::fmt::{self, Write};

/// Every node that has a description or forward edges, with its edges.
pub fn network(out: &mut String, net: &FlowNetwork) -> fmt::Result {
    writeln!(out, "Flow network:")?;
    for node in net.nodes() {
        let edges: Vec<_> = net.edges_from(node.id).filter(|e| e.capacity > 0).collect();
        if node.description.is_none() && edges.is_empty() {
            continue;
        }
        match &node.description {
            Some(desc) => writeln!(out, "Node {} ({}):", node.id, desc)?,
            None => writeln!(out, "Node {}:", node.id)?,
        }
        for e in edges {
            writeln!(out, "  -> Node {} | cap {}, flow {}", e.to, e.capacity, e.flow)?;
        }
    }
    Ok(())
}

pub fn allocation(out: &mut String, summaries: &[ResourceSummary]) -> fmt::Result {
    writeln!(out, "Allocation:")?;
    for s in summaries {
        if s.canceled {
            write!(out, "  {}: CANCELED", s.name)?;
            if s.waiting > 0 {
                write!(out, ", {} awaiting reallocation", s.waiting)?;
            }
        } else {
            write!(out, "  {}: {} assigned ({} remaining)", s.name, s.assigned, s.remaining)?;
            if s.waiting > 0 {
                write!(out, ", {} waiting", s.waiting)?;
            }
        }
        writeln!(out)?;
    }

    let refunded: Vec<_> = summaries.iter().filter(|s| s.refunded > 0).collect();
    if !refunded.is_empty() {
        writeln!(out, "Refunded:")?;
        for s in refunded {
            writeln!(out, "  {}: {}", s.name, s.refunded)?;
        }
    }
    Ok(())
}

pub fn step(out: &mut String, report: &StepReport, alloc: &Allocator) -> fmt::Result {
    match report {
        StepReport::Solved(stats) => writeln!(
            out,
            "Solved: max flow {} ({} pushes, {} relabels)",
            stats.max_flow, stats.pushes, stats.relabels
        ),
        StepReport::Canceled { resource, outcome } => match outcome {
            CancelOutcome::AlreadyCanceled => writeln!(out, "{} is already canceled", resource),
            CancelOutcome::Canceled(r) => {
                writeln!(out, "Canceled {}: {} displaced", resource, r.displaced)?;
                for p in &r.placements {
                    let name = alloc
                        .resource(p.resource)
                        .map(|rec| rec.name.as_str())
                        .unwrap_or("?");
                    writeln!(out, "  moved {} to {}", p.units, name)?;
                }
                if r.shortfall > 0 {
                    writeln!(
                        out,
                        "  could not place {}: {} queued, {} refunded",
                        r.shortfall, r.queued, r.refunded
                    )?;
                }
                Ok(())
            }
        },
        StepReport::CapacityAdjusted {
            resource,
            adjustment,
        } => {
            writeln!(
                out,
                "Adjusted {} capacity {} -> {}",
                resource, adjustment.previous_capacity, adjustment.capacity
            )?;
            if let Some(o) = &adjustment.overbook {
                writeln!(
                    out,
                    "  overbooked by {}: {} queued, {} refunded",
                    o.overbook, o.queued, o.refunded
                )?;
            }
            Ok(())
        }
        StepReport::WaitingProcessed { resource, moved } => {
            writeln!(out, "Seated {} waiting on {}", moved, resource)
        }
        StepReport::Refunded { resource, outcome } => {
            write!(out, "Refunded {} from {}", outcome.refunded, resource)?;
            if outcome.shortfall > 0 {
                write!(out, " ({} short)", outcome.shortfall)?;
            }
            writeln!(out)
        }
    }
}
