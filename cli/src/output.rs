// Rendering of simulation results for the terminal
//
// Text mode prints the device-by-device protocol log as prose;
// JSON mode prints machine-readable documents (one event per line).

use crate::config::EventFormat;
use anyhow::Result;
use aodv_sim_core::{
    DiscoveryOutcome, DiscoveryReport, Network, NetworkError, ProtocolEvent, RouteLookup,
    ScenarioOutcome, ScenarioStep, StepRecord, StepResult,
};
use colored::*;

pub fn print_outcome(outcome: &ScenarioOutcome, format: EventFormat, with_events: bool) -> Result<()> {
    match format {
        EventFormat::Json => {
            if with_events {
                println!("{}", serde_json::to_string_pretty(outcome)?);
            } else {
                let records = serde_json::json!({
                    "records": outcome.records,
                    "summary": outcome.summary,
                });
                println!("{}", serde_json::to_string_pretty(&records)?);
            }
        }
        EventFormat::Text => {
            for (i, record) in outcome.records.iter().enumerate() {
                print_record(i + 1, record);
            }
            println!();
            println!(
                "{} {} devices, {} links, {} routes, {} failed steps",
                "Summary:".bold(),
                outcome.summary.nodes,
                outcome.summary.links,
                outcome.summary.routes,
                outcome.failures()
            );
            if with_events {
                println!();
                print_events(&outcome.events, format)?;
            }
        }
    }
    Ok(())
}

fn print_record(index: usize, record: &StepRecord) {
    println!("{} {}", format!("[{}]", index).dimmed(), describe_step(&record.step).bold());
    match &record.result {
        Ok(result) => println!("    {}", describe_result(result)),
        Err(e) => println!("    {} {}", "✗".red(), e),
    }
}

pub fn describe_step(step: &ScenarioStep) -> String {
    match step {
        ScenarioStep::Discover {
            source,
            destination,
        } => format!("discover {} -> {}", source, destination),
        ScenarioStep::Move { id, dx, dy } => format!("move {} by ({:.2}, {:.2})", id, dx, dy),
        ScenarioStep::SetRange { id, range } => format!("set range of {} to {:.2}", id, range),
        ScenarioStep::Query {
            source,
            destination,
        } => format!("query {} -> {}", source, destination),
    }
}

pub fn describe_result(result: &StepResult) -> String {
    match result {
        StepResult::Discovered { report } => describe_report(report),
        StepResult::Moved { id, x, y } => format!("Device {} moved to ({:.2}, {:.2})", id, x, y),
        StepResult::RangeSet { id, range } => format!("Device {} range set to {:.2}", id, range),
        StepResult::Queried { lookup } => describe_lookup(lookup),
    }
}

pub fn describe_report(report: &DiscoveryReport) -> String {
    match &report.outcome {
        DiscoveryOutcome::RouteFound { path, hop_count } => format!(
            "{} {} ({} hops, {} devices explored)",
            "✓".green(),
            path.iter()
                .map(|n| n.as_str())
                .collect::<Vec<_>>()
                .join(" -> ")
                .bright_cyan(),
            hop_count,
            report.explored.len()
        ),
        DiscoveryOutcome::NoRouteFound => format!(
            "{} No route found ({} devices explored)",
            "✗".yellow(),
            report.explored.len()
        ),
    }
}

pub fn describe_lookup(lookup: &RouteLookup) -> String {
    if lookup.has_route() {
        format!("{} {}", "✓".green(), lookup)
    } else {
        format!("{} {}", "✗".yellow(), lookup)
    }
}

pub fn print_report(report: &DiscoveryReport, format: EventFormat) -> Result<()> {
    match format {
        EventFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        EventFormat::Text => {
            println!(
                "{} {} -> {}",
                "Discovery".bold(),
                report.source,
                report.destination
            );
            println!("  {}", describe_report(report));
            for (at, entry) in &report.installed {
                println!("  {:<12} {}", at.as_str().bright_cyan(), entry);
            }
        }
    }
    Ok(())
}

pub fn print_lookup(lookup: &RouteLookup, format: EventFormat) -> Result<()> {
    match format {
        EventFormat::Json => println!("{}", serde_json::to_string_pretty(lookup)?),
        EventFormat::Text => println!("  {}", describe_lookup(lookup)),
    }
    Ok(())
}

pub fn print_events(events: &[ProtocolEvent], format: EventFormat) -> Result<()> {
    match format {
        EventFormat::Json => {
            for event in events {
                println!("{}", serde_json::to_string(event)?);
            }
        }
        EventFormat::Text => {
            println!("{}", "Events".bold());
            if events.is_empty() {
                println!("  {}", "(none recorded)".dimmed());
            }
            for event in events {
                println!("  {}", event);
            }
        }
    }
    Ok(())
}

pub fn print_neighbors(network: &Network) -> Result<(), NetworkError> {
    println!("{}", "Neighbors".bold());
    for node in network.topology().nodes() {
        let neighbors = network
            .neighbors_of(node.id())?
            .iter()
            .map(|n| n.id().to_string())
            .collect::<Vec<_>>();
        println!(
            "  {:<12} {} r={:<8.2} -> {}",
            node.id().as_str().bright_cyan(),
            node.position(),
            node.range(),
            if neighbors.is_empty() {
                "(none)".dimmed().to_string()
            } else {
                neighbors.join(", ")
            }
        );
    }
    Ok(())
}
