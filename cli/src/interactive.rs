// Interactive session: prompt-driven network entry and a single route query
//
// Reads whitespace-separated answers, so a whole session can also be piped in.

use anyhow::{Context, Result};
use aodv_sim_core::{DiscoverySettings, Network, NodeId, NodeSpec};
use std::collections::HashSet;
use std::io::{BufRead, Write};

/// Whitespace token reader over a line-oriented input
struct Prompter<R, W> {
    input: R,
    out: W,
    pending: Vec<String>,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    fn new(input: R, out: W) -> Self {
        Self {
            input,
            out,
            pending: Vec::new(),
        }
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.out, "{}", prompt)?;
        self.out.flush()?;

        while self.pending.is_empty() {
            let mut line = String::new();
            let read = self.input.read_line(&mut line).context("Failed to read input")?;
            if read == 0 {
                anyhow::bail!("Input ended before the session was complete");
            }
            self.pending = line.split_whitespace().rev().map(str::to_string).collect();
        }
        self.pending.pop().context("No input token")
    }

    /// Ask until the answer parses as a finite number
    fn ask_number(&mut self, prompt: &str) -> Result<f64> {
        loop {
            let answer = self.ask(prompt)?;
            match answer.parse::<f64>() {
                Ok(v) if v.is_finite() => return Ok(v),
                _ => writeln!(self.out, "'{}' is not a number, try again.", answer)?,
            }
        }
    }

    fn say(&mut self, line: impl std::fmt::Display) -> Result<()> {
        writeln!(self.out, "{}", line)?;
        Ok(())
    }
}

/// Run one session: enter devices, pick a source and destination, discover, report
pub fn run_session<R: BufRead, W: Write>(input: R, out: W, settings: DiscoverySettings) -> Result<()> {
    let mut p = Prompter::new(input, out);
    p.say("=========================== AODV-based Ad Hoc Network Routing Simulation ===========================")?;

    let count = loop {
        let answer = p.ask("Enter the number of devices:")?;
        match answer.parse::<i64>() {
            Ok(n) => break n,
            Err(_) => p.say(format!("'{}' is not a whole number, try again.", answer))?,
        }
    };
    if count <= 0 {
        return Err(aodv_sim_core::NetworkError::InvalidCount(count).into());
    }

    let mut specs = Vec::new();
    let mut seen = HashSet::new();
    for i in 1..=count {
        let id = loop {
            let id = p.ask(&format!("Enter device {} ID:", i))?;
            if seen.insert(id.clone()) {
                break id;
            }
            p.say(format!("Device ID {} is already taken, enter another.", id))?;
        };
        let x = p.ask_number(&format!("Enter the X coordinate of {}:", id))?;
        let y = p.ask_number(&format!("Enter the Y coordinate of {}:", id))?;
        let range = loop {
            let r = p.ask_number(&format!("Enter the communication range of {} (in meters):", id))?;
            if r >= 0.0 {
                break r;
            }
            p.say("Range must not be negative, try again.")?;
        };
        specs.push(NodeSpec::new(id, x, y, range));
    }

    let mut network = Network::from_specs_with_settings(count, specs, settings)?;

    let source = NodeId::new(p.ask("Enter the source device ID to communicate:")?);
    let destination = NodeId::new(p.ask("Enter the destination device ID:")?);

    if network.node(&source).is_none() || network.node(&destination).is_none() {
        p.say("Invalid source or destination device IDs.")?;
        return Ok(());
    }

    p.say(format!("Source: {}, Destination: {}", source, destination))?;
    let report = network.discover(&source, &destination)?;
    for event in network.drain_events() {
        p.say(event)?;
    }

    let lookup = network.query_route(&source, &destination)?;
    p.say(&lookup)?;
    if !lookup.has_route() {
        p.say("No route found.")?;
    } else if let Some(path) = report.path() {
        let names: Vec<&str> = path.iter().map(NodeId::as_str).collect();
        p.say(format!("Path: {}", names.join(" -> ")))?;
    }

    Ok(())
}
