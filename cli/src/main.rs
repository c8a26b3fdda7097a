// aodv-sim: command-line driver for the AODV route discovery simulator
//
// Cross-platform (macOS, Linux, Windows). Networks come from JSON scenario files
// or from an interactive prompt session.

mod config;
mod interactive;
mod output;

use anyhow::{Context, Result};
use aodv_sim_core::{NodeId, Scenario};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "aodv-sim")]
#[command(about = "AODV-based ad hoc network routing simulator", long_about = None)]
#[command(version)]
struct Cli {
    /// Use this config file instead of the platform default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every step of a scenario file
    Run {
        scenario: PathBuf,
        /// Also print the protocol event journal
        #[arg(short, long)]
        events: bool,
    },
    /// Build a scenario's network and run a single discovery
    Discover {
        scenario: PathBuf,
        #[arg(short, long)]
        source: String,
        #[arg(short, long)]
        destination: String,
        #[arg(short, long)]
        events: bool,
    },
    /// Show the neighbor relation of a scenario's network
    Neighbors { scenario: PathBuf },
    /// Enter devices and a route query at the prompt
    Interactive,
    /// Configure settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Set { key: String, value: String },
    Get { key: String },
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { scenario, events } => cmd_run(&config, &scenario, events),
        Commands::Discover {
            scenario,
            source,
            destination,
            events,
        } => cmd_discover(&config, &scenario, source, destination, events),
        Commands::Neighbors { scenario } => cmd_neighbors(&config, &scenario),
        Commands::Interactive => cmd_interactive(&config),
        Commands::Config { action } => cmd_config(config, action),
    }
}

/// Read a scenario file, applying configured discovery settings when it has none
fn load_scenario(config: &config::Config, path: &Path) -> Result<Scenario> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
    let mut scenario = Scenario::from_json_str(&contents)
        .with_context(|| format!("Failed to parse scenario file {}", path.display()))?;

    if scenario.settings.is_none() {
        tracing::debug!("Scenario has no settings, using config defaults");
        scenario.settings = Some(config.discovery.clone());
    }
    tracing::info!(
        nodes = scenario.nodes.len(),
        steps = scenario.steps.len(),
        "Loaded scenario {}",
        path.display()
    );
    Ok(scenario)
}

fn cmd_run(config: &config::Config, path: &Path, events: bool) -> Result<()> {
    let scenario = load_scenario(config, path)?;
    let outcome = scenario.run().context("Failed to build network")?;
    output::print_outcome(&outcome, config.event_format, events)
}

fn cmd_discover(
    config: &config::Config,
    path: &Path,
    source: String,
    destination: String,
    events: bool,
) -> Result<()> {
    let scenario = load_scenario(config, path)?;
    let mut network = scenario.build().context("Failed to build network")?;

    let source = NodeId::new(source);
    let destination = NodeId::new(destination);
    let report = network.discover(&source, &destination)?;
    output::print_report(&report, config.event_format)?;

    let lookup = network.query_route(&source, &destination)?;
    output::print_lookup(&lookup, config.event_format)?;

    if events {
        output::print_events(network.events(), config.event_format)?;
    }
    Ok(())
}

fn cmd_neighbors(config: &config::Config, path: &Path) -> Result<()> {
    let network = load_scenario(config, path)?
        .build()
        .context("Failed to build network")?;
    output::print_neighbors(&network)?;
    Ok(())
}

fn cmd_interactive(config: &config::Config) -> Result<()> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    interactive::run_session(stdin.lock(), stdout.lock(), config.discovery.clone())
}

fn cmd_config(mut config: config::Config, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            println!("{} Set {} = {}", "✓".green(), key.bright_cyan(), value);
        }

        ConfigAction::Get { key } => {
            if let Some(value) = config.get(&key) {
                println!("{} = {}", key.bright_cyan(), value);
            } else {
                anyhow::bail!("Unknown config key: {}", key);
            }
        }

        ConfigAction::List => {
            println!("{}", "Configuration".bold());
            println!();

            for (key, value) in config.list() {
                println!("  {:<20} {}", key.bright_cyan(), value);
            }
        }
    }

    Ok(())
}
