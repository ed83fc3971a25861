//! Clock demo
//!
//! Builds a Clock from configuration, registers demo timers or a network of leaky
//! units, runs it and prints what fired.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sim_clock::Clock;
use sim_network::RunSpan;
use tracing::info;

use clock_demo::{config, demos, initialize_logging_with_config, load_configuration};

#[derive(Parser)]
#[command(name = "clock-demo")]
#[command(about = "Run the discrete-event simulation clock")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print Prometheus metrics after the run
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Five timers showing before/default/after ordering at every tick
    Ordering,

    /// Run a network of leaky units
    Network {
        /// Simulated duration in seconds
        #[arg(long, default_value_t = sim_network::DEFAULT_RUN_TIME)]
        time: f64,

        /// Evaluation step in seconds
        #[arg(long, default_value_t = sim_network::DEFAULT_RUN_DT)]
        dt: f64,

        /// Run this many unit steps instead of a duration
        #[arg(long, conflicts_with_all = ["time", "dt"])]
        steps: Option<u64>,

        /// Number of units in the network
        #[arg(long, default_value_t = 4)]
        units: usize,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_configuration(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.metrics.prometheus |= cli.metrics;
    config::validate_config(&config)?;

    initialize_logging_with_config(&config.logging.level, &config.logging.format)?;
    info!("Starting clock-demo v{}", env!("CARGO_PKG_VERSION"));

    let metrics_handle = if config.metrics.prometheus {
        Some(install_metrics_recorder()?)
    } else {
        None
    };

    let mut clock = Clock::from_config(&config.clock).context("Failed to create clock")?;

    match cli.command {
        Commands::Ordering => {
            let (summary, lines) = demos::ordering_demo(&mut clock)?;
            for line in lines {
                println!("{line}");
            }
            info!(ticks = summary.ticks, fired = summary.fired, "Ordering demo finished");
        }
        Commands::Network { time, dt, steps, units } => {
            let span = match steps {
                Some(n) => RunSpan::Steps(n),
                None => RunSpan::Duration { time, dt },
            };
            let report = demos::network_demo(&mut clock, span, units)?;
            for line in &report.progress {
                println!("{line}");
            }
            for (index, value) in report.potentials.iter().enumerate() {
                println!("unit-{index}: {value:.6}");
            }
            info!(
                ticks = report.summary.ticks,
                fired = report.summary.fired,
                time = report.summary.time,
                "Network demo finished"
            );
        }
        Commands::Config => {
            print!("{}", config::to_toml(&config)?);
        }
    }

    if let Some(handle) = metrics_handle {
        print!("{}", handle.render());
    }

    Ok(())
}

fn install_metrics_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus metrics recorder")
}
