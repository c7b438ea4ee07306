//! RiskGate Agent - Main Entry Point

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use riskgate_agent::activate::activator_for;
use riskgate_agent::config::AgentConfig;
use riskgate_agent::refresh::StaticFeed;
use riskgate_agent::{Agent, Backend, RunMode};
use riskgate_common::Mode;

/// Egress risk filter control plane
#[derive(Debug, Parser)]
#[command(name = "riskgate-agent", version, about)]
struct Cli {
    /// Run for a bounded window, then exit
    #[arg(long = "test-mode", conflicts_with = "stress_test")]
    test_mode: bool,

    /// Churn allocations under the memory ceiling, then idle
    #[arg(long = "stress-test")]
    stress_test: bool,

    /// Configuration file path
    #[arg(long, env = "RISKGATE_CONFIG", default_value = "/etc/riskgate/agent.json")]
    config: String,

    /// Egress interface (overrides the config file)
    #[arg(long)]
    interface: Option<String>,

    /// Initial register mode: disabled, monitor or enforce
    #[arg(long)]
    mode: Option<Mode>,

    /// Activation backend: socket or object
    #[arg(long)]
    backend: Option<Backend>,

    /// Test window in seconds (with --test-mode)
    #[arg(long)]
    duration: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    info!("RiskGate Agent v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match AgentConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %cli.config, "no configuration file, using defaults");
            AgentConfig::default()
        }
        Err(e) => return Err(e).with_context(|| format!("loading {}", cli.config)),
    };
    if let Some(interface) = cli.interface {
        config.interface = interface;
    }
    if let Some(mode) = cli.mode {
        config.initial_mode = mode;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(duration) = cli.duration {
        config.test_duration_secs = duration;
    }

    let run_mode = if cli.test_mode {
        RunMode::Test
    } else if cli.stress_test {
        RunMode::Stress
    } else {
        RunMode::Daemon
    };

    let activator = activator_for(&config);
    let agent = Agent::new(config).context("agent setup")?;
    let active = agent.bootstrap(activator.as_ref());

    let mut feed = StaticFeed::empty();
    agent.run(run_mode, &mut feed).await.context("agent run")?;

    // Detach, if anything was attached.
    drop(active);
    Ok(())
}
