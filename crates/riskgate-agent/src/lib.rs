//! RiskGate Agent - Control Plane
//!
//! Userspace side of the egress risk filter. The agent applies the
//! memory ceiling, activates the decision engine on the egress
//! interface, and keeps the shared risk state fresh:
//!
//! ```text
//!  ┌────────────────────────── riskgate-agent ──────────────────────────┐
//!  │                                                                    │
//!  │  bootstrap: ceiling → activate ──ok──▶ Normal ──▶ refresh loop     │
//!  │                         │                         (feed → cache &  │
//!  │                         └──fail──▶ Fallback       register, stats) │
//!  │                                    (static        │                │
//!  │                                     prefix rules) │                │
//!  │                                        │          ▼                │
//!  │                                        └─────▶ Terminated          │
//!  └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Frame delivery belongs to the host networking stack; it hands each
//! captured frame to [`Agent::inspect`], which routes by state.

pub mod activate;
pub mod config;
pub mod memory;
pub mod refresh;
pub mod stress;

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{info, warn};

use riskgate_common::{parse_rules, GateResult};
use riskgate_engine::{EgressEngine, StaticFilter, Verdict};

use crate::activate::{ActiveEngine, EngineActivator};
use crate::config::AgentConfig;
use crate::memory::MemoryGuard;
use crate::refresh::RiskFeed;

pub use crate::config::Backend;

/// Run variant selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Run until stopped
    Daemon,
    /// Run for the configured duration, then exit
    Test,
    /// Churn allocations under the ceiling, then idle until stopped
    Stress,
}

/// Agent lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    /// Constructed, not yet bootstrapped
    Starting,
    /// Engine active, refresh loop feeding it
    Normal,
    /// Activation failed, static prefix rules in force
    Fallback,
    /// Run loop finished
    Terminated,
}

/// The control-plane agent
pub struct Agent {
    config: AgentConfig,
    engine: Arc<EgressEngine>,
    filter: StaticFilter,
    guard: MemoryGuard,
    state: Arc<RwLock<AgentState>>,
}

impl Agent {
    /// Build an agent from configuration. Fails only on unparseable
    /// fallback rules. An explicitly empty rule list is honored:
    /// fallback mode will then pass everything.
    pub fn new(config: AgentConfig) -> GateResult<Self> {
        let rules = parse_rules(&config.fallback_rules)?;
        Ok(Self {
            engine: Arc::new(EgressEngine::new()),
            filter: StaticFilter::new(rules),
            guard: MemoryGuard::new(config.memory_budget_bytes),
            state: Arc::new(RwLock::new(AgentState::Starting)),
            config,
        })
    }

    /// Shared engine state
    pub fn engine(&self) -> &Arc<EgressEngine> {
        &self.engine
    }

    /// Memory ceiling and usage tracker
    pub fn guard(&self) -> &MemoryGuard {
        &self.guard
    }

    /// Current lifecycle state
    pub fn state(&self) -> AgentState {
        *self.state.read()
    }

    /// Startup sequence. The ceiling goes on before any other work;
    /// then the activator decides between normal and fallback service.
    /// The returned handle owns the attachment for the agent's
    /// lifetime; there is no later re-attempt out of fallback.
    pub fn bootstrap(&self, activator: &dyn EngineActivator) -> Option<ActiveEngine> {
        match self.guard.engage() {
            Ok(()) => info!(budget = self.guard.budget(), "memory ceiling applied"),
            Err(e) => warn!(error = %e, "memory ceiling not applied, continuing unconstrained"),
        }

        match activator.activate(&self.config.interface) {
            Ok(active) => {
                self.engine.config().set_mode(self.config.initial_mode);
                *self.state.write() = AgentState::Normal;
                info!(
                    backend = active.backend(),
                    iface = %self.config.interface,
                    mode = %self.config.initial_mode,
                    "engine activated"
                );
                Some(active)
            }
            Err(e) => {
                *self.state.write() = AgentState::Fallback;
                warn!(
                    backend = activator.backend(),
                    iface = %self.config.interface,
                    error = %e,
                    "activation failed, serving fallback rules"
                );
                if self.filter.is_empty() {
                    warn!("fallback rule set is empty, all egress will pass");
                } else {
                    info!(rules = self.filter.len(), "fallback rule set loaded");
                }
                None
            }
        }
    }

    /// Route one captured frame according to lifecycle state
    pub fn inspect(&self, frame: &[u8]) -> Verdict {
        match self.state() {
            AgentState::Normal => self.engine.process(frame),
            AgentState::Fallback => self.filter.process(frame),
            // Not started yet, or already stopped: stay out of the way.
            AgentState::Starting | AgentState::Terminated => Verdict::Pass,
        }
    }

    /// Drive the agent until its run mode ends it. Always leaves the
    /// agent in `Terminated`.
    pub async fn run(&self, mode: RunMode, feed: &mut dyn RiskFeed) -> GateResult<()> {
        let outcome = match mode {
            RunMode::Daemon => self.run_refresh_loop(feed, None).await,
            RunMode::Test => {
                let window = Duration::from_secs(self.config.test_duration_secs);
                self.run_refresh_loop(feed, Some(window)).await
            }
            RunMode::Stress => self.run_stress().await,
        };
        *self.state.write() = AgentState::Terminated;
        info!("agent terminated");
        outcome
    }

    async fn run_refresh_loop(
        &self,
        feed: &mut dyn RiskFeed,
        window: Option<Duration>,
    ) -> GateResult<()> {
        let started = Instant::now();
        loop {
            let mut pause =
                refresh::jittered_interval(Duration::from_secs(self.config.poll_interval_secs));
            if let Some(window) = window {
                let left = window.saturating_sub(started.elapsed());
                if left.is_zero() {
                    info!(secs = window.as_secs(), "test window elapsed");
                    return Ok(());
                }
                pause = pause.min(left);
            }

            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result?;
                    info!("stop signal received");
                    return Ok(());
                }
                _ = tokio::time::sleep(pause) => {}
            }

            // Fallback mode serves the static rules and leaves the
            // cache and register alone.
            if self.state() == AgentState::Normal {
                match feed.poll() {
                    Ok(update) => {
                        let outcome = refresh::apply_update(&self.engine, update);
                        info!(
                            feed = feed.name(),
                            applied = outcome.applied,
                            skipped = outcome.skipped,
                            "refresh cycle"
                        );
                    }
                    Err(e) => warn!(feed = feed.name(), error = %e, "feed poll failed"),
                }
            }

            let snapshot = self.engine.stats().snapshot();
            info!(
                total = snapshot.total_packets,
                high_risk = snapshot.high_risk_hits,
                blocked = snapshot.blocked_packets,
                allowed = snapshot.allowed_packets,
                "engine counters"
            );
        }
    }

    async fn run_stress(&self) -> GateResult<()> {
        stress::churn(&self.guard).await;
        info!("churn complete, idling until stopped");
        tokio::signal::ctrl_c().await?;
        info!("stop signal received");
        Ok(())
    }
}
