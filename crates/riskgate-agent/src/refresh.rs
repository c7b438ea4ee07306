//! Risk Feed Refresh
//!
//! The transport that delivers risk intelligence is deployment
//! specific, so the agent only owns the landing interface: a polled
//! feed trait, validated application of entries into the shared cache,
//! and the jitter applied to the poll cadence.

use std::net::Ipv4Addr;
use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

use riskgate_common::{GateResult, Mode, RiskEntry, RiskRecord, MAX_SCORE};
use riskgate_engine::EgressEngine;

/// One batch handed back by a feed poll
#[derive(Debug, Clone, Default)]
pub struct FeedUpdate {
    /// Records to write into the risk cache
    pub entries: Vec<RiskEntry>,
    /// New register mode, if the feed carries one
    pub mode: Option<Mode>,
}

/// A source of risk updates polled by the agent loop
pub trait RiskFeed: Send {
    /// Feed name for logs
    fn name(&self) -> &str;

    /// Hand back whatever the transport has pending. An empty update
    /// is a normal answer, not an error.
    fn poll(&mut self) -> GateResult<FeedUpdate>;
}

/// In-process feed serving one fixed batch, then empty updates
pub struct StaticFeed {
    pending: Option<FeedUpdate>,
}

impl StaticFeed {
    /// Feed that serves `update` on the first poll
    pub fn new(update: FeedUpdate) -> Self {
        Self {
            pending: Some(update),
        }
    }

    /// Feed with nothing to serve
    pub fn empty() -> Self {
        Self { pending: None }
    }
}

impl RiskFeed for StaticFeed {
    fn name(&self) -> &str {
        "static"
    }

    fn poll(&mut self) -> GateResult<FeedUpdate> {
        Ok(self.pending.take().unwrap_or_default())
    }
}

/// Counts from one apply pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Entries written into the cache
    pub applied: usize,
    /// Entries rejected and logged
    pub skipped: usize,
}

/// Write a feed update into the engine's shared state. Bad entries
/// are skipped with a warning; one rejected record must not take the
/// rest of the batch down with it.
pub fn apply_update(engine: &EgressEngine, update: FeedUpdate) -> ApplyOutcome {
    let mut outcome = ApplyOutcome::default();
    for entry in update.entries {
        if entry.record.score > MAX_SCORE {
            warn!(
                dest = %Ipv4Addr::from(entry.dest),
                score = entry.record.score,
                "skipping feed entry with out-of-range score"
            );
            outcome.skipped += 1;
            continue;
        }
        match engine.cache().insert(entry.dest, entry.record) {
            Ok(()) => outcome.applied += 1,
            Err(e) => {
                warn!(
                    dest = %Ipv4Addr::from(entry.dest),
                    score = entry.record.score,
                    error = %e,
                    "skipping feed entry"
                );
                outcome.skipped += 1;
            }
        }
    }
    if let Some(mode) = update.mode {
        engine.config().set_mode(mode);
        info!(%mode, "config register updated");
    }
    outcome
}

/// Record for `dest` scoring `score`, expiring `ttl_secs` from now.
/// Transports hand absolute expiries to the cache; this is the helper
/// that turns their relative TTLs into one.
pub fn entry_with_ttl(dest: Ipv4Addr, score: u32, blocked: bool, ttl_secs: u64) -> RiskEntry {
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    RiskEntry {
        dest: u32::from(dest),
        record: RiskRecord {
            score,
            blocked,
            // Saturate rather than wrap: an absurd TTL must not come
            // out as an expiry in the past.
            expiry: now.saturating_add(ttl_secs),
        },
    }
}

/// Poll interval with up to 10% of jitter either way, so a fleet of
/// agents does not hammer the feed in lockstep.
pub fn jittered_interval(base: Duration) -> Duration {
    let factor = rand::thread_rng().gen_range(0.9..=1.1);
    Duration::from_secs_f64(base.as_secs_f64() * factor)
}
