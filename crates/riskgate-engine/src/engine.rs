//! Decision Engine
//!
//! The per-packet verdict function. Order matters and is observable:
//! parse with bounds checks, count the packet, gate on mode, look the
//! destination up, apply lazy expiry, compare against the threshold,
//! then monitor/enforce the outcome. Malformed input is passed without
//! touching a single counter.

use std::net::Ipv4Addr;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;

use riskgate_common::Mode;

use crate::cache::RiskCache;
use crate::config::ConfigCell;
use crate::packet;
use crate::stats::EngineStats;

/// Score at or above which a destination is high-risk
pub const RISK_THRESHOLD: u32 = 80;

/// Packet verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Let the frame through
    Pass,
    /// Discard the frame
    Drop,
}

/// The decision engine and the state it shares with the control plane.
///
/// The engine side only reads the cache and the register and only
/// increments the stats; the control plane owns all writes.
pub struct EgressEngine {
    cache: RiskCache,
    config: ConfigCell,
    stats: EngineStats,
}

impl EgressEngine {
    /// Engine with an empty cache, Disabled register, zero counters.
    pub fn new() -> Self {
        Self {
            cache: RiskCache::new(),
            config: ConfigCell::new(),
            stats: EngineStats::default(),
        }
    }

    /// Shared risk cache.
    pub fn cache(&self) -> &RiskCache {
        &self.cache
    }

    /// Shared mode register.
    pub fn config(&self) -> &ConfigCell {
        &self.config
    }

    /// Shared packet counters.
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Classify one frame against the wall clock.
    #[inline]
    pub fn process(&self, frame: &[u8]) -> Verdict {
        self.process_at(frame, unix_now())
    }

    /// Classify one frame at an explicit time (seconds since epoch).
    pub fn process_at(&self, frame: &[u8], now: u64) -> Verdict {
        let dest = match packet::ipv4_dest(frame) {
            Some(dest) => dest,
            // Truncated or non-IPv4: invisible to this layer.
            None => return Verdict::Pass,
        };

        // Counted before the mode gate: a Disabled engine still counts
        // the packets it saw.
        self.stats.record_total();

        let mode = self.config.mode();
        if mode == Mode::Disabled {
            return Verdict::Pass;
        }

        let record = match self.cache.lookup(dest) {
            Some(record) => record,
            None => {
                self.stats.record_allowed();
                return Verdict::Pass;
            }
        };

        // Lazy TTL: a stale record reads as absent and stays in place.
        if record.is_expired(now) {
            self.stats.record_allowed();
            return Verdict::Pass;
        }

        if record.score < RISK_THRESHOLD {
            self.stats.record_allowed();
            return Verdict::Pass;
        }

        self.stats.record_high_risk();
        match mode {
            Mode::Enforce => {
                warn!(
                    dest = %Ipv4Addr::from(dest),
                    score = record.score,
                    "high-risk destination blocked"
                );
                self.stats.record_blocked();
                Verdict::Drop
            }
            // Monitor, plus any unknown register value the decode
            // mapped to Monitor.
            _ => {
                warn!(
                    dest = %Ipv4Addr::from(dest),
                    score = record.score,
                    "high-risk destination allowed (monitor)"
                );
                self.stats.record_allowed();
                Verdict::Pass
            }
        }
    }
}

impl Default for EgressEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatsSnapshot;
    use proptest::prelude::*;
    use riskgate_common::RiskRecord;

    const NOW: u64 = 1_700_000_000;
    const FAR_FUTURE: u64 = NOW + 86_400;

    fn make_frame(dest: [u8; 4]) -> Vec<u8> {
        let mut frame = vec![0u8; 54];
        frame[12] = 0x08;
        frame[13] = 0x00;
        frame[14] = 0x45;
        frame[30..34].copy_from_slice(&dest);
        frame
    }

    fn engine_with(mode: Mode, dest: u32, record: RiskRecord) -> EgressEngine {
        let engine = EgressEngine::new();
        engine.config().set_mode(mode);
        engine.cache().insert(dest, record).unwrap();
        engine
    }

    fn record(score: u32, expiry: u64) -> RiskRecord {
        RiskRecord {
            score,
            blocked: score >= RISK_THRESHOLD,
            expiry,
        }
    }

    #[test]
    fn test_truncated_frames_touch_nothing() {
        let engine = EgressEngine::new();
        engine.config().set_mode(Mode::Enforce);

        let frame = make_frame([10, 0, 0, 1]);
        assert_eq!(engine.process_at(&frame[..9], NOW), Verdict::Pass);
        assert_eq!(engine.process_at(&frame[..14], NOW), Verdict::Pass);
        assert_eq!(engine.process_at(&frame[..33], NOW), Verdict::Pass);

        assert_eq!(engine.stats().snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_non_ipv4_touches_nothing() {
        let engine = EgressEngine::new();
        engine.config().set_mode(Mode::Enforce);

        let mut arp = make_frame([10, 0, 0, 1]);
        arp[12] = 0x08;
        arp[13] = 0x06;
        assert_eq!(engine.process_at(&arp, NOW), Verdict::Pass);
        assert_eq!(engine.stats().snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_disabled_counts_total_only() {
        let engine = EgressEngine::new();
        // Register never written: reads as Disabled.
        let frame = make_frame([10, 0, 0, 1]);
        assert_eq!(engine.process_at(&frame, NOW), Verdict::Pass);

        let snap = engine.stats().snapshot();
        assert_eq!(snap.total_packets, 1);
        assert_eq!(snap.allowed_packets, 0);
        assert_eq!(snap.high_risk_hits, 0);
        assert_eq!(snap.blocked_packets, 0);
    }

    #[test]
    fn test_cache_miss_allows() {
        let engine = EgressEngine::new();
        engine.config().set_mode(Mode::Enforce);

        let frame = make_frame([203, 0, 113, 9]);
        assert_eq!(engine.process_at(&frame, NOW), Verdict::Pass);

        let snap = engine.stats().snapshot();
        assert_eq!(snap.total_packets, 1);
        assert_eq!(snap.allowed_packets, 1);
        assert_eq!(snap.high_risk_hits, 0);
    }

    #[test]
    fn test_low_score_allows() {
        let dest = u32::from_be_bytes([10, 0, 0, 2]);
        let engine = engine_with(Mode::Enforce, dest, record(79, FAR_FUTURE));

        assert_eq!(engine.process_at(&make_frame([10, 0, 0, 2]), NOW), Verdict::Pass);

        let snap = engine.stats().snapshot();
        assert_eq!(snap.allowed_packets, 1);
        assert_eq!(snap.high_risk_hits, 0);
    }

    #[test]
    fn test_enforce_drops_at_threshold() {
        let dest = u32::from_be_bytes([10, 0, 0, 3]);
        let engine = engine_with(Mode::Enforce, dest, record(80, FAR_FUTURE));

        assert_eq!(engine.process_at(&make_frame([10, 0, 0, 3]), NOW), Verdict::Drop);
    }

    #[test]
    fn test_enforce_drops_high_risk() {
        let dest = u32::from_be_bytes([10, 0, 0, 4]);
        let engine = engine_with(Mode::Enforce, dest, record(95, FAR_FUTURE));

        assert_eq!(engine.process_at(&make_frame([10, 0, 0, 4]), NOW), Verdict::Drop);

        let snap = engine.stats().snapshot();
        assert_eq!(snap.total_packets, 1);
        assert_eq!(snap.high_risk_hits, 1);
        assert_eq!(snap.blocked_packets, 1);
        assert_eq!(snap.allowed_packets, 0);
    }

    #[test]
    fn test_monitor_allows_high_risk() {
        let dest = u32::from_be_bytes([10, 0, 0, 5]);
        let engine = engine_with(Mode::Monitor, dest, record(95, FAR_FUTURE));

        assert_eq!(engine.process_at(&make_frame([10, 0, 0, 5]), NOW), Verdict::Pass);

        let snap = engine.stats().snapshot();
        assert_eq!(snap.total_packets, 1);
        assert_eq!(snap.high_risk_hits, 1);
        assert_eq!(snap.allowed_packets, 1);
        assert_eq!(snap.blocked_packets, 0);
    }

    #[test]
    fn test_expired_record_allows_and_persists() {
        let dest = u32::from_be_bytes([10, 0, 0, 6]);
        let stale = record(95, NOW - 1);
        let engine = engine_with(Mode::Enforce, dest, stale);

        assert_eq!(engine.process_at(&make_frame([10, 0, 0, 6]), NOW), Verdict::Pass);

        let snap = engine.stats().snapshot();
        assert_eq!(snap.allowed_packets, 1);
        assert_eq!(snap.high_risk_hits, 0);

        // The stale record was not deleted or rewritten.
        assert_eq!(engine.cache().lookup(dest), Some(stale));
    }

    #[test]
    fn test_expiry_boundary_is_strict() {
        let dest = u32::from_be_bytes([10, 0, 0, 7]);
        let engine = engine_with(Mode::Enforce, dest, record(95, NOW));

        // now == expiry is not yet expired.
        assert_eq!(engine.process_at(&make_frame([10, 0, 0, 7]), NOW), Verdict::Drop);
        assert_eq!(engine.process_at(&make_frame([10, 0, 0, 7]), NOW + 1), Verdict::Pass);
    }

    #[test]
    fn test_unknown_mode_acts_as_monitor() {
        let dest = u32::from_be_bytes([10, 0, 0, 8]);
        let engine = EgressEngine::new();
        engine.config().set_raw(7);
        engine.cache().insert(dest, record(95, FAR_FUTURE)).unwrap();

        assert_eq!(engine.process_at(&make_frame([10, 0, 0, 8]), NOW), Verdict::Pass);

        let snap = engine.stats().snapshot();
        assert_eq!(snap.high_risk_hits, 1);
        assert_eq!(snap.allowed_packets, 1);
        assert_eq!(snap.blocked_packets, 0);
    }

    #[test]
    fn test_total_counts_in_every_mode() {
        for mode in [Mode::Disabled, Mode::Monitor, Mode::Enforce] {
            let engine = EgressEngine::new();
            engine.config().set_mode(mode);
            engine.process_at(&make_frame([10, 9, 9, 9]), NOW);
            assert_eq!(engine.stats().snapshot().total_packets, 1, "mode {mode}");
        }
    }

    #[test]
    fn test_concurrent_invocations_lose_no_updates() {
        const THREADS: usize = 4;
        const ROUNDS: usize = 1_000;

        let high = u32::from_be_bytes([10, 1, 0, 1]);
        let engine = engine_with(Mode::Enforce, high, record(95, FAR_FUTURE));

        let high_frame = make_frame([10, 1, 0, 1]);
        let miss_frame = make_frame([10, 1, 0, 2]);

        crossbeam::thread::scope(|scope| {
            for _ in 0..THREADS {
                scope.spawn(|_| {
                    for round in 0..ROUNDS {
                        let frame = if round % 2 == 0 { &high_frame } else { &miss_frame };
                        engine.process_at(frame, NOW);
                    }
                });
            }
        })
        .unwrap();

        let snap = engine.stats().snapshot();
        let per_kind = (THREADS * ROUNDS / 2) as u64;
        assert_eq!(snap.total_packets, (THREADS * ROUNDS) as u64);
        assert_eq!(snap.high_risk_hits, per_kind);
        assert_eq!(snap.blocked_packets, per_kind);
        assert_eq!(snap.allowed_packets, per_kind);
    }

    proptest! {
        #[test]
        fn unparseable_input_never_counts(data in proptest::collection::vec(any::<u8>(), 0..128)) {
            prop_assume!(crate::packet::ipv4_dest(&data).is_none());

            let engine = EgressEngine::new();
            engine.config().set_mode(Mode::Enforce);
            prop_assert_eq!(engine.process_at(&data, NOW), Verdict::Pass);
            prop_assert_eq!(engine.stats().snapshot(), StatsSnapshot::default());
        }
    }
}
