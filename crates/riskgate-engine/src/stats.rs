//! Engine Statistics
//!
//! Lock-free counters for the four mandated stats slots. Engine code
//! only increments; snapshots are taken off the hot path.

use std::sync::atomic::{AtomicU64, Ordering};

use riskgate_common::wire::{
    STAT_ALLOWED_PACKETS, STAT_BLOCKED_PACKETS, STAT_HIGH_RISK_HITS, STAT_SLOTS,
    STAT_TOTAL_PACKETS,
};

/// Packet counters (cache-line aligned)
#[repr(C, align(64))]
pub struct EngineStats {
    /// Packets with a complete IPv4 header, any mode
    pub total_packets: AtomicU64,
    /// Packets whose destination scored at or above the threshold
    pub high_risk_hits: AtomicU64,
    /// Packets dropped in enforce mode
    pub blocked_packets: AtomicU64,
    /// Packets allowed past the classifier
    pub allowed_packets: AtomicU64,
}

impl Default for EngineStats {
    fn default() -> Self {
        Self {
            total_packets: AtomicU64::new(0),
            high_risk_hits: AtomicU64::new(0),
            blocked_packets: AtomicU64::new(0),
            allowed_packets: AtomicU64::new(0),
        }
    }
}

impl EngineStats {
    #[inline(always)]
    pub fn record_total(&self) {
        self.total_packets.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_high_risk(&self) {
        self.high_risk_hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_blocked(&self) {
        self.blocked_packets.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_allowed(&self) {
        self.allowed_packets.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the counters out.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_packets: self.total_packets.load(Ordering::Relaxed),
            high_risk_hits: self.high_risk_hits.load(Ordering::Relaxed),
            blocked_packets: self.blocked_packets.load(Ordering::Relaxed),
            allowed_packets: self.allowed_packets.load(Ordering::Relaxed),
        }
    }
}

/// Stats snapshot (non-atomic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Packets seen
    pub total_packets: u64,
    /// High-risk hits
    pub high_risk_hits: u64,
    /// Blocked packets
    pub blocked_packets: u64,
    /// Allowed packets
    pub allowed_packets: u64,
}

impl StatsSnapshot {
    /// The counters laid out at their fixed slot indices.
    pub fn as_slots(&self) -> [u64; STAT_SLOTS] {
        let mut slots = [0u64; STAT_SLOTS];
        slots[STAT_TOTAL_PACKETS] = self.total_packets;
        slots[STAT_HIGH_RISK_HITS] = self.high_risk_hits;
        slots[STAT_BLOCKED_PACKETS] = self.blocked_packets;
        slots[STAT_ALLOWED_PACKETS] = self.allowed_packets;
        slots
    }
}
