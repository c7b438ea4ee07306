//! Wire shapes shared with feed transports and the filter object
//!
//! All multi-byte fields are network byte order.

use bytes::{Buf, BufMut};

use crate::error::{GateError, GateResult};
use crate::types::{RiskRecord, MAX_SCORE};

/// Stats slot: packets seen
pub const STAT_TOTAL_PACKETS: usize = 0;
/// Stats slot: high-risk hits
pub const STAT_HIGH_RISK_HITS: usize = 1;
/// Stats slot: blocked packets
pub const STAT_BLOCKED_PACKETS: usize = 2;
/// Stats slot: allowed packets
pub const STAT_ALLOWED_PACKETS: usize = 3;
/// Number of stats slots
pub const STAT_SLOTS: usize = 4;

/// Encoded length of one feed entry: 4-byte key, u32 score, 1-byte
/// blocked flag, u64 expiry seconds.
pub const ENTRY_LEN: usize = 17;

/// One decoded feed entry: a destination and its risk record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskEntry {
    /// Destination IPv4 address as a u32 (`u32::from(Ipv4Addr)`)
    pub dest: u32,
    /// Risk record for the destination
    pub record: RiskRecord,
}

impl RiskEntry {
    /// Decode one entry from `buf`, validating the score range.
    pub fn decode(buf: &mut impl Buf) -> GateResult<Self> {
        if buf.remaining() < ENTRY_LEN {
            return Err(GateError::TruncatedEntry(buf.remaining()));
        }
        let dest = buf.get_u32();
        let score = buf.get_u32();
        let blocked = buf.get_u8() != 0;
        let expiry = buf.get_u64();
        if score > MAX_SCORE {
            return Err(GateError::ScoreOutOfRange(score));
        }
        Ok(Self {
            dest,
            record: RiskRecord {
                score,
                blocked,
                expiry,
            },
        })
    }

    /// Encode this entry into `buf`.
    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u32(self.dest);
        buf.put_u32(self.record.score);
        buf.put_u8(self.record.blocked as u8);
        buf.put_u64(self.record.expiry);
    }
}
