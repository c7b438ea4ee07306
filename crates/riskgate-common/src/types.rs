//! Operating mode and risk record types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GateError;

/// Highest representable risk score
pub const MAX_SCORE: u32 = 100;

/// Engine operating mode, held in the config register
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Count traffic, classify nothing
    #[default]
    Disabled,
    /// Audit high-risk destinations, allow everything
    Monitor,
    /// Audit and drop high-risk destinations
    Enforce,
}

impl Mode {
    /// Register encoding of this mode.
    #[inline]
    pub const fn as_raw(self) -> u32 {
        match self {
            Mode::Disabled => 0,
            Mode::Monitor => 1,
            Mode::Enforce => 2,
        }
    }

    /// Decode a raw register value. Unknown values act as Monitor: an
    /// unexpected register write can audit but never escalate to drops.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Mode::Disabled,
            2 => Mode::Enforce,
            _ => Mode::Monitor,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Disabled => "disabled",
            Mode::Monitor => "monitor",
            Mode::Enforce => "enforce",
        };
        f.write_str(name)
    }
}

impl FromStr for Mode {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disabled" => Ok(Mode::Disabled),
            "monitor" => Ok(Mode::Monitor),
            "enforce" => Ok(Mode::Enforce),
            other => Err(GateError::InvalidMode(other.to_string())),
        }
    }
}

/// Per-destination risk data held by the risk cache.
///
/// `blocked` is advisory: verdicts derive from score and mode, never from
/// this flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskRecord {
    /// Risk score, 0 to [`MAX_SCORE`]
    pub score: u32,
    /// Advisory blocked flag carried from the feed
    pub blocked: bool,
    /// Absolute expiry, seconds since the Unix epoch
    pub expiry: u64,
}

impl RiskRecord {
    /// Whether the record is past its expiry at `now` (seconds).
    #[inline]
    pub const fn is_expired(&self, now: u64) -> bool {
        now > self.expiry
    }
}
