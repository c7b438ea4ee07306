//! Static fallback prefix rules
//!
//! An ordered (prefix, mask) list matched against destination addresses
//! while the decision engine is inactive. Masks of any length are
//! accepted; the shipped default is a single /16.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use ipnetwork::Ipv4Network;

use crate::error::{GateError, GateResult};

/// Rule set applied when no rules are configured
pub const DEFAULT_RULES: &[&str] = &["36.8.0.0/16"];

/// One (prefix, mask) pair matched against destination addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixRule(Ipv4Network);

impl PrefixRule {
    /// Wrap an already-validated network.
    pub const fn new(net: Ipv4Network) -> Self {
        Self(net)
    }

    /// Whether `dest` (as `u32::from(Ipv4Addr)`) falls inside the prefix.
    #[inline]
    pub fn matches(&self, dest: u32) -> bool {
        self.0.contains(Ipv4Addr::from(dest))
    }

    /// Network prefix as a u32.
    pub fn prefix(&self) -> u32 {
        u32::from(self.0.network())
    }

    /// Netmask as a u32.
    pub fn mask(&self) -> u32 {
        u32::from(self.0.mask())
    }
}

impl FromStr for PrefixRule {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let net = Ipv4Network::from_str(s)
            .map_err(|e| GateError::InvalidRule(format!("{s}: {e}")))?;
        Ok(Self(net))
    }
}

impl fmt::Display for PrefixRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Parse an ordered rule list, preserving order. Fails on the first
/// unparseable entry.
pub fn parse_rules<S: AsRef<str>>(specs: &[S]) -> GateResult<Vec<PrefixRule>> {
    specs.iter().map(|s| s.as_ref().parse()).collect()
}

/// Built-in default rule set.
pub fn default_rules() -> Vec<PrefixRule> {
    DEFAULT_RULES
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect()
}
