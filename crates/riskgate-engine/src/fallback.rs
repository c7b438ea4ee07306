//! Static fallback filter
//!
//! Host-side prefix matching used while the decision engine is
//! inactive. There is no risk cache, no mode register, and no counter
//! updates here: a destination inside any listed prefix is dropped,
//! everything else is passed.

use std::net::Ipv4Addr;
use std::sync::Arc;

use tracing::warn;

use riskgate_common::PrefixRule;

use crate::engine::Verdict;
use crate::packet;

/// Ordered prefix filter for fallback mode
#[derive(Debug, Clone)]
pub struct StaticFilter {
    rules: Arc<[PrefixRule]>,
}

impl StaticFilter {
    /// Build from an ordered rule list.
    pub fn new(rules: Vec<PrefixRule>) -> Self {
        Self {
            rules: rules.into(),
        }
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the rule list is empty (an empty list passes everything).
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The rules, in match order.
    pub fn rules(&self) -> &[PrefixRule] {
        &self.rules
    }

    /// Match a frame's destination against the rules, first match wins.
    pub fn process(&self, frame: &[u8]) -> Verdict {
        let dest = match packet::ipv4_dest(frame) {
            Some(dest) => dest,
            None => return Verdict::Pass,
        };
        for rule in self.rules.iter() {
            if rule.matches(dest) {
                warn!(
                    dest = %Ipv4Addr::from(dest),
                    rule = %rule,
                    "destination matched fallback rule, dropping"
                );
                return Verdict::Drop;
            }
        }
        Verdict::Pass
    }
}
