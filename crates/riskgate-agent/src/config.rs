//! Agent Configuration

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use riskgate_common::{GateError, Mode, DEFAULT_RULES};

use crate::memory::DEFAULT_BUDGET_BYTES;

/// Activation backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Direct raw-socket attach
    Socket,
    /// Compiled filter object loaded through the helper framework
    Object,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Socket => f.write_str("socket"),
            Backend::Object => f.write_str("object"),
        }
    }
}

impl FromStr for Backend {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "socket" => Ok(Backend::Socket),
            "object" => Ok(Backend::Object),
            other => Err(GateError::ConfigError(format!("unknown backend: {other}"))),
        }
    }
}

/// Agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Egress interface the engine attaches to
    pub interface: String,
    /// Activation backend
    pub backend: Backend,
    /// Compiled filter object path (object backend)
    pub object_path: String,
    /// Program name inside the filter object
    pub object_program: String,
    /// Mode written to the config register after activation
    pub initial_mode: Mode,
    /// Refresh poll interval, seconds
    pub poll_interval_secs: u64,
    /// Data-segment budget, bytes
    pub memory_budget_bytes: u64,
    /// Fallback prefixes as `a.b.c.d/len`; an explicitly empty list
    /// makes fallback mode pass everything
    pub fallback_rules: Vec<String>,
    /// Test-mode run duration, seconds
    pub test_duration_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            interface: "eth0".into(),
            backend: Backend::Socket,
            object_path: "/usr/lib/riskgate/egress_filter.o".into(),
            object_program: "riskgate_filter".into(),
            initial_mode: Mode::Disabled,
            poll_interval_secs: 60,
            memory_budget_bytes: DEFAULT_BUDGET_BYTES,
            fallback_rules: DEFAULT_RULES.iter().map(|s| s.to_string()).collect(),
            test_duration_secs: 5,
        }
    }
}

impl AgentConfig {
    /// Load from file
    pub fn load(path: &str) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Save to file
    pub fn save(&self, path: &str) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
