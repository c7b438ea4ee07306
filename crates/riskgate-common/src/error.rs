//! Error types for RiskGate

use thiserror::Error;

/// RiskGate error type
#[derive(Error, Debug)]
pub enum GateError {
    /// Feed entry shorter than the wire shape
    #[error("truncated feed entry: {0} bytes")]
    TruncatedEntry(usize),

    /// Risk score outside 0..=100
    #[error("risk score out of range: {0}")]
    ScoreOutOfRange(u32),

    /// Unparseable prefix rule
    #[error("invalid prefix rule: {0}")]
    InvalidRule(String),

    /// Unparseable mode name
    #[error("invalid mode: {0}")]
    InvalidMode(String),

    /// Risk cache at capacity
    #[error("risk cache full")]
    CacheFull,

    /// Engine activation failed
    #[error("activation failed: {0}")]
    ActivationFailed(String),

    /// Memory guard fault
    #[error("memory guard: {0}")]
    MemoryGuard(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration error
    #[error("config error: {0}")]
    ConfigError(String),
}

/// Result type for RiskGate
pub type GateResult<T> = Result<T, GateError>;
