//! RiskGate Common - Shared types for the egress risk filter
//!
//! This crate provides the leaf types shared by the decision engine and
//! the control-plane agent:
//! - Operating mode and per-destination risk records
//! - The feed entry wire codec and stats slot layout
//! - Fallback prefix rules
//! - Error handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod rules;
pub mod types;
pub mod wire;

pub use error::*;
pub use rules::*;
pub use types::*;
pub use wire::*;
