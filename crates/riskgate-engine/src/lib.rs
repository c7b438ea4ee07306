//! RiskGate Decision Engine
//!
//! Per-packet egress classification against a bounded risk cache.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      DECISION ENGINE                         │
//! │                                                              │
//! │  frame ──▶ parse (bounds-checked) ──▶ total++ ──▶ mode gate  │
//! │                                                      │       │
//! │                 ┌────────────────────────────────────┘       │
//! │                 ▼                                            │
//! │           risk cache lookup ──▶ lazy TTL ──▶ threshold       │
//! │                 │                                │           │
//! │                 ▼                                ▼           │
//! │           Pass (allowed++)          Monitor: Pass + audit    │
//! │                                     Enforce: Drop + audit    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine reads shared state written by the control plane (risk
//! cache, mode register) and increments atomic counters. It never
//! allocates, blocks, or sleeps; one hashed lookup per packet.
//!
//! While the engine is inactive the control plane routes frames through
//! [`StaticFilter`] instead, a plain ordered prefix match.

pub mod cache;
pub mod config;
pub mod engine;
pub mod fallback;
pub mod packet;
pub mod stats;

pub use cache::{RiskCache, DEFAULT_CAPACITY};
pub use config::ConfigCell;
pub use engine::{EgressEngine, Verdict, RISK_THRESHOLD};
pub use fallback::StaticFilter;
pub use stats::{EngineStats, StatsSnapshot};
