//! Config Register
//!
//! Single-cell mode register. Zero-initialized, so an agent that never
//! writes it reads back Disabled. Written only by the control plane,
//! read on every packet.

use std::sync::atomic::{AtomicU32, Ordering};

use riskgate_common::Mode;

/// Shared operating-mode register
#[derive(Debug, Default)]
pub struct ConfigCell(AtomicU32);

impl ConfigCell {
    /// Create a register holding Disabled.
    pub const fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    /// Current mode. Unknown raw values decode as Monitor.
    #[inline(always)]
    pub fn mode(&self) -> Mode {
        Mode::from_raw(self.0.load(Ordering::Acquire))
    }

    /// Raw register value.
    #[inline(always)]
    pub fn raw(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }

    /// Store a mode.
    pub fn set_mode(&self, mode: Mode) {
        self.0.store(mode.as_raw(), Ordering::Release);
    }

    /// Store a raw register value.
    pub fn set_raw(&self, raw: u32) {
        self.0.store(raw, Ordering::Release);
    }
}
