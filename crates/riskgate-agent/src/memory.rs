//! Memory Guard
//!
//! The agent runs next to the forwarding path and must never balloon.
//! The guard applies a hard data-segment ceiling at startup and samples
//! actual usage afterwards, tracking the high-water mark.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use riskgate_common::{GateError, GateResult};

/// Hard budget for the data segment (3 MiB)
pub const DEFAULT_BUDGET_BYTES: u64 = 3 * 1024 * 1024;

/// Process-wide memory ceiling and usage tracker
#[derive(Debug)]
pub struct MemoryGuard {
    budget: u64,
    engaged: AtomicBool,
    peak: Mutex<u64>,
}

impl MemoryGuard {
    /// Guard with the given budget. Nothing is applied until `engage`.
    pub fn new(budget: u64) -> Self {
        Self {
            budget,
            engaged: AtomicBool::new(false),
            peak: Mutex::new(0),
        }
    }

    /// Budget in bytes
    pub fn budget(&self) -> u64 {
        self.budget
    }

    /// Whether the ceiling is in force
    pub fn engaged(&self) -> bool {
        self.engaged.load(Ordering::Relaxed)
    }

    /// Apply the data-segment rlimit. Callers treat failure as a
    /// warning, not a fatal error.
    pub fn engage(&self) -> GateResult<()> {
        let limit = libc::rlimit {
            rlim_cur: self.budget,
            rlim_max: self.budget,
        };
        // Safety: limit is a properly initialized rlimit on the stack.
        let rc = unsafe { libc::setrlimit(libc::RLIMIT_DATA, &limit) };
        if rc != 0 {
            let err = std::io::Error::last_os_error();
            return Err(GateError::MemoryGuard(format!(
                "setrlimit RLIMIT_DATA to {} bytes: {err}",
                self.budget
            )));
        }
        self.engaged.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Current data-segment size in bytes, read from /proc/self/statm.
    /// Also updates the high-water mark.
    pub fn sample(&self) -> GateResult<u64> {
        let statm = std::fs::read_to_string("/proc/self/statm")?;
        // statm: size resident shared text lib data dt
        let data_pages: u64 = statm
            .split_whitespace()
            .nth(5)
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| GateError::MemoryGuard("malformed /proc/self/statm".into()))?;
        // Safety: sysconf takes no pointers.
        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as u64;
        let bytes = data_pages * page_size;

        let mut peak = self.peak.lock();
        if bytes > *peak {
            *peak = bytes;
        }
        Ok(bytes)
    }

    /// Highest data-segment size observed by `sample`
    pub fn peak(&self) -> u64 {
        *self.peak.lock()
    }
}

impl Default for MemoryGuard {
    fn default() -> Self {
        Self::new(DEFAULT_BUDGET_BYTES)
    }
}
