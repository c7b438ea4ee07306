//! Stress Churn
//!
//! Allocate/touch/free cycles at a fixed cadence with the memory guard
//! sampling after each one. Exercises the allocator under the
//! data-segment ceiling so regressions in agent footprint show up
//! before a rollout does.

use std::hint::black_box;
use std::time::Duration;

use tracing::{info, warn};

use crate::memory::MemoryGuard;

/// Cycles in one churn phase
pub const CHURN_CYCLES: usize = 50;
/// Bytes allocated per cycle
pub const CHURN_BYTES: usize = 50 * 1024;
/// Cadence between cycles
pub const CHURN_CADENCE: Duration = Duration::from_millis(50);

/// One allocate/touch/free cycle. Touching every byte keeps the
/// allocation from being optimized away.
pub fn churn_once(bytes: usize) -> usize {
    let mut buf = vec![0u8; bytes];
    for (i, slot) in buf.iter_mut().enumerate() {
        *slot = (i & 0xff) as u8;
    }
    black_box(buf.len())
}

/// Full churn phase with the default shape
pub async fn churn(guard: &MemoryGuard) {
    churn_with(guard, CHURN_CYCLES, CHURN_BYTES, CHURN_CADENCE).await;
}

/// Churn phase with an explicit shape
pub async fn churn_with(guard: &MemoryGuard, cycles: usize, bytes: usize, cadence: Duration) {
    info!(cycles, bytes, "starting churn phase");
    let mut ticker = tokio::time::interval(cadence.max(Duration::from_millis(1)));
    for cycle in 0..cycles {
        ticker.tick().await;
        churn_once(bytes);
        match guard.sample() {
            Ok(used) => {
                if guard.engaged() && used > guard.budget() {
                    warn!(cycle, used, budget = guard.budget(), "data segment above budget");
                }
            }
            Err(e) => warn!(cycle, error = %e, "usage sample failed"),
        }
    }
    info!(peak = guard.peak(), "churn phase complete");
}
