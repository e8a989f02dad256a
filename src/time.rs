//! Pluggable time sources.
//!
//! The engine never reads a global clock: every timestamp comes from an
//! injected `TimeSource`, so a simulated clock makes whole runs
//! reproducible. The same `Arc<dyn TimeSource>` may be shared by many
//! engines (multi-symbol setups advance one clock for all books).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Abstract monotonic clock, nanosecond resolution.
pub trait TimeSource: Send + Sync {
    /// Current time in nanoseconds.
    fn now_ns(&self) -> u64;
}

/// Manually controlled clock for simulation and tests.
///
/// Interior atomic state lets a shared handle be advanced while engines
/// hold read-only clones of the `Arc`.
#[derive(Debug, Default)]
pub struct SimulatedTimeSource {
    current_ns: AtomicU64,
}

impl SimulatedTimeSource {
    pub fn new(initial_ns: u64) -> Self {
        Self {
            current_ns: AtomicU64::new(initial_ns),
        }
    }

    /// Advance the clock by `delta_ns`.
    pub fn advance(&self, delta_ns: u64) {
        self.current_ns.fetch_add(delta_ns, Ordering::Relaxed);
    }

    /// Set the clock to an absolute value.
    pub fn set(&self, ns: u64) {
        self.current_ns.store(ns, Ordering::Relaxed);
    }
}

impl TimeSource for SimulatedTimeSource {
    #[inline]
    fn now_ns(&self) -> u64 {
        self.current_ns.load(Ordering::Relaxed)
    }
}

/// Wall-clock source: nanoseconds elapsed since construction.
#[derive(Debug)]
pub struct RealTimeSource {
    start: Instant,
}

impl RealTimeSource {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for RealTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for RealTimeSource {
    #[inline]
    fn now_ns(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }
}
