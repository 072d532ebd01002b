//! Run statistics, progress reporting and resident memory sampling
//!
//! Everything here is observational: none of it feeds back into results.

use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Timing and resource figures for one sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationStats {
    pub duration: Duration,
    pub trials_per_second: f64,
    pub total_trials: usize,
    pub workers_used: usize,
    /// Change in resident set size over the run; 0 when unavailable
    pub memory_delta_bytes: i64,
    /// Base seed the run actually used
    pub seed: u64,
}

impl SimulationStats {
    pub fn new(duration: Duration, total_trials: usize, workers_used: usize, memory_delta_bytes: i64, seed: u64) -> Self {
        let secs = duration.as_secs_f64();
        let trials_per_second = if secs > 0.0 { total_trials as f64 / secs } else { 0.0 };
        Self {
            duration,
            trials_per_second,
            total_trials,
            workers_used,
            memory_delta_bytes,
            seed,
        }
    }

    pub fn memory_delta_mb(&self) -> f64 {
        self.memory_delta_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Source of the process's resident memory
pub trait MemoryProbe: Send + Sync {
    /// Resident set size in bytes, `None` if it cannot be read
    fn resident_bytes(&self) -> Option<u64>;
}

/// Reads `VmRSS` from `/proc/self/status` (Linux)
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcStatusProbe;

impl ProcStatusProbe {
    pub fn new() -> Self {
        Self
    }
}

impl MemoryProbe for ProcStatusProbe {
    fn resident_bytes(&self) -> Option<u64> {
        let status = fs::read_to_string("/proc/self/status").ok()?;
        parse_vm_rss(&status)
    }
}

/// Probe for platforms without a memory source; always `None`
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProbe;

impl MemoryProbe for NullProbe {
    fn resident_bytes(&self) -> Option<u64> {
        None
    }
}

/// `VmRSS:   12345 kB` -> bytes
fn parse_vm_rss(status: &str) -> Option<u64> {
    let line = status.lines().find(|l| l.starts_with("VmRSS:"))?;
    let kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb * 1024)
}

/// Signed difference between two probe readings, 0 if either is missing
pub fn memory_delta(before: Option<u64>, after: Option<u64>) -> i64 {
    match (before, after) {
        (Some(b), Some(a)) => a as i64 - b as i64,
        _ => 0,
    }
}

/// Shared trial counter that logs percentage, elapsed time and ETA
#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    current: AtomicUsize,
    start: Instant,
    enabled: bool,
}

impl ProgressTracker {
    pub fn new(total: usize, enabled: bool) -> Self {
        Self {
            total,
            current: AtomicUsize::new(0),
            start: Instant::now(),
            enabled,
        }
    }

    /// Record `increment` finished trials; returns the new count
    pub fn update(&self, increment: usize) -> usize {
        let current = self.current.fetch_add(increment, Ordering::Relaxed) + increment;

        if self.enabled && current > 0 && self.total > 0 {
            let elapsed = self.start.elapsed();
            let percentage = current as f64 / self.total as f64 * 100.0;
            let estimated = elapsed.mul_f64(self.total as f64 / current as f64);
            let remaining = estimated.saturating_sub(elapsed);

            log::info!(
                "Progress: {:6.1}% ({}/{}) | Elapsed: {:.1}s | ETA: {:.1}s",
                percentage,
                current,
                self.total,
                elapsed.as_secs_f64(),
                remaining.as_secs_f64()
            );
        }

        current
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total
    }
}
