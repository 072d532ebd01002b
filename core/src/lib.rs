//! Monte Carlo noise-performance engine for analog AM and FM
//!
//! Generates AM/FM waveforms, corrupts them with white Gaussian noise at a
//! target input SNR, demodulates, and measures output SNR against the original
//! message, repeated over many trials per SNR point on a worker pool.

pub mod error;
pub mod signal;
pub mod waveform;
pub mod noise;
pub mod demod;
pub mod metrics;
pub mod trial;
pub mod stats;
pub mod config;
pub mod telemetry;
pub mod montecarlo;

pub use config::{adaptive_worker_count, MonteCarloConfig, SeedScheme};
pub use error::{Result, SimulationError};
pub use montecarlo::{
    benchmark_worker_counts, run_sweep, secure_seed, verify_reproducibility, BenchmarkEntry, MonteCarloEngine,
    SweepReport,
};
pub use signal::{ModulationType, Signal, SignalParams};
pub use stats::{validate_results, PerformanceResult};
pub use telemetry::{MemoryProbe, NullProbe, ProcStatusProbe, SimulationStats};
pub use trial::{run_trial, TrialMeasurement};

/// Generator behind every seeded noise stream
pub type SimRng = rand_chacha::ChaCha8Rng;

// Demodulation
pub const SMOOTHING_WINDOW: usize = 20; // samples, centered moving average
pub const FM_DENOMINATOR_EPSILON: f64 = 1e-10;

// Lag alignment
pub const MAX_ALIGNMENT_LAG: usize = 100; // samples
pub const ALIGNMENT_WINDOW_DIVISOR: usize = 10; // search ±len/10

// Monte Carlo defaults
pub const MAX_DEFAULT_WORKERS: usize = 8;
pub const DEFAULT_NUM_TRIALS: usize = 1000;
pub const DEFAULT_SNR_RANGE: [f64; 10] = [-10.0, -5.0, 0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0];

// Validation
pub const VALIDATION_SNR_BOUND_DB: f64 = 100.0; // |mean output SNR| above this is implausible
