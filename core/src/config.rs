//! Monte Carlo run configuration and worker sizing

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{DEFAULT_NUM_TRIALS, DEFAULT_SNR_RANGE, MAX_DEFAULT_WORKERS};

/// How worker generators are seeded from the base seed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeedScheme {
    /// Reseed to `base + snr_index` at every SNR point.
    /// Results do not depend on worker count or scheduling.
    #[default]
    PerPoint,
    /// Seed once per worker as `base + worker_index`; the stream runs across
    /// every SNR point that worker pulls.
    PerWorker,
}

impl SeedScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeedScheme::PerPoint => "per-point",
            SeedScheme::PerWorker => "per-worker",
        }
    }
}

impl fmt::Display for SeedScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeedScheme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "per-point" => Ok(SeedScheme::PerPoint),
            "per-worker" => Ok(SeedScheme::PerWorker),
            other => Err(format!("unknown seed scheme '{}' (expected per-point or per-worker)", other)),
        }
    }
}

/// Monte Carlo run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    /// Base seed; `None` draws one from the OS secure source
    pub seed: Option<u64>,
    /// Trials per modulation per SNR point
    pub num_trials: usize,
    pub num_workers: usize,
    /// Input SNR points in dB, in output order
    pub snr_range: Vec<f64>,
    pub use_parallel: bool,
    pub print_progress: bool,
    pub seed_scheme: SeedScheme,
    /// Keep every raw trial output in the report
    pub record_trials: bool,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            seed: None,
            num_trials: DEFAULT_NUM_TRIALS,
            num_workers: adaptive_worker_count(),
            snr_range: DEFAULT_SNR_RANGE.to_vec(),
            use_parallel: true,
            print_progress: false,
            seed_scheme: SeedScheme::default(),
            record_trials: false,
        }
    }
}

impl MonteCarloConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_num_trials(mut self, num_trials: usize) -> Self {
        self.num_trials = num_trials;
        self
    }

    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn with_snr_range(mut self, snr_range: Vec<f64>) -> Self {
        self.snr_range = snr_range;
        self
    }

    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    pub fn with_progress(mut self, print_progress: bool) -> Self {
        self.print_progress = print_progress;
        self
    }

    pub fn with_seed_scheme(mut self, seed_scheme: SeedScheme) -> Self {
        self.seed_scheme = seed_scheme;
        self
    }

    pub fn with_record_trials(mut self, record_trials: bool) -> Self {
        self.record_trials = record_trials;
        self
    }

    /// Whether the run goes through the worker pool
    pub fn runs_parallel(&self) -> bool {
        self.use_parallel && self.num_workers > 1
    }

    /// Workers actually used: 1 when sequential
    pub fn effective_workers(&self) -> usize {
        if self.runs_parallel() {
            self.num_workers
        } else {
            1
        }
    }

    /// Trials executed by a full sweep (both modulations)
    pub fn total_trials(&self) -> usize {
        self.num_trials * self.snr_range.len() * 2
    }
}

/// Available hardware parallelism, capped at [`MAX_DEFAULT_WORKERS`], at least 1
pub fn adaptive_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, MAX_DEFAULT_WORKERS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MonteCarloConfig::default();
        assert_eq!(config.seed, None);
        assert_eq!(config.num_trials, 1000);
        assert_eq!(
            config.snr_range,
            vec![-10.0, -5.0, 0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0]
        );
        assert!(config.use_parallel);
        assert!(!config.print_progress);
        assert!(!config.record_trials);
        assert_eq!(config.seed_scheme, SeedScheme::PerPoint);
        assert!(config.num_workers >= 1 && config.num_workers <= MAX_DEFAULT_WORKERS);
    }

    #[test]
    fn test_builder_chain() {
        let config = MonteCarloConfig::new()
            .with_seed(0)
            .with_num_trials(25)
            .with_num_workers(3)
            .with_snr_range(vec![0.0, 10.0])
            .with_parallel(false)
            .with_progress(true)
            .with_seed_scheme(SeedScheme::PerWorker)
            .with_record_trials(true);

        assert_eq!(config.seed, Some(0));
        assert_eq!(config.num_trials, 25);
        assert_eq!(config.num_workers, 3);
        assert_eq!(config.snr_range, vec![0.0, 10.0]);
        assert!(!config.use_parallel);
        assert!(config.print_progress);
        assert_eq!(config.seed_scheme, SeedScheme::PerWorker);
        assert!(config.record_trials);
    }

    #[test]
    fn test_effective_workers() {
        let config = MonteCarloConfig::new().with_num_workers(4);
        assert!(config.runs_parallel());
        assert_eq!(config.effective_workers(), 4);

        assert_eq!(config.clone().with_parallel(false).effective_workers(), 1);
        assert_eq!(config.with_num_workers(1).effective_workers(), 1);
    }

    #[test]
    fn test_total_trials() {
        let config = MonteCarloConfig::new()
            .with_num_trials(10)
            .with_snr_range(vec![0.0, 5.0, 10.0]);
        assert_eq!(config.total_trials(), 60);
    }

    #[test]
    fn test_seed_scheme_parse_and_display() {
        assert_eq!("per-point".parse::<SeedScheme>(), Ok(SeedScheme::PerPoint));
        assert_eq!("per-worker".parse::<SeedScheme>(), Ok(SeedScheme::PerWorker));
        assert!("random".parse::<SeedScheme>().is_err());
        assert_eq!(SeedScheme::PerWorker.to_string(), "per-worker");
    }

    #[test]
    fn test_adaptive_worker_count_bounds() {
        let n = adaptive_worker_count();
        assert!((1..=MAX_DEFAULT_WORKERS).contains(&n));
    }
}
