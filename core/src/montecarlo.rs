//! Parallel Monte Carlo sweep over input SNR points
//!
//! Each SNR point is one job. Workers pull jobs from a shared FIFO queue and
//! run every AM trial and then every FM trial for that point on a private
//! generator. Outcomes are merged by job index, so the output order never
//! depends on which worker finished first.

use rand::rngs::OsRng;
use rand::{RngCore, SeedableRng};
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crate::config::{MonteCarloConfig, SeedScheme};
use crate::error::{Result, SimulationError};
use crate::signal::{ModulationType, SignalParams};
use crate::stats::{collect_trials, PerformanceResult};
use crate::telemetry::{memory_delta, MemoryProbe, ProcStatusProbe, ProgressTracker, SimulationStats};
use crate::trial::TrialMeasurement;
use crate::SimRng;

/// Seed used by the reproducibility and benchmark helpers
pub const BENCHMARK_SEED: u64 = 12345;

/// Absolute tolerance between two runs that must be identical
const REPRODUCIBILITY_TOLERANCE: f64 = 1e-10;

/// Draw a 64-bit seed from the operating system's secure random source
pub fn secure_seed() -> Result<u64> {
    let mut bytes = [0u8; 8];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(u64::from_le_bytes(bytes))
}

/// FIFO queue of job indices `0..len` shared by all workers
#[derive(Debug)]
pub struct JobQueue {
    len: usize,
    cursor: AtomicUsize,
}

impl JobQueue {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Claim the next job, `None` once the queue is drained
    pub fn next_job(&self) -> Option<usize> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        (index < self.len).then_some(index)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Everything a sweep produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    /// One entry per SNR point, in configured order
    pub am_results: Vec<PerformanceResult>,
    pub fm_results: Vec<PerformanceResult>,
    pub stats: SimulationStats,
    /// Raw trial outputs; empty unless trial recording is enabled
    pub trials: Vec<TrialMeasurement>,
}

/// Result of one job: both modulations at one SNR point
struct PointOutcome {
    index: usize,
    am: PerformanceResult,
    fm: PerformanceResult,
    am_trials: Vec<f64>,
    fm_trials: Vec<f64>,
}

/// Read-only state shared by every worker of one sweep
struct Sweep<'a> {
    am_params: &'a SignalParams,
    fm_params: &'a SignalParams,
    config: &'a MonteCarloConfig,
    base_seed: u64,
    queue: JobQueue,
    progress: ProgressTracker,
}

impl Sweep<'_> {
    /// Pull jobs until the queue is empty
    fn worker_loop(&self, worker_index: usize) -> Vec<PointOutcome> {
        let mut rng = SimRng::seed_from_u64(self.base_seed.wrapping_add(worker_index as u64));
        let mut outcomes = Vec::new();

        while let Some(index) = self.queue.next_job() {
            if self.config.seed_scheme == SeedScheme::PerPoint {
                rng = SimRng::seed_from_u64(self.base_seed.wrapping_add(index as u64));
            }
            outcomes.push(self.run_point(index, &mut rng));
        }

        outcomes
    }

    fn run_point(&self, index: usize, rng: &mut SimRng) -> PointOutcome {
        let snr = self.config.snr_range[index];
        let n = self.config.num_trials;

        let am_trials = collect_trials(ModulationType::Am, self.am_params, snr, n, rng);
        self.progress.update(n);
        let fm_trials = collect_trials(ModulationType::Fm, self.fm_params, snr, n, rng);
        self.progress.update(n);

        let am = PerformanceResult::from_measurements(ModulationType::Am, snr, &am_trials);
        let fm = PerformanceResult::from_measurements(ModulationType::Fm, snr, &fm_trials);
        log::debug!(
            "SNR {:.1} dB: AM {:.2} ± {:.2} dB, FM {:.2} ± {:.2} dB",
            snr,
            am.output_snr_db,
            am.std_dev,
            fm.output_snr_db,
            fm.std_dev
        );

        let keep = self.config.record_trials;
        PointOutcome {
            index,
            am,
            fm,
            am_trials: if keep { am_trials } else { Vec::new() },
            fm_trials: if keep { fm_trials } else { Vec::new() },
        }
    }
}

/// Configured Monte Carlo runner
pub struct MonteCarloEngine {
    config: MonteCarloConfig,
    probe: Box<dyn MemoryProbe>,
}

impl MonteCarloEngine {
    pub fn new(config: MonteCarloConfig) -> Self {
        Self {
            config,
            probe: Box::new(ProcStatusProbe::new()),
        }
    }

    /// Replace the resident memory source (defaults to `/proc/self/status`)
    pub fn with_memory_probe<P: MemoryProbe + 'static>(mut self, probe: P) -> Self {
        self.probe = Box::new(probe);
        self
    }

    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    /// Sweep every configured SNR point for both modulations
    ///
    /// Fails only if no secure seed can be drawn (when none is configured) or
    /// the worker pool cannot be started; both happen before any trial runs.
    pub fn run(&self, am_params: &SignalParams, fm_params: &SignalParams) -> Result<SweepReport> {
        let config = &self.config;
        let base_seed = match config.seed {
            Some(seed) => seed,
            None => secure_seed()?,
        };
        let workers = config.effective_workers();

        log::info!(
            "Monte Carlo sweep: {} trials x {} SNR points, {} worker(s), seed {} ({})",
            config.num_trials,
            config.snr_range.len(),
            workers,
            base_seed,
            config.seed_scheme
        );

        let memory_before = self.probe.resident_bytes();
        let start = Instant::now();

        let sweep = Sweep {
            am_params,
            fm_params,
            config,
            base_seed,
            queue: JobQueue::new(config.snr_range.len()),
            progress: ProgressTracker::new(config.total_trials(), config.print_progress),
        };

        let mut outcomes: Vec<PointOutcome> = if config.runs_parallel() {
            let pool = ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("modsweep-worker-{}", i))
                .build()?;
            pool.broadcast(|ctx| sweep.worker_loop(ctx.index()))
                .into_iter()
                .flatten()
                .collect()
        } else {
            sweep.worker_loop(0)
        };

        outcomes.sort_by_key(|o| o.index);

        let duration = start.elapsed();
        let memory_after = self.probe.resident_bytes();

        let mut am_results = Vec::with_capacity(outcomes.len());
        let mut fm_results = Vec::with_capacity(outcomes.len());
        let mut trials = Vec::new();
        for outcome in outcomes {
            let snr = config.snr_range[outcome.index];
            trials.extend(measurements(ModulationType::Am, snr, &outcome.am_trials));
            trials.extend(measurements(ModulationType::Fm, snr, &outcome.fm_trials));
            am_results.push(outcome.am);
            fm_results.push(outcome.fm);
        }

        let stats = SimulationStats::new(
            duration,
            config.total_trials(),
            workers,
            memory_delta(memory_before, memory_after),
            base_seed,
        );

        log::info!(
            "Sweep finished in {:.2}s: {:.0} trials/s, memory delta {:.1} MB",
            stats.duration.as_secs_f64(),
            stats.trials_per_second,
            stats.memory_delta_mb()
        );

        Ok(SweepReport {
            am_results,
            fm_results,
            stats,
            trials,
        })
    }
}

fn measurements(modulation: ModulationType, input_snr_db: f64, values: &[f64]) -> impl Iterator<Item = TrialMeasurement> + '_ {
    values
        .iter()
        .enumerate()
        .map(move |(trial_number, &output_snr_db)| TrialMeasurement {
            trial_number,
            input_snr_db,
            output_snr_db,
            modulation,
        })
}

/// Run a sweep with the default memory probe
pub fn run_sweep(am_params: &SignalParams, fm_params: &SignalParams, config: &MonteCarloConfig) -> Result<SweepReport> {
    MonteCarloEngine::new(config.clone()).run(am_params, fm_params)
}

fn compare_runs(first: &[PerformanceResult], second: &[PerformanceResult]) -> Result<()> {
    for (a, b) in first.iter().zip(second.iter()) {
        if (a.output_snr_db - b.output_snr_db).abs() > REPRODUCIBILITY_TOLERANCE {
            return Err(SimulationError::ReproducibilityMismatch {
                modulation: a.modulation,
                input_snr_db: a.input_snr_db,
                first: a.output_snr_db,
                second: b.output_snr_db,
            });
        }
    }
    Ok(())
}

/// Run the same seeded sequential sweep twice over 0, 10 and 20 dB and
/// require identical means
pub fn verify_reproducibility(
    am_params: &SignalParams,
    fm_params: &SignalParams,
    seed: u64,
    num_trials: usize,
) -> Result<()> {
    let config = MonteCarloConfig::new()
        .with_seed(seed)
        .with_num_trials(num_trials)
        .with_snr_range(vec![0.0, 10.0, 20.0])
        .with_parallel(false)
        .with_num_workers(1);

    let first = run_sweep(am_params, fm_params, &config)?;
    let second = run_sweep(am_params, fm_params, &config)?;

    compare_runs(&first.am_results, &second.am_results)?;
    compare_runs(&first.fm_results, &second.fm_results)?;

    log::info!("Reproducibility verified: seed {} gives identical results", seed);
    Ok(())
}

/// Timing of one sweep at a given worker count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkEntry {
    pub workers: usize,
    pub stats: SimulationStats,
    /// Wall-clock speedup relative to the first entry
    pub speedup: f64,
}

/// Time the same seeded sweep at each worker count in `worker_counts`
pub fn benchmark_worker_counts(
    am_params: &SignalParams,
    fm_params: &SignalParams,
    num_trials: usize,
    snr_range: &[f64],
    worker_counts: &[usize],
) -> Result<Vec<BenchmarkEntry>> {
    let mut entries: Vec<BenchmarkEntry> = Vec::with_capacity(worker_counts.len());

    for &workers in worker_counts {
        let config = MonteCarloConfig::new()
            .with_seed(BENCHMARK_SEED)
            .with_num_trials(num_trials)
            .with_snr_range(snr_range.to_vec())
            .with_num_workers(workers)
            .with_parallel(workers > 1);

        let stats = run_sweep(am_params, fm_params, &config)?.stats;

        let secs = stats.duration.as_secs_f64();
        let speedup = match entries.first() {
            Some(baseline) if secs > 0.0 => baseline.stats.duration.as_secs_f64() / secs,
            Some(_) => 0.0,
            None => 1.0,
        };

        log::info!(
            "Workers: {:2} | Duration: {:.3}s | Trials/sec: {:.0} | Speedup: {:.2}x",
            workers,
            secs,
            stats.trials_per_second,
            speedup
        );

        entries.push(BenchmarkEntry { workers, stats, speedup });
    }

    Ok(entries)
}
