// Seeding and scheduling tests for the Monte Carlo sweep.
// Results must depend only on the seed and seed scheme, never on how the
// SNR points were spread over workers.

use modsweep_core::{
    benchmark_worker_counts, run_sweep, verify_reproducibility, MonteCarloConfig, MonteCarloEngine,
    NullProbe, SeedScheme, SignalParams,
};

fn am() -> SignalParams {
    SignalParams {
        duration: 0.05,
        ..SignalParams::am_reference()
    }
}

fn fm() -> SignalParams {
    SignalParams {
        duration: 0.05,
        ..SignalParams::fm_reference()
    }
}

fn config(seed: u64) -> MonteCarloConfig {
    MonteCarloConfig::new()
        .with_seed(seed)
        .with_num_trials(3)
        .with_snr_range(vec![-10.0, 0.0, 10.0, 20.0, 30.0])
}

#[test]
fn test_same_seed_same_arrays() {
    let first = run_sweep(&am(), &fm(), &config(42)).expect("first run");
    let second = run_sweep(&am(), &fm(), &config(42)).expect("second run");
    assert_eq!(first.am_results, second.am_results);
    assert_eq!(first.fm_results, second.fm_results);
}

#[test]
fn test_different_seed_different_arrays() {
    let first = run_sweep(&am(), &fm(), &config(42)).expect("first run");
    let second = run_sweep(&am(), &fm(), &config(43)).expect("second run");
    assert_ne!(first.am_results, second.am_results);
}

#[test]
fn test_worker_count_does_not_change_results() {
    let sequential = run_sweep(&am(), &fm(), &config(7).with_parallel(false)).expect("sequential run");

    for workers in [1, 2, 4, 5] {
        let run = run_sweep(&am(), &fm(), &config(7).with_num_workers(workers)).expect("parallel run");
        assert_eq!(
            run.am_results, sequential.am_results,
            "AM results changed with {} workers",
            workers
        );
        assert_eq!(
            run.fm_results, sequential.fm_results,
            "FM results changed with {} workers",
            workers
        );
    }
}

#[test]
fn test_per_worker_scheme_reproducible_at_fixed_worker_count() {
    let cfg = config(99).with_seed_scheme(SeedScheme::PerWorker).with_num_workers(1);
    let first = run_sweep(&am(), &fm(), &cfg).expect("first run");
    let second = run_sweep(&am(), &fm(), &cfg).expect("second run");
    assert_eq!(first.am_results, second.am_results);
    assert_eq!(first.fm_results, second.fm_results);
}

#[test]
fn test_recorded_trials_independent_of_scheduling() {
    let engine = |workers: usize| {
        MonteCarloEngine::new(config(11).with_num_workers(workers).with_record_trials(true))
            .with_memory_probe(NullProbe)
    };
    let one = engine(1).run(&am(), &fm()).expect("one worker");
    let four = engine(4).run(&am(), &fm()).expect("four workers");

    assert_eq!(one.trials.len(), 3 * 5 * 2);
    assert_eq!(one.trials, four.trials);
}

#[test]
fn test_verify_reproducibility_helper() {
    verify_reproducibility(&am(), &fm(), 12345, 4).expect("identical runs");
}

#[test]
fn test_benchmark_reports_each_worker_count() {
    let entries = benchmark_worker_counts(&am(), &fm(), 2, &[0.0, 10.0, 20.0], &[1, 2, 4]).expect("benchmark");
    let workers: Vec<usize> = entries.iter().map(|e| e.workers).collect();
    assert_eq!(workers, vec![1, 2, 4]);
    for entry in &entries {
        assert_eq!(entry.stats.total_trials, 12);
        assert!(entry.stats.trials_per_second >= 0.0);
    }
}
