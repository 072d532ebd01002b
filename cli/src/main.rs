use clap::{Args, Parser, Subcommand, ValueEnum};
use modsweep_core::{
    benchmark_worker_counts, run_trial, secure_seed, validate_results, verify_reproducibility, ModulationType,
    MonteCarloConfig, MonteCarloEngine, PerformanceResult, SeedScheme, SignalParams, SimRng, SimulationError,
    SweepReport, TrialMeasurement,
};
use rand::SeedableRng;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "modsweep")]
#[command(about = "Monte Carlo noise-performance sweeps for AM and FM")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep input SNR for both modulations and report output SNR statistics
    Sweep {
        #[command(flatten)]
        signal: SignalArgs,

        /// Base seed (drawn from the OS when omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Trials per modulation per SNR point
        #[arg(short, long, default_value = "1000")]
        trials: usize,

        /// Worker threads (default: available cores, at most 8)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Comma-separated input SNR points in dB
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        snr: Option<Vec<f64>>,

        /// Run on the calling thread only
        #[arg(long)]
        sequential: bool,

        /// Log progress while running
        #[arg(long)]
        progress: bool,

        /// per-point or per-worker
        #[arg(long, default_value = "per-point")]
        seed_scheme: SeedScheme,

        /// Write the result table as CSV
        #[arg(long, value_name = "PATH")]
        csv: Option<PathBuf>,

        /// Write results and run statistics as JSON
        #[arg(long, value_name = "PATH")]
        json: Option<PathBuf>,

        /// Write every raw trial as CSV
        #[arg(long, value_name = "PATH")]
        trials_csv: Option<PathBuf>,
    },

    /// Run a single trial and print its output SNR
    Trial {
        #[command(flatten)]
        signal: SignalArgs,

        #[arg(short, long, value_enum)]
        modulation: ModulationArg,

        /// Input SNR in dB
        #[arg(long, allow_hyphen_values = true)]
        snr: f64,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Check that two seeded runs give identical results
    Verify {
        #[command(flatten)]
        signal: SignalArgs,

        #[arg(long, default_value = "12345")]
        seed: u64,

        #[arg(short, long, default_value = "50")]
        trials: usize,
    },

    /// Time the same sweep at several worker counts
    Benchmark {
        #[command(flatten)]
        signal: SignalArgs,

        #[arg(short, long, default_value = "100")]
        trials: usize,

        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_value = "0,10,20")]
        snr: Vec<f64>,

        /// Comma-separated worker counts
        #[arg(long, value_delimiter = ',', default_value = "1,2,4,8")]
        workers: Vec<usize>,
    },
}

#[derive(Args, Clone, Copy)]
struct SignalArgs {
    /// Sampling rate in Hz
    #[arg(long, default_value = "10000")]
    sampling_rate: f64,

    /// Signal duration in seconds
    #[arg(long, default_value = "0.1")]
    duration: f64,

    /// Message frequency in Hz
    #[arg(long, default_value = "50")]
    message_freq: f64,

    /// Carrier frequency in Hz
    #[arg(long, default_value = "1000")]
    carrier_freq: f64,

    /// AM modulation depth
    #[arg(long, default_value = "0.5")]
    am_index: f64,

    /// FM deviation constant (must be non-zero)
    #[arg(long, default_value = "150")]
    fm_index: f64,
}

impl SignalArgs {
    fn params(&self, modulation_index: f64) -> SignalParams {
        SignalParams {
            sampling_rate: self.sampling_rate,
            duration: self.duration,
            message_freq: self.message_freq,
            carrier_freq: self.carrier_freq,
            message_amp: 1.0,
            carrier_amp: 1.0,
            modulation_index,
        }
    }

    fn am(&self) -> SignalParams {
        self.params(self.am_index)
    }

    fn fm(&self) -> SignalParams {
        self.params(self.fm_index)
    }

    fn warn_if_aliased(&self) {
        if !self.am().is_alias_free() {
            tracing::warn!(
                "Sampling rate {} Hz is below 2.5x the {} Hz carrier; demodulation will alias",
                self.sampling_rate,
                self.carrier_freq
            );
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModulationArg {
    Am,
    Fm,
}

impl From<ModulationArg> for ModulationType {
    fn from(arg: ModulationArg) -> Self {
        match arg {
            ModulationArg::Am => ModulationType::Am,
            ModulationArg::Fm => ModulationType::Fm,
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Sweep {
            signal,
            seed,
            trials,
            workers,
            snr,
            sequential,
            progress,
            seed_scheme,
            csv,
            json,
            trials_csv,
        } => {
            let mut config = MonteCarloConfig::new()
                .with_num_trials(trials)
                .with_parallel(!sequential)
                .with_progress(progress)
                .with_seed_scheme(seed_scheme)
                .with_record_trials(trials_csv.is_some());
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }
            if let Some(workers) = workers {
                config = config.with_num_workers(workers);
            }
            if let Some(snr) = snr {
                config = config.with_snr_range(snr);
            }
            let outputs = SweepOutputs { csv, json, trials_csv };
            sweep_command(&signal, config, &outputs)?
        }
        Commands::Trial {
            signal,
            modulation,
            snr,
            seed,
        } => trial_command(&signal, modulation.into(), snr, seed)?,
        Commands::Verify { signal, seed, trials } => verify_command(&signal, seed, trials)?,
        Commands::Benchmark {
            signal,
            trials,
            snr,
            workers,
        } => benchmark_command(&signal, trials, &snr, &workers)?,
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

struct SweepOutputs {
    csv: Option<PathBuf>,
    json: Option<PathBuf>,
    trials_csv: Option<PathBuf>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    am_params: SignalParams,
    fm_params: SignalParams,
    config: &'a MonteCarloConfig,
    #[serde(flatten)]
    report: &'a SweepReport,
}

fn sweep_command(signal: &SignalArgs, config: MonteCarloConfig, outputs: &SweepOutputs) -> Result<(), CliError> {
    signal.warn_if_aliased();
    let am_params = signal.am();
    let fm_params = signal.fm();

    let engine = MonteCarloEngine::new(config);
    let report = engine.run(&am_params, &fm_params)?;

    print_results(&report);

    for (label, results) in [("AM", &report.am_results), ("FM", &report.fm_results)] {
        match validate_results(results) {
            Ok(()) => println!("✓ {} results validated ({} points)", label, results.len()),
            Err(e) => tracing::warn!("{} validation failed: {}", label, e),
        }
    }

    if let Some(path) = &outputs.csv {
        write_results_csv(path, &report.am_results, &report.fm_results)?;
        println!("Wrote results to {}", path.display());
    }
    if let Some(path) = &outputs.trials_csv {
        write_trials_csv(path, &report.trials)?;
        println!("Wrote {} trials to {}", report.trials.len(), path.display());
    }
    if let Some(path) = &outputs.json {
        let doc = JsonReport {
            am_params,
            fm_params,
            config: engine.config(),
            report: &report,
        };
        let file = File::create(path).map_err(|source| io_error(path, source))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &doc)?;
        writer.flush().map_err(|source| io_error(path, source))?;
        println!("Wrote JSON report to {}", path.display());
    }

    Ok(())
}

fn print_results(report: &SweepReport) {
    let stats = &report.stats;
    println!();
    println!("{:>10} | {:>14} | {:>8} | {:>14} | {:>8}", "SNR in", "AM out (dB)", "AM std", "FM out (dB)", "FM std");
    println!("{}", "-".repeat(66));
    for (am, fm) in report.am_results.iter().zip(&report.fm_results) {
        println!(
            "{:>10.1} | {:>14.3} | {:>8.3} | {:>14.3} | {:>8.3}",
            am.input_snr_db, am.output_snr_db, am.std_dev, fm.output_snr_db, fm.std_dev
        );
    }
    println!();
    println!(
        "{} trials in {:.2}s ({:.0} trials/s) on {} worker(s), seed {}, memory delta {:.1} MB",
        stats.total_trials,
        stats.duration.as_secs_f64(),
        stats.trials_per_second,
        stats.workers_used,
        stats.seed,
        stats.memory_delta_mb()
    );
}

fn io_error(path: &Path, source: std::io::Error) -> CliError {
    CliError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn write_lines<F>(path: &Path, write: F) -> Result<(), CliError>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let file = File::create(path).map_err(|source| io_error(path, source))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)
        .and_then(|_| writer.flush())
        .map_err(|source| io_error(path, source))
}

fn write_results_csv(path: &Path, am: &[PerformanceResult], fm: &[PerformanceResult]) -> Result<(), CliError> {
    write_lines(path, |w| {
        writeln!(w, "SNR_in_dB,SNR_out_dB,StdDev_dB,modulation_type,num_trials")?;
        for r in am.iter().chain(fm) {
            writeln!(
                w,
                "{:.2},{:.4},{:.4},{},{}",
                r.input_snr_db, r.output_snr_db, r.std_dev, r.modulation, r.num_trials
            )?;
        }
        Ok(())
    })
}

fn write_trials_csv(path: &Path, trials: &[TrialMeasurement]) -> Result<(), CliError> {
    write_lines(path, |w| {
        writeln!(w, "SNR_in_dB,SNR_out_dB,modulation_type,trial_number")?;
        for t in trials {
            writeln!(
                w,
                "{:.2},{:.4},{},{}",
                t.input_snr_db, t.output_snr_db, t.modulation, t.trial_number
            )?;
        }
        Ok(())
    })
}

fn trial_command(signal: &SignalArgs, modulation: ModulationType, snr: f64, seed: Option<u64>) -> Result<(), CliError> {
    signal.warn_if_aliased();
    let params = match modulation {
        ModulationType::Am => signal.am(),
        ModulationType::Fm => signal.fm(),
    };
    let seed = match seed {
        Some(seed) => seed,
        None => secure_seed()?,
    };

    let mut rng = SimRng::seed_from_u64(seed);
    let output_snr = run_trial(modulation, &params, snr, &mut rng);

    println!("{} trial (seed {}): input {:.1} dB -> output {:.3} dB", modulation, seed, snr, output_snr);
    Ok(())
}

fn verify_command(signal: &SignalArgs, seed: u64, trials: usize) -> Result<(), CliError> {
    signal.warn_if_aliased();
    verify_reproducibility(&signal.am(), &signal.fm(), seed, trials)?;
    println!("✓ Reproducibility verified: seed {} gives identical results", seed);
    Ok(())
}

fn benchmark_command(signal: &SignalArgs, trials: usize, snr: &[f64], workers: &[usize]) -> Result<(), CliError> {
    signal.warn_if_aliased();
    let entries = benchmark_worker_counts(&signal.am(), &signal.fm(), trials, snr, workers)?;

    println!("{:>7} | {:>10} | {:>12} | {:>11} | {:>7}", "Workers", "Duration", "Trials/sec", "Memory (MB)", "Speedup");
    println!("{}", "-".repeat(60));
    for entry in &entries {
        println!(
            "{:>7} | {:>9.3}s | {:>12.0} | {:>11.1} | {:>6.2}x",
            entry.workers,
            entry.stats.duration.as_secs_f64(),
            entry.stats.trials_per_second,
            entry.stats.memory_delta_mb(),
            entry.speedup
        );
    }
    Ok(())
}
