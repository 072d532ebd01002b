//! Per-SNR-point aggregation and sanity checks on the results

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::metrics::{mean, std_dev};
use crate::signal::{ModulationType, SignalParams};
use crate::trial::TrialSetup;
use crate::VALIDATION_SNR_BOUND_DB;

/// Mean and spread of output SNR at one input SNR
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceResult {
    pub input_snr_db: f64,
    /// Mean output SNR over all trials
    pub output_snr_db: f64,
    /// Sample standard deviation of the output SNR
    pub std_dev: f64,
    pub modulation: ModulationType,
    pub num_trials: usize,
}

impl PerformanceResult {
    /// Summarize raw trial outputs
    ///
    /// Non-finite measurements are kept; they carry into the mean and are left
    /// for [`validate_results`] to report.
    pub fn from_measurements(modulation: ModulationType, input_snr_db: f64, measurements: &[f64]) -> Self {
        let output_snr_db = mean(measurements);
        Self {
            input_snr_db,
            output_snr_db,
            std_dev: std_dev(measurements, output_snr_db),
            modulation,
            num_trials: measurements.len(),
        }
    }
}

/// Run `num_trials` trials back to back on one generator stream
pub fn collect_trials<R: Rng + ?Sized>(
    modulation: ModulationType,
    params: &SignalParams,
    target_snr_db: f64,
    num_trials: usize,
    rng: &mut R,
) -> Vec<f64> {
    let setup = TrialSetup::new(modulation, params);
    (0..num_trials).map(|_| setup.run(target_snr_db, rng)).collect()
}

/// Trials plus summary for one modulation at one SNR point
pub fn run_snr_point<R: Rng + ?Sized>(
    modulation: ModulationType,
    params: &SignalParams,
    target_snr_db: f64,
    num_trials: usize,
    rng: &mut R,
) -> PerformanceResult {
    let measurements = collect_trials(modulation, params, target_snr_db, num_trials, rng);
    PerformanceResult::from_measurements(modulation, target_snr_db, &measurements)
}

/// Check a result series for non-finite means, negative spread and implausible levels
///
/// Returns the first problem found, in index order.
pub fn validate_results(results: &[PerformanceResult]) -> Result<()> {
    for (index, result) in results.iter().enumerate() {
        let snr = result.output_snr_db;
        if !snr.is_finite() {
            return Err(SimulationError::NonFiniteSnr { index, value: snr });
        }
        if result.std_dev < 0.0 {
            return Err(SimulationError::NegativeStdDev {
                index,
                value: result.std_dev,
            });
        }
        if snr.abs() > VALIDATION_SNR_BOUND_DB {
            return Err(SimulationError::SnrOutOfBounds { index, value: snr });
        }
    }

    log::debug!("Validation passed for {} results", results.len());
    Ok(())
}
