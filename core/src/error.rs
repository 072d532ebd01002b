use thiserror::Error;

use crate::signal::ModulationType;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Failed to obtain a secure random seed: {0}")]
    SeedGeneration(#[from] rand::Error),

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Invalid SNR at index {index}: {value}")]
    NonFiniteSnr { index: usize, value: f64 },

    #[error("Negative standard deviation at index {index}: {value}")]
    NegativeStdDev { index: usize, value: f64 },

    #[error("SNR out of reasonable bounds at index {index}: {value} dB")]
    SnrOutOfBounds { index: usize, value: f64 },

    #[error("{modulation} results differ at SNR {input_snr_db:.1} dB: {first:.6} vs {second:.6}")]
    ReproducibilityMismatch {
        modulation: ModulationType,
        input_snr_db: f64,
        first: f64,
        second: f64,
    },
}

pub type Result<T> = std::result::Result<T, SimulationError>;
