//! Additive white Gaussian noise at a target SNR
//!
//! [`add_awgn_with_rng`] is the entry point the engine uses: the caller owns
//! the generator, so concurrent callers with private generators never contend
//! and every stream is reproducible from its seed.
//!
//! [`add_awgn`] is a convenience wrapper over a thread-local default generator
//! for quick experiments and tests. It is never shared between threads and the
//! Monte Carlo engine does not use it.

use std::cell::RefCell;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::metrics::signal_power;
use crate::signal::Signal;

thread_local! {
    static DEFAULT_RNG: RefCell<ChaCha8Rng> = RefCell::new(ChaCha8Rng::from_entropy());
}

/// Reseed this thread's default generator used by [`add_awgn`]
pub fn seed_default_generator(seed: u64) {
    DEFAULT_RNG.with(|rng| *rng.borrow_mut() = ChaCha8Rng::seed_from_u64(seed));
}

/// Noise standard deviation that puts `signal_power / noise_power` at `snr_db`
pub fn noise_std_dev(signal_power: f64, snr_db: f64) -> f64 {
    let snr_linear = 10f64.powf(snr_db / 10.0);
    let noise_variance = signal_power / snr_linear;
    noise_variance.sqrt()
}

/// Add AWGN drawn from `rng` so the result sits at `snr_db` relative to `signal`
///
/// A silent (zero-power) input gets zero-variance noise and stays finite.
pub fn add_awgn_with_rng<R: Rng + ?Sized>(signal: &Signal, snr_db: f64, rng: &mut R) -> Signal {
    if signal.is_empty() {
        return signal.clone();
    }

    let std_dev = noise_std_dev(signal_power(&signal.values), snr_db);

    let values = signal
        .values
        .iter()
        .map(|&v| {
            let z: f64 = StandardNormal.sample(&mut *rng);
            v + z * std_dev
        })
        .collect();

    signal.with_values(values)
}

/// Add AWGN using this thread's default generator
pub fn add_awgn(signal: &Signal, snr_db: f64) -> Signal {
    DEFAULT_RNG.with(|rng| add_awgn_with_rng(signal, snr_db, &mut *rng.borrow_mut()))
}
