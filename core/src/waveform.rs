//! Waveform generators
//!
//! Every generator samples `floor(sampling_rate * duration)` points at
//! `t_i = i / sampling_rate` and returns a fresh [`Signal`]. A zero or negative
//! duration (or sampling rate) is not an error: the result is simply empty.

use std::f64::consts::PI;

use crate::signal::{ModulationType, Signal, SignalParams};

/// Sample timestamps for the given parameters
pub fn generate_time_vector(params: &SignalParams) -> Vec<f64> {
    let num_samples = params.sample_count();
    let dt = params.sample_period();
    (0..num_samples).map(|i| i as f64 * dt).collect()
}

/// Message tone: `m(t) = Am * sin(2π fm t)`
fn message_at(params: &SignalParams, t: f64) -> f64 {
    params.message_amp * (2.0 * PI * params.message_freq * t).sin()
}

/// Baseband message, the ground truth every demodulated signal is scored against
pub fn generate_baseband(params: &SignalParams) -> Signal {
    let time = generate_time_vector(params);
    let values = time.iter().map(|&t| message_at(params, t)).collect();
    Signal::new(time, values)
}

/// Unmodulated carrier: `c(t) = Ac * sin(2π fc t)`
pub fn generate_carrier(params: &SignalParams) -> Signal {
    let time = generate_time_vector(params);
    let values = time
        .iter()
        .map(|&t| params.carrier_amp * (2.0 * PI * params.carrier_freq * t).sin())
        .collect();
    Signal::new(time, values)
}

/// Double-sideband large-carrier AM: `Ac * (1 + k * m(t)) * sin(2π fc t)`
///
/// Indices above 1 over-modulate (the envelope crosses zero); that is allowed.
pub fn generate_am(params: &SignalParams) -> Signal {
    let time = generate_time_vector(params);
    let values = time
        .iter()
        .map(|&t| {
            let message = message_at(params, t);
            params.carrier_amp
                * (1.0 + params.modulation_index * message)
                * (2.0 * PI * params.carrier_freq * t).sin()
        })
        .collect();
    Signal::new(time, values)
}

/// FM: `Ac * sin(2π fc t + k * ∫m(t)dt)`
///
/// The integral is a running trapezoidal sum over the sampled message rather
/// than the closed form, so any message shape integrates the same way.
pub fn generate_fm(params: &SignalParams) -> Signal {
    let time = generate_time_vector(params);
    let dt = params.sample_period();
    let mut values = Vec::with_capacity(time.len());

    let mut integral = 0.0;
    let mut prev_message = 0.0;

    for (i, &t) in time.iter().enumerate() {
        let message = message_at(params, t);
        if i > 0 {
            integral += (message + prev_message) * dt / 2.0;
        }
        prev_message = message;

        let phase = 2.0 * PI * params.carrier_freq * t + params.modulation_index * integral;
        values.push(params.carrier_amp * phase.sin());
    }

    Signal::new(time, values)
}

/// Modulated carrier for the given scheme
pub fn generate_modulated(modulation: ModulationType, params: &SignalParams) -> Signal {
    match modulation {
        ModulationType::Am => generate_am(params),
        ModulationType::Fm => generate_fm(params),
    }
}
