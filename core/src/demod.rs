//! AM envelope detection and simplified quadrature FM detection
//!
//! Both detectors finish with the same centered moving average, which stands
//! in for a low-pass filter.

use std::f64::consts::PI;

use crate::signal::{ModulationType, Signal, SignalParams};
use crate::{FM_DENOMINATOR_EPSILON, SMOOTHING_WINDOW};

/// Centered moving average
///
/// Sample `i` averages `values[i - window/2 ..= i + window/2]`, clamped to the
/// slice bounds, so edge samples average over fewer points.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let half = window / 2;

    (0..n)
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half).min(n - 1);
            let span = &values[start..=end];
            span.iter().sum::<f64>() / span.len() as f64
        })
        .collect()
}

/// Envelope detector: full-wave rectify, then smooth
pub fn demodulate_am(signal: &Signal) -> Signal {
    let rectified: Vec<f64> = signal.values.iter().map(|v| v.abs()).collect();
    signal.with_values(moving_average(&rectified, SMOOTHING_WINDOW))
}

/// Quadrature FM detector
///
/// The quadrature channel is the input delayed by one sample rather than a
/// true 90° shift. Instantaneous frequency is
/// `(I·dQ - Q·dI) / (2π·dt·(I² + Q²))`, zero where the denominator is within
/// [`FM_DENOMINATOR_EPSILON`], then divided by the modulation index and
/// smoothed. The first sample is always 0.
///
/// `params.modulation_index` must be non-zero; a zero index produces
/// non-finite samples.
pub fn demodulate_fm(signal: &Signal, params: &SignalParams) -> Signal {
    let x = &signal.values;
    if x.is_empty() {
        return signal.clone();
    }

    let dt = params.sample_period();

    let mut quad = Vec::with_capacity(x.len());
    quad.push(x[0]);
    quad.extend_from_slice(&x[..x.len() - 1]);

    let mut freq = vec![0.0; x.len()];
    for i in 1..x.len() {
        let (i_curr, q_curr) = (x[i], quad[i]);
        let d_i = i_curr - x[i - 1];
        let d_q = q_curr - quad[i - 1];

        let numerator = i_curr * d_q - q_curr * d_i;
        let denominator = i_curr * i_curr + q_curr * q_curr;

        if denominator > FM_DENOMINATOR_EPSILON {
            let instant_freq = numerator / (2.0 * PI * dt * denominator);
            freq[i] = instant_freq / params.modulation_index;
        }
    }

    signal.with_values(moving_average(&freq, SMOOTHING_WINDOW))
}

/// Demodulator for the given scheme
pub fn demodulate(modulation: ModulationType, signal: &Signal, params: &SignalParams) -> Signal {
    match modulation {
        ModulationType::Am => demodulate_am(signal),
        ModulationType::Fm => demodulate_fm(signal, params),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{correlation, mean, std_dev};
    use crate::waveform::{generate_am, generate_baseband, generate_fm};

    fn am_params() -> SignalParams {
        SignalParams {
            sampling_rate: 10_000.0,
            duration: 0.1,
            message_freq: 50.0,
            carrier_freq: 1000.0,
            message_amp: 1.0,
            carrier_amp: 1.0,
            modulation_index: 0.5,
        }
    }

    #[test]
    fn test_moving_average_clamps_at_edges() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let smoothed = moving_average(&values, 2);
        // window/2 = 1: [1,2], [1,2,3], [2,3,4], [3,4,5], [4,5]
        assert_eq!(smoothed, vec![1.5, 2.0, 3.0, 4.0, 4.5]);
    }

    #[test]
    fn test_moving_average_constant_and_empty() {
        let smoothed = moving_average(&[2.0; 50], SMOOTHING_WINDOW);
        assert!(smoothed.iter().all(|&v| (v - 2.0).abs() < 1e-12));
        assert!(moving_average(&[], SMOOTHING_WINDOW).is_empty());
        assert_eq!(moving_average(&[7.0], SMOOTHING_WINDOW), vec![7.0]);
    }

    #[test]
    fn test_am_recovers_message_shape() {
        for (fs, fm) in [(10_000.0, 50.0), (8000.0, 100.0)] {
            let params = SignalParams {
                sampling_rate: fs,
                message_freq: fm,
                ..am_params()
            };
            let baseband = generate_baseband(&params);
            let demod = demodulate_am(&generate_am(&params));

            assert_eq!(demod.len(), baseband.len());
            let corr = correlation(&baseband.values, &demod.values);
            assert!(
                corr >= 0.8,
                "AM correlation {:.3} too low at fs={} fm={}",
                corr,
                fs,
                fm
            );
        }
    }

    #[test]
    fn test_fm_envelope_is_constant() {
        let params = SignalParams {
            sampling_rate: 8000.0,
            duration: 0.05,
            modulation_index: 100.0,
            ..am_params()
        };
        let fm = generate_fm(&params);
        let envelope = moving_average(
            &fm.values.iter().map(|v| v.abs()).collect::<Vec<_>>(),
            SMOOTHING_WINDOW,
        );
        let m = mean(&envelope);
        let cv = std_dev(&envelope, m) / m;
        assert!(cv < 0.1, "FM envelope CV {:.4} should be < 0.1", cv);
    }

    #[test]
    fn test_fm_first_sample_and_length() {
        let params = SignalParams {
            modulation_index: 150.0,
            ..am_params()
        };
        let demod = demodulate_fm(&generate_fm(&params), &params);
        assert_eq!(demod.len(), params.sample_count());
        assert!(demod.values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_fm_large_index_stays_finite() {
        let params = SignalParams {
            sampling_rate: 8000.0,
            modulation_index: 500.0,
            ..am_params()
        };
        let demod = demodulate_fm(&generate_fm(&params), &params);
        assert!(demod.values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_fm_silent_input_is_zero() {
        let params = SignalParams {
            modulation_index: 150.0,
            ..am_params()
        };
        let silent = Signal::new(vec![0.0; 64], vec![0.0; 64]);
        let demod = demodulate_fm(&silent, &params);
        assert!(demod.values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_fm_zero_index_is_not_guarded() {
        let params = SignalParams {
            modulation_index: 0.0,
            ..am_params()
        };
        let demod = demodulate_fm(&generate_fm(&params), &params);
        assert_eq!(demod.len(), params.sample_count());
        assert!(
            demod.values.iter().any(|v| !v.is_finite()),
            "zero modulation index should surface as non-finite output"
        );
    }

    #[test]
    fn test_empty_inputs() {
        let params = am_params();
        assert!(demodulate_am(&Signal::default()).is_empty());
        assert!(demodulate_fm(&Signal::default(), &params).is_empty());
    }

    #[test]
    fn test_demodulate_dispatch() {
        let params = am_params();
        let am = generate_am(&params);
        assert_eq!(demodulate(ModulationType::Am, &am, &params), demodulate_am(&am));
    }
}
