//! Signal quality metrics: power, SNR, sample statistics, correlation and
//! lag alignment.

use crate::signal::Signal;
use crate::{ALIGNMENT_WINDOW_DIVISOR, MAX_ALIGNMENT_LAG};

/// Mean of squared samples (0 for an empty slice)
pub fn signal_power(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64
}

/// SNR in dB of `corrupted` measured against `original`
///
/// The noise is the per-sample difference. Returns `f64::INFINITY` when the
/// two are identical and NaN when there are no samples to compare.
pub fn calculate_snr(original: &Signal, corrupted: &Signal) -> f64 {
    let n = original.values.len().min(corrupted.values.len());
    if n == 0 {
        return f64::NAN;
    }

    let mut signal_power = 0.0;
    let mut noise_power = 0.0;
    for (&o, &c) in original.values.iter().zip(corrupted.values.iter()) {
        signal_power += o * o;
        let noise = c - o;
        noise_power += noise * noise;
    }
    signal_power /= n as f64;
    noise_power /= n as f64;

    if noise_power == 0.0 {
        return f64::INFINITY;
    }

    10.0 * (signal_power / noise_power).log10()
}

/// Arithmetic mean (NaN for an empty slice)
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation around `mean`, N - 1 in the denominator
///
/// Needs at least two values; fewer yields NaN.
pub fn std_dev(values: &[f64], mean: f64) -> f64 {
    let sum_squares: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    let variance = sum_squares / (values.len() as f64 - 1.0);
    variance.sqrt()
}

/// Root mean square (0 for an empty slice)
pub fn rms(values: &[f64]) -> f64 {
    signal_power(values).sqrt()
}

/// Pearson correlation coefficient
///
/// 0 when the lengths differ, the slices are empty, or either side is constant.
pub fn correlation(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.is_empty() {
        return 0.0;
    }

    let mean_x = mean(x);
    let mean_y = mean(y);

    let mut numerator = 0.0;
    let mut sum_x2 = 0.0;
    let mut sum_y2 = 0.0;
    for (&a, &b) in x.iter().zip(y.iter()) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        numerator += dx * dy;
        sum_x2 += dx * dx;
        sum_y2 += dy * dy;
    }

    let denominator = (sum_x2 * sum_y2).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }
    numerator / denominator
}

/// Normalized autocorrelation of the mean-removed series at `lag`
pub fn autocorrelation(values: &[f64], lag: usize) -> f64 {
    if values.len() <= lag {
        return 0.0;
    }

    let m = mean(values);
    let centered: Vec<f64> = values.iter().map(|v| v - m).collect();

    let span = centered.len() - lag;
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for i in 0..span {
        numerator += centered[i] * centered[i + lag];
        denominator += centered[i] * centered[i];
    }

    if denominator == 0.0 {
        return 0.0;
    }
    numerator / denominator
}

/// Largest lag searched for a signal of `len` samples: 10% of the length, at most 100
pub fn max_alignment_lag(len: usize) -> usize {
    (len / ALIGNMENT_WINDOW_DIVISOR).min(MAX_ALIGNMENT_LAG)
}

/// Lag that best lines `candidate` up with `reference`
///
/// Scores every lag in `±max_alignment_lag` by the dot product of the
/// overlapping samples divided by the overlap length; the first maximum wins.
/// A positive lag means `candidate` trails `reference`.
pub fn best_lag(reference: &[f64], candidate: &[f64]) -> isize {
    let n = reference.len().min(candidate.len()) as isize;
    let max_lag = max_alignment_lag(n as usize) as isize;

    let mut best = 0;
    let mut max_corr = f64::NEG_INFINITY;

    for lag in -max_lag..=max_lag {
        let start = (-lag).max(0);
        let end = (n - lag).min(n);
        if start >= end {
            continue;
        }

        let dot: f64 = (start..end)
            .map(|i| reference[i as usize] * candidate[(i + lag) as usize])
            .sum();
        let corr = dot / (end - start) as f64;

        if corr > max_corr {
            max_corr = corr;
            best = lag;
        }
    }

    best
}

/// `out[i] = values[i + lag]`, zero where that index falls outside the slice
pub fn shift_values(values: &[f64], lag: isize) -> Vec<f64> {
    let n = values.len() as isize;
    (0..n)
        .map(|i| {
            let j = i + lag;
            if j >= 0 && j < n {
                values[j as usize]
            } else {
                0.0
            }
        })
        .collect()
}

/// Shift `candidate` by its [`best_lag`] against `reference`
///
/// Signals of different length are returned unchanged.
pub fn align_to_reference(reference: &Signal, candidate: &Signal) -> Signal {
    if reference.len() != candidate.len() {
        return candidate.clone();
    }
    let lag = best_lag(&reference.values, &candidate.values);
    candidate.with_values(shift_values(&candidate.values, lag))
}
