use serde::{Deserialize, Serialize};
use std::fmt;

/// Headroom the demodulators need between sampling rate and carrier frequency
const ALIAS_FREE_RATIO: f64 = 2.5;

/// Parameters describing one waveform family
///
/// `modulation_index` is the fractional depth for AM (0..1 nominal, larger
/// values over-modulate) and the frequency deviation constant for FM, where it
/// must be non-zero for demodulation to be meaningful.
///
/// The sampling rate should exceed ~2.5x the carrier frequency; nothing here
/// enforces that, see [`SignalParams::is_alias_free`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalParams {
    /// Sampling rate in Hz
    pub sampling_rate: f64,
    /// Duration in seconds
    pub duration: f64,
    /// Message (baseband) frequency in Hz
    pub message_freq: f64,
    /// Carrier frequency in Hz
    pub carrier_freq: f64,
    /// Peak amplitude of the message tone
    pub message_amp: f64,
    /// Peak amplitude of the unmodulated carrier
    pub carrier_amp: f64,
    /// AM depth or FM deviation constant
    pub modulation_index: f64,
}

impl SignalParams {
    /// Reference AM setup: 10 kHz sampling, 100 ms, 50 Hz message on a 1 kHz carrier, 50% depth
    pub fn am_reference() -> Self {
        Self {
            sampling_rate: 10_000.0,
            duration: 0.1,
            message_freq: 50.0,
            carrier_freq: 1_000.0,
            message_amp: 1.0,
            carrier_amp: 1.0,
            modulation_index: 0.5,
        }
    }

    /// Reference FM setup: same timing as [`SignalParams::am_reference`] with a deviation constant of 150
    pub fn fm_reference() -> Self {
        Self {
            modulation_index: 150.0,
            ..Self::am_reference()
        }
    }

    /// Number of samples a generator produces: `floor(sampling_rate * duration)`
    ///
    /// Zero for non-positive or non-finite rates and durations.
    pub fn sample_count(&self) -> usize {
        if !(self.sampling_rate > 0.0) || !(self.duration > 0.0) {
            return 0;
        }
        let count = (self.sampling_rate * self.duration).floor();
        if count.is_finite() {
            count as usize
        } else {
            0
        }
    }

    /// Seconds between samples
    pub fn sample_period(&self) -> f64 {
        1.0 / self.sampling_rate
    }

    /// Whether the sampling rate leaves enough room above the carrier for demodulation
    pub fn is_alias_free(&self) -> bool {
        self.sampling_rate > ALIAS_FREE_RATIO * self.carrier_freq
    }
}

/// Sampled time series: `time[i]` is the timestamp of `values[i]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub time: Vec<f64>,
    pub values: Vec<f64>,
}

impl Signal {
    pub fn new(time: Vec<f64>, values: Vec<f64>) -> Self {
        debug_assert_eq!(time.len(), values.len(), "time and values must be parallel");
        Self { time, values }
    }

    /// Build a new signal on this signal's time axis
    pub fn with_values(&self, values: Vec<f64>) -> Self {
        Self::new(self.time.clone(), values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Modulation scheme under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModulationType {
    #[serde(rename = "AM")]
    Am,
    #[serde(rename = "FM")]
    Fm,
}

impl ModulationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModulationType::Am => "AM",
            ModulationType::Fm => "FM",
        }
    }
}

impl fmt::Display for ModulationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
