//! Shared signal state between the sample source and the decoder
//!
//! [`DecoderStatus`] owns the envelope ring buffer, the monotonic sample
//! clock and the smoothed power estimate the detectors gate on. The decoder
//! core borrows it per call and never advances the clock itself except
//! through [`DecoderStatus::next_sample`].

use crate::bitrate::RateType;
use crate::buffer::SampleBuffer;

/// Envelope ring length in samples; a power of two so masking is a valid
/// modulus
pub const SIGNAL_BUFFER_LENGTH: usize = 0x10000;

const SIGNAL_BUFFER_MASK: u64 = (SIGNAL_BUFFER_LENGTH - 1) as u64;

/// Derived signal parameters, filled in at configure time
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalParams {
    /// Samples per carrier cycle (sample_rate / 13.56 MHz); all protocol
    /// timing factors scale by this
    pub sample_time_unit: f64,
    /// Exponential smoothing weights for the power average
    pub power_average_w0: f32,
    pub power_average_w1: f32,
    /// Exponential smoothing weights for the signal average
    pub signal_average_w0: f32,
    pub signal_average_w1: f32,
    /// Exponential smoothing weights for the signal variance
    pub signal_variance_w0: f32,
    pub signal_variance_w1: f32,
}

/// Host-visible decoder state: sample clock, envelope ring and carrier gates
pub struct DecoderStatus {
    /// Configured sample rate in Hz
    pub sample_rate: u32,
    /// Monotonic sample counter; sample `n` lives at ring index `n & mask`
    pub signal_clock: u64,
    /// Smoothed envelope power
    pub power_average: f32,
    /// Smoothed envelope value
    pub signal_average: f32,
    /// Smoothed envelope variance
    pub signal_variance: f32,
    /// Minimum power average for the carrier to count as present
    pub power_level_threshold: f32,
    /// Derived parameters computed by `configure`
    pub signal_params: SignalParams,
    /// Rate locked by a successful SOF detection; `None` while searching
    pub selected: Option<RateType>,
    signal_data: Box<[f32]>,
}

impl DecoderStatus {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            signal_clock: 0,
            power_average: 0.0,
            signal_average: 0.0,
            signal_variance: 0.0,
            power_level_threshold: 0.01,
            signal_params: SignalParams::default(),
            selected: None,
            signal_data: vec![0.0; SIGNAL_BUFFER_LENGTH].into_boxed_slice(),
        }
    }

    /// Ingest one sample from the caller's buffer
    ///
    /// Advances the clock, stores the sample in the ring and refreshes the
    /// exponential averages. Returns `false` when the buffer is drained.
    pub fn next_sample(&mut self, buffer: &mut SampleBuffer<'_>) -> bool {
        let Some(value) = buffer.pull() else {
            return false;
        };

        self.signal_clock += 1;
        self.signal_data[(self.signal_clock & SIGNAL_BUFFER_MASK) as usize] = value;

        let params = &self.signal_params;
        self.power_average = self.power_average * params.power_average_w0 + value * params.power_average_w1;
        self.signal_average = self.signal_average * params.signal_average_w0 + value * params.signal_average_w1;

        let deviation = value - self.signal_average;
        self.signal_variance =
            self.signal_variance * params.signal_variance_w0 + deviation * deviation * params.signal_variance_w1;

        true
    }

    /// Ring sample at an absolute index (offset + clock), masked to the ring
    pub fn sample_at(&self, index: u64) -> f32 {
        self.signal_data[(index & SIGNAL_BUFFER_MASK) as usize]
    }

    /// True while a modulation lock is held
    pub fn is_locked(&self) -> bool {
        self.selected.is_some()
    }
}
