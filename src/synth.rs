//! NFC-B poll frame envelope synthesizer
//!
//! Builds ideal baseband envelopes for testing and benchmarking the
//! decoder: a settled carrier lead-in, the SOF pattern, one character per
//! payload byte (start bit, 8 data bits LSB first, stop bit) and a 10 ETU
//! EOF, all at 106 kbps. Deterministic noise can be layered on top with
//! [`add_awgn`].

use bitvec::prelude::*;
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use snafu::{ensure, Snafu};

use crate::proto::NFC_FC;

/// Errors raised while synthesizing an envelope
#[derive(Debug, Snafu)]
pub enum SynthError {
    /// Modulation depth outside (0, 1)
    #[snafu(display("modulation depth {depth} is outside (0, 1)"))]
    InvalidDepth { depth: f32 },
}

/// Envelope synthesis parameters
#[derive(Debug, Clone)]
pub struct SynthConfig {
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Unmodulated carrier envelope level
    pub amplitude: f32,
    /// ASK modulation depth for low symbols
    pub depth: f32,
    /// Carrier samples before the SOF, long enough for the power average
    /// to settle
    pub lead_in_samples: usize,
    /// Carrier samples after the EOF
    pub tail_samples: usize,
    /// SOF low duration in ETU (10 or 11)
    pub sof_low_etu: u32,
    /// SOF high duration in ETU (2 or 3)
    pub sof_high_etu: u32,
    /// Extra guard symbols appended after each character's stop bit
    pub extra_guard_etu: u32,
}

impl SynthConfig {
    pub fn new(sample_rate: u32) -> Self {
        let etu = etu_samples(sample_rate);
        Self {
            sample_rate,
            amplitude: 1.0,
            // deep enough that the notch stays past the detection floor
            // even after the power average settles onto a long frame's
            // duty-cycle mean
            depth: 0.30,
            // 20 ms, twenty time constants of the power average
            lead_in_samples: sample_rate as usize / 50,
            tail_samples: 20 * etu,
            sof_low_etu: 10,
            sof_high_etu: 2,
            extra_guard_etu: 0,
        }
    }

    /// Samples per elementary time unit at this sample rate
    pub fn etu_samples(&self) -> usize {
        etu_samples(self.sample_rate)
    }

    /// Sample index of the SOF falling edge in a synthesized envelope
    pub fn sof_edge_sample(&self) -> usize {
        self.lead_in_samples
    }
}

fn etu_samples(sample_rate: u32) -> usize {
    (sample_rate as f64 / NFC_FC * 128.0).round() as usize
}

/// Synthesize the envelope of one NFC-B poll frame at 106 kbps
///
/// The payload goes onto the wire as-is; append a CRC with
/// [`crate::crc::append_crc`] first when the frame should verify. An empty
/// payload produces a bare SOF + EOF, which a decoder discards as a frame
/// with no bytes.
pub fn synthesize_poll_frame(config: &SynthConfig, payload: &[u8]) -> Result<Vec<f32>, SynthError> {
    ensure!(
        config.depth > 0.0 && config.depth < 1.0,
        InvalidDepthSnafu { depth: config.depth }
    );

    let etu = config.etu_samples();
    let high = config.amplitude;
    let low = config.amplitude * (1.0 - config.depth);

    let frame_etu = (config.sof_low_etu + config.sof_high_etu) as usize
        + payload.len() * (10 + config.extra_guard_etu as usize)
        + 10;
    let mut samples =
        Vec::with_capacity(config.lead_in_samples + frame_etu * etu + config.tail_samples);

    samples.resize(config.lead_in_samples, high);

    // SOF: modulated low, then unmodulated high
    extend_level(&mut samples, low, config.sof_low_etu as usize * etu);
    extend_level(&mut samples, high, config.sof_high_etu as usize * etu);

    // characters: start L, data LSB first, stop H
    for &byte in payload {
        extend_level(&mut samples, low, etu);
        for bit in byte.view_bits::<Lsb0>().iter().by_vals() {
            extend_level(&mut samples, if bit { high } else { low }, etu);
        }
        extend_level(&mut samples, high, etu);
        extend_level(&mut samples, high, config.extra_guard_etu as usize * etu);
    }

    // EOF: ten consecutive lows
    extend_level(&mut samples, low, 10 * etu);

    extend_level(&mut samples, high, config.tail_samples);

    Ok(samples)
}

fn extend_level(samples: &mut Vec<f32>, level: f32, count: usize) {
    samples.resize(samples.len() + count, level);
}

/// Add white Gaussian noise with a deterministic seed
pub fn add_awgn(samples: &mut [f32], sigma: f32, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0f32, sigma).unwrap();

    for sample in samples.iter_mut() {
        *sample += normal.sample(&mut rng);
    }
}
