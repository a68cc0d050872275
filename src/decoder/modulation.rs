//! Per-rate DSP state and the moving-window edge detector
//!
//! Two incremental integrals run over the envelope: a slow one spanning a
//! quarter symbol and a fast one spanning an eighth symbol. Their normalized
//! difference is the edge signal — positive while the envelope falls into a
//! modulation notch, negative while it rises out of one. The instantaneous
//! notch depth relative to the power average gates every edge decision.

use crate::bitrate::BitrateParams;
use crate::status::DecoderStatus;

/// Minimum edge-detector magnitude that counts as a transition
pub(crate) const EDGE_DETECT_THRESHOLD: f32 = 0.001;

/// SOF search progress for one rate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SofStage {
    /// Hunting for the falling edge that opens the SOF low
    #[default]
    Begin,
    /// Inside the SOF low, waiting for the rising edge 10-11 ETU out
    Idle,
    /// Inside the SOF high, waiting for the falling edge 2-3 ETU out
    End,
}

/// Edge detector output for one sample
#[derive(Debug, Clone, Copy)]
pub struct EdgeSample {
    /// Slow-minus-fast integrator difference; positive on falling envelope
    pub edge_detector: f32,
    /// Normalized notch depth, (power_average - sample) / power_average
    pub modulation_deep: f32,
}

/// Mutable DSP state for one symbol rate
#[derive(Debug, Clone, Copy, Default)]
pub struct ModulationStatus {
    pub search_stage: SofStage,
    /// Search window bounds in sample units; 0 disarms the window
    pub search_start_time: u64,
    pub search_end_time: u64,
    /// Sample time of the strongest edge tracked so far
    pub search_peak_time: Option<u64>,
    /// Edge magnitude of the tracked peak
    pub detector_peak: f32,
    /// Current symbol boundaries in sample units
    pub symbol_start_time: u64,
    pub symbol_end_time: u64,
    /// Midpoint sampling instant for the current symbol
    pub symbol_sync_time: Option<u64>,
    /// Running sum over the quarter-symbol window
    pub filter_integrate: f32,
    /// Running sum over the eighth-symbol window
    pub detect_integrate: f32,
}

impl ModulationStatus {
    /// Fold the sample at the current clock into both integrators and
    /// return the edge signal
    pub fn integrate(&mut self, bitrate: &BitrateParams, decoder: &DecoderStatus) -> EdgeSample {
        let clock = decoder.signal_clock;

        let signal_data = decoder.sample_at(bitrate.offset_signal_index + clock);
        let filter_data = decoder.sample_at(bitrate.offset_filter_index + clock);
        let detect_data = decoder.sample_at(bitrate.offset_detect_index + clock);

        self.filter_integrate += signal_data - filter_data;
        self.detect_integrate += signal_data - detect_data;

        let edge_detector = self.filter_integrate / bitrate.period4_symbol_samples as f32
            - self.detect_integrate / bitrate.period8_symbol_samples as f32;
        let modulation_deep = (decoder.power_average - signal_data) / decoder.power_average;

        EdgeSample { edge_detector, modulation_deep }
    }

    /// Restart the SOF search from scratch
    ///
    /// The integrators keep running across restarts; only the search and
    /// symbol tracking state is discarded.
    pub fn restart(&mut self) {
        self.search_stage = SofStage::Begin;
        self.search_start_time = 0;
        self.search_end_time = 0;
        self.search_peak_time = None;
        self.detector_peak = 0.0;
        self.symbol_start_time = 0;
        self.symbol_end_time = 0;
        self.symbol_sync_time = None;
    }

    /// Clear the symbol windows and integrators after a frame is emitted so
    /// the next SOF search starts from a quiet baseline
    pub fn clear_symbols(&mut self) {
        self.symbol_start_time = 0;
        self.symbol_end_time = 0;
        self.symbol_sync_time = None;
        self.filter_integrate = 0.0;
        self.detect_integrate = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitrate::RateType;
    use crate::buffer::SampleBuffer;

    fn feed(status: &mut DecoderStatus, modulation: &mut ModulationStatus, bitrate: &BitrateParams, samples: &[f32]) -> Vec<EdgeSample> {
        let mut buffer = SampleBuffer::new(samples);
        let mut edges = Vec::new();
        while status.next_sample(&mut buffer) {
            edges.push(modulation.integrate(bitrate, status));
        }
        edges
    }

    #[test]
    fn test_edge_detector_peaks_on_falling_edge() {
        let bitrate = BitrateParams::build(RateType::R106k, 1.0, None);
        let mut status = DecoderStatus::new(13_560_000);
        status.signal_params.power_average_w0 = (1.0 - 1e3 / 13.56e6) as f32;
        status.signal_params.power_average_w1 = 1.0 - status.signal_params.power_average_w0;
        // carrier already settled
        status.power_average = 1.0;
        let mut modulation = ModulationStatus::default();

        // one full symbol of carrier, then a 14% notch
        let mut samples = vec![1.0f32; 256];
        samples.extend(vec![0.86f32; 128]);

        let edges = feed(&mut status, &mut modulation, &bitrate, &samples);

        // flat carrier settles to zero edge signal
        assert!(edges[255].edge_detector.abs() < 1e-4);

        // maximum response lands an eighth symbol after the edge, at half
        // the notch height
        let peak_index = 256 + bitrate.period8_symbol_samples as usize - 1;
        let peak = edges[peak_index].edge_detector;
        assert!((peak - 0.07).abs() < 0.005, "peak {peak}");
        assert!(edges[peak_index - 8].edge_detector < peak);
        assert!(edges[peak_index + 8].edge_detector < peak);

        // notch depth is measured against the power average
        assert!((edges[300].modulation_deep - 0.14).abs() < 0.01);
    }

    #[test]
    fn test_restart_preserves_integrators() {
        let bitrate = BitrateParams::build(RateType::R106k, 1.0, None);
        let mut status = DecoderStatus::new(13_560_000);
        status.signal_params.power_average_w0 = 0.999;
        status.signal_params.power_average_w1 = 0.001;
        let mut modulation = ModulationStatus::default();

        feed(&mut status, &mut modulation, &bitrate, &vec![1.0f32; 64]);
        let filter_before = modulation.filter_integrate;
        modulation.search_stage = SofStage::Idle;
        modulation.detector_peak = 0.5;

        modulation.restart();
        assert_eq!(modulation.search_stage, SofStage::Begin);
        assert_eq!(modulation.detector_peak, 0.0);
        assert_eq!(modulation.search_peak_time, None);
        assert_eq!(modulation.filter_integrate, filter_before);
    }
}
