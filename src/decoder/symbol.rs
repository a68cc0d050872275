//! ASK symbol tracker for the poll side
//!
//! After SOF lock the bit clock free-runs at one symbol per `period1` and
//! re-synchronizes on the strongest edge inside a half-symbol window around
//! each expected symbol boundary. The absolute edge magnitude is tracked —
//! either transition direction can serve as a timing reference — but a
//! candidate only counts when the envelope is inside a modulation notch,
//! which in practice keeps the falling edges.

use crate::bitrate::BitrateParams;
use crate::buffer::SampleBuffer;
use crate::status::DecoderStatus;

use super::modulation::{ModulationStatus, EDGE_DETECT_THRESHOLD};

/// Decoded symbol kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Modulated low, bit value 0
    L,
    /// Unmodulated high, bit value 1
    H,
}

impl Pattern {
    pub fn bit(self) -> u8 {
        match self {
            Pattern::L => 0,
            Pattern::H => 1,
        }
    }
}

/// Last decoded symbol
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolStatus {
    /// Bit value, 0 for L and 1 for H
    pub value: u8,
    /// First sample of the symbol, corrected for the rate's detection delay
    pub start: u64,
    /// Last sample of the symbol, corrected for the rate's detection delay
    pub end: u64,
    /// Symbol length in samples
    pub length: u64,
    /// Symbol kind, `None` until a symbol has been decided
    pub pattern: Option<Pattern>,
}

/// Decode one poll-side ASK symbol
///
/// Consumes samples until a symbol midpoint is reached or the buffer is
/// drained. Returns `None` on a drained buffer; all tracking state stays in
/// `modulation` so the next call resumes where this one stopped.
pub(crate) fn decode_poll_symbol(
    bitrate: &BitrateParams,
    modulation: &mut ModulationStatus,
    symbol: &mut SymbolStatus,
    decoder: &mut DecoderStatus,
    buffer: &mut SampleBuffer<'_>,
    minimum_threshold: f32,
) -> Option<Pattern> {
    symbol.pattern = None;

    while decoder.next_sample(buffer) {
        let edge = modulation.integrate(bitrate, decoder);
        let edge_magnitude = edge.edge_detector.abs();
        let clock = decoder.signal_clock;

        // edge re-synchronization window around the expected symbol end
        if clock > modulation.search_start_time && clock < modulation.search_end_time {
            if edge_magnitude > EDGE_DETECT_THRESHOLD
                && modulation.detector_peak < edge_magnitude
                && edge.modulation_deep > minimum_threshold
            {
                modulation.detector_peak = edge_magnitude;
                modulation.symbol_end_time = clock - bitrate.period8_symbol_samples;
                modulation.symbol_sync_time = None;
            }
        }

        // project the next symbol from the last known boundary
        if modulation.symbol_sync_time.is_none() {
            modulation.symbol_start_time = modulation.symbol_end_time;
            modulation.symbol_end_time = modulation.symbol_start_time + bitrate.period1_symbol_samples;
            modulation.symbol_sync_time =
                Some(modulation.symbol_start_time + bitrate.period2_symbol_samples);
        }

        // sample the notch depth at the symbol midpoint
        if Some(clock) == modulation.symbol_sync_time {
            let pattern = if edge.modulation_deep > minimum_threshold {
                Pattern::L
            } else {
                Pattern::H
            };

            symbol.value = pattern.bit();
            symbol.start = modulation.symbol_start_time - bitrate.symbol_delay_detect;
            symbol.end = modulation.symbol_end_time - bitrate.symbol_delay_detect;
            symbol.length = symbol.end - symbol.start;
            symbol.pattern = Some(pattern);

            modulation.search_start_time = modulation.symbol_end_time - bitrate.period4_symbol_samples;
            modulation.search_end_time = modulation.symbol_end_time + bitrate.period4_symbol_samples;
            modulation.symbol_sync_time = None;
            modulation.detector_peak = 0.0;

            break;
        }
    }

    symbol.pattern
}
