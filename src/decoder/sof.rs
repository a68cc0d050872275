//! Start-of-frame search for NFC-B poll frames
//!
//! The NFC-B SOF is a 10-11 ETU modulated low followed by a 2-3 ETU
//! unmodulated high. The search runs one sample at a time through three
//! stages: hunt the opening falling edge, verify the rising edge closing
//! the low, then the falling edge closing the high. Each edge is committed
//! by peak tracking — the strongest detector response inside the stage
//! window wins, and the commit fires a quarter symbol after the last peak
//! update so a later, stronger response can still take over.

use crate::bitrate::BitrateParams;

use super::modulation::{EdgeSample, ModulationStatus, SofStage, EDGE_DETECT_THRESHOLD};

/// Outcome of one sample step of the SOF search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SofSearch {
    /// Still searching
    None,
    /// Signal disqualified at this sample; the search restarted
    Reject,
    /// Full SOF committed; symbol boundaries are final
    Detected,
}

/// Advance the SOF state machine by one sample
///
/// On [`SofSearch::Detected`] the modulation holds `symbol_start_time` at
/// the opening edge of the SOF and `symbol_end_time` at the falling edge
/// that starts the first character, ready for the symbol tracker.
pub(crate) fn search(
    bitrate: &BitrateParams,
    modulation: &mut ModulationStatus,
    clock: u64,
    edge: &EdgeSample,
    minimum_threshold: f32,
    maximum_threshold: f32,
) -> SofSearch {
    // an over-deep envelope is interference, not NFC-B
    if edge.modulation_deep > maximum_threshold {
        modulation.restart();
        return SofSearch::Reject;
    }

    match modulation.search_stage {
        SofStage::Begin => {
            // track the strongest falling edge
            if modulation.detector_peak < edge.edge_detector
                && edge.edge_detector > EDGE_DETECT_THRESHOLD
                && edge.modulation_deep > minimum_threshold
            {
                modulation.detector_peak = edge.edge_detector;
                modulation.search_peak_time = Some(clock);
                modulation.search_end_time = clock + bitrate.period4_symbol_samples;
            }

            if clock == modulation.search_end_time {
                if let Some(peak_time) = modulation.search_peak_time {
                    // peak response lags the edge by an eighth symbol
                    modulation.symbol_start_time = peak_time - bitrate.period8_symbol_samples;

                    // the rising edge closing the SOF low must land 10 to
                    // 11 ETU out
                    modulation.search_stage = SofStage::Idle;
                    modulation.search_start_time = peak_time + 10 * bitrate.period1_symbol_samples
                        - bitrate.period2_symbol_samples;
                    modulation.search_end_time = peak_time + 11 * bitrate.period1_symbol_samples
                        + bitrate.period2_symbol_samples;
                    modulation.search_peak_time = None;
                    modulation.detector_peak = 0.0;
                } else {
                    modulation.search_start_time = 0;
                    modulation.search_end_time = 0;
                }
            }

            SofSearch::None
        }

        SofStage::Idle => {
            if clock > modulation.search_start_time && clock <= modulation.search_end_time {
                // track the strongest rising edge
                if edge.edge_detector < -EDGE_DETECT_THRESHOLD
                    && modulation.detector_peak > edge.edge_detector
                {
                    modulation.detector_peak = edge.edge_detector;
                    modulation.search_peak_time = Some(clock);
                    modulation.search_end_time = clock + bitrate.period4_symbol_samples;
                }

                if clock == modulation.search_end_time {
                    if let Some(peak_time) = modulation.search_peak_time {
                        // the falling edge closing the SOF high must land
                        // 2 to 3 ETU out
                        modulation.search_stage = SofStage::End;
                        modulation.search_start_time = peak_time
                            + 2 * bitrate.period1_symbol_samples
                            - bitrate.period2_symbol_samples;
                        modulation.search_end_time = peak_time
                            + 3 * bitrate.period1_symbol_samples
                            + bitrate.period2_symbol_samples;
                        modulation.search_peak_time = None;
                        modulation.detector_peak = 0.0;
                    } else {
                        modulation.restart();
                    }
                }

                SofSearch::None
            } else if edge.edge_detector.abs() > EDGE_DETECT_THRESHOLD {
                // the SOF low must stay flat outside the search window
                modulation.restart();
                SofSearch::Reject
            } else {
                SofSearch::None
            }
        }

        SofStage::End => {
            if clock > modulation.search_start_time && clock <= modulation.search_end_time {
                if modulation.detector_peak < edge.edge_detector
                    && edge.edge_detector > EDGE_DETECT_THRESHOLD
                    && edge.modulation_deep > minimum_threshold
                {
                    modulation.detector_peak = edge.edge_detector;
                    modulation.search_peak_time = Some(clock);
                    modulation.search_end_time = clock + bitrate.period8_symbol_samples;
                }

                if clock == modulation.search_end_time {
                    if let Some(peak_time) = modulation.search_peak_time {
                        // this edge doubles as the leading edge of the
                        // first character's start bit
                        modulation.symbol_end_time = peak_time - bitrate.period8_symbol_samples;
                        modulation.symbol_sync_time = None;

                        modulation.search_stage = SofStage::Begin;
                        modulation.search_start_time = 0;
                        modulation.search_end_time = 0;
                        modulation.search_peak_time = None;
                        modulation.detector_peak = 0.0;

                        return SofSearch::Detected;
                    }

                    modulation.restart();
                }
            }

            SofSearch::None
        }
    }
}
