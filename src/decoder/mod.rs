//! NFC-B poll-side decoder
//!
//! The decoder runs as a pull-driven pipeline over the host's sample
//! stream. While searching, the caller ingests one sample at a time through
//! [`DecoderStatus::next_sample`] and steps the SOF search with
//! [`NfcB::detect`]; once a lock is reported, [`NfcB::decode`] pulls the
//! remaining samples itself, tracking the bit clock symbol by symbol and
//! emitting reconstructed frames.
//!
//! Only the 106 kbps ASK poll path is wired up: the timing table carries
//! entries for 212 and 424 kbps, but SOF detection runs the 106 kbps entry
//! alone, matching the rates NFC-B readers actually poll at.
//!
//! **Module organization**:
//! - `modulation` - per-rate DSP state and the edge detector
//! - `sof` - start-of-frame search state machine
//! - `symbol` - ASK symbol tracker with bit-clock recovery
//! - `stream` - character framing and frame assembly
//! - `process` - frame dispatch, REQB recognition, response timing

mod modulation;
mod process;
mod sof;
mod stream;
mod symbol;

pub use modulation::{ModulationStatus, SofStage};
pub use process::{FrameStatus, ProtocolStatus};
pub use stream::StreamStatus;
pub use symbol::{Pattern, SymbolStatus};

use snafu::{ensure, Snafu};
use tracing::{debug, info};

use crate::bitrate::{BitrateParams, RateType};
use crate::buffer::SampleBuffer;
use crate::frame::{FrameType, NfcFrame};
use crate::proto;
use crate::status::DecoderStatus;

use sof::SofSearch;

/// Errors raised while configuring the decoder
#[derive(Debug, Snafu)]
pub enum ConfigureError {
    /// Sample rate of zero or otherwise unusable
    #[snafu(display("sample rate {sample_rate} Hz is invalid"))]
    InvalidSampleRate { sample_rate: u32 },

    /// Sample rate too low to resolve an eighth-symbol window at this rate
    #[snafu(display("sample rate {sample_rate} Hz cannot resolve {symbols_per_second} symbols/s"))]
    UnsupportedSampleRate { sample_rate: u32, symbols_per_second: u32 },
}

/// NFC-B demodulator and frame decoder
pub struct NfcB {
    pub(crate) bitrate_params: [BitrateParams; 4],
    pub(crate) modulation_status: [ModulationStatus; 4],
    pub(crate) symbol_status: SymbolStatus,
    pub(crate) stream_status: StreamStatus,
    pub(crate) frame_status: FrameStatus,
    pub(crate) protocol_status: ProtocolStatus,
    pub(crate) minimum_modulation_threshold: f32,
    pub(crate) maximum_modulation_threshold: f32,
    pub(crate) last_frame_end: u64,
    pub(crate) chained_flags: u32,
}

impl Default for NfcB {
    fn default() -> Self {
        Self::new()
    }
}

impl NfcB {
    pub fn new() -> Self {
        Self {
            bitrate_params: [BitrateParams::default(); 4],
            modulation_status: [ModulationStatus::default(); 4],
            symbol_status: SymbolStatus::default(),
            stream_status: StreamStatus::default(),
            frame_status: FrameStatus::default(),
            protocol_status: ProtocolStatus::default(),
            minimum_modulation_threshold: 0.10,
            maximum_modulation_threshold: 0.50,
            last_frame_end: 0,
            chained_flags: 0,
        }
    }

    /// Set the modulation depth window a signal must fall into to count as
    /// NFC-B (defaults 0.10 and 0.50)
    pub fn set_modulation_threshold(&mut self, minimum: f32, maximum: f32) {
        self.minimum_modulation_threshold = minimum;
        self.maximum_modulation_threshold = maximum;
    }

    /// (Re)initialize the timing tables and session defaults
    ///
    /// Clears all decode state, computes the per-rate timing table for 106,
    /// 212 and 424 kbps and seeds the protocol guard times with their
    /// defaults.
    pub fn configure(
        &mut self,
        decoder: &mut DecoderStatus,
        sample_rate: u32,
    ) -> Result<(), ConfigureError> {
        ensure!(sample_rate > 0, InvalidSampleRateSnafu { sample_rate });

        decoder.sample_rate = sample_rate;
        decoder.signal_params.sample_time_unit = sample_rate as f64 / proto::NFC_FC;

        info!("initializing NFC-B decoder");
        info!(
            sample_rate,
            power_level_threshold = decoder.power_level_threshold as f64,
            minimum_modulation_threshold = self.minimum_modulation_threshold as f64,
            maximum_modulation_threshold = self.maximum_modulation_threshold as f64,
        );

        self.symbol_status = SymbolStatus::default();
        self.stream_status.reset();
        self.frame_status = FrameStatus::default();
        self.last_frame_end = 0;
        self.chained_flags = 0;
        decoder.selected = None;

        let sample_time_unit = decoder.signal_params.sample_time_unit;

        for rate in [RateType::R106k, RateType::R212k, RateType::R424k] {
            self.modulation_status[rate.index()] = ModulationStatus::default();

            let previous = (rate != RateType::R106k).then(|| self.bitrate_params[rate.index() - 1]);
            let bitrate = BitrateParams::build(rate, sample_time_unit, previous.as_ref());

            ensure!(
                bitrate.period8_symbol_samples >= 1,
                UnsupportedSampleRateSnafu {
                    sample_rate,
                    symbols_per_second: bitrate.symbols_per_second,
                }
            );

            info!(
                symbols_per_second = bitrate.symbols_per_second,
                period1 = bitrate.period1_symbol_samples,
                period2 = bitrate.period2_symbol_samples,
                period4 = bitrate.period4_symbol_samples,
                period8 = bitrate.period8_symbol_samples,
                symbol_delay_detect = bitrate.symbol_delay_detect,
                "rate parameters"
            );

            self.bitrate_params[rate.index()] = bitrate;
        }

        // 848 kbps slot stays unconfigured, no NFC-B poll runs that fast
        self.bitrate_params[RateType::R848k.index()] = BitrateParams::default();
        self.modulation_status[RateType::R848k.index()] = ModulationStatus::default();

        self.protocol_status.max_frame_size = 256;
        self.protocol_status.start_up_guard_time =
            (sample_time_unit * proto::NFCB_SFGT_DEF as f64) as u64;
        self.protocol_status.frame_waiting_time =
            (sample_time_unit * proto::NFCB_FWT_DEF as f64) as u64;
        self.protocol_status.frame_guard_time =
            (sample_time_unit * proto::NFCB_FGT_DEF as f64) as u64;
        self.protocol_status.request_guard_time =
            (sample_time_unit * proto::NFCB_RGT_DEF as f64) as u64;

        self.frame_status.start_up_guard_time = self.protocol_status.start_up_guard_time;
        self.frame_status.frame_waiting_time = self.protocol_status.frame_waiting_time;
        self.frame_status.frame_guard_time = self.protocol_status.frame_guard_time;
        self.frame_status.request_guard_time = self.protocol_status.request_guard_time;

        // exponential averages: power tracks at ~1 ms, signal level and
        // variance at ~100 ms
        decoder.signal_params.power_average_w0 = (1.0 - 1e3 / sample_rate as f64) as f32;
        decoder.signal_params.power_average_w1 = 1.0 - decoder.signal_params.power_average_w0;
        decoder.signal_params.signal_average_w0 = (1.0 - 1e5 / sample_rate as f64) as f32;
        decoder.signal_params.signal_average_w1 = 1.0 - decoder.signal_params.signal_average_w0;
        decoder.signal_params.signal_variance_w0 = (1.0 - 1e5 / sample_rate as f64) as f32;
        decoder.signal_params.signal_variance_w1 = 1.0 - decoder.signal_params.signal_variance_w0;

        info!(
            max_frame_size = self.protocol_status.max_frame_size as u64,
            frame_guard_time = self.protocol_status.frame_guard_time,
            frame_waiting_time = self.protocol_status.frame_waiting_time,
            request_guard_time = self.protocol_status.request_guard_time,
            "startup parameters"
        );

        Ok(())
    }

    /// Step the SOF search with the sample at the current clock
    ///
    /// Returns `true` when a complete NFC-B SOF committed; the rate lock is
    /// then held in [`DecoderStatus::selected`] and the caller switches to
    /// [`NfcB::decode`].
    pub fn detect(&mut self, decoder: &mut DecoderStatus) -> bool {
        if decoder.is_locked() {
            return false;
        }

        // no carrier, no search
        if decoder.power_average <= decoder.power_level_threshold {
            return false;
        }

        // ASK poll detection runs 106 kbps only
        for rate in [RateType::R106k] {
            let bitrate = &self.bitrate_params[rate.index()];
            let modulation = &mut self.modulation_status[rate.index()];

            let edge = modulation.integrate(bitrate, decoder);

            match sof::search(
                bitrate,
                modulation,
                decoder.signal_clock,
                &edge,
                self.minimum_modulation_threshold,
                self.maximum_modulation_threshold,
            ) {
                SofSearch::Detected => {
                    self.frame_status.frame_type = Some(FrameType::PollFrame);
                    self.frame_status.symbol_rate = bitrate.symbols_per_second;
                    self.frame_status.frame_start =
                        modulation.symbol_start_time - bitrate.symbol_delay_detect;
                    self.frame_status.frame_end = 0;

                    decoder.selected = Some(rate);

                    debug!(
                        frame_start = self.frame_status.frame_start,
                        symbols_per_second = bitrate.symbols_per_second,
                        "SOF detected"
                    );

                    return true;
                }
                SofSearch::Reject => return false,
                SofSearch::None => {}
            }
        }

        false
    }

    /// Decode the frame in flight, pulling samples from `buffer`
    ///
    /// Emitted frames are appended to `frames` in order. Returns when the
    /// buffer is drained or the frame completed; a poll frame emission
    /// transitions to the listen phase within the same call.
    pub fn decode(
        &mut self,
        decoder: &mut DecoderStatus,
        buffer: &mut SampleBuffer<'_>,
        frames: &mut Vec<NfcFrame>,
    ) {
        if self.frame_status.frame_type == Some(FrameType::PollFrame) {
            self.decode_poll_frame(decoder, buffer, frames);
        }

        if self.frame_status.frame_type == Some(FrameType::ListenFrame) {
            self.decode_listen_frame(decoder);
        }
    }

    /// Listen-side stub
    ///
    /// BPSK demodulation of the PICC response is not implemented. The
    /// response deadlines stay recorded in [`FrameStatus::guard_end`] and
    /// [`FrameStatus::waiting_end`]; the stub releases the modulation lock
    /// so the search resumes with the next poll frame.
    fn decode_listen_frame(&mut self, decoder: &mut DecoderStatus) {
        decoder.selected = None;
        self.frame_status.frame_type = None;
    }

    /// Drop the modulation lock and return to SOF search
    ///
    /// Clears the per-rate search state and the partial character stream;
    /// the running integrators carry on so the edge baseline stays settled.
    pub(crate) fn reset_modulation(&mut self, decoder: &mut DecoderStatus) {
        for modulation in &mut self.modulation_status {
            modulation.restart();
        }

        self.stream_status.reset();
        self.symbol_status = SymbolStatus::default();

        self.frame_status.frame_type = None;
        self.frame_status.frame_start = 0;
        self.frame_status.frame_end = 0;

        decoder.selected = None;
    }

    /// Frame metadata and response deadlines of the frame in flight
    pub fn frame_status(&self) -> &FrameStatus {
        &self.frame_status
    }

    /// End sample of the most recently processed frame
    pub fn last_frame_end(&self) -> u64 {
        self.last_frame_end
    }

    /// Session parameters negotiated so far
    pub fn protocol_status(&self) -> &ProtocolStatus {
        &self.protocol_status
    }

    /// DSP state of one rate's detector
    pub fn modulation_status(&self, rate: RateType) -> &ModulationStatus {
        &self.modulation_status[rate.index()]
    }
}
