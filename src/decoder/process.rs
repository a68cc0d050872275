//! Frame dispatch and protocol timing
//!
//! Every emitted frame passes through the dispatcher, which recognizes the
//! commands that alter session timing and tags everything else as an
//! application exchange. Response windows for the expected PICC answer are
//! scheduled here and recorded for the listen side.

use crate::crc;
use crate::frame::{flags, FramePhase, FrameType, NfcFrame};
use crate::proto;
use crate::status::DecoderStatus;

use super::NfcB;

/// Current frame metadata and per-frame timing deadlines, in sample units
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStatus {
    /// Direction of the frame being decoded; `None` while searching
    pub frame_type: Option<FrameType>,
    /// Symbol rate the frame was locked at
    pub symbol_rate: u32,
    /// First sample of the frame
    pub frame_start: u64,
    /// Last sample of the frame
    pub frame_end: u64,
    /// Earliest sample the PICC may start responding
    pub guard_end: u64,
    /// Latest sample the PICC response may start
    pub waiting_end: u64,
    /// Per-frame guard times, seeded from the protocol defaults
    pub start_up_guard_time: u64,
    pub frame_guard_time: u64,
    pub frame_waiting_time: u64,
    pub request_guard_time: u64,
    /// Command byte of the last recognized poll frame
    pub last_command: u8,
}

/// Negotiated session parameters, persistent across frames
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtocolStatus {
    pub max_frame_size: usize,
    pub start_up_guard_time: u64,
    pub frame_waiting_time: u64,
    pub frame_guard_time: u64,
    pub request_guard_time: u64,
}

impl NfcB {
    /// Classify an emitted frame and schedule the response window
    pub(crate) fn process(&mut self, decoder: &mut DecoderStatus, frame: &mut NfcFrame) {
        // default response timing, overridden by the recognizers
        if frame.is_poll_frame() {
            self.frame_status.frame_waiting_time = self.protocol_status.frame_waiting_time;
        }

        if !self.process_reqb(decoder, frame) {
            self.process_other(frame);
        }

        // carry flags across chained frames
        frame.set_frame_flags(self.chained_flags);

        if frame.is_poll_frame() {
            if let Some(rate) = decoder.selected {
                let delay = self.bitrate_params[rate.index()].symbol_delay_detect;

                // TR0min: the PICC must stay quiet this long
                self.frame_status.guard_end =
                    self.frame_status.frame_end + self.frame_status.frame_guard_time + delay;

                // FWT: the PICC must answer before this deadline
                self.frame_status.waiting_end =
                    self.frame_status.frame_end + self.frame_status.frame_waiting_time + delay;

                self.frame_status.frame_type = Some(FrameType::ListenFrame);
            }
        } else {
            self.frame_status.frame_type = None;
            self.frame_status.last_command = 0;
        }

        self.last_frame_end = self.frame_status.frame_end;
        self.frame_status.frame_start = 0;
        self.frame_status.frame_end = 0;
    }

    /// Recognize REQB/WUPB and reset session parameters
    pub(crate) fn process_reqb(&mut self, decoder: &DecoderStatus, frame: &mut NfcFrame) -> bool {
        if frame.is_poll_frame() {
            if frame.data.len() == 5 && frame.data[0] == proto::NFCB_REQB {
                let sample_time_unit = decoder.signal_params.sample_time_unit;

                self.frame_status.last_command = frame.data[0];

                // REQB starts or wakes up the card, drop back to defaults
                self.protocol_status.max_frame_size = 256;
                self.protocol_status.frame_guard_time =
                    (sample_time_unit * proto::NFCB_FGT_DEF as f64) as u64;
                self.protocol_status.frame_waiting_time =
                    (sample_time_unit * proto::NFCB_FWT_DEF as f64) as u64;

                // the ATQB answer arrives in a tighter window than FWT
                self.frame_status.frame_guard_time =
                    (sample_time_unit * proto::NFCB_FGT_DEF as f64) as u64;
                self.frame_status.frame_waiting_time =
                    (sample_time_unit * proto::NFCB_FWT_ATQB as f64) as u64;

                self.chained_flags = 0;

                frame.phase = FramePhase::SelectionFrame;
                if !crc::check_crc(&frame.data) {
                    frame.set_frame_flags(flags::CRC_ERROR);
                }

                return true;
            }
        }

        if frame.is_listen_frame() && self.frame_status.last_command == proto::NFCB_REQB {
            frame.phase = FramePhase::SelectionFrame;
            return true;
        }

        false
    }

    /// Everything unrecognized is an application frame, CRC still applies
    pub(crate) fn process_other(&mut self, frame: &mut NfcFrame) {
        frame.phase = FramePhase::ApplicationFrame;
        if !crc::check_crc(&frame.data) {
            frame.set_frame_flags(flags::CRC_ERROR);
        }
    }
}
