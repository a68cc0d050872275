//! Bit stream framing for poll frames
//!
//! NFC-B characters are 1 start bit (L), 8 data bits LSB first and 1 stop
//! bit (H). End of frame shows up as a start bit followed by nine more L
//! symbols — ten consecutive lows in total — which the framer recognizes as
//! a zero byte whose stop position reads L.

use tracing::debug;

use crate::buffer::SampleBuffer;
use crate::frame::{flags, FrameType, NfcFrame, TechType};
use crate::status::DecoderStatus;

use super::symbol::Pattern;
use super::{symbol, NfcB};

/// In-progress character and byte buffer
#[derive(Debug, Clone, Default)]
pub struct StreamStatus {
    /// Data bits accumulated for the current character
    pub data: u8,
    /// Bit position inside the character: 0 start, 1-8 data, 9 stop
    pub bits: u8,
    /// Completed bytes of the current frame
    pub buffer: Vec<u8>,
}

impl StreamStatus {
    pub fn reset(&mut self) {
        self.data = 0;
        self.bits = 0;
        self.buffer.clear();
    }
}

impl NfcB {
    /// Decode poll-side symbols into a frame
    ///
    /// Returns `true` when a frame was emitted. Returns `false` when the
    /// buffer drained mid-frame (state persists) or the frame was discarded
    /// for carrying no bytes.
    pub(crate) fn decode_poll_frame(
        &mut self,
        decoder: &mut DecoderStatus,
        buffer: &mut SampleBuffer<'_>,
        frames: &mut Vec<NfcFrame>,
    ) -> bool {
        let Some(rate) = decoder.selected else {
            return false;
        };

        let bitrate = self.bitrate_params[rate.index()];

        loop {
            let Some(pattern) = symbol::decode_poll_symbol(
                &bitrate,
                &mut self.modulation_status[rate.index()],
                &mut self.symbol_status,
                decoder,
                buffer,
                self.minimum_modulation_threshold,
            ) else {
                // buffer drained, resume on the next call
                return false;
            };

            let mut frame_end = false;
            let mut stream_error = false;
            let mut truncate_error = false;

            let stream = &mut self.stream_status;

            // ten consecutive lows end the frame
            if stream.bits == 9 && stream.data == 0 && pattern == Pattern::L {
                frame_end = true;
            }
            // start bit must be L, stop bit must be H
            else if (stream.bits == 0 && pattern == Pattern::H)
                || (stream.bits == 9 && pattern == Pattern::L)
            {
                stream_error = true;
            }
            // frame size limit reached before an EOF showed up
            else if stream.buffer.len() == self.protocol_status.max_frame_size {
                truncate_error = true;
            }

            if frame_end || stream_error || truncate_error {
                // a valid frame carries at least one byte
                if !stream.buffer.is_empty() {
                    self.frame_status.frame_end = self.symbol_status.end;

                    let mut response = NfcFrame::new(TechType::NfcB, FrameType::PollFrame);
                    response.frame_rate = bitrate.symbols_per_second;
                    response.sample_start = self.frame_status.frame_start;
                    response.sample_end = self.frame_status.frame_end;
                    response.time_start =
                        self.frame_status.frame_start as f64 / decoder.sample_rate as f64;
                    response.time_end =
                        self.frame_status.frame_end as f64 / decoder.sample_rate as f64;

                    if truncate_error || stream_error {
                        response.set_frame_flags(flags::TRUNCATED);
                    }

                    response.data = std::mem::take(&mut stream.buffer);
                    stream.reset();

                    // quiet baseline for the next frame search
                    self.modulation_status[rate.index()].clear_symbols();

                    debug!(
                        bytes = response.data.len() as u64,
                        truncated = response.has_frame_flags(flags::TRUNCATED),
                        "poll frame decoded"
                    );

                    self.process(decoder, &mut response);

                    frames.push(response);

                    return true;
                }

                // nothing accumulated, restart the frame search
                self.reset_modulation(decoder);

                return false;
            }

            if stream.bits < 9 {
                // data bits assemble LSB first behind the start bit
                if stream.bits > 0 {
                    stream.data |= self.symbol_status.value << (stream.bits - 1);
                }
                stream.bits += 1;
            } else {
                // valid stop bit closes the character
                stream.buffer.push(stream.data);
                stream.data = 0;
                stream.bits = 0;
            }
        }
    }
}
