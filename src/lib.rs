//! NFC-B (ISO/IEC 14443-3 Type B) baseband demodulator and frame decoder
//!
//! Consumes a stream of real-valued envelope samples carrying the 13.56 MHz
//! subcarrier envelope and reconstructs poll-side protocol frames: SOF
//! detection over a noisy envelope, bit-clock recovery at 106 kbps, and
//! character framing with REQB/WUPB recognition and CRC-16/B verification.
//!
//! The pipeline is pull-driven over a shared sample ring. While searching,
//! the caller feeds one sample at a time and steps the SOF detector; after
//! a lock, [`NfcB::decode`] pulls the rest of the frame itself:
//!
//! ```
//! use rustynfcb::{crc, synth, DecoderStatus, NfcB, SampleBuffer};
//!
//! let mut decoder = DecoderStatus::new(13_560_000);
//! let mut nfcb = NfcB::new();
//! nfcb.configure(&mut decoder, 13_560_000)?;
//!
//! // REQB command as it appears on the wire
//! let mut payload = vec![0x05, 0x00, 0x00];
//! crc::append_crc(&mut payload);
//! let samples = synth::synthesize_poll_frame(&synth::SynthConfig::new(13_560_000), &payload)?;
//!
//! let mut frames = Vec::new();
//! let mut buffer = SampleBuffer::new(&samples);
//! while buffer.remaining() > 0 {
//!     if decoder.is_locked() {
//!         nfcb.decode(&mut decoder, &mut buffer, &mut frames);
//!     } else if decoder.next_sample(&mut buffer) {
//!         nfcb.detect(&mut decoder);
//!     }
//! }
//!
//! assert_eq!(frames.len(), 1);
//! assert_eq!(frames[0].data, payload);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod bitrate;
pub mod buffer;
pub mod crc;
pub mod decoder;
pub mod frame;
pub mod proto;
pub mod status;
pub mod synth;
pub mod tracing_init;

pub use bitrate::{BitrateParams, RateType};
pub use buffer::SampleBuffer;
pub use decoder::{ConfigureError, NfcB, Pattern, SofStage};
pub use frame::{flags, FramePhase, FrameType, NfcFrame, TechType};
pub use status::{DecoderStatus, SIGNAL_BUFFER_LENGTH};
