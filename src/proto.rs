//! NFC air-interface constants.
//!
//! Timing factors are expressed in carrier cycles (1/fc); multiply by
//! `SignalParams::sample_time_unit` to convert to samples at the configured
//! sample rate.

/// Frequency of the operating field (carrier frequency) in Hz
pub const NFC_FC: f64 = 13.56e6;

/// Elementary time unit in seconds (128 carrier cycles, one bit period at 106 kbps)
pub const NFC_ETU: f64 = 128.0 / NFC_FC;

/// NFC-B REQB/WUPB command code
pub const NFCB_REQB: u8 = 0x05;

/// NFC-B default Start-up Frame Guard Time, SFGT = 256 x 16 x (2 ^ SFGI), SFGI = 0
pub const NFCB_SFGT_DEF: u32 = 256 * 16;

/// NFC-B default Frame Waiting Time, FWT = 256 x 16 x (2 ^ FWI), FWI = 4
pub const NFCB_FWT_DEF: u32 = 256 * 16 * (1 << 4);

/// NFC-B frame guard time between the end of a PCD transmission and the
/// start of the PICC response (TR0min as decoded, 128 x 7)
pub const NFCB_FGT_DEF: u32 = 128 * 7;

/// NFC-B default Request Guard Time, minimum time between the start bits of
/// two consecutive REQB commands
pub const NFCB_RGT_DEF: u32 = 7000;

/// NFC-B maximum Frame Waiting Time for the ATQB response (128 x 18)
pub const NFCB_FWT_ATQB: u32 = 128 * 18;
