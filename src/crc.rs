//! CRC-16/B implementation for NFC-B frames
//!
//! This module implements the 16-bit CRC defined by ISO/IEC 13239 as used in
//! ISO/IEC 14443-3 Type B: polynomial 0x1021 (reflected), initial register
//! 0xFFFF, final inversion, transmitted little-endian after the payload.

use crc::{Algorithm, Crc};

/// CRC-16/B algorithm configuration (ISO/IEC 13239)
const CRC_NFCB_ALG: Algorithm<u16> = Algorithm {
    width: 16,
    poly: 0x1021,
    init: 0xFFFF,
    refin: true,
    refout: true,
    xorout: 0xFFFF,
    check: 0x906E,
    residue: 0xF0B8,
};

/// NFC-B CRC instance
const CRC_NFCB: Crc<u16> = Crc::<u16>::new(&CRC_NFCB_ALG);

/// Calculate the CRC-16/B of a byte sequence
///
/// # Arguments
/// * `data` - Payload bytes, excluding any CRC trailer
///
/// # Returns
/// * `u16` - CRC value; transmit low byte first
///
/// # Example
/// ```
/// use rustynfcb::crc::crc16;
///
/// // REQB command 05 00 00 carries CRC bytes 71 FF on the wire
/// assert_eq!(crc16(&[0x05, 0x00, 0x00]), 0xFF71);
/// ```
pub fn crc16(data: &[u8]) -> u16 {
    CRC_NFCB.checksum(data)
}

/// Check the CRC trailer of a complete frame
///
/// The last two bytes are interpreted as a little-endian CRC-16/B over the
/// preceding bytes. Frames of two bytes or less cannot carry a valid CRC and
/// always fail.
pub fn check_crc(frame: &[u8]) -> bool {
    if frame.len() <= 2 {
        return false;
    }

    let (payload, trailer) = frame.split_at(frame.len() - 2);

    crc16(payload) == u16::from_le_bytes([trailer[0], trailer[1]])
}

/// Append the CRC-16/B trailer to a payload, little-endian
pub fn append_crc(frame: &mut Vec<u8>) {
    let crc = crc16(frame);
    frame.extend_from_slice(&crc.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_value() {
        // standard check input "123456789" for CRC-16/ISO-IEC-14443-3-B
        assert_eq!(crc16(b"123456789"), 0x906E);
    }

    #[test]
    fn test_reqb_vector() {
        // REQB: APf 0x05, AFI 0x00, PARAM 0x00
        assert_eq!(crc16(&[0x05, 0x00, 0x00]), 0xFF71);
        assert!(check_crc(&[0x05, 0x00, 0x00, 0x71, 0xFF]));
    }

    #[test]
    fn test_check_crc_rejects_mutation() {
        assert!(!check_crc(&[0x05, 0x00, 0x00, 0x71, 0xFE]));
        assert!(!check_crc(&[0x05, 0x00, 0x01, 0x71, 0xFF]));
    }

    #[test]
    fn test_short_frames_fail() {
        assert!(!check_crc(&[]));
        assert!(!check_crc(&[0x71]));
        assert!(!check_crc(&[0x71, 0xFF]));
    }

    #[test]
    fn test_append_then_check() {
        let mut frame = vec![0x50, 0x01, 0x02, 0x03, 0x04];
        append_crc(&mut frame);
        assert_eq!(frame.len(), 7);
        assert!(check_crc(&frame));
    }
}
