//! End-to-end decode tests over synthesized NFC-B poll envelopes
//!
//! Each test drives the full pipeline the way a host does: one sample at a
//! time through the SOF detector while searching, then frame decoding once
//! a lock is reported.

use rustynfcb::synth::{self, SynthConfig};
use rustynfcb::{crc, flags, DecoderStatus, FramePhase, NfcB, NfcFrame, SampleBuffer};

const SAMPLE_RATE: u32 = 13_560_000;

/// Run the detect/decode alternation over a block of samples
fn drive(nfcb: &mut NfcB, decoder: &mut DecoderStatus, samples: &[f32]) -> Vec<NfcFrame> {
    let mut frames = Vec::new();
    let mut buffer = SampleBuffer::new(samples);

    while buffer.remaining() > 0 {
        if decoder.is_locked() {
            nfcb.decode(decoder, &mut buffer, &mut frames);
        } else if decoder.next_sample(&mut buffer) {
            nfcb.detect(decoder);
        }
    }

    frames
}

fn setup() -> (NfcB, DecoderStatus) {
    let mut decoder = DecoderStatus::new(SAMPLE_RATE);
    let mut nfcb = NfcB::new();
    nfcb.configure(&mut decoder, SAMPLE_RATE).unwrap();
    (nfcb, decoder)
}

#[test]
fn test_reqb_recognition() {
    let (mut nfcb, mut decoder) = setup();

    // REQB: APf 0x05, AFI 0x00, PARAM 0x00, CRC 71 FF
    let payload = vec![0x05, 0x00, 0x00, 0x71, 0xFF];
    let samples = synth::synthesize_poll_frame(&SynthConfig::new(SAMPLE_RATE), &payload).unwrap();

    let frames = drive(&mut nfcb, &mut decoder, &samples);

    assert_eq!(frames.len(), 1);
    let frame = &frames[0];
    assert!(frame.is_poll_frame());
    assert_eq!(frame.data, payload);
    assert_eq!(frame.phase, FramePhase::SelectionFrame);
    assert!(!frame.has_frame_flags(flags::CRC_ERROR));
    assert_eq!(nfcb.frame_status().last_command, 0x05);

    // REQB narrows the response window to the ATQB deadline
    let sample_time_unit = decoder.signal_params.sample_time_unit;
    let atqb_window = (sample_time_unit * (128 * 18) as f64) as u64;
    assert_eq!(nfcb.frame_status().frame_waiting_time, atqb_window);
    assert!(nfcb.frame_status().waiting_end > nfcb.frame_status().guard_end);
}

#[test]
fn test_crc_failure_passthrough() {
    let (mut nfcb, mut decoder) = setup();

    // same REQB with the last CRC byte mutated
    let payload = vec![0x05, 0x00, 0x00, 0x71, 0xFE];
    let samples = synth::synthesize_poll_frame(&SynthConfig::new(SAMPLE_RATE), &payload).unwrap();

    let frames = drive(&mut nfcb, &mut decoder, &samples);

    assert_eq!(frames.len(), 1);
    let frame = &frames[0];
    assert_eq!(frame.data, payload);
    assert_eq!(frame.phase, FramePhase::SelectionFrame);
    assert!(frame.has_frame_flags(flags::CRC_ERROR));
    assert!(!frame.has_frame_flags(flags::TRUNCATED));
}

#[test]
fn test_generic_frame_is_application_phase() {
    let (mut nfcb, mut decoder) = setup();

    // eight bytes on the wire, not a REQB
    let mut payload = vec![0x02, 0x11, 0x22, 0x33, 0x44, 0x55];
    crc::append_crc(&mut payload);
    assert_eq!(payload.len(), 8);

    let samples = synth::synthesize_poll_frame(&SynthConfig::new(SAMPLE_RATE), &payload).unwrap();
    let frames = drive(&mut nfcb, &mut decoder, &samples);

    assert_eq!(frames.len(), 1);
    let frame = &frames[0];
    assert_eq!(frame.data, payload);
    assert_eq!(frame.phase, FramePhase::ApplicationFrame);
    assert!(!frame.has_frame_flags(flags::CRC_ERROR));
}

#[test]
fn test_truncation_at_max_frame_size() {
    let (mut nfcb, mut decoder) = setup();

    // 257 characters before any EOF; set bits keep the envelope duty high
    // enough that the power average never swallows the notches
    let payload: Vec<u8> = (0u16..257).map(|i| (i as u8) | 0x77).collect();
    assert_eq!(payload.len(), 257);

    let samples = synth::synthesize_poll_frame(&SynthConfig::new(SAMPLE_RATE), &payload).unwrap();
    let frames = drive(&mut nfcb, &mut decoder, &samples);

    assert_eq!(frames.len(), 1);
    let frame = &frames[0];
    assert_eq!(frame.data.len(), 256);
    assert_eq!(frame.data, payload[..256]);
    assert!(frame.has_frame_flags(flags::TRUNCATED));
}

#[test]
fn test_no_sof_in_weak_noise() {
    let (mut nfcb, mut decoder) = setup();

    // no carrier at all: the power average never crosses the gate
    let mut samples = vec![0.0f32; 200_000];
    synth::add_awgn(&mut samples, 0.001, 17);

    let frames = drive(&mut nfcb, &mut decoder, &samples);

    assert!(frames.is_empty());
    assert!(!decoder.is_locked());
    assert!(decoder.power_average < decoder.power_level_threshold);
}

#[test]
fn test_glitch_inside_sof_low_resets_search() {
    let (mut nfcb, mut decoder) = setup();

    let config = SynthConfig::new(SAMPLE_RATE);
    let etu = config.etu_samples();
    let high = config.amplitude;
    let low = config.amplitude * (1.0 - config.depth);

    // a valid SOF shape, except the low is interrupted at 5 ETU by an
    // eighth-symbol carrier burst
    let mut samples = vec![high; config.lead_in_samples];
    samples.extend(vec![low; 5 * etu]);
    samples.extend(vec![high; etu / 8]);
    samples.extend(vec![low; 5 * etu - etu / 8]);
    samples.extend(vec![high; 2 * etu]);
    samples.extend(vec![high; config.tail_samples]);

    let frames = drive(&mut nfcb, &mut decoder, &samples);

    assert!(frames.is_empty());
    assert!(!decoder.is_locked());
    assert_eq!(
        nfcb.modulation_status(rustynfcb::RateType::R106k).search_stage,
        rustynfcb::SofStage::Begin
    );
}

#[test]
fn test_extra_guard_time_truncates_frame() {
    let (mut nfcb, mut decoder) = setup();

    // an extra high symbol after the stop bit lands where the next start
    // bit belongs; the decoder flags the stream error and keeps the bytes
    // it has
    let mut config = SynthConfig::new(SAMPLE_RATE);
    config.extra_guard_etu = 1;

    let samples = synth::synthesize_poll_frame(&config, &[0xA5]).unwrap();
    let frames = drive(&mut nfcb, &mut decoder, &samples);

    assert_eq!(frames.len(), 1);
    let frame = &frames[0];
    assert_eq!(frame.data, vec![0xA5]);
    assert!(frame.has_frame_flags(flags::TRUNCATED));
}

#[test]
fn test_back_to_back_frames() {
    let (mut nfcb, mut decoder) = setup();

    let config = SynthConfig::new(SAMPLE_RATE);

    let reqb = vec![0x05, 0x00, 0x00, 0x71, 0xFF];
    let mut generic = vec![0x02, 0xDE, 0xAD, 0xBE, 0xEF, 0x01];
    crc::append_crc(&mut generic);

    let mut samples = synth::synthesize_poll_frame(&config, &reqb).unwrap();
    samples.extend(synth::synthesize_poll_frame(&config, &generic).unwrap());

    let frames = drive(&mut nfcb, &mut decoder, &samples);

    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].data, reqb);
    assert_eq!(frames[0].phase, FramePhase::SelectionFrame);
    assert_eq!(frames[1].data, generic);
    assert_eq!(frames[1].phase, FramePhase::ApplicationFrame);
    assert!(!frames[1].has_frame_flags(flags::CRC_ERROR));

    // frames arrive in sample order
    assert!(frames[0].sample_end < frames[1].sample_start);
}
