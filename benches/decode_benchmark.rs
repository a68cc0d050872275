//! Benchmark for full detect + decode throughput
//!
//! Measures how fast the pipeline chews through a baseband stream carrying
//! back-to-back poll frames, reported as realtime multiples of the sample
//! rate.

use std::time::Instant;

use rustynfcb::synth::{self, SynthConfig};
use rustynfcb::{crc, DecoderStatus, NfcB, NfcFrame, SampleBuffer};

const SAMPLE_RATE: u32 = 13_560_000;

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

fn main() {
    println!("=== NFC-B decode throughput ===");

    let mut config = SynthConfig::new(SAMPLE_RATE);
    // short carrier gaps between frames keep the stream dense
    config.lead_in_samples = 40 * config.etu_samples();

    let mut reqb = vec![0x05u8, 0x00, 0x00];
    crc::append_crc(&mut reqb);
    let mut block = vec![0x02u8];
    block.extend((0u8..32).map(|i| i.wrapping_mul(37) | 0x55));
    crc::append_crc(&mut block);

    for num_frames in [10usize, 100, 500] {
        let mut samples = vec![1.0f32; SAMPLE_RATE as usize / 50];
        for i in 0..num_frames {
            let payload = if i % 2 == 0 { &reqb } else { &block };
            samples.extend(synth::synthesize_poll_frame(&config, payload).unwrap());
        }
        synth::add_awgn(&mut samples, 1e-4, 99);

        let mut decoder = DecoderStatus::new(SAMPLE_RATE);
        let mut nfcb = NfcB::new();
        nfcb.configure(&mut decoder, SAMPLE_RATE).unwrap();

        let start = Instant::now();
        let frames = drive(&mut nfcb, &mut decoder, &samples);
        let elapsed = start.elapsed();

        let seconds_of_signal = samples.len() as f64 / SAMPLE_RATE as f64;
        let realtime = seconds_of_signal / elapsed.as_secs_f64();

        println!(
            "  {} frames / {:.0}M samples: decoded {} in {:.2?} ({:.1}x realtime)",
            num_frames,
            samples.len() as f64 / 1e6,
            frames.len(),
            elapsed,
            realtime
        );

        assert_eq!(frames.len(), num_frames);
    }
}
