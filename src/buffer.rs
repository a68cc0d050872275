//! Caller-supplied window of baseband samples
//!
//! The decoder pulls samples one at a time through
//! [`DecoderStatus::next_sample`](crate::status::DecoderStatus::next_sample);
//! a drained buffer is the only way a decode call returns control to the
//! caller mid-frame. All decoder state survives the return, so decoding
//! resumes seamlessly with the next buffer.

/// Read cursor over a block of real-valued envelope samples
#[derive(Debug)]
pub struct SampleBuffer<'a> {
    samples: &'a [f32],
    position: usize,
}

impl<'a> SampleBuffer<'a> {
    pub fn new(samples: &'a [f32]) -> Self {
        Self { samples, position: 0 }
    }

    /// Take the next sample, or `None` when the buffer is drained
    pub fn pull(&mut self) -> Option<f32> {
        let value = self.samples.get(self.position).copied()?;
        self.position += 1;
        Some(value)
    }

    /// Samples not yet consumed
    pub fn remaining(&self) -> usize {
        self.samples.len() - self.position
    }
}
