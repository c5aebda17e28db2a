//! Fixed integer delay
//!
//! Used to hold signals that bypass the oversampler back by the oversampler's
//! latency, so every path summed by the engine lines up sample for sample.

use crate::engine::{AudioBuffer, ProcessSpec};

/// Per-channel circular delay of a whole number of samples
#[derive(Debug, Clone, Default)]
pub struct DelayLine {
    delay: usize,
    /// One ring of `delay` samples per channel
    rings: Vec<Vec<f32>>,
    pos: usize,
}

impl DelayLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate rings for `delay_samples` on every channel; clears history
    pub fn prepare(&mut self, spec: &ProcessSpec, delay_samples: usize) {
        self.delay = delay_samples;
        self.rings = vec![vec![0.0; delay_samples]; spec.num_channels];
        self.pos = 0;
    }

    pub fn reset(&mut self) {
        for ring in &mut self.rings {
            ring.fill(0.0);
        }
        self.pos = 0;
    }

    /// Delay in samples
    pub fn delay(&self) -> usize {
        self.delay
    }

    /// Delay a block in place
    ///
    /// # Panics
    /// Panics if the buffer has more channels than were prepared.
    pub fn process_block(&mut self, buffer: &mut AudioBuffer) {
        if self.delay == 0 {
            return;
        }

        let start = self.pos;
        for ch in 0..buffer.channels() {
            let ring = &mut self.rings[ch];
            let mut pos = start;
            for sample in buffer.channel_mut(ch).iter_mut() {
                let delayed = ring[pos];
                ring[pos] = *sample;
                *sample = delayed;
                pos += 1;
                if pos == self.delay {
                    pos = 0;
                }
            }
        }
        self.pos = (start + buffer.len()) % self.delay;
    }
}
