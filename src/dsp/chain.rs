//! Per-band processing chain
//!
//! Each band runs a fixed, tagged list of stages:
//! 1. Saturate (oversampled waveshaper)
//! 2. Compress (keyed by the band's dry signal or the external key bus)

use super::compressor::Compressor;
use super::oversampling::OversamplingFactor;
use super::saturation::Saturator;
use crate::engine::{AudioBuffer, ProcessSpec};
use crate::params::BandParameters;

/// A processing step in a band's chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BandStage {
    Saturate = 0,
    Compress = 1,
}

impl BandStage {
    /// Stage order used by every band
    pub const ORDER: [BandStage; 2] = [BandStage::Saturate, BandStage::Compress];

    pub fn display_name(&self) -> &'static str {
        match self {
            BandStage::Saturate => "Saturation",
            BandStage::Compress => "Compression",
        }
    }
}

/// Saturator and compressor of one band
#[derive(Debug, Clone)]
pub struct BandChain {
    saturator: Saturator,
    compressor: Compressor,
}

impl BandChain {
    pub fn new(factor: OversamplingFactor) -> Self {
        let mut compressor = Compressor::new();
        compressor.set_sidechain_mode(true);
        compressor.apply_parameters(&BandParameters::default());

        let mut saturator = Saturator::new(factor);
        saturator.set_drive(BandParameters::default().drive);

        Self {
            saturator,
            compressor,
        }
    }

    pub fn prepare(&mut self, spec: &ProcessSpec, factor: OversamplingFactor) {
        self.saturator.prepare(spec, factor);
        self.compressor.prepare(spec);
    }

    pub fn reset(&mut self) {
        self.saturator.reset();
        self.compressor.reset();
    }

    /// Push one band's controls into its stages
    pub fn apply_parameters(&mut self, params: &BandParameters) {
        self.saturator.set_drive(params.drive);
        self.compressor.apply_parameters(params);
        // The engine always chooses the detector input
        self.compressor.set_sidechain_mode(true);
    }

    /// Delay the chain adds to the band, in samples
    pub fn latency(&self) -> usize {
        self.saturator.latency()
    }

    pub fn gain_reduction_db(&self) -> f32 {
        self.compressor.gain_reduction_db()
    }

    pub fn saturator_mut(&mut self) -> &mut Saturator {
        &mut self.saturator
    }

    pub fn compressor(&self) -> &Compressor {
        &self.compressor
    }

    /// Run every stage on `buffer` in order, detecting on `key`
    pub fn process(&mut self, buffer: &mut AudioBuffer, key: &AudioBuffer) {
        for stage in BandStage::ORDER {
            match stage {
                BandStage::Saturate => self.saturator.process_block(buffer),
                BandStage::Compress => self.compressor.process_block(buffer, Some(key)),
            }
        }
    }
}
