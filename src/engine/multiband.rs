//! Four-band compressor engine
//!
//! Per block: input trim, four-way split, per-band saturate and compress,
//! dry/wet blend, solo gating, sum, optional null reference, output trim.
//!
//! Paths that skip the oversampled saturator (dry bands, the external key
//! and the null reference) are delayed by the saturator's latency so the
//! summed signals stay sample-aligned.

use super::buffer::{AudioBuffer, ProcessSpec};
use crate::dsp::{BandChain, CrossoverNetwork, DelayLine, OversamplingFactor, ShapingCurve};
use crate::error::{QuadbandError, Result};
use crate::params::{ParameterSnapshot, SharedParameters, NUM_BANDS};
use std::sync::Arc;
use tracing::{debug, info};

/// Multiband compressor with per-band saturation and sidechain keying
///
/// Controls live in a shared [`SharedParameters`] store that may be written
/// from any thread; the engine reads it once per block.
///
/// # Example
/// ```
/// use quadband::engine::{AudioBuffer, MultibandEngine};
/// use quadband::params::SharedParameters;
/// use std::sync::Arc;
///
/// let params = Arc::new(SharedParameters::new());
/// let mut engine = MultibandEngine::new(Arc::clone(&params));
/// engine.prepare(48000.0, 512, 2).unwrap();
///
/// params.band(0).unwrap().set_threshold_db(-24.0);
/// let mut block = AudioBuffer::new(2, 512);
/// engine.process_block(&mut block, None);
/// ```
#[derive(Debug)]
pub struct MultibandEngine {
    params: Arc<SharedParameters>,
    oversampling: OversamplingFactor,
    spec: Option<ProcessSpec>,
    latency: usize,

    crossover: CrossoverNetwork,
    chains: [BandChain; NUM_BANDS],
    dry_delays: [DelayLine; NUM_BANDS],
    key_delay: DelayLine,
    reference_delay: DelayLine,
    /// External keying state of the previous block
    keyed_externally: bool,

    bands: [AudioBuffer; NUM_BANDS],
    dry: [AudioBuffer; NUM_BANDS],
    key: AudioBuffer,
    reference: AudioBuffer,
}

impl MultibandEngine {
    /// Engine with 2× oversampled saturation
    pub fn new(params: Arc<SharedParameters>) -> Self {
        Self::with_oversampling(params, OversamplingFactor::default())
    }

    pub fn with_oversampling(params: Arc<SharedParameters>, oversampling: OversamplingFactor) -> Self {
        let [f1, f2, f3] = params.snapshot().global.cutoffs();
        Self {
            params,
            oversampling,
            spec: None,
            latency: 0,
            crossover: CrossoverNetwork::new(f1, f2, f3),
            chains: std::array::from_fn(|_| BandChain::new(oversampling)),
            dry_delays: Default::default(),
            key_delay: DelayLine::new(),
            reference_delay: DelayLine::new(),
            keyed_externally: false,
            bands: Default::default(),
            dry: Default::default(),
            key: AudioBuffer::default(),
            reference: AudioBuffer::default(),
        }
    }

    /// Handle to the parameter store
    pub fn params(&self) -> Arc<SharedParameters> {
        Arc::clone(&self.params)
    }

    pub fn oversampling(&self) -> OversamplingFactor {
        self.oversampling
    }

    /// Choose the oversampling factor; takes effect at the next `prepare`
    pub fn set_oversampling(&mut self, factor: OversamplingFactor) {
        self.oversampling = factor;
    }

    /// Spec the engine was last prepared with
    pub fn spec(&self) -> Option<ProcessSpec> {
        self.spec
    }

    /// Allocate every buffer and filter state for the host's stream
    ///
    /// # Errors
    /// `InvalidSpec` if any argument is zero or the sample rate is not finite.
    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize, num_channels: usize) -> Result<()> {
        let spec = ProcessSpec::new(sample_rate, max_block_size, num_channels)?;
        self.prepare_with_spec(&spec);
        Ok(())
    }

    /// [`prepare`](Self::prepare) with an already validated spec
    pub fn prepare_with_spec(&mut self, spec: &ProcessSpec) {
        let snapshot = self.params.snapshot();
        let [f1, f2, f3] = snapshot.global.cutoffs();
        self.crossover.set_cutoffs(f1, f2, f3);
        self.crossover.prepare(spec);

        for (chain, params) in self.chains.iter_mut().zip(snapshot.bands.iter()) {
            chain.prepare(spec, self.oversampling);
            chain.apply_parameters(params);
        }
        self.latency = self.chains[0].latency();

        for delay in &mut self.dry_delays {
            delay.prepare(spec, self.latency);
        }
        self.key_delay.prepare(spec, self.latency);
        self.reference_delay.prepare(spec, self.latency);
        self.keyed_externally = false;

        let new_buffer = || AudioBuffer::new(spec.num_channels, spec.max_block_size);
        self.bands = std::array::from_fn(|_| new_buffer());
        self.dry = std::array::from_fn(|_| new_buffer());
        self.key = new_buffer();
        self.reference = new_buffer();

        self.spec = Some(*spec);
        info!(
            sample_rate = spec.sample_rate,
            max_block_size = spec.max_block_size,
            num_channels = spec.num_channels,
            oversampling = self.oversampling.factor(),
            latency = self.latency,
            "multiband engine prepared"
        );
    }

    /// Clear all filter, detector and delay state
    pub fn reset(&mut self) {
        self.crossover.reset();
        for chain in &mut self.chains {
            chain.reset();
        }
        for delay in &mut self.dry_delays {
            delay.reset();
        }
        self.key_delay.reset();
        self.reference_delay.reset();
        self.keyed_externally = false;
        debug!("multiband engine reset");
    }

    /// Processing delay to report to the host, in samples
    pub fn latency_samples(&self) -> usize {
        self.latency
    }

    /// Most recent smoothed gain reduction of a band, in dB
    pub fn band_gain_reduction_db(&self, band: usize) -> Result<f32> {
        self.chains
            .get(band)
            .map(BandChain::gain_reduction_db)
            .ok_or(QuadbandError::BandOutOfRange { index: band })
    }

    /// Replace a band's waveshaping curve
    pub fn set_shaping_curve(&mut self, band: usize, curve: ShapingCurve) -> Result<()> {
        let chain = self
            .chains
            .get_mut(band)
            .ok_or(QuadbandError::BandOutOfRange { index: band })?;
        chain.saturator_mut().set_curve(curve);
        Ok(())
    }

    /// Process one block in place
    ///
    /// `sidechain` is the external key bus. It is only read when the external
    /// sidechain control is on; without it the trimmed main input keys every
    /// band. A sidechain with fewer channels than the main bus repeats its
    /// last channel.
    ///
    /// # Panics
    /// Panics if the engine is not prepared, if `main` does not have the
    /// prepared channel count, if it is longer than the prepared maximum
    /// block, or if `sidechain` differs from `main` in length.
    pub fn process_block(&mut self, main: &mut AudioBuffer, sidechain: Option<&AudioBuffer>) {
        let spec = match self.spec {
            Some(spec) => spec,
            None => panic!("process_block called before prepare"),
        };
        assert_eq!(main.channels(), spec.num_channels, "main bus channel count");
        assert!(
            main.len() <= spec.max_block_size,
            "block of {} samples exceeds prepared maximum of {}",
            main.len(),
            spec.max_block_size
        );
        if main.is_empty() {
            return;
        }

        let snapshot = self.params.snapshot();
        self.update_stages(&snapshot);
        let global = &snapshot.global;

        main.apply_gain(global.input_trim_db);

        if global.external_sidechain {
            // The delay only runs while keyed externally; drop what it held
            // from the last time external keying was on
            if !self.keyed_externally {
                self.key_delay.reset();
            }
            self.load_key(main, sidechain);
            self.key_delay.process_block(&mut self.key);
        }
        self.keyed_externally = global.external_sidechain;

        self.crossover.process_block(main, &mut self.bands);
        self.crossover.process_reference(main, &mut self.reference);
        self.reference_delay.process_block(&mut self.reference);

        for b in 0..NUM_BANDS {
            self.dry[b].copy_from(&self.bands[b]);
            self.dry_delays[b].process_block(&mut self.dry[b]);

            let key = if global.external_sidechain {
                &self.key
            } else {
                &self.dry[b]
            };
            self.chains[b].process(&mut self.bands[b], key);
        }

        let wet = global.mix;
        main.clear();
        for b in (0..NUM_BANDS).filter(|&b| snapshot.band_contributes(b)) {
            main.add_scaled_from(&self.bands[b], wet);
            main.add_scaled_from(&self.dry[b], 1.0 - wet);
        }
        if global.null_test {
            main.add_scaled_from(&self.reference, 1.0);
        }

        main.apply_gain(global.output_trim_db);
    }

    fn update_stages(&mut self, snapshot: &ParameterSnapshot) {
        let [f1, f2, f3] = snapshot.global.cutoffs();
        self.crossover.set_cutoffs(f1, f2, f3);
        for (chain, params) in self.chains.iter_mut().zip(snapshot.bands.iter()) {
            chain.apply_parameters(params);
        }
    }

    /// Fill the key bus from the sidechain, or from the main input without one
    fn load_key(&mut self, main: &AudioBuffer, sidechain: Option<&AudioBuffer>) {
        let source = match sidechain {
            Some(sc) if sc.channels() > 0 => sc,
            _ => main,
        };
        assert_eq!(source.len(), main.len(), "sidechain block length");

        self.key.set_len(main.len());
        let last = source.channels() - 1;
        for ch in 0..self.key.channels() {
            self.key
                .channel_mut(ch)
                .copy_from_slice(source.channel(ch.min(last)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn engine(factor: OversamplingFactor) -> (Arc<SharedParameters>, MultibandEngine) {
        let params = Arc::new(SharedParameters::new());
        let mut engine = MultibandEngine::with_oversampling(Arc::clone(&params), factor);
        engine.prepare(48000.0, 256, 2).unwrap();
        (params, engine)
    }

    #[test]
    fn test_prepare_rejects_invalid_spec() {
        let mut engine = MultibandEngine::new(Arc::new(SharedParameters::new()));
        assert!(engine.prepare(0.0, 256, 2).is_err());
        assert!(engine.prepare(48000.0, 0, 2).is_err());
        assert!(engine.prepare(48000.0, 256, 0).is_err());
        assert!(engine.spec().is_none());
    }

    #[test]
    fn test_latency_reported() {
        let (_, engine) = engine(OversamplingFactor::X4);
        assert_eq!(engine.latency_samples(), 24);
        let (_, engine) = engine_x1();
        assert_eq!(engine.latency_samples(), 0);
    }

    fn engine_x1() -> (Arc<SharedParameters>, MultibandEngine) {
        engine(OversamplingFactor::X1)
    }

    #[test]
    #[should_panic(expected = "channel count")]
    fn test_channel_mismatch_panics() {
        let (_, mut engine) = engine_x1();
        let mut block = AudioBuffer::new(1, 64);
        engine.process_block(&mut block, None);
    }

    #[test]
    #[should_panic(expected = "exceeds prepared maximum")]
    fn test_oversized_block_panics() {
        let (_, mut engine) = engine_x1();
        let mut block = AudioBuffer::new(2, 257);
        engine.process_block(&mut block, None);
    }

    #[test]
    #[should_panic(expected = "before prepare")]
    fn test_unprepared_panics() {
        let mut engine = MultibandEngine::new(Arc::new(SharedParameters::new()));
        let mut block = AudioBuffer::new(2, 64);
        engine.process_block(&mut block, None);
    }

    #[test]
    fn test_silence_in_silence_out() {
        let (_, mut engine) = engine(OversamplingFactor::X2);
        let mut block = AudioBuffer::new(2, 256);
        engine.process_block(&mut block, None);
        assert!(block.channel(0).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_output_trim() {
        let (params, mut engine) = engine_x1();
        params.set_mix(0.0);
        params.set_output_trim_db(-96.0);
        let mut block = AudioBuffer::from_channels(vec![vec![0.5; 256], vec![0.5; 256]], 48000).unwrap();
        engine.process_block(&mut block, None);
        assert!(block.peak_db() < -90.0);
    }

    #[test]
    fn test_band_gain_reduction_range() {
        let (_, engine) = engine_x1();
        assert_eq!(engine.band_gain_reduction_db(3).unwrap(), 0.0);
        assert!(engine.band_gain_reduction_db(4).is_err());
    }

    #[test]
    fn test_mono_sidechain_keys_stereo_main() {
        let (params, mut engine) = engine_x1();
        params.set_external_sidechain(true);
        for b in 0..NUM_BANDS {
            let band = params.band(b).unwrap();
            band.set_threshold_db(-40.0);
            band.set_ratio(10.0);
            band.set_attack_ms(1.0);
        }

        let mut main = AudioBuffer::from_channels(vec![vec![0.01; 256], vec![0.01; 256]], 48000).unwrap();
        let key: Vec<f32> = (0..256)
            .map(|i| (2.0 * std::f32::consts::PI * 100.0 * i as f32 / 48000.0).sin())
            .collect();
        let sidechain = AudioBuffer::from_channels(vec![key], 48000).unwrap();
        engine.process_block(&mut main, Some(&sidechain));

        assert!(engine.band_gain_reduction_db(0).unwrap() > 10.0);
    }

    #[test]
    fn test_external_without_bus_uses_main() {
        let (params, mut engine) = engine_x1();
        params.set_external_sidechain(true);
        let band = params.band(0).unwrap();
        band.set_threshold_db(-30.0);
        band.set_attack_ms(1.0);

        let tone: Vec<f32> = (0..256)
            .map(|i| (2.0 * std::f32::consts::PI * 60.0 * i as f32 / 48000.0).sin())
            .collect();
        let mut main = AudioBuffer::from_channels(vec![tone.clone(), tone], 48000).unwrap();
        engine.process_block(&mut main, None);
        assert!(engine.band_gain_reduction_db(0).unwrap() > 5.0);
    }

    #[test]
    fn test_reenabled_sidechain_forgets_old_key() {
        let params = Arc::new(SharedParameters::new());
        let mut engine = MultibandEngine::with_oversampling(Arc::clone(&params), OversamplingFactor::X8);
        engine.prepare(48000.0, 64, 1).unwrap();
        for b in 0..NUM_BANDS {
            let band = params.band(b).unwrap();
            band.set_threshold_db(-40.0);
            band.set_ratio(20.0);
            band.set_attack_ms(1.0);
            band.set_release_ms(10.0);
        }

        let silent = AudioBuffer::new(1, 64);
        let loud_key = AudioBuffer::from_channels(vec![vec![1.0; 64]], 48000).unwrap();

        // Keyed by a full-scale DC sidechain, so the key delay fills with 1.0
        params.set_external_sidechain(true);
        let mut main = silent.clone();
        engine.process_block(&mut main, Some(&loud_key));
        assert!(engine.band_gain_reduction_db(0).unwrap() > 10.0);

        // Long enough for every detector to release fully
        params.set_external_sidechain(false);
        for _ in 0..200 {
            let mut main = silent.clone();
            engine.process_block(&mut main, None);
        }
        for b in 0..NUM_BANDS {
            assert!(engine.band_gain_reduction_db(b).unwrap() < 0.01);
        }

        params.set_external_sidechain(true);
        let mut main = silent.clone();
        engine.process_block(&mut main, Some(&silent));
        for b in 0..NUM_BANDS {
            let reduction = engine.band_gain_reduction_db(b).unwrap();
            assert!(reduction < 0.01, "band {} reduced by {} dB", b, reduction);
        }
    }

    #[test]
    fn test_mix_zero_null_with_oversampling() {
        let (params, mut engine) = engine(OversamplingFactor::X2);
        params.set_mix(0.0);
        params.set_null_test(true);
        for b in 0..NUM_BANDS {
            params.band(b).unwrap().set_drive(10.0);
        }

        for block_index in 0..8 {
            let signal: Vec<f32> = (0..256)
                .map(|i| {
                    let n = (block_index * 256 + i) as f32;
                    0.5 * (n * 0.37).sin() + 0.3 * (n * 0.011).sin()
                })
                .collect();
            let mut block =
                AudioBuffer::from_channels(vec![signal.clone(), signal], 48000).unwrap();
            engine.process_block(&mut block, None);
            assert!(block.peak_db() < -80.0, "residual {} dBFS", block.peak_db());
        }
    }

    #[test]
    fn test_shaping_curve_per_band() {
        let (_, mut engine) = engine_x1();
        assert!(engine
            .set_shaping_curve(1, ShapingCurve::Transfer(Default::default()))
            .is_ok());
        assert!(engine.set_shaping_curve(4, ShapingCurve::Tanh).is_err());
    }

    #[test]
    fn test_reset_clears_tail() {
        let (params, mut engine) = engine(OversamplingFactor::X2);
        params.set_mix(0.5);
        let mut loud = AudioBuffer::from_channels(vec![vec![0.8; 256], vec![-0.8; 256]], 48000).unwrap();
        engine.process_block(&mut loud, None);
        engine.reset();
        let mut silent = AudioBuffer::new(2, 256);
        engine.process_block(&mut silent, None);
        assert!(silent.iter_channels().flatten().all(|&s| s == 0.0));
    }

    #[test]
    fn test_solo_mutes_other_bands() {
        let (params, mut engine) = engine_x1();
        params.set_mix(0.0);
        params.band(3).unwrap().set_solo(true);

        // 100 Hz sits far below the high band's 6 kHz split
        let tone: Vec<f32> = (0..256)
            .map(|i| (2.0 * std::f32::consts::PI * 100.0 * i as f32 / 48000.0).sin())
            .collect();
        let mut block = AudioBuffer::from_channels(vec![tone.clone(), tone], 48000).unwrap();
        engine.process_block(&mut block, None);
        assert!(block.peak_db() < -20.0);
        assert_relative_eq!(engine.band_gain_reduction_db(3).unwrap(), 0.0);
    }
}
