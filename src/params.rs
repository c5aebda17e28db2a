//! Parameter model
//!
//! Plain value structs for the band and global controls, plus the lock-free
//! [`SharedParameters`] store that the control side writes and the audio
//! thread snapshots once per block.
//!
//! Every setter clamps to the ranges below, so the audio path never sees an
//! out-of-domain value. The three crossover ranges are disjoint, which keeps
//! the cutoffs strictly ordered without cross-parameter checks.

use crate::dsp::Ballistics;
use crate::error::{QuadbandError, Result};
use atomic_float::AtomicF32;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Number of bands the engine splits into
pub const NUM_BANDS: usize = 4;

// ============================================================================
// Ranges
// ============================================================================

/// Inclusive range and default of a continuous parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl ParamRange {
    pub const fn new(min: f32, max: f32, default: f32) -> Self {
        Self { min, max, default }
    }

    /// Clamp into the range; NaN maps to the default
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    fn check(&self, param: &str, value: f32, unit: &str) -> Result<()> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(QuadbandError::InvalidParameter {
                param: param.to_string(),
                value: value.to_string(),
                expected: format!("{} to {}{}", self.min, self.max, unit),
            })
        }
    }
}

pub const THRESHOLD_DB: ParamRange = ParamRange::new(-60.0, 12.0, 0.0);
pub const RATIO: ParamRange = ParamRange::new(1.0, 100.0, 4.0);
pub const ATTACK_MS: ParamRange = ParamRange::new(1.0, 300.0, 5.0);
pub const RELEASE_MS: ParamRange = ParamRange::new(1.0, 500.0, 200.0);
pub const KNEE_DB: ParamRange = ParamRange::new(0.0, 72.0, 0.0);
pub const MAKEUP_DB: ParamRange = ParamRange::new(-120.0, 36.0, 0.0);
pub const DRIVE: ParamRange = ParamRange::new(1.0, 10.0, 1.0);

pub const LOW_CROSSOVER_HZ: ParamRange = ParamRange::new(20.0, 999.0, 200.0);
pub const MID_CROSSOVER_HZ: ParamRange = ParamRange::new(1000.0, 3999.0, 2000.0);
pub const HIGH_CROSSOVER_HZ: ParamRange = ParamRange::new(4000.0, 20000.0, 6000.0);
pub const MIX: ParamRange = ParamRange::new(0.0, 1.0, 1.0);
pub const INPUT_TRIM_DB: ParamRange = ParamRange::new(-96.0, 12.0, 0.0);
pub const OUTPUT_TRIM_DB: ParamRange = ParamRange::new(-96.0, 36.0, 0.0);

// ============================================================================
// Value Structs
// ============================================================================

/// Controls of one band's compressor and saturator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandParameters {
    pub threshold_db: f32,
    pub ratio: f32,
    pub attack_ms: f32,
    pub release_ms: f32,
    pub knee_db: f32,
    pub makeup_db: f32,
    pub ballistics: Ballistics,
    /// Skip the compressor; saturation still applies
    pub bypass: bool,
    pub solo: bool,
    /// Saturator drive, 1 is the gentlest setting
    pub drive: f32,
}

impl Default for BandParameters {
    fn default() -> Self {
        Self {
            threshold_db: THRESHOLD_DB.default,
            ratio: RATIO.default,
            attack_ms: ATTACK_MS.default,
            release_ms: RELEASE_MS.default,
            knee_db: KNEE_DB.default,
            makeup_db: MAKEUP_DB.default,
            ballistics: Ballistics::Exponential,
            bypass: false,
            solo: false,
            drive: DRIVE.default,
        }
    }
}

impl BandParameters {
    /// Check every value against its range
    pub fn validate(&self) -> Result<()> {
        THRESHOLD_DB.check("threshold_db", self.threshold_db, " dB")?;
        RATIO.check("ratio", self.ratio, "")?;
        ATTACK_MS.check("attack_ms", self.attack_ms, " ms")?;
        RELEASE_MS.check("release_ms", self.release_ms, " ms")?;
        KNEE_DB.check("knee_db", self.knee_db, " dB")?;
        MAKEUP_DB.check("makeup_db", self.makeup_db, " dB")?;
        DRIVE.check("drive", self.drive, "")?;
        Ok(())
    }

    /// Clamp every value into its range
    pub fn clamp(&mut self) {
        self.threshold_db = THRESHOLD_DB.clamp(self.threshold_db);
        self.ratio = RATIO.clamp(self.ratio);
        self.attack_ms = ATTACK_MS.clamp(self.attack_ms);
        self.release_ms = RELEASE_MS.clamp(self.release_ms);
        self.knee_db = KNEE_DB.clamp(self.knee_db);
        self.makeup_db = MAKEUP_DB.clamp(self.makeup_db);
        self.drive = DRIVE.clamp(self.drive);
    }

    pub fn clamped(mut self) -> Self {
        self.clamp();
        self
    }
}

/// Controls shared by all bands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalParameters {
    pub low_crossover_hz: f32,
    pub mid_crossover_hz: f32,
    pub high_crossover_hz: f32,
    /// Dry/wet blend, 1 is fully processed
    pub mix: f32,
    pub external_sidechain: bool,
    pub input_trim_db: f32,
    pub output_trim_db: f32,
    /// Add the inverted allpass reference to the output
    pub null_test: bool,
}

impl Default for GlobalParameters {
    fn default() -> Self {
        Self {
            low_crossover_hz: LOW_CROSSOVER_HZ.default,
            mid_crossover_hz: MID_CROSSOVER_HZ.default,
            high_crossover_hz: HIGH_CROSSOVER_HZ.default,
            mix: MIX.default,
            external_sidechain: false,
            input_trim_db: INPUT_TRIM_DB.default,
            output_trim_db: OUTPUT_TRIM_DB.default,
            null_test: false,
        }
    }
}

impl GlobalParameters {
    pub fn validate(&self) -> Result<()> {
        LOW_CROSSOVER_HZ.check("low_crossover_hz", self.low_crossover_hz, " Hz")?;
        MID_CROSSOVER_HZ.check("mid_crossover_hz", self.mid_crossover_hz, " Hz")?;
        HIGH_CROSSOVER_HZ.check("high_crossover_hz", self.high_crossover_hz, " Hz")?;
        MIX.check("mix", self.mix, "")?;
        INPUT_TRIM_DB.check("input_trim_db", self.input_trim_db, " dB")?;
        OUTPUT_TRIM_DB.check("output_trim_db", self.output_trim_db, " dB")?;
        Ok(())
    }

    pub fn clamp(&mut self) {
        self.low_crossover_hz = LOW_CROSSOVER_HZ.clamp(self.low_crossover_hz);
        self.mid_crossover_hz = MID_CROSSOVER_HZ.clamp(self.mid_crossover_hz);
        self.high_crossover_hz = HIGH_CROSSOVER_HZ.clamp(self.high_crossover_hz);
        self.mix = MIX.clamp(self.mix);
        self.input_trim_db = INPUT_TRIM_DB.clamp(self.input_trim_db);
        self.output_trim_db = OUTPUT_TRIM_DB.clamp(self.output_trim_db);
    }

    /// The three cutoffs, lowest first
    pub fn cutoffs(&self) -> [f32; 3] {
        [
            self.low_crossover_hz,
            self.mid_crossover_hz,
            self.high_crossover_hz,
        ]
    }
}

/// Plain copy of every parameter, taken once per block
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSnapshot {
    pub bands: [BandParameters; NUM_BANDS],
    pub global: GlobalParameters,
}

impl ParameterSnapshot {
    pub fn validate(&self) -> Result<()> {
        for band in &self.bands {
            band.validate()?;
        }
        self.global.validate()
    }

    pub fn clamp(&mut self) {
        for band in &mut self.bands {
            band.clamp();
        }
        self.global.clamp();
    }

    pub fn any_solo(&self) -> bool {
        self.bands.iter().any(|b| b.solo)
    }

    /// Whether a band reaches the output under the current solo state
    pub fn band_contributes(&self, band: usize) -> bool {
        self.bands[band].solo || !self.any_solo()
    }
}

// ============================================================================
// Shared Store
// ============================================================================

#[derive(Debug)]
struct AtomicBand {
    threshold_db: AtomicF32,
    ratio: AtomicF32,
    attack_ms: AtomicF32,
    release_ms: AtomicF32,
    knee_db: AtomicF32,
    makeup_db: AtomicF32,
    ballistics: AtomicU8,
    bypass: AtomicBool,
    solo: AtomicBool,
    drive: AtomicF32,
}

impl AtomicBand {
    fn new(p: &BandParameters) -> Self {
        Self {
            threshold_db: AtomicF32::new(p.threshold_db),
            ratio: AtomicF32::new(p.ratio),
            attack_ms: AtomicF32::new(p.attack_ms),
            release_ms: AtomicF32::new(p.release_ms),
            knee_db: AtomicF32::new(p.knee_db),
            makeup_db: AtomicF32::new(p.makeup_db),
            ballistics: AtomicU8::new(p.ballistics.index() as u8),
            bypass: AtomicBool::new(p.bypass),
            solo: AtomicBool::new(p.solo),
            drive: AtomicF32::new(p.drive),
        }
    }

    fn load(&self) -> BandParameters {
        BandParameters {
            threshold_db: self.threshold_db.load(Ordering::Acquire),
            ratio: self.ratio.load(Ordering::Acquire),
            attack_ms: self.attack_ms.load(Ordering::Acquire),
            release_ms: self.release_ms.load(Ordering::Acquire),
            knee_db: self.knee_db.load(Ordering::Acquire),
            makeup_db: self.makeup_db.load(Ordering::Acquire),
            ballistics: Ballistics::from_index(self.ballistics.load(Ordering::Acquire) as usize)
                .unwrap_or_default(),
            bypass: self.bypass.load(Ordering::Acquire),
            solo: self.solo.load(Ordering::Acquire),
            drive: self.drive.load(Ordering::Acquire),
        }
    }
}

#[derive(Debug)]
struct AtomicGlobal {
    low_crossover_hz: AtomicF32,
    mid_crossover_hz: AtomicF32,
    high_crossover_hz: AtomicF32,
    mix: AtomicF32,
    external_sidechain: AtomicBool,
    input_trim_db: AtomicF32,
    output_trim_db: AtomicF32,
    null_test: AtomicBool,
}

impl AtomicGlobal {
    fn new(p: &GlobalParameters) -> Self {
        Self {
            low_crossover_hz: AtomicF32::new(p.low_crossover_hz),
            mid_crossover_hz: AtomicF32::new(p.mid_crossover_hz),
            high_crossover_hz: AtomicF32::new(p.high_crossover_hz),
            mix: AtomicF32::new(p.mix),
            external_sidechain: AtomicBool::new(p.external_sidechain),
            input_trim_db: AtomicF32::new(p.input_trim_db),
            output_trim_db: AtomicF32::new(p.output_trim_db),
            null_test: AtomicBool::new(p.null_test),
        }
    }

    fn load(&self) -> GlobalParameters {
        GlobalParameters {
            low_crossover_hz: self.low_crossover_hz.load(Ordering::Acquire),
            mid_crossover_hz: self.mid_crossover_hz.load(Ordering::Acquire),
            high_crossover_hz: self.high_crossover_hz.load(Ordering::Acquire),
            mix: self.mix.load(Ordering::Acquire),
            external_sidechain: self.external_sidechain.load(Ordering::Acquire),
            input_trim_db: self.input_trim_db.load(Ordering::Acquire),
            output_trim_db: self.output_trim_db.load(Ordering::Acquire),
            null_test: self.null_test.load(Ordering::Acquire),
        }
    }
}

/// Lock-free parameter store shared between the control side and the engine
///
/// Share it through an `Arc`; all setters take `&self` and may be called from
/// any thread while the audio thread is processing.
///
/// # Example
/// ```
/// use quadband::params::SharedParameters;
///
/// let params = SharedParameters::new();
/// params.band(1).unwrap().set_ratio(0.5);
/// assert_eq!(params.band(1).unwrap().ratio(), 1.0);
/// ```
#[derive(Debug)]
pub struct SharedParameters {
    bands: [AtomicBand; NUM_BANDS],
    global: AtomicGlobal,
}

impl SharedParameters {
    /// Store holding the default value of every parameter
    pub fn new() -> Self {
        Self::from_snapshot(&ParameterSnapshot::default())
    }

    /// Store initialised from a snapshot; values are clamped on the way in
    pub fn from_snapshot(snapshot: &ParameterSnapshot) -> Self {
        let mut clamped = *snapshot;
        clamped.clamp();
        Self {
            bands: clamped.bands.each_ref().map(AtomicBand::new),
            global: AtomicGlobal::new(&clamped.global),
        }
    }

    /// Overwrite every parameter from a snapshot, clamping each value
    pub fn apply_snapshot(&self, snapshot: &ParameterSnapshot) {
        for (index, band) in snapshot.bands.iter().enumerate() {
            let handle = BandHandle {
                atoms: &self.bands[index],
            };
            handle.set_threshold_db(band.threshold_db);
            handle.set_ratio(band.ratio);
            handle.set_attack_ms(band.attack_ms);
            handle.set_release_ms(band.release_ms);
            handle.set_knee_db(band.knee_db);
            handle.set_makeup_db(band.makeup_db);
            handle.set_ballistics(band.ballistics);
            handle.set_bypass(band.bypass);
            handle.set_solo(band.solo);
            handle.set_drive(band.drive);
        }
        let g = &snapshot.global;
        self.set_low_crossover_hz(g.low_crossover_hz);
        self.set_mid_crossover_hz(g.mid_crossover_hz);
        self.set_high_crossover_hz(g.high_crossover_hz);
        self.set_mix(g.mix);
        self.set_external_sidechain(g.external_sidechain);
        self.set_input_trim_db(g.input_trim_db);
        self.set_output_trim_db(g.output_trim_db);
        self.set_null_test(g.null_test);
    }

    /// Copy every parameter into a plain struct
    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            bands: self.bands.each_ref().map(AtomicBand::load),
            global: self.global.load(),
        }
    }

    /// Handle to one band's controls
    ///
    /// # Errors
    /// `BandOutOfRange` if `index >= NUM_BANDS`.
    pub fn band(&self, index: usize) -> Result<BandHandle<'_>> {
        self.bands
            .get(index)
            .map(|atoms| BandHandle { atoms })
            .ok_or(QuadbandError::BandOutOfRange { index })
    }

    pub fn set_low_crossover_hz(&self, hz: f32) {
        store(&self.global.low_crossover_hz, LOW_CROSSOVER_HZ.clamp(hz));
    }

    pub fn set_mid_crossover_hz(&self, hz: f32) {
        store(&self.global.mid_crossover_hz, MID_CROSSOVER_HZ.clamp(hz));
    }

    pub fn set_high_crossover_hz(&self, hz: f32) {
        store(&self.global.high_crossover_hz, HIGH_CROSSOVER_HZ.clamp(hz));
    }

    pub fn set_mix(&self, mix: f32) {
        store(&self.global.mix, MIX.clamp(mix));
    }

    pub fn set_external_sidechain(&self, enabled: bool) {
        self.global.external_sidechain.store(enabled, Ordering::Release);
    }

    pub fn set_input_trim_db(&self, db: f32) {
        store(&self.global.input_trim_db, INPUT_TRIM_DB.clamp(db));
    }

    pub fn set_output_trim_db(&self, db: f32) {
        store(&self.global.output_trim_db, OUTPUT_TRIM_DB.clamp(db));
    }

    pub fn set_null_test(&self, enabled: bool) {
        self.global.null_test.store(enabled, Ordering::Release);
    }

    pub fn low_crossover_hz(&self) -> f32 {
        self.global.low_crossover_hz.load(Ordering::Acquire)
    }

    pub fn mid_crossover_hz(&self) -> f32 {
        self.global.mid_crossover_hz.load(Ordering::Acquire)
    }

    pub fn high_crossover_hz(&self) -> f32 {
        self.global.high_crossover_hz.load(Ordering::Acquire)
    }

    pub fn mix(&self) -> f32 {
        self.global.mix.load(Ordering::Acquire)
    }

    pub fn external_sidechain(&self) -> bool {
        self.global.external_sidechain.load(Ordering::Acquire)
    }

    pub fn input_trim_db(&self) -> f32 {
        self.global.input_trim_db.load(Ordering::Acquire)
    }

    pub fn output_trim_db(&self) -> f32 {
        self.global.output_trim_db.load(Ordering::Acquire)
    }

    pub fn null_test(&self) -> bool {
        self.global.null_test.load(Ordering::Acquire)
    }
}

impl Default for SharedParameters {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn store(atom: &AtomicF32, value: f32) {
    atom.store(value, Ordering::Release);
}

/// Borrowed view of one band's atomics
#[derive(Debug, Clone, Copy)]
pub struct BandHandle<'a> {
    atoms: &'a AtomicBand,
}

impl BandHandle<'_> {
    pub fn set_threshold_db(&self, db: f32) {
        store(&self.atoms.threshold_db, THRESHOLD_DB.clamp(db));
    }

    pub fn set_ratio(&self, ratio: f32) {
        store(&self.atoms.ratio, RATIO.clamp(ratio));
    }

    pub fn set_attack_ms(&self, ms: f32) {
        store(&self.atoms.attack_ms, ATTACK_MS.clamp(ms));
    }

    pub fn set_release_ms(&self, ms: f32) {
        store(&self.atoms.release_ms, RELEASE_MS.clamp(ms));
    }

    pub fn set_knee_db(&self, db: f32) {
        store(&self.atoms.knee_db, KNEE_DB.clamp(db));
    }

    pub fn set_makeup_db(&self, db: f32) {
        store(&self.atoms.makeup_db, MAKEUP_DB.clamp(db));
    }

    pub fn set_ballistics(&self, mode: Ballistics) {
        self.atoms
            .ballistics
            .store(mode.index() as u8, Ordering::Release);
    }

    /// Select ballistics by control-surface index; out-of-range indices are ignored
    pub fn set_ballistics_index(&self, index: usize) {
        if let Some(mode) = Ballistics::from_index(index) {
            self.set_ballistics(mode);
        }
    }

    pub fn set_bypass(&self, bypass: bool) {
        self.atoms.bypass.store(bypass, Ordering::Release);
    }

    pub fn set_solo(&self, solo: bool) {
        self.atoms.solo.store(solo, Ordering::Release);
    }

    pub fn set_drive(&self, drive: f32) {
        store(&self.atoms.drive, DRIVE.clamp(drive));
    }

    pub fn threshold_db(&self) -> f32 {
        self.atoms.threshold_db.load(Ordering::Acquire)
    }

    pub fn ratio(&self) -> f32 {
        self.atoms.ratio.load(Ordering::Acquire)
    }

    pub fn attack_ms(&self) -> f32 {
        self.atoms.attack_ms.load(Ordering::Acquire)
    }

    pub fn release_ms(&self) -> f32 {
        self.atoms.release_ms.load(Ordering::Acquire)
    }

    pub fn knee_db(&self) -> f32 {
        self.atoms.knee_db.load(Ordering::Acquire)
    }

    pub fn makeup_db(&self) -> f32 {
        self.atoms.makeup_db.load(Ordering::Acquire)
    }

    pub fn ballistics_index(&self) -> usize {
        self.atoms.ballistics.load(Ordering::Acquire) as usize
    }

    pub fn bypass(&self) -> bool {
        self.atoms.bypass.load(Ordering::Acquire)
    }

    pub fn solo(&self) -> bool {
        self.atoms.solo.load(Ordering::Acquire)
    }

    pub fn drive(&self) -> f32 {
        self.atoms.drive.load(Ordering::Acquire)
    }

    /// Read all of this band's values at once
    pub fn get(&self) -> BandParameters {
        self.atoms.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_defaults_are_valid() {
        let snapshot = ParameterSnapshot::default();
        assert!(snapshot.validate().is_ok());
        assert_eq!(snapshot.global.cutoffs(), [200.0, 2000.0, 6000.0]);
        assert_eq!(snapshot.bands[0].ratio, 4.0);
        assert_eq!(snapshot.bands[0].release_ms, 200.0);
    }

    #[test]
    fn test_setters_clamp() {
        let params = SharedParameters::new();
        let band = params.band(0).unwrap();
        band.set_ratio(0.2);
        band.set_knee_db(-3.0);
        band.set_drive(50.0);
        band.set_threshold_db(f32::NAN);
        assert_eq!(band.ratio(), 1.0);
        assert_eq!(band.knee_db(), 0.0);
        assert_eq!(band.drive(), 10.0);
        assert_eq!(band.threshold_db(), 0.0);

        params.set_mix(1.5);
        params.set_low_crossover_hz(5000.0);
        params.set_high_crossover_hz(10.0);
        assert_eq!(params.mix(), 1.0);
        assert_eq!(params.low_crossover_hz(), 999.0);
        assert_eq!(params.high_crossover_hz(), 4000.0);
    }

    #[test]
    fn test_cutoffs_stay_ordered() {
        let params = SharedParameters::new();
        params.set_low_crossover_hz(1.0e6);
        params.set_mid_crossover_hz(0.0);
        params.set_high_crossover_hz(-5.0);
        let [f1, f2, f3] = params.snapshot().global.cutoffs();
        assert!(f1 < f2 && f2 < f3);
    }

    #[test]
    fn test_band_out_of_range() {
        let params = SharedParameters::new();
        let err = params.band(NUM_BANDS).unwrap_err();
        assert_eq!(err.error_code(), "BAND_OUT_OF_RANGE");
    }

    #[test]
    fn test_ballistics_index() {
        let params = SharedParameters::new();
        let band = params.band(3).unwrap();
        band.set_ballistics_index(2);
        assert_eq!(band.get().ballistics, Ballistics::Instant);
        band.set_ballistics_index(9);
        assert_eq!(band.ballistics_index(), 2);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut snapshot = ParameterSnapshot::default();
        snapshot.bands[2].solo = true;
        snapshot.bands[1].threshold_db = -24.0;
        snapshot.global.null_test = true;
        snapshot.global.output_trim_db = 6.0;

        let params = SharedParameters::new();
        params.apply_snapshot(&snapshot);
        assert_eq!(params.snapshot(), snapshot);
        assert_eq!(SharedParameters::from_snapshot(&snapshot).snapshot(), snapshot);
    }

    #[test]
    fn test_validate_reports_parameter() {
        let band = BandParameters {
            attack_ms: 0.0,
            ..Default::default()
        };
        match band.validate() {
            Err(QuadbandError::InvalidParameter { param, .. }) => assert_eq!(param, "attack_ms"),
            other => panic!("expected InvalidParameter, got {:?}", other),
        }
        assert!(band.clamped().validate().is_ok());
    }

    #[test]
    fn test_solo_gating() {
        let mut snapshot = ParameterSnapshot::default();
        assert!((0..NUM_BANDS).all(|b| snapshot.band_contributes(b)));
        snapshot.bands[1].solo = true;
        assert!(snapshot.band_contributes(1));
        assert!(!snapshot.band_contributes(0));
        assert!(!snapshot.band_contributes(3));
    }

    #[test]
    fn test_concurrent_writes() {
        let params = Arc::new(SharedParameters::new());
        let writer = {
            let params = Arc::clone(&params);
            thread::spawn(move || {
                for i in 0..1000 {
                    params.set_mix((i % 100) as f32 / 100.0);
                }
            })
        };
        for _ in 0..1000 {
            let mix = params.snapshot().global.mix;
            assert!((0.0..=1.0).contains(&mix));
        }
        writer.join().unwrap();
    }

    #[test]
    fn test_serde_fills_missing_fields() {
        let band: BandParameters = serde_json::from_str(r#"{"ratio": 8.0}"#).unwrap();
        assert_eq!(band.ratio, 8.0);
        assert_eq!(band.attack_ms, ATTACK_MS.default);
    }
}
