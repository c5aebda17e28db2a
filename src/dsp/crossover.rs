//! Linkwitz-Riley crossover network
//!
//! Every filter is a 4th-order Linkwitz-Riley built from two cascaded
//! Butterworth sections in topology-preserving-transform (TPT) state-variable
//! form. Lowpass and highpass of the same cutoff sum to the section's
//! allpass, which makes the four-band split reconstruct to
//! `AP(f1)·AP(f2)·AP(f3)`:
//!
//! | band | path |
//! |---|---|
//! | low | LP(f1) · AP(f2) · AP(f3) |
//! | low-mid | HP(f1) · LP(f2) · AP(f3) |
//! | high-mid | HP(f1) · HP(f2) · LP(f3) |
//! | high | HP(f1) · HP(f2) · HP(f3) |
//!
//! The reference path `−AP(f1)·AP(f2)·AP(f3)` nulls the sum of the bands.

use crate::engine::{AudioBuffer, ProcessSpec};
use crate::params::NUM_BANDS;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, SQRT_2};
use tracing::debug;

/// Highest usable cutoff as a fraction of the sample rate
const MAX_CUTOFF_RATIO: f64 = 0.49;

/// Lowest cutoff accepted by a filter, in Hz
const MIN_CUTOFF_HZ: f32 = 1.0;

/// Response of a [`LinkwitzRiley`] filter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FilterType {
    Lowpass,
    Highpass,
    Allpass,
}

impl FilterType {
    pub fn display_name(&self) -> &'static str {
        match self {
            FilterType::Lowpass => "Low Pass",
            FilterType::Highpass => "High Pass",
            FilterType::Allpass => "All Pass",
        }
    }
}

// ============================================================================
// Linkwitz-Riley Filter
// ============================================================================

/// 4th-order Linkwitz-Riley filter, one state set per channel
#[derive(Debug, Clone)]
pub struct LinkwitzRiley {
    filter_type: FilterType,
    cutoff_hz: f32,
    sample_rate: f64,
    g: f32,
    r2: f32,
    h: f32,
    /// s1, s2 for the first section, s3, s4 for the second
    state: Vec<[f32; 4]>,
}

impl LinkwitzRiley {
    pub fn new(filter_type: FilterType, cutoff_hz: f32) -> Self {
        let mut filter = Self {
            filter_type,
            cutoff_hz,
            sample_rate: 44100.0,
            g: 0.0,
            r2: SQRT_2 as f32,
            h: 0.0,
            state: vec![[0.0; 4]],
        };
        filter.update_coefficients();
        filter
    }

    /// Allocate state for the channels in `spec` and recompute coefficients
    pub fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        self.state = vec![[0.0; 4]; spec.num_channels];
        self.update_coefficients();
    }

    pub fn reset(&mut self) {
        self.state.fill([0.0; 4]);
    }

    /// Set the cutoff; it is limited to just below Nyquist
    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        if cutoff_hz != self.cutoff_hz {
            self.cutoff_hz = cutoff_hz;
            self.update_coefficients();
        }
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    fn update_coefficients(&mut self) {
        let fc = (self.cutoff_hz.max(MIN_CUTOFF_HZ) as f64).min(self.sample_rate * MAX_CUTOFF_RATIO);
        let g = (PI * fc / self.sample_rate).tan();
        self.g = g as f32;
        self.h = (1.0 / (1.0 + SQRT_2 * g + g * g)) as f32;
    }

    /// Filter one sample on one channel
    #[inline]
    pub fn process_sample(&mut self, channel: usize, x: f32) -> f32 {
        let (g, r2, h) = (self.g, self.r2, self.h);
        let s = &mut self.state[channel];

        let y_h = (x - (r2 + g) * s[0] - s[1]) * h;
        let y_b = g * y_h + s[0];
        s[0] = g * y_h + y_b;
        let y_l = g * y_b + s[1];
        s[1] = g * y_b + y_l;

        if self.filter_type == FilterType::Allpass {
            return y_l - r2 * y_b + y_h;
        }

        let x2 = if self.filter_type == FilterType::Lowpass {
            y_l
        } else {
            y_h
        };
        let y_h2 = (x2 - (r2 + g) * s[2] - s[3]) * h;
        let y_b2 = g * y_h2 + s[2];
        s[2] = g * y_h2 + y_b2;
        let y_l2 = g * y_b2 + s[3];
        s[3] = g * y_b2 + y_l2;

        if self.filter_type == FilterType::Lowpass {
            y_l2
        } else {
            y_h2
        }
    }

    /// Filter a block in place
    pub fn process_block(&mut self, buffer: &mut AudioBuffer) {
        for ch in 0..buffer.channels() {
            for sample in buffer.channel_mut(ch).iter_mut() {
                *sample = self.process_sample(ch, *sample);
            }
        }
    }

    /// Flush subnormal state to zero
    pub fn snap_to_zero(&mut self) {
        for s in self.state.iter_mut().flat_map(|s| s.iter_mut()) {
            if s.is_subnormal() {
                *s = 0.0;
            }
        }
    }
}

// ============================================================================
// Crossover Network
// ============================================================================

/// Three-cutoff, four-band split plus inverted allpass reference
#[derive(Debug, Clone)]
pub struct CrossoverNetwork {
    cutoffs: [f32; 3],
    lp1: LinkwitzRiley,
    hp1: LinkwitzRiley,
    low_ap2: LinkwitzRiley,
    low_ap3: LinkwitzRiley,
    lp2: LinkwitzRiley,
    low_mid_ap3: LinkwitzRiley,
    hp2: LinkwitzRiley,
    lp3: LinkwitzRiley,
    hp3: LinkwitzRiley,
    ref_ap1: LinkwitzRiley,
    ref_ap2: LinkwitzRiley,
    ref_ap3: LinkwitzRiley,
}

impl CrossoverNetwork {
    pub fn new(f1: f32, f2: f32, f3: f32) -> Self {
        use FilterType::*;
        Self {
            cutoffs: [f1, f2, f3],
            lp1: LinkwitzRiley::new(Lowpass, f1),
            hp1: LinkwitzRiley::new(Highpass, f1),
            low_ap2: LinkwitzRiley::new(Allpass, f2),
            low_ap3: LinkwitzRiley::new(Allpass, f3),
            lp2: LinkwitzRiley::new(Lowpass, f2),
            low_mid_ap3: LinkwitzRiley::new(Allpass, f3),
            hp2: LinkwitzRiley::new(Highpass, f2),
            lp3: LinkwitzRiley::new(Lowpass, f3),
            hp3: LinkwitzRiley::new(Highpass, f3),
            ref_ap1: LinkwitzRiley::new(Allpass, f1),
            ref_ap2: LinkwitzRiley::new(Allpass, f2),
            ref_ap3: LinkwitzRiley::new(Allpass, f3),
        }
    }

    fn filters_mut(&mut self) -> [&mut LinkwitzRiley; 12] {
        [
            &mut self.lp1,
            &mut self.hp1,
            &mut self.low_ap2,
            &mut self.low_ap3,
            &mut self.lp2,
            &mut self.low_mid_ap3,
            &mut self.hp2,
            &mut self.lp3,
            &mut self.hp3,
            &mut self.ref_ap1,
            &mut self.ref_ap2,
            &mut self.ref_ap3,
        ]
    }

    pub fn prepare(&mut self, spec: &ProcessSpec) {
        for filter in self.filters_mut() {
            filter.prepare(spec);
        }
    }

    pub fn reset(&mut self) {
        for filter in self.filters_mut() {
            filter.reset();
        }
    }

    pub fn cutoffs(&self) -> [f32; 3] {
        self.cutoffs
    }

    /// Move the three split points
    ///
    /// The cutoffs must be strictly increasing. Only filters whose cutoff
    /// changed recompute coefficients; filter state is kept.
    pub fn set_cutoffs(&mut self, f1: f32, f2: f32, f3: f32) {
        debug_assert!(f1 < f2 && f2 < f3, "crossover cutoffs must increase");
        if self.cutoffs == [f1, f2, f3] {
            return;
        }
        debug!(f1, f2, f3, "crossover cutoffs changed");
        self.cutoffs = [f1, f2, f3];

        for filter in [&mut self.lp1, &mut self.hp1, &mut self.ref_ap1] {
            filter.set_cutoff(f1);
        }
        for filter in [&mut self.low_ap2, &mut self.lp2, &mut self.hp2, &mut self.ref_ap2] {
            filter.set_cutoff(f2);
        }
        for filter in [
            &mut self.low_ap3,
            &mut self.low_mid_ap3,
            &mut self.lp3,
            &mut self.hp3,
            &mut self.ref_ap3,
        ] {
            filter.set_cutoff(f3);
        }
    }

    /// Split `input` into four bands, lowest first
    ///
    /// Each band buffer takes the input's length.
    pub fn process_block(&mut self, input: &AudioBuffer, bands: &mut [AudioBuffer; NUM_BANDS]) {
        let [low, low_mid, high_mid, high] = bands;

        low.copy_from(input);
        self.lp1.process_block(low);
        self.low_ap2.process_block(low);
        self.low_ap3.process_block(low);

        // `high` carries the HP(f1) branch until the last split
        high.copy_from(input);
        self.hp1.process_block(high);

        low_mid.copy_from(high);
        self.lp2.process_block(low_mid);
        self.low_mid_ap3.process_block(low_mid);

        self.hp2.process_block(high);
        high_mid.copy_from(high);
        self.lp3.process_block(high_mid);
        self.hp3.process_block(high);

        for filter in self.filters_mut().into_iter().take(9) {
            filter.snap_to_zero();
        }
    }

    /// Write the inverted allpass reference of `input` into `out`
    pub fn process_reference(&mut self, input: &AudioBuffer, out: &mut AudioBuffer) {
        out.copy_from(input);
        self.ref_ap1.process_block(out);
        self.ref_ap2.process_block(out);
        self.ref_ap3.process_block(out);
        out.apply_gain_linear(-1.0);

        self.ref_ap1.snap_to_zero();
        self.ref_ap2.snap_to_zero();
        self.ref_ap3.snap_to_zero();
    }
}

impl Default for CrossoverNetwork {
    fn default() -> Self {
        Self::new(200.0, 2000.0, 6000.0)
    }
}
