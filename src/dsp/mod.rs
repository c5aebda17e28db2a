//! DSP building blocks
//!
//! Leaf processors used by the multiband engine. Each owns its per-channel
//! state, allocates only in `prepare`, and processes blocks in place.

mod chain;
mod compressor;
mod crossover;
mod delay;
mod envelope;
mod oversampling;
mod saturation;

pub use chain::{BandChain, BandStage};
pub use compressor::{static_curve, Compressor};
pub use crossover::{CrossoverNetwork, FilterType, LinkwitzRiley};
pub use delay::DelayLine;
pub use envelope::{Ballistics, EnvelopeDetector, LevelCalculation};
pub use oversampling::{Oversampler, OversamplingFactor};
pub use saturation::{Saturator, ShapingCurve, TransferCurve, CURVE_POINTS};
