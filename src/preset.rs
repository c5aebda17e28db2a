//! Presets and engine configuration
//!
//! A preset is a named [`ParameterSnapshot`] stored as JSON. Loading clamps
//! every value into range and logs what was changed, so hand-edited files
//! never put the engine out of its domain.

use crate::dsp::OversamplingFactor;
use crate::error::Result;
use crate::params::{ParameterSnapshot, SharedParameters};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Default host block size for offline rendering
pub const DEFAULT_BLOCK_SIZE: usize = 512;

/// Named set of parameter values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(default)]
    pub snapshot: ParameterSnapshot,
}

impl Default for Preset {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            snapshot: ParameterSnapshot::default(),
        }
    }
}

impl Preset {
    pub fn new(name: impl Into<String>, snapshot: ParameterSnapshot) -> Self {
        Self {
            name: name.into(),
            snapshot,
        }
    }

    /// Capture the current contents of a parameter store
    pub fn capture(name: impl Into<String>, params: &SharedParameters) -> Self {
        Self::new(name, params.snapshot())
    }

    /// Parse a preset from JSON, clamping out-of-range values
    pub fn from_json(json: &str) -> Result<Self> {
        let mut preset: Preset = serde_json::from_str(json)?;
        if let Err(e) = preset.snapshot.validate() {
            warn!(preset = %preset.name, "clamping out-of-range preset values: {}", e);
            preset.snapshot.clamp();
        }
        Ok(preset)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a preset file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let preset = Self::from_json(&json)?;
        info!(name = %preset.name, path = %path.display(), "loaded preset");
        Ok(preset)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        info!(name = %self.name, path = %path.display(), "saved preset");
        Ok(())
    }

    /// Write every value into a parameter store
    pub fn apply(&self, params: &SharedParameters) {
        params.apply_snapshot(&self.snapshot);
    }
}

/// Settings fixed at `prepare` time rather than per block
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub oversampling: OversamplingFactor,
    pub block_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            oversampling: OversamplingFactor::default(),
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vocal.json");

        let mut snapshot = ParameterSnapshot::default();
        snapshot.bands[1].threshold_db = -18.0;
        snapshot.bands[1].ballistics = crate::dsp::Ballistics::Fast;
        snapshot.global.mix = 0.75;
        let preset = Preset::new("Vocal", snapshot);

        preset.save(&path).unwrap();
        assert_eq!(Preset::load(&path).unwrap(), preset);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let json = r#"{
            "name": "Hot",
            "snapshot": {
                "global": { "mix": 3.0, "low_crossover_hz": 5.0 }
            }
        }"#;
        let preset = Preset::from_json(json).unwrap();
        assert_eq!(preset.snapshot.global.mix, 1.0);
        assert_eq!(preset.snapshot.global.low_crossover_hz, 20.0);
        assert_eq!(preset.snapshot.global.mid_crossover_hz, 2000.0);
        assert!(preset.snapshot.validate().is_ok());
    }

    #[test]
    fn test_malformed_json() {
        let err = Preset::from_json("{ not json").unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_apply_to_store() {
        let mut snapshot = ParameterSnapshot::default();
        snapshot.bands[0].solo = true;
        let params = SharedParameters::new();
        Preset::new("Solo", snapshot).apply(&params);
        assert!(params.band(0).unwrap().solo());
        assert_eq!(Preset::capture("again", &params).snapshot, snapshot);
    }

    #[test]
    fn test_engine_config_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        let config: EngineConfig = serde_json::from_str(r#"{"oversampling": 8}"#).unwrap();
        assert_eq!(config.oversampling, OversamplingFactor::X8);
        assert_eq!(config.block_size, DEFAULT_BLOCK_SIZE);
    }
}
