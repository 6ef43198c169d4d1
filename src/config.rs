use crate::mapping::NLAYERS;
use crate::primitive::calo::CaloThresholds;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or validating the trigger configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read trigger config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse trigger config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid trigger config field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Signal discrimination and clock anchoring for the primitive encoders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub high_threshold: f64,
    pub low_threshold: f64,
    pub clocktick_reference_25ns: u32,
    pub clocktick_reference_800ns: u32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            high_threshold: Self::default_high_threshold(),
            low_threshold: Self::default_low_threshold(),
            clocktick_reference_25ns: 0,
            clocktick_reference_800ns: 0,
        }
    }
}

impl EncoderConfig {
    /// High discriminator threshold (MeV).
    pub fn default_high_threshold() -> f64 {
        0.15
    }

    /// Low discriminator threshold (MeV).
    pub fn default_low_threshold() -> f64 {
        0.05
    }

    pub fn thresholds(&self) -> CaloThresholds {
        CaloThresholds {
            low: self.low_threshold,
            high: self.high_threshold,
        }
    }
}

/// Level-one calorimeter trigger knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaloTriggerConfig {
    pub circular_buffer_depth: usize,
    pub threshold_total_multiplicity: u32,
    pub inhibit_single_side_coinc: bool,
    pub inhibit_both_side_coinc: bool,
}

impl Default for CaloTriggerConfig {
    fn default() -> Self {
        Self {
            circular_buffer_depth: 4,
            threshold_total_multiplicity: 1,
            inhibit_single_side_coinc: false,
            inhibit_both_side_coinc: false,
        }
    }
}

/// Level-one tracker trigger knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerTriggerConfig {
    /// Hit layers required in one half of a zone for a track segment.
    pub min_layer_multiplicity: u32,
    /// Layers strictly below this index count as near-source.
    pub near_source_layer_limit: u32,
    /// Optional replacement for the built-in layer memory.
    pub layer_memory_file: Option<PathBuf>,
    /// Optional replacement for the built-in row memory of every zone.
    pub row_memory_file: Option<PathBuf>,
}

impl Default for TrackerTriggerConfig {
    fn default() -> Self {
        Self {
            min_layer_multiplicity: 3,
            near_source_layer_limit: 4,
            layer_memory_file: None,
            row_memory_file: None,
        }
    }
}

/// Level-two coincidence knobs, all durations in 1600 ns clockticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoincidenceConfig {
    pub calorimeter_gate_size: u32,
    pub previous_event_buffer_depth: usize,
    pub delayed_window_1600ns: u32,
    pub delayed_min_gap_1600ns: u32,
    pub l2_decision_gate_1600ns: u32,
    pub calorimeter_only: bool,
}

impl Default for CoincidenceConfig {
    fn default() -> Self {
        Self {
            calorimeter_gate_size: 5,
            previous_event_buffer_depth: 10,
            delayed_window_1600ns: 625,
            delayed_min_gap_1600ns: 5,
            l2_decision_gate_1600ns: 5,
            calorimeter_only: false,
        }
    }
}

/// Complete, validated trigger configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    pub encoder: EncoderConfig,
    pub calo: CaloTriggerConfig,
    pub tracker: TrackerTriggerConfig,
    pub coincidence: CoincidenceConfig,
}

impl TriggerConfig {
    /// Parses and validates a JSON document; missing keys take defaults.
    pub fn from_json_str(payload: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(payload)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let payload = fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
            path: path_ref.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&payload)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let encoder = &self.encoder;
        if !(encoder.low_threshold.is_finite() && encoder.high_threshold.is_finite()) {
            return Err(invalid("high_threshold", "thresholds must be finite"));
        }
        if encoder.low_threshold >= encoder.high_threshold {
            return Err(invalid(
                "low_threshold",
                format!(
                    "{} must be below high_threshold {}",
                    encoder.low_threshold, encoder.high_threshold
                ),
            ));
        }
        if self.calo.circular_buffer_depth == 0 {
            return Err(invalid("circular_buffer_depth", "must be positive"));
        }
        if !(1..=5).contains(&self.tracker.min_layer_multiplicity) {
            return Err(invalid(
                "min_layer_multiplicity",
                format!("{} is outside 1..=5", self.tracker.min_layer_multiplicity),
            ));
        }
        if !(1..=NLAYERS as u32).contains(&self.tracker.near_source_layer_limit) {
            return Err(invalid(
                "near_source_layer_limit",
                format!("{} is outside 1..={NLAYERS}", self.tracker.near_source_layer_limit),
            ));
        }
        let coincidence = &self.coincidence;
        if coincidence.previous_event_buffer_depth == 0 {
            return Err(invalid("previous_event_buffer_depth", "must be positive"));
        }
        if coincidence.delayed_min_gap_1600ns > coincidence.delayed_window_1600ns {
            return Err(invalid(
                "delayed_min_gap_1600ns",
                format!(
                    "{} exceeds delayed_window_1600ns {}",
                    coincidence.delayed_min_gap_1600ns, coincidence.delayed_window_1600ns
                ),
            ));
        }
        Ok(())
    }

    pub fn high_threshold(&self) -> f64 {
        self.encoder.high_threshold
    }

    pub fn low_threshold(&self) -> f64 {
        self.encoder.low_threshold
    }

    pub fn threshold_total_multiplicity(&self) -> u32 {
        self.calo.threshold_total_multiplicity
    }

    pub fn calorimeter_gate_size(&self) -> u32 {
        self.coincidence.calorimeter_gate_size
    }

    pub fn previous_event_buffer_depth(&self) -> usize {
        self.coincidence.previous_event_buffer_depth
    }

    pub fn inhibit_single_side_coinc(&self) -> bool {
        self.calo.inhibit_single_side_coinc
    }

    pub fn inhibit_both_side_coinc(&self) -> bool {
        self.calo.inhibit_both_side_coinc
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
