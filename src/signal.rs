use crate::error::TriggerError;
use crate::mapping::GeomId;
use serde::{Deserialize, Serialize};

/// Per-channel analog signal produced by the signal-generation stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub hit_id: u32,
    pub geom_id: GeomId,
    /// Signal time relative to the event start.
    pub time_ns: f64,
    /// Peak amplitude; ignored for geiger cells.
    #[serde(default)]
    pub amplitude: f64,
}

impl SignalRecord {
    /// Calorimeter signal.
    pub fn calo(hit_id: u32, geom_id: GeomId, time_ns: f64, amplitude: f64) -> Self {
        Self {
            hit_id,
            geom_id,
            time_ns,
            amplitude,
        }
    }

    /// Geiger cell signal (anode time).
    pub fn geiger(hit_id: u32, geom_id: GeomId, time_ns: f64) -> Self {
        Self {
            hit_id,
            geom_id,
            time_ns,
            amplitude: 0.0,
        }
    }

    pub fn is_calorimeter(&self) -> bool {
        self.geom_id.is_calorimeter()
    }
}

/// Checks that signal times are non-decreasing and in range.
pub fn check_signal_order(signals: &[SignalRecord]) -> Result<(), TriggerError> {
    let mut last_time_ns: Option<f64> = None;
    for signal in signals {
        if !signal.time_ns.is_finite() || signal.time_ns < 0.0 {
            return Err(TriggerError::InvalidRecord(format!(
                "signal {} has invalid time {}",
                signal.hit_id, signal.time_ns
            )));
        }
        if !signal.geom_id.is_in_detector() {
            return Err(TriggerError::InvalidRecord(format!(
                "signal {} references {} outside the detector",
                signal.hit_id, signal.geom_id
            )));
        }
        if let Some(previous) = last_time_ns {
            if signal.time_ns < previous {
                return Err(TriggerError::OrderingViolation {
                    stream: "signal",
                    previous: whole_ns(previous),
                    current: whole_ns(signal.time_ns),
                });
            }
        }
        last_time_ns = Some(signal.time_ns);
    }
    Ok(())
}

fn whole_ns(time_ns: f64) -> u32 {
    time_ns.floor().min(f64::from(u32::MAX)) as u32
}
