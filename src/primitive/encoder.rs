use super::calo::{AmplitudeLevel, CaloThresholds, CaloTp};
use super::collection::TpCollection;
use super::geiger::GeigerTp;
use crate::clock::{clocktick_25ns, clocktick_800ns};
use crate::error::TriggerError;
use crate::signal::SignalRecord;

/// Outcome counters of one encoding pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodingReport {
    pub signals: u64,
    pub created: u64,
    pub merged: u64,
    pub below_threshold: u64,
}

/// Turns calorimeter signals into 25 ns primitives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaloTpEncoder {
    thresholds: CaloThresholds,
    clocktick_reference: u32,
}

impl CaloTpEncoder {
    pub fn new(thresholds: CaloThresholds, clocktick_reference: u32) -> Self {
        Self {
            thresholds,
            clocktick_reference,
        }
    }

    pub fn thresholds(&self) -> &CaloThresholds {
        &self.thresholds
    }

    /// Encodes every calorimeter signal into `out`.
    ///
    /// A second signal on the same block within the same clocktick is
    /// accumulated into the existing primitive.
    pub fn process(
        &self,
        signals: &[SignalRecord],
        out: &mut TpCollection<CaloTp>,
    ) -> Result<EncodingReport, TriggerError> {
        let mut report = EncodingReport::default();
        for signal in signals.iter().filter(|s| s.is_calorimeter()) {
            report.signals += 1;
            let level = AmplitudeLevel::classify(signal.amplitude, &self.thresholds);
            if level == AmplitudeLevel::BelowLow {
                report.below_threshold += 1;
                continue;
            }
            let clocktick = clocktick_25ns(signal.time_ns, self.clocktick_reference)?;
            if let Some(existing) = out.find_mut(&signal.geom_id, clocktick)? {
                existing.update_data(level, false, false)?;
                report.merged += 1;
                continue;
            }
            let mut tp = CaloTp::new();
            tp.set_header(signal.hit_id, signal.geom_id, clocktick)?;
            tp.set_data(level, false, false)?;
            out.push(tp)?;
            report.created += 1;
        }
        Ok(report)
    }
}

/// Turns geiger anode signals into 800 ns primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeigerTpEncoder {
    clocktick_reference: u32,
}

impl GeigerTpEncoder {
    pub fn new(clocktick_reference: u32) -> Self {
        Self {
            clocktick_reference,
        }
    }

    pub fn process(
        &self,
        signals: &[SignalRecord],
        out: &mut TpCollection<GeigerTp>,
    ) -> Result<EncodingReport, TriggerError> {
        let mut report = EncodingReport::default();
        for signal in signals.iter().filter(|s| !s.is_calorimeter()) {
            report.signals += 1;
            let clocktick = clocktick_800ns(signal.time_ns, self.clocktick_reference)?;
            if out.find_mut(&signal.geom_id, clocktick)?.is_some() {
                report.merged += 1;
                continue;
            }
            let mut tp = GeigerTp::new();
            tp.set_header(signal.hit_id, signal.geom_id, clocktick)?;
            out.push(tp)?;
            report.created += 1;
        }
        Ok(report)
    }
}
