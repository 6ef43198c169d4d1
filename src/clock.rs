use crate::error::TriggerError;

/// Main calorimeter clock period (ns).
pub const MAIN_CLOCKTICK_NS: u32 = 25;
/// Geiger primitive clock period (ns).
pub const GEIGER_CLOCKTICK_NS: u32 = 800;
/// Trigger decision clock period (ns).
pub const TRIGGER_CLOCKTICK_NS: u32 = 1600;
/// Number of 25 ns ticks per 1600 ns tick.
pub const TICKS_25NS_PER_1600NS: u32 = TRIGGER_CLOCKTICK_NS / MAIN_CLOCKTICK_NS;
/// Number of 800 ns ticks per 1600 ns tick.
pub const TICKS_800NS_PER_1600NS: u32 = TRIGGER_CLOCKTICK_NS / GEIGER_CLOCKTICK_NS;
/// Trigger ticks between the 1600 ns window a hit falls in and the tick that latches it.
pub const SHIFT_COMPUTING_CLOCKTICK_1600NS: u32 = 1;

/// Converts a signal time into a 25 ns clocktick anchored at `reference`.
pub fn clocktick_25ns(time_ns: f64, reference: u32) -> Result<u32, TriggerError> {
    sample(time_ns, MAIN_CLOCKTICK_NS, reference)
}

/// Converts a signal time into an 800 ns clocktick anchored at `reference`.
pub fn clocktick_800ns(time_ns: f64, reference: u32) -> Result<u32, TriggerError> {
    sample(time_ns, GEIGER_CLOCKTICK_NS, reference)
}

/// Rescales a 25 ns clocktick to the 1600 ns tick that latches it.
///
/// Both clocks latch on the tick after the 1600 ns window holding the hit, so
/// simultaneous calorimeter and geiger hits share a trigger tick.
pub fn ct25_to_ct1600(clocktick_25ns: u32) -> u32 {
    clocktick_25ns / TICKS_25NS_PER_1600NS + SHIFT_COMPUTING_CLOCKTICK_1600NS
}

/// Rescales an 800 ns clocktick to the 1600 ns tick that latches it.
pub fn ct800_to_ct1600(clocktick_800ns: u32) -> u32 {
    clocktick_800ns / TICKS_800NS_PER_1600NS + SHIFT_COMPUTING_CLOCKTICK_1600NS
}

fn sample(time_ns: f64, period_ns: u32, reference: u32) -> Result<u32, TriggerError> {
    if !time_ns.is_finite() || time_ns < 0.0 {
        return Err(TriggerError::InvalidRecord(format!(
            "signal time {time_ns} ns is not a valid sampling time"
        )));
    }
    let ticks = (time_ns / f64::from(period_ns)).floor();
    if ticks > f64::from(u32::MAX - reference) {
        return Err(TriggerError::InvalidRecord(format!(
            "signal time {time_ns} ns exceeds the clocktick range"
        )));
    }
    Ok(reference + ticks as u32)
}

/// Guards an ordered clocktick stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClocktickGuard {
    stream: &'static str,
    strict: bool,
    last: Option<u32>,
}

impl ClocktickGuard {
    /// Accepts repeated clockticks, rejects decreasing ones.
    pub fn non_decreasing(stream: &'static str) -> Self {
        Self {
            stream,
            strict: false,
            last: None,
        }
    }

    /// Rejects repeated and decreasing clockticks.
    pub fn strict(stream: &'static str) -> Self {
        Self {
            stream,
            strict: true,
            last: None,
        }
    }

    /// Records the next clocktick of the stream.
    pub fn observe(&mut self, clocktick: u32) -> Result<(), TriggerError> {
        if let Some(previous) = self.last {
            let violated = if self.strict {
                clocktick <= previous
            } else {
                clocktick < previous
            };
            if violated {
                return Err(TriggerError::OrderingViolation {
                    stream: self.stream,
                    previous,
                    current: clocktick,
                });
            }
        }
        self.last = Some(clocktick);
        Ok(())
    }

    /// Last accepted clocktick.
    pub fn last(&self) -> Option<u32> {
        self.last
    }
}
