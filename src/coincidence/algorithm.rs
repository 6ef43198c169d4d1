use super::records::{
    CoincidenceCaloRecord, CoincidenceEventRecord, DecisionLatch, L2Decision,
    PreviousEventRecord, TriggerMode,
};
use crate::calo_trigger::CaloSummaryRecord;
use crate::clock::{ct25_to_ct1600, ClocktickGuard};
use crate::config::CoincidenceConfig;
use crate::error::TriggerError;
use crate::mapping::{NSIDES, NZONES};
use crate::ring::RingBuffer;
use crate::tracker::algorithm::TrackerRecord;
use crate::tracker::zone::{ZoneBit, ZoneData};
use std::collections::{BTreeMap, BTreeSet};

/// Records and decisions produced by one level-two pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoincidenceOutput {
    pub records: Vec<CoincidenceEventRecord>,
    pub l2_decisions: Vec<L2Decision>,
}

impl CoincidenceOutput {
    /// Clockticks whose latched decision is true.
    pub fn accepted_clockticks(&self) -> Vec<u32> {
        self.records
            .iter()
            .filter(|record| record.decision)
            .map(|record| record.clocktick_1600ns)
            .collect()
    }

    /// Clockticks accepted by the prompt calorimeter/tracker coincidence.
    pub fn prompt_clockticks(&self) -> Vec<u32> {
        self.records
            .iter()
            .filter(|record| record.prompt_decision)
            .map(|record| record.clocktick_1600ns)
            .collect()
    }

    pub fn record_at(&self, clocktick_1600ns: u32) -> Option<&CoincidenceEventRecord> {
        self.records
            .iter()
            .find(|record| record.clocktick_1600ns == clocktick_1600ns)
    }
}

/// Level-two coincidence trigger.
///
/// Prompt decisions come from the calorimeter/tracker zone overlap (CARACO).
/// Tracker-only clockticks are matched against previous prompt events kept in
/// a bounded ring (APE on track patterns, DAVE on near-source bits).
#[derive(Debug, Clone)]
pub struct CoincidenceTriggerAlgorithm {
    config: CoincidenceConfig,
    previous_events: RingBuffer<PreviousEventRecord>,
}

impl CoincidenceTriggerAlgorithm {
    pub fn new(config: CoincidenceConfig) -> Result<Self, TriggerError> {
        let previous_events = RingBuffer::with_capacity(config.previous_event_buffer_depth)?;
        Ok(Self {
            config,
            previous_events,
        })
    }

    pub fn config(&self) -> &CoincidenceConfig {
        &self.config
    }

    /// Previous-event ring as left by the last pass.
    pub fn previous_events(&self) -> &RingBuffer<PreviousEventRecord> {
        &self.previous_events
    }

    /// Stretches passing calorimeter summaries over the coincidence gate.
    pub fn rescale(
        &self,
        calo_records: &[CaloSummaryRecord],
    ) -> Result<BTreeMap<u32, CoincidenceCaloRecord>, TriggerError> {
        let mut guard = ClocktickGuard::strict("calo summary");
        let mut rescaled: BTreeMap<u32, CoincidenceCaloRecord> = BTreeMap::new();
        for summary in calo_records {
            guard.observe(summary.clocktick_25ns)?;
            if !summary.decision {
                continue;
            }
            let first = ct25_to_ct1600(summary.clocktick_25ns);
            for clocktick in first..first.saturating_add(self.config.calorimeter_gate_size) {
                rescaled
                    .entry(clocktick)
                    .and_modify(|record| record.merge(summary))
                    .or_insert_with(|| CoincidenceCaloRecord::from_summary(summary, clocktick));
            }
        }
        Ok(rescaled)
    }

    pub fn process(
        &mut self,
        calo_records: &[CaloSummaryRecord],
        tracker_records: &[TrackerRecord],
    ) -> Result<CoincidenceOutput, TriggerError> {
        let rescaled = self.rescale(calo_records)?;
        let mut guard = ClocktickGuard::strict("tracker record");
        let mut trackers: BTreeMap<u32, &TrackerRecord> = BTreeMap::new();
        for record in tracker_records {
            guard.observe(record.clocktick_1600ns)?;
            trackers.insert(record.clocktick_1600ns, record);
        }
        let clockticks: BTreeSet<u32> = rescaled.keys().chain(trackers.keys()).copied().collect();

        self.previous_events.clear();
        let mut latch = DecisionLatch::new();
        let mut output = CoincidenceOutput::default();
        let mut last_l2: Option<u32> = None;
        for clocktick in clockticks {
            let calo = rescaled.get(&clocktick);
            let tracker = trackers.get(&clocktick).copied();
            let mut record = CoincidenceEventRecord::new(clocktick);
            if let Some(calo) = calo {
                record.copy_calo(calo);
            }
            if let Some(tracker) = tracker {
                record.copy_tracker(tracker);
            }

            if let Some(calo) = calo {
                self.evaluate_prompt(&mut record, calo, tracker);
                self.previous_events
                    .push(PreviousEventRecord::from(&record));
            } else if let Some(tracker) = tracker {
                if let Some(mode) = self.search_delayed(clocktick, tracker) {
                    record.delayed_decision = true;
                    record.trigger_mode = mode;
                }
            }

            let decision = record.prompt_decision || record.delayed_decision;
            latch.latch(&mut record, decision)?;
            if decision && !self.config.calorimeter_only {
                issue_l2(
                    &mut output.l2_decisions,
                    &mut last_l2,
                    self.config.l2_decision_gate_1600ns,
                    clocktick,
                    record.trigger_mode,
                );
            }
            output.records.push(record);
        }

        if self.config.calorimeter_only {
            output.l2_decisions = self.calorimeter_only_decisions(calo_records);
        }
        Ok(output)
    }

    fn evaluate_prompt(
        &self,
        record: &mut CoincidenceEventRecord,
        calo: &CoincidenceCaloRecord,
        tracker: Option<&TrackerRecord>,
    ) {
        let Some(tracker) = tracker else {
            return;
        };
        for side in 0..NSIDES {
            for zone in 0..NZONES {
                if caraco_match(calo, side, zone, tracker.zone(side, zone)) {
                    record.coincidence_zoning_word[side] |= 1 << zone;
                }
            }
        }
        let side_0 = record.coincidence_zoning_word[0] != 0;
        let side_1 = record.coincidence_zoning_word[1] != 0;
        record.single_side_coinc = side_0 != side_1;
        record.both_side_coinc = side_0 && side_1;
        record.prompt_decision = (side_0 || side_1) && calo.decision && tracker.decision;
        if record.prompt_decision {
            record.trigger_mode = TriggerMode::Caraco;
        }
    }

    /// Newest-first scan of the ring: every APE candidate before any DAVE one.
    fn search_delayed(&self, clocktick: u32, tracker: &TrackerRecord) -> Option<TriggerMode> {
        let candidates: Vec<&PreviousEventRecord> = self
            .previous_events
            .iter()
            .rev()
            .filter(|previous| previous.prompt_decision)
            .filter(|previous| {
                clocktick
                    .checked_sub(previous.clocktick_1600ns)
                    .is_some_and(|elapsed| {
                        elapsed >= self.config.delayed_min_gap_1600ns
                            && elapsed <= self.config.delayed_window_1600ns
                    })
            })
            .collect();
        if candidates.iter().any(|previous| ape_match(tracker, previous)) {
            return Some(TriggerMode::Ape);
        }
        if candidates.iter().any(|previous| dave_match(tracker, previous)) {
            return Some(TriggerMode::Dave);
        }
        None
    }

    /// Passing calorimeter clockticks that do not directly follow another pass.
    fn calorimeter_only_decisions(&self, calo_records: &[CaloSummaryRecord]) -> Vec<L2Decision> {
        let mut decisions = Vec::new();
        let mut last_pass: Option<u32> = None;
        let mut last_l2: Option<u32> = None;
        for summary in calo_records.iter().filter(|summary| summary.decision) {
            let consecutive = last_pass.is_some_and(|last| summary.clocktick_25ns == last + 1);
            last_pass = Some(summary.clocktick_25ns);
            if consecutive {
                continue;
            }
            issue_l2(
                &mut decisions,
                &mut last_l2,
                self.config.l2_decision_gate_1600ns,
                ct25_to_ct1600(summary.clocktick_25ns),
                TriggerMode::CaloOnly,
            );
        }
        decisions
    }
}

fn issue_l2(
    decisions: &mut Vec<L2Decision>,
    last_issued: &mut Option<u32>,
    gate: u32,
    clocktick_1600ns: u32,
    mode: TriggerMode,
) {
    let in_dead_time = last_issued
        .is_some_and(|last| clocktick_1600ns < last.saturating_add(gate.max(1)));
    if in_dead_time {
        return;
    }
    *last_issued = Some(clocktick_1600ns);
    decisions.push(L2Decision {
        clocktick_1600ns,
        mode,
    });
}

/// Track segment of one zone pointing at a fired calorimeter zone.
fn caraco_match(calo: &CoincidenceCaloRecord, side: usize, zone: usize, data: ZoneData) -> bool {
    let (left, mid, right) = data.horizontal();
    let zone = zone as isize;
    let here = calo.zone_fired(side, zone);
    (mid && here)
        || (right && (here || calo.zone_fired(side, zone + 1)))
        || (left && (here || calo.zone_fired(side, zone - 1)))
}

fn ape_match(tracker: &TrackerRecord, previous: &PreviousEventRecord) -> bool {
    for side in 0..NSIDES {
        for zone in 0..NZONES {
            let (left, mid, right) = tracker.zone(side, zone).horizontal();
            if !(left || mid || right) {
                continue;
            }
            let z = zone as isize;
            for stored_side in 0..NSIDES {
                let stored = |zone: isize, bit: ZoneBit| previous.zone(stored_side, zone).test(bit);
                let matched = (left
                    && (stored(z - 1, ZoneBit::Right)
                        || stored(z, ZoneBit::Left)
                        || stored(z, ZoneBit::Middle)))
                    || (mid
                        && (stored(z, ZoneBit::Left)
                            || stored(z, ZoneBit::Middle)
                            || stored(z, ZoneBit::Right)))
                    || (right
                        && (stored(z, ZoneBit::Middle)
                            || stored(z, ZoneBit::Right)
                            || stored(z + 1, ZoneBit::Left)));
                if matched {
                    return true;
                }
            }
        }
    }
    false
}

fn dave_match(tracker: &TrackerRecord, previous: &PreviousEventRecord) -> bool {
    for side in 0..NSIDES {
        for zone in 0..NZONES {
            let data = tracker.zone(side, zone);
            let near_left = data.test(ZoneBit::NszLeft);
            let near_right = data.test(ZoneBit::NszRight);
            if !(near_left || near_right) {
                continue;
            }
            let z = zone as isize;
            for stored_side in 0..NSIDES {
                let stored = |zone: isize, bit: ZoneBit| previous.zone(stored_side, zone).test(bit);
                let matched = (near_left
                    && (stored(z - 1, ZoneBit::NszRight)
                        || stored(z, ZoneBit::NszLeft)
                        || stored(z, ZoneBit::NszRight)))
                    || (near_right
                        && (stored(z, ZoneBit::NszLeft)
                            || stored(z, ZoneBit::NszRight)
                            || stored(z + 1, ZoneBit::NszLeft)));
                if matched {
                    return true;
                }
            }
        }
    }
    false
}
