use crate::calo_trigger::CaloSummaryRecord;
use crate::clock::ClocktickGuard;
use crate::error::TriggerError;
use crate::mapping::{NSIDES, NZONES};
use crate::tracker::algorithm::TrackerRecord;
use crate::tracker::zone::ZoneData;
use serde::Serialize;
use std::fmt;

/// How a level-two decision was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerMode {
    #[default]
    Invalid,
    CaloOnly,
    Caraco,
    Ape,
    Dave,
}

impl TriggerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerMode::Invalid => "INVALID",
            TriggerMode::CaloOnly => "CALO_ONLY",
            TriggerMode::Caraco => "CARACO",
            TriggerMode::Ape => "APE",
            TriggerMode::Dave => "DAVE",
        }
    }

    pub fn is_delayed(self) -> bool {
        matches!(self, TriggerMode::Ape | TriggerMode::Dave)
    }
}

impl fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calorimeter summary stretched over the coincidence gate at 1600 ns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CoincidenceCaloRecord {
    pub clocktick_1600ns: u32,
    pub zoning_word: [u16; NSIDES],
    pub zoning_gveto: u8,
    pub total_multiplicity_side_0: u8,
    pub total_multiplicity_side_1: u8,
    pub total_multiplicity_gveto: u8,
    pub lto_side_0: bool,
    pub lto_side_1: bool,
    pub lto_gveto: bool,
    pub xt_info: u8,
    pub single_side_coinc: bool,
    pub total_multiplicity_threshold: bool,
    pub decision: bool,
}

impl CoincidenceCaloRecord {
    pub fn from_summary(summary: &CaloSummaryRecord, clocktick_1600ns: u32) -> Self {
        Self {
            clocktick_1600ns,
            zoning_word: summary.zoning_word,
            zoning_gveto: summary.zoning_gveto,
            total_multiplicity_side_0: summary.total_multiplicity_side_0,
            total_multiplicity_side_1: summary.total_multiplicity_side_1,
            total_multiplicity_gveto: summary.total_multiplicity_gveto,
            lto_side_0: summary.lto_side_0,
            lto_side_1: summary.lto_side_1,
            lto_gveto: summary.lto_gveto,
            xt_info: summary.xt_info,
            single_side_coinc: summary.single_side_coinc,
            total_multiplicity_threshold: summary.total_multiplicity_threshold,
            decision: summary.decision,
        }
    }

    /// Widens this record with another summary landing on the same clocktick.
    pub fn merge(&mut self, summary: &CaloSummaryRecord) {
        for side in 0..NSIDES {
            self.zoning_word[side] |= summary.zoning_word[side];
        }
        self.zoning_gveto |= summary.zoning_gveto;
        self.total_multiplicity_side_0 = self
            .total_multiplicity_side_0
            .max(summary.total_multiplicity_side_0);
        self.total_multiplicity_side_1 = self
            .total_multiplicity_side_1
            .max(summary.total_multiplicity_side_1);
        self.total_multiplicity_gveto = self
            .total_multiplicity_gveto
            .max(summary.total_multiplicity_gveto);
        self.lto_side_0 |= summary.lto_side_0;
        self.lto_side_1 |= summary.lto_side_1;
        self.lto_gveto |= summary.lto_gveto;
        self.xt_info |= summary.xt_info;
        self.total_multiplicity_threshold |= summary.total_multiplicity_threshold;
        self.decision |= summary.decision;
        self.single_side_coinc =
            (self.total_multiplicity_side_0 > 0) != (self.total_multiplicity_side_1 > 0);
    }

    /// Calorimeter zone `zone` of `side` fired; out-of-range zones never fire.
    pub fn zone_fired(&self, side: usize, zone: isize) -> bool {
        (0..NZONES as isize).contains(&zone) && self.zoning_word[side] & (1 << zone) != 0
    }
}

/// Level-two record for one 1600 ns clocktick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoincidenceEventRecord {
    pub clocktick_1600ns: u32,
    pub calo_zoning_word: [u16; NSIDES],
    pub total_multiplicity_side_0: u8,
    pub total_multiplicity_side_1: u8,
    pub total_multiplicity_gveto: u8,
    pub lto_side_0: bool,
    pub lto_side_1: bool,
    pub lto_gveto: bool,
    pub xt_info: u8,
    pub tracker_finale_data_per_zone: [[ZoneData; NZONES]; NSIDES],
    pub tracker_zoning_word_pattern: [u16; NSIDES],
    pub tracker_zoning_word_near_source: [u16; NSIDES],
    /// Zones with active tracker patterns.
    pub tracker_multiplicity: u32,
    pub coincidence_zoning_word: [u16; NSIDES],
    pub single_side_coinc: bool,
    pub both_side_coinc: bool,
    pub prompt_decision: bool,
    pub delayed_decision: bool,
    pub trigger_mode: TriggerMode,
    pub decision: bool,
}

impl CoincidenceEventRecord {
    pub fn new(clocktick_1600ns: u32) -> Self {
        Self {
            clocktick_1600ns,
            calo_zoning_word: [0; NSIDES],
            total_multiplicity_side_0: 0,
            total_multiplicity_side_1: 0,
            total_multiplicity_gveto: 0,
            lto_side_0: false,
            lto_side_1: false,
            lto_gveto: false,
            xt_info: 0,
            tracker_finale_data_per_zone: [[ZoneData::EMPTY; NZONES]; NSIDES],
            tracker_zoning_word_pattern: [0; NSIDES],
            tracker_zoning_word_near_source: [0; NSIDES],
            tracker_multiplicity: 0,
            coincidence_zoning_word: [0; NSIDES],
            single_side_coinc: false,
            both_side_coinc: false,
            prompt_decision: false,
            delayed_decision: false,
            trigger_mode: TriggerMode::Invalid,
            decision: false,
        }
    }

    pub(crate) fn copy_calo(&mut self, calo: &CoincidenceCaloRecord) {
        self.calo_zoning_word = calo.zoning_word;
        self.total_multiplicity_side_0 = calo.total_multiplicity_side_0;
        self.total_multiplicity_side_1 = calo.total_multiplicity_side_1;
        self.total_multiplicity_gveto = calo.total_multiplicity_gveto;
        self.lto_side_0 = calo.lto_side_0;
        self.lto_side_1 = calo.lto_side_1;
        self.lto_gveto = calo.lto_gveto;
        self.xt_info = calo.xt_info;
    }

    pub(crate) fn copy_tracker(&mut self, tracker: &TrackerRecord) {
        self.tracker_finale_data_per_zone = tracker.finale_data_per_zone;
        self.tracker_zoning_word_pattern = tracker.zoning_word_pattern;
        self.tracker_zoning_word_near_source = tracker.zoning_word_near_source;
        self.tracker_multiplicity = tracker
            .zoning_word_pattern
            .iter()
            .map(|word| word.count_ones())
            .sum();
    }

    pub fn is_empty(&self) -> bool {
        self.calo_zoning_word.iter().all(|word| *word == 0)
            && self.total_multiplicity_side_0 == 0
            && self.total_multiplicity_side_1 == 0
            && self.total_multiplicity_gveto == 0
            && self
                .tracker_finale_data_per_zone
                .iter()
                .flatten()
                .all(|data| *data == ZoneData::EMPTY)
            && !self.decision
    }
}

/// Trimmed copy of a prompt evaluation kept for delayed-coincidence lookback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PreviousEventRecord {
    pub clocktick_1600ns: u32,
    pub prompt_decision: bool,
    pub calo_zoning_word: [u16; NSIDES],
    pub total_multiplicity_side_0: u8,
    pub total_multiplicity_side_1: u8,
    pub tracker_finale_data_per_zone: [[ZoneData; NZONES]; NSIDES],
}

impl PreviousEventRecord {
    /// Stored data of `zone` on `side`; empty outside the tracker.
    pub fn zone(&self, side: usize, zone: isize) -> ZoneData {
        if (0..NZONES as isize).contains(&zone) {
            self.tracker_finale_data_per_zone[side][zone as usize]
        } else {
            ZoneData::EMPTY
        }
    }
}

impl From<&CoincidenceEventRecord> for PreviousEventRecord {
    fn from(record: &CoincidenceEventRecord) -> Self {
        Self {
            clocktick_1600ns: record.clocktick_1600ns,
            prompt_decision: record.prompt_decision,
            calo_zoning_word: record.calo_zoning_word,
            total_multiplicity_side_0: record.total_multiplicity_side_0,
            total_multiplicity_side_1: record.total_multiplicity_side_1,
            tracker_finale_data_per_zone: record.tracker_finale_data_per_zone,
        }
    }
}

/// Level-two trigger decision handed to the readout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct L2Decision {
    pub clocktick_1600ns: u32,
    pub mode: TriggerMode,
}

/// Write-once register of per-clocktick decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionLatch {
    guard: ClocktickGuard,
}

impl Default for DecisionLatch {
    fn default() -> Self {
        Self {
            guard: ClocktickGuard::strict("decision latch"),
        }
    }
}

impl DecisionLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latches `decision` into `record`; a clocktick can only be latched once.
    pub fn latch(
        &mut self,
        record: &mut CoincidenceEventRecord,
        decision: bool,
    ) -> Result<(), TriggerError> {
        self.guard.observe(record.clocktick_1600ns)?;
        record.decision = decision;
        Ok(())
    }

    pub fn last_latched(&self) -> Option<u32> {
        self.guard.last()
    }
}
