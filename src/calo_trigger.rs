use crate::config::CaloTriggerConfig;
use crate::ctw::calo::{CaloCtw, CaloCtwData, WallType};
use crate::ctw::CrateWord;
use crate::error::TriggerError;
use crate::mapping::NSIDES;
use crate::primitive::calo::{encode_htm, HTM_MAX};
use crate::ring::RingBuffer;
use serde::Serialize;

/// Width of the auxiliary information word.
pub const INFO_BITSET_SIZE: u32 = 6;
/// Bit positions of the auxiliary information word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InfoBit {
    LowThreshold = 0,
    Crosstalk = 1,
}

impl InfoBit {
    pub fn mask(self) -> u8 {
        1 << self as u8
    }
}

/// Level-one calorimeter summary for one 25 ns clocktick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CaloSummaryRecord {
    pub clocktick_25ns: u32,
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

impl CaloSummaryRecord {
    pub fn new(clocktick_25ns: u32) -> Self {
        Self {
            clocktick_25ns,
            ..Self::default()
        }
    }

    /// True when no crate contributed anything.
    pub fn is_empty(&self) -> bool {
        self.zoning_word.iter().all(|word| *word == 0)
            && self.zoning_gveto == 0
            && self.total_multiplicity_side_0 == 0
            && self.total_multiplicity_side_1 == 0
            && self.total_multiplicity_gveto == 0
            && !self.lto_side_0
            && !self.lto_side_1
            && !self.lto_gveto
            && self.xt_info == 0
    }

    /// Sum of the side and gamma-veto multiplicities.
    pub fn total_multiplicity(&self) -> u32 {
        u32::from(self.total_multiplicity_side_0)
            + u32::from(self.total_multiplicity_side_1)
            + u32::from(self.total_multiplicity_gveto)
    }

    /// Multiplicity of one main-wall side.
    pub fn side_multiplicity(&self, side: usize) -> u8 {
        if side == 0 {
            self.total_multiplicity_side_0
        } else {
            self.total_multiplicity_side_1
        }
    }

    pub fn side_fired(&self, side: usize) -> bool {
        self.side_multiplicity(side) > 0
    }

    fn add_crate_word(&mut self, word: &CaloCtw) {
        let multiplicity = word.htm_multiplicity();
        match word.wall() {
            WallType::MainWall => {
                let side = usize::from(word.crate_id()).min(NSIDES - 1);
                self.zoning_word[side] |= word.zoning_word();
                if side == 0 {
                    self.total_multiplicity_side_0 =
                        saturating_htm(self.total_multiplicity_side_0, multiplicity);
                    self.lto_side_0 |= word.is_lto();
                } else {
                    self.total_multiplicity_side_1 =
                        saturating_htm(self.total_multiplicity_side_1, multiplicity);
                    self.lto_side_1 |= word.is_lto();
                }
            }
            WallType::GammaVeto => {
                self.zoning_gveto |= word.zoning_word() as u8;
                self.total_multiplicity_gveto =
                    saturating_htm(self.total_multiplicity_gveto, multiplicity);
                self.lto_gveto |= word.is_lto();
            }
        }
        if word.is_lto() {
            self.xt_info |= InfoBit::LowThreshold.mask();
        }
        if word.is_xt() {
            self.xt_info |= InfoBit::Crosstalk.mask();
        }
    }

    fn merge(&mut self, other: &CaloSummaryRecord) {
        for side in 0..NSIDES {
            self.zoning_word[side] |= other.zoning_word[side];
        }
        self.zoning_gveto |= other.zoning_gveto;
        self.total_multiplicity_side_0 = saturating_htm(
            self.total_multiplicity_side_0,
            u32::from(other.total_multiplicity_side_0),
        );
        self.total_multiplicity_side_1 = saturating_htm(
            self.total_multiplicity_side_1,
            u32::from(other.total_multiplicity_side_1),
        );
        self.total_multiplicity_gveto = saturating_htm(
            self.total_multiplicity_gveto,
            u32::from(other.total_multiplicity_gveto),
        );
        self.lto_side_0 |= other.lto_side_0;
        self.lto_side_1 |= other.lto_side_1;
        self.lto_gveto |= other.lto_gveto;
        self.xt_info |= other.xt_info;
    }
}

fn saturating_htm(current: u8, add: u32) -> u8 {
    encode_htm(u32::from(current).saturating_add(add).min(HTM_MAX))
}

/// Level-one calorimeter trigger.
///
/// Every 25 ns clocktick is pushed into a circular history; the summary of a
/// clocktick merges the whole history before the threshold decision.
#[derive(Debug, Clone)]
pub struct CaloTriggerAlgorithm {
    config: CaloTriggerConfig,
    history: RingBuffer<CaloSummaryRecord>,
}

impl CaloTriggerAlgorithm {
    pub fn new(config: CaloTriggerConfig) -> Result<Self, TriggerError> {
        let history = RingBuffer::with_capacity(config.circular_buffer_depth)?;
        Ok(Self { config, history })
    }

    pub fn config(&self) -> &CaloTriggerConfig {
        &self.config
    }

    /// Builds one summary per 25 ns clocktick present in `ctw_data`.
    pub fn process(
        &mut self,
        ctw_data: &CaloCtwData,
    ) -> Result<Vec<CaloSummaryRecord>, TriggerError> {
        self.history.clear();
        let mut records = Vec::new();
        let Some((first, last)) = ctw_data.clocktick_range() else {
            return Ok(records);
        };
        for clocktick in first..=last {
            let mut raw = CaloSummaryRecord::new(clocktick);
            let mut present = false;
            for word in ctw_data.at_clocktick(clocktick) {
                raw.add_crate_word(word);
                present = true;
            }
            self.history.push(raw);
            if !present {
                continue;
            }
            let mut summary = CaloSummaryRecord::new(clocktick);
            for past in self.history.iter() {
                summary.merge(past);
            }
            self.decide(&mut summary);
            records.push(summary);
        }
        Ok(records)
    }

    fn decide(&self, summary: &mut CaloSummaryRecord) {
        summary.total_multiplicity_threshold =
            summary.total_multiplicity() >= self.config.threshold_total_multiplicity;
        let side_0 = summary.side_fired(0);
        let side_1 = summary.side_fired(1);
        summary.single_side_coinc = side_0 != side_1;
        let both_sides = side_0 && side_1;
        let inhibited = (summary.single_side_coinc && self.config.inhibit_single_side_coinc)
            || (both_sides && self.config.inhibit_both_side_coinc);
        summary.decision = summary.total_multiplicity_threshold && !inhibited;
    }
}
