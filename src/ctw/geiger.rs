use super::{AggregationReport, CrateWord, CtwData};
use crate::error::TriggerError;
use crate::mapping::{ElectronicId, ElectronicMapping, GEIGER_CHANNELS_PER_BOARD, GEIGER_RACK_ID};
use crate::primitive::collection::TpCollection;
use crate::primitive::geiger::GeigerTp;
use crate::primitive::TriggerPrimitive;
use std::collections::BTreeMap;

/// Geiger crate trigger word: fired channels of every board at one 800 ns clocktick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeigerCtw {
    crate_id: u8,
    clocktick_800ns: u32,
    boards: BTreeMap<u8, u64>,
}

impl GeigerCtw {
    pub fn new(crate_id: u8, clocktick_800ns: u32) -> Self {
        Self {
            crate_id,
            clocktick_800ns,
            boards: BTreeMap::new(),
        }
    }

    pub fn set_channel(&mut self, board: u8, channel: u8) -> Result<(), TriggerError> {
        if channel >= GEIGER_CHANNELS_PER_BOARD {
            return Err(TriggerError::InvalidMultiplicity {
                field: "geiger channel",
                value: u32::from(channel),
                width: u32::from(GEIGER_CHANNELS_PER_BOARD),
            });
        }
        *self.boards.entry(board).or_default() |= 1 << channel;
        Ok(())
    }

    /// 36-bit channel mask of a board (0 when the board did not fire).
    pub fn board_word(&self, board: u8) -> u64 {
        self.boards.get(&board).copied().unwrap_or(0)
    }

    /// Number of fired channels in the crate.
    pub fn hit_count(&self) -> u32 {
        self.boards.values().map(|mask| mask.count_ones()).sum()
    }

    /// Electronic ids of the fired channels, in board then channel order.
    pub fn hit_channels(&self) -> impl Iterator<Item = ElectronicId> + '_ {
        self.boards.iter().flat_map(move |(&board, &mask)| {
            (0..GEIGER_CHANNELS_PER_BOARD)
                .filter(move |channel| mask & (1 << channel) != 0)
                .map(move |channel| {
                    ElectronicId::new(GEIGER_RACK_ID, self.crate_id, board, channel)
                })
        })
    }
}

impl CrateWord for GeigerCtw {
    fn crate_id(&self) -> u8 {
        self.crate_id
    }

    fn clocktick(&self) -> u32 {
        self.clocktick_800ns
    }
}

pub type GeigerCtwData = CtwData<GeigerCtw>;

/// Builds the crate words of one geiger crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeigerCtwAggregator {
    crate_id: u8,
}

impl GeigerCtwAggregator {
    pub fn new(crate_id: u8) -> Self {
        Self { crate_id }
    }

    pub fn crate_id(&self) -> u8 {
        self.crate_id
    }

    pub fn process(
        &self,
        tps: &TpCollection<GeigerTp>,
        mapping: &dyn ElectronicMapping,
        ctw_data: &mut GeigerCtwData,
    ) -> Result<AggregationReport, TriggerError> {
        if !tps.is_locked() {
            return Err(TriggerError::InvalidState(
                "geiger TP collection must be locked before aggregation".into(),
            ));
        }
        let mut report = AggregationReport::default();
        let mut words: BTreeMap<u32, GeigerCtw> = BTreeMap::new();
        for tp in tps.iter() {
            let (Some(geom_id), Some(clocktick)) = (tp.geom_id(), tp.clocktick()) else {
                continue;
            };
            let Some(electronic_id) = mapping.to_electronic(&geom_id) else {
                report.unmapped.push((geom_id, clocktick));
                continue;
            };
            if electronic_id.rack != GEIGER_RACK_ID || electronic_id.crate_id != self.crate_id {
                continue;
            }
            words
                .entry(clocktick)
                .or_insert_with(|| GeigerCtw::new(self.crate_id, clocktick))
                .set_channel(electronic_id.board, electronic_id.channel)?;
            report.primitives += 1;
        }
        for (_, word) in words {
            ctw_data.push(word);
            report.words += 1;
        }
        Ok(report)
    }
}
