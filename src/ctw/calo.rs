use super::{AggregationReport, CrateWord, CtwData};
use crate::error::TriggerError;
use crate::mapping::{calo_zone, ElectronicMapping, GeomId, CALO_RACK_ID, NZONES};
use crate::primitive::calo::{encode_htm, CaloTp, HTM_BITSET_SIZE, HTM_MAX};
use crate::primitive::collection::TpCollection;
use crate::primitive::TriggerPrimitive;
use std::collections::BTreeMap;

/// Width of the full calorimeter crate word.
pub const CTW_FULL_SIZE: u32 = 18;
pub const HTM_PC_BIT0: u32 = 0;
pub const ZONING_BIT0: u32 = 2;
/// Zoning field width for main-wall crates.
pub const MAIN_ZONING_SIZE: u32 = NZONES as u32;
/// Zoning field width for the gamma-veto crate.
pub const GVETO_ZONING_SIZE: u32 = 4;
pub const LTO_PC_BIT: u32 = 12;
pub const XT_PC_BIT: u32 = 13;
pub const CONTROL_BIT0: u32 = 14;
pub const CONTROL_SIZE: u32 = 4;
/// Channels per calorimeter front-end board.
pub const CALO_CHANNELS_PER_BOARD: u8 = 16;

/// Which calorimeter wall a crate reads out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WallType {
    MainWall,
    GammaVeto,
}

impl WallType {
    fn zoning_size(self) -> u32 {
        match self {
            WallType::MainWall => MAIN_ZONING_SIZE,
            WallType::GammaVeto => GVETO_ZONING_SIZE,
        }
    }
}

/// 18-bit calorimeter crate trigger word for one 25 ns clocktick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaloCtw {
    crate_id: u8,
    clocktick_25ns: u32,
    wall: WallType,
    word: u32,
    board_channels: BTreeMap<u8, u16>,
}

impl CaloCtw {
    pub fn new(crate_id: u8, clocktick_25ns: u32, wall: WallType) -> Self {
        Self {
            crate_id,
            clocktick_25ns,
            wall,
            word: 0,
            board_channels: BTreeMap::new(),
        }
    }

    pub fn wall(&self) -> WallType {
        self.wall
    }

    /// Raw 18-bit word.
    pub fn word(&self) -> u32 {
        self.word
    }

    pub fn htm_multiplicity(&self) -> u32 {
        self.field(HTM_PC_BIT0, HTM_BITSET_SIZE)
    }

    /// Sets the crate multiplicity with two-bit saturation.
    pub fn set_htm_multiplicity(&mut self, multiplicity: u32) {
        self.write_field(HTM_PC_BIT0, HTM_BITSET_SIZE, u32::from(encode_htm(multiplicity)));
    }

    pub fn set_htm_bits(&mut self, bits: u32) -> Result<(), TriggerError> {
        if bits > HTM_MAX {
            return Err(TriggerError::InvalidMultiplicity {
                field: "HTM_PC",
                value: bits,
                width: HTM_BITSET_SIZE,
            });
        }
        self.write_field(HTM_PC_BIT0, HTM_BITSET_SIZE, bits);
        Ok(())
    }

    pub fn zoning_word(&self) -> u16 {
        self.field(ZONING_BIT0, self.wall.zoning_size()) as u16
    }

    pub fn set_zoning_word(&mut self, zoning: u16) -> Result<(), TriggerError> {
        let width = self.wall.zoning_size();
        if u32::from(zoning) >> width != 0 {
            return Err(TriggerError::InvalidMultiplicity {
                field: "zoning",
                value: u32::from(zoning),
                width,
            });
        }
        self.write_field(ZONING_BIT0, MAIN_ZONING_SIZE, u32::from(zoning));
        Ok(())
    }

    pub fn set_zoning_bit(&mut self, zone: usize) -> Result<(), TriggerError> {
        let width = self.wall.zoning_size();
        if zone >= width as usize {
            return Err(TriggerError::InvalidMultiplicity {
                field: "zone index",
                value: zone as u32,
                width,
            });
        }
        self.word |= 1 << (ZONING_BIT0 + zone as u32);
        Ok(())
    }

    pub fn is_lto(&self) -> bool {
        self.field(LTO_PC_BIT, 1) != 0
    }

    pub fn set_lto(&mut self, value: bool) {
        self.write_field(LTO_PC_BIT, 1, u32::from(value));
    }

    pub fn is_xt(&self) -> bool {
        self.field(XT_PC_BIT, 1) != 0
    }

    pub fn set_xt(&mut self, value: bool) {
        self.write_field(XT_PC_BIT, 1, u32::from(value));
    }

    pub fn control_word(&self) -> u8 {
        self.field(CONTROL_BIT0, CONTROL_SIZE) as u8
    }

    pub fn set_control_word(&mut self, control: u8) -> Result<(), TriggerError> {
        if u32::from(control) >> CONTROL_SIZE != 0 {
            return Err(TriggerError::InvalidMultiplicity {
                field: "control",
                value: u32::from(control),
                width: CONTROL_SIZE,
            });
        }
        self.write_field(CONTROL_BIT0, CONTROL_SIZE, u32::from(control));
        Ok(())
    }

    /// Marks one channel of a board as fired.
    pub fn set_channel(&mut self, board: u8, channel: u8) -> Result<(), TriggerError> {
        if channel >= CALO_CHANNELS_PER_BOARD {
            return Err(TriggerError::InvalidMultiplicity {
                field: "calo channel",
                value: u32::from(channel),
                width: u32::from(CALO_CHANNELS_PER_BOARD),
            });
        }
        *self.board_channels.entry(board).or_default() |= 1 << channel;
        Ok(())
    }

    /// Per-board channel bit arrays.
    pub fn board_channels(&self) -> &BTreeMap<u8, u16> {
        &self.board_channels
    }

    fn field(&self, bit0: u32, width: u32) -> u32 {
        (self.word >> bit0) & ((1 << width) - 1)
    }

    fn write_field(&mut self, bit0: u32, width: u32, value: u32) {
        let mask = ((1 << width) - 1) << bit0;
        self.word = (self.word & !mask) | ((value << bit0) & mask);
    }
}

impl CrateWord for CaloCtw {
    fn crate_id(&self) -> u8 {
        self.crate_id
    }

    fn clocktick(&self) -> u32 {
        self.clocktick_25ns
    }
}

pub type CaloCtwData = CtwData<CaloCtw>;

/// Builds the crate words of one calorimeter crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaloCtwAggregator {
    crate_id: u8,
    wall: WallType,
}

impl CaloCtwAggregator {
    pub fn new(crate_id: u8, wall: WallType) -> Self {
        Self { crate_id, wall }
    }

    pub fn crate_id(&self) -> u8 {
        self.crate_id
    }

    /// Merges every primitive of the configured crate into one word per clocktick.
    pub fn process(
        &self,
        tps: &TpCollection<CaloTp>,
        mapping: &dyn ElectronicMapping,
        ctw_data: &mut CaloCtwData,
    ) -> Result<AggregationReport, TriggerError> {
        if !tps.is_locked() {
            return Err(TriggerError::InvalidState(
                "calo TP collection must be locked before aggregation".into(),
            ));
        }
        let mut report = AggregationReport::default();
        let mut words: BTreeMap<u32, (CaloCtw, u32)> = BTreeMap::new();
        for tp in tps.iter() {
            let (Some(geom_id), Some(clocktick)) = (tp.geom_id(), tp.clocktick()) else {
                continue;
            };
            let Some(electronic_id) = mapping.to_electronic(&geom_id) else {
                report.unmapped.push((geom_id, clocktick));
                continue;
            };
            if electronic_id.rack != CALO_RACK_ID || electronic_id.crate_id != self.crate_id {
                continue;
            }
            let zone = match (self.wall, geom_id) {
                (WallType::MainWall, GeomId::CaloMainWall { column, .. }) => calo_zone(column),
                (WallType::GammaVeto, GeomId::Gveto { side, wall, .. }) => {
                    usize::from(side * 2 + wall)
                }
                _ => {
                    return Err(TriggerError::InvalidRecord(format!(
                        "{geom_id} is cabled to crate {} of the wrong wall type",
                        self.crate_id
                    )))
                }
            };
            let (word, multiplicity) = words
                .entry(clocktick)
                .or_insert_with(|| (CaloCtw::new(self.crate_id, clocktick, self.wall), 0));
            word.set_channel(electronic_id.board, electronic_id.channel)?;
            *multiplicity = multiplicity.saturating_add(tp.htm_multiplicity());
            word.set_htm_multiplicity(*multiplicity);
            if tp.htm_multiplicity() > 0 {
                word.set_zoning_bit(zone)?;
            }
            if tp.is_lto() {
                word.set_lto(true);
            }
            if tp.is_xt() {
                word.set_xt(true);
            }
            report.primitives += 1;
        }
        for (_, (word, _)) in words {
            ctw_data.push(word);
            report.words += 1;
        }
        Ok(report)
    }
}
