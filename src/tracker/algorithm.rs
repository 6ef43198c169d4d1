use super::memory::LookupMemory;
use super::zone::{zone_start_row, zone_width, ZoneBit, ZoneData};
use crate::clock::ct800_to_ct1600;
use crate::config::TrackerTriggerConfig;
use crate::ctw::geiger::{GeigerCtw, GeigerCtwData};
use crate::ctw::CrateWord;
use crate::error::TriggerError;
use crate::mapping::{ElectronicMapping, GeomId, NLAYERS, NROWS, NSIDES, NZONES};
use crate::tracker::memory::MemoryError;
use serde::Serialize;
use std::collections::BTreeMap;

const LAYER_MEMORY_ADDRESS_SIZE: u32 = NLAYERS as u32;
const LAYER_MEMORY_DATA_SIZE: u32 = 2;
const ROW_MEMORY_ADDRESS_SIZE: u32 = 12;
const ROW_MEMORY_DATA_SIZE: u32 = 3;

/// Hit map of every geiger cell at one 1600 ns clocktick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeigerMatrix {
    pub clocktick_1600ns: u32,
    cells: [[[bool; NROWS]; NLAYERS]; NSIDES],
}

impl GeigerMatrix {
    pub fn new(clocktick_1600ns: u32) -> Self {
        Self {
            clocktick_1600ns,
            cells: [[[false; NROWS]; NLAYERS]; NSIDES],
        }
    }

    /// Marks a cell as hit; panics when the indices are outside the tracker.
    pub fn set(&mut self, side: usize, layer: usize, row: usize) {
        self.cells[side][layer][row] = true;
    }

    pub fn is_hit(&self, side: usize, layer: usize, row: usize) -> bool {
        self.cells[side][layer][row]
    }

    pub fn is_empty(&self) -> bool {
        self.hit_count() == 0
    }

    pub fn hit_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .flatten()
            .filter(|hit| **hit)
            .count()
    }

    pub fn reset(&mut self) {
        self.cells = [[[false; NROWS]; NLAYERS]; NSIDES];
    }
}

/// Level-one tracker record for one 1600 ns clocktick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackerRecord {
    pub clocktick_1600ns: u32,
    pub finale_data_per_zone: [[ZoneData; NZONES]; NSIDES],
    pub zoning_word_pattern: [u16; NSIDES],
    pub zoning_word_near_source: [u16; NSIDES],
    pub single_side_coinc: bool,
    pub decision: bool,
}

impl TrackerRecord {
    pub fn new(clocktick_1600ns: u32) -> Self {
        Self {
            clocktick_1600ns,
            finale_data_per_zone: [[ZoneData::EMPTY; NZONES]; NSIDES],
            zoning_word_pattern: [0; NSIDES],
            zoning_word_near_source: [0; NSIDES],
            single_side_coinc: false,
            decision: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.finale_data_per_zone
            .iter()
            .flatten()
            .all(|data| *data == ZoneData::EMPTY)
    }

    pub fn zone(&self, side: usize, zone: usize) -> ZoneData {
        self.finale_data_per_zone[side][zone]
    }
}

/// Lookup memories of the tracker trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerMemories {
    layer: LookupMemory,
    rows: Vec<LookupMemory>,
}

impl TrackerMemories {
    /// Memories computed from the minimal layer multiplicity.
    pub fn builtin(min_layer_multiplicity: u32) -> Result<Self, MemoryError> {
        let layer = LookupMemory::layer_io(min_layer_multiplicity)?;
        let rows = (0..NZONES)
            .map(|zone| LookupMemory::row_sections(zone_width(zone) as u32))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { layer, rows })
    }

    /// Built-in memories, replaced by the images named in the config.
    pub fn from_config(config: &TrackerTriggerConfig) -> Result<Self, MemoryError> {
        let mut memories = Self::builtin(config.min_layer_multiplicity)?;
        if let Some(path) = &config.layer_memory_file {
            memories.layer = checked(
                LookupMemory::load(path)?,
                LAYER_MEMORY_ADDRESS_SIZE,
                LAYER_MEMORY_DATA_SIZE,
            )?;
        }
        if let Some(path) = &config.row_memory_file {
            let row = checked(
                LookupMemory::load(path)?,
                ROW_MEMORY_ADDRESS_SIZE,
                ROW_MEMORY_DATA_SIZE,
            )?;
            memories.rows = vec![row; NZONES];
        }
        Ok(memories)
    }

    pub fn layer(&self) -> &LookupMemory {
        &self.layer
    }

    pub fn row(&self, zone: usize) -> &LookupMemory {
        &self.rows[zone]
    }
}

fn checked(
    memory: LookupMemory,
    address_size: u32,
    data_size: u32,
) -> Result<LookupMemory, MemoryError> {
    if memory.address_size() != address_size || memory.data_size() != data_size {
        return Err(MemoryError::Geometry {
            address_size: memory.address_size(),
            data_size: memory.data_size(),
        });
    }
    Ok(memory)
}

/// Level-one tracker trigger.
#[derive(Debug, Clone)]
pub struct TrackerTriggerAlgorithm {
    memories: TrackerMemories,
    near_source_layer_limit: usize,
}

impl TrackerTriggerAlgorithm {
    pub fn new(config: &TrackerTriggerConfig) -> Result<Self, TriggerError> {
        Ok(Self {
            memories: TrackerMemories::from_config(config)?,
            near_source_layer_limit: config.near_source_layer_limit as usize,
        })
    }

    pub fn with_memories(memories: TrackerMemories, near_source_layer_limit: usize) -> Self {
        Self {
            memories,
            near_source_layer_limit,
        }
    }

    pub fn memories(&self) -> &TrackerMemories {
        &self.memories
    }

    /// One record per 1600 ns clocktick holding geiger activity.
    pub fn process(
        &self,
        ctw_data: &GeigerCtwData,
        mapping: &dyn ElectronicMapping,
    ) -> Result<Vec<TrackerRecord>, TriggerError> {
        Ok(self
            .build_matrices(ctw_data, mapping)?
            .iter()
            .map(|matrix| self.build_record(matrix))
            .collect())
    }

    /// Folds the 800 ns crate words into one matrix per 1600 ns clocktick.
    pub fn build_matrices(
        &self,
        ctw_data: &GeigerCtwData,
        mapping: &dyn ElectronicMapping,
    ) -> Result<Vec<GeigerMatrix>, TriggerError> {
        let mut per_tick: BTreeMap<u32, Vec<&GeigerCtw>> = BTreeMap::new();
        for word in ctw_data.iter() {
            per_tick
                .entry(ct800_to_ct1600(word.clocktick()))
                .or_default()
                .push(word);
        }
        let mut matrices = Vec::with_capacity(per_tick.len());
        for (clocktick, words) in per_tick {
            let mut matrix = GeigerMatrix::new(clocktick);
            for word in words {
                for electronic_id in word.hit_channels() {
                    match mapping.to_geometric(&electronic_id) {
                        Some(cell @ GeomId::GeigerCell { side, layer, row }) => {
                            if !cell.is_in_detector() {
                                return Err(TriggerError::InvalidRecord(format!(
                                    "geiger channel {electronic_id} maps to {cell} outside the tracker"
                                )));
                            }
                            matrix.set(usize::from(side), usize::from(layer), usize::from(row));
                        }
                        _ => {
                            return Err(TriggerError::InvalidRecord(format!(
                                "geiger channel {electronic_id} has no cell"
                            )))
                        }
                    }
                }
            }
            if !matrix.is_empty() {
                matrices.push(matrix);
            }
        }
        Ok(matrices)
    }

    pub fn build_record(&self, matrix: &GeigerMatrix) -> TrackerRecord {
        let mut record = TrackerRecord::new(matrix.clocktick_1600ns);
        for side in 0..NSIDES {
            for zone in 0..NZONES {
                let data = self.build_zone(matrix, side, zone);
                record.finale_data_per_zone[side][zone] = data;
                if data.has_pattern() {
                    record.zoning_word_pattern[side] |= 1 << zone;
                }
                if data.has_near_source() {
                    record.zoning_word_near_source[side] |= 1 << zone;
                }
            }
        }
        let side_0 = record.zoning_word_pattern[0] != 0;
        let side_1 = record.zoning_word_pattern[1] != 0;
        record.single_side_coinc = side_0 != side_1;
        record.decision = side_0 || side_1;
        record
    }

    fn build_zone(&self, matrix: &GeigerMatrix, side: usize, zone: usize) -> ZoneData {
        let start = zone_start_row(zone);
        let width = zone_width(zone);
        let half = width / 2;
        let mut layer_projection = 0u32;
        let mut row_projection = 0u32;
        let mut data = ZoneData::EMPTY;
        for offset in 0..width {
            for layer in 0..NLAYERS {
                if !matrix.is_hit(side, layer, start + offset) {
                    continue;
                }
                layer_projection |= 1 << layer;
                row_projection |= 1 << offset;
                if layer < self.near_source_layer_limit {
                    let bit = if offset < half {
                        ZoneBit::NszLeft
                    } else {
                        ZoneBit::NszRight
                    };
                    data.set(bit, true);
                }
            }
        }
        let vertical = self.memories.layer().fetch(layer_projection);
        data.set(ZoneBit::Inner, vertical & 0b01 != 0);
        data.set(ZoneBit::Outer, vertical & 0b10 != 0);
        if data.has_pattern() {
            let horizontal = self.memories.row(zone).fetch(row_projection);
            data.set(ZoneBit::Right, horizontal & 0b001 != 0);
            data.set(ZoneBit::Middle, horizontal & 0b010 != 0);
            data.set(ZoneBit::Left, horizontal & 0b100 != 0);
        }
        data
    }
}
