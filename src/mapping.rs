use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Detector sides (Italy/France walls).
pub const NSIDES: usize = 2;
/// Trigger zones per side.
pub const NZONES: usize = 10;
/// Geiger layers per side.
pub const NLAYERS: usize = 9;
/// Geiger rows per side.
pub const NROWS: usize = 113;
/// Calorimeter main-wall columns per side.
pub const CALO_COLUMNS: usize = 20;
/// Calorimeter main-wall rows per column.
pub const CALO_ROWS: usize = 13;
/// Gamma-veto walls per side (bottom, top).
pub const GVETO_WALLS: usize = 2;
/// Gamma-veto blocks per wall.
pub const GVETO_COLUMNS: usize = 16;

pub const GEIGER_RACK_ID: u8 = 2;
pub const CALO_RACK_ID: u8 = 3;
/// Crate hosting the gamma-veto boards.
pub const GVETO_CRATE_ID: u8 = 2;
/// Board slot occupied by the crate control board.
pub const CONTROL_BOARD_SLOT: u8 = 10;
/// Geiger crates along the tracker rows.
pub const GEIGER_CRATES: u8 = 3;
/// Rows read out by one geiger crate.
pub const GEIGER_ROWS_PER_CRATE: usize = 38;
/// Rows read out by one geiger front-end board.
pub const GEIGER_ROWS_PER_BOARD: usize = 2;
/// Channels on one geiger front-end board.
pub const GEIGER_CHANNELS_PER_BOARD: u8 =
    (GEIGER_ROWS_PER_BOARD * NSIDES * NLAYERS) as u8;

/// Geometric identifier of a detector channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeomId {
    CaloMainWall { side: u8, column: u8, row: u8 },
    Gveto { side: u8, wall: u8, column: u8 },
    GeigerCell { side: u8, layer: u8, row: u8 },
}

impl GeomId {
    pub const CALO_MAIN_WALL_TYPE: u32 = 1302;
    pub const GVETO_TYPE: u32 = 1252;
    pub const GEIGER_CELL_TYPE: u32 = 1204;

    /// Geometry category code.
    pub fn type_code(&self) -> u32 {
        match self {
            GeomId::CaloMainWall { .. } => Self::CALO_MAIN_WALL_TYPE,
            GeomId::Gveto { .. } => Self::GVETO_TYPE,
            GeomId::GeigerCell { .. } => Self::GEIGER_CELL_TYPE,
        }
    }

    pub fn side(&self) -> u8 {
        match *self {
            GeomId::CaloMainWall { side, .. }
            | GeomId::Gveto { side, .. }
            | GeomId::GeigerCell { side, .. } => side,
        }
    }

    pub fn is_calorimeter(&self) -> bool {
        !matches!(self, GeomId::GeigerCell { .. })
    }

    /// Returns true when every index lies inside the detector.
    pub fn is_in_detector(&self) -> bool {
        match *self {
            GeomId::CaloMainWall { side, column, row } => {
                usize::from(side) < NSIDES
                    && usize::from(column) < CALO_COLUMNS
                    && usize::from(row) < CALO_ROWS
            }
            GeomId::Gveto { side, wall, column } => {
                usize::from(side) < NSIDES
                    && usize::from(wall) < GVETO_WALLS
                    && usize::from(column) < GVETO_COLUMNS
            }
            GeomId::GeigerCell { side, layer, row } => {
                usize::from(side) < NSIDES
                    && usize::from(layer) < NLAYERS
                    && usize::from(row) < NROWS
            }
        }
    }
}

impl fmt::Display for GeomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            GeomId::CaloMainWall { side, column, row } => {
                write!(f, "[{}:0.{side}.{column}.{row}]", Self::CALO_MAIN_WALL_TYPE)
            }
            GeomId::Gveto { side, wall, column } => {
                write!(f, "[{}:0.{side}.{wall}.{column}]", Self::GVETO_TYPE)
            }
            GeomId::GeigerCell { side, layer, row } => {
                write!(f, "[{}:0.{side}.{layer}.{row}]", Self::GEIGER_CELL_TYPE)
            }
        }
    }
}

/// Electronic address of a readout channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElectronicId {
    pub rack: u8,
    pub crate_id: u8,
    pub board: u8,
    pub channel: u8,
}

impl ElectronicId {
    pub fn new(rack: u8, crate_id: u8, board: u8, channel: u8) -> Self {
        Self {
            rack,
            crate_id,
            board,
            channel,
        }
    }
}

impl fmt::Display for ElectronicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}.{}.{}.{}]",
            self.rack, self.crate_id, self.board, self.channel
        )
    }
}

/// Geometry to electronics lookup.
///
/// Implementations are pure tables: callers borrow them for the duration of a
/// single processing call and never mutate them.
pub trait ElectronicMapping {
    fn to_electronic(&self, geom_id: &GeomId) -> Option<ElectronicId>;
    fn to_geometric(&self, electronic_id: &ElectronicId) -> Option<GeomId>;
}

/// Bidirectional table-backed mapping.
#[derive(Debug, Clone, Default)]
pub struct TableMapping {
    forward: BTreeMap<GeomId, ElectronicId>,
    reverse: BTreeMap<ElectronicId, GeomId>,
}

impl TableMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the mapping for every channel of the detector.
    pub fn full() -> Self {
        let mut table = Self::new();
        for side in 0..NSIDES as u8 {
            for column in 0..CALO_COLUMNS as u8 {
                for row in 0..CALO_ROWS as u8 {
                    let geom = GeomId::CaloMainWall { side, column, row };
                    table.insert(geom, default_electronic_id(&geom));
                }
            }
            for wall in 0..GVETO_WALLS as u8 {
                for column in 0..GVETO_COLUMNS as u8 {
                    let geom = GeomId::Gveto { side, wall, column };
                    table.insert(geom, default_electronic_id(&geom));
                }
            }
            for layer in 0..NLAYERS as u8 {
                for row in 0..NROWS as u8 {
                    let geom = GeomId::GeigerCell { side, layer, row };
                    table.insert(geom, default_electronic_id(&geom));
                }
            }
        }
        table
    }

    /// Registers (or replaces) a channel.
    pub fn insert(&mut self, geom_id: GeomId, electronic_id: ElectronicId) {
        if let Some(previous) = self.forward.insert(geom_id, electronic_id) {
            self.reverse.remove(&previous);
        }
        self.reverse.insert(electronic_id, geom_id);
    }

    /// Masks a channel; returns its former electronic id.
    pub fn remove(&mut self, geom_id: &GeomId) -> Option<ElectronicId> {
        let electronic_id = self.forward.remove(geom_id)?;
        self.reverse.remove(&electronic_id);
        Some(electronic_id)
    }

    /// Builder flavour of [`TableMapping::remove`].
    pub fn without(mut self, geom_id: GeomId) -> Self {
        self.remove(&geom_id);
        self
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

impl ElectronicMapping for TableMapping {
    fn to_electronic(&self, geom_id: &GeomId) -> Option<ElectronicId> {
        self.forward.get(geom_id).copied()
    }

    fn to_geometric(&self, electronic_id: &ElectronicId) -> Option<GeomId> {
        self.reverse.get(electronic_id).copied()
    }
}

/// Cabling rule of the detector readout.
fn default_electronic_id(geom_id: &GeomId) -> ElectronicId {
    match *geom_id {
        GeomId::CaloMainWall { side, column, row } => {
            ElectronicId::new(CALO_RACK_ID, side, board_slot(column), row)
        }
        GeomId::Gveto { side, wall, column } => {
            ElectronicId::new(CALO_RACK_ID, GVETO_CRATE_ID, side * 2 + wall, column)
        }
        GeomId::GeigerCell { side, layer, row } => {
            let row = usize::from(row);
            let crate_id = row / GEIGER_ROWS_PER_CRATE;
            let crate_row = row % GEIGER_ROWS_PER_CRATE;
            let board = (crate_row / GEIGER_ROWS_PER_BOARD) as u8;
            let row_in_board = (crate_row % GEIGER_ROWS_PER_BOARD) as u8;
            let channel = row_in_board * (NSIDES * NLAYERS) as u8 + side * NLAYERS as u8 + layer;
            ElectronicId::new(GEIGER_RACK_ID, crate_id as u8, board_slot(board), channel)
        }
    }
}

fn board_slot(index: u8) -> u8 {
    if index < CONTROL_BOARD_SLOT {
        index
    } else {
        index + 1
    }
}

/// Inverse of the board slot numbering; `None` for the control slot.
pub fn board_index(slot: u8) -> Option<u8> {
    match slot.cmp(&CONTROL_BOARD_SLOT) {
        std::cmp::Ordering::Less => Some(slot),
        std::cmp::Ordering::Equal => None,
        std::cmp::Ordering::Greater => Some(slot - 1),
    }
}

/// Calorimeter trigger zone of a main-wall column.
pub fn calo_zone(column: u8) -> usize {
    usize::from(column) / (CALO_COLUMNS / NZONES)
}
