use crate::mapping::NZONES;
use serde::Serialize;
use std::fmt;

const ZONE_START_ROW: [usize; NZONES] = [0, 9, 21, 33, 45, 57, 68, 80, 92, 104];
const ZONE_STOP_ROW: [usize; NZONES] = [8, 20, 32, 44, 56, 67, 79, 91, 103, 112];

/// Widest tracker zone, in rows.
pub const ZONE_MAX_WIDTH: usize = 12;
/// Width of the per-zone data word.
pub const DATA_FULL_BITSET_SIZE: u32 = 7;

/// First row of a tracker zone.
pub fn zone_start_row(zone: usize) -> usize {
    ZONE_START_ROW[zone]
}

/// Last row of a tracker zone.
pub fn zone_stop_row(zone: usize) -> usize {
    ZONE_STOP_ROW[zone]
}

pub fn zone_width(zone: usize) -> usize {
    zone_stop_row(zone) - zone_start_row(zone) + 1
}

/// Tracker zone containing `row`.
pub fn zone_of_row(row: usize) -> Option<usize> {
    (0..NZONES).find(|&zone| (zone_start_row(zone)..=zone_stop_row(zone)).contains(&row))
}

/// Bit positions of the per-zone data word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ZoneBit {
    Inner = 0,
    Outer = 1,
    Right = 2,
    Middle = 3,
    Left = 4,
    NszRight = 5,
    NszLeft = 6,
}

impl ZoneBit {
    pub fn mask(self) -> u8 {
        1 << self as u8
    }
}

/// Seven-bit datum computed for one zone at one clocktick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize)]
pub struct ZoneData(u8);

impl ZoneData {
    pub const EMPTY: ZoneData = ZoneData(0);

    pub fn from_bits(bits: u8) -> Self {
        ZoneData(bits & ((1 << DATA_FULL_BITSET_SIZE) - 1))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn test(self, bit: ZoneBit) -> bool {
        self.0 & bit.mask() != 0
    }

    pub fn set(&mut self, bit: ZoneBit, value: bool) {
        if value {
            self.0 |= bit.mask();
        } else {
            self.0 &= !bit.mask();
        }
    }

    /// Inner or outer track segment present.
    pub fn has_pattern(self) -> bool {
        self.test(ZoneBit::Inner) || self.test(ZoneBit::Outer)
    }

    pub fn has_near_source(self) -> bool {
        self.test(ZoneBit::NszLeft) || self.test(ZoneBit::NszRight)
    }

    /// Left/mid/right horizontal pattern as `(left, mid, right)`.
    pub fn horizontal(self) -> (bool, bool, bool) {
        (
            self.test(ZoneBit::Left),
            self.test(ZoneBit::Middle),
            self.test(ZoneBit::Right),
        )
    }

    /// OR of two data words.
    pub fn union(self, other: ZoneData) -> ZoneData {
        ZoneData(self.0 | other.0)
    }
}

impl fmt::Display for ZoneData {
    /// Most significant bit first: `[NSZL NSZR L M R O I]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:07b}", self.0)
    }
}
