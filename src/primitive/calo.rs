use super::{TpHeader, TriggerPrimitive};
use crate::error::TriggerError;
use crate::mapping::GeomId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of the calorimeter primitive data word.
pub const CALO_TP_BITSET_SIZE: u32 = 5;
/// Width of the high-threshold multiplicity field.
pub const HTM_BITSET_SIZE: u32 = 2;
/// Largest multiplicity representable on two bits.
pub const HTM_MAX: u32 = (1 << HTM_BITSET_SIZE) - 1;

/// Bit positions of the calorimeter primitive data word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CaloTpBit {
    Htm0 = 0,
    Htm1 = 1,
    Lto = 2,
    Xt = 3,
    Spare = 4,
}

impl CaloTpBit {
    fn mask(self) -> u8 {
        1 << self as u8
    }
}

/// Encodes a multiplicity on two saturating bits: 0, 1, 2, >=3 map to 00, 01, 10, 11.
pub fn encode_htm(multiplicity: u32) -> u8 {
    multiplicity.min(HTM_MAX) as u8
}

/// Discriminator thresholds applied to calorimeter amplitudes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaloThresholds {
    pub low: f64,
    pub high: f64,
}

/// Discriminator outcome for one amplitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmplitudeLevel {
    BelowLow,
    LowOnly,
    High,
}

impl AmplitudeLevel {
    pub fn classify(amplitude: f64, thresholds: &CaloThresholds) -> Self {
        if amplitude > thresholds.high {
            AmplitudeLevel::High
        } else if amplitude >= thresholds.low {
            AmplitudeLevel::LowOnly
        } else {
            AmplitudeLevel::BelowLow
        }
    }
}

/// Calorimeter trigger primitive sampled at 25 ns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaloTp {
    header: TpHeader,
    bits: u8,
}

impl CaloTp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_header(
        &mut self,
        hit_id: u32,
        geom_id: GeomId,
        clocktick_25ns: u32,
    ) -> Result<(), TriggerError> {
        self.header.ensure_unlocked(Self::KIND)?;
        if !geom_id.is_calorimeter() {
            return Err(TriggerError::InvalidRecord(format!(
                "{geom_id} is not a calorimeter block"
            )));
        }
        self.header.set(Self::KIND, hit_id, geom_id, clocktick_25ns)
    }

    /// Overwrites the data word from one discriminated amplitude.
    ///
    /// [`CaloTpEncoder`](super::encoder::CaloTpEncoder) classifies amplitudes
    /// before calling this; [`CaloTp::set_amplitude`] takes the raw value.
    pub fn set_data(
        &mut self,
        level: AmplitudeLevel,
        xt: bool,
        spare: bool,
    ) -> Result<(), TriggerError> {
        self.header.ensure_unlocked(Self::KIND)?;
        self.bits = 0;
        match level {
            AmplitudeLevel::High => self.write_htm(1),
            AmplitudeLevel::LowOnly => self.write_flag(CaloTpBit::Lto, true),
            AmplitudeLevel::BelowLow => {}
        }
        self.write_flag(CaloTpBit::Xt, xt);
        self.write_flag(CaloTpBit::Spare, spare);
        Ok(())
    }

    /// Accumulates one more amplitude on the same channel and clocktick.
    pub fn update_data(
        &mut self,
        level: AmplitudeLevel,
        xt: bool,
        spare: bool,
    ) -> Result<(), TriggerError> {
        self.header.ensure_unlocked(Self::KIND)?;
        match level {
            AmplitudeLevel::High => self.write_htm(self.htm_multiplicity() + 1),
            AmplitudeLevel::LowOnly => self.write_flag(CaloTpBit::Lto, true),
            AmplitudeLevel::BelowLow => {}
        }
        if xt {
            self.write_flag(CaloTpBit::Xt, true);
        }
        if spare {
            self.write_flag(CaloTpBit::Spare, true);
        }
        Ok(())
    }

    /// Discriminates `amplitude` against `thresholds`, then behaves as [`CaloTp::set_data`].
    pub fn set_amplitude(
        &mut self,
        amplitude: f64,
        thresholds: &CaloThresholds,
        xt: bool,
        spare: bool,
    ) -> Result<(), TriggerError> {
        self.set_data(AmplitudeLevel::classify(amplitude, thresholds), xt, spare)
    }

    pub fn update_amplitude(
        &mut self,
        amplitude: f64,
        thresholds: &CaloThresholds,
        xt: bool,
        spare: bool,
    ) -> Result<(), TriggerError> {
        self.update_data(AmplitudeLevel::classify(amplitude, thresholds), xt, spare)
    }

    /// Sets the multiplicity, saturating at the two-bit maximum.
    pub fn set_htm_multiplicity(&mut self, multiplicity: u32) -> Result<(), TriggerError> {
        self.header.ensure_unlocked(Self::KIND)?;
        self.write_htm(multiplicity);
        Ok(())
    }

    /// Sets the raw two-bit HTM field.
    pub fn set_htm_bits(&mut self, bits: u8) -> Result<(), TriggerError> {
        self.header.ensure_unlocked(Self::KIND)?;
        if u32::from(bits) > HTM_MAX {
            return Err(TriggerError::InvalidMultiplicity {
                field: "HTM",
                value: u32::from(bits),
                width: HTM_BITSET_SIZE,
            });
        }
        self.write_htm(u32::from(bits));
        Ok(())
    }

    /// Clears everything and returns to the unlocked state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn htm_bits(&self) -> u8 {
        self.bits & (CaloTpBit::Htm0.mask() | CaloTpBit::Htm1.mask())
    }

    pub fn htm_multiplicity(&self) -> u32 {
        u32::from(self.htm_bits())
    }

    pub fn is_lto(&self) -> bool {
        self.bits & CaloTpBit::Lto.mask() != 0
    }

    pub fn is_xt(&self) -> bool {
        self.bits & CaloTpBit::Xt.mask() != 0
    }

    pub fn is_spare(&self) -> bool {
        self.bits & CaloTpBit::Spare.mask() != 0
    }

    /// Raw five-bit data word.
    pub fn bits(&self) -> u8 {
        self.bits
    }

    fn write_htm(&mut self, multiplicity: u32) {
        self.bits = (self.bits & !(CaloTpBit::Htm0.mask() | CaloTpBit::Htm1.mask()))
            | encode_htm(multiplicity);
    }

    fn write_flag(&mut self, bit: CaloTpBit, value: bool) {
        if value {
            self.bits |= bit.mask();
        } else {
            self.bits &= !bit.mask();
        }
    }
}

impl TriggerPrimitive for CaloTp {
    const KIND: &'static str = "calo TP";

    fn hit_id(&self) -> Option<u32> {
        self.header.hit_id
    }

    fn geom_id(&self) -> Option<GeomId> {
        self.header.geom_id
    }

    fn clocktick(&self) -> Option<u32> {
        self.header.clocktick
    }

    fn is_locked(&self) -> bool {
        self.header.is_locked()
    }

    fn lock(&mut self) -> Result<(), TriggerError> {
        self.header.lock(Self::KIND)
    }

    fn unlock(&mut self) -> Result<(), TriggerError> {
        self.header.unlock(Self::KIND)
    }
}

impl fmt::Display for CaloTp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "calo TP ")?;
        match self.header.geom_id {
            Some(geom_id) => write!(f, "{geom_id}")?,
            None => write!(f, "[unset]")?,
        }
        if let Some(clocktick) = self.header.clocktick {
            write!(f, " @{clocktick}")?;
        }
        write!(f, " [{:05b}]", self.bits)
    }
}
