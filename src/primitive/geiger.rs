use super::{TpHeader, TriggerPrimitive};
use crate::error::TriggerError;
use crate::mapping::GeomId;

/// Geiger cell trigger primitive sampled at 800 ns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GeigerTp {
    header: TpHeader,
}

impl GeigerTp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_header(
        &mut self,
        hit_id: u32,
        geom_id: GeomId,
        clocktick_800ns: u32,
    ) -> Result<(), TriggerError> {
        self.header.ensure_unlocked(Self::KIND)?;
        if !matches!(geom_id, GeomId::GeigerCell { .. }) {
            return Err(TriggerError::InvalidRecord(format!(
                "{geom_id} is not a geiger cell"
            )));
        }
        self.header.set(Self::KIND, hit_id, geom_id, clocktick_800ns)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl TriggerPrimitive for GeigerTp {
    const KIND: &'static str = "geiger TP";

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
