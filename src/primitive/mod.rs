//! Trigger primitives: per-channel bit records sampled on the front-end clocks.

pub mod calo;
pub mod collection;
pub mod encoder;
pub mod geiger;

use crate::error::TriggerError;
use crate::mapping::GeomId;

/// Common surface of calorimeter and geiger primitives.
pub trait TriggerPrimitive {
    /// Short label used in error messages.
    const KIND: &'static str;

    fn hit_id(&self) -> Option<u32>;
    fn geom_id(&self) -> Option<GeomId>;
    fn clocktick(&self) -> Option<u32>;
    fn is_locked(&self) -> bool;
    fn lock(&mut self) -> Result<(), TriggerError>;
    fn unlock(&mut self) -> Result<(), TriggerError>;

    /// A primitive is valid once its header is complete.
    fn is_valid(&self) -> bool {
        self.hit_id().is_some() && self.geom_id().is_some() && self.clocktick().is_some()
    }
}

/// Header shared by every primitive along with its lock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct TpHeader {
    pub(crate) hit_id: Option<u32>,
    pub(crate) geom_id: Option<GeomId>,
    pub(crate) clocktick: Option<u32>,
    locked: bool,
}

impl TpHeader {
    pub(crate) fn ensure_unlocked(&self, kind: &str) -> Result<(), TriggerError> {
        if self.locked {
            return Err(TriggerError::locked(kind));
        }
        Ok(())
    }

    pub(crate) fn set(
        &mut self,
        kind: &str,
        hit_id: u32,
        geom_id: GeomId,
        clocktick: u32,
    ) -> Result<(), TriggerError> {
        self.ensure_unlocked(kind)?;
        self.hit_id = Some(hit_id);
        self.geom_id = Some(geom_id);
        self.clocktick = Some(clocktick);
        Ok(())
    }

    pub(crate) fn is_locked(&self) -> bool {
        self.locked
    }

    pub(crate) fn lock(&mut self, kind: &str) -> Result<(), TriggerError> {
        self.ensure_unlocked(kind)?;
        let missing = match (self.hit_id, self.geom_id, self.clocktick) {
            (None, _, _) => Some("hit id"),
            (_, None, _) => Some("geometry id"),
            (_, _, None) => Some("clocktick"),
            _ => None,
        };
        if let Some(field) = missing {
            return Err(TriggerError::InvalidRecord(format!("{kind} has no {field}")));
        }
        self.locked = true;
        Ok(())
    }

    pub(crate) fn unlock(&mut self, kind: &str) -> Result<(), TriggerError> {
        if !self.locked {
            return Err(TriggerError::InvalidState(format!("{kind} is not locked")));
        }
        self.locked = false;
        Ok(())
    }
}
