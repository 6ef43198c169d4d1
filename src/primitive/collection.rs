use super::TriggerPrimitive;
use crate::error::TriggerError;
use crate::mapping::GeomId;
use std::collections::{BTreeMap, BTreeSet};

/// Ordered set of primitives produced for one event.
///
/// Locking validates every primitive, rejects two primitives on the same
/// channel and clocktick, and sorts the collection by clocktick. While
/// unlocked, primitives are indexed by the header they carried when pushed.
#[derive(Debug, Clone)]
pub struct TpCollection<T> {
    tps: Vec<T>,
    index: BTreeMap<(GeomId, u32), usize>,
    locked: bool,
}

impl<T> Default for TpCollection<T> {
    fn default() -> Self {
        Self {
            tps: Vec::new(),
            index: BTreeMap::new(),
            locked: false,
        }
    }
}

impl<T: TriggerPrimitive> TpCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a primitive; fails once the collection is locked.
    pub fn push(&mut self, tp: T) -> Result<(), TriggerError> {
        self.ensure_unlocked()?;
        if let (Some(geom_id), Some(clocktick)) = (tp.geom_id(), tp.clocktick()) {
            self.index.entry((geom_id, clocktick)).or_insert(self.tps.len());
        }
        self.tps.push(tp);
        Ok(())
    }

    /// Mutable access to the primitive on `geom_id` at `clocktick`.
    pub fn find_mut(
        &mut self,
        geom_id: &GeomId,
        clocktick: u32,
    ) -> Result<Option<&mut T>, TriggerError> {
        self.ensure_unlocked()?;
        Ok(match self.index.get(&(*geom_id, clocktick)) {
            Some(&position) => self.tps.get_mut(position),
            None => None,
        })
    }

    pub fn lock(&mut self) -> Result<(), TriggerError> {
        self.ensure_unlocked()?;
        let mut seen = BTreeSet::new();
        for tp in &self.tps {
            if !tp.is_valid() {
                return Err(TriggerError::InvalidRecord(format!(
                    "{} collection holds an incomplete primitive",
                    T::KIND
                )));
            }
            if let (Some(geom_id), Some(clocktick)) = (tp.geom_id(), tp.clocktick()) {
                if !seen.insert((geom_id, clocktick)) {
                    return Err(TriggerError::DuplicateChannel { geom_id, clocktick });
                }
            }
        }
        for tp in &mut self.tps {
            if !tp.is_locked() {
                tp.lock()?;
            }
        }
        self.tps
            .sort_by_key(|tp| (tp.clocktick().unwrap_or_default(), tp.geom_id()));
        self.index.clear();
        self.locked = true;
        Ok(())
    }

    pub fn unlock(&mut self) -> Result<(), TriggerError> {
        if !self.locked {
            return Err(TriggerError::InvalidState(format!(
                "{} collection is not locked",
                T::KIND
            )));
        }
        for tp in &mut self.tps {
            tp.unlock()?;
        }
        self.index = self
            .tps
            .iter()
            .enumerate()
            .filter_map(|(position, tp)| Some(((tp.geom_id()?, tp.clocktick()?), position)))
            .collect();
        self.locked = false;
        Ok(())
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn len(&self) -> usize {
        self.tps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.tps.iter()
    }

    /// Smallest and largest clocktick held.
    pub fn clocktick_range(&self) -> Option<(u32, u32)> {
        let mut ticks = self.tps.iter().filter_map(|tp| tp.clocktick());
        let first = ticks.next()?;
        Some(ticks.fold((first, first), |(lo, hi), ct| (lo.min(ct), hi.max(ct))))
    }

    /// Primitives sampled at `clocktick`.
    pub fn at_clocktick(&self, clocktick: u32) -> impl Iterator<Item = &T> {
        self.tps
            .iter()
            .filter(move |tp| tp.clocktick() == Some(clocktick))
    }

    fn ensure_unlocked(&self) -> Result<(), TriggerError> {
        if self.locked {
            return Err(TriggerError::locked(&format!("{} collection", T::KIND)));
        }
        Ok(())
    }
}
