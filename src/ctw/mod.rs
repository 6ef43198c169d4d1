//! Crate trigger words: per-crate aggregation of same-clocktick primitives.

pub mod calo;
pub mod geiger;

use crate::mapping::GeomId;

/// Common surface of crate trigger words.
pub trait CrateWord {
    fn crate_id(&self) -> u8;
    fn clocktick(&self) -> u32;
}

/// Append-only store of crate words across crates.
#[derive(Debug, Clone)]
pub struct CtwData<C> {
    words: Vec<C>,
}

impl<C> Default for CtwData<C> {
    fn default() -> Self {
        Self { words: Vec::new() }
    }
}

impl<C: CrateWord> CtwData<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, word: C) {
        self.words.push(word);
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &C> {
        self.words.iter()
    }

    pub fn clocktick_range(&self) -> Option<(u32, u32)> {
        let mut ticks = self.words.iter().map(CrateWord::clocktick);
        let first = ticks.next()?;
        Some(ticks.fold((first, first), |(lo, hi), ct| (lo.min(ct), hi.max(ct))))
    }

    /// Words of every crate sampled at `clocktick`.
    pub fn at_clocktick(&self, clocktick: u32) -> impl Iterator<Item = &C> {
        self.words
            .iter()
            .filter(move |word| word.clocktick() == clocktick)
    }
}

/// Outcome of one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationReport {
    /// Primitives merged into words of the configured crate.
    pub primitives: u64,
    /// Words appended.
    pub words: u64,
    /// Primitives dropped because their channel has no electronic id, with
    /// their clocktick.
    pub unmapped: Vec<(GeomId, u32)>,
}
