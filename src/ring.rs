use crate::error::TriggerError;

/// Fixed-capacity ring buffer that evicts its oldest entry when full.
///
/// Slots are allocated once at construction; pushes only move indices.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<Option<T>>,
    head: usize,
    len: usize,
}

impl<T> RingBuffer<T> {
    pub fn with_capacity(capacity: usize) -> Result<Self, TriggerError> {
        if capacity == 0 {
            return Err(TriggerError::InvalidState(
                "ring buffer capacity must be positive".into(),
            ));
        }
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Ok(Self {
            slots,
            head: 0,
            len: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Appends `value`, returning the evicted oldest entry when full.
    pub fn push(&mut self, value: T) -> Option<T> {
        let capacity = self.capacity();
        let tail = (self.head + self.len) % capacity;
        let evicted = self.slots[tail].replace(value);
        if self.len == capacity {
            self.head = (self.head + 1) % capacity;
        } else {
            self.len += 1;
        }
        evicted
    }

    /// Oldest entry.
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Newest entry.
    pub fn back(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|idx| self.get(idx))
    }

    /// Entry `index` positions after the oldest.
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        self.slots[(self.head + index) % self.capacity()].as_ref()
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        (0..self.len).filter_map(move |idx| self.get(idx))
    }
}
