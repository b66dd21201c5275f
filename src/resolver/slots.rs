//! Write-once slot array indexed by origin position.
//!
//! Each slot starts empty and is filled exactly once, in any order, by the
//! task resolving that reference. Readers see a consistent per-slot view; no
//! ordering lock is needed because no index is ever written twice.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use thiserror::Error;

use crate::models::MediaItem;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotError {
    #[error("slot {index} out of range (len {len})")]
    OutOfRange { index: usize, len: usize },
    #[error("slot {index} already filled")]
    AlreadyFilled { index: usize },
}

#[derive(Debug)]
pub struct MediaSlots {
    generation: u64,
    slots: RwLock<Vec<Option<MediaItem>>>,
    remaining: AtomicUsize,
}

impl MediaSlots {
    pub fn new(len: usize, generation: u64) -> Self {
        Self {
            generation,
            slots: RwLock::new(vec![None; len]),
            remaining: AtomicUsize::new(len),
        }
    }

    /// Builds an already-populated array (for hosts that know dimensions up front).
    pub fn from_items(items: Vec<Option<MediaItem>>, generation: u64) -> Self {
        let remaining = items.iter().filter(|s| s.is_none()).count();
        Self {
            generation,
            slots: RwLock::new(items),
            remaining: AtomicUsize::new(remaining),
        }
    }

    /// Fills slot `index`. Returns the number of slots still empty.
    pub fn fill(&self, index: usize, item: MediaItem) -> Result<usize, SlotError> {
        let mut slots = self.slots.write();
        let len = slots.len();
        let slot = slots
            .get_mut(index)
            .ok_or(SlotError::OutOfRange { index, len })?;
        if slot.is_some() {
            return Err(SlotError::AlreadyFilled { index });
        }
        *slot = Some(item);
        Ok(self.remaining.fetch_sub(1, Ordering::AcqRel) - 1)
    }

    pub fn get(&self, index: usize) -> Option<MediaItem> {
        self.slots.read().get(index).cloned().flatten()
    }

    pub fn is_resolved(&self, index: usize) -> bool {
        matches!(self.slots.read().get(index), Some(Some(_)))
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn resolved_count(&self) -> usize {
        self.len() - self.remaining.load(Ordering::Acquire)
    }

    pub fn is_complete(&self) -> bool {
        self.remaining.load(Ordering::Acquire) == 0
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Copy of every slot in origin order.
    pub fn snapshot(&self) -> Vec<Option<MediaItem>> {
        self.slots.read().clone()
    }

    /// Resolution mask in origin order.
    pub fn resolved_mask(&self) -> Vec<bool> {
        self.slots.read().iter().map(Option::is_some).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaRef;

    fn item(index: usize) -> MediaItem {
        MediaItem::loaded(&MediaRef::new(format!("{index}.jpg")), index, 10, 10)
    }

    #[test]
    fn test_fill_out_of_order() {
        let slots = MediaSlots::new(3, 1);
        assert_eq!(slots.fill(2, item(2)), Ok(2));
        assert_eq!(slots.fill(0, item(0)), Ok(1));
        assert!(!slots.is_complete());
        assert_eq!(slots.resolved_mask(), vec![true, false, true]);
        assert_eq!(slots.fill(1, item(1)), Ok(0));
        assert!(slots.is_complete());

        let indices: Vec<usize> = slots
            .snapshot()
            .into_iter()
            .flatten()
            .map(|i| i.original_index)
            .collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_write_once() {
        let slots = MediaSlots::new(2, 1);
        slots.fill(1, item(1)).unwrap();
        assert_eq!(
            slots.fill(1, item(1)),
            Err(SlotError::AlreadyFilled { index: 1 })
        );
        assert_eq!(slots.resolved_count(), 1);
    }

    #[test]
    fn test_out_of_range() {
        let slots = MediaSlots::new(1, 1);
        assert_eq!(
            slots.fill(5, item(5)),
            Err(SlotError::OutOfRange { index: 5, len: 1 })
        );
    }

    #[test]
    fn test_empty_is_complete() {
        let slots = MediaSlots::new(0, 1);
        assert!(slots.is_complete());
        assert!(slots.is_empty());
    }

    #[test]
    fn test_from_items() {
        let slots = MediaSlots::from_items(vec![Some(item(0)), None], 7);
        assert_eq!(slots.resolved_count(), 1);
        assert!(slots.is_resolved(0));
        assert!(!slots.is_resolved(1));
        assert!(!slots.is_resolved(2));
        assert_eq!(slots.generation(), 7);
    }
}
