use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;
use xxhash_rust::xxh3::xxh3_64;

use crate::layout::justified::{JustifiedLayout, RowBreak};
use crate::models::{MediaItem, Row};

/// Default number of cached layouts to keep in memory.
const DEFAULT_CACHE_ENTRIES: usize = 8;

/// Key for the layout cache, combining container width and list hash.
///
/// Widths are not bucketed: rows must span the container exactly, so a
/// partition computed for one width is never reused for another.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
struct CacheKey {
    container_width: u32,
    list_hash: u64,
}

/// Cached layout data: the row breaks that can reconstruct the full layout.
#[derive(Debug, Clone)]
struct CachedLayout {
    breaks: Vec<RowBreak>,
    /// Number of items this layout was computed for
    item_count: usize,
}

/// In-memory LRU of row partitions keyed by (container width, list hash).
///
/// The list hash covers the source ref, dimensions and origin index of every
/// resolved item in order, so any newly resolved slot or replaced reference
/// list produces a different key.
pub struct LayoutCache {
    cache: Mutex<LruCache<CacheKey, CachedLayout>>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_ENTRIES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Computes a fast hash of the resolved item list.
    pub fn compute_list_hash(items: &[MediaItem]) -> u64 {
        let mut hasher_input = Vec::with_capacity(items.len() * 64);

        for item in items {
            hasher_input.extend_from_slice(item.source_ref.as_bytes());
            hasher_input.push(0);
            hasher_input.extend_from_slice(&item.width.to_le_bytes());
            hasher_input.extend_from_slice(&item.height.to_le_bytes());
            hasher_input.extend_from_slice(&(item.original_index as u64).to_le_bytes());
        }

        xxh3_64(&hasher_input)
    }

    /// Returns cached breaks, or None on a miss or item-count mismatch.
    pub fn get_breaks(
        &self,
        container_width: u32,
        list_hash: u64,
        item_count: usize,
    ) -> Option<Vec<RowBreak>> {
        let key = CacheKey {
            container_width,
            list_hash,
        };
        let mut cache = self.cache.lock();
        let entry = cache.get(&key)?;
        if entry.item_count != item_count {
            return None;
        }
        Some(entry.breaks.clone())
    }

    pub fn set(&self, container_width: u32, list_hash: u64, breaks: Vec<RowBreak>, item_count: usize) {
        let key = CacheKey {
            container_width,
            list_hash,
        };
        self.cache.lock().put(key, CachedLayout { breaks, item_count });
    }

    /// Clears the entire cache.
    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Combines row packing with caching.
pub struct CachedLayoutComputer {
    pub layout: JustifiedLayout,
    pub cache: LayoutCache,
}

impl CachedLayoutComputer {
    pub fn new() -> Self {
        Self::with_layout(JustifiedLayout::default())
    }

    pub fn with_layout(layout: JustifiedLayout) -> Self {
        Self {
            layout,
            cache: LayoutCache::new(),
        }
    }

    /// Packs `items`, reusing a cached partition when one exists.
    pub fn compute(&self, items: &[MediaItem], container_width: u32) -> Vec<Row> {
        if items.is_empty() || container_width == 0 {
            return Vec::new();
        }

        let list_hash = LayoutCache::compute_list_hash(items);

        if let Some(breaks) = self.cache.get_breaks(container_width, list_hash, items.len()) {
            trace!(container_width, rows = breaks.len(), "Layout cache hit");
            return self.layout.rows_from_breaks(items, &breaks, container_width);
        }

        let breaks = self.layout.compute_breaks(items, container_width);
        let rows = self.layout.rows_from_breaks(items, &breaks, container_width);
        self.cache.set(container_width, list_hash, breaks, items.len());
        rows
    }

    /// Replaces the packing parameters and drops every cached partition.
    pub fn set_layout(&mut self, layout: JustifiedLayout) {
        self.layout = layout;
        self.cache.clear();
    }
}

impl Default for CachedLayoutComputer {
    fn default() -> Self {
        Self::new()
    }
}
