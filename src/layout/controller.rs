//! Resize- and metadata-driven relayout.
//!
//! The controller owns no item data of its own; it keeps the latest resolved
//! snapshot and container width, coalesces change notifications into a single
//! pending frame, and republishes rows when that frame runs.

use std::sync::Arc;

use flume::{Receiver, Sender};
use tracing::{debug, trace};

use crate::layout::justified::JustifiedLayout;
use crate::layout::layout_cache::{CachedLayoutComputer, LayoutCache};
use crate::models::{MediaItem, Row};

/// Handle for the single outstanding frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameToken(u64);

/// Published layout.
#[derive(Debug, Clone)]
pub struct LayoutSnapshot {
    pub revision: u64,
    pub container_width: u32,
    pub rows: Arc<Vec<Row>>,
}

pub struct ResponsiveLayout {
    computer: CachedLayoutComputer,
    container_width: Option<u32>,
    items: Vec<MediaItem>,
    pending_frame: Option<FrameToken>,
    next_token: u64,
    current: LayoutSnapshot,
    subscribers: Vec<Sender<LayoutSnapshot>>,
    torn_down: bool,
}

impl ResponsiveLayout {
    pub fn new(layout: JustifiedLayout) -> Self {
        Self::with_cache(layout, LayoutCache::new())
    }

    pub fn with_cache(layout: JustifiedLayout, cache: LayoutCache) -> Self {
        Self {
            computer: CachedLayoutComputer { layout, cache },
            container_width: None,
            items: Vec::new(),
            pending_frame: None,
            next_token: 0,
            current: LayoutSnapshot {
                revision: 0,
                container_width: 0,
                rows: Arc::new(Vec::new()),
            },
            subscribers: Vec::new(),
            torn_down: false,
        }
    }

    /// Container was resized. Returns a token when the host must schedule a
    /// new frame; `None` means a frame is already pending (or the controller
    /// is torn down).
    pub fn on_resize(&mut self, container_width: u32) -> Option<FrameToken> {
        if self.torn_down {
            return None;
        }
        if self.container_width == Some(container_width) {
            return None;
        }
        trace!(container_width, "Container resized");
        self.container_width = Some(container_width);
        self.request_frame()
    }

    /// Resolved-item set changed. Unresolved slots are skipped; order follows
    /// the original sequence.
    pub fn on_items_changed(&mut self, slots: &[Option<MediaItem>]) -> Option<FrameToken> {
        if self.torn_down {
            return None;
        }
        self.items = slots.iter().flatten().cloned().collect();
        trace!(resolved = self.items.len(), total = slots.len(), "Items changed");
        self.request_frame()
    }

    fn request_frame(&mut self) -> Option<FrameToken> {
        if self.pending_frame.is_some() {
            return None;
        }
        self.next_token += 1;
        let token = FrameToken(self.next_token);
        self.pending_frame = Some(token);
        Some(token)
    }

    /// Runs the pending recomputation. Stale or unknown tokens are ignored.
    /// Returns true when new rows were published.
    pub fn on_frame(&mut self, token: FrameToken) -> bool {
        if self.torn_down || self.pending_frame != Some(token) {
            return false;
        }
        self.pending_frame = None;
        self.recompute();
        true
    }

    pub fn has_pending_frame(&self) -> bool {
        self.pending_frame.is_some()
    }

    fn recompute(&mut self) {
        let width = self.container_width.unwrap_or(0);
        let rows = self.computer.compute(&self.items, width);
        self.current = LayoutSnapshot {
            revision: self.current.revision + 1,
            container_width: width,
            rows: Arc::new(rows),
        };
        debug!(
            revision = self.current.revision,
            container_width = width,
            items = self.items.len(),
            rows = self.current.rows.len(),
            "Layout published"
        );
        let snapshot = self.current.clone();
        self.subscribers.retain(|tx| tx.send(snapshot.clone()).is_ok());
    }

    pub fn rows(&self) -> &[Row] {
        &self.current.rows
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        self.current.clone()
    }

    /// Receives every snapshot published after this call.
    pub fn subscribe(&mut self) -> Receiver<LayoutSnapshot> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Replaces packing parameters; the next frame repacks everything.
    pub fn set_layout(&mut self, layout: JustifiedLayout) -> Option<FrameToken> {
        if self.torn_down {
            return None;
        }
        self.computer.set_layout(layout);
        self.request_frame()
    }

    /// Cancels the pending frame and drops subscribers. Later notifications
    /// and frames are ignored.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.pending_frame = None;
        self.subscribers.clear();
    }
}
