//! Incremental, order-preserving image metadata resolution.
//!
//! - One Tokio task per reference, bounded by a semaphore
//! - Fetch and decode run on the blocking pool
//! - Results land in a pre-sized write-once slot array
//! - Progress is streamed over a flume channel as slots fill

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use flume::{Receiver, Sender};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::slots::MediaSlots;
use super::source::ImageSource;
use super::{variant, ResolveError};
use crate::config::ResolverConfig;
use crate::image_loader;
use crate::models::{MediaItem, MediaRef};

/// Progress notification for one resolution generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotEvent {
    /// Slot `index` now holds a resolved item.
    Resolved { index: usize, fallback: bool },
    /// Every slot is filled; preloading is over.
    Complete { resolved: usize, fallbacks: usize },
}

pub struct ImageMetadataResolver {
    runtime: Handle,
    source: Arc<dyn ImageSource>,
    config: ResolverConfig,
    generation: AtomicU64,
}

impl ImageMetadataResolver {
    pub fn new(runtime: Handle, source: Arc<dyn ImageSource>, config: ResolverConfig) -> Self {
        Self {
            runtime,
            source,
            config,
            generation: AtomicU64::new(0),
        }
    }

    /// Binds to the Tokio runtime of the calling context.
    pub fn current(source: Arc<dyn ImageSource>, config: ResolverConfig) -> Result<Self, ResolveError> {
        let runtime = Handle::try_current().map_err(|_| ResolveError::NoRuntime)?;
        Ok(Self::new(runtime, source, config))
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Starts resolving `refs`. Slots fill in completion order; the array
    /// itself is never reordered. Calling again starts a fresh generation;
    /// dropping the previous handle stops its updates.
    pub fn resolve(&self, refs: Vec<MediaRef>) -> ResolutionHandle {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let slots = Arc::new(MediaSlots::new(refs.len(), generation));
        let mounted = Arc::new(AtomicBool::new(true));
        let (tx, rx) = flume::unbounded();
        let fallbacks = Arc::new(AtomicU64::new(0));

        info!(generation, count = refs.len(), "Resolving image metadata");

        if refs.is_empty() {
            let _ = tx.send(SlotEvent::Complete {
                resolved: 0,
                fallbacks: 0,
            });
        }

        let permits = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));
        let tasks = refs
            .into_iter()
            .enumerate()
            .map(|(index, reference)| {
                let job = SlotJob {
                    index,
                    reference,
                    source: Arc::clone(&self.source),
                    config: self.config.clone(),
                    slots: Arc::clone(&slots),
                    mounted: Arc::clone(&mounted),
                    events: tx.clone(),
                    fallbacks: Arc::clone(&fallbacks),
                };
                let permits = Arc::clone(&permits);
                self.runtime.spawn(async move {
                    let Ok(_permit) = permits.acquire_owned().await else {
                        return;
                    };
                    job.run().await;
                })
            })
            .collect();

        ResolutionHandle {
            slots,
            events: rx,
            mounted,
            tasks,
        }
    }
}

struct SlotJob {
    index: usize,
    reference: MediaRef,
    source: Arc<dyn ImageSource>,
    config: ResolverConfig,
    slots: Arc<MediaSlots>,
    mounted: Arc<AtomicBool>,
    events: Sender<SlotEvent>,
    fallbacks: Arc<AtomicU64>,
}

impl SlotJob {
    async fn run(self) {
        if !self.mounted.load(Ordering::Acquire) {
            return;
        }

        let source = Arc::clone(&self.source);
        let reference = self.reference.clone();
        let config = self.config.clone();
        let index = self.index;
        let outcome = tokio::task::spawn_blocking(move || {
            resolve_one(source.as_ref(), &reference, index, &config)
        })
        .await;

        let item = match outcome {
            Ok(Ok(item)) => item,
            Ok(Err(e)) => {
                warn!(index, reference = %self.reference.source_ref, error = %e, "Image failed to load, using fallback dimensions");
                fallback_item(&self.reference, index, &self.config)
            }
            Err(e) => {
                warn!(index, error = %e, "Resolution task failed, using fallback dimensions");
                fallback_item(&self.reference, index, &self.config)
            }
        };

        // Component torn down while we were loading.
        if !self.mounted.load(Ordering::Acquire) {
            trace!(index, "Dropping result for torn-down resolution");
            return;
        }

        let fallback = item.is_fallback();
        if fallback {
            self.fallbacks.fetch_add(1, Ordering::Relaxed);
        }

        match self.slots.fill(index, item) {
            Ok(remaining) => {
                let _ = self.events.send(SlotEvent::Resolved { index, fallback });
                if remaining == 0 {
                    let fallbacks = self.fallbacks.load(Ordering::Relaxed) as usize;
                    debug!(generation = self.slots.generation(), fallbacks, "Resolution complete");
                    let _ = self.events.send(SlotEvent::Complete {
                        resolved: self.slots.len(),
                        fallbacks,
                    });
                }
            }
            Err(e) => warn!(index, error = %e, "Discarding duplicate slot write"),
        }
    }
}

/// Fetches one reference and builds its resolved item.
fn resolve_one(
    source: &dyn ImageSource,
    reference: &MediaRef,
    index: usize,
    config: &ResolverConfig,
) -> Result<MediaItem, ResolveError> {
    let bytes = source.fetch(&reference.source_ref)?;
    let (width, height) =
        image_loader::read_dimensions(&bytes).map_err(|e| ResolveError::Decode(format!("{e:#}")))?;

    let item = MediaItem::loaded(reference, index, width, height);
    let Some((display_w, display_h)) = variant::calculate_dimensions(width, height, config.max_width)
    else {
        return Ok(item);
    };

    match variant::encode_variant(&bytes, display_w, display_h, config.jpeg_quality) {
        Ok(display) => Ok(item.with_display(display)),
        Err(e) => {
            // Resizing is best effort; serve the original.
            debug!(index, error = %e, "Display variant failed");
            Ok(item)
        }
    }
}

fn fallback_item(reference: &MediaRef, index: usize, config: &ResolverConfig) -> MediaItem {
    let (width, height) = config.fallback_dimensions();
    MediaItem::fallback(reference, index, width, height)
}

/// One generation of resolution. Dropping it tears the generation down.
pub struct ResolutionHandle {
    slots: Arc<MediaSlots>,
    events: Receiver<SlotEvent>,
    mounted: Arc<AtomicBool>,
    tasks: Vec<JoinHandle<()>>,
}

impl ResolutionHandle {
    /// Shared read view of the slot array.
    pub fn slots(&self) -> &Arc<MediaSlots> {
        &self.slots
    }

    pub fn events(&self) -> &Receiver<SlotEvent> {
        &self.events
    }

    /// True until every slot has been filled (success or fallback).
    pub fn is_preloading(&self) -> bool {
        self.mounted.load(Ordering::Acquire) && !self.slots.is_complete()
    }

    pub fn generation(&self) -> u64 {
        self.slots.generation()
    }

    /// Waits for the next progress event. `None` once the generation is
    /// complete or torn down.
    pub async fn next_event(&self) -> Option<SlotEvent> {
        if !self.mounted.load(Ordering::Acquire) {
            return None;
        }
        self.events.recv_async().await.ok()
    }

    /// Waits until every slot is filled.
    pub async fn wait_complete(&self) {
        while !self.slots.is_complete() {
            match self.next_event().await {
                Some(SlotEvent::Complete { .. }) | None => break,
                Some(SlotEvent::Resolved { .. }) => {}
            }
        }
    }

    /// Stops all pending work; later completions are discarded.
    pub fn teardown(&mut self) {
        if !self.mounted.swap(false, Ordering::AcqRel) {
            return;
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
        debug!(generation = self.slots.generation(), "Resolution torn down");
    }
}

impl Drop for ResolutionHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}
