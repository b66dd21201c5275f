use std::sync::Arc;

use serde_json::{Map, Value};

/// Caller-owned attributes (title, tags, camera info...). Never inspected by
/// layout or navigation code.
pub type Metadata = Arc<Map<String, Value>>;

/// One entry of the caller-supplied reference list, before resolution.
#[derive(Debug, Clone)]
pub struct MediaRef {
    pub source_ref: Arc<str>,
    pub metadata: Metadata,
}

impl MediaRef {
    pub fn new(source_ref: impl Into<Arc<str>>) -> Self {
        Self {
            source_ref: source_ref.into(),
            metadata: Metadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Arc::new(metadata);
        self
    }
}

/// What the renderer should load for an item.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplaySource {
    /// Use the original asset as-is.
    Source(Arc<str>),
    /// Bandwidth-reduced JPEG copy produced during resolution.
    Encoded {
        bytes: Arc<[u8]>,
        width: u32,
        height: u32,
    },
}

impl DisplaySource {
    pub fn is_encoded(&self) -> bool {
        matches!(self, Self::Encoded { .. })
    }

    /// Locator for the display variant, if it has one (encoded blobs don't).
    pub fn locator(&self) -> Option<&str> {
        match self {
            Self::Source(src) => Some(src),
            Self::Encoded { .. } => None,
        }
    }
}

/// How an item's dimensions became known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Loaded,
    /// Load failed; dimensions were synthesized so layout can proceed.
    Fallback,
}

/// A resolved media item. Created once by the resolver and never mutated.
#[derive(Debug, Clone)]
pub struct MediaItem {
    pub source_ref: Arc<str>,
    pub display: DisplaySource,
    pub width: u32,
    pub height: u32,
    pub original_index: usize,
    pub resolution: Resolution,
    pub metadata: Metadata,
}

impl MediaItem {
    pub fn loaded(reference: &MediaRef, original_index: usize, width: u32, height: u32) -> Self {
        Self {
            source_ref: reference.source_ref.clone(),
            display: DisplaySource::Source(reference.source_ref.clone()),
            width,
            height,
            original_index,
            resolution: Resolution::Loaded,
            metadata: reference.metadata.clone(),
        }
    }

    pub fn fallback(reference: &MediaRef, original_index: usize, width: u32, height: u32) -> Self {
        Self {
            resolution: Resolution::Fallback,
            ..Self::loaded(reference, original_index, width, height)
        }
    }

    pub fn with_display(mut self, display: DisplaySource) -> Self {
        self.display = display;
        self
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f64 / self.height as f64
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.resolution == Resolution::Fallback
    }

    /// Convenience accessor for a string attribute in the caller's metadata.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}
