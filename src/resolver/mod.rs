//! Image metadata resolution for the gallery.
//!
//! This module provides:
//! - `ImageMetadataResolver` - Streams dimensions into a pre-sized slot array
//! - `MediaSlots` - Write-once, origin-indexed result storage
//! - `ImageSource` - Byte fetching (disk and HTTP by default)
//! - Display variants - Downscaled JPEG copies of oversized images

pub mod pipeline;
pub mod slots;
pub mod source;
pub mod variant;

use thiserror::Error;

pub use pipeline::{ImageMetadataResolver, ResolutionHandle, SlotEvent};
pub use slots::{MediaSlots, SlotError};
pub use source::{DefaultSource, ImageSource};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("network error: {0}")]
    Network(String),
    #[error("image decoding failed: {0}")]
    Decode(String),
    #[error("image encoding failed: {0}")]
    Encode(String),
    #[error("no Tokio runtime available")]
    NoRuntime,
}
