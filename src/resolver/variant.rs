//! Bandwidth-reduced display copies.
//!
//! Images wider than the configured maximum are resized to that width
//! (aspect preserved) and re-encoded as JPEG. This is an optimization only;
//! callers fall back to the original asset when it fails.

use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use tracing::debug;

use super::ResolveError;
use crate::image_loader;
use crate::models::DisplaySource;

/// Computes the display size for a source image capped at `max_width`.
///
/// Returns `None` when the source already fits.
pub fn calculate_dimensions(src_width: u32, src_height: u32, max_width: u32) -> Option<(u32, u32)> {
    if src_width == 0 || src_height == 0 || src_width <= max_width {
        return None;
    }
    let height = (src_height as f64 * max_width as f64 / src_width as f64).round() as u32;
    Some((max_width, height.max(1)))
}

/// Decodes `bytes`, resizes to `width`x`height` and encodes to JPEG.
pub fn encode_variant(
    bytes: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<DisplaySource, ResolveError> {
    let img = image_loader::open_image(bytes).map_err(|e| ResolveError::Decode(format!("{e:#}")))?;
    let (src_width, src_height) = img.dimensions();

    // CatmullRom provides good quality/speed balance for downscaling
    let resized = img.resize_exact(width, height, FilterType::CatmullRom);
    let encoded = encode_jpeg(&resized, quality)?;

    debug!(
        src_width,
        src_height,
        width,
        height,
        bytes = encoded.len(),
        "Encoded display variant"
    );

    Ok(DisplaySource::Encoded {
        bytes: Arc::from(encoded),
        width,
        height,
    })
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, ResolveError> {
    // Convert to RGB8 for JPEG (no alpha channel)
    let rgb_img = img.to_rgb8();
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    rgb_img
        .write_with_encoder(encoder)
        .map_err(|e| ResolveError::Encode(e.to_string()))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_loader::test_support::png_bytes;

    #[test]
    fn test_calculate_dimensions_fits() {
        assert_eq!(calculate_dimensions(1920, 1080, 1920), None);
        assert_eq!(calculate_dimensions(800, 600, 1920), None);
    }

    #[test]
    fn test_calculate_dimensions_downscale() {
        assert_eq!(calculate_dimensions(3840, 2160, 1920), Some((1920, 1080)));
        // 4000x3000 -> 1920x1440
        assert_eq!(calculate_dimensions(4000, 3000, 1920), Some((1920, 1440)));
    }

    #[test]
    fn test_calculate_dimensions_extreme_panorama() {
        assert_eq!(calculate_dimensions(100_000, 10, 1920), Some((1920, 1)));
    }

    #[test]
    fn test_encode_variant() {
        let bytes = png_bytes(64, 32);
        let display = encode_variant(&bytes, 32, 16, 85).unwrap();
        match display {
            DisplaySource::Encoded {
                bytes,
                width,
                height,
            } => {
                assert_eq!((width, height), (32, 16));
                assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Jpeg);
                assert_eq!(image_loader::read_dimensions(&bytes).unwrap(), (32, 16));
            }
            other => panic!("expected encoded variant, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_variant_rejects_garbage() {
        assert!(matches!(
            encode_variant(b"nope", 10, 10, 85),
            Err(ResolveError::Decode(_))
        ));
    }
}
