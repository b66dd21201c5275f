use std::io::Cursor;

use anyhow::{anyhow, Context, Result};
use image::codecs::gif::GifDecoder;
use image::AnimationDecoder;
use image::{DynamicImage, ImageFormat, ImageReader};

/// Decodes a full image from memory. Animated GIFs yield their first frame.
pub fn open_image(bytes: &[u8]) -> Result<DynamicImage> {
    let format = image::guess_format(bytes).ok();

    if format == Some(ImageFormat::Gif) {
        let decoder = GifDecoder::new(Cursor::new(bytes)).context("Failed to decode GIF")?;
        let mut frames = decoder.into_frames();
        if let Some(frame) = frames.next() {
            let frame = frame.context("Failed to decode GIF frame")?;
            return Ok(DynamicImage::ImageRgba8(frame.into_buffer()));
        }
        return Err(anyhow!("GIF has no frames"));
    }

    match format {
        Some(fmt) => {
            image::load_from_memory_with_format(bytes, fmt).context("Failed to decode image")
        }
        None => image::load_from_memory(bytes).context("Failed to decode image"),
    }
}

/// Reads natural pixel dimensions from the image header without decoding pixels.
pub fn read_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("Failed to guess image format")?;
    let (width, height) = reader
        .into_dimensions()
        .context("Failed to read dimensions")?;
    if width == 0 || height == 0 {
        return Err(anyhow!("Image has empty dimensions {width}x{height}"));
    }
    Ok((width, height))
}


#[cfg(test)]
mod tests {
    use super::test_support::png_bytes;
    use super::*;

    #[test]
    fn test_read_dimensions_png() {
        assert_eq!(read_dimensions(&png_bytes(30, 20)).unwrap(), (30, 20));
    }

    #[test]
    fn test_read_dimensions_garbage() {
        assert!(read_dimensions(b"definitely not an image").is_err());
    }

    #[test]
    fn test_open_image() {
        let img = open_image(&png_bytes(12, 7)).unwrap();
        assert_eq!((img.width(), img.height()), (12, 7));
    }
}
