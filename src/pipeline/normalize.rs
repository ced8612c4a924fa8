//! Decoding and pixel-format normalisation.
//!
//! Sources arrive as PNG, JPEG, GIF, … at 8 or 16 bits per channel, grey or
//! colour, with or without alpha. Every later stage assumes one layout, so
//! each decoded frame is copied in full into a freshly allocated RGBA8 buffer.
//! The copy happens even when the source is already RGBA8.

use crate::error::ItemError;
use image::{DynamicImage, GenericImage, GenericImageView, RgbaImage};

/// A decoded image with 8 bits per channel in RGBA layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedBitmap(RgbaImage);

impl NormalizedBitmap {
    /// Re-render `img` into a new RGBA8 raster of the same bounds.
    pub fn normalize(img: &DynamicImage) -> Result<Self, image::ImageError> {
        let (width, height) = img.dimensions();
        let mut canvas = RgbaImage::new(width, height);
        canvas.copy_from(img, 0, 0)?;
        Ok(Self(canvas))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.0
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.0
    }
}

impl From<RgbaImage> for NormalizedBitmap {
    fn from(img: RgbaImage) -> Self {
        Self(img)
    }
}

/// Decode `bytes` (format sniffed from content) and normalise the result.
pub fn decode_and_normalize(id: u32, bytes: &[u8]) -> Result<NormalizedBitmap, ItemError> {
    let img = image::load_from_memory(bytes).map_err(|e| ItemError::Decode {
        id,
        detail: e.to_string(),
    })?;
    NormalizedBitmap::normalize(&img).map_err(|e| ItemError::Decode {
        id,
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb, Rgba};
    use std::io::Cursor;

    fn png_bytes(img: &DynamicImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .expect("png encode");
        buf
    }

    #[test]
    fn normalizing_twice_is_pixel_identical() {
        let src = DynamicImage::ImageRgb8(ImageBuffer::from_fn(5, 3, |x, y| {
            Rgb([x as u8 * 40, y as u8 * 70, 9])
        }));
        let once = NormalizedBitmap::normalize(&src).expect("normalize");
        let twice = NormalizedBitmap::normalize(&DynamicImage::ImageRgba8(once.as_rgba().clone()))
            .expect("normalize");
        assert_eq!(once, twice);
    }

    #[test]
    fn sixteen_bit_source_becomes_eight_bit_rgba() {
        let src = DynamicImage::ImageRgb16(ImageBuffer::from_pixel(
            2,
            2,
            Rgb([u16::MAX, 0, u16::MAX / 2 + 1]),
        ));
        let bitmap = NormalizedBitmap::normalize(&src).expect("normalize");
        assert_eq!((bitmap.width(), bitmap.height()), (2, 2));
        assert_eq!(*bitmap.as_rgba().get_pixel(1, 1), Rgba([255, 0, 128, 255]));
    }

    #[test]
    fn grayscale_source_is_expanded_to_rgba() {
        let src = DynamicImage::ImageLuma8(ImageBuffer::from_pixel(1, 1, Luma([77u8])));
        let bitmap = NormalizedBitmap::normalize(&src).expect("normalize");
        assert_eq!(*bitmap.as_rgba().get_pixel(0, 0), Rgba([77, 77, 77, 255]));
    }

    #[test]
    fn decode_sniffs_format_from_content() {
        let src = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 4, Rgba([1, 2, 3, 4])));
        let bitmap = decode_and_normalize(9, &png_bytes(&src)).expect("decodes");
        assert_eq!((bitmap.width(), bitmap.height()), (3, 4));
        assert_eq!(*bitmap.as_rgba().get_pixel(2, 3), Rgba([1, 2, 3, 4]));
    }

    #[test]
    fn garbage_payload_is_a_decode_error() {
        let err = decode_and_normalize(4, b"<html>not found</html>").unwrap_err();
        assert!(matches!(err, ItemError::Decode { id: 4, .. }), "got: {err:?}");
    }
}
