//! Image encoding: `NormalizedBitmap` → PNG bytes for the document builder.
//!
//! The builder only accepts a standard image container, never a raw pixel
//! buffer. PNG is lossless, so the page shows exactly the normalised pixels.

use crate::error::ItemError;
use crate::pipeline::normalize::NormalizedBitmap;
use image::ImageFormat;
use std::io::Cursor;
use tracing::debug;

/// Encode a normalised bitmap as PNG.
pub fn encode_png(id: u32, bitmap: &NormalizedBitmap) -> Result<Vec<u8>, ItemError> {
    let mut buf = Vec::new();
    bitmap
        .as_rgba()
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| ItemError::Encode {
            id,
            detail: e.to_string(),
        })?;

    debug!(id, bytes = buf.len(), "Encoded page image as PNG");
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_small_image() {
        let bitmap = NormalizedBitmap::from(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let png = encode_png(1, &bitmap).expect("encode should succeed");
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let back = image::load_from_memory_with_format(&png, ImageFormat::Png)
            .expect("valid png")
            .to_rgba8();
        assert_eq!(&back, bitmap.as_rgba());
    }
}
