//! Raster helpers shared by the icon codecs.
//!
//! Icons are decoded once from the project's source image and resampled into
//! each size a container needs. Resampling uses Catmull-Rom, which keeps edges
//! crisp at the small sizes Windows and macOS show in lists and title bars.

use crate::bundler::error::Result;
use image::{DynamicImage, ImageFormat, RgbaImage, imageops::FilterType};
use std::io::Cursor;

/// Decodes a source icon from memory.
///
/// Any format the `image` crate recognises is accepted; PNG is expected.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

/// Resamples `source` into a `size`×`size` RGBA raster.
///
/// Non-square sources are stretched to fill the square.
pub fn resize_square(source: &DynamicImage, size: u32) -> RgbaImage {
    source
        .resize_exact(size, size, FilterType::CatmullRom)
        .to_rgba8()
}

/// Encodes a raster as PNG.
pub fn encode_png(raster: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    raster.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

#[cfg(test)]
pub(crate) fn sample_icon(size: u32) -> DynamicImage {
    let raster = RgbaImage::from_fn(size, size, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 0x80, 0xff])
    });
    DynamicImage::ImageRgba8(raster)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_then_png_round_trips() {
        let source = sample_icon(512);
        let small = resize_square(&source, 48);
        assert_eq!(small.dimensions(), (48, 48));

        let png = encode_png(&small).expect("encode");
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = decode(&png).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (48, 48));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(decode(b"definitely not an image").is_err());
    }
}
