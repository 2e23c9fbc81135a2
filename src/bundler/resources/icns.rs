//! Apple ICNS container encoding.

use super::icons::resize_square;
use crate::bundler::error::{Error, Result};
use icns::{IconFamily, IconType, Image as IcnsImage, PixelFormat};
use image::DynamicImage;

/// Icon types written into an ICNS, with their pixel size.
const ICNS_TYPES: [(IconType, u32); 10] = [
    (IconType::RGBA32_16x16, 16),
    (IconType::RGBA32_16x16_2x, 32),
    (IconType::RGBA32_32x32, 32),
    (IconType::RGBA32_32x32_2x, 64),
    (IconType::RGBA32_128x128, 128),
    (IconType::RGBA32_128x128_2x, 256),
    (IconType::RGBA32_256x256, 256),
    (IconType::RGBA32_256x256_2x, 512),
    (IconType::RGBA32_512x512, 512),
    (IconType::RGBA32_512x512_2x, 1024),
];

/// Encodes `source` as an ICNS icon family.
///
/// Sizes larger than the source are skipped rather than upscaled; the 16×16
/// entry is always present.
pub fn encode(source: &DynamicImage) -> Result<Vec<u8>> {
    let largest = source.width().min(source.height());
    let mut family = IconFamily::new();

    for (icon_type, size) in ICNS_TYPES {
        if size > largest && size != 16 {
            continue;
        }
        let rgba = resize_square(source, size);
        let image = IcnsImage::from_data(PixelFormat::RGBA, size, size, rgba.into_raw())
            .map_err(|e| Error::GenericError(format!("creating ICNS image {size}x{size}: {e}")))?;
        family
            .add_icon_with_type(&image, icon_type)
            .map_err(|e| Error::GenericError(format!("adding {size}x{size} to icon family: {e}")))?;
    }

    let mut out = Vec::new();
    family
        .write(&mut out)
        .map_err(|e| Error::GenericError(format!("writing ICNS data: {e}")))?;
    Ok(out)
}
