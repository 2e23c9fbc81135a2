//! Windows ICO container encoding and directory parsing.
//!
//! The encoder writes one PNG-compressed image per size in [`ICO_SIZES`].
//! Layout, little-endian throughout:
//!
//! ```text
//! header      6 bytes       reserved = 0, type = 1, count
//! directory   16 × count    one entry per image, largest first
//! payloads    ...           PNG streams in directory order, back to back
//! ```
//!
//! A width or height of 256 does not fit the 8-bit entry field and is stored as 0.

use super::binutil::{Encode, Reader};
use super::icons::{encode_png, resize_square};
use crate::bundler::error::{Error, Result};
use crate::encode_fields;
use image::DynamicImage;

/// Image sizes written into every generated ICO, in directory order.
pub const ICO_SIZES: [u32; 6] = [256, 128, 64, 48, 32, 16];

/// Resource type stored in the header for icons (cursors use 2).
pub const ICO_TYPE_ICON: u16 = 1;

const HEADER_LEN: usize = 6;
const ENTRY_LEN: usize = 16;

/// ICONDIR: the container header.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IcoHeader {
    pub reserved: u16,
    pub kind: u16,
    pub count: u16,
}

encode_fields!(IcoHeader {
    reserved,
    kind,
    count
});

/// Directory fields shared by ICO files and icon group resources.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IconEntryCommon {
    pub width: u8,
    pub height: u8,
    pub colors: u8,
    pub reserved: u8,
    pub planes: u16,
    pub bpp: u16,
    /// Payload length in bytes.
    pub size: u32,
}

encode_fields!(IconEntryCommon {
    width,
    height,
    colors,
    reserved,
    planes,
    bpp,
    size
});

impl IconEntryCommon {
    /// Pixel width, with the stored 0 read back as 256.
    pub fn pixel_width(&self) -> u32 {
        if self.width == 0 { 256 } else { u32::from(self.width) }
    }

    /// Pixel height, with the stored 0 read back as 256.
    pub fn pixel_height(&self) -> u32 {
        if self.height == 0 { 256 } else { u32::from(self.height) }
    }
}

/// ICONDIRENTRY: one image of an ICO file.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IcoDirEntry {
    pub common: IconEntryCommon,
    /// Payload position from the start of the file.
    pub offset: u32,
}

encode_fields!(IcoDirEntry { common, offset });

/// Header and directory of an ICO file, without the pixel payloads.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IcoDir {
    pub header: IcoHeader,
    pub entries: Vec<IcoDirEntry>,
}

impl IcoDir {
    /// Parses the header and directory of `data`.
    ///
    /// Every payload the directory points at must lie inside `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);
        let truncated = || Error::InvalidIco("truncated header".into());

        let header = IcoHeader {
            reserved: reader.u16().ok_or_else(truncated)?,
            kind: reader.u16().ok_or_else(truncated)?,
            count: reader.u16().ok_or_else(truncated)?,
        };
        if header.reserved != 0 || header.kind != ICO_TYPE_ICON {
            return Err(Error::InvalidIco(format!(
                "unexpected header reserved={} type={}",
                header.reserved, header.kind
            )));
        }

        let mut entries = Vec::with_capacity(usize::from(header.count));
        for index in 0..header.count {
            let truncated =
                || Error::InvalidIco(format!("directory entry {index} is truncated"));
            let entry = IcoDirEntry {
                common: IconEntryCommon {
                    width: reader.u8().ok_or_else(truncated)?,
                    height: reader.u8().ok_or_else(truncated)?,
                    colors: reader.u8().ok_or_else(truncated)?,
                    reserved: reader.u8().ok_or_else(truncated)?,
                    planes: reader.u16().ok_or_else(truncated)?,
                    bpp: reader.u16().ok_or_else(truncated)?,
                    size: reader.u32().ok_or_else(truncated)?,
                },
                offset: reader.u32().ok_or_else(truncated)?,
            };
            entries.push(entry);
        }

        let dir = Self { header, entries };
        for index in 0..dir.entries.len() {
            dir.image_data(data, index)?;
        }
        Ok(dir)
    }

    /// Payload bytes of entry `index`, sliced out of the original file.
    pub fn image_data<'a>(&self, data: &'a [u8], index: usize) -> Result<&'a [u8]> {
        let entry = self
            .entries
            .get(index)
            .ok_or_else(|| Error::InvalidIco(format!("no directory entry {index}")))?;
        let start = usize::try_from(entry.offset)?;
        let len = usize::try_from(entry.common.size)?;
        start
            .checked_add(len)
            .and_then(|end| data.get(start..end))
            .ok_or_else(|| {
                Error::InvalidIco(format!(
                    "image {index} ({len} bytes at {start}) lies outside the file"
                ))
            })
    }
}

/// Encodes `source` as a multi-resolution ICO.
pub fn encode(source: &DynamicImage) -> Result<Vec<u8>> {
    let payloads = ICO_SIZES
        .iter()
        .map(|&size| encode_png(&resize_square(source, size)))
        .collect::<Result<Vec<_>>>()?;

    let header = IcoHeader {
        reserved: 0,
        kind: ICO_TYPE_ICON,
        count: u16::try_from(payloads.len())?,
    };

    let mut offset = u32::try_from(HEADER_LEN + ENTRY_LEN * payloads.len())?;
    let mut entries = Vec::with_capacity(payloads.len());
    for (&size, payload) in ICO_SIZES.iter().zip(&payloads) {
        let dim = u8::try_from(size).unwrap_or(0);
        let entry = IcoDirEntry {
            common: IconEntryCommon {
                width: dim,
                height: dim,
                planes: 1,
                bpp: 32,
                size: u32::try_from(payload.len())?,
                ..Default::default()
            },
            offset,
        };
        offset = offset
            .checked_add(entry.common.size)
            .ok_or_else(|| Error::InvalidIco("icon exceeds 4 GiB".into()))?;
        entries.push(entry);
    }

    let mut out = Vec::with_capacity(usize::try_from(offset)?);
    header.encode(&mut out);
    entries.encode(&mut out);
    for payload in &payloads {
        out.extend_from_slice(payload);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::resources::icons::sample_icon;
    use std::io::Cursor;

    #[test]
    fn directory_follows_the_size_ladder_with_contiguous_payloads() {
        let data = encode(&sample_icon(512)).expect("encode");
        let dir = IcoDir::parse(&data).expect("parse");

        assert_eq!(dir.header.kind, 1);
        assert_eq!(usize::from(dir.header.count), ICO_SIZES.len());
        let sizes: Vec<u32> = dir.entries.iter().map(|e| e.common.pixel_width()).collect();
        assert_eq!(sizes, ICO_SIZES);
        assert_eq!(dir.entries[0].common.width, 0);

        let mut expected = (HEADER_LEN + ENTRY_LEN * ICO_SIZES.len()) as u32;
        for entry in &dir.entries {
            assert_eq!(entry.offset, expected);
            assert_eq!(entry.common.planes, 1);
            assert_eq!(entry.common.bpp, 32);
            expected += entry.common.size;
        }
        assert_eq!(expected as usize, data.len());
    }

    #[test]
    fn payloads_are_png_at_the_recorded_size() {
        let data = encode(&sample_icon(300)).expect("encode");
        let dir = IcoDir::parse(&data).expect("parse");
        for (index, entry) in dir.entries.iter().enumerate() {
            let png = dir.image_data(&data, index).expect("slice");
            let image = crate::bundler::resources::icons::decode(png).expect("png");
            assert_eq!(image.width(), entry.common.pixel_width());
            assert_eq!(image.height(), entry.common.pixel_height());
        }
    }

    #[test]
    fn independent_decoder_reads_every_image() {
        let data = encode(&sample_icon(64)).expect("encode");
        let icon_dir = ico::IconDir::read(Cursor::new(&data)).expect("ico crate parses");
        assert_eq!(icon_dir.resource_type(), ico::ResourceType::Icon);
        let widths: Vec<u32> = icon_dir.entries().iter().map(|e| e.width()).collect();
        assert_eq!(widths, ICO_SIZES);
        for entry in icon_dir.entries() {
            assert!(entry.is_png());
            let image = entry.decode().expect("decode entry");
            assert_eq!(image.width(), entry.width());
        }
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(matches!(IcoDir::parse(b"\0\0"), Err(Error::InvalidIco(_))));
        assert!(matches!(
            IcoDir::parse(&[0, 0, 2, 0, 0, 0]),
            Err(Error::InvalidIco(_))
        ));

        let mut data = encode(&sample_icon(16)).expect("encode");
        data.truncate(data.len() - 1);
        assert!(matches!(IcoDir::parse(&data), Err(Error::InvalidIco(_))));
    }
}
