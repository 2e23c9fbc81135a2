//! Icon codecs and Windows resource embedding.
//!
//! - [`icons`] decodes the source image and resamples it
//! - [`ico`] writes and parses Windows ICO containers
//! - [`icns`] writes Apple ICNS containers
//! - [`rsrc`] builds the COFF resource object linked into Windows binaries

pub mod binutil;
pub mod icns;
pub mod ico;
pub mod icons;
pub mod rsrc;
