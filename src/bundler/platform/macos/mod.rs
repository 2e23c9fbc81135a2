//! macOS bundling: the `.app` bundle and a disk image of it.

pub mod app;
pub mod dmg;
