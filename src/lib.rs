//! Cross-platform build and packing library
//!
//! This library compiles one project for many targets in parallel and packs
//! each binary into its OS-native shape:
//! - Linux executables
//! - macOS `.app` bundles and ISO9660 disk images
//! - Windows executables with the icon and manifest linked in
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;
pub mod metadata;
pub mod source;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
