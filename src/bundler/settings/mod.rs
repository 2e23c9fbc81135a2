//! Configuration structures for pack operations.
//!
//! This module provides the target model (platform, architecture and their
//! pairing), per-target toolchain flags, and the project configuration that
//! resolves into [`Settings`].

mod arch;
mod core;
mod flags;
mod platform;
mod project;
mod target;

// Re-export all public types
pub use arch::Arch;
pub use core::Settings;
pub use flags::{FlagSet, Flags};
pub use platform::Platform;
pub use project::{DEFAULT_DIST, ProjectInfo};
pub use target::{DEFAULT_TARGETS, Target};
