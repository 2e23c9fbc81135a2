//! Build orchestration.
//!
//! This module provides the [`Builder`] that compiles a project for every
//! requested target in parallel, each inside its own [`Sandbox`].
//!
//! # Overview
//!
//! For each target the builder:
//! 1. Copies the project into a fresh sandbox
//! 2. Writes the Windows resource object when the target is Windows
//! 3. Invokes the [`Compiler`]
//! 4. Reads the binary back as an [`Artifact`]
//!
//! # Module Organization
//!
//! - [`checksum`] - SHA256 checksum calculation for bundles
//! - [`compiler`] - The [`Compiler`] interface and the Go toolchain driver
//! - [`orchestrator`] - Main [`Builder`] struct and per-target pipeline
//! - [`sandbox`] - Sandbox preparation and teardown
//! - [`tool_detection`] - External tool availability checking

pub mod checksum;
pub mod compiler;
pub mod orchestrator;
pub mod sandbox;
pub mod tool_detection;

pub use compiler::{CompileRequest, Compiler, GoCompiler};
pub use orchestrator::{Artifact, BuildReport, Builder};
pub use sandbox::Sandbox;
