//! OpenCL/OpenGL interop render plugins.
//!
//! This crate ties together [`gem_core`] (host protocol) and [`cl_interop`]
//! (OpenCL sessions sharing memory with the host's GL context) into three
//! plugin classes.
//!
//! # Overview
//!
//! - [`InteropPipeline`] owns one OpenCL session: init, per-frame dispatch
//!   with GL acquire/release, readback, and teardown.
//! - [`PipelineConfig`] says where a plugin's kernel source lives and which
//!   entry points it needs.
//! - [`SequenceCounter`] is the wrapped animation counter fed to kernels.
//! - [`plugins`] holds `ocl_test`, `ocl_texreadback` and `ocl_glinterop`.
//!
//! Kernel sources are read at init from `GEM_OCL_KERNEL_DIR` (default: the
//! working directory). Logging goes through `tracing`; see
//! [`gem_core::log`].

pub mod bytes;
pub mod config;
pub mod pipeline;
pub mod plugins;
pub mod sequence;

pub use config::{PipelineConfig, KERNEL_DIR_ENV};
pub use pipeline::{Arg, InteropPipeline, Pass, PipelineState};
pub use plugins::{OclGlInterop, OclTest, OclTexReadback};
pub use sequence::SequenceCounter;
