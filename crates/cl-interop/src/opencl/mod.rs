//! OpenCL implementation of [`ClBridge`](crate::ClBridge) on `opencl3`.
//!
//! - [`device`]: platform, GPU-then-CPU context, command queue
//! - [`program`]: source compilation and kernel lookup
//! - [`memory`]: GL texture/buffer wrapping and plain buffers
//! - [`gl_sharing`]: context properties for the current GL context

mod bridge;
pub mod device;
pub mod gl_sharing;
pub mod memory;
pub mod program;

pub use bridge::OpenClBridge;
