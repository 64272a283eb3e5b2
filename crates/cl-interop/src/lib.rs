//! OpenCL work on memory shared with the host's OpenGL context.
//!
//! [`ClBridge`] is the OpenCL seam and [`GlApi`] the OpenGL one. The
//! production implementations are [`OpenClBridge`] (on `opencl3`) and
//! [`RawGl`] (on the `gl` crate, using whatever context the host has made
//! current).

pub mod bridge;
pub mod gl_api;
pub mod opencl;

pub use bridge::{
    Access, ClBridge, InitStage, KernelArg, KernelId, MemDesc, MemId, MemInfo, MemKind, WorkSize,
};
pub use gl_api::{GlApi, RawGl, GL_TEXTURE_RECTANGLE};
pub use opencl::OpenClBridge;
