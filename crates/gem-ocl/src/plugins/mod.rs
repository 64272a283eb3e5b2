//! The three plugin classes.
//!
//! Each is generic over its OpenCL (and, where it draws, OpenGL) seam so the
//! tests can drive it with fakes. `create` builds one on the real driver.

mod gl_interop;
mod tex_readback;
mod vector_add;

pub use gl_interop::{OclGlInterop, SEGMENTS, TEXTURE_HEIGHT, TEXTURE_WIDTH, VERTEX_COUNT};
pub use tex_readback::{OclTexReadback, DEFAULT_THRESHOLD};
pub use vector_add::{OclTest, ARRAY_SIZE};

/// Work-group shape for the 2-D image kernels.
pub(crate) const IMAGE_LOCAL: [usize; 2] = [32, 4];

fn no_method(class: &str, selector: &str) -> anyhow::Error {
    anyhow::anyhow!("{class}: no method for '{selector}'")
}
