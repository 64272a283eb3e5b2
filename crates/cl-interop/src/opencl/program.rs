//! Program compilation and kernel lookup.

use anyhow::{anyhow, Context as _, Result};
use opencl3::context::Context;
use opencl3::kernel::Kernel;
use opencl3::program::Program;
use tracing::error;

use crate::bridge::InitStage;

/// Compile `source` for every device in `context`. On failure the build log
/// is written to the diagnostic stream and returned in the error.
pub fn build_program(context: &Context, source: &str) -> Result<Program> {
    Program::create_and_build_from_source(context, source, "")
        .map_err(|log| {
            error!("error in kernel:\n{log}");
            anyhow!("error in kernel:\n{log}")
        })
        .context(InitStage::Build)
}

pub fn create_kernel(program: &Program, name: &str) -> Result<Kernel> {
    Kernel::create(program, name)
        .with_context(|| format!("no kernel named '{name}'"))
        .context(InitStage::Kernel)
}
