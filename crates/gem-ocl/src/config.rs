//! Where each plugin finds its kernel source and which entry points it needs.
//!
//! Kernel files have fixed names and are resolved against the kernel
//! directory: `GEM_OCL_KERNEL_DIR` if set, otherwise the host's working
//! directory.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

pub const KERNEL_DIR_ENV: &str = "GEM_OCL_KERNEL_DIR";

pub fn default_kernel_dir() -> PathBuf {
    std::env::var_os(KERNEL_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Class name used in diagnostics.
    pub class: &'static str,
    pub kernel_dir: PathBuf,
    pub kernel_file: &'static str,
    /// Entry points, looked up by exact name in this order.
    pub kernels: &'static [&'static str],
}

impl PipelineConfig {
    pub fn new(class: &'static str, kernel_file: &'static str, kernels: &'static [&'static str]) -> Self {
        Self {
            class,
            kernel_dir: default_kernel_dir(),
            kernel_file,
            kernels,
        }
    }

    pub fn with_kernel_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.kernel_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn kernel_path(&self) -> PathBuf {
        self.kernel_dir.join(self.kernel_file)
    }

    /// Read the kernel source. Read fresh on every call; nothing is cached.
    pub fn load_source(&self) -> Result<String> {
        let path = self.kernel_path();
        std::fs::read_to_string(&path)
            .with_context(|| format!("failed to open file for reading: {}", path.display()))
    }
}
