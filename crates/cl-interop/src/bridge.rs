//! Common interface for OpenCL work that shares memory with OpenGL.

use std::fmt;

use anyhow::Result;

/// Initialization steps, attached as error context so callers can tell which
/// one failed (`err.downcast_ref::<InitStage>()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStage {
    Platform,
    Context,
    Queue,
    Source,
    Build,
    Kernel,
    Memory,
}

impl fmt::Display for InitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InitStage::Platform => "platform/device lookup failed",
            InitStage::Context => "context creation failed",
            InitStage::Queue => "command queue creation failed",
            InitStage::Source => "kernel source unreadable",
            InitStage::Build => "program build failed",
            InitStage::Kernel => "kernel lookup failed",
            InitStage::Memory => "memory object creation failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

/// A memory object to create for a session.
#[derive(Debug, Clone, PartialEq)]
pub enum MemDesc {
    /// Wrap an existing GL texture (mip level 0).
    GlTexture { target: u32, texture: u32, access: Access },
    /// Wrap an existing GL buffer object.
    GlBuffer { buffer: u32, access: Access },
    /// A plain device buffer of `len` bytes, optionally seeded.
    Host {
        len: usize,
        access: Access,
        init: Option<Vec<u8>>,
    },
}

impl MemDesc {
    /// GL-backed objects must be acquired before OpenCL may touch them.
    pub fn is_gl_shared(&self) -> bool {
        matches!(self, MemDesc::GlTexture { .. } | MemDesc::GlBuffer { .. })
    }

    /// GL object name for shared objects.
    pub fn gl_name(&self) -> Option<u32> {
        match self {
            MemDesc::GlTexture { texture, .. } => Some(*texture),
            MemDesc::GlBuffer { buffer, .. } => Some(*buffer),
            MemDesc::Host { .. } => None,
        }
    }
}

/// Handle to a memory object created by a bridge during the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemId(pub usize);

/// Handle to a kernel created by a bridge during the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KernelId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KernelArg {
    Mem(MemId),
    Int(i32),
    Float(f32),
}

/// Global and local work sizes for an ND-range launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkSize {
    global: Vec<usize>,
    local: Vec<usize>,
}

impl WorkSize {
    /// Global sizes are rounded up to a multiple of the local size in each
    /// dimension. Kernels must bound-check against their real extent.
    pub fn new(global: &[usize], local: &[usize]) -> Self {
        debug_assert_eq!(global.len(), local.len());
        let local: Vec<usize> = local.iter().map(|&l| l.max(1)).collect();
        let global = global
            .iter()
            .zip(&local)
            .map(|(&g, &l)| g.max(1).div_ceil(l) * l)
            .collect();
        Self { global, local }
    }

    pub fn global(&self) -> &[usize] {
        &self.global
    }

    pub fn local(&self) -> &[usize] {
        &self.local
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemKind {
    Buffer,
    Image2D,
    Other(u32),
}

/// Result of querying a memory object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemInfo {
    pub kind: MemKind,
    pub size: usize,
    pub gl_name: Option<u32>,
}

/// One OpenCL session: context, queue, program, kernels and memory objects.
///
/// Creation is split into steps so the caller controls ordering and can stop
/// at the first failure. Handles returned by a bridge are only valid until
/// [`release_all`](ClBridge::release_all).
pub trait ClBridge {
    /// Find a platform and device and create a context shared with the
    /// current GL context.
    fn create_context(&mut self) -> Result<()>;

    /// Create a command queue on the context's first device.
    fn create_queue(&mut self) -> Result<()>;

    /// Compile `source`. The error carries the build log on failure.
    fn build_program(&mut self, source: &str) -> Result<()>;

    /// Look up a kernel entry point by exact name.
    fn create_kernel(&mut self, name: &str) -> Result<KernelId>;

    fn create_mem(&mut self, desc: &MemDesc) -> Result<MemId>;

    fn mem_info(&self, mem: MemId) -> Result<MemInfo>;

    /// Take shared GL objects for OpenCL. GL must have finished with them.
    fn acquire_gl_objects(&mut self, mems: &[MemId]) -> Result<()>;

    /// Hand shared GL objects back to GL.
    fn release_gl_objects(&mut self, mems: &[MemId]) -> Result<()>;

    fn enqueue_kernel(&mut self, kernel: KernelId, args: &[KernelArg], work: &WorkSize) -> Result<()>;

    /// Blocking upload into a plain buffer.
    fn write_buffer(&mut self, mem: MemId, data: &[u8]) -> Result<()>;

    /// Blocking read of a plain buffer.
    fn read_buffer(&mut self, mem: MemId, out: &mut [u8]) -> Result<()>;

    /// Block until the queue drains.
    fn finish(&mut self) -> Result<()>;

    /// Release queue, kernels, program and memory objects, then the context.
    /// Must be safe to call repeatedly.
    fn release_all(&mut self);

    fn device_name(&self) -> Option<String> {
        None
    }
}
