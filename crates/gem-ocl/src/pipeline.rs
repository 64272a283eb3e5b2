//! [`InteropPipeline`]: one OpenCL session per render cycle, driven through
//! a [`ClBridge`].
//!
//! The pipeline owns the session state machine:
//!
//! ```text
//! Uninitialized -> Initializing -> Ready <-> Dispatching
//!                       |            |
//!                       v            v
//!                    Stopped <--- teardown
//! ```
//!
//! Any initialization failure releases what was created and lands in
//! `Stopped`; there is no retry until [`reset`](InteropPipeline::reset)
//! starts a new session. Dispatch is only attempted from `Ready`.

use anyhow::{anyhow, bail, Context as _, Result};
use cl_interop::{ClBridge, GlApi, InitStage, KernelArg, KernelId, MemDesc, MemId, MemKind, WorkSize};
use tracing::{debug, error, info};

use crate::config::PipelineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Initializing,
    Ready,
    Dispatching,
    Stopped,
}

/// A kernel argument referring to memory by its position in the list passed
/// to [`InteropPipeline::initialize`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arg {
    Mem(usize),
    Int(i32),
    Float(f32),
}

/// One kernel launch.
#[derive(Debug, Clone)]
pub struct Pass<'a> {
    /// Index into the config's kernel list.
    pub kernel: usize,
    pub args: &'a [Arg],
    pub work: WorkSize,
    /// Memory slots shared with GL; acquired around the launch.
    pub shared: &'a [usize],
    /// Block until the queue drains after the launch.
    pub finish: bool,
}

pub struct InteropPipeline<B: ClBridge> {
    config: PipelineConfig,
    bridge: B,
    state: PipelineState,
    kernels: Vec<KernelId>,
    mems: Vec<MemId>,
    last_failure: Option<InitStage>,
}

impl<B: ClBridge> InteropPipeline<B> {
    pub fn new(bridge: B, config: PipelineConfig) -> Self {
        Self {
            config,
            bridge,
            state: PipelineState::Uninitialized,
            kernels: Vec::new(),
            mems: Vec::new(),
            last_failure: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == PipelineState::Ready
    }

    pub fn config_mut(&mut self) -> &mut PipelineConfig {
        &mut self.config
    }

    /// Stage of the most recent initialization failure, if it had one.
    pub fn last_failure(&self) -> Option<InitStage> {
        self.last_failure
    }

    /// Set up context, queue, program, kernels and the given memory objects.
    ///
    /// A no-op when already ready. Refused once the session has stopped.
    pub fn initialize(&mut self, memory: &[MemDesc]) -> Result<()> {
        match self.state {
            PipelineState::Uninitialized => {}
            PipelineState::Ready | PipelineState::Dispatching => return Ok(()),
            PipelineState::Initializing | PipelineState::Stopped => {
                bail!("{}: OpenCL is disabled for this session", self.config.class)
            }
        }

        self.state = PipelineState::Initializing;
        self.last_failure = None;

        match self.create_session(memory) {
            Ok(()) => {
                self.state = PipelineState::Ready;
                info!(
                    class = self.config.class,
                    device = %self.bridge.device_name().unwrap_or_default(),
                    kernels = self.kernels.len(),
                    mems = self.mems.len(),
                    "OpenCL initialized"
                );
                self.log_shared_objects(memory);
                Ok(())
            }
            Err(e) => {
                self.last_failure = e.downcast_ref::<InitStage>().copied();
                error!(class = self.config.class, "{e:#}");
                self.release();
                self.state = PipelineState::Stopped;
                Err(e)
            }
        }
    }

    fn create_session(&mut self, memory: &[MemDesc]) -> Result<()> {
        self.bridge.create_context()?;
        self.bridge.create_queue()?;

        let source = self.config.load_source().context(InitStage::Source)?;
        self.bridge.build_program(&source)?;

        for name in self.config.kernels {
            let kernel = self.bridge.create_kernel(name)?;
            self.kernels.push(kernel);
        }
        for desc in memory {
            let mem = self.bridge.create_mem(desc)?;
            self.mems.push(mem);
        }
        Ok(())
    }

    /// Report what each GL-backed object was recognised as.
    fn log_shared_objects(&self, memory: &[MemDesc]) {
        for (desc, &mem) in memory.iter().zip(&self.mems) {
            if !desc.is_gl_shared() {
                continue;
            }
            match self.bridge.mem_info(mem) {
                Ok(info) => {
                    let kind = match info.kind {
                        MemKind::Image2D => "texture",
                        MemKind::Buffer => "buffer",
                        MemKind::Other(_) => "unknown",
                    };
                    info!(
                        class = self.config.class,
                        gl_name = info.gl_name,
                        size = info.size,
                        "queried a GL {kind} object"
                    );
                }
                Err(e) => error!(class = self.config.class, "failed to get object information: {e:#}"),
            }
        }
    }

    fn kernel(&self, index: usize) -> Result<KernelId> {
        self.kernels
            .get(index)
            .copied()
            .ok_or_else(|| anyhow!("no kernel at index {index}"))
    }

    fn mem(&self, slot: usize) -> Result<MemId> {
        self.mems
            .get(slot)
            .copied()
            .ok_or_else(|| anyhow!("no memory object at slot {slot}"))
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.state != PipelineState::Ready {
            bail!("{}: OpenCL is not initialized ({:?})", self.config.class, self.state);
        }
        Ok(())
    }

    /// Run a pass that shares GL objects: finish GL, acquire, launch,
    /// release, and optionally drain the queue.
    pub fn run<G: GlApi>(&mut self, gl: &mut G, pass: &Pass<'_>) -> Result<()> {
        self.dispatch(Some(gl as &mut dyn GlApi), pass)
    }

    /// Run a pass over plain buffers only.
    pub fn run_compute(&mut self, pass: &Pass<'_>) -> Result<()> {
        if !pass.shared.is_empty() {
            bail!("pass shares GL objects but no GL context was supplied");
        }
        self.dispatch(None, pass)
    }

    fn dispatch(&mut self, gl: Option<&mut dyn GlApi>, pass: &Pass<'_>) -> Result<()> {
        self.ensure_ready()?;
        self.state = PipelineState::Dispatching;
        let result = self.dispatch_inner(gl, pass);
        self.state = PipelineState::Ready;
        result
    }

    fn dispatch_inner(&mut self, gl: Option<&mut dyn GlApi>, pass: &Pass<'_>) -> Result<()> {
        let kernel = self.kernel(pass.kernel)?;
        let args = pass
            .args
            .iter()
            .map(|arg| {
                Ok(match *arg {
                    Arg::Mem(slot) => KernelArg::Mem(self.mem(slot)?),
                    Arg::Int(v) => KernelArg::Int(v),
                    Arg::Float(v) => KernelArg::Float(v),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let shared = pass
            .shared
            .iter()
            .map(|&slot| self.mem(slot))
            .collect::<Result<Vec<_>>>()?;

        if !shared.is_empty() {
            if let Some(gl) = gl {
                gl.finish();
            }
            self.bridge.acquire_gl_objects(&shared)?;
        }

        let launched = self.bridge.enqueue_kernel(kernel, &args, &pass.work);

        // Released whether or not the launch went through.
        let released = if shared.is_empty() {
            Ok(())
        } else {
            self.bridge.release_gl_objects(&shared)
        };

        launched?;
        released?;

        if pass.finish {
            self.bridge.finish()?;
        }
        Ok(())
    }

    /// Blocking read of a plain buffer.
    pub fn read(&mut self, slot: usize, out: &mut [u8]) -> Result<()> {
        self.ensure_ready()?;
        let mem = self.mem(slot)?;
        self.bridge.read_buffer(mem, out)
    }

    /// Blocking upload into a plain buffer.
    pub fn write(&mut self, slot: usize, data: &[u8]) -> Result<()> {
        self.ensure_ready()?;
        let mem = self.mem(slot)?;
        self.bridge.write_buffer(mem, data)
    }

    fn release(&mut self) {
        self.kernels.clear();
        self.mems.clear();
        self.bridge.release_all();
    }

    /// Release the session. Safe to call any number of times.
    pub fn teardown(&mut self) {
        if self.state != PipelineState::Stopped {
            debug!(class = self.config.class, "cleanup");
        }
        self.release();
        self.state = PipelineState::Stopped;
    }

    /// Drop a ready session so the next frame builds a new one. Any other
    /// state is left alone; a stopped session stays stopped until
    /// [`begin_session`](Self::begin_session).
    pub fn restart(&mut self) {
        if self.state == PipelineState::Ready {
            self.reset();
        }
    }

    /// Called at render-start: a stopped pipeline may initialize again.
    pub fn begin_session(&mut self) {
        if self.state == PipelineState::Stopped {
            self.reset();
        }
    }

    /// Tear down and allow a fresh initialization (new render session).
    pub fn reset(&mut self) {
        self.release();
        self.state = PipelineState::Uninitialized;
        self.last_failure = None;
    }
}

impl<B: ClBridge> Drop for InteropPipeline<B> {
    fn drop(&mut self) {
        self.release();
    }
}
