//! [`OpenClBridge`]: [`ClBridge`] on a real OpenCL driver via `opencl3`.

use std::ffi::c_void;

use anyhow::{anyhow, Context as _, Result};
use opencl3::command_queue::CommandQueue;
use opencl3::context::Context;
use opencl3::device::Device;
use opencl3::kernel::{ExecuteKernel, Kernel};
use opencl3::program::Program;
use opencl3::types::{cl_mem, CL_BLOCKING};
use tracing::debug;

use super::device::{create_queue, create_shared_context, first_platform};
use super::memory::ClMemory;
use super::program::{build_program, create_kernel};
use crate::bridge::{ClBridge, InitStage, KernelArg, KernelId, MemDesc, MemId, MemInfo, WorkSize};

/// One OpenCL session shared with the host's GL context.
///
/// Every handle is optional so [`release_all`](ClBridge::release_all) can run
/// at any point of a partially completed setup, any number of times.
#[derive(Default)]
pub struct OpenClBridge {
    context: Option<Context>,
    device: Option<Device>,
    queue: Option<CommandQueue>,
    program: Option<Program>,
    kernels: Vec<Kernel>,
    mems: Vec<ClMemory>,
}

// SAFETY: OpenCL API calls are thread-safe except kernel arguments; the bridge is
// only driven from the host's render thread.
unsafe impl Send for OpenClBridge {}

impl OpenClBridge {
    pub fn new() -> Self {
        Self::default()
    }

    fn context(&self) -> Result<&Context> {
        self.context.as_ref().ok_or_else(|| anyhow!("no OpenCL context"))
    }

    fn queue(&self) -> Result<&CommandQueue> {
        self.queue.as_ref().ok_or_else(|| anyhow!("no OpenCL command queue"))
    }

    fn mem(&self, id: MemId) -> Result<&ClMemory> {
        self.mems
            .get(id.0)
            .ok_or_else(|| anyhow!("unknown memory object {}", id.0))
    }

    fn gl_handles(&self, ids: &[MemId]) -> Result<Vec<*const c_void>> {
        ids.iter()
            .map(|&id| {
                let mem = self.mem(id)?;
                if !mem.is_gl_shared() {
                    anyhow::bail!("memory object {} is not GL-shared", id.0);
                }
                Ok(mem.raw() as *const c_void)
            })
            .collect()
    }
}

impl ClBridge for OpenClBridge {
    fn create_context(&mut self) -> Result<()> {
        let platform = first_platform()?;
        self.context = Some(create_shared_context(&platform)?);
        Ok(())
    }

    fn create_queue(&mut self) -> Result<()> {
        let (device, queue) = create_queue(self.context().context(InitStage::Queue)?)?;
        self.device = Some(device);
        self.queue = Some(queue);
        Ok(())
    }

    fn build_program(&mut self, source: &str) -> Result<()> {
        let program = build_program(self.context().context(InitStage::Build)?, source)?;
        self.program = Some(program);
        Ok(())
    }

    fn create_kernel(&mut self, name: &str) -> Result<KernelId> {
        let program = self
            .program
            .as_ref()
            .ok_or_else(|| anyhow!("no program built"))
            .context(InitStage::Kernel)?;
        let kernel = create_kernel(program, name)?;
        self.kernels.push(kernel);
        Ok(KernelId(self.kernels.len() - 1))
    }

    fn create_mem(&mut self, desc: &MemDesc) -> Result<MemId> {
        let mem = ClMemory::create(self.context().context(InitStage::Memory)?, desc)
            .context(InitStage::Memory)?;
        self.mems.push(mem);
        Ok(MemId(self.mems.len() - 1))
    }

    fn mem_info(&self, mem: MemId) -> Result<MemInfo> {
        self.mem(mem)?.info()
    }

    fn acquire_gl_objects(&mut self, mems: &[MemId]) -> Result<()> {
        let handles = self.gl_handles(mems)?;
        unsafe { self.queue()?.enqueue_acquire_gl_objects(&handles, &[]) }
            .context("failed to acquire GL objects")?;
        Ok(())
    }

    fn release_gl_objects(&mut self, mems: &[MemId]) -> Result<()> {
        let handles = self.gl_handles(mems)?;
        unsafe { self.queue()?.enqueue_release_gl_objects(&handles, &[]) }
            .context("failed to release GL objects")?;
        Ok(())
    }

    fn enqueue_kernel(&mut self, kernel: KernelId, args: &[KernelArg], work: &WorkSize) -> Result<()> {
        let queue = self.queue()?;
        let cl_kernel = self
            .kernels
            .get(kernel.0)
            .ok_or_else(|| anyhow!("unknown kernel {}", kernel.0))?;

        let mut exec = ExecuteKernel::new(cl_kernel);
        for arg in args {
            unsafe {
                match *arg {
                    KernelArg::Mem(id) => {
                        let raw: cl_mem = self.mem(id)?.raw();
                        exec.set_arg(&raw);
                    }
                    KernelArg::Int(v) => {
                        exec.set_arg(&v);
                    }
                    KernelArg::Float(v) => {
                        exec.set_arg(&v);
                    }
                }
            }
        }

        unsafe {
            exec.set_global_work_sizes(work.global())
                .set_local_work_sizes(work.local())
                .enqueue_nd_range(queue)
        }
        .context("error queuing kernel for execution")?;
        Ok(())
    }

    fn write_buffer(&mut self, mem: MemId, data: &[u8]) -> Result<()> {
        let queue = self
            .queue
            .as_ref()
            .ok_or_else(|| anyhow!("no OpenCL command queue"))?;
        let buffer = self
            .mems
            .get_mut(mem.0)
            .and_then(ClMemory::host_buffer_mut)
            .ok_or_else(|| anyhow!("memory object {} is not a host buffer", mem.0))?;
        unsafe { queue.enqueue_write_buffer(buffer, CL_BLOCKING, 0, data, &[]) }
            .context("error writing buffer")?;
        Ok(())
    }

    fn read_buffer(&mut self, mem: MemId, out: &mut [u8]) -> Result<()> {
        let queue = self.queue()?;
        let buffer = self
            .mem(mem)?
            .host_buffer()
            .ok_or_else(|| anyhow!("memory object {} is not a host buffer", mem.0))?;
        unsafe { queue.enqueue_read_buffer(buffer, CL_BLOCKING, 0, out, &[]) }
            .context("error reading result buffer")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.queue()?.finish().context("clFinish failed")?;
        Ok(())
    }

    fn release_all(&mut self) {
        let had_context = self.context.is_some();
        self.queue = None;
        self.kernels.clear();
        self.program = None;
        self.mems.clear();
        self.device = None;
        self.context = None;
        if had_context {
            debug!("OpenCL session released");
        }
    }

    fn device_name(&self) -> Option<String> {
        self.device.as_ref().and_then(|d| d.name().ok())
    }
}

impl Drop for OpenClBridge {
    fn drop(&mut self) {
        self.release_all();
    }
}
