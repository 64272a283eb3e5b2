//! `ocl_test`: adds two host arrays on plain device buffers and reads the
//! sum back every frame.

use std::path::Path;

use anyhow::Result;
use bytemuck::{cast_slice, cast_slice_mut};
use cl_interop::{Access, ClBridge, MemDesc, OpenClBridge, WorkSize};
use gem_core::log::init_logging;
use gem_core::{Atom, ClassInfo, GemPlugin, GemState, ShapeBase};
use tracing::{debug, error};

use super::no_method;
use crate::config::PipelineConfig;
use crate::pipeline::{Arg, InteropPipeline, Pass, PipelineState};

pub const ARRAY_SIZE: usize = 100;

const CLASS: ClassInfo = ClassInfo {
    name: "ocl_test",
    description: "OpenCL vector add on plain buffers",
};

const KERNEL_FILE: &str = "hello_world.cl";
const KERNELS: &[&str] = &["hello_kernel"];

const SLOT_A: usize = 0;
const SLOT_B: usize = 1;
const SLOT_RESULT: usize = 2;

const ARGS: [Arg; 3] = [Arg::Mem(SLOT_A), Arg::Mem(SLOT_B), Arg::Mem(SLOT_RESULT)];

pub struct OclTest<B: ClBridge> {
    shape: ShapeBase,
    pipeline: InteropPipeline<B>,
    a: Vec<f32>,
    b: Vec<f32>,
    result: Vec<f32>,
    /// Device result lands here and is only copied out once the read succeeds.
    readback: Vec<f32>,
}

impl OclTest<OpenClBridge> {
    pub fn create(size: f32) -> Self {
        init_logging();
        Self::new(size, OpenClBridge::new())
    }
}

impl<B: ClBridge> OclTest<B> {
    pub fn new(size: f32, bridge: B) -> Self {
        let a = (0..ARRAY_SIZE).map(|i| i as f32).collect();
        let b = (0..ARRAY_SIZE).map(|i| (2 * i) as f32).collect();
        Self {
            shape: ShapeBase::new(size),
            pipeline: InteropPipeline::new(bridge, PipelineConfig::new(CLASS.name, KERNEL_FILE, KERNELS)),
            a,
            b,
            result: vec![0.0; ARRAY_SIZE],
            readback: vec![0.0; ARRAY_SIZE],
        }
    }

    pub fn with_kernel_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.pipeline.config_mut().kernel_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn shape(&self) -> &ShapeBase {
        &self.shape
    }

    pub fn pipeline(&self) -> &InteropPipeline<B> {
        &self.pipeline
    }

    /// Host mirror of the result buffer as of the last successful frame.
    pub fn result(&self) -> &[f32] {
        &self.result
    }

    fn initialize(&mut self) {
        let byte_len = ARRAY_SIZE * std::mem::size_of::<f32>();
        let memory = [
            MemDesc::Host {
                len: byte_len,
                access: Access::ReadOnly,
                init: Some(cast_slice::<f32, u8>(&self.a).to_vec()),
            },
            MemDesc::Host {
                len: byte_len,
                access: Access::ReadOnly,
                init: Some(cast_slice::<f32, u8>(&self.b).to_vec()),
            },
            MemDesc::Host {
                len: byte_len,
                access: Access::ReadWrite,
                init: None,
            },
        ];
        // Failures are logged by the pipeline, which is then stopped.
        self.pipeline.initialize(&memory).ok();
    }

    fn compute(&mut self) -> Result<()> {
        let pass = Pass {
            kernel: 0,
            args: &ARGS,
            work: WorkSize::new(&[ARRAY_SIZE], &[1]),
            shared: &[],
            finish: false,
        };
        self.pipeline.run_compute(&pass)?;
        self.pipeline.read(SLOT_RESULT, cast_slice_mut(&mut self.readback))?;
        self.result.copy_from_slice(&self.readback);
        Ok(())
    }
}

impl<B: ClBridge> GemPlugin for OclTest<B> {
    fn class_info(&self) -> ClassInfo {
        CLASS
    }

    fn start_rendering(&mut self) {
        self.pipeline.begin_session();
        self.initialize();
    }

    fn render(&mut self, _state: &mut GemState) {
        if self.pipeline.state() == PipelineState::Uninitialized {
            debug!(class = CLASS.name, "initializing on first frame");
            self.initialize();
        }
        if !self.pipeline.is_ready() {
            return;
        }
        if let Err(e) = self.compute() {
            error!(class = CLASS.name, "{e:#}");
        }
    }

    fn stop_rendering(&mut self) {
        self.pipeline.teardown();
    }

    fn message(&mut self, selector: &str, args: &[Atom]) -> Result<()> {
        if self.shape.message(selector, args)? {
            return Ok(());
        }
        Err(no_method(CLASS.name, selector))
    }
}
