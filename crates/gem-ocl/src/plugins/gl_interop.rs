//! `ocl_glinterop`: OpenCL animates a GL texture and a line-segment VBO that
//! this object owns, then draws both.

use std::path::Path;

use anyhow::Result;
use cl_interop::{Access, ClBridge, GlApi, MemDesc, OpenClBridge, RawGl, WorkSize, GL_TEXTURE_RECTANGLE};
use gem_core::log::init_logging;
use gem_core::{Atom, ClassInfo, GemPlugin, GemState, ShapeBase};
use tracing::{debug, error};

use super::{no_method, IMAGE_LOCAL};
use crate::config::PipelineConfig;
use crate::pipeline::{Arg, InteropPipeline, Pass};
use crate::sequence::SequenceCounter;

const CLASS: ClassInfo = ClassInfo {
    name: "ocl_glinterop",
    description: "OpenCL writes a GL texture and vertex buffer",
};

const KERNEL_FILE: &str = "gl_interop.cl";
const KERNELS: &[&str] = &["init_vbo_kernel", "init_texture_kernel"];
const KERNEL_VBO: usize = 0;
const KERNEL_TEXTURE: usize = 1;

const SLOT_VBO: usize = 0;
const SLOT_TEX: usize = 1;

pub const TEXTURE_WIDTH: usize = 256;
pub const TEXTURE_HEIGHT: usize = 256;
pub const SEGMENTS: usize = 256;
/// Two `float2` vertices per segment.
pub const VERTEX_COUNT: usize = SEGMENTS * 2;
const VBO_BYTES: usize = VERTEX_COUNT * 2 * std::mem::size_of::<f32>();
const VBO_LOCAL: usize = 32;

pub struct OclGlInterop<B: ClBridge, G: GlApi> {
    shape: ShapeBase,
    pipeline: InteropPipeline<B>,
    gl: G,
    texture: u32,
    vbo: u32,
    texture_seq: SequenceCounter,
    vbo_seq: SequenceCounter,
}

impl OclGlInterop<OpenClBridge, RawGl> {
    pub fn create(size: f32) -> Self {
        init_logging();
        Self::new(size, OpenClBridge::new(), RawGl::new())
    }
}

impl<B: ClBridge, G: GlApi> OclGlInterop<B, G> {
    pub fn new(size: f32, bridge: B, gl: G) -> Self {
        Self {
            shape: ShapeBase::new(size),
            pipeline: InteropPipeline::new(bridge, PipelineConfig::new(CLASS.name, KERNEL_FILE, KERNELS)),
            gl,
            texture: 0,
            vbo: 0,
            texture_seq: SequenceCounter::new(TEXTURE_WIDTH as i32),
            vbo_seq: SequenceCounter::new(2 * TEXTURE_WIDTH as i32),
        }
    }

    pub fn with_kernel_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.pipeline.config_mut().kernel_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn pipeline(&self) -> &InteropPipeline<B> {
        &self.pipeline
    }

    /// GL texture name, `0` when not created.
    pub fn texture(&self) -> u32 {
        self.texture
    }

    /// GL buffer name, `0` when not created.
    pub fn vbo(&self) -> u32 {
        self.vbo
    }

    pub fn texture_sequence(&self) -> &SequenceCounter {
        &self.texture_seq
    }

    pub fn vbo_sequence(&self) -> &SequenceCounter {
        &self.vbo_seq
    }

    fn create_gl_objects(&mut self) -> Result<()> {
        if self.texture == 0 {
            self.texture =
                self.gl
                    .create_texture(GL_TEXTURE_RECTANGLE, TEXTURE_WIDTH as u32, TEXTURE_HEIGHT as u32)?;
        }
        if self.vbo == 0 {
            self.vbo = self.gl.create_vertex_buffer(VBO_BYTES)?;
        }
        debug!(class = CLASS.name, texture = self.texture, vbo = self.vbo, "GL objects created");
        Ok(())
    }

    fn delete_gl_objects(&mut self) {
        if self.texture != 0 {
            self.gl.delete_texture(self.texture);
            self.texture = 0;
        }
        if self.vbo != 0 {
            self.gl.delete_buffer(self.vbo);
            self.vbo = 0;
        }
        self.gl.release();
    }

    fn texture_pass(&mut self) -> Result<()> {
        let args = [
            Arg::Mem(SLOT_TEX),
            Arg::Int(TEXTURE_WIDTH as i32),
            Arg::Int(TEXTURE_HEIGHT as i32),
            Arg::Int(self.texture_seq.advance()),
        ];
        let pass = Pass {
            kernel: KERNEL_TEXTURE,
            args: &args,
            work: WorkSize::new(&[TEXTURE_WIDTH, TEXTURE_HEIGHT], &IMAGE_LOCAL),
            shared: &[SLOT_TEX],
            finish: true,
        };
        self.pipeline.run(&mut self.gl, &pass)
    }

    fn vbo_pass(&mut self) -> Result<()> {
        let args = [
            Arg::Mem(SLOT_VBO),
            Arg::Int(TEXTURE_WIDTH as i32),
            Arg::Int(TEXTURE_HEIGHT as i32),
            Arg::Int(SEGMENTS as i32),
            Arg::Int(self.vbo_seq.advance()),
        ];
        let pass = Pass {
            kernel: KERNEL_VBO,
            args: &args,
            work: WorkSize::new(&[SEGMENTS], &[VBO_LOCAL]),
            shared: &[SLOT_VBO],
            finish: true,
        };
        self.pipeline.run(&mut self.gl, &pass)
    }
}

impl<B: ClBridge, G: GlApi> GemPlugin for OclGlInterop<B, G> {
    fn class_info(&self) -> ClassInfo {
        CLASS
    }

    fn start_rendering(&mut self) {
        self.pipeline.begin_session();
        if let Err(e) = self.create_gl_objects() {
            error!(class = CLASS.name, "{e:#}");
            self.delete_gl_objects();
            return;
        }
        let memory = [
            MemDesc::GlBuffer {
                buffer: self.vbo,
                access: Access::ReadWrite,
            },
            MemDesc::GlTexture {
                target: GL_TEXTURE_RECTANGLE,
                texture: self.texture,
                access: Access::ReadWrite,
            },
        ];
        // Failures are logged by the pipeline, which is then stopped.
        self.pipeline.initialize(&memory).ok();
    }

    fn render(&mut self, _state: &mut GemState) {
        if !self.pipeline.is_ready() {
            return;
        }
        if let Err(e) = self.texture_pass() {
            error!(class = CLASS.name, "texture pass: {e:#}");
            return;
        }
        if let Err(e) = self.vbo_pass() {
            error!(class = CLASS.name, "vertex buffer pass: {e:#}");
            return;
        }
        self.gl.present_texture(
            GL_TEXTURE_RECTANGLE,
            self.texture,
            TEXTURE_WIDTH as u32,
            TEXTURE_HEIGHT as u32,
        );
        self.gl.draw_lines(self.vbo, VERTEX_COUNT, self.shape.line_width());
    }

    fn stop_rendering(&mut self) {
        self.pipeline.teardown();
        self.delete_gl_objects();
    }

    fn message(&mut self, selector: &str, args: &[Atom]) -> Result<()> {
        if self.shape.message(selector, args)? {
            return Ok(());
        }
        Err(no_method(CLASS.name, selector))
    }
}
