//! `ocl_texreadback`: thresholds an external GL texture on the device and
//! hands the result down the chain as a luminance image.
//!
//! The texture comes from the `extTexture` message, which may also carry its
//! size; the incoming pix block has the final say. The device mask buffer is
//! sized per image, so a size change (or a different texture) drops a ready
//! OpenCL session and the next frame initializes it again. A session that
//! failed stays stopped until the next render-start.

use std::path::Path;

use anyhow::Result;
use cl_interop::{Access, ClBridge, GlApi, MemDesc, OpenClBridge, RawGl, WorkSize, GL_TEXTURE_RECTANGLE};
use gem_core::atom::single_float;
use gem_core::log::init_logging;
use gem_core::{Atom, ClassInfo, ColorFormat, ExtTexture, GemPlugin, GemState, ImageStruct, PixBlock, ShapeBase};
use tracing::{debug, error, warn};

use super::{no_method, IMAGE_LOCAL};
use crate::bytes::mask_to_luminance;
use crate::config::PipelineConfig;
use crate::pipeline::{Arg, InteropPipeline, Pass, PipelineState};

const CLASS: ClassInfo = ClassInfo {
    name: "ocl_texreadback",
    description: "OpenCL threshold of a GL texture into a luminance mask",
};

const KERNEL_FILE: &str = "ocl_texreadback.cl";
const KERNELS: &[&str] = &["process_texture_kernel"];

const SLOT_TEX: usize = 0;
const SLOT_MASK: usize = 1;

pub const DEFAULT_THRESHOLD: f32 = 0.5;

pub struct OclTexReadback<B: ClBridge, G: GlApi> {
    shape: ShapeBase,
    pipeline: InteropPipeline<B>,
    gl: G,
    ext: Option<ExtTexture>,
    threshold: f32,
    /// Output image, `GL_LUMINANCE`, one byte per pixel.
    mask: ImageStruct,
    /// Raw 0/1 bytes read back from the device.
    mask_bits: Vec<u8>,
}

impl OclTexReadback<OpenClBridge, RawGl> {
    pub fn create(size: f32) -> Self {
        init_logging();
        Self::new(size, OpenClBridge::new(), RawGl::new())
    }
}

impl<B: ClBridge, G: GlApi> OclTexReadback<B, G> {
    pub fn new(size: f32, bridge: B, gl: G) -> Self {
        let mut mask = ImageStruct::default();
        mask.set_csize_by_format(ColorFormat::Luminance);
        Self {
            shape: ShapeBase::new(size),
            pipeline: InteropPipeline::new(bridge, PipelineConfig::new(CLASS.name, KERNEL_FILE, KERNELS)),
            gl,
            ext: None,
            threshold: DEFAULT_THRESHOLD,
            mask,
            mask_bits: Vec::new(),
        }
    }

    pub fn with_kernel_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.pipeline.config_mut().kernel_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn pipeline(&self) -> &InteropPipeline<B> {
        &self.pipeline
    }

    pub fn mask(&self) -> &ImageStruct {
        &self.mask
    }

    pub fn mask_bits(&self) -> &[u8] {
        &self.mask_bits
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn ext_texture(&self) -> Option<&ExtTexture> {
        self.ext.as_ref()
    }

    fn texture_target(ext: &ExtTexture) -> u32 {
        match ext.target {
            Some(target) => target,
            None => GL_TEXTURE_RECTANGLE,
        }
    }

    fn resize(&mut self, width: usize, height: usize) {
        debug!(class = CLASS.name, width, height, "reallocating mask");
        self.mask.xsize = width;
        self.mask.ysize = height;
        self.mask.set_csize_by_format(ColorFormat::Luminance);
        self.mask.allocate();
        self.mask_bits = vec![0; width * height];
        self.pipeline.restart();
    }

    fn initialize(&mut self, ext: &ExtTexture) {
        let memory = [
            MemDesc::GlTexture {
                target: Self::texture_target(ext),
                texture: ext.texture,
                access: Access::ReadOnly,
            },
            MemDesc::Host {
                len: self.mask_bits.len(),
                access: Access::WriteOnly,
                init: None,
            },
        ];
        // Failures are logged by the pipeline, which is then stopped.
        self.pipeline.initialize(&memory).ok();
    }

    fn process(&mut self) -> Result<()> {
        let (width, height) = self.mask.dimensions();
        let args = [
            Arg::Mem(SLOT_TEX),
            Arg::Mem(SLOT_MASK),
            Arg::Int(width as i32),
            Arg::Int(height as i32),
            Arg::Float(self.threshold),
        ];
        let pass = Pass {
            kernel: 0,
            args: &args,
            work: WorkSize::new(&[width, height], &IMAGE_LOCAL),
            shared: &[SLOT_TEX],
            finish: true,
        };
        self.pipeline.run(&mut self.gl, &pass)?;
        self.pipeline.read(SLOT_MASK, &mut self.mask_bits)?;
        Ok(())
    }
}

impl<B: ClBridge, G: GlApi> GemPlugin for OclTexReadback<B, G> {
    fn class_info(&self) -> ClassInfo {
        CLASS
    }

    fn start_rendering(&mut self) {
        self.pipeline.begin_session();
    }

    fn render(&mut self, state: &mut GemState) {
        let Some(pix) = state.pix() else {
            return;
        };
        let (width, height) = pix.image.dimensions();
        let upsidedown = pix.image.upsidedown;
        if width == 0 || height == 0 {
            return;
        }
        if (width, height) != self.mask.dimensions() {
            self.resize(width, height);
        }

        let Some(ext) = self.ext else {
            debug!(class = CLASS.name, "no texture yet");
            return;
        };
        self.mask.upsidedown = ext.upsidedown.unwrap_or(upsidedown);

        if self.pipeline.state() == PipelineState::Uninitialized {
            self.initialize(&ext);
        }
        if !self.pipeline.is_ready() {
            return;
        }

        if let Err(e) = self.process() {
            error!(class = CLASS.name, "{e:#}");
            return;
        }
        mask_to_luminance(&self.mask_bits, &mut self.mask.data);
        state.set_pix(PixBlock::new(self.mask.clone()));
    }

    fn stop_rendering(&mut self) {
        self.pipeline.teardown();
    }

    fn message(&mut self, selector: &str, args: &[Atom]) -> Result<()> {
        match selector {
            "extTexture" => {
                let ext = ExtTexture::parse(args)?;
                if ext.target.is_some() && ext.texture_target().is_none() {
                    warn!(class = CLASS.name, target = ext.target, "unrecognised texture target");
                }
                let changed = self.ext.map_or(true, |old| {
                    old.texture != ext.texture || Self::texture_target(&old) != Self::texture_target(&ext)
                });
                if changed {
                    self.pipeline.restart();
                }
                if let Some((width, height)) = ext.size {
                    let size = (width.max(0) as usize, height.max(0) as usize);
                    if size.0 > 0 && size.1 > 0 && size != self.mask.dimensions() {
                        self.resize(size.0, size.1);
                    }
                }
                self.ext = Some(ext);
                Ok(())
            }
            "threshold" => {
                self.threshold = single_float(selector, args)?;
                Ok(())
            }
            _ => {
                if self.shape.message(selector, args)? {
                    return Ok(());
                }
                Err(no_method(CLASS.name, selector))
            }
        }
    }
}
