//! In-memory stand-ins for the OpenCL and OpenGL seams.
//!
//! Both fakes append to one shared event log so tests can check ordering
//! across the two APIs. The bridge runs the shipped kernels on the host and
//! refuses to touch a GL-shared object that has not been acquired.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use anyhow::{anyhow, bail, Result};
use cl_interop::{
    ClBridge, GlApi, InitStage, KernelArg, KernelId, MemDesc, MemId, MemInfo, MemKind, WorkSize,
};

pub fn kernel_dir() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/../../kernels")
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CreateContext,
    CreateQueue,
    BuildProgram,
    CreateKernel(String),
    CreateMem(MemDesc),
    Acquire(Vec<MemId>),
    Release(Vec<MemId>),
    Enqueue { kernel: String, args: Vec<KernelArg>, work: WorkSize },
    Write(MemId),
    Read(MemId),
    Finish,
    ReleaseAll,
    GlFinish,
    GlCreateTexture(u32),
    GlCreateBuffer(u32, usize),
    GlDeleteTexture(u32),
    GlDeleteBuffer(u32),
    GlPresent(u32),
    GlDrawLines { buffer: u32, vertices: usize, width: f32 },
    GlRelease,
}

impl Event {
    pub fn is_gl(&self) -> bool {
        matches!(
            self,
            Event::GlFinish
                | Event::GlCreateTexture(_)
                | Event::GlCreateBuffer(..)
                | Event::GlDeleteTexture(_)
                | Event::GlDeleteBuffer(_)
                | Event::GlPresent(_)
                | Event::GlDrawLines { .. }
                | Event::GlRelease
        )
    }
}

#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<Event>,
    /// Make this init step fail. `Platform` fails context creation too.
    pub fail_at: Option<InitStage>,
    pub fail_acquire: bool,
    pub fail_enqueue: bool,
    pub fail_read: bool,
    pub fail_gl_texture: bool,
    /// Per-pixel luminance of external GL textures, keyed by GL name.
    pub textures: HashMap<u32, Vec<f32>>,
    /// Memory currently held by OpenCL.
    pub acquired: HashSet<MemId>,
    next_gl_name: u32,
}

pub type Shared = Rc<RefCell<Recorder>>;

pub fn recorder() -> Shared {
    Rc::new(RefCell::new(Recorder::default()))
}

impl Recorder {
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    pub fn cl_events(&self) -> Vec<Event> {
        self.events.iter().filter(|e| !e.is_gl()).cloned().collect()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn acquires(&self) -> usize {
        self.count(|e| matches!(e, Event::Acquire(_)))
    }

    pub fn releases(&self) -> usize {
        self.count(|e| matches!(e, Event::Release(_)))
    }

    pub fn enqueued(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Enqueue { kernel, .. } => Some(kernel.clone()),
                _ => None,
            })
            .collect()
    }

    fn fails(&self, stage: InitStage) -> Result<()> {
        if self.fail_at == Some(stage) {
            return Err(anyhow!("injected failure").context(stage));
        }
        Ok(())
    }
}

struct FakeMem {
    desc: MemDesc,
    data: Vec<u8>,
}

pub struct FakeBridge {
    rec: Shared,
    source: Option<String>,
    kernels: Vec<String>,
    mems: Vec<FakeMem>,
}

impl FakeBridge {
    pub fn new(rec: &Shared) -> Self {
        Self {
            rec: Rc::clone(rec),
            source: None,
            kernels: Vec::new(),
            mems: Vec::new(),
        }
    }

    fn log(&self, event: Event) {
        self.rec.borrow_mut().events.push(event);
    }

    fn mem(&self, id: MemId) -> Result<&FakeMem> {
        self.mems.get(id.0).ok_or_else(|| anyhow!("unknown memory object {}", id.0))
    }

    fn check_usable(&self, id: MemId) -> Result<()> {
        if self.mem(id)?.desc.is_gl_shared() && !self.rec.borrow().acquired.contains(&id) {
            bail!("memory object {} used without acquire", id.0);
        }
        Ok(())
    }

    fn floats(&self, id: MemId) -> Result<Vec<f32>> {
        Ok(self
            .mem(id)?
            .data
            .chunks_exact(4)
            .map(bytemuck::pod_read_unaligned::<f32>)
            .collect())
    }

    fn run_hello(&mut self, args: &[KernelArg], work: &WorkSize) -> Result<()> {
        let [KernelArg::Mem(a), KernelArg::Mem(b), KernelArg::Mem(out)] = args else {
            bail!("hello_kernel: bad arguments {args:?}");
        };
        let (a, b) = (self.floats(*a)?, self.floats(*b)?);
        let n = work.global()[0];
        let out = &mut self.mems[out.0].data;
        for i in 0..n {
            let sum = a[i] + b[i];
            out[i * 4..i * 4 + 4].copy_from_slice(bytemuck::bytes_of(&sum));
        }
        Ok(())
    }

    fn run_threshold(&mut self, args: &[KernelArg]) -> Result<()> {
        let [KernelArg::Mem(tex), KernelArg::Mem(mask), KernelArg::Int(w), KernelArg::Int(h), KernelArg::Float(t)] =
            args
        else {
            bail!("process_texture_kernel: bad arguments {args:?}");
        };
        self.check_usable(*tex)?;
        let name = match self.mem(*tex)?.desc {
            MemDesc::GlTexture { texture, .. } => texture,
            _ => bail!("argument 0 is not a texture"),
        };
        let luma = self.rec.borrow().textures.get(&name).cloned().unwrap_or_default();
        let pixels = (*w * *h) as usize;
        let out = &mut self.mems[mask.0].data;
        if out.len() != pixels {
            bail!("mask buffer holds {} bytes, image has {pixels} pixels", out.len());
        }
        for (i, bit) in out.iter_mut().enumerate() {
            *bit = u8::from(luma.get(i).copied().unwrap_or(0.0) > *t);
        }
        Ok(())
    }
}

impl ClBridge for FakeBridge {
    fn create_context(&mut self) -> Result<()> {
        self.log(Event::CreateContext);
        let rec = self.rec.borrow();
        rec.fails(InitStage::Platform)?;
        rec.fails(InitStage::Context)
    }

    fn create_queue(&mut self) -> Result<()> {
        self.log(Event::CreateQueue);
        self.rec.borrow().fails(InitStage::Queue)
    }

    fn build_program(&mut self, source: &str) -> Result<()> {
        self.log(Event::BuildProgram);
        self.rec.borrow().fails(InitStage::Build)?;
        self.source = Some(source.to_owned());
        Ok(())
    }

    fn create_kernel(&mut self, name: &str) -> Result<KernelId> {
        self.log(Event::CreateKernel(name.to_owned()));
        self.rec.borrow().fails(InitStage::Kernel)?;
        let known = self.source.as_deref().is_some_and(|s| s.contains(name));
        if !known {
            return Err(anyhow!("no kernel named {name}").context(InitStage::Kernel));
        }
        self.kernels.push(name.to_owned());
        Ok(KernelId(self.kernels.len() - 1))
    }

    fn create_mem(&mut self, desc: &MemDesc) -> Result<MemId> {
        self.log(Event::CreateMem(desc.clone()));
        self.rec.borrow().fails(InitStage::Memory)?;
        let data = match desc {
            MemDesc::Host { len, init, .. } => init.clone().unwrap_or_else(|| vec![0; *len]),
            _ => Vec::new(),
        };
        self.mems.push(FakeMem {
            desc: desc.clone(),
            data,
        });
        Ok(MemId(self.mems.len() - 1))
    }

    fn mem_info(&self, mem: MemId) -> Result<MemInfo> {
        let mem = self.mem(mem)?;
        let kind = match mem.desc {
            MemDesc::GlTexture { .. } => MemKind::Image2D,
            _ => MemKind::Buffer,
        };
        Ok(MemInfo {
            kind,
            size: mem.data.len(),
            gl_name: mem.desc.gl_name(),
        })
    }

    fn acquire_gl_objects(&mut self, mems: &[MemId]) -> Result<()> {
        self.log(Event::Acquire(mems.to_vec()));
        let mut rec = self.rec.borrow_mut();
        if rec.fail_acquire {
            bail!("injected acquire failure");
        }
        for id in mems {
            if !rec.acquired.insert(*id) {
                bail!("memory object {} acquired twice", id.0);
            }
        }
        Ok(())
    }

    fn release_gl_objects(&mut self, mems: &[MemId]) -> Result<()> {
        self.log(Event::Release(mems.to_vec()));
        let mut rec = self.rec.borrow_mut();
        for id in mems {
            if !rec.acquired.remove(id) {
                bail!("memory object {} released without acquire", id.0);
            }
        }
        Ok(())
    }

    fn enqueue_kernel(&mut self, kernel: KernelId, args: &[KernelArg], work: &WorkSize) -> Result<()> {
        let name = self
            .kernels
            .get(kernel.0)
            .cloned()
            .ok_or_else(|| anyhow!("unknown kernel {}", kernel.0))?;
        self.log(Event::Enqueue {
            kernel: name.clone(),
            args: args.to_vec(),
            work: work.clone(),
        });
        if self.rec.borrow().fail_enqueue {
            bail!("injected enqueue failure");
        }
        match name.as_str() {
            "hello_kernel" => self.run_hello(args, work),
            "process_texture_kernel" => self.run_threshold(args),
            _ => {
                for arg in args {
                    if let KernelArg::Mem(id) = arg {
                        self.check_usable(*id)?;
                    }
                }
                Ok(())
            }
        }
    }

    fn write_buffer(&mut self, mem: MemId, data: &[u8]) -> Result<()> {
        self.log(Event::Write(mem));
        let target = &mut self
            .mems
            .get_mut(mem.0)
            .ok_or_else(|| anyhow!("unknown memory object {}", mem.0))?
            .data;
        let n = target.len().min(data.len());
        target[..n].copy_from_slice(&data[..n]);
        Ok(())
    }

    fn read_buffer(&mut self, mem: MemId, out: &mut [u8]) -> Result<()> {
        self.log(Event::Read(mem));
        if self.rec.borrow().fail_read {
            bail!("injected read failure");
        }
        let data = &self.mem(mem)?.data;
        let n = out.len().min(data.len());
        out[..n].copy_from_slice(&data[..n]);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.log(Event::Finish);
        Ok(())
    }

    fn release_all(&mut self) {
        self.log(Event::ReleaseAll);
        self.source = None;
        self.kernels.clear();
        self.mems.clear();
        self.rec.borrow_mut().acquired.clear();
    }

    fn device_name(&self) -> Option<String> {
        Some("fake device".to_owned())
    }
}

pub struct FakeGl {
    rec: Shared,
}

impl FakeGl {
    pub fn new(rec: &Shared) -> Self {
        Self { rec: Rc::clone(rec) }
    }

    fn log(&self, event: Event) {
        self.rec.borrow_mut().events.push(event);
    }

    fn next_name(&self) -> u32 {
        let mut rec = self.rec.borrow_mut();
        rec.next_gl_name += 1;
        rec.next_gl_name
    }
}

impl GlApi for FakeGl {
    fn finish(&mut self) {
        self.log(Event::GlFinish);
    }

    fn create_texture(&mut self, _target: u32, _width: u32, _height: u32) -> Result<u32> {
        if self.rec.borrow().fail_gl_texture {
            bail!("glTexImage2D failed with GL error 0x0505");
        }
        let name = self.next_name();
        self.log(Event::GlCreateTexture(name));
        Ok(name)
    }

    fn create_vertex_buffer(&mut self, byte_len: usize) -> Result<u32> {
        let name = self.next_name();
        self.log(Event::GlCreateBuffer(name, byte_len));
        Ok(name)
    }

    fn delete_texture(&mut self, texture: u32) {
        if texture != 0 {
            self.log(Event::GlDeleteTexture(texture));
        }
    }

    fn delete_buffer(&mut self, buffer: u32) {
        if buffer != 0 {
            self.log(Event::GlDeleteBuffer(buffer));
        }
    }

    fn present_texture(&mut self, _target: u32, texture: u32, _width: u32, _height: u32) {
        self.log(Event::GlPresent(texture));
    }

    fn draw_lines(&mut self, buffer: u32, vertex_count: usize, line_width: f32) {
        self.log(Event::GlDrawLines {
            buffer,
            vertices: vertex_count,
            width: line_width,
        });
    }

    fn release(&mut self) {
        self.log(Event::GlRelease);
    }
}

/// Every init stage a bridge can fail at.
pub const BRIDGE_STAGES: [InitStage; 6] = [
    InitStage::Platform,
    InitStage::Context,
    InitStage::Queue,
    InitStage::Build,
    InitStage::Kernel,
    InitStage::Memory,
];
