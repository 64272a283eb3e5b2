//! Memory objects: GL textures and buffers wrapped for OpenCL, and plain
//! device buffers.

use std::ffi::c_void;
use std::ptr;

use anyhow::{Context as _, Result};
use opencl3::context::Context;
use opencl3::memory::{
    Buffer, ClMem, Image, CL_MEM_COPY_HOST_PTR, CL_MEM_READ_ONLY, CL_MEM_READ_WRITE,
    CL_MEM_WRITE_ONLY,
};
use opencl3::types::{cl_mem, cl_mem_flags, cl_mem_object_type};

use crate::bridge::{Access, MemDesc, MemInfo, MemKind};

const CL_MEM_OBJECT_BUFFER: cl_mem_object_type = 0x10F0;
const CL_MEM_OBJECT_IMAGE2D: cl_mem_object_type = 0x10F1;

fn flags(access: Access) -> cl_mem_flags {
    match access {
        Access::ReadOnly => CL_MEM_READ_ONLY,
        Access::WriteOnly => CL_MEM_WRITE_ONLY,
        Access::ReadWrite => CL_MEM_READ_WRITE,
    }
}

/// A memory object owned by a session.
pub enum ClMemory {
    GlTexture { image: Image, texture: u32 },
    GlBuffer { buffer: Buffer<u8>, name: u32 },
    Host(Buffer<u8>),
}

impl ClMemory {
    pub fn create(context: &Context, desc: &MemDesc) -> Result<Self> {
        let mem = match desc {
            MemDesc::GlTexture {
                target,
                texture,
                access,
            } => {
                let image = unsafe {
                    Image::create_from_gl_texture(context, flags(*access), *target, 0, *texture)
                }
                .with_context(|| format!("failed creating memory from GL texture {texture}"))?;
                ClMemory::GlTexture {
                    image,
                    texture: *texture,
                }
            }
            MemDesc::GlBuffer { buffer, access } => {
                let cl_buffer =
                    unsafe { Buffer::<u8>::create_from_gl_buffer(context, flags(*access), *buffer) }
                        .with_context(|| format!("failed creating memory from GL buffer {buffer}"))?;
                ClMemory::GlBuffer {
                    buffer: cl_buffer,
                    name: *buffer,
                }
            }
            MemDesc::Host { len, access, init } => {
                let buffer = match init {
                    Some(data) => {
                        let mut data = data.clone();
                        data.resize(*len, 0);
                        unsafe {
                            Buffer::<u8>::create(
                                context,
                                flags(*access) | CL_MEM_COPY_HOST_PTR,
                                *len,
                                data.as_mut_ptr() as *mut c_void,
                            )
                        }
                    }
                    None => unsafe {
                        Buffer::<u8>::create(context, flags(*access), *len, ptr::null_mut())
                    },
                }
                .with_context(|| format!("failed creating a {len}-byte buffer"))?;
                ClMemory::Host(buffer)
            }
        };
        Ok(mem)
    }

    pub fn raw(&self) -> cl_mem {
        match self {
            ClMemory::GlTexture { image, .. } => image.get(),
            ClMemory::GlBuffer { buffer, .. } => buffer.get(),
            ClMemory::Host(buffer) => buffer.get(),
        }
    }

    pub fn is_gl_shared(&self) -> bool {
        !matches!(self, ClMemory::Host(_))
    }

    pub fn host_buffer(&self) -> Option<&Buffer<u8>> {
        match self {
            ClMemory::Host(buffer) => Some(buffer),
            _ => None,
        }
    }

    pub fn host_buffer_mut(&mut self) -> Option<&mut Buffer<u8>> {
        match self {
            ClMemory::Host(buffer) => Some(buffer),
            _ => None,
        }
    }

    pub fn info(&self) -> Result<MemInfo> {
        let (mem_type, size, gl_name) = match self {
            ClMemory::GlTexture { image, texture } => (image.mem_type()?, image.size()?, Some(*texture)),
            ClMemory::GlBuffer { buffer, name } => (buffer.mem_type()?, buffer.size()?, Some(*name)),
            ClMemory::Host(buffer) => (buffer.mem_type()?, buffer.size()?, None),
        };
        let kind = match mem_type {
            CL_MEM_OBJECT_BUFFER => MemKind::Buffer,
            CL_MEM_OBJECT_IMAGE2D => MemKind::Image2D,
            other => MemKind::Other(other),
        };
        Ok(MemInfo { kind, size, gl_name })
    }
}
