//! The OpenGL side of interop: the [`GlApi`] seam and [`RawGl`], its
//! implementation on the host's current context.

use std::sync::Once;

use anyhow::{bail, Result};
use gl::types::{GLenum, GLint, GLsizei, GLsizeiptr, GLuint};
use tracing::{debug, error};

/// `GL_TEXTURE_RECTANGLE` is not in the `gl` crate's default API.
pub const GL_TEXTURE_RECTANGLE: GLenum = 0x84F5;

/// GL operations the interop plugins need.
pub trait GlApi {
    /// Block until all issued GL commands complete. Required before OpenCL
    /// acquires shared objects.
    fn finish(&mut self);

    /// Create an RGBA float texture with undefined contents.
    fn create_texture(&mut self, target: GLenum, width: u32, height: u32) -> Result<GLuint>;

    /// Create an array buffer of `byte_len` bytes with undefined contents.
    fn create_vertex_buffer(&mut self, byte_len: usize) -> Result<GLuint>;

    /// Delete a texture. `0` is ignored.
    fn delete_texture(&mut self, texture: GLuint);

    /// Delete a buffer. `0` is ignored.
    fn delete_buffer(&mut self, buffer: GLuint);

    /// Copy a texture onto the currently bound draw framebuffer.
    fn present_texture(&mut self, target: GLenum, texture: GLuint, width: u32, height: u32);

    /// Draw `vertex_count` float2 vertices from `buffer` as line segments.
    fn draw_lines(&mut self, buffer: GLuint, vertex_count: usize, line_width: f32);

    /// Free helper objects owned by the implementation.
    fn release(&mut self);
}

static GL_INIT_ONCE: Once = Once::new();

/// [`GlApi`] on whatever GL context the host has made current.
#[derive(Debug, Default)]
pub struct RawGl {
    /// Read framebuffer used by [`GlApi::present_texture`].
    blit_fbo: GLuint,
}

impl RawGl {
    /// GL function pointers are loaded exactly once via `gl_loader`.
    pub fn new() -> Self {
        GL_INIT_ONCE.call_once(|| {
            gl_loader::init_gl();
            gl::load_with(|s| gl_loader::get_proc_address(s).cast());
        });
        Self::default()
    }

    fn check_error(what: &str) -> Result<()> {
        let err = unsafe { gl::GetError() };
        if err != gl::NO_ERROR {
            bail!("{what} failed with GL error 0x{err:04X}");
        }
        Ok(())
    }

    fn clear_errors() {
        unsafe { while gl::GetError() != gl::NO_ERROR {} }
    }
}

impl GlApi for RawGl {
    fn finish(&mut self) {
        unsafe { gl::Finish() };
    }

    fn create_texture(&mut self, target: GLenum, width: u32, height: u32) -> Result<GLuint> {
        Self::clear_errors();
        let mut tex: GLuint = 0;
        unsafe {
            gl::GenTextures(1, &mut tex);
            gl::BindTexture(target, tex);
            gl::TexParameteri(target, gl::TEXTURE_MIN_FILTER, gl::NEAREST as GLint);
            gl::TexParameteri(target, gl::TEXTURE_MAG_FILTER, gl::NEAREST as GLint);
            gl::TexParameteri(target, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as GLint);
            gl::TexParameteri(target, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as GLint);
            gl::TexImage2D(
                target,
                0,
                gl::RGBA32F as GLint,
                width as GLsizei,
                height as GLsizei,
                0,
                gl::RGBA,
                gl::FLOAT,
                std::ptr::null(),
            );
            gl::BindTexture(target, 0);
        }
        if let Err(e) = Self::check_error("texture creation") {
            self.delete_texture(tex);
            return Err(e);
        }
        debug!(tex, width, height, "created GL texture");
        Ok(tex)
    }

    fn create_vertex_buffer(&mut self, byte_len: usize) -> Result<GLuint> {
        Self::clear_errors();
        let mut vbo: GLuint = 0;
        unsafe {
            gl::GenBuffers(1, &mut vbo);
            gl::BindBuffer(gl::ARRAY_BUFFER, vbo);
            gl::BufferData(
                gl::ARRAY_BUFFER,
                byte_len as GLsizeiptr,
                std::ptr::null(),
                gl::DYNAMIC_DRAW,
            );
            gl::BindBuffer(gl::ARRAY_BUFFER, 0);
        }
        if let Err(e) = Self::check_error("vertex buffer creation") {
            self.delete_buffer(vbo);
            return Err(e);
        }
        debug!(vbo, byte_len, "created GL vertex buffer");
        Ok(vbo)
    }

    fn delete_texture(&mut self, texture: GLuint) {
        if texture != 0 {
            unsafe { gl::DeleteTextures(1, &texture) };
        }
    }

    fn delete_buffer(&mut self, buffer: GLuint) {
        if buffer != 0 {
            unsafe { gl::DeleteBuffers(1, &buffer) };
        }
    }

    fn present_texture(&mut self, target: GLenum, texture: GLuint, width: u32, height: u32) {
        if texture == 0 {
            return;
        }
        unsafe {
            let mut draw_fbo: GLint = 0;
            gl::GetIntegerv(gl::DRAW_FRAMEBUFFER_BINDING, &mut draw_fbo);
            let mut viewport: [GLint; 4] = [0; 4];
            gl::GetIntegerv(gl::VIEWPORT, viewport.as_mut_ptr());

            if self.blit_fbo == 0 {
                gl::GenFramebuffers(1, &mut self.blit_fbo);
            }

            gl::BindFramebuffer(gl::READ_FRAMEBUFFER, self.blit_fbo);
            gl::FramebufferTexture2D(
                gl::READ_FRAMEBUFFER,
                gl::COLOR_ATTACHMENT0,
                target,
                texture,
                0,
            );
            gl::ReadBuffer(gl::COLOR_ATTACHMENT0);

            gl::BlitFramebuffer(
                0,
                0,
                width as GLint,
                height as GLint,
                viewport[0],
                viewport[1],
                viewport[0] + viewport[2],
                viewport[1] + viewport[3],
                gl::COLOR_BUFFER_BIT,
                gl::NEAREST,
            );

            gl::FramebufferTexture2D(gl::READ_FRAMEBUFFER, gl::COLOR_ATTACHMENT0, target, 0, 0);
            gl::BindFramebuffer(gl::READ_FRAMEBUFFER, 0);
            gl::BindFramebuffer(gl::DRAW_FRAMEBUFFER, draw_fbo as GLuint);
        }
        if let Err(e) = Self::check_error("texture blit") {
            error!("{e}");
        }
    }

    fn draw_lines(&mut self, buffer: GLuint, vertex_count: usize, line_width: f32) {
        if buffer == 0 || vertex_count == 0 {
            return;
        }
        unsafe {
            gl::BindBuffer(gl::ARRAY_BUFFER, buffer);
            gl::EnableVertexAttribArray(0);
            gl::VertexAttribPointer(0, 2, gl::FLOAT, gl::FALSE, 0, std::ptr::null());
            gl::LineWidth(line_width);
            gl::DrawArrays(gl::LINES, 0, vertex_count as GLsizei);
            gl::DisableVertexAttribArray(0);
            gl::BindBuffer(gl::ARRAY_BUFFER, 0);
        }
    }

    fn release(&mut self) {
        if self.blit_fbo != 0 {
            unsafe {
                gl::BindFramebuffer(gl::READ_FRAMEBUFFER, 0);
                gl::DeleteFramebuffers(1, &self.blit_fbo);
            }
            self.blit_fbo = 0;
        }
    }
}
