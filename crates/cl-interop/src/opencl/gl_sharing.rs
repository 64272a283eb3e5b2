//! Context properties that tie an OpenCL context to the current GL context.
//!
//! `cl_khr_gl_sharing` property names are hardcoded from `cl_gl.h`.

use opencl3::types::{cl_context_properties, cl_platform_id};
use tracing::warn;

pub const CL_CONTEXT_PLATFORM: cl_context_properties = 0x1084;
pub const CL_GL_CONTEXT_KHR: cl_context_properties = 0x2008;
pub const CL_GLX_DISPLAY_KHR: cl_context_properties = 0x200A;
pub const CL_WGL_HDC_KHR: cl_context_properties = 0x200B;
pub const CL_CONTEXT_PROPERTY_USE_CGL_SHAREGROUP_APPLE: cl_context_properties = 0x1000_0000;

/// Zero-terminated property list for `platform`, including GL sharing
/// properties when a GL context is current. Without one only the platform is
/// set and GL-backed memory objects will fail to create.
pub fn context_properties(platform: cl_platform_id) -> Vec<cl_context_properties> {
    let mut props = Vec::with_capacity(7);
    match current_gl_properties() {
        Some(gl_props) => props.extend_from_slice(&gl_props),
        None => warn!("no current GL context; creating an OpenCL context without GL sharing"),
    }
    if !cfg!(target_os = "macos") {
        props.push(CL_CONTEXT_PLATFORM);
        props.push(platform as cl_context_properties);
    }
    props.push(0);
    props
}

#[cfg(all(unix, not(target_os = "macos")))]
fn current_gl_properties() -> Option<Vec<cl_context_properties>> {
    use std::ffi::c_void;

    #[link(name = "GL")]
    extern "C" {
        fn glXGetCurrentContext() -> *mut c_void;
        fn glXGetCurrentDisplay() -> *mut c_void;
    }

    let (ctx, display) = unsafe { (glXGetCurrentContext(), glXGetCurrentDisplay()) };
    if ctx.is_null() || display.is_null() {
        return None;
    }
    Some(vec![
        CL_GL_CONTEXT_KHR,
        ctx as cl_context_properties,
        CL_GLX_DISPLAY_KHR,
        display as cl_context_properties,
    ])
}

#[cfg(target_os = "windows")]
fn current_gl_properties() -> Option<Vec<cl_context_properties>> {
    use windows::Win32::Graphics::OpenGL::{wglGetCurrentContext, wglGetCurrentDC};

    let (ctx, hdc) = unsafe { (wglGetCurrentContext(), wglGetCurrentDC()) };
    if ctx.0.is_null() || hdc.0.is_null() {
        return None;
    }
    Some(vec![
        CL_GL_CONTEXT_KHR,
        ctx.0 as cl_context_properties,
        CL_WGL_HDC_KHR,
        hdc.0 as cl_context_properties,
    ])
}

#[cfg(target_os = "macos")]
fn current_gl_properties() -> Option<Vec<cl_context_properties>> {
    // The CGL / OpenGL API is deprecated by Apple but required for sharing
    // with hosts that provide an OpenGL context.
    #![allow(deprecated)]
    use std::ffi::c_void;

    use objc2_open_gl::CGLGetCurrentContext;

    #[link(name = "OpenGL", kind = "framework")]
    extern "C" {
        fn CGLGetShareGroup(ctx: *mut c_void) -> *mut c_void;
    }

    let ctx = unsafe { CGLGetCurrentContext() };
    if ctx.is_null() {
        return None;
    }
    let group = unsafe { CGLGetShareGroup(ctx as *mut c_void) };
    if group.is_null() {
        return None;
    }
    Some(vec![
        CL_CONTEXT_PROPERTY_USE_CGL_SHAREGROUP_APPLE,
        group as cl_context_properties,
    ])
}

#[cfg(not(any(unix, target_os = "windows")))]
fn current_gl_properties() -> Option<Vec<cl_context_properties>> {
    None
}
