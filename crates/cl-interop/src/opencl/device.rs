//! Platform, device, context and command-queue setup.

use std::ptr;

use anyhow::{anyhow, Context as _, Result};
use opencl3::command_queue::CommandQueue;
use opencl3::context::Context;
use opencl3::device::{Device, CL_DEVICE_TYPE_CPU, CL_DEVICE_TYPE_GPU};
use opencl3::platform::{get_platforms, Platform};
use tracing::{info, warn};

use super::gl_sharing::context_properties;
use crate::bridge::InitStage;

/// First available platform. There is no selection policy.
pub fn first_platform() -> Result<Platform> {
    let platforms = get_platforms()
        .context("failed to query OpenCL platforms")
        .context(InitStage::Platform)?;
    let platform = platforms
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("failed to find any OpenCL platforms"))
        .context(InitStage::Platform)?;
    if let Ok(name) = platform.name() {
        info!(platform = %name, "using OpenCL platform");
    }
    Ok(platform)
}

/// Create a context shared with the current GL context on the platform's
/// first GPU. Falls back to a CPU context if there is no GPU or GPU context
/// creation fails.
pub fn create_shared_context(platform: &Platform) -> Result<Context> {
    let props = context_properties(platform.id());

    let gpu = match platform.get_devices(CL_DEVICE_TYPE_GPU) {
        Ok(devices) => devices.into_iter().next(),
        Err(e) => {
            warn!("failed to list GPU devices: {e}");
            None
        }
    };

    if let Some(device) = gpu {
        match Context::from_devices(&[device], &props, None, ptr::null_mut()) {
            Ok(ctx) => return Ok(ctx),
            Err(e) => warn!("could not create GPU context ({e}), trying CPU"),
        }
    } else {
        warn!("no GPU devices on platform, trying CPU");
    }

    Context::from_device_type(CL_DEVICE_TYPE_CPU, &props, None, ptr::null_mut())
        .map_err(|e| anyhow!("failed to create an OpenCL GPU or CPU context: {e}"))
        .context(InitStage::Context)
}

/// Command queue on the context's first device.
pub fn create_queue(context: &Context) -> Result<(Device, CommandQueue)> {
    let id = context
        .devices()
        .first()
        .copied()
        .ok_or_else(|| anyhow!("no devices available in context"))
        .context(InitStage::Queue)?;
    let device = Device::new(id);

    let queue = CommandQueue::create_default(context, 0)
        .context("failed to create command queue for device 0")
        .context(InitStage::Queue)?;

    if let Ok(name) = device.name() {
        info!(device = %name, "created OpenCL command queue");
    }
    Ok((device, queue))
}
