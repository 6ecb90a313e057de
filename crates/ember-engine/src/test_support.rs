//! Headless GPU helpers for unit tests.
//!
//! Machines without an adapter (CI containers) get `None`; tests return early.

use crate::device::{ContextConfig, ErrorPolicy, GraphicsContext};

pub(crate) fn test_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .ok()?;
    pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default())).ok()
}

/// Headless context that counts device errors instead of exiting.
pub(crate) fn test_context(width: u32, height: u32) -> Option<GraphicsContext<'static>> {
    let config = ContextConfig {
        error_policy: ErrorPolicy::Log,
        ..Default::default()
    };
    GraphicsContext::headless(width, height, config).ok()
}
