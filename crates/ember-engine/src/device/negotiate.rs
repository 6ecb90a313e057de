//! Adapter/device negotiation.
//!
//! wgpu exposes both requests as futures. The renderer is single-threaded and
//! cannot make progress without a device, so each request is driven to
//! completion on the calling thread: when these functions return, the result
//! is final regardless of whether the backend resolved the future immediately.

use anyhow::{anyhow, Result};

/// Requests an adapter and blocks until the backend answers.
///
/// Failure is logged and propagated; there is no retry.
pub fn request_adapter(
    instance: &wgpu::Instance,
    options: &wgpu::RequestAdapterOptions<'_, '_>,
) -> Result<wgpu::Adapter> {
    match pollster::block_on(instance.request_adapter(options)) {
        Ok(adapter) => {
            log::info!("selected adapter: {}", describe_adapter(&adapter.get_info()));
            Ok(adapter)
        }
        Err(e) => {
            log::error!("could not get a GPU adapter: {e}");
            Err(anyhow!("failed to find a suitable GPU adapter: {e}"))
        }
    }
}

/// Requests a device (and its default queue) from `adapter`, blocking until
/// the backend answers.
pub fn request_device(
    adapter: &wgpu::Adapter,
    descriptor: &wgpu::DeviceDescriptor<'_>,
) -> Result<(wgpu::Device, wgpu::Queue)> {
    match pollster::block_on(adapter.request_device(descriptor)) {
        Ok(pair) => {
            log::debug!("device created: {:?}", descriptor.label);
            Ok(pair)
        }
        Err(e) => {
            log::error!("could not get a GPU device: {e}");
            Err(anyhow!("failed to create wgpu device/queue: {e}"))
        }
    }
}

/// One-line human readable adapter description.
pub fn describe_adapter(info: &wgpu::AdapterInfo) -> String {
    format!(
        "{} ({:?}, {:?}, vendor {:#06x}, device {:#06x})",
        info.name, info.backend, info.device_type, info.vendor, info.device
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negotiation_result_is_final_on_return() {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let options = wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        };

        // Headless CI has no adapter; the call must still come back with an answer.
        let Ok(adapter) = request_adapter(&instance, &options) else {
            return;
        };

        let description = describe_adapter(&adapter.get_info());
        assert!(!description.is_empty());

        let (device, _queue) = request_device(&adapter, &wgpu::DeviceDescriptor::default())
            .expect("adapter accepted, device request should succeed");
        let limits = device.limits();
        assert!(limits.max_bind_groups >= 3);
    }
}
