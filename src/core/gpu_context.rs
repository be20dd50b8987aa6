use std::sync::Arc;

use wgpu::{Adapter, Device, DeviceDescriptor, Instance, Limits, Queue, Surface};

use crate::error::RenderError;

/// Device and queue shared by everything that talks to the GPU
#[derive(Clone)]
pub struct GpuContext {
    device: Arc<Device>,
    queue: Arc<Queue>,
}

impl GpuContext {
    /// Pick an adapter able to present to `surface` and open a device on it.
    /// The adapter is returned too, for querying surface capabilities.
    pub async fn for_surface(instance: &Instance, surface: &Surface<'_>) -> Result<(Self, Adapter), RenderError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| RenderError::RendererUnavailable(format!("no compatible adapter: {:?}", e)))?;

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("Starfield Device"),
                required_features: wgpu::Features::empty(),
                required_limits: Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                experimental_features: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(|e| RenderError::RendererUnavailable(format!("failed to create device: {:?}", e)))?;

        let context = Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
        };
        Ok((context, adapter))
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }
}
