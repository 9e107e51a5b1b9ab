//! Headless GPU device acquisition.

use super::reflect::{LinkError, ShaderError};
use std::sync::Arc;
use wgpu::{Adapter, Device, Instance, Queue};

/// Errors that can occur during GPU operations.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,
    #[error("Failed to request device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error("Failed to read back render target: {0}")]
    Readback(String),
}

/// Device and queue shared by everything that renders.
pub struct GpuContext {
    pub instance: Instance,
    pub adapter: Arc<Adapter>,
    pub device: Arc<Device>,
    pub queue: Arc<Queue>,
}

impl GpuContext {
    /// Acquire a device without a presentation surface.
    ///
    /// `WGPU_BACKEND` (e.g. `vulkan`, `gl`) narrows the backends tried. A
    /// hardware adapter is preferred; a software one is accepted when no
    /// hardware adapter exists.
    pub async fn new() -> Result<Self, GpuError> {
        let backends = wgpu::Backends::from_env()
            .unwrap_or(wgpu::Backends::METAL | wgpu::Backends::VULKAN | wgpu::Backends::GL);
        let instance = Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = match request_adapter(&instance, false).await {
            Some(adapter) => adapter,
            None => request_adapter(&instance, true).await.ok_or(GpuError::NoAdapter)?,
        };

        // Scenes need nothing beyond WebGL2-level limits
        let limits = wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits());
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("chroma-morph"),
                required_features: wgpu::Features::empty(),
                required_limits: limits,
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        let info = adapter.get_info();
        log::info!(
            "GPU context ready: {} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        Ok(Self {
            instance,
            adapter: Arc::new(adapter),
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }
}

async fn request_adapter(instance: &Instance, software: bool) -> Option<Adapter> {
    instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: software,
            compatible_surface: None,
        })
        .await
        .ok()
}
