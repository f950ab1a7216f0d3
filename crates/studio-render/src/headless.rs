//! Headless rendering context for offscreen render-to-image

use crate::context::{request_device, RenderError};

/// Offscreen wgpu context. The stage renderer draws into its own targets;
/// this only supplies a device and queue with no window attached.
pub struct HeadlessContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
}

impl HeadlessContext {
    pub async fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::AdapterNotFound)?;

        let (device, queue) = request_device(&adapter, "Studio Headless Device").await?;

        Ok(Self {
            device,
            queue,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            width: width.max(1),
            height: height.max(1),
        })
    }

    /// Blocking constructor for command-line use
    pub fn new_blocking(width: u32, height: u32) -> Result<Self, RenderError> {
        pollster::block_on(Self::new(width, height))
    }
}
