//! Sampled textures: material maps, panoramas and live video frames

/// A GPU texture with its view and sampler
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

/// How texture coordinates outside 0..1 are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureWrap {
    /// Material maps
    Repeat,
    /// Equirectangular panoramas wrap around the horizon but not the poles
    Panorama,
    /// Screen-filling frames
    Clamp,
}

impl GpuTexture {
    /// Upload tightly packed sRGB RGBA8 pixels
    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        rgba: &[u8],
        wrap: TextureWrap,
        label: &str,
    ) -> Self {
        let tex = Self::empty(device, width, height, wrap, label);
        tex.write_rgba(queue, rgba);
        tex
    }

    /// Single-pixel texture
    pub fn solid(device: &wgpu::Device, queue: &wgpu::Queue, rgba: [u8; 4], label: &str) -> Self {
        Self::from_rgba(device, queue, 1, 1, &rgba, TextureWrap::Repeat, label)
    }

    /// Allocate an uninitialised texture that is later filled with `write_rgba`
    pub fn empty(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        wrap: TextureWrap,
        label: &str,
    ) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let (address_u, address_v) = match wrap {
            TextureWrap::Repeat => (wgpu::AddressMode::Repeat, wgpu::AddressMode::Repeat),
            TextureWrap::Panorama => (wgpu::AddressMode::Repeat, wgpu::AddressMode::ClampToEdge),
            TextureWrap::Clamp => (
                wgpu::AddressMode::ClampToEdge,
                wgpu::AddressMode::ClampToEdge,
            ),
        };
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: address_u,
            address_mode_v: address_v,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            width,
            height,
        }
    }

    /// Replace the full contents. `rgba` must hold `width * height * 4` bytes;
    /// shorter buffers are ignored.
    pub fn write_rgba(&self, queue: &wgpu::Queue, rgba: &[u8]) {
        let expected = (self.width * self.height * 4) as usize;
        if rgba.len() < expected {
            log::warn!(
                "Texture upload skipped: got {} bytes, need {}",
                rgba.len(),
                expected
            );
            return;
        }
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &rgba[..expected],
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(self.width * 4),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }
}
