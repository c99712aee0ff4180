//! Texture wrapper shared by the working targets and destination textures.

/// A GPU texture with cached view and metadata.
#[derive(Debug, Clone)]
pub struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: wgpu::Extent3d,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
}

impl GpuTexture {
    /// Create a new GPU texture.
    pub fn new(device: &wgpu::Device, descriptor: &wgpu::TextureDescriptor) -> Self {
        let texture = device.create_texture(descriptor);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            size: descriptor.size,
            format: descriptor.format,
            usage: descriptor.usage,
        }
    }

    /// Create a simple 2D texture.
    pub fn new_2d(
        device: &wgpu::Device,
        label: Option<&str>,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Self {
        Self::new(
            device,
            &wgpu::TextureDescriptor {
                label,
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage,
                view_formats: &[],
            },
        )
    }

    /// Replace the full contents of the texture.
    ///
    /// `data` is tightly packed (no row padding); the texture needs `COPY_DST`.
    pub fn write(&self, queue: &wgpu::Queue, data: &[u8]) {
        let bytes_per_texel = self.format.block_copy_size(None).unwrap_or(4);

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.size.width * bytes_per_texel),
                rows_per_image: Some(self.size.height),
            },
            self.size,
        );
    }

    #[inline]
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    #[inline]
    pub fn size(&self) -> wgpu::Extent3d {
        self.size
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.size.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.size.height
    }

    #[inline]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    #[inline]
    pub fn usage(&self) -> wgpu::TextureUsages {
        self.usage
    }

    /// Get the texture as a binding resource.
    #[inline]
    pub fn as_binding(&self) -> wgpu::BindingResource<'_> {
        wgpu::BindingResource::TextureView(&self.view)
    }

    /// Identity comparison: both wrappers refer to the same GPU texture.
    pub fn same_texture(&self, other: &GpuTexture) -> bool {
        self.texture == other.texture
    }
}
