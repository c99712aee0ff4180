//! GPU readback of finished textures.
//!
//! Copies a texture into a staging buffer, waits for the copy and returns the
//! texels tightly packed (row padding removed).
//!
//! # Example
//!
//! ```ignore
//! let readback = GpuReadback::from_texture(&context, &texture)?;
//! let texels = readback.read()?;
//! ```

use crate::{GpuTexture, GraphicsContext};

/// GPU readback error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadbackError {
    /// Buffer mapping failed
    MapFailed(String),
    /// Image encoding failed
    EncodeFailed(String),
    /// IO error
    IoError(String),
    /// Invalid dimensions
    InvalidDimensions,
    /// Unsupported format
    UnsupportedFormat(wgpu::TextureFormat),
}

impl std::fmt::Display for ReadbackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MapFailed(msg) => write!(f, "Buffer mapping failed: {}", msg),
            Self::EncodeFailed(msg) => write!(f, "Image encoding failed: {}", msg),
            Self::IoError(msg) => write!(f, "IO error: {}", msg),
            Self::InvalidDimensions => write!(f, "Invalid dimensions for readback"),
            Self::UnsupportedFormat(format) => {
                write!(f, "Unsupported texture format for readback: {:?}", format)
            }
        }
    }
}

impl std::error::Error for ReadbackError {}

/// Bytes per texel for the formats this crate reads back.
pub fn bytes_per_texel(format: wgpu::TextureFormat) -> Option<u32> {
    match format {
        wgpu::TextureFormat::R8Unorm => Some(1),
        wgpu::TextureFormat::Rg8Unorm => Some(2),
        wgpu::TextureFormat::Rgba8Unorm
        | wgpu::TextureFormat::Rgba8UnormSrgb
        | wgpu::TextureFormat::Bgra8Unorm
        | wgpu::TextureFormat::Bgra8UnormSrgb => Some(4),
        _ => None,
    }
}

/// Row pitch of a texture copy, aligned to `COPY_BYTES_PER_ROW_ALIGNMENT`.
pub fn padded_bytes_per_row(width: u32, bytes_per_texel: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * bytes_per_texel).div_ceil(align) * align
}

/// GPU readback handle.
pub struct GpuReadback {
    buffer: wgpu::Buffer,
    /// Texture dimensions (width, height)
    dimensions: (u32, u32),
    /// Bytes per row (with padding)
    bytes_per_row: u32,
    bytes_per_texel: u32,
    format: wgpu::TextureFormat,
}

impl GpuReadback {
    /// Create a readback from a texture.
    ///
    /// This records and submits the copy into a staging buffer; call
    /// [`GpuReadback::read`] to wait for it.
    pub fn from_texture(
        context: &GraphicsContext,
        texture: &GpuTexture,
    ) -> Result<Self, ReadbackError> {
        let dimensions = (texture.width(), texture.height());
        let format = texture.format();

        if dimensions.0 == 0 || dimensions.1 == 0 {
            return Err(ReadbackError::InvalidDimensions);
        }

        let bytes_per_texel =
            bytes_per_texel(format).ok_or(ReadbackError::UnsupportedFormat(format))?;
        let bytes_per_row = padded_bytes_per_row(dimensions.0, bytes_per_texel);

        let buffer_size = (bytes_per_row * dimensions.1) as wgpu::BufferAddress;
        let buffer = context.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback_buffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = context
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback_encoder"),
            });

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: texture.texture(),
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(dimensions.1),
                },
            },
            texture.size(),
        );

        context.queue().submit(Some(encoder.finish()));

        Ok(Self {
            buffer,
            dimensions,
            bytes_per_row,
            bytes_per_texel,
            format,
        })
    }

    /// Wait for the copy and return tightly packed texels (blocking).
    pub fn read(&self, context: &GraphicsContext) -> Result<Vec<u8>, ReadbackError> {
        let slice = self.buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();

        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        context
            .device()
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .map_err(|e| ReadbackError::MapFailed(e.to_string()))?;

        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(ReadbackError::MapFailed(e.to_string())),
            Err(e) => return Err(ReadbackError::MapFailed(e.to_string())),
        }

        let row_bytes = (self.dimensions.0 * self.bytes_per_texel) as usize;
        let mut result = Vec::with_capacity(row_bytes * self.dimensions.1 as usize);
        {
            let data = slice.get_mapped_range();
            for y in 0..self.dimensions.1 {
                let row_start = (y * self.bytes_per_row) as usize;
                result.extend_from_slice(&data[row_start..row_start + row_bytes]);
            }
        }
        self.buffer.unmap();

        Ok(result)
    }

    /// Save the readback data as a PNG file.
    #[cfg(feature = "image")]
    pub fn save_png(
        &self,
        context: &GraphicsContext,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), ReadbackError> {
        let data = self.read(context)?;
        let (width, height) = self.dimensions;

        let result = match self.bytes_per_texel {
            1 => image::GrayImage::from_raw(width, height, data)
                .ok_or_else(|| ReadbackError::EncodeFailed("Buffer too small".to_string()))?
                .save(path),
            4 => image::RgbaImage::from_raw(width, height, data)
                .ok_or_else(|| ReadbackError::EncodeFailed("Buffer too small".to_string()))?
                .save(path),
            _ => return Err(ReadbackError::UnsupportedFormat(self.format)),
        };

        result.map_err(|e| ReadbackError::IoError(format!("{}", e)))
    }

    /// Get the dimensions (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    /// Get the texture format.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }
}
