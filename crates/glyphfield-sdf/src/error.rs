use glyphfield_core::geometry::{Rect, Size};
use glyphfield_render::ReadbackError;

/// Failures reported by a graphics backend.
///
/// These are fatal for the tile being rendered; the renderer never retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Texture or buffer allocation failed
    OutOfMemory(String),
    /// The backend rejected a resource or draw
    Validation(String),
    /// Copying a texture back to the CPU failed
    Readback(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfMemory(msg) => write!(f, "GPU out of memory: {}", msg),
            Self::Validation(msg) => write!(f, "GPU validation error: {}", msg),
            Self::Readback(msg) => write!(f, "GPU readback failed: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<ReadbackError> for BackendError {
    fn from(err: ReadbackError) -> Self {
        BackendError::Readback(err.to_string())
    }
}

/// Errors returned by the distance-field renderer.
///
/// Every precondition variant is raised before anything is submitted to the
/// backend, so the destination texture is left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdfError {
    /// The occupancy bitmap has a zero dimension
    EmptyBitmap { width: u32, height: u32 },
    /// The bitmap buffer does not hold exactly `width * height` bytes
    BitmapSizeMismatch { expected: usize, actual: usize },
    /// The bitmap is not single-channel 8-bit
    UnsupportedBitmapFormat(String),
    /// The tile exceeds the backend's texture size limit
    TileTooLarge { size: Size<u32>, max: u32 },
    /// The destination region has a zero dimension
    EmptyRegion,
    /// The destination region does not fit inside the destination texture
    RegionOutOfBounds { region: Rect<u32>, bounds: Size<u32> },
    /// The destination cannot be rendered to by the insert pass
    UnsupportedTargetFormat(wgpu::TextureFormat),
    /// The backend failed while allocating or drawing
    Backend(BackendError),
}

impl std::fmt::Display for SdfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyBitmap { width, height } => {
                write!(f, "Bitmap has an empty dimension ({}x{})", width, height)
            }
            Self::BitmapSizeMismatch { expected, actual } => write!(
                f,
                "Bitmap buffer holds {} bytes, expected {}",
                actual, expected
            ),
            Self::UnsupportedBitmapFormat(format) => write!(
                f,
                "Bitmap must be single-channel 8-bit, got {}",
                format
            ),
            Self::TileTooLarge { size, max } => write!(
                f,
                "Tile {}x{} exceeds the maximum texture dimension {}",
                size.width, size.height, max
            ),
            Self::EmptyRegion => write!(f, "Destination region is empty"),
            Self::RegionOutOfBounds { region, bounds } => write!(
                f,
                "Region {}x{} at ({}, {}) does not fit in a {}x{} texture",
                region.width, region.height, region.x, region.y, bounds.width, bounds.height
            ),
            Self::UnsupportedTargetFormat(format) => {
                write!(f, "Unsupported destination format: {:?}", format)
            }
            Self::Backend(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for SdfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BackendError> for SdfError {
    fn from(err: BackendError) -> Self {
        SdfError::Backend(err)
    }
}
