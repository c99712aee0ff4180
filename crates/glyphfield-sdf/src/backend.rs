//! The seam between the pass orchestration and a graphics API.
//!
//! [`SdfRenderer`](crate::SdfRenderer) only ever talks to an [`SdfBackend`]:
//! it allocates textures, uploads the mask, issues full-screen draws and reads
//! results back. [`WgpuBackend`](crate::WgpuBackend) runs the passes on the
//! GPU; the software backend in `glyphfield-test-utils` runs the same kernels
//! on the CPU for tests.

use glyphfield_core::geometry::{Rect, Size};

use crate::BackendError;
use crate::options::DrawOptions;
use crate::pass::{Falloff, insert};

/// Texture format of the two flood working targets.
pub const FIELD_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Texture format of the uploaded occupancy mask.
pub const MASK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;

/// Metadata every backend texture exposes.
pub trait TextureHandle {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn format(&self) -> wgpu::TextureFormat;

    /// Identity comparison: both handles name the same storage.
    fn same_resource(&self, other: &Self) -> bool;

    fn size(&self) -> Size<u32> {
        Size::new(self.width(), self.height())
    }
}

/// What a texture is used for; backends derive usage flags from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureRole {
    /// Uploaded from the CPU and sampled.
    Mask,
    /// Rendered to and sampled in alternation.
    Field,
    /// Rendered to by the insert pass and read back.
    Destination,
}

#[derive(Debug, Clone, Copy)]
pub struct TextureDesc<'a> {
    pub label: &'a str,
    pub size: Size<u32>,
    pub format: wgpu::TextureFormat,
    pub role: TextureRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    Seed,
    Flood,
    Insert,
}

/// The program and inputs of a draw.
#[derive(Debug)]
pub enum PassInput<'a, T> {
    /// Mark seeds from the mask; `invert` swaps object and background.
    Seed { mask: &'a T, invert: bool },
    /// One jump-flood step over `field`.
    Flood { field: &'a T, step: u32 },
    /// Combine both converged fields into a scalar distance value.
    Insert {
        mask: &'a T,
        positive: &'a T,
        negative: &'a T,
        falloff: Falloff,
    },
}

impl<'a, T> PassInput<'a, T> {
    pub fn kind(&self) -> PassKind {
        match self {
            PassInput::Seed { .. } => PassKind::Seed,
            PassInput::Flood { .. } => PassKind::Flood,
            PassInput::Insert { .. } => PassKind::Insert,
        }
    }

    /// Every texture sampled by the draw.
    pub fn sources(&self) -> Vec<&'a T> {
        match *self {
            PassInput::Seed { mask, .. } => vec![mask],
            PassInput::Flood { field, .. } => vec![field],
            PassInput::Insert {
                mask,
                positive,
                negative,
                ..
            } => vec![mask, positive, negative],
        }
    }
}

/// A single full-screen draw into `viewport` of `target`.
#[derive(Debug)]
pub struct Draw<'a, T> {
    pub label: &'a str,
    pub input: PassInput<'a, T>,
    pub target: &'a T,
    pub viewport: Rect<u32>,
    pub options: DrawOptions,
}

impl<T: TextureHandle> Draw<'_, T> {
    /// True when the draw would sample the texture it renders to.
    pub fn reads_target(&self) -> bool {
        self.input
            .sources()
            .iter()
            .any(|source| source.same_resource(self.target))
    }

    /// Reject draws no backend can execute.
    pub fn validate(&self) -> Result<(), BackendError> {
        if self.reads_target() {
            return Err(BackendError::Validation(format!(
                "{}: target is also bound as a source",
                self.label
            )));
        }
        if self.viewport.size().is_empty() || !self.viewport.fits_within(self.target.size()) {
            return Err(BackendError::Validation(format!(
                "{}: viewport {:?} outside {}x{} target",
                self.label,
                self.viewport,
                self.target.width(),
                self.target.height()
            )));
        }
        Ok(())
    }
}

/// A graphics API able to run the distance-field passes.
///
/// Every method takes `&self`; implementations synchronize internally so one
/// backend can be shared by several renderers.
pub trait SdfBackend: Send + Sync {
    type Texture: TextureHandle + Send + Sync;

    fn create_texture(&self, desc: &TextureDesc<'_>) -> Result<Self::Texture, BackendError>;

    /// Replace the full contents of a texture with tightly packed texels.
    fn write_texture(&self, texture: &Self::Texture, data: &[u8]) -> Result<(), BackendError>;

    /// Execute one draw. It is ordered after every earlier draw on this backend.
    fn draw(&self, draw: &Draw<'_, Self::Texture>) -> Result<(), BackendError>;

    /// Copy a texture back as tightly packed texels.
    fn read_texture(&self, texture: &Self::Texture) -> Result<Vec<u8>, BackendError>;

    fn max_texture_dimension(&self) -> u32 {
        8192
    }

    /// Whether the insert pass can render into `texture`.
    fn supports_destination(&self, texture: &Self::Texture) -> bool {
        insert::is_supported_output(texture.format())
    }
}
