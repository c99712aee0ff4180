//! Insert pass: combine the two converged fields into the destination.
//!
//! Background texels take `falloff(d+)` and object texels
//! `1 - falloff(d-)`, where `d+` is the distance to the nearest object texel,
//! `d-` the distance to the nearest background texel (both in normalized
//! texture units) and `falloff(d) = max(window - d * scale, 0)`. The shape
//! boundary therefore sits at `window`, 0.5 with the default falloff.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use glyphfield_core::geometry::{Rect, Size};

use crate::pass::seed;

pub(crate) const SHADER_SOURCE: &str = pass_shader!("insert.wgsl");

/// Destination formats the insert program can render to.
pub const SUPPORTED_OUTPUT_FORMATS: [wgpu::TextureFormat; 3] = [
    wgpu::TextureFormat::R8Unorm,
    wgpu::TextureFormat::Rgba8Unorm,
    wgpu::TextureFormat::Bgra8Unorm,
];

pub fn is_supported_output(format: wgpu::TextureFormat) -> bool {
    SUPPORTED_OUTPUT_FORMATS.contains(&format)
}

/// Distance-to-value mapping used by the insert pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Falloff {
    /// Value at distance zero, and the boundary level.
    pub window: f32,
    /// Slope per normalized distance unit.
    pub scale: f32,
}

impl Default for Falloff {
    fn default() -> Self {
        Self {
            window: 0.5,
            scale: 4.0,
        }
    }
}

impl Falloff {
    pub fn new(window: f32, scale: f32) -> Self {
        Self { window, scale }
    }

    #[inline]
    pub fn apply(&self, distance: f32) -> f32 {
        (self.window - distance * self.scale).max(0.0)
    }

    /// Value for a background texel; no known object means infinitely far.
    #[inline]
    pub fn exterior(&self, to_object: Option<Vec2>) -> f32 {
        to_object.map_or(0.0, |v| self.apply(v.length()))
    }

    /// Value for an object texel; no known background means infinitely far.
    #[inline]
    pub fn interior(&self, to_background: Option<Vec2>) -> f32 {
        1.0 - to_background.map_or(0.0, |v| self.apply(v.length()))
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct InsertUniforms {
    pub origin: [u32; 2],
    pub extent: [u32; 2],
    pub source_size: [u32; 2],
    pub window: f32,
    pub scale: f32,
}

static_assertions::const_assert_eq!(std::mem::size_of::<InsertUniforms>(), 32);

impl InsertUniforms {
    pub fn new(region: Rect<u32>, source: Size<u32>, falloff: Falloff) -> Self {
        Self {
            origin: [region.x, region.y],
            extent: [region.width, region.height],
            source_size: [source.width, source.height],
            window: falloff.window,
            scale: falloff.scale,
        }
    }
}

/// Nearest source texel for a destination texel `local` texels into a
/// region of `extent`, sampling a tile of `source_extent` texels.
///
/// Identity when the extents match.
#[inline]
pub fn source_coord(local: u32, extent: u32, source_extent: u32) -> u32 {
    let scaled = (2 * local as u64 + 1) * source_extent as u64 / (2 * extent as u64);
    (scaled as u32).min(source_extent - 1)
}

/// Evaluate the insert program for one source texel.
#[inline]
pub fn insert_value(
    mask_value: u8,
    to_object: Option<Vec2>,
    to_background: Option<Vec2>,
    falloff: Falloff,
) -> f32 {
    if seed::is_object(mask_value, false) {
        falloff.interior(to_background)
    } else {
        falloff.exterior(to_object)
    }
}

/// Quantize a value the way a unorm render target stores it.
#[inline]
pub fn to_unorm8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
