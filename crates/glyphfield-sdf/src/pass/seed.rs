//! Seed pass: initialize a working target from the occupancy mask.

use bytemuck::{Pod, Zeroable};

use crate::codec::EncodedTexel;

/// Mask values at or above this are object.
pub const OBJECT_THRESHOLD: u8 = 128;

pub(crate) const SHADER_SOURCE: &str = pass_shader!("seed.wgsl");

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct SeedUniforms {
    pub invert: u32,
    pub _padding: [u32; 3],
}

static_assertions::const_assert_eq!(std::mem::size_of::<SeedUniforms>(), 16);

impl SeedUniforms {
    pub fn new(invert: bool) -> Self {
        Self {
            invert: invert as u32,
            _padding: [0; 3],
        }
    }
}

/// Whether a mask value seeds the field, after optional inversion.
#[inline]
pub fn is_object(value: u8, invert: bool) -> bool {
    (value >= OBJECT_THRESHOLD) != invert
}

/// Output of the seed program for one mask value.
#[inline]
pub fn seed_texel(value: u8, invert: bool) -> EncodedTexel {
    if is_object(value, invert) {
        EncodedTexel::ZERO
    } else {
        EncodedTexel::INDETERMINATE
    }
}
