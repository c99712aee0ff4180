//! GPU plumbing for glyphfield.
//!
//! Thin wrappers over wgpu: an `Arc`-owned [`GraphicsContext`], the
//! [`GpuTexture`] wrapper used for every working and destination texture,
//! [`BlendMode`] presets and [`GpuReadback`] for copying results back to the CPU.

mod blend;
mod context;
mod readback;
mod types;

pub use blend::BlendMode;
pub use context::{GraphicsContext, GraphicsContextDescriptor, GraphicsError};
pub use readback::{GpuReadback, ReadbackError, bytes_per_texel, padded_bytes_per_row};
pub use types::GpuTexture;

pub use wgpu;
