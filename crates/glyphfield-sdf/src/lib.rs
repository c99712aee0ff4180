//! Signed distance fields from occupancy bitmaps using the jump flooding
//! algorithm.
//!
//! A render computes two Euclidean distance fields on the GPU (distance to
//! the nearest background texel, then to the nearest object texel) and
//! combines them into a single-channel value written into a caller-chosen
//! region of a destination texture:
//!
//! ```text
//! mask ─ seed(inverted) ─ flood × log2(n) ─┐
//!      ─ seed ─────────── flood × log2(n) ─┴─ insert ─> destination
//! ```
//!
//! Working fields store, per texel, the offset to the nearest seed packed
//! into an `Rgba8Unorm` texel (see [`codec`]).
//!
//! # Example
//!
//! ```ignore
//! use glyphfield_render::GraphicsContext;
//! use glyphfield_sdf::{Bitmap, SdfRenderer, WgpuBackend};
//!
//! let context = GraphicsContext::new_owned_sync()?;
//! let backend = Arc::new(WgpuBackend::new(context));
//! let mut renderer = SdfRenderer::new(backend.clone());
//!
//! let bitmap = Bitmap::new(&pixels, 64, 64)?;
//! renderer.render_to_texture(bitmap, &atlas_texture, Pos::new(0, 0), Size::new(64, 64))?;
//! ```

pub mod atlas;
pub mod backend;
pub mod bitmap;
pub mod codec;
mod error;
pub mod options;
pub mod pass;
pub mod ping_pong;
pub mod pool;
pub mod renderer;
mod wgpu_backend;

pub use atlas::{AtlasEntry, AtlasKey, SdfAtlas};
pub use backend::{Draw, PassInput, PassKind, SdfBackend, TextureDesc, TextureHandle, TextureRole};
pub use bitmap::Bitmap;
pub use codec::EncodedTexel;
pub use error::{BackendError, SdfError};
pub use options::{DrawOptions, LoadBehavior};
pub use pass::Falloff;
pub use ping_pong::PingPong;
pub use pool::{PooledRenderer, SdfRendererPool};
pub use renderer::{DistanceFields, Phase, RenderStats, SdfRenderer, SdfRendererDescriptor};
pub use wgpu_backend::WgpuBackend;

pub use glyphfield_core::geometry::{Pos, Rect, Size};
