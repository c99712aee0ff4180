//! Test utilities for glyphfield.
//!
//! - [`MockBackend`]: an [`SdfBackend`](glyphfield_sdf::SdfBackend) that runs
//!   the seed, flood and insert kernels on the CPU and records every call
//! - [`fixtures`]: mask builders and a brute-force distance transform to
//!   compare results against
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use glyphfield_sdf::{Bitmap, Pos, SdfRenderer, Size};
//! use glyphfield_test_utils::{MockBackend, fixtures};
//!
//! let backend = Arc::new(MockBackend::new());
//! let destination = backend.create_destination(8, 8, wgpu::TextureFormat::R8Unorm);
//! let mask = fixtures::single_pixel(8, 8, 4, 4);
//!
//! let mut renderer = SdfRenderer::new(backend.clone());
//! let stats = renderer
//!     .render_to_texture(
//!         Bitmap::new(&mask, 8, 8).unwrap(),
//!         &destination,
//!         Pos::new(0, 0),
//!         Size::new(8, 8),
//!     )
//!     .unwrap();
//!
//! assert_eq!(stats.total_passes(), 9);
//! assert_eq!(backend.texture_bytes(&destination)[4 * 8 + 4], 255);
//! ```
//!
//! Interior mutability follows the usual pattern: every backend method takes
//! `&self` and records into a `parking_lot::Mutex`, so one backend can be
//! shared by a renderer pool across threads.

pub mod fixtures;
mod mock_backend;

pub use mock_backend::{MockBackend, MockTexture, RenderCall};
