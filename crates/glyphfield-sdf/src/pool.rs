//! A pool of renderers sharing one backend.
//!
//! Renderers keep per-tile working textures and are not shareable, so
//! concurrent callers each check one out:
//!
//! ```ignore
//! let pool = SdfRendererPool::new(backend, SdfRendererDescriptor::default());
//!
//! std::thread::scope(|s| {
//!     for glyph in &glyphs {
//!         s.spawn(|| {
//!             let mut renderer = pool.checkout();
//!             renderer.render_to_texture(glyph.bitmap, &glyph.target, origin, glyph.size)
//!         });
//!     }
//! });
//! ```

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::SdfBackend;
use crate::renderer::{SdfRenderer, SdfRendererDescriptor};

/// Default number of idle renderers kept for reuse.
const DEFAULT_MAX_IDLE: usize = 8;

pub struct SdfRendererPool<B: SdfBackend> {
    backend: Arc<B>,
    descriptor: SdfRendererDescriptor,
    idle: Mutex<Vec<SdfRenderer<B>>>,
    max_idle: usize,
}

impl<B: SdfBackend> SdfRendererPool<B> {
    pub fn new(backend: Arc<B>, descriptor: SdfRendererDescriptor) -> Self {
        Self {
            backend,
            descriptor,
            idle: Mutex::new(Vec::new()),
            max_idle: DEFAULT_MAX_IDLE,
        }
    }

    /// Limit how many returned renderers (and their textures) are retained.
    pub fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Take an idle renderer, or create one when none is available.
    ///
    /// The renderer returns to the pool when the guard is dropped.
    pub fn checkout(&self) -> PooledRenderer<'_, B> {
        let renderer = self.idle.lock().pop().unwrap_or_else(|| {
            tracing::debug!(label = self.descriptor.label, "Creating pooled renderer");
            SdfRenderer::with_descriptor(self.backend.clone(), self.descriptor.clone())
        });

        PooledRenderer {
            renderer: Some(renderer),
            pool: self,
        }
    }

    /// Number of renderers waiting in the pool.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    /// Drop every idle renderer and its working textures.
    pub fn clear(&self) {
        self.idle.lock().clear();
    }

    fn release(&self, renderer: SdfRenderer<B>) {
        let mut idle = self.idle.lock();
        if idle.len() < self.max_idle {
            idle.push(renderer);
        }
    }
}

/// A renderer checked out of an [`SdfRendererPool`].
pub struct PooledRenderer<'a, B: SdfBackend> {
    renderer: Option<SdfRenderer<B>>,
    pool: &'a SdfRendererPool<B>,
}

impl<B: SdfBackend> Deref for PooledRenderer<'_, B> {
    type Target = SdfRenderer<B>;

    fn deref(&self) -> &Self::Target {
        // Only `Drop` takes the renderer out.
        match &self.renderer {
            Some(renderer) => renderer,
            None => unreachable!("pooled renderer used after release"),
        }
    }
}

impl<B: SdfBackend> DerefMut for PooledRenderer<'_, B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut self.renderer {
            Some(renderer) => renderer,
            None => unreachable!("pooled renderer used after release"),
        }
    }
}

impl<B: SdfBackend> Drop for PooledRenderer<'_, B> {
    fn drop(&mut self) {
        if let Some(renderer) = self.renderer.take() {
            self.pool.release(renderer);
        }
    }
}
