//! Packing many distance fields into one destination texture.
//!
//! # Example
//!
//! ```ignore
//! let mut renderer = SdfRenderer::new(backend.clone());
//! let mut atlas = SdfAtlas::new(&*backend, 512, wgpu::TextureFormat::R8Unorm)?;
//!
//! let key = AtlasKey::new("glyph:a");
//! if let Some(entry) = atlas.insert(&mut renderer, key, bitmap)? {
//!     // sample entry.uv_rect from atlas.texture()
//! }
//! ```

use ahash::HashMap;

use glyphfield_core::geometry::{Rect, Size};

use crate::backend::{SdfBackend, TextureDesc, TextureRole};
use crate::pass::insert;
use crate::renderer::SdfRenderer;
use crate::{Bitmap, SdfError};

/// Texels left empty to the right of and below every entry.
pub const DEFAULT_PADDING: u32 = 1;

/// Unique key for an atlas entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtlasKey(u64);

impl AtlasKey {
    /// Stable key derived from a name.
    pub fn new(name: &str) -> Self {
        let hasher = ahash::RandomState::with_seeds(0x5d, 0xf1, 0xe1, 0xd0);
        Self(hasher.hash_one(name))
    }

    pub fn from_u64(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Where a distance field landed in the atlas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasEntry {
    /// Texel region holding the field.
    pub rect: Rect<u32>,
    /// The same region in normalized texture coordinates.
    pub uv_rect: Rect<f32>,
}

impl AtlasEntry {
    fn new(rect: Rect<u32>, atlas_size: u32) -> Self {
        let size = atlas_size as f32;
        Self {
            rect,
            uv_rect: Rect {
                x: rect.x as f32 / size,
                y: rect.y as f32 / size,
                width: rect.width as f32 / size,
                height: rect.height as f32 / size,
            },
        }
    }
}

/// Binary split packer over a square area.
#[derive(Debug, Clone)]
enum PackerNode {
    Empty {
        rect: Rect<u32>,
    },
    Filled,
    Split {
        first: Box<PackerNode>,
        second: Box<PackerNode>,
    },
}

impl PackerNode {
    fn new(rect: Rect<u32>) -> Self {
        Self::Empty { rect }
    }

    fn insert(&mut self, width: u32, height: u32) -> Option<Rect<u32>> {
        match self {
            PackerNode::Empty { rect } => {
                let rect = *rect;
                if width > rect.width || height > rect.height {
                    return None;
                }
                if width == rect.width && height == rect.height {
                    *self = PackerNode::Filled;
                    return Some(rect);
                }

                // cut along the axis with more leftover space
                let (first, second) = if rect.width - width > rect.height - height {
                    (
                        Rect::new(rect.x, rect.y, width, rect.height),
                        Rect::new(rect.x + width, rect.y, rect.width - width, rect.height),
                    )
                } else {
                    (
                        Rect::new(rect.x, rect.y, rect.width, height),
                        Rect::new(rect.x, rect.y + height, rect.width, rect.height - height),
                    )
                };

                let mut first = Box::new(PackerNode::new(first));
                let second = Box::new(PackerNode::new(second));
                let placed = first.insert(width, height);
                *self = PackerNode::Split { first, second };
                placed
            }
            PackerNode::Filled => None,
            PackerNode::Split { first, second } => first
                .insert(width, height)
                .or_else(|| second.insert(width, height)),
        }
    }
}

/// A square destination texture filled with distance fields on demand.
pub struct SdfAtlas<B: SdfBackend> {
    texture: B::Texture,
    entries: HashMap<AtlasKey, AtlasEntry>,
    packer: PackerNode,
    size: u32,
    padding: u32,
}

impl<B: SdfBackend> SdfAtlas<B> {
    pub fn new(backend: &B, size: u32, format: wgpu::TextureFormat) -> Result<Self, SdfError> {
        if size == 0 {
            return Err(SdfError::EmptyRegion);
        }
        if !insert::is_supported_output(format) {
            return Err(SdfError::UnsupportedTargetFormat(format));
        }

        let texture = backend.create_texture(&TextureDesc {
            label: "sdf_atlas",
            size: Size::new(size, size),
            format,
            role: TextureRole::Destination,
        })?;

        Ok(Self {
            texture,
            entries: HashMap::default(),
            packer: PackerNode::new(Rect::new(0, 0, size, size)),
            size,
            padding: DEFAULT_PADDING,
        })
    }

    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    /// Render `bitmap` at its own size into a free region.
    ///
    /// Returns the existing entry when `key` is already present, and
    /// `Ok(None)` when the atlas has no room left.
    pub fn insert(
        &mut self,
        renderer: &mut SdfRenderer<B>,
        key: AtlasKey,
        bitmap: Bitmap<'_>,
    ) -> Result<Option<AtlasEntry>, SdfError> {
        self.insert_scaled(renderer, key, bitmap, bitmap.size())
    }

    /// Render `bitmap` resampled to `size` into a free region.
    pub fn insert_scaled(
        &mut self,
        renderer: &mut SdfRenderer<B>,
        key: AtlasKey,
        bitmap: Bitmap<'_>,
        size: Size<u32>,
    ) -> Result<Option<AtlasEntry>, SdfError> {
        if let Some(entry) = self.entries.get(&key) {
            return Ok(Some(*entry));
        }
        if size.is_empty() {
            return Err(SdfError::EmptyRegion);
        }

        let packer = self.packer.clone();
        let Some(cell) = self
            .packer
            .insert(size.width + self.padding, size.height + self.padding)
        else {
            tracing::debug!(
                width = size.width,
                height = size.height,
                "Atlas full, entry rejected"
            );
            return Ok(None);
        };

        let entry = AtlasEntry::new(Rect::from_origin_size(cell.origin(), size), self.size);
        if let Err(err) = renderer.render_to_texture(bitmap, &self.texture, cell.origin(), size) {
            // free the cell so the caller can resubmit the same key
            self.packer = packer;
            return Err(err);
        }
        self.entries.insert(key, entry);
        Ok(Some(entry))
    }

    pub fn get(&self, key: &AtlasKey) -> Option<&AtlasEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &AtlasKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn texture(&self) -> &B::Texture {
        &self.texture
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every entry. Texel contents stay until overwritten.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.packer = PackerNode::new(Rect::new(0, 0, self.size, self.size));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atlas_key() {
        assert_eq!(AtlasKey::new("glyph:a"), AtlasKey::new("glyph:a"));
        assert_ne!(AtlasKey::new("glyph:a"), AtlasKey::new("glyph:b"));
        assert_eq!(AtlasKey::from_u64(42).as_u64(), 42);
    }

    #[test]
    fn test_packer_fills_without_overlap() {
        let mut packer = PackerNode::new(Rect::new(0, 0, 64, 64));
        let mut placed: Vec<Rect<u32>> = Vec::new();

        while let Some(rect) = packer.insert(16, 16) {
            for other in &placed {
                let disjoint = rect.x >= other.x + other.width
                    || other.x >= rect.x + rect.width
                    || rect.y >= other.y + other.height
                    || other.y >= rect.y + rect.height;
                assert!(disjoint, "{:?} overlaps {:?}", rect, other);
            }
            assert!(rect.fits_within(Size::new(64, 64)));
            placed.push(rect);
        }

        assert_eq!(placed.len(), 16);
    }

    #[test]
    fn test_packer_rejects_oversized() {
        let mut packer = PackerNode::new(Rect::new(0, 0, 32, 32));
        assert!(packer.insert(33, 8).is_none());
        assert_eq!(packer.insert(32, 32), Some(Rect::new(0, 0, 32, 32)));
        assert!(packer.insert(1, 1).is_none());
    }

    #[test]
    fn test_entry_uv() {
        let entry = AtlasEntry::new(Rect::new(64, 128, 32, 16), 256);
        assert_eq!(entry.uv_rect.x, 0.25);
        assert_eq!(entry.uv_rect.y, 0.5);
        assert_eq!(entry.uv_rect.width, 0.125);
        assert_eq!(entry.uv_rect.height, 0.0625);
    }
}
