//! Pass orchestration: mask upload, two jump-flood fields, composite.

use std::sync::Arc;

use glam::Vec2;

use glyphfield_core::geometry::{Pos, Rect, Size};
use glyphfield_core::profiling::profile_function;

use crate::backend::{
    Draw, FIELD_FORMAT, MASK_FORMAT, PassInput, SdfBackend, TextureDesc, TextureHandle,
    TextureRole,
};
use crate::codec::{self, EncodedTexel};
use crate::options::{DrawOptions, LoadBehavior};
use crate::pass::{Falloff, flood_schedule};
use crate::ping_pong::PingPong;
use crate::{BackendError, Bitmap, SdfError};

/// Where the renderer is within one `render_to_texture` call.
///
/// Every call walks `Idle → SeedPosted → Flooding* → Converged` once per
/// field, then `Composited → Idle`. Errors drop straight back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    SeedPosted,
    Flooding { step: u32 },
    Converged,
    Composited,
}

impl Phase {
    pub fn can_transition_to(self, next: Phase) -> bool {
        use Phase::*;
        match (self, next) {
            (_, Idle) => true,
            (Idle, SeedPosted) => true,
            (SeedPosted, Flooding { .. }) | (SeedPosted, Converged) => true,
            (Flooding { step: a }, Flooding { step: b }) => b < a,
            (Flooding { .. }, Converged) => true,
            (Converged, SeedPosted) | (Converged, Composited) => true,
            _ => false,
        }
    }
}

/// Configuration for an [`SdfRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub struct SdfRendererDescriptor {
    pub label: &'static str,
    pub falloff: Falloff,
    /// Options for the insert draw into the caller's destination. The load
    /// behaviour is ignored; destination contents are always loaded.
    pub insert_options: DrawOptions,
}

impl Default for SdfRendererDescriptor {
    fn default() -> Self {
        Self {
            label: "sdf_renderer",
            falloff: Falloff::default(),
            insert_options: DrawOptions::opaque(),
        }
    }
}

impl SdfRendererDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    pub fn falloff(mut self, falloff: Falloff) -> Self {
        self.falloff = falloff;
        self
    }

    pub fn insert_options(mut self, options: DrawOptions) -> Self {
        self.insert_options = options;
        self
    }
}

/// Summary of the work done by one render call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub tile: Size<u32>,
    pub seed_passes: u32,
    pub flood_passes: u32,
    pub insert_passes: u32,
    /// Flood step sizes in submission order, both fields included.
    pub steps: Vec<u32>,
    /// Whether the working textures were (re)allocated for this call.
    pub reallocated: bool,
}

impl RenderStats {
    pub fn total_passes(&self) -> u32 {
        self.seed_passes + self.flood_passes + self.insert_passes
    }
}

/// Both converged fields of a tile, read back to the CPU.
#[derive(Debug, Clone)]
pub struct DistanceFields {
    size: Size<u32>,
    positive: Vec<EncodedTexel>,
    negative: Vec<EncodedTexel>,
}

impl DistanceFields {
    pub fn size(&self) -> Size<u32> {
        self.size
    }

    /// Vector to the nearest object texel, in normalized texture units.
    pub fn to_object(&self, x: u32, y: u32) -> Option<Vec2> {
        codec::decode(self.positive[self.index(x, y)])
    }

    /// Vector to the nearest background texel, in normalized texture units.
    pub fn to_background(&self, x: u32, y: u32) -> Option<Vec2> {
        codec::decode(self.negative[self.index(x, y)])
    }

    /// Distance to the nearest object texel in texels.
    pub fn object_distance_px(&self, x: u32, y: u32) -> Option<f32> {
        self.to_object(x, y).map(|v| self.to_pixels(v).length())
    }

    /// Distance to the nearest background texel in texels.
    pub fn background_distance_px(&self, x: u32, y: u32) -> Option<f32> {
        self.to_background(x, y).map(|v| self.to_pixels(v).length())
    }

    pub fn positive(&self) -> &[EncodedTexel] {
        &self.positive
    }

    pub fn negative(&self) -> &[EncodedTexel] {
        &self.negative
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.size.width as usize + x as usize
    }

    fn to_pixels(&self, v: Vec2) -> Vec2 {
        v * Vec2::new(self.size.width as f32, self.size.height as f32)
    }
}

fn field_texels(bytes: &[u8], size: Size<u32>) -> Result<Vec<EncodedTexel>, SdfError> {
    let texels: &[EncodedTexel] =
        bytemuck::try_cast_slice(bytes).map_err(|e| BackendError::Readback(e.to_string()))?;
    if texels.len() != size.area() {
        return Err(BackendError::Readback(format!(
            "expected {} field texels, got {}",
            size.area(),
            texels.len()
        ))
        .into());
    }
    Ok(texels.to_vec())
}

/// Textures sized for one tile, kept between calls.
struct WorkingSet<T> {
    size: Size<u32>,
    mask: T,
    fields: PingPong<T>,
    /// Holds the first converged field while the second one floods.
    parked: T,
}

/// Computes Euclidean distance fields of bitmaps on an [`SdfBackend`].
///
/// A renderer owns its working textures and reuses them while consecutive
/// tiles share a size. It is not shareable between threads; use
/// [`SdfRendererPool`](crate::SdfRendererPool) for concurrent rendering.
pub struct SdfRenderer<B: SdfBackend> {
    backend: Arc<B>,
    descriptor: SdfRendererDescriptor,
    working: Option<WorkingSet<B::Texture>>,
    phase: Phase,
}

impl<B: SdfBackend> SdfRenderer<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_descriptor(backend, SdfRendererDescriptor::default())
    }

    pub fn with_descriptor(backend: Arc<B>, descriptor: SdfRendererDescriptor) -> Self {
        Self {
            backend,
            descriptor,
            working: None,
            phase: Phase::Idle,
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn descriptor(&self) -> &SdfRendererDescriptor {
        &self.descriptor
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Size of the currently allocated working textures.
    pub fn working_size(&self) -> Option<Size<u32>> {
        self.working.as_ref().map(|w| w.size)
    }

    /// Render the distance field of `bitmap` into `size` texels of
    /// `destination` starting at `offset`.
    ///
    /// Texels outside the region are untouched. When the region differs
    /// from the bitmap size the field is resampled with nearest filtering.
    pub fn render_to_texture(
        &mut self,
        bitmap: Bitmap<'_>,
        destination: &B::Texture,
        offset: Pos<u32>,
        size: Size<u32>,
    ) -> Result<RenderStats, SdfError> {
        profile_function!();

        let region = Rect::from_origin_size(offset, size);
        self.check_tile(bitmap.size())?;
        self.check_destination(destination, region)?;

        tracing::debug!(
            label = self.descriptor.label,
            width = bitmap.width(),
            height = bitmap.height(),
            x = region.x,
            y = region.y,
            "Rendering distance field"
        );

        let mut stats = RenderStats::default();
        let result = self.with_working_set(bitmap, &mut stats, |renderer, working, stats| {
            renderer.flood_both(working, stats)?;
            renderer.composite(working, destination, region, stats)
        });
        self.finish(result.map(|()| stats))
    }

    /// Compute both distance fields of `bitmap` and read them back.
    pub fn compute_fields(&mut self, bitmap: Bitmap<'_>) -> Result<DistanceFields, SdfError> {
        profile_function!();
        self.check_tile(bitmap.size())?;

        let mut stats = RenderStats::default();
        let result = self.with_working_set(bitmap, &mut stats, |renderer, working, stats| {
            renderer.flood_both(working, stats)?;
            let negative = renderer.backend.read_texture(&working.parked)?;
            let positive = renderer.backend.read_texture(working.fields.read())?;
            Ok(DistanceFields {
                size: working.size,
                positive: field_texels(&positive, working.size)?,
                negative: field_texels(&negative, working.size)?,
            })
        });
        self.finish(result)
    }

    fn check_tile(&self, tile: Size<u32>) -> Result<(), SdfError> {
        let max = self.backend.max_texture_dimension();
        if tile.width > max || tile.height > max {
            return Err(SdfError::TileTooLarge { size: tile, max });
        }
        Ok(())
    }

    fn check_destination(&self, destination: &B::Texture, region: Rect<u32>) -> Result<(), SdfError> {
        if region.size().is_empty() {
            return Err(SdfError::EmptyRegion);
        }
        let bounds = destination.size();
        if !region.fits_within(bounds) {
            return Err(SdfError::RegionOutOfBounds { region, bounds });
        }
        if !self.backend.supports_destination(destination) {
            return Err(SdfError::UnsupportedTargetFormat(destination.format()));
        }
        Ok(())
    }

    /// Check out the working set sized for `bitmap`, upload the mask, run
    /// `f`, and put the working set back whatever the outcome.
    fn with_working_set<R>(
        &mut self,
        bitmap: Bitmap<'_>,
        stats: &mut RenderStats,
        f: impl FnOnce(&mut Self, &mut WorkingSet<B::Texture>, &mut RenderStats) -> Result<R, SdfError>,
    ) -> Result<R, SdfError> {
        let tile = bitmap.size();
        let mut working = match self.working.take() {
            Some(working) if working.size == tile => working,
            _ => {
                stats.reallocated = true;
                self.allocate(tile)?
            }
        };
        stats.tile = tile;

        let result = self
            .backend
            .write_texture(&working.mask, bitmap.data())
            .map_err(SdfError::from)
            .and_then(|()| f(self, &mut working, stats));

        self.working = Some(working);
        result
    }

    fn allocate(&self, size: Size<u32>) -> Result<WorkingSet<B::Texture>, SdfError> {
        profile_function!();
        tracing::debug!(
            label = self.descriptor.label,
            width = size.width,
            height = size.height,
            "Allocating working textures"
        );

        let field = |label| {
            self.backend.create_texture(&TextureDesc {
                label,
                size,
                format: FIELD_FORMAT,
                role: TextureRole::Field,
            })
        };

        let mask = self.backend.create_texture(&TextureDesc {
            label: "sdf_mask",
            size,
            format: MASK_FORMAT,
            role: TextureRole::Mask,
        })?;
        let fields = PingPong::new(field("sdf_field_a")?, field("sdf_field_b")?);
        let parked = field("sdf_field_parked")?;

        Ok(WorkingSet {
            size,
            mask,
            fields,
            parked,
        })
    }

    /// Flood the inverse field first and park it, then the forward field.
    fn flood_both(
        &mut self,
        working: &mut WorkingSet<B::Texture>,
        stats: &mut RenderStats,
    ) -> Result<(), SdfError> {
        self.flood_field(working, true, stats)?;
        working.fields.exchange_read(&mut working.parked);
        self.flood_field(working, false, stats)
    }

    fn flood_field(
        &mut self,
        working: &mut WorkingSet<B::Texture>,
        invert: bool,
        stats: &mut RenderStats,
    ) -> Result<(), SdfError> {
        profile_function!();
        let viewport = Rect::full(working.size);
        let options = DrawOptions::opaque().with_load(LoadBehavior::Clear(0.0));

        working.fields.reset();
        self.backend.draw(&Draw {
            label: "sdf_seed",
            input: PassInput::Seed {
                mask: &working.mask,
                invert,
            },
            target: working.fields.write(),
            viewport,
            options,
        })?;
        working.fields.swap();
        stats.seed_passes += 1;
        self.advance(Phase::SeedPosted);

        for step in flood_schedule(working.size) {
            self.advance(Phase::Flooding { step });
            self.backend.draw(&Draw {
                label: "sdf_flood",
                input: PassInput::Flood {
                    field: working.fields.read(),
                    step,
                },
                target: working.fields.write(),
                viewport,
                options,
            })?;
            working.fields.swap();
            stats.flood_passes += 1;
            stats.steps.push(step);
        }

        self.advance(Phase::Converged);
        Ok(())
    }

    fn composite(
        &mut self,
        working: &WorkingSet<B::Texture>,
        destination: &B::Texture,
        region: Rect<u32>,
        stats: &mut RenderStats,
    ) -> Result<(), SdfError> {
        profile_function!();
        self.backend.draw(&Draw {
            label: "sdf_insert",
            input: PassInput::Insert {
                mask: &working.mask,
                positive: working.fields.read(),
                negative: &working.parked,
                falloff: self.descriptor.falloff,
            },
            target: destination,
            viewport: region,
            // a clear would ignore the scissor and wipe the whole destination
            options: self
                .descriptor
                .insert_options
                .with_load(LoadBehavior::Load)
                .with_scissor(true),
        })?;
        stats.insert_passes += 1;
        self.advance(Phase::Composited);
        Ok(())
    }

    fn advance(&mut self, next: Phase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "invalid phase transition {:?} -> {:?}",
            self.phase,
            next
        );
        tracing::trace!(from = ?self.phase, to = ?next, "Phase transition");
        self.phase = next;
    }

    fn finish<R>(&mut self, result: Result<R, SdfError>) -> Result<R, SdfError> {
        if let Err(err) = &result {
            tracing::warn!(label = self.descriptor.label, "Distance field render failed: {}", err);
        }
        self.advance(Phase::Idle);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_transitions() {
        use Phase::*;

        assert!(Idle.can_transition_to(SeedPosted));
        assert!(SeedPosted.can_transition_to(Flooding { step: 4 }));
        assert!(Flooding { step: 4 }.can_transition_to(Flooding { step: 2 }));
        assert!(Flooding { step: 1 }.can_transition_to(Converged));
        assert!(Converged.can_transition_to(SeedPosted));
        assert!(Converged.can_transition_to(Composited));
        assert!(Composited.can_transition_to(Idle));

        // a 1x1 tile has no flood steps
        assert!(SeedPosted.can_transition_to(Converged));

        assert!(!Idle.can_transition_to(Flooding { step: 1 }));
        assert!(!Flooding { step: 2 }.can_transition_to(Flooding { step: 2 }));
        assert!(!Flooding { step: 2 }.can_transition_to(Flooding { step: 4 }));
        assert!(!Idle.can_transition_to(Composited));
        assert!(!SeedPosted.can_transition_to(Composited));
    }

    #[test]
    fn test_any_phase_can_abort() {
        for phase in [
            Phase::SeedPosted,
            Phase::Flooding { step: 8 },
            Phase::Converged,
            Phase::Composited,
        ] {
            assert!(phase.can_transition_to(Phase::Idle));
        }
    }

    #[test]
    fn test_descriptor_builder() {
        let descriptor = SdfRendererDescriptor::new()
            .label("glyphs")
            .falloff(Falloff::new(0.5, 8.0))
            .insert_options(DrawOptions::additive());

        assert_eq!(descriptor.label, "glyphs");
        assert_eq!(descriptor.falloff.scale, 8.0);
        assert_eq!(descriptor.insert_options, DrawOptions::additive());
        assert_eq!(SdfRendererDescriptor::default().falloff, Falloff::default());
    }

    #[test]
    fn test_distance_fields_pixels() {
        let size = Size::new(8, 4);
        let mut positive = vec![EncodedTexel::INDETERMINATE; size.area()];
        positive[0] = codec::encode(Some(Vec2::new(3.0 / 8.0, 1.0 / 4.0)));
        let fields = DistanceFields {
            size,
            positive,
            negative: vec![EncodedTexel::ZERO; size.area()],
        };

        let d = fields.object_distance_px(0, 0).unwrap();
        assert!((d - 10f32.sqrt()).abs() < 1e-3);
        assert_eq!(fields.object_distance_px(1, 0), None);
        assert_eq!(fields.background_distance_px(7, 3), Some(0.0));
    }

    #[test]
    fn test_stats_total() {
        let stats = RenderStats {
            seed_passes: 2,
            flood_passes: 6,
            insert_passes: 1,
            ..Default::default()
        };
        assert_eq!(stats.total_passes(), 9);
    }
}
