//! Software implementation of [`SdfBackend`].
//!
//! Textures are plain byte vectors and every draw evaluates the per-texel
//! kernels from `glyphfield_sdf::pass`, so results match the GPU programs
//! texel for texel (up to floating point contraction on the GPU side).

use glyphfield_core::geometry::{Rect, Size};
use glyphfield_render::bytes_per_texel;
use glyphfield_sdf::backend::FIELD_FORMAT;
use glyphfield_sdf::pass::{flood, insert, seed};
use glyphfield_sdf::{
    BackendError, Draw, EncodedTexel, LoadBehavior, PassInput, PassKind, SdfBackend, TextureDesc,
    TextureHandle, TextureRole, codec,
};
use parking_lot::Mutex;

/// Records a backend call for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    CreateTexture {
        id: usize,
        label: String,
        size: Size<u32>,
        format: wgpu::TextureFormat,
        role: TextureRole,
    },
    WriteTexture {
        id: usize,
        len: usize,
    },
    Draw {
        label: String,
        kind: PassKind,
        target: usize,
        sources: Vec<usize>,
        viewport: Rect<u32>,
        /// Flood step, for flood draws.
        step: Option<u32>,
        /// Mask inversion, for seed draws.
        invert: Option<bool>,
    },
    ReadTexture {
        id: usize,
    },
}

/// Handle to a texture stored in a [`MockBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockTexture {
    id: usize,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
}

impl MockTexture {
    pub fn id(&self) -> usize {
        self.id
    }
}

impl TextureHandle for MockTexture {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    fn same_resource(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[derive(Debug)]
struct Storage {
    size: Size<u32>,
    texel_bytes: usize,
    bytes: Vec<u8>,
}

/// CPU backend that executes and records every call.
pub struct MockBackend {
    calls: Mutex<Vec<RenderCall>>,
    textures: Mutex<Vec<Storage>>,
    max_texture_dimension: u32,
    fail_next_create: Mutex<Option<BackendError>>,
    fail_next_draw: Mutex<Option<BackendError>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            textures: Mutex::new(Vec::new()),
            max_texture_dimension: 8192,
            fail_next_create: Mutex::new(None),
            fail_next_draw: Mutex::new(None),
        }
    }

    pub fn with_max_texture_dimension(mut self, max: u32) -> Self {
        self.max_texture_dimension = max;
        self
    }

    /// Make the next `create_texture` call fail with `error`.
    pub fn fail_next_texture_creation(&self, error: BackendError) {
        *self.fail_next_create.lock() = Some(error);
    }

    /// Make the next `draw` call fail with `error`.
    pub fn fail_next_draw(&self, error: BackendError) {
        *self.fail_next_draw.lock() = Some(error);
    }

    /// Allocate a destination texture, panicking on failure.
    pub fn create_destination(&self, width: u32, height: u32, format: wgpu::TextureFormat) -> MockTexture {
        self.create_texture(&TextureDesc {
            label: "test_destination",
            size: Size::new(width, height),
            format,
            role: TextureRole::Destination,
        })
        .expect("destination allocation failed")
    }

    /// Current contents of a texture, without recording a read.
    pub fn texture_bytes(&self, texture: &MockTexture) -> Vec<u8> {
        self.textures.lock()[texture.id].bytes.clone()
    }

    /// Overwrite a texture without recording a write.
    pub fn fill_texture(&self, texture: &MockTexture, value: u8) {
        self.textures.lock()[texture.id].bytes.fill(value);
    }

    /// Get a copy of all recorded calls.
    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn count_texture_creates(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, RenderCall::CreateTexture { .. }))
            .count()
    }

    pub fn count_texture_writes(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, RenderCall::WriteTexture { .. }))
            .count()
    }

    pub fn count_draws(&self) -> usize {
        self.draw_kinds().len()
    }

    pub fn count_draws_of(&self, kind: PassKind) -> usize {
        self.draw_kinds().into_iter().filter(|k| *k == kind).count()
    }

    /// Kinds of every recorded draw, in submission order.
    pub fn draw_kinds(&self) -> Vec<PassKind> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                RenderCall::Draw { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect()
    }

    /// Flood step sizes, in submission order.
    pub fn flood_steps(&self) -> Vec<u32> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                RenderCall::Draw { step, .. } => *step,
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: RenderCall) {
        self.calls.lock().push(call);
    }

    fn execute(&self, draw: &Draw<'_, MockTexture>) -> Result<(), BackendError> {
        let mut textures = self.textures.lock();

        let source_bytes: Vec<Vec<u8>> = draw
            .input
            .sources()
            .iter()
            .map(|t| textures[t.id].bytes.clone())
            .collect();

        let target = &mut textures[draw.target.id];
        if let LoadBehavior::Clear(value) = draw.options.load {
            target.bytes.fill(insert::to_unorm8(value));
        }

        let viewport = draw.viewport;
        let width = target.size.width as usize;
        let texels = (viewport.y..viewport.y + viewport.height)
            .flat_map(|y| (viewport.x..viewport.x + viewport.width).map(move |x| (x, y)));

        match draw.input {
            PassInput::Seed { mask, invert } => {
                require_field_target(target)?;
                let mask_bytes = &source_bytes[0];
                for (x, y) in texels {
                    let value = mask_bytes[y as usize * mask.width as usize + x as usize];
                    write_field_texel(target, width, x, y, seed::seed_texel(value, invert));
                }
            }
            PassInput::Flood { field, step } => {
                require_field_target(target)?;
                let field_texels: &[EncodedTexel] = bytemuck::cast_slice(&source_bytes[0]);
                for (x, y) in texels {
                    let texel = flood::flood_texel(field_texels, field.size(), x, y, step);
                    write_field_texel(target, width, x, y, texel);
                }
            }
            PassInput::Insert { mask, falloff, .. } => {
                let mask_bytes = &source_bytes[0];
                let positive: &[EncodedTexel] = bytemuck::cast_slice(&source_bytes[1]);
                let negative: &[EncodedTexel] = bytemuck::cast_slice(&source_bytes[2]);
                let blend = draw.options.blend;
                let source_width = mask.width as usize;

                for (x, y) in texels {
                    let sx = insert::source_coord(x - viewport.x, viewport.width, mask.width);
                    let sy = insert::source_coord(y - viewport.y, viewport.height, mask.height);
                    let index = sy as usize * source_width + sx as usize;

                    let value = insert::insert_value(
                        mask_bytes[index],
                        codec::decode(positive[index]),
                        codec::decode(negative[index]),
                        falloff,
                    );

                    let start = (y as usize * width + x as usize) * target.texel_bytes;
                    for channel in &mut target.bytes[start..start + target.texel_bytes] {
                        let dst = *channel as f32 / 255.0;
                        *channel = insert::to_unorm8(blend.apply(value, dst));
                    }
                }
            }
        }

        Ok(())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn require_field_target(target: &Storage) -> Result<(), BackendError> {
    if target.texel_bytes != 4 {
        return Err(BackendError::Validation(format!(
            "field passes render to {:?}",
            FIELD_FORMAT
        )));
    }
    Ok(())
}

fn write_field_texel(target: &mut Storage, width: usize, x: u32, y: u32, texel: EncodedTexel) {
    let start = (y as usize * width + x as usize) * 4;
    target.bytes[start..start + 4].copy_from_slice(&texel.0);
}

impl SdfBackend for MockBackend {
    type Texture = MockTexture;

    fn create_texture(&self, desc: &TextureDesc<'_>) -> Result<MockTexture, BackendError> {
        if let Some(error) = self.fail_next_create.lock().take() {
            return Err(error);
        }

        let texel_bytes = bytes_per_texel(desc.format).ok_or_else(|| {
            BackendError::Validation(format!("unsupported format {:?}", desc.format))
        })? as usize;
        if desc.size.is_empty()
            || desc.size.width > self.max_texture_dimension
            || desc.size.height > self.max_texture_dimension
        {
            return Err(BackendError::Validation(format!(
                "invalid texture size {}x{}",
                desc.size.width, desc.size.height
            )));
        }

        let mut textures = self.textures.lock();
        let id = textures.len();
        textures.push(Storage {
            size: desc.size,
            texel_bytes,
            bytes: vec![0; desc.size.area() * texel_bytes],
        });
        drop(textures);

        self.record(RenderCall::CreateTexture {
            id,
            label: desc.label.to_string(),
            size: desc.size,
            format: desc.format,
            role: desc.role,
        });

        Ok(MockTexture {
            id,
            width: desc.size.width,
            height: desc.size.height,
            format: desc.format,
        })
    }

    fn write_texture(&self, texture: &MockTexture, data: &[u8]) -> Result<(), BackendError> {
        let mut textures = self.textures.lock();
        let storage = &mut textures[texture.id];
        if storage.bytes.len() != data.len() {
            return Err(BackendError::Validation(format!(
                "upload of {} bytes into a texture of {} bytes",
                data.len(),
                storage.bytes.len()
            )));
        }
        storage.bytes.copy_from_slice(data);
        drop(textures);

        self.record(RenderCall::WriteTexture {
            id: texture.id,
            len: data.len(),
        });
        Ok(())
    }

    fn draw(&self, draw: &Draw<'_, MockTexture>) -> Result<(), BackendError> {
        draw.validate()?;
        if let Some(error) = self.fail_next_draw.lock().take() {
            return Err(error);
        }

        let (step, invert) = match draw.input {
            PassInput::Seed { invert, .. } => (None, Some(invert)),
            PassInput::Flood { step, .. } => (Some(step), None),
            PassInput::Insert { .. } => (None, None),
        };

        self.execute(draw)?;

        self.record(RenderCall::Draw {
            label: draw.label.to_string(),
            kind: draw.input.kind(),
            target: draw.target.id,
            sources: draw.input.sources().iter().map(|t| t.id).collect(),
            viewport: draw.viewport,
            step,
            invert,
        });
        Ok(())
    }

    fn read_texture(&self, texture: &MockTexture) -> Result<Vec<u8>, BackendError> {
        self.record(RenderCall::ReadTexture { id: texture.id });
        Ok(self.texture_bytes(texture))
    }

    fn max_texture_dimension(&self) -> u32 {
        self.max_texture_dimension
    }
}
