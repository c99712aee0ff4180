//! Per-draw render state.
//!
//! Each draw carries its own options instead of relying on state left behind
//! by a previous draw, so the renderer can share a backend with other work.

use glyphfield_render::BlendMode;

/// What happens to the target's contents before a draw.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LoadBehavior {
    /// Keep the existing contents.
    #[default]
    Load,
    /// Clear every channel of the whole target to the given value first.
    Clear(f32),
}

/// Blend, load and scissor state for one draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawOptions {
    pub blend: BlendMode,
    pub load: LoadBehavior,
    /// Clip fragments to the draw viewport.
    pub scissor: bool,
}

impl DrawOptions {
    /// Overwrite the target; what every internal pass uses.
    pub const fn opaque() -> Self {
        Self {
            blend: BlendMode::Replace,
            load: LoadBehavior::Load,
            scissor: true,
        }
    }

    /// Alpha-blend over the existing contents.
    pub const fn translucent() -> Self {
        Self {
            blend: BlendMode::Alpha,
            load: LoadBehavior::Load,
            scissor: true,
        }
    }

    /// Accumulate into the existing contents.
    pub const fn additive() -> Self {
        Self {
            blend: BlendMode::Additive,
            load: LoadBehavior::Load,
            scissor: true,
        }
    }

    pub const fn with_load(mut self, load: LoadBehavior) -> Self {
        self.load = load;
        self
    }

    pub const fn with_scissor(mut self, scissor: bool) -> Self {
        self.scissor = scissor;
        self
    }
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self::opaque()
    }
}

impl LoadBehavior {
    pub fn to_load_op(self) -> wgpu::LoadOp<wgpu::Color> {
        match self {
            LoadBehavior::Load => wgpu::LoadOp::Load,
            LoadBehavior::Clear(value) => {
                let value = value as f64;
                wgpu::LoadOp::Clear(wgpu::Color {
                    r: value,
                    g: value,
                    b: value,
                    a: value,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(DrawOptions::default(), DrawOptions::opaque());
        assert_eq!(DrawOptions::opaque().blend, BlendMode::Replace);
        assert_eq!(DrawOptions::translucent().blend, BlendMode::Alpha);
        assert_eq!(DrawOptions::additive().blend, BlendMode::Additive);
    }

    #[test]
    fn test_builder() {
        let options = DrawOptions::additive()
            .with_load(LoadBehavior::Clear(0.0))
            .with_scissor(false);
        assert_eq!(options.load, LoadBehavior::Clear(0.0));
        assert!(!options.scissor);
        assert_eq!(options.blend, BlendMode::Additive);
    }

    #[test]
    fn test_load_op() {
        assert_eq!(LoadBehavior::Load.to_load_op(), wgpu::LoadOp::Load);
        assert_eq!(
            LoadBehavior::Clear(1.0).to_load_op(),
            wgpu::LoadOp::Clear(wgpu::Color::WHITE)
        );
    }
}
