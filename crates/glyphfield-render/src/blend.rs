//! Blend presets for full-screen passes.

/// How a pass combines its output with the target's existing contents.
///
/// The distance-field passes overwrite their targets, so they use
/// [`BlendMode::Replace`]; the blended presets exist for callers that composite
/// a finished field over other content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Source replaces destination.
    #[default]
    Replace,

    /// `src.rgb * src.a + dst.rgb * (1 - src.a)`
    Alpha,

    /// `src.rgb * src.a + dst.rgb`
    Additive,

    /// Custom blend state for advanced use cases.
    Custom(wgpu::BlendState),
}

impl BlendMode {
    /// Convert to wgpu BlendState.
    pub fn to_blend_state(self) -> Option<wgpu::BlendState> {
        match self {
            BlendMode::Replace => Some(wgpu::BlendState::REPLACE),
            BlendMode::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
            BlendMode::Additive => Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            }),
            BlendMode::Custom(state) => Some(state),
        }
    }

    /// Create a color target state with this blend mode.
    pub fn to_color_target_state(self, format: wgpu::TextureFormat) -> wgpu::ColorTargetState {
        wgpu::ColorTargetState {
            format,
            blend: self.to_blend_state(),
            write_mask: wgpu::ColorWrites::ALL,
        }
    }

    /// Blend `src` over `dst` on the CPU for a single normalized channel.
    ///
    /// Used by software backends; alpha is taken to equal the channel value,
    /// matching a single-channel distance field written to every component.
    /// Custom states are not emulated and behave like `Replace`.
    pub fn apply(self, src: f32, dst: f32) -> f32 {
        match self {
            BlendMode::Replace => src,
            BlendMode::Alpha => src * src + dst * (1.0 - src),
            BlendMode::Additive => (src * src + dst).min(1.0),
            BlendMode::Custom(_) => src,
        }
    }
}

impl From<BlendMode> for Option<wgpu::BlendState> {
    fn from(mode: BlendMode) -> Self {
        mode.to_blend_state()
    }
}
