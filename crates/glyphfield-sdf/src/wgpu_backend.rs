//! [`SdfBackend`] running the passes on a wgpu device.

use std::sync::Arc;

use ahash::HashMap;
use parking_lot::Mutex;
use wgpu::util::DeviceExt;

use glyphfield_core::profiling::profile_function;
use glyphfield_render::{BlendMode, GpuReadback, GpuTexture, GraphicsContext, bytes_per_texel};

use crate::BackendError;
use crate::backend::{
    Draw, FIELD_FORMAT, PassInput, PassKind, SdfBackend, TextureDesc, TextureHandle, TextureRole,
};
use crate::pass::flood::FloodUniforms;
use crate::pass::insert::{self, InsertUniforms};
use crate::pass::seed::SeedUniforms;
use crate::pass::{FULLSCREEN_QUAD, flood, seed};

impl TextureHandle for GpuTexture {
    fn width(&self) -> u32 {
        GpuTexture::width(self)
    }

    fn height(&self) -> u32 {
        GpuTexture::height(self)
    }

    fn format(&self) -> wgpu::TextureFormat {
        GpuTexture::format(self)
    }

    fn same_resource(&self, other: &Self) -> bool {
        self.same_texture(other)
    }
}

impl TextureRole {
    pub fn usages(self) -> wgpu::TextureUsages {
        match self {
            TextureRole::Mask => {
                wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST
            }
            TextureRole::Field => {
                wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_SRC
            }
            TextureRole::Destination => {
                wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_SRC
                    | wgpu::TextureUsages::COPY_DST
            }
        }
    }
}

/// Shader, bind group layout and pipeline layout of one program.
struct PassProgram {
    shader: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
}

impl PassProgram {
    /// `textures` sampled textures at bindings `0..textures`, then a uniform block.
    fn new(device: &wgpu::Device, label: &str, source: &str, textures: u32) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let mut entries: Vec<wgpu::BindGroupLayoutEntry> = (0..textures)
            .map(|binding| wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                },
                count: None,
            })
            .collect();
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: textures,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        Self {
            shader,
            bind_group_layout,
            pipeline_layout,
        }
    }

    fn create_pipeline(
        &self,
        device: &wgpu::Device,
        label: &str,
        format: wgpu::TextureFormat,
        blend: BlendMode,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: 8,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x2],
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                targets: &[Some(blend.to_color_target_state(format))],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    kind: PassKind,
    format: wgpu::TextureFormat,
    blend: BlendMode,
}

/// Runs the seed, flood and insert programs on a [`GraphicsContext`].
///
/// Each draw is recorded into its own command buffer and submitted
/// immediately, so draws execute in call order. Pipelines are built on first
/// use per (program, target format, blend) combination.
pub struct WgpuBackend {
    context: Arc<GraphicsContext>,
    quad: wgpu::Buffer,
    seed: PassProgram,
    flood: PassProgram,
    insert: PassProgram,
    pipelines: Mutex<HashMap<PipelineKey, wgpu::RenderPipeline>>,
}

impl WgpuBackend {
    pub fn new(context: Arc<GraphicsContext>) -> Self {
        profile_function!();
        let device = context.device();

        let quad = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sdf_fullscreen_quad"),
            contents: bytemuck::cast_slice(&FULLSCREEN_QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let seed = PassProgram::new(device, "sdf_seed", seed::SHADER_SOURCE, 1);
        let flood = PassProgram::new(device, "sdf_flood", flood::SHADER_SOURCE, 1);
        let insert = PassProgram::new(device, "sdf_insert", insert::SHADER_SOURCE, 3);

        tracing::debug!(adapter = ?context.info().name, "Created wgpu SDF backend");

        Self {
            context,
            quad,
            seed,
            flood,
            insert,
            pipelines: Mutex::new(HashMap::default()),
        }
    }

    pub fn context(&self) -> &Arc<GraphicsContext> {
        &self.context
    }

    fn program(&self, kind: PassKind) -> &PassProgram {
        match kind {
            PassKind::Seed => &self.seed,
            PassKind::Flood => &self.flood,
            PassKind::Insert => &self.insert,
        }
    }

    fn pipeline(&self, key: PipelineKey) -> wgpu::RenderPipeline {
        let mut pipelines = self.pipelines.lock();
        pipelines
            .entry(key)
            .or_insert_with(|| {
                tracing::debug!(kind = ?key.kind, format = ?key.format, "Building SDF pipeline");
                self.program(key.kind).create_pipeline(
                    self.context.device(),
                    &format!("sdf_{:?}_pipeline", key.kind).to_lowercase(),
                    key.format,
                    key.blend,
                )
            })
            .clone()
    }

    /// Number of pipelines built so far.
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.lock().len()
    }
}

/// Map an error popped from a device error scope.
fn scope_error(error: wgpu::Error) -> BackendError {
    match error {
        wgpu::Error::OutOfMemory { .. } => BackendError::OutOfMemory(error.to_string()),
        other => BackendError::Validation(other.to_string()),
    }
}

impl SdfBackend for WgpuBackend {
    type Texture = GpuTexture;

    fn create_texture(&self, desc: &TextureDesc<'_>) -> Result<GpuTexture, BackendError> {
        profile_function!();
        let device = self.context.device();

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let texture = GpuTexture::new_2d(
            device,
            Some(desc.label),
            desc.size.width,
            desc.size.height,
            desc.format,
            desc.role.usages(),
        );
        let validation = pollster::block_on(device.pop_error_scope());
        let out_of_memory = pollster::block_on(device.pop_error_scope());

        match out_of_memory.or(validation) {
            Some(error) => {
                tracing::error!(label = desc.label, "Texture allocation failed: {}", error);
                Err(scope_error(error))
            }
            None => Ok(texture),
        }
    }

    fn write_texture(&self, texture: &GpuTexture, data: &[u8]) -> Result<(), BackendError> {
        let texel_bytes = bytes_per_texel(texture.format()).ok_or_else(|| {
            BackendError::Validation(format!("cannot upload {:?} texels", texture.format()))
        })?;
        let expected = TextureHandle::size(texture).area() * texel_bytes as usize;
        if data.len() != expected {
            return Err(BackendError::Validation(format!(
                "upload of {} bytes into a texture of {} bytes",
                data.len(),
                expected
            )));
        }

        texture.write(self.context.queue(), data);
        Ok(())
    }

    fn draw(&self, draw: &Draw<'_, GpuTexture>) -> Result<(), BackendError> {
        profile_function!();
        draw.validate()?;

        let (uniforms, sources): (Vec<u8>, Vec<&GpuTexture>) = match draw.input {
            PassInput::Seed { mask, invert } => (
                bytemuck::bytes_of(&SeedUniforms::new(invert)).to_vec(),
                vec![mask],
            ),
            PassInput::Flood { field, step } => {
                if draw.target.format() != FIELD_FORMAT {
                    return Err(BackendError::Validation(format!(
                        "flood target must be {:?}",
                        FIELD_FORMAT
                    )));
                }
                (
                    bytemuck::bytes_of(&FloodUniforms::new(TextureHandle::size(field), step)).to_vec(),
                    vec![field],
                )
            }
            PassInput::Insert {
                mask,
                positive,
                negative,
                falloff,
            } => (
                bytemuck::bytes_of(&InsertUniforms::new(
                    draw.viewport,
                    TextureHandle::size(mask),
                    falloff,
                ))
                .to_vec(),
                vec![mask, positive, negative],
            ),
        };

        let kind = draw.input.kind();
        let pipeline = self.pipeline(PipelineKey {
            kind,
            format: draw.target.format(),
            blend: draw.options.blend,
        });
        let program = self.program(kind);
        let device = self.context.device();

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(draw.label),
            contents: &uniforms,
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let mut entries: Vec<wgpu::BindGroupEntry> = sources
            .iter()
            .enumerate()
            .map(|(binding, texture)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: texture.as_binding(),
            })
            .collect();
        entries.push(wgpu::BindGroupEntry {
            binding: sources.len() as u32,
            resource: uniform_buffer.as_entire_binding(),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(draw.label),
            layout: &program.bind_group_layout,
            entries: &entries,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some(draw.label),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(draw.label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: draw.target.view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: draw.options.load.to_load_op(),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let viewport = draw.viewport;
            pass.set_viewport(
                viewport.x as f32,
                viewport.y as f32,
                viewport.width as f32,
                viewport.height as f32,
                0.0,
                1.0,
            );
            if draw.options.scissor {
                pass.set_scissor_rect(viewport.x, viewport.y, viewport.width, viewport.height);
            }
            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_vertex_buffer(0, self.quad.slice(..));
            pass.draw(0..6, 0..1);
        }
        self.context.queue().submit(Some(encoder.finish()));

        match pollster::block_on(device.pop_error_scope()) {
            Some(error) => {
                tracing::error!(label = draw.label, "Draw rejected: {}", error);
                Err(scope_error(error))
            }
            None => Ok(()),
        }
    }

    fn read_texture(&self, texture: &GpuTexture) -> Result<Vec<u8>, BackendError> {
        profile_function!();
        let readback = GpuReadback::from_texture(&self.context, texture)?;
        Ok(readback.read(&self.context)?)
    }

    fn max_texture_dimension(&self) -> u32 {
        self.context.max_texture_dimension_2d()
    }

    fn supports_destination(&self, texture: &GpuTexture) -> bool {
        insert::is_supported_output(texture.format())
            && texture
                .usage()
                .contains(wgpu::TextureUsages::RENDER_ATTACHMENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_usages() {
        assert!(
            TextureRole::Mask
                .usages()
                .contains(wgpu::TextureUsages::COPY_DST)
        );
        assert!(
            !TextureRole::Mask
                .usages()
                .contains(wgpu::TextureUsages::RENDER_ATTACHMENT)
        );
        assert!(
            TextureRole::Field
                .usages()
                .contains(wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING)
        );
        assert!(
            TextureRole::Destination
                .usages()
                .contains(wgpu::TextureUsages::COPY_SRC)
        );
    }

    #[test]
    fn test_shader_sources_share_codec() {
        for source in [seed::SHADER_SOURCE, flood::SHADER_SOURCE, insert::SHADER_SOURCE] {
            assert!(source.contains("fn vs_main"));
            assert!(source.contains("fn fs_main"));
            assert!(source.contains("const WORD_SCALE: f32 = 32768.0;"));
        }
    }
}
