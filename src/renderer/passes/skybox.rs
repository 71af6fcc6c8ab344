use crate::renderer::depth::Depth;
use crate::renderer::geometry::GeometryBuffers;
use crate::renderer::passes::lighting::LightingPass;
use crate::renderer::passes::FrameTargets;
use crate::renderer::pipeline_builder::PipelineBuilder;
use crate::renderer::texture::CubeTexture;
use crate::renderer::vertex::SkyVertex;

/// The sky sits at depth 1.0 exactly, so it must pass where nothing was drawn and fail elsewhere.
pub const SKY_DEPTH_COMPARE: wgpu::CompareFunction = wgpu::CompareFunction::LessEqual;

/// Draws the sky cube into the pixels the lit pass left at the far plane.
pub struct SkyboxPass {
    pipeline: wgpu::RenderPipeline,
    camera_bind_group: wgpu::BindGroup,
    texture_bind_group: wgpu::BindGroup,
    _texture: CubeTexture,
}

impl SkyboxPass {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        lighting: &LightingPass,
        texture: CubeTexture,
    ) -> Self {
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("SkyCameraLayout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("SkyCameraBindGroup"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: lighting.camera().binding(),
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("SkyTextureLayout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let texture_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("SkyTextureBindGroup"),
            layout: &texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("SkyboxShader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../shader/skybox.wgsl").into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("SkyboxPipelineLayout"),
            bind_group_layouts: &[&camera_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        // The camera sits inside the cube, so nothing is culled.
        let pipeline = PipelineBuilder::new(device, &layout, &shader)
            .with_label("SkyboxPipeline")
            .with_vertex_buffer(SkyVertex::layout())
            .with_color_target(color_format)
            .with_depth(Depth::FORMAT, false, SKY_DEPTH_COMPARE)
            .with_no_culling()
            .build();

        Self {
            pipeline,
            camera_bind_group,
            texture_bind_group,
            _texture: texture,
        }
    }

    /// Draws over the lit frame, keeping its colour and depth.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        targets: &FrameTargets<'_>,
        geometry: &GeometryBuffers,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("SkyboxPass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: targets.color,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: targets.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.camera_bind_group, &[]);
        pass.set_bind_group(1, &self.texture_bind_group, &[]);
        geometry.draw_sky(&mut pass);
    }
}

/// Whether a sky fragment at depth 1.0 survives against `stored` under `compare`.
pub fn sky_passes_depth_test(compare: wgpu::CompareFunction, stored: f32) -> bool {
    match compare {
        wgpu::CompareFunction::Never => false,
        wgpu::CompareFunction::Less => 1.0 < stored,
        wgpu::CompareFunction::Equal => 1.0 == stored,
        wgpu::CompareFunction::LessEqual => 1.0 <= stored,
        wgpu::CompareFunction::Greater => 1.0 > stored,
        wgpu::CompareFunction::NotEqual => 1.0 != stored,
        wgpu::CompareFunction::GreaterEqual => 1.0 >= stored,
        wgpu::CompareFunction::Always => true,
    }
}
