use glam::{Mat4, Vec3};

use crate::error::RenderError;
use crate::renderer::depth::Depth;
use crate::renderer::geometry::GeometryBuffers;
use crate::renderer::internal::UniformBuffer;
use crate::renderer::lights::{DirectionalLight, PointLight, SpotLight, POINT_LIGHT_COUNT};
use crate::renderer::model::ModelLibrary;
use crate::renderer::passes::scene::SceneRenderer;
use crate::renderer::passes::{FrameTargets, ShadingStage, FRAME_GROUP, SHADOW_GROUP};
use crate::renderer::pipeline_builder::PipelineBuilder;
use crate::renderer::shadows::ShadowCubemapManager;
use crate::renderer::uniforms::{CameraUniform, LightingUniform};
use crate::renderer::vertex::Vertex;
use crate::scene::SceneObject;

pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.1,
    b: 0.1,
    a: 1.0,
};

/// Depth compare of every lit pipeline. The sky uses `LessEqual` in its own pipeline.
pub const SCENE_DEPTH_COMPARE: wgpu::CompareFunction = wgpu::CompareFunction::Less;

/// The depth cube maps are read as plain float textures and compared in the shader. Depth
/// sample types would turn into shadow samplers on GL, which cannot take an explicit level.
pub const SHADOW_SAMPLE_TYPE: wgpu::TextureSampleType =
    wgpu::TextureSampleType::Float { filterable: false };

/// Per-frame camera and light state for the lit pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightingInputs {
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
    pub camera_front: Vec3,
    pub directional: DirectionalLight,
    pub spotlight_enabled: bool,
    pub shadows_enabled: bool,
}

impl LightingInputs {
    pub fn spotlight(&self) -> SpotLight {
        SpotLight::flashlight(self.camera_position, self.camera_front, self.spotlight_enabled)
    }
}

/// Forward Blinn-Phong pass that samples both shadow cube maps.
pub struct LightingPass {
    pipeline: wgpu::RenderPipeline,
    camera: UniformBuffer<CameraUniform>,
    lighting: UniformBuffer<LightingUniform>,
    frame_bind_group: wgpu::BindGroup,
    shadow_bind_group: wgpu::BindGroup,
}

impl LightingPass {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        object_layout: &wgpu::BindGroupLayout,
        material_layout: &wgpu::BindGroupLayout,
        shadows: &ShadowCubemapManager,
    ) -> Self {
        let camera = UniformBuffer::<CameraUniform>::new(device, "CameraUniform");
        let lighting = UniformBuffer::<LightingUniform>::new(device, "LightingUniform");

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("FrameLayout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT),
                uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
            ],
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("FrameBindGroup"),
            layout: &frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera.binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lighting.binding(),
                },
            ],
        });

        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("PointShadowLayout"),
            entries: &[
                cube_depth_entry(0),
                cube_depth_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                    count: None,
                },
            ],
        });

        let mut shadow_entries = Vec::with_capacity(POINT_LIGHT_COUNT + 1);
        for light in 0..POINT_LIGHT_COUNT {
            if let Some(cubemap) = shadows.cubemap(light) {
                shadow_entries.push(wgpu::BindGroupEntry {
                    binding: light as u32,
                    resource: wgpu::BindingResource::TextureView(cubemap.cube_view()),
                });
            }
        }
        shadow_entries.push(wgpu::BindGroupEntry {
            binding: 2,
            resource: wgpu::BindingResource::Sampler(shadows.sampler()),
        });
        let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("PointShadowBindGroup"),
            layout: &shadow_layout,
            entries: &shadow_entries,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("LitShader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../shader/lit.wgsl").into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("LitPipelineLayout"),
            bind_group_layouts: &[&frame_layout, object_layout, &shadow_layout, material_layout],
            push_constant_ranges: &[],
        });
        let pipeline = PipelineBuilder::new(device, &layout, &shader)
            .with_label("LitPipeline")
            .with_vertex_buffer(Vertex::layout())
            .with_color_target(color_format)
            .with_depth(Depth::FORMAT, true, SCENE_DEPTH_COMPARE)
            .build();

        Self {
            pipeline,
            camera,
            lighting,
            frame_bind_group,
            shadow_bind_group,
        }
    }

    /// Camera uniform shared with the sky pass.
    pub(crate) fn camera(&self) -> &UniformBuffer<CameraUniform> {
        &self.camera
    }

    pub fn prepare(
        &self,
        queue: &wgpu::Queue,
        point_lights: &[PointLight; POINT_LIGHT_COUNT],
        inputs: &LightingInputs,
    ) {
        self.camera.write(
            queue,
            &CameraUniform::new(inputs.view, inputs.projection, inputs.camera_position),
        );
        self.lighting.write(
            queue,
            &LightingUniform::new(
                point_lights,
                &inputs.directional,
                &inputs.spotlight(),
                inputs.shadows_enabled,
            ),
        );
    }

    /// Clears the frame and draws every object lit. Fails if a cube map is stale.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        targets: &FrameTargets<'_>,
        shadows: &ShadowCubemapManager,
        scene: &SceneRenderer,
        objects: &[SceneObject],
        models: &ModelLibrary,
        geometry: &GeometryBuffers,
    ) -> Result<(), RenderError> {
        for light in 0..shadows.len() {
            shadows.ensure_current(light)?;
        }

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("LightingPass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: targets.color,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: targets.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(FRAME_GROUP, &self.frame_bind_group, &[]);
        pass.set_bind_group(SHADOW_GROUP, &self.shadow_bind_group, &[]);
        scene.draw(&mut pass, ShadingStage::Lit, objects, models, geometry);
        Ok(())
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn cube_depth_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: SHADOW_SAMPLE_TYPE,
            view_dimension: wgpu::TextureViewDimension::Cube,
            multisampled: false,
        },
        count: None,
    }
}
