use crate::renderer::geometry::GeometryBuffers;
use crate::renderer::internal::DynamicUniformBuffer;
use crate::renderer::lights::{CubeFace, CubeFaceTransforms, PointLight, CUBE_FACE_COUNT, POINT_LIGHT_COUNT};
use crate::renderer::model::ModelLibrary;
use crate::renderer::passes::scene::SceneRenderer;
use crate::renderer::passes::ShadingStage;
use crate::renderer::pipeline_builder::PipelineBuilder;
use crate::renderer::shadows::{ShadowCubemap, SHADOW_FORMAT};
use crate::renderer::uniforms::ShadowFaceUniform;
use crate::renderer::vertex::Vertex;
use crate::scene::SceneObject;

const FACE_GROUP: u32 = 0;

/// Renders linear light-distance depth into the six faces of a light's cube map.
pub struct DepthPassRenderer {
    pipeline: wgpu::RenderPipeline,
    faces: DynamicUniformBuffer<ShadowFaceUniform>,
}

impl DepthPassRenderer {
    pub fn new(device: &wgpu::Device, object_layout: &wgpu::BindGroupLayout) -> Self {
        let faces = DynamicUniformBuffer::new(
            device,
            "ShadowFaces",
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            (POINT_LIGHT_COUNT * CUBE_FACE_COUNT) as u32,
        );

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("DepthCubeShader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../shader/depth_cube.wgsl").into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("DepthCubePipelineLayout"),
            bind_group_layouts: &[faces.bind_layout(), object_layout],
            push_constant_ranges: &[],
        });

        // The left-handed face views mirror triangle winding, so both sides are rasterized.
        let pipeline = PipelineBuilder::new(device, &layout, &shader)
            .with_label("DepthCubePipeline")
            .with_vertex_buffer(Vertex::layout())
            .with_depth(SHADOW_FORMAT, true, wgpu::CompareFunction::Less)
            .with_no_culling()
            .build();

        Self { pipeline, faces }
    }

    /// Uploads the six face uniforms of `light_index`.
    pub fn prepare(
        &mut self,
        queue: &wgpu::Queue,
        light_index: usize,
        light: &PointLight,
        transforms: &CubeFaceTransforms,
    ) {
        let uniforms = ShadowFaceUniform::for_light(light, transforms);
        self.faces
            .write_at(queue, light_index * CUBE_FACE_COUNT, &uniforms);
    }

    /// Encodes one depth-only render pass per face. Each pass clears the face to the far value.
    #[allow(clippy::too_many_arguments)]
    pub fn render_depth(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        light_index: usize,
        cubemap: &ShadowCubemap,
        scene: &SceneRenderer,
        objects: &[SceneObject],
        models: &ModelLibrary,
        geometry: &GeometryBuffers,
    ) {
        for face in CubeFace::ALL {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ShadowDepthPass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: cubemap.face_view(face),
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
            let slot = light_index * CUBE_FACE_COUNT + face.layer() as usize;
            pass.set_bind_group(FACE_GROUP, self.faces.bind_group(), &[self.faces.offset(slot)]);
            scene.draw(&mut pass, ShadingStage::Depth, objects, models, geometry);
        }
    }
}
