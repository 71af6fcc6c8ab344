use crate::renderer::geometry::GeometryBuffers;
use crate::renderer::internal::DynamicUniformBuffer;
use crate::renderer::model::ModelLibrary;
use crate::renderer::passes::{ShadingStage, OBJECT_GROUP};
use crate::renderer::uniforms::ObjectUniform;
use crate::scene::{SceneMesh, SceneObject};

const INITIAL_OBJECT_CAPACITY: u32 = 8;

/// Draws the static scene objects for either shading stage.
pub struct SceneRenderer {
    objects: DynamicUniformBuffer<ObjectUniform>,
    scratch: Vec<ObjectUniform>,
}

impl SceneRenderer {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            objects: DynamicUniformBuffer::new(
                device,
                "SceneObjects",
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                INITIAL_OBJECT_CAPACITY,
            ),
            scratch: Vec::new(),
        }
    }

    pub fn object_layout(&self) -> &wgpu::BindGroupLayout {
        self.objects.bind_layout()
    }

    /// Uploads one slot per object. Must run before any pass that draws `objects` is submitted.
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, objects: &[SceneObject]) {
        self.scratch.clear();
        self.scratch.extend(
            objects
                .iter()
                .map(|object| ObjectUniform::new(object.transform, object.shininess)),
        );
        self.objects.write_all(device, queue, &self.scratch);
    }

    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        stage: ShadingStage,
        objects: &[SceneObject],
        models: &ModelLibrary,
        geometry: &GeometryBuffers,
    ) {
        for (slot, object) in objects.iter().enumerate().take(self.objects.capacity() as usize) {
            pass.set_bind_group(OBJECT_GROUP, self.objects.bind_group(), &[self.objects.offset(slot)]);
            match object.mesh {
                SceneMesh::Ground => geometry.draw_ground(pass, stage),
                SceneMesh::Model(key) => match models.get(key) {
                    Some(model) => model.draw(pass, stage),
                    None => log::trace!("Model {:?} not loaded, skipping", key),
                },
            }
        }
    }
}
