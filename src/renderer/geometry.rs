use wgpu::util::DeviceExt;

use crate::renderer::mesh::Mesh;
use crate::renderer::model::material_bind_group;
use crate::renderer::passes::{ShadingStage, MATERIAL_GROUP};
use crate::renderer::texture::Texture;
use crate::renderer::vertex::{v, SkyVertex, Vertex};

/// Ground quad on y = 0, spanning x in [-1, 1] and z in [-0.5, 0.5]. Counter-clockwise when seen
/// from above, so its front face points up.
pub fn ground_vertices() -> ([Vertex; 4], [u32; 6]) {
    let up = [0.0, 1.0, 0.0];
    (
        [
            v([-1.0, 0.0, 0.5], up, [0.0, 0.0]),
            v([1.0, 0.0, 0.5], up, [1.0, 0.0]),
            v([1.0, 0.0, -0.5], up, [1.0, 1.0]),
            v([-1.0, 0.0, -0.5], up, [0.0, 1.0]),
        ],
        [0, 1, 2, 2, 3, 0],
    )
}

/// Unit cube around the origin as 36 positions, for the sky.
pub fn sky_cube_vertices() -> [SkyVertex; 36] {
    const CORNERS: [[f32; 3]; 8] = [
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [1.0, 1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, 1.0],
        [1.0, 1.0, 1.0],
        [-1.0, 1.0, 1.0],
    ];
    const FACES: [[usize; 6]; 6] = [
        [0, 1, 2, 2, 3, 0],
        [4, 6, 5, 6, 4, 7],
        [0, 3, 7, 7, 4, 0],
        [1, 5, 6, 6, 2, 1],
        [0, 4, 5, 5, 1, 0],
        [3, 2, 6, 6, 7, 3],
    ];

    let mut vertices = [SkyVertex { pos: [0.0; 3] }; 36];
    for (slot, corner) in vertices.iter_mut().zip(FACES.iter().flatten()) {
        slot.pos = CORNERS[*corner];
    }
    vertices
}

/// Vertex data shared by every frame: the sky cube and the textured ground.
pub struct GeometryBuffers {
    sky_vertices: wgpu::Buffer,
    sky_vertex_count: u32,
    ground: Mesh,
    ground_material: wgpu::BindGroup,
    _ground_texture: Texture,
}

impl GeometryBuffers {
    pub fn new(
        device: &wgpu::Device,
        material_layout: &wgpu::BindGroupLayout,
        ground_texture: Texture,
    ) -> Self {
        let sky = sky_cube_vertices();
        let sky_vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("SkyCubeVertices"),
            contents: bytemuck::cast_slice(&sky),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let (vertices, indices) = ground_vertices();
        let ground = Mesh::from_vertices(device, "Ground", &vertices, &indices);
        let ground_material =
            material_bind_group(device, material_layout, &ground_texture, "GroundMaterial");

        log::info!("Created shared geometry (sky cube + ground quad)");

        Self {
            sky_vertices,
            sky_vertex_count: sky.len() as u32,
            ground,
            ground_material,
            _ground_texture: ground_texture,
        }
    }

    pub fn draw_ground(&self, pass: &mut wgpu::RenderPass<'_>, stage: ShadingStage) {
        if stage == ShadingStage::Lit {
            pass.set_bind_group(MATERIAL_GROUP, &self.ground_material, &[]);
        }
        self.ground.draw(pass);
    }

    pub fn draw_sky(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.sky_vertices.slice(..));
        pass.draw(0..self.sky_vertex_count, 0..1);
    }
}
