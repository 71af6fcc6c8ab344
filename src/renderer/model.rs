use std::collections::HashMap;
use std::path::Path;

use glam::{Mat3, Mat4, Vec3};

use crate::error::ModelError;
use crate::renderer::mesh::Mesh;
use crate::renderer::passes::{ShadingStage, MATERIAL_GROUP};
use crate::renderer::texture::Texture;
use crate::renderer::vertex::{v, Vertex};
use crate::scene::ModelKey;

/// Bind group layout shared by every material: base-colour texture and its sampler.
pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("MaterialLayout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
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
    })
}

pub fn material_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: &Texture,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
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
    })
}

/// CPU-side geometry of one model part.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub material: Option<usize>,
}

/// Model file formats the loader understands, picked by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelFormat {
    Obj,
    Gltf,
}

impl ModelFormat {
    pub fn from_path(path: &Path) -> Result<Self, ModelError> {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("obj") => Ok(ModelFormat::Obj),
            Some("gltf" | "glb") => Ok(ModelFormat::Gltf),
            _ => Err(ModelError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

struct ModelPart {
    mesh: Mesh,
    material: usize,
}

pub struct Model {
    parts: Vec<ModelPart>,
    materials: Vec<wgpu::BindGroup>,
    _textures: Vec<Texture>,
}

impl Model {
    /// Imports a glTF or GLB file. Node transforms are baked into the vertices.
    pub fn load_gltf(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        path: impl AsRef<Path>,
    ) -> Result<Self, ModelError> {
        let path = path.as_ref();
        log::info!("Loading model: {:?}", path);
        let (document, buffers, images) = gltf::import(path)?;

        let mut textures: Vec<Texture> = images
            .iter()
            .enumerate()
            .map(|(index, image)| match rgba8_pixels(index, image) {
                Ok(pixels) => Texture::from_rgba8(
                    device,
                    queue,
                    &pixels,
                    image.width,
                    image.height,
                    Some(&format!("ModelImage{index}")),
                ),
                Err(err) => {
                    log::warn!("{:?}: {err}. Using white.", path);
                    Texture::white(device, queue)
                }
            })
            .collect();

        // Materials without a base-colour texture get a 1x1 texture of their colour factor.
        let mut texture_for_material = Vec::new();
        for material in document.materials() {
            let pbr = material.pbr_metallic_roughness();
            let index = match pbr.base_color_texture() {
                Some(info) if info.texture().source().index() < images.len() => {
                    info.texture().source().index()
                }
                _ => {
                    let color = pbr.base_color_factor().map(|c| (c.clamp(0.0, 1.0) * 255.0) as u8);
                    textures.push(Texture::from_color(device, queue, color, "MaterialColor"));
                    textures.len() - 1
                }
            };
            texture_for_material.push(index);
        }
        textures.push(Texture::white(device, queue));
        let default_texture = textures.len() - 1;
        texture_for_material.push(default_texture);

        let materials = texture_for_material
            .iter()
            .enumerate()
            .map(|(index, texture)| {
                material_bind_group(
                    device,
                    layout,
                    &textures[*texture],
                    &format!("ModelMaterial{index}"),
                )
            })
            .collect::<Vec<_>>();

        let mut data = Vec::new();
        let roots: Vec<gltf::Node<'_>> = match document
            .default_scene()
            .or_else(|| document.scenes().next())
        {
            Some(scene) => scene.nodes().collect(),
            None => document.nodes().collect(),
        };
        for node in roots {
            collect_node(&node, Mat4::IDENTITY, &buffers, &mut data)?;
        }

        Ok(Self::assemble(device, path, &data, materials, textures))
    }

    /// Imports a Wavefront OBJ file and the MTL library it names. Diffuse maps are resolved
    /// relative to the OBJ file; materials without one use their diffuse colour.
    pub fn load_obj(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        path: impl AsRef<Path>,
    ) -> Result<Self, ModelError> {
        let path = path.as_ref();
        log::info!("Loading model: {:?}", path);
        let (data, obj_materials) = read_obj(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

        let mut textures = Vec::new();
        let mut materials = Vec::new();
        for (index, material) in obj_materials.iter().enumerate() {
            let color = diffuse_rgba(material);
            let texture = match material.diffuse_texture.as_deref() {
                Some(name) if !name.trim().is_empty() => {
                    Texture::from_path_or_color(device, queue, base_dir.join(name.trim()), color)
                }
                _ => Texture::from_color(device, queue, color, "MaterialColor"),
            };
            materials.push(material_bind_group(
                device,
                layout,
                &texture,
                &format!("ModelMaterial{index}"),
            ));
            textures.push(texture);
        }
        let white = Texture::white(device, queue);
        materials.push(material_bind_group(device, layout, &white, "ModelMaterialDefault"));
        textures.push(white);

        Ok(Self::assemble(device, path, &data, materials, textures))
    }

    /// Loads `path` with the loader its extension selects.
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        path: impl AsRef<Path>,
    ) -> Result<Self, ModelError> {
        let path = path.as_ref();
        match ModelFormat::from_path(path)? {
            ModelFormat::Obj => Self::load_obj(device, queue, layout, path),
            ModelFormat::Gltf => Self::load_gltf(device, queue, layout, path),
        }
    }

    /// Uploads the parts. The last entry of `materials` is the default for parts whose
    /// material index is missing or out of range.
    fn assemble(
        device: &wgpu::Device,
        path: &Path,
        data: &[MeshData],
        materials: Vec<wgpu::BindGroup>,
        textures: Vec<Texture>,
    ) -> Self {
        let default_material = materials.len() - 1;
        let parts = data
            .iter()
            .enumerate()
            .map(|(index, part)| ModelPart {
                mesh: Mesh::from_vertices(device, &format!("ModelPart{index}"), &part.vertices, &part.indices),
                material: part
                    .material
                    .filter(|material| *material < default_material)
                    .unwrap_or(default_material),
            })
            .collect::<Vec<_>>();

        log::info!(
            "Loaded {:?}: {} parts, {} materials",
            path,
            parts.len(),
            materials.len()
        );

        Self {
            parts,
            materials,
            _textures: textures,
        }
    }

    /// Builds a model from in-memory geometry. Every part uses a flat `color`.
    pub fn from_parts(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        parts: &[MeshData],
        color: [u8; 4],
    ) -> Self {
        let texture = Texture::from_color(device, queue, color, "PartColor");
        let material = material_bind_group(device, layout, &texture, "PartMaterial");
        let parts = parts
            .iter()
            .enumerate()
            .map(|(index, part)| ModelPart {
                mesh: Mesh::from_vertices(device, &format!("Part{index}"), &part.vertices, &part.indices),
                material: 0,
            })
            .collect();
        Self {
            parts,
            materials: vec![material],
            _textures: vec![texture],
        }
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, stage: ShadingStage) {
        for part in &self.parts {
            if stage == ShadingStage::Lit {
                pass.set_bind_group(MATERIAL_GROUP, &self.materials[part.material], &[]);
            }
            part.mesh.draw(pass);
        }
    }
}

fn collect_node(
    node: &gltf::Node<'_>,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<MeshData>,
) -> Result<(), ModelError> {
    let transform = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping mesh {} primitive {}: mode {:?} is not a triangle list",
                    mesh.index(),
                    primitive.index(),
                    primitive.mode()
                );
                continue;
            }
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
            let missing = |positions: bool| {
                if positions {
                    ModelError::MissingPositions {
                        mesh: mesh.index(),
                        primitive: primitive.index(),
                    }
                } else {
                    ModelError::MissingIndices {
                        mesh: mesh.index(),
                        primitive: primitive.index(),
                    }
                }
            };

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .ok_or_else(|| missing(true))?
                .collect();
            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|normals| normals.collect())
                .unwrap_or_default();
            let uvs: Vec<[f32; 2]> = reader
                .read_tex_coords(0)
                .map(|uvs| uvs.into_f32().collect())
                .unwrap_or_default();
            let indices: Vec<u32> = reader
                .read_indices()
                .ok_or_else(|| missing(false))?
                .into_u32()
                .collect();

            out.push(MeshData {
                vertices: bake_vertices(transform, &positions, &normals, &uvs),
                indices,
                material: primitive.material().index(),
            });
        }
    }

    for child in node.children() {
        collect_node(&child, transform, buffers, out)?;
    }
    Ok(())
}

/// Applies `transform` to positions and normals. Missing normals default to +Y and missing
/// texture coordinates to zero.
pub fn bake_vertices(
    transform: Mat4,
    positions: &[[f32; 3]],
    normals: &[[f32; 3]],
    uvs: &[[f32; 2]],
) -> Vec<Vertex> {
    let normal_matrix = Mat3::from_mat4(transform).inverse().transpose();
    positions
        .iter()
        .enumerate()
        .map(|(index, position)| {
            let position = transform.transform_point3(Vec3::from(*position));
            let normal = normals
                .get(index)
                .and_then(|n| (normal_matrix * Vec3::from(*n)).try_normalize())
                .unwrap_or(Vec3::Y);
            let uv = uvs.get(index).copied().unwrap_or([0.0, 0.0]);
            v(position.to_array(), normal.to_array(), uv)
        })
        .collect()
}

fn obj_load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        single_index: true,
        triangulate: true,
        ..Default::default()
    }
}

/// Parses an OBJ file into model parts plus its materials. A missing or broken MTL library is
/// logged and leaves every part on the default material.
pub fn read_obj(path: &Path) -> Result<(Vec<MeshData>, Vec<tobj::Material>), ModelError> {
    let (models, materials) = tobj::load_obj(path, &obj_load_options())?;
    let materials = materials.unwrap_or_else(|err| {
        log::warn!("{:?}: materials unavailable ({err})", path);
        Vec::new()
    });
    Ok((obj_mesh_data(&models), materials))
}

/// Converts tobj meshes into parts. Texture v is flipped because images are uploaded top row
/// first while OBJ puts v = 0 at the bottom.
pub fn obj_mesh_data(models: &[tobj::Model]) -> Vec<MeshData> {
    models
        .iter()
        .filter_map(|model| {
            let mesh = &model.mesh;
            if mesh.positions.is_empty() || mesh.indices.is_empty() {
                log::warn!("Skipping empty OBJ object {:?}", model.name);
                return None;
            }
            let positions: Vec<[f32; 3]> = mesh
                .positions
                .chunks_exact(3)
                .map(|p| [p[0], p[1], p[2]])
                .collect();
            let normals: Vec<[f32; 3]> = mesh
                .normals
                .chunks_exact(3)
                .map(|n| [n[0], n[1], n[2]])
                .collect();
            let uvs: Vec<[f32; 2]> = mesh
                .texcoords
                .chunks_exact(2)
                .map(|t| [t[0], 1.0 - t[1]])
                .collect();
            Some(MeshData {
                vertices: bake_vertices(Mat4::IDENTITY, &positions, &normals, &uvs),
                indices: mesh.indices.clone(),
                material: mesh.material_id,
            })
        })
        .collect()
}

/// Opaque RGBA8 of a material's diffuse colour, white when it has none.
pub fn diffuse_rgba(material: &tobj::Material) -> [u8; 4] {
    let [r, g, b] = material
        .diffuse
        .unwrap_or([1.0; 3])
        .map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
    [r, g, b, 255]
}

/// Expands a decoded glTF image into tightly packed RGBA8.
pub fn rgba8_pixels(index: usize, image: &gltf::image::Data) -> Result<Vec<u8>, ModelError> {
    use gltf::image::Format;

    let pixels = &image.pixels;
    match image.format {
        Format::R8G8B8A8 => Ok(pixels.clone()),
        Format::R8G8B8 => Ok(pixels
            .chunks_exact(3)
            .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], 255])
            .collect()),
        Format::R8G8 => Ok(pixels
            .chunks_exact(2)
            .flat_map(|la| [la[0], la[0], la[0], la[1]])
            .collect()),
        Format::R8 => Ok(pixels.iter().flat_map(|l| [*l, *l, *l, 255]).collect()),
        format => Err(ModelError::Texture { index, format }),
    }
}

/// Loaded models, keyed by the object they represent.
#[derive(Default)]
pub struct ModelLibrary {
    models: HashMap<ModelKey, Model>,
}

impl ModelLibrary {
    /// Loads every model under `resource_dir`. Failures are logged and leave that key empty.
    pub fn load_all(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        resource_dir: &Path,
    ) -> Self {
        let mut library = Self::default();
        for key in ModelKey::ALL {
            let path = resource_dir.join(key.relative_path());
            match Model::load(device, queue, layout, &path) {
                Ok(model) => library.insert(key, model),
                Err(err) => log::error!("Failed to load {:?} model from {:?}: {err}", key, path),
            }
        }
        library
    }

    pub fn insert(&mut self, key: ModelKey, model: Model) {
        self.models.insert(key, model);
    }

    pub fn get(&self, key: ModelKey) -> Option<&Model> {
        self.models.get(&key)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gltf::image::{Data, Format};

    #[test]
    fn rgb_images_gain_opaque_alpha() {
        let image = Data {
            pixels: vec![1, 2, 3, 4, 5, 6],
            format: Format::R8G8B8,
            width: 2,
            height: 1,
        };
        assert_eq!(
            rgba8_pixels(0, &image).expect("rgb is supported"),
            vec![1, 2, 3, 255, 4, 5, 6, 255]
        );
    }

    #[test]
    fn sixteen_bit_images_are_rejected() {
        let image = Data {
            pixels: vec![0; 8],
            format: Format::R16G16B16A16,
            width: 1,
            height: 1,
        };
        assert!(matches!(
            rgba8_pixels(7, &image),
            Err(ModelError::Texture { index: 7, .. })
        ));
    }

    #[test]
    fn baked_vertices_follow_node_transform() {
        let transform = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0))
            * Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let vertices = bake_vertices(
            transform,
            &[[1.0, 0.0, 0.0]],
            &[[1.0, 0.0, 0.0]],
            &[[0.25, 0.75]],
        );
        let vertex = vertices[0];
        assert!(Vec3::from(vertex.pos).abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-5));
        assert!(Vec3::from(vertex.normal).abs_diff_eq(Vec3::Y, 1e-5));
        assert_eq!(vertex.uv, [0.25, 0.75]);
    }

    #[test]
    fn missing_attributes_use_defaults() {
        let vertices = bake_vertices(Mat4::IDENTITY, &[[0.0, 1.0, 2.0]], &[], &[]);
        assert_eq!(vertices[0].normal, [0.0, 1.0, 0.0]);
        assert_eq!(vertices[0].uv, [0.0, 0.0]);
    }

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("lamplight-model-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("scratch dir");
        dir
    }

    #[test]
    fn loader_is_picked_by_extension() {
        assert_eq!(
            ModelFormat::from_path(Path::new("objects/jdm/AE86Trueno.obj")).expect("obj"),
            ModelFormat::Obj
        );
        assert_eq!(
            ModelFormat::from_path(Path::new("scene.GLB")).expect("glb"),
            ModelFormat::Gltf
        );
        assert_eq!(
            ModelFormat::from_path(Path::new("scene.gltf")).expect("gltf"),
            ModelFormat::Gltf
        );
        assert!(matches!(
            ModelFormat::from_path(Path::new("objects/lamps/lamps.fbx")),
            Err(ModelError::UnsupportedFormat { .. })
        ));
        assert!(ModelFormat::from_path(Path::new("objects/lamps/lamps")).is_err());
    }

    #[test]
    fn obj_quad_is_triangulated_with_flipped_v_and_its_material() {
        let dir = scratch_dir("quad");
        std::fs::write(
            dir.join("quad.mtl"),
            "newmtl Painted\nKd 1.0 0.5 0.0\nmap_Kd painted.png\n",
        )
        .expect("write mtl");
        std::fs::write(
            dir.join("quad.obj"),
            "mtllib quad.mtl\n\
             o Quad\n\
             v 0 0 0\nv 1 0 0\nv 1 0 -1\nv 0 0 -1\n\
             vt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\n\
             vn 0 1 0\n\
             usemtl Painted\n\
             f 1/1/1 2/2/1 3/3/1 4/4/1\n",
        )
        .expect("write obj");

        let (parts, materials) = read_obj(&dir.join("quad.obj")).expect("parse obj");
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(parts.len(), 1);
        let part = &parts[0];
        assert_eq!(part.vertices.len(), 4);
        assert_eq!(part.indices.len(), 6);
        assert!(part.indices.iter().all(|index| (*index as usize) < part.vertices.len()));
        assert_eq!(part.material, Some(0));

        let first = part.vertices[0];
        assert_eq!(first.pos, [0.0, 0.0, 0.0]);
        assert_eq!(first.normal, [0.0, 1.0, 0.0]);
        assert_eq!(first.uv, [0.0, 1.0]);

        assert_eq!(materials.len(), 1);
        assert_eq!(materials[0].diffuse_texture.as_deref(), Some("painted.png"));
        assert_eq!(diffuse_rgba(&materials[0]), [255, 128, 0, 255]);
    }

    #[test]
    fn obj_without_material_library_still_loads_geometry() {
        let dir = scratch_dir("bare");
        std::fs::write(
            dir.join("bare.obj"),
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n",
        )
        .expect("write obj");

        let (parts, materials) = read_obj(&dir.join("bare.obj")).expect("parse obj");
        let _ = std::fs::remove_dir_all(&dir);

        assert!(materials.is_empty());
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].indices, vec![0, 1, 2]);
        assert_eq!(parts[0].material, None);
        assert_eq!(parts[0].vertices[2].normal, [0.0, 1.0, 0.0]);
        assert_eq!(parts[0].vertices[2].uv, [0.0, 0.0]);
    }

    #[test]
    fn missing_obj_file_is_an_error() {
        let path = std::env::temp_dir().join("lamplight-model-missing/none.obj");
        assert!(matches!(read_obj(&path), Err(ModelError::Obj(_))));
    }

    #[test]
    fn empty_library_has_no_models() {
        let library = ModelLibrary::default();
        assert!(library.is_empty());
        assert!(library.get(ModelKey::Car).is_none());
    }
}
