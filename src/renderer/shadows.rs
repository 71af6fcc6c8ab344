use crate::error::{RenderError, ShadowError};
use crate::renderer::lights::{CubeFace, CUBE_FACE_COUNT};

pub const SHADOW_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Depth cube map for one point light: a six-layer texture with a cube view for sampling and a
/// 2D view per face for rendering.
pub struct ShadowCubemap {
    texture: wgpu::Texture,
    cube_view: wgpu::TextureView,
    face_views: Vec<wgpu::TextureView>,
    resolution: u32,
}

impl ShadowCubemap {
    fn new(device: &wgpu::Device, label: &str, resolution: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: resolution,
                height: resolution,
                depth_or_array_layers: CUBE_FACE_COUNT as u32,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SHADOW_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        let cube_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(&format!("{label}CubeView")),
            format: Some(SHADOW_FORMAT),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            aspect: wgpu::TextureAspect::DepthOnly,
            base_array_layer: 0,
            array_layer_count: Some(CUBE_FACE_COUNT as u32),
            ..Default::default()
        });

        let face_views = CubeFace::ALL
            .iter()
            .map(|face| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some(&format!("{label}Face{}", face.layer())),
                    format: Some(SHADOW_FORMAT),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    aspect: wgpu::TextureAspect::All,
                    base_array_layer: face.layer(),
                    array_layer_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();

        Self {
            texture,
            cube_view,
            face_views,
            resolution,
        }
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn cube_view(&self) -> &wgpu::TextureView {
        &self.cube_view
    }

    pub fn face_view(&self, face: CubeFace) -> &wgpu::TextureView {
        &self.face_views[face.layer() as usize]
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }
}

/// Which frame last wrote each light's cube map.
#[derive(Debug, Clone)]
pub struct ShadowFreshness {
    frame: u64,
    written: Vec<Option<u64>>,
}

impl ShadowFreshness {
    pub fn new(light_count: usize) -> Self {
        Self {
            frame: 0,
            written: vec![None; light_count],
        }
    }

    pub fn begin_frame(&mut self, frame: u64) {
        self.frame = frame;
    }

    pub fn mark_written(&mut self, light: usize) {
        if let Some(slot) = self.written.get_mut(light) {
            *slot = Some(self.frame);
        }
    }

    pub fn ensure_current(&self, light: usize) -> Result<(), RenderError> {
        match self.written.get(light) {
            Some(Some(frame)) if *frame == self.frame => Ok(()),
            _ => Err(RenderError::StaleShadowMap {
                light,
                frame: self.frame,
            }),
        }
    }
}

/// Owns the depth cube maps of all point lights and the sampler the lit pass reads them with.
pub struct ShadowCubemapManager {
    cubemaps: Vec<ShadowCubemap>,
    freshness: ShadowFreshness,
    sampler: wgpu::Sampler,
}

impl ShadowCubemapManager {
    /// Allocates `count` cube maps of `resolution`² texels per face.
    pub fn create(device: &wgpu::Device, resolution: u32, count: usize) -> Result<Self, ShadowError> {
        let max = device.limits().max_texture_dimension_2d;
        validate_resolution(resolution, max)?;

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let cubemaps: Vec<ShadowCubemap> = (0..count)
            .map(|light| ShadowCubemap::new(device, &format!("PointShadowCube{light}"), resolution))
            .collect();
        let validation = pollster::block_on(device.pop_error_scope());
        let out_of_memory = pollster::block_on(device.pop_error_scope());
        if let Some(err) = validation.or(out_of_memory) {
            return Err(ShadowError::Allocation(err.to_string()));
        }

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("PointShadowSampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        log::info!(
            "Created {} shadow cube maps at {}x{} per face",
            count,
            resolution,
            resolution
        );

        Ok(Self {
            cubemaps,
            freshness: ShadowFreshness::new(count),
            sampler,
        })
    }

    pub fn len(&self) -> usize {
        self.cubemaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cubemaps.is_empty()
    }

    pub fn cubemap(&self, light: usize) -> Option<&ShadowCubemap> {
        self.cubemaps.get(light)
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn begin_frame(&mut self, frame: u64) {
        self.freshness.begin_frame(frame);
    }

    pub fn mark_written(&mut self, light: usize) {
        self.freshness.mark_written(light);
    }

    pub fn ensure_current(&self, light: usize) -> Result<(), RenderError> {
        self.freshness.ensure_current(light)
    }
}

pub fn validate_resolution(requested: u32, max: u32) -> Result<(), ShadowError> {
    if requested == 0 || requested > max {
        return Err(ShadowError::InvalidResolution { requested, max });
    }
    Ok(())
}
