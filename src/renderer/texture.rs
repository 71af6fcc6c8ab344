use std::path::Path;

use crate::error::TextureError;

/// Colour format of every sampled texture. The surface is linear too, so colours pass through
/// unchanged.
pub const COLOR_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

#[derive(Debug)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Texture {
    pub fn from_path(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: impl AsRef<Path>,
    ) -> Result<Self, TextureError> {
        let path = path.as_ref();
        log::info!("Loading texture: {:?}", path);

        let rgba = load_rgba8(path)?;
        let (width, height) = rgba.dimensions();
        Ok(Self::from_rgba8(
            device,
            queue,
            &rgba,
            width,
            height,
            path.to_str(),
        ))
    }

    /// Uploads tightly packed RGBA8 pixels.
    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &[u8],
        width: u32,
        height: u32,
        label: Option<&str>,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        write_layer(queue, &texture, 0, data, width, height);

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label,
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// A 1x1 texture of a single colour.
    pub fn from_color(device: &wgpu::Device, queue: &wgpu::Queue, rgba: [u8; 4], label: &str) -> Self {
        Self::from_rgba8(device, queue, &rgba, 1, 1, Some(label))
    }

    pub fn white(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::from_color(device, queue, [255, 255, 255, 255], "WhiteTexture")
    }

    /// Loads `path`, or logs the failure and returns a 1x1 `fallback` texture.
    pub fn from_path_or_color(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: impl AsRef<Path>,
        fallback: [u8; 4],
    ) -> Self {
        Self::from_path(device, queue, path).unwrap_or_else(|err| {
            log::error!("{err}. Using a flat colour instead.");
            Self::from_color(device, queue, fallback, "FallbackTexture")
        })
    }
}

/// Six-layer colour texture viewed as a cube, used for the sky.
#[derive(Debug)]
pub struct CubeTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl CubeTexture {
    /// Loads the faces in layer order (+X, -X, +Y, -Y, +Z, -Z). All faces must be square and
    /// share one size.
    pub fn from_faces<P: AsRef<Path>>(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces: &[P; 6],
    ) -> Result<Self, TextureError> {
        let mut images = Vec::with_capacity(faces.len());
        for path in faces {
            log::info!("Loading sky face: {:?}", path.as_ref());
            images.push(load_rgba8(path.as_ref())?);
        }

        let expected = images[0].width();
        for (face, image) in images.iter().enumerate() {
            let (width, height) = image.dimensions();
            if width != expected || height != expected {
                return Err(TextureError::InvalidCubeFace {
                    face,
                    width,
                    height,
                    expected,
                });
            }
        }

        let layers: Vec<&[u8]> = images.iter().map(|image| image.as_raw().as_slice()).collect();
        Ok(Self::from_layers(device, queue, &layers, expected))
    }

    /// Loads the faces, or logs the failure and returns a flat-colour cube.
    pub fn from_faces_or_color<P: AsRef<Path>>(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces: &[P; 6],
        fallback: [u8; 4],
    ) -> Self {
        Self::from_faces(device, queue, faces).unwrap_or_else(|err| {
            log::error!("Sky cube unavailable ({err}). Using a flat colour instead.");
            Self::from_color(device, queue, fallback)
        })
    }

    pub fn from_color(device: &wgpu::Device, queue: &wgpu::Queue, rgba: [u8; 4]) -> Self {
        let layers = [&rgba[..]; 6];
        Self::from_layers(device, queue, &layers, 1)
    }

    fn from_layers(device: &wgpu::Device, queue: &wgpu::Queue, layers: &[&[u8]], size: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("SkyCube"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (layer, data) in layers.iter().enumerate() {
            write_layer(queue, &texture, layer as u32, data, size, size);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("SkyCubeView"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            array_layer_count: Some(6),
            ..Default::default()
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("SkyCubeSampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }
}

fn load_rgba8(path: &Path) -> Result<image::RgbaImage, TextureError> {
    image::open(path)
        .map(|image| image.to_rgba8())
        .map_err(|source| TextureError::Image {
            path: path.to_path_buf(),
            source,
        })
}

fn write_layer(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    layer: u32,
    data: &[u8],
    width: u32,
    height: u32,
) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: 0,
                y: 0,
                z: layer,
            },
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_image_reports_its_path() {
        match load_rgba8(Path::new("no/such/image.png")) {
            Err(TextureError::Image { path, .. }) => {
                assert_eq!(path, Path::new("no/such/image.png"));
            }
            other => panic!("expected image error, got {other:?}"),
        }
    }
}
