//! Texture resource management for wgpu
//!
//! Creates the render targets of the scene pass (multisampled color and depth,
//! single-sample resolve target) and the sampled textures loaded from disk.

use std::path::Path;

use image::{imageops, ImageBuffer, Rgba};

use crate::error::{Result, TabletopError};

/// GPU texture resource containing texture, view, and sampler
#[derive(Clone)]
pub struct TextureResource {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

/// CPU-side RGBA8 pixels ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureData {
    /// Decodes an image file into RGBA8.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|source| TabletopError::Texture {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        Ok(Self {
            width: image.width(),
            height: image.height(),
            pixels: image.into_raw(),
        })
    }

    /// Downscales so neither side exceeds `max_dimension`, keeping the aspect ratio.
    pub fn fit_within(self, max_dimension: u32) -> Self {
        let largest = self.width.max(self.height);
        if largest <= max_dimension || max_dimension == 0 {
            return self;
        }

        let scale = max_dimension as f64 / largest as f64;
        let side = |value: u32| ((value as f64 * scale).round() as u32).clamp(1, max_dimension);
        let (width, height) = (side(self.width), side(self.height));

        let source: Option<ImageBuffer<Rgba<u8>, &[u8]>> =
            ImageBuffer::from_raw(self.width, self.height, self.pixels.as_slice());
        let resized = source
            .map(|view| imageops::resize(&view, width, height, imageops::FilterType::Triangle));
        match resized {
            Some(image) => Self {
                width,
                height,
                pixels: image.into_raw(),
            },
            None => self,
        }
    }

    /// A single pixel of `color`.
    pub fn solid(color: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: color.to_vec(),
        }
    }
}

/// Converts a linear color in 0..1 to RGBA8, clamping out-of-range values.
pub fn color_to_rgba8(color: [f32; 3], alpha: f32) -> [u8; 4] {
    let channel = |value: f32| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
    [
        channel(color[0]),
        channel(color[1]),
        channel(color[2]),
        channel(alpha),
    ]
}

impl TextureResource {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
    /// Format of the offscreen scene color target and its resolve texture.
    pub const SCENE_COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
    /// Sampled textures are stored as-is, without sRGB decoding.
    pub const SAMPLED_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    /// Creates a depth buffer for a `width` x `height` target.
    pub fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        sample_count: u32,
        label: &str,
    ) -> Self {
        Self::create_render_target(
            device,
            width,
            height,
            Self::DEPTH_FORMAT,
            sample_count,
            label,
        )
    }

    /// Creates a color or depth attachment.
    ///
    /// Single-sample targets are also bindable so later passes can sample them.
    pub fn create_render_target(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        sample_count: u32,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };

        let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;
        if sample_count == 1 {
            usage |= wgpu::TextureUsages::TEXTURE_BINDING;
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
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

    /// Uploads RGBA8 pixels into a sampled texture.
    pub fn create_from_rgba_data_with_filter(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &TextureData,
        label: &str,
        filter_mode: wgpu::FilterMode,
        address_mode: wgpu::AddressMode,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::SAMPLED_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * data.width),
                rows_per_image: Some(data.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: filter_mode,
            min_filter: filter_mode,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Loads an image file with linear filtering.
    pub fn from_file(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: impl AsRef<Path>,
        address_mode: wgpu::AddressMode,
    ) -> Result<Self> {
        let path = path.as_ref();
        let data = TextureData::load(path)?;
        let max_dimension = device.limits().max_texture_dimension_2d;
        if data.width.max(data.height) > max_dimension {
            log::warn!(
                "{} is {}x{}, downscaling to fit {} px",
                path.display(),
                data.width,
                data.height,
                max_dimension
            );
        }
        let data = data.fit_within(max_dimension);
        log::debug!(
            "Loaded texture {} ({}x{})",
            path.display(),
            data.width,
            data.height
        );
        Ok(Self::create_from_rgba_data_with_filter(
            device,
            queue,
            &data,
            &path.display().to_string(),
            wgpu::FilterMode::Linear,
            address_mode,
        ))
    }

    /// Loads `path`, or falls back to a single `fallback` pixel with a warning.
    pub fn from_file_or_solid(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: impl AsRef<Path>,
        address_mode: wgpu::AddressMode,
        fallback: [u8; 4],
    ) -> Self {
        let path = path.as_ref();
        match Self::from_file(device, queue, path, address_mode) {
            Ok(texture) => texture,
            Err(e) => {
                log::warn!("{}; using a flat fallback texture", e);
                Self::solid(device, queue, fallback, &path.display().to_string())
            }
        }
    }

    /// A 1x1 texture of `color`.
    pub fn solid(device: &wgpu::Device, queue: &wgpu::Queue, color: [u8; 4], label: &str) -> Self {
        Self::create_from_rgba_data_with_filter(
            device,
            queue,
            &TextureData::solid(color),
            label,
            wgpu::FilterMode::Nearest,
            wgpu::AddressMode::Repeat,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_to_rgba8_clamps_and_rounds() {
        assert_eq!(color_to_rgba8([0.0, 0.5, 1.0], 1.0), [0, 128, 255, 255]);
        assert_eq!(color_to_rgba8([-1.0, 2.0, 0.2], 0.0), [0, 255, 51, 0]);
    }

    #[test]
    fn test_solid_data_is_single_pixel() {
        let data = TextureData::solid([1, 2, 3, 4]);
        assert_eq!((data.width, data.height), (1, 1));
        assert_eq!(data.pixels, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_missing_image_reports_path() {
        let path = std::env::temp_dir().join("tabletop-no-such-texture.png");
        match TextureData::load(&path) {
            Err(TabletopError::Texture { path: reported, .. }) => assert_eq!(reported, path),
            Err(other) => panic!("unexpected error {}", other),
            Ok(_) => panic!("loading a missing file succeeded"),
        }
    }

    #[test]
    fn test_oversized_data_is_downscaled_to_limit() {
        let data = TextureData {
            width: 8,
            height: 4,
            pixels: vec![200; 8 * 4 * 4],
        };
        let fitted = data.fit_within(4);
        assert_eq!((fitted.width, fitted.height), (4, 2));
        assert_eq!(fitted.pixels.len(), 4 * 2 * 4);
        assert!(fitted.pixels.iter().all(|&p| p.abs_diff(200) <= 1));

        let small = TextureData::solid([9, 9, 9, 9]);
        assert_eq!(small.clone().fit_within(4), small);
    }
}
