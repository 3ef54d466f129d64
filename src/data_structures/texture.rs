//! Texture metadata and GPU texture creation.
//!
//! This module provides the CPU side of a texture ([`DecodedImage`], its mip
//! chain and [`PixelFormat`]), the [`TextureRef`] records attached to meshes,
//! and [`Texture`], a wrapper around the WGPU resources an upload produces.

use std::borrow::Cow;

use anyhow::*;
use image::{DynamicImage, GenericImageView, ImageBuffer, imageops::FilterType};

use crate::context::TextureHandle;

/// Semantic role of a texture inside a material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Diffuse,
    Specular,
}

impl TextureKind {
    /// Uniform name prefix used when binding textures of this kind, e.g. `texture_diffuse`.
    pub fn uniform_prefix(&self) -> &'static str {
        match self {
            TextureKind::Diffuse => "texture_diffuse",
            TextureKind::Specular => "texture_specular",
        }
    }
}

/// An uploaded texture as seen by a mesh.
///
/// `path` is the string the material used to reference the image. It is the
/// deduplication key of the import session, not necessarily a file system path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureRef {
    pub handle: TextureHandle,
    pub kind: TextureKind,
    pub path: String,
}

/// Pixel layout of a decoded image, selected from its channel count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Red,
    Rgb,
    Rgba,
}

impl PixelFormat {
    pub fn channels(&self) -> usize {
        match self {
            PixelFormat::Red => 1,
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }

    /// Format used on the GPU. There is no 8-bit RGB format in WGPU, so RGB is
    /// stored as RGBA. Only diffuse maps hold sRGB colors; specular maps are
    /// sampled as linear data.
    pub fn wgpu_format(&self, kind: TextureKind) -> wgpu::TextureFormat {
        match (self, kind) {
            (PixelFormat::Red, _) => wgpu::TextureFormat::R8Unorm,
            (_, TextureKind::Diffuse) => wgpu::TextureFormat::Rgba8UnormSrgb,
            (_, TextureKind::Specular) => wgpu::TextureFormat::Rgba8Unorm,
        }
    }

    fn gpu_bytes_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::Red => 1,
            PixelFormat::Rgb | PixelFormat::Rgba => 4,
        }
    }
}

/// 8-bit image data ready to be uploaded.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: Vec<u8>,
}

/// One level of a mip chain. Level 0 is the full-size image.
#[derive(Clone, Debug, PartialEq)]
pub struct MipLevel {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Convert a decoded image, keeping 1, 3 and 4 channel layouts and
    /// converting everything else (grey + alpha, 16-bit, float) to 8-bit RGBA.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        let (width, height) = img.dimensions();
        let (format, pixels) = match img.color().channel_count() {
            1 => (PixelFormat::Red, img.into_luma8().into_raw()),
            3 => (PixelFormat::Rgb, img.into_rgb8().into_raw()),
            _ => (PixelFormat::Rgba, img.into_rgba8().into_raw()),
        };
        Self {
            width,
            height,
            format,
            pixels,
        }
    }

    fn to_dynamic(&self) -> Result<DynamicImage> {
        let (w, h) = (self.width, self.height);
        let pixels = self.pixels.clone();
        let img = match self.format {
            PixelFormat::Red => ImageBuffer::from_raw(w, h, pixels).map(DynamicImage::ImageLuma8),
            PixelFormat::Rgb => ImageBuffer::from_raw(w, h, pixels).map(DynamicImage::ImageRgb8),
            PixelFormat::Rgba => ImageBuffer::from_raw(w, h, pixels).map(DynamicImage::ImageRgba8),
        };
        img.ok_or_else(|| {
            anyhow!(
                "pixel buffer of {} bytes does not match a {}x{} {:?} image",
                self.pixels.len(),
                w,
                h,
                self.format
            )
        })
    }

    /// Build the full mip chain down to 1x1, filtering every level from the
    /// full-size image.
    pub fn mip_chain(&self) -> Result<Vec<MipLevel>> {
        let base = self.to_dynamic()?;
        let count = mip_level_count(self.width, self.height);
        let mut levels = Vec::with_capacity(count as usize);
        levels.push(MipLevel {
            width: self.width,
            height: self.height,
            pixels: self.pixels.clone(),
        });
        for level in 1..count {
            let width = (self.width >> level).max(1);
            let height = (self.height >> level).max(1);
            let scaled = base.resize_exact(width, height, FilterType::Triangle);
            levels.push(MipLevel {
                width,
                height,
                pixels: scaled.into_bytes(),
            });
        }
        Ok(levels)
    }
}

/// Number of levels in a full mip chain: `floor(log2(max(w, h))) + 1`.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

fn gpu_pixels(format: PixelFormat, pixels: &[u8]) -> Cow<'_, [u8]> {
    match format {
        PixelFormat::Rgb => Cow::Owned(
            pixels
                .chunks_exact(3)
                .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], 255])
                .collect(),
        ),
        PixelFormat::Red | PixelFormat::Rgba => Cow::Borrowed(pixels),
    }
}

/// A GPU texture with a view and its sampler.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

/// Reject sizes the device cannot create. WGPU reports those as validation
/// errors to the uncaptured error handler, which panics by default.
pub fn check_extent(width: u32, height: u32, max_dimension: u32) -> Result<()> {
    ensure!(width > 0 && height > 0, "texture has an empty {}x{} extent", width, height);
    ensure!(
        width <= max_dimension && height <= max_dimension,
        "{}x{} exceeds the device limit of {} texels per side",
        width,
        height,
        max_dimension
    );
    Ok(())
}

impl Texture {
    /// Upload an image together with its full mip chain.
    ///
    /// Every texture gets the same sampling policy: repeat addressing on both
    /// axes, linear magnification and trilinear minification.
    pub fn from_decoded(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &DecodedImage,
        kind: TextureKind,
        label: &str,
    ) -> Result<Self> {
        check_extent(img.width, img.height, device.limits().max_texture_dimension_2d)
            .with_context(|| format!("cannot upload {}", label))?;
        let levels = img.mip_chain()?;
        let format = img.format.wgpu_format(kind);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: img.width,
                height: img.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let bytes_per_pixel = img.format.gpu_bytes_per_pixel();
        for (mip_level, level) in levels.iter().enumerate() {
            let data = gpu_pixels(img.format, &level.pixels);
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: mip_level as u32,
                    origin: wgpu::Origin3d::ZERO,
                },
                &data,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_pixel * level.width),
                    rows_per_image: Some(level.height),
                },
                wgpu::Extent3d {
                    width: level.width,
                    height: level.height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = create_trilinear_sampler(device);

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }
}

pub fn create_trilinear_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("trilinear repeat sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        ..Default::default()
    })
}
