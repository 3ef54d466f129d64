use wgpu::util::DeviceExt;

use crate::data_structures::{
    model::{GpuMesh, MeshRecord, Model},
    texture::{self, DecodedImage, TextureKind},
};

/// Opaque handle to an uploaded texture.
///
/// Handles are only meaningful to the uploader that issued them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

/// Owner of GPU textures. The importer hands decoded pixels over and keeps
/// only the returned handle.
///
/// `kind` is the role of the slot that first referenced the image; it decides
/// whether the pixels are color (sRGB) or linear data.
pub trait TextureUploader {
    fn upload_texture(
        &mut self,
        image: &DecodedImage,
        kind: TextureKind,
        label: &str,
    ) -> anyhow::Result<TextureHandle>;
}

/// Device, queue and every texture uploaded through them.
#[derive(Debug)]
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    textures: Vec<texture::Texture>,
}

impl GpuContext {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            textures: Vec::new(),
        }
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&texture::Texture> {
        self.textures.get(handle.0 as usize)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn upload_mesh(&self, mesh: &MeshRecord) -> GpuMesh {
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Vertex Buffer", mesh.name())),
                contents: bytemuck::cast_slice(mesh.vertices()),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Index Buffer", mesh.name())),
                contents: bytemuck::cast_slice(mesh.indices()),
                usage: wgpu::BufferUsages::INDEX,
            });

        GpuMesh {
            name: mesh.name().to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: mesh.indices().len() as u32,
            bindings: mesh.texture_bindings(),
        }
    }

    pub fn upload_model(&self, model: &Model) -> Vec<GpuMesh> {
        model.meshes.iter().map(|m| self.upload_mesh(m)).collect()
    }
}

impl TextureUploader for GpuContext {
    fn upload_texture(
        &mut self,
        image: &DecodedImage,
        kind: TextureKind,
        label: &str,
    ) -> anyhow::Result<TextureHandle> {
        let handle = TextureHandle(u32::try_from(self.textures.len())?);
        let texture =
            texture::Texture::from_decoded(&self.device, &self.queue, image, kind, label)?;
        self.textures.push(texture);
        Ok(handle)
    }
}
