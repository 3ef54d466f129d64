//! Renderer-ready meshes.
//!
//! [`MeshRecord`] is the flattened CPU representation produced by the
//! importer. [`GpuMesh`] is the same mesh after its buffers were created on
//! the device, drawn through [`DrawModel`].

use crate::{
    context::TextureHandle,
    data_structures::texture::{TextureKind, TextureRef},
    error::TextureMissing,
    resources::texture::TextureCache,
};

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl ModelVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Binding of one texture to a named shader slot, e.g. `texture_diffuse1`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureBinding {
    pub name: String,
    pub handle: TextureHandle,
}

/// One mesh of an imported scene: a triangle list and the textures it samples.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshRecord {
    name: String,
    vertices: Vec<ModelVertex>,
    indices: Vec<u32>,
    textures: Vec<TextureRef>,
}

impl MeshRecord {
    pub fn new(
        name: String,
        vertices: Vec<ModelVertex>,
        indices: Vec<u32>,
        textures: Vec<TextureRef>,
    ) -> Self {
        Self {
            name,
            vertices,
            indices,
            textures,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[ModelVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn textures(&self) -> &[TextureRef] {
        &self.textures
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Shader slot names for the textures of this mesh. Every kind is counted
    /// separately starting at 1: `texture_diffuse1`, `texture_diffuse2`,
    /// `texture_specular1`, ...
    pub fn texture_bindings(&self) -> Vec<TextureBinding> {
        let mut diffuse = 0;
        let mut specular = 0;
        self.textures
            .iter()
            .map(|texture| {
                let n = match texture.kind {
                    TextureKind::Diffuse => {
                        diffuse += 1;
                        diffuse
                    }
                    TextureKind::Specular => {
                        specular += 1;
                        specular
                    }
                };
                TextureBinding {
                    name: format!("{}{}", texture.kind.uniform_prefix(), n),
                    handle: texture.handle,
                }
            })
            .collect()
    }
}

/// Result of importing one model file.
#[derive(Debug)]
pub struct Model {
    pub meshes: Vec<MeshRecord>,
    /// Directory texture paths were resolved against.
    pub directory: std::path::PathBuf,
    /// Every texture uploaded while importing, keyed by its source path.
    pub textures_loaded: TextureCache,
    /// Texture slots that were dropped.
    pub missing_textures: Vec<TextureMissing>,
}

impl Model {
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.vertices().len()).sum()
    }
}

/// A mesh whose vertex and index buffers live on the GPU.
#[derive(Debug)]
pub struct GpuMesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub bindings: Vec<TextureBinding>,
}

pub trait DrawModel {
    /// Bind the mesh buffers and draw all of its triangles once.
    ///
    /// Textures from [`GpuMesh::bindings`] have to be bound by the caller since
    /// their bind group layout belongs to the pipeline.
    fn draw_mesh(&mut self, mesh: &GpuMesh);

    fn draw_meshes(&mut self, meshes: &[GpuMesh]) {
        for mesh in meshes {
            self.draw_mesh(mesh);
        }
    }
}

impl DrawModel for wgpu::RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &GpuMesh) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.num_elements, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture(handle: u32, kind: TextureKind, path: &str) -> TextureRef {
        TextureRef {
            handle: TextureHandle(handle),
            kind,
            path: path.to_string(),
        }
    }

    #[test]
    fn bindings_are_numbered_per_kind() {
        let mesh = MeshRecord::new(
            "crate".to_string(),
            vec![],
            vec![],
            vec![
                texture(0, TextureKind::Diffuse, "a.png"),
                texture(1, TextureKind::Diffuse, "b.png"),
                texture(2, TextureKind::Specular, "c.png"),
            ],
        );
        let names: Vec<_> = mesh
            .texture_bindings()
            .into_iter()
            .map(|b| (b.name, b.handle.0))
            .collect();
        assert_eq!(
            names,
            vec![
                ("texture_diffuse1".to_string(), 0),
                ("texture_diffuse2".to_string(), 1),
                ("texture_specular1".to_string(), 2),
            ]
        );
    }

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<ModelVertex>(), 32);
        let layout = ModelVertex::desc();
        assert_eq!(layout.array_stride, 32);
        assert_eq!(layout.attributes[1].offset, 12);
        assert_eq!(layout.attributes[2].offset, 24);
    }
}
