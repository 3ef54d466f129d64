use std::path::{Path, PathBuf};

use crate::{
    context::TextureUploader,
    data_structures::{
        model::{MeshRecord, Model},
        scene_graph::{RawMesh, RawScene},
        texture::TextureKind,
    },
    error::{ImportError, TextureMissing},
    resources::texture::{TextureCache, load_material_textures},
};

/**
 * This module contains all logic for loading meshes and textures from external files.
 *
 * A file is first parsed by a format backend into a `RawScene`, which an
 * `ImportSession` then flattens into mesh records while uploading textures.
 */
pub mod gltf_scene;
pub mod mesh;
pub mod obj_scene;
pub mod texture;

/// Corner of the image that `v = 0` addresses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UvOrigin {
    /// First row of the image, as WGPU samples and glTF stores coordinates.
    #[default]
    TopLeft,
    /// Last row of the image, as OpenGL samples and OBJ stores coordinates.
    BottomLeft,
}

impl UvOrigin {
    /// Convert a coordinate stored with origin `stored` to this origin.
    pub fn convert(self, stored: UvOrigin, [u, v]: [f32; 2]) -> [f32; 2] {
        if self == stored { [u, v] } else { [u, 1.0 - v] }
    }
}

/// Preprocessing applied while a file is parsed.
#[derive(Clone, Debug, Default)]
pub struct ImportOptions {
    /// Origin the renderer samples with. Backends flip V (`v' = 1 - v`) when
    /// their format stores coordinates the other way up.
    pub uv_origin: UvOrigin,
}

/// Import a model file: parse it, flatten its scene depth-first and upload
/// every referenced texture once.
///
/// Fails without returning any mesh if the scene is unreadable, incomplete or
/// lacks a root node. Textures that cannot be loaded only drop their slot and
/// are listed in [`Model::missing_textures`].
pub fn load_model(
    path: impl AsRef<Path>,
    uploader: &mut impl TextureUploader,
    options: &ImportOptions,
) -> Result<Model, ImportError> {
    let path = path.as_ref();
    let result = load_scene(path, options).and_then(|scene| {
        let mut session = ImportSession::new(path);
        let meshes = session.process_scene(&scene, uploader)?;
        Ok(session.finish(meshes))
    });
    match &result {
        Ok(model) => log::info!(
            "Loaded {}: {} meshes, {} vertices, {} textures ({} missing)",
            path.display(),
            model.meshes.len(),
            model.vertex_count(),
            model.textures_loaded.len(),
            model.missing_textures.len()
        ),
        Err(e) => log::error!("Import of {} failed: {}", path.display(), e),
    }
    result
}

/// Parse a model file into a raw scene, picking the backend by file extension.
pub fn load_scene(path: &Path, options: &ImportOptions) -> Result<RawScene, ImportError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("obj") => obj_scene::load_scene_obj(path, options),
        Some("gltf") | Some("glb") => gltf_scene::load_scene_gltf(path, options),
        _ => Err(ImportError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Directory textures of a model are resolved against.
pub fn model_directory(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// State of one import: the texture cache and the texture slots that failed.
///
/// The cache lives exactly as long as the session, so two imports never share
/// uploads.
#[derive(Debug)]
pub struct ImportSession {
    source: PathBuf,
    directory: PathBuf,
    cache: TextureCache,
    missing: Vec<TextureMissing>,
}

impl ImportSession {
    pub fn new(source: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
            directory: model_directory(source),
            cache: TextureCache::new(),
            missing: Vec::new(),
        }
    }

    pub fn cache(&self) -> &TextureCache {
        &self.cache
    }

    pub fn missing_textures(&self) -> &[TextureMissing] {
        &self.missing
    }

    /// Flatten a scene into mesh records in depth-first preorder, a node's own
    /// meshes before those of its children.
    ///
    /// The node graph is validated before anything is uploaded, so an error
    /// leaves the uploader untouched.
    pub fn process_scene(
        &mut self,
        scene: &RawScene,
        uploader: &mut impl TextureUploader,
    ) -> Result<Vec<MeshRecord>, ImportError> {
        let order = self.mesh_order(scene)?;
        Ok(order
            .into_iter()
            .map(|idx| self.process_mesh(scene, &scene.meshes[idx], uploader))
            .collect())
    }

    fn mesh_order(&self, scene: &RawScene) -> Result<Vec<usize>, ImportError> {
        if scene.incomplete {
            return Err(ImportError::Incomplete(self.source.clone()));
        }
        if scene.root.and_then(|root| scene.node(root)).is_none() {
            return Err(ImportError::MissingRoot(self.source.clone()));
        }

        let mut order = Vec::new();
        for (idx, node) in scene.walk() {
            // Children are checked below before the walk can reach them.
            let Some(node) = node else { continue };
            for &mesh in &node.meshes {
                if mesh >= scene.meshes.len() {
                    return Err(ImportError::DanglingMesh {
                        node: idx,
                        mesh,
                        count: scene.meshes.len(),
                    });
                }
                order.push(mesh);
            }
            if let Some(&child) = node.children.iter().find(|&&c| c >= scene.nodes.len()) {
                return Err(ImportError::DanglingNode {
                    node: idx,
                    child,
                    count: scene.nodes.len(),
                });
            }
        }
        Ok(order)
    }

    /// Convert one mesh. Diffuse textures come before specular ones.
    pub fn process_mesh(
        &mut self,
        scene: &RawScene,
        mesh: &RawMesh,
        uploader: &mut impl TextureUploader,
    ) -> MeshRecord {
        let vertices = mesh::load_vertices(mesh);
        let indices = mesh::load_indices(mesh);

        let mut textures = Vec::new();
        if let Some(material) = scene.material_of(mesh) {
            for kind in [TextureKind::Diffuse, TextureKind::Specular] {
                textures.extend(load_material_textures(
                    material,
                    kind,
                    &self.directory,
                    &mut self.cache,
                    uploader,
                    &mut self.missing,
                ));
            }
        }

        MeshRecord::new(mesh.name.clone(), vertices, indices, textures)
    }

    pub fn finish(self, meshes: Vec<MeshRecord>) -> Model {
        Model {
            meshes,
            directory: self.directory,
            textures_loaded: self.cache,
            missing_textures: self.missing,
        }
    }
}
