//! Format-neutral scene graph.
//!
//! Backends in [`crate::resources`] translate a parsed file into a
//! [`RawScene`]: an arena of nodes, meshes and materials that mirrors what the
//! parser reported, before anything is flattened or uploaded. The importer
//! only ever reads it.

use std::collections::HashSet;

use log::warn;

use crate::data_structures::texture::TextureKind;

#[derive(Clone, Debug, Default)]
pub struct RawScene {
    pub nodes: Vec<RawNode>,
    pub root: Option<usize>,
    pub meshes: Vec<RawMesh>,
    pub materials: Vec<RawMaterial>,
    /// Set by a backend when the parser could not produce a full scene.
    pub incomplete: bool,
}

#[derive(Clone, Debug, Default)]
pub struct RawNode {
    pub name: String,
    pub meshes: Vec<usize>,
    pub children: Vec<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct RawMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    /// UV channels in the order the parser reported them.
    pub tex_coords: Vec<Vec<[f32; 2]>>,
    /// Triangles. Backends triangulate before handing a mesh over.
    pub faces: Vec<[u32; 3]>,
    pub material: Option<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TextureSource {
    /// Path relative to the model's directory.
    File(String),
    /// Percent-encoded URI reference relative to the model's directory.
    Uri(String),
    /// Encoded image bytes stored inside the model file.
    Embedded {
        key: String,
        bytes: Vec<u8>,
        mime_type: Option<String>,
    },
    /// Referenced by the file but in a form that cannot be read.
    Unsupported(String),
}

impl TextureSource {
    /// String identifying the image within one model, used to deduplicate uploads.
    pub fn key(&self) -> &str {
        match self {
            TextureSource::File(path) => path,
            TextureSource::Uri(uri) => uri,
            TextureSource::Embedded { key, .. } => key,
            TextureSource::Unsupported(key) => key,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextureSlot {
    pub kind: TextureKind,
    pub source: TextureSource,
}

#[derive(Clone, Debug, Default)]
pub struct RawMaterial {
    pub name: String,
    pub textures: Vec<TextureSlot>,
}

impl RawMaterial {
    /// Texture slots of one kind, in material order.
    pub fn textures(&self, kind: TextureKind) -> impl Iterator<Item = &TextureSource> {
        self.textures
            .iter()
            .filter(move |slot| slot.kind == kind)
            .map(|slot| &slot.source)
    }
}

impl RawScene {
    /// Depth-first preorder walk starting at the root node.
    pub fn walk(&self) -> SceneWalk<'_> {
        SceneWalk {
            scene: self,
            stack: self.root.into_iter().collect(),
            visited: HashSet::new(),
        }
    }

    pub fn node(&self, idx: usize) -> Option<&RawNode> {
        self.nodes.get(idx)
    }

    /// Material of a mesh, or `None` if it has none or the index is out of range.
    pub fn material_of(&self, mesh: &RawMesh) -> Option<&RawMaterial> {
        let idx = mesh.material?;
        let material = self.materials.get(idx);
        if material.is_none() {
            warn!(
                "Mesh {} references material {} but only {} exist; importing it without textures.",
                mesh.name,
                idx,
                self.materials.len()
            );
        }
        material
    }
}

/// Iterator over `(node index, node)` pairs in depth-first preorder.
///
/// Children are visited in the order they are listed. Out-of-range child
/// indices are yielded as-is so the caller can reject them; a node reachable
/// through more than one parent is only yielded the first time.
pub struct SceneWalk<'a> {
    scene: &'a RawScene,
    stack: Vec<usize>,
    visited: HashSet<usize>,
}

impl<'a> Iterator for SceneWalk<'a> {
    type Item = (usize, Option<&'a RawNode>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let idx = self.stack.pop()?;
            if !self.visited.insert(idx) {
                warn!("Node {} is reachable more than once; visiting it only once.", idx);
                continue;
            }
            let node = self.scene.nodes.get(idx);
            if let Some(node) = node {
                self.stack.extend(node.children.iter().rev());
            }
            return Some((idx, node));
        }
    }
}
