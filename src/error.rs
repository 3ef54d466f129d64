//! Error types surfaced by scene import.
//!
//! [`ImportError`] aborts a whole load. [`TextureMissing`] only drops a single
//! texture slot and is collected next to the imported meshes.

use std::path::PathBuf;

use thiserror::Error;

/// A model file could not be turned into a complete scene.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unsupported model format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("failed to read glTF scene {}: {source}", path.display())]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("failed to read OBJ scene {}: {source}", path.display())]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("scene {} is incomplete", .0.display())]
    Incomplete(PathBuf),

    #[error("scene {} has no root node", .0.display())]
    MissingRoot(PathBuf),

    #[error("node {node} references mesh {mesh}, but the scene has {count} meshes")]
    DanglingMesh {
        node: usize,
        mesh: usize,
        count: usize,
    },

    #[error("node {node} references child {child}, but the scene has {count} nodes")]
    DanglingNode {
        node: usize,
        child: usize,
        count: usize,
    },
}

/// A texture slot that was skipped during import.
#[derive(Debug, Error)]
pub enum TextureMissing {
    #[error("texture failed to load at path {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("texture {path} has a source that cannot be read")]
    Unsupported { path: String },

    #[error("texture {path} could not be uploaded: {message}")]
    Upload { path: String, message: String },
}

impl TextureMissing {
    /// The cache key of the texture that failed.
    pub fn path(&self) -> &str {
        match self {
            TextureMissing::Decode { path, .. }
            | TextureMissing::Unsupported { path }
            | TextureMissing::Upload { path, .. } => path,
        }
    }
}
