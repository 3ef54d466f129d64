//! flow-scene
//!
//! Scene import and camera control for wgpu renderers. A model file (glTF or
//! Wavefront OBJ) is parsed once, flattened into renderer-ready mesh records
//! and its textures are uploaded with at most one upload per distinct path.
//! A free-fly camera produces the view/projection pair each frame.
//!
//! High-level modules
//! - `camera`: Euler-angle camera, projection, uniform and input controller
//! - `context`: texture upload seam and the wgpu resource owner
//! - `data_structures`: mesh records, raw scene graph and texture metadata
//! - `error`: import and texture errors
//! - `resources`: format backends and the scene import session
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use camera::{Camera, CameraController, CameraMovement, CameraUniform, Projection};
pub use context::{GpuContext, TextureHandle, TextureUploader};
pub use data_structures::model::{DrawModel, MeshRecord, Model, ModelVertex};
pub use error::{ImportError, TextureMissing};
pub use resources::{ImportOptions, UvOrigin, load_model};
