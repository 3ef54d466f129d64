//! Engine data structures: meshes, textures and the raw scene graph.
//!
//! - `model` contains mesh records, their GPU counterparts and the draw trait
//! - `scene_graph` is the format-neutral scene produced by the file backends
//! - `texture` contains texture metadata, decoded images and GPU textures

pub mod model;
pub mod scene_graph;
pub mod texture;
