use crate::data_structures::{model::ModelVertex, scene_graph::RawMesh};

/// Flatten a raw mesh into vertices.
///
/// Normals are copied only if the mesh has them and are left at zero
/// otherwise; nothing is generated. Texture coordinates come from the first
/// UV channel or default to `(0, 0)`. Other channels are ignored.
pub fn load_vertices(mesh: &RawMesh) -> Vec<ModelVertex> {
    let normals = mesh.normals.as_deref();
    let tex_coords = mesh.tex_coords.first();
    mesh.positions
        .iter()
        .enumerate()
        .map(|(i, &position)| ModelVertex {
            position,
            normal: normals
                .and_then(|n| n.get(i))
                .copied()
                .unwrap_or_default(),
            tex_coords: tex_coords
                .and_then(|uv| uv.get(i))
                .copied()
                .unwrap_or_default(),
        })
        .collect()
}

/// Indices of all faces in source order, three per triangle.
pub fn load_indices(mesh: &RawMesh) -> Vec<u32> {
    mesh.faces.iter().flatten().copied().collect()
}
