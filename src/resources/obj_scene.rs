//! Wavefront OBJ backend.
//!
//! OBJ has no hierarchy, so the scene is a root node with one child per
//! object, each owning exactly one mesh.

use std::path::Path;

use crate::{
    data_structures::{
        scene_graph::{RawMaterial, RawMesh, RawNode, RawScene, TextureSlot, TextureSource},
        texture::TextureKind,
    },
    error::ImportError,
    resources::{ImportOptions, UvOrigin},
};

pub fn load_scene_obj(path: &Path, options: &ImportOptions) -> Result<RawScene, ImportError> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        },
    )
    .map_err(|source| ImportError::Obj {
        path: path.to_path_buf(),
        source,
    })?;

    let materials = match materials {
        Ok(materials) => materials,
        Err(e) => {
            log::warn!(
                "Materials of {} could not be loaded ({}). Importing it without textures.",
                path.display(),
                e
            );
            Vec::new()
        }
    };
    Ok(scene_from_obj(models, materials, options))
}

pub(crate) fn scene_from_obj(
    models: Vec<tobj::Model>,
    materials: Vec<tobj::Material>,
    options: &ImportOptions,
) -> RawScene {
    let mut nodes = vec![RawNode {
        name: "root".to_string(),
        ..Default::default()
    }];
    let mut meshes = Vec::with_capacity(models.len());

    // tobj reports a file without faces as one unnamed model with no indices.
    for model in models {
        if model.mesh.indices.is_empty() {
            log::warn!("Object {} has no faces and is skipped.", model.name);
            continue;
        }
        let child = nodes.len();
        nodes[0].children.push(child);
        nodes.push(RawNode {
            name: model.name.clone(),
            meshes: vec![meshes.len()],
            children: Vec::new(),
        });
        meshes.push(to_raw_mesh(model, options));
    }

    RawScene {
        nodes,
        root: Some(0),
        incomplete: meshes.is_empty(),
        meshes,
        materials: materials.into_iter().map(to_raw_material).collect(),
    }
}

fn to_raw_mesh(model: tobj::Model, options: &ImportOptions) -> RawMesh {
    let m = model.mesh;
    let vertex_count = m.positions.len() / 3;

    let positions = m
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();

    // With `single_index` the attributes are either absent or one per position.
    let normals = (vertex_count > 0 && m.normals.len() == m.positions.len()).then(|| {
        m.normals
            .chunks_exact(3)
            .map(|n| [n[0], n[1], n[2]])
            .collect()
    });

    let mut tex_coords = Vec::new();
    if vertex_count > 0 && m.texcoords.len() == vertex_count * 2 {
        tex_coords.push(
            m.texcoords
                .chunks_exact(2)
                .map(|uv| options.uv_origin.convert(UvOrigin::BottomLeft, [uv[0], uv[1]]))
                .collect(),
        );
    }

    let faces = m
        .indices
        .chunks_exact(3)
        .map(|f| [f[0], f[1], f[2]])
        .collect();

    RawMesh {
        name: model.name,
        positions,
        normals,
        tex_coords,
        faces,
        material: m.material_id,
    }
}

fn to_raw_material(material: tobj::Material) -> RawMaterial {
    let mut textures = Vec::new();
    if let Some(path) = material.diffuse_texture {
        textures.push(TextureSlot {
            kind: TextureKind::Diffuse,
            source: TextureSource::File(path),
        });
    }
    if let Some(path) = material.specular_texture {
        textures.push(TextureSlot {
            kind: TextureKind::Specular,
            source: TextureSource::File(path),
        });
    }
    RawMaterial {
        name: material.name,
        textures,
    }
}
