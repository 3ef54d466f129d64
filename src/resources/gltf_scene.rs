//! glTF 2.0 backend.
//!
//! Every primitive becomes one raw mesh and a node owns the raw meshes of its
//! glTF mesh. The root nodes of the default scene hang below a synthetic root
//! so that a scene with several roots still has a single entry point.

use std::ops::Range;
use std::path::Path;

use gltf::mesh::Mode;
use log::warn;

use crate::{
    data_structures::{
        scene_graph::{RawMaterial, RawMesh, RawNode, RawScene, TextureSlot, TextureSource},
        texture::TextureKind,
    },
    error::ImportError,
    resources::{ImportOptions, UvOrigin, model_directory},
};

pub fn load_scene_gltf(path: &Path, options: &ImportOptions) -> Result<RawScene, ImportError> {
    let gltf_error = |source: gltf::Error| ImportError::Gltf {
        path: path.to_path_buf(),
        source,
    };
    let gltf::Gltf { document, blob } = gltf::Gltf::open(path).map_err(gltf_error)?;
    let directory = model_directory(path);
    let buffers =
        gltf::import_buffers(&document, Some(directory.as_path()), blob).map_err(gltf_error)?;
    Ok(scene_from_document(&document, &buffers, options))
}

pub(crate) fn scene_from_document(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    options: &ImportOptions,
) -> RawScene {
    let materials = document
        .materials()
        .map(|material| to_raw_material(&material, buffers))
        .collect();

    let mut meshes = Vec::new();
    let mut mesh_ranges: Vec<Range<usize>> = Vec::with_capacity(document.meshes().len());
    for mesh in document.meshes() {
        let start = meshes.len();
        for primitive in mesh.primitives() {
            if let Some(raw) = to_raw_mesh(&mesh, &primitive, buffers, options) {
                meshes.push(raw);
            }
        }
        mesh_ranges.push(start..meshes.len());
    }

    // glTF node `i` is stored at `i + 1`, index 0 is the synthetic root.
    let mut nodes = vec![RawNode {
        name: "root".to_string(),
        ..Default::default()
    }];
    for node in document.nodes() {
        nodes.push(RawNode {
            name: node
                .name()
                .map_or_else(|| format!("node {}", node.index()), str::to_string),
            meshes: node
                .mesh()
                .and_then(|mesh| mesh_ranges.get(mesh.index()).cloned())
                .map(|range| range.collect())
                .unwrap_or_default(),
            children: node.children().map(|child| child.index() + 1).collect(),
        });
    }

    let root = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .map(|scene| {
            nodes[0].children = scene.nodes().map(|node| node.index() + 1).collect();
            0
        });

    RawScene {
        nodes,
        root,
        incomplete: meshes.is_empty(),
        meshes,
        materials,
    }
}

fn to_raw_mesh(
    mesh: &gltf::Mesh,
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    options: &ImportOptions,
) -> Option<RawMesh> {
    let name = mesh
        .name()
        .map_or_else(|| format!("mesh {}", mesh.index()), str::to_string);
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let Some(positions) = reader.read_positions() else {
        warn!("Primitive {} of {} has no positions and is skipped.", primitive.index(), name);
        return None;
    };
    let positions: Vec<[f32; 3]> = positions.collect();
    let normals = reader.read_normals().map(|normals| normals.collect());

    let mut tex_coords = Vec::new();
    while let Some(channel) = reader.read_tex_coords(tex_coords.len() as u32) {
        tex_coords.push(
            channel
                .into_f32()
                .map(|uv| options.uv_origin.convert(UvOrigin::TopLeft, uv))
                .collect::<Vec<_>>(),
        );
    }

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    let faces = match primitive.mode() {
        Mode::Triangles => indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect(),
        Mode::TriangleStrip => strip_to_triangles(&indices),
        Mode::TriangleFan => fan_to_triangles(&indices),
        mode => {
            warn!(
                "Primitive {} of {} uses {:?} and is skipped; only triangles are imported.",
                primitive.index(),
                name,
                mode
            );
            return None;
        }
    };

    Some(RawMesh {
        name,
        positions,
        normals,
        tex_coords,
        faces,
        material: primitive.material().index(),
    })
}

fn strip_to_triangles(indices: &[u32]) -> Vec<[u32; 3]> {
    indices
        .windows(3)
        .enumerate()
        .map(|(i, w)| {
            if i % 2 == 0 {
                [w[0], w[1], w[2]]
            } else {
                [w[1], w[0], w[2]]
            }
        })
        .collect()
}

fn fan_to_triangles(indices: &[u32]) -> Vec<[u32; 3]> {
    match indices.split_first() {
        Some((&center, rest)) => rest.windows(2).map(|w| [center, w[0], w[1]]).collect(),
        None => Vec::new(),
    }
}

fn to_raw_material(material: &gltf::Material, buffers: &[gltf::buffer::Data]) -> RawMaterial {
    let mut textures = Vec::new();
    if let Some(info) = material.pbr_metallic_roughness().base_color_texture() {
        textures.push(TextureSlot {
            kind: TextureKind::Diffuse,
            source: texture_source(&info.texture(), buffers),
        });
    }
    if let Some(info) = material.specular().and_then(|s| s.specular_texture()) {
        textures.push(TextureSlot {
            kind: TextureKind::Specular,
            source: texture_source(&info.texture(), buffers),
        });
    }
    RawMaterial {
        name: material.name().unwrap_or("default material").to_string(),
        textures,
    }
}

/// Images in buffer views and data URIs are keyed `*<image index>`, external
/// images by their URI as written in the file.
fn texture_source(texture: &gltf::Texture, buffers: &[gltf::buffer::Data]) -> TextureSource {
    let image = texture.source();
    let embedded_key = format!("*{}", image.index());
    match image.source() {
        gltf::image::Source::Uri { uri, mime_type } => match uri.strip_prefix("data:") {
            Some(data) => data_uri_source(embedded_key, data, mime_type),
            None if uri.contains(':') => {
                warn!("Image URI {} uses an unsupported scheme.", uri);
                TextureSource::Unsupported(uri.to_string())
            }
            None => TextureSource::Uri(uri.to_string()),
        },
        gltf::image::Source::View { view, mime_type } => {
            let range = view.offset()..view.offset() + view.length();
            match buffers
                .get(view.buffer().index())
                .and_then(|data| data.0.get(range))
            {
                Some(bytes) => TextureSource::Embedded {
                    key: embedded_key,
                    bytes: bytes.to_vec(),
                    mime_type: Some(mime_type.to_string()),
                },
                None => TextureSource::Unsupported(embedded_key),
            }
        }
    }
}

/// Decode the payload of a `data:[<media type>];base64,<data>` URI.
fn data_uri_source(key: String, data: &str, mime_type: Option<&str>) -> TextureSource {
    let Some((media_type, payload)) = data.split_once(";base64,") else {
        warn!("Image {} is a data URI without base64 payload.", key);
        return TextureSource::Unsupported(key);
    };
    match base64::decode(payload) {
        Ok(bytes) => TextureSource::Embedded {
            key,
            bytes,
            mime_type: mime_type
                .or(Some(media_type).filter(|m| !m.is_empty()))
                .map(str::to_string),
        },
        Err(e) => {
            warn!("Image {} has a malformed data URI: {}", key, e);
            TextureSource::Unsupported(key)
        }
    }
}
