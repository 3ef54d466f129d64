use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use image::{ImageFormat, load_from_memory, load_from_memory_with_format};

use crate::{
    context::TextureUploader,
    data_structures::{
        scene_graph::{RawMaterial, TextureSource},
        texture::{DecodedImage, TextureKind, TextureRef},
    },
    error::TextureMissing,
};

/// Textures uploaded during one import, keyed by the exact path string the
/// material used. Guarantees at most one upload per distinct path.
///
/// Paths that failed to load are remembered as well so they are reported once
/// and not decoded again.
#[derive(Debug, Default)]
pub struct TextureCache {
    loaded: HashMap<String, TextureRef>,
    failed: HashSet<String>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&TextureRef> {
        self.loaded.get(path)
    }

    pub fn has_failed(&self, path: &str) -> bool {
        self.failed.contains(path)
    }

    /// Number of distinct textures that were uploaded.
    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextureRef> {
        self.loaded.values()
    }

    /// Resolve one texture slot.
    ///
    /// A cached texture is reused with the requested kind so that an image
    /// shared between a diffuse and a specular slot keeps a single upload. The
    /// GPU format follows the kind of the first slot.
    pub fn resolve(
        &mut self,
        source: &TextureSource,
        kind: TextureKind,
        directory: &Path,
        uploader: &mut impl TextureUploader,
    ) -> Result<Option<TextureRef>, TextureMissing> {
        let key = source.key();
        if let Some(cached) = self.loaded.get(key) {
            log::debug!("Reusing texture {} for {:?}", key, kind);
            return Ok(Some(TextureRef {
                kind,
                ..cached.clone()
            }));
        }
        if self.failed.contains(key) {
            return Ok(None);
        }

        let uploaded = decode_texture(source, directory).and_then(|image| {
            uploader
                .upload_texture(&image, kind, key)
                .map_err(|e| TextureMissing::Upload {
                    path: key.to_string(),
                    message: format!("{e:#}"),
                })
        });
        match uploaded {
            Ok(handle) => {
                log::debug!("Uploaded texture {} as {:?}", key, handle);
                let texture = TextureRef {
                    handle,
                    kind,
                    path: key.to_string(),
                };
                self.loaded.insert(key.to_string(), texture.clone());
                Ok(Some(texture))
            }
            Err(missing) => {
                self.failed.insert(key.to_string());
                Err(missing)
            }
        }
    }
}

/// Decode the image behind a texture source. File paths and URIs are resolved
/// relative to `directory`; a URI is percent-decoded first.
pub fn decode_texture(
    source: &TextureSource,
    directory: &Path,
) -> Result<DecodedImage, TextureMissing> {
    let img = match source {
        TextureSource::File(path) => {
            image::open(directory.join(path)).map_err(|source| TextureMissing::Decode {
                path: path.clone(),
                source,
            })?
        }
        TextureSource::Uri(uri) => {
            let path = urlencoding::decode(uri)
                .map_err(|_| TextureMissing::Unsupported { path: uri.clone() })?;
            image::open(directory.join(&*path)).map_err(|source| TextureMissing::Decode {
                path: uri.clone(),
                source,
            })?
        }
        TextureSource::Embedded {
            key,
            bytes,
            mime_type,
        } => {
            let result = match mime_type.as_deref().and_then(ImageFormat::from_mime_type) {
                Some(format) => load_from_memory_with_format(bytes, format),
                None => load_from_memory(bytes),
            };
            result.map_err(|source| TextureMissing::Decode {
                path: key.clone(),
                source,
            })?
        }
        TextureSource::Unsupported(key) => {
            return Err(TextureMissing::Unsupported { path: key.clone() });
        }
    };
    Ok(DecodedImage::from_dynamic(img))
}

/// Resolve every slot of `kind` in a material. Slots that fail are logged,
/// pushed onto `missing` and left out of the result.
pub fn load_material_textures(
    material: &RawMaterial,
    kind: TextureKind,
    directory: &Path,
    cache: &mut TextureCache,
    uploader: &mut impl TextureUploader,
    missing: &mut Vec<TextureMissing>,
) -> Vec<TextureRef> {
    let mut textures = Vec::new();
    for source in material.textures(kind) {
        match cache.resolve(source, kind, directory, uploader) {
            Ok(Some(texture)) => textures.push(texture),
            Ok(None) => {}
            Err(e) => {
                log::warn!("{e}. Skipping it for material {}.", material.name);
                missing.push(e);
            }
        }
    }
    textures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TextureHandle;

    #[derive(Default)]
    struct Recorder {
        labels: Vec<String>,
        kinds: Vec<TextureKind>,
    }

    impl TextureUploader for Recorder {
        fn upload_texture(
            &mut self,
            _image: &DecodedImage,
            kind: TextureKind,
            label: &str,
        ) -> anyhow::Result<TextureHandle> {
            self.labels.push(label.to_string());
            self.kinds.push(kind);
            Ok(TextureHandle(self.labels.len() as u32 - 1))
        }
    }

    /// Uploader for a device that takes nothing larger than 2x2.
    struct Rejecting;

    impl TextureUploader for Rejecting {
        fn upload_texture(
            &mut self,
            image: &DecodedImage,
            _kind: TextureKind,
            _label: &str,
        ) -> anyhow::Result<TextureHandle> {
            crate::data_structures::texture::check_extent(image.width, image.height, 2)?;
            Ok(TextureHandle(0))
        }
    }

    fn png_bytes() -> Vec<u8> {
        let img = image::DynamicImage::new_rgba8(4, 4);
        let mut bytes = std::io::Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    fn embedded(key: &str) -> TextureSource {
        TextureSource::Embedded {
            key: key.to_string(),
            bytes: png_bytes(),
            mime_type: Some("image/png".to_string()),
        }
    }

    #[test]
    fn same_key_is_uploaded_once() {
        let mut cache = TextureCache::new();
        let mut uploader = Recorder::default();
        let dir = Path::new(".");
        let a = cache
            .resolve(&embedded("*0"), TextureKind::Diffuse, dir, &mut uploader)
            .unwrap()
            .unwrap();
        let b = cache
            .resolve(&embedded("*0"), TextureKind::Specular, dir, &mut uploader)
            .unwrap()
            .unwrap();
        assert_eq!(uploader.labels, vec!["*0"]);
        assert_eq!(uploader.kinds, vec![TextureKind::Diffuse]);
        assert_eq!(a.handle, b.handle);
        assert_eq!(b.kind, TextureKind::Specular);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failure_is_reported_once() {
        let mut cache = TextureCache::new();
        let mut uploader = Recorder::default();
        let source = TextureSource::File("does/not/exist.png".to_string());
        let dir = Path::new(".");
        let first = cache.resolve(&source, TextureKind::Diffuse, dir, &mut uploader);
        assert!(matches!(first, Err(TextureMissing::Decode { .. })));
        let second = cache.resolve(&source, TextureKind::Diffuse, dir, &mut uploader);
        assert!(matches!(second, Ok(None)));
        assert!(cache.has_failed("does/not/exist.png"));
        assert!(uploader.labels.is_empty());
    }

    #[test]
    fn rejected_upload_is_missing_not_fatal() {
        let mut cache = TextureCache::new();
        let material = RawMaterial {
            name: "huge".to_string(),
            textures: vec![crate::data_structures::scene_graph::TextureSlot {
                kind: TextureKind::Diffuse,
                source: embedded("*0"),
            }],
        };
        let mut missing = Vec::new();
        let textures = load_material_textures(
            &material,
            TextureKind::Diffuse,
            Path::new("."),
            &mut cache,
            &mut Rejecting,
            &mut missing,
        );
        assert!(textures.is_empty());
        assert_eq!(missing.len(), 1);
        match &missing[0] {
            TextureMissing::Upload { path, message } => {
                assert_eq!(path, "*0");
                assert!(message.contains("device limit"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(cache.has_failed("*0"));
    }

    #[test]
    fn uri_is_percent_decoded_but_keyed_raw() {
        let dir = std::env::temp_dir().join(format!("flow-scene-uri-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("my tex.png"), png_bytes()).unwrap();

        let mut cache = TextureCache::new();
        let mut uploader = Recorder::default();
        let source = TextureSource::Uri("my%20tex.png".to_string());
        let texture = cache
            .resolve(&source, TextureKind::Diffuse, &dir, &mut uploader)
            .unwrap()
            .unwrap();
        assert_eq!(texture.path, "my%20tex.png");
        assert_eq!(uploader.labels, vec!["my%20tex.png"]);

        let literal = TextureSource::File("my%20tex.png".to_string());
        let err = decode_texture(&literal, &dir).unwrap_err();
        assert!(matches!(err, TextureMissing::Decode { .. }));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn unsupported_sources_are_missing() {
        let source = TextureSource::Unsupported("data:image/png;base64,...".to_string());
        let err = decode_texture(&source, Path::new(".")).unwrap_err();
        assert_eq!(err.path(), "data:image/png;base64,...");
    }

    #[test]
    fn embedded_png_decodes_as_rgba() {
        let img = decode_texture(&embedded("*3"), Path::new(".")).unwrap();
        assert_eq!((img.width, img.height), (4, 4));
        assert_eq!(img.pixels.len(), 64);
    }
}
