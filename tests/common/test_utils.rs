use std::path::{Path, PathBuf};

use flow_scene::{
    TextureHandle, TextureUploader,
    data_structures::texture::{DecodedImage, PixelFormat, TextureKind},
};

/// Uploader that keeps what it was given instead of talking to a GPU.
#[derive(Default)]
pub(crate) struct RecordingUploader {
    pub(crate) uploads: Vec<Upload>,
}

#[allow(dead_code)]
pub(crate) struct Upload {
    pub(crate) label: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) format: PixelFormat,
    pub(crate) kind: TextureKind,
}

impl TextureUploader for RecordingUploader {
    fn upload_texture(
        &mut self,
        image: &DecodedImage,
        kind: TextureKind,
        label: &str,
    ) -> anyhow::Result<TextureHandle> {
        self.uploads.push(Upload {
            label: label.to_string(),
            width: image.width,
            height: image.height,
            format: image.format,
            kind,
        });
        Ok(TextureHandle(self.uploads.len() as u32 - 1))
    }
}

/// Scratch directory for fixture files, removed on drop.
pub(crate) struct Fixture {
    dir: PathBuf,
}

impl Fixture {
    pub(crate) fn new(name: &str) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = std::env::temp_dir().join(format!("flow-scene-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).expect("failed to create fixture directory");
        Self { dir }
    }

    pub(crate) fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    pub(crate) fn write(&self, file: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(file);
        std::fs::write(&path, contents).expect("failed to write fixture");
        path
    }

    #[allow(dead_code)]
    pub(crate) fn write_png(&self, file: &str, width: u32, height: u32) -> PathBuf {
        let path = self.path(file);
        write_rgb_png(&path, width, height);
        path
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

pub(crate) fn write_rgb_png(path: &Path, width: u32, height: u32) {
    image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 40 % 256) as u8, (y * 40 % 256) as u8, 128])
    })
        .save(path)
        .expect("failed to write png fixture");
}

#[allow(dead_code)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
        width,
        height,
        image::Rgba([10, 20, 30, 255]),
    ));
    let mut bytes = std::io::Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageFormat::Png)
        .expect("failed to encode png");
    bytes.into_inner()
}
