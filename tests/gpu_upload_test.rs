#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
fn headless_context() -> flow_scene::GpuContext {
    futures::executor::block_on(async {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::new_without_display_handle());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await
            .expect("no adapter available");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .expect("failed to create device");
        flow_scene::GpuContext::new(device, queue)
    })
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_upload_full_mip_chain() {
    use flow_scene::{
        TextureUploader,
        data_structures::texture::{DecodedImage, PixelFormat, TextureKind},
    };

    let mut ctx = headless_context();
    let image = DecodedImage {
        width: 16,
        height: 4,
        format: PixelFormat::Rgb,
        pixels: vec![200; 16 * 4 * 3],
    };
    let handle = ctx.upload_texture(&image, TextureKind::Diffuse, "striped").unwrap();
    let texture = ctx.texture(handle).unwrap();
    assert_eq!(texture.texture.mip_level_count(), 5);
    assert_eq!(texture.texture.format(), wgpu::TextureFormat::Rgba8UnormSrgb);

    let red = DecodedImage {
        width: 3,
        height: 3,
        format: PixelFormat::Red,
        pixels: vec![1; 9],
    };
    let second = ctx.upload_texture(&red, TextureKind::Specular, "mask").unwrap();
    assert_ne!(handle, second);
    assert_eq!(ctx.texture(second).unwrap().texture.format(), wgpu::TextureFormat::R8Unorm);
    assert_eq!(ctx.texture_count(), 2);

    let shine = ctx.upload_texture(&image, TextureKind::Specular, "shine").unwrap();
    assert_eq!(ctx.texture(shine).unwrap().texture.format(), wgpu::TextureFormat::Rgba8Unorm);
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_reject_texture_above_device_limit() {
    use flow_scene::{
        TextureUploader,
        data_structures::texture::{DecodedImage, PixelFormat, TextureKind},
    };

    let mut ctx = headless_context();
    let width = ctx.device.limits().max_texture_dimension_2d + 1;
    let wide = DecodedImage {
        width,
        height: 1,
        format: PixelFormat::Red,
        pixels: vec![0; width as usize],
    };
    let err = ctx.upload_texture(&wide, TextureKind::Diffuse, "wide").unwrap_err();
    assert!(format!("{err:#}").contains("device limit"));
    assert_eq!(ctx.texture_count(), 0);
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_upload_imported_meshes() {
    use crate::common::test_utils::Fixture;
    use flow_scene::{ImportOptions, load_model};

    let fixture = Fixture::new("gpu-obj");
    fixture.write(
        "tri.obj",
        "mtllib tri.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nusemtl m\nf 1/1 2/2 3/3\n",
    );
    fixture.write("tri.mtl", "newmtl m\nmap_Kd tri.png\n");
    fixture.write_png("tri.png", 4, 4);

    let mut ctx = headless_context();
    let model = load_model(fixture.path("tri.obj"), &mut ctx, &ImportOptions::default()).unwrap();
    let meshes = ctx.upload_model(&model);
    assert_eq!(meshes.len(), 1);
    assert_eq!(meshes[0].num_elements, 3);
    assert_eq!(meshes[0].bindings[0].name, "texture_diffuse1");
    assert!(ctx.texture(meshes[0].bindings[0].handle).is_some());
    assert_eq!(
        meshes[0].vertex_buffer.size(),
        (3 * std::mem::size_of::<flow_scene::ModelVertex>()) as u64
    );
}
