//! wgpu backend against the software backend.
//!
//! Run with: cargo test -p glyphfield-sdf --test gpu_tests -- --ignored

use std::sync::Arc;

use glyphfield_render::{GpuTexture, GraphicsContext};
use glyphfield_sdf::{
    Bitmap, Pos, Rect, SdfBackend, SdfError, SdfRenderer, Size, TextureDesc, TextureRole,
    WgpuBackend,
};
use glyphfield_test_utils::{MockBackend, fixtures};

fn gpu_backend() -> Arc<WgpuBackend> {
    let context = GraphicsContext::new_owned_sync().expect("GPU required");
    Arc::new(WgpuBackend::new(context))
}

fn gpu_destination(backend: &WgpuBackend, width: u32, height: u32) -> GpuTexture {
    backend
        .create_texture(&TextureDesc {
            label: "gpu_test_destination",
            size: Size::new(width, height),
            format: wgpu::TextureFormat::R8Unorm,
            role: TextureRole::Destination,
        })
        .unwrap()
}

fn mock_render(mask: &[u8], width: u32, height: u32) -> Vec<u8> {
    let backend = Arc::new(MockBackend::new());
    let destination = backend.create_destination(width, height, wgpu::TextureFormat::R8Unorm);
    SdfRenderer::new(backend.clone())
        .render_to_texture(
            Bitmap::new(mask, width, height).unwrap(),
            &destination,
            Pos::new(0, 0),
            Size::new(width, height),
        )
        .unwrap();
    backend.texture_bytes(&destination)
}

fn assert_close(gpu: &[u8], cpu: &[u8]) {
    assert_eq!(gpu.len(), cpu.len());
    for (i, (g, c)) in gpu.iter().zip(cpu).enumerate() {
        assert!(g.abs_diff(*c) <= 1, "texel {}: gpu {} cpu {}", i, g, c);
    }
}

#[test]
#[ignore] // Requires GPU
fn test_gpu_matches_software_backend() {
    let backend = gpu_backend();
    let mut renderer = SdfRenderer::new(backend.clone());

    let cases = [
        (fixtures::single_pixel(32, 32, 11, 20), 32, 32),
        (fixtures::filled_rect(32, 32, Rect::new(5, 7, 13, 9)), 32, 32),
        (fixtures::disk(48, 30, 20.0, 14.0, 6.0), 48, 30),
        (fixtures::half_plane(64, 64), 64, 64),
    ];

    for (mask, width, height) in &cases {
        let destination = gpu_destination(&backend, *width, *height);
        renderer
            .render_to_texture(
                Bitmap::new(mask, *width, *height).unwrap(),
                &destination,
                Pos::new(0, 0),
                Size::new(*width, *height),
            )
            .unwrap();

        let gpu = backend.read_texture(&destination).unwrap();
        assert_close(&gpu, &mock_render(mask, *width, *height));
    }
}

#[test]
#[ignore] // Requires GPU
fn test_gpu_fields_match_software_backend() {
    let mask = fixtures::filled_rect(16, 16, Rect::new(3, 4, 6, 5));
    let bitmap = Bitmap::new(&mask, 16, 16).unwrap();

    let gpu = SdfRenderer::new(gpu_backend()).compute_fields(bitmap).unwrap();
    let cpu = SdfRenderer::new(Arc::new(MockBackend::new()))
        .compute_fields(bitmap)
        .unwrap();

    assert_eq!(gpu.positive(), cpu.positive());
    assert_eq!(gpu.negative(), cpu.negative());
}

#[test]
#[ignore] // Requires GPU
fn test_gpu_region_leaves_surroundings() {
    let backend = gpu_backend();
    let destination = gpu_destination(&backend, 32, 32);
    backend.write_texture(&destination, &[42; 32 * 32]).unwrap();

    let mask = fixtures::single_pixel(8, 8, 4, 4);
    SdfRenderer::new(backend.clone())
        .render_to_texture(
            Bitmap::new(&mask, 8, 8).unwrap(),
            &destination,
            Pos::new(12, 4),
            Size::new(8, 8),
        )
        .unwrap();

    let output = backend.read_texture(&destination).unwrap();
    let region = Rect::new(12, 4, 8, 8);
    for y in 0..32 {
        for x in 0..32 {
            if !region.contains(x, y) {
                assert_eq!(output[(y * 32 + x) as usize], 42, "({}, {})", x, y);
            }
        }
    }
    assert_eq!(output[(8 * 32 + 16) as usize], 255);
}

#[test]
#[ignore] // Requires GPU
fn test_gpu_pipelines_cached() {
    let backend = gpu_backend();
    let destination = gpu_destination(&backend, 8, 8);
    let mask = fixtures::full(8, 8);
    let mut renderer = SdfRenderer::new(backend.clone());

    for _ in 0..3 {
        renderer
            .render_to_texture(
                Bitmap::new(&mask, 8, 8).unwrap(),
                &destination,
                Pos::new(0, 0),
                Size::new(8, 8),
            )
            .unwrap();
    }
    // seed, flood and one insert target format
    assert_eq!(backend.pipeline_count(), 3);
}

#[test]
#[ignore] // Requires GPU
fn test_gpu_oversized_tile() {
    let backend = gpu_backend();
    let max = backend.max_texture_dimension();
    let destination = gpu_destination(&backend, 4, 4);
    let mask = vec![0u8; max as usize + 1];

    let err = SdfRenderer::new(backend.clone())
        .render_to_texture(
            Bitmap::new(&mask, max + 1, 1).unwrap(),
            &destination,
            Pos::new(0, 0),
            Size::new(4, 1),
        )
        .unwrap_err();
    assert!(matches!(err, SdfError::TileTooLarge { .. }));
}
