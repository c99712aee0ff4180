//! Render the distance field of a grayscale mask and save it as a PNG.
//!
//! ```text
//! cargo run -p glyphfield-sdf --example render_png --features image -- [mask.png] [out.png]
//! ```
//!
//! Without an input a ring is generated. Logging and profiling follow
//! `GLYPHFIELD_LOG` and `GLYPHFIELD_PROFILE`.

use std::sync::Arc;

use glyphfield_core::config::Config;
use glyphfield_render::{GpuReadback, GraphicsContext};
use glyphfield_sdf::{
    Bitmap, Pos, SdfBackend, SdfRenderer, TextureDesc, TextureRole, WgpuBackend,
};

const RING_SIZE: u32 = 256;

/// A ring with a 64 texel outer radius and a 32 texel inner radius.
fn ring() -> image::GrayImage {
    let center = RING_SIZE as f32 / 2.0;
    image::GrayImage::from_fn(RING_SIZE, RING_SIZE, |x, y| {
        let d = (x as f32 - center).hypot(y as f32 - center);
        image::Luma([if (32.0..=64.0).contains(&d) { 255 } else { 0 }])
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    Config::from_env().apply();

    let mut args = std::env::args().skip(1);
    let mask = match args.next() {
        Some(path) => image::open(&path)?.into_luma8(),
        None => ring(),
    };
    let output = args.next().unwrap_or_else(|| "sdf.png".to_string());

    let context = GraphicsContext::new_owned_sync()?;
    let backend = Arc::new(WgpuBackend::new(context.clone()));
    let mut renderer = SdfRenderer::new(backend.clone());

    let bitmap = Bitmap::from_gray_image(&mask)?;
    let destination = backend.create_texture(&TextureDesc {
        label: "render_png_destination",
        size: bitmap.size(),
        format: wgpu::TextureFormat::R8Unorm,
        role: TextureRole::Destination,
    })?;

    let stats = renderer.render_to_texture(bitmap, &destination, Pos::new(0, 0), bitmap.size())?;
    tracing::info!(
        width = bitmap.width(),
        height = bitmap.height(),
        passes = stats.total_passes(),
        "Rendered distance field"
    );

    GpuReadback::from_texture(&context, &destination)?.save_png(&context, &output)?;
    tracing::info!("Saved {}", output);

    Ok(())
}
