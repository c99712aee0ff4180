//! Benchmarks for the texel codec and the flood kernels on the software backend

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::Vec2;
use glyphfield_sdf::pass::flood;
use glyphfield_sdf::{Bitmap, EncodedTexel, Pos, SdfRenderer, Size, codec};
use glyphfield_test_utils::{MockBackend, fixtures};

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    let vectors: Vec<Vec2> = (0..1024)
        .map(|i| Vec2::new((i % 64) as f32 / 64.0 - 0.5, (i / 64) as f32 / 16.0 - 0.5))
        .collect();
    let texels: Vec<EncodedTexel> = vectors.iter().map(|v| codec::encode(Some(*v))).collect();

    group.throughput(Throughput::Elements(vectors.len() as u64));
    group.bench_function("encode", |b| {
        b.iter(|| {
            vectors
                .iter()
                .map(|v| codec::encode(Some(black_box(*v))))
                .filter(|t| t.is_indeterminate())
                .count()
        });
    });
    group.bench_function("decode", |b| {
        b.iter(|| {
            texels
                .iter()
                .filter_map(|t| codec::decode(black_box(*t)))
                .map(|v| v.x)
                .sum::<f32>()
        });
    });

    group.finish();
}

fn bench_flood_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("flood_step");

    for size in [32u32, 64, 128] {
        let tile = Size::new(size, size);
        let mut field = vec![EncodedTexel::INDETERMINATE; tile.area()];
        field[tile.area() / 2] = EncodedTexel::ZERO;

        group.throughput(Throughput::Elements(tile.area() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &field, |b, field| {
            b.iter(|| flood::flood_step(black_box(field), tile, size / 2));
        });
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_mock");
    group.sample_size(20);

    for size in [32u32, 64] {
        let backend = Arc::new(MockBackend::new());
        let destination = backend.create_destination(size, size, wgpu::TextureFormat::R8Unorm);
        let mask = fixtures::disk(size, size, size as f32 / 2.0, size as f32 / 2.0, size as f32 / 4.0);
        let mut renderer = SdfRenderer::new(backend.clone());

        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                backend.clear_calls();
                renderer
                    .render_to_texture(
                        Bitmap::new(&mask, size, size).unwrap(),
                        &destination,
                        Pos::new(0, 0),
                        Size::new(size, size),
                    )
                    .unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_codec, bench_flood_step, bench_render);
criterion_main!(benches);
