use criterion::{black_box, criterion_group, criterion_main, Criterion};
use relief::{NormalMode, Terrain, TerrainConfig};

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("terrain-generation");
    group.sample_size(10);

    let config = TerrainConfig {
        seed: 1234.into(),
        size: 512,
        ..Default::default()
    };
    group.bench_function("terrain gen", |b| {
        b.iter(|| Terrain::generate(black_box(config.clone())))
    });

    let smooth = TerrainConfig {
        normals: NormalMode::Smooth,
        ..config
    };
    group.bench_function("terrain gen (smooth normals)", |b| {
        b.iter(|| Terrain::generate(black_box(smooth.clone())))
    });
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
