use criterion::{black_box, criterion_group, criterion_main, Criterion};
use phantom_snr::{analyze, run_stages, AnalysisConfig, Metadata, PixelGrid};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 12-bit disk phantom on a noisy background.
fn make_phantom(size: u32, seed: u64) -> PixelGrid {
    let mut rng = StdRng::seed_from_u64(seed);
    let c = size as f32 / 2.0;
    let r = size as f32 * 0.35;
    let mut data = Vec::with_capacity((size * size) as usize);
    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 - c;
            let dy = y as f32 - c;
            let v = if dx * dx + dy * dy <= r * r {
                rng.gen_range(2800..3200)
            } else {
                rng.gen_range(0..60)
            };
            data.push(v);
        }
    }
    PixelGrid::from_raw(size, size, data, 12).expect("fixture dimensions are consistent")
}

fn bench_stages(c: &mut Criterion) {
    let grid = make_phantom(256, 1);
    let config = AnalysisConfig::default();
    c.bench_function("stages_256", |b| {
        b.iter(|| black_box(run_stages(black_box(&grid), &config)))
    });
}

fn bench_analyze(c: &mut Criterion) {
    let grid = make_phantom(256, 2);
    let config = AnalysisConfig::default();
    let metadata = Metadata::new("se_mc", 90.0);
    c.bench_function("analyze_256", |b| {
        b.iter(|| black_box(analyze(black_box(&grid), &metadata, &config)))
    });
}

criterion_group!(pipeline, bench_stages, bench_analyze);
criterion_main!(pipeline);
