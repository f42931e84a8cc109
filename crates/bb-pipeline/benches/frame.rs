use bb_core::Image;
use bb_pipeline::{FrameStages, PipelineConfig};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn build_gaussian_stripe(width: usize, height: usize, center: f64, sigma: f64) -> Image<u8> {
    let mut data = vec![0u8; width * height];
    for y in 0..height {
        let d = y as f64 - center;
        let v = 12.0 + 220.0 * (-(d * d) / (2.0 * sigma * sigma)).exp();
        data[y * width..(y + 1) * width].fill(v.round() as u8);
    }
    Image::from_vec(width, height, data).expect("valid image")
}

fn bench_frame_rows(c: &mut Criterion) {
    let img = build_gaussian_stripe(640, 480, 261.3, 9.0);
    let view = img.as_view();
    let cfg = PipelineConfig {
        sensor_size_mm: 4.8,
        smoothing_radius: 3,
        ..PipelineConfig::default()
    };
    let mut stages = FrameStages::new(&cfg);

    c.bench_function("bb_frame_rows_640x480", |b| {
        b.iter(|| {
            let out = stages
                .run(black_box(&view), black_box(&cfg))
                .expect("valid geometry");
            black_box(out.map(|a| a.sample.physical_offset_microns));
        });
    });
}

fn bench_frame_rows_tall(c: &mut Criterion) {
    let img = build_gaussian_stripe(64, 2048, 1400.0, 20.0);
    let view = img.as_view();
    let cfg = PipelineConfig {
        sensor_size_mm: 11.3,
        smoothing_radius: 8,
        ..PipelineConfig::default()
    };
    let mut stages = FrameStages::new(&cfg);

    c.bench_function("bb_frame_rows_64x2048", |b| {
        b.iter(|| {
            let out = stages
                .run(black_box(&view), black_box(&cfg))
                .expect("valid geometry");
            black_box(out.map(|a| a.sample.physical_offset_microns));
        });
    });
}

criterion_group!(benches, bench_frame_rows, bench_frame_rows_tall);
criterion_main!(benches);
