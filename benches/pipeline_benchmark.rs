use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use pixelgrid::{run_pipeline, Image, PipelineParams, SampleMode};
use rand::Rng;

fn checkerboard(width: u32, height: u32, cell: u32) -> Vec<u8> {
    let mut rgba = vec![0u8; (width * height * 4) as usize];
    for y in 0..height {
        for x in 0..width {
            let on = ((x / cell) + (y / cell)) % 2 == 0;
            let v = if on { 255 } else { 0 };
            let idx = ((y * width + x) * 4) as usize;
            rgba[idx] = v;
            rgba[idx + 1] = v;
            rgba[idx + 2] = v;
            rgba[idx + 3] = 255;
        }
    }
    rgba
}

fn benchmark_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_pipeline");

    for &size in &[128u32, 256, 512] {
        let cell = 8;
        let rgba = checkerboard(size, size, cell);
        let image = Image::new(size, size, rgba).unwrap();
        let params = PipelineParams::default()
            .with_sigma(1.2)
            .with_detection_range(4, 16)
            .with_sampling(SampleMode::Average, 1.0, 1);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| run_pipeline(&image, &params, None).unwrap());
        });
    }

    group.finish();
}

fn benchmark_direct_mode(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_pipeline_direct");

    for &size in &[128u32, 256, 512] {
        let rgba = checkerboard(size, size, 8);
        let image = Image::new(size, size, rgba).unwrap();
        let params = PipelineParams::default()
            .with_pixel_size(8)
            .with_sampling(SampleMode::Direct, 1.0, 1);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| run_pipeline(&image, &params, None).unwrap());
        });
    }

    group.finish();
}

fn noisy_rgba(width: u32, height: u32) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..(width * height * 4)).map(|i| if i % 4 == 3 { 255 } else { rng.gen() }).collect()
}

fn benchmark_worst_case_noise(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_pipeline_noise");
    group.sample_size(20);

    let size = 256u32;
    let rgba = noisy_rgba(size, size);
    let image = Image::new(size, size, rgba).unwrap();
    let params = PipelineParams::default()
        .with_sigma(1.2)
        .with_detection_range(4, 32)
        .with_sampling(SampleMode::Average, 1.0, 1);

    group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
        b.iter(|| {
            // Random noise can legitimately yield EmptyDetection; the bench
            // measures wall-clock either way.
            let _ = run_pipeline(&image, &params, None);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_full_pipeline,
    benchmark_direct_mode,
    benchmark_worst_case_noise
);
criterion_main!(benches);
