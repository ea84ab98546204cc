#[path = "../util/util.rs"]
mod util;

use util::images;

use std::time::Duration;

use criterion::{
    criterion_group, criterion_main, measurement::WallTime, Bencher, BenchmarkId, Criterion,
    SamplingMode,
};
use image::RgbaImage;
use packquant::{PackedHistogram, Quantizer};

fn bench(c: &mut Criterion, group: &str, mut f: impl FnMut(&mut Bencher<WallTime>, &RgbaImage)) {
    let mut group = c.benchmark_group(group);
    group
        .sample_size(30)
        .noise_threshold(0.05)
        .sampling_mode(SamplingMode::Flat)
        .warm_up_time(Duration::from_millis(500));

    for (path, image) in images() {
        let (width, height) = image.dimensions();
        let pixels = width * height;
        let mut w = 480;
        let mut h = 270;
        let mut next_width = w * 2;
        let mut next_height = h * 2;
        while next_width * next_height < pixels {
            let image = image::imageops::thumbnail(image, w, h);
            group.bench_with_input(BenchmarkId::new(path, format!("{w}x{h}")), &image, &mut f);
            w = next_width;
            h = next_height;
            next_width *= 2;
            next_height *= 2;
        }
        group.bench_with_input(
            BenchmarkId::new(path, format!("{width}x{height}")),
            image,
            &mut f,
        );
    }
}

fn histogram_full(c: &mut Criterion) {
    bench(c, "histogram_full", |b, image| {
        b.iter(|| PackedHistogram::new(image));
    });
}

fn histogram_subsampled(c: &mut Criterion) {
    let mut quantizer = Quantizer::new();
    quantizer.subsample(true);
    bench(c, "histogram_subsampled", |b, image| {
        b.iter(|| quantizer.histogram(image));
    });
}

criterion_group!(benches, histogram_full, histogram_subsampled);
criterion_main!(benches);
