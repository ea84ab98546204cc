#[path = "../util/util.rs"]
mod util;

use util::{images, to_histograms};

use std::time::Duration;

use criterion::{
    criterion_group, criterion_main, measurement::WallTime, Bencher, BenchmarkId, Criterion,
    SamplingMode,
};
use packquant::{
    indexer::{CachingIndexer, ExhaustiveIndexer, LruIndexer},
    median_cut, remap, MedianCutOptions, PaletteSize, Quantizer, SplitStrategy,
};

fn bench<Input>(
    c: &mut Criterion,
    group: &str,
    inputs: &[(String, Input)],
    mut f: impl FnMut(&mut Bencher<WallTime>, &(PaletteSize, &Input)),
) {
    let mut group = c.benchmark_group(group);
    group
        .sample_size(30)
        .noise_threshold(0.05)
        .sampling_mode(SamplingMode::Flat)
        .warm_up_time(Duration::from_millis(500));

    for (k, secs) in [(64u16, 3), (16, 2), (256, 4)] {
        let k = PaletteSize::try_from(k).unwrap();
        group.measurement_time(Duration::from_secs(secs));
        for (path, input) in inputs {
            group.bench_with_input(BenchmarkId::new(k.to_string(), path), &(k, input), &mut f);
        }
    }
}

fn median_cut_palette(c: &mut Criterion) {
    let histograms = to_histograms(images());
    bench(c, "median_cut_palette", &histograms, |b, &(k, histogram)| {
        b.iter(|| median_cut::build_palette(histogram, k, &MedianCutOptions::new()).unwrap());
    });
}

fn median_cut_palette_half_sum(c: &mut Criterion) {
    let histograms = to_histograms(images());
    let options = MedianCutOptions::new().split_strategy(SplitStrategy::HalfSum);
    bench(c, "median_cut_palette_half_sum", &histograms, |b, &(k, histogram)| {
        b.iter(|| median_cut::build_palette(histogram, k, &options).unwrap());
    });
}

fn remap_mapped(c: &mut Criterion) {
    bench(c, "remap_mapped", images(), |b, &(k, image)| {
        let output = Quantizer::new().max_colors(k).build_color_indexer(image).unwrap();
        b.iter(|| remap(image, &output.indexer));
    });
}

fn remap_lru(c: &mut Criterion) {
    bench(c, "remap_lru", images(), |b, &(k, image)| {
        let palette = Quantizer::new().max_colors(k).quantize(image).unwrap().0;
        b.iter(|| {
            let lru = LruIndexer::new(ExhaustiveIndexer::new(palette.clone()), 4096);
            let indexer = CachingIndexer::new(lru);
            remap(image, &indexer)
        });
    });
}

#[cfg(feature = "threads")]
fn remap_mapped_par(c: &mut Criterion) {
    bench(c, "remap_mapped_par", images(), |b, &(k, image)| {
        let output = Quantizer::new().max_colors(k).build_color_indexer(image).unwrap();
        b.iter(|| packquant::remap_par(image, &output.indexer));
    });
}

#[cfg(not(feature = "threads"))]
criterion_group!(
    benches,
    median_cut_palette,
    median_cut_palette_half_sum,
    remap_mapped,
    remap_lru
);
#[cfg(feature = "threads")]
criterion_group!(
    benches,
    median_cut_palette,
    median_cut_palette_half_sum,
    remap_mapped,
    remap_lru,
    remap_mapped_par,
);
criterion_main!(benches);
