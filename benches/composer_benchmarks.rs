//! Benchmarks for sampling and composition.
//!
//! Run with: cargo bench
//!
//! The full-pipeline benchmark requires `tests/fixtures/sample_video.mp4`
//! and is skipped without it.

use std::path::Path;

use contact_sheet::{
    Composer, ContactSheet, FfmpegLogLevel, GridLayout, SampledFrame, SheetOptions,
};
use criterion::Criterion;
use image::{DynamicImage, Rgb, RgbImage};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

fn synthetic_frames(count: u64) -> Vec<SampledFrame> {
    (0..count)
        .map(|index| SampledFrame {
            index,
            image: DynamicImage::ImageRgb8(RgbImage::from_pixel(
                640,
                360,
                Rgb([(index * 10 % 256) as u8, 64, 128]),
            )),
            timestamp_seconds: index as f64 / 30.0,
        })
        .collect()
}

fn benchmark_compose(criterion: &mut Criterion) {
    let options = SheetOptions::new(5, 5).with_layout(GridLayout::default().with_dpi(100));
    let composer = Composer::new(&options);
    criterion.bench_function("compose 5x5 grid at 100 dpi", |bencher| {
        bencher.iter(|| composer.compose(synthetic_frames(25)).unwrap());
    });

    let labelled = Composer::new(&options.clone().with_show_time(true));
    criterion.bench_function("compose 5x5 grid at 100 dpi with labels", |bencher| {
        bencher.iter(|| labelled.compose(synthetic_frames(25)).unwrap());
    });
}

fn benchmark_full_pipeline(criterion: &mut Criterion) {
    contact_sheet::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let output = std::env::temp_dir().join("contact_sheet_bench.png");
    let generator = ContactSheet::new(
        SheetOptions::new(3, 3)
            .with_output(&output)
            .with_layout(GridLayout::default().with_dpi(50)),
    );
    criterion.bench_function("generate 3x3 sheet from fixture", |bencher| {
        bencher.iter(|| generator.generate(SAMPLE_VIDEO).unwrap());
    });
}

criterion::criterion_group!(benches, benchmark_compose, benchmark_full_pipeline);
criterion::criterion_main!(benches);
