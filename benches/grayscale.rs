use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rust_barcode::LumaImage;
use rust_barcode::utils::grayscale::{rgb_to_grayscale, rgba_to_grayscale, to_luma};

fn bench_rgb_to_grayscale_small(c: &mut Criterion) {
    let image = vec![128u8; 100 * 100 * 3];
    c.bench_function("rgb_to_grayscale_100x100", |b| {
        b.iter(|| rgb_to_grayscale(black_box(&image), black_box(100), black_box(100)))
    });
}

fn bench_rgb_to_grayscale_medium(c: &mut Criterion) {
    let image = vec![128u8; 640 * 480 * 3];
    c.bench_function("rgb_to_grayscale_640x480", |b| {
        b.iter(|| rgb_to_grayscale(black_box(&image), black_box(640), black_box(480)))
    });
}

fn bench_rgb_to_grayscale_large(c: &mut Criterion) {
    let image = vec![128u8; 1920 * 1080 * 3];
    c.bench_function("rgb_to_grayscale_1920x1080", |b| {
        b.iter(|| rgb_to_grayscale(black_box(&image), black_box(1920), black_box(1080)))
    });
}

fn bench_rgba_to_grayscale_medium(c: &mut Criterion) {
    let image = vec![128u8; 640 * 480 * 4];
    c.bench_function("rgba_to_grayscale_640x480", |b| {
        b.iter(|| rgba_to_grayscale(black_box(&image), black_box(640), black_box(480)))
    });
}

fn bench_to_luma_channels(c: &mut Criterion) {
    let image = vec![128u8; 1280 * 720 * 4];
    let mut group = c.benchmark_group("to_luma_1280x720");
    for channels in [1usize, 3, 4] {
        let len = 1280 * 720 * channels;
        group.bench_function(format!("{channels}ch"), |b| {
            b.iter(|| to_luma(black_box(&image[..len]), 1280, 720, channels))
        });
    }
    group.finish();
}

fn bench_luma_image_from_rgb(c: &mut Criterion) {
    let image = vec![90u8; 1920 * 1080 * 3];
    c.bench_function("luma_image_from_rgb_1920x1080", |b| {
        b.iter(|| LumaImage::from_rgb(black_box(&image), 1920, 1080))
    });
}

criterion_group!(
    benches,
    bench_rgb_to_grayscale_small,
    bench_rgb_to_grayscale_medium,
    bench_rgb_to_grayscale_large,
    bench_rgba_to_grayscale_medium,
    bench_to_luma_channels,
    bench_luma_image_from_rgb
);
criterion_main!(benches);
