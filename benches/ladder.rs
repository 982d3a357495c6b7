use barscan::BarcodeDecoder;
use barscan::decoder::{DecoderOptions, FAST_LADDER, QrEngine, STILL_LADDER, run_ladder};
use barscan::preprocess::to_gray;
use barscan::tools::{bench_limit_from_env, dataset_iter, dataset_root_from_env, load_image, smoke_from_env};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use image::{GrayImage, Luma};
use std::path::PathBuf;

fn blank(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([200]))
}

/// Worst case: nothing to find, every stage runs
fn bench_exhausted_ladders(c: &mut Criterion) {
    let engine = QrEngine::new();
    let options = DecoderOptions::default();

    let small = blank(160, 120);
    c.bench_function("still_ladder_miss_160x120", |b| {
        b.iter(|| run_ladder(&engine, black_box(&small), STILL_LADDER, &options))
    });

    let frame = blank(896, 504);
    c.bench_function("fast_ladder_miss_896x504", |b| {
        b.iter(|| run_ladder(&engine, black_box(&frame), FAST_LADDER, &options))
    });
}

fn bench_dataset(c: &mut Criterion) {
    let root = dataset_root_from_env();
    let images: Vec<PathBuf> = dataset_iter(&root, bench_limit_from_env().or(Some(5)), smoke_from_env()).collect();
    if images.is_empty() {
        eprintln!("No images under {}; skipping dataset benchmark", root.display());
        return;
    }

    let decoder = BarcodeDecoder::new();
    let mut group = c.benchmark_group("decode_image");
    group.sample_size(10);
    for path in images {
        let Ok(image) = load_image(&path) else {
            continue;
        };
        let gray = to_gray(&image);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        group.bench_with_input(BenchmarkId::from_parameter(name), &gray, |b, g| {
            b.iter(|| decoder.decode_gray(black_box(g)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_exhausted_ladders, bench_dataset);
criterion_main!(benches);
