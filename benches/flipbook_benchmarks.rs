//! Benchmarks for decoding, dispatch and compositing.
//!
//! Run with: cargo bench

use std::sync::Arc;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion};
use flipbook::{
    AnimationSource, ConvertOptions, DecodedFrame, FlipbookError, FrameInfo, FramePixels,
    FrameRegion, OpenSource, composite_progressive, process_animation, split_frame_ranges,
};
use image::{Rgba, RgbaImage};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;

#[derive(Clone)]
struct Gradient {
    frames: usize,
}

impl AnimationSource for Gradient {
    fn canvas_size(&self) -> (u32, u32) {
        (WIDTH, HEIGHT)
    }

    fn frame_count(&self) -> usize {
        self.frames
    }

    fn frame_info(&mut self, _index: usize) -> Result<FrameInfo, FlipbookError> {
        Ok(FrameInfo {
            duration_ms: 40,
            region: Some(FrameRegion::full(WIDTH, HEIGHT)),
        })
    }

    fn decode_frame(&mut self, index: usize) -> Result<RgbaImage, FlipbookError> {
        Ok(RgbaImage::from_fn(WIDTH, HEIGHT, |x, y| {
            Rgba([(x as usize + index) as u8, y as u8, index as u8, 255])
        }))
    }
}

impl OpenSource for Gradient {
    type Source = Gradient;

    fn open(&self) -> Result<Gradient, FlipbookError> {
        Ok(self.clone())
    }
}

fn partial_frames(count: usize) -> Vec<DecodedFrame> {
    (0..count)
        .map(|index| {
            let image = if index == 0 {
                RgbaImage::from_pixel(WIDTH, HEIGHT, Rgba([255, 0, 0, 255]))
            } else {
                let mut patch = RgbaImage::new(WIDTH, HEIGHT);
                for y in 0..32 {
                    for x in 0..32 {
                        patch.put_pixel((x + index as u32 * 8) % WIDTH, y, Rgba([0, 0, 255, 255]));
                    }
                }
                patch
            };
            DecodedFrame {
                pixels: FramePixels::Pending(image),
                index,
                duration_ms: 40,
            }
        })
        .collect()
}

fn benchmark_split_ranges(criterion: &mut Criterion) {
    criterion.bench_function("split 10k frames over 16 workers", |bencher| {
        bencher.iter(|| split_frame_ranges(10_000, 16));
    });
}

fn benchmark_compositing(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("composite");
    for count in [10, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |bencher, &count| {
            bencher.iter_batched(
                || partial_frames(count),
                |frames| composite_progressive(frames, (WIDTH, HEIGHT)),
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn benchmark_parallel_decode(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("process animation");
    group.measurement_time(Duration::from_secs(10));
    for workers in [1, 4, 16] {
        let options = ConvertOptions::new().with_max_workers(workers);
        group.bench_with_input(
            BenchmarkId::new("workers", workers),
            &options,
            |bencher, options| {
                bencher.iter(|| {
                    process_animation(Arc::new(Gradient { frames: 64 }), options).unwrap()
                });
            },
        );
    }
    group.finish();
}

criterion::criterion_group!(
    benches,
    benchmark_split_ranges,
    benchmark_compositing,
    benchmark_parallel_decode,
);
criterion::criterion_main!(benches);
