//! Conversion of real GIF files written to a scratch directory.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use flipbook::{
    AnimationSource, ConvertOptions, FileSource, FlipbookError, OpenSource, SourceFormat,
    SourceProbe, process_animation,
};
use gif::{Encoder, Frame};

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];

fn solid(width: u16, height: u16, rgba: [u8; 4], delay: u16) -> Frame<'static> {
    let mut pixels: Vec<u8> = rgba
        .iter()
        .copied()
        .cycle()
        .take(usize::from(width) * usize::from(height) * 4)
        .collect();
    let mut frame = Frame::from_rgba_speed(width, height, &mut pixels, 10);
    frame.delay = delay;
    frame
}

fn write_gif(path: &Path, width: u16, height: u16, frames: &[Frame<'static>]) {
    let mut bytes = Vec::new();
    {
        let mut encoder = Encoder::new(&mut bytes, width, height, &[]).unwrap();
        for frame in frames {
            encoder.write_frame(frame).unwrap();
        }
    }
    fs::write(path, bytes).unwrap();
}

/// A 10x10 red background, then a 2x2 blue patch in the top-left corner,
/// then a 3x1 green patch at (5, 5).
fn write_partial_gif(path: &Path) {
    let mut blue = solid(2, 2, BLUE, 10);
    blue.left = 0;
    blue.top = 0;
    let mut green = solid(3, 1, GREEN, 10);
    green.left = 5;
    green.top = 5;
    write_gif(path, 10, 10, &[solid(10, 10, RED, 10), blue, green]);
}

#[test]
fn partial_gif_is_detected_and_composited() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("patches.gif");
    write_partial_gif(&path);

    let opener = FileSource::new(&path);
    let metadata = SourceProbe::probe_file(&opener).unwrap();
    assert_eq!(metadata.format, Some(SourceFormat::Gif));
    assert_eq!(metadata.canvas_size(), (10, 10));
    assert_eq!(metadata.frame_count, 3);
    assert!(metadata.is_partial);

    let processed = process_animation(
        Arc::new(opener),
        &ConvertOptions::new().with_max_workers(2),
    )
    .unwrap();

    assert_eq!(processed.frames.len(), 3);
    assert!((processed.frames_per_second - 10.0).abs() < 1e-9);

    let second = &processed.frames[1];
    assert_eq!(second.get_pixel(0, 0).0, BLUE);
    assert_eq!(second.get_pixel(1, 1).0, BLUE);
    assert_eq!(second.get_pixel(2, 2).0, RED);

    let third = &processed.frames[2];
    assert_eq!(third.get_pixel(0, 0).0, BLUE);
    assert_eq!(third.get_pixel(5, 5).0, GREEN);
    assert_eq!(third.get_pixel(7, 5).0, GREEN);
    assert_eq!(third.get_pixel(8, 5).0, RED);
    assert_eq!(third.get_pixel(9, 9).0, RED);
}

#[test]
fn full_frame_gif_is_not_partial() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("full.gif");
    write_gif(
        &path,
        6,
        4,
        &[solid(6, 4, RED, 4), solid(6, 4, BLUE, 4), solid(6, 4, GREEN, 4)],
    );

    let metadata = SourceProbe::probe_file(&FileSource::new(&path)).unwrap();
    assert!(!metadata.is_partial);

    let processed =
        process_animation(Arc::new(FileSource::new(&path)), &ConvertOptions::new()).unwrap();
    assert!((processed.frames_per_second - 25.0).abs() < 1e-9);
    assert_eq!(processed.frames[1].get_pixel(3, 2).0, BLUE);
    assert_eq!(processed.frames[2].get_pixel(0, 0).0, GREEN);
}

#[test]
fn mixed_delays_are_flagged_as_variable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jerky.gif");
    write_gif(&path, 2, 2, &[solid(2, 2, RED, 2), solid(2, 2, BLUE, 20)]);

    let processed =
        process_animation(Arc::new(FileSource::new(&path)), &ConvertOptions::new()).unwrap();
    assert!(processed.timing.is_variable);
    assert_eq!(processed.timing.min_ms, 20);
    assert_eq!(processed.timing.max_ms, 200);
}

#[test]
fn each_open_is_independent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("patches.gif");
    write_partial_gif(&path);
    let opener = FileSource::new(&path);

    let mut first = opener.open().unwrap();
    let mut second = opener.open().unwrap();
    let late = first.decode_frame(2).unwrap();
    let early = second.decode_frame(0).unwrap();
    assert_eq!(late.get_pixel(5, 5).0, GREEN);
    assert_eq!(early.get_pixel(5, 5).0, RED);
}

#[test]
fn non_image_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.gif");
    fs::write(&path, b"this is not an image").unwrap();

    let result = FileSource::new(&path).open();
    assert!(matches!(
        result,
        Err(FlipbookError::UnsupportedFormat(_) | FlipbookError::FileOpen { .. })
    ));
}
