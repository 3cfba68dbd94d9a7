//! Conversion of real animated PNG files written to a scratch directory.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use flipbook::{
    AnimationSource, ConvertOptions, FileSource, OpenSource, SourceFormat, SourceProbe,
    process_animation,
};

const SIDE: u32 = 4;
const FRAMES: u32 = 10;

fn red_level(index: u32) -> u8 {
    (index * 20) as u8
}

/// Ten 4x4 opaque frames, 40 ms each, frame `i` filled with red `20 * i`.
fn write_apng(path: &Path) {
    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, SIDE, SIDE);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_animated(FRAMES, 0).unwrap();
        encoder.set_frame_delay(40, 1000).unwrap();
        let mut writer = encoder.write_header().unwrap();
        for index in 0..FRAMES {
            let pixels: Vec<u8> = [red_level(index), 0, 0, 255]
                .iter()
                .copied()
                .cycle()
                .take((SIDE * SIDE * 4) as usize)
                .collect();
            writer.write_image_data(&pixels).unwrap();
        }
        writer.finish().unwrap();
    }
    fs::write(path, bytes).unwrap();
}

#[test]
fn apng_is_probed_as_full_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fade.png");
    write_apng(&path);

    let metadata = SourceProbe::probe_file(&FileSource::new(&path)).unwrap();
    assert_eq!(metadata.format, Some(SourceFormat::Apng));
    assert_eq!(metadata.canvas_size(), (SIDE, SIDE));
    assert_eq!(metadata.frame_count, FRAMES as usize);
    assert!(!metadata.is_partial);
}

#[test]
fn apng_frames_decode_out_of_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fade.png");
    write_apng(&path);

    let mut source = FileSource::new(&path).open().unwrap();
    assert_eq!(source.frame_count(), FRAMES as usize);

    let seventh = source.decode_frame(7).unwrap();
    assert_eq!(seventh.get_pixel(0, 0).0, [red_level(7), 0, 0, 255]);

    // Seeking backwards reopens the stream.
    let second = source.decode_frame(2).unwrap();
    assert_eq!(second.get_pixel(3, 3).0, [red_level(2), 0, 0, 255]);

    let info = source.frame_info(5).unwrap();
    assert_eq!(info.duration_ms, 40);
    assert!(info.region.unwrap().covers((SIDE, SIDE)));

    let again = source.decode_frame(5).unwrap();
    assert_eq!(again.get_pixel(1, 2).0, [red_level(5), 0, 0, 255]);
}

#[test]
fn apng_converts_across_several_workers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fade.png");
    write_apng(&path);

    for workers in [1, 3, 4] {
        let processed = process_animation(
            Arc::new(FileSource::new(&path)),
            &ConvertOptions::new().with_max_workers(workers),
        )
        .unwrap();

        assert!(!processed.is_partial());
        assert_eq!(processed.frames.len(), FRAMES as usize);
        assert!((processed.frames_per_second - 25.0).abs() < 1e-9);
        assert!(!processed.timing.is_variable);

        let reds: Vec<u8> = processed
            .frames
            .iter()
            .map(|frame| frame.get_pixel(0, 0).0[0])
            .collect();
        let expected: Vec<u8> = (0..FRAMES).map(red_level).collect();
        assert_eq!(reds, expected, "workers={workers}");
    }
}
