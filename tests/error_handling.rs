//! Error handling integration tests.
//!
//! These tests verify that meaningful errors are returned for the failure
//! conditions a user can run into from the command line.

use flipbook::{FileSource, FlipbookError, OpenSource, SourceProbe, resolve_input_path};

#[test]
fn open_nonexistent_file() {
    let result = FileSource::new("this_file_does_not_exist.webp").open();
    assert!(result.is_err());

    let error_message = result.err().map(|error| error.to_string()).unwrap_or_default();
    assert!(
        error_message.contains("Can't find file"),
        "Error message should say the file is missing: {error_message}",
    );
}

#[test]
fn resolve_missing_input_names_the_full_path() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let result = resolve_input_path(r"clips\missing.gif", temporary_directory.path());

    match result {
        Err(FlipbookError::FileNotFound(path)) => {
            assert_eq!(path, temporary_directory.path().join("clips/missing.gif"));
        }
        other => panic!("expected FileNotFound, got {other:?}"),
    }
}

#[test]
fn open_invalid_file() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.webp");
    std::fs::write(&invalid_file_path, b"this is not an animated image")
        .expect("Failed to write invalid file");

    let result = SourceProbe::probe_file(&FileSource::new(&invalid_file_path));
    assert!(result.is_err(), "Expected error for invalid image file");
}

#[test]
fn still_png_is_not_animated() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let still_path = temporary_directory.path().join("still.png");
    image::RgbaImage::new(4, 4)
        .save(&still_path)
        .expect("Failed to write PNG");

    let result = FileSource::new(&still_path).open();
    let error_message = result.err().map(|error| error.to_string()).unwrap_or_default();
    assert!(
        error_message.contains("not animated"),
        "Error message should say the image is not animated: {error_message}",
    );
}

#[test]
fn truncated_gif_is_reported() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temporary_directory.path().join("truncated.gif");
    std::fs::write(&path, b"GIF89a\x0a\x00").expect("Failed to write GIF");

    assert!(FileSource::new(&path).open().is_err());
}

#[test]
fn error_display_messages() {
    let error = FlipbookError::FrameOutOfRange {
        frame_index: 12,
        total_frames: 10,
    };
    assert!(error.to_string().contains("out of range"));

    let error = FlipbookError::NoFrames;
    assert!(error.to_string().contains("no frames"));

    let error = FlipbookError::WorkerFailed("1 of 4 workers exited without a result".into());
    assert!(error.to_string().contains("Decode worker failed"));
}
