//! Progressive compositing of partial-mode frames.
//!
//! Partial-mode sources store only the changed region of most frames. Every
//! output frame is therefore built from the previous output frame with the
//! current update pasted on top: opaque pixels replace, fully transparent
//! pixels leave the previous frame showing through, anything in between is
//! alpha-blended. Frame `i` depends on output `i - 1`, so this step is
//! strictly sequential.

use image::{Pixel, RgbaImage};

use crate::frame::{DecodedFrame, FramePixels};
use crate::progress::ProgressTracker;

/// Composite `frames` in order onto a running canvas of `canvas_size`.
///
/// The first output frame is the first input as-is. Every later output
/// starts from a blank canvas, receives the previous output in full and then
/// the current update on top. Already [`FramePixels::Finished`] records are
/// treated like pending ones. The output has the same length, order,
/// indices and durations as the input; all of it is `Finished`.
pub fn composite_progressive(frames: Vec<DecodedFrame>, canvas_size: (u32, u32)) -> Vec<DecodedFrame> {
    composite_with_progress(frames, canvas_size, None)
}

pub(crate) fn composite_with_progress(
    frames: Vec<DecodedFrame>,
    canvas_size: (u32, u32),
    tracker: Option<&ProgressTracker>,
) -> Vec<DecodedFrame> {
    log::debug!("Compositing {} partial frames", frames.len());

    let mut output: Vec<DecodedFrame> = Vec::with_capacity(frames.len());
    for frame in frames {
        let update = frame.pixels.into_image();
        let composed = match output.last() {
            None => update,
            Some(previous) => {
                let mut canvas = RgbaImage::new(canvas_size.0, canvas_size.1);
                image::imageops::replace(&mut canvas, previous.pixels.image(), 0, 0);
                paste_update(&mut canvas, &update);
                canvas
            }
        };
        output.push(DecodedFrame {
            pixels: FramePixels::Finished(composed),
            index: frame.index,
            duration_ms: frame.duration_ms,
        });
        if let Some(tracker) = tracker {
            tracker.advance(Some(frame.index));
        }
    }
    if let Some(tracker) = tracker {
        tracker.finish();
    }
    output
}

/// Paste `update` at the origin of `canvas`, using its alpha as the mask.
fn paste_update(canvas: &mut RgbaImage, update: &RgbaImage) {
    let width = canvas.width().min(update.width());
    let height = canvas.height().min(update.height());
    for y in 0..height {
        for x in 0..width {
            let source = update.get_pixel(x, y);
            match source[3] {
                0 => {}
                255 => canvas.put_pixel(x, y, *source),
                _ => canvas.get_pixel_mut(x, y).blend(source),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn pending(image: RgbaImage, index: usize) -> DecodedFrame {
        DecodedFrame {
            pixels: FramePixels::Pending(image),
            index,
            duration_ms: 100,
        }
    }

    #[test]
    fn unset_regions_persist_from_previous_frame() {
        let red = RgbaImage::from_pixel(10, 10, RED);
        let mut patch = RgbaImage::new(10, 10);
        for y in 0..2 {
            for x in 0..2 {
                patch.put_pixel(x, y, BLUE);
            }
        }
        let empty = RgbaImage::new(10, 10);

        let output = composite_progressive(
            vec![pending(red.clone(), 0), pending(patch, 1), pending(empty, 2)],
            (10, 10),
        );

        assert_eq!(output.len(), 3);
        assert!(output.iter().all(|frame| !frame.pixels.is_pending()));
        assert_eq!(output[0].pixels.image(), &red);

        let second = output[1].pixels.image();
        assert_eq!(*second.get_pixel(0, 0), BLUE);
        assert_eq!(*second.get_pixel(1, 1), BLUE);
        assert_eq!(*second.get_pixel(2, 2), RED);
        assert_eq!(*second.get_pixel(9, 9), RED);

        assert_eq!(output[2].pixels.image(), output[1].pixels.image());
    }

    #[test]
    fn preserves_indices_and_durations() {
        let frames = vec![
            DecodedFrame {
                pixels: FramePixels::Pending(RgbaImage::new(2, 2)),
                index: 0,
                duration_ms: 30,
            },
            DecodedFrame {
                pixels: FramePixels::Pending(RgbaImage::new(2, 2)),
                index: 1,
                duration_ms: 70,
            },
        ];
        let output = composite_progressive(frames, (2, 2));
        assert_eq!(output[0].index, 0);
        assert_eq!(output[1].index, 1);
        assert_eq!(output[1].duration_ms, 70);
    }

    #[test]
    fn later_updates_stack() {
        let base = RgbaImage::from_pixel(3, 1, RED);
        let mut first = RgbaImage::new(3, 1);
        first.put_pixel(0, 0, BLUE);
        let mut second = RgbaImage::new(3, 1);
        second.put_pixel(2, 0, BLUE);

        let output = composite_progressive(
            vec![pending(base, 0), pending(first, 1), pending(second, 2)],
            (3, 1),
        );
        let last = output[2].pixels.image();
        assert_eq!(*last.get_pixel(0, 0), BLUE);
        assert_eq!(*last.get_pixel(1, 0), RED);
        assert_eq!(*last.get_pixel(2, 0), BLUE);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(composite_progressive(Vec::new(), (4, 4)).is_empty());
    }
}
