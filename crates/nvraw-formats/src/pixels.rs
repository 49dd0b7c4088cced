//! Separation of embedded metadata lines from image rows
//!
//! Sensors may emit rows of metadata above and below the visible image. A
//! [`RawFrame`] holds the buffer as read from the file; [`extract_embedded_lines`]
//! consumes it and yields an [`ActiveFrame`] whose `height` counts only image
//! rows. Since the input is consumed, a buffer cannot be stripped twice.

use crate::error::{NvRawError, Result};

/// Pixel buffer as stored in the file, embedded lines included
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawFrame {
    /// Row width in samples
    pub width: u32,
    /// Row count including embedded lines
    pub height: u32,
    /// Embedded metadata rows at the top
    pub embedded_line_count_top: u32,
    /// Embedded metadata rows at the bottom
    pub embedded_line_count_bottom: u32,
    /// Row-major samples
    pub samples: Vec<i16>,
}

/// Pixel buffer with embedded lines split off
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActiveFrame {
    /// Row width in samples
    pub width: u32,
    /// Number of image rows
    pub height: u32,
    /// Samples of the top embedded rows
    pub embedded_lines_top: Vec<i16>,
    /// Samples of the bottom embedded rows
    pub embedded_lines_bottom: Vec<i16>,
    /// Row-major image samples
    pub pixels: Vec<i16>,
}

fn sample_offset(rows: u32, width: u32) -> Result<usize> {
    (rows as usize)
        .checked_mul(width as usize)
        .ok_or(NvRawError::InvalidField {
            field: "frame size",
            value: i64::from(rows) * i64::from(width),
        })
}

/// Split the top and bottom embedded lines off a raw frame
///
/// With `T` top and `B` bottom lines on a `width x height` buffer the top
/// lines are samples `[0, width*T)`, the bottom lines are
/// `[(height-B)*width, height*width)` and the image is what lies between.
/// A buffer shorter than `height*width` is [`NvRawError::TruncatedInput`]
/// whatever the line counts; samples past it are dropped.
pub fn extract_embedded_lines(frame: RawFrame) -> Result<ActiveFrame> {
    let RawFrame {
        width,
        height,
        embedded_line_count_top: top,
        embedded_line_count_bottom: bottom,
        mut samples,
    } = frame;

    let active_height = top
        .checked_add(bottom)
        .and_then(|lines| height.checked_sub(lines))
        .ok_or(NvRawError::InvalidField {
            field: "embedded line count",
            value: i64::from(top) + i64::from(bottom),
        })?;

    let total = sample_offset(height, width)?;
    if samples.len() < total {
        return Err(NvRawError::truncated(
            "pixel data",
            total * 2,
            samples.len() * 2,
        ));
    }
    samples.truncate(total);

    if top == 0 && bottom == 0 {
        return Ok(ActiveFrame {
            width,
            height,
            embedded_lines_top: Vec::new(),
            embedded_lines_bottom: Vec::new(),
            pixels: samples,
        });
    }

    let start = sample_offset(top, width)?;
    let end = sample_offset(active_height + top, width)?;
    let embedded_lines_bottom = samples.split_off(end);
    let pixels = samples.split_off(start);
    let embedded_lines_top = samples;

    Ok(ActiveFrame {
        width,
        height: active_height,
        embedded_lines_top,
        embedded_lines_bottom,
        pixels,
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sequential_frame(width: u32, height: u32, top: u32, bottom: u32) -> RawFrame {
        RawFrame {
            width,
            height,
            embedded_line_count_top: top,
            embedded_line_count_bottom: bottom,
            samples: (0..(width * height) as i16).collect(),
        }
    }

    #[test]
    fn test_extract_top_and_bottom() {
        let active = extract_embedded_lines(sequential_frame(4, 10, 1, 2))
            .expect("Operation should succeed");

        assert_eq!(active.embedded_lines_top, vec![0, 1, 2, 3]);
        assert_eq!(active.embedded_lines_bottom, (28..40).collect::<Vec<i16>>());
        assert_eq!(active.pixels, (4..28).collect::<Vec<i16>>());
        assert_eq!(active.height, 7);
        assert_eq!(active.width, 4);
    }

    #[test]
    fn test_no_embedded_lines_is_passthrough() {
        let frame = sequential_frame(3, 3, 0, 0);
        let active = extract_embedded_lines(frame.clone()).expect("Operation should succeed");

        assert_eq!(active.pixels, frame.samples);
        assert_eq!(active.height, 3);
        assert!(active.embedded_lines_top.is_empty());
        assert!(active.embedded_lines_bottom.is_empty());
    }

    #[test]
    fn test_bottom_only() {
        let active = extract_embedded_lines(sequential_frame(2, 4, 0, 1))
            .expect("Operation should succeed");
        assert!(active.embedded_lines_top.is_empty());
        assert_eq!(active.embedded_lines_bottom, vec![6, 7]);
        assert_eq!(active.pixels, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(active.height, 3);
    }

    #[test]
    fn test_surplus_samples_dropped() {
        let mut frame = sequential_frame(2, 3, 1, 0);
        frame.samples.extend_from_slice(&[99, 99]);
        let active = extract_embedded_lines(frame).expect("Operation should succeed");
        assert_eq!(active.pixels, vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_too_many_embedded_lines() {
        let err = extract_embedded_lines(sequential_frame(4, 2, 2, 1))
            .expect_err("More embedded lines than rows");
        assert!(err.is_structural_corruption());
    }

    #[test]
    fn test_short_buffer_without_embedded_lines() {
        let mut frame = sequential_frame(4, 4, 0, 0);
        frame.samples.truncate(3);
        let err = extract_embedded_lines(frame).expect_err("Buffer shorter than frame");
        assert!(matches!(
            err,
            NvRawError::TruncatedInput {
                needed: 32,
                available: 6,
                ..
            }
        ));
    }

    #[test]
    fn test_surplus_dropped_without_embedded_lines() {
        let mut frame = sequential_frame(2, 2, 0, 0);
        frame.samples.push(99);
        let active = extract_embedded_lines(frame).expect("Operation should succeed");
        assert_eq!(active.pixels, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_short_buffer() {
        let mut frame = sequential_frame(4, 4, 1, 1);
        frame.samples.truncate(10);
        let err = extract_embedded_lines(frame).expect_err("Buffer shorter than frame");
        assert!(err.is_truncated());
    }
}
