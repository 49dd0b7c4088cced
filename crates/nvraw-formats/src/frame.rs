//! Loading frames from an external multi-frame reader
//!
//! Newer multi-frame captures are parsed by a native reader this crate does
//! not implement. [`FrameSource`] is the narrow view of that reader needed to
//! pull frames out of it: a base header, one header per plane, and frames
//! made of exposure planes holding raw little-endian pixel bytes.
//! [`load_frames`] turns those into owned `i16` sample planes.

use crate::error::Result;
use crate::primitives::samples_from_le_bytes;
use crate::record::DEFAULT_PIXEL_FORMAT;
use tracing::debug;

/// Frame dimensions reported by the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BaseHeader {
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
}

/// Sample description of one plane
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaneHeader {
    /// Significant bits per sample
    pub bits_per_sample: u32,
    /// Sample format tag
    pub pixel_format: String,
}

/// One exposure of a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExposurePlane {
    /// Raw little-endian `i16` samples
    pub pixel_bytes: Vec<u8>,
}

/// A frame as delivered by the reader
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    /// Exposure planes in reader order
    pub planes: Vec<ExposurePlane>,
}

/// Opaque multi-frame reader
///
/// Implementations report their own failures as
/// [`NvRawError::FrameSource`](crate::NvRawError::FrameSource).
pub trait FrameSource {
    /// Frame dimensions
    fn base_header(&self) -> Result<BaseHeader>;

    /// Per-plane sample descriptions
    fn plane_headers(&self) -> Result<Vec<PlaneHeader>>;

    /// Advance past and return up to `count` frames
    fn next_frames(&mut self, count: usize) -> Result<Vec<Frame>>;
}

/// Decoded frame planes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadedFrame {
    /// One sample buffer per exposure plane
    pub planes: Vec<Vec<i16>>,
}

/// Frames loaded from a [`FrameSource`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSet {
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Bits per sample of the last plane header
    pub bits_per_sample: u32,
    /// Pixel format of the last plane header, `"int16"` when there is none
    pub pixel_format: String,
    /// Every plane header
    pub plane_headers: Vec<PlaneHeader>,
    /// Loaded frames in order
    pub frames: Vec<LoadedFrame>,
}

/// Skip `start` frames, then load `count` frames
///
/// The source is consumed and dropped on return, whether or not loading
/// succeeded.
pub fn load_frames<S: FrameSource>(mut source: S, start: usize, count: usize) -> Result<FrameSet> {
    let header = source.base_header()?;
    let plane_headers = source.plane_headers()?;
    let (bits_per_sample, pixel_format) = plane_headers.last().map_or_else(
        || (0, DEFAULT_PIXEL_FORMAT.to_string()),
        |plane| (plane.bits_per_sample, plane.pixel_format.clone()),
    );

    for _ in 0..start {
        source.next_frames(1)?;
    }

    let frames = source
        .next_frames(count)?
        .into_iter()
        .map(|frame| {
            let planes = frame
                .planes
                .iter()
                .map(|plane| samples_from_le_bytes(&plane.pixel_bytes, "exposure plane"))
                .collect::<Result<Vec<_>>>()?;
            Ok(LoadedFrame { planes })
        })
        .collect::<Result<Vec<_>>>()?;
    debug!(
        "Loaded {} frames of {}x{} starting at {}",
        frames.len(),
        header.width,
        header.height,
        start
    );

    Ok(FrameSet {
        width: header.width,
        height: header.height,
        bits_per_sample,
        pixel_format,
        plane_headers,
        frames,
    })
}
