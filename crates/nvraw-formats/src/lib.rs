//! Reader and writer for NVRAW raw sensor capture files
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_possible_wrap)] // Intentional for binary operations
#![allow(clippy::cast_sign_loss)] // Wire fields reinterpret signedness
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::doc_markdown)] // Chunk tags and sensor terms don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::similar_names)] // Domain-specific naming patterns
#![allow(clippy::float_cmp)] // Binary format requirements
#![allow(clippy::derive_partial_eq_without_eq)] // Binary format structs
#![allow(clippy::redundant_closure_for_method_calls)] // Iterator chains
#![allow(clippy::unnecessary_wraps)] // Uniform payload signatures
#![allow(clippy::return_self_not_must_use)] // Builder patterns
#![allow(clippy::use_self)] // Type clarity
//! NVRAW files come in two on-disk layouts, told apart by their first 8 bytes:
//!
//! - **Legacy**: a fixed-offset header guarded by two sentinels, followed by
//!   a body of signed 16-bit samples. See [`legacy`].
//! - **Chunked**: a sequence of tagged, length-delimited chunks, each with a
//!   versioned payload that only ever grows. See [`chunk`].
//!
//! Both decode into the same [`RawImageRecord`].
//!
//! ```rust,no_run
//! use nvraw_formats::{NvRawReader, ReaderOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = NvRawReader::new(ReaderOptions::default().with_verify_chunk_digests(true));
//! let record = reader.open("capture.nvraw")?;
//! println!(
//!     "{}x{} {} bits, phase {}",
//!     record.width, record.height, record.bits_per_sample, record.bayer_phase
//! );
//! for diagnostic in &record.diagnostics {
//!     eprintln!("note: {diagnostic:?}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Design Principles
//!
//! - **Symmetric Operations**: every layout and chunk payload can be parsed and built
//! - **Bounded Reads**: payload decoders never read past the declared chunk length
//! - **Additive Versions**: a newer payload version decodes everything an older one did
//! - **Non-fatal Surprises**: unknown chunks and unmapped enum values become diagnostics

#![warn(missing_docs)]

pub mod bayer;
pub mod chunk;
pub mod detect;
pub mod error;
pub mod frame;
/// Legacy fixed-layout files
///
/// Header versions 1 through 4 are recognized. Version 1 carries no AWB
/// state; versions 2 to 4 share one layout.
pub mod legacy;
pub mod options;
pub mod output_format;
pub mod pixels;
pub mod primitives;
pub mod reader;
pub mod record;

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
pub(crate) mod test_utils;

pub use bayer::{BayerPhase, bayer_phase_code, bayer_phase_string};
pub use detect::{FormatKind, detect_format};
pub use error::{Diagnostic, NvRawError, Result};
pub use frame::{FrameSet, FrameSource, load_frames};
pub use options::ReaderOptions;
pub use output_format::OutputDataFormat;
pub use reader::{NvRawReader, decode};
pub use record::{HdrExposureInfo, RawImageRecord};

/// Common format trait implemented by both file layouts
pub trait NvRawFormat: Sized {
    /// Parse from bytes
    fn parse(data: &[u8]) -> Result<Self>;

    /// Build to bytes
    fn build(&self) -> Result<Vec<u8>>;

    /// Verify that parsing then building reproduces `data` exactly
    fn verify_round_trip(data: &[u8]) -> Result<()> {
        let rebuilt = Self::parse(data)?.build()?;
        if data != rebuilt.as_slice() {
            let offset = data
                .iter()
                .zip(&rebuilt)
                .position(|(a, b)| a != b)
                .unwrap_or_else(|| data.len().min(rebuilt.len()));
            return Err(NvRawError::RoundTripMismatch {
                offset,
                original: data.len(),
                rebuilt: rebuilt.len(),
            });
        }
        Ok(())
    }
}
