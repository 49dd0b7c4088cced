//! Decode entry points over byte slices, readers and files

use crate::chunk::ChunkedFile;
use crate::detect::{FormatKind, SNIFF_LEN, detect_format};
use crate::error::Result;
use crate::legacy::LegacyFile;
use crate::options::ReaderOptions;
use crate::record::RawImageRecord;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// NVRAW decoder for either on-disk layout
#[derive(Debug, Clone, Default)]
pub struct NvRawReader {
    options: ReaderOptions,
}

impl NvRawReader {
    /// Create a reader with the given options
    pub fn new(options: ReaderOptions) -> Self {
        Self { options }
    }

    /// Options in effect
    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Decode a complete file held in memory
    pub fn decode(&self, data: &[u8]) -> Result<RawImageRecord> {
        match detect_format(data)? {
            FormatKind::Legacy => LegacyFile::parse(data)?.into_record(),
            FormatKind::Chunked => {
                ChunkedFile::parse_with_options(data, &self.options)?.into_record()
            }
        }
    }

    /// Decode from a stream
    ///
    /// The first 8 bytes are classified before anything else is read, so an
    /// unrecognized stream is rejected without consuming the rest of it.
    pub fn read_from<R: Read>(&self, mut reader: R) -> Result<RawImageRecord> {
        let mut data = vec![0u8; SNIFF_LEN];
        reader.read_exact(&mut data)?;
        detect_format(&data)?;

        reader.read_to_end(&mut data)?;
        debug!("Read {} bytes", data.len());
        self.decode(&data)
    }

    /// Open and decode a file
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<RawImageRecord> {
        let path = path.as_ref();
        debug!("Opening {}", path.display());
        let file = File::open(path)?;
        self.read_from(BufReader::new(file))
    }
}

/// Decode a complete file held in memory with default options
pub fn decode(data: &[u8]) -> Result<RawImageRecord> {
    NvRawReader::default().decode(data)
}
