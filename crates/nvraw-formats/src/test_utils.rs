//! Test utilities for format round-trip testing

use crate::NvRawFormat;
use std::fmt::Debug;

/// Build `original`, parse the bytes back and compare
pub fn test_round_trip<T>(original: &T) -> Result<(), Box<dyn std::error::Error>>
where
    T: NvRawFormat + PartialEq + Debug,
{
    let data = original.build()?;
    let parsed = T::parse(&data)?;

    if original != &parsed {
        return Err(format!(
            "Round-trip verification failed:\nOriginal: {:?}\nParsed: {:?}",
            original, parsed
        )
        .into());
    }

    // Rebuilding the parsed value must reproduce the same bytes
    T::verify_round_trip(&data)?;
    Ok(())
}
