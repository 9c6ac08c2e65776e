//! Variable parameter compression.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

use crate::error::{Result, SasError};

/// zstd level used for parameter compression.
pub const DEFAULT_ZSTD_LEVEL: i32 = 3;

/// Supported compression schemes.
///
/// Parse a scheme from its name with [`str::parse`]; an unknown name is a
/// caller error and yields [`SasError::UnknownCompression`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    /// zstd with [`DEFAULT_ZSTD_LEVEL`].
    Zstd,
}

impl Compression {
    /// Scheme name as accepted by `parse`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Zstd => "zstd",
        }
    }

    /// Compress a parameter.
    ///
    /// # Errors
    ///
    /// Returns [`SasError::Compression`] if the compressor fails.
    pub fn compress(self, data: &[u8]) -> Result<Bytes> {
        match self {
            Self::Zstd => zstd::bulk::compress(data, DEFAULT_ZSTD_LEVEL)
                .map(Bytes::from)
                .map_err(|e| SasError::Compression(format!("zstd compression failed: {}", e))),
        }
    }
}

impl FromStr for Compression {
    type Err = SasError;

    fn from_str(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "zstd" => Ok(Self::Zstd),
            _ => Err(SasError::UnknownCompression(name.to_string())),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
