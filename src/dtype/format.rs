//! Buffer-protocol format tags
//!
//! Maps each registered kind to the single-character struct format used by
//! standard buffer-exchange protocols (`b`, `B`, `h`, ... `d`) and back.

use super::DType;
use crate::error::{Error, Result};
use std::str::FromStr;

impl DType {
    /// Format tag for this kind
    pub const fn format(self) -> &'static str {
        match self {
            Self::Int8 => "b",
            Self::UInt8 => "B",
            Self::Int16 => "h",
            Self::UInt16 => "H",
            Self::Int32 => "i",
            Self::UInt32 => "I",
            Self::Int64 => "q",
            Self::UInt64 => "Q",
            Self::Float32 => "f",
            Self::Float64 => "d",
        }
    }

    /// Parse a format tag
    ///
    /// A single native byte-order prefix (`@` or `=`) is accepted.
    pub fn from_format(format: &str) -> Result<Self> {
        let tag = format
            .strip_prefix('@')
            .or_else(|| format.strip_prefix('='))
            .unwrap_or(format);

        Self::ALL
            .iter()
            .copied()
            .find(|dtype| dtype.format() == tag)
            .ok_or_else(|| Error::UnknownFormat(format.to_string()))
    }
}

impl FromStr for DType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_format(s)
    }
}
