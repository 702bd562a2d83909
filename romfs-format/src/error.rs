use std::fmt;

use crate::header::{MalformedHeader, Region};
use crate::path::NameError;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the image engine can report.
///
/// `NotFound` and `Corrupt` are distinct: the former means the
/// path does not exist in a sound image, the latter that the image itself is
/// broken somewhere along the walk.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Header not recognized: {0}")]
    Malformed(#[from] MalformedHeader),

    #[error("Path not found in image. Path: '{path}'")]
    NotFound { path: String },

    #[error("Corrupt {region} record at offset {offset:#x}: {reason}")]
    Corrupt {
        region: Region,
        offset: u64,
        reason: CorruptReason,
    },

    #[error("Invalid path component")]
    InvalidName(#[from] NameError),

    #[error("Failed to read image")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn corrupt(region: Region, offset: u64, reason: CorruptReason) -> Error {
        tracing::warn!(%region, offset = format_args!("{:#x}", offset), %reason, "corrupt image");
        Error::Corrupt {
            region,
            offset,
            reason,
        }
    }

    #[inline(always)]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    #[inline(always)]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Error::Corrupt { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptReason {
    /// The record does not fit inside its region.
    OutOfBounds,
    /// The backing image ended before the record did.
    ShortRead,
    /// The stored name length is odd or longer than 256 code units.
    NameLength(u32),
    /// A same-hash or sibling chain visited more records than the region can hold.
    ChainTooLong,
    /// A child record does not point back at the directory it was reached from.
    ParentMismatch { expected: u32, found: u32 },
    /// A file's data span runs past the end of the image.
    DataOutOfBounds,
}

impl fmt::Display for CorruptReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CorruptReason::*;

        match self {
            OutOfBounds => f.write_str("record exceeds region bounds"),
            ShortRead => f.write_str("short read"),
            NameLength(len) => write!(f, "invalid name length {:#x}", len),
            ChainTooLong => f.write_str("chain exceeds region capacity (cycle?)"),
            ParentMismatch { expected, found } => write!(
                f,
                "parent is {:#x}, expected {:#x}",
                found, expected
            ),
            DataOutOfBounds => f.write_str("file data exceeds image length"),
        }
    }
}
