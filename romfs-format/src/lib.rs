//! Reader for decrypted RomFS Level 3 images.
//!
//! A Level 3 image is a read-only directory tree indexed by two hash tables,
//! one for directories and one for files. Every lookup walks linked metadata
//! records by byte offset; nothing is cached beyond the header and, optionally,
//! the two hash tables.

mod de;
mod error;
mod file;
mod hash;
mod header;
pub mod path;
mod record;
mod table;

#[cfg(test)]
pub(crate) mod fixture;

pub use error::{CorruptReason, Error, Result};
pub use file::{
    DataSpan, Entry, Listing, ReaderOptions, ResolvedPath, RomFsReader, WalkDir, WalkEntry,
};
pub use hash::{hash_path, HASH_SEED};
pub use header::{Lv3Header, MalformedHeader, Region, DEFAULT_BASE_OFFSET, HEADER_SIZE};
pub use path::{Lv3Name, NameError, RomFsPath};
pub use record::{
    DirOffset, DirectoryRecord, FileOffset, FileRecord, Record, MAX_NAME_UNITS, SENTINEL,
};
