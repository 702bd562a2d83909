use crate::header::DEFAULT_BASE_OFFSET;
use crate::record::{DirOffset, FileOffset};

pub(crate) mod meta;
pub mod reader;

pub use self::meta::{Entry, Listing, WalkDir, WalkEntry};
pub use self::reader::RomFsReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Position of the Level 3 header in the backing image.
    pub base_offset: u64,

    /// Read both hash tables into memory on open instead of reading one
    /// bucket per lookup. Lookups behave identically either way.
    pub preload_hash_tables: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            base_offset: DEFAULT_BASE_OFFSET,
            preload_hash_tables: true,
        }
    }
}

/// Absolute location of a file's contents in the backing image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSpan {
    pub offset: u64,
    pub len: u64,
}

impl DataSpan {
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedPath {
    Directory(DirOffset),
    File(FileOffset),
}
