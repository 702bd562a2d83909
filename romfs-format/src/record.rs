use std::fmt;

use crate::de::Decode;

/// Offset value meaning "no such link".
pub const SENTINEL: u32 = 0xFFFF_FFFF;

/// Longest name a record can carry, in UTF-16 code units.
pub const MAX_NAME_UNITS: usize = 256;

#[inline(always)]
fn link(value: u32) -> Option<u32> {
    if value == SENTINEL {
        None
    } else {
        Some(value)
    }
}

/// Byte offset of a directory record within the directory metadata region.
#[repr(transparent)]
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DirOffset(u32);

impl DirOffset {
    /// The root directory always lives at the start of the region.
    pub const ROOT: DirOffset = DirOffset(0);

    #[inline(always)]
    pub const fn new(value: u32) -> DirOffset {
        DirOffset(value)
    }

    #[inline(always)]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for DirOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DirOffset({:#x})", self.0)
    }
}

/// Byte offset of a file record within the file metadata region.
#[repr(transparent)]
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FileOffset(u32);

impl FileOffset {
    #[inline(always)]
    pub const fn new(value: u32) -> FileOffset {
        FileOffset(value)
    }

    #[inline(always)]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for FileOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileOffset({:#x})", self.0)
    }
}

#[derive(Debug, Clone)]
pub enum Record {
    File(FileRecord),
    Directory(DirectoryRecord),
}

impl Record {
    #[inline(always)]
    pub fn as_file(&self) -> Option<&FileRecord> {
        match self {
            Record::File(file) => Some(file),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn as_directory(&self) -> Option<&DirectoryRecord> {
        match self {
            Record::Directory(dir) => Some(dir),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn name(&self) -> String {
        match self {
            Record::File(file) => file.name(),
            Record::Directory(dir) => dir.name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRecord {
    /// Where this record was read from.
    pub offset: DirOffset,

    /// Raw parent offset. For the root this is meaningless and never followed.
    pub parent: u32,

    pub sibling: Option<DirOffset>,
    pub first_child_dir: Option<DirOffset>,
    pub first_child_file: Option<FileOffset>,

    /// Next record in the same hash bucket.
    pub next_same_hash: Option<DirOffset>,

    /// UTF-16 code units, at most `MAX_NAME_UNITS`. Empty for the root.
    pub name: Vec<u16>,
}

impl DirectoryRecord {
    pub(crate) fn from_raw(offset: u32, fields: [u32; 5], name: Vec<u16>) -> DirectoryRecord {
        let [parent, sibling, child, file, same_hash] = fields;
        DirectoryRecord {
            offset: DirOffset(offset),
            parent,
            sibling: link(sibling).map(DirOffset),
            first_child_dir: link(child).map(DirOffset),
            first_child_file: link(file).map(FileOffset),
            next_same_hash: link(same_hash).map(DirOffset),
            name,
        }
    }

    /// The name decoded for display. Unpaired surrogates become U+FFFD.
    #[inline(always)]
    pub fn name(&self) -> String {
        String::from_utf16_lossy(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub offset: FileOffset,
    pub parent: u32,
    pub sibling: Option<FileOffset>,

    /// Start of the contents, relative to the file data region.
    pub data_offset: u64,

    /// Length of the contents in bytes.
    pub data_size: u64,

    pub next_same_hash: Option<FileOffset>,
    pub name: Vec<u16>,
}

impl FileRecord {
    pub(crate) fn from_raw(
        offset: u32,
        parent: u32,
        sibling: u32,
        data_offset: u64,
        data_size: u64,
        same_hash: u32,
        name: Vec<u16>,
    ) -> FileRecord {
        FileRecord {
            offset: FileOffset(offset),
            parent,
            sibling: link(sibling).map(FileOffset),
            data_offset,
            data_size,
            next_same_hash: link(same_hash).map(FileOffset),
            name,
        }
    }

    #[inline(always)]
    pub fn name(&self) -> String {
        String::from_utf16_lossy(&self.name)
    }
}

/// The links shared by both record kinds, used by the chain walks.
pub(crate) trait LinkedRecord: Decode {
    fn parent(&self) -> u32;
    fn sibling(&self) -> Option<u32>;
    fn next_same_hash(&self) -> Option<u32>;
    fn name_units(&self) -> &[u16];
}

impl LinkedRecord for DirectoryRecord {
    #[inline(always)]
    fn parent(&self) -> u32 {
        self.parent
    }

    #[inline(always)]
    fn sibling(&self) -> Option<u32> {
        self.sibling.map(DirOffset::get)
    }

    #[inline(always)]
    fn next_same_hash(&self) -> Option<u32> {
        self.next_same_hash.map(DirOffset::get)
    }

    #[inline(always)]
    fn name_units(&self) -> &[u16] {
        &self.name
    }
}

impl LinkedRecord for FileRecord {
    #[inline(always)]
    fn parent(&self) -> u32 {
        self.parent
    }

    #[inline(always)]
    fn sibling(&self) -> Option<u32> {
        self.sibling.map(FileOffset::get)
    }

    #[inline(always)]
    fn next_same_hash(&self) -> Option<u32> {
        self.next_same_hash.map(FileOffset::get)
    }

    #[inline(always)]
    fn name_units(&self) -> &[u16] {
        &self.name
    }
}
