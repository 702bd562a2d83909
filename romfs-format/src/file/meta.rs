use std::io::{Read, Seek};

use super::reader::RomFsReader;
use crate::error::{CorruptReason, Error, Result};
use crate::header::Region;
use crate::record::{DirOffset, DirectoryRecord, FileRecord, Record};

/// The immediate children of one directory, each kind in sibling order.
#[derive(Debug, Clone)]
pub struct Listing {
    /// The listed directory itself.
    pub directory: DirectoryRecord,
    pub directories: Vec<DirectoryRecord>,
    pub files: Vec<FileRecord>,
}

/// A flattened listing row for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub is_directory: bool,
    /// `None` for directories.
    pub size: Option<u64>,
}

impl Listing {
    #[inline(always)]
    pub fn dir_count(&self) -> usize {
        self.directories.len()
    }

    #[inline(always)]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }

    /// Directories first, then files.
    pub fn entries(&self) -> impl Iterator<Item = Entry> + '_ {
        let dirs = self.directories.iter().map(|d| Entry {
            name: d.name(),
            is_directory: true,
            size: None,
        });
        let files = self.files.iter().map(|f| Entry {
            name: f.name(),
            is_directory: false,
            size: Some(f.data_size),
        });
        dirs.chain(files)
    }

    pub(crate) fn into_records(self) -> Vec<Record> {
        self.directories
            .into_iter()
            .map(Record::Directory)
            .chain(self.files.into_iter().map(Record::File))
            .collect()
    }
}

/// A single entry returned by [`WalkDir`].
#[derive(Debug, Clone)]
pub struct WalkEntry {
    /// Depth below the starting directory, 1 for its immediate children.
    pub depth: usize,
    /// `/`-joined decoded names relative to the starting directory.
    pub path: String,
    pub record: Record,
}

/// Depth-first iterator over a directory tree, created by
/// [`RomFsReader::walk`]. Stops after the first error.
pub struct WalkDir<'a, R> {
    reader: &'a mut RomFsReader<R>,
    dir_stack: Vec<(usize, String, std::vec::IntoIter<Record>)>,
    budget: u64,
    done: bool,
}

impl<'a, R: Read + Seek> WalkDir<'a, R> {
    pub(crate) fn new(
        reader: &'a mut RomFsReader<R>,
        dir: DirOffset,
        budget: u64,
    ) -> Result<WalkDir<'a, R>> {
        let records = reader.list(dir)?.into_records();
        Ok(WalkDir {
            reader,
            dir_stack: vec![(1, String::new(), records.into_iter())],
            budget,
            done: false,
        })
    }

    fn get_walk_entry(&mut self, depth: usize, prefix: &str, record: Record) -> Result<WalkEntry> {
        if self.budget == 0 {
            let (region, offset) = match &record {
                Record::Directory(dir) => (Region::DirMeta, dir.offset.get()),
                Record::File(file) => (Region::FileMeta, file.offset.get()),
            };
            return Err(Error::corrupt(
                region,
                u64::from(offset),
                CorruptReason::ChainTooLong,
            ));
        }
        self.budget -= 1;

        let path = if prefix.is_empty() {
            record.name()
        } else {
            format!("{}/{}", prefix, record.name())
        };

        if let Record::Directory(dir) = &record {
            let children = self.reader.list(dir.offset)?.into_records();
            self.dir_stack
                .push((depth + 1, path.clone(), children.into_iter()));
        }

        Ok(WalkEntry {
            depth,
            path,
            record,
        })
    }

    fn next_entry(&mut self) -> Option<Result<WalkEntry>> {
        loop {
            let (depth, prefix, next_item) = {
                let (depth, prefix, records) = self.dir_stack.last_mut()?;
                (*depth, prefix.clone(), records.next())
            };

            match next_item {
                Some(record) => return Some(self.get_walk_entry(depth, &prefix, record)),
                None => {
                    self.dir_stack.pop();
                }
            }
        }
    }
}

impl<R: Read + Seek> Iterator for WalkDir<'_, R> {
    type Item = Result<WalkEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.next_entry();
        if let Some(Err(_)) = &item {
            self.done = true;
        }
        item
    }
}
