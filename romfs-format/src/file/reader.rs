use std::fs::{File, OpenOptions};
use std::io::{prelude::*, BufReader, SeekFrom};
use std::path::Path;

use memmap2::MmapOptions;

use super::meta::{Listing, WalkDir};
use super::{DataSpan, ReaderOptions, ResolvedPath};
use crate::de::Decode;
use crate::error::{CorruptReason, Error, Result};
use crate::hash::hash_path;
use crate::header::{Lv3Header, Region, HEADER_SIZE};
use crate::path::{Lv3Name, RomFsPath};
use crate::record::{
    DirOffset, DirectoryRecord, FileOffset, FileRecord, LinkedRecord, MAX_NAME_UNITS,
};
use crate::table::HashTable;

/// An open Level 3 image.
///
/// Owns the backing reader, the validated header and both hash tables. All
/// lookups seek, so every operation takes `&mut self`.
#[derive(Debug)]
pub struct RomFsReader<R> {
    pub(crate) reader: R,
    pub(crate) header: Lv3Header,
    pub(crate) options: ReaderOptions,
    pub(crate) len: u64,
    dir_table: HashTable,
    file_table: HashTable,
}

impl RomFsReader<BufReader<File>> {
    /// Open an image file with the default options.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<RomFsReader<BufReader<File>>> {
        RomFsReader::open_with_options(path, ReaderOptions::default())
    }

    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        options: ReaderOptions,
    ) -> Result<RomFsReader<BufReader<File>>> {
        let file = OpenOptions::new().read(true).open(path.as_ref())?;
        RomFsReader::new(BufReader::new(file), options)
    }

    /// Map a file's contents straight from the image.
    ///
    /// # Safety
    ///
    /// The image must not be modified while the map is alive. `span` must be
    /// non-empty; zero-length maps are rejected by some platforms.
    #[inline(always)]
    pub unsafe fn memory_map(&self, span: DataSpan) -> std::io::Result<memmap2::Mmap> {
        MmapOptions::new()
            .offset(span.offset)
            .len(span.len as usize)
            .map(self.reader.get_ref())
    }
}

impl<R: Read + Seek> RomFsReader<R> {
    /// Read and validate the header at `options.base_offset`, then set up the
    /// hash tables.
    pub fn new(mut reader: R, options: ReaderOptions) -> Result<RomFsReader<R>> {
        let len = reader.seek(SeekFrom::End(0))?;
        let base = options.base_offset;

        let mut bytes = Vec::with_capacity(HEADER_SIZE as usize);
        if base < len {
            reader.seek(SeekFrom::Start(base))?;
            reader
                .by_ref()
                .take(u64::from(HEADER_SIZE))
                .read_to_end(&mut bytes)?;
        }

        let header = Lv3Header::parse(&bytes)?;
        header.validate_len(base, len)?;

        let dir_start = base + u64::from(header.offset_dirhash);
        let file_start = base + u64::from(header.offset_filehash);
        let (dir_table, file_table) = if options.preload_hash_tables {
            (
                HashTable::load(&mut reader, Region::DirHash, dir_start, header.size_dirhash)?,
                HashTable::load(&mut reader, Region::FileHash, file_start, header.size_filehash)?,
            )
        } else {
            (
                HashTable::lazy(Region::DirHash, dir_start, header.size_dirhash),
                HashTable::lazy(Region::FileHash, file_start, header.size_filehash),
            )
        };

        tracing::debug!(
            base = format_args!("{:#x}", base),
            len = format_args!("{:#x}", len),
            dir_buckets = dir_table.bucket_count(),
            file_buckets = file_table.bucket_count(),
            preloaded = options.preload_hash_tables,
            "opened image"
        );

        Ok(RomFsReader {
            reader,
            header,
            options,
            len,
            dir_table,
            file_table,
        })
    }

    #[inline(always)]
    pub fn header(&self) -> &Lv3Header {
        &self.header
    }

    #[inline(always)]
    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Total length of the backing image in bytes.
    #[inline(always)]
    pub fn image_len(&self) -> u64 {
        self.len
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Absolute position of a region's first byte in the backing image.
    #[inline(always)]
    pub fn region_start(&self, region: Region) -> u64 {
        let offset = match region {
            Region::DirHash => self.header.offset_dirhash,
            Region::DirMeta => self.header.offset_dirmeta,
            Region::FileHash => self.header.offset_filehash,
            Region::FileMeta => self.header.offset_filemeta,
            Region::FileData => self.header.offset_filedata,
        };
        self.options.base_offset + u64::from(offset)
    }

    fn region_size(&self, region: Region) -> u64 {
        match region {
            Region::DirHash => u64::from(self.header.size_dirhash),
            Region::DirMeta => u64::from(self.header.size_dirmeta),
            Region::FileHash => u64::from(self.header.size_filehash),
            Region::FileMeta => u64::from(self.header.size_filemeta),
            Region::FileData => self.len.saturating_sub(self.region_start(Region::FileData)),
        }
    }

    /// Most records a chain may visit before it must have looped: every
    /// record occupies at least its fixed prefix.
    #[inline(always)]
    fn chain_limit<T: Decode>(&self) -> u64 {
        self.region_size(T::REGION) / T::FIXED_SIZE as u64
    }

    fn read_exact_at(&mut self, buf: &mut [u8], region: Region, offset: u64) -> Result<()> {
        match self.reader.read_exact(buf) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(Error::corrupt(region, offset, CorruptReason::ShortRead))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read the record at `offset` within its metadata region. The whole
    /// record, name included, must lie inside the region.
    pub(crate) fn read_record<T: Decode>(&mut self, offset: u32) -> Result<T> {
        let region = T::REGION;
        let offset64 = u64::from(offset);
        let size = self.region_size(region);

        let fixed_end = offset64 + T::FIXED_SIZE as u64;
        if fixed_end > size {
            return Err(Error::corrupt(region, offset64, CorruptReason::OutOfBounds));
        }

        let start = self.region_start(region) + offset64;
        self.reader.seek(SeekFrom::Start(start))?;
        let mut fixed = vec![0u8; T::FIXED_SIZE];
        self.read_exact_at(&mut fixed, region, offset64)?;

        let name_len = T::name_len(&fixed);
        if name_len % 2 != 0 || name_len as usize > MAX_NAME_UNITS * 2 {
            return Err(Error::corrupt(
                region,
                offset64,
                CorruptReason::NameLength(name_len),
            ));
        }
        if fixed_end + u64::from(name_len) > size {
            return Err(Error::corrupt(region, offset64, CorruptReason::OutOfBounds));
        }

        let mut name = vec![0u8; name_len as usize];
        self.read_exact_at(&mut name, region, offset64)?;

        tracing::debug!(
            %region,
            start = format_args!("{:#x}", start),
            end = format_args!("{:#x}", start + T::FIXED_SIZE as u64 + u64::from(name_len)),
            name_len,
            "deserialized record"
        );

        Ok(T::decode(offset, &fixed, &name))
    }

    /// Walk the same-hash chain for `name` under `parent`.
    ///
    /// Records whose parent or name differ are skipped, not treated as
    /// corruption. Returns `Ok(None)` when the chain ends without a match.
    fn find<T: LinkedRecord>(&mut self, name: &Lv3Name, parent: u32) -> Result<Option<T>> {
        let hash = hash_path(name.units(), parent);
        let table = match T::REGION {
            Region::DirMeta => &self.dir_table,
            _ => &self.file_table,
        };
        let mut next = table.bucket_head(&mut self.reader, hash)?;

        let limit = self.chain_limit::<T>();
        let mut visited = 0u64;

        while let Some(offset) = next {
            let record: T = self.read_record(offset)?;
            visited += 1;
            if visited > limit {
                return Err(Error::corrupt(
                    T::REGION,
                    u64::from(offset),
                    CorruptReason::ChainTooLong,
                ));
            }

            if record.parent() == parent && record.name_units() == name.units() {
                tracing::trace!(%name, offset = format_args!("{:#x}", offset), "found");
                return Ok(Some(record));
            }

            tracing::trace!(%name, offset = format_args!("{:#x}", offset), "skipped");
            next = record.next_same_hash();
        }

        Ok(None)
    }

    /// Resolve each name as a directory, left to right, starting at the root.
    fn find_dirs(&mut self, names: &[Lv3Name]) -> Result<Option<DirOffset>> {
        let mut current = DirOffset::ROOT;
        for name in names {
            match self.find::<DirectoryRecord>(name, current.get())? {
                Some(record) => current = record.offset,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Resolve a `/`-separated path to a directory. The empty path is the root.
    pub fn resolve_dir(&mut self, path: &str) -> Result<DirOffset> {
        let path = RomFsPath::new(path)?;
        self.resolve_dir_path(&path)
    }

    pub fn resolve_dir_path(&mut self, path: &RomFsPath) -> Result<DirOffset> {
        self.find_dirs(path.components())?
            .ok_or_else(|| not_found(path))
    }

    /// Resolve a `/`-separated path to a file. All but the last component
    /// are directories; the empty path never names a file.
    pub fn resolve_file(&mut self, path: &str) -> Result<FileOffset> {
        let path = RomFsPath::new(path)?;
        self.resolve_file_path(&path)
    }

    pub fn resolve_file_path(&mut self, path: &RomFsPath) -> Result<FileOffset> {
        let (name, dirs) = path.split_last().ok_or_else(|| not_found(path))?;
        let parent = match self.find_dirs(dirs)? {
            Some(parent) => parent,
            None => return Err(not_found(path)),
        };

        self.find::<FileRecord>(name, parent.get())?
            .map(|record| record.offset)
            .ok_or_else(|| not_found(path))
    }

    /// Resolve a path as a directory if possible, otherwise as a file.
    pub fn resolve(&mut self, path: &str) -> Result<ResolvedPath> {
        let path = RomFsPath::new(path)?;
        match self.resolve_dir_path(&path) {
            Ok(dir) => Ok(ResolvedPath::Directory(dir)),
            Err(e) if e.is_not_found() => {
                self.resolve_file_path(&path).map(ResolvedPath::File)
            }
            Err(e) => Err(e),
        }
    }

    #[inline(always)]
    pub fn directory(&mut self, offset: DirOffset) -> Result<DirectoryRecord> {
        self.read_record(offset.get())
    }

    #[inline(always)]
    pub fn file(&mut self, offset: FileOffset) -> Result<FileRecord> {
        self.read_record(offset.get())
    }

    /// Follow a sibling chain from `first`, checking every record points back
    /// at `parent`.
    fn siblings<T: LinkedRecord>(&mut self, first: Option<u32>, parent: DirOffset) -> Result<Vec<T>> {
        let limit = self.chain_limit::<T>();
        let mut out = vec![];
        let mut next = first;

        while let Some(offset) = next {
            if out.len() as u64 >= limit {
                return Err(Error::corrupt(
                    T::REGION,
                    u64::from(offset),
                    CorruptReason::ChainTooLong,
                ));
            }

            let record: T = self.read_record(offset)?;
            if record.parent() != parent.get() {
                return Err(Error::corrupt(
                    T::REGION,
                    u64::from(offset),
                    CorruptReason::ParentMismatch {
                        expected: parent.get(),
                        found: record.parent(),
                    },
                ));
            }

            next = record.sibling();
            out.push(record);
        }

        Ok(out)
    }

    /// Immediate children of a directory, in on-disk sibling order.
    pub fn list(&mut self, dir: DirOffset) -> Result<Listing> {
        let directory: DirectoryRecord = self.read_record(dir.get())?;
        let directories =
            self.siblings(directory.first_child_dir.map(DirOffset::get), dir)?;
        let files = self.siblings(directory.first_child_file.map(FileOffset::get), dir)?;

        tracing::debug!(
            dir = format_args!("{:#x}", dir.get()),
            directories = directories.len(),
            files = files.len(),
            "listed directory"
        );

        Ok(Listing {
            directory,
            directories,
            files,
        })
    }

    pub fn read_dir(&mut self, path: &str) -> Result<Listing> {
        let dir = self.resolve_dir(path)?;
        self.list(dir)
    }

    /// Recursively walk everything below `dir`, depth first.
    pub fn walk(&mut self, dir: DirOffset) -> Result<WalkDir<'_, R>> {
        let budget = self.chain_limit::<DirectoryRecord>() + self.chain_limit::<FileRecord>();
        WalkDir::new(self, dir, budget)
    }

    /// Where a file's contents live in the backing image.
    pub fn file_data_span(&mut self, file: FileOffset) -> Result<DataSpan> {
        let record = self.file(file)?;
        self.span_of(&record)
    }

    pub fn span_of(&self, record: &FileRecord) -> Result<DataSpan> {
        let offset = self
            .region_start(Region::FileData)
            .checked_add(record.data_offset);
        let end = offset.and_then(|o| o.checked_add(record.data_size));

        match (offset, end) {
            (Some(offset), Some(end)) if end <= self.len => Ok(DataSpan {
                offset,
                len: record.data_size,
            }),
            _ => Err(Error::corrupt(
                Region::FileMeta,
                u64::from(record.offset.get()),
                CorruptReason::DataOutOfBounds,
            )),
        }
    }

    /// A reader over exactly the bytes of `span`. Nothing is read or sought
    /// for an empty span.
    pub fn span_reader(&mut self, span: DataSpan) -> Result<std::io::Take<&mut R>> {
        if span.len > 0 {
            self.reader.seek(SeekFrom::Start(span.offset))?;
        }
        Ok(self.reader.by_ref().take(span.len))
    }
}

fn not_found(path: &RomFsPath) -> Error {
    Error::NotFound {
        path: path.to_string(),
    }
}
