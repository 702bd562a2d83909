//! Synthesizes small Level 3 images for tests.

use std::io::Cursor;

use crate::file::{ReaderOptions, RomFsReader};
use crate::hash::hash_path;
use crate::header::{Lv3Header, HEADER_SIZE};
use crate::record::SENTINEL;

pub(crate) const TEST_BASE: usize = 0x1000;

/// Field positions inside a directory record.
pub(crate) mod dir_field {
    pub const PARENT: usize = 0x00;
    pub const SIBLING: usize = 0x04;
    pub const SAME_HASH: usize = 0x10;
    pub const NAME_LEN: usize = 0x14;
}

/// Field positions inside a file record.
pub(crate) mod file_field {
    pub const PARENT: usize = 0x00;
    pub const SIBLING: usize = 0x04;
    pub const DATA_SIZE: usize = 0x10;
    pub const SAME_HASH: usize = 0x18;
}

struct FixtureDir {
    parent: usize,
    name: Vec<u16>,
    dirs: Vec<usize>,
    files: Vec<usize>,
}

struct FixtureFile {
    parent: usize,
    name: Vec<u16>,
    data: Vec<u8>,
}

pub(crate) struct ImageBuilder {
    base: usize,
    dir_buckets: u32,
    file_buckets: u32,
    dirs: Vec<FixtureDir>,
    files: Vec<FixtureFile>,
}

pub(crate) struct Image {
    pub bytes: Vec<u8>,
    pub base: usize,
    pub header: Lv3Header,
    pub dir_offsets: Vec<u32>,
    pub file_offsets: Vec<u32>,
}

fn align(value: usize, to: usize) -> usize {
    (value + to - 1) / to * to
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_name(out: &mut Vec<u8>, name: &[u16]) {
    put_u32(out, (name.len() * 2) as u32);
    for unit in name {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

/// Chain every entry into its bucket, returning the bucket heads and each
/// entry's same-hash successor. Entries are appended at the chain tail.
fn chain(keys: &[(Vec<u16>, u32, u32)], buckets: u32) -> (Vec<u32>, Vec<u32>) {
    let mut heads = vec![SENTINEL; buckets as usize];
    let mut tails: Vec<Option<usize>> = vec![None; buckets as usize];
    let mut next = vec![SENTINEL; keys.len()];

    for (index, (name, parent, offset)) in keys.iter().enumerate() {
        let bucket = (hash_path(name, *parent) % buckets) as usize;
        match tails[bucket] {
            Some(tail) => next[tail] = *offset,
            None => heads[bucket] = *offset,
        }
        tails[bucket] = Some(index);
    }

    (heads, next)
}

impl ImageBuilder {
    pub fn new() -> ImageBuilder {
        ImageBuilder {
            base: TEST_BASE,
            dir_buckets: 4,
            file_buckets: 4,
            dirs: vec![FixtureDir {
                parent: 0,
                name: vec![],
                dirs: vec![],
                files: vec![],
            }],
            files: vec![],
        }
    }

    pub fn base(mut self, base: usize) -> ImageBuilder {
        self.base = base;
        self
    }

    pub fn buckets(mut self, dirs: u32, files: u32) -> ImageBuilder {
        self.dir_buckets = dirs;
        self.file_buckets = files;
        self
    }

    /// Add a directory under the directory with index `parent` (0 is the root).
    pub fn dir(&mut self, parent: usize, name: &str) -> usize {
        let index = self.dirs.len();
        self.dirs.push(FixtureDir {
            parent,
            name: name.encode_utf16().collect(),
            dirs: vec![],
            files: vec![],
        });
        self.dirs[parent].dirs.push(index);
        index
    }

    pub fn file(&mut self, parent: usize, name: &str, data: &[u8]) -> usize {
        let index = self.files.len();
        self.files.push(FixtureFile {
            parent,
            name: name.encode_utf16().collect(),
            data: data.to_vec(),
        });
        self.dirs[parent].files.push(index);
        index
    }

    pub fn build(&self) -> Image {
        let mut dir_offsets = vec![];
        let mut cursor = 0;
        for dir in &self.dirs {
            dir_offsets.push(cursor as u32);
            cursor += 0x18 + align(dir.name.len() * 2, 4);
        }

        let mut file_offsets = vec![];
        let mut data_offsets = vec![];
        let mut meta_cursor = 0;
        let mut data_cursor = 0;
        for file in &self.files {
            file_offsets.push(meta_cursor as u32);
            meta_cursor += 0x20 + align(file.name.len() * 2, 4);
            data_offsets.push(data_cursor as u64);
            data_cursor = align(data_cursor + file.data.len(), 16);
        }

        let dir_keys: Vec<_> = self
            .dirs
            .iter()
            .zip(&dir_offsets)
            .map(|(d, &o)| (d.name.clone(), dir_offsets[d.parent], o))
            .collect();
        let file_keys: Vec<_> = self
            .files
            .iter()
            .zip(&file_offsets)
            .map(|(f, &o)| (f.name.clone(), dir_offsets[f.parent], o))
            .collect();
        let (dir_heads, dir_next) = chain(&dir_keys, self.dir_buckets);
        let (file_heads, file_next) = chain(&file_keys, self.file_buckets);

        let mut dir_sibling = vec![SENTINEL; self.dirs.len()];
        let mut file_sibling = vec![SENTINEL; self.files.len()];
        for dir in &self.dirs {
            for pair in dir.dirs.windows(2) {
                dir_sibling[pair[0]] = dir_offsets[pair[1]];
            }
            for pair in dir.files.windows(2) {
                file_sibling[pair[0]] = file_offsets[pair[1]];
            }
        }

        let mut dir_meta = vec![];
        for (index, dir) in self.dirs.iter().enumerate() {
            put_u32(&mut dir_meta, dir_offsets[dir.parent]);
            put_u32(&mut dir_meta, dir_sibling[index]);
            put_u32(
                &mut dir_meta,
                dir.dirs.first().map_or(SENTINEL, |&d| dir_offsets[d]),
            );
            put_u32(
                &mut dir_meta,
                dir.files.first().map_or(SENTINEL, |&f| file_offsets[f]),
            );
            put_u32(&mut dir_meta, dir_next[index]);
            put_name(&mut dir_meta, &dir.name);
        }

        let mut file_meta = vec![];
        for (index, file) in self.files.iter().enumerate() {
            put_u32(&mut file_meta, dir_offsets[file.parent]);
            put_u32(&mut file_meta, file_sibling[index]);
            file_meta.extend_from_slice(&data_offsets[index].to_le_bytes());
            file_meta.extend_from_slice(&(file.data.len() as u64).to_le_bytes());
            put_u32(&mut file_meta, file_next[index]);
            put_name(&mut file_meta, &file.name);
        }

        let mut header = Lv3Header {
            size_header: HEADER_SIZE,
            offset_dirhash: HEADER_SIZE,
            size_dirhash: self.dir_buckets * 4,
            ..Lv3Header::default()
        };
        header.offset_dirmeta = header.offset_dirhash + header.size_dirhash;
        header.size_dirmeta = dir_meta.len() as u32;
        header.offset_filehash = header.offset_dirmeta + header.size_dirmeta;
        header.size_filehash = self.file_buckets * 4;
        header.offset_filemeta = header.offset_filehash + header.size_filehash;
        header.size_filemeta = file_meta.len() as u32;
        header.offset_filedata =
            align((header.offset_filemeta + header.size_filemeta) as usize, 16) as u32;

        let mut bytes = vec![0u8; self.base];
        for value in &[
            header.size_header,
            header.offset_dirhash,
            header.size_dirhash,
            header.offset_dirmeta,
            header.size_dirmeta,
            header.offset_filehash,
            header.size_filehash,
            header.offset_filemeta,
            header.size_filemeta,
            header.offset_filedata,
        ] {
            put_u32(&mut bytes, *value);
        }
        for head in &dir_heads {
            put_u32(&mut bytes, *head);
        }
        bytes.extend_from_slice(&dir_meta);
        for head in &file_heads {
            put_u32(&mut bytes, *head);
        }
        bytes.extend_from_slice(&file_meta);
        bytes.resize(self.base + header.offset_filedata as usize, 0);
        for (file, offset) in self.files.iter().zip(&data_offsets) {
            let start = self.base + header.offset_filedata as usize + *offset as usize;
            bytes.resize(start, 0);
            bytes.extend_from_slice(&file.data);
        }

        Image {
            bytes,
            base: self.base,
            header,
            dir_offsets,
            file_offsets,
        }
    }
}

impl Image {
    /// Absolute position of a directory record's field.
    pub fn dir_field(&self, dir: usize, field: usize) -> usize {
        self.base + self.header.offset_dirmeta as usize + self.dir_offsets[dir] as usize + field
    }

    pub fn file_field(&self, file: usize, field: usize) -> usize {
        self.base + self.header.offset_filemeta as usize + self.file_offsets[file] as usize + field
    }

    pub fn dir_bucket(&self, bucket: usize) -> usize {
        self.base + self.header.offset_dirhash as usize + bucket * 4
    }

    pub fn patch_u32(&mut self, pos: usize, value: u32) {
        self.bytes[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub fn patch_u64(&mut self, pos: usize, value: u64) {
        self.bytes[pos..pos + 8].copy_from_slice(&value.to_le_bytes());
    }

    pub fn options(&self) -> ReaderOptions {
        ReaderOptions {
            base_offset: self.base as u64,
            ..ReaderOptions::default()
        }
    }

    pub fn reader(&self) -> RomFsReader<Cursor<Vec<u8>>> {
        RomFsReader::new(Cursor::new(self.bytes.clone()), self.options()).unwrap()
    }
}

#[test]
fn built_header_is_valid() {
    let mut builder = ImageBuilder::new();
    let sound = builder.dir(0, "sound");
    builder.file(sound, "a.bin", b"abc");
    let image = builder.build();
    assert_eq!(image.header.validate(), Ok(()));
    assert!(image
        .header
        .validate_len(image.base as u64, image.bytes.len() as u64)
        .is_ok());
}
