use std::fmt;

/// Exact size of the Level 3 header in bytes.
pub const HEADER_SIZE: u32 = 0x28;

/// Where the Level 3 header sits inside a decrypted RomFS container.
pub const DEFAULT_BASE_OFFSET: u64 = 0x1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    DirHash,
    DirMeta,
    FileHash,
    FileMeta,
    FileData,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Region::*;

        let s = match self {
            DirHash => "directory hash",
            DirMeta => "directory metadata",
            FileHash => "file hash",
            FileMeta => "file metadata",
            FileData => "file data",
        };

        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedHeader {
    #[error("header is only {0} bytes long")]
    Truncated(usize),

    #[error("header size is {0:#x}, expected 0x28")]
    HeaderSize(u32),

    #[error("{region} region starts at {start:#x}, before the end of the previous region at {min:#x}")]
    Overlap { region: Region, start: u64, min: u64 },

    #[error("{0} region has unusable size {1:#x}")]
    HashTableSize(Region, u32),

    #[error("image is {len:#x} bytes but file data starts at {required:#x}")]
    ImageTooShort { len: u64, required: u64 },
}

/// The fixed 40-byte Level 3 header. All offsets are relative to the
/// header's own position in the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Lv3Header {
    pub size_header: u32,
    pub offset_dirhash: u32,
    pub size_dirhash: u32,
    pub offset_dirmeta: u32,
    pub size_dirmeta: u32,
    pub offset_filehash: u32,
    pub size_filehash: u32,
    pub offset_filemeta: u32,
    pub size_filemeta: u32,
    pub offset_filedata: u32,
}

impl Lv3Header {
    /// Decode and validate a header from the first 0x28 bytes of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Lv3Header, MalformedHeader> {
        let header = crate::de::decode_header(bytes)?;
        header.validate()?;
        Ok(header)
    }

    /// Check the header size and that the five regions are laid out in order
    /// without overlapping.
    pub fn validate(&self) -> Result<(), MalformedHeader> {
        if self.size_header != HEADER_SIZE {
            return Err(MalformedHeader::HeaderSize(self.size_header));
        }

        let mut min = u64::from(self.size_header);
        for &(region, offset, size) in &self.layout() {
            let start = u64::from(offset);
            if start < min {
                return Err(MalformedHeader::Overlap { region, start, min });
            }
            min = start + u64::from(size.unwrap_or(0));
        }

        for &(region, size) in &[
            (Region::DirHash, self.size_dirhash),
            (Region::FileHash, self.size_filehash),
        ] {
            if size == 0 || size % 4 != 0 {
                return Err(MalformedHeader::HashTableSize(region, size));
            }
        }

        Ok(())
    }

    /// Check that an image of `len` bytes, with the header at `base`, reaches
    /// at least the start of the file data region.
    pub fn validate_len(&self, base: u64, len: u64) -> Result<(), MalformedHeader> {
        let required = base + u64::from(self.offset_filedata);
        if len < required {
            return Err(MalformedHeader::ImageTooShort { len, required });
        }
        Ok(())
    }

    /// Regions in on-disk order as `(region, offset, size)`. File data has no
    /// recorded size; it runs to the end of the image.
    pub fn layout(&self) -> [(Region, u32, Option<u32>); 5] {
        [
            (Region::DirHash, self.offset_dirhash, Some(self.size_dirhash)),
            (Region::DirMeta, self.offset_dirmeta, Some(self.size_dirmeta)),
            (Region::FileHash, self.offset_filehash, Some(self.size_filehash)),
            (Region::FileMeta, self.offset_filemeta, Some(self.size_filemeta)),
            (Region::FileData, self.offset_filedata, None),
        ]
    }

    #[inline(always)]
    pub fn dir_buckets(&self) -> u32 {
        self.size_dirhash / 4
    }

    #[inline(always)]
    pub fn file_buckets(&self) -> u32 {
        self.size_filehash / 4
    }
}
