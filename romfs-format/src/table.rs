use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::header::Region;
use crate::record::SENTINEL;

/// One of the two bucket arrays. Each slot holds the offset of the first
/// record in that bucket's same-hash chain, or `SENTINEL`.
#[derive(Debug, Clone)]
pub(crate) enum HashTable {
    Loaded {
        region: Region,
        buckets: Vec<u32>,
    },
    Lazy {
        region: Region,
        start: u64,
        buckets: u32,
    },
}

impl HashTable {
    /// Read every bucket of a region of `size` bytes starting at `start`.
    pub(crate) fn load<R: Read + Seek>(
        reader: &mut R,
        region: Region,
        start: u64,
        size: u32,
    ) -> std::io::Result<HashTable> {
        reader.seek(SeekFrom::Start(start))?;
        let mut buckets = vec![0u32; (size / 4) as usize];
        reader.read_u32_into::<LittleEndian>(&mut buckets)?;

        tracing::debug!(
            %region,
            start = format_args!("{:#x}", start),
            end = format_args!("{:#x}", start + u64::from(size)),
            count = buckets.len(),
            "loaded hash table"
        );

        Ok(HashTable::Loaded { region, buckets })
    }

    pub(crate) fn lazy(region: Region, start: u64, size: u32) -> HashTable {
        HashTable::Lazy {
            region,
            start,
            buckets: size / 4,
        }
    }

    #[inline(always)]
    pub(crate) fn region(&self) -> Region {
        match self {
            HashTable::Loaded { region, .. } | HashTable::Lazy { region, .. } => *region,
        }
    }

    #[inline(always)]
    pub(crate) fn bucket_count(&self) -> u32 {
        match self {
            HashTable::Loaded { buckets, .. } => buckets.len() as u32,
            HashTable::Lazy { buckets, .. } => *buckets,
        }
    }

    /// First record offset for `hash`, or `None` when the bucket is empty.
    pub(crate) fn bucket_head<R: Read + Seek>(
        &self,
        reader: &mut R,
        hash: u32,
    ) -> std::io::Result<Option<u32>> {
        let index = hash % self.bucket_count();
        let head = match self {
            HashTable::Loaded { buckets, .. } => buckets[index as usize],
            HashTable::Lazy { start, .. } => {
                reader.seek(SeekFrom::Start(start + u64::from(index) * 4))?;
                reader.read_u32::<LittleEndian>()?
            }
        };

        tracing::trace!(
            region = %self.region(),
            hash = format_args!("{:#010x}", hash),
            index,
            head = format_args!("{:#x}", head),
            "bucket head"
        );

        Ok(if head == SENTINEL { None } else { Some(head) })
    }
}
