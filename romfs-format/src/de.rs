use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};

use crate::header::{Lv3Header, MalformedHeader, Region, HEADER_SIZE};
use crate::record::{DirectoryRecord, FileRecord};

/// A metadata record with a fixed little-endian prefix followed by a
/// UTF-16LE name whose byte length is stored in the prefix.
pub(crate) trait Decode: Sized {
    const REGION: Region;
    const FIXED_SIZE: usize;

    /// Byte length of the name, read from the fixed prefix.
    fn name_len(fixed: &[u8]) -> u32;

    /// `fixed` is exactly `FIXED_SIZE` bytes, `name` exactly `name_len` bytes.
    fn decode(offset: u32, fixed: &[u8], name: &[u8]) -> Self;
}

pub(crate) fn decode_header(bytes: &[u8]) -> Result<Lv3Header, MalformedHeader> {
    if bytes.len() < HEADER_SIZE as usize {
        return Err(MalformedHeader::Truncated(bytes.len()));
    }

    let mut cursor = &bytes[..HEADER_SIZE as usize];
    let mut next = || {
        cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| MalformedHeader::Truncated(bytes.len()))
    };

    let header = Lv3Header {
        size_header: next()?,
        offset_dirhash: next()?,
        size_dirhash: next()?,
        offset_dirmeta: next()?,
        size_dirmeta: next()?,
        offset_filehash: next()?,
        size_filehash: next()?,
        offset_filemeta: next()?,
        size_filemeta: next()?,
        offset_filedata: next()?,
    };

    tracing::debug!(
        size_header = format_args!("{:#x}", header.size_header),
        dirhash = format_args!("{:#x}+{:#x}", header.offset_dirhash, header.size_dirhash),
        dirmeta = format_args!("{:#x}+{:#x}", header.offset_dirmeta, header.size_dirmeta),
        filehash = format_args!("{:#x}+{:#x}", header.offset_filehash, header.size_filehash),
        filemeta = format_args!("{:#x}+{:#x}", header.offset_filemeta, header.size_filemeta),
        filedata = format_args!("{:#x}", header.offset_filedata),
        "deserialized Lv3Header"
    );

    Ok(header)
}

fn decode_name(name: &[u8]) -> Vec<u16> {
    let mut units = vec![0u16; name.len() / 2];
    LittleEndian::read_u16_into(&name[..units.len() * 2], &mut units);
    units
}

impl Decode for DirectoryRecord {
    const REGION: Region = Region::DirMeta;
    const FIXED_SIZE: usize = 0x18;

    fn name_len(fixed: &[u8]) -> u32 {
        LittleEndian::read_u32(&fixed[0x14..0x18])
    }

    fn decode(offset: u32, fixed: &[u8], name: &[u8]) -> Self {
        DirectoryRecord::from_raw(
            offset,
            [
                LittleEndian::read_u32(&fixed[0x00..0x04]),
                LittleEndian::read_u32(&fixed[0x04..0x08]),
                LittleEndian::read_u32(&fixed[0x08..0x0C]),
                LittleEndian::read_u32(&fixed[0x0C..0x10]),
                LittleEndian::read_u32(&fixed[0x10..0x14]),
            ],
            decode_name(name),
        )
    }
}

impl Decode for FileRecord {
    const REGION: Region = Region::FileMeta;
    const FIXED_SIZE: usize = 0x20;

    fn name_len(fixed: &[u8]) -> u32 {
        LittleEndian::read_u32(&fixed[0x1C..0x20])
    }

    fn decode(offset: u32, fixed: &[u8], name: &[u8]) -> Self {
        FileRecord::from_raw(
            offset,
            LittleEndian::read_u32(&fixed[0x00..0x04]),
            LittleEndian::read_u32(&fixed[0x04..0x08]),
            LittleEndian::read_u64(&fixed[0x08..0x10]),
            LittleEndian::read_u64(&fixed[0x10..0x18]),
            LittleEndian::read_u32(&fixed[0x18..0x1C]),
            decode_name(name),
        )
    }
}
