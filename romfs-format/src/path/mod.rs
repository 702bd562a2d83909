//! Path components as the image stores them.
//!
//! Lookup names are widened one character to one UTF-16 code unit, exactly
//! as the hash and the stored names expect. Only characters in
//! U+0000..=U+00FF (ASCII and Latin-1) survive that widening unchanged, so
//! anything beyond is rejected with [`NameError::Unrepresentable`] instead
//! of being hashed into a name that can never match.

use std::fmt;

use crate::record::MAX_NAME_UNITS;

mod error;

pub use self::error::NameError;

/// Separator between components of a lookup path.
pub const PATH_SEP: char = '/';

/// A single lookup name, widened to UTF-16 code units.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Lv3Name(Vec<u16>);

impl Lv3Name {
    pub fn new(name: &str) -> Result<Lv3Name, NameError> {
        let units = name
            .chars()
            .map(|ch| {
                if (ch as u32) <= 0xFF {
                    Ok(ch as u16)
                } else {
                    Err(NameError::Unrepresentable { ch })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Lv3Name::from_units(units)
    }

    /// Widen raw single-byte characters by zero extension.
    pub fn from_bytes(name: &[u8]) -> Result<Lv3Name, NameError> {
        Lv3Name::from_units(name.iter().map(|&b| u16::from(b)).collect())
    }

    fn from_units(units: Vec<u16>) -> Result<Lv3Name, NameError> {
        if units.is_empty() {
            return Err(NameError::Empty);
        }
        if units.len() > MAX_NAME_UNITS {
            return Err(NameError::TooLong { len: units.len() });
        }
        Ok(Lv3Name(units))
    }

    #[inline(always)]
    pub fn units(&self) -> &[u16] {
        &self.0
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Lv3Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf16_lossy(&self.0))
    }
}

/// A `/`-separated lookup path. Empty components are dropped, so `""`, `"/"`
/// and `"//"` all name the root. `.` and `..` have no special meaning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RomFsPath(Vec<Lv3Name>);

impl RomFsPath {
    pub fn new(path: &str) -> Result<RomFsPath, NameError> {
        path.split(PATH_SEP)
            .filter(|x| !x.is_empty())
            .map(Lv3Name::new)
            .collect::<Result<Vec<_>, _>>()
            .map(RomFsPath)
    }

    #[inline(always)]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    #[inline(always)]
    pub fn components(&self) -> &[Lv3Name] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// The final component and the directory components leading up to it.
    pub fn split_last(&self) -> Option<(&Lv3Name, &[Lv3Name])> {
        self.0.split_last()
    }
}

impl fmt::Display for RomFsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iter = self.0.iter();
        if let Some(v) = iter.next() {
            write!(f, "{}", v)?;
        }
        for v in iter {
            write!(f, "{}{}", PATH_SEP, v)?;
        }
        Ok(())
    }
}
