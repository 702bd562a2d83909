use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use romfs_format::{ReaderOptions, RomFsReader};

use crate::error::{Error, Result};

pub mod extract;
pub mod info;
pub mod list;

pub use extract::run as extract;
pub use info::run as info;
pub use list::run as list;

pub(crate) fn open_image(
    path: &Path,
    options: ReaderOptions,
) -> Result<RomFsReader<BufReader<File>>> {
    RomFsReader::open_with_options(path, options).map_err(|source| Error::OpenImage {
        path: path.to_path_buf(),
        source,
    })
}
