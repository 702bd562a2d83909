use std::fs::File;
use std::io::{prelude::*, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use humansize::{file_size_opts as options, FileSize};
use romfs_format::{FileRecord, ReaderOptions, Record, ResolvedPath, RomFsReader};

use crate::error::{Error, Result};

/// Copy buffer size for file contents.
pub const BUFFER_SIZE: usize = 0x10_0000;

pub fn run(
    image: &Path,
    path: &str,
    output: &Path,
    mmap: bool,
    verbose: bool,
    opts: ReaderOptions,
) -> Result<()> {
    let mut rfs = super::open_image(image, opts)?;
    let lookup = |source| Error::Lookup {
        path: path.to_string(),
        source,
    };

    match rfs.resolve(path).map_err(lookup)? {
        ResolvedPath::File(offset) => {
            let record = rfs.file(offset).map_err(lookup)?;
            let dest = output.join(safe_name(&record.name())?);
            let bytes = extract_file(&mut rfs, &record, &dest, mmap, verbose)?;
            println!(
                "Extracted {} ({})",
                dest.display(),
                bytes
                    .file_size(options::BINARY)
                    .unwrap_or_else(|_| bytes.to_string())
            );
        }
        ResolvedPath::Directory(dir) => {
            let record = rfs.directory(dir).map_err(lookup)?;
            let root = if record.name.is_empty() {
                output.to_path_buf()
            } else {
                output.join(safe_name(&record.name())?)
            };
            create_dir(&root)?;

            let entries = rfs
                .walk(dir)
                .map_err(lookup)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(lookup)?;

            let mut files = 0;
            for entry in entries.iter() {
                let dest = join_safe(&root, &entry.path)?;
                if verbose {
                    println!("{}", entry.path);
                }

                match &entry.record {
                    Record::Directory(_) => create_dir(&dest)?,
                    Record::File(file) => {
                        extract_file(&mut rfs, file, &dest, mmap, verbose)?;
                        files += 1;
                    }
                }
            }

            println!("Extracted {} files to {}", files, root.display());
        }
    }

    Ok(())
}

fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|source| Error::CreateOutput {
        path: path.to_path_buf(),
        source,
    })
}

/// Names come from the image, so anything that could escape the output
/// directory is refused.
fn safe_name(name: &str) -> Result<&str> {
    let unsafe_name = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(|c| c == '/' || c == '\\' || c == '\0');

    if unsafe_name {
        return Err(Error::UnsafeName {
            name: name.to_string(),
        });
    }
    Ok(name)
}

fn join_safe(root: &Path, relative: &str) -> Result<PathBuf> {
    let mut path = root.to_path_buf();
    for name in relative.split('/') {
        path.push(safe_name(name)?);
    }
    Ok(path)
}

fn extract_file(
    rfs: &mut RomFsReader<BufReader<File>>,
    record: &FileRecord,
    dest: &Path,
    mmap: bool,
    verbose: bool,
) -> Result<u64> {
    let name = record.name();
    let span = rfs.span_of(record).map_err(|source| Error::Lookup {
        path: name.clone(),
        source,
    })?;

    let file = File::create(dest).map_err(|source| Error::CreateOutput {
        path: dest.to_path_buf(),
        source,
    })?;
    let mut out = BufWriter::new(file);

    let written = if span.is_empty() {
        0
    } else if mmap {
        // SAFETY: the image is opened read-only and not modified while mapped.
        let map = unsafe { rfs.memory_map(span) }.map_err(|source| Error::ReadImage {
            path: dest.to_path_buf(),
            source,
        })?;
        out.write_all(&map).map_err(|source| Error::WriteOutput {
            path: dest.to_path_buf(),
            source,
        })?;
        span.len
    } else {
        let mut reader = rfs.span_reader(span).map_err(|source| Error::Lookup {
            path: name.clone(),
            source,
        })?;
        copy_span(&mut reader, &mut out, span.len, dest, |done, total| {
            if verbose {
                eprint!("\rExtracting: {} ({}/{})", name, done, total);
                if done == total {
                    eprintln!();
                }
            }
        })?
    };

    out.flush().map_err(|source| Error::WriteOutput {
        path: dest.to_path_buf(),
        source,
    })?;

    Ok(written)
}

/// Copies exactly `len` bytes in chunks of at most [`BUFFER_SIZE`],
/// reporting `(copied, len)` after each chunk.
pub(crate) fn copy_span<R: Read, W: Write>(
    src: &mut R,
    dst: &mut W,
    len: u64,
    dest: &Path,
    mut progress: impl FnMut(u64, u64),
) -> Result<u64> {
    let mut buffer = vec![0u8; len.min(BUFFER_SIZE as u64) as usize];
    let mut copied = 0u64;

    while copied < len {
        let chunk = (len - copied).min(BUFFER_SIZE as u64) as usize;
        src.read_exact(&mut buffer[..chunk])
            .map_err(|source| Error::ReadImage {
                path: dest.to_path_buf(),
                source,
            })?;
        dst.write_all(&buffer[..chunk])
            .map_err(|source| Error::WriteOutput {
                path: dest.to_path_buf(),
                source,
            })?;
        copied += chunk as u64;
        progress(copied, len);
    }

    Ok(copied)
}
