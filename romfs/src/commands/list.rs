use std::path::Path;

use humansize::{file_size_opts as options, FileSize};
use romfs_format::{Entry, Listing, ReaderOptions};
use serde_json::json;

use crate::error::{Error, Result};

pub fn run(image: &Path, path: &str, json: bool, opts: ReaderOptions) -> Result<()> {
    let mut rfs = super::open_image(image, opts)?;
    let listing = rfs.read_dir(path).map_err(|source| Error::Lookup {
        path: path.to_string(),
        source,
    })?;

    if json {
        let value = to_json(path, &listing);
        let text = serde_json::to_string_pretty(&value).map_err(|source| Error::Render { source })?;
        println!("{}", text);
    } else {
        print!("{}", render(path, &listing));
    }

    Ok(())
}

#[inline(always)]
fn format_size(entry: &Entry) -> String {
    match entry.size {
        Some(size) => size
            .file_size(options::BINARY)
            .unwrap_or_else(|_| size.to_string()),
        None => "<directory>".to_string(),
    }
}

fn render(path: &str, listing: &Listing) -> String {
    let mut out = String::new();
    let title = if path.is_empty() { "ROOT" } else { path };
    out.push_str(&format!("Directory: {}\n\n", title));
    out.push_str("  #   Size          Name\n");
    out.push_str("----  ------------  --------\n");

    let mut dirs = 0;
    let mut files = 0;
    for entry in listing.entries() {
        let index = if entry.is_directory {
            dirs += 1;
            dirs - 1
        } else {
            files += 1;
            files - 1
        };
        out.push_str(&format!(
            "{:>4}  {:>12}  {}{}\n",
            index,
            format_size(&entry),
            entry.name,
            if entry.is_directory { "/" } else { "" }
        ));
    }

    out.push_str(&format!("\nTotal: {} dirs, {} files\n", dirs, files));
    out
}

fn to_json(path: &str, listing: &Listing) -> serde_json::Value {
    let entries: Vec<_> = listing
        .entries()
        .map(|entry| {
            json!({
                "name": entry.name,
                "directory": entry.is_directory,
                "size": entry.size,
            })
        })
        .collect();

    json!({
        "path": path,
        "directories": listing.dir_count(),
        "files": listing.file_count(),
        "entries": entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use romfs_format::{DirOffset, DirectoryRecord, FileOffset, FileRecord};

    fn listing() -> Listing {
        let dir = |offset: u32, name: &str| DirectoryRecord {
            offset: DirOffset::new(offset),
            parent: 0,
            sibling: None,
            first_child_dir: None,
            first_child_file: None,
            next_same_hash: None,
            name: name.encode_utf16().collect(),
        };
        let file = |offset: u32, name: &str, size: u64| FileRecord {
            offset: FileOffset::new(offset),
            parent: 0,
            sibling: None,
            data_offset: 0,
            data_size: size,
            next_same_hash: None,
            name: name.encode_utf16().collect(),
        };

        Listing {
            directory: dir(0, ""),
            directories: vec![dir(0x18, "sound")],
            files: vec![file(0, "a.txt", 11), file(0x2C, "big.bin", 2048)],
        }
    }

    #[test]
    fn render_root() {
        let text = render("", &listing());
        assert!(text.starts_with("Directory: ROOT\n"));
        assert!(text.contains(&format!("   0  {:>12}  sound/\n", "<directory>")));
        assert!(text
            .lines()
            .any(|l| l.starts_with("   1") && l.contains("KiB") && l.ends_with("big.bin")));
        assert!(text.ends_with("Total: 1 dirs, 2 files\n"));
    }

    #[test]
    fn json_listing() {
        let value = to_json("sound", &listing());
        assert_eq!(value["path"], "sound");
        assert_eq!(value["directories"], 1);
        assert_eq!(value["files"], 2);
        assert_eq!(value["entries"][0]["directory"], true);
        assert!(value["entries"][0]["size"].is_null());
        assert_eq!(value["entries"][1]["name"], "a.txt");
        assert_eq!(value["entries"][1]["size"], 11);
    }
}
