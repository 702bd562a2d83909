use std::path::Path;

use humansize::{file_size_opts as options, FileSize};
use romfs_format::{ReaderOptions, Region};

use crate::error::Result;

pub fn run(image: &Path, opts: ReaderOptions) -> Result<()> {
    let rfs = super::open_image(image, opts)?;
    let header = *rfs.header();

    println!("Image:        {}", image.display());
    println!("Base offset:  {:#x}", opts.base_offset);
    println!("Header size:  {:#x}", header.size_header);
    println!();
    println!("Region              Start         Size");
    println!("------------------  ------------  ------------");
    for &(region, _, size) in header.layout().iter() {
        let size = match size {
            Some(size) => u64::from(size),
            None => rfs.image_len() - rfs.region_start(Region::FileData),
        };
        println!(
            "{:<18}  {:>#12x}  {:>12}",
            region.to_string(),
            rfs.region_start(region),
            size.file_size(options::BINARY)
                .unwrap_or_else(|_| size.to_string()),
        );
    }
    println!();
    println!(
        "Hash buckets: {} directory, {} file",
        header.dir_buckets(),
        header.file_buckets()
    );

    Ok(())
}
