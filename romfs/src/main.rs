use std::path::PathBuf;

use romfs_format::{ReaderOptions, DEFAULT_BASE_OFFSET};
use structopt::clap::AppSettings::*;
use structopt::StructOpt;

mod commands;
mod error;

#[derive(Debug)]
struct ParseOffsetError(String);

impl std::error::Error for ParseOffsetError {}

impl std::fmt::Display for ParseOffsetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid offset: {}", self.0)
    }
}

fn parse_offset(src: &str) -> std::result::Result<u64, ParseOffsetError> {
    let parsed = match src.strip_prefix("0x").or_else(|| src.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => src.parse::<u64>(),
    };
    parsed.map_err(|_| ParseOffsetError(src.to_string()))
}

#[derive(Debug, StructOpt)]
enum Commands {
    #[structopt(
        name = "l",
        visible_alias = "list",
        about = "List the contents of a directory in the image"
    )]
    List {
        #[structopt(name = "image", parse(from_os_str), help = "Path to the decrypted RomFS image")]
        image: PathBuf,

        #[structopt(name = "path", help = "Directory to list, `/`-separated [default: root]")]
        path: Option<String>,

        #[structopt(long, help = "Print the listing as JSON")]
        json: bool,
    },

    #[structopt(
        name = "x",
        visible_alias = "extract",
        about = "Extract a file, or a directory recursively, from the image"
    )]
    Extract {
        #[structopt(name = "image", parse(from_os_str), help = "Path to the decrypted RomFS image")]
        image: PathBuf,

        #[structopt(name = "path", help = "File or directory to extract, `/`-separated")]
        path: String,

        #[structopt(
            short,
            long,
            parse(from_os_str),
            help = "Directory to write into [default: current directory]"
        )]
        output: Option<PathBuf>,

        #[structopt(long, help = "Memory map file contents instead of copying through a buffer")]
        mmap: bool,
    },

    #[structopt(name = "i", visible_alias = "info", about = "Show the image header")]
    Info {
        #[structopt(name = "image", parse(from_os_str), help = "Path to the decrypted RomFS image")]
        image: PathBuf,
    },
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "romfs",
    about = "List and extract files from decrypted RomFS Level 3 images.",
    settings = &[SubcommandRequiredElseHelp, DisableHelpSubcommand, VersionlessSubcommands],
    usage = "romfs (l|x|i) [FLAGS|OPTIONS] <image> [path]"
)]
struct CliOpts {
    #[structopt(short, long, help = "Show verbose output", global = true)]
    verbose: bool,

    #[structopt(
        long,
        parse(try_from_str = parse_offset),
        default_value = "0x1000",
        global = true,
        help = "Position of the Level 3 header in the image (decimal or 0x-prefixed hex)"
    )]
    offset: u64,

    #[structopt(
        long,
        global = true,
        help = "Read hash buckets on demand instead of loading both tables up front"
    )]
    lazy: bool,

    #[structopt(subcommand)]
    cmd: Commands,
}

impl CliOpts {
    fn reader_options(&self) -> ReaderOptions {
        ReaderOptions {
            base_offset: self.offset,
            preload_hash_tables: !self.lazy,
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run(opts: CliOpts) -> anyhow::Result<()> {
    let options = opts.reader_options();
    if options.base_offset != DEFAULT_BASE_OFFSET {
        tracing::debug!(
            base = format_args!("{:#x}", options.base_offset),
            "using non-default base offset"
        );
    }

    match opts.cmd {
        Commands::List { image, path, json } => {
            commands::list(&image, path.as_deref().unwrap_or(""), json, options)?
        }
        Commands::Extract {
            image,
            path,
            output,
            mmap,
        } => {
            let output = match output {
                Some(v) => v,
                None => std::env::current_dir()?,
            };
            commands::extract(&image, &path, &output, mmap, opts.verbose, options)?
        }
        Commands::Info { image } => commands::info(&image, options)?,
    }

    Ok(())
}

fn main() {
    let opts = CliOpts::from_iter(wild::args_os());
    init_tracing(opts.verbose);

    if let Err(e) = run(opts) {
        eprintln!("error: {:?}", e);
        std::process::exit(1);
    }
}
