//! sparsefile CLI
//!
//! Command-line interface for provisioning and accessing a multi-file
//! address space described by a layout manifest.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use sparsefile::{Allocator, Config, Layout, SparseError};
use tracing_subscriber::{fmt, EnvFilter};

/// sparsefile CLI
#[derive(Parser, Debug)]
#[command(name = "sparsefile-cli")]
#[command(about = "Read and write byte ranges across many sparse files")]
#[command(version)]
struct Args {
    /// Layout manifest file
    #[arg(short, long, default_value = "./sparsefile.layout")]
    layout: PathBuf,

    /// Extra attempts when opening a backing file fails
    #[arg(long, default_value = "0")]
    open_retries: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Provision backing files and save the layout
    Init {
        /// Directory relative file paths are resolved against
        #[arg(short, long, default_value = ".")]
        base_dir: PathBuf,

        /// A backing file as PATH:SIZE (repeat, in address order)
        #[arg(short, long = "file", value_parser = parse_file_spec, required = true)]
        files: Vec<FileSpec>,
    },

    /// Recreate missing or wrongly sized backing files from the layout
    Provision,

    /// Show the files and their global ranges
    Info,

    /// Show which file holds a global offset
    Locate {
        /// Global byte offset
        offset: u64,
    },

    /// Write bytes at a global offset
    Write {
        /// Global byte offset
        offset: u64,

        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Read bytes from a global offset
    Read {
        /// Global byte offset
        offset: u64,

        /// Number of bytes to read
        len: usize,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// A `PATH:SIZE` argument
#[derive(Debug, Clone)]
struct FileSpec {
    path: PathBuf,
    size: u64,
}

fn parse_file_spec(s: &str) -> Result<FileSpec, String> {
    let (path, size) = s
        .rsplit_once(':')
        .ok_or_else(|| format!("expected PATH:SIZE, got '{}'", s))?;

    if path.is_empty() {
        return Err(format!("missing path in '{}'", s));
    }

    let size = size
        .parse()
        .map_err(|e| format!("invalid size '{}': {}", size, e))?;

    Ok(FileSpec {
        path: PathBuf::from(path),
        size,
    })
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,sparsefile=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> sparsefile::Result<()> {
    let config = Config::builder().open_retries(args.open_retries).build();

    match args.command {
        Commands::Init { base_dir, files } => {
            fs::create_dir_all(&base_dir)?;

            let mut allocator = Allocator::with_config(config);
            allocator.set_base_directory(&base_dir)?;

            for spec in files {
                let outcome = allocator.add_file(&spec.path, spec.size)?;
                tracing::info!("{:?} {} ({} bytes)", outcome, spec.path.display(), spec.size);
            }

            allocator.layout()?.save(&args.layout)?;
            println!(
                "{} files, {} bytes, layout saved to {}",
                allocator.file_count(),
                allocator.total_size(),
                args.layout.display()
            );
        }

        Commands::Provision => {
            let layout = Layout::load(&args.layout)?;
            let allocator = Allocator::from_layout(layout, config)?;
            println!(
                "{} files, {} bytes provisioned",
                allocator.file_count(),
                allocator.total_size()
            );
        }

        Commands::Info => {
            let allocator = open(&args.layout, config)?;

            let mut start = 0u64;
            for (index, entry) in allocator.entries().iter().enumerate() {
                println!(
                    "{:>4}  [{}, {})  {:>12}  {}",
                    index,
                    start,
                    start + entry.size,
                    entry.size,
                    entry.path.display()
                );
                start += entry.size;
            }
            println!("total: {} bytes in {} files", allocator.total_size(), allocator.file_count());
        }

        Commands::Locate { offset } => {
            let allocator = open(&args.layout, config)?;

            let location = allocator
                .locate(offset)
                .ok_or(SparseError::AddressOutOfRange {
                    offset,
                    total_size: allocator.total_size(),
                })?;
            let entry = allocator.entry(location.index)?;

            println!(
                "file {} ({}) local offset {}",
                location.index,
                entry.path.display(),
                location.local_offset(offset)
            );
        }

        Commands::Write { offset, input } => {
            let mut allocator = open(&args.layout, config)?;

            let data = match input {
                Some(path) => fs::read(path)?,
                None => {
                    let mut data = Vec::new();
                    io::stdin().read_to_end(&mut data)?;
                    data
                }
            };

            allocator.write(offset, &data)?;
            tracing::info!("Wrote {} bytes at offset {}", data.len(), offset);
        }

        Commands::Read {
            offset,
            len,
            output,
        } => {
            let allocator = open(&args.layout, config)?;
            let data = allocator.read(offset, len)?;

            if data.len() < len {
                tracing::warn!(
                    "Short read: {} of {} bytes (address space ends at {})",
                    data.len(),
                    len,
                    allocator.total_size()
                );
            }

            match output {
                Some(path) => fs::write(path, &data)?,
                None => io::stdout().write_all(&data)?,
            }
        }
    }

    Ok(())
}

/// Load the layout, checking its files without modifying them
fn open(layout: &Path, config: Config) -> sparsefile::Result<Allocator> {
    let layout = Layout::load(layout)?;
    Allocator::open_layout(layout, config)
}
