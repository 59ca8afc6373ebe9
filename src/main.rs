use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod chunker;
mod db;
mod dbpath;
mod error;
mod hashing;
mod indexer;
mod logging;
mod path_filter;
mod path_utils;
mod restore;
mod scan;
mod schema;
mod stats;
mod tagger;
mod types;
mod util;

use types::{hash_from_hex, hash_to_hex};

#[derive(Parser, Debug)]
#[command(name = "fsindex")]
#[command(version, about = "Content-addressed, deduplicating file indexer with path tags")]
struct Cli {
    /// Database name (no slashes) or path to a database directory.
    ///
    /// If it contains no path separators, it is treated as a name and placed under
    /// the default fsindex data directory (platform-specific).
    #[arg(long, default_value = "default")]
    db: String,

    /// Increase logging verbosity (use together with RUST_LOG for fine control).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk paths and store every regular file as deduplicated chunks
    Index {
        /// One or more root paths to index
        paths: Vec<PathBuf>,

        /// Largest chunk to store (e.g. 64k, 4m)
        #[arg(long, default_value = "1m", value_parser = util::parse_chunk_size)]
        chunk_size: usize,
    },

    /// List recorded files as `hash size path`
    Files {
        /// Only list files under these paths
        #[arg(long = "path-prefix")]
        prefixes: Vec<PathBuf>,
    },

    /// Show the tags recorded for a file hash
    Tags {
        /// File hash (hex)
        hash: String,
    },

    /// List files carrying a tag, e.g. `find dir src` or `find ext rs`
    Find {
        /// Tag key: path, ext, file or dir
        key: String,
        /// Tag value
        value: String,
    },

    /// Rebuild a file from its stored chunks
    Restore {
        /// File hash (hex)
        hash: String,
        /// Where to write the bytes
        out: PathBuf,
    },

    /// Print table sizes
    DbInfo,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let db_dir = dbpath::resolve_db_dir(&cli.db)
        .with_context(|| format!("Failed to resolve --db {}", cli.db))?;

    let dbh = db::open(&db_dir)
        .with_context(|| format!("Failed to open database in {}", db_dir.display()))?;

    match cli.cmd {
        Command::Index { paths, chunk_size } => {
            if paths.is_empty() {
                return Err(anyhow!("index requires at least one path"));
            }

            tracing::info!(
                db_dir = %db_dir.display(),
                chunk_size,
                count = paths.len(),
                "index starting"
            );

            let config = indexer::IndexConfig {
                max_chunk_size: chunk_size,
            };
            scan::run_index(&dbh, &paths, config)?;
            Ok(())
        }

        Command::Files { prefixes } => {
            let filter = path_filter::PathFilter::new(&prefixes)?;
            for row in dbh.list_files(&filter)? {
                println!("{} {} {}", hash_to_hex(row.hash), row.size, row.path);
            }
            Ok(())
        }

        Command::Tags { hash } => {
            let hash = hash_from_hex(&hash)?;
            for (key, val) in dbh.file_tags(hash)? {
                println!("{key}={val}");
            }
            Ok(())
        }

        Command::Find { key, value } => {
            for hash in dbh.find_by_tag(&key, &value)? {
                let hex = hash_to_hex(hash);
                let paths = dbh.paths_for_hash(hash)?;
                if paths.is_empty() {
                    println!("{hex}");
                }
                for p in paths {
                    println!("{hex} {p}");
                }
            }
            Ok(())
        }

        Command::Restore { hash, out } => {
            let hash = hash_from_hex(&hash)?;
            let bytes = restore::reassemble(&dbh, hash)
                .with_context(|| format!("Failed to restore {}", hash_to_hex(hash)))?;
            std::fs::write(&out, &bytes)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            tracing::info!(
                hash = %hash_to_hex(hash),
                bytes = bytes.len(),
                out = %out.display(),
                "restored"
            );
            Ok(())
        }

        Command::DbInfo => {
            let counts = dbh.table_counts()?;
            stats::print_counts(&dbh.db_dir, &counts);
            Ok(())
        }
    }
}
