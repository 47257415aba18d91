//! Block Catalog CLI
//!
//! Ingest mod archives into a block catalog and query it.

use block_catalog::resource_pack::texture::{decode_texture, texture_info};
use block_catalog::{BlockRecord, CatalogConfig, CatalogService, IngestReport};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "block-catalog")]
#[command(author, version, about = "Build a searchable block catalog from mod archives", long_about = None)]
struct Cli {
    /// Catalog database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest every archive in a mods directory, replacing the catalog
    Ingest {
        /// Directory containing .jar/.zip archives
        dir: PathBuf,

        /// List every skipped entry
        #[arg(long)]
        show_skipped: bool,
    },

    /// Show a single block
    Get {
        /// Block ID (e.g., "oak_door")
        block_id: String,

        /// Write the block's texture to this PNG file
        #[arg(long)]
        texture_out: Option<PathBuf>,
    },

    /// Search the catalog (prefix the query with '@' for an ID prefix lookup)
    Search {
        /// Search query; empty lists textured blocks
        #[arg(default_value = "")]
        query: String,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show every state of a block, read from its source archive
    Details {
        /// Directory containing the source archives
        dir: PathBuf,

        /// Block ID
        block_id: String,
    },

    /// List the archives in a mods directory
    Archives {
        /// Directory containing .jar/.zip archives
        dir: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => CatalogConfig::from_json_file(path)?,
        None => CatalogConfig::default(),
    };
    if let Some(database) = cli.database {
        config = config.with_database_path(database);
    }

    let service = CatalogService::open(config)?;

    match cli.command {
        Commands::Ingest { dir, show_skipped } => {
            println!("Ingesting archives from {:?}...", dir);
            let report = service.ingest_directory(&dir)?;
            print_report(&report, show_skipped);
        }
        Commands::Get {
            block_id,
            texture_out,
        } => match service.get_block(&block_id)? {
            Some(record) => {
                print_record(&record);
                if let Some(path) = texture_out {
                    write_texture(&record, &path)?;
                }
            }
            None => println!("Block '{}' not found", block_id),
        },
        Commands::Search { query, json } => {
            let results = service.search_blocks(&query)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                println!("{} result(s)", results.len());
                for record in &results {
                    println!(
                        "  {:<40} {:<24} {}",
                        record.key().location(),
                        record.display_name(),
                        record.jar_slug
                    );
                }
            }
        }
        Commands::Details { dir, block_id } => match service.block_details(&dir, &block_id)? {
            Some(details) => println!("{}", serde_json::to_string_pretty(&details)?),
            None => println!("No details available for '{}'", block_id),
        },
        Commands::Archives { dir } => {
            let slugs = service.archive_slugs(&dir)?;
            println!("{} archive(s) in {:?}", slugs.len(), dir);
            for slug in slugs {
                println!("  {}", slug);
            }
        }
    }

    service.close()?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "info,block_catalog=debug"
    } else {
        "warn,block_catalog=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_report(report: &IngestReport, show_skipped: bool) {
    println!("\nIngestion Report:");
    println!("  Archives scanned: {}", report.archives_scanned);
    println!("  Archives failed: {}", report.failed_archives.len());
    for failed in &report.failed_archives {
        println!("    - {}: {}", failed.slug, failed.message);
    }
    println!("  Blocks committed: {}", report.committed);
    println!("  Blocks overwritten: {}", report.overwritten);
    println!("  Blocks indexed for search: {}", report.indexed);

    println!("  Texture outcomes:");
    for (outcome, count) in &report.texture_outcomes {
        println!("    - {}: {}", outcome, count);
    }

    println!("  Entries skipped: {}", report.skip_count());
    for (reason, count) in report.skip_summary() {
        println!("    - {}: {}", reason, count);
    }

    if show_skipped {
        for skipped in &report.skipped {
            println!("  [{}] {}: {}", skipped.archive, skipped.entry, skipped.reason);
        }
    }
}

fn print_record(record: &BlockRecord) {
    println!("{}", record.key().location());
    println!("  Name: {}", record.display_name());
    println!("  Archive: {}", record.jar_slug);
    println!("  Entry: {}", record.entry_name);
    println!(
        "  Texture: {}",
        record
            .texture64
            .as_ref()
            .map(|t| format!("{} base64 chars", t.len()))
            .unwrap_or_else(|| "none".to_string())
    );
    println!("  Default state: {}", block_catalog::types::default_state_string(&record.variants));
    for variant in &record.variants {
        println!("    {} ({} values): {:?}", variant.key, variant.cardinality(), variant.kind);
    }
}

fn write_texture(record: &BlockRecord, path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    match &record.texture64 {
        Some(texture64) => {
            let data = decode_texture(texture64)?;
            match texture_info(&data) {
                Ok(info) if info.is_animated() => println!(
                    "Texture: {}x{} ({} animation frames)",
                    info.width, info.height, info.frame_count
                ),
                Ok(info) => println!("Texture: {}x{}", info.width, info.height),
                Err(e) => println!("Texture is not a readable image: {}", e),
            }
            fs::write(path, &data)?;
            println!("Wrote texture ({} bytes) to {:?}", data.len(), path);
        }
        None => println!("Block has no texture"),
    }
    Ok(())
}
