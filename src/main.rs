// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Image Sorter: manual image classification service
//!
//! Serves the HTTP API by default; the other subcommands run the same
//! operations from the command line.

use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use image_sorter::config::AppConfig;
use image_sorter::sorter::{ClassifyResponse, UndoResponse};
use image_sorter::{ImageSorter, MoveRecord, Result, SorterError};

/// Image Sorter CLI
#[derive(Parser, Debug)]
#[command(name = "image-sorter")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Sort images into label folders, and undo it", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List the images in a folder
    List {
        /// Folder to list
        folder: String,
    },

    /// Move images into a label folder
    Classify {
        /// Label folder to move the images into
        #[arg(short, long)]
        label: String,

        /// Folder the label folder is created under
        #[arg(short, long)]
        target: String,

        /// Images to move
        #[arg(required = true)]
        images: Vec<String>,
    },

    /// Move classified images back
    Undo {
        /// JSON file with the records printed by `classify --format json`
        records: PathBuf,

        /// Dry run (show what would be restored)
        #[arg(long)]
        dry_run: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

/// Either a full classify response or a bare list of records
#[derive(Deserialize)]
#[serde(untagged)]
enum RecordsFile {
    Response { moved_files: Vec<MoveRecord> },
    Records(Vec<MoveRecord>),
}

impl RecordsFile {
    fn into_records(self) -> Vec<MoveRecord> {
        match self {
            RecordsFile::Response { moved_files } => moved_files,
            RecordsFile::Records(records) => records,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    image_sorter::init_tracing(filter);

    let mut config = AppConfig::load(&cli.config)?;
    let sorter = ImageSorter::new(config.platform.profile());

    match cli.command {
        Some(Commands::Serve { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            image_sorter::web::start_server(config, sorter).await
        }
        Some(Commands::List { folder }) => run_list(&sorter, &folder, &cli.format),
        Some(Commands::Classify { label, target, images }) => {
            run_classify(&sorter, &label, &target, images, &cli.format)
        }
        Some(Commands::Undo { records, dry_run }) => {
            run_undo(&sorter, &records, dry_run, &cli.format)
        }
        Some(Commands::Config { action }) => run_config_command(config, action, &cli.config),
        None => {
            info!("Image Sorter v{}", env!("CARGO_PKG_VERSION"));
            image_sorter::web::start_server(config, sorter).await
        }
    }
}

/// Shell arguments are literal paths; escape them so the resolver's
/// percent-decoding gives back exactly what was typed
fn encode_arg(arg: &str) -> String {
    urlencoding::encode(arg).into_owned()
}

fn encode_records(records: &[MoveRecord]) -> Vec<MoveRecord> {
    records
        .iter()
        .map(|record| MoveRecord {
            source: encode_arg(&record.source),
            destination: encode_arg(&record.destination),
        })
        .collect()
}

fn run_list(sorter: &ImageSorter, folder: &str, format: &str) -> Result<()> {
    let images = sorter.list_images(&encode_arg(folder))?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&images)?);
    } else {
        for image in &images {
            println!("{}", image.path);
        }
        println!("\n{} images", images.len());
    }

    Ok(())
}

fn classify_args(
    sorter: &ImageSorter,
    label: &str,
    target: &str,
    images: &[String],
) -> Result<ClassifyResponse> {
    let images: Vec<String> = images.iter().map(|image| encode_arg(image)).collect();
    let labels = vec![label.to_string(); images.len()];
    sorter.classify_batch(&images, &labels, &encode_arg(target))
}

fn run_classify(
    sorter: &ImageSorter,
    label: &str,
    target: &str,
    images: Vec<String>,
    format: &str,
) -> Result<()> {
    let response = classify_args(sorter, label, target, &images)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        for record in &response.moved_files {
            println!("Moved: {} -> {}", record.source, record.destination);
        }
        let skipped = images.len() - response.moved_files.len();
        println!("\n{} moved, {} skipped", response.moved_files.len(), skipped);
    }

    Ok(())
}

fn run_undo(sorter: &ImageSorter, records_path: &Path, dry_run: bool, format: &str) -> Result<()> {
    let content = std::fs::read_to_string(records_path)
        .map_err(|e| SorterError::from_io(e, records_path))?;
    let records = serde_json::from_str::<RecordsFile>(&content)?.into_records();

    if records.is_empty() {
        println!("No moves to undo");
        return Ok(());
    }

    let encoded = encode_records(&records);
    let response: UndoResponse = if dry_run {
        sorter.preview_undo(&encoded)?
    } else {
        sorter.undo_batch(&encoded)?
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let (verb, done) = if dry_run {
        ("Would restore", "to restore")
    } else {
        ("Restored", "restored")
    };
    for restored in &response.restored_files {
        println!("{}: {} -> {}", verb, restored.from, restored.to);
    }
    for conflict in &response.conflicts {
        eprintln!("Occupied, left in place: {}", conflict);
    }
    println!(
        "\n{} {}, {} occupied, {} skipped",
        response.restored_files.len(),
        done,
        response.conflicts.len(),
        skipped_count(records.len(), &response)
    );

    Ok(())
}

/// Records neither restored nor blocked by an occupied original
fn skipped_count(total: usize, response: &UndoResponse) -> usize {
    total - response.restored_files.len() - response.conflicts.len()
}

fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            println!("Configuration at {:?} is valid", config_path);
            println!("  Listen address: {}", config.bind_addr());
            println!("  Platform: {:?}", config.platform.profile());
            println!("  History batches: {}", config.history.max_batches);
        }
    }

    Ok(())
}
