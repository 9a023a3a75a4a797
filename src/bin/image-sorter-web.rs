// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Image Sorter API server
//!
//! Standalone HTTP server for the image sorter UI.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use image_sorter::{AppConfig, ImageSorter, Result};

#[derive(Parser, Debug)]
#[command(name = "image-sorter-web")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Image Sorter API server")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Host to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    image_sorter::init_tracing(if args.verbose { "debug" } else { "info" });

    info!("Image Sorter API v{}", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::load(&args.config)?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let profile = config.platform.profile();
    info!("Platform profile: {:?}", profile);

    image_sorter::web::start_server(config, ImageSorter::new(profile)).await
}
