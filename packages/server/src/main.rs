#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Runs the area dashboard API server.
//!
//! ```text
//! area_insights_server [--data-dir data]
//! area_insights_server --interactive
//! ```

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "area_insights_server",
    about = "Serve the Bengaluru area dashboard API"
)]
struct Cli {
    /// Prompt for bind address, port and data directory
    #[arg(long)]
    interactive: bool,
    /// Directory with areas.json, stats.json and lockedArea.json
    /// (defaults to `AREA_DATA_DIR`, then `data`)
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    if cli.interactive {
        return area_insights_server::interactive::run().await;
    }

    let data_dir = cli
        .data_dir
        .unwrap_or_else(area_insights_server::data_dir_from_env);
    area_insights_server::run_server(data_dir).await
}
