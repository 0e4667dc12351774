// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::process;

use clap::Parser;

use pose_control::cli::args::{Cli, Commands};
use pose_control::cli::extract::run_extract;
use pose_control::cli::render::run_render;
use pose_control::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Extract(args) => run_extract(args).await,
        Commands::Render(args) => run_render(args).map(|_| ()),
    };

    if let Err(e) = result {
        error!("{e}");
        process::exit(1);
    }
}
