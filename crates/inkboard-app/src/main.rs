//! Inkboard command-line entry point.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, CliError};
use inkboard_core::{AuthContext, EngineConfig, FileStorage, Workspace, config};
use std::sync::Arc;

/// Owner recorded on canvases created from this shell.
fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| "local".to_string())
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = EngineConfig::from_env();
    let data_dir = cli.data_dir.unwrap_or_else(config::data_dir);
    let storage = FileStorage::new(data_dir)?;
    log::debug!("using data directory {}", storage.base_path().display());

    let mut workspace =
        Workspace::new(Arc::new(storage), AuthContext::new(current_user()), config);
    let mut stdout = std::io::stdout().lock();
    pollster::block_on(commands::execute(&mut workspace, cli.command, &mut stdout))
}

fn main() {
    env_logger::init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
