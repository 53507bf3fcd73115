//! Command-line arguments and errors.

use clap::{Parser, Subcommand, ValueEnum};
use inkboard_core::{StorageError, WorkspaceError};
use inkboard_export::ExportError;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "inkboard", about = "Inkboard canvases from the command line", version)]
pub struct Cli {
    /// Directory holding canvas documents.
    #[arg(long, env = "INKBOARD_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List stored canvases, most recently updated first.
    List,
    /// Create an empty canvas and print its id.
    New { name: String },
    /// Create a canvas from a native bundle and print its id.
    Import {
        path: PathBuf,
        /// Defaults to the file name without extension.
        #[arg(long)]
        name: Option<String>,
    },
    /// Render a canvas. Writes to stdout unless --out is given.
    Export {
        id: String,
        #[arg(long, value_enum, default_value_t = ExportFormat::Svg)]
        format: ExportFormat,
        /// Raster resolution multiplier.
        #[arg(long, default_value_t = 1.0, value_parser = parse_scale)]
        scale: f32,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Delete a canvas.
    Delete { id: String },
    /// Print the keyboard shortcuts.
    Shortcuts,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Svg,
    Png,
    Pdf,
    #[value(alias = "json")]
    Bundle,
}

fn parse_scale(s: &str) -> Result<f32, String> {
    let scale: f32 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if scale.is_finite() && scale > 0.0 {
        Ok(scale)
    } else {
        Err(format!("scale must be positive, got {s}"))
    }
}

/// Canvas name for an imported bundle without `--name`.
pub fn default_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Imported canvas".to_string())
}
