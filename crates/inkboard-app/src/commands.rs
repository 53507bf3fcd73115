//! Command execution over a workspace.

use crate::cli::{CliError, Command, ExportFormat, default_name};
use inkboard_core::{ShortcutRegistry, Storage, Workspace, WorkspaceError};
use inkboard_export::{
    PrintOptions, RasterOptions, SvgOptions, render_png, render_print_bundle, render_svg,
};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

/// Run `command` against `workspace`, writing results to `out`.
pub async fn execute<S: Storage>(
    workspace: &mut Workspace<S>,
    command: Command,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match command {
        Command::List => {
            for summary in workspace.list().await? {
                writeln!(
                    out,
                    "{}\t{}\t{}",
                    summary.id,
                    summary.updated_at.format("%Y-%m-%d %H:%M"),
                    summary.name
                )?;
            }
        }
        Command::New { name } => {
            let id = workspace.create_canvas(&name, Instant::now()).await?;
            writeln!(out, "{}", id)?;
        }
        Command::Import { path, name } => {
            let name = name.unwrap_or_else(|| default_name(&path));
            let json = fs::read_to_string(&path)?;
            let id = workspace.import_canvas(&name, &json, Instant::now()).await?;
            writeln!(out, "{}", id)?;
        }
        Command::Export {
            id,
            format,
            scale,
            out: target,
        } => {
            let bytes = export(workspace, &id, format, scale).await?;
            match target {
                Some(path) => write_file(&path, &bytes)?,
                None => out.write_all(&bytes)?,
            }
        }
        Command::Delete { id } => {
            // Surface unknown ids instead of silently succeeding.
            workspace.storage().get(&id).await?;
            workspace.delete(&id).await?;
        }
        Command::Shortcuts => {
            for shortcut in ShortcutRegistry::new().all() {
                writeln!(out, "{:<14}{}", shortcut.format(), shortcut.description)?;
            }
        }
    }
    Ok(())
}

async fn export<S: Storage>(
    workspace: &mut Workspace<S>,
    id: &str,
    format: ExportFormat,
    scale: f32,
) -> Result<Vec<u8>, CliError> {
    workspace.switch_to(id, Instant::now()).await?;
    let name = workspace.name(id).unwrap_or_default().to_string();
    let canvas = workspace.active().ok_or(WorkspaceError::NoActiveCanvas)?;
    let scene = canvas.scene();

    let bytes = match format {
        ExportFormat::Svg => render_svg(scene, &SvgOptions::default()).into_bytes(),
        ExportFormat::Png => render_png(
            scene,
            &RasterOptions {
                scale,
                ..RasterOptions::default()
            },
        )?,
        ExportFormat::Pdf => render_print_bundle(
            scene,
            &PrintOptions {
                scale: scale.max(PrintOptions::default().scale),
                ..PrintOptions::default()
            },
        )?,
        ExportFormat::Bundle => canvas.export_bundle(&name).to_json_pretty()?.into_bytes(),
    };
    log::info!("exported canvas {} as {:?} ({} bytes)", id, format, bytes.len());
    Ok(bytes)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkboard_core::{AuthContext, EngineConfig, MemoryStorage, Placement, ShapeType};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn workspace() -> Workspace<MemoryStorage> {
        Workspace::new(
            Arc::new(MemoryStorage::new()),
            AuthContext::new("tester"),
            EngineConfig::default(),
        )
    }

    fn run(ws: &mut Workspace<MemoryStorage>, command: Command) -> Result<String, CliError> {
        let mut out = Vec::new();
        pollster::block_on(execute(ws, command, &mut out))?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn new_canvas(ws: &mut Workspace<MemoryStorage>, name: &str) -> String {
        run(
            ws,
            Command::New {
                name: name.to_string(),
            },
        )
        .unwrap()
        .trim()
        .to_string()
    }

    fn export_cmd(id: &str, format: ExportFormat) -> Command {
        Command::Export {
            id: id.to_string(),
            format,
            scale: 1.0,
            out: None,
        }
    }

    #[test]
    fn test_new_then_list() {
        let mut ws = workspace();
        let id = new_canvas(&mut ws, "Roadmap");

        let listing = run(&mut ws, Command::List).unwrap();
        assert!(listing.starts_with(&id));
        assert!(listing.trim_end().ends_with("Roadmap"));
    }

    #[test]
    fn test_export_svg_contains_shape() {
        let mut ws = workspace();
        let id = new_canvas(&mut ws, "Board");
        ws.edit(Instant::now(), |c| {
            c.add_shape(ShapeType::Rectangle, Placement::Auto)
        })
        .unwrap();

        let svg = run(&mut ws, export_cmd(&id, ExportFormat::Svg)).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("<rect"));
    }

    #[test]
    fn test_bundle_round_trips_through_import() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("board.json");

        let mut ws = workspace();
        let id = new_canvas(&mut ws, "Board");
        ws.edit(Instant::now(), |c| {
            c.add_shape(ShapeType::Ellipse, Placement::Auto)
        })
        .unwrap();
        run(
            &mut ws,
            Command::Export {
                id,
                format: ExportFormat::Bundle,
                scale: 1.0,
                out: Some(path.clone()),
            },
        )
        .unwrap();
        assert!(path.exists());

        let imported = run(
            &mut ws,
            Command::Import {
                path,
                name: Some("Copy".to_string()),
            },
        )
        .unwrap();
        let copy = imported.trim();
        assert_eq!(ws.active_id(), Some(copy));
        assert_eq!(ws.name(copy), Some("Copy"));
        assert_eq!(ws.active().unwrap().scene().objects().count(), 1);
    }

    #[test]
    fn test_import_names_canvas_after_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sprint-plan.json");
        let bundle = inkboard_core::Canvas::default()
            .export_bundle("Sprint")
            .to_json_pretty()
            .unwrap();
        std::fs::write(&path, bundle).unwrap();

        let mut ws = workspace();
        let id = run(&mut ws, Command::Import { path, name: None }).unwrap();
        assert_eq!(ws.name(id.trim()), Some("sprint-plan"));
    }

    #[test]
    fn test_export_unknown_canvas_fails() {
        let mut ws = workspace();
        let result = run(&mut ws, export_cmd("missing", ExportFormat::Svg));
        assert!(matches!(result, Err(CliError::Workspace(_))));
    }

    #[test]
    fn test_delete() {
        let mut ws = workspace();
        let id = new_canvas(&mut ws, "Scratch");
        run(&mut ws, Command::Delete { id: id.clone() }).unwrap();
        assert!(run(&mut ws, Command::List).unwrap().is_empty());
        assert!(matches!(
            run(&mut ws, Command::Delete { id }),
            Err(CliError::Storage(_))
        ));
    }

    #[test]
    fn test_shortcuts_listing() {
        let mut ws = workspace();
        let listing = run(&mut ws, Command::Shortcuts).unwrap();
        assert!(listing.contains("Ctrl+Z"));
    }
}
