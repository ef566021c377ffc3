//! Subcommand implementations

use anyhow::{bail, Context, Result};
use promptsmith_config::{diagnostics, Config, Format};
use promptsmith_studio::{
    ConflictStrategy, FileStore, SavedConfig, SnapshotLibrary, StudioSettings,
};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Read a theme from a file, or stdin for "-"
fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))
}

/// Format hint for the parser: explicit `--from`, else the input name
fn source_hint<'a>(input: &'a str, from: Option<&'a str>) -> &'a str {
    match from {
        Some(hint) => hint,
        None if input == "-" => "",
        None => input,
    }
}

fn load_theme(input: &str, from: Option<&str>) -> Result<Config> {
    let text = read_input(input)?;
    let hint = source_hint(input, from);
    debug!("Importing {} with hint '{}'", input, hint);
    promptsmith_config::import(&text, hint).with_context(|| format!("Failed to import {}", input))
}

fn write_output(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            print!("{}", text);
            if !text.ends_with('\n') {
                println!();
            }
            Ok(())
        }
    }
}

pub fn convert(input: &str, from: Option<&str>, to: Format, output: Option<&Path>) -> Result<()> {
    let config = load_theme(input, from)?;
    let text = promptsmith_config::export(&config, to)?;
    write_output(&text, output)
}

/// Print diagnostics; returns how many were found
pub fn check(input: &str, from: Option<&str>, palette: Option<&str>) -> Result<usize> {
    let config = load_theme(input, from)?;
    if let Some(variant) = palette {
        let known = config
            .palettes
            .as_ref()
            .is_some_and(|set| set.list.contains_key(variant));
        if !known {
            bail!("Palette variant '{}' is not defined", variant);
        }
    }

    let found = diagnostics::check(&config, palette);
    if found.is_empty() {
        println!("{}: no problems found", input);
    } else {
        for diagnostic in &found {
            println!("{}", diagnostic);
        }
        println!("{}: {} problem(s)", input, found.len());
    }
    Ok(found.len())
}

pub async fn open_library(settings: &StudioSettings) -> Result<SnapshotLibrary> {
    let dir = settings.data_dir();
    debug!("Using data directory {}", dir.display());
    let store = Arc::new(FileStore::new(dir));
    Ok(SnapshotLibrary::open(store).await?)
}

fn summary_line(entry: &SavedConfig) -> String {
    let updated = entry.updated_at.format("%Y-%m-%d %H:%M");
    if entry.tags.is_empty() {
        format!("{}  {}  (updated {})", entry.id, entry.name, updated)
    } else {
        format!(
            "{}  {}  [{}]  (updated {})",
            entry.id,
            entry.name,
            entry.tags.join(", "),
            updated
        )
    }
}

pub fn list_saved(library: &SnapshotLibrary) -> Result<()> {
    if library.is_empty() {
        println!("No saved configs");
        return Ok(());
    }
    for entry in library.list() {
        println!("{}", summary_line(entry));
    }
    Ok(())
}

pub async fn save(
    library: &mut SnapshotLibrary,
    input: &str,
    from: Option<&str>,
    name: &str,
    description: Option<String>,
    tags: Vec<String>,
) -> Result<()> {
    let config = load_theme(input, from)?;
    let saved = library.create(name, description, tags, &config).await?;
    println!("Saved '{}' as {}", saved.name, saved.id);
    Ok(())
}

pub async fn delete(library: &mut SnapshotLibrary, id: &str) -> Result<()> {
    library.delete(id).await?;
    println!("Deleted {}", id);
    Ok(())
}

pub fn export_saved(
    library: &SnapshotLibrary,
    id: &str,
    to: Format,
    output: Option<&Path>,
) -> Result<()> {
    let Some(saved) = library.get(id) else {
        bail!("No saved config with id {}", id);
    };
    let text = promptsmith_config::export(&saved.config, to)?;
    write_output(&text, output)
}

pub fn export_bundle(library: &SnapshotLibrary, output: &Path) -> Result<()> {
    let text = library.export_bundle()?;
    write_output(&text, Some(output))?;
    println!("Exported {} config(s) to {}", library.len(), output.display());
    Ok(())
}

pub async fn import_bundle(
    library: &mut SnapshotLibrary,
    input: &Path,
    strategy: ConflictStrategy,
) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let report = library.import_bundle(&text, strategy).await?;
    println!(
        "Imported {} config(s), skipped {}",
        report.imported, report.skipped
    );
    Ok(())
}
