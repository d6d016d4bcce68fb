//! Saves run history to disk for later reporting.
//!
//! Statistics go to CSV, best individuals to JSON. The formats are a
//! convenience for external tools, not a stable contract.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Local;
use log::info;
use serde::Serialize;
use uuid::Uuid;

use crate::core::sudoku::{GridSnapshot, Sudoku};
use crate::solvers::GenStats;

/// JSON document holding the best grid of every generation.
#[derive(Debug, Serialize)]
struct BestIndividualsFile<'a> {
    run_id: Uuid,
    label: &'a str,
    generations: Vec<GridSnapshot>,
}

/// Writes `stats` as CSV under `dir`. Returns the absolute path.
pub fn save_stats(dir: &Path, label: &str, stats: &[GenStats]) -> Result<PathBuf> {
    let path = prepare_target(dir, "stats", label, "csv")?;

    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in stats {
        writer.serialize(row).context("Failed to write stats row")?;
    }
    writer.flush().context("Failed to flush stats file")?;

    report_size(&path)
}

/// Writes the best individual of every generation as JSON under `dir`.
/// `best` and `stats` must be aligned (one entry per generation).
pub fn save_best_individuals(
    dir: &Path,
    label: &str,
    run_id: Uuid,
    best: &[Sudoku],
    stats: &[GenStats],
) -> Result<PathBuf> {
    if best.len() != stats.len() {
        bail!(
            "History mismatch: {} individuals for {} generations",
            best.len(),
            stats.len()
        );
    }
    let path = prepare_target(dir, "population", label, "json")?;

    let document = BestIndividualsFile {
        run_id,
        label,
        generations: best
            .iter()
            .zip(stats)
            .map(|(grid, s)| grid.snapshot(s.generation, s.best_score))
            .collect(),
    };

    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer(BufWriter::new(file), &document)
        .context("Failed to serialize best individuals")?;

    report_size(&path)
}

/// Ensures `dir` exists and builds `{kind}_{label}_{timestamp}.{ext}` inside it.
fn prepare_target(dir: &Path, kind: &str, label: &str, ext: &str) -> Result<PathBuf> {
    if dir.exists() && !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S%.6f");
    let name = format!("{}_{}_{}.{}", kind, label.to_lowercase().replace(' ', "_"), stamp, ext);
    Ok(dir.join(name))
}

fn report_size(path: &Path) -> Result<PathBuf> {
    let absolute = fs::canonicalize(path)
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    let size = fs::metadata(&absolute)?.len();
    info!(
        "History saved into {} (file size: {})",
        absolute.display(),
        human_readable_size(size)
    );
    Ok(absolute)
}

/// Formats a byte count with two decimals and a B/KB/MB/GB/TB suffix.
pub fn human_readable_size(bytes: u64) -> String {
    const SUFFIXES: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut index = 0;
    while size > 1024.0 && index < SUFFIXES.len() - 1 {
        size /= 1024.0;
        index += 1;
    }
    format!("{:.2}{}", size, SUFFIXES[index])
}
