//! Per-replicate output files.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;

use super::table::{write_counts_csv, write_traits_csv};
use crate::compute::{PopulationStats, RunSummary, SimulationOutput};

/// Paths written by [`save_replicate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub counts: PathBuf,
    pub traits: PathBuf,
    pub summary: PathBuf,
}

impl ExportPaths {
    /// File names for `label` inside `dir`.
    pub fn new<P: AsRef<Path>>(dir: P, label: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            counts: dir.join(format!("{label}_poptraj.csv")),
            traits: dir.join(format!("{label}_phenotraj.csv")),
            summary: dir.join(format!("{label}_summary.json")),
        }
    }
}

#[derive(Serialize)]
struct SummaryRecord<'a> {
    summary: &'a RunSummary,
    final_population: PopulationStats,
}

/// Write the count table, trait table and run summary of one replicate.
///
/// `dir` is created if it does not exist.
pub fn save_replicate<P: AsRef<Path>>(
    dir: P,
    label: &str,
    output: &SimulationOutput,
) -> io::Result<ExportPaths> {
    fs::create_dir_all(dir.as_ref())?;
    let paths = ExportPaths::new(dir, label);

    let mut writer = BufWriter::new(File::create(&paths.counts)?);
    write_counts_csv(&output.trajectory, &mut writer)?;
    writer.flush()?;

    let mut writer = BufWriter::new(File::create(&paths.traits)?);
    write_traits_csv(&output.trajectory, &mut writer)?;
    writer.flush()?;

    let record = SummaryRecord {
        summary: &output.summary,
        final_population: PopulationStats::from_state(&output.final_state),
    };
    let mut writer = BufWriter::new(File::create(&paths.summary)?);
    serde_json::to_writer_pretty(&mut writer, &record)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    debug!("saved replicate {} to {}", label, paths.counts.display());
    Ok(paths)
}
