//! One-shot artifact generation.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

use crate::config::RepomapConfig;
use crate::core::analyzer::{Artifacts, CodebaseAnalyzer};
use crate::error::Result;
use crate::formatters::ArtifactWriter;

/// Counts of everything a run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub symbols: usize,
    pub modules: usize,
    pub calls: usize,
    pub refs: usize,
    pub edges: usize,
    pub nodes: usize,
    pub cycles: usize,
    pub integrations: usize,
    pub written: Vec<PathBuf>,
}

impl RunSummary {
    fn from_artifacts(artifacts: &Artifacts, written: Vec<PathBuf>) -> Self {
        Self {
            symbols: artifacts.symbols.len(),
            modules: artifacts.modules.len(),
            calls: artifacts.calls.len(),
            refs: artifacts.refs.len(),
            edges: artifacts.edges.len(),
            nodes: artifacts.deps_summary.node_count,
            cycles: artifacts.deps_summary.cycles.len(),
            integrations: artifacts.integrations.len(),
            written,
        }
    }
}

/// Analyze `root` and write every artifact into `out_dir`, or into the
/// configured output directory when none is given.
pub fn generate_all_artifacts(root: &Path, out_dir: Option<&Path>) -> Result<RunSummary> {
    generate_with_cancel(root, out_dir, Arc::new(AtomicBool::new(false)))
}

/// Like [`generate_all_artifacts`]; nothing is written once `cancel` is set.
pub fn generate_with_cancel(
    root: &Path,
    out_dir: Option<&Path>,
    cancel: Arc<AtomicBool>,
) -> Result<RunSummary> {
    let config = RepomapConfig::load(root)?;
    let out_dir = match out_dir {
        Some(dir) => dir.to_path_buf(),
        None => config.resolve_output_dir(root)?,
    };

    let analyzer = CodebaseAnalyzer::new(config)?.with_cancel_flag(cancel);
    let artifacts = analyzer.analyze(root, Some(&out_dir))?;
    write_artifacts(&artifacts, &out_dir)
}

/// Analyze `root` as if writing to `scan_out_dir`, but write into `target`.
pub(crate) fn generate_into(root: &Path, scan_out_dir: &Path, target: &Path) -> Result<RunSummary> {
    let config = RepomapConfig::load(root)?;
    let analyzer = CodebaseAnalyzer::new(config)?;
    let artifacts = analyzer.analyze(root, Some(scan_out_dir))?;
    write_artifacts(&artifacts, target)
}

fn write_artifacts(artifacts: &Artifacts, target: &Path) -> Result<RunSummary> {
    let written = ArtifactWriter::new(target).write_all(artifacts)?;
    info!(out_dir = %target.display(), files = written.len(), "artifacts written");
    Ok(RunSummary::from_artifacts(artifacts, written))
}
