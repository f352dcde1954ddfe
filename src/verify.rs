//! Determinism check: regenerate and compare byte for byte.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;
use tempfile::TempDir;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{RepomapError, Result};
use crate::generate::generate_into;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Files in the artifacts directory a fresh run does not produce.
    pub missing: Vec<String>,
    /// Regenerated files absent from the artifacts directory.
    pub extra: Vec<String>,
    pub mismatched: Vec<String>,
}

impl VerifyReport {
    pub fn is_deterministic(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty() && self.mismatched.is_empty()
    }
}

/// Regenerate into a scratch directory and diff both trees against each
/// other by relative path.
pub fn verify_determinism(root: &Path, artifacts_dir: &Path) -> Result<VerifyReport> {
    if !artifacts_dir.is_dir() {
        return Err(RepomapError::MissingArtifacts(artifacts_dir.to_path_buf()));
    }

    let scratch = TempDir::new()?;
    generate_into(root, artifacts_dir, scratch.path())?;

    let existing = relative_files(artifacts_dir)?;
    let fresh = relative_files(scratch.path())?;

    let mut report = VerifyReport {
        missing: existing.difference(&fresh).cloned().collect(),
        extra: fresh.difference(&existing).cloned().collect(),
        mismatched: Vec::new(),
    };
    for name in existing.intersection(&fresh) {
        if fs::read(artifacts_dir.join(name))? != fs::read(scratch.path().join(name))? {
            report.mismatched.push(name.clone());
        }
    }

    if report.is_deterministic() {
        info!(files = fresh.len(), "artifacts are deterministic");
    } else {
        warn!(
            missing = report.missing.len(),
            extra = report.extra.len(),
            mismatched = report.mismatched.len(),
            "artifacts differ from a fresh run"
        );
    }
    Ok(report)
}

/// Every regular file under `dir`, as a `/`-separated path relative to it.
fn relative_files(dir: &Path) -> Result<BTreeSet<String>> {
    let mut files = BTreeSet::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        files.insert(parts.join("/"));
    }
    Ok(files)
}
