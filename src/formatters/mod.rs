//! Artifact writers.
//!
//! Every artifact is rendered in memory first, then each file is replaced
//! atomically through a temporary file in the output directory.

pub mod edge_list;
pub mod json_lines;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

pub use edge_list::format_edges;
pub use json_lines::{format_jsonl, format_pretty};

use crate::core::analyzer::Artifacts;
use crate::error::{RepomapError, Result};

pub const SYMBOLS_FILE: &str = "symbols.jsonl";
pub const MODULES_FILE: &str = "modules.jsonl";
pub const CALLS_RAW_FILE: &str = "calls_raw.jsonl";
pub const REFS_FILE: &str = "refs.jsonl";
pub const CALLS_FILE: &str = "calls.jsonl";
pub const DEPS_EDGELIST_FILE: &str = "deps.edgelist";
pub const DEPS_SUMMARY_FILE: &str = "deps_summary.json";
pub const INTEGRATIONS_FILE: &str = "integrations_static.jsonl";

/// Every file a generate run writes, sorted.
pub const ARTIFACT_FILES: &[&str] = &[
    CALLS_FILE,
    CALLS_RAW_FILE,
    DEPS_EDGELIST_FILE,
    DEPS_SUMMARY_FILE,
    INTEGRATIONS_FILE,
    MODULES_FILE,
    REFS_FILE,
    SYMBOLS_FILE,
];

pub struct ArtifactWriter {
    out_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(out_dir: &Path) -> Self {
        Self {
            out_dir: out_dir.to_path_buf(),
        }
    }

    /// Render everything, then write. Returns the written paths sorted.
    pub fn write_all(&self, artifacts: &Artifacts) -> Result<Vec<PathBuf>> {
        let rendered = [
            (SYMBOLS_FILE, format_jsonl(&artifacts.symbols)?),
            (MODULES_FILE, format_jsonl(&artifacts.modules)?),
            (CALLS_RAW_FILE, format_jsonl(&artifacts.calls_raw)?),
            (REFS_FILE, format_jsonl(&artifacts.refs)?),
            (CALLS_FILE, format_jsonl(&artifacts.calls)?),
            (DEPS_EDGELIST_FILE, format_edges(&artifacts.edges)),
            (DEPS_SUMMARY_FILE, format_pretty(&artifacts.deps_summary)?),
            (INTEGRATIONS_FILE, format_jsonl(&artifacts.integrations)?),
        ];

        fs::create_dir_all(&self.out_dir)?;
        let mut written = Vec::with_capacity(rendered.len());
        for (name, content) in rendered {
            written.push(self.write_file(name, &content)?);
        }
        written.sort();
        Ok(written)
    }

    fn write_file(&self, name: &str, content: &str) -> Result<PathBuf> {
        let target = self.out_dir.join(name);
        let mut tmp = NamedTempFile::new_in(&self.out_dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(&target)
            .map_err(|err| RepomapError::Io(err.error))?;
        debug!(path = %target.display(), bytes = content.len(), "wrote artifact");
        Ok(target)
    }
}
