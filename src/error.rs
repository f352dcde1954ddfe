use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the analysis pipeline.
///
/// Resolution outcomes ("unresolved", "partial") are never errors; they are
/// reported as data. Per-file parse failures are recovered inside the
/// pipeline and only surface through logs.
#[derive(Debug, Error)]
pub enum RepomapError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("empty module name derived from path '{path}': module names must be non-empty")]
    EmptyModuleName { path: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("output directory '{0}' escapes the project root")]
    OutputDirEscapesRoot(String),

    #[error("failed to load grammar: {0}")]
    Grammar(String),

    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to decode {path}: {source}")]
    TomlDecode {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("artifacts directory not found: {0}")]
    MissingArtifacts(PathBuf),

    #[error("analysis cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, RepomapError>;
