use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::core::integrations::VALID_INTEGRATION_TAGS;
use crate::error::{RepomapError, Result};

pub const CONFIG_FILENAME: &str = "repomap.toml";
pub const DEFAULT_OUTPUT_DIR: &str = ".repomap";

/// How edges leaving a module that matches no layer glob are judged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unclassified {
    #[default]
    Allow,
    Deny,
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerDef {
    pub name: String,
    pub globs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerRule {
    #[serde(rename = "from")]
    pub from_layer: String,
    #[serde(default)]
    pub to: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayersConfig {
    /// Layer definitions, first match wins.
    pub layer: Vec<LayerDef>,
    /// Allowed dependencies; a later rule for the same layer replaces an earlier one.
    pub rules: Vec<LayerRule>,
    pub unclassified: Unclassified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepomapConfig {
    /// Output directory for generated artifacts, relative to the project root
    pub output_dir: String,

    /// Glob patterns a file must match to be scanned (empty = every Python file)
    pub include: Vec<String>,

    /// Glob patterns that remove files from the scan
    pub exclude: Vec<String>,

    /// Extra integration rules: top-level module -> tag
    pub integration_tags: BTreeMap<String, String>,

    pub layers: LayersConfig,

    /// Compose every .gitignore under the root instead of only the root one
    pub nested_gitignore: bool,
}

impl Default for RepomapConfig {
    fn default() -> Self {
        Self {
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            include: Vec::new(),
            exclude: Vec::new(),
            integration_tags: BTreeMap::new(),
            layers: LayersConfig::default(),
            nested_gitignore: false,
        }
    }
}

impl RepomapConfig {
    /// Load `repomap.toml` from `root`, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let config_path = root.join(CONFIG_FILENAME);
        if !config_path.is_file() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        Self::from_toml_str(&content).map_err(|err| match err {
            RepomapError::TomlDecode { source, .. } => RepomapError::TomlDecode {
                path: config_path.clone(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut table: toml::Table =
            toml::from_str(content).map_err(|source| RepomapError::TomlDecode {
                path: PathBuf::from(CONFIG_FILENAME),
                source,
            })?;

        // Claim sections belong to other tools sharing the file.
        table.remove("claims");

        let config: Self = toml::Value::Table(table)
            .try_into()
            .map_err(|source| RepomapError::TomlDecode {
                path: PathBuf::from(CONFIG_FILENAME),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject malformed globs, layer rules and integration tags.
    ///
    /// Runs before any file is scanned.
    pub fn validate(&self) -> Result<()> {
        compile_globset(&self.include)?;
        compile_globset(&self.exclude)?;

        for (module, tag) in &self.integration_tags {
            if !VALID_INTEGRATION_TAGS.contains(&tag.as_str()) {
                return Err(RepomapError::Config(format!(
                    "invalid integration tag '{}' for module '{}'. Valid tags: {}",
                    tag,
                    module,
                    sorted_tags().join(", ")
                )));
            }
        }

        for layer in &self.layers.layer {
            if layer.name.trim().is_empty() {
                return Err(RepomapError::Config(
                    "layer names must be non-empty".to_string(),
                ));
            }
            compile_globset(&layer.globs)?;
        }

        for rule in &self.layers.rules {
            if rule.from_layer.trim().is_empty() {
                return Err(RepomapError::Config(
                    "layer rule 'from' must be non-empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Resolve `output_dir` against `root`, refusing anything outside it.
    pub fn resolve_output_dir(&self, root: &Path) -> Result<PathBuf> {
        resolve_output_dir(root, &self.output_dir)
    }
}

fn sorted_tags() -> Vec<&'static str> {
    let mut tags = VALID_INTEGRATION_TAGS.to_vec();
    tags.sort_unstable();
    tags
}

pub fn resolve_output_dir(root: &Path, output_dir: &str) -> Result<PathBuf> {
    if output_dir.is_empty() {
        return Err(RepomapError::Config(
            "output_dir must be a non-empty relative path".to_string(),
        ));
    }
    if output_dir.starts_with('~') || Path::new(output_dir).is_absolute() {
        return Err(RepomapError::Config(
            "output_dir must be a relative path within the repo root".to_string(),
        ));
    }

    let resolved_root = root.canonicalize()?;
    let mut resolved = resolved_root.clone();
    for component in Path::new(output_dir).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return Err(RepomapError::OutputDirEscapesRoot(output_dir.to_string()));
                }
            }
            Component::Normal(part) => resolved.push(part),
            Component::RootDir | Component::Prefix(_) => {
                return Err(RepomapError::Config(
                    "output_dir must be a relative path within the repo root".to_string(),
                ));
            }
        }
    }

    if !resolved.starts_with(&resolved_root) {
        return Err(RepomapError::OutputDirEscapesRoot(output_dir.to_string()));
    }
    Ok(resolved)
}

/// Compile fnmatch-style patterns; `*` is allowed to cross `/`.
pub fn compile_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| RepomapError::InvalidGlob {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| RepomapError::InvalidGlob {
        pattern: patterns.join(", "),
        source,
    })
}
