//! Canonical module identity for scanned files.

use super::records::{ModuleRecord, ARTIFACT_SCHEMA_VERSION};
use crate::error::{RepomapError, Result};

/// Directory treated as the package root when it leads a path.
pub const PACKAGE_ROOT_DIR: &str = "src";

/// Map a root-relative file path to its dotted module name.
///
/// `pkg/__init__.py` collapses to `pkg`, a leading `src/` is dropped, and a
/// path that would produce an empty name (or an empty component) fails.
pub fn path_to_module(path: &str) -> Result<String> {
    let normalized = path.replace('\\', "/");
    let stem = normalized.strip_suffix(".py").unwrap_or(&normalized);

    let mut parts: Vec<&str> = stem.split('/').collect();
    if parts.len() > 1 && parts[0] == PACKAGE_ROOT_DIR {
        parts.remove(0);
    }
    if parts.last() == Some(&"__init__") {
        parts.pop();
    }

    if parts.is_empty() || parts.iter().any(|part| part.is_empty()) {
        return Err(RepomapError::EmptyModuleName {
            path: path.to_string(),
        });
    }

    Ok(parts.join("."))
}

pub fn module_record(path: &str) -> Result<ModuleRecord> {
    let module = path_to_module(path)?;
    let package_root = if path.starts_with("src/") { "src" } else { "." };
    Ok(ModuleRecord {
        schema_version: ARTIFACT_SCHEMA_VERSION,
        path: path.to_string(),
        module,
        is_package: path.ends_with("__init__.py"),
        package_root: package_root.to_string(),
    })
}

/// Resolve `from <dots><relative> import ...` against the importing module.
///
/// A level deeper than the importing module falls back to the raw relative
/// name, or to the importing module when there is none.
pub fn resolve_relative_import(importing_module: &str, relative_module: &str, level: usize) -> String {
    let parts: Vec<&str> = importing_module.split('.').collect();

    if level > parts.len() {
        return if relative_module.is_empty() {
            importing_module.to_string()
        } else {
            relative_module.to_string()
        };
    }

    let base = &parts[..parts.len() - level];
    if !relative_module.is_empty() {
        let mut joined: Vec<&str> = base.to_vec();
        joined.push(relative_module);
        return joined.join(".");
    }
    if !base.is_empty() {
        return base.join(".");
    }
    importing_module.to_string()
}
