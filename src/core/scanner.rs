use globset::GlobSet;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::compile_globset;
use crate::error::Result;

/// Filtering rules applied while walking a project tree.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// First path component to skip (the artifacts directory).
    pub output_dir: Option<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub nested_gitignore: bool,
}

pub struct FileScanner {
    include: GlobSet,
    exclude: GlobSet,
    has_include: bool,
    output_dir: Option<String>,
    nested_gitignore: bool,
}

impl FileScanner {
    pub fn new(options: &ScanOptions) -> Result<Self> {
        Ok(Self {
            include: compile_globset(&options.include)?,
            exclude: compile_globset(&options.exclude)?,
            has_include: !options.include.is_empty(),
            output_dir: options.output_dir.clone(),
            nested_gitignore: options.nested_gitignore,
        })
    }

    /// Root-relative POSIX paths of every eligible `.py` file, sorted.
    pub fn scan_directory(&self, root: &Path) -> Result<Vec<String>> {
        let root = root.canonicalize()?;
        let matchers = self.gitignore_matchers(&root);

        let mut files: Vec<String> = WalkDir::new(&root)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.path().extension().map_or(false, |ext| ext == "py"))
            .filter_map(|entry| {
                let path = entry.path();
                if !is_within_root(path, &root) {
                    return None;
                }
                let relative = path.strip_prefix(&root).ok()?;
                let relative_str = to_posix(relative);
                self.accepts(path, relative, &relative_str, &matchers)
                    .then_some(relative_str)
            })
            .collect();

        files.sort();
        debug!(count = files.len(), root = %root.display(), "scanned python files");
        Ok(files)
    }

    fn accepts(
        &self,
        path: &Path,
        relative: &Path,
        relative_str: &str,
        matchers: &[Gitignore],
    ) -> bool {
        if let Some(output_dir) = &self.output_dir {
            let first = relative
                .components()
                .next()
                .map(|c| c.as_os_str().to_string_lossy());
            if first.as_deref() == Some(output_dir.as_str()) {
                return false;
            }
        }

        if is_ignored(path, matchers) {
            return false;
        }

        if self.has_include && !self.include.is_match(relative_str) {
            return false;
        }

        !self.exclude.is_match(relative_str)
    }

    /// Root `.gitignore` only, or every `.gitignore` under the root in path order.
    fn gitignore_matchers(&self, root: &Path) -> Vec<Gitignore> {
        let mut files: Vec<PathBuf> = if self.nested_gitignore {
            WalkDir::new(root)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|entry| entry.file_type().is_file() && entry.file_name() == ".gitignore")
                .map(|entry| entry.into_path())
                .collect()
        } else {
            let root_ignore = root.join(".gitignore");
            if root_ignore.is_file() {
                vec![root_ignore]
            } else {
                Vec::new()
            }
        };
        files.sort_by_key(|p| p.strip_prefix(root).map(to_posix).unwrap_or_default());

        files
            .into_iter()
            .filter_map(|file| {
                let dir = file.parent().unwrap_or(root);
                let mut builder = GitignoreBuilder::new(dir);
                if let Some(err) = builder.add(&file) {
                    warn!(path = %file.display(), error = %err, "failed to load .gitignore");
                }
                match builder.build() {
                    Ok(gi) => Some(gi),
                    Err(err) => {
                        warn!(path = %file.display(), error = %err, "failed to build gitignore matcher");
                        None
                    }
                }
            })
            .collect()
    }
}

/// A matcher only judges paths below the directory holding its `.gitignore`.
fn is_ignored(path: &Path, matchers: &[Gitignore]) -> bool {
    matchers.iter().any(|gi| {
        path.starts_with(gi.path())
            && gi.matched_path_or_any_parents(path, false).is_ignore()
    })
}

fn is_within_root(path: &Path, resolved_root: &Path) -> bool {
    path.canonicalize()
        .map(|resolved| resolved.starts_with(resolved_root))
        .unwrap_or(false)
}

pub fn to_posix(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
