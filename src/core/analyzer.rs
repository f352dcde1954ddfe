use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::canonical::{build_ref_id, canonicalize_enclosing_id, normalize_expr};
use super::graph::{build_deps_summary, edges_for_file, unique_edges, ModuleEdge};
use super::index::ResolutionIndex;
use super::integrations::IntegrationTagger;
use super::layers::LayerClassifier;
use super::modules::module_record;
use super::name_table::NameTable;
use super::records::{
    CallEvidence, CallRawRecord, CallRecord, DepsSummary, IntegrationRecord, ModuleRecord,
    RefEvidence, RefRecord, SymbolRecord, ARTIFACT_SCHEMA_VERSION,
};
use super::resolver::{CallResolver, Strategy};
use super::scanner::{to_posix, FileScanner, ScanOptions};
use crate::config::RepomapConfig;
use crate::error::{RepomapError, Result};
use crate::parsers::python::PythonParser;
use crate::parsers::{LanguageParser, ParseResult};

/// Every artifact of one run, already in canonical order.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub symbols: Vec<SymbolRecord>,
    pub modules: Vec<ModuleRecord>,
    pub calls_raw: Vec<CallRawRecord>,
    pub refs: Vec<RefRecord>,
    pub calls: Vec<CallRecord>,
    pub edges: Vec<ModuleEdge>,
    pub deps_summary: DepsSummary,
    pub integrations: Vec<IntegrationRecord>,
}

/// Per-file extraction output.
struct FileFacts {
    path: String,
    module: String,
    parsed: ParseResult,
}

pub struct CodebaseAnalyzer {
    config: RepomapConfig,
    cancel: Arc<AtomicBool>,
}

impl CodebaseAnalyzer {
    /// Validates the configuration before anything is scanned.
    pub fn new(config: RepomapConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Setting the flag stops the run at the next file boundary.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn config(&self) -> &RepomapConfig {
        &self.config
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.load(Ordering::Relaxed) {
            return Err(RepomapError::Cancelled);
        }
        Ok(())
    }

    /// Run the whole pipeline over `root`.
    ///
    /// `output_dir` is only used to keep previously written artifacts out
    /// of the scan.
    pub fn analyze(&self, root: &Path, output_dir: Option<&Path>) -> Result<Artifacts> {
        let start = Instant::now();
        let classifier = LayerClassifier::new(&self.config.layers)?;
        let tagger = IntegrationTagger::new(&self.config.integration_tags);

        let scanner = FileScanner::new(&ScanOptions {
            output_dir: output_dir_name(root, output_dir),
            include: self.config.include.clone(),
            exclude: self.config.exclude.clone(),
            nested_gitignore: self.config.nested_gitignore,
        })?;

        info!(root = %root.display(), "scanning files");
        let files = scanner.scan_directory(root)?;
        info!(count = files.len(), "found python files");

        let modules = files
            .iter()
            .map(|path| module_record(path))
            .collect::<Result<Vec<_>>>()?;

        let facts = self.extract_all(root, &modules)?;

        let mut symbols: Vec<SymbolRecord> = facts
            .iter()
            .flat_map(|f| f.parsed.symbols.iter().cloned())
            .collect();
        if classifier.is_configured() {
            for symbol in &mut symbols {
                symbol.layer = classifier.classify(&symbol.path).map(str::to_string);
            }
        }
        symbols.sort_by(|a, b| {
            (&a.path, a.start_line, a.start_col).cmp(&(&b.path, b.start_line, b.start_col))
        });

        debug!(symbols = symbols.len(), "building resolution index");
        let index = ResolutionIndex::build(&modules, &symbols);

        let calls_raw = build_calls_raw(&facts);
        let refs = self.resolve_all(&facts, &index)?;
        let calls = project_calls(&refs);

        let edges = unique_edges(
            facts
                .iter()
                .flat_map(|f| edges_for_file(&f.module, &f.parsed.imports)),
        );
        let mut module_paths = BTreeMap::new();
        for module in &modules {
            module_paths.insert(module.module.clone(), module.path.clone());
        }
        let deps_summary = build_deps_summary(
            &edges,
            &module_paths,
            classifier.is_configured().then_some(&classifier),
        );

        let mut integrations: Vec<IntegrationRecord> = facts
            .iter()
            .flat_map(|f| tagger.detect(&f.path, &f.parsed.imports))
            .collect();
        integrations.sort_by(|a, b| {
            (&a.path, a.line.unwrap_or(0), &a.tag, &a.evidence)
                .cmp(&(&b.path, b.line.unwrap_or(0), &b.tag, &b.evidence))
        });

        info!(
            symbols = symbols.len(),
            refs = refs.len(),
            edges = edges.len(),
            cycles = deps_summary.cycles.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "analysis completed"
        );

        Ok(Artifacts {
            symbols,
            modules,
            calls_raw,
            refs,
            calls,
            edges,
            deps_summary,
            integrations,
        })
    }

    /// Parse every file once, in parallel; results come back in scan order.
    fn extract_all(&self, root: &Path, modules: &[ModuleRecord]) -> Result<Vec<FileFacts>> {
        info!("extracting symbols, imports and calls");
        modules
            .par_iter()
            .map_init(PythonParser::new, |parser, record| {
                self.check_cancelled()?;
                let parser = parser
                    .as_mut()
                    .map_err(|err| RepomapError::Grammar(err.to_string()))?;

                let parsed = match std::fs::read(root.join(&record.path)) {
                    Ok(source) => parser.parse_source(&record.path, &record.module, &source)?,
                    Err(err) => {
                        warn!(path = %record.path, error = %err, "failed to read file");
                        PythonParser::unreadable(&record.path, &record.module, err.to_string())
                    }
                };
                if let Some(reason) = &parsed.parse_error {
                    warn!(path = %record.path, %reason, "skipping facts for unparseable file");
                }

                Ok(FileFacts {
                    path: record.path.clone(),
                    module: record.module.clone(),
                    parsed,
                })
            })
            .collect()
    }

    /// Resolve every call site against its file's name table.
    fn resolve_all(&self, facts: &[FileFacts], index: &ResolutionIndex) -> Result<Vec<RefRecord>> {
        info!("resolving call sites");
        let resolver = CallResolver::new(index);

        let per_file = facts
            .par_iter()
            .map(|file| {
                self.check_cancelled()?;
                let Some(module) = index.module_for_path(&file.path) else {
                    return Ok(Vec::new());
                };
                let table =
                    NameTable::build(&file.path, index, &file.parsed.imports, &file.parsed.aliases);

                let refs = file
                    .parsed
                    .call_sites
                    .iter()
                    .filter_map(|call| {
                        let expr = normalize_expr(&call.callee_expr);
                        if expr.is_empty() {
                            return None;
                        }
                        let enclosing = canonicalize_enclosing_id(&call.enclosing_symbol_id, index);
                        let resolution = resolver.resolve(&expr, enclosing.as_deref(), &table);
                        Some(RefRecord {
                            schema_version: ARTIFACT_SCHEMA_VERSION,
                            ref_id: build_ref_id(
                                &call.span.path,
                                call.span.start_line,
                                call.span.start_col,
                                "call",
                                &expr,
                            ),
                            ref_kind: "call".to_string(),
                            src_span: call.span.clone(),
                            module: module.to_string(),
                            enclosing_symbol_id: enclosing,
                            resolved_to: resolution.resolved_to().cloned(),
                            resolved_base_to: resolution.resolved_base_to().cloned(),
                            member: resolution.member().map(str::to_string),
                            evidence: RefEvidence {
                                strategy: resolution.strategy,
                                confidence: resolution.confidence,
                                notes: None,
                            },
                            expr,
                        })
                    })
                    .collect::<Vec<_>>();
                Ok(refs)
            })
            .collect::<Result<Vec<Vec<RefRecord>>>>()?;

        let mut refs: Vec<RefRecord> = per_file.into_iter().flatten().collect();
        refs.sort_by(|a, b| ref_sort_key(a).cmp(&ref_sort_key(b)));
        Ok(refs)
    }
}

fn ref_sort_key(r: &RefRecord) -> (&str, usize, usize, &str, &str, &str) {
    (
        &r.src_span.path,
        r.src_span.start_line,
        r.src_span.start_col,
        &r.ref_kind,
        r.enclosing_symbol_id.as_deref().unwrap_or(""),
        &r.expr,
    )
}

fn build_calls_raw(facts: &[FileFacts]) -> Vec<CallRawRecord> {
    let mut records: Vec<CallRawRecord> = facts
        .iter()
        .flat_map(|f| f.parsed.call_sites.iter())
        .map(|call| CallRawRecord {
            schema_version: ARTIFACT_SCHEMA_VERSION,
            ref_id: build_ref_id(
                &call.span.path,
                call.span.start_line,
                call.span.start_col,
                "call",
                &call.callee_expr,
            ),
            src_span: call.span.clone(),
            callee_expr: call.callee_expr.clone(),
            enclosing_symbol_id: call.enclosing_symbol_id.clone(),
            resolved_to: None,
            evidence: CallEvidence {
                strategy: Strategy::SyntaxOnly,
            },
        })
        .collect();

    records.sort_by(|a, b| {
        (
            &a.src_span.path,
            a.src_span.start_line,
            a.src_span.start_col,
            &a.enclosing_symbol_id,
            &a.callee_expr,
        )
            .cmp(&(
                &b.src_span.path,
                b.src_span.start_line,
                b.src_span.start_col,
                &b.enclosing_symbol_id,
                &b.callee_expr,
            ))
    });
    records
}

/// Calls are the `call`-kind refs re-sorted by callee.
fn project_calls(refs: &[RefRecord]) -> Vec<CallRecord> {
    let mut calls: Vec<CallRecord> = refs.iter().filter_map(CallRecord::from_ref).collect();
    calls.sort_by(|a, b| {
        (
            &a.src_span.path,
            a.src_span.start_line,
            a.src_span.start_col,
            &a.callee_expr,
        )
            .cmp(&(
                &b.src_span.path,
                b.src_span.start_line,
                b.src_span.start_col,
                &b.callee_expr,
            ))
    });
    calls
}

/// First component of `output_dir` when it lives inside `root`.
fn output_dir_name(root: &Path, output_dir: Option<&Path>) -> Option<String> {
    let output_dir = output_dir?;
    let root = root.canonicalize().ok()?;
    let resolved: PathBuf = if output_dir.exists() {
        output_dir.canonicalize().ok()?
    } else if output_dir.is_absolute() {
        output_dir.to_path_buf()
    } else {
        root.join(output_dir)
    };
    let relative = resolved.strip_prefix(&root).ok()?;
    to_posix(relative)
        .split('/')
        .next()
        .filter(|first| !first.is_empty())
        .map(str::to_string)
}
