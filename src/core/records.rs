//! Artifact record types.
//!
//! Every record is derived freshly on each run; field order here does not
//! matter because writers emit keys sorted at every nesting level.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::resolver::Strategy;

pub const SYMBOLS_SCHEMA_VERSION: u32 = 3;
pub const ARTIFACT_SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Module,
    Class,
    Function,
    Method,
}

impl SymbolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Module => "module",
            SymbolKind::Class => "class",
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
        }
    }
}

/// 1-based source coordinates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub path: String,
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRecord {
    pub schema_version: u32,
    pub path: String,
    pub kind: SymbolKind,
    pub name: String,
    pub qualified_name: String,
    pub symbol_id: String,
    pub symbol_key: String,
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
    pub docstring_present: bool,
    pub base_classes: Option<Vec<String>>,
    pub layer: Option<String>,
}

impl SymbolRecord {
    pub fn new(
        path: &str,
        kind: SymbolKind,
        name: &str,
        qualified_name: &str,
        start: (usize, usize),
        end: (usize, usize),
    ) -> Self {
        Self {
            schema_version: SYMBOLS_SCHEMA_VERSION,
            path: path.to_string(),
            kind,
            name: name.to_string(),
            qualified_name: qualified_name.to_string(),
            symbol_id: symbol_id(path, qualified_name, start.0, start.1),
            symbol_key: symbol_key(path, qualified_name, kind),
            start_line: start.0,
            start_col: start.1,
            end_line: end.0,
            end_col: end.1,
            docstring_present: false,
            base_classes: None,
            layer: None,
        }
    }

    pub fn with_docstring(mut self, present: bool) -> Self {
        self.docstring_present = present;
        self
    }

    pub fn with_base_classes(mut self, bases: Option<Vec<String>>) -> Self {
        self.base_classes = bases;
        self
    }
}

pub fn symbol_id(path: &str, qualified_name: &str, line: usize, col: usize) -> String {
    format!("sym:{}::{}@L{}:C{}", path, qualified_name, line, col)
}

pub fn symbol_key(path: &str, qualified_name: &str, kind: SymbolKind) -> String {
    format!("symkey:{}::{}::{}", path, qualified_name, kind.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub schema_version: u32,
    pub path: String,
    pub module: String,
    pub is_package: bool,
    pub package_root: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEvidence {
    pub strategy: Strategy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRawRecord {
    pub schema_version: u32,
    pub ref_id: String,
    pub src_span: SourceSpan,
    pub callee_expr: String,
    pub enclosing_symbol_id: String,
    pub resolved_to: Option<String>,
    pub evidence: CallEvidence,
}

/// A full match to one symbol or module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTo {
    pub symbol_id: String,
    pub qualified_name: String,
    pub resolution: String,
    pub confidence: u8,
    pub path: Option<String>,
    pub dst_module: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefEvidence {
    pub strategy: Strategy,
    pub confidence: u8,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefRecord {
    pub schema_version: u32,
    pub ref_id: String,
    pub ref_kind: String,
    pub src_span: SourceSpan,
    pub module: String,
    pub enclosing_symbol_id: Option<String>,
    pub expr: String,
    pub resolved_to: Option<ResolvedTo>,
    pub evidence: RefEvidence,
    pub resolved_base_to: Option<ResolvedTo>,
    pub member: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub schema_version: u32,
    pub ref_id: String,
    pub src_span: SourceSpan,
    pub callee_expr: String,
    pub module: String,
    pub enclosing_symbol_id: Option<String>,
    pub resolved_to: Option<ResolvedTo>,
    pub resolved_base_to: Option<ResolvedTo>,
    pub member: Option<String>,
    pub evidence: RefEvidence,
}

impl CallRecord {
    /// Project a call reference; other reference kinds have no call record.
    pub fn from_ref(record: &RefRecord) -> Option<Self> {
        if record.ref_kind != "call" {
            return None;
        }
        Some(Self {
            schema_version: ARTIFACT_SCHEMA_VERSION,
            ref_id: record.ref_id.clone(),
            src_span: record.src_span.clone(),
            callee_expr: record.expr.clone(),
            module: record.module.clone(),
            enclosing_symbol_id: record.enclosing_symbol_id.clone(),
            resolved_to: record.resolved_to.clone(),
            resolved_base_to: record.resolved_base_to.clone(),
            member: record.member.clone(),
            evidence: record.evidence.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerViolation {
    pub from_file: String,
    pub to_module: String,
    pub from_layer: String,
    pub to_layer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepsSummary {
    pub schema_version: u32,
    pub node_count: usize,
    pub edge_count: usize,
    pub cycles: Vec<Vec<String>>,
    pub fan_in: BTreeMap<String, usize>,
    pub fan_out: BTreeMap<String, usize>,
    pub top_modules: Vec<String>,
    pub layer_violations: Vec<LayerViolation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationRecord {
    pub schema_version: u32,
    pub path: String,
    pub tag: String,
    pub evidence: String,
    pub line: Option<usize>,
    pub symbol: Option<String>,
}
