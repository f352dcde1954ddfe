pub mod common;
pub mod python;

use crate::core::records::{SourceSpan, SymbolRecord};
use crate::error::Result;

/// The four import shapes, named as they appear in integration evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImportKind {
    Import,
    ImportFrom,
    ImportStar,
    RelativeImport,
}

impl ImportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ImportKind::Import => "import",
            ImportKind::ImportFrom => "import_from",
            ImportKind::ImportStar => "import_star",
            ImportKind::RelativeImport => "relative_import",
        }
    }
}

/// One imported name: `(line, module, name-or-alias, level)`.
///
/// For `import a.b as c` the name is `c`; for from-imports it is `x` or
/// `x as y`; star imports carry `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    pub kind: ImportKind,
    pub line: usize,
    pub module: String,
    pub name: String,
    pub level: usize,
}

impl ImportStatement {
    /// Split `x as y` into `(x, y)`; a plain name binds to itself.
    pub fn imported_and_local(&self) -> (&str, &str) {
        match self.name.split_once(" as ") {
            Some((name, alias)) => (name.trim(), alias.trim()),
            None => {
                let name = self.name.trim();
                (name, name)
            }
        }
    }
}

/// A module-level `target = source` where both sides are bare names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrivialAlias {
    pub target: String,
    pub source: String,
}

/// A call expression before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub span: SourceSpan,
    pub callee_expr: String,
    /// Raw scope id: `module:{path}` or `symbol:{path}:{name}@L{line}:C{col0}`.
    pub enclosing_symbol_id: String,
}

/// Everything extracted from one file in a single parse.
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    pub symbols: Vec<SymbolRecord>,
    pub imports: Vec<ImportStatement>,
    pub aliases: Vec<TrivialAlias>,
    pub call_sites: Vec<CallSite>,
    /// Set when the file could not be decoded or parsed cleanly.
    pub parse_error: Option<String>,
}

pub trait LanguageParser {
    /// Extract facts from `source`, recovering locally from syntax errors.
    fn parse_source(&mut self, path: &str, module: &str, source: &[u8]) -> Result<ParseResult>;
}
