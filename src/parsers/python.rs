mod calls;
mod imports;
mod symbols;

pub use calls::{module_scope_id, normalize_callee, raw_scope_id};
pub use imports::{collect_imports, collect_trivial_aliases};

use tracing::debug;

use super::common::TreeSitterParser;
use super::{LanguageParser, ParseResult};
use crate::error::Result;

pub struct PythonParser {
    parser: TreeSitterParser,
}

impl PythonParser {
    pub fn new() -> Result<Self> {
        let language = tree_sitter_python::language();
        let parser = TreeSitterParser::new(language)?;
        Ok(Self { parser })
    }

    /// Facts for a file whose bytes could not be read.
    pub fn unreadable(path: &str, module: &str, reason: String) -> ParseResult {
        Self::failed(path, module, reason, None)
    }

    fn failed(path: &str, module: &str, reason: String, root: Option<&tree_sitter::Node>) -> ParseResult {
        debug!(path, %reason, "recovering from parse failure");
        ParseResult {
            symbols: vec![symbols::module_symbol(path, module, root)],
            parse_error: Some(reason),
            ..ParseResult::default()
        }
    }
}

impl LanguageParser for PythonParser {
    fn parse_source(&mut self, path: &str, module: &str, source: &[u8]) -> Result<ParseResult> {
        if let Err(err) = std::str::from_utf8(source) {
            return Ok(Self::failed(path, module, format!("invalid UTF-8: {}", err), None));
        }

        let tree = self.parser.parse_source(path, source)?;
        let root = tree.root_node();
        if root.has_error() {
            return Ok(Self::failed(
                path,
                module,
                "syntax error".to_string(),
                Some(&root),
            ));
        }

        let mut symbol_records = vec![symbols::module_symbol(path, module, Some(&root))];
        symbol_records.extend(symbols::collect_symbols(&root, source, path, module));

        Ok(ParseResult {
            symbols: symbol_records,
            imports: collect_imports(&root, source),
            aliases: collect_trivial_aliases(&root, source),
            call_sites: calls::collect_calls(&root, source, path),
            parse_error: None,
        })
    }
}
