use tree_sitter::{Language, Node as TSNode, Parser, Tree};

use crate::core::records::SourceSpan;
use crate::error::{RepomapError, Result};

pub struct TreeSitterParser {
    parser: Parser,
}

impl TreeSitterParser {
    pub fn new(language: Language) -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(language)
            .map_err(|err| RepomapError::Grammar(err.to_string()))?;
        Ok(Self { parser })
    }

    pub fn parse_source(&mut self, path: &str, source: &[u8]) -> Result<Tree> {
        self.parser
            .parse(source, None)
            .ok_or_else(|| RepomapError::Parse {
                path: path.to_string(),
                reason: "parser returned no tree".to_string(),
            })
    }
}

pub fn extract_text<'a>(node: &TSNode, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// 1-based `(line, col)` of a node's start.
pub fn start_point(node: &TSNode) -> (usize, usize) {
    let pos = node.start_position();
    (pos.row + 1, pos.column + 1)
}

/// 1-based `(line, col)` of a node's end.
pub fn end_point(node: &TSNode) -> (usize, usize) {
    let pos = node.end_position();
    (pos.row + 1, pos.column + 1)
}

pub fn node_span(path: &str, node: &TSNode) -> SourceSpan {
    let (start_line, start_col) = start_point(node);
    let (end_line, end_col) = end_point(node);
    SourceSpan {
        path: path.to_string(),
        start_line,
        start_col,
        end_line,
        end_col,
    }
}

/// Whether the first statement of a module, class or function body is a bare string.
pub fn has_docstring(node: &TSNode) -> bool {
    let body = if node.kind() == "module" {
        Some(*node)
    } else {
        node.child_by_field_name("body")
    };
    let Some(body) = body else {
        return false;
    };

    for child in body.children(&mut body.walk()) {
        if child.kind() == "expression_statement" {
            return child
                .child(0)
                .map(|first| first.kind() == "string")
                .unwrap_or(false);
        }
        if child.is_named() && child.kind() != "comment" {
            break;
        }
    }
    false
}
