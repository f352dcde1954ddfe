use tree_sitter::Node as TSNode;

use crate::parsers::common::{extract_text, node_span};
use crate::parsers::CallSite;

pub fn module_scope_id(path: &str) -> String {
    format!("module:{}", path)
}

/// Raw scope id; `col` is the 0-based start column of the scope node.
pub fn raw_scope_id(path: &str, name: &str, line: usize, col: usize) -> String {
    format!("symbol:{}:{}@L{}:C{}", path, name, line, col)
}

/// Walk the tree collecting every call with its innermost enclosing scope.
///
/// The walk is a cursor traversal in document order. A scope id is pushed on
/// entering a class, function or lambda and popped on leaving it; the stack
/// always starts with the module scope.
pub fn collect_calls(root: &TSNode, source: &[u8], path: &str) -> Vec<CallSite> {
    let mut calls = Vec::new();
    let mut scopes = vec![module_scope_id(path)];
    let mut cursor = root.walk();

    loop {
        let node = cursor.node();
        if let Some(scope) = scope_id(&node, source, path) {
            scopes.push(scope);
        }
        if node.kind() == "call" {
            let callee = node.child_by_field_name("function");
            let enclosing = scopes
                .last()
                .cloned()
                .unwrap_or_else(|| module_scope_id(path));
            calls.push(CallSite {
                span: node_span(path, &node),
                callee_expr: normalize_callee(callee.as_ref(), source).trim().to_string(),
                enclosing_symbol_id: enclosing,
            });
        }

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if opens_scope(&cursor.node()) {
                scopes.pop();
            }
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return calls;
            }
        }
    }
}

fn opens_scope(node: &TSNode) -> bool {
    matches!(
        node.kind(),
        "class_definition" | "function_definition" | "lambda"
    )
}

fn scope_id(node: &TSNode, source: &[u8], path: &str) -> Option<String> {
    let name = match node.kind() {
        "lambda" => "<lambda>",
        "class_definition" | "function_definition" => node
            .child_by_field_name("name")
            .map(|n| extract_text(&n, source).trim())
            .filter(|n| !n.is_empty())
            .unwrap_or(if node.kind() == "class_definition" {
                "<class>"
            } else {
                "<function>"
            }),
        _ => return None,
    };
    let pos = node.start_position();
    Some(raw_scope_id(path, name, pos.row + 1, pos.column))
}

/// Textual form of a callee: dotted chains survive, anything dynamic
/// collapses to a `<kind>` placeholder.
pub fn normalize_callee(callee: Option<&TSNode>, source: &[u8]) -> String {
    let Some(callee) = callee else {
        return "<complex_expr>".to_string();
    };

    match callee.kind() {
        "identifier" => extract_text(callee, source).trim().to_string(),
        "attribute" => {
            attribute_chain(callee, source).unwrap_or_else(|| "<attribute>".to_string())
        }
        "subscript" => "<subscript>".to_string(),
        "call" => "<call>".to_string(),
        "lambda" => "<lambda>".to_string(),
        other => format!("<{}>", other),
    }
}

/// `a.b.c` read from the outermost attribute down to its base. `None` when a
/// link is not an identifier or the base is neither a name nor `super()`.
fn attribute_chain(node: &TSNode, source: &[u8]) -> Option<String> {
    let mut attributes = Vec::new();
    let mut current = *node;
    while current.kind() == "attribute" {
        let attribute = current
            .child_by_field_name("attribute")
            .filter(|a| a.kind() == "identifier")?;
        attributes.push(extract_text(&attribute, source).trim());
        current = current.child_by_field_name("object")?;
    }

    let base = if is_bare_super_call(&current, source) {
        "super()"
    } else if current.kind() == "identifier" {
        extract_text(&current, source).trim()
    } else {
        return None;
    };

    let mut chain = base.to_string();
    for attribute in attributes.iter().rev() {
        chain.push('.');
        chain.push_str(attribute);
    }
    Some(chain)
}

/// `super()` with no arguments, the only call kept verbatim in a callee.
fn is_bare_super_call(node: &TSNode, source: &[u8]) -> bool {
    if node.kind() != "call" {
        return false;
    }
    let is_super = node
        .child_by_field_name("function")
        .map(|f| f.kind() == "identifier" && extract_text(&f, source) == "super")
        .unwrap_or(false);
    let no_args = node
        .child_by_field_name("arguments")
        .map(|args| args.named_child_count() == 0)
        .unwrap_or(false);
    is_super && no_args
}
