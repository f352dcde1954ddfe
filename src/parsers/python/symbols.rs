use tree_sitter::Node as TSNode;

use crate::parsers::common::{end_point, extract_text, has_docstring, start_point};
use crate::core::records::{SymbolKind, SymbolRecord};

/// Synthetic record covering the whole file.
pub fn module_symbol(path: &str, module: &str, root: Option<&TSNode>) -> SymbolRecord {
    let name = module.rsplit('.').next().unwrap_or(module);
    let end = root.map(end_point).unwrap_or((1, 1));
    SymbolRecord::new(path, SymbolKind::Module, name, module, (1, 1), end)
        .with_docstring(root.map(has_docstring).unwrap_or(false))
}

/// Collect class, function and method records under `root`.
///
/// Class bodies are descended into with the class name pushed onto the parent
/// chain; function bodies are not.
pub fn collect_symbols(root: &TSNode, source: &[u8], path: &str, module: &str) -> Vec<SymbolRecord> {
    let mut symbols = Vec::new();
    let mut parents: Vec<&str> = Vec::new();
    let mut cursor = root.walk();

    loop {
        let node = cursor.node();
        let mut descend = true;
        match (node.kind(), definition_name(&node, source)) {
            ("class_definition", Some(name)) => {
                let qualified = qualified_name(module, &parents, name);
                symbols.push(
                    SymbolRecord::new(
                        path,
                        SymbolKind::Class,
                        name,
                        &qualified,
                        start_point(&node),
                        end_point(&node),
                    )
                    .with_docstring(has_docstring(&node))
                    .with_base_classes(base_classes(&node, source)),
                );
                parents.push(name);
            }
            ("function_definition", Some(name)) => {
                let kind = if parents.is_empty() {
                    SymbolKind::Function
                } else {
                    SymbolKind::Method
                };
                let qualified = qualified_name(module, &parents, name);
                symbols.push(
                    SymbolRecord::new(
                        path,
                        kind,
                        name,
                        &qualified,
                        start_point(&node),
                        end_point(&node),
                    )
                    .with_docstring(has_docstring(&node)),
                );
                descend = false;
            }
            _ => {}
        }

        if descend && cursor.goto_first_child() {
            continue;
        }
        loop {
            let node = cursor.node();
            if node.kind() == "class_definition" && definition_name(&node, source).is_some() {
                parents.pop();
            }
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return symbols;
            }
        }
    }
}

fn definition_name<'a>(node: &TSNode, source: &'a [u8]) -> Option<&'a str> {
    node.child_by_field_name("name")
        .map(|name| extract_text(&name, source))
        .filter(|name| !name.is_empty())
}

fn qualified_name(module: &str, parents: &[&str], name: &str) -> String {
    if parents.is_empty() {
        format!("{}.{}", module, name)
    } else {
        format!("{}.{}.{}", module, parents.join("."), name)
    }
}

/// Base classes as written: names, dotted names, the callee of a call base
/// and the value of a subscripted base. Keyword arguments are skipped.
fn base_classes(node: &TSNode, source: &[u8]) -> Option<Vec<String>> {
    let superclasses = node.child_by_field_name("superclasses")?;
    let mut bases = Vec::new();

    for child in superclasses.children(&mut superclasses.walk()) {
        let text = match child.kind() {
            "identifier" | "attribute" => Some(extract_text(&child, source)),
            "call" => child
                .child_by_field_name("function")
                .map(|func| extract_text(&func, source)),
            "subscript" => child
                .child_by_field_name("value")
                .map(|value| extract_text(&value, source)),
            _ => None,
        };
        if let Some(text) = text.filter(|t| !t.is_empty()) {
            bases.push(text.to_string());
        }
    }

    if bases.is_empty() {
        None
    } else {
        Some(bases)
    }
}
