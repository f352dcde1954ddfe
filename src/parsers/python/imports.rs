use std::collections::VecDeque;
use tree_sitter::Node as TSNode;

use crate::parsers::common::extract_text;
use crate::parsers::{ImportKind, ImportStatement, TrivialAlias};

/// Collect every import statement in the tree, including nested ones.
///
/// Statements are visited breadth-first so module-level imports come before
/// imports inside functions and classes.
pub fn collect_imports(root: &TSNode, source: &[u8]) -> Vec<ImportStatement> {
    let mut imports = Vec::new();
    let mut queue = VecDeque::from([*root]);

    while let Some(node) = queue.pop_front() {
        match node.kind() {
            "import_statement" => plain_import(&node, source, &mut imports),
            "import_from_statement" => from_import(&node, source, &mut imports),
            "future_import_statement" => future_import(&node, source, &mut imports),
            _ => {}
        }
        for child in node.children(&mut node.walk()) {
            queue.push_back(child);
        }
    }

    imports
}

fn line_of(node: &TSNode) -> usize {
    node.start_position().row + 1
}

fn plain_import(node: &TSNode, source: &[u8], out: &mut Vec<ImportStatement>) {
    let line = line_of(node);
    for name in node.children_by_field_name("name", &mut node.walk()) {
        let (module, alias) = match name.kind() {
            "aliased_import" => (
                name.child_by_field_name("name")
                    .map(|n| extract_text(&n, source))
                    .unwrap_or(""),
                name.child_by_field_name("alias")
                    .map(|n| extract_text(&n, source))
                    .unwrap_or(""),
            ),
            _ => (extract_text(&name, source), ""),
        };
        out.push(ImportStatement {
            kind: ImportKind::Import,
            line,
            module: module.to_string(),
            name: alias.to_string(),
            level: 0,
        });
    }
}

fn from_import(node: &TSNode, source: &[u8], out: &mut Vec<ImportStatement>) {
    let line = line_of(node);
    let (module, level) = match node.child_by_field_name("module_name") {
        Some(module_node) if module_node.kind() == "relative_import" => {
            let mut level = 0;
            let mut module = "";
            for part in module_node.children(&mut module_node.walk()) {
                match part.kind() {
                    "import_prefix" => {
                        level += extract_text(&part, source).matches('.').count()
                    }
                    "dotted_name" => module = extract_text(&part, source),
                    _ => {}
                }
            }
            (module, level)
        }
        Some(module_node) => (extract_text(&module_node, source), 0),
        None => ("", 0),
    };

    let has_wildcard = node
        .children(&mut node.walk())
        .any(|child| child.kind() == "wildcard_import");
    if has_wildcard {
        out.push(ImportStatement {
            kind: ImportKind::ImportStar,
            line,
            module: module.to_string(),
            name: "*".to_string(),
            level,
        });
        return;
    }

    let kind = if level > 0 {
        ImportKind::RelativeImport
    } else {
        ImportKind::ImportFrom
    };
    for name in node.children_by_field_name("name", &mut node.walk()) {
        out.push(ImportStatement {
            kind,
            line,
            module: module.to_string(),
            name: imported_name(&name, source),
            level,
        });
    }
}

fn future_import(node: &TSNode, source: &[u8], out: &mut Vec<ImportStatement>) {
    let line = line_of(node);
    for name in node.children_by_field_name("name", &mut node.walk()) {
        out.push(ImportStatement {
            kind: ImportKind::ImportFrom,
            line,
            module: "__future__".to_string(),
            name: imported_name(&name, source),
            level: 0,
        });
    }
}

fn imported_name(name: &TSNode, source: &[u8]) -> String {
    if name.kind() == "aliased_import" {
        let original = name
            .child_by_field_name("name")
            .map(|n| extract_text(&n, source))
            .unwrap_or("");
        let alias = name
            .child_by_field_name("alias")
            .map(|n| extract_text(&n, source))
            .unwrap_or("");
        if alias.is_empty() {
            return original.to_string();
        }
        return format!("{} as {}", original, alias);
    }
    extract_text(name, source).to_string()
}

/// Module-level `target = source` assignments between bare names.
pub fn collect_trivial_aliases(root: &TSNode, source: &[u8]) -> Vec<TrivialAlias> {
    let mut aliases = Vec::new();

    for statement in root.children(&mut root.walk()) {
        if statement.kind() != "expression_statement" || statement.named_child_count() != 1 {
            continue;
        }
        let Some(assignment) = statement.named_child(0) else {
            continue;
        };
        if assignment.kind() != "assignment" || assignment.child_by_field_name("type").is_some() {
            continue;
        }
        let (Some(left), Some(right)) = (
            assignment.child_by_field_name("left"),
            assignment.child_by_field_name("right"),
        ) else {
            continue;
        };
        if left.kind() == "identifier" && right.kind() == "identifier" {
            aliases.push(TrivialAlias {
                target: extract_text(&left, source).to_string(),
                source: extract_text(&right, source).to_string(),
            });
        }
    }

    aliases
}
