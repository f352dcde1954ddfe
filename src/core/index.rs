//! Cross-file lookup tables built once after extraction.
//!
//! Nothing here is mutated after construction; per-file name tables and the
//! resolver borrow these tables for the whole resolution pass.

use std::collections::{BTreeMap, HashMap};

use super::records::{ModuleRecord, SymbolKind, SymbolRecord};

/// Symbol metadata used during name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    pub symbol_id: String,
    pub qualified_name: String,
    pub name: String,
    pub kind: SymbolKind,
    pub path: String,
    pub base_classes: Vec<String>,
}

impl SymbolInfo {
    fn from_record(record: &SymbolRecord) -> Self {
        Self {
            symbol_id: record.symbol_id.clone(),
            qualified_name: record.qualified_name.clone(),
            name: record.name.clone(),
            kind: record.kind,
            path: record.path.clone(),
            base_classes: record.base_classes.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ResolutionIndex {
    /// path -> module
    modules_by_path: BTreeMap<String, String>,
    /// module -> lexicographically first path
    module_to_path: BTreeMap<String, String>,
    /// module -> symbols ordered by (path, qualified_name, symbol_id)
    symbols_by_module: BTreeMap<String, Vec<SymbolInfo>>,
    /// first symbol per qualified name in module order
    by_qualified_name: HashMap<String, SymbolInfo>,
    by_symbol_id: HashMap<String, SymbolInfo>,
    /// (path, start_line, start_col) -> symbol_id
    by_span: HashMap<(String, usize, usize), String>,
}

impl ResolutionIndex {
    pub fn build(modules: &[ModuleRecord], symbols: &[SymbolRecord]) -> Self {
        let modules_by_path: BTreeMap<String, String> = modules
            .iter()
            .map(|m| (m.path.clone(), m.module.clone()))
            .collect();

        let mut module_to_path = BTreeMap::new();
        for (path, module) in &modules_by_path {
            module_to_path
                .entry(module.clone())
                .or_insert_with(|| path.clone());
        }

        let mut symbols_by_module: BTreeMap<String, Vec<SymbolInfo>> = BTreeMap::new();
        let mut by_span = HashMap::with_capacity(symbols.len());
        for record in symbols {
            by_span.insert(
                (normalize_path(&record.path), record.start_line, record.start_col),
                record.symbol_id.clone(),
            );
            if let Some(module) = modules_by_path.get(&record.path) {
                symbols_by_module
                    .entry(module.clone())
                    .or_default()
                    .push(SymbolInfo::from_record(record));
            }
        }
        for entries in symbols_by_module.values_mut() {
            entries.sort_by(|a, b| {
                (&a.path, &a.qualified_name, &a.symbol_id)
                    .cmp(&(&b.path, &b.qualified_name, &b.symbol_id))
            });
        }

        let mut by_qualified_name = HashMap::new();
        let mut by_symbol_id = HashMap::new();
        for entries in symbols_by_module.values() {
            for symbol in entries {
                by_qualified_name
                    .entry(symbol.qualified_name.clone())
                    .or_insert_with(|| symbol.clone());
                by_symbol_id
                    .entry(symbol.symbol_id.clone())
                    .or_insert_with(|| symbol.clone());
            }
        }

        Self {
            modules_by_path,
            module_to_path,
            symbols_by_module,
            by_qualified_name,
            by_symbol_id,
            by_span,
        }
    }

    pub fn module_for_path(&self, path: &str) -> Option<&str> {
        self.modules_by_path.get(path).map(String::as_str)
    }

    pub fn path_for_module(&self, module: &str) -> Option<&str> {
        self.module_to_path.get(module).map(String::as_str)
    }

    pub fn is_internal_path(&self, path: &str) -> bool {
        self.modules_by_path.contains_key(path)
    }

    pub fn is_known_module(&self, module: &str) -> bool {
        self.module_to_path.contains_key(module)
    }

    pub fn symbols_in_module(&self, module: &str) -> &[SymbolInfo] {
        self.symbols_by_module
            .get(module)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn symbol_by_qualified_name(&self, qualified_name: &str) -> Option<&SymbolInfo> {
        self.by_qualified_name.get(qualified_name)
    }

    pub fn symbol_by_id(&self, symbol_id: &str) -> Option<&SymbolInfo> {
        self.by_symbol_id.get(symbol_id)
    }

    pub fn symbol_at(&self, path: &str, line: usize, col: usize) -> Option<&str> {
        self.by_span
            .get(&(path.to_string(), line, col))
            .map(String::as_str)
    }

    /// The class named `class_qn`, if it is a known class symbol.
    pub fn class(&self, class_qn: &str) -> Option<&SymbolInfo> {
        self.symbol_by_qualified_name(class_qn)
            .filter(|s| s.kind == SymbolKind::Class)
    }

    /// Method `name` declared directly on class `class_qn`.
    pub fn method(&self, class_qn: &str, name: &str) -> Option<&SymbolInfo> {
        self.symbol_by_qualified_name(&format!("{}.{}", class_qn, name))
            .filter(|s| s.kind == SymbolKind::Method)
    }
}

/// Backslashes to slashes, leading `./` removed.
pub fn normalize_path(path: &str) -> String {
    let mut normalized = path.replace('\\', "/");
    while let Some(rest) = normalized.strip_prefix("./") {
        normalized = rest.to_string();
    }
    normalized
}
