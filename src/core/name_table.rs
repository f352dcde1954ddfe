use std::collections::HashMap;

use super::index::ResolutionIndex;
use super::modules::resolve_relative_import;
use super::records::SymbolKind;
use super::resolver::Strategy;
use crate::parsers::{ImportKind, ImportStatement, TrivialAlias};

/// A single local-name binding in a module's name table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameBinding {
    pub local_name: String,
    pub target_symbol_id: Option<String>,
    pub qualified_name: String,
    /// `module`, `class`, `function`, `method` or `imported_name`
    pub resolution: String,
    pub confidence: u8,
    pub strategy: Strategy,
    pub target_path: Option<String>,
    pub target_module: Option<String>,
}

/// Per-file `local_name -> binding`; discarded once the file's calls are resolved.
#[derive(Debug, Default)]
pub struct NameTable {
    bindings: HashMap<String, NameBinding>,
}

impl NameTable {
    /// Layer the five binding passes for the file at `path`.
    ///
    /// Later passes overwrite earlier bindings for the same local name.
    pub fn build(
        path: &str,
        index: &ResolutionIndex,
        imports: &[ImportStatement],
        aliases: &[TrivialAlias],
    ) -> Self {
        let mut table = Self::default();
        let Some(module) = index.module_for_path(path) else {
            return table;
        };

        table.add_local_defs(module, index);
        table.add_module_imports(imports, index);
        table.add_member_imports(imports, index);
        table.add_relative_imports(module, imports, index);
        table.add_trivial_aliases(aliases);
        table
    }

    pub fn get(&self, local_name: &str) -> Option<&NameBinding> {
        self.bindings.get(local_name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn insert(&mut self, binding: NameBinding) {
        self.bindings.insert(binding.local_name.clone(), binding);
    }

    fn add_local_defs(&mut self, module: &str, index: &ResolutionIndex) {
        let prefix = format!("{}.", module);
        for symbol in index.symbols_in_module(module) {
            if !matches!(symbol.kind, SymbolKind::Function | SymbolKind::Class) {
                continue;
            }
            let is_top_level = symbol
                .qualified_name
                .strip_prefix(&prefix)
                .map(|rest| !rest.contains('.'))
                .unwrap_or(false);
            if !is_top_level {
                continue;
            }
            self.insert(NameBinding {
                local_name: symbol.name.clone(),
                target_symbol_id: Some(symbol.symbol_id.clone()),
                qualified_name: symbol.qualified_name.clone(),
                resolution: symbol.kind.as_str().to_string(),
                confidence: Strategy::ModuleLocalDef.confidence(),
                strategy: Strategy::ModuleLocalDef,
                target_path: Some(symbol.path.clone()),
                target_module: Some(module.to_string()),
            });
        }
    }

    /// `import x.y` binds `x`; `import x.y as z` binds `z` to `x.y`.
    fn add_module_imports(&mut self, imports: &[ImportStatement], index: &ResolutionIndex) {
        for import in imports.iter().filter(|i| i.kind == ImportKind::Import) {
            let (local_name, target_module) = if import.name.is_empty() {
                let top = import.module.split('.').next().unwrap_or(&import.module);
                (top.to_string(), top.to_string())
            } else {
                (import.name.clone(), import.module.clone())
            };

            let target_path = index.path_for_module(&target_module).map(str::to_string);
            self.insert(NameBinding {
                local_name,
                target_symbol_id: target_path.as_ref().map(|p| format!("module:{}", p)),
                target_module: target_path.as_ref().map(|_| target_module.clone()),
                qualified_name: target_module,
                resolution: "module".to_string(),
                confidence: Strategy::ModuleImportModule.confidence(),
                strategy: Strategy::ModuleImportModule,
                target_path,
            });
        }
    }

    fn add_member_imports(&mut self, imports: &[ImportStatement], index: &ResolutionIndex) {
        for import in imports.iter().filter(|i| i.kind == ImportKind::ImportFrom) {
            let (name, local) = import.imported_and_local();
            let qualified_name = if import.module.is_empty() {
                name.to_string()
            } else {
                format!("{}.{}", import.module, name)
            };
            self.bind_imported(local, qualified_name, index);
        }
    }

    fn add_relative_imports(
        &mut self,
        module: &str,
        imports: &[ImportStatement],
        index: &ResolutionIndex,
    ) {
        for import in imports
            .iter()
            .filter(|i| i.kind == ImportKind::RelativeImport)
        {
            let (name, local) = import.imported_and_local();
            let resolved = resolve_relative_import(module, &import.module, import.level);
            let qualified_name = if resolved.is_empty() {
                name.to_string()
            } else {
                format!("{}.{}", resolved, name)
            };
            self.bind_imported(local, qualified_name, index);
        }
    }

    fn bind_imported(&mut self, local: &str, qualified_name: String, index: &ResolutionIndex) {
        let symbol = index.symbol_by_qualified_name(&qualified_name);
        self.insert(NameBinding {
            local_name: local.to_string(),
            target_symbol_id: symbol.map(|s| s.symbol_id.clone()),
            resolution: symbol
                .map(|s| s.kind.as_str().to_string())
                .unwrap_or_else(|| "imported_name".to_string()),
            confidence: Strategy::ModuleImportFrom.confidence(),
            strategy: Strategy::ModuleImportFrom,
            target_path: symbol.map(|s| s.path.clone()),
            target_module: symbol
                .and_then(|s| index.module_for_path(&s.path))
                .map(str::to_string),
            qualified_name,
        });
    }

    /// `a = b` copies `b`'s binding under `a`; unknown sources are ignored.
    fn add_trivial_aliases(&mut self, aliases: &[TrivialAlias]) {
        for alias in aliases {
            let Some(source) = self.bindings.get(&alias.source).cloned() else {
                continue;
            };
            self.insert(NameBinding {
                local_name: alias.target.clone(),
                confidence: Strategy::ModuleAliasAssignment.confidence(),
                strategy: Strategy::ModuleAliasAssignment,
                ..source
            });
        }
    }
}
