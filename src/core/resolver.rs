//! Two-tier call resolution.
//!
//! Tier 1 matches the callee against the file's name table, directly or by
//! its longest bound prefix. Tier 2 runs only when Tier 1 stops short of a
//! full match and handles four class-context shapes: `self.m`, `cls.m`,
//! `super().m` and `ClassName.m`.

use serde::{Deserialize, Serialize};

use super::index::{ResolutionIndex, SymbolInfo};
use super::name_table::{NameBinding, NameTable};
use super::records::{ResolvedTo, SymbolKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    ModuleLocalDef,
    ModuleImportFrom,
    ModuleImportModule,
    ModuleAliasAssignment,
    ClassSelfMethod,
    ClassClsMethod,
    ClassSuperMethod,
    ClassStaticMethod,
    DynamicUnresolvable,
    SyntaxOnly,
}

impl Strategy {
    pub fn confidence(self) -> u8 {
        match self {
            Strategy::ModuleLocalDef => 90,
            Strategy::ModuleImportFrom => 80,
            Strategy::ModuleImportModule => 75,
            Strategy::ModuleAliasAssignment => 60,
            Strategy::ClassSelfMethod | Strategy::ClassClsMethod => 70,
            Strategy::ClassSuperMethod => 65,
            Strategy::ClassStaticMethod => 75,
            Strategy::DynamicUnresolvable | Strategy::SyntaxOnly => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Full(ResolvedTo),
    /// The base resolved but `member` (dotted) did not.
    Partial { base: ResolvedTo, member: String },
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub outcome: Outcome,
    pub strategy: Strategy,
    pub confidence: u8,
}

impl Resolution {
    pub fn unresolved() -> Self {
        Self {
            outcome: Outcome::Unresolved,
            strategy: Strategy::DynamicUnresolvable,
            confidence: 0,
        }
    }

    fn full(resolved: ResolvedTo, strategy: Strategy, confidence: u8) -> Self {
        Self {
            outcome: Outcome::Full(resolved),
            strategy,
            confidence,
        }
    }

    fn partial(base: ResolvedTo, member: String, strategy: Strategy, confidence: u8) -> Self {
        Self {
            outcome: Outcome::Partial { base, member },
            strategy,
            confidence,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self.outcome, Outcome::Full(_))
    }

    pub fn resolved_to(&self) -> Option<&ResolvedTo> {
        match &self.outcome {
            Outcome::Full(resolved) => Some(resolved),
            _ => None,
        }
    }

    pub fn resolved_base_to(&self) -> Option<&ResolvedTo> {
        match &self.outcome {
            Outcome::Partial { base, .. } => Some(base),
            _ => None,
        }
    }

    pub fn member(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Partial { member, .. } => Some(member),
            _ => None,
        }
    }
}

/// Stateless resolver over a shared index.
pub struct CallResolver<'a> {
    index: &'a ResolutionIndex,
}

impl<'a> CallResolver<'a> {
    pub fn new(index: &'a ResolutionIndex) -> Self {
        Self { index }
    }

    /// Resolve a callee; Tier 2 replaces a non-full Tier 1 result when it applies.
    pub fn resolve(
        &self,
        callee_expr: &str,
        enclosing_symbol_id: Option<&str>,
        table: &NameTable,
    ) -> Resolution {
        let tier1 = self.resolve_direct(callee_expr, table);
        if tier1.is_full() {
            return tier1;
        }
        self.resolve_class_context(callee_expr.trim(), enclosing_symbol_id, table)
            .unwrap_or(tier1)
    }

    /// Tier 1: direct match, then longest bound prefix plus module-chain walk.
    pub fn resolve_direct(&self, callee_expr: &str, table: &NameTable) -> Resolution {
        let expr = callee_expr.trim();
        if expr.is_empty() {
            return Resolution::unresolved();
        }

        if let Some(binding) = table.get(expr) {
            return Resolution::full(
                self.binding_to_resolved(binding),
                binding.strategy,
                binding.confidence,
            );
        }

        let parts: Vec<&str> = expr.split('.').collect();
        if parts.len() == 1 {
            return Resolution::unresolved();
        }

        let Some((prefix_len, prefix_binding)) = (1..parts.len())
            .rev()
            .find_map(|i| table.get(&parts[..i].join(".")).map(|b| (i, b)))
        else {
            return Resolution::unresolved();
        };

        let remaining = &parts[prefix_len..];
        let mut current_module = prefix_binding.qualified_name.clone();
        let mut consumed = 0;
        for part in remaining {
            let candidate = format!("{}.{}", current_module, part);
            if !self.index.is_known_module(&candidate) {
                break;
            }
            current_module = candidate;
            consumed += 1;
        }

        let base = if consumed > 0 {
            self.module_binding(&parts[..prefix_len + consumed].join("."), &current_module)
        } else {
            prefix_binding.clone()
        };

        let tail = &remaining[consumed..];
        if tail.is_empty() {
            return Resolution::full(self.binding_to_resolved(&base), base.strategy, base.confidence);
        }

        Resolution::partial(
            self.binding_to_resolved(&base),
            tail.join("."),
            base.strategy,
            base.confidence,
        )
    }

    /// Tier 2: method dispatch through the enclosing class or a bound class name.
    pub fn resolve_class_context(
        &self,
        expr: &str,
        enclosing_symbol_id: Option<&str>,
        table: &NameTable,
    ) -> Option<Resolution> {
        if let Some(method) = expr.strip_prefix("super().") {
            if method.is_empty() || method.contains('.') {
                return None;
            }
            let class = self.enclosing_class(enclosing_symbol_id)?;
            let base = self.single_base_class(class, table)?;
            return Some(self.dispatch(base, method, Strategy::ClassSuperMethod));
        }

        let (receiver, method) = expr.split_once('.')?;
        if method.is_empty() || method.contains('.') {
            return None;
        }

        match receiver {
            "self" => {
                let class = self.enclosing_class(enclosing_symbol_id)?;
                Some(self.dispatch(class, method, Strategy::ClassSelfMethod))
            }
            "cls" => {
                let class = self.enclosing_class(enclosing_symbol_id)?;
                Some(self.dispatch(class, method, Strategy::ClassClsMethod))
            }
            class_name => {
                let binding = table.get(class_name).filter(|b| b.resolution == "class")?;
                let class = self.index.class(&binding.qualified_name)?;
                Some(self.dispatch(class, method, Strategy::ClassStaticMethod))
            }
        }
    }

    fn dispatch(&self, class: &SymbolInfo, method: &str, strategy: Strategy) -> Resolution {
        let confidence = strategy.confidence();
        match self.index.method(&class.qualified_name, method) {
            Some(found) => {
                Resolution::full(self.symbol_to_resolved(found, confidence), strategy, confidence)
            }
            None => Resolution::partial(
                self.symbol_to_resolved(class, confidence),
                method.to_string(),
                strategy,
                confidence,
            ),
        }
    }

    /// The class owning the method identified by a canonical enclosing id.
    fn enclosing_class(&self, enclosing_symbol_id: Option<&str>) -> Option<&'a SymbolInfo> {
        let symbol = self.index.symbol_by_id(enclosing_symbol_id?)?;
        if symbol.kind != SymbolKind::Method {
            return None;
        }
        let (class_qn, _) = symbol.qualified_name.rsplit_once('.')?;
        self.index.class(class_qn)
    }

    /// Multiple bases are left unresolved: no MRO is computed.
    fn single_base_class(&self, class: &SymbolInfo, table: &NameTable) -> Option<&'a SymbolInfo> {
        let [base] = class.base_classes.as_slice() else {
            return None;
        };

        if let Some(binding) = table.get(base).filter(|b| b.resolution == "class") {
            return self.index.class(&binding.qualified_name);
        }

        let resolution = self.resolve_direct(base, table);
        let resolved = resolution
            .resolved_to()
            .filter(|r| r.resolution == "class")?;
        self.index.class(&resolved.qualified_name)
    }

    fn module_binding(&self, local_name: &str, module: &str) -> NameBinding {
        let path = self.index.path_for_module(module).map(str::to_string);
        NameBinding {
            local_name: local_name.to_string(),
            target_symbol_id: path.as_ref().map(|p| format!("module:{}", p)),
            qualified_name: module.to_string(),
            resolution: "module".to_string(),
            confidence: Strategy::ModuleImportModule.confidence(),
            strategy: Strategy::ModuleImportModule,
            target_module: path.as_ref().map(|_| module.to_string()),
            target_path: path,
        }
    }

    pub fn binding_to_resolved(&self, binding: &NameBinding) -> ResolvedTo {
        let path = binding
            .target_path
            .clone()
            .filter(|p| self.index.is_internal_path(p));
        let dst_module = path.as_ref().and(binding.target_module.clone());
        ResolvedTo {
            symbol_id: binding
                .target_symbol_id
                .clone()
                .unwrap_or_else(|| format!("ext:{}", binding.qualified_name)),
            qualified_name: binding.qualified_name.clone(),
            resolution: binding.resolution.clone(),
            confidence: binding.confidence,
            path,
            dst_module,
        }
    }

    fn symbol_to_resolved(&self, symbol: &SymbolInfo, confidence: u8) -> ResolvedTo {
        let path = Some(symbol.path.clone()).filter(|p| self.index.is_internal_path(p));
        let dst_module = path
            .as_deref()
            .and_then(|p| self.index.module_for_path(p))
            .map(str::to_string);
        ResolvedTo {
            symbol_id: symbol.symbol_id.clone(),
            qualified_name: symbol.qualified_name.clone(),
            resolution: symbol.kind.as_str().to_string(),
            confidence,
            path,
            dst_module,
        }
    }
}
