use globset::GlobSet;
use std::collections::{BTreeMap, HashMap, HashSet};

use super::graph::ModuleEdge;
use super::records::LayerViolation;
use crate::config::{compile_globset, LayersConfig, Unclassified};
use crate::error::Result;

/// Layer name reported for an unclassified source under `deny`.
pub const UNCLASSIFIED_LAYER: &str = "unclassified";

/// Compiled layer definitions and allow-lists.
pub struct LayerClassifier {
    layers: Vec<(String, GlobSet)>,
    allowed: HashMap<String, HashSet<String>>,
    has_rules: bool,
    unclassified: Unclassified,
}

impl LayerClassifier {
    pub fn new(config: &LayersConfig) -> Result<Self> {
        let layers = config
            .layer
            .iter()
            .map(|def| Ok((def.name.clone(), compile_globset(&def.globs)?)))
            .collect::<Result<Vec<_>>>()?;

        // A later rule for the same layer replaces the earlier one.
        let mut allowed = HashMap::new();
        for rule in &config.rules {
            allowed.insert(
                rule.from_layer.clone(),
                rule.to.iter().cloned().collect::<HashSet<_>>(),
            );
        }

        Ok(Self {
            layers,
            allowed,
            has_rules: !config.rules.is_empty(),
            unclassified: config.unclassified,
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.layers.is_empty()
    }

    /// First layer whose globs match `path`.
    pub fn classify(&self, path: &str) -> Option<&str> {
        self.layers
            .iter()
            .find(|(_, globs)| globs.is_match(path))
            .map(|(name, _)| name.as_str())
    }

    /// Edges into unclassified targets are never flagged. An unclassified
    /// source is flagged only under `deny`.
    pub fn is_violation(&self, from_layer: Option<&str>, to_layer: Option<&str>) -> bool {
        let Some(from_layer) = from_layer else {
            return self.unclassified == Unclassified::Deny;
        };
        let Some(to_layer) = to_layer else {
            return false;
        };
        match self.allowed.get(from_layer) {
            Some(allowed) => !allowed.contains(to_layer),
            None => false,
        }
    }

    /// Violations sorted by `(from_file, to_module, from_layer, to_layer)`.
    pub fn compute_violations(
        &self,
        edges: &[ModuleEdge],
        module_paths: &BTreeMap<String, String>,
    ) -> Vec<LayerViolation> {
        if self.layers.is_empty() || !self.has_rules {
            return Vec::new();
        }

        let mut violations: Vec<LayerViolation> = edges
            .iter()
            .filter_map(|(source, target)| {
                let source_path = module_paths.get(source)?;
                let from_layer = self.classify(source_path);
                let to_layer = module_paths
                    .get(target)
                    .and_then(|target_path| self.classify(target_path));

                self.is_violation(from_layer, to_layer)
                    .then(|| LayerViolation {
                        from_file: source_path.clone(),
                        to_module: target.clone(),
                        from_layer: from_layer.unwrap_or(UNCLASSIFIED_LAYER).to_string(),
                        to_layer: to_layer.map(str::to_string),
                    })
            })
            .collect();

        violations.sort_by(|a, b| {
            (&a.from_file, &a.to_module, &a.from_layer, a.to_layer.as_deref().unwrap_or(""))
                .cmp(&(&b.from_file, &b.to_module, &b.from_layer, b.to_layer.as_deref().unwrap_or("")))
        });
        violations
    }
}
