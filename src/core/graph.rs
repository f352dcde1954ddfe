use petgraph::{graph::NodeIndex, Directed, Graph};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::layers::LayerClassifier;
use super::modules::resolve_relative_import;
use super::records::{DepsSummary, ARTIFACT_SCHEMA_VERSION};
use crate::parsers::{ImportKind, ImportStatement};

/// `(source_module, target_module)`
pub type ModuleEdge = (String, String);

pub type DependencyGraph = Graph<String, (), Directed>;

/// Number of modules listed in `top_modules`.
pub const TOP_MODULES: usize = 10;

/// Import edges leaving `module`.
///
/// Absolute from-imports without a module produce no edge. Relative imports,
/// star imports included, resolve against `module`; a relative import with no
/// module part targets its first imported name.
pub fn edges_for_file(module: &str, imports: &[ImportStatement]) -> Vec<ModuleEdge> {
    let mut edges = Vec::new();
    for import in imports {
        let target = match import.kind {
            ImportKind::Import => Some(import.module.clone()),
            ImportKind::ImportFrom if !import.module.is_empty() => Some(import.module.clone()),
            ImportKind::ImportFrom => None,
            ImportKind::ImportStar if import.module.is_empty() && import.level == 0 => None,
            ImportKind::ImportStar if import.level > 0 => Some(resolve_relative_import(
                module,
                &import.module,
                import.level,
            )),
            ImportKind::ImportStar => Some(import.module.clone()),
            ImportKind::RelativeImport => {
                let target = if import.module.is_empty() {
                    import.name.split_whitespace().next().unwrap_or("")
                } else {
                    import.module.as_str()
                };
                Some(resolve_relative_import(module, target, import.level))
            }
        };
        if let Some(target) = target {
            edges.push((module.to_string(), target));
        }
    }
    edges
}

pub struct GraphBuilder {
    graph: DependencyGraph,
    node_map: HashMap<String, NodeIndex>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            node_map: HashMap::new(),
        }
    }

    pub fn add_node(&mut self, name: &str) -> NodeIndex {
        if let Some(index) = self.node_map.get(name) {
            return *index;
        }
        let index = self.graph.add_node(name.to_string());
        self.node_map.insert(name.to_string(), index);
        index
    }

    pub fn add_edge(&mut self, source: &str, target: &str) -> petgraph::graph::EdgeIndex {
        let source_idx = self.add_node(source);
        let target_idx = self.add_node(target);
        self.graph.update_edge(source_idx, target_idx, ())
    }

    pub fn build(self) -> ModuleGraph {
        ModuleGraph { graph: self.graph }
    }
}

/// Module dependency graph with name-sorted traversal.
pub struct ModuleGraph {
    graph: DependencyGraph,
}

impl ModuleGraph {
    pub fn from_edges(edges: &[ModuleEdge]) -> Self {
        let mut builder = GraphBuilder::new();
        for (source, target) in edges {
            builder.add_edge(source, target);
        }
        builder.build()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn sorted_nodes(&self) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self.graph.node_indices().collect();
        nodes.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
        nodes
    }

    fn sorted_neighbors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut neighbors: Vec<NodeIndex> = self.graph.neighbors(node).collect();
        neighbors.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
        neighbors.dedup();
        neighbors
    }

    /// Import cycles via Tarjan's SCC; members sorted, cycles sorted.
    ///
    /// An SCC is a cycle when it has more than one member or a self-loop.
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        let mut state = TarjanState::default();
        for node in self.sorted_nodes() {
            if !state.indices.contains_key(&node) {
                self.strongconnect(node, &mut state);
            }
        }

        let mut cycles: Vec<Vec<String>> = state
            .sccs
            .into_iter()
            .map(|scc| {
                let mut names: Vec<String> =
                    scc.into_iter().map(|idx| self.graph[idx].clone()).collect();
                names.sort();
                names
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Tarjan's `strongconnect` with an explicit frame stack, so chain length
    /// is bounded by heap rather than thread stack.
    fn strongconnect(&self, start: NodeIndex, state: &mut TarjanState) {
        state.visit(start);
        let mut frames = vec![Frame {
            node: start,
            neighbors: self.sorted_neighbors(start),
            next: 0,
        }];

        while let Some(frame) = frames.last_mut() {
            let node = frame.node;
            if let Some(&neighbor) = frame.neighbors.get(frame.next) {
                frame.next += 1;
                if !state.indices.contains_key(&neighbor) {
                    state.visit(neighbor);
                    frames.push(Frame {
                        node: neighbor,
                        neighbors: self.sorted_neighbors(neighbor),
                        next: 0,
                    });
                } else if state.on_stack.contains(&neighbor) {
                    let low = state.low_link[&node].min(state.indices[&neighbor]);
                    state.low_link.insert(node, low);
                }
                continue;
            }

            frames.pop();
            if let Some(parent) = frames.last() {
                let low = state.low_link[&parent.node].min(state.low_link[&node]);
                state.low_link.insert(parent.node, low);
            }
            if state.low_link[&node] == state.indices[&node] {
                let scc = extract_scc(state, node, &self.graph[node]);
                if scc.len() > 1 || self.graph.contains_edge(node, node) {
                    state.sccs.push(scc);
                }
            }
        }
    }
}

struct Frame {
    node: NodeIndex,
    neighbors: Vec<NodeIndex>,
    next: usize,
}

#[derive(Default)]
struct TarjanState {
    index: usize,
    indices: HashMap<NodeIndex, usize>,
    low_link: HashMap<NodeIndex, usize>,
    on_stack: HashSet<NodeIndex>,
    stack: Vec<NodeIndex>,
    sccs: Vec<Vec<NodeIndex>>,
}

impl TarjanState {
    fn visit(&mut self, node: NodeIndex) {
        self.indices.insert(node, self.index);
        self.low_link.insert(node, self.index);
        self.index += 1;
        self.stack.push(node);
        self.on_stack.insert(node);
    }
}

/// Pop one component off the stack; the root must be on it.
fn extract_scc(state: &mut TarjanState, root: NodeIndex, root_name: &str) -> Vec<NodeIndex> {
    let mut scc = Vec::new();
    while let Some(w) = state.stack.pop() {
        state.on_stack.remove(&w);
        scc.push(w);
        if w == root {
            return scc;
        }
    }
    panic!(
        "Tarjan invariant violated: root node {:?} not found in stack during SCC extraction",
        root_name
    );
}

pub fn compute_fan_stats(
    edges: &[ModuleEdge],
) -> (BTreeMap<String, usize>, BTreeMap<String, usize>) {
    let mut fan_in = BTreeMap::new();
    let mut fan_out = BTreeMap::new();
    for (source, target) in edges {
        *fan_out.entry(source.clone()).or_insert(0) += 1;
        *fan_in.entry(target.clone()).or_insert(0) += 1;
    }
    (fan_in, fan_out)
}

/// Modules ordered by fan-in descending, then name.
pub fn top_modules(fan_in: &BTreeMap<String, usize>, limit: usize) -> Vec<String> {
    let mut ranked: Vec<(&String, &usize)> = fan_in.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(name, _)| name.clone())
        .collect()
}

/// Deduplicated, sorted edges.
pub fn unique_edges(edges: impl IntoIterator<Item = ModuleEdge>) -> Vec<ModuleEdge> {
    edges
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Aggregate edges into the dependency summary.
///
/// `module_paths` maps every scanned module to its file.
pub fn build_deps_summary(
    edges: &[ModuleEdge],
    module_paths: &BTreeMap<String, String>,
    layers: Option<&LayerClassifier>,
) -> DepsSummary {
    let graph = ModuleGraph::from_edges(edges);
    let cycles = graph.find_cycles();
    let (fan_in, fan_out) = compute_fan_stats(edges);

    let mut nodes: BTreeSet<&str> = module_paths.keys().map(String::as_str).collect();
    for (source, target) in edges {
        nodes.insert(source.as_str());
        nodes.insert(target.as_str());
    }

    let layer_violations = layers
        .map(|classifier| classifier.compute_violations(edges, module_paths))
        .unwrap_or_default();

    DepsSummary {
        schema_version: ARTIFACT_SCHEMA_VERSION,
        node_count: nodes.len(),
        edge_count: edges.len(),
        cycles,
        top_modules: top_modules(&fan_in, TOP_MODULES),
        fan_in,
        fan_out,
        layer_violations,
    }
}
