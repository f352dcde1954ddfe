use crate::core::graph::ModuleEdge;

/// `source -> target` per line, in the order given.
pub fn format_edges(edges: &[ModuleEdge]) -> String {
    let mut out = String::with_capacity(edges.len() * 32);
    for (source, target) in edges {
        out.push_str(source);
        out.push_str(" -> ");
        out.push_str(target);
        out.push('\n');
    }
    out
}
