//! Reference ids and canonicalization of raw enclosing-scope ids.

use regex::Regex;
use std::sync::OnceLock;

use super::index::{normalize_path, ResolutionIndex};

/// Trim and collapse internal whitespace runs to one space.
pub fn normalize_expr(expr: &str) -> String {
    expr.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `ref:{path}@L{line}:C{col}:{kind}:{normalized_expr}`
pub fn build_ref_id(path: &str, line: usize, col: usize, ref_kind: &str, expr: &str) -> String {
    format!(
        "ref:{}@L{}:C{}:{}:{}",
        path,
        line,
        col,
        ref_kind,
        normalize_expr(expr)
    )
}

fn raw_enclosing_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^(?:symbol:|module:)(?P<path>.+?)@L(?P<line>\d+):C(?P<col>\d+)$").ok()
        })
        .as_ref()
}

/// Neighbouring coordinates checked, in order, when matching a raw id.
pub fn candidate_coordinates(line: usize, col: usize) -> Vec<(usize, usize)> {
    let (line, col) = (line as i64, col as i64);
    let offsets = [(0, 0), (0, -1), (-1, 0), (-1, -1), (0, 1), (1, 0), (1, 1)];

    let mut candidates: Vec<(usize, usize)> = Vec::with_capacity(offsets.len());
    for (dl, dc) in offsets {
        let (l, c) = (line + dl, col + dc);
        if l < 1 || c < 1 {
            continue;
        }
        let candidate = (l as usize, c as usize);
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}

/// Rewrite a raw enclosing id to the matching `sym:` id when a symbol starts
/// at or next to the encoded position; otherwise return it unchanged.
pub fn canonicalize_enclosing_id(raw_id: &str, index: &ResolutionIndex) -> Option<String> {
    if raw_id.is_empty() {
        return None;
    }
    let Some(captures) = raw_enclosing_pattern().and_then(|re| re.captures(raw_id)) else {
        return Some(raw_id.to_string());
    };

    let mut path = normalize_path(&captures["path"]);
    if raw_id.starts_with("symbol:") {
        if let Some((candidate_path, _name)) = path.rsplit_once(':') {
            if candidate_path.contains('/') || candidate_path.ends_with(".py") {
                path = candidate_path.to_string();
            }
        }
    }

    let (Ok(line), Ok(col)) = (captures["line"].parse::<usize>(), captures["col"].parse::<usize>())
    else {
        return Some(raw_id.to_string());
    };

    let canonical = candidate_coordinates(line, col)
        .into_iter()
        .find_map(|(l, c)| index.symbol_at(&path, l, c));
    Some(canonical.unwrap_or(raw_id).to_string())
}
