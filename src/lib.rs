//! # REPOMAP
//!
//! Deterministic static analysis of Python codebases.
//!
//! REPOMAP walks a project, parses every `.py` file with tree-sitter and
//! writes a set of byte-stable artifacts: symbols, modules, raw and resolved
//! call sites, a module dependency graph with cycle and layer reports, and
//! statically detected integration points.
//!
//! ## Artifacts
//!
//! - **symbols.jsonl / modules.jsonl**: every module, class, function and method
//! - **calls_raw.jsonl**: call sites as written, with their enclosing scope
//! - **refs.jsonl / calls.jsonl**: call sites resolved against a per-file name table
//! - **deps.edgelist / deps_summary.json**: import graph, cycles, fan-in/out
//! - **integrations_static.jsonl**: imports of known database, HTTP, CLI ... packages

pub mod config;
pub mod core;
pub mod error;
pub mod formatters;
pub mod generate;
pub mod parsers;
pub mod verify;

pub use error::{RepomapError, Result};
pub use generate::{generate_all_artifacts, generate_with_cancel, RunSummary};
pub use verify::{verify_determinism, VerifyReport};
