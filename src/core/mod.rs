pub mod analyzer;
pub mod canonical;
pub mod graph;
pub mod index;
pub mod integrations;
pub mod layers;
pub mod modules;
pub mod name_table;
pub mod records;
pub mod resolver;
pub mod scanner;

pub use analyzer::{Artifacts, CodebaseAnalyzer};
pub use graph::{DependencyGraph, GraphBuilder, ModuleEdge, ModuleGraph};
pub use index::ResolutionIndex;
pub use name_table::{NameBinding, NameTable};
pub use resolver::{CallResolver, Outcome, Resolution, Strategy};
pub use scanner::{FileScanner, ScanOptions};
