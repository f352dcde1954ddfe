//! Static detection of integration points from imports.

use std::collections::BTreeMap;

use super::records::{IntegrationRecord, ARTIFACT_SCHEMA_VERSION};
use crate::parsers::{ImportKind, ImportStatement};

pub const VALID_INTEGRATION_TAGS: &[&str] = &[
    "database",
    "http",
    "logging",
    "testing",
    "cli",
    "serialization",
    "async",
    "file_io",
];

const BUILTIN_TAG_RULES: &[(&str, &str)] = &[
    ("sqlalchemy", "database"),
    ("psycopg2", "database"),
    ("psycopg", "database"),
    ("sqlite3", "database"),
    ("pymongo", "database"),
    ("redis", "database"),
    ("pymysql", "database"),
    ("asyncpg", "database"),
    ("databases", "database"),
    ("motor", "database"),
    ("peewee", "database"),
    ("tortoise", "database"),
    ("requests", "http"),
    ("httpx", "http"),
    ("aiohttp", "http"),
    ("urllib", "http"),
    ("urllib3", "http"),
    ("httplib2", "http"),
    ("fastapi", "http"),
    ("flask", "http"),
    ("django", "http"),
    ("starlette", "http"),
    ("tornado", "http"),
    ("bottle", "http"),
    ("logging", "logging"),
    ("loguru", "logging"),
    ("structlog", "logging"),
    ("pytest", "testing"),
    ("unittest", "testing"),
    ("mock", "testing"),
    ("hypothesis", "testing"),
    ("faker", "testing"),
    ("factory_boy", "testing"),
    ("typer", "cli"),
    ("click", "cli"),
    ("argparse", "cli"),
    ("rich", "cli"),
    ("json", "serialization"),
    ("orjson", "serialization"),
    ("ujson", "serialization"),
    ("pydantic", "serialization"),
    ("msgpack", "serialization"),
    ("pickle", "serialization"),
    ("yaml", "serialization"),
    ("toml", "serialization"),
    ("tomllib", "serialization"),
    ("tomli", "serialization"),
    ("marshmallow", "serialization"),
    ("asyncio", "async"),
    ("trio", "async"),
    ("anyio", "async"),
    ("curio", "async"),
    ("pathlib", "file_io"),
    ("shutil", "file_io"),
    ("tempfile", "file_io"),
    ("glob", "file_io"),
    ("fnmatch", "file_io"),
    ("fileinput", "file_io"),
];

/// Maps a module's top-level package to an integration tag.
#[derive(Debug, Clone)]
pub struct IntegrationTagger {
    rules: BTreeMap<String, String>,
}

impl IntegrationTagger {
    /// Built-in rules overlaid with `extra`, which wins on conflicts.
    pub fn new(extra: &BTreeMap<String, String>) -> Self {
        let mut rules: BTreeMap<String, String> = BUILTIN_TAG_RULES
            .iter()
            .map(|(module, tag)| (module.to_string(), tag.to_string()))
            .collect();
        rules.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self { rules }
    }

    pub fn tag_for(&self, module: &str) -> Option<&str> {
        let top_level = module.split('.').next().unwrap_or(module);
        self.rules.get(top_level).map(String::as_str)
    }

    /// One record per absolute import whose module carries a tag.
    pub fn detect(&self, path: &str, imports: &[ImportStatement]) -> Vec<IntegrationRecord> {
        imports
            .iter()
            .filter(|i| {
                matches!(
                    i.kind,
                    ImportKind::Import | ImportKind::ImportFrom | ImportKind::ImportStar
                ) && !i.module.is_empty()
            })
            .filter_map(|import| {
                let tag = self.tag_for(&import.module)?;
                let evidence = match import.kind {
                    ImportKind::ImportFrom if !import.name.is_empty() => format!(
                        "{}: {}.{}",
                        import.kind.as_str(),
                        import.module,
                        import.name.split_whitespace().next().unwrap_or("")
                    ),
                    _ => format!("{}: {}", import.kind.as_str(), import.module),
                };
                Some(IntegrationRecord {
                    schema_version: ARTIFACT_SCHEMA_VERSION,
                    path: path.to_string(),
                    tag: tag.to_string(),
                    evidence,
                    line: Some(import.line),
                    symbol: None,
                })
            })
            .collect()
    }
}
