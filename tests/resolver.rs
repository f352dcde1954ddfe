use repomap::core::canonical::canonicalize_enclosing_id;
use repomap::core::modules::module_record;
use repomap::core::records::SymbolRecord;
use repomap::core::{CallResolver, NameTable, Outcome, Resolution, ResolutionIndex, Strategy};
use repomap::parsers::python::PythonParser;
use repomap::parsers::{LanguageParser, ParseResult};

struct Indexed {
    index: ResolutionIndex,
    files: Vec<(String, ParseResult)>,
}

impl Indexed {
    fn new(sources: &[(&str, &str)]) -> Self {
        let mut parser = PythonParser::new().unwrap();
        let mut modules = Vec::new();
        let mut files = Vec::new();
        let mut symbols: Vec<SymbolRecord> = Vec::new();
        for (path, code) in sources {
            let record = module_record(path).unwrap();
            let parsed = parser
                .parse_source(path, &record.module, code.as_bytes())
                .unwrap();
            symbols.extend(parsed.symbols.iter().cloned());
            files.push((path.to_string(), parsed));
            modules.push(record);
        }
        Self {
            index: ResolutionIndex::build(&modules, &symbols),
            files,
        }
    }

    fn table(&self, path: &str) -> NameTable {
        let (_, parsed) = self.files.iter().find(|(p, _)| p == path).unwrap();
        NameTable::build(path, &self.index, &parsed.imports, &parsed.aliases)
    }

    /// Resolve the first call in `path` whose callee is `callee`.
    fn resolve(&self, path: &str, callee: &str) -> Resolution {
        let (_, parsed) = self.files.iter().find(|(p, _)| p == path).unwrap();
        let call = parsed
            .call_sites
            .iter()
            .find(|c| c.callee_expr == callee)
            .unwrap_or_else(|| panic!("no call to {} in {}", callee, path));
        let enclosing = canonicalize_enclosing_id(&call.enclosing_symbol_id, &self.index);
        let table = self.table(path);
        CallResolver::new(&self.index).resolve(callee, enclosing.as_deref(), &table)
    }
}

#[test]
fn self_method_resolves_through_enclosing_class() {
    let project = Indexed::new(&[(
        "foo.py",
        r#"class Foo:
    def bar(self):
        pass

    def baz(self):
        return self.bar()
"#,
    )]);

    let resolution = project.resolve("foo.py", "self.bar");
    assert_eq!(resolution.strategy, Strategy::ClassSelfMethod);
    assert_eq!(resolution.confidence, 70);
    let target = resolution.resolved_to().unwrap();
    assert_eq!(target.qualified_name, "foo.Foo.bar");
    assert_eq!(target.resolution, "method");
    assert_eq!(target.symbol_id, "sym:foo.py::foo.Foo.bar@L2:C5");
}

#[test]
fn cls_method_missing_member_is_partial() {
    let project = Indexed::new(&[(
        "factory.py",
        r#"class Factory:
    @classmethod
    def create(cls):
        return cls.build()
"#,
    )]);

    let resolution = project.resolve("factory.py", "cls.build");
    assert_eq!(resolution.strategy, Strategy::ClassClsMethod);
    assert!(resolution.resolved_to().is_none());
    assert_eq!(
        resolution.resolved_base_to().unwrap().qualified_name,
        "factory.Factory"
    );
    assert_eq!(resolution.member(), Some("build"));
}

#[test]
fn super_call_resolves_with_a_single_base() {
    let project = Indexed::new(&[(
        "family.py",
        r#"class Base:
    def run(self):
        pass

class Child(Base):
    def run(self):
        return super().run()
"#,
    )]);

    let resolution = project.resolve("family.py", "super().run");
    assert_eq!(resolution.strategy, Strategy::ClassSuperMethod);
    assert_eq!(resolution.confidence, 65);
    assert_eq!(
        resolution.resolved_to().unwrap().qualified_name,
        "family.Base.run"
    );
}

#[test]
fn super_call_with_multiple_bases_stays_unresolved() {
    let project = Indexed::new(&[(
        "multi.py",
        r#"class A:
    def anything(self):
        pass

class B:
    pass

class C(A, B):
    def go(self):
        return super().anything()
"#,
    )]);

    let resolution = project.resolve("multi.py", "super().anything");
    assert_eq!(resolution.outcome, Outcome::Unresolved);
    assert_eq!(resolution.strategy, Strategy::DynamicUnresolvable);
    assert_eq!(resolution.confidence, 0);
}

#[test]
fn class_name_method_uses_static_strategy() {
    let project = Indexed::new(&[
        (
            "shapes.py",
            r#"class Circle:
    def area(self):
        pass
"#,
        ),
        (
            "use.py",
            r#"from shapes import Circle

def main():
    Circle.area(None)
    Circle.perimeter(None)
"#,
        ),
    ]);

    let area = project.resolve("use.py", "Circle.area");
    assert_eq!(area.strategy, Strategy::ClassStaticMethod);
    assert_eq!(area.confidence, 75);
    assert_eq!(area.resolved_to().unwrap().qualified_name, "shapes.Circle.area");
    assert_eq!(area.resolved_to().unwrap().path.as_deref(), Some("shapes.py"));

    let perimeter = project.resolve("use.py", "Circle.perimeter");
    assert_eq!(perimeter.strategy, Strategy::ClassStaticMethod);
    assert_eq!(perimeter.member(), Some("perimeter"));
}

#[test]
fn aliased_module_import_with_unknown_member_is_partial() {
    let project = Indexed::new(&[
        ("pkg/__init__.py", ""),
        ("pkg/mod.py", "def known_fn():\n    pass\n"),
        (
            "main.py",
            "import pkg.mod as mod\n\nmod.missing_fn()\nmod.known_fn()\n",
        ),
    ]);

    let missing = project.resolve("main.py", "mod.missing_fn");
    assert!(missing.resolved_to().is_none());
    let base = missing.resolved_base_to().unwrap();
    assert_eq!(base.qualified_name, "pkg.mod");
    assert_eq!(base.symbol_id, "module:pkg/mod.py");
    assert_eq!(missing.member(), Some("missing_fn"));
    assert_eq!(missing.strategy, Strategy::ModuleImportModule);

    let known = project.resolve("main.py", "mod.known_fn");
    assert!(known.resolved_to().is_none());
    assert_eq!(known.resolved_base_to().unwrap().qualified_name, "pkg.mod");
    assert_eq!(known.member(), Some("known_fn"));
    assert_eq!(known.strategy, Strategy::ModuleImportModule);
    assert_eq!(known.confidence, 75);
}

#[test]
fn dotted_import_walks_submodule_chain() {
    let project = Indexed::new(&[
        ("pkg/__init__.py", ""),
        ("pkg/sub/__init__.py", ""),
        ("pkg/sub/leaf.py", "def go():\n    pass\n"),
        ("main.py", "import pkg.sub.leaf\n\npkg.sub.leaf.go()\npkg.sub.leaf.nope.deeper()\n"),
    ]);

    let leaf = CallResolver::new(&project.index)
        .resolve_direct("pkg.sub.leaf", &project.table("main.py"));
    assert_eq!(leaf.resolved_to().unwrap().qualified_name, "pkg.sub.leaf");
    assert_eq!(leaf.resolved_to().unwrap().symbol_id, "module:pkg/sub/leaf.py");

    let go = project.resolve("main.py", "pkg.sub.leaf.go");
    assert!(go.resolved_to().is_none());
    assert_eq!(go.resolved_base_to().unwrap().qualified_name, "pkg.sub.leaf");
    assert_eq!(go.member(), Some("go"));

    let nope = project.resolve("main.py", "pkg.sub.leaf.nope.deeper");
    assert_eq!(nope.resolved_base_to().unwrap().qualified_name, "pkg.sub.leaf");
    assert_eq!(nope.member(), Some("nope.deeper"));
}

#[test]
fn unknown_callee_is_unresolved() {
    let project = Indexed::new(&[("lonely.py", "mystery()\n")]);
    let resolution = project.resolve("lonely.py", "mystery");
    assert_eq!(resolution, Resolution::unresolved());

    let empty = CallResolver::new(&project.index).resolve_direct("   ", &project.table("lonely.py"));
    assert_eq!(empty.strategy, Strategy::DynamicUnresolvable);
}

#[test]
fn name_table_layers_passes_last_writer_wins() {
    let project = Indexed::new(&[
        ("lib.py", "def helper():\n    pass\n\nclass Thing:\n    pass\n"),
        ("pkg/__init__.py", ""),
        ("pkg/near.py", "def close():\n    pass\n"),
        (
            "pkg/app.py",
            r#"import os
import lib as library
from lib import helper
from lib import Thing as T
from .near import close
from external import gadget

def helper():
    pass

alias = T
shadow = unknown
"#,
        ),
    ]);

    let table = project.table("pkg/app.py");

    // The member import overwrites the local definition of the same name.
    let helper = table.get("helper").unwrap();
    assert_eq!(helper.strategy, Strategy::ModuleImportFrom);
    assert_eq!(helper.qualified_name, "lib.helper");
    assert_eq!(helper.resolution, "function");

    let os = table.get("os").unwrap();
    assert_eq!(os.strategy, Strategy::ModuleImportModule);
    assert_eq!(os.target_symbol_id, None);

    let library = table.get("library").unwrap();
    assert_eq!(library.qualified_name, "lib");
    assert_eq!(library.target_symbol_id.as_deref(), Some("module:lib.py"));

    let close = table.get("close").unwrap();
    assert_eq!(close.qualified_name, "pkg.near.close");
    assert_eq!(close.confidence, 80);

    let gadget = table.get("gadget").unwrap();
    assert_eq!(gadget.resolution, "imported_name");
    assert_eq!(gadget.target_path, None);

    let alias = table.get("alias").unwrap();
    assert_eq!(alias.strategy, Strategy::ModuleAliasAssignment);
    assert_eq!(alias.confidence, 60);
    assert_eq!(alias.qualified_name, "lib.Thing");
    assert_eq!(alias.resolution, "class");

    assert!(table.get("shadow").is_none());
}

#[test]
fn local_definitions_bind_top_level_names_only() {
    let project = Indexed::new(&[(
        "local.py",
        "class Outer:\n    def method(self):\n        pass\n\ndef top():\n    pass\n",
    )]);
    let table = project.table("local.py");

    assert_eq!(table.len(), 2);
    let top = table.get("top").unwrap();
    assert_eq!(top.strategy, Strategy::ModuleLocalDef);
    assert_eq!(top.confidence, 90);
    assert!(table.get("method").is_none());
}

#[test]
fn raw_enclosing_ids_canonicalize_to_nearby_symbols() {
    let project = Indexed::new(&[("pkg/m.py", "\ndef f():\n    g()\n")]);

    assert_eq!(
        canonicalize_enclosing_id("symbol:pkg/m.py:f@L2:C0", &project.index).as_deref(),
        Some("sym:pkg/m.py::pkg.m.f@L2:C1")
    );
    assert_eq!(
        canonicalize_enclosing_id("module:pkg/m.py@L1:C1", &project.index).as_deref(),
        Some("sym:pkg/m.py::pkg.m@L1:C1")
    );
    assert_eq!(
        canonicalize_enclosing_id("module:pkg/m.py", &project.index).as_deref(),
        Some("module:pkg/m.py")
    );
    assert_eq!(
        canonicalize_enclosing_id("symbol:pkg/m.py:f@L40:C0", &project.index).as_deref(),
        Some("symbol:pkg/m.py:f@L40:C0")
    );
    assert_eq!(canonicalize_enclosing_id("", &project.index), None);
}
