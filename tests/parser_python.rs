use repomap::core::records::SymbolKind;
use repomap::parsers::python::PythonParser;
use repomap::parsers::{ImportKind, LanguageParser, ParseResult};

fn parse(path: &str, module: &str, code: &str) -> ParseResult {
    let mut parser = PythonParser::new().unwrap();
    parser.parse_source(path, module, code.as_bytes()).unwrap()
}

#[test]
fn python_parser_extracts_classes_functions_and_methods() {
    let code = r#""""Module doc."""
import os

class A(Base, pkg.Mixin, make_meta(), Generic[T], metaclass=Meta):
    """Doc for A"""
    def m(self, x):
        def inner():
            pass
        return helper(x)

    class Nested:
        def deep(self):
            pass

def helper(v):
    return v
"#;
    let result = parse("pkg/sample.py", "pkg.sample", code);
    assert!(result.parse_error.is_none());

    let names: Vec<(&str, SymbolKind)> = result
        .symbols
        .iter()
        .map(|s| (s.qualified_name.as_str(), s.kind))
        .collect();
    assert_eq!(
        names,
        vec![
            ("pkg.sample", SymbolKind::Module),
            ("pkg.sample.A", SymbolKind::Class),
            ("pkg.sample.A.m", SymbolKind::Method),
            ("pkg.sample.A.Nested", SymbolKind::Class),
            ("pkg.sample.A.Nested.deep", SymbolKind::Method),
            ("pkg.sample.helper", SymbolKind::Function),
        ]
    );

    let module = &result.symbols[0];
    assert_eq!(module.name, "sample");
    assert_eq!(module.symbol_id, "sym:pkg/sample.py::pkg.sample@L1:C1");
    assert!(module.docstring_present);

    let class_a = &result.symbols[1];
    assert_eq!(class_a.symbol_id, "sym:pkg/sample.py::pkg.sample.A@L4:C1");
    assert_eq!(class_a.symbol_key, "symkey:pkg/sample.py::pkg.sample.A::class");
    assert!(class_a.docstring_present);
    assert_eq!(
        class_a.base_classes.as_deref().unwrap(),
        ["Base", "pkg.Mixin", "make_meta", "Generic"]
    );

    let method = &result.symbols[2];
    assert_eq!((method.start_line, method.start_col), (6, 5));
    assert!(!method.docstring_present);
    assert!(result.symbols[5].base_classes.is_none());
}

#[test]
fn python_parser_collects_every_import_shape() {
    let code = r#"from __future__ import annotations
import os.path as osp, sys
from collections import OrderedDict as OD, defaultdict
from .sibling import thing
from .. import parent_mod
from pkg.star import *

def lazy():
    import json
"#;
    let result = parse("pkg/sub/mod.py", "pkg.sub.mod", code);
    let imports: Vec<(ImportKind, usize, &str, &str, usize)> = result
        .imports
        .iter()
        .map(|i| (i.kind, i.line, i.module.as_str(), i.name.as_str(), i.level))
        .collect();

    assert_eq!(
        imports,
        vec![
            (ImportKind::ImportFrom, 1, "__future__", "annotations", 0),
            (ImportKind::Import, 2, "os.path", "osp", 0),
            (ImportKind::Import, 2, "sys", "", 0),
            (ImportKind::ImportFrom, 3, "collections", "OrderedDict as OD", 0),
            (ImportKind::ImportFrom, 3, "collections", "defaultdict", 0),
            (ImportKind::RelativeImport, 4, "sibling", "thing", 1),
            (ImportKind::RelativeImport, 5, "", "parent_mod", 2),
            (ImportKind::ImportStar, 6, "pkg.star", "*", 0),
            (ImportKind::Import, 9, "json", "", 0),
        ]
    );
    assert_eq!(result.imports[3].imported_and_local(), ("OrderedDict", "OD"));
}

#[test]
fn python_parser_records_calls_with_raw_scopes() {
    let code = r#"setup()

class Svc:
    def run(self):
        self.step()
        super().run()
        handlers[0]()
        make()()
        f = lambda: inner()
        a.b.c(x)
"#;
    let result = parse("svc.py", "svc", code);
    let calls: Vec<(&str, &str)> = result
        .call_sites
        .iter()
        .map(|c| (c.callee_expr.as_str(), c.enclosing_symbol_id.as_str()))
        .collect();

    let run_scope = "symbol:svc.py:run@L4:C4";
    assert!(calls.contains(&("setup", "module:svc.py")));
    assert!(calls.contains(&("self.step", run_scope)));
    assert!(calls.contains(&("super().run", run_scope)));
    assert!(calls.contains(&("<subscript>", run_scope)));
    assert!(calls.contains(&("<call>", run_scope)));
    assert!(calls.contains(&("make", run_scope)));
    assert!(calls.contains(&("inner", "symbol:svc.py:<lambda>@L9:C12")));
    assert!(calls.contains(&("a.b.c", run_scope)));

    let setup = &result.call_sites[0];
    assert_eq!(
        (setup.span.start_line, setup.span.start_col, setup.span.end_col),
        (1, 1, 8)
    );
}

#[test]
fn attribute_on_a_dynamic_object_collapses_to_placeholder() {
    let result = parse("dyn.py", "dyn", "get()[0].method()\nsuper(A, self).go()\n");
    let callees: Vec<&str> = result
        .call_sites
        .iter()
        .map(|c| c.callee_expr.as_str())
        .collect();
    assert_eq!(callees, vec!["<attribute>", "get", "<attribute>", "super"]);
}

#[test]
fn python_parser_finds_trivial_module_aliases_only() {
    let code = r#"from m import thing
alias = thing
typed: int = thing
x = y = thing
value = thing.attr

def f():
    local = thing
"#;
    let result = parse("aliases.py", "aliases", code);
    let aliases: Vec<(&str, &str)> = result
        .aliases
        .iter()
        .map(|a| (a.target.as_str(), a.source.as_str()))
        .collect();
    assert_eq!(aliases, vec![("alias", "thing")]);
}

#[test]
fn syntax_error_yields_module_record_only() {
    let result = parse("bad.py", "bad", "def broken(:\n    call()\nimport os\n");
    assert!(result.parse_error.is_some());
    assert_eq!(result.symbols.len(), 1);
    assert_eq!(result.symbols[0].kind, SymbolKind::Module);
    assert!(result.imports.is_empty());
    assert!(result.call_sites.is_empty());
}

#[test]
fn undecodable_source_spans_a_single_point() {
    let mut parser = PythonParser::new().unwrap();
    let result = parser
        .parse_source("latin.py", "latin", &[b'x', b'=', 0xe9, b'\n'])
        .unwrap();
    let module = &result.symbols[0];
    assert_eq!((module.end_line, module.end_col), (1, 1));
    assert!(result.parse_error.unwrap().contains("UTF-8"));
}

#[test]
fn deeply_nested_calls_are_all_collected() {
    let depth = 5000;
    let code = format!("x = {}{}\n", "f(".repeat(depth), ")".repeat(depth));
    let result = parse("deep.py", "deep", &code);

    assert!(result.parse_error.is_none());
    assert_eq!(result.call_sites.len(), depth);
    assert!(result
        .call_sites
        .iter()
        .all(|c| c.callee_expr == "f" && c.enclosing_symbol_id == "module:deep.py"));
    assert_eq!(result.call_sites[0].span.start_col, 5);
    assert_eq!(result.call_sites[depth - 1].span.start_col, 5 + 2 * (depth - 1));
}

#[test]
fn long_attribute_chain_keeps_its_dotted_callee() {
    let links = 3000;
    let code = format!("a{}()\n", ".b".repeat(links));
    let result = parse("chain.py", "chain", &code);

    assert_eq!(result.call_sites.len(), 1);
    assert_eq!(result.call_sites[0].callee_expr, format!("a{}", ".b".repeat(links)));

    let dynamic = parse("dyn.py", "dyn", &format!("x[0]{}()\n", ".b".repeat(links)));
    assert_eq!(dynamic.call_sites[0].callee_expr, "<attribute>");
}

#[test]
fn deeply_nested_lambdas_scope_the_innermost_call() {
    let depth = 2000;
    let code = format!("g = {}f()\n", "lambda: ".repeat(depth));
    let result = parse("lam.py", "lam", &code);

    assert_eq!(result.call_sites.len(), 1);
    assert_eq!(
        result.call_sites[0].enclosing_symbol_id,
        format!("symbol:lam.py:<lambda>@L1:C{}", 4 + 8 * (depth - 1))
    );
}

#[test]
fn class_scope_survives_a_deep_expression_in_its_body() {
    let depth = 4000;
    let code = format!(
        "class Holder:\n    value = {}1{}\n\n    def method(self):\n        return 1\n\ndef after():\n    pass\n",
        "(".repeat(depth),
        ")".repeat(depth)
    );
    let result = parse("holder.py", "holder", &code);

    assert!(result.parse_error.is_none());
    let symbols: Vec<_> = result
        .symbols
        .iter()
        .map(|s| (s.qualified_name.as_str(), s.kind))
        .collect();
    assert_eq!(
        symbols,
        vec![
            ("holder", SymbolKind::Module),
            ("holder.Holder", SymbolKind::Class),
            ("holder.Holder.method", SymbolKind::Method),
            ("holder.after", SymbolKind::Function),
        ]
    );
}
