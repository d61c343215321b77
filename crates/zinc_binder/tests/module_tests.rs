//! Module, import and export tests.

use zinc_binder::*;
use zinc_core::{IdentTable, SyntaxArena};
use zinc_diagnostics::{messages, DiagnosticCollection, DiagnosticMessage};
use zinc_syntax::{ModuleSyntax, SyntaxBuilder};

fn bind_modules<'a>(
    b: &SyntaxBuilder<'a>,
    modules: &[&'a ModuleSyntax<'a>],
) -> (Program<'a>, DiagnosticCollection) {
    let mut binder = Binder::new(b.idents(), BinderOptions::default());
    binder.bind_program(modules);
    binder.finish()
}

fn count(diagnostics: &DiagnosticCollection, message: &DiagnosticMessage) -> usize {
    diagnostics
        .diagnostics()
        .iter()
        .filter(|d| d.code == message.code)
        .count()
}

fn status(program: &Program<'_>, index: usize) -> BindStatus {
    match &program.symbol(program.modules[index]).decl {
        Decl::Module(decl) => decl.status,
        other => panic!("expected a module, found {}", other.kind_name()),
    }
}

fn member(program: &Program<'_>, idents: &IdentTable, index: usize, name: &str) -> SymbolId {
    let scope = program.symbol(program.modules[index]).own_scope.unwrap();
    program
        .lookup_through_dot(scope, idents.get(name).unwrap())
        .unwrap()
}

fn global_type(program: &Program<'_>, symbol: SymbolId) -> TypeId {
    match program.symbol(symbol).decl {
        Decl::Global { ty } => ty,
        ref other => panic!("expected a global, found {}", other.kind_name()),
    }
}

#[test]
fn test_later_module_is_bound_on_first_use() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let main = b.module("main", vec![b.define("x", b.path("lib.value"))]);
    let lib = b.module("lib", vec![b.define("value", b.float(2.5))]);

    let (program, diagnostics) = bind_modules(&b, &[main, lib]);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());
    assert_eq!(status(&program, 0), BindStatus::Done);
    assert_eq!(status(&program, 1), BindStatus::Done);

    let x = member(&program, b.idents(), 0, "x");
    assert_eq!(global_type(&program, x), program.builtins.double);
}

#[test]
fn test_busy_module_exposes_collected_declarations() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let main = b.module(
        "main",
        vec![
            b.function("seed").body(vec![b.ret(Some(b.int(3)))]).build(),
            b.define("x", b.path("lib.y")),
        ],
    );
    let lib = b.module(
        "lib",
        vec![b.define("y", b.call(b.path("main.seed"), vec![]))],
    );

    let (program, diagnostics) = bind_modules(&b, &[main, lib]);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());
    let x = member(&program, b.idents(), 0, "x");
    assert_eq!(global_type(&program, x), program.builtins.int32);
    assert_eq!(status(&program, 1), BindStatus::Done);
}

#[test]
fn test_import_member_with_alias() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let lib = b.module(
        "lib",
        vec![b.function("answer").body(vec![b.ret(Some(b.int(42)))]).build()],
    );
    let main = b.module(
        "main",
        vec![
            b.import("lib.answer", Some("reply")),
            b.import("lib", Some("l")),
            b.define("x", b.call(b.name("reply"), vec![])),
            b.define("y", b.call(b.path("l.answer"), vec![])),
        ],
    );

    let (program, diagnostics) = bind_modules(&b, &[main, lib]);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());

    let answer = member(&program, b.idents(), 1, "answer");
    let reply = member(&program, b.idents(), 0, "reply");
    assert!(matches!(
        program.symbol(reply).decl,
        Decl::ValueAlias { tag: AliasTag::Import, .. }
    ));
    assert_eq!(program.resolve_alias(reply), answer);
    for name in ["x", "y"] {
        let symbol = member(&program, b.idents(), 0, name);
        assert_eq!(global_type(&program, symbol), program.builtins.int32);
    }

    // Imports stay private to the importing module.
    let main_scope = program.symbol(program.modules[0]).own_scope.unwrap();
    let reply_name = b.idents().get("reply").unwrap();
    assert!(program.scope(main_scope).get(reply_name).is_none());
    assert_eq!(program.scope(main_scope).get_other(reply_name), Some(reply));
}

#[test]
fn test_export_is_visible_through_dot() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let lib = b.module(
        "lib",
        vec![
            b.function("secret").body(vec![b.ret(Some(b.float(0.5)))]).build(),
            b.export("open", b.name("secret")),
        ],
    );
    let main = b.module(
        "main",
        vec![b.define("x", b.call(b.path("lib.open"), vec![]))],
    );

    let (program, diagnostics) = bind_modules(&b, &[main, lib]);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());

    let open = member(&program, b.idents(), 1, "open");
    let secret = member(&program, b.idents(), 1, "secret");
    assert!(matches!(
        program.symbol(open).decl,
        Decl::ValueAlias { tag: AliasTag::Export, .. }
    ));
    assert_eq!(program.resolve_alias(open), secret);
    let x = member(&program, b.idents(), 0, "x");
    assert_eq!(global_type(&program, x), program.builtins.double);
}

#[test]
fn test_module_cannot_import_itself() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let main = b.module("main", vec![b.import("main", None)]);

    let (_, diagnostics) = bind_modules(&b, &[main]);
    assert_eq!(diagnostics.error_count(), 1);
    assert_eq!(count(&diagnostics, &messages::MODULE_IMPORTS_ITSELF_0), 1);
}

#[test]
fn test_import_reports_missing_module_and_member() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let lib = b.module("lib", vec![b.define("value", b.int(1))]);
    let main = b.module(
        "main",
        vec![b.import("nowhere", None), b.import("lib.absent", None)],
    );

    let (_, diagnostics) = bind_modules(&b, &[main, lib]);
    assert_eq!(diagnostics.error_count(), 2);
    assert_eq!(count(&diagnostics, &messages::CANNOT_FIND_MODULE_0), 1);
    assert_eq!(count(&diagnostics, &messages::CANNOT_IMPORT_0_FROM_1), 1);
}
