//! Compiler integration tests.
//!
//! End-to-end tests for the session: load -> bind -> verify.

use std::path::Path;

use zinc_compiler::{CompileError, Session};
use zinc_core::{FileId, SyntaxArena};
use zinc_diagnostics::messages;
use zinc_options::CompilerOptions;
use zinc_syntax::{BinaryOp, SyntaxBuilder};

fn session() -> Session {
    Session::new(CompilerOptions::default()).unwrap()
}

// ============================================================================
// Binding through the session
// ============================================================================

#[test]
fn test_compile_empty_module() {
    let session = session();
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, session.idents().clone());
    let module = b.module("main", vec![]);

    let compilation = session.compile(&[module]).unwrap();
    assert!(compilation.succeeded());
    assert_eq!(compilation.summaries.len(), 1);
    assert_eq!(compilation.summaries[0].name, "main");
    assert_eq!(compilation.summaries[0].statements, 0);
    assert_eq!(compilation.summaries[0].functions, 1);
}

#[test]
fn test_summaries_count_reachable_functions() {
    let session = session();
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, session.idents().clone());
    let module = b.module(
        "main",
        vec![
            b.function("add")
                .param("a", None)
                .param("b", None)
                .body(vec![b.ret(Some(b.binary(BinaryOp::Add, b.name("a"), b.name("b"))))])
                .build(),
            b.function("unused").body(vec![]).build(),
            b.define("x", b.call(b.name("add"), vec![b.int(1), b.int(2)])),
            b.define("y", b.call(b.name("add"), vec![b.int(3), b.int(4)])),
        ],
    );

    let compilation = session.compile(&[module]).unwrap();
    assert!(compilation.succeeded(), "{:?}", compilation.diagnostics.diagnostics());
    let summary = &compilation.summaries[0];
    assert_eq!(summary.statements, 2);
    // The entry and one shared instance of `add`.
    assert_eq!(summary.functions, 2);
    assert!(summary.nodes > summary.statements);
}

#[test]
fn test_errors_suppress_verification() {
    let session = session();
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, session.idents().clone());
    let module = b.module("main", vec![b.define("x", b.name("nowhere"))]);

    let compilation = session.compile(&[module]).unwrap();
    assert!(!compilation.succeeded());
    assert!(compilation.summaries.is_empty());
    assert_eq!(
        compilation.diagnostics.diagnostics()[0].code,
        messages::CANNOT_FIND_NAME_0.code
    );
}

#[test]
fn test_modules_reference_each_other() {
    let session = session();
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, session.idents().clone());
    let library = b.module(
        "lib",
        vec![b.function("answer").body(vec![b.ret(Some(b.int(42)))]).build()],
    );
    let main = b.module(
        "main",
        vec![b.define("x", b.call(b.path("lib.answer"), vec![]))],
    );

    let compilation = session.compile(&[main, library]).unwrap();
    assert!(compilation.succeeded(), "{:?}", compilation.diagnostics.diagnostics());
    assert_eq!(compilation.summaries.len(), 2);
}

#[test]
fn test_errors_are_collected_across_modules() {
    let session = session();
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, session.idents().clone());
    let first = b.module("first", vec![b.brk(None)]);
    let second = b.module("second", vec![b.define("y", b.name("missing"))]);

    let compilation = session.compile(&[first, second]).unwrap();
    assert_eq!(compilation.diagnostics.error_count(), 2);
}

#[test]
fn test_entry_name_comes_from_options() {
    let options = CompilerOptions {
        entry_name: Some("start".to_string()),
        ..CompilerOptions::default()
    };
    let session = Session::new(options).unwrap();
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, session.idents().clone());
    let module = b.module("main", vec![b.define("x", b.int(1))]);

    let compilation = session.compile(&[module]).unwrap();
    let entry = compilation.summaries[0].entry;
    assert_eq!(
        session.idents().resolve(compilation.program.symbol(entry).name),
        "start"
    );
}

// ============================================================================
// Options and loading
// ============================================================================

#[test]
fn test_invalid_options_are_rejected() {
    let options = CompilerOptions {
        threads: Some(0),
        ..CompilerOptions::default()
    };
    assert!(matches!(Session::new(options), Err(CompileError::Config(_))));
}

#[test]
fn test_load_source_binds_json_dump() {
    let session = session();
    let arena = SyntaxArena::new();
    let text = r#"{
        "kind": "Module",
        "name": "main",
        "body": [
            {"kind": "Define", "name": "x", "value": {"kind": "IntLiteral", "value": 7}}
        ]
    }"#;
    let module = session
        .load_source(&arena, FileId(0), Path::new("main.json"), text)
        .unwrap();
    let compilation = session.compile(&[module]).unwrap();
    assert!(compilation.succeeded(), "{:?}", compilation.diagnostics.diagnostics());
    assert_eq!(compilation.summaries[0].statements, 1);
}

#[test]
fn test_load_error_names_the_file() {
    let session = session();
    let arena = SyntaxArena::new();
    let err = session
        .load_source(&arena, FileId(0), Path::new("broken.json"), "{")
        .unwrap_err();
    assert!(matches!(err, CompileError::Load { .. }));
    assert!(err.to_string().contains("broken.json"));
}

#[test]
fn test_finish_reports_identifiers() {
    let session = session();
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, session.idents().clone());
    let module = b.module("main", vec![b.define("x", b.int(1))]);
    drop(session.compile(&[module]).unwrap());
    drop(b);
    assert!(session.finish() > 0);
}
