//! Closure capture tests.

use zinc_binder::*;
use zinc_core::{IdentTable, SyntaxArena};
use zinc_diagnostics::DiagnosticCollection;
use zinc_syntax::{BinaryOp, SyntaxBuilder, SyntaxRef};

fn bind<'a>(
    b: &SyntaxBuilder<'a>,
    body: Vec<SyntaxRef<'a>>,
) -> (Program<'a>, DiagnosticCollection) {
    let module = b.module("main", body);
    let mut binder = Binder::new(b.idents(), BinderOptions::default());
    binder.bind_program(&[module]);
    binder.finish()
}

fn lambdas(program: &Program<'_>) -> Vec<SymbolId> {
    program
        .symbols()
        .filter(|(_, symbol)| {
            matches!(&symbol.decl, Decl::Struct(decl) if decl.kind == StructKind::Lambda)
        })
        .map(|(id, _)| id)
        .collect()
}

fn captures(program: &Program<'_>, closure: SymbolId) -> Vec<(SymbolId, CaptureSource)> {
    program
        .struct_decl(closure)
        .unwrap()
        .fields
        .iter()
        .filter_map(|&field| match &program.symbol(field).decl {
            Decl::Field(FieldDecl {
                kind: FieldKind::Captured(source),
                ..
            }) => Some((field, *source)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_nested_lambdas_chain_through_outer_closure() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let inner = b.lambda(b.lambda_function().body(vec![b.ret(Some(b.name("n")))]).syntax());
    let outer = b.lambda(b.lambda_function().body(vec![b.ret(Some(inner))]).syntax());
    let body = vec![
        b.function("make")
            .body(vec![b.define("n", b.int(4)), b.define("f", outer)])
            .build(),
        b.call(b.name("make"), vec![]),
    ];
    let (program, diagnostics) = bind(&b, body);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());

    let closures = lambdas(&program);
    assert_eq!(closures.len(), 2);
    let all: Vec<_> = closures
        .iter()
        .flat_map(|&closure| captures(&program, closure))
        .collect();
    assert_eq!(all.len(), 2);

    let (outer_field, outer_source) = all
        .iter()
        .copied()
        .find(|(_, source)| source.from == source.original)
        .unwrap();
    let (_, inner_source) = all
        .iter()
        .copied()
        .find(|(_, source)| source.from != source.original)
        .unwrap();
    assert_eq!(inner_source.from, outer_field);
    assert_eq!(inner_source.original, outer_source.original);
    assert_eq!(b.idents().resolve(program.symbol(outer_source.original).name), "n");
}

#[test]
fn test_globals_are_not_captured() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let read = b.binary(BinaryOp::Mul, b.name("scale"), b.name("x"));
    let lambda = b.lambda(
        b.lambda_function()
            .param("x", Some(b.name("Int32")))
            .body(vec![b.ret(Some(read))])
            .syntax(),
    );
    let body = vec![b.define("scale", b.int(3)), b.define("f", lambda)];
    let (program, diagnostics) = bind(&b, body);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());

    let closures = lambdas(&program);
    assert_eq!(closures.len(), 1);
    assert!(captures(&program, closures[0]).is_empty());
}

#[test]
fn test_lambda_parameters_need_types() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let lambda = b.lambda(
        b.lambda_function()
            .param("x", None)
            .body(vec![b.ret(Some(b.name("x")))])
            .syntax(),
    );
    let (_, diagnostics) = bind(&b, vec![b.define("f", lambda)]);
    assert_eq!(
        diagnostics
            .diagnostics()
            .iter()
            .filter(|d| d.code == zinc_diagnostics::messages::MALFORMED_PARAMETERS_0_1.code)
            .count(),
        1
    );
}
