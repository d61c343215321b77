//! Conversion tests through the binder.

use zinc_binder::*;
use zinc_core::{IdentTable, SyntaxArena};
use zinc_diagnostics::{messages, DiagnosticCollection, DiagnosticMessage};
use zinc_syntax::{SyntaxBuilder, SyntaxRef};

fn bind<'a>(
    b: &SyntaxBuilder<'a>,
    body: Vec<SyntaxRef<'a>>,
) -> (Program<'a>, DiagnosticCollection) {
    let module = b.module("main", body);
    let mut binder = Binder::new(b.idents(), BinderOptions::default());
    binder.bind_program(&[module]);
    binder.finish()
}

fn count(diagnostics: &DiagnosticCollection, message: &DiagnosticMessage) -> usize {
    diagnostics
        .diagnostics()
        .iter()
        .filter(|d| d.code == message.code)
        .count()
}

/// The conversion steps applied to the value defining `name`, outermost
/// last.
fn definition_steps(program: &Program<'_>, idents: &IdentTable, name: &str) -> Vec<StepKind> {
    let Decl::Module(module) = &program.symbol(program.modules[0]).decl else {
        panic!("not a module");
    };
    let symbol = program
        .scope(program.symbol(program.modules[0]).own_scope.unwrap())
        .get(idents.get(name).unwrap())
        .unwrap();
    let body = &program.function(module.entry.unwrap()).unwrap().body;
    let mut node = body
        .iter()
        .find_map(|&node| match program.node(node).kind {
            NodeKind::Definition { symbol: s, value } if s == symbol => value,
            _ => None,
        })
        .unwrap();
    let mut steps = Vec::new();
    loop {
        match program.node(node).kind {
            NodeKind::ConstExpr(inner) => node = inner,
            NodeKind::Cast { value, step } => {
                steps.push(step.kind);
                node = value;
            }
            _ => break,
        }
    }
    steps.reverse();
    steps
}

#[test]
fn test_explicit_narrowing() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let body = vec![
        b.define_typed("wide", b.name("Int64"), Some(b.int(5))),
        b.define("small", b.cast_as(b.name("wide"), b.name("Int8"))),
    ];
    let (program, diagnostics) = bind(&b, body);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());
    assert_eq!(
        definition_steps(&program, b.idents(), "small"),
        vec![StepKind::Narrow]
    );
}

#[test]
fn test_implicit_narrowing_suggests_explicit_cast() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let body = vec![
        b.define_typed("wide", b.name("Int64"), Some(b.int(5))),
        b.define_typed("small", b.name("Int8"), Some(b.name("wide"))),
    ];
    let (_, diagnostics) = bind(&b, body);
    assert_eq!(diagnostics.error_count(), 1);
    let diagnostic = &diagnostics.diagnostics()[0];
    assert_eq!(diagnostic.code, messages::CANNOT_IMPLICITLY_CONVERT_0_TO_1.code);
    assert_eq!(
        diagnostic.related_information[0].code,
        messages::EXPLICIT_CONVERSION_EXISTS_0_1.code
    );
}

#[test]
fn test_null_converts_to_any_pointer() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let body = vec![b.define_typed(
        "p",
        b.pointer_type(b.name("Int32")),
        Some(b.null()),
    )];
    let (program, diagnostics) = bind(&b, body);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());
    assert_eq!(
        definition_steps(&program, b.idents(), "p"),
        vec![StepKind::FromNull]
    );
}

#[test]
fn test_numbers_convert_to_bool() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let body = vec![b.define_typed("flag", b.name("Bool"), Some(b.int(1)))];
    let (program, diagnostics) = bind(&b, body);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());
    assert_eq!(
        definition_steps(&program, b.idents(), "flag"),
        vec![StepKind::ToBool]
    );
}

#[test]
fn test_null_converts_to_struct() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let body = vec![
        b.structure("Point")
            .field("x", b.name("Int32"))
            .field("y", b.name("Int32"))
            .build(),
        b.define_typed("origin", b.name("Point"), Some(b.null())),
    ];
    let (program, diagnostics) = bind(&b, body);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());
    assert_eq!(
        definition_steps(&program, b.idents(), "origin"),
        vec![StepKind::FromNull]
    );
}

#[test]
fn test_narrowing_loses_information() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let narrowed = b.cast_as(b.int(300), b.name("Int8"));
    let body = vec![b.define("back", b.cast_as(narrowed, b.name("Int32")))];
    let (program, diagnostics) = bind(&b, body);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());
    assert_eq!(
        definition_steps(&program, b.idents(), "back"),
        vec![StepKind::Narrow, StepKind::Widen]
    );

    let Decl::Module(module) = &program.symbol(program.modules[0]).decl else {
        panic!("not a module");
    };
    let body = &program.function(module.entry.unwrap()).unwrap().body;
    let value = body
        .iter()
        .find_map(|&node| match program.node(node).kind {
            NodeKind::Definition { value, .. } => value,
            _ => None,
        })
        .unwrap();
    assert_eq!(program.const_eval(value), Ok(ConstValue::Int(44)));
}

#[test]
fn test_packed_conversions() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let body = vec![
        b.define_typed("lanes", b.name("Int4"), Some(b.int(3))),
        b.define("floats", b.cast_as(b.name("lanes"), b.name("Float4"))),
        b.define_typed("implicit", b.name("Float4"), Some(b.name("lanes"))),
        b.define("pair", b.cast_as(b.name("lanes"), b.name("Double2"))),
    ];
    let (program, diagnostics) = bind(&b, body);

    assert_eq!(
        definition_steps(&program, b.idents(), "lanes").last(),
        Some(&StepKind::PackedBroadcast)
    );
    assert_eq!(
        definition_steps(&program, b.idents(), "floats"),
        vec![StepKind::PackedFloatCast]
    );
    assert_eq!(diagnostics.error_count(), 2);
    assert_eq!(count(&diagnostics, &messages::CANNOT_IMPLICITLY_CONVERT_0_TO_1), 1);
    assert_eq!(count(&diagnostics, &messages::LANE_COUNT_MISMATCH_0_1), 1);
}
