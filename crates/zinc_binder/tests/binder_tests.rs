//! Binder integration tests.
//!
//! Builds syntax trees with `SyntaxBuilder`, binds them, and inspects the
//! resulting program and diagnostics.

use zinc_binder::*;
use zinc_core::{IdentTable, SyntaxArena};
use zinc_diagnostics::{messages, DiagnosticCollection, DiagnosticMessage};
use zinc_syntax::{BinaryOp, IntSuffix, SyntaxBuilder, SyntaxRef, UnaryOp};

fn bind<'a>(
    b: &SyntaxBuilder<'a>,
    body: Vec<SyntaxRef<'a>>,
) -> (Program<'a>, DiagnosticCollection) {
    let module = b.module("main", body);
    let mut binder = Binder::new(b.idents(), BinderOptions::default());
    binder.bind_program(&[module]);
    binder.finish()
}

fn bind_nested<'a>(
    b: &SyntaxBuilder<'a>,
    body: Vec<SyntaxRef<'a>>,
    max_nesting_depth: usize,
) -> (Program<'a>, DiagnosticCollection) {
    let module = b.module("main", body);
    let options = BinderOptions {
        max_nesting_depth,
        ..BinderOptions::default()
    };
    let mut binder = Binder::new(b.idents(), options);
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

fn module_scope(program: &Program<'_>) -> ScopeId {
    program.symbol(program.modules[0]).own_scope.unwrap()
}

fn module_symbol(program: &Program<'_>, idents: &IdentTable, name: &str) -> SymbolId {
    let name = idents.get(name).unwrap();
    program.scope(module_scope(program)).get(name).unwrap()
}

fn entry_body(program: &Program<'_>) -> Vec<NodeId> {
    let Decl::Module(decl) = &program.symbol(program.modules[0]).decl else {
        panic!("not a module");
    };
    program.function(decl.entry.unwrap()).unwrap().body.clone()
}

fn definition_of(program: &Program<'_>, symbol: SymbolId) -> Option<NodeId> {
    entry_body(program).into_iter().find_map(|node| match program.node(node).kind {
        NodeKind::Definition { symbol: s, value } if s == symbol => value,
        _ => None,
    })
}

fn strip_const(program: &Program<'_>, mut node: NodeId) -> NodeId {
    while let NodeKind::ConstExpr(inner) = program.node(node).kind {
        node = inner;
    }
    node
}

fn global_type(program: &Program<'_>, symbol: SymbolId) -> TypeId {
    match program.symbol(symbol).decl {
        Decl::Global { ty } => ty,
        ref other => panic!("expected a global, found {}", other.kind_name()),
    }
}

// ============================================================================
// Declarations and lookup
// ============================================================================

#[test]
fn test_duplicate_definition_reports_both_positions() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let first = b.define("x", b.int(1));
    let second = b.define("x", b.int(2));
    let (_, diagnostics) = bind(&b, vec![first, second]);

    assert_eq!(diagnostics.error_count(), 1);
    let diagnostic = &diagnostics.diagnostics()[0];
    assert_eq!(diagnostic.code, messages::DUPLICATE_NAME_0.code);
    assert_eq!(diagnostic.pos, second.pos);
    assert_eq!(diagnostic.related_information.len(), 1);
    assert_eq!(diagnostic.related_information[0].pos, first.pos);
}

#[test]
fn test_local_shadows_global() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let body = vec![
        b.define("x", b.int(1)),
        b.function("f")
            .body(vec![b.define("x", b.float(2.5)), b.ret(Some(b.name("x")))])
            .build(),
        b.define("y", b.call(b.name("f"), vec![])),
        b.define("z", b.name("x")),
    ];
    let (program, diagnostics) = bind(&b, body);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());

    let y = module_symbol(&program, b.idents(), "y");
    let z = module_symbol(&program, b.idents(), "z");
    assert_eq!(global_type(&program, y), program.builtins.double);
    assert_eq!(global_type(&program, z), program.builtins.int32);
}

#[test]
fn test_functions_are_visible_before_declaration() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let body = vec![
        b.define("y", b.call(b.name("later"), vec![])),
        b.function("later").body(vec![b.ret(Some(b.int(7)))]).build(),
    ];
    let (program, diagnostics) = bind(&b, body);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());
    let y = module_symbol(&program, b.idents(), "y");
    assert_eq!(global_type(&program, y), program.builtins.int32);
}

#[test]
fn test_unknown_name() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let (_, diagnostics) = bind(&b, vec![b.define("y", b.name("missing"))]);
    assert_eq!(count(&diagnostics, &messages::CANNOT_FIND_NAME_0), 1);
}

#[test]
fn test_definition_without_type_or_value() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let body = vec![b.define("n", b.null())];
    let (_, diagnostics) = bind(&b, body);
    assert_eq!(count(&diagnostics, &messages::MISSING_TYPE_OR_INITIALIZER_0), 1);
}

// ============================================================================
// Operators and conversions
// ============================================================================

#[test]
fn test_small_operands_promote_to_int32() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let sum = b.binary(BinaryOp::Add, b.int_suffixed(1, IntSuffix::I8), b.int(300));
    let (program, diagnostics) = bind(&b, vec![b.define("x", sum)]);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());

    let int32 = program.builtins.int32;
    let x = module_symbol(&program, b.idents(), "x");
    assert_eq!(global_type(&program, x), int32);

    let value = definition_of(&program, x).unwrap();
    assert_eq!(program.node(value).ty, int32);
    let NodeKind::Arithmetic { op, left, right } = program.node(strip_const(&program, value)).kind
    else {
        panic!("expected arithmetic");
    };
    assert_eq!(op, BinaryOp::Add);
    for (operand, from) in [(left, program.builtins.int8), (right, program.builtins.int16)] {
        let NodeKind::Cast { value, step } = program.node(strip_const(&program, operand)).kind else {
            panic!("expected a cast");
        };
        assert_eq!(step, CastStep::new(StepKind::Widen, int32));
        assert_eq!(program.node(value).ty, from);
    }
    assert_eq!(program.const_eval(value), Ok(ConstValue::Int(301)));
}

#[test]
fn test_unsigned_operands_promote_to_uint32() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let body = vec![
        b.define_typed("x", b.name("UInt8"), Some(b.int_suffixed(200, IntSuffix::U8))),
        b.define_typed("y", b.name("UInt16"), Some(b.int_suffixed(7, IntSuffix::U16))),
        b.define("sum", b.binary(BinaryOp::Add, b.name("x"), b.int(1))),
        b.define("mixed", b.binary(BinaryOp::Mul, b.name("x"), b.name("y"))),
        b.define("flipped", b.unary(UnaryOp::BitNot, b.name("x"))),
    ];
    let (program, diagnostics) = bind(&b, body);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());

    let uint32 = program.builtins.uint32;
    for name in ["sum", "mixed", "flipped"] {
        let symbol = module_symbol(&program, b.idents(), name);
        assert_eq!(global_type(&program, symbol), uint32, "{}", name);
    }
}

#[test]
fn test_double_to_float_needs_explicit_cast() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let body = vec![
        b.define("d", b.float(1.5)),
        b.define_typed("f", b.name("Float"), Some(b.name("d"))),
        b.define("g", b.cast_as(b.name("d"), b.name("Float"))),
    ];
    let (program, diagnostics) = bind(&b, body);

    assert_eq!(diagnostics.error_count(), 1);
    let diagnostic = &diagnostics.diagnostics()[0];
    assert_eq!(diagnostic.code, messages::CANNOT_IMPLICITLY_CONVERT_0_TO_1.code);
    assert_eq!(
        diagnostic.related_information[0].code,
        messages::EXPLICIT_CONVERSION_EXISTS_0_1.code
    );
    let g = module_symbol(&program, b.idents(), "g");
    assert_eq!(global_type(&program, g), program.builtins.float);
}

#[test]
fn test_constant_division_by_zero() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let body = vec![b.define("x", b.binary(BinaryOp::Div, b.int(1), b.int(0)))];
    let (_, diagnostics) = bind(&b, body);
    assert_eq!(count(&diagnostics, &messages::DIVISION_BY_ZERO), 1);
}

#[test]
fn test_struct_layout_pads_fields() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let body = vec![
        b.structure("Pair")
            .field("tag", b.name("Int8"))
            .field("value", b.name("Int32"))
            .build(),
        b.define("size", b.size_of(b.name("Pair"))),
    ];
    let (program, diagnostics) = bind(&b, body);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());

    let size = module_symbol(&program, b.idents(), "size");
    assert_eq!(global_type(&program, size), program.builtins.uint64);
    let value = definition_of(&program, size).unwrap();
    let NodeKind::SizeOf { target, size } = program.node(strip_const(&program, value)).kind else {
        panic!("expected sizeof");
    };
    assert_eq!(size, 8);
    assert_eq!(program.size_of(target), 8);
}

#[test]
fn test_enum_members_count_up_from_previous() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let color = b.enumeration(
        "Color",
        None,
        vec![("Red", None), ("Green", Some(b.int(5))), ("Blue", None)],
    );
    let body = vec![
        color,
        b.define("blue", b.cast_as(b.path("Color.Blue"), b.name("Int32"))),
        b.define("same", b.binary(BinaryOp::Eq, b.path("Color.Red"), b.path("Color.Green"))),
    ];
    let (program, diagnostics) = bind(&b, body);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());

    let color = module_symbol(&program, b.idents(), "Color");
    let Decl::Enum(decl) = &program.symbol(color).decl else {
        panic!("expected an enum");
    };
    assert_eq!(decl.base, program.builtins.int32);
    let values: Vec<_> = decl.members.iter().map(|(_, value)| *value).collect();
    assert_eq!(
        values,
        vec![ConstValue::Int(0), ConstValue::Int(5), ConstValue::Int(6)]
    );

    let blue = module_symbol(&program, b.idents(), "blue");
    assert_eq!(global_type(&program, blue), program.builtins.int32);
    let value = definition_of(&program, blue).unwrap();
    assert_eq!(program.const_eval(value), Ok(ConstValue::Int(6)));

    let same = module_symbol(&program, b.idents(), "same");
    assert_eq!(global_type(&program, same), program.builtins.bool);
    let value = definition_of(&program, same).unwrap();
    assert_eq!(program.const_eval(value), Ok(ConstValue::Bool(false)));
}

#[test]
fn test_enum_needs_explicit_cast_to_base() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let body = vec![
        b.enumeration("Color", None, vec![("Red", None)]),
        b.define_typed("n", b.name("Int32"), Some(b.path("Color.Red"))),
    ];
    let (_, diagnostics) = bind(&b, body);
    assert_eq!(diagnostics.error_count(), 1);
    assert_eq!(count(&diagnostics, &messages::CANNOT_IMPLICITLY_CONVERT_0_TO_1), 1);
}

#[test]
fn test_extern_functions_are_concrete() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let puts = b
        .function("puts")
        .param("s", Some(b.pointer_type(b.name("Int8"))))
        .returns(b.name("Int32"))
        .build();
    let body = vec![
        b.extern_block("C", vec![puts]),
        b.define("n", b.call(b.name("puts"), vec![b.null()])),
    ];
    let (program, diagnostics) = bind(&b, body);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());

    let puts = module_symbol(&program, b.idents(), "puts");
    let decl = program.function(puts).unwrap();
    assert_eq!(decl.abi, Some("C"));
    assert_eq!(decl.params.len(), 1);
    assert_eq!(decl.ret, Some(program.builtins.int32));
    assert!(decl.template.is_none());

    let n = module_symbol(&program, b.idents(), "n");
    assert_eq!(global_type(&program, n), program.builtins.int32);
    let value = definition_of(&program, n).unwrap();
    assert!(matches!(program.node(value).kind, NodeKind::Call { function, .. } if function == puts));
}

#[test]
fn test_extern_function_rejects_body_and_untyped_parameters() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let body = vec![b.extern_block(
        "C",
        vec![
            b.function("defined").body(vec![]).build(),
            b.function("loose").param("x", None).build(),
        ],
    )];
    let (_, diagnostics) = bind(&b, body);
    assert_eq!(diagnostics.error_count(), 2);
    assert_eq!(count(&diagnostics, &messages::EXTERN_BODY_0), 1);
    assert_eq!(count(&diagnostics, &messages::EXTERN_PARAMETER_TYPE_0), 1);
}

#[test]
fn test_deeply_nested_blocks_hit_the_limit() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let mut nested = b.define("x", b.int(1));
    for _ in 0..12 {
        nested = b.block(vec![nested]);
    }
    let (_, diagnostics) = bind_nested(&b, vec![nested], 8);
    assert_eq!(diagnostics.error_count(), 1);
    assert_eq!(count(&diagnostics, &messages::NESTING_TOO_DEEP_0), 1);

    let (_, diagnostics) = bind_nested(&b, vec![nested], 32);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_break_outside_loop() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let (_, diagnostics) = bind(&b, vec![b.brk(None)]);
    assert_eq!(count(&diagnostics, &messages::BREAK_OUTSIDE_LOOP), 1);
}

#[test]
fn test_break_inside_loop() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let body = vec![b.while_(b.bool(true), vec![b.brk(None)])];
    let (_, diagnostics) = bind(&b, body);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());
}

// ============================================================================
// Templates
// ============================================================================

#[test]
fn test_duplicate_arity() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let body = vec![
        b.function("f").param("a", None).body(vec![]).build(),
        b.function("f").param("b", None).body(vec![]).build(),
    ];
    let (_, diagnostics) = bind(&b, body);
    assert_eq!(count(&diagnostics, &messages::DUPLICATE_ARITY_0), 1);
}

#[test]
fn test_overloads_by_arity() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let body = vec![
        b.function("f").param("a", None).body(vec![b.ret(Some(b.name("a")))]).build(),
        b.function("f")
            .param("a", None)
            .param("b", None)
            .body(vec![b.ret(Some(b.float(0.5)))])
            .build(),
        b.define("one", b.call(b.name("f"), vec![b.int(1)])),
        b.define("two", b.call(b.name("f"), vec![b.int(1), b.int(2)])),
    ];
    let (program, diagnostics) = bind(&b, body);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());

    let f = module_symbol(&program, b.idents(), "f");
    assert!(matches!(&program.symbol(f).decl, Decl::OverloadSet(list) if list.len() == 2));
    let one = module_symbol(&program, b.idents(), "one");
    let two = module_symbol(&program, b.idents(), "two");
    assert_eq!(global_type(&program, one), program.builtins.int32);
    assert_eq!(global_type(&program, two), program.builtins.double);
}

#[test]
fn test_instances_are_memoized_by_argument_types() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let body = vec![
        b.function("id").param("x", None).body(vec![b.ret(Some(b.name("x")))]).build(),
        b.define("a", b.call(b.name("id"), vec![b.int(1)])),
        b.define("c", b.call(b.name("id"), vec![b.int(2)])),
        b.define("d", b.call(b.name("id"), vec![b.float(1.5)])),
    ];
    let (program, diagnostics) = bind(&b, body);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());

    let id = module_symbol(&program, b.idents(), "id");
    let template = program.template(id).unwrap();
    assert_eq!(template.instances.len(), 2);

    let callee = |name: &str| {
        let symbol = module_symbol(&program, b.idents(), name);
        match program.node(definition_of(&program, symbol).unwrap()).kind {
            NodeKind::Call { function, .. } => function,
            _ => panic!("expected a call"),
        }
    };
    assert_eq!(callee("a"), callee("c"));
    assert_ne!(callee("a"), callee("d"));
}

#[test]
fn test_wrong_argument_count() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let body = vec![
        b.function("f").param("a", None).body(vec![]).build(),
        b.call(b.name("f"), vec![b.int(1), b.int(2)]),
    ];
    let (_, diagnostics) = bind(&b, body);
    assert_eq!(count(&diagnostics, &messages::NO_DECLARATION_OF_0_ACCEPTS_1_ARGUMENTS), 1);
}

#[test]
fn test_zero_arity_function_is_instantiated_once() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let body = vec![
        b.function("answer").body(vec![b.ret(Some(b.int(42)))]).build(),
        b.define("a", b.call(b.name("answer"), vec![])),
        b.define("c", b.call(b.name("answer"), vec![])),
    ];
    let (program, diagnostics) = bind(&b, body);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());

    let answer = module_symbol(&program, b.idents(), "answer");
    let instances = &program.template(answer).unwrap().instances;
    assert_eq!(instances.len(), 1);

    let callee = |name: &str| {
        let symbol = module_symbol(&program, b.idents(), name);
        match program.node(definition_of(&program, symbol).unwrap()).kind {
            NodeKind::Call { function, .. } => function,
            _ => panic!("expected a call"),
        }
    };
    assert_eq!(callee("a"), instances[0]);
    assert_eq!(callee("c"), instances[0]);
}

#[test]
fn test_failed_body_does_not_cascade_into_callers() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let body = vec![
        b.function("f").body(vec![b.ret(Some(b.name("missing")))]).build(),
        b.define("x", b.call(b.name("f"), vec![])),
        b.define("y", b.binary(BinaryOp::Add, b.call(b.name("f"), vec![]), b.int(1))),
    ];
    let (program, diagnostics) = bind(&b, body);
    assert_eq!(diagnostics.error_count(), 1, "{:?}", diagnostics.diagnostics());
    assert_eq!(count(&diagnostics, &messages::CANNOT_FIND_NAME_0), 1);
    assert_eq!(count(&diagnostics, &messages::VOID_HAS_NO_VALUE), 0);

    let f = module_symbol(&program, b.idents(), "f");
    let instance = program.template(f).unwrap().instances[0];
    let ret = program.function(instance).unwrap().ret.unwrap();
    assert!(program.types.is_unknown(ret));
}

#[test]
fn test_polymorphic_recursion_reports_nesting_once() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let recurse = b.call(b.name("f"), vec![b.unary(UnaryOp::AddressOf, b.name("x"))]);
    let body = vec![
        b.function("f").param("x", None).body(vec![b.ret(Some(recurse))]).build(),
        b.define("y", b.call(b.name("f"), vec![b.int(1)])),
    ];
    let (_, diagnostics) = bind_nested(&b, body, 16);
    assert_eq!(diagnostics.error_count(), 1, "{:?}", diagnostics.diagnostics());
    assert_eq!(count(&diagnostics, &messages::NESTING_TOO_DEEP_0), 1);
}

// ============================================================================
// Closures and generators
// ============================================================================

#[test]
fn test_lambda_captures_each_variable_once() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let twice = b.binary(BinaryOp::Add, b.name("n"), b.name("n"));
    let lambda = b.lambda(b.lambda_function().body(vec![b.ret(Some(twice))]).syntax());
    let body = vec![
        b.function("outer")
            .body(vec![b.define("n", b.int(1)), b.define("f", lambda)])
            .build(),
        b.call(b.name("outer"), vec![]),
    ];
    let (program, diagnostics) = bind(&b, body);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());

    let closure = program
        .symbols()
        .find(|(_, symbol)| {
            matches!(&symbol.decl, Decl::Struct(decl) if decl.kind == StructKind::Lambda)
        })
        .map(|(id, _)| id)
        .unwrap();
    let decl = program.struct_decl(closure).unwrap();
    assert_eq!(decl.fields.len(), 1);
    let Decl::Field(field) = &program.symbol(decl.fields[0]).decl else {
        panic!("expected a field");
    };
    let FieldKind::Captured(source) = field.kind else {
        panic!("expected a captured field");
    };
    assert_eq!(b.idents().resolve(program.symbol(source.original).name), "n");
    assert_eq!(source.from, source.original);
    assert_eq!(field.ty, program.builtins.int32);

    let call = program.function(decl.method.unwrap()).unwrap();
    assert_eq!(call.role, Role::LambdaCall);
    assert_eq!(call.ret, Some(program.builtins.int32));
}

#[test]
fn test_plain_function_cannot_capture() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let inner = b.function("inner").body(vec![b.ret(Some(b.name("n")))]).build();
    let body = vec![
        b.function("outer")
            .body(vec![b.define("n", b.int(1)), inner, b.call(b.name("inner"), vec![])])
            .build(),
        b.call(b.name("outer"), vec![]),
    ];
    let (_, diagnostics) = bind(&b, body);
    assert_eq!(count(&diagnostics, &messages::CANNOT_CAPTURE_0_ACROSS_1), 1);
}

#[test]
fn test_generator_builds_resumable_struct() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let generator = b
        .generator("count")
        .param("n", Some(b.name("Int32")))
        .body(vec![
            b.yield_(b.name("n")),
            b.yield_(b.binary(BinaryOp::Add, b.name("n"), b.int(1))),
        ])
        .build();
    let accumulate = b.assign(
        b.name("total"),
        b.binary(BinaryOp::Add, b.name("total"), b.name("v")),
    );
    let body = vec![
        generator,
        b.define("total", b.int(0)),
        b.for_in("v", b.call(b.name("count"), vec![b.int(3)]), vec![accumulate]),
    ];
    let (program, diagnostics) = bind(&b, body);
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics.diagnostics());

    let count_template = module_symbol(&program, b.idents(), "count");
    let instances = &program.template(count_template).unwrap().instances;
    assert_eq!(instances.len(), 1);
    let state = program.struct_decl(instances[0]).unwrap();
    assert_eq!(state.kind, StructKind::Resumable);
    assert_eq!(state.element, Some(program.builtins.int32));
    assert_eq!(state.fields.len(), 2);

    let next = program.function(state.method.unwrap()).unwrap();
    assert_eq!(next.role, Role::GeneratorStep);
    assert_eq!(next.ret, Some(program.builtins.bool));
    assert!(next.receiver.is_some());

    assert!(entry_body(&program)
        .iter()
        .any(|node| matches!(program.node(*node).kind, NodeKind::ForIn { .. })));
}

#[test]
fn test_yield_outside_generator() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let body = vec![
        b.function("f").body(vec![b.yield_(b.int(1))]).build(),
        b.call(b.name("f"), vec![]),
    ];
    let (_, diagnostics) = bind(&b, body);
    assert_eq!(count(&diagnostics, &messages::YIELD_OUTSIDE_GENERATOR), 1);
}

#[test]
fn test_for_in_needs_generator() {
    let arena = SyntaxArena::new();
    let b = SyntaxBuilder::new(&arena, IdentTable::init());
    let body = vec![b.for_in("v", b.int(3), vec![])];
    let (_, diagnostics) = bind(&b, body);
    assert_eq!(count(&diagnostics, &messages::NOT_ITERABLE_0), 1);
}
