use zinc_core::{FileId, IdentTable, SyntaxArena};
use zinc_syntax::json::{load_module, LoadError};
use zinc_syntax::{BinaryOp, FunctionKind, Modifiers, SyntaxKind};

const SAMPLE: &str = r#"{
  "kind": "Module",
  "name": "main",
  "pos": [1, 1, 30, 1],
  "body": [
    {"kind": "Import", "path": "std.io", "alias": "io", "pos": [1, 1, 1, 16]},
    {"kind": "Define", "name": "x", "pos": [2, 1, 2, 8],
     "value": {"kind": "IntLiteral", "value": 1, "suffix": "i8"}},
    {"kind": "Function", "name": "add", "pos": [3, 1, 5, 2],
     "params": [
       {"name": "a", "type": {"kind": "Name", "name": "Int32"}},
       {"name": "b", "type": {"kind": "Name", "name": "Int32"}, "default": {"kind": "IntLiteral", "value": 1}}
     ],
     "body": [
       {"kind": "Return", "value": {"kind": "Binary", "op": "+",
         "left": {"kind": "Name", "name": "a"}, "right": {"kind": "Name", "name": "b"}}}
     ]},
    {"kind": "Define", "name": "f", "modifiers": ["static"],
     "value": {"kind": "Lambda", "params": [], "body": []}},
    {"kind": "Call", "callee": {"kind": "Name", "name": "add"},
     "args": [{"kind": "IntLiteral", "value": 2}, {"name": "b", "value": {"kind": "IntLiteral", "value": 3}}]}
  ]
}"#;

#[test]
fn test_load_sample_module() {
    let arena = SyntaxArena::new();
    let idents = IdentTable::init();
    let module = load_module(&arena, &idents, FileId(3), SAMPLE).unwrap();

    assert_eq!(idents.resolve(module.name), "main");
    assert_eq!(module.body.len(), 5);
    assert_eq!(module.body[1].pos.start.line, 2);
    assert_eq!(module.body[1].pos.file, FileId(3));

    match &module.body[0].kind {
        SyntaxKind::Import { path, alias } => {
            assert_eq!(path.len(), 2);
            assert_eq!(idents.resolve(path[1]), "io");
            assert_eq!(alias.map(|a| idents.resolve(a).to_string()), Some("io".to_string()));
        }
        other => panic!("expected import, got {}", other.name()),
    }

    match &module.body[2].kind {
        SyntaxKind::Function(function) => {
            assert_eq!(function.params.len(), 2);
            assert!(function.params[1].default.is_some());
            let body = function.body.unwrap();
            let SyntaxKind::Return(Some(value)) = &body[0].kind else {
                panic!("expected return");
            };
            assert!(matches!(value.kind, SyntaxKind::Binary { op: BinaryOp::Add, .. }));
        }
        other => panic!("expected function, got {}", other.name()),
    }

    match &module.body[3].kind {
        SyntaxKind::Define { modifiers, value: Some(value), .. } => {
            assert_eq!(*modifiers, Modifiers::STATIC);
            let SyntaxKind::Lambda(lambda) = &value.kind else {
                panic!("expected lambda");
            };
            assert_eq!(lambda.kind, FunctionKind::Lambda);
        }
        other => panic!("expected define, got {}", other.name()),
    }

    match &module.body[4].kind {
        SyntaxKind::Call { args, .. } => {
            assert_eq!(args.len(), 2);
            assert!(args[0].name.is_none());
            assert_eq!(args[1].name.map(|n| idents.resolve(n).to_string()), Some("b".to_string()));
        }
        other => panic!("expected call, got {}", other.name()),
    }
}

#[test]
fn test_unknown_kind() {
    let arena = SyntaxArena::new();
    let idents = IdentTable::init();
    let text = r#"{"kind": "Module", "name": "m", "body": [{"kind": "Goto"}]}"#;
    let err = load_module(&arena, &idents, FileId(0), text).unwrap_err();
    assert!(matches!(err, LoadError::UnknownKind(ref kind) if kind == "Goto"));
    assert_eq!(err.to_string(), "unknown syntax kind `Goto`");
}

#[test]
fn test_bad_json() {
    let arena = SyntaxArena::new();
    let idents = IdentTable::init();
    let err = load_module(&arena, &idents, FileId(0), "{ not json").unwrap_err();
    assert!(matches!(err, LoadError::Json(_)));
}

#[test]
fn test_bad_operator() {
    let arena = SyntaxArena::new();
    let idents = IdentTable::init();
    let text = r#"{"kind": "Module", "name": "m", "body": [
        {"kind": "Binary", "op": "<=>", "left": {"kind": "NullLiteral"}, "right": {"kind": "NullLiteral"}}
    ]}"#;
    let err = load_module(&arena, &idents, FileId(0), text).unwrap_err();
    assert!(matches!(err, LoadError::InvalidValue { field: "op", .. }));
}
