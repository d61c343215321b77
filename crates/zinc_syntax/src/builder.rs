//! Programmatic syntax tree construction.
//!
//! `SyntaxBuilder` allocates nodes in a `SyntaxArena` and gives each one a
//! fresh line so that diagnostics from different nodes are distinguishable.
//! Tests and benchmarks use it in place of a parser.
//!
//! # Example
//! ```
//! use zinc_core::{IdentTable, SyntaxArena};
//! use zinc_syntax::{BinaryOp, SyntaxBuilder, SyntaxKind};
//!
//! let arena = SyntaxArena::new();
//! let b = SyntaxBuilder::new(&arena, IdentTable::init());
//! let sum = b.binary(BinaryOp::Add, b.int(1), b.int(2));
//! assert!(matches!(sum.kind, SyntaxKind::Binary { op: BinaryOp::Add, .. }));
//! ```

use std::cell::Cell;

use crate::node::*;
use crate::types::*;
use zinc_core::arena::SyntaxArena;
use zinc_core::intern::{Ident, IdentTable};
use zinc_core::text::{FileId, SourcePos};

pub struct SyntaxBuilder<'a> {
    arena: &'a SyntaxArena,
    idents: IdentTable,
    file: FileId,
    line: Cell<u32>,
}

impl<'a> SyntaxBuilder<'a> {
    pub fn new(arena: &'a SyntaxArena, idents: IdentTable) -> Self {
        Self::for_file(arena, idents, FileId(0))
    }

    pub fn for_file(arena: &'a SyntaxArena, idents: IdentTable, file: FileId) -> Self {
        Self {
            arena,
            idents,
            file,
            line: Cell::new(0),
        }
    }

    pub fn arena(&self) -> &'a SyntaxArena {
        self.arena
    }

    pub fn idents(&self) -> &IdentTable {
        &self.idents
    }

    pub fn ident(&self, name: &str) -> Ident {
        self.idents.intern(name)
    }

    fn next_pos(&self) -> SourcePos {
        let line = self.line.get() + 1;
        self.line.set(line);
        SourcePos::line(self.file, line, 1, 2)
    }

    pub fn node(&self, kind: SyntaxKind<'a>) -> SyntaxRef<'a> {
        let pos = self.next_pos();
        self.arena.alloc(Syntax { pos, kind })
    }

    pub fn list(&self, items: Vec<SyntaxRef<'a>>) -> SyntaxList<'a> {
        self.arena.alloc_vec(items)
    }

    // ------------------------------------------------------------------
    // Literals and names
    // ------------------------------------------------------------------

    pub fn int(&self, value: u64) -> SyntaxRef<'a> {
        self.node(SyntaxKind::IntLiteral { value, suffix: None })
    }

    pub fn int_suffixed(&self, value: u64, suffix: IntSuffix) -> SyntaxRef<'a> {
        self.node(SyntaxKind::IntLiteral {
            value,
            suffix: Some(suffix),
        })
    }

    pub fn float(&self, value: f64) -> SyntaxRef<'a> {
        self.node(SyntaxKind::FloatLiteral {
            value,
            single: false,
        })
    }

    pub fn float_single(&self, value: f64) -> SyntaxRef<'a> {
        self.node(SyntaxKind::FloatLiteral { value, single: true })
    }

    pub fn bool(&self, value: bool) -> SyntaxRef<'a> {
        self.node(SyntaxKind::BoolLiteral(value))
    }

    pub fn null(&self) -> SyntaxRef<'a> {
        self.node(SyntaxKind::NullLiteral)
    }

    pub fn string(&self, value: &str) -> SyntaxRef<'a> {
        let value = self.arena.alloc_str(value);
        self.node(SyntaxKind::StringLiteral(value))
    }

    pub fn name(&self, name: &str) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Name(self.ident(name)))
    }

    /// `a.b.c` from a dotted path.
    pub fn path(&self, path: &str) -> SyntaxRef<'a> {
        let mut parts = path.split('.');
        let first = parts.next().unwrap_or_default();
        let mut node = self.name(first);
        for part in parts {
            node = self.dot(node, part);
        }
        node
    }

    pub fn dot(&self, base: SyntaxRef<'a>, member: &str) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Dot {
            base,
            member: self.ident(member),
        })
    }

    pub fn index(&self, base: SyntaxRef<'a>, index: SyntaxRef<'a>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Index { base, index })
    }

    // ------------------------------------------------------------------
    // Operators
    // ------------------------------------------------------------------

    pub fn unary(&self, op: UnaryOp, operand: SyntaxRef<'a>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Unary { op, operand })
    }

    pub fn binary(&self, op: BinaryOp, left: SyntaxRef<'a>, right: SyntaxRef<'a>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Binary { op, left, right })
    }

    pub fn assign(&self, target: SyntaxRef<'a>, value: SyntaxRef<'a>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Assign {
            op: None,
            target,
            value,
        })
    }

    pub fn compound_assign(
        &self,
        op: BinaryOp,
        target: SyntaxRef<'a>,
        value: SyntaxRef<'a>,
    ) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Assign {
            op: Some(op),
            target,
            value,
        })
    }

    pub fn ternary(
        &self,
        cond: SyntaxRef<'a>,
        then: SyntaxRef<'a>,
        otherwise: SyntaxRef<'a>,
    ) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Ternary {
            cond,
            then,
            otherwise,
        })
    }

    /// `value as target`
    pub fn cast_as(&self, value: SyntaxRef<'a>, target: SyntaxRef<'a>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Cast {
            value,
            target,
            kind: CastSyntax::As,
        })
    }

    /// `value to target`
    pub fn cast_to(&self, value: SyntaxRef<'a>, target: SyntaxRef<'a>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Cast {
            value,
            target,
            kind: CastSyntax::To,
        })
    }

    pub fn arg(&self, value: SyntaxRef<'a>) -> Argument<'a> {
        Argument {
            pos: value.pos,
            name: None,
            value,
        }
    }

    pub fn named_arg(&self, name: &str, value: SyntaxRef<'a>) -> Argument<'a> {
        Argument {
            pos: value.pos,
            name: Some(self.ident(name)),
            value,
        }
    }

    /// A call with positional arguments only.
    pub fn call(&self, callee: SyntaxRef<'a>, args: Vec<SyntaxRef<'a>>) -> SyntaxRef<'a> {
        let args = args.into_iter().map(|value| self.arg(value)).collect();
        self.call_with(callee, args, None)
    }

    pub fn call_with(
        &self,
        callee: SyntaxRef<'a>,
        args: Vec<Argument<'a>>,
        with: Option<SyntaxRef<'a>>,
    ) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Call {
            callee,
            args: self.arena.alloc_vec(args),
            with,
        })
    }

    pub fn initializer(&self, ty: SyntaxRef<'a>, fields: Vec<Argument<'a>>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Initializer {
            ty,
            fields: self.arena.alloc_vec(fields),
        })
    }

    pub fn tuple(&self, items: Vec<SyntaxRef<'a>>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Tuple(self.list(items)))
    }

    pub fn size_of(&self, target: SyntaxRef<'a>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::SizeOf(target))
    }

    pub fn new_object(&self, ty: SyntaxRef<'a>, args: Vec<SyntaxRef<'a>>) -> SyntaxRef<'a> {
        let args = args.into_iter().map(|value| self.arg(value)).collect::<Vec<_>>();
        self.node(SyntaxKind::New {
            ty,
            count: None,
            args: self.arena.alloc_vec(args),
        })
    }

    pub fn new_array(&self, ty: SyntaxRef<'a>, count: SyntaxRef<'a>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::New {
            ty,
            count: Some(count),
            args: &[],
        })
    }

    pub fn delete(&self, value: SyntaxRef<'a>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Delete(value))
    }

    pub fn atomic(&self, op: AtomicOp, target: SyntaxRef<'a>, value: SyntaxRef<'a>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Atomic { op, target, value })
    }

    pub fn lambda(&self, function: &'a FunctionSyntax<'a>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Lambda(function))
    }

    // ------------------------------------------------------------------
    // Type expressions
    // ------------------------------------------------------------------

    pub fn pointer_type(&self, pointee: SyntaxRef<'a>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::PointerType(pointee))
    }

    pub fn reference_type(&self, pointee: SyntaxRef<'a>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::ReferenceType(pointee))
    }

    pub fn array_type(&self, element: SyntaxRef<'a>, length: SyntaxRef<'a>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::ArrayType { element, length })
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    /// `name := value`
    pub fn define(&self, name: &str, value: SyntaxRef<'a>) -> SyntaxRef<'a> {
        self.define_full(name, None, Some(value), Modifiers::NONE)
    }

    /// `name: ty [= value]`
    pub fn define_typed(
        &self,
        name: &str,
        ty: SyntaxRef<'a>,
        value: Option<SyntaxRef<'a>>,
    ) -> SyntaxRef<'a> {
        self.define_full(name, Some(ty), value, Modifiers::NONE)
    }

    pub fn define_full(
        &self,
        name: &str,
        ty: Option<SyntaxRef<'a>>,
        value: Option<SyntaxRef<'a>>,
        modifiers: Modifiers,
    ) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Define {
            name: self.ident(name),
            ty,
            value,
            modifiers,
        })
    }

    pub fn param(&self, name: &str, ty: Option<SyntaxRef<'a>>) -> Param<'a> {
        Param {
            pos: self.next_pos(),
            name: self.ident(name),
            ty,
            default: None,
            vararg: false,
            is_const: false,
        }
    }

    pub fn param_default(
        &self,
        name: &str,
        ty: Option<SyntaxRef<'a>>,
        default: SyntaxRef<'a>,
    ) -> Param<'a> {
        Param {
            default: Some(default),
            ..self.param(name, ty)
        }
    }

    pub fn vararg_param(&self, name: &str) -> Param<'a> {
        Param {
            vararg: true,
            ..self.param(name, None)
        }
    }

    pub fn const_param(&self, name: &str, ty: Option<SyntaxRef<'a>>) -> Param<'a> {
        Param {
            is_const: true,
            ..self.param(name, ty)
        }
    }

    /// Start a named function declaration.
    pub fn function(&self, name: &str) -> FunctionBuilder<'_, 'a> {
        FunctionBuilder::new(self, Some(self.ident(name)), FunctionKind::Plain)
    }

    /// Start an anonymous lambda.
    pub fn lambda_function(&self) -> FunctionBuilder<'_, 'a> {
        FunctionBuilder::new(self, None, FunctionKind::Lambda)
    }

    /// Start a named generator.
    pub fn generator(&self, name: &str) -> FunctionBuilder<'_, 'a> {
        FunctionBuilder::new(self, Some(self.ident(name)), FunctionKind::Generator)
    }

    pub fn structure(&self, name: &str) -> StructBuilder<'_, 'a> {
        StructBuilder::new(self, Some(self.ident(name)))
    }

    pub fn enumeration(
        &self,
        name: &str,
        base: Option<SyntaxRef<'a>>,
        members: Vec<(&str, Option<SyntaxRef<'a>>)>,
    ) -> SyntaxRef<'a> {
        let members = members
            .into_iter()
            .map(|(member, value)| EnumMember {
                pos: self.next_pos(),
                name: self.ident(member),
                value,
            })
            .collect::<Vec<_>>();
        let syntax = self.arena.alloc(EnumSyntax {
            pos: self.next_pos(),
            name: self.ident(name),
            base,
            members: self.arena.alloc_vec(members),
        });
        self.node(SyntaxKind::Enum(syntax))
    }

    pub fn alias(&self, name: &str, target: SyntaxRef<'a>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Alias {
            name: self.ident(name),
            target,
        })
    }

    /// `import a.b.c [as alias]`
    pub fn import(&self, path: &str, alias: Option<&str>) -> SyntaxRef<'a> {
        let path = path.split('.').map(|part| self.ident(part)).collect::<Vec<_>>();
        self.node(SyntaxKind::Import {
            path: self.arena.alloc_vec(path),
            alias: alias.map(|alias| self.ident(alias)),
        })
    }

    pub fn export(&self, name: &str, target: SyntaxRef<'a>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Export {
            name: self.ident(name),
            target,
        })
    }

    pub fn module(&self, name: &str, body: Vec<SyntaxRef<'a>>) -> &'a ModuleSyntax<'a> {
        self.arena.alloc(ModuleSyntax {
            pos: self.next_pos(),
            name: self.ident(name),
            body: self.list(body),
        })
    }

    /// A nested `module name { ... }` declaration.
    pub fn module_decl(&self, name: &str, body: Vec<SyntaxRef<'a>>) -> SyntaxRef<'a> {
        let module = self.module(name, body);
        self.node(SyntaxKind::Module(module))
    }

    pub fn extern_block(&self, abi: &str, body: Vec<SyntaxRef<'a>>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Extern {
            abi: self.arena.alloc_str(abi),
            body: self.list(body),
        })
    }

    pub fn modified(&self, modifiers: Modifiers, body: Vec<SyntaxRef<'a>>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Modified {
            modifiers,
            body: self.list(body),
        })
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    pub fn block(&self, body: Vec<SyntaxRef<'a>>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Block {
            label: None,
            body: self.list(body),
        })
    }

    pub fn labeled_block(&self, label: &str, body: Vec<SyntaxRef<'a>>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Block {
            label: Some(self.ident(label)),
            body: self.list(body),
        })
    }

    pub fn if_(
        &self,
        cond: SyntaxRef<'a>,
        then: SyntaxRef<'a>,
        otherwise: Option<SyntaxRef<'a>>,
    ) -> SyntaxRef<'a> {
        self.node(SyntaxKind::If {
            cond,
            then,
            otherwise,
        })
    }

    pub fn while_(&self, cond: SyntaxRef<'a>, body: Vec<SyntaxRef<'a>>) -> SyntaxRef<'a> {
        self.loop_full(None, None, Some(cond), None, body)
    }

    pub fn loop_full(
        &self,
        label: Option<&str>,
        init: Option<SyntaxRef<'a>>,
        cond: Option<SyntaxRef<'a>>,
        step: Option<SyntaxRef<'a>>,
        body: Vec<SyntaxRef<'a>>,
    ) -> SyntaxRef<'a> {
        let body = self.block(body);
        self.node(SyntaxKind::Loop {
            label: label.map(|label| self.ident(label)),
            init,
            cond,
            step,
            body,
        })
    }

    pub fn for_in(
        &self,
        name: &str,
        iterable: SyntaxRef<'a>,
        body: Vec<SyntaxRef<'a>>,
    ) -> SyntaxRef<'a> {
        let body = self.block(body);
        self.node(SyntaxKind::ForIn {
            label: None,
            name: self.ident(name),
            iterable,
            body,
        })
    }

    pub fn ret(&self, value: Option<SyntaxRef<'a>>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Return(value))
    }

    pub fn brk(&self, label: Option<&str>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Break(label.map(|label| self.ident(label))))
    }

    pub fn cont(&self, label: Option<&str>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Continue(label.map(|label| self.ident(label))))
    }

    pub fn defer(&self, statement: SyntaxRef<'a>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Defer(statement))
    }

    pub fn yield_(&self, value: SyntaxRef<'a>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Yield(value))
    }

    pub fn yield_from(&self, value: SyntaxRef<'a>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::YieldFrom(value))
    }

    pub fn await_(&self, value: SyntaxRef<'a>) -> SyntaxRef<'a> {
        self.node(SyntaxKind::Await(value))
    }
}

/// Builds a `FunctionSyntax`. Finish with `build` for a declaration node,
/// or `syntax` for the bare function (lambdas, extern entries).
pub struct FunctionBuilder<'b, 'a> {
    builder: &'b SyntaxBuilder<'a>,
    pos: SourcePos,
    name: Option<Ident>,
    operator: Option<OperatorName>,
    kind: FunctionKind,
    params: Vec<Param<'a>>,
    return_type: Option<SyntaxRef<'a>>,
    body: Option<Vec<SyntaxRef<'a>>>,
    modifiers: Modifiers,
}

impl<'b, 'a> FunctionBuilder<'b, 'a> {
    fn new(builder: &'b SyntaxBuilder<'a>, name: Option<Ident>, kind: FunctionKind) -> Self {
        Self {
            builder,
            pos: builder.next_pos(),
            name,
            operator: None,
            kind,
            params: Vec::new(),
            return_type: None,
            body: None,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn param(mut self, name: &str, ty: Option<SyntaxRef<'a>>) -> Self {
        let param = self.builder.param(name, ty);
        self.params.push(param);
        self
    }

    pub fn push_param(mut self, param: Param<'a>) -> Self {
        self.params.push(param);
        self
    }

    pub fn returns(mut self, ty: SyntaxRef<'a>) -> Self {
        self.return_type = Some(ty);
        self
    }

    pub fn body(mut self, body: Vec<SyntaxRef<'a>>) -> Self {
        self.body = Some(body);
        self
    }

    /// Declare as `operator<op>` instead of by name.
    pub fn operator(mut self, op: OperatorName) -> Self {
        self.name = None;
        self.operator = Some(op);
        self
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }

    pub fn syntax(self) -> &'a FunctionSyntax<'a> {
        let arena = self.builder.arena;
        arena.alloc(FunctionSyntax {
            pos: self.pos,
            name: self.name,
            operator: self.operator,
            kind: self.kind,
            params: arena.alloc_vec(self.params),
            return_type: self.return_type,
            body: self.body.map(|body| arena.alloc_vec(body)),
            modifiers: self.modifiers,
        })
    }

    pub fn build(self) -> SyntaxRef<'a> {
        let builder = self.builder;
        let syntax = self.syntax();
        builder.node(SyntaxKind::Function(syntax))
    }
}

pub struct StructBuilder<'b, 'a> {
    builder: &'b SyntaxBuilder<'a>,
    pos: SourcePos,
    name: Option<Ident>,
    kind: StructSyntaxKind,
    params: Vec<Param<'a>>,
    body: Vec<SyntaxRef<'a>>,
    modifiers: Modifiers,
}

impl<'b, 'a> StructBuilder<'b, 'a> {
    fn new(builder: &'b SyntaxBuilder<'a>, name: Option<Ident>) -> Self {
        Self {
            builder,
            pos: builder.next_pos(),
            name,
            kind: StructSyntaxKind::Struct,
            params: Vec::new(),
            body: Vec::new(),
            modifiers: Modifiers::NONE,
        }
    }

    pub fn kind(mut self, kind: StructSyntaxKind) -> Self {
        self.kind = kind;
        self
    }

    /// Generic parameter.
    pub fn param(mut self, name: &str, ty: Option<SyntaxRef<'a>>) -> Self {
        let param = self.builder.param(name, ty);
        self.params.push(param);
        self
    }

    pub fn push_param(mut self, param: Param<'a>) -> Self {
        self.params.push(param);
        self
    }

    /// `name: ty` field.
    pub fn field(mut self, name: &str, ty: SyntaxRef<'a>) -> Self {
        let field = self.builder.define_typed(name, ty, None);
        self.body.push(field);
        self
    }

    /// Any other member: a method, a nested type, an alias.
    pub fn member(mut self, member: SyntaxRef<'a>) -> Self {
        self.body.push(member);
        self
    }

    pub fn build(self) -> SyntaxRef<'a> {
        let arena = self.builder.arena;
        let syntax = arena.alloc(StructSyntax {
            pos: self.pos,
            name: self.name,
            kind: self.kind,
            params: arena.alloc_vec(self.params),
            body: arena.alloc_vec(self.body),
            modifiers: self.modifiers,
        });
        self.builder.node(SyntaxKind::Struct(syntax))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_are_distinct() {
        let arena = SyntaxArena::new();
        let b = SyntaxBuilder::new(&arena, IdentTable::init());
        let x = b.int(1);
        let y = b.int(2);
        assert_ne!(x.pos, y.pos);
        assert_eq!(x.pos.start.line + 1, y.pos.start.line);
    }

    #[test]
    fn test_function_builder() {
        let arena = SyntaxArena::new();
        let b = SyntaxBuilder::new(&arena, IdentTable::init());
        let f = b
            .function("add")
            .param("a", Some(b.name("Int32")))
            .push_param(b.param_default("b", Some(b.name("Int32")), b.int(1)))
            .body(vec![b.ret(Some(b.binary(BinaryOp::Add, b.name("a"), b.name("b"))))])
            .build();

        let SyntaxKind::Function(syntax) = &f.kind else {
            panic!("expected a function");
        };
        assert_eq!(syntax.params.len(), 2);
        assert!(syntax.params[1].default.is_some());
        assert_eq!(b.idents().resolve(syntax.name.unwrap()), "add");
        assert_eq!(syntax.body.map(|body| body.len()), Some(1));
    }

    #[test]
    fn test_path_builds_dots() {
        let arena = SyntaxArena::new();
        let b = SyntaxBuilder::new(&arena, IdentTable::init());
        let node = b.path("a.b.c");
        let SyntaxKind::Dot { base, member } = &node.kind else {
            panic!("expected dot");
        };
        assert_eq!(b.idents().resolve(*member), "c");
        assert!(matches!(base.kind, SyntaxKind::Dot { .. }));
    }
}
