//! Syntax node definitions.
//!
//! A node is a source position plus a kind-specific payload. Children are
//! arena references, so a tree is immutable once built and can be shared
//! freely by the binder.

use crate::types::*;
use zinc_core::intern::Ident;
use zinc_core::text::SourcePos;

/// A syntax node.
#[derive(Debug)]
pub struct Syntax<'a> {
    pub pos: SourcePos,
    pub kind: SyntaxKind<'a>,
}

pub type SyntaxRef<'a> = &'a Syntax<'a>;

/// A list of nodes, allocated in the arena.
pub type SyntaxList<'a> = &'a [SyntaxRef<'a>];

#[derive(Debug)]
pub enum SyntaxKind<'a> {
    // ------------------------------------------------------------------
    // Literals
    // ------------------------------------------------------------------
    IntLiteral {
        value: u64,
        suffix: Option<IntSuffix>,
    },
    FloatLiteral {
        value: f64,
        /// `f` suffix: single precision.
        single: bool,
    },
    BoolLiteral(bool),
    NullLiteral,
    StringLiteral(&'a str),

    // ------------------------------------------------------------------
    // Names and access
    // ------------------------------------------------------------------
    Name(Ident),
    Dot {
        base: SyntaxRef<'a>,
        member: Ident,
    },
    Index {
        base: SyntaxRef<'a>,
        index: SyntaxRef<'a>,
    },

    // ------------------------------------------------------------------
    // Operators
    // ------------------------------------------------------------------
    Unary {
        op: UnaryOp,
        operand: SyntaxRef<'a>,
    },
    Binary {
        op: BinaryOp,
        left: SyntaxRef<'a>,
        right: SyntaxRef<'a>,
    },
    /// `target = value`, or `target op= value` when `op` is set.
    Assign {
        op: Option<BinaryOp>,
        target: SyntaxRef<'a>,
        value: SyntaxRef<'a>,
    },
    Ternary {
        cond: SyntaxRef<'a>,
        then: SyntaxRef<'a>,
        otherwise: SyntaxRef<'a>,
    },
    Cast {
        value: SyntaxRef<'a>,
        target: SyntaxRef<'a>,
        kind: CastSyntax,
    },
    Call {
        callee: SyntaxRef<'a>,
        args: &'a [Argument<'a>],
        /// Trailing `with { ... }` argument.
        with: Option<SyntaxRef<'a>>,
    },
    Initializer {
        ty: SyntaxRef<'a>,
        fields: &'a [Argument<'a>],
    },
    Tuple(SyntaxList<'a>),
    SizeOf(SyntaxRef<'a>),
    New {
        ty: SyntaxRef<'a>,
        count: Option<SyntaxRef<'a>>,
        args: &'a [Argument<'a>],
    },
    Delete(SyntaxRef<'a>),
    Atomic {
        op: AtomicOp,
        target: SyntaxRef<'a>,
        value: SyntaxRef<'a>,
    },
    Lambda(&'a FunctionSyntax<'a>),

    // ------------------------------------------------------------------
    // Type expressions
    // ------------------------------------------------------------------
    PointerType(SyntaxRef<'a>),
    ReferenceType(SyntaxRef<'a>),
    ArrayType {
        element: SyntaxRef<'a>,
        length: SyntaxRef<'a>,
    },

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------
    /// `name: ty = value` / `name := value`.
    Define {
        name: Ident,
        ty: Option<SyntaxRef<'a>>,
        value: Option<SyntaxRef<'a>>,
        modifiers: Modifiers,
    },
    Function(&'a FunctionSyntax<'a>),
    Struct(&'a StructSyntax<'a>),
    Enum(&'a EnumSyntax<'a>),
    Alias {
        name: Ident,
        target: SyntaxRef<'a>,
    },
    Import {
        path: &'a [Ident],
        alias: Option<Ident>,
    },
    Export {
        name: Ident,
        target: SyntaxRef<'a>,
    },
    Module(&'a ModuleSyntax<'a>),
    Extern {
        abi: &'a str,
        body: SyntaxList<'a>,
    },
    /// `static { ... }` and friends.
    Modified {
        modifiers: Modifiers,
        body: SyntaxList<'a>,
    },

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------
    Block {
        label: Option<Ident>,
        body: SyntaxList<'a>,
    },
    If {
        cond: SyntaxRef<'a>,
        then: SyntaxRef<'a>,
        otherwise: Option<SyntaxRef<'a>>,
    },
    /// `while` and C-style `for` loops; a missing condition loops forever.
    Loop {
        label: Option<Ident>,
        init: Option<SyntaxRef<'a>>,
        cond: Option<SyntaxRef<'a>>,
        step: Option<SyntaxRef<'a>>,
        body: SyntaxRef<'a>,
    },
    /// `for name in generator { ... }`.
    ForIn {
        label: Option<Ident>,
        name: Ident,
        iterable: SyntaxRef<'a>,
        body: SyntaxRef<'a>,
    },
    Return(Option<SyntaxRef<'a>>),
    Break(Option<Ident>),
    Continue(Option<Ident>),
    Defer(SyntaxRef<'a>),
    Yield(SyntaxRef<'a>),
    YieldFrom(SyntaxRef<'a>),
    Await(SyntaxRef<'a>),
}

impl<'a> SyntaxKind<'a> {
    /// Short name of the node kind, for diagnostics and logging.
    pub fn name(&self) -> &'static str {
        match self {
            SyntaxKind::IntLiteral { .. } => "IntLiteral",
            SyntaxKind::FloatLiteral { .. } => "FloatLiteral",
            SyntaxKind::BoolLiteral(_) => "BoolLiteral",
            SyntaxKind::NullLiteral => "NullLiteral",
            SyntaxKind::StringLiteral(_) => "StringLiteral",
            SyntaxKind::Name(_) => "Name",
            SyntaxKind::Dot { .. } => "Dot",
            SyntaxKind::Index { .. } => "Index",
            SyntaxKind::Unary { .. } => "Unary",
            SyntaxKind::Binary { .. } => "Binary",
            SyntaxKind::Assign { .. } => "Assign",
            SyntaxKind::Ternary { .. } => "Ternary",
            SyntaxKind::Cast { .. } => "Cast",
            SyntaxKind::Call { .. } => "Call",
            SyntaxKind::Initializer { .. } => "Initializer",
            SyntaxKind::Tuple(_) => "Tuple",
            SyntaxKind::SizeOf(_) => "SizeOf",
            SyntaxKind::New { .. } => "New",
            SyntaxKind::Delete(_) => "Delete",
            SyntaxKind::Atomic { .. } => "Atomic",
            SyntaxKind::Lambda(_) => "Lambda",
            SyntaxKind::PointerType(_) => "PointerType",
            SyntaxKind::ReferenceType(_) => "ReferenceType",
            SyntaxKind::ArrayType { .. } => "ArrayType",
            SyntaxKind::Define { .. } => "Define",
            SyntaxKind::Function(_) => "Function",
            SyntaxKind::Struct(_) => "Struct",
            SyntaxKind::Enum(_) => "Enum",
            SyntaxKind::Alias { .. } => "Alias",
            SyntaxKind::Import { .. } => "Import",
            SyntaxKind::Export { .. } => "Export",
            SyntaxKind::Module(_) => "Module",
            SyntaxKind::Extern { .. } => "Extern",
            SyntaxKind::Modified { .. } => "Modified",
            SyntaxKind::Block { .. } => "Block",
            SyntaxKind::If { .. } => "If",
            SyntaxKind::Loop { .. } => "Loop",
            SyntaxKind::ForIn { .. } => "ForIn",
            SyntaxKind::Return(_) => "Return",
            SyntaxKind::Break(_) => "Break",
            SyntaxKind::Continue(_) => "Continue",
            SyntaxKind::Defer(_) => "Defer",
            SyntaxKind::Yield(_) => "Yield",
            SyntaxKind::YieldFrom(_) => "YieldFrom",
            SyntaxKind::Await(_) => "Await",
        }
    }

    /// Whether control never falls through this statement.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            SyntaxKind::Return(_) | SyntaxKind::Break(_) | SyntaxKind::Continue(_)
        )
    }
}

/// A call or initializer argument, optionally named.
#[derive(Debug)]
pub struct Argument<'a> {
    pub pos: SourcePos,
    pub name: Option<Ident>,
    pub value: SyntaxRef<'a>,
}

/// A declared parameter of a function or generic struct.
#[derive(Debug)]
pub struct Param<'a> {
    pub pos: SourcePos,
    pub name: Ident,
    pub ty: Option<SyntaxRef<'a>>,
    pub default: Option<SyntaxRef<'a>>,
    /// Trailing `...` parameter collecting any remaining arguments.
    pub vararg: bool,
    /// `const` parameter: the argument must fold to a constant.
    pub is_const: bool,
}

/// Operator-style declaration names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorName {
    Binary(BinaryOp),
    Unary(UnaryOp),
}

impl OperatorName {
    /// The name the declaration is registered under (`operator+`).
    pub fn declared_name(self) -> String {
        match self {
            OperatorName::Binary(op) => format!("operator{}", op.symbol()),
            OperatorName::Unary(op) => format!("operator{}", op.symbol()),
        }
    }
}

#[derive(Debug)]
pub struct FunctionSyntax<'a> {
    pub pos: SourcePos,
    /// `None` for lambdas and anonymous declarations.
    pub name: Option<Ident>,
    pub operator: Option<OperatorName>,
    pub kind: FunctionKind,
    pub params: &'a [Param<'a>],
    pub return_type: Option<SyntaxRef<'a>>,
    /// `None` for extern declarations.
    pub body: Option<SyntaxList<'a>>,
    pub modifiers: Modifiers,
}

#[derive(Debug)]
pub struct StructSyntax<'a> {
    pub pos: SourcePos,
    pub name: Option<Ident>,
    pub kind: StructSyntaxKind,
    /// Generic parameters; empty for plain structs.
    pub params: &'a [Param<'a>],
    /// Field definitions and methods.
    pub body: SyntaxList<'a>,
    pub modifiers: Modifiers,
}

#[derive(Debug)]
pub struct EnumMember<'a> {
    pub pos: SourcePos,
    pub name: Ident,
    pub value: Option<SyntaxRef<'a>>,
}

#[derive(Debug)]
pub struct EnumSyntax<'a> {
    pub pos: SourcePos,
    pub name: Ident,
    pub base: Option<SyntaxRef<'a>>,
    pub members: &'a [EnumMember<'a>],
}

/// A module: top-level file or nested `module` block.
#[derive(Debug)]
pub struct ModuleSyntax<'a> {
    pub pos: SourcePos,
    pub name: Ident,
    pub body: SyntaxList<'a>,
}
