//! Symbols and their declarations.
//!
//! Every declared name is a `Symbol` owning exactly one `Decl`. Symbols are
//! stored in the program's symbol arena and referenced by `SymbolId`; they
//! are never freed while the program is alive.

use crate::node::{ConstValue, NodeId};
use crate::scope::ScopeId;
use crate::template::{Arity, TemplateSyntax};
use crate::types::TypeId;
use zinc_core::define_id;
use zinc_core::intern::Ident;
use zinc_core::text::SourcePos;
use zinc_syntax::{FunctionKind, Modifiers};

define_id! {
    /// Handle to a symbol in the program's symbol arena.
    pub struct SymbolId;
}

#[derive(Debug)]
pub struct Symbol<'a> {
    pub name: Ident,
    /// The scope the symbol is declared in. `None` only for the builtin
    /// scope's owner.
    pub owning_scope: Option<ScopeId>,
    /// The scope this symbol introduces, if any.
    pub own_scope: Option<ScopeId>,
    pub pos: SourcePos,
    pub decl: Decl<'a>,
}

impl<'a> Symbol<'a> {
    pub fn new(name: Ident, owning_scope: ScopeId, pos: SourcePos, decl: Decl<'a>) -> Self {
        Self {
            name,
            owning_scope: Some(owning_scope),
            own_scope: None,
            pos,
            decl,
        }
    }

    pub fn with_scope(mut self, scope: ScopeId) -> Self {
        self.own_scope = Some(scope);
        self
    }
}

/// What a symbol declares.
#[derive(Debug)]
pub enum Decl<'a> {
    Builtin(Builtin),
    Module(ModuleDecl<'a>),
    Template(TemplateDecl<'a>),
    /// Templates sharing a name, in declaration order.
    OverloadSet(Vec<SymbolId>),
    Struct(StructDecl),
    Union(StructDecl),
    Array(ArrayDecl),
    Enum(EnumDecl),
    Function(FunctionDecl<'a>),
    Label(LabelDecl),

    TypeAlias { tag: AliasTag, ty: TypeId },
    ConstAlias { tag: AliasTag, value: NodeId },
    ValueAlias { tag: AliasTag, target: SymbolId },

    Parameter { ty: TypeId, index: usize },
    Local { ty: TypeId },
    Global { ty: TypeId },
    Field(FieldDecl),
}

impl<'a> Decl<'a> {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Decl::Builtin(_) => "builtin",
            Decl::Module(_) => "module",
            Decl::Template(_) => "template",
            Decl::OverloadSet(_) => "overload set",
            Decl::Struct(_) => "struct",
            Decl::Union(_) => "union",
            Decl::Array(_) => "array",
            Decl::Enum(_) => "enum",
            Decl::Function(_) => "function",
            Decl::Label(_) => "label",
            Decl::TypeAlias { .. } => "type alias",
            Decl::ConstAlias { .. } => "constant",
            Decl::ValueAlias { .. } => "alias",
            Decl::Parameter { .. } => "parameter",
            Decl::Local { .. } => "local",
            Decl::Global { .. } => "global",
            Decl::Field(_) => "field",
        }
    }

    pub fn is_alias(&self) -> bool {
        matches!(
            self,
            Decl::TypeAlias { .. } | Decl::ConstAlias { .. } | Decl::ValueAlias { .. }
        )
    }

    /// Declarations that give their symbol a direct type.
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            Decl::Builtin(_) | Decl::Struct(_) | Decl::Union(_) | Decl::Array(_) | Decl::Enum(_)
        )
    }

    /// Declarations with storage, readable as values.
    pub fn value_type(&self) -> Option<TypeId> {
        match self {
            Decl::Parameter { ty, .. } | Decl::Local { ty } | Decl::Global { ty } => Some(*ty),
            Decl::Field(field) => Some(field.ty),
            _ => None,
        }
    }
}

/// Scalar element kinds of builtin types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    Bool,
    Int { bits: u16, signed: bool },
    Float { bits: u16 },
}

impl Scalar {
    pub fn bits(self) -> u16 {
        match self {
            Scalar::Bool => 8,
            Scalar::Int { bits, .. } | Scalar::Float { bits } => bits,
        }
    }

    pub fn is_integral(self) -> bool {
        matches!(self, Scalar::Int { .. })
    }

    pub fn is_float(self) -> bool {
        matches!(self, Scalar::Float { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Void,
    /// The type of the `null` literal.
    Null,
    Scalar(Scalar),
    /// SIMD vector of `lanes` scalars.
    Packed { element: Scalar, lanes: u16 },
}

/// Lazy module binding state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindStatus {
    Idle,
    Busy,
    Done,
}

#[derive(Debug)]
pub struct ModuleDecl<'a> {
    pub syntax: &'a zinc_syntax::ModuleSyntax<'a>,
    pub status: BindStatus,
    /// The entry-point function holding the module's top-level statements.
    pub entry: Option<SymbolId>,
}

/// How a function is used by generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Plain,
    Constructor,
    Disposer,
    /// The `next` method of a generator's resumable struct.
    GeneratorStep,
    /// The call method of a lambda's closure struct.
    LambdaCall,
}

impl Role {
    /// Roles whose function bodies may capture enclosing locals.
    pub fn captures(self) -> bool {
        matches!(self, Role::GeneratorStep | Role::LambdaCall)
    }
}

#[derive(Debug)]
pub struct TemplateDecl<'a> {
    pub syntax: TemplateSyntax<'a>,
    pub arity: Arity,
    /// The scope the declaration appears in; instances bind under it.
    pub scope: ScopeId,
    pub role: Role,
    pub function_kind: FunctionKind,
    pub modifiers: Modifiers,
    /// The struct instance a method template belongs to.
    pub owner: Option<SymbolId>,
    /// Every instance created from this template, in creation order.
    pub instances: Vec<SymbolId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructKind {
    Ordinary,
    Tuple,
    /// A generator's state.
    Resumable,
    /// A lambda's closure.
    Lambda,
}

#[derive(Debug)]
pub struct StructDecl {
    pub kind: StructKind,
    /// Fields in layout order.
    pub fields: Vec<SymbolId>,
    /// Template this struct was instantiated from.
    pub template: Option<SymbolId>,
    /// `next` for resumable structs, the call method for lambdas.
    pub method: Option<SymbolId>,
    /// Yielded element type of a resumable struct.
    pub element: Option<TypeId>,
    /// Field receiving yielded values.
    pub element_field: Option<SymbolId>,
}

impl StructDecl {
    pub fn new(kind: StructKind, template: Option<SymbolId>) -> Self {
        Self {
            kind,
            fields: Vec::new(),
            template,
            method: None,
            element: None,
            element_field: None,
        }
    }
}

#[derive(Debug)]
pub struct ArrayDecl {
    pub element: TypeId,
    pub length: u64,
}

#[derive(Debug)]
pub struct EnumDecl {
    pub base: TypeId,
    /// Member constants, each a `ConstAlias` in the enum's scope.
    pub members: Vec<(SymbolId, ConstValue)>,
}

#[derive(Debug)]
pub struct FunctionDecl<'a> {
    pub role: Role,
    /// Value parameters, receiver first.
    pub params: Vec<SymbolId>,
    /// `None` while the return type is still being inferred.
    pub ret: Option<TypeId>,
    pub body: Vec<NodeId>,
    pub template: Option<SymbolId>,
    /// Struct owning a method.
    pub owner: Option<SymbolId>,
    /// The `this` parameter of methods.
    pub receiver: Option<SymbolId>,
    /// ABI of extern functions.
    pub abi: Option<&'a str>,
    pub modifiers: Modifiers,
}

impl<'a> FunctionDecl<'a> {
    pub fn new(role: Role, template: Option<SymbolId>) -> Self {
        Self {
            role,
            params: Vec::new(),
            ret: None,
            body: Vec::new(),
            template,
            owner: None,
            receiver: None,
            abi: None,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn is_async(&self) -> bool {
        self.modifiers.contains(Modifiers::ASYNC)
    }
}

#[derive(Debug)]
pub struct LabelDecl {
    pub is_loop: bool,
    /// The function the labeled statement belongs to.
    pub function: Option<SymbolId>,
}

/// `alias`, `import` and `export` all introduce aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AliasTag {
    Define,
    Import,
    Export,
}

#[derive(Debug)]
pub struct FieldDecl {
    pub ty: TypeId,
    pub owner: SymbolId,
    pub index: usize,
    pub kind: FieldKind,
    /// Default initializer.
    pub default: Option<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Ordinary,
    Captured(CaptureSource),
}

/// Where a captured field takes its value from when the closure is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureSource {
    /// The variable as originally declared.
    pub original: SymbolId,
    /// The symbol read at the construction site: the original variable or
    /// the enclosing closure's captured field.
    pub from: SymbolId,
}
