//! The bound program.
//!
//! `Program` owns every symbol, scope, node and type created during
//! binding. Everything is addressed by typed ids; nothing is freed until the
//! program is dropped after lowering.

use crate::builtins::{self, Builtins};
use crate::node::{Node, NodeId, NodeKind};
use crate::scope::{Scope, ScopeId, ScopeKind};
use crate::symbol::*;
use crate::template::Fingerprint;
use crate::types::{TypeId, TypeKind, TypeTable};
use zinc_core::collections::{FxHashMap, FxHashSet};
use zinc_core::intern::{Ident, IdentTable};

pub struct Program<'a> {
    pub types: TypeTable,
    symbols: Vec<Symbol<'a>>,
    scopes: Vec<Scope>,
    nodes: Vec<Node>,
    pub builtins: Builtins,
    pub builtin_scope: ScopeId,
    /// Parent of every top-level module scope.
    pub root_scope: ScopeId,
    /// Top-level modules in binding order.
    pub modules: Vec<SymbolId>,
    /// Pointer size in bits.
    pub pointer_width: u16,
    pub(crate) memo: FxHashMap<(SymbolId, Fingerprint), SymbolId>,
    pub(crate) arrays: FxHashMap<(TypeId, u64), SymbolId>,
    pub(crate) tuples: FxHashMap<Vec<TypeId>, SymbolId>,
}

impl<'a> Program<'a> {
    pub fn new(idents: &IdentTable, pointer_width: u16) -> Self {
        let mut program = Self {
            types: TypeTable::new(),
            symbols: Vec::new(),
            scopes: Vec::new(),
            nodes: Vec::new(),
            builtins: Builtins::empty(),
            builtin_scope: ScopeId::INVALID,
            root_scope: ScopeId::INVALID,
            modules: Vec::new(),
            pointer_width,
            memo: FxHashMap::default(),
            arrays: FxHashMap::default(),
            tuples: FxHashMap::default(),
        };
        let (builtin_scope, builtins) = builtins::install(&mut program, idents);
        program.builtin_scope = builtin_scope;
        program.builtins = builtins;
        program.root_scope =
            program.add_scope(Scope::new(ScopeKind::Root, Some(builtin_scope), None));
        program
    }

    // ------------------------------------------------------------------
    // Arenas
    // ------------------------------------------------------------------

    pub fn add_symbol(&mut self, symbol: Symbol<'a>) -> SymbolId {
        let id = SymbolId::from_index(self.symbols.len());
        self.symbols.push(symbol);
        id
    }

    #[inline]
    pub fn symbol(&self, id: SymbolId) -> &Symbol<'a> {
        &self.symbols[id.index()]
    }

    #[inline]
    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol<'a> {
        &mut self.symbols[id.index()]
    }

    pub fn symbols(&self) -> impl Iterator<Item = (SymbolId, &Symbol<'a>)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(index, symbol)| (SymbolId::from_index(index), symbol))
    }

    pub fn add_scope(&mut self, scope: Scope) -> ScopeId {
        let id = ScopeId::from_index(self.scopes.len());
        self.scopes.push(scope);
        id
    }

    #[inline]
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    #[inline]
    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(node);
        id
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ------------------------------------------------------------------
    // Declaration and lookup
    // ------------------------------------------------------------------

    /// Declare `symbol` in `scope`. On a name clash the existing symbol is
    /// returned and nothing is allocated.
    pub fn declare(&mut self, scope: ScopeId, symbol: Symbol<'a>) -> Result<SymbolId, SymbolId> {
        if let Some(existing) = self.scope(scope).find(symbol.name) {
            return Err(existing);
        }
        let name = symbol.name;
        let id = self.add_symbol(symbol);
        self.scope_mut(scope).insert(name, id)?;
        Ok(id)
    }

    /// Declare an imported name in `scope`'s other list.
    pub fn declare_other(
        &mut self,
        scope: ScopeId,
        symbol: Symbol<'a>,
    ) -> Result<SymbolId, SymbolId> {
        if let Some(existing) = self.scope(scope).find(symbol.name) {
            return Err(existing);
        }
        let name = symbol.name;
        let id = self.add_symbol(symbol);
        self.scope_mut(scope).insert_other(name, id)?;
        Ok(id)
    }

    /// Walk `scope` and its ancestors. The builtin scope is the last
    /// ancestor of every scope, so builtins are found last.
    pub fn lookup(&self, scope: ScopeId, name: Ident) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.scope(id);
            if let Some(symbol) = scope.find(name) {
                return Some(symbol);
            }
            current = scope.parent;
        }
        None
    }

    /// Qualified lookup: `scope`'s own symbols, then its imports. Never
    /// walks to the parent.
    pub fn lookup_through_dot(&self, scope: ScopeId, name: Ident) -> Option<SymbolId> {
        self.scope(scope).find(name)
    }

    /// Follow `ValueAlias` redirections.
    pub fn resolve_alias(&self, mut symbol: SymbolId) -> SymbolId {
        let mut seen = 0;
        while let Decl::ValueAlias { target, .. } = self.symbol(symbol).decl {
            symbol = target;
            seen += 1;
            if seen > self.symbols.len() {
                break;
            }
        }
        symbol
    }

    /// Whether `inner` is `outer` or nested inside it.
    pub fn scope_is_within(&self, inner: ScopeId, outer: ScopeId) -> bool {
        let mut current = Some(inner);
        while let Some(id) = current {
            if id == outer {
                return true;
            }
            current = self.scope(id).parent;
        }
        false
    }

    /// The function owning the innermost function scope around `scope`.
    pub fn enclosing_function(&self, scope: ScopeId) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.scope(id);
            if scope.kind == ScopeKind::Function {
                return scope.owner;
            }
            current = scope.parent;
        }
        None
    }

    // ------------------------------------------------------------------
    // Declaration accessors
    // ------------------------------------------------------------------

    pub fn function(&self, id: SymbolId) -> Option<&FunctionDecl<'a>> {
        match &self.symbol(id).decl {
            Decl::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn function_mut(&mut self, id: SymbolId) -> Option<&mut FunctionDecl<'a>> {
        match &mut self.symbol_mut(id).decl {
            Decl::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Struct or union payload.
    pub fn struct_decl(&self, id: SymbolId) -> Option<&StructDecl> {
        match &self.symbol(id).decl {
            Decl::Struct(decl) | Decl::Union(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn struct_decl_mut(&mut self, id: SymbolId) -> Option<&mut StructDecl> {
        match &mut self.symbol_mut(id).decl {
            Decl::Struct(decl) | Decl::Union(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn template(&self, id: SymbolId) -> Option<&TemplateDecl<'a>> {
        match &self.symbol(id).decl {
            Decl::Template(template) => Some(template),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Type queries
    // ------------------------------------------------------------------

    /// The declaration behind a direct type.
    pub fn type_decl(&self, ty: TypeId) -> Option<&Decl<'a>> {
        self.types.symbol(ty).map(|symbol| &self.symbol(symbol).decl)
    }

    pub fn builtin(&self, ty: TypeId) -> Option<Builtin> {
        match self.type_decl(ty) {
            Some(Decl::Builtin(builtin)) => Some(*builtin),
            _ => None,
        }
    }

    pub fn scalar(&self, ty: TypeId) -> Option<Scalar> {
        match self.builtin(ty) {
            Some(Builtin::Scalar(scalar)) => Some(scalar),
            _ => None,
        }
    }

    pub fn is_void(&self, ty: TypeId) -> bool {
        ty == self.builtins.void
    }

    pub fn is_integral(&self, ty: TypeId) -> bool {
        matches!(self.scalar(ty), Some(Scalar::Int { .. }))
    }

    pub fn is_numeric(&self, ty: TypeId) -> bool {
        matches!(self.scalar(ty), Some(Scalar::Int { .. } | Scalar::Float { .. }))
    }

    pub fn is_enum(&self, ty: TypeId) -> bool {
        matches!(self.type_decl(ty), Some(Decl::Enum(_)))
    }

    pub fn is_function(&self, ty: TypeId) -> bool {
        matches!(self.type_decl(ty), Some(Decl::Function(_)))
    }

    /// Struct-like: structs, unions and arrays.
    pub fn is_aggregate(&self, ty: TypeId) -> bool {
        matches!(
            self.type_decl(ty),
            Some(Decl::Struct(_) | Decl::Union(_) | Decl::Array(_))
        )
    }

    pub fn struct_kind(&self, ty: TypeId) -> Option<StructKind> {
        match self.type_decl(ty) {
            Some(Decl::Struct(decl)) => Some(decl.kind),
            _ => None,
        }
    }

    /// The struct a value of type `ty` gives member access to, looking
    /// through one pointer or reference.
    pub fn member_struct(&self, ty: TypeId) -> Option<SymbolId> {
        let direct = self.types.pointee(ty).unwrap_or(ty);
        let symbol = self.types.symbol(direct)?;
        match &self.symbol(symbol).decl {
            Decl::Struct(_) | Decl::Union(_) | Decl::Enum(_) => Some(symbol),
            _ => None,
        }
    }

    /// The pointer-width integer of the given signedness.
    pub fn pointer_int(&self, signed: bool) -> TypeId {
        self.builtins.int(self.pointer_width, signed)
    }

    pub fn size_of(&self, ty: TypeId) -> u64 {
        self.layout(ty).0
    }

    pub fn align_of(&self, ty: TypeId) -> u64 {
        self.layout(ty).1
    }

    /// `(size, alignment)` in bytes.
    fn layout(&self, ty: TypeId) -> (u64, u64) {
        let pointer = u64::from(self.pointer_width / 8);
        match self.types.kind(ty) {
            TypeKind::Unknown => (0, 1),
            TypeKind::Pointer(_) | TypeKind::Reference(_) => (pointer, pointer),
            TypeKind::Direct(symbol) => match &self.symbol(symbol).decl {
                Decl::Builtin(Builtin::Void | Builtin::Null) => (0, 1),
                Decl::Builtin(Builtin::Scalar(scalar)) => {
                    let size = u64::from(scalar.bits() / 8);
                    (size, size)
                }
                Decl::Builtin(Builtin::Packed { element, lanes }) => {
                    let size = u64::from(element.bits() / 8) * u64::from(*lanes);
                    (size, size)
                }
                Decl::Struct(decl) => {
                    let mut size: u64 = 0;
                    let mut align: u64 = 1;
                    for field in &decl.fields {
                        let (field_size, field_align) = self.field_layout(*field);
                        size = size.div_ceil(field_align) * field_align + field_size;
                        align = align.max(field_align);
                    }
                    (size.div_ceil(align) * align, align)
                }
                Decl::Union(decl) => {
                    let (size, align) = decl
                        .fields
                        .iter()
                        .map(|field| self.field_layout(*field))
                        .fold((0u64, 1u64), |(size, align), (s, a)| (size.max(s), align.max(a)));
                    (size.div_ceil(align) * align, align)
                }
                Decl::Array(array) => {
                    let (size, align) = self.layout(array.element);
                    (size * array.length, align)
                }
                Decl::Enum(decl) => self.layout(decl.base),
                Decl::Function(_) => (pointer, pointer),
                _ => (0, 1),
            },
        }
    }

    fn field_layout(&self, field: SymbolId) -> (u64, u64) {
        match &self.symbol(field).decl {
            Decl::Field(field) => self.layout(field.ty),
            _ => (0, 1),
        }
    }

    /// Human-readable type name for diagnostics.
    pub fn type_name(&self, ty: TypeId, idents: &IdentTable) -> String {
        match self.types.kind(ty) {
            TypeKind::Unknown => "<unknown>".to_string(),
            TypeKind::Pointer(inner) => format!("{}*", self.type_name(inner, idents)),
            TypeKind::Reference(inner) => format!("{}&", self.type_name(inner, idents)),
            TypeKind::Direct(symbol) => match &self.symbol(symbol).decl {
                Decl::Array(array) => {
                    format!("{}[{}]", self.type_name(array.element, idents), array.length)
                }
                Decl::Struct(decl) if decl.kind == StructKind::Tuple => {
                    let fields = decl
                        .fields
                        .iter()
                        .filter_map(|field| self.symbol(*field).decl.value_type())
                        .map(|ty| self.type_name(ty, idents))
                        .collect::<Vec<_>>();
                    format!("({})", fields.join(", "))
                }
                _ => idents.resolve(self.symbol(symbol).name).to_string(),
            },
        }
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// Visit every node reachable from `roots`, including the bodies of
    /// called functions and functions referenced by value. Each node is
    /// visited once.
    pub fn walk(&self, roots: &[NodeId], mut visit: impl FnMut(NodeId, &Node)) {
        let mut stack: Vec<NodeId> = roots.iter().rev().copied().collect();
        let mut seen_nodes = FxHashSet::default();
        let mut seen_functions = FxHashSet::default();
        while let Some(id) = stack.pop() {
            if !seen_nodes.insert(id) {
                continue;
            }
            let node = self.node(id);
            visit(id, node);
            for symbol in node.kind.symbols() {
                self.push_function_body(symbol, &mut seen_functions, &mut stack);
            }
            if let NodeKind::ValueName { symbol, .. } = node.kind {
                self.push_function_body(symbol, &mut seen_functions, &mut stack);
            }
            if let Some(symbol) = self.types.base_symbol(node.ty) {
                // Methods of reachable structs, such as generator steps.
                if let Some(decl) = self.struct_decl(symbol) {
                    if let Some(method) = decl.method {
                        self.push_function_body(method, &mut seen_functions, &mut stack);
                    }
                }
            }
            for child in node.kind.children().into_iter().rev() {
                stack.push(child);
            }
        }
    }

    fn push_function_body(
        &self,
        symbol: SymbolId,
        seen: &mut FxHashSet<SymbolId>,
        stack: &mut Vec<NodeId>,
    ) {
        if let Some(function) = self.function(symbol) {
            if seen.insert(symbol) {
                stack.extend(function.body.iter().rev().copied());
            }
        }
    }
}
