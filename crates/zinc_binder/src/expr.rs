//! Expression binding.
//!
//! A name or member access can denote a value, a type, a module or
//! something callable; `bind_operand` returns whichever it found and the
//! context decides what is acceptable. Values that end up where a type is
//! expected (and the other way round) are diagnosed here.

use zinc_core::intern::Ident;
use zinc_core::text::SourcePos;
use zinc_diagnostics::messages;
use zinc_syntax::{Argument, CastSyntax, IntSuffix, Modifiers, SyntaxKind, SyntaxRef};

use crate::binder::Binder;
use crate::cast::CastIntent;
use crate::node::{ConstValue, NodeId, NodeKind};
use crate::scope::{Scope, ScopeKind};
use crate::symbol::*;
use crate::template::{ArgValue, CallArg, TemplateSyntax};
use crate::types::TypeId;

/// What an expression denotes.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Operand {
    Value(NodeId),
    Type(TypeId),
    Module(SymbolId),
    /// A template, overload set or concrete function that has not been
    /// called yet. `receiver` is the value written before `.`.
    Callable {
        symbol: SymbolId,
        receiver: Option<NodeId>,
    },
}

/// The smallest signed integer type holding `value`; values beyond
/// `Int64` are `UInt64`.
fn literal_int_type(value: i128) -> (u16, bool) {
    if i8::try_from(value).is_ok() {
        (8, true)
    } else if i16::try_from(value).is_ok() {
        (16, true)
    } else if i32::try_from(value).is_ok() {
        (32, true)
    } else if i64::try_from(value).is_ok() {
        (64, true)
    } else {
        (64, false)
    }
}

fn suffix_shape(suffix: IntSuffix) -> (u16, bool) {
    match suffix {
        IntSuffix::I8 => (8, true),
        IntSuffix::I16 => (16, true),
        IntSuffix::I32 => (32, true),
        IntSuffix::I64 => (64, true),
        IntSuffix::U8 => (8, false),
        IntSuffix::U16 => (16, false),
        IntSuffix::U32 => (32, false),
        IntSuffix::U64 => (64, false),
    }
}

impl<'a> Binder<'a> {
    // ========================================================================
    // Operands
    // ========================================================================

    pub(crate) fn bind_operand(&mut self, syntax: SyntaxRef<'a>) -> Option<Operand> {
        let pos = syntax.pos;
        match &syntax.kind {
            SyntaxKind::Name(name) => {
                let Some(symbol) = self.program.lookup(self.current_scope(), *name) else {
                    let text = self.text(*name);
                    self.error(pos, &messages::CANNOT_FIND_NAME_0, &[&text]);
                    return None;
                };
                self.resolve_symbol(symbol, pos)
            }
            SyntaxKind::Dot { base, member } => self.bind_dot(pos, base, *member),
            SyntaxKind::PointerType(inner) => {
                let inner = self.bind_type(inner)?;
                Some(Operand::Type(self.program.types.pointer(inner)))
            }
            SyntaxKind::ReferenceType(inner) => {
                let inner = self.bind_type(inner)?;
                Some(Operand::Type(self.program.types.reference(inner)))
            }
            SyntaxKind::ArrayType { element, length } => {
                let element = self.bind_type(element)?;
                let length = self.array_length(length)?;
                Some(Operand::Type(self.array_type(element, length)))
            }
            SyntaxKind::Call { callee, args, with } => self.bind_call(pos, callee, args, *with),
            _ => self.bind_node(syntax).map(Operand::Value),
        }
    }

    /// What a declared symbol denotes at a use site. Aliases are followed;
    /// constants produce a fresh literal.
    pub(crate) fn resolve_symbol(&mut self, symbol: SymbolId, pos: SourcePos) -> Option<Operand> {
        let symbol = self.program.resolve_alias(symbol);
        let operand = match &self.program.symbol(symbol).decl {
            decl if decl.is_type() => Operand::Type(self.program.types.direct(symbol)),
            Decl::TypeAlias { ty, .. } => Operand::Type(*ty),
            Decl::ConstAlias { value, .. } => {
                let value = *value;
                let constant = self.const_value(value)?;
                let node = self.program.node(value);
                let (ty, adaptable) = match node.kind {
                    NodeKind::Literal { adaptable, .. } => (node.ty, adaptable),
                    _ => (node.ty, false),
                };
                let node = self.add_node(
                    pos,
                    ty,
                    NodeKind::Literal {
                        value: constant,
                        adaptable,
                    },
                );
                Operand::Value(node)
            }
            Decl::Module(_) => Operand::Module(symbol),
            Decl::Template(_) | Decl::OverloadSet(_) | Decl::Function(_) => Operand::Callable {
                symbol,
                receiver: None,
            },
            Decl::Parameter { .. } | Decl::Local { .. } | Decl::Global { .. } | Decl::Field(_) => {
                Operand::Value(self.reference(symbol, pos)?)
            }
            _ => {
                let text = self.symbol_name(symbol);
                self.error(pos, &messages::NAME_0_IS_NOT_A_VALUE, &[&text]);
                return None;
            }
        };
        Some(operand)
    }

    /// Turn a bare struct template into its parameterless instance.
    pub(crate) fn settle(&mut self, operand: Operand, pos: SourcePos) -> Option<Operand> {
        let Operand::Callable {
            symbol,
            receiver: None,
        } = operand
        else {
            return Some(operand);
        };
        if !self.is_struct_template(symbol) {
            return Some(operand);
        }
        let chosen = self.select_template(symbol, 0, false, pos)?;
        let instance = self.instantiate_struct(chosen, &[], pos)?;
        Some(Operand::Type(self.program.types.direct(instance)))
    }

    fn is_struct_template(&self, symbol: SymbolId) -> bool {
        let first = match &self.program.symbol(symbol).decl {
            Decl::OverloadSet(list) => list.first().copied(),
            Decl::Template(_) => Some(symbol),
            _ => None,
        };
        first
            .and_then(|first| self.program.template(first))
            .is_some_and(|template| matches!(template.syntax, TemplateSyntax::Struct(_)))
    }

    /// Bind an expression in statement position. `Void` results are fine.
    pub(crate) fn bind_expression(&mut self, syntax: SyntaxRef<'a>) -> Option<NodeId> {
        let operand = self.bind_operand(syntax)?;
        let operand = self.settle(operand, syntax.pos)?;
        self.operand_node(operand, syntax.pos)
    }

    fn operand_node(&mut self, operand: Operand, pos: SourcePos) -> Option<NodeId> {
        match operand {
            Operand::Value(node) => Some(node),
            Operand::Type(ty) => {
                let text = self.type_name(ty);
                self.error(pos, &messages::EXPECTED_VALUE_FOUND_TYPE_0, &[&text]);
                None
            }
            Operand::Module(module) => {
                let text = self.symbol_name(module);
                self.error(pos, &messages::MODULE_IS_NOT_A_VALUE_0, &[&text]);
                None
            }
            Operand::Callable { symbol, receiver } => self.function_value(symbol, receiver, pos),
        }
    }

    /// A function used as a value. Templates qualify only when they take
    /// no arguments.
    fn function_value(
        &mut self,
        symbol: SymbolId,
        receiver: Option<NodeId>,
        pos: SourcePos,
    ) -> Option<NodeId> {
        let function = match &self.program.symbol(symbol).decl {
            Decl::Function(_) if receiver.is_none() => Some(symbol),
            Decl::Template(template)
                if receiver.is_none()
                    && template.arity.required == 0
                    && !template.arity.receiver
                    && template.function_kind == zinc_syntax::FunctionKind::Plain =>
            {
                self.instantiate_function(symbol, &[], pos).map(|(instance, _)| instance)
            }
            _ => {
                let text = self.symbol_name(symbol);
                self.error(pos, &messages::GENERIC_NEEDS_ARGUMENTS_0, &[&text]);
                return None;
            }
        }?;
        let ty = self.program.types.direct(function);
        Some(self.add_node(
            pos,
            ty,
            NodeKind::ValueName {
                symbol: function,
                captures: Vec::new(),
            },
        ))
    }

    /// Bind an expression that must produce a value.
    pub(crate) fn bind_value(&mut self, syntax: SyntaxRef<'a>) -> Option<NodeId> {
        let node = self.bind_expression(syntax)?;
        let ty = self.program.node(node).ty;
        if self.program.is_void(ty) {
            self.error(syntax.pos, &messages::VOID_HAS_NO_VALUE, &[]);
            return None;
        }
        Some(node)
    }

    /// Read through a reference.
    pub(crate) fn read(&mut self, node: NodeId) -> NodeId {
        let (pos, ty) = {
            let node = self.program.node(node);
            (node.pos, node.ty)
        };
        match self.program.types.pointee(ty) {
            Some(pointee) if self.program.types.is_reference(ty) => {
                self.add_node(pos, pointee, NodeKind::Dereference(node))
            }
            _ => node,
        }
    }

    pub(crate) fn bind_condition(&mut self, syntax: SyntaxRef<'a>) -> Option<NodeId> {
        let node = self.bind_value(syntax)?;
        let node = self.read(node);
        let bool_ty = self.program.builtins.bool;
        self.cast(node, bool_ty, CastIntent::Implicit)
    }

    pub(crate) fn bind_type(&mut self, syntax: SyntaxRef<'a>) -> Option<TypeId> {
        let operand = self.bind_operand(syntax)?;
        match self.settle(operand, syntax.pos)? {
            Operand::Type(ty) => Some(ty),
            Operand::Value(_) => {
                self.error(syntax.pos, &messages::EXPECTED_TYPE_FOUND_VALUE, &[]);
                None
            }
            Operand::Module(symbol) | Operand::Callable { symbol, .. } => {
                let text = self.symbol_name(symbol);
                self.error(syntax.pos, &messages::NAME_0_IS_NOT_A_TYPE, &[&text]);
                None
            }
        }
    }

    /// The type an untyped definition of `node` gets: small integer
    /// literals are promoted to `Int32`.
    pub(crate) fn promoted_literal_type(&self, node: NodeId) -> TypeId {
        let node = self.program.node(node);
        let adaptable = matches!(node.kind, NodeKind::Literal { adaptable: true, .. });
        match self.program.scalar(node.ty) {
            Some(Scalar::Int { bits, .. }) if adaptable && bits < 32 => self.program.builtins.int32,
            _ => node.ty,
        }
    }

    // ========================================================================
    // Arrays and tuples
    // ========================================================================

    fn array_length(&mut self, syntax: SyntaxRef<'a>) -> Option<u64> {
        let node = self.bind_value(syntax)?;
        let value = self.const_value(node);
        match value.and_then(ConstValue::as_int) {
            Some(length) if length > 0 && self.program.is_integral(self.program.node(node).ty) => {
                u64::try_from(length).ok()
            }
            _ => {
                let text = value.map_or_else(|| "<non-constant>".to_string(), |v| v.to_string());
                self.error(syntax.pos, &messages::ARRAY_LENGTH_0, &[&text]);
                None
            }
        }
    }

    /// `T[N]`, created once per element type and length.
    pub(crate) fn array_type(&mut self, element: TypeId, length: u64) -> TypeId {
        if let Some(&symbol) = self.program.arrays.get(&(element, length)) {
            return self.program.types.direct(symbol);
        }
        let name = format!("{}[{}]", self.type_name(element), length);
        let name = self.idents.intern(&name);
        let root = self.program.root_scope;
        let symbol = self.program.add_symbol(Symbol::new(
            name,
            root,
            SourcePos::synthetic(),
            Decl::Array(ArrayDecl { element, length }),
        ));
        self.program.arrays.insert((element, length), symbol);
        self.program.types.direct(symbol)
    }

    /// The tuple struct with the given field types, created once per type
    /// list. Fields are named `_0`, `_1`, and so on.
    pub(crate) fn tuple_type(&mut self, fields: Vec<TypeId>) -> SymbolId {
        if let Some(&symbol) = self.program.tuples.get(&fields) {
            return symbol;
        }
        let root = self.program.root_scope;
        let pos = SourcePos::synthetic();
        let scope = self
            .program
            .add_scope(Scope::new(ScopeKind::Struct, Some(root), None));
        let name = self.idents.generate("tuple");
        let symbol = self.program.add_symbol(
            Symbol::new(name, root, pos, Decl::Struct(StructDecl::new(StructKind::Tuple, None)))
                .with_scope(scope),
        );
        self.program.scope_mut(scope).owner = Some(symbol);
        let mut ids = Vec::with_capacity(fields.len());
        for (index, ty) in fields.iter().enumerate() {
            let name = self.idents.intern(&format!("_{}", index));
            let decl = Decl::Field(FieldDecl {
                ty: *ty,
                owner: symbol,
                index,
                kind: FieldKind::Ordinary,
                default: None,
            });
            if let Ok(field) = self.program.declare(scope, Symbol::new(name, scope, pos, decl)) {
                ids.push(field);
            }
        }
        if let Some(decl) = self.program.struct_decl_mut(symbol) {
            decl.fields = ids;
        }
        self.program.tuples.insert(fields, symbol);
        symbol
    }

    /// Build a tuple value from already bound elements.
    pub(crate) fn pack_tuple(&mut self, pos: SourcePos, values: Vec<NodeId>) -> Option<NodeId> {
        let mut elements = Vec::with_capacity(values.len());
        for value in values {
            let value = self.read(value);
            let ty = self.promoted_literal_type(value);
            elements.push(self.cast(value, ty, CastIntent::Implicit)?);
        }
        let types = elements.iter().map(|node| self.program.node(*node).ty).collect();
        let tuple = self.tuple_type(types);
        let fields = self
            .program
            .struct_decl(tuple)
            .map(|decl| decl.fields.clone())
            .unwrap_or_default();
        let ty = self.program.types.direct(tuple);
        Some(self.add_node(
            pos,
            ty,
            NodeKind::Initializer {
                fields: fields.into_iter().zip(elements).collect(),
            },
        ))
    }

    // ========================================================================
    // Member access
    // ========================================================================

    fn bind_dot(&mut self, pos: SourcePos, base: SyntaxRef<'a>, member: Ident) -> Option<Operand> {
        let operand = self.bind_operand(base)?;
        let operand = self.settle(operand, base.pos)?;
        let text = self.text(member);
        match operand {
            Operand::Module(module) => {
                let scope = self.module_scope(module)?;
                match self.program.lookup_through_dot(scope, member) {
                    Some(symbol) => self.resolve_symbol(symbol, pos),
                    None => {
                        let owner = self.symbol_name(module);
                        self.error(pos, &messages::NO_MEMBER_0_IN_1, &[&text, &owner]);
                        None
                    }
                }
            }
            Operand::Type(ty) => {
                let found = self
                    .program
                    .types
                    .symbol(ty)
                    .and_then(|symbol| self.program.symbol(symbol).own_scope)
                    .and_then(|scope| self.program.lookup_through_dot(scope, member));
                match found {
                    Some(symbol) if self.program.symbol(symbol).decl.value_type().is_none()
                        || matches!(self.program.symbol(symbol).decl, Decl::Global { .. }) =>
                    {
                        self.resolve_symbol(symbol, pos)
                    }
                    _ => {
                        let owner = self.type_name(ty);
                        self.error(pos, &messages::NO_MEMBER_0_IN_1, &[&text, &owner]);
                        None
                    }
                }
            }
            Operand::Callable { symbol, .. } => {
                let name = self.symbol_name(symbol);
                self.error(base.pos, &messages::GENERIC_NEEDS_ARGUMENTS_0, &[&name]);
                None
            }
            Operand::Value(node) => self.bind_member(pos, node, member),
        }
    }

    fn bind_member(&mut self, pos: SourcePos, value: NodeId, member: Ident) -> Option<Operand> {
        let ty = self.program.node(value).ty;
        let found = self
            .program
            .member_struct(ty)
            .and_then(|owner| self.program.symbol(owner).own_scope)
            .and_then(|scope| self.program.lookup_through_dot(scope, member));
        if let Some(symbol) = found {
            let symbol = self.program.resolve_alias(symbol);
            return match &self.program.symbol(symbol).decl {
                Decl::Field(field) => {
                    let field_ty = field.ty;
                    let object = self.object(value);
                    Some(Operand::Value(self.add_node(
                        pos,
                        field_ty,
                        NodeKind::FieldName {
                            base: object,
                            field: symbol,
                        },
                    )))
                }
                Decl::Template(_) | Decl::OverloadSet(_) | Decl::Function(_) => {
                    Some(Operand::Callable {
                        symbol,
                        receiver: Some(value),
                    })
                }
                _ => self.resolve_symbol(symbol, pos),
            };
        }

        // `x.f(...)` calls a free function `f` with `x` first.
        let free = self
            .program
            .lookup(self.current_scope(), member)
            .map(|symbol| self.program.resolve_alias(symbol))
            .filter(|symbol| {
                matches!(
                    self.program.symbol(*symbol).decl,
                    Decl::Template(_) | Decl::OverloadSet(_) | Decl::Function(_)
                )
            });
        match free {
            Some(symbol) => Some(Operand::Callable {
                symbol,
                receiver: Some(value),
            }),
            None => {
                let text = self.text(member);
                let owner = self.type_name(ty);
                self.error(pos, &messages::NO_MEMBER_0_IN_1, &[&text, &owner]);
                None
            }
        }
    }

    /// The storage of a struct value, looking through one pointer or
    /// reference.
    fn object(&mut self, value: NodeId) -> NodeId {
        let value = self.read(value);
        let (pos, ty) = {
            let node = self.program.node(value);
            (node.pos, node.ty)
        };
        match self.program.types.pointee(ty) {
            Some(pointee) => self.add_node(pos, pointee, NodeKind::Dereference(value)),
            None => value,
        }
    }

    // ========================================================================
    // Calls
    // ========================================================================

    fn bind_call(
        &mut self,
        pos: SourcePos,
        callee: SyntaxRef<'a>,
        args: &'a [Argument<'a>],
        with: Option<SyntaxRef<'a>>,
    ) -> Option<Operand> {
        let callee = self.bind_operand(callee)?;
        let args = self.bind_arguments(args, with)?;
        match callee {
            Operand::Callable { symbol, receiver } => self.call_symbol(symbol, receiver, args, pos),
            Operand::Type(ty) if args.is_empty() => Some(Operand::Type(ty)),
            Operand::Type(_) => {
                self.error(pos, &messages::UNIMPLEMENTED_0, &["Calling a type with arguments"]);
                None
            }
            Operand::Module(module) => {
                let text = self.symbol_name(module);
                self.error(pos, &messages::MODULE_IS_NOT_A_VALUE_0, &[&text]);
                None
            }
            Operand::Value(node) => self.call_value(node, args, pos).map(Operand::Value),
        }
    }

    /// Bind every argument, so all errors are reported, then give up if
    /// any failed.
    fn bind_arguments(
        &mut self,
        args: &'a [Argument<'a>],
        with: Option<SyntaxRef<'a>>,
    ) -> Option<Vec<CallArg>> {
        let mut bound = Vec::with_capacity(args.len() + usize::from(with.is_some()));
        let mut ok = true;
        let trailing = with.map(|value| (value.pos, None, value));
        let all = args
            .iter()
            .map(|arg| (arg.pos, arg.name, arg.value))
            .chain(trailing);
        for (pos, name, value) in all {
            match self.bind_argument(value) {
                Some(value) => bound.push(CallArg { pos, name, value }),
                None => ok = false,
            }
        }
        ok.then_some(bound)
    }

    pub(crate) fn bind_argument(&mut self, syntax: SyntaxRef<'a>) -> Option<ArgValue> {
        let operand = self.bind_operand(syntax)?;
        match self.settle(operand, syntax.pos)? {
            Operand::Type(ty) => Some(ArgValue::Type(ty)),
            operand => {
                let node = self.operand_node(operand, syntax.pos)?;
                if self.program.is_void(self.program.node(node).ty) {
                    self.error(syntax.pos, &messages::VOID_HAS_NO_VALUE, &[]);
                    return None;
                }
                Some(ArgValue::Value(node))
            }
        }
    }

    /// Call a named function, template or overload set.
    pub(crate) fn call_symbol(
        &mut self,
        symbol: SymbolId,
        receiver: Option<NodeId>,
        mut args: Vec<CallArg>,
        pos: SourcePos,
    ) -> Option<Operand> {
        if matches!(self.program.symbol(symbol).decl, Decl::Function(_)) {
            return self.call_function(symbol, receiver, args, pos).map(Operand::Value);
        }
        let chosen = self.select_template(symbol, args.len(), receiver.is_some(), pos)?;
        let (syntax, arity, function_kind, owner) = {
            let template = self.program.template(chosen)?;
            (template.syntax, template.arity, template.function_kind, template.owner)
        };
        if let TemplateSyntax::Struct(_) = syntax {
            let instance = self.instantiate_struct(chosen, &args, pos)?;
            return Some(Operand::Type(self.program.types.direct(instance)));
        }

        let this = match (arity.receiver, owner) {
            (true, Some(owner)) => Some(match receiver {
                Some(value) => self.receiver_pointer(value, owner)?,
                None => self.implicit_this(owner, pos)?,
            }),
            _ => {
                if let Some(value) = receiver {
                    let arg_pos = self.program.node(value).pos;
                    args.insert(
                        0,
                        CallArg {
                            pos: arg_pos,
                            name: None,
                            value: ArgValue::Value(value),
                        },
                    );
                }
                None
            }
        };

        if function_kind == zinc_syntax::FunctionKind::Generator {
            if this.is_some() {
                self.error(pos, &messages::UNIMPLEMENTED_0, &["A generator method"]);
                return None;
            }
            return self.call_generator(chosen, &args, pos).map(Operand::Value);
        }
        let (instance, mut values) = self.instantiate_function(chosen, &args, pos)?;
        if let Some(this) = this {
            values.insert(0, this);
        }
        self.call_node(instance, values, pos).map(Operand::Value)
    }

    /// Call a concrete function: extern functions and synthesized methods.
    /// Arguments are positional and must match the parameter count.
    pub(crate) fn call_function(
        &mut self,
        function: SymbolId,
        receiver: Option<NodeId>,
        mut args: Vec<CallArg>,
        pos: SourcePos,
    ) -> Option<NodeId> {
        let (params, has_receiver, owner) = {
            let decl = self.program.function(function)?;
            (decl.params.clone(), decl.receiver.is_some(), decl.owner)
        };
        let name = self.symbol_name(function);
        let mut values = Vec::with_capacity(params.len());
        match (has_receiver, owner) {
            (true, Some(owner)) => values.push(match receiver {
                Some(value) => self.receiver_pointer(value, owner)?,
                None => self.implicit_this(owner, pos)?,
            }),
            _ => {
                if let Some(value) = receiver {
                    let arg_pos = self.program.node(value).pos;
                    args.insert(
                        0,
                        CallArg {
                            pos: arg_pos,
                            name: None,
                            value: ArgValue::Value(value),
                        },
                    );
                }
            }
        }
        if let Some(named) = args.iter().find_map(|arg| arg.name) {
            let text = self.text(named);
            self.error(pos, &messages::NO_PARAMETER_NAMED_0_IN_1, &[&text, &name]);
            return None;
        }
        let explicit = &params[values.len()..];
        if explicit.len() != args.len() {
            let count = args.len().to_string();
            self.error(pos, &messages::NO_DECLARATION_OF_0_ACCEPTS_1_ARGUMENTS, &[&name, &count]);
            return None;
        }
        for (param, arg) in explicit.iter().zip(args) {
            let ty = self.program.symbol(*param).decl.value_type()?;
            let value = self.expect_value(arg)?;
            values.push(self.cast(value, ty, CastIntent::Implicit)?);
        }
        self.call_node(function, values, pos)
    }

    pub(crate) fn call_node(&mut self, function: SymbolId, args: Vec<NodeId>, pos: SourcePos) -> Option<NodeId> {
        let Some(ret) = self.program.function(function)?.ret else {
            let text = self.symbol_name(function);
            self.error(pos, &messages::USED_BEFORE_RETURN_TYPE_INFERRED_0, &[&text]);
            return None;
        };
        if self.program.types.is_unknown(ret) {
            return None;
        }
        Some(self.add_node(pos, ret, NodeKind::Call { function, args }))
    }

    /// A `this` argument for a method of `owner`: the address of a struct
    /// value, or a pointer to one.
    pub(crate) fn receiver_pointer(&mut self, value: NodeId, owner: SymbolId) -> Option<NodeId> {
        let owner_ty = self.program.types.direct(owner);
        let pointer = self.program.types.pointer(owner_ty);
        let value = self.read(value);
        let (pos, ty) = {
            let node = self.program.node(value);
            (node.pos, node.ty)
        };
        if ty == owner_ty {
            return Some(self.add_node(pos, pointer, NodeKind::AddressOf(value)));
        }
        self.cast(value, pointer, CastIntent::Implicit)
    }

    /// `this` of the method being bound, for bare calls of sibling methods.
    fn implicit_this(&mut self, owner: SymbolId, pos: SourcePos) -> Option<NodeId> {
        match self.method_receiver(owner) {
            Some(this) => self.reference(this, pos),
            None => {
                let text = self.symbol_name(owner);
                self.error(pos, &messages::NAME_0_IS_NOT_A_VALUE, &[&text]);
                None
            }
        }
    }

    /// Call a value: a lambda, a function or a pointer to a function.
    fn call_value(&mut self, callee: NodeId, args: Vec<CallArg>, pos: SourcePos) -> Option<NodeId> {
        let callee = self.read(callee);
        let ty = self.program.node(callee).ty;
        if self.program.struct_kind(ty) == Some(StructKind::Lambda) {
            let method = self
                .program
                .types
                .symbol(ty)
                .and_then(|symbol| self.program.struct_decl(symbol))
                .and_then(|decl| decl.method)?;
            return self.call_function(method, Some(callee), args, pos);
        }

        let target = self.program.types.pointee(ty).unwrap_or(ty);
        let function = self
            .program
            .types
            .symbol(target)
            .filter(|_| self.program.is_function(target));
        let Some(function) = function else {
            let text = self.type_name(ty);
            self.error(pos, &messages::NOT_CALLABLE_0, &[&text]);
            return None;
        };
        let (params, ret) = {
            let decl = self.program.function(function)?;
            (decl.params.clone(), decl.ret)
        };
        let Some(ret) = ret else {
            let text = self.symbol_name(function);
            self.error(pos, &messages::USED_BEFORE_RETURN_TYPE_INFERRED_0, &[&text]);
            return None;
        };
        if self.program.types.is_unknown(ret) {
            return None;
        }
        if params.len() != args.len() || args.iter().any(|arg| arg.name.is_some()) {
            let text = self.symbol_name(function);
            let count = args.len().to_string();
            self.error(pos, &messages::NO_DECLARATION_OF_0_ACCEPTS_1_ARGUMENTS, &[&text, &count]);
            return None;
        }
        let mut values = Vec::with_capacity(args.len());
        for (param, arg) in params.iter().zip(args) {
            let param_ty = self.program.symbol(*param).decl.value_type()?;
            let value = self.expect_value(arg)?;
            values.push(self.cast(value, param_ty, CastIntent::Implicit)?);
        }
        Some(self.add_node(
            pos,
            ret,
            NodeKind::CallIndirect {
                callee,
                args: values,
            },
        ))
    }

    // ========================================================================
    // Everything else
    // ========================================================================

    /// Expressions that always produce a node.
    fn bind_node(&mut self, syntax: SyntaxRef<'a>) -> Option<NodeId> {
        let pos = syntax.pos;
        match &syntax.kind {
            SyntaxKind::IntLiteral { value, suffix } => Some(self.int_literal(pos, *value, *suffix)),
            SyntaxKind::FloatLiteral { value, single } => {
                let ty = if *single {
                    self.program.builtins.float
                } else {
                    self.program.builtins.double
                };
                let value = if *single { *value as f32 as f64 } else { *value };
                Some(self.add_node(
                    pos,
                    ty,
                    NodeKind::Literal {
                        value: ConstValue::Float(value),
                        adaptable: false,
                    },
                ))
            }
            SyntaxKind::BoolLiteral(value) => {
                let ty = self.program.builtins.bool;
                Some(self.add_node(
                    pos,
                    ty,
                    NodeKind::Literal {
                        value: ConstValue::Bool(*value),
                        adaptable: false,
                    },
                ))
            }
            SyntaxKind::NullLiteral => {
                let ty = self.program.builtins.null;
                Some(self.add_node(
                    pos,
                    ty,
                    NodeKind::Literal {
                        value: ConstValue::Null,
                        adaptable: false,
                    },
                ))
            }
            SyntaxKind::StringLiteral(text) => {
                let ty = self.program.types.pointer(self.program.builtins.uint8);
                Some(self.add_node(pos, ty, NodeKind::StringLiteral(text.to_string())))
            }
            SyntaxKind::Index { base, index } => self.bind_index(pos, base, index),
            SyntaxKind::Unary { op, operand } => self.bind_unary(pos, *op, operand),
            SyntaxKind::Binary { op, left, right } => self.bind_binary(pos, *op, left, right),
            SyntaxKind::Assign { op, target, value } => self.bind_assign(pos, *op, target, value),
            SyntaxKind::Ternary {
                cond,
                then,
                otherwise,
            } => self.bind_ternary(pos, cond, then, otherwise),
            SyntaxKind::Cast {
                value,
                target,
                kind,
            } => {
                let intent = match kind {
                    CastSyntax::As => CastIntent::Explicit,
                    CastSyntax::To => CastIntent::Implicit,
                };
                let value = self.bind_value(value);
                let ty = self.bind_type(target)?;
                let value = value?;
                let value = if self.program.types.is_reference(ty) {
                    value
                } else {
                    self.read(value)
                };
                self.cast(value, ty, intent)
            }
            SyntaxKind::Initializer { ty, fields } => self.bind_initializer(pos, ty, fields),
            SyntaxKind::Tuple(items) => {
                let mut values = Vec::with_capacity(items.len());
                for &item in items.iter() {
                    values.push(self.bind_value(item)?);
                }
                self.pack_tuple(pos, values)
            }
            SyntaxKind::SizeOf(target) => {
                let operand = self.bind_operand(target)?;
                let target = match self.settle(operand, target.pos)? {
                    Operand::Type(ty) => ty,
                    operand => {
                        let node = self.operand_node(operand, target.pos)?;
                        let ty = self.program.node(node).ty;
                        self.program.types.strip_reference(ty)
                    }
                };
                let size = self.program.size_of(target);
                let ty = self.program.builtins.uint64;
                Some(self.add_node(pos, ty, NodeKind::SizeOf { target, size }))
            }
            SyntaxKind::New { ty, count, args } => self.bind_new(pos, ty, *count, args),
            SyntaxKind::Delete(value) => self.bind_delete(pos, value),
            SyntaxKind::Atomic { op, target, value } => {
                let target_node = self.bind_value(target);
                let value = self.bind_value(value);
                let target_node = self.read(target_node?);
                let ty = self.program.node(target_node).ty;
                let pointee = self
                    .program
                    .types
                    .pointee(ty)
                    .filter(|pointee| self.program.is_integral(*pointee));
                let Some(pointee) = pointee else {
                    let text = self.type_name(ty);
                    self.error(target.pos, &messages::ATOMIC_TARGET_0, &[&text]);
                    return None;
                };
                let value = self.read(value?);
                let value = self.cast(value, pointee, CastIntent::Implicit)?;
                Some(self.add_node(
                    pos,
                    pointee,
                    NodeKind::Atomic {
                        op: *op,
                        target: target_node,
                        value,
                    },
                ))
            }
            SyntaxKind::Lambda(function) => self.bind_lambda(pos, function),
            SyntaxKind::Await(value) => {
                let is_async = self.frame().modifiers.contains(Modifiers::ASYNC)
                    || self
                        .current_function()
                        .and_then(|function| self.program.function(function))
                        .is_some_and(|function| function.is_async());
                if !is_async {
                    self.error(pos, &messages::AWAIT_OUTSIDE_ASYNC, &[]);
                    return None;
                }
                let value = self.bind_value(value)?;
                let value = self.read(value);
                let ty = self.program.node(value).ty;
                Some(self.add_node(pos, ty, NodeKind::Await(value)))
            }
            _ => self.bind_statement(syntax),
        }
    }

    fn int_literal(&mut self, pos: SourcePos, value: u64, suffix: Option<IntSuffix>) -> NodeId {
        let value = i128::from(value);
        let ((bits, signed), adaptable) = match suffix {
            Some(suffix) => (suffix_shape(suffix), false),
            None => (literal_int_type(value), true),
        };
        let ty = self.program.builtins.int(bits, signed);
        let value = crate::const_eval::wrap_int(value, bits, signed);
        self.add_node(
            pos,
            ty,
            NodeKind::Literal {
                value: ConstValue::Int(value),
                adaptable,
            },
        )
    }

    /// An unsuffixed integer literal negated at bind time, so `-5` stays an
    /// adaptable literal.
    pub(crate) fn negated_literal(&mut self, pos: SourcePos, node: NodeId) -> Option<NodeId> {
        let NodeKind::Literal {
            value: ConstValue::Int(value),
            adaptable: true,
        } = self.program.node(node).kind
        else {
            return None;
        };
        let value = -value;
        let (bits, signed) = literal_int_type(value);
        let ty = self.program.builtins.int(bits, signed);
        Some(self.add_node(
            pos,
            ty,
            NodeKind::Literal {
                value: ConstValue::Int(value),
                adaptable: true,
            },
        ))
    }

    fn bind_index(&mut self, pos: SourcePos, base: SyntaxRef<'a>, index: SyntaxRef<'a>) -> Option<NodeId> {
        let base_node = self.bind_value(base);
        let index = self.bind_value(index);
        let base_node = self.read(base_node?);
        let index = self.read(index?);
        let index = if self.program.is_integral(self.program.node(index).ty) {
            index
        } else {
            let ty = self.program.pointer_int(true);
            self.cast(index, ty, CastIntent::Implicit)?
        };
        let ty = self.program.node(base_node).ty;
        let element = match self.program.type_decl(ty) {
            Some(Decl::Array(array)) => Some(array.element),
            _ => self
                .program
                .types
                .pointee(ty)
                .filter(|pointee| !self.program.is_void(*pointee)),
        };
        let Some(element) = element else {
            let text = self.type_name(ty);
            self.error(base.pos, &messages::NOT_INDEXABLE_0, &[&text]);
            return None;
        };
        Some(self.add_node(
            pos,
            element,
            NodeKind::IndexName {
                base: base_node,
                index,
            },
        ))
    }

    fn bind_ternary(
        &mut self,
        pos: SourcePos,
        cond: SyntaxRef<'a>,
        then: SyntaxRef<'a>,
        otherwise: SyntaxRef<'a>,
    ) -> Option<NodeId> {
        let cond = self.bind_condition(cond);
        let then = self.bind_value(then);
        let otherwise = self.bind_value(otherwise);
        let (cond, then, otherwise) = (cond?, then?, otherwise?);
        let then = self.read(then);
        let otherwise = self.read(otherwise);
        let ty = self.upper_bound(then, otherwise, pos)?;
        let then = self.cast(then, ty, CastIntent::Implicit)?;
        let otherwise = self.cast(otherwise, ty, CastIntent::Implicit)?;
        let node = self.add_node(
            pos,
            ty,
            NodeKind::Ternary {
                cond,
                then,
                otherwise,
            },
        );
        self.fold(node, &[cond, then, otherwise])
    }

    fn bind_initializer(
        &mut self,
        pos: SourcePos,
        ty: SyntaxRef<'a>,
        fields: &'a [Argument<'a>],
    ) -> Option<NodeId> {
        let target = self.bind_type(ty)?;
        let Some((owner, decl_fields)) = self
            .program
            .types
            .symbol(target)
            .and_then(|symbol| self.program.struct_decl(symbol).map(|decl| (symbol, decl.fields.clone())))
        else {
            self.error(pos, &messages::UNIMPLEMENTED_0, &["An initializer for a non-struct type"]);
            return None;
        };
        let ordinary: Vec<SymbolId> = decl_fields
            .into_iter()
            .filter(|field| {
                matches!(&self.program.symbol(*field).decl, Decl::Field(field) if field.kind == FieldKind::Ordinary)
            })
            .collect();
        let owner_name = self.symbol_name(owner);

        let mut assigned: Vec<(SymbolId, NodeId)> = Vec::with_capacity(fields.len());
        let mut next = 0;
        let mut ok = true;
        for arg in fields {
            let field = match arg.name {
                Some(name) => ordinary
                    .iter()
                    .copied()
                    .find(|field| self.program.symbol(*field).name == name),
                None => {
                    next += 1;
                    ordinary.get(next - 1).copied()
                }
            };
            let Some(field) = field else {
                let text = arg.name.map_or_else(|| (next - 1).to_string(), |name| self.text(name));
                self.error(arg.pos, &messages::NO_FIELD_0_IN_1, &[&text, &owner_name]);
                ok = false;
                continue;
            };
            if assigned.iter().any(|(seen, _)| *seen == field) {
                let text = self.symbol_name(field);
                self.error(arg.pos, &messages::FIELD_INITIALIZED_TWICE_0, &[&text]);
                ok = false;
                continue;
            }
            let Some(field_ty) = self.program.symbol(field).decl.value_type() else {
                continue;
            };
            let value = self
                .bind_value(arg.value)
                .map(|value| self.read(value))
                .and_then(|value| self.cast(value, field_ty, CastIntent::Implicit));
            match value {
                Some(value) => assigned.push((field, value)),
                None => ok = false,
            }
        }
        if !ok {
            return None;
        }
        for field in ordinary {
            if assigned.iter().any(|(seen, _)| *seen == field) {
                continue;
            }
            if let Decl::Field(FieldDecl {
                default: Some(default),
                ..
            }) = self.program.symbol(field).decl
            {
                assigned.push((field, default));
            }
        }
        Some(self.add_node(pos, target, NodeKind::Initializer { fields: assigned }))
    }

    /// A method of the struct behind `ty` selected for `count` arguments.
    fn special_method(
        &mut self,
        ty: TypeId,
        name: Ident,
        args: &[CallArg],
        pos: SourcePos,
    ) -> Option<Option<(SymbolId, Vec<NodeId>)>> {
        let found = self
            .program
            .types
            .symbol(ty)
            .and_then(|symbol| self.program.struct_decl(symbol).map(|_| symbol))
            .and_then(|symbol| self.program.symbol(symbol).own_scope)
            .and_then(|scope| self.program.lookup_through_dot(scope, name));
        let Some(symbol) = found else {
            return Some(None);
        };
        let chosen = self.select_template(symbol, args.len(), true, pos)?;
        self.instantiate_function(chosen, args, pos).map(Some)
    }

    fn bind_new(
        &mut self,
        pos: SourcePos,
        ty: SyntaxRef<'a>,
        count: Option<SyntaxRef<'a>>,
        args: &'a [Argument<'a>],
    ) -> Option<NodeId> {
        let target = self.bind_type(ty)?;
        let count = match count {
            Some(count) => {
                let count = self.bind_value(count)?;
                let count = self.read(count);
                let ty = self.program.pointer_int(false);
                Some(self.cast(count, ty, CastIntent::Implicit)?)
            }
            None => None,
        };
        let args = self.bind_arguments(args, None)?;
        let constructor = self.names.constructor;
        let (constructor, values) = match self.special_method(target, constructor, &args, pos)? {
            Some((constructor, values)) => (Some(constructor), values),
            None if args.is_empty() => (None, Vec::new()),
            None => {
                let count = args.len().to_string();
                self.error(pos, &messages::NO_DECLARATION_OF_0_ACCEPTS_1_ARGUMENTS, &["constructor", &count]);
                return None;
            }
        };
        let pointer = self.program.types.pointer(target);
        Some(self.add_node(
            pos,
            pointer,
            NodeKind::New {
                target,
                count,
                constructor,
                args: values,
            },
        ))
    }

    fn bind_delete(&mut self, pos: SourcePos, value: SyntaxRef<'a>) -> Option<NodeId> {
        let node = self.bind_value(value)?;
        let node = self.read(node);
        let ty = self.program.node(node).ty;
        let Some(pointee) = self.program.types.pointee(ty).filter(|_| self.program.types.is_pointer(ty)) else {
            let text = self.type_name(ty);
            self.error(value.pos, &messages::DELETE_NEEDS_POINTER_0, &[&text]);
            return None;
        };
        let dispose = self.names.dispose;
        let disposer = self
            .special_method(pointee, dispose, &[], pos)?
            .map(|(disposer, _)| disposer);
        let void = self.program.builtins.void;
        Some(self.add_node(
            pos,
            void,
            NodeKind::Delete {
                value: node,
                disposer,
            },
        ))
    }
}
