//! Name references and closure captures.
//!
//! A local or parameter referenced from inside a lambda or generator body
//! declared in an enclosing function is captured: every closure struct
//! between the reference and the declaration gets a `Captured` field, the
//! outermost copying the variable and each inner one copying the field of
//! the closure around it. The reference node records the hops outermost
//! first. Crossing a plain function is an error.

use tracing::debug;
use zinc_core::text::SourcePos;
use zinc_diagnostics::messages;
use zinc_syntax::{FunctionSyntax, Modifiers};

use crate::binder::Binder;
use crate::node::{CaptureHop, NodeId, NodeKind};
use crate::scope::{Scope, ScopeKind};
use crate::symbol::*;
use crate::types::TypeId;

impl<'a> Binder<'a> {
    /// A node reading `symbol` from the current scope.
    pub(crate) fn reference(&mut self, symbol: SymbolId, pos: SourcePos) -> Option<NodeId> {
        if matches!(self.program.symbol(symbol).decl, Decl::Field(_)) {
            return self.field_reference(symbol, pos);
        }
        let (ty, owning_scope) = {
            let symbol = self.program.symbol(symbol);
            (symbol.decl.value_type()?, symbol.owning_scope)
        };
        let crossed = match (&self.program.symbol(symbol).decl, owning_scope) {
            (Decl::Parameter { .. } | Decl::Local { .. }, Some(owning)) => self.crossed_functions(owning),
            _ => Vec::new(),
        };

        let mut captures = Vec::with_capacity(crossed.len());
        if !crossed.is_empty() {
            if let Some(&blocker) = crossed.iter().find(|function| {
                !self
                    .program
                    .function(**function)
                    .is_some_and(|decl| decl.role.captures())
            }) {
                let name = self.symbol_name(symbol);
                let across = self.symbol_name(blocker);
                self.error(pos, &messages::CANNOT_CAPTURE_0_ACROSS_1, &[&name, &across]);
                return None;
            }
            let mut from = symbol;
            for function in crossed.into_iter().rev() {
                let owner = self.program.function(function)?.owner?;
                let field = self.find_or_create_capture(owner, symbol, from, ty, pos);
                let scope = self.program.symbol(owner).own_scope?;
                captures.push(CaptureHop { scope, field });
                from = field;
            }
        }
        Some(self.add_node(pos, ty, NodeKind::ValueName { symbol, captures }))
    }

    /// Functions whose scopes lie between the current scope and `owning`,
    /// innermost first.
    fn crossed_functions(&self, owning: crate::scope::ScopeId) -> Vec<SymbolId> {
        let mut crossed = Vec::new();
        let mut current = Some(self.current_scope());
        while let Some(id) = current {
            if id == owning {
                break;
            }
            let scope = self.program.scope(id);
            if scope.kind == ScopeKind::Function {
                crossed.extend(scope.owner);
            }
            current = scope.parent;
        }
        crossed
    }

    /// The captured field on `owner` for `original`, created on first use.
    fn find_or_create_capture(
        &mut self,
        owner: SymbolId,
        original: SymbolId,
        from: SymbolId,
        ty: TypeId,
        pos: SourcePos,
    ) -> SymbolId {
        let fields = self
            .program
            .struct_decl(owner)
            .map(|decl| decl.fields.clone())
            .unwrap_or_default();
        let existing = fields.iter().copied().find(|field| {
            matches!(
                &self.program.symbol(*field).decl,
                Decl::Field(FieldDecl { kind: FieldKind::Captured(source), .. }) if source.original == original
            )
        });
        if let Some(field) = existing {
            return field;
        }

        let name = self.program.symbol(original).name;
        let scope = self.program.symbol(owner).own_scope.unwrap_or(self.program.root_scope);
        let decl = Decl::Field(FieldDecl {
            ty,
            owner,
            index: fields.len(),
            kind: FieldKind::Captured(CaptureSource { original, from }),
            default: None,
        });
        // Captured fields are reached through the reference's hops, never
        // by name.
        let field = self.program.add_symbol(Symbol::new(name, scope, pos, decl));
        if let Some(decl) = self.program.struct_decl_mut(owner) {
            decl.fields.push(field);
        }
        let text = self.text(name);
        debug!(variable = %text, owner = owner.0, field = field.0, "synthesized captured field");
        field
    }

    /// `this->field` for a field of the struct whose method is being bound.
    fn field_reference(&mut self, field: SymbolId, pos: SourcePos) -> Option<NodeId> {
        let (owner, ty) = match &self.program.symbol(field).decl {
            Decl::Field(decl) => (decl.owner, decl.ty),
            _ => return None,
        };
        let Some(this) = self.method_receiver(owner) else {
            let text = self.symbol_name(field);
            self.error(pos, &messages::NAME_0_IS_NOT_A_VALUE, &[&text]);
            return None;
        };
        let this = self.reference(this, pos)?;
        let owner_ty = self.program.types.direct(owner);
        let object = self.add_node(pos, owner_ty, NodeKind::Dereference(this));
        Some(self.add_node(pos, ty, NodeKind::FieldName { base: object, field }))
    }

    /// The `this` parameter of the innermost method of `owner` enclosing
    /// the current scope.
    pub(crate) fn method_receiver(&self, owner: SymbolId) -> Option<SymbolId> {
        let mut current = Some(self.current_scope());
        while let Some(id) = current {
            let scope = self.program.scope(id);
            if scope.kind == ScopeKind::Function {
                let receiver = scope
                    .owner
                    .and_then(|function| self.program.function(function))
                    .filter(|function| function.owner == Some(owner))
                    .and_then(|function| function.receiver);
                if receiver.is_some() {
                    return receiver;
                }
            }
            current = scope.parent;
        }
        None
    }

    /// Initial values for the captured fields of a closure struct, read at
    /// the construction site.
    pub(crate) fn captured_values(&mut self, owner: SymbolId, pos: SourcePos) -> Option<Vec<(SymbolId, NodeId)>> {
        let fields = self
            .program
            .struct_decl(owner)
            .map(|decl| decl.fields.clone())
            .unwrap_or_default();
        let mut values = Vec::new();
        for field in fields {
            let source = match &self.program.symbol(field).decl {
                Decl::Field(FieldDecl {
                    kind: FieldKind::Captured(source),
                    ..
                }) => *source,
                _ => continue,
            };
            let visible = self
                .program
                .symbol(source.original)
                .owning_scope
                .is_some_and(|scope| self.program.scope_is_within(self.current_scope(), scope));
            if !visible {
                let name = self.symbol_name(source.original);
                let owner_name = self.symbol_name(owner);
                self.error(pos, &messages::CANNOT_CAPTURE_0_ACROSS_1, &[&name, &owner_name]);
                return None;
            }
            values.push((field, self.reference(source.from, pos)?));
        }
        Some(values)
    }

    // ========================================================================
    // Lambdas
    // ========================================================================

    /// A lambda expression: a closure struct with a call method, built on
    /// the spot from the captured values.
    pub(crate) fn bind_lambda(&mut self, pos: SourcePos, syntax: &'a FunctionSyntax<'a>) -> Option<NodeId> {
        let scope = self.current_scope();
        let name = self.idents.generate("lambda");
        let struct_scope = self
            .program
            .add_scope(Scope::new(ScopeKind::Struct, Some(scope), None));
        let closure = self.program.add_symbol(
            Symbol::new(
                name,
                scope,
                pos,
                Decl::Struct(StructDecl::new(StructKind::Lambda, None)),
            )
            .with_scope(struct_scope),
        );
        self.program.scope_mut(struct_scope).owner = Some(closure);

        let call_scope = self
            .program
            .add_scope(Scope::new(ScopeKind::Function, Some(struct_scope), None));
        let modifiers = syntax.modifiers | (self.frame().modifiers & Modifiers::INHERITED);
        let mut decl = FunctionDecl::new(Role::LambdaCall, None);
        decl.owner = Some(closure);
        decl.modifiers = modifiers;
        let call_name = self.idents.intern_static("call");
        let call = self.declare_symbol(
            struct_scope,
            Symbol::new(call_name, struct_scope, pos, Decl::Function(decl)).with_scope(call_scope),
        )?;
        self.program.scope_mut(call_scope).owner = Some(call);
        if let Some(decl) = self.program.struct_decl_mut(closure) {
            decl.method = Some(call);
        }

        let params = self
            .in_scope(call_scope, pos, |b| {
                let mut values = Vec::with_capacity(syntax.params.len());
                let mut ok = true;
                for param in syntax.params {
                    match param.ty {
                        Some(ty) if !param.vararg && !param.is_const => match b.bind_type(ty) {
                            Some(ty) => values.push((param.name, param.pos, ty)),
                            None => ok = false,
                        },
                        _ => {
                            b.error(
                                param.pos,
                                &messages::MALFORMED_PARAMETERS_0_1,
                                &["lambda", "every parameter needs a declared type"],
                            );
                            ok = false;
                        }
                    }
                }
                ok.then_some(values)
            })
            .flatten()?;

        let closure_ty = self.program.types.direct(closure);
        let this = self.program.types.pointer(closure_ty);
        self.declare_parameters(call, call_scope, Some(this), params);
        self.bind_function_body(call, syntax, call_scope, modifiers);

        let fields = self.captured_values(closure, pos)?;
        Some(self.add_node(pos, closure_ty, NodeKind::Initializer { fields }))
    }
}
