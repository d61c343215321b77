//! Generators.
//!
//! Calling a generator builds a resumable struct: its value parameters and
//! the locals of the body become fields, and a synthesized `next` method
//! runs the body up to the following `yield`, returning `false` once the
//! body finishes. Each yielded value is stored in a hidden element field
//! whose type is fixed by the first `yield`.

use tracing::debug;
use zinc_core::intern::Ident;
use zinc_core::text::SourcePos;
use zinc_diagnostics::messages;
use zinc_syntax::{Modifiers, SyntaxRef};

use crate::binder::Binder;
use crate::cast::CastIntent;
use crate::node::{NodeId, NodeKind};
use crate::scope::{Scope, ScopeKind};
use crate::symbol::*;
use crate::template::{CallArg, ParamBinding, TemplateSyntax};
use crate::types::TypeId;

impl<'a> Binder<'a> {
    /// Call a generator template: instantiate its resumable struct and
    /// construct a value of it from the arguments and captured variables.
    pub(crate) fn call_generator(
        &mut self,
        template: SymbolId,
        args: &[CallArg],
        pos: SourcePos,
    ) -> Option<NodeId> {
        let binding = self.bind_parameters(template, args, pos, ScopeKind::Struct)?;
        let state = match self.program.memo.get(&(template, binding.fingerprint.clone())) {
            Some(&state) => state,
            None => self.instantiate_generator(template, &binding)?,
        };
        let ParamBinding { args, .. } = binding;

        let param_fields: Vec<SymbolId> = self
            .program
            .struct_decl(state)?
            .fields
            .iter()
            .copied()
            .take(args.len())
            .collect();
        let mut fields: Vec<(SymbolId, NodeId)> = param_fields.into_iter().zip(args).collect();
        fields.extend(self.captured_values(state, pos)?);
        let ty = self.program.types.direct(state);
        Some(self.add_node(pos, ty, NodeKind::Initializer { fields }))
    }

    fn instantiate_generator(&mut self, template: SymbolId, binding: &ParamBinding) -> Option<SymbolId> {
        let (syntax, template_scope, modifiers) = {
            let decl = self.program.template(template)?;
            (decl.syntax, decl.scope, decl.modifiers)
        };
        let TemplateSyntax::Function(syntax) = syntax else {
            return None;
        };
        let name = self.program.symbol(template).name;
        let scope = binding.scope;
        let state = self.program.add_symbol(
            Symbol::new(
                name,
                template_scope,
                syntax.pos,
                Decl::Struct(StructDecl::new(StructKind::Resumable, Some(template))),
            )
            .with_scope(scope),
        );
        self.program.scope_mut(scope).owner = Some(state);
        self.register_instance(template, binding.fingerprint.clone(), state);

        for &(name, pos, ty) in &binding.values {
            let index = self.program.struct_decl(state).map_or(0, |decl| decl.fields.len());
            let decl = Decl::Field(FieldDecl {
                ty,
                owner: state,
                index,
                kind: FieldKind::Ordinary,
                default: None,
            });
            if let Some(field) = self.declare_symbol(scope, Symbol::new(name, scope, pos, decl)) {
                if let Some(decl) = self.program.struct_decl_mut(state) {
                    decl.fields.push(field);
                }
            }
        }

        let next_scope = self
            .program
            .add_scope(Scope::new(ScopeKind::Function, Some(scope), None));
        let mut decl = FunctionDecl::new(Role::GeneratorStep, Some(template));
        decl.owner = Some(state);
        decl.modifiers = modifiers;
        let next = self.declare_symbol(
            scope,
            Symbol::new(self.names.next, scope, syntax.pos, Decl::Function(decl)).with_scope(next_scope),
        )?;
        self.program.scope_mut(next_scope).owner = Some(next);
        if let Some(decl) = self.program.struct_decl_mut(state) {
            decl.method = Some(next);
        }

        // A declared return type fixes the element type up front.
        if let Some(ret) = syntax.return_type {
            let element = self
                .in_context(next_scope, Some(next), modifiers, syntax.pos, |b| b.bind_type(ret))
                .flatten();
            if let Some(element) = element {
                self.ensure_element(state, element, syntax.pos);
            }
        }

        let state_ty = self.program.types.direct(state);
        let this = self.program.types.pointer(state_ty);
        self.declare_parameters(next, next_scope, Some(this), Vec::new());
        self.bind_function_body(next, syntax, next_scope, modifiers);
        let boolean = self.program.builtins.bool;
        if let Some(decl) = self.program.function_mut(next) {
            decl.ret = Some(boolean);
        }
        Some(state)
    }

    /// The element type of `state`, creating the element field on first
    /// use.
    fn ensure_element(&mut self, state: SymbolId, ty: TypeId, pos: SourcePos) -> TypeId {
        if let Some(element) = self.program.struct_decl(state).and_then(|decl| decl.element) {
            return element;
        }
        let scope = self.program.symbol(state).own_scope.unwrap_or(self.program.root_scope);
        let index = self.program.struct_decl(state).map_or(0, |decl| decl.fields.len());
        let decl = Decl::Field(FieldDecl {
            ty,
            owner: state,
            index,
            kind: FieldKind::Ordinary,
            default: None,
        });
        // Not declared in the scope: the body cannot name it.
        let field = self.program.add_symbol(Symbol::new(self.names.value, scope, pos, decl));
        if let Some(decl) = self.program.struct_decl_mut(state) {
            decl.fields.push(field);
            decl.element = Some(ty);
            decl.element_field = Some(field);
        }
        let text = self.type_name(ty);
        debug!(state = state.0, element = %text, "fixed generator element type");
        ty
    }

    pub(crate) fn bind_yield(&mut self, pos: SourcePos, value: SyntaxRef<'a>) -> Option<NodeId> {
        let Some(state) = self.generator_state() else {
            self.error(pos, &messages::YIELD_OUTSIDE_GENERATOR, &[]);
            return None;
        };
        let value = self.bind_value(value)?;
        let value = self.read(value);
        let ty = self.promoted_literal_type(value);
        let element = self.ensure_element(state, ty, pos);
        let value = self.cast(value, element, CastIntent::Implicit)?;
        let void = self.program.builtins.void;
        Some(self.add_node(pos, void, NodeKind::Yield(value)))
    }

    /// The resumable struct, `next` method and element type behind a
    /// generator value, reporting anything else as not iterable.
    fn iteration(&mut self, value: NodeId, pos: SourcePos) -> Option<(SymbolId, TypeId)> {
        let ty = self.program.node(value).ty;
        let state = self
            .program
            .types
            .symbol(ty)
            .filter(|_| self.program.struct_kind(ty) == Some(StructKind::Resumable));
        let Some(state) = state else {
            let text = self.type_name(ty);
            self.error(pos, &messages::NOT_ITERABLE_0, &[&text]);
            return None;
        };
        let decl = self.program.struct_decl(state)?;
        match (decl.method, decl.element) {
            (Some(next), Some(element)) => Some((next, element)),
            _ => {
                let text = self.symbol_name(state);
                self.error(pos, &messages::USED_BEFORE_RETURN_TYPE_INFERRED_0, &[&text]);
                None
            }
        }
    }

    pub(crate) fn bind_yield_from(&mut self, pos: SourcePos, value: SyntaxRef<'a>) -> Option<NodeId> {
        let Some(state) = self.generator_state() else {
            self.error(pos, &messages::YIELD_OUTSIDE_GENERATOR, &[]);
            return None;
        };
        let value = self.bind_value(value)?;
        let value = self.read(value);
        let (step, inner) = self.iteration(value, pos)?;
        let element = self.ensure_element(state, inner, pos);
        if element != inner {
            let (from, to) = (self.type_name(inner), self.type_name(element));
            self.error(pos, &messages::CANNOT_IMPLICITLY_CONVERT_0_TO_1, &[&from, &to]);
            return None;
        }
        let void = self.program.builtins.void;
        Some(self.add_node(pos, void, NodeKind::YieldFrom { value, step }))
    }

    /// `for name in iterable { ... }` over a generator value. The state is
    /// kept in a hidden variable and `name` holds each element in turn.
    pub(crate) fn bind_for_in(
        &mut self,
        pos: SourcePos,
        label: Option<Ident>,
        name: Ident,
        iterable: SyntaxRef<'a>,
        body: SyntaxRef<'a>,
    ) -> Option<NodeId> {
        let scope = self.new_scope(ScopeKind::Block);
        let void = self.program.builtins.void;
        self.in_scope(scope, pos, |b| {
            let init = b.bind_value(iterable)?;
            let init = b.read(init);
            let (step, element) = b.iteration(init, iterable.pos)?;
            let state_ty = b.program.node(init).ty;
            let state_name = b.idents.generate("state");
            let state = b.declare_variable(state_name, state_ty, pos, Modifiers::NONE)?;
            let label = b.declare_label(label, true, pos)?;
            let variable = b.declare_variable(name, element, pos, Modifiers::NONE)?;
            let body = b.with_loop(label, |b| b.bind_branch(body))?;
            Some(b.add_node(
                pos,
                void,
                NodeKind::ForIn {
                    scope,
                    label,
                    variable,
                    state,
                    init,
                    step,
                    body,
                },
            ))
        })
        .flatten()
    }
}
