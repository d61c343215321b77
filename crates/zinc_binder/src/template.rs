//! Generic templates.
//!
//! Function and struct declarations are collected as templates in the first
//! pass over a scope and instantiated on first use. A call site is matched
//! to a template by argument count alone; overload sets try their
//! candidates in declaration order and the first match wins.
//!
//! Instances are memoized per `(template, fingerprint)`, where the
//! fingerprint records what each parameter was bound to. A template symbol
//! keeps its `Template` declaration forever; instances are separate symbols
//! listed on the template.

use tracing::debug;
use zinc_core::intern::Ident;
use zinc_core::text::SourcePos;
use zinc_diagnostics::{messages, Diagnostic};
use zinc_syntax::{FunctionKind, FunctionSyntax, Modifiers, Param, StructSyntax, StructSyntaxKind, SyntaxKind, SyntaxRef};

use crate::binder::{is_declaration, Binder};
use crate::cast::CastIntent;
use crate::node::{ConstValue, NodeId};
use crate::scope::{Scope, ScopeId, ScopeKind};
use crate::symbol::*;
use crate::types::TypeId;

/// The shape of a parameter list, as seen by call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Arity {
    pub required: usize,
    pub default: usize,
    pub vararg: bool,
    /// Methods take `this` in addition to their explicit arguments.
    pub receiver: bool,
}

impl Arity {
    /// Compute the arity of a parameter list. Fails with a reason when a
    /// vararg is not last or a required parameter follows a defaulted one.
    pub fn from_params(params: &[Param<'_>], receiver: bool) -> Result<Self, &'static str> {
        let mut arity = Arity {
            receiver,
            ..Arity::default()
        };
        for (index, param) in params.iter().enumerate() {
            if param.vararg {
                if index + 1 != params.len() {
                    return Err("'...' must be the last parameter");
                }
                arity.vararg = true;
            } else if param.default.is_some() {
                arity.default += 1;
            } else if arity.default > 0 {
                return Err("a required parameter follows one with a default");
            } else {
                arity.required += 1;
            }
        }
        Ok(arity)
    }

    /// Whether a call with `count` explicit arguments matches.
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.required && (self.vararg || count <= self.required + self.default)
    }
}

/// The declaration a template instantiates.
#[derive(Debug, Clone, Copy)]
pub enum TemplateSyntax<'a> {
    Function(&'a FunctionSyntax<'a>),
    Struct(&'a StructSyntax<'a>),
}

impl<'a> TemplateSyntax<'a> {
    pub fn params(&self) -> &'a [Param<'a>] {
        match self {
            TemplateSyntax::Function(syntax) => syntax.params,
            TemplateSyntax::Struct(syntax) => syntax.params,
        }
    }

    pub fn pos(&self) -> SourcePos {
        match self {
            TemplateSyntax::Function(syntax) => syntax.pos,
            TemplateSyntax::Struct(syntax) => syntax.pos,
        }
    }
}

/// What one template parameter was bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FingerprintEntry {
    /// An untyped value parameter, with the argument's type.
    Value(TypeId),
    /// A type argument.
    Type(TypeId),
    /// A `const` parameter's folded value.
    Const(TypeId, ConstValue),
    /// A parameter with a declared type; determined by the entries before it.
    Declared,
}

pub type Fingerprint = Vec<FingerprintEntry>;

/// A bound call-site argument.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ArgValue {
    Value(NodeId),
    Type(TypeId),
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct CallArg {
    pub pos: SourcePos,
    pub name: Option<Ident>,
    pub value: ArgValue,
}

/// Parameters bound for one call, before the memo is consulted.
pub(crate) struct ParamBinding {
    /// Scope holding type and const parameters; becomes the instance scope
    /// on a memo miss.
    pub scope: ScopeId,
    pub fingerprint: Fingerprint,
    /// Value parameters to declare on a fresh instance.
    pub values: Vec<(Ident, SourcePos, TypeId)>,
    /// Runtime arguments, one per value parameter.
    pub args: Vec<NodeId>,
}

impl<'a> Binder<'a> {
    // ========================================================================
    // Collection
    // ========================================================================

    /// The name a function declaration is registered under.
    pub(crate) fn template_name(&self, syntax: &FunctionSyntax<'_>) -> Ident {
        match (syntax.name, syntax.operator) {
            (Some(name), _) => name,
            (None, Some(operator)) => self.idents.intern(&operator.declared_name()),
            (None, None) => self.idents.generate("anon"),
        }
    }

    /// The struct whose body is being bound, if any.
    pub(crate) fn current_struct(&self) -> Option<SymbolId> {
        let scope = self.program.scope(self.current_scope());
        match scope.kind {
            ScopeKind::Struct => scope.owner,
            _ => None,
        }
    }

    pub(crate) fn collect_function(
        &mut self,
        syntax: &'a FunctionSyntax<'a>,
        owner: Option<SymbolId>,
    ) -> Option<SymbolId> {
        let name = self.template_name(syntax);
        let modifiers = syntax.modifiers | (self.frame().modifiers & Modifiers::INHERITED);
        let receiver = owner.is_some() && !modifiers.contains(Modifiers::STATIC);
        let arity = self.arity_of(name, syntax.params, receiver)?;
        let role = match owner {
            Some(_) if name == self.names.constructor => Role::Constructor,
            Some(_) if name == self.names.dispose => Role::Disposer,
            _ => Role::Plain,
        };
        let decl = TemplateDecl {
            syntax: TemplateSyntax::Function(syntax),
            arity,
            scope: self.current_scope(),
            role,
            function_kind: syntax.kind,
            modifiers,
            owner,
            instances: Vec::new(),
        };
        self.declare_template(name, syntax.pos, decl)
    }

    pub(crate) fn collect_struct(&mut self, syntax: &'a StructSyntax<'a>) -> Option<SymbolId> {
        let name = syntax
            .name
            .unwrap_or_else(|| self.idents.generate("struct"));
        let arity = self.arity_of(name, syntax.params, false)?;
        let decl = TemplateDecl {
            syntax: TemplateSyntax::Struct(syntax),
            arity,
            scope: self.current_scope(),
            role: Role::Plain,
            function_kind: FunctionKind::Plain,
            modifiers: syntax.modifiers | (self.frame().modifiers & Modifiers::INHERITED),
            owner: None,
            instances: Vec::new(),
        };
        self.declare_template(name, syntax.pos, decl)
    }

    fn arity_of(&mut self, name: Ident, params: &[Param<'_>], receiver: bool) -> Option<Arity> {
        match Arity::from_params(params, receiver) {
            Ok(arity) => Some(arity),
            Err(reason) => {
                let text = self.text(name);
                let pos = params.first().map_or(SourcePos::synthetic(), |param| param.pos);
                self.error(pos, &messages::MALFORMED_PARAMETERS_0_1, &[&text, reason]);
                None
            }
        }
    }

    /// Declare a template in the current scope. A template with the same
    /// name and a different arity turns the name into an overload set; the
    /// same arity twice is an error and the first declaration is kept.
    fn declare_template(
        &mut self,
        name: Ident,
        pos: SourcePos,
        decl: TemplateDecl<'a>,
    ) -> Option<SymbolId> {
        let scope = self.current_scope();
        let text = self.text(name);
        debug!(template = %text, required = decl.arity.required, "collected template");

        let Some(existing) = self.program.scope(scope).find(name) else {
            return self.declare_symbol(scope, Symbol::new(name, scope, pos, Decl::Template(decl)));
        };
        let candidates = match &self.program.symbol(existing).decl {
            Decl::Template(template) => vec![(existing, template.arity)],
            Decl::OverloadSet(list) => list
                .iter()
                .filter_map(|id| self.program.template(*id).map(|t| (*id, t.arity)))
                .collect(),
            _ => {
                self.report_duplicate(name, pos, existing);
                return None;
            }
        };
        if let Some((clash, _)) = candidates.iter().find(|(_, arity)| *arity == decl.arity) {
            let previous = self.program.symbol(*clash).pos;
            self.report(
                Diagnostic::new(pos, &messages::DUPLICATE_ARITY_0, &[&text]).with_related(
                    Diagnostic::new(previous, &messages::PREVIOUS_DECLARATION_0, &[&text]),
                ),
            );
            return None;
        }

        let added = self
            .program
            .add_symbol(Symbol::new(name, scope, pos, Decl::Template(decl)));
        let symbol = self.program.symbol_mut(existing);
        match &mut symbol.decl {
            Decl::OverloadSet(list) => list.push(added),
            _ => {
                // Move the first template out into its own symbol.
                let first = std::mem::replace(&mut symbol.decl, Decl::OverloadSet(Vec::new()));
                let first_pos = symbol.pos;
                let moved = self
                    .program
                    .add_symbol(Symbol::new(name, scope, first_pos, first));
                if let Decl::OverloadSet(list) = &mut self.program.symbol_mut(existing).decl {
                    list.extend([moved, added]);
                }
            }
        }
        Some(added)
    }

    // ========================================================================
    // Candidate selection
    // ========================================================================

    /// Pick the first template under `symbol` accepting the call. `bound`
    /// is set when a value was written before the callee with `.`: methods
    /// take it as receiver, free functions as first argument.
    pub(crate) fn select_template(
        &mut self,
        symbol: SymbolId,
        count: usize,
        bound: bool,
        pos: SourcePos,
    ) -> Option<SymbolId> {
        let candidates = match &self.program.symbol(symbol).decl {
            Decl::Template(_) => vec![symbol],
            Decl::OverloadSet(list) => list.clone(),
            _ => Vec::new(),
        };
        let chosen = candidates.into_iter().find(|candidate| {
            self.program.template(*candidate).is_some_and(|template| {
                let extra = usize::from(bound && !template.arity.receiver);
                template.arity.accepts(count + extra)
            })
        });
        if chosen.is_none() {
            let text = self.symbol_name(symbol);
            let count = count.to_string();
            self.error(pos, &messages::NO_DECLARATION_OF_0_ACCEPTS_1_ARGUMENTS, &[&text, &count]);
        }
        chosen
    }

    // ========================================================================
    // Parameter binding
    // ========================================================================

    /// Match `args` to the template's parameters and bind them in a fresh
    /// scope under the template's declaring scope.
    pub(crate) fn bind_parameters(
        &mut self,
        template: SymbolId,
        args: &[CallArg],
        pos: SourcePos,
        kind: ScopeKind,
    ) -> Option<ParamBinding> {
        let (syntax, scope) = {
            let template = self.program.template(template)?;
            (template.syntax, template.scope)
        };
        let params = syntax.params();
        let name = self.symbol_name(template);
        let slots = self.assign_arguments(&name, params, args, pos)?;

        let param_scope = self.program.add_scope(Scope::new(kind, Some(scope), None));
        let is_struct = matches!(syntax, TemplateSyntax::Struct(_));
        let function = self.program.enclosing_function(scope);
        self.in_context(param_scope, function, Modifiers::NONE, pos, |b| {
            let mut binding = ParamBinding {
                scope: param_scope,
                fingerprint: Vec::with_capacity(params.len()),
                values: Vec::new(),
                args: Vec::new(),
            };
            let mut ok = true;
            for (param, slot) in params.iter().zip(slots) {
                ok &= b.bind_parameter(param, slot, is_struct, &mut binding).is_some();
            }
            ok.then_some(binding)
        })
        .flatten()
    }

    /// Positional arguments first, then named ones. Returns the arguments
    /// given for each parameter; only a vararg parameter takes several.
    fn assign_arguments(
        &mut self,
        name: &str,
        params: &[Param<'_>],
        args: &[CallArg],
        pos: SourcePos,
    ) -> Option<Vec<Vec<CallArg>>> {
        let count = args.len().to_string();
        let mut slots: Vec<Vec<CallArg>> = vec![Vec::new(); params.len()];
        let vararg = params
            .last()
            .filter(|param| param.vararg)
            .map(|_| params.len() - 1);

        let mut next = 0;
        for arg in args.iter().filter(|arg| arg.name.is_none()) {
            let index = match vararg {
                Some(last) if next >= last => last,
                _ => next,
            };
            if index >= params.len() {
                self.error(pos, &messages::NO_DECLARATION_OF_0_ACCEPTS_1_ARGUMENTS, &[name, &count]);
                return None;
            }
            slots[index].push(*arg);
            next += 1;
        }

        for arg in args {
            let Some(arg_name) = arg.name else { continue };
            let text = self.text(arg_name);
            let Some(index) = params
                .iter()
                .position(|param| param.name == arg_name && !param.vararg)
            else {
                self.error(arg.pos, &messages::NO_PARAMETER_NAMED_0_IN_1, &[&text, name]);
                return None;
            };
            if !slots[index].is_empty() {
                self.error(arg.pos, &messages::ARGUMENT_SPECIFIED_TWICE_0, &[&text]);
                return None;
            }
            slots[index].push(*arg);
        }

        let missing = params
            .iter()
            .zip(&slots)
            .any(|(param, slot)| slot.is_empty() && !param.vararg && param.default.is_none());
        if missing {
            self.error(pos, &messages::NO_DECLARATION_OF_0_ACCEPTS_1_ARGUMENTS, &[name, &count]);
            return None;
        }
        Some(slots)
    }

    fn bind_parameter(
        &mut self,
        param: &'a Param<'a>,
        slot: Vec<CallArg>,
        is_struct: bool,
        binding: &mut ParamBinding,
    ) -> Option<()> {
        let scope = binding.scope;
        if param.vararg {
            let mut values = Vec::with_capacity(slot.len());
            for arg in slot {
                values.push(self.expect_value(arg)?);
            }
            let tuple = self.pack_tuple(param.pos, values)?;
            let ty = self.program.node(tuple).ty;
            binding.fingerprint.push(FingerprintEntry::Value(ty));
            binding.values.push((param.name, param.pos, ty));
            binding.args.push(tuple);
            return Some(());
        }

        let arg = match slot.first() {
            Some(arg) => *arg,
            None => {
                let default = param.default?;
                CallArg {
                    pos: default.pos,
                    name: None,
                    value: self.bind_argument(default)?,
                }
            }
        };
        let declared = match param.ty {
            Some(ty) => Some(self.bind_type(ty)?),
            None => None,
        };

        let is_const = param.is_const || (is_struct && matches!(arg.value, ArgValue::Value(_)));
        if is_const {
            let node = self.expect_value(arg)?;
            let node = match declared {
                Some(ty) => self.cast(node, ty, CastIntent::Implicit)?,
                None => self.read(node),
            };
            let Some(value) = self.const_value(node) else {
                let text = self.text(param.name);
                self.error(arg.pos, &messages::CONST_PARAMETER_NEEDS_CONSTANT_0, &[&text]);
                return None;
            };
            let node = self.constant(node);
            let ty = self.program.node(node).ty;
            let decl = Decl::ConstAlias {
                tag: AliasTag::Define,
                value: node,
            };
            self.declare_symbol(scope, Symbol::new(param.name, scope, param.pos, decl))?;
            binding.fingerprint.push(FingerprintEntry::Const(ty, value));
            return Some(());
        }

        match (declared, arg.value) {
            (Some(ty), ArgValue::Value(node)) => {
                let node = self.cast(node, ty, CastIntent::Implicit)?;
                binding.fingerprint.push(FingerprintEntry::Declared);
                binding.values.push((param.name, param.pos, ty));
                binding.args.push(node);
            }
            (Some(_), ArgValue::Type(ty)) => {
                let text = self.type_name(ty);
                self.error(arg.pos, &messages::EXPECTED_VALUE_FOUND_TYPE_0, &[&text]);
                return None;
            }
            (None, ArgValue::Type(ty)) => {
                let decl = Decl::TypeAlias {
                    tag: AliasTag::Define,
                    ty,
                };
                self.declare_symbol(scope, Symbol::new(param.name, scope, param.pos, decl))?;
                binding.fingerprint.push(FingerprintEntry::Type(ty));
            }
            (None, ArgValue::Value(node)) => {
                let node = self.read(node);
                if self.program.node(node).ty == self.program.builtins.null {
                    let text = self.text(param.name);
                    self.error(arg.pos, &messages::MISSING_TYPE_OR_INITIALIZER_0, &[&text]);
                    return None;
                }
                let ty = self.promoted_literal_type(node);
                let node = self.cast(node, ty, CastIntent::Implicit)?;
                binding.fingerprint.push(FingerprintEntry::Value(ty));
                binding.values.push((param.name, param.pos, ty));
                binding.args.push(node);
            }
        }
        Some(())
    }

    pub(crate) fn expect_value(&mut self, arg: CallArg) -> Option<NodeId> {
        match arg.value {
            ArgValue::Value(node) => Some(node),
            ArgValue::Type(ty) => {
                let text = self.type_name(ty);
                self.error(arg.pos, &messages::EXPECTED_VALUE_FOUND_TYPE_0, &[&text]);
                None
            }
        }
    }

    /// Record a fresh instance on its template and in the memo.
    pub(crate) fn register_instance(
        &mut self,
        template: SymbolId,
        fingerprint: Fingerprint,
        instance: SymbolId,
    ) {
        let text = self.symbol_name(template);
        debug!(template = %text, instance = instance.0, fingerprint = ?fingerprint, "instantiated template");
        self.program.memo.insert((template, fingerprint), instance);
        if let Decl::Template(decl) = &mut self.program.symbol_mut(template).decl {
            decl.instances.push(instance);
        }
    }

    // ========================================================================
    // Function instances
    // ========================================================================

    /// Instantiate a function template for a call. Returns the instance
    /// and the runtime arguments; a receiver is not included.
    pub(crate) fn instantiate_function(
        &mut self,
        template: SymbolId,
        args: &[CallArg],
        pos: SourcePos,
    ) -> Option<(SymbolId, Vec<NodeId>)> {
        let binding = self.bind_parameters(template, args, pos, ScopeKind::Function)?;
        let ParamBinding {
            scope,
            fingerprint,
            values,
            args,
        } = binding;
        if let Some(&instance) = self.program.memo.get(&(template, fingerprint.clone())) {
            return Some((instance, args));
        }

        let (syntax, template_scope, role, modifiers, owner) = {
            let decl = self.program.template(template)?;
            (decl.syntax, decl.scope, decl.role, decl.modifiers, decl.owner)
        };
        let TemplateSyntax::Function(syntax) = syntax else {
            return None;
        };
        let name = self.program.symbol(template).name;
        let receiver = self
            .program
            .template(template)
            .is_some_and(|decl| decl.arity.receiver);

        let mut decl = FunctionDecl::new(role, Some(template));
        decl.owner = owner;
        decl.modifiers = modifiers;
        let instance = self.program.add_symbol(
            Symbol::new(name, template_scope, syntax.pos, Decl::Function(decl)).with_scope(scope),
        );
        self.program.scope_mut(scope).owner = Some(instance);
        self.register_instance(template, fingerprint, instance);

        let this = match (receiver, owner) {
            (true, Some(owner)) => {
                let owner_ty = self.program.types.direct(owner);
                Some(self.program.types.pointer(owner_ty))
            }
            _ => None,
        };
        self.declare_parameters(instance, scope, this, values);
        self.bind_function_body(instance, syntax, scope, modifiers);
        Some((instance, args))
    }

    /// Declare `this` (when `receiver` is set) and the value parameters of
    /// a function.
    pub(crate) fn declare_parameters(
        &mut self,
        function: SymbolId,
        scope: ScopeId,
        receiver: Option<TypeId>,
        values: Vec<(Ident, SourcePos, TypeId)>,
    ) {
        let mut params = Vec::with_capacity(values.len() + 1);
        let mut this = None;
        if let Some(ty) = receiver {
            let pos = self.program.symbol(function).pos;
            let decl = Decl::Parameter { ty, index: 0 };
            this = self.declare_symbol(scope, Symbol::new(self.names.this, scope, pos, decl));
            params.extend(this);
        }
        for (name, pos, ty) in values {
            let decl = Decl::Parameter {
                ty,
                index: params.len(),
            };
            if let Some(param) = self.declare_symbol(scope, Symbol::new(name, scope, pos, decl)) {
                params.push(param);
            }
        }
        if let Some(decl) = self.program.function_mut(function) {
            decl.params = params;
            decl.receiver = this;
        }
    }

    /// Bind a function body inside its own scope. The return type comes
    /// from the declaration or is inferred from the first `return`; a body
    /// without one returns `Void`, or the unknown type when it failed.
    pub(crate) fn bind_function_body(
        &mut self,
        function: SymbolId,
        syntax: &'a FunctionSyntax<'a>,
        scope: ScopeId,
        modifiers: Modifiers,
    ) {
        let errors = self.diagnostics.error_count();
        let body = self.in_context(scope, Some(function), modifiers, syntax.pos, |b| {
            if let Some(ty) = syntax.return_type {
                let ret = b.bind_type(ty).unwrap_or(b.program.types.unknown);
                b.set_return_type(function, ret);
            }
            match syntax.body {
                Some(body) => b.bind_scope_body(body),
                None => {
                    let text = b.symbol_name(function);
                    b.error(syntax.pos, &messages::BODY_REQUIRED_0, &[&text]);
                    Vec::new()
                }
            }
        });
        // A body that reported errors before fixing the return type leaves
        // the function erroneous; calls to it bind to nothing.
        let fallback = if self.diagnostics.error_count() > errors {
            self.program.types.unknown
        } else {
            self.program.builtins.void
        };
        if let Some(decl) = self.program.function_mut(function) {
            decl.body = body.unwrap_or_default();
            if decl.ret.is_none() {
                decl.ret = Some(fallback);
            }
        }
    }

    // ========================================================================
    // Struct instances
    // ========================================================================

    /// Instantiate a struct template. Struct parameters bind types and
    /// constants only.
    pub(crate) fn instantiate_struct(
        &mut self,
        template: SymbolId,
        args: &[CallArg],
        pos: SourcePos,
    ) -> Option<SymbolId> {
        let binding = self.bind_parameters(template, args, pos, ScopeKind::Struct)?;
        if let Some(&instance) = self.program.memo.get(&(template, binding.fingerprint.clone())) {
            return Some(instance);
        }
        let (syntax, template_scope, modifiers) = {
            let decl = self.program.template(template)?;
            (decl.syntax, decl.scope, decl.modifiers)
        };
        let TemplateSyntax::Struct(syntax) = syntax else {
            return None;
        };
        let name = self.program.symbol(template).name;
        let decl = match syntax.kind {
            StructSyntaxKind::Struct => Decl::Struct(StructDecl::new(StructKind::Ordinary, Some(template))),
            StructSyntaxKind::Tuple => Decl::Struct(StructDecl::new(StructKind::Tuple, Some(template))),
            StructSyntaxKind::Union => Decl::Union(StructDecl::new(StructKind::Ordinary, Some(template))),
        };
        let scope = binding.scope;
        let instance = self
            .program
            .add_symbol(Symbol::new(name, template_scope, syntax.pos, decl).with_scope(scope));
        self.program.scope_mut(scope).owner = Some(instance);
        self.register_instance(template, binding.fingerprint, instance);

        self.in_context(scope, None, modifiers, syntax.pos, |b| {
            b.bind_struct_body(instance, syntax.body)
        });
        Some(instance)
    }

    fn bind_struct_body(&mut self, owner: SymbolId, body: &[SyntaxRef<'a>]) {
        self.collect_declarations(body);
        self.collect_eager(body);
        self.bind_aliases(body);
        self.bind_fields(owner, body);
    }

    fn bind_fields(&mut self, owner: SymbolId, body: &[SyntaxRef<'a>]) {
        for &statement in body {
            match &statement.kind {
                SyntaxKind::Define {
                    name,
                    ty,
                    value,
                    modifiers,
                } => self.bind_field(owner, statement.pos, *name, *ty, *value, *modifiers),
                SyntaxKind::Modified { modifiers, body } => {
                    self.with_modifiers(*modifiers, |b| b.bind_fields(owner, body))
                }
                kind if is_declaration(kind) => {}
                _ => self.error(
                    statement.pos,
                    &messages::UNIMPLEMENTED_0,
                    &["A statement in a struct body"],
                ),
            }
        }
    }

    fn bind_field(
        &mut self,
        owner: SymbolId,
        pos: SourcePos,
        name: Ident,
        ty: Option<SyntaxRef<'a>>,
        value: Option<SyntaxRef<'a>>,
        modifiers: Modifiers,
    ) {
        let modifiers = modifiers | (self.frame().modifiers & Modifiers::INHERITED);
        if modifiers.contains(Modifiers::CONST) {
            // Constant members are aliases in the struct scope.
            self.bind_definition(pos, name, ty, value, modifiers);
            return;
        }
        let declared = match ty {
            Some(ty) => match self.bind_type(ty) {
                Some(ty) => Some(ty),
                None => return,
            },
            None => None,
        };
        let default = match value {
            Some(value) => match self.bind_value(value) {
                Some(node) => Some(self.read(node)),
                None => return,
            },
            None => None,
        };
        let ty = match (declared, default) {
            (Some(ty), _) => ty,
            (None, Some(node)) => self.promoted_literal_type(node),
            (None, None) => {
                let text = self.text(name);
                self.error(pos, &messages::FIELD_NEEDS_TYPE_0, &[&text]);
                return;
            }
        };
        let default = match default {
            Some(node) => match self.cast(node, ty, CastIntent::Implicit) {
                Some(node) => Some(node),
                None => return,
            },
            None => None,
        };

        let scope = self.current_scope();
        if modifiers.contains(Modifiers::STATIC) {
            self.declare_symbol(scope, Symbol::new(name, scope, pos, Decl::Global { ty }));
            return;
        }
        let index = self.program.struct_decl(owner).map_or(0, |decl| decl.fields.len());
        let decl = Decl::Field(FieldDecl {
            ty,
            owner,
            index,
            kind: FieldKind::Ordinary,
            default,
        });
        if let Some(field) = self.declare_symbol(scope, Symbol::new(name, scope, pos, decl)) {
            if let Some(decl) = self.program.struct_decl_mut(owner) {
                decl.fields.push(field);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zinc_core::arena::SyntaxArena;
    use zinc_core::intern::IdentTable;
    use zinc_syntax::SyntaxBuilder;

    fn arity(params: &[Param<'_>]) -> Result<Arity, &'static str> {
        Arity::from_params(params, false)
    }

    #[test]
    fn test_arity_boundaries() {
        let arity = Arity {
            required: 2,
            default: 1,
            vararg: false,
            receiver: false,
        };
        assert!(!arity.accepts(1));
        assert!(arity.accepts(2));
        assert!(arity.accepts(3));
        assert!(!arity.accepts(4));
    }

    #[test]
    fn test_vararg_accepts_any_larger_count() {
        let arity = Arity {
            required: 1,
            default: 0,
            vararg: true,
            receiver: false,
        };
        assert!(!arity.accepts(0));
        assert!(arity.accepts(1));
        assert!(arity.accepts(40));
    }

    #[test]
    fn test_arity_from_params() {
        let arena = SyntaxArena::new();
        let b = SyntaxBuilder::new(&arena, IdentTable::init());
        let params = [
            b.param("a", None),
            b.param("b", None),
            b.param_default("c", None, b.int(1)),
            b.vararg_param("rest"),
        ];
        assert_eq!(
            arity(&params),
            Ok(Arity {
                required: 2,
                default: 1,
                vararg: true,
                receiver: false,
            })
        );
    }

    #[test]
    fn test_malformed_parameter_lists() {
        let arena = SyntaxArena::new();
        let b = SyntaxBuilder::new(&arena, IdentTable::init());
        let vararg_first = [b.vararg_param("rest"), b.param("a", None)];
        assert!(arity(&vararg_first).is_err());

        let required_after_default = [b.param_default("a", None, b.int(1)), b.param("b", None)];
        assert!(arity(&required_after_default).is_err());
    }
}
