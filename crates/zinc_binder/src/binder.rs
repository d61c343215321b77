//! The binder implementation.
//!
//! Walks the syntax tree of every module and builds the bound program:
//! - Module symbols, bound lazily on first qualified reference
//! - Template collection for functions and structs
//! - Enums, extern blocks, aliases, imports and exports
//! - Definitions, blocks, branches, loops and jumps
//!
//! Expressions are bound in `expr` and `operators`, templates in `template`
//! and `generator`, name references and closures in `capture`.

use tracing::debug;
use zinc_core::intern::{Ident, IdentTable};
use zinc_core::text::SourcePos;
use zinc_diagnostics::{messages, Diagnostic, DiagnosticCollection, DiagnosticMessage};
use zinc_syntax::{EnumSyntax, FunctionSyntax, ModuleSyntax, Modifiers, SyntaxKind, SyntaxRef};

use crate::cast::CastIntent;
use crate::const_eval::wrap_int;
use crate::expr::Operand;
use crate::frame::Frame;
use crate::node::{ConstValue, Node, NodeId, NodeKind};
use crate::program::Program;
use crate::scope::{Scope, ScopeId, ScopeKind};
use crate::symbol::*;
use crate::types::TypeId;

/// Binder settings, filled in from the compiler options by the driver.
#[derive(Debug, Clone)]
pub struct BinderOptions {
    /// Pointer size in bits, 32 or 64.
    pub pointer_width: u16,
    pub max_nesting_depth: usize,
    /// Name of each module's entry-point function.
    pub entry_name: String,
    /// Stop storing errors after this many.
    pub max_errors: Option<usize>,
}

impl Default for BinderOptions {
    fn default() -> Self {
        Self {
            pointer_width: 64,
            max_nesting_depth: 256,
            entry_name: "__entry".to_string(),
            max_errors: None,
        }
    }
}

/// Names the binder synthesizes or recognizes.
pub(crate) struct Names {
    pub this: Ident,
    pub next: Ident,
    pub value: Ident,
    pub constructor: Ident,
    pub dispose: Ident,
    pub entry: Ident,
}

/// Unreachable-code tracking for one statement list.
#[derive(Default)]
pub(crate) struct Reachability {
    terminator: Option<&'static str>,
    warned: bool,
}

/// Turns syntax trees into a typed `Program`.
pub struct Binder<'a> {
    pub(crate) program: Program<'a>,
    pub(crate) idents: IdentTable,
    pub(crate) diagnostics: DiagnosticCollection,
    pub(crate) options: BinderOptions,
    pub(crate) frames: Vec<Frame<'a>>,
    pub(crate) names: Names,
}

impl<'a> Binder<'a> {
    pub fn new(idents: &IdentTable, options: BinderOptions) -> Self {
        let program = Program::new(idents, options.pointer_width);
        let names = Names {
            this: idents.intern_static("this"),
            next: idents.intern_static("next"),
            value: idents.intern_static("value"),
            constructor: idents.intern_static("constructor"),
            dispose: idents.intern_static("dispose"),
            entry: idents.intern(&options.entry_name),
        };
        let root = Frame::root(program.root_scope);
        Self {
            program,
            idents: idents.clone(),
            diagnostics: DiagnosticCollection::with_max_errors(options.max_errors),
            options,
            frames: vec![root],
            names,
        }
    }

    pub fn program(&self) -> &Program<'a> {
        &self.program
    }

    pub fn diagnostics(&self) -> &DiagnosticCollection {
        &self.diagnostics
    }

    pub fn idents(&self) -> &IdentTable {
        &self.idents
    }

    /// Hand the bound program and its diagnostics to the driver.
    pub fn finish(self) -> (Program<'a>, DiagnosticCollection) {
        (self.program, self.diagnostics)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.add(diagnostic);
    }

    pub(crate) fn error(&mut self, pos: SourcePos, message: &DiagnosticMessage, args: &[&str]) {
        self.report(Diagnostic::new(pos, message, args));
    }

    pub(crate) fn text(&self, name: Ident) -> String {
        self.idents.resolve(name).to_string()
    }

    pub(crate) fn symbol_name(&self, symbol: SymbolId) -> String {
        self.text(self.program.symbol(symbol).name)
    }

    pub(crate) fn type_name(&self, ty: TypeId) -> String {
        self.program.type_name(ty, &self.idents)
    }

    pub(crate) fn add_node(&mut self, pos: SourcePos, ty: TypeId, kind: NodeKind) -> NodeId {
        self.program.add_node(Node { pos, ty, kind })
    }

    /// A scope nested in the current one.
    pub(crate) fn new_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let parent = self.current_scope();
        self.program.add_scope(Scope::new(kind, Some(parent), None))
    }

    /// Declare `symbol` in `scope`, reporting a clash with the previous
    /// declaration.
    pub(crate) fn declare_symbol(&mut self, scope: ScopeId, symbol: Symbol<'a>) -> Option<SymbolId> {
        let (name, pos) = (symbol.name, symbol.pos);
        match self.program.declare(scope, symbol) {
            Ok(id) => Some(id),
            Err(existing) => {
                self.report_duplicate(name, pos, existing);
                None
            }
        }
    }

    pub(crate) fn report_duplicate(&mut self, name: Ident, pos: SourcePos, existing: SymbolId) {
        let text = self.text(name);
        let previous = self.program.symbol(existing).pos;
        self.report(
            Diagnostic::new(pos, &messages::DUPLICATE_NAME_0, &[&text]).with_related(
                Diagnostic::new(previous, &messages::PREVIOUS_DECLARATION_0, &[&text]),
            ),
        );
    }

    /// The module whose scope encloses the current one.
    pub(crate) fn current_module(&self) -> Option<SymbolId> {
        let mut current = Some(self.current_scope());
        while let Some(id) = current {
            let scope = self.program.scope(id);
            if scope.kind == ScopeKind::Module {
                return scope.owner;
            }
            current = scope.parent;
        }
        None
    }

    // ========================================================================
    // Modules
    // ========================================================================

    /// Bind a whole program. Every module is declared first, so modules may
    /// refer to each other in any order.
    pub fn bind_program(&mut self, modules: &[&'a ModuleSyntax<'a>]) {
        let root = self.program.root_scope;
        let declared: Vec<SymbolId> = modules
            .iter()
            .filter_map(|module| self.declare_module(root, module))
            .collect();
        self.program.modules.extend(declared.iter().copied());
        for module in declared {
            self.bind_module(module);
        }
    }

    fn declare_module(&mut self, scope: ScopeId, syntax: &'a ModuleSyntax<'a>) -> Option<SymbolId> {
        let module_scope = self
            .program
            .add_scope(Scope::new(ScopeKind::Module, Some(scope), None));
        let symbol = Symbol::new(
            syntax.name,
            scope,
            syntax.pos,
            Decl::Module(ModuleDecl {
                syntax,
                status: BindStatus::Idle,
                entry: None,
            }),
        )
        .with_scope(module_scope);
        let symbol = self.declare_symbol(scope, symbol)?;
        self.program.scope_mut(module_scope).owner = Some(symbol);
        Some(symbol)
    }

    fn set_module_status(&mut self, module: SymbolId, status: BindStatus) {
        if let Decl::Module(decl) = &mut self.program.symbol_mut(module).decl {
            decl.status = status;
        }
    }

    /// Bind `module` if it has not been bound yet. A module that is already
    /// being bound is left alone; its collected declarations are visible.
    pub(crate) fn bind_module(&mut self, module: SymbolId) {
        let symbol = self.program.symbol(module);
        let (syntax, scope) = match (&symbol.decl, symbol.own_scope) {
            (Decl::Module(decl), Some(scope)) if decl.status == BindStatus::Idle => {
                (decl.syntax, scope)
            }
            _ => return,
        };
        self.set_module_status(module, BindStatus::Busy);
        let name = self.text(syntax.name);
        debug!(module = %name, "binding module");

        let mut entry = FunctionDecl::new(Role::Plain, None);
        entry.ret = Some(self.program.builtins.void);
        let entry = self.program.add_symbol(Symbol::new(
            self.names.entry,
            scope,
            syntax.pos,
            Decl::Function(entry),
        ));
        if let Decl::Module(decl) = &mut self.program.symbol_mut(module).decl {
            decl.entry = Some(entry);
        }

        let body = self
            .in_context(scope, Some(entry), Modifiers::NONE, syntax.pos, |b| {
                b.bind_scope_body(syntax.body)
            })
            .unwrap_or_default();
        let statements = body.len();
        if let Some(function) = self.program.function_mut(entry) {
            function.body = body;
        }
        self.set_module_status(module, BindStatus::Done);
        debug!(module = %name, statements, "bound module");
    }

    /// The scope of a module symbol, binding the module first if needed.
    pub(crate) fn module_scope(&mut self, module: SymbolId) -> Option<ScopeId> {
        if !matches!(self.program.symbol(module).decl, Decl::Module(_)) {
            return None;
        }
        self.bind_module(module);
        self.program.symbol(module).own_scope
    }

    fn bind_nested_module(&mut self, syntax: &'a ModuleSyntax<'a>) {
        let scope = self.current_scope();
        let found = self.program.scope(scope).get(syntax.name).filter(|symbol| {
            matches!(&self.program.symbol(*symbol).decl, Decl::Module(decl) if std::ptr::eq(decl.syntax, syntax))
        });
        if let Some(module) = found {
            self.bind_module(module);
        }
    }

    // ========================================================================
    // Scope bodies
    // ========================================================================

    /// Bind a statement list in the current scope.
    ///
    /// Declarations are collected before any statement is bound, so
    /// functions and structs can be used ahead of their declaration:
    /// 1. templates and nested modules
    /// 2. enums and extern blocks
    /// 3. aliases, imports and exports
    /// 4. statements, in order
    pub(crate) fn bind_scope_body(&mut self, body: &[SyntaxRef<'a>]) -> Vec<NodeId> {
        self.collect_declarations(body);
        self.collect_eager(body);
        self.bind_aliases(body);
        let mut nodes = Vec::with_capacity(body.len());
        self.bind_statements(body, &mut nodes, &mut Reachability::default());
        nodes
    }

    pub(crate) fn collect_declarations(&mut self, body: &[SyntaxRef<'a>]) {
        for &statement in body {
            match &statement.kind {
                SyntaxKind::Function(function) => {
                    let owner = self.current_struct();
                    self.collect_function(function, owner);
                }
                SyntaxKind::Struct(structure) => {
                    self.collect_struct(structure);
                }
                SyntaxKind::Module(module) => {
                    let scope = self.current_scope();
                    self.declare_module(scope, module);
                }
                SyntaxKind::Modified { modifiers, body } => {
                    self.with_modifiers(*modifiers, |b| b.collect_declarations(body))
                }
                _ => {}
            }
        }
    }

    pub(crate) fn collect_eager(&mut self, body: &[SyntaxRef<'a>]) {
        for &statement in body {
            match &statement.kind {
                SyntaxKind::Enum(syntax) => self.bind_enum(syntax),
                SyntaxKind::Extern { abi, body } => {
                    self.with_extern(*abi, |b| b.bind_extern_block(body))
                }
                SyntaxKind::Modified { modifiers, body } => {
                    self.with_modifiers(*modifiers, |b| b.collect_eager(body))
                }
                _ => {}
            }
        }
    }

    pub(crate) fn bind_aliases(&mut self, body: &[SyntaxRef<'a>]) {
        for &statement in body {
            let pos = statement.pos;
            match &statement.kind {
                SyntaxKind::Alias { name, target } => {
                    self.bind_alias(pos, *name, target, AliasTag::Define)
                }
                SyntaxKind::Export { name, target } => {
                    self.bind_alias(pos, *name, target, AliasTag::Export)
                }
                SyntaxKind::Import { path, alias } => self.bind_import(pos, path, *alias),
                SyntaxKind::Modified { modifiers, body } => {
                    self.with_modifiers(*modifiers, |b| b.bind_aliases(body))
                }
                _ => {}
            }
        }
    }

    pub(crate) fn bind_statements(
        &mut self,
        body: &[SyntaxRef<'a>],
        nodes: &mut Vec<NodeId>,
        reach: &mut Reachability,
    ) {
        for &statement in body {
            if let SyntaxKind::Modified { modifiers, body } = &statement.kind {
                self.with_modifiers(*modifiers, |b| b.bind_statements(body, nodes, reach));
                continue;
            }
            if let Some(keyword) = reach.terminator {
                if !reach.warned && !is_declaration(&statement.kind) {
                    reach.warned = true;
                    self.error(statement.pos, &messages::UNREACHABLE_AFTER_0, &[keyword]);
                }
            }
            if let Some(node) = self.bind_statement(statement) {
                nodes.push(node);
            }
            if reach.terminator.is_none() {
                reach.terminator = terminator_keyword(&statement.kind);
            }
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// Bind one statement. `None` means nothing was emitted, either because
    /// the statement is a declaration handled by an earlier pass or because
    /// it failed and was diagnosed.
    pub(crate) fn bind_statement(&mut self, statement: SyntaxRef<'a>) -> Option<NodeId> {
        let pos = statement.pos;
        let void = self.program.builtins.void;
        match &statement.kind {
            SyntaxKind::Define {
                name,
                ty,
                value,
                modifiers,
            } => self.bind_definition(pos, *name, *ty, *value, *modifiers),
            SyntaxKind::Function(_)
            | SyntaxKind::Struct(_)
            | SyntaxKind::Enum(_)
            | SyntaxKind::Alias { .. }
            | SyntaxKind::Import { .. }
            | SyntaxKind::Export { .. }
            | SyntaxKind::Extern { .. } => None,
            SyntaxKind::Module(module) => {
                self.bind_nested_module(module);
                None
            }
            SyntaxKind::Modified { modifiers, body } => {
                let mut nodes = Vec::new();
                self.with_modifiers(*modifiers, |b| {
                    b.bind_statements(body, &mut nodes, &mut Reachability::default())
                });
                let scope = self.current_scope();
                Some(self.add_node(
                    pos,
                    void,
                    NodeKind::Block {
                        scope,
                        label: None,
                        body: nodes,
                    },
                ))
            }
            SyntaxKind::Block { label, body } => self.bind_block(pos, *label, body),
            SyntaxKind::If {
                cond,
                then,
                otherwise,
            } => self.bind_if(pos, cond, then, *otherwise),
            SyntaxKind::Loop {
                label,
                init,
                cond,
                step,
                body,
            } => self.bind_loop(pos, *label, *init, *cond, *step, body),
            SyntaxKind::ForIn {
                label,
                name,
                iterable,
                body,
            } => self.bind_for_in(pos, *label, *name, iterable, body),
            SyntaxKind::Return(value) => self.bind_return(pos, *value),
            SyntaxKind::Break(label) => self.bind_jump(pos, *label, false),
            SyntaxKind::Continue(label) => self.bind_jump(pos, *label, true),
            SyntaxKind::Defer(inner) => {
                let inner = self.bind_statement(inner)?;
                Some(self.add_node(pos, void, NodeKind::Defer(inner)))
            }
            SyntaxKind::Yield(value) => self.bind_yield(pos, value),
            SyntaxKind::YieldFrom(value) => self.bind_yield_from(pos, value),
            _ => self.bind_expression(statement),
        }
    }

    pub(crate) fn bind_definition(
        &mut self,
        pos: SourcePos,
        name: Ident,
        ty: Option<SyntaxRef<'a>>,
        value: Option<SyntaxRef<'a>>,
        modifiers: Modifiers,
    ) -> Option<NodeId> {
        let modifiers = modifiers | (self.frame().modifiers & Modifiers::INHERITED);
        let declared = match ty {
            Some(ty) => Some(self.bind_type(ty)?),
            None => None,
        };
        let init = match value {
            Some(value) => Some(self.bind_value(value)?),
            None => None,
        };
        let (ty, init) = match (declared, init) {
            (Some(ty), Some(init)) => (ty, Some(self.cast(init, ty, CastIntent::Implicit)?)),
            (Some(ty), None) => (ty, None),
            (None, Some(init)) => {
                let init = self.read(init);
                if self.program.node(init).ty == self.program.builtins.null {
                    let text = self.text(name);
                    self.error(pos, &messages::MISSING_TYPE_OR_INITIALIZER_0, &[&text]);
                    return None;
                }
                let ty = self.promoted_literal_type(init);
                (ty, Some(self.cast(init, ty, CastIntent::Implicit)?))
            }
            (None, None) => {
                let text = self.text(name);
                self.error(pos, &messages::MISSING_TYPE_OR_INITIALIZER_0, &[&text]);
                return None;
            }
        };

        let scope = self.current_scope();
        if modifiers.contains(Modifiers::CONST) {
            let Some(init) = init else {
                let text = self.text(name);
                self.error(pos, &messages::MISSING_TYPE_OR_INITIALIZER_0, &[&text]);
                return None;
            };
            if self.const_value(init).is_none() {
                let value_pos = self.program.node(init).pos;
                self.error(value_pos, &messages::EXPRESSION_NOT_CONSTANT, &[]);
                return None;
            }
            let value = self.constant(init);
            let decl = Decl::ConstAlias {
                tag: AliasTag::Define,
                value,
            };
            self.declare_symbol(scope, Symbol::new(name, scope, pos, decl));
            return None;
        }

        let symbol = self.declare_variable(name, ty, pos, modifiers)?;
        let void = self.program.builtins.void;
        if let Decl::Field(_) = self.program.symbol(symbol).decl {
            // Generator state lives in the resumable struct.
            let value = init?;
            let target = self.reference(symbol, pos)?;
            return Some(self.add_node(pos, void, NodeKind::Assignment { target, value }));
        }
        Some(self.add_node(pos, void, NodeKind::Definition { symbol, value: init }))
    }

    /// Declare storage for a variable in the current scope: a global at
    /// module level or under `static`, a field of the resumable struct
    /// inside a generator, otherwise a local.
    pub(crate) fn declare_variable(
        &mut self,
        name: Ident,
        ty: TypeId,
        pos: SourcePos,
        modifiers: Modifiers,
    ) -> Option<SymbolId> {
        let scope = self.current_scope();
        let module_level = self.program.scope(scope).kind == ScopeKind::Module;
        if modifiers.contains(Modifiers::STATIC) || module_level {
            return self.declare_symbol(scope, Symbol::new(name, scope, pos, Decl::Global { ty }));
        }
        if let Some(owner) = self.generator_state() {
            let index = self.program.struct_decl(owner).map_or(0, |decl| decl.fields.len());
            let decl = Decl::Field(FieldDecl {
                ty,
                owner,
                index,
                kind: FieldKind::Ordinary,
                default: None,
            });
            let field = self.declare_symbol(scope, Symbol::new(name, scope, pos, decl))?;
            if let Some(decl) = self.program.struct_decl_mut(owner) {
                decl.fields.push(field);
            }
            return Some(field);
        }
        self.declare_symbol(scope, Symbol::new(name, scope, pos, Decl::Local { ty }))
    }

    /// The resumable struct of the generator body being bound.
    pub(crate) fn generator_state(&self) -> Option<SymbolId> {
        let function = self.program.function(self.current_function()?)?;
        match function.role {
            Role::GeneratorStep => function.owner,
            _ => None,
        }
    }

    fn bind_block(
        &mut self,
        pos: SourcePos,
        label: Option<Ident>,
        body: &[SyntaxRef<'a>],
    ) -> Option<NodeId> {
        let scope = self.new_scope(ScopeKind::Block);
        let void = self.program.builtins.void;
        self.in_scope(scope, pos, |b| {
            let label = match label {
                Some(name) => Some(b.declare_label(Some(name), false, pos)?),
                None => None,
            };
            let body = b.bind_scope_body(body);
            Some(b.add_node(pos, void, NodeKind::Block { scope, label, body }))
        })
        .flatten()
    }

    /// Bind a branch or loop body. A single statement gets its own block
    /// scope.
    pub(crate) fn bind_branch(&mut self, statement: SyntaxRef<'a>) -> Option<NodeId> {
        match &statement.kind {
            SyntaxKind::Block { label, body } => self.bind_block(statement.pos, *label, body),
            _ => self.bind_block(statement.pos, None, &[statement]),
        }
    }

    fn bind_if(
        &mut self,
        pos: SourcePos,
        cond: SyntaxRef<'a>,
        then: SyntaxRef<'a>,
        otherwise: Option<SyntaxRef<'a>>,
    ) -> Option<NodeId> {
        let cond = self.bind_condition(cond);
        let then = self.bind_branch(then);
        let otherwise = otherwise.map(|branch| self.bind_branch(branch));
        let otherwise = match otherwise {
            Some(branch) => Some(branch?),
            None => None,
        };
        let (cond, then) = (cond?, then?);
        let void = self.program.builtins.void;
        Some(self.add_node(
            pos,
            void,
            NodeKind::If {
                cond,
                then,
                otherwise,
            },
        ))
    }

    fn bind_loop(
        &mut self,
        pos: SourcePos,
        label: Option<Ident>,
        init: Option<SyntaxRef<'a>>,
        cond: Option<SyntaxRef<'a>>,
        step: Option<SyntaxRef<'a>>,
        body: SyntaxRef<'a>,
    ) -> Option<NodeId> {
        let scope = self.new_scope(ScopeKind::Block);
        let void = self.program.builtins.void;
        self.in_scope(scope, pos, |b| {
            let label = b.declare_label(label, true, pos)?;
            let init = init.and_then(|init| b.bind_statement(init));
            let cond = cond.map(|cond| b.bind_condition(cond));
            let step = step.and_then(|step| b.bind_statement(step));
            let body = b.with_loop(label, |b| b.bind_branch(body));
            let cond = match cond {
                Some(cond) => Some(cond?),
                None => None,
            };
            Some(b.add_node(
                pos,
                void,
                NodeKind::Loop {
                    scope,
                    label,
                    init,
                    cond,
                    step,
                    body: body?,
                },
            ))
        })
        .flatten()
    }

    /// Declare a block or loop label in the current scope. Unnamed loops
    /// get a generated label so `break` always has a target.
    pub(crate) fn declare_label(
        &mut self,
        name: Option<Ident>,
        is_loop: bool,
        pos: SourcePos,
    ) -> Option<SymbolId> {
        let name = name.unwrap_or_else(|| self.idents.generate("loop"));
        let scope = self.current_scope();
        let function = self.current_function();
        let decl = Decl::Label(LabelDecl { is_loop, function });
        self.declare_symbol(scope, Symbol::new(name, scope, pos, decl))
    }

    fn bind_jump(&mut self, pos: SourcePos, label: Option<Ident>, is_continue: bool) -> Option<NodeId> {
        let keyword = if is_continue { "continue" } else { "break" };
        let target = match label {
            None => match self.frame().loop_label {
                Some(label) => label,
                None => {
                    self.error(pos, &messages::BREAK_OUTSIDE_LOOP, &[keyword]);
                    return None;
                }
            },
            Some(name) => {
                let function = self.current_function();
                let found = self
                    .program
                    .lookup(self.current_scope(), name)
                    .filter(|symbol| {
                        matches!(&self.program.symbol(*symbol).decl, Decl::Label(label) if label.function == function)
                    });
                match found {
                    Some(label) => label,
                    None => {
                        let text = self.text(name);
                        self.error(pos, &messages::CANNOT_FIND_LABEL_0, &[&text]);
                        return None;
                    }
                }
            }
        };
        let is_loop = matches!(&self.program.symbol(target).decl, Decl::Label(label) if label.is_loop);
        if is_continue && !is_loop {
            let text = self.symbol_name(target);
            self.error(pos, &messages::CONTINUE_TARGET_NOT_LOOP_0, &[&text]);
            return None;
        }
        let void = self.program.builtins.void;
        let kind = if is_continue {
            NodeKind::Continue(target)
        } else {
            NodeKind::Break(target)
        };
        Some(self.add_node(pos, void, kind))
    }

    fn bind_return(&mut self, pos: SourcePos, value: Option<SyntaxRef<'a>>) -> Option<NodeId> {
        let void = self.program.builtins.void;
        let Some(function) = self.current_function() else {
            self.error(pos, &messages::RETURN_OUTSIDE_FUNCTION, &[]);
            return None;
        };
        let (role, ret) = {
            let decl = self.program.function(function)?;
            (decl.role, decl.ret)
        };
        if role == Role::GeneratorStep {
            if value.is_some() {
                self.error(pos, &messages::GENERATOR_RETURNS_VALUE, &[]);
                return None;
            }
            return Some(self.add_node(pos, void, NodeKind::Return(None)));
        }

        let Some(value) = value else {
            match ret {
                None => self.set_return_type(function, void),
                Some(ret) if ret != void => {
                    let expected = self.type_name(ret);
                    self.error(pos, &messages::CANNOT_IMPLICITLY_CONVERT_0_TO_1, &["Void", &expected]);
                    return None;
                }
                Some(_) => {}
            }
            return Some(self.add_node(pos, void, NodeKind::Return(None)));
        };

        let node = self.bind_value(value)?;
        let returns_reference = ret.is_some_and(|ret| self.program.types.is_reference(ret));
        let node = if returns_reference { node } else { self.read(node) };
        let ty = match ret {
            Some(ret) => ret,
            None => {
                let ty = self.promoted_literal_type(node);
                self.set_return_type(function, ty);
                ty
            }
        };
        let node = self.cast(node, ty, CastIntent::Implicit)?;
        Some(self.add_node(pos, void, NodeKind::Return(Some(node))))
    }

    pub(crate) fn set_return_type(&mut self, function: SymbolId, ty: TypeId) {
        if let Some(decl) = self.program.function_mut(function) {
            decl.ret = Some(ty);
        }
    }

    // ========================================================================
    // Aliases, imports, exports
    // ========================================================================

    fn bind_alias(&mut self, pos: SourcePos, name: Ident, target: SyntaxRef<'a>, tag: AliasTag) {
        let scope = self.current_scope();
        let Some(operand) = self.bind_operand(target) else {
            return;
        };
        let decl = match operand {
            Operand::Type(ty) => Decl::TypeAlias { tag, ty },
            Operand::Module(symbol)
            | Operand::Callable {
                symbol,
                receiver: None,
            } => Decl::ValueAlias {
                tag,
                target: symbol,
            },
            Operand::Value(node) => {
                let plain = match &self.program.node(node).kind {
                    NodeKind::ValueName { symbol, captures } if captures.is_empty() => Some(*symbol),
                    _ => None,
                };
                match plain {
                    Some(symbol) => Decl::ValueAlias {
                        tag,
                        target: symbol,
                    },
                    None if self.const_value(node).is_some() => Decl::ConstAlias {
                        tag,
                        value: self.constant(node),
                    },
                    None => {
                        self.error(target.pos, &messages::EXPRESSION_NOT_CONSTANT, &[]);
                        return;
                    }
                }
            }
            Operand::Callable {
                receiver: Some(_), ..
            } => {
                let text = self.text(name);
                self.error(target.pos, &messages::NAME_0_IS_NOT_A_VALUE, &[&text]);
                return;
            }
        };
        self.declare_symbol(scope, Symbol::new(name, scope, pos, decl));
    }

    /// `import a.b.c [as n]`. The imported name lands in the scope's other
    /// list, so it is visible here but never re-exported.
    fn bind_import(&mut self, pos: SourcePos, path: &'a [Ident], alias: Option<Ident>) {
        let Some((&first, rest)) = path.split_first() else {
            return;
        };
        let scope = self.current_scope();
        let mut text = self.text(first);
        let Some(root) = self.program.lookup(scope, first) else {
            self.error(pos, &messages::CANNOT_FIND_MODULE_0, &[&text]);
            return;
        };
        let root = self.program.resolve_alias(root);
        if Some(root) == self.current_module() {
            self.error(pos, &messages::MODULE_IMPORTS_ITSELF_0, &[&text]);
            return;
        }

        let mut target = root;
        for &segment in rest {
            let Some(member_scope) = self.module_scope(target) else {
                self.error(pos, &messages::CANNOT_FIND_MODULE_0, &[&text]);
                return;
            };
            match self.program.lookup_through_dot(member_scope, segment) {
                Some(member) => target = self.program.resolve_alias(member),
                None => {
                    let member = self.text(segment);
                    self.error(pos, &messages::CANNOT_IMPORT_0_FROM_1, &[&member, &text]);
                    return;
                }
            }
            text = format!("{}.{}", text, self.idents.resolve(segment));
        }

        let name = alias.unwrap_or(path[path.len() - 1]);
        let decl = Decl::ValueAlias {
            tag: AliasTag::Import,
            target,
        };
        if let Err(existing) = self
            .program
            .declare_other(scope, Symbol::new(name, scope, pos, decl))
        {
            self.report_duplicate(name, pos, existing);
        }
    }

    // ========================================================================
    // Enums and extern blocks
    // ========================================================================

    fn bind_enum(&mut self, syntax: &'a EnumSyntax<'a>) {
        let scope = self.current_scope();
        let base = match syntax.base {
            Some(base) => match self.bind_type(base) {
                Some(base) => base,
                None => return,
            },
            None => self.program.builtins.int32,
        };
        let Some(Scalar::Int { bits, signed }) = self.program.scalar(base) else {
            let text = self.type_name(base);
            self.error(syntax.pos, &messages::ENUM_BASE_NOT_INTEGRAL_0, &[&text]);
            return;
        };

        let enum_scope = self
            .program
            .add_scope(Scope::new(ScopeKind::Enum, Some(scope), None));
        let decl = Decl::Enum(EnumDecl {
            base,
            members: Vec::new(),
        });
        let symbol = Symbol::new(syntax.name, scope, syntax.pos, decl).with_scope(enum_scope);
        let Some(symbol) = self.declare_symbol(scope, symbol) else {
            return;
        };
        self.program.scope_mut(enum_scope).owner = Some(symbol);
        let ty = self.program.types.direct(symbol);

        let mut members = Vec::with_capacity(syntax.members.len());
        let mut next: i128 = 0;
        for member in syntax.members {
            let value = match member.value {
                Some(value) => {
                    let node = self
                        .in_scope(enum_scope, member.pos, |b| b.bind_value(value))
                        .flatten();
                    match node.and_then(|node| self.const_value(node)).and_then(ConstValue::as_int) {
                        Some(value) => value,
                        None => {
                            self.error(value.pos, &messages::EXPRESSION_NOT_CONSTANT, &[]);
                            continue;
                        }
                    }
                }
                None => next,
            };
            let value = wrap_int(value, bits, signed);
            let node = self.add_node(
                member.pos,
                ty,
                NodeKind::Literal {
                    value: ConstValue::Int(value),
                    adaptable: false,
                },
            );
            let decl = Decl::ConstAlias {
                tag: AliasTag::Define,
                value: node,
            };
            if let Some(member) =
                self.declare_symbol(enum_scope, Symbol::new(member.name, enum_scope, member.pos, decl))
            {
                members.push((member, ConstValue::Int(value)));
            }
            next = value + 1;
        }
        if let Decl::Enum(decl) = &mut self.program.symbol_mut(symbol).decl {
            decl.members = members;
        }
    }

    fn bind_extern_block(&mut self, body: &[SyntaxRef<'a>]) {
        for &statement in body {
            match &statement.kind {
                SyntaxKind::Function(function) => {
                    self.bind_extern_function(function);
                }
                SyntaxKind::Modified { modifiers, body } => {
                    self.with_modifiers(*modifiers, |b| b.bind_extern_block(body))
                }
                _ => self.error(
                    statement.pos,
                    &messages::UNIMPLEMENTED_0,
                    &["A non-function declaration in an extern block"],
                ),
            }
        }
    }

    /// Extern functions are concrete from the start: every parameter is
    /// typed and there is no body to bind.
    fn bind_extern_function(&mut self, syntax: &'a FunctionSyntax<'a>) -> Option<SymbolId> {
        let scope = self.current_scope();
        let name = self.template_name(syntax);
        let text = self.text(name);
        if syntax.body.is_some() {
            self.error(syntax.pos, &messages::EXTERN_BODY_0, &[&text]);
        }
        let modifiers = syntax.modifiers | (self.frame().modifiers & Modifiers::INHERITED);
        let mut decl = FunctionDecl::new(Role::Plain, None);
        decl.abi = self.frame().extern_abi;
        decl.modifiers = modifiers;

        let function_scope = self
            .program
            .add_scope(Scope::new(ScopeKind::Function, Some(scope), None));
        let symbol = Symbol::new(name, scope, syntax.pos, Decl::Function(decl)).with_scope(function_scope);
        let symbol = self.declare_symbol(scope, symbol)?;
        self.program.scope_mut(function_scope).owner = Some(symbol);

        let void = self.program.builtins.void;
        self.in_context(function_scope, Some(symbol), modifiers, syntax.pos, |b| {
            let mut params = Vec::with_capacity(syntax.params.len());
            for (index, param) in syntax.params.iter().enumerate() {
                let ty = match param.ty {
                    Some(ty) if !param.vararg => b.bind_type(ty),
                    _ => {
                        b.error(param.pos, &messages::EXTERN_PARAMETER_TYPE_0, &[&text]);
                        None
                    }
                };
                let Some(ty) = ty else { continue };
                let decl = Decl::Parameter { ty, index };
                if let Some(param) =
                    b.declare_symbol(function_scope, Symbol::new(param.name, function_scope, param.pos, decl))
                {
                    params.push(param);
                }
            }
            let ret = match syntax.return_type {
                Some(ty) => b.bind_type(ty).unwrap_or(b.program.types.unknown),
                None => void,
            };
            if let Some(function) = b.program.function_mut(symbol) {
                function.params = params;
                function.ret = Some(ret);
            }
        });
        Some(symbol)
    }
}

pub(crate) fn is_declaration(kind: &SyntaxKind<'_>) -> bool {
    matches!(
        kind,
        SyntaxKind::Function(_)
            | SyntaxKind::Struct(_)
            | SyntaxKind::Enum(_)
            | SyntaxKind::Alias { .. }
            | SyntaxKind::Import { .. }
            | SyntaxKind::Export { .. }
            | SyntaxKind::Module(_)
            | SyntaxKind::Extern { .. }
    )
}

fn terminator_keyword(kind: &SyntaxKind<'_>) -> Option<&'static str> {
    match kind {
        SyntaxKind::Return(_) => Some("return"),
        SyntaxKind::Break(_) => Some("break"),
        SyntaxKind::Continue(_) => Some("continue"),
        _ => None,
    }
}
