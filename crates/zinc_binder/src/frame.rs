//! The binder's frame stack.
//!
//! Every scope the binder enters pushes a `Frame`; leaving pops it. Frames
//! carry the context that flows down into nested binding: propagated
//! modifiers, the enclosing extern block, the function whose body is being
//! bound and the innermost loop.

use tracing::trace;
use zinc_core::text::SourcePos;
use zinc_diagnostics::messages;
use zinc_syntax::Modifiers;

use crate::binder::Binder;
use crate::scope::ScopeId;
use crate::symbol::SymbolId;

#[derive(Debug, Clone)]
pub(crate) struct Frame<'a> {
    pub scope: ScopeId,
    pub depth: usize,
    pub modifiers: Modifiers,
    pub extern_abi: Option<&'a str>,
    pub function: Option<SymbolId>,
    /// Label of the innermost enclosing loop of the current function.
    pub loop_label: Option<SymbolId>,
}

impl<'a> Frame<'a> {
    pub fn root(scope: ScopeId) -> Self {
        Self {
            scope,
            depth: 0,
            modifiers: Modifiers::NONE,
            extern_abi: None,
            function: None,
            loop_label: None,
        }
    }
}

impl<'a> Binder<'a> {
    pub(crate) fn frame(&self) -> &Frame<'a> {
        // The root frame is never popped.
        &self.frames[self.frames.len() - 1]
    }

    pub(crate) fn frame_mut(&mut self) -> &mut Frame<'a> {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    pub(crate) fn current_scope(&self) -> ScopeId {
        self.frame().scope
    }

    pub(crate) fn current_function(&self) -> Option<SymbolId> {
        self.frame().function
    }

    fn push_frame(&mut self, frame: Frame<'a>, pos: SourcePos) -> bool {
        if frame.depth > self.options.max_nesting_depth {
            let limit = self.options.max_nesting_depth.to_string();
            self.error(pos, &messages::NESTING_TOO_DEEP_0, &[&limit]);
            return false;
        }
        trace!(scope = frame.scope.0, depth = frame.depth, "enter scope");
        self.frames.push(frame);
        true
    }

    fn pop_frame(&mut self, scope: ScopeId) {
        debug_assert!(self.frames.len() > 1, "popped the root frame");
        let frame = self.frames.pop();
        debug_assert_eq!(frame.as_ref().map(|frame| frame.scope), Some(scope));
        trace!(scope = scope.0, "leave scope");
    }

    /// Run `f` inside `scope`, inheriting the current context. Returns
    /// `None` when the nesting limit is exceeded.
    pub(crate) fn in_scope<R>(
        &mut self,
        scope: ScopeId,
        pos: SourcePos,
        f: impl FnOnce(&mut Self) -> R,
    ) -> Option<R> {
        let frame = Frame {
            scope,
            depth: self.frame().depth + 1,
            ..self.frame().clone()
        };
        if !self.push_frame(frame, pos) {
            return None;
        }
        let result = f(self);
        self.pop_frame(scope);
        Some(result)
    }

    /// Run `f` inside `scope` with a fresh context: the body of `function`,
    /// outside any loop or extern block. Used for function bodies, struct
    /// bodies and lazily bound modules.
    pub(crate) fn in_context<R>(
        &mut self,
        scope: ScopeId,
        function: Option<SymbolId>,
        modifiers: Modifiers,
        pos: SourcePos,
        f: impl FnOnce(&mut Self) -> R,
    ) -> Option<R> {
        let frame = Frame {
            scope,
            depth: self.frame().depth + 1,
            modifiers: modifiers & Modifiers::INHERITED,
            extern_abi: None,
            function,
            loop_label: None,
        };
        if !self.push_frame(frame, pos) {
            return None;
        }
        let result = f(self);
        self.pop_frame(scope);
        Some(result)
    }

    /// Run `f` with `modifiers` added to the current frame.
    pub(crate) fn with_modifiers<R>(
        &mut self,
        modifiers: Modifiers,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let saved = self.frame().modifiers;
        self.frame_mut().modifiers = saved | modifiers;
        let result = f(self);
        self.frame_mut().modifiers = saved;
        result
    }

    pub(crate) fn with_extern<R>(&mut self, abi: &'a str, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.frame_mut().extern_abi.replace(abi);
        let result = f(self);
        self.frame_mut().extern_abi = saved;
        result
    }

    pub(crate) fn with_loop<R>(&mut self, label: SymbolId, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.frame_mut().loop_label.replace(label);
        let result = f(self);
        self.frame_mut().loop_label = saved;
        result
    }
}
