//! Lexical scopes.

use crate::symbol::SymbolId;
use zinc_core::collections::FxIndexMap;
use zinc_core::define_id;
use zinc_core::intern::Ident;

define_id! {
    /// Handle to a scope in the program's scope arena.
    pub struct ScopeId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Builtin,
    /// Holds the top-level modules.
    Root,
    Module,
    Struct,
    Function,
    Block,
    Enum,
}

/// A lexical region. Names are unique within one scope; iteration follows
/// declaration order.
#[derive(Debug)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub owner: Option<SymbolId>,
    pub kind: ScopeKind,
    symbols: FxIndexMap<Ident, SymbolId>,
    /// Imported names. Visible inside the scope and through qualified
    /// lookup, kept apart from the scope's own declarations.
    others: FxIndexMap<Ident, SymbolId>,
}

impl Scope {
    pub fn new(kind: ScopeKind, parent: Option<ScopeId>, owner: Option<SymbolId>) -> Self {
        Self {
            parent,
            owner,
            kind,
            symbols: FxIndexMap::default(),
            others: FxIndexMap::default(),
        }
    }

    pub fn get(&self, name: Ident) -> Option<SymbolId> {
        self.symbols.get(&name).copied()
    }

    pub fn get_other(&self, name: Ident) -> Option<SymbolId> {
        self.others.get(&name).copied()
    }

    /// Own symbols first, then imports.
    pub fn find(&self, name: Ident) -> Option<SymbolId> {
        self.get(name).or_else(|| self.get_other(name))
    }

    /// Insert `symbol` under `name`. Returns the existing symbol when the
    /// name is taken; the scope is left unchanged in that case.
    pub(crate) fn insert(&mut self, name: Ident, symbol: SymbolId) -> Result<(), SymbolId> {
        if let Some(existing) = self.find(name) {
            return Err(existing);
        }
        self.symbols.insert(name, symbol);
        Ok(())
    }

    pub(crate) fn insert_other(&mut self, name: Ident, symbol: SymbolId) -> Result<(), SymbolId> {
        if let Some(existing) = self.find(name) {
            return Err(existing);
        }
        self.others.insert(name, symbol);
        Ok(())
    }

    pub fn symbols(&self) -> impl Iterator<Item = (Ident, SymbolId)> + '_ {
        self.symbols.iter().map(|(name, symbol)| (*name, *symbol))
    }

    pub fn others(&self) -> impl Iterator<Item = (Ident, SymbolId)> + '_ {
        self.others.iter().map(|(name, symbol)| (*name, *symbol))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
