//! Value types.
//!
//! A type is a symbol seen through zero or more pointer/reference
//! indirections. Types are interned in a `TypeTable` and referenced by
//! `TypeId`, so equal types always share one id and comparing two types is
//! an integer comparison.

use crate::symbol::SymbolId;
use zinc_core::collections::FxHashMap;
use zinc_core::define_id;

define_id! {
    /// Handle to an interned type.
    pub struct TypeId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// The type of an erroneous or not-yet-inferred expression.
    Unknown,
    Direct(SymbolId),
    Pointer(TypeId),
    Reference(TypeId),
}

/// Interning table for types.
#[derive(Debug)]
pub struct TypeTable {
    kinds: Vec<TypeKind>,
    interned: FxHashMap<TypeKind, TypeId>,
    pub unknown: TypeId,
}

impl TypeTable {
    pub fn new() -> Self {
        let mut table = Self {
            kinds: Vec::with_capacity(256),
            interned: FxHashMap::default(),
            unknown: TypeId(0),
        };
        table.unknown = table.intern(TypeKind::Unknown);
        table
    }

    pub fn intern(&mut self, kind: TypeKind) -> TypeId {
        if let Some(&id) = self.interned.get(&kind) {
            return id;
        }
        let id = TypeId::from_index(self.kinds.len());
        self.kinds.push(kind);
        self.interned.insert(kind, id);
        id
    }

    #[inline]
    pub fn kind(&self, id: TypeId) -> TypeKind {
        self.kinds[id.index()]
    }

    pub fn direct(&mut self, symbol: SymbolId) -> TypeId {
        self.intern(TypeKind::Direct(symbol))
    }

    pub fn pointer(&mut self, pointee: TypeId) -> TypeId {
        self.intern(TypeKind::Pointer(pointee))
    }

    pub fn reference(&mut self, pointee: TypeId) -> TypeId {
        self.intern(TypeKind::Reference(pointee))
    }

    pub fn is_unknown(&self, id: TypeId) -> bool {
        id == self.unknown
    }

    pub fn is_pointer(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Pointer(_))
    }

    pub fn is_reference(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Reference(_))
    }

    /// Pointer or reference.
    pub fn is_indirect(&self, id: TypeId) -> bool {
        self.pointee(id).is_some()
    }

    /// The pointee of a pointer or reference type.
    pub fn pointee(&self, id: TypeId) -> Option<TypeId> {
        match self.kind(id) {
            TypeKind::Pointer(inner) | TypeKind::Reference(inner) => Some(inner),
            _ => None,
        }
    }

    /// `T` for `T&`, otherwise the type itself.
    pub fn strip_reference(&self, id: TypeId) -> TypeId {
        match self.kind(id) {
            TypeKind::Reference(inner) => inner,
            _ => id,
        }
    }

    /// The symbol of a direct type.
    pub fn symbol(&self, id: TypeId) -> Option<SymbolId> {
        match self.kind(id) {
            TypeKind::Direct(symbol) => Some(symbol),
            _ => None,
        }
    }

    /// The symbol under every level of indirection.
    pub fn base_symbol(&self, mut id: TypeId) -> Option<SymbolId> {
        loop {
            match self.kind(id) {
                TypeKind::Direct(symbol) => return Some(symbol),
                TypeKind::Pointer(inner) | TypeKind::Reference(inner) => id = inner,
                TypeKind::Unknown => return None,
            }
        }
    }

    pub fn indirection_depth(&self, mut id: TypeId) -> usize {
        let mut depth = 0;
        while let Some(inner) = self.pointee(id) {
            depth += 1;
            id = inner;
        }
        depth
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types_are_interned() {
        let mut table = TypeTable::new();
        let int = table.direct(SymbolId(3));
        let p1 = table.pointer(int);
        let p2 = table.pointer(int);
        let r = table.reference(int);

        assert_eq!(p1, p2);
        assert_ne!(p1, r);
        assert_eq!(table.pointee(p1), Some(int));
        assert_eq!(table.strip_reference(r), int);
        assert_eq!(table.strip_reference(p1), p1);
    }

    #[test]
    fn test_nested_indirection() {
        let mut table = TypeTable::new();
        let int = table.direct(SymbolId(1));
        let pp = {
            let p = table.pointer(int);
            table.pointer(p)
        };
        let rpp = table.reference(pp);

        assert_eq!(table.indirection_depth(rpp), 3);
        assert_eq!(table.base_symbol(rpp), Some(SymbolId(1)));
        assert_eq!(table.base_symbol(table.unknown), None);
        assert!(table.is_unknown(table.unknown));
    }
}
