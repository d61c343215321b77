//! Arena allocation for syntax trees.
//!
//! The parser collaborator (or the JSON syntax loader) allocates every syntax
//! node from one bump arena. The binder only ever holds shared references
//! into it, so the arena must outlive binding and lowering.

use bumpalo::Bump;

/// Owns the memory behind every syntax node of a compilation.
///
/// Nodes are never freed individually; dropping the arena releases the
/// whole tree at once.
pub struct SyntaxArena {
    bump: Bump,
}

impl SyntaxArena {
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    #[inline]
    pub fn alloc<T>(&self, val: T) -> &T {
        self.bump.alloc(val)
    }

    /// Move the contents of `items` into the arena as an immutable slice.
    #[inline]
    pub fn alloc_vec<T>(&self, items: Vec<T>) -> &[T] {
        self.bump.alloc_slice_fill_iter(items)
    }

    #[inline]
    pub fn alloc_str(&self, s: &str) -> &str {
        self.bump.alloc_str(s)
    }

    /// Bytes handed out so far.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }
}

impl Default for SyntaxArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_vec_keeps_order() {
        let arena = SyntaxArena::new();
        let items = arena.alloc_vec(vec![3, 1, 2]);
        assert_eq!(items, &[3, 1, 2]);
        assert!(arena.allocated_bytes() > 0);
    }
}
