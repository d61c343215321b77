//! Hashing collections used throughout the compiler.
//!
//! Compiler-internal keys are small integers, so FxHash is used everywhere
//! DoS resistance does not matter.

use rustc_hash::FxBuildHasher;

pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;
pub type FxHashSet<T> = rustc_hash::FxHashSet<T>;

/// Insertion-ordered map with O(1) lookup. Scopes use it so that iteration
/// reproduces declaration order.
pub type FxIndexMap<K, V> = indexmap::IndexMap<K, V, FxBuildHasher>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_map_preserves_order() {
        let mut map = FxIndexMap::default();
        map.insert("c", 3);
        map.insert("a", 1);
        map.insert("b", 2);

        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }
}
