//! The process-wide identifier table.
//!
//! Every name the binder sees is interned once so that scope lookups compare
//! integer handles. The table is created by the session before any scope
//! exists, warmed up with the builtin names, shared by reference with every
//! later stage and torn down after lowering.

use lasso::{Spur, ThreadedRodeo};
use std::fmt;
use std::sync::Arc;

/// An interned, case-sensitive identifier. Comparing two `Ident`s is an
/// integer comparison.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Ident(Spur);

impl Ident {
    #[inline]
    pub fn from_spur(spur: Spur) -> Self {
        Self(spur)
    }

    #[inline]
    pub fn as_spur(self) -> Spur {
        self.0
    }
}

impl fmt::Debug for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ident({:?})", self.0)
    }
}

/// Shared identifier table.
///
/// Cloning is cheap (an `Arc` bump); all clones observe the same table.
#[derive(Clone)]
pub struct IdentTable {
    rodeo: Arc<ThreadedRodeo>,
    generated: Arc<std::sync::atomic::AtomicU32>,
}

impl IdentTable {
    /// Create the table. Must happen before any scope is created.
    pub fn init() -> Self {
        Self {
            rodeo: Arc::new(ThreadedRodeo::new()),
            generated: Arc::new(std::sync::atomic::AtomicU32::new(0)),
        }
    }

    /// Pre-intern a fixed set of names (builtin type names, keywords used as
    /// member names). Returns the handles in the same order.
    pub fn warm_up(&self, names: &[&'static str]) -> Vec<Ident> {
        names
            .iter()
            .map(|name| Ident::from_spur(self.rodeo.get_or_intern_static(name)))
            .collect()
    }

    #[inline]
    pub fn intern(&self, s: &str) -> Ident {
        Ident::from_spur(self.rodeo.get_or_intern(s))
    }

    #[inline]
    pub fn intern_static(&self, s: &'static str) -> Ident {
        Ident::from_spur(self.rodeo.get_or_intern_static(s))
    }

    /// Look up an identifier without interning it.
    #[inline]
    pub fn get(&self, s: &str) -> Option<Ident> {
        self.rodeo.get(s).map(Ident::from_spur)
    }

    #[inline]
    pub fn resolve(&self, key: Ident) -> &str {
        self.rodeo.resolve(&key.as_spur())
    }

    /// Produce a fresh name that can never collide with a source identifier,
    /// used for anonymous and operator declarations.
    pub fn generate(&self, hint: &str) -> Ident {
        let n = self
            .generated
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        self.intern(&format!("{}${}", hint, n))
    }

    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }

    /// Drop this handle. The table itself is freed once the last clone is
    /// gone; returns how many identifiers it held for statistics output.
    pub fn teardown(self) -> usize {
        self.rodeo.len()
    }
}

impl Default for IdentTable {
    fn default() -> Self {
        Self::init()
    }
}

impl fmt::Debug for IdentTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentTable")
            .field("len", &self.len())
            .finish()
    }
}

/// `Display` adapter for an identifier.
pub struct DisplayIdent<'a> {
    pub key: Ident,
    pub table: &'a IdentTable,
}

impl<'a> fmt::Display for DisplayIdent<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table.resolve(self.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_case_sensitive() {
        let table = IdentTable::init();
        let a = table.intern("value");
        let b = table.intern("value");
        let c = table.intern("Value");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.resolve(c), "Value");
    }

    #[test]
    fn test_warm_up_matches_intern() {
        let table = IdentTable::init();
        let warmed = table.warm_up(&["Int32", "Bool"]);
        assert_eq!(warmed[0], table.intern("Int32"));
        assert_eq!(table.get("Bool"), Some(warmed[1]));
        assert!(table.get("Float").is_none());
    }

    #[test]
    fn test_generated_names_are_unique() {
        let table = IdentTable::init();
        let a = table.generate("lambda");
        let b = table.generate("lambda");
        assert_ne!(a, b);
        assert!(table.resolve(a).starts_with("lambda$"));
    }

    #[test]
    fn test_clones_share_storage() {
        let table = IdentTable::init();
        let other = table.clone();
        let a = other.intern("shared");
        assert_eq!(table.get("shared"), Some(a));
        assert_eq!(other.teardown(), 1);
    }
}
