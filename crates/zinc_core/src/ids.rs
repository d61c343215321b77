//! Typed index handles.
//!
//! Every arena-like table in the compiler hands out a `u32` newtype. The
//! macro keeps the handles distinct at the type level so a scope index can
//! never be used to fetch a symbol.

/// Declare a `u32` index newtype with an `INVALID` sentinel.
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $vis:vis struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
        $vis struct $name(pub u32);

        impl $name {
            pub const INVALID: $name = $name(u32::MAX);

            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub fn from_index(index: usize) -> Self {
                debug_assert!(index < u32::MAX as usize);
                $name(index as u32)
            }

            #[inline]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    define_id! {
        /// Test handle.
        pub struct ProbeId;
    }

    #[test]
    fn test_round_trips_index() {
        let id = ProbeId::from_index(7);
        assert_eq!(id.index(), 7);
        assert!(id.is_valid());
        assert!(!ProbeId::INVALID.is_valid());
        assert_eq!(id.to_string(), "ProbeId(7)");
    }
}
