//! Operator, modifier and literal tags used by syntax nodes.

use std::fmt;

bitflags::bitflags! {
    /// Declaration qualifiers. They propagate from modifier blocks into
    /// every declaration nested inside.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u16 {
        const NONE   = 0;
        const STATIC = 1 << 0;
        const CONST  = 1 << 1;
        const ASYNC  = 1 << 2;
        const EXPORT = 1 << 3;
        const EXTERN = 1 << 4;

        /// Qualifiers inherited by nested declarations.
        const INHERITED = Self::STATIC.bits() | Self::CONST.bits() | Self::ASYNC.bits();
    }
}

impl Modifiers {
    /// Parse a single modifier keyword.
    pub fn from_keyword(keyword: &str) -> Option<Modifiers> {
        match keyword {
            "static" => Some(Modifiers::STATIC),
            "const" => Some(Modifiers::CONST),
            "async" => Some(Modifiers::ASYNC),
            "export" => Some(Modifiers::EXPORT),
            "extern" => Some(Modifiers::EXTERN),
            _ => None,
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Coalesce,
}

/// Operators grouped by the built-in rule set that types them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorFamily {
    Relational,
    Logical,
    Coalesce,
    Bitwise,
    Shift,
    Additive,
    Multiplicative,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 19] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Rem,
        BinaryOp::BitAnd,
        BinaryOp::BitOr,
        BinaryOp::BitXor,
        BinaryOp::Shl,
        BinaryOp::Shr,
        BinaryOp::Eq,
        BinaryOp::Ne,
        BinaryOp::Lt,
        BinaryOp::Le,
        BinaryOp::Gt,
        BinaryOp::Ge,
        BinaryOp::And,
        BinaryOp::Or,
        BinaryOp::Coalesce,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Coalesce => "??",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<BinaryOp> {
        Self::ALL.iter().copied().find(|op| op.symbol() == symbol)
    }

    pub fn family(self) -> OperatorFamily {
        match self {
            BinaryOp::Add | BinaryOp::Sub => OperatorFamily::Additive,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => OperatorFamily::Multiplicative,
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => OperatorFamily::Bitwise,
            BinaryOp::Shl | BinaryOp::Shr => OperatorFamily::Shift,
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => OperatorFamily::Relational,
            BinaryOp::And | BinaryOp::Or => OperatorFamily::Logical,
            BinaryOp::Coalesce => OperatorFamily::Coalesce,
        }
    }

    /// Whether `a op= b` is valid syntax for this operator.
    pub fn is_compound(self) -> bool {
        matches!(
            self.family(),
            OperatorFamily::Additive
                | OperatorFamily::Multiplicative
                | OperatorFamily::Bitwise
                | OperatorFamily::Shift
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
    AddressOf,
    Deref,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::AddressOf => "&",
            UnaryOp::Deref => "*",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<UnaryOp> {
        [
            UnaryOp::Neg,
            UnaryOp::Not,
            UnaryOp::BitNot,
            UnaryOp::AddressOf,
            UnaryOp::Deref,
        ]
        .into_iter()
        .find(|op| op.symbol() == symbol)
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// `value as T` (explicit) versus `value to T` (implicit-strength).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastSyntax {
    As,
    To,
}

/// Integer literal suffixes (`1i8`, `7u32`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntSuffix {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntSuffix {
    pub fn parse(suffix: &str) -> Option<IntSuffix> {
        Some(match suffix {
            "i8" => IntSuffix::I8,
            "i16" => IntSuffix::I16,
            "i32" => IntSuffix::I32,
            "i64" => IntSuffix::I64,
            "u8" => IntSuffix::U8,
            "u16" => IntSuffix::U16,
            "u32" => IntSuffix::U32,
            "u64" => IntSuffix::U64,
            _ => return None,
        })
    }

    /// The builtin type name the suffix selects.
    pub fn type_name(self) -> &'static str {
        match self {
            IntSuffix::I8 => "Int8",
            IntSuffix::I16 => "Int16",
            IntSuffix::I32 => "Int32",
            IntSuffix::I64 => "Int64",
            IntSuffix::U8 => "UInt8",
            IntSuffix::U16 => "UInt16",
            IntSuffix::U32 => "UInt32",
            IntSuffix::U64 => "UInt64",
        }
    }
}

/// How a function declaration behaves when called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Plain,
    Lambda,
    Generator,
}

/// Struct-like declaration flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructSyntaxKind {
    Struct,
    Tuple,
    Union,
}

/// Atomic read-modify-write operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomicOp {
    Add,
    Sub,
    And,
    Or,
    Xor,
    Exchange,
}

impl AtomicOp {
    pub fn from_name(name: &str) -> Option<AtomicOp> {
        Some(match name {
            "atomic_add" => AtomicOp::Add,
            "atomic_sub" => AtomicOp::Sub,
            "atomic_and" => AtomicOp::And,
            "atomic_or" => AtomicOp::Or,
            "atomic_xor" => AtomicOp::Xor,
            "atomic_exchange" => AtomicOp::Exchange,
            _ => return None,
        })
    }

    pub fn is_bitwise(self) -> bool {
        matches!(self, AtomicOp::And | AtomicOp::Or | AtomicOp::Xor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_symbols_round_trip() {
        for op in BinaryOp::ALL {
            assert_eq!(BinaryOp::from_symbol(op.symbol()), Some(op));
        }
        assert_eq!(UnaryOp::from_symbol("~"), Some(UnaryOp::BitNot));
    }

    #[test]
    fn test_families() {
        assert_eq!(BinaryOp::Shl.family(), OperatorFamily::Shift);
        assert!(BinaryOp::Rem.is_compound());
        assert!(!BinaryOp::Lt.is_compound());
        assert!(Modifiers::INHERITED.contains(Modifiers::ASYNC));
        assert!(!Modifiers::INHERITED.contains(Modifiers::EXPORT));
    }
}
