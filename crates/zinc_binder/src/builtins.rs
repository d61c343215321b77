//! The builtin scope.

use crate::program::Program;
use crate::scope::ScopeId;
use crate::symbol::{Builtin, Decl, Scalar, Symbol};
use crate::types::TypeId;
use zinc_core::intern::IdentTable;
use zinc_core::text::SourcePos;

const fn int(bits: u16, signed: bool) -> Builtin {
    Builtin::Scalar(Scalar::Int { bits, signed })
}

const fn float(bits: u16) -> Builtin {
    Builtin::Scalar(Scalar::Float { bits })
}

/// Every builtin type, in registration order.
pub const BUILTIN_TYPES: [(&str, Builtin); 17] = [
    ("Void", Builtin::Void),
    ("Null", Builtin::Null),
    ("Bool", Builtin::Scalar(Scalar::Bool)),
    ("Int8", int(8, true)),
    ("Int16", int(16, true)),
    ("Int32", int(32, true)),
    ("Int64", int(64, true)),
    ("UInt8", int(8, false)),
    ("UInt16", int(16, false)),
    ("UInt32", int(32, false)),
    ("UInt64", int(64, false)),
    ("Float", float(32)),
    ("Double", float(64)),
    (
        "Float4",
        Builtin::Packed {
            element: Scalar::Float { bits: 32 },
            lanes: 4,
        },
    ),
    (
        "Double2",
        Builtin::Packed {
            element: Scalar::Float { bits: 64 },
            lanes: 2,
        },
    ),
    (
        "Int4",
        Builtin::Packed {
            element: Scalar::Int {
                bits: 32,
                signed: true,
            },
            lanes: 4,
        },
    ),
    (
        "Byte16",
        Builtin::Packed {
            element: Scalar::Int {
                bits: 8,
                signed: false,
            },
            lanes: 16,
        },
    ),
];

/// Well-known builtin types.
#[derive(Debug, Clone)]
pub struct Builtins {
    pub void: TypeId,
    pub null: TypeId,
    pub bool: TypeId,
    pub int8: TypeId,
    pub int16: TypeId,
    pub int32: TypeId,
    pub int64: TypeId,
    pub uint8: TypeId,
    pub uint16: TypeId,
    pub uint32: TypeId,
    pub uint64: TypeId,
    pub float: TypeId,
    pub double: TypeId,
    /// `Void*`, the universal pointer.
    pub void_ptr: TypeId,
    /// Packed types, keyed by their builtin description.
    packed: Vec<(Builtin, TypeId)>,
}

impl Builtins {
    pub(crate) fn empty() -> Self {
        Self {
            void: TypeId::INVALID,
            null: TypeId::INVALID,
            bool: TypeId::INVALID,
            int8: TypeId::INVALID,
            int16: TypeId::INVALID,
            int32: TypeId::INVALID,
            int64: TypeId::INVALID,
            uint8: TypeId::INVALID,
            uint16: TypeId::INVALID,
            uint32: TypeId::INVALID,
            uint64: TypeId::INVALID,
            float: TypeId::INVALID,
            double: TypeId::INVALID,
            void_ptr: TypeId::INVALID,
            packed: Vec::new(),
        }
    }

    /// The builtin integer type of the given shape.
    pub fn int(&self, bits: u16, signed: bool) -> TypeId {
        match (bits, signed) {
            (8, true) => self.int8,
            (16, true) => self.int16,
            (32, true) => self.int32,
            (64, true) => self.int64,
            (8, false) => self.uint8,
            (16, false) => self.uint16,
            (32, false) => self.uint32,
            _ => self.uint64,
        }
    }

    pub fn float(&self, bits: u16) -> TypeId {
        if bits <= 32 {
            self.float
        } else {
            self.double
        }
    }

    pub fn scalar(&self, scalar: Scalar) -> TypeId {
        match scalar {
            Scalar::Bool => self.bool,
            Scalar::Int { bits, signed } => self.int(bits, signed),
            Scalar::Float { bits } => self.float(bits),
        }
    }

    pub fn packed(&self, builtin: Builtin) -> Option<TypeId> {
        self.packed
            .iter()
            .find(|(candidate, _)| *candidate == builtin)
            .map(|(_, ty)| *ty)
    }
}

/// Create the builtin scope and declare every builtin type in it. The
/// names are warmed up in the identifier table first.
pub(crate) fn install(program: &mut Program<'_>, idents: &IdentTable) -> (ScopeId, Builtins) {
    let names: Vec<&'static str> = BUILTIN_TYPES.iter().map(|(name, _)| *name).collect();
    let idents = idents.warm_up(&names);

    let scope = program.add_scope(crate::scope::Scope::new(
        crate::scope::ScopeKind::Builtin,
        None,
        None,
    ));

    let mut builtins = Builtins::empty();
    for ((_, builtin), name) in BUILTIN_TYPES.iter().zip(idents) {
        let symbol = program
            .declare(
                scope,
                Symbol {
                    name,
                    owning_scope: Some(scope),
                    own_scope: None,
                    pos: SourcePos::synthetic(),
                    decl: Decl::Builtin(*builtin),
                },
            )
            .unwrap_or_else(|existing| existing);
        let ty = program.types.direct(symbol);
        match *builtin {
            Builtin::Void => builtins.void = ty,
            Builtin::Null => builtins.null = ty,
            Builtin::Scalar(Scalar::Bool) => builtins.bool = ty,
            Builtin::Scalar(Scalar::Int { bits, signed }) => match (bits, signed) {
                (8, true) => builtins.int8 = ty,
                (16, true) => builtins.int16 = ty,
                (32, true) => builtins.int32 = ty,
                (64, true) => builtins.int64 = ty,
                (8, false) => builtins.uint8 = ty,
                (16, false) => builtins.uint16 = ty,
                (32, false) => builtins.uint32 = ty,
                _ => builtins.uint64 = ty,
            },
            Builtin::Scalar(Scalar::Float { bits }) => {
                if bits == 32 {
                    builtins.float = ty;
                } else {
                    builtins.double = ty;
                }
            }
            Builtin::Packed { .. } => builtins.packed.push((*builtin, ty)),
        }
    }
    builtins.void_ptr = program.types.pointer(builtins.void);
    (scope, builtins)
}
