//! Typed expression and statement nodes.
//!
//! The binder turns syntax into these nodes; the lowering stage reads them.
//! Every node has a type (`Void` for statements) and refers to its children
//! by `NodeId`.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::cast::CastStep;
use crate::scope::ScopeId;
use crate::symbol::SymbolId;
use crate::types::TypeId;
use zinc_core::define_id;
use zinc_core::text::SourcePos;
use zinc_syntax::{AtomicOp, BinaryOp, UnaryOp};

define_id! {
    /// Handle to a bound node.
    pub struct NodeId;
}

/// A compile-time value.
#[derive(Debug, Clone, Copy)]
pub enum ConstValue {
    Int(i128),
    Float(f64),
    Bool(bool),
    Null,
}

impl ConstValue {
    pub fn as_int(self) -> Option<i128> {
        match self {
            ConstValue::Int(value) => Some(value),
            ConstValue::Bool(value) => Some(value as i128),
            _ => None,
        }
    }

    pub fn as_float(self) -> Option<f64> {
        match self {
            ConstValue::Float(value) => Some(value),
            ConstValue::Int(value) => Some(value as f64),
            _ => None,
        }
    }

    pub fn is_truthy(self) -> bool {
        match self {
            ConstValue::Int(value) => value != 0,
            ConstValue::Float(value) => value != 0.0,
            ConstValue::Bool(value) => value,
            ConstValue::Null => false,
        }
    }
}

// Floats compare bitwise so constants can key the instantiation memo.
impl PartialEq for ConstValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ConstValue::Int(a), ConstValue::Int(b)) => a == b,
            (ConstValue::Float(a), ConstValue::Float(b)) => a.to_bits() == b.to_bits(),
            (ConstValue::Bool(a), ConstValue::Bool(b)) => a == b,
            (ConstValue::Null, ConstValue::Null) => true,
            _ => false,
        }
    }
}

impl Eq for ConstValue {}

impl Hash for ConstValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ConstValue::Int(value) => value.hash(state),
            ConstValue::Float(value) => value.to_bits().hash(state),
            ConstValue::Bool(value) => value.hash(state),
            ConstValue::Null => {}
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int(value) => write!(f, "{}", value),
            ConstValue::Float(value) => write!(f, "{}", value),
            ConstValue::Bool(value) => write!(f, "{}", value),
            ConstValue::Null => f.write_str("null"),
        }
    }
}

/// One hop of a capture chain: the closure struct's scope and the
/// captured field synthesized on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureHop {
    pub scope: ScopeId,
    pub field: SymbolId,
}

/// Flavor of a compound assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundKind {
    Arithmetic,
    Shift,
    Pointer,
}

#[derive(Debug)]
pub struct Node {
    pub pos: SourcePos,
    pub ty: TypeId,
    pub kind: NodeKind,
}

#[derive(Debug)]
pub enum NodeKind {
    Literal {
        value: ConstValue,
        /// Unsuffixed integer literal, free to adopt another integral type.
        adaptable: bool,
    },
    StringLiteral(String),

    // Names
    TypeName(TypeId),
    ValueName {
        symbol: SymbolId,
        /// Outermost hop first; the last hop's field is read through the
        /// current function's receiver.
        captures: Vec<CaptureHop>,
    },
    FieldName {
        base: NodeId,
        field: SymbolId,
    },
    IndexName {
        base: NodeId,
        index: NodeId,
    },
    /// Marks a constant-foldable subtree.
    ConstExpr(NodeId),

    // Conversions
    Cast {
        value: NodeId,
        step: CastStep,
    },
    AddressOf(NodeId),
    ReferenceOf(NodeId),
    Dereference(NodeId),

    // Operators
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    Arithmetic {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    Shift {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    PointerArithmetic {
        op: BinaryOp,
        pointer: NodeId,
        offset: NodeId,
    },
    PointerDifference {
        left: NodeId,
        right: NodeId,
    },
    /// Relational and logical operators.
    Condition {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    Coalesce {
        left: NodeId,
        right: NodeId,
    },
    Ternary {
        cond: NodeId,
        then: NodeId,
        otherwise: NodeId,
    },

    // Calls and construction
    Call {
        function: SymbolId,
        args: Vec<NodeId>,
    },
    CallIndirect {
        callee: NodeId,
        args: Vec<NodeId>,
    },
    Initializer {
        fields: Vec<(SymbolId, NodeId)>,
    },
    SizeOf {
        target: TypeId,
        size: u64,
    },
    New {
        target: TypeId,
        count: Option<NodeId>,
        constructor: Option<SymbolId>,
        args: Vec<NodeId>,
    },
    Delete {
        value: NodeId,
        disposer: Option<SymbolId>,
    },
    Atomic {
        op: AtomicOp,
        target: NodeId,
        value: NodeId,
    },

    // Statements
    Definition {
        symbol: SymbolId,
        value: Option<NodeId>,
    },
    Assignment {
        target: NodeId,
        value: NodeId,
    },
    CompoundAssignment {
        op: BinaryOp,
        kind: CompoundKind,
        target: NodeId,
        value: NodeId,
    },
    Block {
        scope: ScopeId,
        label: Option<SymbolId>,
        body: Vec<NodeId>,
    },
    If {
        cond: NodeId,
        then: NodeId,
        otherwise: Option<NodeId>,
    },
    Loop {
        scope: ScopeId,
        label: SymbolId,
        init: Option<NodeId>,
        cond: Option<NodeId>,
        step: Option<NodeId>,
        body: NodeId,
    },
    ForIn {
        scope: ScopeId,
        label: SymbolId,
        variable: SymbolId,
        /// Local holding the generator state.
        state: SymbolId,
        init: NodeId,
        /// The generator's `next` method.
        step: SymbolId,
        body: NodeId,
    },
    Return(Option<NodeId>),
    Break(SymbolId),
    Continue(SymbolId),
    Defer(NodeId),
    Yield(NodeId),
    YieldFrom {
        value: NodeId,
        step: SymbolId,
    },
    Await(NodeId),
}

impl NodeKind {
    /// Child nodes, in evaluation order.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Literal { .. }
            | NodeKind::StringLiteral(_)
            | NodeKind::TypeName(_)
            | NodeKind::ValueName { .. }
            | NodeKind::SizeOf { .. }
            | NodeKind::Break(_)
            | NodeKind::Continue(_) => Vec::new(),
            NodeKind::ConstExpr(inner)
            | NodeKind::AddressOf(inner)
            | NodeKind::ReferenceOf(inner)
            | NodeKind::Dereference(inner)
            | NodeKind::Defer(inner)
            | NodeKind::Yield(inner)
            | NodeKind::Await(inner) => vec![*inner],
            NodeKind::FieldName { base, .. } => vec![*base],
            NodeKind::IndexName { base, index } => vec![*base, *index],
            NodeKind::Cast { value, .. } => vec![*value],
            NodeKind::Unary { operand, .. } => vec![*operand],
            NodeKind::Arithmetic { left, right, .. }
            | NodeKind::Shift { left, right, .. }
            | NodeKind::PointerDifference { left, right }
            | NodeKind::Condition { left, right, .. }
            | NodeKind::Coalesce { left, right } => vec![*left, *right],
            NodeKind::PointerArithmetic { pointer, offset, .. } => vec![*pointer, *offset],
            NodeKind::Ternary {
                cond,
                then,
                otherwise,
            } => vec![*cond, *then, *otherwise],
            NodeKind::Call { args, .. } => args.clone(),
            NodeKind::CallIndirect { callee, args } => {
                let mut children = vec![*callee];
                children.extend(args.iter().copied());
                children
            }
            NodeKind::Initializer { fields } => fields.iter().map(|(_, value)| *value).collect(),
            NodeKind::New { count, args, .. } => count.iter().chain(args.iter()).copied().collect(),
            NodeKind::Delete { value, .. } => vec![*value],
            NodeKind::Atomic { target, value, .. } => vec![*target, *value],
            NodeKind::Definition { value, .. } => value.iter().copied().collect(),
            NodeKind::Assignment { target, value }
            | NodeKind::CompoundAssignment { target, value, .. } => vec![*target, *value],
            NodeKind::Block { body, .. } => body.clone(),
            NodeKind::If {
                cond,
                then,
                otherwise,
            } => {
                let mut children = vec![*cond, *then];
                children.extend(otherwise.iter().copied());
                children
            }
            NodeKind::Loop {
                init,
                cond,
                step,
                body,
                ..
            } => init
                .iter()
                .chain(cond.iter())
                .chain(step.iter())
                .chain(std::iter::once(body))
                .copied()
                .collect(),
            NodeKind::ForIn { init, body, .. } => vec![*init, *body],
            NodeKind::Return(value) => value.iter().copied().collect(),
            NodeKind::YieldFrom { value, .. } => vec![*value],
        }
    }

    /// Symbols the node refers to directly.
    pub fn symbols(&self) -> Vec<SymbolId> {
        match self {
            NodeKind::ValueName { symbol, captures } => std::iter::once(*symbol)
                .chain(captures.iter().map(|hop| hop.field))
                .collect(),
            NodeKind::FieldName { field, .. } => vec![*field],
            NodeKind::Call { function, .. } => vec![*function],
            NodeKind::Initializer { fields } => fields.iter().map(|(field, _)| *field).collect(),
            NodeKind::New {
                constructor: Some(function),
                ..
            }
            | NodeKind::Delete {
                disposer: Some(function),
                ..
            } => vec![*function],
            NodeKind::Definition { symbol, .. } => vec![*symbol],
            NodeKind::Block {
                label: Some(label), ..
            }
            | NodeKind::Loop { label, .. }
            | NodeKind::Break(label)
            | NodeKind::Continue(label) => vec![*label],
            NodeKind::ForIn {
                label,
                variable,
                state,
                step,
                ..
            } => vec![*label, *variable, *state, *step],
            NodeKind::YieldFrom { step, .. } => vec![*step],
            _ => Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Literal { .. } => "Literal",
            NodeKind::StringLiteral(_) => "StringLiteral",
            NodeKind::TypeName(_) => "TypeName",
            NodeKind::ValueName { .. } => "ValueName",
            NodeKind::FieldName { .. } => "FieldName",
            NodeKind::IndexName { .. } => "IndexName",
            NodeKind::ConstExpr(_) => "ConstExpr",
            NodeKind::Cast { .. } => "Cast",
            NodeKind::AddressOf(_) => "AddressOf",
            NodeKind::ReferenceOf(_) => "ReferenceOf",
            NodeKind::Dereference(_) => "Dereference",
            NodeKind::Unary { .. } => "Unary",
            NodeKind::Arithmetic { .. } => "Arithmetic",
            NodeKind::Shift { .. } => "Shift",
            NodeKind::PointerArithmetic { .. } => "PointerArithmetic",
            NodeKind::PointerDifference { .. } => "PointerDifference",
            NodeKind::Condition { .. } => "Condition",
            NodeKind::Coalesce { .. } => "Coalesce",
            NodeKind::Ternary { .. } => "Ternary",
            NodeKind::Call { .. } => "Call",
            NodeKind::CallIndirect { .. } => "CallIndirect",
            NodeKind::Initializer { .. } => "Initializer",
            NodeKind::SizeOf { .. } => "SizeOf",
            NodeKind::New { .. } => "New",
            NodeKind::Delete { .. } => "Delete",
            NodeKind::Atomic { .. } => "Atomic",
            NodeKind::Definition { .. } => "Definition",
            NodeKind::Assignment { .. } => "Assignment",
            NodeKind::CompoundAssignment { .. } => "CompoundAssignment",
            NodeKind::Block { .. } => "Block",
            NodeKind::If { .. } => "If",
            NodeKind::Loop { .. } => "Loop",
            NodeKind::ForIn { .. } => "ForIn",
            NodeKind::Return(_) => "Return",
            NodeKind::Break(_) => "Break",
            NodeKind::Continue(_) => "Continue",
            NodeKind::Defer(_) => "Defer",
            NodeKind::Yield(_) => "Yield",
            NodeKind::YieldFrom { .. } => "YieldFrom",
            NodeKind::Await(_) => "Await",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zinc_core::collections::FxHashSet;

    #[test]
    fn test_const_values_hash_bitwise() {
        let mut set = FxHashSet::default();
        set.insert(ConstValue::Float(1.5));
        set.insert(ConstValue::Float(1.5));
        set.insert(ConstValue::Int(3));
        assert_eq!(set.len(), 2);
        assert_ne!(ConstValue::Int(1), ConstValue::Bool(true));
        assert_eq!(ConstValue::Bool(true).as_int(), Some(1));
    }

    #[test]
    fn test_children_in_evaluation_order() {
        let kind = NodeKind::Ternary {
            cond: NodeId(1),
            then: NodeId(2),
            otherwise: NodeId(3),
        };
        assert_eq!(kind.children(), vec![NodeId(1), NodeId(2), NodeId(3)]);
        assert_eq!(kind.name(), "Ternary");
    }
}
