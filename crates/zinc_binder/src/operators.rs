//! Unary, binary and assignment operators.
//!
//! Operands are read through references first. A user-declared
//! `operator` function wins when an operand is not a builtin type;
//! otherwise each operator family applies its builtin rule: both sides are
//! converted to an upper-bound type and the result node is built. Operators
//! over constants are tagged for folding.

use zinc_core::text::SourcePos;
use zinc_diagnostics::messages;
use zinc_syntax::{BinaryOp, OperatorFamily, OperatorName, SyntaxRef, UnaryOp};

use crate::binder::Binder;
use crate::cast::{can_cast, CastIntent};
use crate::const_eval::ConstError;
use crate::node::{CompoundKind, ConstValue, NodeId, NodeKind};
use crate::symbol::{Decl, Scalar};
use crate::template::{ArgValue, CallArg};
use crate::types::TypeId;

impl<'a> Binder<'a> {
    // ========================================================================
    // Helpers
    // ========================================================================

    fn node_type(&self, node: NodeId) -> TypeId {
        self.program.node(node).ty
    }

    /// Storage locations: names, fields, elements and dereferences.
    pub(crate) fn is_lvalue(&self, node: NodeId) -> bool {
        let node = self.program.node(node);
        matches!(
            node.kind,
            NodeKind::ValueName { .. }
                | NodeKind::FieldName { .. }
                | NodeKind::IndexName { .. }
                | NodeKind::Dereference(_)
        ) || self.program.types.is_reference(node.ty)
    }

    /// Tag `node` as constant when all its operands are. Folding errors are
    /// reported here.
    pub(crate) fn fold(&mut self, node: NodeId, operands: &[NodeId]) -> Option<NodeId> {
        if !operands.iter().all(|operand| self.is_constant(*operand)) {
            return Some(node);
        }
        match self.program.const_eval(node) {
            Ok(_) => Some(self.constant(node)),
            Err(ConstError::DivisionByZero) => {
                let pos = self.program.node(node).pos;
                self.error(pos, &messages::DIVISION_BY_ZERO, &[]);
                None
            }
            Err(ConstError::NotConstant) => Some(node),
        }
    }

    /// Retype an unsuffixed integer literal to `target` when its value fits.
    fn adapt_literal(&mut self, node: NodeId, target: TypeId) {
        let NodeKind::Literal {
            value: ConstValue::Int(value),
            adaptable: true,
        } = self.program.node(node).kind
        else {
            return;
        };
        let Some(Scalar::Int { bits, signed }) = self.program.scalar(target) else {
            return;
        };
        if crate::const_eval::wrap_int(value, bits, signed) == value {
            self.program.node_mut(node).ty = target;
        }
    }

    /// The type both operands convert to implicitly.
    pub(crate) fn upper_bound(&mut self, left: NodeId, right: NodeId, pos: SourcePos) -> Option<TypeId> {
        self.adapt_literal(left, self.node_type(right));
        self.adapt_literal(right, self.node_type(left));
        let (a, b) = (self.node_type(left), self.node_type(right));
        if a == b {
            return Some(a);
        }
        if can_cast(&self.program, a, b, CastIntent::Implicit).is_ok() {
            return Some(b);
        }
        if can_cast(&self.program, b, a, CastIntent::Implicit).is_ok() {
            return Some(a);
        }
        // Integer mixed with floating point meets in Double when the
        // integer widens into it.
        let double = self.program.builtins.double;
        let mixed = matches!(
            (self.program.scalar(a), self.program.scalar(b)),
            (Some(Scalar::Int { .. }), Some(Scalar::Float { .. }))
                | (Some(Scalar::Float { .. }), Some(Scalar::Int { .. }))
        );
        if mixed
            && can_cast(&self.program, a, double, CastIntent::Implicit).is_ok()
            && can_cast(&self.program, b, double, CastIntent::Implicit).is_ok()
        {
            return Some(double);
        }
        let (a, b) = (self.type_name(a), self.type_name(b));
        self.error(pos, &messages::NO_COMMON_TYPE_0_1, &[&a, &b]);
        None
    }

    /// Integral types narrower than 32 bits compute in the 32-bit type of
    /// the same signedness.
    fn promote(&self, ty: TypeId) -> TypeId {
        match self.program.scalar(ty) {
            Some(Scalar::Int { bits, signed }) if bits < 32 => self.program.builtins.int(32, signed),
            _ => ty,
        }
    }

    fn is_builtin_operand(&self, node: NodeId) -> bool {
        let ty = self.node_type(node);
        !self.program.is_aggregate(self.program.types.strip_reference(ty))
    }

    /// Call a user-declared operator when an operand is a struct. `None`
    /// means no user operator applies; `Some(None)` that one applied and
    /// failed.
    fn user_operator(
        &mut self,
        pos: SourcePos,
        name: OperatorName,
        operands: &[NodeId],
    ) -> Option<Option<NodeId>> {
        if operands.iter().all(|operand| self.is_builtin_operand(*operand)) {
            return None;
        }
        let ident = self.idents.get(&name.declared_name())?;
        let symbol = self.program.lookup(self.current_scope(), ident)?;
        let symbol = self.program.resolve_alias(symbol);
        if !matches!(
            self.program.symbol(symbol).decl,
            Decl::Template(_) | Decl::OverloadSet(_) | Decl::Function(_)
        ) {
            return None;
        }
        let args = operands
            .iter()
            .map(|operand| CallArg {
                pos: self.program.node(*operand).pos,
                name: None,
                value: ArgValue::Value(*operand),
            })
            .collect();
        let result = self
            .call_symbol(symbol, None, args, pos)
            .and_then(|operand| match operand {
                crate::expr::Operand::Value(node) => Some(node),
                _ => None,
            });
        Some(result)
    }

    fn operator_error(&mut self, pos: SourcePos, op: BinaryOp, left: NodeId, right: NodeId) {
        let (a, b) = (self.type_name(self.node_type(left)), self.type_name(self.node_type(right)));
        self.error(pos, &messages::OPERATOR_0_CANNOT_BE_APPLIED_TO_1_AND_2, &[op.symbol(), &a, &b]);
    }

    // ========================================================================
    // Binary operators
    // ========================================================================

    pub(crate) fn bind_binary(
        &mut self,
        pos: SourcePos,
        op: BinaryOp,
        left: SyntaxRef<'a>,
        right: SyntaxRef<'a>,
    ) -> Option<NodeId> {
        let left = self.bind_value(left);
        let right = self.bind_value(right);
        let (left, right) = (left?, right?);
        let left = self.read(left);
        let right = self.read(right);
        if let Some(result) = self.user_operator(pos, OperatorName::Binary(op), &[left, right]) {
            return result;
        }
        match op.family() {
            OperatorFamily::Relational => self.bind_relational(pos, op, left, right),
            OperatorFamily::Logical => {
                let bool_ty = self.program.builtins.bool;
                let left = self.cast(left, bool_ty, CastIntent::Implicit);
                let right = self.cast(right, bool_ty, CastIntent::Implicit);
                let (left, right) = (left?, right?);
                let node = self.add_node(pos, bool_ty, NodeKind::Condition { op, left, right });
                self.fold(node, &[left, right])
            }
            OperatorFamily::Coalesce => {
                let ty = self.node_type(left);
                if !self.program.types.is_pointer(ty) {
                    let text = self.type_name(ty);
                    self.error(pos, &messages::NULL_COALESCE_NEEDS_POINTER_0, &[&text]);
                    return None;
                }
                let right = self.cast(right, ty, CastIntent::Implicit)?;
                Some(self.add_node(pos, ty, NodeKind::Coalesce { left, right }))
            }
            OperatorFamily::Shift => self.bind_shift(pos, op, left, right),
            OperatorFamily::Additive => {
                let (a, b) = (self.node_type(left), self.node_type(right));
                let (pointer_a, pointer_b) =
                    (self.program.types.is_pointer(a), self.program.types.is_pointer(b));
                match (pointer_a, pointer_b) {
                    (true, true) if op == BinaryOp::Sub => self.bind_pointer_difference(pos, left, right),
                    (true, false) => self.bind_pointer_arithmetic(pos, op, left, right),
                    (false, true) if op == BinaryOp::Add => {
                        self.bind_pointer_arithmetic(pos, op, right, left)
                    }
                    (false, false) => self.bind_arithmetic(pos, op, left, right),
                    _ => {
                        self.operator_error(pos, op, left, right);
                        None
                    }
                }
            }
            OperatorFamily::Multiplicative | OperatorFamily::Bitwise => {
                self.bind_arithmetic(pos, op, left, right)
            }
        }
    }

    fn bind_arithmetic(&mut self, pos: SourcePos, op: BinaryOp, left: NodeId, right: NodeId) -> Option<NodeId> {
        let bitwise = op.family() == OperatorFamily::Bitwise;
        let accepts = |binder: &Self, node: NodeId| {
            let ty = binder.node_type(node);
            if bitwise {
                binder.program.is_integral(ty) || ty == binder.program.builtins.bool
            } else {
                binder.program.is_numeric(ty)
            }
        };
        if !accepts(self, left) || !accepts(self, right) {
            self.operator_error(pos, op, left, right);
            return None;
        }
        let ty = self.upper_bound(left, right, pos)?;
        let ty = self.promote(ty);
        let left = self.cast(left, ty, CastIntent::Implicit)?;
        let right = self.cast(right, ty, CastIntent::Implicit)?;
        let node = self.add_node(pos, ty, NodeKind::Arithmetic { op, left, right });
        self.fold(node, &[left, right])
    }

    fn bind_relational(&mut self, pos: SourcePos, op: BinaryOp, left: NodeId, right: NodeId) -> Option<NodeId> {
        let equality = matches!(op, BinaryOp::Eq | BinaryOp::Ne);
        let comparable = |binder: &Self, node: NodeId| {
            let ty = binder.node_type(node);
            binder.program.is_numeric(ty)
                || binder.program.types.is_pointer(ty)
                || binder.program.is_enum(ty)
                || (equality && (ty == binder.program.builtins.bool || ty == binder.program.builtins.null))
        };
        if !comparable(self, left) || !comparable(self, right) {
            self.operator_error(pos, op, left, right);
            return None;
        }
        let ty = self.upper_bound(left, right, pos)?;
        let left = self.cast(left, ty, CastIntent::Implicit)?;
        let right = self.cast(right, ty, CastIntent::Implicit)?;
        let bool_ty = self.program.builtins.bool;
        let node = self.add_node(pos, bool_ty, NodeKind::Condition { op, left, right });
        self.fold(node, &[left, right])
    }

    fn bind_shift(&mut self, pos: SourcePos, op: BinaryOp, left: NodeId, right: NodeId) -> Option<NodeId> {
        let (a, b) = (self.node_type(left), self.node_type(right));
        if !self.program.is_integral(a) || !self.program.is_integral(b) {
            self.operator_error(pos, op, left, right);
            return None;
        }
        let ty = self.promote(a);
        let left = self.cast(left, ty, CastIntent::Implicit)?;
        let node = self.add_node(pos, ty, NodeKind::Shift { op, left, right });
        self.fold(node, &[left, right])
    }

    fn bind_pointer_arithmetic(
        &mut self,
        pos: SourcePos,
        op: BinaryOp,
        pointer: NodeId,
        offset: NodeId,
    ) -> Option<NodeId> {
        let ty = self.node_type(pointer);
        if !self.program.is_integral(self.node_type(offset)) {
            self.operator_error(pos, op, pointer, offset);
            return None;
        }
        let index = self.program.pointer_int(true);
        let offset = self.cast(offset, index, CastIntent::Implicit)?;
        Some(self.add_node(pos, ty, NodeKind::PointerArithmetic { op, pointer, offset }))
    }

    fn bind_pointer_difference(&mut self, pos: SourcePos, left: NodeId, right: NodeId) -> Option<NodeId> {
        let (a, b) = (self.node_type(left), self.node_type(right));
        if a != b {
            let (a, b) = (self.type_name(a), self.type_name(b));
            self.error(pos, &messages::NO_COMMON_TYPE_0_1, &[&a, &b]);
            return None;
        }
        let ty = self.program.pointer_int(true);
        Some(self.add_node(pos, ty, NodeKind::PointerDifference { left, right }))
    }

    // ========================================================================
    // Unary operators
    // ========================================================================

    pub(crate) fn bind_unary(&mut self, pos: SourcePos, op: UnaryOp, operand: SyntaxRef<'a>) -> Option<NodeId> {
        let value = self.bind_value(operand)?;
        if op == UnaryOp::AddressOf {
            let value = self.read(value);
            if !self.is_lvalue(value) {
                self.error(operand.pos, &messages::CANNOT_TAKE_ADDRESS, &[]);
                return None;
            }
            let ty = self.program.types.pointer(self.node_type(value));
            return Some(self.add_node(pos, ty, NodeKind::AddressOf(value)));
        }

        let value = self.read(value);
        if let Some(result) = self.user_operator(pos, OperatorName::Unary(op), &[value]) {
            return result;
        }
        let ty = self.node_type(value);
        let operator_error = |binder: &mut Self| {
            let text = binder.type_name(ty);
            binder.error(pos, &messages::OPERATOR_0_CANNOT_BE_APPLIED_TO_1, &[op.symbol(), &text]);
        };
        match op {
            UnaryOp::Deref => {
                let pointee = self
                    .program
                    .types
                    .pointee(ty)
                    .filter(|pointee| !self.program.is_void(*pointee));
                let Some(pointee) = pointee else {
                    let text = self.type_name(ty);
                    self.error(pos, &messages::CANNOT_DEREFERENCE_0, &[&text]);
                    return None;
                };
                Some(self.add_node(pos, pointee, NodeKind::Dereference(value)))
            }
            UnaryOp::Neg => {
                if let Some(literal) = self.negated_literal(pos, value) {
                    return Some(literal);
                }
                if !self.program.is_numeric(ty) {
                    operator_error(self);
                    return None;
                }
                self.bind_unary_arithmetic(pos, op, value, self.promote(ty))
            }
            UnaryOp::BitNot => {
                if !self.program.is_integral(ty) {
                    operator_error(self);
                    return None;
                }
                self.bind_unary_arithmetic(pos, op, value, self.promote(ty))
            }
            UnaryOp::Not => {
                let bool_ty = self.program.builtins.bool;
                self.bind_unary_arithmetic(pos, op, value, bool_ty)
            }
            UnaryOp::AddressOf => None,
        }
    }

    fn bind_unary_arithmetic(&mut self, pos: SourcePos, op: UnaryOp, value: NodeId, ty: TypeId) -> Option<NodeId> {
        let operand = self.cast(value, ty, CastIntent::Implicit)?;
        let node = self.add_node(pos, ty, NodeKind::Unary { op, operand });
        self.fold(node, &[operand])
    }

    // ========================================================================
    // Assignment
    // ========================================================================

    pub(crate) fn bind_assign(
        &mut self,
        pos: SourcePos,
        op: Option<BinaryOp>,
        target: SyntaxRef<'a>,
        value: SyntaxRef<'a>,
    ) -> Option<NodeId> {
        let target_node = self.bind_value(target);
        let value = self.bind_value(value);
        let (target_node, value) = (target_node?, value?);
        if !self.is_lvalue(target_node) {
            self.error(target.pos, &messages::EXPRESSION_NOT_ASSIGNABLE, &[]);
            return None;
        }
        let target_node = self.read(target_node);
        let value = self.read(value);
        let ty = self.node_type(target_node);
        let void = self.program.builtins.void;

        let Some(op) = op else {
            let value = self.cast(value, ty, CastIntent::Implicit)?;
            return Some(self.add_node(
                pos,
                void,
                NodeKind::Assignment {
                    target: target_node,
                    value,
                },
            ));
        };

        let family = op.family();
        let (kind, value) = if self.program.types.is_pointer(ty) && family == OperatorFamily::Additive {
            if !self.program.is_integral(self.node_type(value)) {
                self.operator_error(pos, op, target_node, value);
                return None;
            }
            let index = self.program.pointer_int(true);
            (CompoundKind::Pointer, self.cast(value, index, CastIntent::Implicit)?)
        } else if family == OperatorFamily::Shift {
            if !self.program.is_integral(ty) || !self.program.is_integral(self.node_type(value)) {
                self.operator_error(pos, op, target_node, value);
                return None;
            }
            (CompoundKind::Shift, value)
        } else if op.is_compound() && self.program.is_numeric(ty) {
            self.adapt_literal(value, ty);
            (CompoundKind::Arithmetic, self.cast(value, ty, CastIntent::Implicit)?)
        } else {
            self.operator_error(pos, op, target_node, value);
            return None;
        };
        Some(self.add_node(
            pos,
            void,
            NodeKind::CompoundAssignment {
                op,
                kind,
                target: target_node,
                value,
            },
        ))
    }
}
