//! Constant folding over bound nodes.

use thiserror::Error;

use crate::binder::Binder;
use crate::cast::{CastStep, StepKind};
use crate::node::{ConstValue, NodeId, NodeKind};
use crate::program::Program;
use crate::symbol::{Decl, Scalar};
use crate::types::TypeId;
use zinc_syntax::{BinaryOp, OperatorFamily, UnaryOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConstError {
    #[error("expression is not a compile-time constant")]
    NotConstant,
    #[error("division by zero")]
    DivisionByZero,
}

/// Truncate `value` to `bits` and sign-extend when `signed`.
pub(crate) fn wrap_int(value: i128, bits: u16, signed: bool) -> i128 {
    if bits == 0 || bits >= 128 {
        return value;
    }
    let modulus = 1i128 << bits;
    let raw = value & (modulus - 1);
    if signed && (raw >> (bits - 1)) & 1 == 1 {
        raw - modulus
    } else {
        raw
    }
}

fn round_float(value: f64, bits: u16) -> f64 {
    if bits <= 32 {
        value as f32 as f64
    } else {
        value
    }
}

impl<'a> Program<'a> {
    /// The scalar a constant of type `ty` is computed in. Enums fold in
    /// their base type.
    fn const_scalar(&self, ty: TypeId) -> Option<Scalar> {
        match self.type_decl(ty)? {
            Decl::Enum(decl) => self.scalar(decl.base),
            _ => self.scalar(ty),
        }
    }

    fn normalize(&self, value: ConstValue, ty: TypeId) -> ConstValue {
        match (self.const_scalar(ty), value) {
            (Some(Scalar::Int { bits, signed }), ConstValue::Int(v)) => {
                ConstValue::Int(wrap_int(v, bits, signed))
            }
            (Some(Scalar::Float { bits }), ConstValue::Float(v)) => {
                ConstValue::Float(round_float(v, bits))
            }
            _ => value,
        }
    }

    /// Evaluate a node built from literals and foldable operators.
    pub fn const_eval(&self, id: NodeId) -> Result<ConstValue, ConstError> {
        let node = self.node(id);
        match &node.kind {
            NodeKind::Literal { value, .. } => Ok(*value),
            NodeKind::SizeOf { size, .. } => Ok(ConstValue::Int(i128::from(*size))),
            NodeKind::ConstExpr(inner) => self.const_eval(*inner),
            NodeKind::Cast { value, step } => {
                let value = self.const_eval(*value)?;
                self.convert(value, *step)
            }
            NodeKind::Unary { op, operand } => {
                let value = self.const_eval(*operand)?;
                let result = match (op, value) {
                    (UnaryOp::Neg, ConstValue::Int(v)) => ConstValue::Int(v.wrapping_neg()),
                    (UnaryOp::Neg, ConstValue::Float(v)) => ConstValue::Float(-v),
                    (UnaryOp::Not, value) => ConstValue::Bool(!value.is_truthy()),
                    (UnaryOp::BitNot, ConstValue::Int(v)) => ConstValue::Int(!v),
                    _ => return Err(ConstError::NotConstant),
                };
                Ok(self.normalize(result, node.ty))
            }
            NodeKind::Arithmetic { op, left, right } => {
                let left = self.const_eval(*left)?;
                let right = self.const_eval(*right)?;
                let result = arithmetic(*op, left, right)?;
                Ok(self.normalize(result, node.ty))
            }
            NodeKind::Shift { op, left, right } => {
                let left = self.const_eval(*left)?.as_int().ok_or(ConstError::NotConstant)?;
                let amount = self.const_eval(*right)?.as_int().ok_or(ConstError::NotConstant)?;
                let bits = match self.const_scalar(node.ty) {
                    Some(Scalar::Int { bits, .. }) => i128::from(bits),
                    _ => return Err(ConstError::NotConstant),
                };
                let amount = (amount & (bits - 1)) as u32;
                let result = match op {
                    BinaryOp::Shl => left.wrapping_shl(amount),
                    _ => left >> amount,
                };
                Ok(self.normalize(ConstValue::Int(result), node.ty))
            }
            NodeKind::Condition { op, left, right } => {
                let left = self.const_eval(*left)?;
                let right = self.const_eval(*right)?;
                condition(*op, left, right).map(ConstValue::Bool)
            }
            NodeKind::Ternary {
                cond,
                then,
                otherwise,
            } => {
                if self.const_eval(*cond)?.is_truthy() {
                    self.const_eval(*then)
                } else {
                    self.const_eval(*otherwise)
                }
            }
            _ => Err(ConstError::NotConstant),
        }
    }

    fn convert(&self, value: ConstValue, step: CastStep) -> Result<ConstValue, ConstError> {
        let target = self.const_scalar(step.to);
        let converted = match (step.kind, target) {
            (StepKind::FromNull, Some(Scalar::Int { .. })) => ConstValue::Int(0),
            (StepKind::FromNull, Some(Scalar::Float { .. })) => ConstValue::Float(0.0),
            (StepKind::FromNull, Some(Scalar::Bool)) => ConstValue::Bool(false),
            (StepKind::FromNull, None) if self.types.is_pointer(step.to) => ConstValue::Null,
            (StepKind::ToBool, _) => ConstValue::Bool(value.is_truthy()),
            (StepKind::BitCast, Some(Scalar::Float { bits })) => match value {
                ConstValue::Int(v) if bits <= 32 => ConstValue::Float(f64::from(f32::from_bits(v as u32))),
                ConstValue::Int(v) => ConstValue::Float(f64::from_bits(v as u64)),
                other => other,
            },
            (StepKind::BitCast, Some(Scalar::Int { bits, signed })) => match value {
                ConstValue::Float(v) if bits <= 32 => {
                    ConstValue::Int(wrap_int(i128::from((v as f32).to_bits()), bits, signed))
                }
                ConstValue::Float(v) => ConstValue::Int(wrap_int(i128::from(v.to_bits()), bits, signed)),
                ConstValue::Bool(v) => ConstValue::Int(i128::from(v)),
                other => other,
            },
            (StepKind::Widen | StepKind::Narrow, Some(Scalar::Int { .. })) => {
                match value {
                    ConstValue::Float(v) => ConstValue::Int(v.trunc() as i128),
                    ConstValue::Bool(v) => ConstValue::Int(i128::from(v)),
                    other => other,
                }
            }
            (StepKind::Widen | StepKind::Narrow, Some(Scalar::Float { .. })) => {
                ConstValue::Float(value.as_float().ok_or(ConstError::NotConstant)?)
            }
            (StepKind::Widen | StepKind::Narrow | StepKind::BitCast, Some(Scalar::Bool)) => {
                ConstValue::Bool(value.is_truthy())
            }
            _ => return Err(ConstError::NotConstant),
        };
        Ok(self.normalize(converted, step.to))
    }
}

fn arithmetic(op: BinaryOp, left: ConstValue, right: ConstValue) -> Result<ConstValue, ConstError> {
    use ConstValue::*;
    Ok(match (left, right) {
        (Int(l), Int(r)) => Int(match op {
            BinaryOp::Add => l.wrapping_add(r),
            BinaryOp::Sub => l.wrapping_sub(r),
            BinaryOp::Mul => l.wrapping_mul(r),
            BinaryOp::Div | BinaryOp::Rem if r == 0 => return Err(ConstError::DivisionByZero),
            BinaryOp::Div => l.wrapping_div(r),
            BinaryOp::Rem => l.wrapping_rem(r),
            BinaryOp::BitAnd => l & r,
            BinaryOp::BitOr => l | r,
            BinaryOp::BitXor => l ^ r,
            _ => return Err(ConstError::NotConstant),
        }),
        (Float(l), Float(r)) => Float(match op {
            BinaryOp::Add => l + r,
            BinaryOp::Sub => l - r,
            BinaryOp::Mul => l * r,
            BinaryOp::Div => l / r,
            BinaryOp::Rem => l % r,
            _ => return Err(ConstError::NotConstant),
        }),
        (Bool(l), Bool(r)) => Bool(match op {
            BinaryOp::BitAnd => l & r,
            BinaryOp::BitOr => l | r,
            BinaryOp::BitXor => l ^ r,
            _ => return Err(ConstError::NotConstant),
        }),
        _ => return Err(ConstError::NotConstant),
    })
}

fn condition(op: BinaryOp, left: ConstValue, right: ConstValue) -> Result<bool, ConstError> {
    use std::cmp::Ordering;
    if op.family() == OperatorFamily::Logical {
        return Ok(match op {
            BinaryOp::And => left.is_truthy() && right.is_truthy(),
            _ => left.is_truthy() || right.is_truthy(),
        });
    }
    let ordering = match (left, right) {
        (ConstValue::Int(l), ConstValue::Int(r)) => Some(l.cmp(&r)),
        (ConstValue::Bool(l), ConstValue::Bool(r)) => Some(l.cmp(&r)),
        (ConstValue::Null, ConstValue::Null) => Some(Ordering::Equal),
        (l, r) => match (l.as_float(), r.as_float()) {
            (Some(l), Some(r)) => l.partial_cmp(&r),
            _ => return Err(ConstError::NotConstant),
        },
    };
    // NaN compares unequal to everything.
    let Some(ordering) = ordering else {
        return Ok(op == BinaryOp::Ne);
    };
    Ok(match op {
        BinaryOp::Eq => ordering == Ordering::Equal,
        BinaryOp::Ne => ordering != Ordering::Equal,
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::Ge => ordering != Ordering::Less,
        _ => return Err(ConstError::NotConstant),
    })
}

impl<'a> Binder<'a> {
    /// Nodes tagged as compile-time constants.
    pub(crate) fn is_constant(&self, node: NodeId) -> bool {
        matches!(
            self.program.node(node).kind,
            NodeKind::Literal { .. } | NodeKind::ConstExpr(_) | NodeKind::SizeOf { .. }
        )
    }

    pub(crate) fn const_value(&self, node: NodeId) -> Option<ConstValue> {
        if !self.is_constant(node) {
            return None;
        }
        self.program.const_eval(node).ok()
    }

    /// Tag `node` as constant unless it already is.
    pub(crate) fn constant(&mut self, node: NodeId) -> NodeId {
        if self.is_constant(node) {
            return node;
        }
        let (pos, ty) = {
            let node = self.program.node(node);
            (node.pos, node.ty)
        };
        self.add_node(pos, ty, NodeKind::ConstExpr(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zinc_core::intern::IdentTable;

    #[test]
    fn test_wrap_int() {
        assert_eq!(wrap_int(300, 8, false), 44);
        assert_eq!(wrap_int(200, 8, true), -56);
        assert_eq!(wrap_int(-1, 16, false), 0xffff);
        assert_eq!(wrap_int(-1, 32, true), -1);
        assert_eq!(wrap_int(i128::from(u64::MAX), 64, true), -1);
    }

    #[test]
    fn test_integer_division_by_zero() {
        let result = arithmetic(BinaryOp::Div, ConstValue::Int(1), ConstValue::Int(0));
        assert_eq!(result, Err(ConstError::DivisionByZero));
        let result = arithmetic(BinaryOp::Div, ConstValue::Float(1.0), ConstValue::Float(0.0));
        assert_eq!(result, Ok(ConstValue::Float(f64::INFINITY)));
    }

    #[test]
    fn test_conditions() {
        assert_eq!(condition(BinaryOp::Lt, ConstValue::Int(1), ConstValue::Int(2)), Ok(true));
        assert_eq!(condition(BinaryOp::Ge, ConstValue::Float(1.5), ConstValue::Int(2)), Ok(false));
        assert_eq!(condition(BinaryOp::Ne, ConstValue::Float(f64::NAN), ConstValue::Float(f64::NAN)), Ok(true));
        assert_eq!(condition(BinaryOp::Or, ConstValue::Bool(false), ConstValue::Int(3)), Ok(true));
    }

    #[test]
    fn test_bool_bitcasts_to_integer() {
        let program = Program::new(&IdentTable::init(), 64);
        let step = CastStep::new(StepKind::BitCast, program.builtins.uint8);
        assert_eq!(program.convert(ConstValue::Bool(true), step), Ok(ConstValue::Int(1)));
        assert_eq!(program.convert(ConstValue::Bool(false), step), Ok(ConstValue::Int(0)));
    }

    #[test]
    fn test_narrowing_wraps_to_target_width() {
        let program = Program::new(&IdentTable::init(), 64);
        let step = CastStep::new(StepKind::Narrow, program.builtins.int8);
        assert_eq!(program.convert(ConstValue::Int(300), step), Ok(ConstValue::Int(44)));
        let step = CastStep::new(StepKind::Narrow, program.builtins.uint8);
        assert_eq!(program.convert(ConstValue::Int(-1), step), Ok(ConstValue::Int(255)));
    }
}
