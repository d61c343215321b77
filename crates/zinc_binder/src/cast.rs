//! The conversion engine.
//!
//! `can_cast` decides whether a value of one type may become another and,
//! if so, returns the ordered primitive steps that perform the conversion.
//! It looks only at the two types and the intent. `Binder::cast` replays a
//! plan onto a bound node, one wrapper node per step.

use crate::binder::Binder;
use crate::node::{NodeId, NodeKind};
use crate::program::Program;
use crate::symbol::{Builtin, Decl, Scalar};
use crate::types::{TypeId, TypeKind};
use zinc_diagnostics::{messages, Diagnostic};

/// Whether a conversion was written by the user (`as`) or is inserted by
/// the binder (assignments, arguments, operands, `to`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastIntent {
    Implicit,
    Explicit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    FromNull,
    Widen,
    Narrow,
    BitCast,
    ToBool,
    AddressOf,
    ReferenceOf,
    Dereference,
    PackedFloatCast,
    PackedBroadcast,
    PackedBitCast,
}

impl StepKind {
    /// Steps that compute a new value rather than moving between a value
    /// and its storage.
    pub fn is_value_conversion(self) -> bool {
        !matches!(
            self,
            StepKind::AddressOf | StepKind::ReferenceOf | StepKind::Dereference
        )
    }
}

/// One primitive conversion, producing a value of type `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CastStep {
    pub kind: StepKind,
    pub to: TypeId,
}

impl CastStep {
    pub fn new(kind: StepKind, to: TypeId) -> Self {
        Self { kind, to }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastFailure {
    NotConvertible,
    /// The conversion exists but must be written with `as`.
    ExplicitOnly,
    LaneCountMismatch,
    /// Conversions between distinct struct types.
    StructUnimplemented,
    /// No rule covers the pair.
    Internal,
}

pub type CastPlan = Result<Vec<CastStep>, CastFailure>;

/// How the conversion rules see a type.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Class {
    Unknown,
    Void,
    Null,
    Scalar(Scalar),
    Packed { element: Scalar, lanes: u16 },
    Enum { base: TypeId },
    Function,
    Pointer(TypeId),
    Reference(TypeId),
    Aggregate,
    /// Modules, templates, overload sets, labels.
    Opaque,
}

fn classify(program: &Program<'_>, ty: TypeId) -> Class {
    match program.types.kind(ty) {
        TypeKind::Unknown => Class::Unknown,
        TypeKind::Pointer(inner) => Class::Pointer(inner),
        TypeKind::Reference(inner) => Class::Reference(inner),
        TypeKind::Direct(symbol) => match &program.symbol(symbol).decl {
            Decl::Builtin(Builtin::Void) => Class::Void,
            Decl::Builtin(Builtin::Null) => Class::Null,
            Decl::Builtin(Builtin::Scalar(scalar)) => Class::Scalar(*scalar),
            Decl::Builtin(Builtin::Packed { element, lanes }) => Class::Packed {
                element: *element,
                lanes: *lanes,
            },
            Decl::Enum(decl) => Class::Enum { base: decl.base },
            Decl::Function(_) => Class::Function,
            Decl::Struct(_) | Decl::Union(_) | Decl::Array(_) => Class::Aggregate,
            _ => Class::Opaque,
        },
    }
}

fn explicit_only(intent: CastIntent, steps: Vec<CastStep>) -> CastPlan {
    match intent {
        CastIntent::Implicit => Err(CastFailure::ExplicitOnly),
        CastIntent::Explicit => Ok(steps),
    }
}

fn chain(mut first: Vec<CastStep>, rest: CastPlan) -> CastPlan {
    first.extend(rest?);
    Ok(first)
}

/// Decide whether `src` converts to `dst` under `intent`.
///
/// Rules apply in order and the first match wins:
/// 1. `Void`, modules and templates never convert; distinct aggregates are
///    unsupported.
/// 2. `null` converts to anything with `FromNull`.
/// 3. References are read (`Dereference`) or taken (`ReferenceOf`).
/// 4. Functions bitcast to functions and `Void*`.
/// 5. Packed types need equal lane counts; scalars broadcast.
/// 6. `Bool` destinations use `ToBool`.
/// 7. `Void*` is the universal pointer.
/// 8. Pointer/pointer and pointer/integer conversions.
/// 9. Enums and scalar numerics.
pub fn can_cast(program: &Program<'_>, src: TypeId, dst: TypeId, intent: CastIntent) -> CastPlan {
    if src == dst {
        return Ok(Vec::new());
    }
    let source = classify(program, src);
    let target = classify(program, dst);

    if matches!(source, Class::Unknown | Class::Void | Class::Opaque)
        || matches!(target, Class::Unknown | Class::Void | Class::Opaque)
    {
        return Err(CastFailure::NotConvertible);
    }
    if source == Class::Null {
        return Ok(vec![CastStep::new(StepKind::FromNull, dst)]);
    }

    match (source, target) {
        (Class::Aggregate, Class::Aggregate) => return Err(CastFailure::StructUnimplemented),
        (Class::Aggregate, Class::Pointer(_) | Class::Reference(_))
        | (Class::Pointer(_) | Class::Reference(_), Class::Aggregate) => {}
        (Class::Aggregate, _) | (_, Class::Aggregate) => return Err(CastFailure::NotConvertible),
        _ => {}
    }

    // References.
    if let Class::Reference(inner) = source {
        match target {
            Class::Pointer(pointee) if pointee == inner => {
                return Ok(vec![CastStep::new(StepKind::AddressOf, dst)]);
            }
            Class::Pointer(_) | Class::Reference(_) => {}
            _ => {
                let read = vec![CastStep::new(StepKind::Dereference, inner)];
                return chain(read, can_cast(program, inner, dst, intent));
            }
        }
    }
    if let Class::Reference(inner) = target {
        match source {
            Class::Pointer(_) | Class::Reference(_) => {}
            _ if inner == src => return Ok(vec![CastStep::new(StepKind::ReferenceOf, dst)]),
            _ => return Err(CastFailure::NotConvertible),
        }
    }
    if matches!(source, Class::Aggregate) || matches!(target, Class::Aggregate) {
        return Err(CastFailure::NotConvertible);
    }

    // Functions.
    if source == Class::Function || target == Class::Function {
        let other = if source == Class::Function { dst } else { src };
        let other_class = if source == Class::Function { target } else { source };
        return if other_class == Class::Function || other == program.builtins.void_ptr {
            Ok(vec![CastStep::new(StepKind::BitCast, dst)])
        } else {
            Err(CastFailure::NotConvertible)
        };
    }

    // Packed types.
    match (source, target) {
        (
            Class::Packed {
                element: from,
                lanes: from_lanes,
            },
            Class::Packed {
                element: to,
                lanes: to_lanes,
            },
        ) => {
            if from_lanes != to_lanes {
                return Err(CastFailure::LaneCountMismatch);
            }
            let element = program.builtins.scalar(to);
            scalar_plan(program, from, to, element, intent)?;
            let kind = if from.is_float() || to.is_float() {
                StepKind::PackedFloatCast
            } else {
                StepKind::PackedBitCast
            };
            return Ok(vec![CastStep::new(kind, dst)]);
        }
        (Class::Scalar(from), Class::Packed { element: to, .. }) => {
            if from == Scalar::Bool {
                return Err(CastFailure::NotConvertible);
            }
            let element = program.builtins.scalar(to);
            let lanes = if from == to {
                Vec::new()
            } else {
                scalar_plan(program, from, to, element, intent)?
            };
            return chain(lanes, Ok(vec![CastStep::new(StepKind::PackedBroadcast, dst)]));
        }
        (Class::Packed { .. }, _) | (_, Class::Packed { .. }) => {
            return Err(CastFailure::LaneCountMismatch)
        }
        _ => {}
    }

    // Bool destinations.
    if target == Class::Scalar(Scalar::Bool) {
        return match source {
            Class::Scalar(_) | Class::Enum { .. } => Ok(vec![CastStep::new(StepKind::ToBool, dst)]),
            Class::Pointer(_) => explicit_only(intent, vec![CastStep::new(StepKind::ToBool, dst)]),
            _ => Err(CastFailure::NotConvertible),
        };
    }

    // The universal pointer.
    let void = program.builtins.void;
    let is_void_indirect = |class: Class| {
        matches!(class, Class::Pointer(inner) | Class::Reference(inner) if inner == void)
    };
    let is_indirect = |class: Class| matches!(class, Class::Pointer(_) | Class::Reference(_));
    if is_void_indirect(source) || is_void_indirect(target) {
        if is_indirect(source) && is_indirect(target) {
            return Ok(vec![CastStep::new(StepKind::BitCast, dst)]);
        }
        return match (source, target) {
            (_, Class::Scalar(to @ Scalar::Int { .. })) => {
                explicit_only(intent, pointer_to_int(program, to, dst))
            }
            (Class::Scalar(from @ Scalar::Int { .. }), _) => {
                explicit_only(intent, int_to_pointer(program, from, dst))
            }
            (_, Class::Scalar(to @ Scalar::Float { .. })) => {
                if intent == CastIntent::Implicit {
                    return Err(CastFailure::ExplicitOnly);
                }
                let bridge = program.pointer_int(true);
                let bridge_scalar = Scalar::Int {
                    bits: program.pointer_width,
                    signed: true,
                };
                chain(
                    vec![CastStep::new(StepKind::BitCast, bridge)],
                    scalar_plan(program, bridge_scalar, to, dst, CastIntent::Explicit),
                )
            }
            (Class::Scalar(from @ Scalar::Float { .. }), _) => {
                if intent == CastIntent::Implicit {
                    return Err(CastFailure::ExplicitOnly);
                }
                let bridge = program.pointer_int(true);
                let bridge_scalar = Scalar::Int {
                    bits: program.pointer_width,
                    signed: true,
                };
                chain(
                    scalar_plan(program, from, bridge_scalar, bridge, CastIntent::Explicit)?,
                    Ok(vec![CastStep::new(StepKind::BitCast, dst)]),
                )
            }
            _ => Err(CastFailure::NotConvertible),
        };
    }

    // Pointers.
    match (source, target) {
        (
            Class::Pointer(from) | Class::Reference(from),
            Class::Pointer(to) | Class::Reference(to),
        ) => {
            let step = vec![CastStep::new(StepKind::BitCast, dst)];
            if from == to {
                return Ok(step);
            }
            return match (program.scalar(from), program.scalar(to)) {
                (Some(a @ Scalar::Int { .. }), Some(b @ Scalar::Int { .. }))
                    if a.bits() == b.bits() =>
                {
                    Ok(step)
                }
                _ => explicit_only(intent, step),
            };
        }
        (Class::Pointer(_), Class::Scalar(to @ Scalar::Int { .. })) => {
            return explicit_only(intent, pointer_to_int(program, to, dst));
        }
        (Class::Scalar(from @ Scalar::Int { .. }), Class::Pointer(_)) => {
            return explicit_only(intent, int_to_pointer(program, from, dst));
        }
        (Class::Pointer(_), _) | (_, Class::Pointer(_)) => {
            return Err(CastFailure::NotConvertible)
        }
        _ => {}
    }

    // Enums and scalars.
    match (source, target) {
        (Class::Enum { .. }, Class::Enum { .. }) => Err(CastFailure::NotConvertible),
        (Class::Enum { base }, Class::Scalar(to @ Scalar::Int { .. })) => {
            if intent == CastIntent::Implicit {
                return Err(CastFailure::ExplicitOnly);
            }
            let read = vec![CastStep::new(StepKind::BitCast, base)];
            match program.scalar(base) {
                Some(from) if base != dst => {
                    chain(read, scalar_plan(program, from, to, dst, CastIntent::Explicit))
                }
                _ => Ok(read),
            }
        }
        (Class::Scalar(from @ Scalar::Int { .. }), Class::Enum { base }) => {
            if intent == CastIntent::Implicit {
                return Err(CastFailure::ExplicitOnly);
            }
            let adjust = match program.scalar(base) {
                Some(to) if base != src => {
                    scalar_plan(program, from, to, base, CastIntent::Explicit)?
                }
                _ => Vec::new(),
            };
            chain(adjust, Ok(vec![CastStep::new(StepKind::BitCast, dst)]))
        }
        (Class::Scalar(from), Class::Scalar(to)) => scalar_plan(program, from, to, dst, intent),
        (Class::Enum { .. }, _) | (_, Class::Enum { .. }) => Err(CastFailure::NotConvertible),
        _ => Err(CastFailure::Internal),
    }
}

/// Scalar-to-scalar rules. `dst` is the builtin type of `to`.
fn scalar_plan(
    program: &Program<'_>,
    from: Scalar,
    to: Scalar,
    dst: TypeId,
    intent: CastIntent,
) -> CastPlan {
    let widen = vec![CastStep::new(StepKind::Widen, dst)];
    let narrow = vec![CastStep::new(StepKind::Narrow, dst)];
    match (from, to) {
        _ if from == to => Ok(Vec::new()),
        (_, Scalar::Bool) => Ok(vec![CastStep::new(StepKind::ToBool, dst)]),
        (Scalar::Bool, _) => explicit_only(intent, widen),
        (
            Scalar::Int {
                bits: from_bits,
                signed: from_signed,
            },
            Scalar::Int {
                bits: to_bits,
                signed: to_signed,
            },
        ) => {
            if from_signed == to_signed {
                return if to_bits > from_bits {
                    Ok(widen)
                } else {
                    explicit_only(intent, narrow)
                };
            }
            // Sign changes: adjust the width in the source's signedness,
            // then reinterpret.
            let bitcast = CastStep::new(StepKind::BitCast, dst);
            if from_bits == to_bits {
                return explicit_only(intent, vec![bitcast]);
            }
            let intermediate = program.builtins.int(to_bits, from_signed);
            let resize = if to_bits > from_bits {
                StepKind::Widen
            } else {
                StepKind::Narrow
            };
            explicit_only(intent, vec![CastStep::new(resize, intermediate), bitcast])
        }
        _ => {
            if to.bits() > from.bits() {
                Ok(widen)
            } else {
                explicit_only(intent, narrow)
            }
        }
    }
}

/// Reinterpret as a pointer-width integer, then resize.
fn pointer_to_int(program: &Program<'_>, to: Scalar, dst: TypeId) -> Vec<CastStep> {
    let Scalar::Int { bits, signed } = to else {
        return Vec::new();
    };
    let width = program.pointer_width;
    let mut steps = vec![CastStep::new(StepKind::BitCast, program.pointer_int(signed))];
    if bits > width {
        steps.push(CastStep::new(StepKind::Widen, dst));
    } else if bits < width {
        steps.push(CastStep::new(StepKind::Narrow, dst));
    }
    steps
}

/// Resize to pointer width in the source's signedness, then reinterpret.
fn int_to_pointer(program: &Program<'_>, from: Scalar, dst: TypeId) -> Vec<CastStep> {
    let Scalar::Int { bits, signed } = from else {
        return Vec::new();
    };
    let width = program.pointer_width;
    let sized = program.pointer_int(signed);
    let mut steps = Vec::new();
    if bits < width {
        steps.push(CastStep::new(StepKind::Widen, sized));
    } else if bits > width {
        steps.push(CastStep::new(StepKind::Narrow, sized));
    }
    steps.push(CastStep::new(StepKind::BitCast, dst));
    steps
}

impl<'a> Binder<'a> {
    /// Convert `value` to `dst`, diagnosing failure at the value's
    /// position. Constant inputs stay tagged as constant expressions.
    pub fn cast(&mut self, value: NodeId, dst: TypeId, intent: CastIntent) -> Option<NodeId> {
        let (src, pos) = {
            let node = self.program.node(value);
            (node.ty, node.pos)
        };
        if self.program.types.is_unknown(src) || self.program.types.is_unknown(dst) {
            return None;
        }
        let steps = match can_cast(&self.program, src, dst, intent) {
            Ok(steps) => steps,
            Err(failure) => {
                self.report_cast_failure(failure, src, dst, intent, pos);
                return None;
            }
        };

        let mut constant = self.is_constant(value);
        let mut current = value;
        for step in steps {
            let kind = match step.kind {
                StepKind::AddressOf => NodeKind::AddressOf(current),
                StepKind::ReferenceOf => NodeKind::ReferenceOf(current),
                StepKind::Dereference => NodeKind::Dereference(current),
                _ => NodeKind::Cast {
                    value: current,
                    step,
                },
            };
            current = self.add_node(pos, step.to, kind);
            if constant && step.kind.is_value_conversion() {
                current = self.add_node(pos, step.to, NodeKind::ConstExpr(current));
            } else {
                constant = false;
            }
        }
        Some(current)
    }

    fn report_cast_failure(
        &mut self,
        failure: CastFailure,
        src: TypeId,
        dst: TypeId,
        intent: CastIntent,
        pos: zinc_core::text::SourcePos,
    ) {
        let from = self.type_name(src);
        let to = self.type_name(dst);
        let diagnostic = match failure {
            CastFailure::ExplicitOnly => {
                Diagnostic::new(pos, &messages::CANNOT_IMPLICITLY_CONVERT_0_TO_1, &[&from, &to])
                    .with_related(Diagnostic::new(
                        pos,
                        &messages::EXPLICIT_CONVERSION_EXISTS_0_1,
                        &[&from, &to],
                    ))
            }
            CastFailure::NotConvertible if intent == CastIntent::Implicit => {
                Diagnostic::new(pos, &messages::CANNOT_IMPLICITLY_CONVERT_0_TO_1, &[&from, &to])
            }
            CastFailure::NotConvertible => {
                Diagnostic::new(pos, &messages::CANNOT_CONVERT_0_TO_1, &[&from, &to])
            }
            CastFailure::LaneCountMismatch => {
                Diagnostic::new(pos, &messages::LANE_COUNT_MISMATCH_0_1, &[&from, &to])
            }
            CastFailure::StructUnimplemented => Diagnostic::new(
                pos,
                &messages::STRUCT_CONVERSION_UNIMPLEMENTED_0_1,
                &[&from, &to],
            ),
            CastFailure::Internal => Diagnostic::new(
                pos,
                &messages::INTERNAL_0,
                &[&format!("no conversion rule from '{}' to '{}'", from, to)],
            ),
        };
        self.report(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zinc_core::intern::IdentTable;

    fn program() -> Program<'static> {
        Program::new(&IdentTable::init(), 64)
    }

    fn kinds(plan: &CastPlan) -> Vec<StepKind> {
        plan.as_ref()
            .map(|steps| steps.iter().map(|step| step.kind).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_identity_is_empty() {
        let program = program();
        let b = &program.builtins;
        for ty in [b.bool, b.int8, b.uint64, b.double, b.void_ptr] {
            assert_eq!(can_cast(&program, ty, ty, CastIntent::Implicit), Ok(vec![]));
        }
    }

    #[test]
    fn test_integer_widening_and_narrowing() {
        let program = program();
        let b = &program.builtins;
        assert_eq!(
            kinds(&can_cast(&program, b.int8, b.int32, CastIntent::Implicit)),
            vec![StepKind::Widen]
        );
        assert_eq!(
            can_cast(&program, b.int64, b.int32, CastIntent::Implicit),
            Err(CastFailure::ExplicitOnly)
        );
        assert_eq!(
            kinds(&can_cast(&program, b.int64, b.int32, CastIntent::Explicit)),
            vec![StepKind::Narrow]
        );
    }

    #[test]
    fn test_sign_change_goes_through_intermediate() {
        let program = program();
        let b = &program.builtins;
        assert_eq!(
            can_cast(&program, b.int8, b.uint32, CastIntent::Implicit),
            Err(CastFailure::ExplicitOnly)
        );
        let plan = can_cast(&program, b.int8, b.uint32, CastIntent::Explicit).unwrap();
        assert_eq!(plan[0], CastStep::new(StepKind::Widen, b.int32));
        assert_eq!(plan[1], CastStep::new(StepKind::BitCast, b.uint32));
        assert_eq!(
            kinds(&can_cast(&program, b.int32, b.uint32, CastIntent::Explicit)),
            vec![StepKind::BitCast]
        );
    }

    #[test]
    fn test_float_rules() {
        let program = program();
        let b = &program.builtins;
        assert_eq!(
            kinds(&can_cast(&program, b.float, b.double, CastIntent::Implicit)),
            vec![StepKind::Widen]
        );
        assert_eq!(
            can_cast(&program, b.double, b.float, CastIntent::Implicit),
            Err(CastFailure::ExplicitOnly)
        );
        assert_eq!(
            can_cast(&program, b.double, b.float, CastIntent::Explicit),
            Ok(vec![CastStep::new(StepKind::Narrow, b.float)])
        );
        assert_eq!(
            can_cast(&program, b.int32, b.float, CastIntent::Implicit),
            Err(CastFailure::ExplicitOnly)
        );
        assert_eq!(
            kinds(&can_cast(&program, b.int16, b.float, CastIntent::Implicit)),
            vec![StepKind::Widen]
        );
    }

    #[test]
    fn test_bool_rules() {
        let mut program = program();
        let int_ptr = program.types.pointer(program.builtins.int32);
        let b = program.builtins.clone();
        assert_eq!(
            kinds(&can_cast(&program, b.int32, b.bool, CastIntent::Implicit)),
            vec![StepKind::ToBool]
        );
        assert_eq!(
            can_cast(&program, int_ptr, b.bool, CastIntent::Implicit),
            Err(CastFailure::ExplicitOnly)
        );
        assert_eq!(
            kinds(&can_cast(&program, int_ptr, b.bool, CastIntent::Explicit)),
            vec![StepKind::ToBool]
        );
        assert_eq!(
            can_cast(&program, b.bool, b.int32, CastIntent::Implicit),
            Err(CastFailure::ExplicitOnly)
        );
    }

    #[test]
    fn test_pointer_to_int_on_64_bit() {
        let mut program = program();
        let int_ptr = program.types.pointer(program.builtins.int32);
        let b = program.builtins.clone();
        assert_eq!(
            can_cast(&program, int_ptr, b.int64, CastIntent::Explicit),
            Ok(vec![CastStep::new(StepKind::BitCast, b.int64)])
        );
        assert_eq!(
            kinds(&can_cast(&program, int_ptr, b.int32, CastIntent::Explicit)),
            vec![StepKind::BitCast, StepKind::Narrow]
        );
        assert_eq!(
            can_cast(&program, int_ptr, b.int64, CastIntent::Implicit),
            Err(CastFailure::ExplicitOnly)
        );
    }

    #[test]
    fn test_void_pointer_is_universal() {
        let mut program = program();
        let b = program.builtins.clone();
        let int_ptr = program.types.pointer(b.int32);
        let double_ptr = program.types.pointer(b.double);
        assert_eq!(
            kinds(&can_cast(&program, int_ptr, b.void_ptr, CastIntent::Implicit)),
            vec![StepKind::BitCast]
        );
        assert_eq!(
            kinds(&can_cast(&program, b.void_ptr, double_ptr, CastIntent::Implicit)),
            vec![StepKind::BitCast]
        );
        assert_eq!(
            can_cast(&program, int_ptr, double_ptr, CastIntent::Implicit),
            Err(CastFailure::ExplicitOnly)
        );
        assert_eq!(
            kinds(&can_cast(&program, b.void_ptr, b.double, CastIntent::Explicit)),
            vec![StepKind::BitCast, StepKind::Narrow]
        );
    }

    #[test]
    fn test_same_size_integer_pointees_convert_implicitly() {
        let mut program = program();
        let b = program.builtins.clone();
        let signed = program.types.pointer(b.int32);
        let unsigned = program.types.pointer(b.uint32);
        let wide = program.types.pointer(b.int64);
        assert!(can_cast(&program, signed, unsigned, CastIntent::Implicit).is_ok());
        assert!(can_cast(&program, signed, wide, CastIntent::Implicit).is_err());
    }

    #[test]
    fn test_references() {
        let mut program = program();
        let b = program.builtins.clone();
        let int_ref = program.types.reference(b.int32);
        let int_ptr = program.types.pointer(b.int32);
        assert_eq!(
            kinds(&can_cast(&program, int_ref, b.int64, CastIntent::Implicit)),
            vec![StepKind::Dereference, StepKind::Widen]
        );
        assert_eq!(
            kinds(&can_cast(&program, int_ref, int_ptr, CastIntent::Implicit)),
            vec![StepKind::AddressOf]
        );
        assert_eq!(
            kinds(&can_cast(&program, b.int32, int_ref, CastIntent::Implicit)),
            vec![StepKind::ReferenceOf]
        );
        assert!(can_cast(&program, b.int64, int_ref, CastIntent::Explicit).is_err());
    }

    #[test]
    fn test_reference_to_reference() {
        let mut program = program();
        let b = program.builtins.clone();
        let int_ref = program.types.reference(b.int32);
        let uint_ref = program.types.reference(b.uint32);
        let long_ref = program.types.reference(b.int64);
        let void_ref = program.types.reference(b.void);
        for intent in [CastIntent::Implicit, CastIntent::Explicit] {
            assert_eq!(
                can_cast(&program, int_ref, void_ref, intent),
                Ok(vec![CastStep::new(StepKind::BitCast, void_ref)])
            );
            assert_eq!(
                can_cast(&program, void_ref, int_ref, intent),
                Ok(vec![CastStep::new(StepKind::BitCast, int_ref)])
            );
        }
        assert_eq!(
            can_cast(&program, int_ref, uint_ref, CastIntent::Explicit),
            Ok(vec![CastStep::new(StepKind::BitCast, uint_ref)])
        );
        assert_eq!(
            can_cast(&program, int_ref, long_ref, CastIntent::Implicit),
            Err(CastFailure::ExplicitOnly)
        );
        assert_eq!(
            kinds(&can_cast(&program, int_ref, long_ref, CastIntent::Explicit)),
            vec![StepKind::BitCast]
        );
    }

    #[test]
    fn test_null_and_void() {
        let mut program = program();
        let b = program.builtins.clone();
        let int_ptr = program.types.pointer(b.int32);
        assert_eq!(
            kinds(&can_cast(&program, b.null, int_ptr, CastIntent::Implicit)),
            vec![StepKind::FromNull]
        );
        assert_eq!(
            can_cast(&program, b.void, b.int32, CastIntent::Explicit),
            Err(CastFailure::NotConvertible)
        );
    }

    #[test]
    fn test_packed_rules() {
        let program = program();
        let b = &program.builtins;
        let float4 = b
            .packed(Builtin::Packed {
                element: Scalar::Float { bits: 32 },
                lanes: 4,
            })
            .unwrap();
        let int4 = b
            .packed(Builtin::Packed {
                element: Scalar::Int {
                    bits: 32,
                    signed: true,
                },
                lanes: 4,
            })
            .unwrap();
        let double2 = b
            .packed(Builtin::Packed {
                element: Scalar::Float { bits: 64 },
                lanes: 2,
            })
            .unwrap();
        assert_eq!(
            kinds(&can_cast(&program, int4, float4, CastIntent::Explicit)),
            vec![StepKind::PackedFloatCast]
        );
        assert_eq!(
            can_cast(&program, int4, float4, CastIntent::Implicit),
            Err(CastFailure::ExplicitOnly)
        );
        assert_eq!(
            can_cast(&program, float4, double2, CastIntent::Explicit),
            Err(CastFailure::LaneCountMismatch)
        );
        assert_eq!(
            kinds(&can_cast(&program, b.float, float4, CastIntent::Implicit)),
            vec![StepKind::PackedBroadcast]
        );
        assert_eq!(
            kinds(&can_cast(&program, b.int16, float4, CastIntent::Implicit)),
            vec![StepKind::Widen, StepKind::PackedBroadcast]
        );
    }

    #[test]
    fn test_implicit_success_implies_explicit_success() {
        let program = program();
        let b = &program.builtins;
        let scalars = [
            b.bool, b.int8, b.int16, b.int32, b.int64, b.uint8, b.uint16, b.uint32, b.uint64,
            b.float, b.double,
        ];
        for &from in &scalars {
            for &to in &scalars {
                if let Ok(implicit) = can_cast(&program, from, to, CastIntent::Implicit) {
                    let explicit = can_cast(&program, from, to, CastIntent::Explicit)
                        .expect("explicit must succeed when implicit does");
                    assert!(explicit.len() <= implicit.len());
                }
            }
        }
    }
}
