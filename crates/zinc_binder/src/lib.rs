//! zinc_binder: Name resolution, template instantiation and type binding.
//!
//! The binder walks the syntax of every module and produces a bound
//! program: symbols in nested scopes, interned types, and a typed node
//! graph in which every name is resolved, every implicit conversion is an
//! explicit cast step and every generic use refers to a concrete instance.

mod binder;
mod builtins;
mod capture;
mod cast;
mod const_eval;
mod expr;
mod frame;
mod generator;
mod node;
mod operators;
mod program;
mod scope;
mod symbol;
mod template;
mod types;

pub use binder::{Binder, BinderOptions};
pub use builtins::Builtins;
pub use cast::{can_cast, CastFailure, CastIntent, CastPlan, CastStep, StepKind};
pub use const_eval::ConstError;
pub use node::{CaptureHop, CompoundKind, ConstValue, Node, NodeId, NodeKind};
pub use program::Program;
pub use scope::{Scope, ScopeId, ScopeKind};
pub use symbol::*;
pub use template::{Arity, Fingerprint, FingerprintEntry, TemplateSyntax};
pub use types::{TypeId, TypeKind, TypeTable};
