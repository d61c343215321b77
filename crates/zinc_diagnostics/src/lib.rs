//! zinc_diagnostics: Diagnostic messages and error reporting infrastructure.
//!
//! Every failure path of the binder produces a categorized diagnostic built
//! from one of the `messages` constants. Diagnostics are accumulated in a
//! `DiagnosticCollection`; compilation never stops at the first error, and
//! the driver checks the aggregate error count before any later stage runs.

use std::fmt;
use zinc_core::text::SourcePos;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    Error,
    Warning,
    Note,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Error => write!(f, "error"),
            DiagnosticCategory::Warning => write!(f, "warning"),
            DiagnosticCategory::Note => write!(f, "note"),
        }
    }
}

/// What went wrong, independent of the exact message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A name declared twice in one scope.
    DuplicateName,
    /// A name that could not be resolved.
    Name,
    /// An expression of the wrong type, or a misused construct.
    Type,
    /// A failed conversion.
    Cast,
    /// An unresolved or illegal cross-module reference.
    Import,
    /// Generic declaration or instantiation problems.
    Template,
    /// A reference that would have to cross a non-capturing function.
    Capture,
    /// Scope nesting exceeded the configured limit.
    Nesting,
    /// A language feature the binder does not support.
    Unimplemented,
    /// A binder invariant was violated.
    Internal,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::DuplicateName => "DuplicateName",
            DiagnosticKind::Name => "Name",
            DiagnosticKind::Type => "Type",
            DiagnosticKind::Cast => "Cast",
            DiagnosticKind::Import => "Import",
            DiagnosticKind::Template => "Template",
            DiagnosticKind::Capture => "Capture",
            DiagnosticKind::Nesting => "Nesting",
            DiagnosticKind::Unimplemented => "Unimplemented",
            DiagnosticKind::Internal => "Internal",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message template with its code, kind and severity.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub kind: DiagnosticKind,
    pub category: DiagnosticCategory,
    /// Template text; `{0}`, `{1}`, ... are replaced by arguments.
    pub message: &'static str,
}

/// A realized diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Display name of the file, filled in by the driver.
    pub file: Option<String>,
    pub pos: SourcePos,
    pub message_text: String,
    pub code: u32,
    pub kind: DiagnosticKind,
    pub category: DiagnosticCategory,
    pub related_information: Vec<Diagnostic>,
}

impl Diagnostic {
    pub fn new(pos: SourcePos, message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            file: None,
            pos,
            message_text: format_message(message.message, args),
            code: message.code,
            kind: message.kind,
            category: message.category,
            related_information: Vec::new(),
        }
    }

    /// Attach a note pointing at another position.
    pub fn with_related(mut self, related: Diagnostic) -> Self {
        self.related_information.push(related);
        self
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref file) = self.file {
            write!(f, "{}:{}: ", file, self.pos)?;
        }
        write!(
            f,
            "{}[Z{:04}] {}: {}",
            self.category, self.code, self.kind, self.message_text
        )
    }
}

/// Replace `{0}`, `{1}`, ... in `template` with `args`.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// Diagnostics accumulated during compilation.
///
/// `max_errors` caps how many errors are *stored*; the error counter keeps
/// counting past it so the aggregate gate stays correct.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    max_errors: Option<usize>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_errors(max_errors: Option<usize>) -> Self {
        Self {
            max_errors,
            ..Self::default()
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            self.error_count += 1;
            if let Some(max) = self.max_errors {
                if self.error_count > max {
                    return;
                }
            }
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Number of errors reported, including ones dropped by `max_errors`.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// How many stored diagnostics have the given kind.
    pub fn count_kind(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn extend(&mut self, other: DiagnosticCollection) {
        for diagnostic in other.diagnostics {
            self.add(diagnostic);
        }
    }

    /// Sort by file and position, keeping report order for ties.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            a.pos
                .file
                .cmp(&b.pos.file)
                .then(a.pos.start.cmp(&b.pos.start))
        });
    }
}

// ============================================================================
// Diagnostic messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, $kind:ident, $msg:expr) => {
            DiagnosticMessage {
                code: $code,
                kind: DiagnosticKind::$kind,
                category: DiagnosticCategory::Error,
                message: $msg,
            }
        };
        ($code:expr, $kind:ident, Warning, $msg:expr) => {
            DiagnosticMessage {
                code: $code,
                kind: DiagnosticKind::$kind,
                category: DiagnosticCategory::Warning,
                message: $msg,
            }
        };
        ($code:expr, $kind:ident, Note, $msg:expr) => {
            DiagnosticMessage {
                code: $code,
                kind: DiagnosticKind::$kind,
                category: DiagnosticCategory::Note,
                message: $msg,
            }
        };
    }

    // ========================================================================
    // Declarations (1000-1099)
    // ========================================================================
    pub const DUPLICATE_NAME_0: DiagnosticMessage = diag!(1001, DuplicateName, "'{0}' is already declared in this scope.");
    pub const PREVIOUS_DECLARATION_0: DiagnosticMessage = diag!(1002, DuplicateName, Note, "'{0}' was first declared here.");
    pub const MISSING_TYPE_OR_INITIALIZER_0: DiagnosticMessage = diag!(1003, Type, "'{0}' needs a declared type or an initializer.");
    pub const BODY_REQUIRED_0: DiagnosticMessage = diag!(1004, Type, "Function '{0}' needs a body outside an extern block.");
    pub const EXTERN_PARAMETER_TYPE_0: DiagnosticMessage = diag!(1005, Type, "Extern function '{0}' must declare the type of every parameter.");
    pub const EXTERN_BODY_0: DiagnosticMessage = diag!(1006, Type, "Extern function '{0}' cannot have a body.");
    pub const FIELD_NEEDS_TYPE_0: DiagnosticMessage = diag!(1007, Type, "Field '{0}' needs a declared type or an initializer.");
    pub const ENUM_BASE_NOT_INTEGRAL_0: DiagnosticMessage = diag!(1008, Type, "Enum base type '{0}' is not integral.");

    // ========================================================================
    // Name resolution (1100-1199)
    // ========================================================================
    pub const CANNOT_FIND_NAME_0: DiagnosticMessage = diag!(1101, Name, "Cannot find name '{0}'.");
    pub const NO_MEMBER_0_IN_1: DiagnosticMessage = diag!(1102, Name, "'{1}' has no member named '{0}'.");
    pub const NAME_0_IS_NOT_A_VALUE: DiagnosticMessage = diag!(1103, Name, "'{0}' does not name a value.");
    pub const NAME_0_IS_NOT_A_TYPE: DiagnosticMessage = diag!(1104, Name, "'{0}' does not name a type.");
    pub const CANNOT_FIND_LABEL_0: DiagnosticMessage = diag!(1105, Name, "Cannot find label '{0}'.");

    // ========================================================================
    // Types and expressions (2000-2999)
    // ========================================================================
    pub const OPERATOR_0_CANNOT_BE_APPLIED_TO_1_AND_2: DiagnosticMessage = diag!(2001, Type, "Operator '{0}' cannot be applied to '{1}' and '{2}'.");
    pub const OPERATOR_0_CANNOT_BE_APPLIED_TO_1: DiagnosticMessage = diag!(2002, Type, "Operator '{0}' cannot be applied to '{1}'.");
    pub const NO_COMMON_TYPE_0_1: DiagnosticMessage = diag!(2003, Type, "'{0}' and '{1}' have no common type.");
    pub const EXPRESSION_NOT_ASSIGNABLE: DiagnosticMessage = diag!(2004, Type, "Expression is not assignable.");
    pub const NOT_CALLABLE_0: DiagnosticMessage = diag!(2005, Type, "Value of type '{0}' is not callable.");
    pub const NOT_INDEXABLE_0: DiagnosticMessage = diag!(2006, Type, "Value of type '{0}' cannot be indexed.");
    pub const CANNOT_DEREFERENCE_0: DiagnosticMessage = diag!(2007, Type, "Value of type '{0}' cannot be dereferenced.");
    pub const CANNOT_TAKE_ADDRESS: DiagnosticMessage = diag!(2008, Type, "Cannot take the address of a temporary value.");
    pub const RETURN_OUTSIDE_FUNCTION: DiagnosticMessage = diag!(2009, Type, "'return' outside of a function.");
    pub const YIELD_OUTSIDE_GENERATOR: DiagnosticMessage = diag!(2010, Type, "'yield' outside of a generator.");
    pub const AWAIT_OUTSIDE_ASYNC: DiagnosticMessage = diag!(2011, Type, "'await' is only allowed inside an async function.");
    pub const BREAK_OUTSIDE_LOOP: DiagnosticMessage = diag!(2012, Type, "'{0}' outside of a loop.");
    pub const CONTINUE_TARGET_NOT_LOOP_0: DiagnosticMessage = diag!(2013, Type, "'continue' target '{0}' is not a loop.");
    pub const EXPRESSION_NOT_CONSTANT: DiagnosticMessage = diag!(2014, Type, "Expression is not a compile-time constant.");
    pub const VOID_HAS_NO_VALUE: DiagnosticMessage = diag!(2015, Type, "Expression of type 'Void' has no value.");
    pub const NO_FIELD_0_IN_1: DiagnosticMessage = diag!(2016, Type, "'{1}' has no field named '{0}'.");
    pub const FIELD_INITIALIZED_TWICE_0: DiagnosticMessage = diag!(2017, Type, "Field '{0}' is initialized more than once.");
    pub const NOT_ITERABLE_0: DiagnosticMessage = diag!(2018, Type, "Value of type '{0}' is not a generator.");
    pub const ARRAY_LENGTH_0: DiagnosticMessage = diag!(2019, Type, "Array length must be a positive constant, found '{0}'.");
    pub const NULL_COALESCE_NEEDS_POINTER_0: DiagnosticMessage = diag!(2020, Type, "Left side of '??' must be a pointer, found '{0}'.");
    pub const EXPECTED_TYPE_FOUND_VALUE: DiagnosticMessage = diag!(2021, Type, "Expected a type, found a value.");
    pub const EXPECTED_VALUE_FOUND_TYPE_0: DiagnosticMessage = diag!(2022, Type, "Expected a value, found type '{0}'.");
    pub const DIVISION_BY_ZERO: DiagnosticMessage = diag!(2023, Type, "Division by zero in constant expression.");
    pub const ATOMIC_TARGET_0: DiagnosticMessage = diag!(2024, Type, "Atomic target must be a pointer to an integral value, found '{0}'.");
    pub const DELETE_NEEDS_POINTER_0: DiagnosticMessage = diag!(2025, Type, "'delete' needs a pointer, found '{0}'.");
    pub const UNREACHABLE_AFTER_0: DiagnosticMessage = diag!(2026, Type, Warning, "Unreachable statement after '{0}'.");
    pub const GENERATOR_RETURNS_VALUE: DiagnosticMessage = diag!(2027, Type, "A generator cannot return a value.");

    // ========================================================================
    // Conversions (3000-3099)
    // ========================================================================
    pub const CANNOT_IMPLICITLY_CONVERT_0_TO_1: DiagnosticMessage = diag!(3001, Cast, "Cannot implicitly convert '{0}' to '{1}'.");
    pub const CANNOT_CONVERT_0_TO_1: DiagnosticMessage = diag!(3002, Cast, "Cannot convert '{0}' to '{1}'.");
    pub const LANE_COUNT_MISMATCH_0_1: DiagnosticMessage = diag!(3003, Cast, "Packed types '{0}' and '{1}' have different lane counts.");
    pub const EXPLICIT_CONVERSION_EXISTS_0_1: DiagnosticMessage = diag!(3004, Cast, Note, "An explicit conversion from '{0}' to '{1}' exists; use 'as'.");

    // ========================================================================
    // Modules and imports (4000-4099)
    // ========================================================================
    pub const CANNOT_FIND_MODULE_0: DiagnosticMessage = diag!(4001, Import, "Cannot find module '{0}'.");
    pub const MODULE_IMPORTS_ITSELF_0: DiagnosticMessage = diag!(4002, Import, "Module '{0}' cannot import itself.");
    pub const CANNOT_IMPORT_0_FROM_1: DiagnosticMessage = diag!(4003, Import, "'{1}' has no member '{0}' to import.");
    pub const MODULE_IS_NOT_A_VALUE_0: DiagnosticMessage = diag!(4004, Import, "Module '{0}' cannot be used as a value.");

    // ========================================================================
    // Templates (5000-5099)
    // ========================================================================
    pub const NO_DECLARATION_OF_0_ACCEPTS_1_ARGUMENTS: DiagnosticMessage = diag!(5001, Template, "No declaration of '{0}' accepts {1} argument(s).");
    pub const DUPLICATE_ARITY_0: DiagnosticMessage = diag!(5002, Template, "'{0}' is already declared with the same parameter count.");
    pub const MALFORMED_PARAMETERS_0_1: DiagnosticMessage = diag!(5003, Template, "Malformed parameter list for '{0}': {1}.");
    pub const USED_BEFORE_RETURN_TYPE_INFERRED_0: DiagnosticMessage = diag!(5004, Template, "'{0}' is used recursively before its return type could be inferred.");
    pub const NO_PARAMETER_NAMED_0_IN_1: DiagnosticMessage = diag!(5005, Template, "'{1}' has no parameter named '{0}'.");
    pub const ARGUMENT_SPECIFIED_TWICE_0: DiagnosticMessage = diag!(5006, Template, "Argument '{0}' is specified more than once.");
    pub const GENERIC_NEEDS_ARGUMENTS_0: DiagnosticMessage = diag!(5007, Template, "'{0}' needs arguments before it can be used.");
    pub const CONST_PARAMETER_NEEDS_CONSTANT_0: DiagnosticMessage = diag!(5008, Template, "Argument for const parameter '{0}' must be a constant.");
    pub const NAME_0_IS_NOT_GENERIC: DiagnosticMessage = diag!(5009, Template, "'{0}' cannot be instantiated.");

    // ========================================================================
    // Captures (6000-6099)
    // ========================================================================
    pub const CANNOT_CAPTURE_0_ACROSS_1: DiagnosticMessage = diag!(6001, Capture, "Cannot capture '{0}' across function '{1}'; only lambdas and generators capture.");

    // ========================================================================
    // Limits (7000-7099)
    // ========================================================================
    pub const NESTING_TOO_DEEP_0: DiagnosticMessage = diag!(7001, Nesting, "Nesting is deeper than {0} levels.");

    // ========================================================================
    // Unsupported and internal (9000-9999)
    // ========================================================================
    pub const STRUCT_CONVERSION_UNIMPLEMENTED_0_1: DiagnosticMessage = diag!(9001, Unimplemented, "Conversion from '{0}' to '{1}' between struct types is not supported.");
    pub const UNIMPLEMENTED_0: DiagnosticMessage = diag!(9002, Unimplemented, "{0} is not supported.");
    pub const INTERNAL_0: DiagnosticMessage = diag!(9900, Internal, "Internal binder error: {0}.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use zinc_core::text::{FileId, SourcePos};

    #[test]
    fn test_format_message() {
        let text = format_message("'{0}' and '{1}'", &["Int8", "Bool"]);
        assert_eq!(text, "'Int8' and 'Bool'");
    }

    #[test]
    fn test_error_counter_survives_cap() {
        let mut diags = DiagnosticCollection::with_max_errors(Some(1));
        let pos = SourcePos::line(FileId(0), 1, 1, 2);
        diags.add(Diagnostic::new(pos, &messages::CANNOT_FIND_NAME_0, &["a"]));
        diags.add(Diagnostic::new(pos, &messages::CANNOT_FIND_NAME_0, &["b"]));
        assert_eq!(diags.error_count(), 2);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_display_includes_kind_and_code() {
        let pos = SourcePos::line(FileId(0), 4, 2, 3);
        let mut d = Diagnostic::new(pos, &messages::DUPLICATE_NAME_0, &["x"]);
        d.file = Some("main.zn".to_string());
        assert_eq!(
            d.to_string(),
            "main.zn:4:2: error[Z1001] DuplicateName: 'x' is already declared in this scope."
        );
    }

    #[test]
    fn test_warnings_do_not_count() {
        let mut diags = DiagnosticCollection::new();
        let pos = SourcePos::synthetic();
        diags.add(Diagnostic::new(pos, &messages::UNREACHABLE_AFTER_0, &["return"]));
        assert!(!diags.has_errors());
        assert_eq!(diags.count_kind(DiagnosticKind::Type), 1);
    }
}
