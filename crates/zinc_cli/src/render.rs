//! Diagnostic rendering through miette.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, Report, Severity};
use zinc_diagnostics::{Diagnostic, DiagnosticCategory};

/// A binder diagnostic in the shape miette renders.
#[derive(Debug)]
pub struct Rendered {
    location: String,
    message: String,
    code: String,
    severity: Severity,
    related: Vec<Rendered>,
}

impl Rendered {
    pub fn new(diagnostic: &Diagnostic, files: &[String]) -> Self {
        let file = diagnostic
            .file
            .clone()
            .or_else(|| files.get(diagnostic.pos.file.0 as usize).cloned())
            .unwrap_or_else(|| "<unknown>".to_string());
        Self {
            location: format!("{}:{}", file, diagnostic.pos),
            message: diagnostic.message_text.clone(),
            code: format!("zinc::{}::Z{:04}", diagnostic.kind, diagnostic.code),
            severity: match diagnostic.category {
                DiagnosticCategory::Error => Severity::Error,
                DiagnosticCategory::Warning => Severity::Warning,
                DiagnosticCategory::Note => Severity::Advice,
            },
            related: diagnostic
                .related_information
                .iter()
                .map(|related| Rendered::new(related, files))
                .collect(),
        }
    }
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

impl std::error::Error for Rendered {}

impl MietteDiagnostic for Rendered {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.code))
    }

    fn severity(&self) -> Option<Severity> {
        Some(self.severity)
    }

    fn related<'a>(&'a self) -> Option<Box<dyn Iterator<Item = &'a dyn MietteDiagnostic> + 'a>> {
        if self.related.is_empty() {
            return None;
        }
        Some(Box::new(
            self.related.iter().map(|related| related as &dyn MietteDiagnostic),
        ))
    }
}

/// Print every diagnostic to stderr.
pub fn emit(diagnostics: &[Diagnostic], files: &[String]) {
    for diagnostic in diagnostics {
        eprintln!("{:?}", Report::new(Rendered::new(diagnostic, files)));
    }
}
