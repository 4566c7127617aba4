//! Schema validation of the rendered declaration.
//!
//! Validation is soft-fail: findings annotate the generation result and
//! never abort a run. The validator is picked once at startup, XSD-driven
//! when the regulator's schema file is configured and readable, otherwise
//! the built-in structural checks.

pub mod structural;
pub mod xsd;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use structural::StructuralValidator;
pub use xsd::XsdValidator;

/// Category of one validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindingKind {
    /// The document is not well-formed XML.
    Malformed,
    /// A mandatory element is absent.
    MissingElement,
    /// A value does not match its expected textual shape.
    Format,
    /// A value is outside its permitted range.
    Range,
    /// An element the schema does not declare.
    UnknownElement,
    /// Reporting notes, e.g. the omitted-errors marker.
    Report,
}

/// One categorized finding with the element path it refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFinding {
    pub kind: FindingKind,
    /// Element path, e.g. `iva/compras/detalleCompras[3]/codSustento`.
    pub location: String,
    pub message: String,
}

impl ValidationFinding {
    pub fn new(kind: FindingKind, location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            location: location.into(),
            message: message.into(),
        }
    }
}

/// Outcome of validating one rendered declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// False as soon as any error was found, including omitted ones.
    pub valid: bool,
    /// At most [`ValidationReport::MAX_REPORTED_ERRORS`] entries.
    pub errors: Vec<ValidationFinding>,
    pub warnings: Vec<ValidationFinding>,
}

impl ValidationReport {
    /// Errors beyond this count are dropped and summarized in a warning.
    pub const MAX_REPORTED_ERRORS: usize = 20;

    /// Build a report, applying the error cap.
    pub fn from_findings(
        mut errors: Vec<ValidationFinding>,
        mut warnings: Vec<ValidationFinding>,
    ) -> Self {
        let valid = errors.is_empty();
        if errors.len() > Self::MAX_REPORTED_ERRORS {
            let omitted = errors.len() - Self::MAX_REPORTED_ERRORS;
            errors.truncate(Self::MAX_REPORTED_ERRORS);
            warnings.push(ValidationFinding::new(
                FindingKind::Report,
                "",
                format!("{omitted} additional error(s) omitted"),
            ));
        }
        Self {
            valid,
            errors,
            warnings,
        }
    }

    /// A clean report.
    pub fn passing() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Validation capability injected into the generator.
pub trait SchemaValidator: Send + Sync {
    /// Human-readable name for logs and diagnostics.
    fn name(&self) -> &'static str;

    fn validate(&self, xml: &str) -> ValidationReport;
}

/// Pick the validator implementation for this process.
///
/// A configured, loadable XSD yields the schema-driven validator; anything
/// else falls back to the structural checks. Either way the choice is
/// logged once.
pub fn select_validator(xsd_path: Option<&Path>) -> Arc<dyn SchemaValidator> {
    match xsd_path {
        Some(path) => match XsdValidator::from_file(path) {
            Ok(validator) => {
                info!(path = %path.display(), "schema validation uses the regulator XSD");
                Arc::new(validator)
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "XSD unavailable, falling back to structural validation"
                );
                Arc::new(StructuralValidator::new())
            }
        },
        None => Arc::new(StructuralValidator::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(n: usize) -> ValidationFinding {
        ValidationFinding::new(FindingKind::MissingElement, format!("iva/x{n}"), "missing")
    }

    #[test]
    fn cap_keeps_twenty_and_warns_about_the_rest() {
        let errors: Vec<_> = (0..25).map(finding).collect();
        let report = ValidationReport::from_findings(errors, Vec::new());
        assert!(!report.valid);
        assert_eq!(report.errors.len(), ValidationReport::MAX_REPORTED_ERRORS);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, FindingKind::Report);
        assert!(report.warnings[0].message.contains("5 additional"));
    }

    #[test]
    fn under_cap_reports_stay_intact() {
        let report = ValidationReport::from_findings(vec![finding(1)], Vec::new());
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn no_errors_means_valid() {
        let report = ValidationReport::from_findings(Vec::new(), Vec::new());
        assert!(report.valid);
    }

    #[test]
    fn missing_xsd_selects_the_structural_fallback() {
        let validator = select_validator(Some(Path::new("/no/such/schema.xsd")));
        assert_eq!(validator.name(), "structural");
        let validator = select_validator(None);
        assert_eq!(validator.name(), "structural");
    }
}
