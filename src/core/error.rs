use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while producing an ATS declaration.
///
/// Schema-validation findings are *not* errors; they ride along on a
/// successful [`GenerationResult`](crate::generate::GenerationResult) as
/// structured data. Everything here aborts the current run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AtsError {
    /// Requested period does not match `MM/YYYY`.
    #[error("invalid fiscal period '{0}': expected MM/YYYY")]
    InvalidPeriod(String),

    /// The tenant (company) is unknown to the data gateway.
    #[error("tenant '{0}' not found")]
    TenantNotFound(String),

    /// A source record violates an input rule (e.g. FOB offset above FOB).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Declared totals drift from computed totals beyond the tolerance band.
    #[error("reconciliation failed for document {document}: difference {difference}")]
    Reconciliation {
        /// Establishment-point-sequential identifier of the offending record.
        document: String,
        /// Absolute difference between declared and computed totals.
        difference: Decimal,
    },

    /// XML rendering or parsing error.
    #[error("XML error: {0}")]
    Xml(String),

    /// Building the compressed archive failed.
    #[error("archive error: {0}")]
    Archive(String),

    /// Writing the XML or archive artifact failed. Retriable as a whole.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A period-data query against an external collaborator failed.
    #[error("gateway error: {0}")]
    Gateway(String),
}

impl AtsError {
    /// HTTP-appropriate status code for this failure.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidPeriod(_) => 400,
            Self::TenantNotFound(_) => 404,
            Self::Validation(_) | Self::Reconciliation { .. } => 422,
            Self::Xml(_) | Self::Archive(_) | Self::Io(_) | Self::Gateway(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn status_codes() {
        assert_eq!(AtsError::InvalidPeriod("13/2024".into()).status_code(), 400);
        assert_eq!(AtsError::TenantNotFound("t1".into()).status_code(), 404);
        assert_eq!(AtsError::Validation("fob".into()).status_code(), 422);
        assert_eq!(
            AtsError::Reconciliation {
                document: "001-001-5".into(),
                difference: dec!(5.00),
            }
            .status_code(),
            422
        );
        assert_eq!(AtsError::Xml("bad".into()).status_code(), 500);
    }

    #[test]
    fn reconciliation_message_names_document_and_difference() {
        let err = AtsError::Reconciliation {
            document: "001-001-38".into(),
            difference: dec!(5.00),
        };
        let msg = err.to_string();
        assert!(msg.contains("001-001-38"));
        assert!(msg.contains("5.00"));
    }
}
