//! Core domain model: fiscal periods, source-record types, SRI catalogs
//! and the crate-wide error type.

pub mod catalog;
pub mod error;
pub mod period;
pub mod types;

pub use error::AtsError;
pub use period::FiscalPeriod;
pub use types::{
    DocumentRef, EmissionChannel, ExportRecord, PurchaseRecord, RecordState, SaleRecord,
    TaxBases, TaxKind, TaxpayerProfile, VoidedDocumentStub, WithholdingRecord,
};
