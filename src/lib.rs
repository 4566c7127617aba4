//! # anexo
//!
//! Generation engine for Ecuador's ATS (Anexo Transaccional Simplificado)
//! tax declaration: selects a tenant's validated transactions for a fiscal
//! period, aggregates them under SRI grouping rules, reconciles withholding
//! totals, renders the normative XML, validates it against the published
//! schema and packages it for delivery.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//! Storage access goes through the [`gateway`] traits, so the engine plugs
//! into any persistence layer.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use anexo::core::TaxpayerProfile;
//! use anexo::gateway::{InMemoryGateway, InMemoryHistory};
//! use anexo::generate::{AtsGenerator, GeneratorConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let gateway = InMemoryGateway::new().with_taxpayer(
//!     "acme",
//!     TaxpayerProfile {
//!         ruc: "1790012345001".to_string(),
//!         legal_name: "ACME CIA LTDA".to_string(),
//!     },
//! );
//!
//! let generator = AtsGenerator::new(
//!     Arc::new(gateway),
//!     Arc::new(InMemoryHistory::new()),
//!     GeneratorConfig::new(std::env::temp_dir().join("anexo-quickstart")),
//! );
//!
//! let result = generator.generate("acme", "06/2024", "demo").await.unwrap();
//! assert!(result.xml.starts_with("<?xml"));
//! assert!(result.validation.valid);
//! # }
//! ```

pub mod aggregate;
pub mod core;
pub mod document;
pub mod gateway;
pub mod generate;
pub mod reconcile;
pub mod schema;
pub mod xml;

// Re-export the domain types and the generator entry points at crate root.
pub use crate::core::*;
pub use crate::generate::{AtsGenerator, GenerationResult, GeneratorConfig, PeriodSummary};
