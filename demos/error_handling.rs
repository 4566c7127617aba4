//! Walk through the error cases a caller has to handle.
//!
//! Run with: `cargo run --example error_handling`

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use anexo::core::*;
use anexo::gateway::{InMemoryGateway, InMemoryHistory, PeriodData};
use anexo::generate::{AtsGenerator, GeneratorConfig};

/// A purchase whose declared total drifts 5.00 above its bases.
fn drifting_purchase() -> PurchaseRecord {
    PurchaseRecord {
        id: "p-drift".into(),
        sustento: "01".into(),
        supplier_id_type: "01".into(),
        supplier_id: "0992233445001".into(),
        supplier_name: "PROVEEDOR SA".into(),
        document_type: "01".into(),
        document: DocumentRef::new("1", "1", "000000038", "1104857301"),
        registration_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        emission_date: NaiveDate::from_ymd_opt(2024, 6, 12).unwrap(),
        bases: TaxBases {
            iva_rated: dec!(100),
            ..TaxBases::default()
        },
        iva: dec!(15),
        ice: dec!(0),
        declared_total: dec!(120),
        payment_methods: vec!["01".into()],
        related_party: false,
        withholdings: vec![],
        state: RecordState::Validated,
    }
}

fn generator_for(data: PeriodData) -> AtsGenerator {
    let gateway = InMemoryGateway::new()
        .with_taxpayer(
            "acme",
            TaxpayerProfile {
                ruc: "1790012345001".into(),
                legal_name: "ACME CIA LTDA".into(),
            },
        )
        .with_period_data("acme", FiscalPeriod::new(6, 2024).unwrap(), data);
    AtsGenerator::new(
        Arc::new(gateway),
        Arc::new(InMemoryHistory::new()),
        GeneratorConfig::new(std::env::temp_dir().join("anexo-errors")),
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // ── 1. Malformed period string ────────────────────────────────────
    println!("=== Malformed Period ===");
    let generator = generator_for(PeriodData::default());
    match generator.generate("acme", "2024-06", "demo").await {
        Ok(_) => println!("  generated (unexpected)"),
        Err(e) => println!("  [{}] {}", e.status_code(), e),
    }

    // ── 2. Unknown tenant ─────────────────────────────────────────────
    println!("\n=== Unknown Tenant ===");
    match generator.generate("nadie", "06/2024", "demo").await {
        Ok(_) => println!("  generated (unexpected)"),
        Err(e) => println!("  [{}] {}", e.status_code(), e),
    }

    // ── 3. Reconciliation drift ───────────────────────────────────────
    println!("\n=== Reconciliation Failure ===");
    let generator = generator_for(PeriodData {
        purchases: vec![drifting_purchase()],
        ..PeriodData::default()
    });
    match generator.generate("acme", "06/2024", "demo").await {
        Ok(_) => println!("  generated (unexpected)"),
        Err(AtsError::Reconciliation {
            document,
            difference,
        }) => {
            println!("  document {document} is off by {difference}");
        }
        Err(e) => println!("  [{}] {}", e.status_code(), e),
    }

    // ── 4. FOB offset above the FOB value ─────────────────────────────
    println!("\n=== Export Validation ===");
    let export = ExportRecord {
        id: "e-1".into(),
        buyer_id_type: "01".into(),
        buyer_id: "US-IMPORT-9".into(),
        buyer_name: "IMPORTER LLC".into(),
        destination_country: "840".into(),
        document_type: "01".into(),
        document: DocumentRef::new("1", "1", "000000002", "1234567890"),
        channel: EmissionChannel::Physical,
        emission_date: NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
        fob_value: dec!(100),
        fob_offset: dec!(150),
        state: RecordState::Validated,
    };
    let generator = generator_for(PeriodData {
        exports: vec![export],
        ..PeriodData::default()
    });
    match generator.generate("acme", "06/2024", "demo").await {
        Ok(_) => println!("  generated (unexpected)"),
        Err(e) => println!("  [{}] {}", e.status_code(), e),
    }
}
