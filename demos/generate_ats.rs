//! Generate a complete ATS declaration for a synthetic June 2024 period.
//!
//! Run with: `cargo run --example generate_ats`

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use anexo::core::*;
use anexo::gateway::{InMemoryGateway, InMemoryHistory, PeriodData};
use anexo::generate::{AtsGenerator, GeneratorConfig};

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

/// One purchase with an IVA withholding at 100% and a 1.75% income line.
fn purchase() -> PurchaseRecord {
    let receipt = DocumentRef::new("1", "1", "201", "9876543210");
    PurchaseRecord {
        id: "p-1".into(),
        sustento: "01".into(),
        supplier_id_type: "01".into(),
        supplier_id: "0992233445001".into(),
        supplier_name: "DISTRIBUIDORA EL ROCIO S.A.".into(),
        document_type: "01".into(),
        document: DocumentRef::new("2", "1", "000000123", "1234567890"),
        registration_date: date(5),
        emission_date: date(3),
        bases: TaxBases {
            zero_rated: dec!(0),
            iva_rated: dec!(850),
            non_object: dec!(0),
            exempt: dec!(0),
        },
        iva: dec!(127.50),
        ice: dec!(0),
        declared_total: dec!(977.50),
        payment_methods: vec!["01".into()],
        related_party: false,
        withholdings: vec![
            WithholdingRecord {
                id: "w-1".into(),
                kind: TaxKind::Iva,
                code: "2".into(),
                percentage: dec!(100),
                base: dec!(127.50),
                withheld: dec!(127.50),
                document: receipt.clone(),
                emission_date: date(10),
                purchase_id: Some("p-1".into()),
            },
            WithholdingRecord {
                id: "w-2".into(),
                kind: TaxKind::Income,
                code: "312".into(),
                percentage: dec!(1.75),
                base: dec!(850),
                withheld: dec!(14.875),
                document: receipt,
                emission_date: date(10),
                purchase_id: Some("p-1".into()),
            },
        ],
        state: RecordState::Validated,
    }
}

fn sale(id: &str, customer: &str, establishment: &str, base: rust_decimal::Decimal) -> SaleRecord {
    let iva = base * dec!(0.15);
    SaleRecord {
        id: id.into(),
        customer_id_type: "04".into(),
        customer_id: customer.into(),
        customer_name: "CLIENTE".into(),
        document_type: "01".into(),
        establishment: establishment.into(),
        channel: EmissionChannel::Physical,
        emission_date: date(15),
        bases: TaxBases {
            zero_rated: dec!(0),
            iva_rated: base,
            non_object: dec!(0),
            exempt: dec!(0),
        },
        iva,
        ice: dec!(0),
        withheld_iva: dec!(0),
        withheld_income: dec!(0),
        total_sale: base + iva,
        payment_methods: vec!["01".into()],
        related_party: false,
        state: RecordState::Validated,
    }
}

fn voided(seq: &str) -> VoidedDocumentStub {
    VoidedDocumentStub {
        document_type: "01".into(),
        document: DocumentRef::new("1", "1", seq, "555"),
    }
}

fn demo_period() -> PeriodData {
    let purchase = purchase();
    let withholdings = purchase.withholdings.clone();
    PeriodData {
        purchases: vec![purchase],
        sales: vec![
            sale("s-1", "0998877665001", "1", dec!(300)),
            sale("s-2", "0998877665001", "1", dec!(120)),
            sale("s-3", "1712345678", "2", dec!(80)),
        ],
        exports: vec![],
        withholdings,
        voided: vec![voided("41"), voided("42"), voided("43"), voided("50")],
    }
}

#[tokio::main]
async fn main() -> Result<(), AtsError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "anexo=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let gateway = InMemoryGateway::new()
        .with_taxpayer(
            "acme",
            TaxpayerProfile {
                ruc: "1790012345001".into(),
                legal_name: "ACME CIA. LTDA.".into(),
            },
        )
        .with_period_data("acme", FiscalPeriod::new(6, 2024)?, demo_period());

    let generator = AtsGenerator::new(
        Arc::new(gateway),
        Arc::new(InMemoryHistory::new()),
        GeneratorConfig::new(std::env::temp_dir().join("anexo-demo")),
    );

    let summary = generator.preview("acme", "06/2024").await?;
    println!("=== Period preview ===");
    println!("  purchases:      {}", summary.purchases);
    println!("  sale groups:    {}", summary.sale_groups);
    println!("  establishments: {}", summary.establishments);
    println!("  voided ranges:  {}", summary.voided_ranges);
    println!("  total sales:    {}", summary.total_sales);
    println!("  total purchases: {}", summary.total_purchases);

    let result = generator.generate("acme", "06/2024", "demo@acme.ec").await?;
    println!("\n=== Artifacts ===");
    println!("  XML: {}", result.xml_path.display());
    println!("  ZIP: {} ({} bytes)", result.zip_path.display(), result.archive.len());

    println!("\n=== Schema validation ===");
    if result.validation.valid {
        println!("  declaration is valid");
    }
    for finding in &result.validation.errors {
        println!("  error   {}: {}", finding.location, finding.message);
    }
    for finding in &result.validation.warnings {
        println!("  warning {}: {}", finding.location, finding.message);
    }

    println!("\n=== Declaration ===");
    println!("{}", result.xml);

    Ok(())
}
