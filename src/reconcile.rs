//! Withholding reconciliation and numeric consistency checks.
//!
//! Purchases carry their withholding lines; this stage buckets the IVA ones
//! into the four regulator-fixed percentage brackets, turns the income-tax
//! ones into `detalleAir` lines, and verifies that declared totals and
//! withholding arithmetic agree with the bases within each tolerance band.
//! The bands differ per record type: 0.50 for purchases, 0.05 for sales and
//! 0.02 for the per-line withholding math.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::{
    AtsError, DocumentRef, ExportRecord, PurchaseRecord, SaleRecord, TaxKind, WithholdingRecord,
};

/// Declared-versus-computed tolerance for purchase totals.
const PURCHASE_TOLERANCE: Decimal = dec!(0.50);
/// Declared-versus-computed tolerance for sale totals.
const SALE_TOLERANCE: Decimal = dec!(0.05);
/// Tolerance for `withheld == base * percentage / 100` on each line.
const WITHHOLDING_TOLERANCE: Decimal = dec!(0.02);

/// Withheld-IVA totals bucketed by the four bracket percentages.
///
/// Lines at any other percentage are excluded from every bucket; see the
/// module notes on `reconcile_purchase`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IvaBrackets {
    /// `valRetBien10`: 10% withholdings on goods.
    pub goods_10: Decimal,
    /// `valRetServ20`: 20% withholdings on services.
    pub services_20: Decimal,
    /// `valRetServ50`: 50% withholdings on services.
    pub services_50: Decimal,
    /// `valRetServ100`: 100% withholdings.
    pub services_100: Decimal,
}

/// One `detalleAir` income-tax withholding line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeTaxLine {
    /// `codRetAir`.
    pub code: String,
    /// `baseImpAir`.
    pub base: Decimal,
    /// `porcentajeAir`.
    pub percentage: Decimal,
    /// `valRetAir`.
    pub withheld: Decimal,
}

/// Identifiers of the withholding receipt attached to a purchase entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithholdingDocRef {
    pub document: DocumentRef,
    /// `fechaEmiRet1`.
    pub emission_date: NaiveDate,
}

/// A purchase with its withholdings reconciled, ready for mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciledPurchase {
    pub purchase: PurchaseRecord,
    pub brackets: IvaBrackets,
    pub income_lines: Vec<IncomeTaxLine>,
    /// Receipt identifiers of the first income-tax withholding, when any
    /// income-tax line exists.
    pub withholding_doc: Option<WithholdingDocRef>,
}

/// Reconcile one purchase against its withholdings.
///
/// Fails when the declared total strays more than 0.50 from bases + IVA +
/// ICE, or when any withholding line's amount disagrees with its own
/// base-times-percentage by more than 0.02. IVA lines at percentages other
/// than 10, 20, 50 and 100 never reach a bracket; each one is logged and its
/// amount drops out of the declaration.
pub fn reconcile_purchase(purchase: &PurchaseRecord) -> Result<ReconciledPurchase, AtsError> {
    let computed = purchase.bases.total() + purchase.iva + purchase.ice;
    let difference = (purchase.declared_total - computed).abs();
    if difference > PURCHASE_TOLERANCE {
        return Err(AtsError::Reconciliation {
            document: purchase.document.label(),
            difference,
        });
    }

    let mut brackets = IvaBrackets::default();
    let mut income_lines = Vec::new();
    let mut withholding_doc = None;

    for line in &purchase.withholdings {
        check_withholding_math(&purchase.document, line)?;
        match line.kind {
            TaxKind::Iva => {
                if line.percentage == dec!(10) {
                    brackets.goods_10 += line.withheld;
                } else if line.percentage == dec!(20) {
                    brackets.services_20 += line.withheld;
                } else if line.percentage == dec!(50) {
                    brackets.services_50 += line.withheld;
                } else if line.percentage == dec!(100) {
                    brackets.services_100 += line.withheld;
                } else {
                    warn!(
                        document = %purchase.document.label(),
                        percentage = %line.percentage,
                        withheld = %line.withheld,
                        "IVA withholding at non-bracket percentage excluded from totals"
                    );
                }
            }
            TaxKind::Income => {
                if withholding_doc.is_none() {
                    withholding_doc = Some(WithholdingDocRef {
                        document: line.document.clone(),
                        emission_date: line.emission_date,
                    });
                }
                income_lines.push(IncomeTaxLine {
                    code: line.code.clone(),
                    base: line.base,
                    percentage: line.percentage,
                    withheld: line.withheld,
                });
            }
        }
    }

    Ok(ReconciledPurchase {
        purchase: purchase.clone(),
        brackets,
        income_lines,
        withholding_doc,
    })
}

/// Reconcile every declarable purchase of the period.
pub fn reconcile_purchases(
    purchases: &[PurchaseRecord],
) -> Result<Vec<ReconciledPurchase>, AtsError> {
    purchases
        .iter()
        .filter(|p| p.state.is_declarable())
        .map(reconcile_purchase)
        .collect()
}

/// Verify a sale's declared total against its bases, IVA and ICE.
pub fn check_sale(sale: &SaleRecord) -> Result<(), AtsError> {
    let computed = sale.bases.total() + sale.iva + sale.ice;
    let difference = (sale.total_sale - computed).abs();
    if difference > SALE_TOLERANCE {
        return Err(AtsError::Reconciliation {
            document: format!("venta {}", sale.id),
            difference,
        });
    }
    Ok(())
}

/// Verify an export's FOB offset never exceeds its FOB value.
pub fn check_export(export: &ExportRecord) -> Result<(), AtsError> {
    if export.fob_offset > export.fob_value {
        return Err(AtsError::Validation(format!(
            "export {}: FOB offset {} exceeds FOB value {}",
            export.document.label(),
            export.fob_offset,
            export.fob_value
        )));
    }
    Ok(())
}

fn check_withholding_math(
    purchase_doc: &DocumentRef,
    line: &WithholdingRecord,
) -> Result<(), AtsError> {
    let expected = line.base * line.percentage / dec!(100);
    let difference = (line.withheld - expected).abs();
    if difference > WITHHOLDING_TOLERANCE {
        return Err(AtsError::Reconciliation {
            document: purchase_doc.label(),
            difference,
        });
    }
    Ok(())
}
