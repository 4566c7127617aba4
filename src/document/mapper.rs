//! Stateless mapping from aggregated and reconciled records onto the typed
//! declaration tree. All schema formatting happens here; the renderer never
//! touches a raw value.

use rust_decimal::Decimal;

use crate::aggregate::{EstablishmentSales, SaleGroup, VoidedRange};
use crate::core::{ExportRecord, FiscalPeriod, TaxpayerProfile};
use crate::document::format;
use crate::document::{
    AirEntry, AtsDocument, EstablishmentEntry, ExportEntry, ForeignPayment, PurchaseEntry,
    SaleEntry, TaxpayerHeader, VoidedEntry, WithholdingReceipt,
};
use crate::reconcile::ReconciledPurchase;

/// Document-type code as the sales and exports sections expect it.
///
/// Stored invoices carry "01"; the annex reserves "18" for invoices declared
/// as sales, so only those two sections remap. Purchases and voided entries
/// keep the stored code.
pub fn sales_document_type(code: &str) -> String {
    if code == "01" { "18".to_string() } else { code.to_string() }
}

/// Build the `<iva>` header from master data and the period aggregates.
pub fn map_header(
    profile: &TaxpayerProfile,
    period: FiscalPeriod,
    establishment_count: usize,
    total_sales: Decimal,
) -> TaxpayerHeader {
    TaxpayerHeader {
        id_type: format::informant_id_type(&profile.ruc).to_string(),
        tax_id: profile.ruc.clone(),
        legal_name: format::clean_legal_name(&profile.legal_name),
        year: period.year_str(),
        month: period.month_str(),
        establishment_count: format::establishment_count(establishment_count),
        total_sales: format::money(total_sales),
        operative_code: "IVA".to_string(),
    }
}

/// Map one reconciled purchase to its `detalleCompras` entry.
pub fn map_purchase(reconciled: &ReconciledPurchase) -> PurchaseEntry {
    let purchase = &reconciled.purchase;
    let brackets = &reconciled.brackets;
    PurchaseEntry {
        sustento_code: purchase.sustento.clone(),
        supplier_id_type: purchase.supplier_id_type.clone(),
        supplier_id: purchase.supplier_id.clone(),
        document_type: purchase.document_type.clone(),
        related_party: format::related_party(purchase.related_party).to_string(),
        registration_date: format::date(purchase.registration_date),
        establishment: format::pad3(&purchase.document.establishment),
        point_of_emission: format::pad3(&purchase.document.point_of_emission),
        sequential: format::unpad_sequential(&purchase.document.sequential),
        emission_date: format::date(purchase.emission_date),
        authorization: format::authorization(&purchase.document.authorization),
        non_object_base: format::money(purchase.bases.non_object),
        zero_rated_base: format::money(purchase.bases.zero_rated),
        iva_rated_base: format::money(purchase.bases.iva_rated),
        exempt_base: format::money(purchase.bases.exempt),
        ice: format::money(purchase.ice),
        iva: format::money(purchase.iva),
        withheld_goods_10: format::money(brackets.goods_10),
        withheld_services_20: format::money(brackets.services_20),
        withheld_goods: format::money(Decimal::ZERO),
        withheld_services: format::money(Decimal::ZERO),
        withheld_services_50: format::money(brackets.services_50),
        withheld_services_100: format::money(brackets.services_100),
        foreign_payment: ForeignPayment::default(),
        payment_methods: purchase.payment_methods.clone(),
        income_lines: reconciled
            .income_lines
            .iter()
            .map(|line| AirEntry {
                code: line.code.clone(),
                base: format::money(line.base),
                percentage: format::money(line.percentage),
                withheld: format::money(line.withheld),
            })
            .collect(),
        withholding_receipt: reconciled.withholding_doc.as_ref().map(|doc| {
            WithholdingReceipt {
                establishment: format::pad3(&doc.document.establishment),
                point_of_emission: format::pad3(&doc.document.point_of_emission),
                sequential: format::unpad_sequential(&doc.document.sequential),
                authorization: format::authorization(&doc.document.authorization),
                emission_date: format::date(doc.emission_date),
            }
        }),
    }
}

/// Map one aggregated sale group to its `detalleVentas` entry.
pub fn map_sale_group(group: &SaleGroup) -> SaleEntry {
    SaleEntry {
        customer_id_type: group.customer_id_type.clone(),
        customer_id: group.customer_id.clone(),
        related_party: format::related_party(group.related_party).to_string(),
        document_type: sales_document_type(&group.document_type),
        emission_type: group.channel.code().to_string(),
        document_count: group.document_count.to_string(),
        non_object_base: format::money(group.bases.non_object),
        zero_rated_base: format::money(group.bases.zero_rated),
        iva_rated_base: format::money(group.bases.iva_rated),
        iva: format::money(group.iva),
        ice: format::money(group.ice),
        withheld_iva: format::money(group.withheld_iva),
        withheld_income: format::money(group.withheld_income),
        payment_methods: group.payment_methods.clone(),
    }
}

/// Map one establishment total to its `ventaEst` entry.
pub fn map_establishment(sales: &EstablishmentSales) -> EstablishmentEntry {
    EstablishmentEntry {
        establishment: format::pad3(&sales.establishment),
        total: format::money(sales.total),
    }
}

/// Map one export record to its `detalleExportaciones` entry.
pub fn map_export(export: &ExportRecord) -> ExportEntry {
    ExportEntry {
        buyer_id_type: export.buyer_id_type.clone(),
        buyer_id: export.buyer_id.clone(),
        document_type: sales_document_type(&export.document_type),
        emission_type: export.channel.code().to_string(),
        establishment: format::pad3(&export.document.establishment),
        point_of_emission: format::pad3(&export.document.point_of_emission),
        sequential: format::unpad_sequential(&export.document.sequential),
        authorization: format::authorization(&export.document.authorization),
        emission_date: format::date(export.emission_date),
        destination_country: export.destination_country.clone(),
        fob_value: format::money(export.fob_value),
        fob_offset: format::money(export.fob_offset),
    }
}

/// Map one compacted range to its `detalleAnulados` entry.
pub fn map_voided(range: &VoidedRange) -> VoidedEntry {
    VoidedEntry {
        document_type: range.document_type.clone(),
        establishment: format::pad3(&range.establishment),
        point_of_emission: format::pad3(&range.point_of_emission),
        sequential_start: range.start.to_string(),
        sequential_end: range.end.to_string(),
        authorization: format::authorization(&range.authorization),
    }
}

/// Assemble the full declaration tree from the period's derived data.
#[allow(clippy::too_many_arguments)]
pub fn map_declaration(
    profile: &TaxpayerProfile,
    period: FiscalPeriod,
    purchases: &[ReconciledPurchase],
    sale_groups: &[SaleGroup],
    establishments: &[EstablishmentSales],
    exports: &[ExportRecord],
    voided: &[VoidedRange],
    establishment_count: usize,
    total_sales: Decimal,
) -> AtsDocument {
    AtsDocument {
        header: map_header(profile, period, establishment_count, total_sales),
        purchases: purchases.iter().map(map_purchase).collect(),
        sales: sale_groups.iter().map(map_sale_group).collect(),
        sales_by_establishment: establishments.iter().map(map_establishment).collect(),
        exports: exports.iter().map(map_export).collect(),
        voided: voided.iter().map(map_voided).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::VoidedRange;
    use crate::core::{
        DocumentRef, EmissionChannel, PurchaseRecord, RecordState, TaxBases,
    };
    use crate::reconcile::{IvaBrackets, WithholdingDocRef};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn reconciled_purchase() -> ReconciledPurchase {
        ReconciledPurchase {
            purchase: PurchaseRecord {
                id: "p-1".into(),
                sustento: "01".into(),
                supplier_id_type: "01".into(),
                supplier_id: "1790012345001".into(),
                supplier_name: "PROVEEDOR SA".into(),
                document_type: "01".into(),
                document: DocumentRef::new("1", "2", "000000038", "1104857301"),
                registration_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
                emission_date: NaiveDate::from_ymd_opt(2024, 6, 12).unwrap(),
                bases: TaxBases {
                    iva_rated: dec!(100),
                    ..TaxBases::default()
                },
                iva: dec!(15),
                ice: dec!(0),
                declared_total: dec!(115),
                payment_methods: vec!["01".into()],
                related_party: false,
                withholdings: Vec::new(),
                state: RecordState::Validated,
            },
            brackets: IvaBrackets {
                goods_10: dec!(1.50),
                ..IvaBrackets::default()
            },
            income_lines: vec![crate::reconcile::IncomeTaxLine {
                code: "303".into(),
                base: dec!(100),
                percentage: dec!(10),
                withheld: dec!(10),
            }],
            withholding_doc: Some(WithholdingDocRef {
                document: DocumentRef::new("2", "1", "000000915", "1109999999"),
                emission_date: NaiveDate::from_ymd_opt(2024, 6, 13).unwrap(),
            }),
        }
    }

    #[test]
    fn header_maps_ruc_and_normalized_name() {
        let profile = TaxpayerProfile {
            ruc: "1790012345001".into(),
            legal_name: "  ACME, S.A.  ".into(),
        };
        let period = FiscalPeriod::new(6, 2024).unwrap();
        let header = map_header(&profile, period, 2, dec!(340));
        assert_eq!(header.id_type, "R");
        assert_eq!(header.legal_name, "ACME SA");
        assert_eq!(header.year, "2024");
        assert_eq!(header.month, "06");
        assert_eq!(header.establishment_count, "002");
        assert_eq!(header.total_sales, "340.00");
        assert_eq!(header.operative_code, "IVA");
    }

    #[test]
    fn purchase_entry_pads_codes_and_unpads_sequential() {
        let entry = map_purchase(&reconciled_purchase());
        assert_eq!(entry.establishment, "001");
        assert_eq!(entry.point_of_emission, "002");
        assert_eq!(entry.sequential, "38");
        assert_eq!(entry.document_type, "01");
        assert_eq!(entry.registration_date, "30/06/2024");
        assert_eq!(entry.emission_date, "12/06/2024");
        assert_eq!(entry.withheld_goods_10, "1.50");
        assert_eq!(entry.withheld_goods, "0.00");
        assert_eq!(entry.withheld_services, "0.00");
        assert_eq!(entry.foreign_payment, ForeignPayment::default());
        let receipt = entry.withholding_receipt.unwrap();
        assert_eq!(receipt.establishment, "002");
        assert_eq!(receipt.sequential, "915");
        assert_eq!(receipt.emission_date, "13/06/2024");
    }

    #[test]
    fn sale_entry_remaps_invoice_code() {
        let group = SaleGroup {
            customer_id_type: "04".into(),
            customer_id: "0991234567001".into(),
            document_type: "01".into(),
            channel: EmissionChannel::Physical,
            document_count: 2,
            bases: TaxBases {
                iva_rated: dec!(125),
                ..TaxBases::default()
            },
            iva: dec!(18.75),
            ice: dec!(0),
            withheld_iva: dec!(0),
            withheld_income: dec!(0),
            total: dec!(143.75),
            payment_methods: vec!["01".into()],
            related_party: false,
        };
        let entry = map_sale_group(&group);
        assert_eq!(entry.document_type, "18");
        assert_eq!(entry.document_count, "2");
        assert_eq!(entry.emission_type, "F");
        assert_eq!(entry.iva_rated_base, "125.00");
    }

    #[test]
    fn credit_notes_keep_their_code_in_sales() {
        assert_eq!(sales_document_type("04"), "04");
        assert_eq!(sales_document_type("01"), "18");
    }

    #[test]
    fn voided_entry_renders_plain_range_bounds() {
        let entry = map_voided(&VoidedRange {
            document_type: "01".into(),
            establishment: "1".into(),
            point_of_emission: "1".into(),
            start: 5,
            end: 7,
            authorization: "1104857301".into(),
        });
        assert_eq!(entry.establishment, "001");
        assert_eq!(entry.sequential_start, "5");
        assert_eq!(entry.sequential_end, "7");
    }
}
