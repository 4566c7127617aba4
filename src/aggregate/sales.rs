//! Sales aggregation: per-customer groups, per-establishment totals and the
//! period totals the declaration header carries.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{EmissionChannel, ExportRecord, SaleRecord, TaxBases};

/// One `detalleVentas` entry: every sale of the period to the same customer
/// with the same document type, folded together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleGroup {
    /// `tpIdCliente`, taken from the group's first sale.
    pub customer_id_type: String,
    /// `idCliente`: half of the grouping key.
    pub customer_id: String,
    /// `tipoComprobante`: the other half of the grouping key.
    pub document_type: String,
    /// `tipoEmision`, taken from the group's first sale.
    pub channel: EmissionChannel,
    /// `numeroComprobantes`.
    pub document_count: u32,
    pub bases: TaxBases,
    /// `montoIva`.
    pub iva: Decimal,
    /// `montoIce`.
    pub ice: Decimal,
    /// `valorRetIva`.
    pub withheld_iva: Decimal,
    /// `valorRetRenta`.
    pub withheld_income: Decimal,
    /// Summed grand totals; feeds the aggregation scenario checks only.
    pub total: Decimal,
    /// `formaPago` list, taken from the group's first sale.
    pub payment_methods: Vec<String>,
    /// `parteRelVtas`, taken from the group's first sale.
    pub related_party: bool,
}

impl SaleGroup {
    fn open(sale: &SaleRecord) -> Self {
        Self {
            customer_id_type: sale.customer_id_type.clone(),
            customer_id: sale.customer_id.clone(),
            document_type: sale.document_type.clone(),
            channel: sale.channel,
            document_count: 0,
            bases: TaxBases::default(),
            iva: Decimal::ZERO,
            ice: Decimal::ZERO,
            withheld_iva: Decimal::ZERO,
            withheld_income: Decimal::ZERO,
            total: Decimal::ZERO,
            payment_methods: sale.payment_methods.clone(),
            related_party: sale.related_party,
        }
    }

    fn absorb(&mut self, sale: &SaleRecord) {
        self.document_count += 1;
        self.bases.zero_rated += sale.bases.zero_rated;
        self.bases.iva_rated += sale.bases.iva_rated;
        self.bases.non_object += sale.bases.non_object;
        self.bases.exempt += sale.bases.exempt;
        self.iva += sale.iva;
        self.ice += sale.ice;
        self.withheld_iva += sale.withheld_iva;
        self.withheld_income += sale.withheld_income;
        self.total += sale.total_sale;
    }
}

/// Fold the period's sales into per-(customer, document-type) groups.
///
/// The first sale seen for each key fixes the group's payment methods,
/// emission channel, identification type and related-party flag; later sales
/// with the same key only add to the running sums. Groups come out sorted by
/// key regardless of input order.
pub fn group_sales(sales: &[SaleRecord]) -> Vec<SaleGroup> {
    let mut groups: BTreeMap<(String, String), SaleGroup> = BTreeMap::new();
    for sale in sales.iter().filter(|s| s.state.is_declarable()) {
        let key = (sale.customer_id.clone(), sale.document_type.clone());
        groups
            .entry(key)
            .or_insert_with(|| SaleGroup::open(sale))
            .absorb(sale);
    }
    groups.into_values().collect()
}

/// One `ventaEst` entry of the `ventasEstablecimiento` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstablishmentSales {
    /// `codEstab`, 3 digits.
    pub establishment: String,
    /// `ventasEstab`.
    pub total: Decimal,
}

/// Per-establishment sales totals.
///
/// Every declarable sale contributes its establishment code to the set, but
/// only sales emitted physically contribute their total; an establishment
/// with exclusively electronic sales is listed with 0.00. The SRI mandates
/// exactly this pairing.
pub fn sales_by_establishment(sales: &[SaleRecord]) -> Vec<EstablishmentSales> {
    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for sale in sales.iter().filter(|s| s.state.is_declarable()) {
        let entry = totals.entry(sale.establishment.clone()).or_default();
        if sale.channel == EmissionChannel::Physical {
            *entry += sale.total_sale;
        }
    }
    totals
        .into_iter()
        .map(|(establishment, total)| EstablishmentSales {
            establishment,
            total,
        })
        .collect()
}

/// Distinct establishment codes across all declarable sales.
pub fn establishment_count(sales: &[SaleRecord]) -> usize {
    sales
        .iter()
        .filter(|s| s.state.is_declarable())
        .map(|s| s.establishment.as_str())
        .collect::<std::collections::BTreeSet<_>>()
        .len()
}

/// `totalVentas`: physically emitted sale totals plus physically emitted
/// export FOB values. Electronic documents are excluded on both sides.
pub fn period_total_sales(sales: &[SaleRecord], exports: &[ExportRecord]) -> Decimal {
    let sold: Decimal = sales
        .iter()
        .filter(|s| s.state.is_declarable() && s.channel == EmissionChannel::Physical)
        .map(|s| s.total_sale)
        .sum();
    let exported: Decimal = exports
        .iter()
        .filter(|e| e.state.is_declarable() && e.channel == EmissionChannel::Physical)
        .map(|e| e.fob_value)
        .sum();
    sold + exported
}
