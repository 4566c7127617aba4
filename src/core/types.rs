use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a source transaction.
///
/// The engine only reads records; state transitions belong to the CRUD
/// services. Declarations include `Validated` and `IncludedInAts` records;
/// `Voided` records feed the voided-documents section exclusively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordState {
    Draft,
    Validated,
    IncludedInAts,
    Voided,
}

impl RecordState {
    /// True for the states a declaration may aggregate.
    pub fn is_declarable(&self) -> bool {
        matches!(self, Self::Validated | Self::IncludedInAts)
    }
}

/// How a sale or export document was emitted.
///
/// Electronic documents are excluded from the per-establishment totals and
/// from the `totalVentas` header figure (SRI rule), but still contribute
/// their establishment code to the establishment set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmissionChannel {
    Electronic,
    Physical,
}

impl EmissionChannel {
    /// `tipoEmision` code: "E" electronic, "F" physical.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Electronic => "E",
            Self::Physical => "F",
        }
    }

    /// Parse from a `tipoEmision` code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "E" => Some(Self::Electronic),
            "F" => Some(Self::Physical),
            _ => None,
        }
    }
}

/// Which tax a withholding retains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxKind {
    /// Value-added tax withholding (retención de IVA).
    Iva,
    /// Income-tax withholding (retención en la fuente de renta).
    Income,
}

/// The three-part SRI document number plus its authorization.
///
/// `establishment` and `point_of_emission` are stored zero-padded to 3
/// digits, `sequential` zero-padded to 9. The mapper un-pads sequentials on
/// output; storage keeps the fixed widths the source systems use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// `establecimiento`, 3 digits.
    pub establishment: String,
    /// `puntoEmision`, 3 digits.
    pub point_of_emission: String,
    /// `secuencial`, 9 digits.
    pub sequential: String,
    /// `autorizacion`: 10, 37 or 49 digits depending on the emission era.
    pub authorization: String,
}

impl DocumentRef {
    pub fn new(
        establishment: impl Into<String>,
        point_of_emission: impl Into<String>,
        sequential: impl Into<String>,
        authorization: impl Into<String>,
    ) -> Self {
        Self {
            establishment: establishment.into(),
            point_of_emission: point_of_emission.into(),
            sequential: sequential.into(),
            authorization: authorization.into(),
        }
    }

    /// `est-pto-seq` label used in error messages and logs.
    pub fn label(&self) -> String {
        format!(
            "{}-{}-{}",
            self.establishment,
            self.point_of_emission,
            self.sequential.trim_start_matches('0')
        )
    }
}

/// Tax-base breakdown shared by purchases and sales.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxBases {
    /// `baseImponible`: base taxed at 0%.
    pub zero_rated: Decimal,
    /// `baseImpGrav`: base taxed at the current IVA rate.
    pub iva_rated: Decimal,
    /// `baseNoGraIva`: amounts outside the scope of IVA.
    pub non_object: Decimal,
    /// `baseImpExe`: exempt base.
    pub exempt: Decimal,
}

impl TaxBases {
    /// Sum of all four bases.
    pub fn total(&self) -> Decimal {
        self.zero_rated + self.iva_rated + self.non_object + self.exempt
    }
}

/// A validated purchase invoice as the gateway snapshots it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// Internal identifier, used to link withholdings back to the purchase.
    pub id: String,
    /// `codSustento`: tax-support code for the transaction.
    pub sustento: String,
    /// `tpIdProv`: supplier identification type ("01" RUC, "02" cédula, "03" passport).
    pub supplier_id_type: String,
    /// `idProv`: supplier tax identifier.
    pub supplier_id: String,
    /// Supplier legal name (not rendered; kept for diagnostics).
    pub supplier_name: String,
    /// `tipoComprobante`: document-type code, e.g. "01" invoice.
    pub document_type: String,
    pub document: DocumentRef,
    /// `fechaRegistro`: accounting registration date.
    pub registration_date: NaiveDate,
    /// `fechaEmision`.
    pub emission_date: NaiveDate,
    pub bases: TaxBases,
    /// `montoIva`.
    pub iva: Decimal,
    /// `montoIce`.
    pub ice: Decimal,
    /// Total the source document declares; reconciled against the bases.
    pub declared_total: Decimal,
    /// `formaPago` codes in declaration order.
    pub payment_methods: Vec<String>,
    /// `parteRel`: related-party flag.
    pub related_party: bool,
    /// Withholding documents linked to this purchase.
    pub withholdings: Vec<WithholdingRecord>,
    pub state: RecordState,
}

/// A validated sale as the gateway snapshots it.
///
/// Sales never reach the declaration individually; the aggregator folds
/// them into per-(customer, document-type) groups first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: String,
    /// `tpIdCliente`: customer identification type ("04" RUC, "05" cédula,
    /// "06" passport, "07" final consumer).
    pub customer_id_type: String,
    /// `idCliente`.
    pub customer_id: String,
    pub customer_name: String,
    /// `tipoComprobante` as stored; "01" is remapped to "18" on output.
    pub document_type: String,
    /// Establishment that issued the sale, 3 digits.
    pub establishment: String,
    pub channel: EmissionChannel,
    pub emission_date: NaiveDate,
    pub bases: TaxBases,
    /// `montoIva`.
    pub iva: Decimal,
    /// `montoIce`.
    pub ice: Decimal,
    /// `valorRetIva`: IVA withheld by the customer.
    pub withheld_iva: Decimal,
    /// `valorRetRenta`: income tax withheld by the customer.
    pub withheld_income: Decimal,
    /// Grand total of the sale; feeds `totalVentas` and the location totals.
    pub total_sale: Decimal,
    /// `formaPago` codes in declaration order.
    pub payment_methods: Vec<String>,
    /// `parteRelVtas`.
    pub related_party: bool,
    pub state: RecordState,
}

/// A validated export as the gateway snapshots it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRecord {
    pub id: String,
    /// `tpIdClienteEx`: buyer identification type.
    pub buyer_id_type: String,
    /// `idClienteEx`.
    pub buyer_id: String,
    pub buyer_name: String,
    /// `paisEfecExp`: destination country code.
    pub destination_country: String,
    /// `tipoComprobante` as stored; "01" is remapped to "18" on output.
    pub document_type: String,
    pub document: DocumentRef,
    pub channel: EmissionChannel,
    pub emission_date: NaiveDate,
    /// `valorFOB`.
    pub fob_value: Decimal,
    /// `valorFOBComprobante`: FOB portion covered by the local document.
    /// Must not exceed `fob_value`.
    pub fob_offset: Decimal,
    pub state: RecordState,
}

/// A single withholding line retained against a payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithholdingRecord {
    pub id: String,
    pub kind: TaxKind,
    /// Withholding concept code (`codRetAir` for income-tax lines).
    pub code: String,
    /// Withholding percentage as declared (10, 20, 50, 100 for IVA).
    pub percentage: Decimal,
    /// `baseImpAir`: base the percentage applies to.
    pub base: Decimal,
    /// `valRetAir`: amount actually withheld.
    pub withheld: Decimal,
    /// The withholding document's own number and authorization.
    pub document: DocumentRef,
    pub emission_date: NaiveDate,
    /// Purchase this withholding belongs to, when linked.
    pub purchase_id: Option<String>,
}

/// Identifier stub of a voided purchase or sale document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoidedDocumentStub {
    /// `tipoComprobante` of the voided document.
    pub document_type: String,
    pub document: DocumentRef,
}

/// Company master data the declaration header needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxpayerProfile {
    /// Tax identifier; its length drives `tipoIdInformante`.
    pub ruc: String,
    /// `razonSocial` before normalization.
    pub legal_name: String,
}
