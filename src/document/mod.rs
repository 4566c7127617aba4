//! The typed declaration tree and the mapping onto it.
//!
//! Every value in this tree is already formatted to the schema's textual
//! rules (see [`format`]); the renderer only walks the structure and emits
//! tags. Optional content is explicit: `Option` fields and empty section
//! vectors never reach the output, instead of relying on a serializer to
//! drop loose fields.

pub mod format;
pub mod mapper;

use serde::{Deserialize, Serialize};

/// The complete mapped declaration, mirroring the `<iva>` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AtsDocument {
    pub header: TaxpayerHeader,
    /// `compras` section, omitted when empty.
    pub purchases: Vec<PurchaseEntry>,
    /// `ventas` section, omitted when empty.
    pub sales: Vec<SaleEntry>,
    /// `ventasEstablecimiento` section, omitted when empty.
    pub sales_by_establishment: Vec<EstablishmentEntry>,
    /// `exportaciones` section, omitted when empty.
    pub exports: Vec<ExportEntry>,
    /// `anulados` section, omitted when empty.
    pub voided: Vec<VoidedEntry>,
}

/// Header fields carried directly under `<iva>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxpayerHeader {
    /// `tipoIdInformante` - "R", "C" or "P".
    pub id_type: String,
    /// `idInformante`.
    pub tax_id: String,
    /// `razonSocial`, normalized.
    pub legal_name: String,
    /// `anio`, 4 digits.
    pub year: String,
    /// `mes`, 2 digits.
    pub month: String,
    /// `numEstabRuc` - "0" or a 3-digit count.
    pub establishment_count: String,
    /// `totalVentas`, 2 decimals.
    pub total_sales: String,
    /// `codigoOperativo`, fixed to "IVA".
    pub operative_code: String,
}

/// The `pagoExterior` block. Emitted for every purchase; purely local
/// payments carry the "NA" sentinels below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignPayment {
    /// `pagoLocExt` - "01" local payment.
    pub payment_locality: String,
    /// `paisEfecPago`.
    pub payment_country: String,
    /// `aplicConvDobTrib`.
    pub double_taxation_treaty: String,
    /// `pagExtSujRetNorLeg`.
    pub subject_to_withholding: String,
}

impl Default for ForeignPayment {
    fn default() -> Self {
        Self {
            payment_locality: "01".to_string(),
            payment_country: "NA".to_string(),
            double_taxation_treaty: "NA".to_string(),
            subject_to_withholding: "NA".to_string(),
        }
    }
}

/// One `detalleAir` income-tax withholding line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirEntry {
    /// `codRetAir`.
    pub code: String,
    /// `baseImpAir`, 2 decimals.
    pub base: String,
    /// `porcentajeAir`, 2 decimals.
    pub percentage: String,
    /// `valRetAir`, 2 decimals.
    pub withheld: String,
}

/// Identifiers of the withholding receipt, appended to a purchase entry
/// when at least one income-tax line exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithholdingReceipt {
    /// `estabRetencion1`, 3 digits.
    pub establishment: String,
    /// `ptoEmiRetencion1`, 3 digits.
    pub point_of_emission: String,
    /// `secRetencion1`, un-padded.
    pub sequential: String,
    /// `autRetencion1`.
    pub authorization: String,
    /// `fechaEmiRet1`, DD/MM/YYYY.
    pub emission_date: String,
}

/// One `detalleCompras` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseEntry {
    /// `codSustento`.
    pub sustento_code: String,
    /// `tpIdProv`.
    pub supplier_id_type: String,
    /// `idProv`.
    pub supplier_id: String,
    /// `tipoComprobante`.
    pub document_type: String,
    /// `parteRel` - "SI" or "NO".
    pub related_party: String,
    /// `fechaRegistro`, DD/MM/YYYY.
    pub registration_date: String,
    /// `establecimiento`, 3 digits.
    pub establishment: String,
    /// `puntoEmision`, 3 digits.
    pub point_of_emission: String,
    /// `secuencial`, un-padded.
    pub sequential: String,
    /// `fechaEmision`, DD/MM/YYYY.
    pub emission_date: String,
    /// `autorizacion`.
    pub authorization: String,
    /// `baseNoGraIva`, 2 decimals.
    pub non_object_base: String,
    /// `baseImponible`, 2 decimals.
    pub zero_rated_base: String,
    /// `baseImpGrav`, 2 decimals.
    pub iva_rated_base: String,
    /// `baseImpExe`, 2 decimals.
    pub exempt_base: String,
    /// `montoIce`, 2 decimals.
    pub ice: String,
    /// `montoIva`, 2 decimals.
    pub iva: String,
    /// `valRetBien10`, 2 decimals.
    pub withheld_goods_10: String,
    /// `valRetServ20`, 2 decimals.
    pub withheld_services_20: String,
    /// `valorRetBienes`, 2 decimals. Reserved for the 30% bracket the
    /// current rules never populate; always "0.00".
    pub withheld_goods: String,
    /// `valorRetServicios`, 2 decimals. Reserved for the 70% bracket;
    /// always "0.00".
    pub withheld_services: String,
    /// `valRetServ50`, 2 decimals.
    pub withheld_services_50: String,
    /// `valRetServ100`, 2 decimals.
    pub withheld_services_100: String,
    /// `pagoExterior`, always present.
    pub foreign_payment: ForeignPayment,
    /// `formasDePago` - one `formaPago` per code; omitted when empty.
    pub payment_methods: Vec<String>,
    /// `air` - income-tax lines; omitted when empty.
    pub income_lines: Vec<AirEntry>,
    /// Withholding receipt identifiers; omitted when no income-tax line
    /// exists.
    pub withholding_receipt: Option<WithholdingReceipt>,
}

/// One `detalleVentas` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleEntry {
    /// `tpIdCliente`.
    pub customer_id_type: String,
    /// `idCliente`.
    pub customer_id: String,
    /// `parteRelVtas` - "SI" or "NO".
    pub related_party: String,
    /// `tipoComprobante`, after the invoice remap.
    pub document_type: String,
    /// `tipoEmision` - "E" or "F".
    pub emission_type: String,
    /// `numeroComprobantes`.
    pub document_count: String,
    /// `baseNoGraIva`, 2 decimals.
    pub non_object_base: String,
    /// `baseImponible`, 2 decimals.
    pub zero_rated_base: String,
    /// `baseImpGrav`, 2 decimals.
    pub iva_rated_base: String,
    /// `montoIva`, 2 decimals.
    pub iva: String,
    /// `montoIce`, 2 decimals.
    pub ice: String,
    /// `valorRetIva`, 2 decimals.
    pub withheld_iva: String,
    /// `valorRetRenta`, 2 decimals.
    pub withheld_income: String,
    /// `formasDePago` - one `formaPago` per code; omitted when empty.
    pub payment_methods: Vec<String>,
}

/// One `ventaEst` entry of `ventasEstablecimiento`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstablishmentEntry {
    /// `codEstab`, 3 digits.
    pub establishment: String,
    /// `ventasEstab`, 2 decimals.
    pub total: String,
}

/// One `detalleExportaciones` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportEntry {
    /// `tpIdClienteEx`.
    pub buyer_id_type: String,
    /// `idClienteEx`.
    pub buyer_id: String,
    /// `tipoComprobante`, after the invoice remap.
    pub document_type: String,
    /// `tipoEmision` - "E" or "F".
    pub emission_type: String,
    /// `establecimiento`, 3 digits.
    pub establishment: String,
    /// `puntoEmision`, 3 digits.
    pub point_of_emission: String,
    /// `secuencial`, un-padded.
    pub sequential: String,
    /// `autorizacion`.
    pub authorization: String,
    /// `fechaEmision`, DD/MM/YYYY.
    pub emission_date: String,
    /// `paisEfecExp`.
    pub destination_country: String,
    /// `valorFOB`, 2 decimals.
    pub fob_value: String,
    /// `valorFOBComprobante`, 2 decimals.
    pub fob_offset: String,
}

/// One `detalleAnulados` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoidedEntry {
    /// `tipoComprobante`.
    pub document_type: String,
    /// `establecimiento`, 3 digits.
    pub establishment: String,
    /// `puntoEmision`, 3 digits.
    pub point_of_emission: String,
    /// `secuencialInicio`.
    pub sequential_start: String,
    /// `secuencialFin`.
    pub sequential_end: String,
    /// `autorizacion`.
    pub authorization: String,
}
