//! Built-in structural checks used when no XSD is configured.

use chrono::NaiveDate;

use crate::core::catalog;
use crate::schema::{FindingKind, SchemaValidator, ValidationFinding, ValidationReport};
use crate::xml::parse::{ParsedEntry, parse_declaration};

/// Mandatory leaf fields directly under `<iva>`.
const HEADER_FIELDS: &[&str] = &[
    "tipoIdInformante",
    "idInformante",
    "razonSocial",
    "anio",
    "mes",
    "numEstabRuc",
    "totalVentas",
    "codigoOperativo",
];

/// Mandatory children of `detalleCompras`. `autorizacion` is left out: the
/// annex tolerates it empty and an empty element is indistinguishable from
/// an absent one after parse-back.
const PURCHASE_FIELDS: &[&str] = &[
    "codSustento",
    "tpIdProv",
    "idProv",
    "tipoComprobante",
    "parteRel",
    "fechaRegistro",
    "establecimiento",
    "puntoEmision",
    "secuencial",
    "fechaEmision",
    "baseNoGraIva",
    "baseImponible",
    "baseImpGrav",
    "baseImpExe",
    "montoIce",
    "montoIva",
    "valRetBien10",
    "valRetServ20",
    "valorRetBienes",
    "valorRetServicios",
    "valRetServ50",
    "valRetServ100",
];

/// Mandatory children of `detalleVentas`.
const SALE_FIELDS: &[&str] = &[
    "tpIdCliente",
    "idCliente",
    "parteRelVtas",
    "tipoComprobante",
    "tipoEmision",
    "numeroComprobantes",
    "baseNoGraIva",
    "baseImponible",
    "baseImpGrav",
    "montoIva",
    "montoIce",
    "valorRetIva",
    "valorRetRenta",
];

/// Mandatory children of `ventaEst`.
const ESTABLISHMENT_FIELDS: &[&str] = &["codEstab", "ventasEstab"];

/// Mandatory children of `detalleExportaciones`.
const EXPORT_FIELDS: &[&str] = &[
    "tpIdClienteEx",
    "idClienteEx",
    "tipoComprobante",
    "tipoEmision",
    "establecimiento",
    "puntoEmision",
    "secuencial",
    "fechaEmision",
    "paisEfecExp",
    "valorFOB",
    "valorFOBComprobante",
];

/// Mandatory children of `detalleAnulados`.
const VOIDED_FIELDS: &[&str] = &[
    "tipoComprobante",
    "establecimiento",
    "puntoEmision",
    "secuencialInicio",
    "secuencialFin",
];

/// Fallback validator: mandatory-field presence plus textual format checks.
#[derive(Debug, Default)]
pub struct StructuralValidator;

impl StructuralValidator {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaValidator for StructuralValidator {
    fn name(&self) -> &'static str {
        "structural"
    }

    fn validate(&self, xml: &str) -> ValidationReport {
        let parsed = match parse_declaration(xml) {
            Ok(parsed) => parsed,
            Err(e) => {
                return ValidationReport::from_findings(
                    vec![ValidationFinding::new(
                        FindingKind::Malformed,
                        "",
                        e.to_string(),
                    )],
                    Vec::new(),
                );
            }
        };

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        check_header(&parsed.header, &mut errors);

        for (i, entry) in parsed.purchases.iter().enumerate() {
            let location = format!("iva/compras/detalleCompras[{}]", i + 1);
            require_fields(entry, PURCHASE_FIELDS, &location, &mut errors);
            check_dates(entry, &["fechaRegistro", "fechaEmision", "fechaEmiRet1"], &location, &mut errors);
            check_codes(entry, &location, &mut warnings);
            if let Some(code) = entry.first("codSustento") {
                if !catalog::is_known_sustento(code) {
                    warnings.push(ValidationFinding::new(
                        FindingKind::Format,
                        format!("{location}/codSustento"),
                        format!("'{code}' is not a known tax-support code"),
                    ));
                }
            }
        }

        for (i, entry) in parsed.sales.iter().enumerate() {
            let location = format!("iva/ventas/detalleVentas[{}]", i + 1);
            require_fields(entry, SALE_FIELDS, &location, &mut errors);
            check_emission_type(entry, &location, &mut errors);
            check_codes(entry, &location, &mut warnings);
        }

        for (i, entry) in parsed.establishments.iter().enumerate() {
            let location = format!("iva/ventasEstablecimiento/ventaEst[{}]", i + 1);
            require_fields(entry, ESTABLISHMENT_FIELDS, &location, &mut errors);
        }

        for (i, entry) in parsed.exports.iter().enumerate() {
            let location = format!("iva/exportaciones/detalleExportaciones[{}]", i + 1);
            require_fields(entry, EXPORT_FIELDS, &location, &mut errors);
            check_dates(entry, &["fechaEmision"], &location, &mut errors);
            check_emission_type(entry, &location, &mut errors);
            check_codes(entry, &location, &mut warnings);
        }

        for (i, entry) in parsed.voided.iter().enumerate() {
            let location = format!("iva/anulados/detalleAnulados[{}]", i + 1);
            require_fields(entry, VOIDED_FIELDS, &location, &mut errors);
        }

        ValidationReport::from_findings(errors, warnings)
    }
}

fn check_header(header: &ParsedEntry, errors: &mut Vec<ValidationFinding>) {
    for field in HEADER_FIELDS {
        if !header.has(field) {
            errors.push(ValidationFinding::new(
                FindingKind::MissingElement,
                format!("iva/{field}"),
                "mandatory header field is missing",
            ));
        }
    }

    if let Some(year) = header.first("anio") {
        match year.parse::<i32>() {
            Ok(y) if (2000..=9999).contains(&y) => {}
            Ok(_) => errors.push(ValidationFinding::new(
                FindingKind::Range,
                "iva/anio",
                format!("year {year} is outside 2000-9999"),
            )),
            Err(_) => errors.push(ValidationFinding::new(
                FindingKind::Format,
                "iva/anio",
                format!("'{year}' is not a 4-digit year"),
            )),
        }
    }

    if let Some(month) = header.first("mes") {
        let in_range = month.len() == 2 && matches!(month.parse::<u32>(), Ok(1..=12));
        if !in_range {
            errors.push(ValidationFinding::new(
                FindingKind::Range,
                "iva/mes",
                format!("month '{month}' is not in 01-12"),
            ));
        }
    }

    if let (Some(id_type), Some(id)) = (header.first("tipoIdInformante"), header.first("idInformante")) {
        let digits = id.chars().all(|c| c.is_ascii_digit());
        let ok = match id_type {
            "R" => digits && id.len() == 13,
            "C" => digits && id.len() == 10,
            _ => !id.is_empty(),
        };
        if !ok {
            errors.push(ValidationFinding::new(
                FindingKind::Format,
                "iva/idInformante",
                format!("identifier '{id}' does not match type '{id_type}'"),
            ));
        }
    }
}

fn require_fields(
    entry: &ParsedEntry,
    fields: &[&str],
    location: &str,
    errors: &mut Vec<ValidationFinding>,
) {
    for field in fields {
        if !entry.has(field) {
            errors.push(ValidationFinding::new(
                FindingKind::MissingElement,
                format!("{location}/{field}"),
                "mandatory field is missing",
            ));
        }
    }
}

fn check_dates(
    entry: &ParsedEntry,
    fields: &[&str],
    location: &str,
    errors: &mut Vec<ValidationFinding>,
) {
    for field in fields {
        if let Some(value) = entry.first(field) {
            if NaiveDate::parse_from_str(value, "%d/%m/%Y").is_err() {
                errors.push(ValidationFinding::new(
                    FindingKind::Format,
                    format!("{location}/{field}"),
                    format!("'{value}' is not a DD/MM/YYYY date"),
                ));
            }
        }
    }
}

fn check_emission_type(entry: &ParsedEntry, location: &str, errors: &mut Vec<ValidationFinding>) {
    if let Some(value) = entry.first("tipoEmision") {
        if value != "E" && value != "F" {
            errors.push(ValidationFinding::new(
                FindingKind::Format,
                format!("{location}/tipoEmision"),
                format!("emission type '{value}' is not E or F"),
            ));
        }
    }
}

fn check_codes(entry: &ParsedEntry, location: &str, warnings: &mut Vec<ValidationFinding>) {
    if let Some(code) = entry.first("tipoComprobante") {
        if !catalog::is_known_document_type(code) {
            warnings.push(ValidationFinding::new(
                FindingKind::Format,
                format!("{location}/tipoComprobante"),
                format!("'{code}' is not a known document-type code"),
            ));
        }
    }
    for code in entry.all("formaPago") {
        if !catalog::is_known_payment_method(code) {
            warnings.push(ValidationFinding::new(
                FindingKind::Format,
                format!("{location}/formasDePago"),
                format!("'{code}' is not a known payment-method code"),
            ));
        }
    }
    // Identification types, tabla 2: suppliers use 01-03, customers 04-07.
    if let Some(code) = entry.first("tpIdProv") {
        if !matches!(code, "01" | "02" | "03") {
            warnings.push(ValidationFinding::new(
                FindingKind::Format,
                format!("{location}/tpIdProv"),
                format!("'{code}' is not a supplier identification type"),
            ));
        }
    }
    for field in ["tpIdCliente", "tpIdClienteEx"] {
        if let Some(code) = entry.first(field) {
            if !matches!(code, "04" | "05" | "06" | "07") {
                warnings.push(ValidationFinding::new(
                    FindingKind::Format,
                    format!("{location}/{field}"),
                    format!("'{code}' is not a customer identification type"),
                ));
            }
        }
    }
}
