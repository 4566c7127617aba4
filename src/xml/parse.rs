//! Reading a rendered declaration back into inspectable form.
//!
//! The structural validator and the round-trip tests both need to look at a
//! finished XML document without re-deriving it from source records. Entries
//! come back as flat name-to-values maps, one per detail element; nesting
//! inside an entry (payment forms, income-tax lines) flattens into repeated
//! values under the leaf name. [`from_ats_xml`] rebuilds the typed
//! [`AtsDocument`] tree from those maps.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::core::AtsError;
use crate::document::{
    AirEntry, AtsDocument, EstablishmentEntry, ExportEntry, ForeignPayment, PurchaseEntry,
    SaleEntry, TaxpayerHeader, VoidedEntry, WithholdingReceipt,
};

/// Leaf values of one detail entry, keyed by element name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedEntry {
    values: BTreeMap<String, Vec<String>>,
}

impl ParsedEntry {
    fn push(&mut self, name: &str, value: String) {
        self.values.entry(name.to_string()).or_default().push(value);
    }

    /// First value recorded under `name`, if any.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.values.get(name)?.first().map(String::as_str)
    }

    /// Every value recorded under `name`, document order.
    pub fn all(&self, name: &str) -> &[String] {
        self.values.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `name` appeared with a non-empty value.
    pub fn has(&self, name: &str) -> bool {
        self.first(name).is_some_and(|v| !v.is_empty())
    }
}

/// A declaration as read back from XML.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDeclaration {
    /// Leaf fields directly under `<iva>`.
    pub header: ParsedEntry,
    /// One entry per `detalleCompras`.
    pub purchases: Vec<ParsedEntry>,
    /// One entry per `detalleVentas`.
    pub sales: Vec<ParsedEntry>,
    /// One entry per `ventaEst`.
    pub establishments: Vec<ParsedEntry>,
    /// One entry per `detalleExportaciones`.
    pub exports: Vec<ParsedEntry>,
    /// One entry per `detalleAnulados`.
    pub voided: Vec<ParsedEntry>,
}

fn is_entry_container(name: &str) -> bool {
    matches!(
        name,
        "detalleCompras" | "detalleVentas" | "ventaEst" | "detalleExportaciones" | "detalleAnulados"
    )
}

/// Parse a rendered declaration.
pub fn parse_declaration(xml: &str) -> Result<ParsedDeclaration, AtsError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut parsed = ParsedDeclaration::default();
    let mut path: Vec<String> = Vec::new();
    let mut current: Option<ParsedEntry> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = std::str::from_utf8(e.name().as_ref())
                    .unwrap_or("")
                    .to_string();
                if is_entry_container(&name) {
                    current = Some(ParsedEntry::default());
                }
                path.push(name);
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                if text.is_empty() {
                    continue;
                }
                let Some(leaf) = path.last() else { continue };
                if let Some(entry) = current.as_mut() {
                    entry.push(leaf, text);
                } else if path.len() == 2 && path[0] == "iva" {
                    parsed.header.push(leaf, text);
                }
            }
            Ok(Event::End(_)) => {
                let ended = path.pop().unwrap_or_default();
                if is_entry_container(&ended) {
                    if let Some(entry) = current.take() {
                        match ended.as_str() {
                            "detalleCompras" => parsed.purchases.push(entry),
                            "detalleVentas" => parsed.sales.push(entry),
                            "ventaEst" => parsed.establishments.push(entry),
                            "detalleExportaciones" => parsed.exports.push(entry),
                            "detalleAnulados" => parsed.voided.push(entry),
                            _ => {}
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(AtsError::Xml(format!("parse error: {e}"))),
        }
    }

    Ok(parsed)
}

/// Parse a rendered declaration back into the typed tree.
///
/// Values come back exactly as serialized; absent leaves become empty
/// strings, except a missing `pagoExterior` block, which resurfaces with
/// its local-payment sentinels. Rendering the result reproduces any
/// canonically rendered input byte for byte.
pub fn from_ats_xml(xml: &str) -> Result<AtsDocument, AtsError> {
    let parsed = parse_declaration(xml)?;

    Ok(AtsDocument {
        header: TaxpayerHeader {
            id_type: text(&parsed.header, "tipoIdInformante"),
            tax_id: text(&parsed.header, "idInformante"),
            legal_name: text(&parsed.header, "razonSocial"),
            year: text(&parsed.header, "anio"),
            month: text(&parsed.header, "mes"),
            establishment_count: text(&parsed.header, "numEstabRuc"),
            total_sales: text(&parsed.header, "totalVentas"),
            operative_code: text(&parsed.header, "codigoOperativo"),
        },
        purchases: parsed.purchases.iter().map(purchase_from).collect(),
        sales: parsed.sales.iter().map(sale_from).collect(),
        sales_by_establishment: parsed
            .establishments
            .iter()
            .map(|entry| EstablishmentEntry {
                establishment: text(entry, "codEstab"),
                total: text(entry, "ventasEstab"),
            })
            .collect(),
        exports: parsed.exports.iter().map(export_from).collect(),
        voided: parsed
            .voided
            .iter()
            .map(|entry| VoidedEntry {
                document_type: text(entry, "tipoComprobante"),
                establishment: text(entry, "establecimiento"),
                point_of_emission: text(entry, "puntoEmision"),
                sequential_start: text(entry, "secuencialInicio"),
                sequential_end: text(entry, "secuencialFin"),
                authorization: text(entry, "autorizacion"),
            })
            .collect(),
    })
}

fn text(entry: &ParsedEntry, name: &str) -> String {
    entry.first(name).unwrap_or_default().to_string()
}

fn purchase_from(entry: &ParsedEntry) -> PurchaseEntry {
    let codes = entry.all("codRetAir");
    let income_lines = (0..codes.len())
        .map(|i| AirEntry {
            code: codes[i].clone(),
            base: nth(entry, "baseImpAir", i),
            percentage: nth(entry, "porcentajeAir", i),
            withheld: nth(entry, "valRetAir", i),
        })
        .collect();

    let withholding_receipt = entry.has("estabRetencion1").then(|| WithholdingReceipt {
        establishment: text(entry, "estabRetencion1"),
        point_of_emission: text(entry, "ptoEmiRetencion1"),
        sequential: text(entry, "secRetencion1"),
        authorization: text(entry, "autRetencion1"),
        emission_date: text(entry, "fechaEmiRet1"),
    });

    PurchaseEntry {
        sustento_code: text(entry, "codSustento"),
        supplier_id_type: text(entry, "tpIdProv"),
        supplier_id: text(entry, "idProv"),
        document_type: text(entry, "tipoComprobante"),
        related_party: text(entry, "parteRel"),
        registration_date: text(entry, "fechaRegistro"),
        establishment: text(entry, "establecimiento"),
        point_of_emission: text(entry, "puntoEmision"),
        sequential: text(entry, "secuencial"),
        emission_date: text(entry, "fechaEmision"),
        authorization: text(entry, "autorizacion"),
        non_object_base: text(entry, "baseNoGraIva"),
        zero_rated_base: text(entry, "baseImponible"),
        iva_rated_base: text(entry, "baseImpGrav"),
        exempt_base: text(entry, "baseImpExe"),
        ice: text(entry, "montoIce"),
        iva: text(entry, "montoIva"),
        withheld_goods_10: text(entry, "valRetBien10"),
        withheld_services_20: text(entry, "valRetServ20"),
        withheld_goods: text(entry, "valorRetBienes"),
        withheld_services: text(entry, "valorRetServicios"),
        withheld_services_50: text(entry, "valRetServ50"),
        withheld_services_100: text(entry, "valRetServ100"),
        foreign_payment: if entry.has("pagoLocExt") {
            ForeignPayment {
                payment_locality: text(entry, "pagoLocExt"),
                payment_country: text(entry, "paisEfecPago"),
                double_taxation_treaty: text(entry, "aplicConvDobTrib"),
                subject_to_withholding: text(entry, "pagExtSujRetNorLeg"),
            }
        } else {
            ForeignPayment::default()
        },
        payment_methods: entry.all("formaPago").to_vec(),
        income_lines,
        withholding_receipt,
    }
}

fn sale_from(entry: &ParsedEntry) -> SaleEntry {
    SaleEntry {
        customer_id_type: text(entry, "tpIdCliente"),
        customer_id: text(entry, "idCliente"),
        related_party: text(entry, "parteRelVtas"),
        document_type: text(entry, "tipoComprobante"),
        emission_type: text(entry, "tipoEmision"),
        document_count: text(entry, "numeroComprobantes"),
        non_object_base: text(entry, "baseNoGraIva"),
        zero_rated_base: text(entry, "baseImponible"),
        iva_rated_base: text(entry, "baseImpGrav"),
        iva: text(entry, "montoIva"),
        ice: text(entry, "montoIce"),
        withheld_iva: text(entry, "valorRetIva"),
        withheld_income: text(entry, "valorRetRenta"),
        payment_methods: entry.all("formaPago").to_vec(),
    }
}

fn export_from(entry: &ParsedEntry) -> ExportEntry {
    ExportEntry {
        buyer_id_type: text(entry, "tpIdClienteEx"),
        buyer_id: text(entry, "idClienteEx"),
        document_type: text(entry, "tipoComprobante"),
        emission_type: text(entry, "tipoEmision"),
        establishment: text(entry, "establecimiento"),
        point_of_emission: text(entry, "puntoEmision"),
        sequential: text(entry, "secuencial"),
        authorization: text(entry, "autorizacion"),
        emission_date: text(entry, "fechaEmision"),
        destination_country: text(entry, "paisEfecExp"),
        fob_value: text(entry, "valorFOB"),
        fob_offset: text(entry, "valorFOBComprobante"),
    }
}

fn nth(entry: &ParsedEntry, name: &str, i: usize) -> String {
    entry.all(name).get(i).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\
        <iva><tipoIdInformante>R</tipoIdInformante><idInformante>1790012345001</idInformante>\
        <razonSocial>ACME SA</razonSocial><anio>2024</anio><mes>06</mes>\
        <numEstabRuc>001</numEstabRuc><totalVentas>125.00</totalVentas>\
        <codigoOperativo>IVA</codigoOperativo>\
        <compras><detalleCompras><codSustento>01</codSustento><idProv>1790012345001</idProv>\
        <secuencial>38</secuencial><autorizacion>1104857301</autorizacion>\
        <formasDePago><formaPago>01</formaPago><formaPago>20</formaPago></formasDePago>\
        </detalleCompras></compras>\
        <ventas><detalleVentas><idCliente>0991234567001</idCliente>\
        <tipoComprobante>18</tipoComprobante><numeroComprobantes>2</numeroComprobantes>\
        </detalleVentas></ventas></iva>";

    #[test]
    fn header_fields_come_back() {
        let parsed = parse_declaration(SAMPLE).unwrap();
        assert_eq!(parsed.header.first("tipoIdInformante"), Some("R"));
        assert_eq!(parsed.header.first("mes"), Some("06"));
        assert_eq!(parsed.header.first("totalVentas"), Some("125.00"));
    }

    #[test]
    fn entries_split_per_detail_element() {
        let parsed = parse_declaration(SAMPLE).unwrap();
        assert_eq!(parsed.purchases.len(), 1);
        assert_eq!(parsed.sales.len(), 1);
        assert!(parsed.voided.is_empty());
        assert_eq!(parsed.purchases[0].first("secuencial"), Some("38"));
        assert_eq!(parsed.sales[0].first("tipoComprobante"), Some("18"));
    }

    #[test]
    fn nested_repeats_flatten_in_order() {
        let parsed = parse_declaration(SAMPLE).unwrap();
        assert_eq!(parsed.purchases[0].all("formaPago"), ["01", "20"]);
    }

    #[test]
    fn section_containers_do_not_leak_into_header() {
        let parsed = parse_declaration(SAMPLE).unwrap();
        assert!(!parsed.header.has("codSustento"));
        assert!(!parsed.header.has("idCliente"));
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(parse_declaration("<iva><mes>06</iva>").is_err());
    }

    #[test]
    fn typed_tree_survives_a_round_trip() {
        let document = AtsDocument {
            header: TaxpayerHeader {
                id_type: "R".into(),
                tax_id: "1790012345001".into(),
                legal_name: "ACME SA".into(),
                year: "2024".into(),
                month: "06".into(),
                establishment_count: "002".into(),
                total_sales: "5345.00".into(),
                operative_code: "IVA".into(),
            },
            purchases: vec![PurchaseEntry {
                sustento_code: "01".into(),
                supplier_id_type: "01".into(),
                supplier_id: "0992233445001".into(),
                document_type: "01".into(),
                related_party: "NO".into(),
                registration_date: "05/06/2024".into(),
                establishment: "002".into(),
                point_of_emission: "001".into(),
                sequential: "123".into(),
                emission_date: "03/06/2024".into(),
                authorization: "1234567890".into(),
                non_object_base: "0.00".into(),
                zero_rated_base: "0.00".into(),
                iva_rated_base: "100.00".into(),
                exempt_base: "0.00".into(),
                ice: "0.00".into(),
                iva: "15.00".into(),
                withheld_goods_10: "0.00".into(),
                withheld_services_20: "0.00".into(),
                withheld_goods: "0.00".into(),
                withheld_services: "0.00".into(),
                withheld_services_50: "0.00".into(),
                withheld_services_100: "15.00".into(),
                foreign_payment: ForeignPayment::default(),
                payment_methods: vec!["01".into(), "20".into()],
                income_lines: vec![
                    AirEntry {
                        code: "312".into(),
                        base: "100.00".into(),
                        percentage: "1.75".into(),
                        withheld: "1.75".into(),
                    },
                    AirEntry {
                        code: "303".into(),
                        base: "50.00".into(),
                        percentage: "10.00".into(),
                        withheld: "5.00".into(),
                    },
                ],
                withholding_receipt: Some(WithholdingReceipt {
                    establishment: "001".into(),
                    point_of_emission: "001".into(),
                    sequential: "55".into(),
                    authorization: "9876543210".into(),
                    emission_date: "10/06/2024".into(),
                }),
            }],
            sales: vec![SaleEntry {
                customer_id_type: "04".into(),
                customer_id: "0998877665001".into(),
                related_party: "NO".into(),
                document_type: "18".into(),
                emission_type: "F".into(),
                document_count: "2".into(),
                non_object_base: "0.00".into(),
                zero_rated_base: "0.00".into(),
                iva_rated_base: "300.00".into(),
                iva: "45.00".into(),
                ice: "0.00".into(),
                withheld_iva: "0.00".into(),
                withheld_income: "0.00".into(),
                payment_methods: vec!["01".into()],
            }],
            sales_by_establishment: vec![EstablishmentEntry {
                establishment: "001".into(),
                total: "345.00".into(),
            }],
            exports: vec![ExportEntry {
                buyer_id_type: "01".into(),
                buyer_id: "9988776655".into(),
                document_type: "18".into(),
                emission_type: "F".into(),
                establishment: "001".into(),
                point_of_emission: "001".into(),
                sequential: "789".into(),
                authorization: "1122334455".into(),
                emission_date: "20/06/2024".into(),
                destination_country: "840".into(),
                fob_value: "5000.00".into(),
                fob_offset: "0.00".into(),
            }],
            voided: vec![VoidedEntry {
                document_type: "01".into(),
                establishment: "001".into(),
                point_of_emission: "001".into(),
                sequential_start: "5".into(),
                sequential_end: "7".into(),
                authorization: "111".into(),
            }],
        };

        let xml = crate::xml::render(&document).unwrap();
        let back = from_ats_xml(&xml).unwrap();
        assert_eq!(back, document);
    }
}
