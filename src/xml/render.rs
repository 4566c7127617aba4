//! Serialization of the mapped tree to the annex's XML shape.
//!
//! The output is deliberately compact: the prologue is followed by `<iva>`
//! with no whitespace in between, and no indentation is emitted anywhere.
//! Identical input trees serialize to identical bytes.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::core::AtsError;
use crate::document::{AtsDocument, ExportEntry, PurchaseEntry, SaleEntry, VoidedEntry};

fn xml_io(e: std::io::Error) -> AtsError {
    AtsError::Xml(format!("write error: {e}"))
}

/// Thin stateful wrapper over the event writer.
pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    /// Open a writer with the annex prologue already emitted.
    pub fn new() -> Result<Self, AtsError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("no"))))
            .map_err(xml_io)?;
        Ok(Self { writer })
    }

    pub fn into_string(self) -> Result<String, AtsError> {
        let buf = self.writer.into_inner().into_inner();
        String::from_utf8(buf).map_err(|e| AtsError::Xml(format!("UTF-8 error: {e}")))
    }

    pub fn start_element(&mut self, name: &str) -> Result<&mut Self, AtsError> {
        self.writer
            .write_event(Event::Start(BytesStart::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, AtsError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn text_element(&mut self, name: &str, text: &str) -> Result<&mut Self, AtsError> {
        self.start_element(name)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        self.end_element(name)
    }
}

/// Render the declaration tree to its XML text.
pub fn render(document: &AtsDocument) -> Result<String, AtsError> {
    let mut xml = XmlWriter::new()?;
    xml.start_element("iva")?;

    let header = &document.header;
    xml.text_element("tipoIdInformante", &header.id_type)?
        .text_element("idInformante", &header.tax_id)?
        .text_element("razonSocial", &header.legal_name)?
        .text_element("anio", &header.year)?
        .text_element("mes", &header.month)?
        .text_element("numEstabRuc", &header.establishment_count)?
        .text_element("totalVentas", &header.total_sales)?
        .text_element("codigoOperativo", &header.operative_code)?;

    if !document.purchases.is_empty() {
        xml.start_element("compras")?;
        for entry in &document.purchases {
            write_purchase(&mut xml, entry)?;
        }
        xml.end_element("compras")?;
    }

    if !document.sales.is_empty() {
        xml.start_element("ventas")?;
        for entry in &document.sales {
            write_sale(&mut xml, entry)?;
        }
        xml.end_element("ventas")?;
    }

    if !document.sales_by_establishment.is_empty() {
        xml.start_element("ventasEstablecimiento")?;
        for entry in &document.sales_by_establishment {
            xml.start_element("ventaEst")?
                .text_element("codEstab", &entry.establishment)?
                .text_element("ventasEstab", &entry.total)?
                .end_element("ventaEst")?;
        }
        xml.end_element("ventasEstablecimiento")?;
    }

    if !document.exports.is_empty() {
        xml.start_element("exportaciones")?;
        for entry in &document.exports {
            write_export(&mut xml, entry)?;
        }
        xml.end_element("exportaciones")?;
    }

    if !document.voided.is_empty() {
        xml.start_element("anulados")?;
        for entry in &document.voided {
            write_voided(&mut xml, entry)?;
        }
        xml.end_element("anulados")?;
    }

    xml.end_element("iva")?;
    xml.into_string()
}

fn write_purchase(xml: &mut XmlWriter, entry: &PurchaseEntry) -> Result<(), AtsError> {
    xml.start_element("detalleCompras")?
        .text_element("codSustento", &entry.sustento_code)?
        .text_element("tpIdProv", &entry.supplier_id_type)?
        .text_element("idProv", &entry.supplier_id)?
        .text_element("tipoComprobante", &entry.document_type)?
        .text_element("parteRel", &entry.related_party)?
        .text_element("fechaRegistro", &entry.registration_date)?
        .text_element("establecimiento", &entry.establishment)?
        .text_element("puntoEmision", &entry.point_of_emission)?
        .text_element("secuencial", &entry.sequential)?
        .text_element("fechaEmision", &entry.emission_date)?;
    // An unrecoverable authorization renders as no node at all.
    if !entry.authorization.is_empty() {
        xml.text_element("autorizacion", &entry.authorization)?;
    }
    xml.text_element("baseNoGraIva", &entry.non_object_base)?
        .text_element("baseImponible", &entry.zero_rated_base)?
        .text_element("baseImpGrav", &entry.iva_rated_base)?
        .text_element("baseImpExe", &entry.exempt_base)?
        .text_element("montoIce", &entry.ice)?
        .text_element("montoIva", &entry.iva)?
        .text_element("valRetBien10", &entry.withheld_goods_10)?
        .text_element("valRetServ20", &entry.withheld_services_20)?
        .text_element("valorRetBienes", &entry.withheld_goods)?
        .text_element("valorRetServicios", &entry.withheld_services)?
        .text_element("valRetServ50", &entry.withheld_services_50)?
        .text_element("valRetServ100", &entry.withheld_services_100)?;

    let fp = &entry.foreign_payment;
    xml.start_element("pagoExterior")?
        .text_element("pagoLocExt", &fp.payment_locality)?
        .text_element("paisEfecPago", &fp.payment_country)?
        .text_element("aplicConvDobTrib", &fp.double_taxation_treaty)?
        .text_element("pagExtSujRetNorLeg", &fp.subject_to_withholding)?
        .end_element("pagoExterior")?;

    if !entry.payment_methods.is_empty() {
        xml.start_element("formasDePago")?;
        for code in &entry.payment_methods {
            xml.text_element("formaPago", code)?;
        }
        xml.end_element("formasDePago")?;
    }

    if !entry.income_lines.is_empty() {
        xml.start_element("air")?;
        for line in &entry.income_lines {
            xml.start_element("detalleAir")?
                .text_element("codRetAir", &line.code)?
                .text_element("baseImpAir", &line.base)?
                .text_element("porcentajeAir", &line.percentage)?
                .text_element("valRetAir", &line.withheld)?
                .end_element("detalleAir")?;
        }
        xml.end_element("air")?;
    }

    if let Some(receipt) = &entry.withholding_receipt {
        xml.text_element("estabRetencion1", &receipt.establishment)?
            .text_element("ptoEmiRetencion1", &receipt.point_of_emission)?
            .text_element("secRetencion1", &receipt.sequential)?;
        if !receipt.authorization.is_empty() {
            xml.text_element("autRetencion1", &receipt.authorization)?;
        }
        xml.text_element("fechaEmiRet1", &receipt.emission_date)?;
    }

    xml.end_element("detalleCompras")?;
    Ok(())
}

fn write_sale(xml: &mut XmlWriter, entry: &SaleEntry) -> Result<(), AtsError> {
    xml.start_element("detalleVentas")?
        .text_element("tpIdCliente", &entry.customer_id_type)?
        .text_element("idCliente", &entry.customer_id)?
        .text_element("parteRelVtas", &entry.related_party)?
        .text_element("tipoComprobante", &entry.document_type)?
        .text_element("tipoEmision", &entry.emission_type)?
        .text_element("numeroComprobantes", &entry.document_count)?
        .text_element("baseNoGraIva", &entry.non_object_base)?
        .text_element("baseImponible", &entry.zero_rated_base)?
        .text_element("baseImpGrav", &entry.iva_rated_base)?
        .text_element("montoIva", &entry.iva)?
        .text_element("montoIce", &entry.ice)?
        .text_element("valorRetIva", &entry.withheld_iva)?
        .text_element("valorRetRenta", &entry.withheld_income)?;

    if !entry.payment_methods.is_empty() {
        xml.start_element("formasDePago")?;
        for code in &entry.payment_methods {
            xml.text_element("formaPago", code)?;
        }
        xml.end_element("formasDePago")?;
    }

    xml.end_element("detalleVentas")?;
    Ok(())
}

fn write_export(xml: &mut XmlWriter, entry: &ExportEntry) -> Result<(), AtsError> {
    xml.start_element("detalleExportaciones")?
        .text_element("tpIdClienteEx", &entry.buyer_id_type)?
        .text_element("idClienteEx", &entry.buyer_id)?
        .text_element("tipoComprobante", &entry.document_type)?
        .text_element("tipoEmision", &entry.emission_type)?
        .text_element("establecimiento", &entry.establishment)?
        .text_element("puntoEmision", &entry.point_of_emission)?
        .text_element("secuencial", &entry.sequential)?;
    if !entry.authorization.is_empty() {
        xml.text_element("autorizacion", &entry.authorization)?;
    }
    xml.text_element("fechaEmision", &entry.emission_date)?
        .text_element("paisEfecExp", &entry.destination_country)?
        .text_element("valorFOB", &entry.fob_value)?
        .text_element("valorFOBComprobante", &entry.fob_offset)?
        .end_element("detalleExportaciones")?;
    Ok(())
}

fn write_voided(xml: &mut XmlWriter, entry: &VoidedEntry) -> Result<(), AtsError> {
    xml.start_element("detalleAnulados")?
        .text_element("tipoComprobante", &entry.document_type)?
        .text_element("establecimiento", &entry.establishment)?
        .text_element("puntoEmision", &entry.point_of_emission)?
        .text_element("secuencialInicio", &entry.sequential_start)?
        .text_element("secuencialFin", &entry.sequential_end)?;
    if !entry.authorization.is_empty() {
        xml.text_element("autorizacion", &entry.authorization)?;
    }
    xml.end_element("detalleAnulados")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TaxpayerHeader;

    fn header_only() -> AtsDocument {
        AtsDocument {
            header: TaxpayerHeader {
                id_type: "R".into(),
                tax_id: "1790012345001".into(),
                legal_name: "ACME SA".into(),
                year: "2024".into(),
                month: "06".into(),
                establishment_count: "0".into(),
                total_sales: "0.00".into(),
                operative_code: "IVA".into(),
            },
            ..AtsDocument::default()
        }
    }

    #[test]
    fn prologue_is_exact_and_adjacent_to_root() {
        let xml = render(&header_only()).unwrap();
        assert!(xml.starts_with(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?><iva>"
        ));
    }

    #[test]
    fn empty_period_omits_every_section() {
        let xml = render(&header_only()).unwrap();
        assert!(xml.contains("<codigoOperativo>IVA</codigoOperativo>"));
        assert!(!xml.contains("<compras>"));
        assert!(!xml.contains("<ventas>"));
        assert!(!xml.contains("<ventasEstablecimiento>"));
        assert!(!xml.contains("<exportaciones>"));
        assert!(!xml.contains("<anulados>"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let doc = header_only();
        assert_eq!(render(&doc).unwrap(), render(&doc).unwrap());
    }

    #[test]
    fn text_is_escaped() {
        let mut doc = header_only();
        doc.header.legal_name = "A&B <CIA>".into();
        let xml = render(&doc).unwrap();
        assert!(xml.contains("A&amp;B &lt;CIA&gt;"));
    }

    #[test]
    fn empty_authorization_renders_no_node() {
        let mut doc = header_only();
        doc.voided.push(crate::document::VoidedEntry {
            document_type: "01".into(),
            establishment: "001".into(),
            point_of_emission: "001".into(),
            sequential_start: "5".into(),
            sequential_end: "7".into(),
            authorization: String::new(),
        });
        let xml = render(&doc).unwrap();
        assert!(xml.contains("<secuencialFin>7</secuencialFin>"));
        assert!(!xml.contains("<autorizacion>"));
    }
}
