//! Run the structural and XSD validators outside the generation pipeline.
//!
//! Run with: `cargo run --example validate_declaration`

use anexo::document::{AtsDocument, TaxpayerHeader};
use anexo::schema::{SchemaValidator, StructuralValidator, XsdValidator};
use anexo::xml::render;

/// Subset of the regulator's schema, enough to drive the XSD validator.
const MINI_XSD: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
 <xs:element name="iva">
  <xs:complexType>
   <xs:sequence>
    <xs:element name="tipoIdInformante" type="xs:string"/>
    <xs:element name="idInformante" type="xs:string"/>
    <xs:element name="razonSocial" type="xs:string"/>
    <xs:element name="anio" type="xs:string"/>
    <xs:element name="mes" type="xs:string"/>
    <xs:element name="numEstabRuc" type="xs:string"/>
    <xs:element name="totalVentas" type="xs:string"/>
    <xs:element name="codigoOperativo" type="xs:string"/>
   </xs:sequence>
  </xs:complexType>
 </xs:element>
</xs:schema>"#;

fn print_report(report: &anexo::schema::ValidationReport) {
    if report.valid {
        println!("  valid");
    }
    for finding in &report.errors {
        println!("  error   {}: {}", finding.location, finding.message);
    }
    for finding in &report.warnings {
        println!("  warning {}: {}", finding.location, finding.message);
    }
}

fn main() -> Result<(), anexo::core::AtsError> {
    // A header-only declaration, hand-assembled from the typed tree
    let document = AtsDocument {
        header: TaxpayerHeader {
            id_type: "R".into(),
            tax_id: "1790012345001".into(),
            legal_name: "ACME CIA LTDA".into(),
            year: "2024".into(),
            month: "06".into(),
            establishment_count: "0".into(),
            total_sales: "0.00".into(),
            operative_code: "IVA".into(),
        },
        purchases: vec![],
        sales: vec![],
        sales_by_establishment: vec![],
        exports: vec![],
        voided: vec![],
    };
    let xml = render(&document)?;

    let structural = StructuralValidator::new();
    println!("=== Structural: complete header ===");
    print_report(&structural.validate(&xml));

    // Strip the month and misformat a date to provoke findings
    let broken = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\
        <iva><tipoIdInformante>R</tipoIdInformante>\
        <idInformante>1790012345001</idInformante>\
        <razonSocial>ACME CIA LTDA</razonSocial><anio>2024</anio>\
        <numEstabRuc>0</numEstabRuc><totalVentas>0.00</totalVentas>\
        <codigoOperativo>IVA</codigoOperativo>\
        <compras><detalleCompras><fechaEmision>2024-06-12</fechaEmision>\
        </detalleCompras></compras></iva>";
    println!("\n=== Structural: missing month, ISO date ===");
    print_report(&structural.validate(broken));

    let xsd = XsdValidator::from_schema(MINI_XSD)?;
    println!("\n=== {} validator: complete header ===", xsd.name());
    print_report(&xsd.validate(&xml));
    println!("\n=== {} validator: missing month ===", xsd.name());
    print_report(&xsd.validate(broken));

    Ok(())
}
