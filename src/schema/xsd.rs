//! Schema-driven validation against the regulator's published XSD.
//!
//! The schema file is read once at startup into two lookup tables: which
//! element names the schema declares, and which direct children each
//! element requires (minOccurs above zero). Validation walks the instance
//! document and checks every occurrence against those tables. Sequence
//! order and simple-type facets are not enforced; the structural fallback
//! does not check them either.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::core::AtsError;
use crate::schema::{FindingKind, SchemaValidator, ValidationFinding, ValidationReport};

/// Validator backed by the element declarations of an XSD file.
#[derive(Debug)]
pub struct XsdValidator {
    root: String,
    required: HashMap<String, Vec<String>>,
    declared: HashSet<String>,
}

impl XsdValidator {
    /// Load and index a schema file.
    pub fn from_file(path: &Path) -> Result<Self, AtsError> {
        let xsd = fs::read_to_string(path)?;
        Self::from_schema(&xsd)
    }

    /// Index a schema document.
    pub fn from_schema(xsd: &str) -> Result<Self, AtsError> {
        let mut reader = Reader::from_str(xsd);
        reader.config_mut().trim_text(true);

        let mut root: Option<String> = None;
        let mut required: HashMap<String, Vec<String>> = HashMap::new();
        let mut declared: HashSet<String> = HashSet::new();
        let mut stack: Vec<String> = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) if is_element_decl(e) => {
                    let (name, min_occurs) = element_attrs(e);
                    if let Some(name) = name {
                        record_declaration(
                            &name,
                            min_occurs,
                            &stack,
                            &mut root,
                            &mut required,
                            &mut declared,
                        );
                        stack.push(name);
                    } else {
                        stack.push(String::new());
                    }
                }
                Ok(Event::Empty(ref e)) if is_element_decl(e) => {
                    let (name, min_occurs) = element_attrs(e);
                    if let Some(name) = name {
                        record_declaration(
                            &name,
                            min_occurs,
                            &stack,
                            &mut root,
                            &mut required,
                            &mut declared,
                        );
                    }
                }
                Ok(Event::End(ref e)) if e.local_name().as_ref() == b"element" => {
                    stack.pop();
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(AtsError::Xml(format!("schema parse error: {e}"))),
            }
        }

        let root = root.ok_or_else(|| AtsError::Xml("schema declares no root element".into()))?;
        Ok(Self {
            root,
            required,
            declared,
        })
    }
}

fn is_element_decl(e: &BytesStart<'_>) -> bool {
    e.local_name().as_ref() == b"element"
}

fn element_attrs(e: &BytesStart<'_>) -> (Option<String>, u32) {
    let mut name = None;
    let mut min_occurs = 1;
    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref()).unwrap_or("");
        let value = std::str::from_utf8(&attr.value).unwrap_or("");
        match key {
            "name" => name = Some(value.to_string()),
            // A ref'd element counts like a named one; drop any prefix.
            "ref" if name.is_none() => {
                name = Some(value.rsplit(':').next().unwrap_or(value).to_string());
            }
            "minOccurs" => min_occurs = value.parse().unwrap_or(1),
            _ => {}
        }
    }
    (name, min_occurs)
}

fn record_declaration(
    name: &str,
    min_occurs: u32,
    stack: &[String],
    root: &mut Option<String>,
    required: &mut HashMap<String, Vec<String>>,
    declared: &mut HashSet<String>,
) {
    declared.insert(name.to_string());
    match stack.last() {
        Some(parent) if !parent.is_empty() => {
            if min_occurs > 0 {
                required
                    .entry(parent.clone())
                    .or_default()
                    .push(name.to_string());
            }
        }
        _ => {
            if root.is_none() {
                *root = Some(name.to_string());
            }
        }
    }
}

impl SchemaValidator for XsdValidator {
    fn name(&self) -> &'static str {
        "xsd"
    }

    fn validate(&self, xml: &str) -> ValidationReport {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut stack: Vec<(String, Vec<String>)> = Vec::new();
        let mut seen_root = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    let name = std::str::from_utf8(e.name().as_ref())
                        .unwrap_or("")
                        .to_string();
                    self.check_known(&name, &stack, &mut warnings);
                    if stack.is_empty() {
                        seen_root = true;
                        if name != self.root {
                            errors.push(ValidationFinding::new(
                                FindingKind::MissingElement,
                                name.clone(),
                                format!("root element should be '{}'", self.root),
                            ));
                        }
                    }
                    stack.push((name, Vec::new()));
                }
                Ok(Event::Empty(ref e)) => {
                    let name = std::str::from_utf8(e.name().as_ref())
                        .unwrap_or("")
                        .to_string();
                    self.check_known(&name, &stack, &mut warnings);
                    let path = path_of(&stack, &name);
                    self.check_required(&name, &[], &path, &mut errors);
                    if let Some(parent) = stack.last_mut() {
                        parent.1.push(name);
                    }
                }
                Ok(Event::End(_)) => {
                    let Some((name, children)) = stack.pop() else {
                        continue;
                    };
                    let path = path_of(&stack, &name);
                    self.check_required(&name, &children, &path, &mut errors);
                    if let Some(parent) = stack.last_mut() {
                        parent.1.push(name);
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    errors.push(ValidationFinding::new(
                        FindingKind::Malformed,
                        "",
                        format!("parse error: {e}"),
                    ));
                    return ValidationReport::from_findings(errors, warnings);
                }
            }
        }

        if !seen_root {
            errors.push(ValidationFinding::new(
                FindingKind::Malformed,
                "",
                "document has no root element",
            ));
        }

        ValidationReport::from_findings(errors, warnings)
    }
}

impl XsdValidator {
    fn check_known(
        &self,
        name: &str,
        stack: &[(String, Vec<String>)],
        warnings: &mut Vec<ValidationFinding>,
    ) {
        if !self.declared.contains(name) {
            warnings.push(ValidationFinding::new(
                FindingKind::UnknownElement,
                path_of(stack, name),
                "element is not declared in the schema",
            ));
        }
    }

    fn check_required(
        &self,
        name: &str,
        children: &[String],
        path: &str,
        errors: &mut Vec<ValidationFinding>,
    ) {
        let Some(required) = self.required.get(name) else {
            return;
        };
        for child in required {
            if !children.iter().any(|c| c == child) {
                errors.push(ValidationFinding::new(
                    FindingKind::MissingElement,
                    format!("{path}/{child}"),
                    "element required by the schema is missing",
                ));
            }
        }
    }
}

fn path_of(stack: &[(String, Vec<String>)], name: &str) -> String {
    let mut path: Vec<&str> = stack.iter().map(|(n, _)| n.as_str()).collect();
    path.push(name);
    path.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
 <xs:element name="iva">
  <xs:complexType>
   <xs:sequence>
    <xs:element name="anio" type="xs:string"/>
    <xs:element name="mes" type="xs:string"/>
    <xs:element name="compras" minOccurs="0">
     <xs:complexType>
      <xs:sequence>
       <xs:element name="detalleCompras" maxOccurs="unbounded">
        <xs:complexType>
         <xs:sequence>
          <xs:element name="codSustento" type="xs:string"/>
          <xs:element name="idProv" type="xs:string"/>
         </xs:sequence>
        </xs:complexType>
       </xs:element>
      </xs:sequence>
     </xs:complexType>
    </xs:element>
   </xs:sequence>
  </xs:complexType>
 </xs:element>
</xs:schema>"#;

    fn validator() -> XsdValidator {
        XsdValidator::from_schema(SCHEMA).unwrap()
    }

    #[test]
    fn indexes_root_and_requirements() {
        let v = validator();
        assert_eq!(v.root, "iva");
        assert_eq!(v.required["iva"], ["anio", "mes"]);
        assert_eq!(v.required["compras"], ["detalleCompras"]);
        assert_eq!(v.required["detalleCompras"], ["codSustento", "idProv"]);
    }

    #[test]
    fn optional_sections_may_be_absent() {
        let report = validator().validate("<iva><anio>2024</anio><mes>06</mes></iva>");
        assert!(report.valid, "{:?}", report.errors);
    }

    #[test]
    fn missing_required_header_child_is_reported() {
        let report = validator().validate("<iva><anio>2024</anio></iva>");
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.location == "iva/mes"));
    }

    #[test]
    fn nested_requirements_apply_per_occurrence() {
        let xml = "<iva><anio>2024</anio><mes>06</mes>\
            <compras><detalleCompras><idProv>x</idProv></detalleCompras></compras></iva>";
        let report = validator().validate(xml);
        assert!(!report.valid);
        assert!(
            report
                .errors
                .iter()
                .any(|e| e.location == "iva/compras/detalleCompras/codSustento")
        );
    }

    #[test]
    fn empty_section_misses_its_detail() {
        let xml = "<iva><anio>2024</anio><mes>06</mes><compras></compras></iva>";
        let report = validator().validate(xml);
        assert!(
            report
                .errors
                .iter()
                .any(|e| e.location == "iva/compras/detalleCompras")
        );
    }

    #[test]
    fn undeclared_elements_warn_only() {
        let xml = "<iva><anio>2024</anio><mes>06</mes><extra>1</extra></iva>";
        let report = validator().validate(xml);
        assert!(report.valid);
        assert!(
            report
                .warnings
                .iter()
                .any(|w| w.kind == FindingKind::UnknownElement && w.location == "iva/extra")
        );
    }

    #[test]
    fn wrong_root_is_an_error() {
        let report = validator().validate("<factura></factura>");
        assert!(!report.valid);
    }

    #[test]
    fn loads_from_a_file() {
        let path = std::env::temp_dir().join(format!("anexo-xsd-{}.xsd", std::process::id()));
        fs::write(&path, SCHEMA).unwrap();
        let v = XsdValidator::from_file(&path).unwrap();
        assert_eq!(v.name(), "xsd");
        fs::remove_file(&path).ok();
    }

    #[test]
    fn schema_without_elements_is_rejected() {
        let err = XsdValidator::from_schema("<xs:schema xmlns:xs=\"x\"></xs:schema>").unwrap_err();
        assert!(matches!(err, AtsError::Xml(_)));
    }
}
