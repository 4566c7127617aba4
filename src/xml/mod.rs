//! XML rendering, parse-back and artifact packaging.

pub mod package;
pub mod parse;
pub mod render;

pub use package::{Artifacts, archive_xml, write_artifacts};
pub use parse::{ParsedDeclaration, ParsedEntry, from_ats_xml, parse_declaration};
pub use render::{XmlWriter, render};
