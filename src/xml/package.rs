//! Writing the declaration artifacts to disk.
//!
//! Each generation produces `{root}/{ruc}/ATS{MM}{YYYY}.xml` and a sibling
//! `AT{MM}{YYYY}.zip` holding that single file at maximum deflate
//! compression. The two writes are sequential and not transactional; a crash
//! in between leaves an orphaned XML, and regenerating the period overwrites
//! both files.

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::core::{AtsError, FiscalPeriod};

/// Where the generation landed on disk, plus the archive bytes for callers
/// that stream the result without re-reading the file.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub xml_path: PathBuf,
    pub zip_path: PathBuf,
    pub archive: Vec<u8>,
}

/// Compress the XML into a single-entry zip held in memory.
pub fn archive_xml(file_name: &str, xml: &str) -> Result<Vec<u8>, AtsError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));
    writer
        .start_file(file_name, options)
        .map_err(|e| AtsError::Archive(e.to_string()))?;
    writer.write_all(xml.as_bytes())?;
    let cursor = writer
        .finish()
        .map_err(|e| AtsError::Archive(e.to_string()))?;
    Ok(cursor.into_inner())
}

/// Write the XML and its archive under the tenant's directory.
pub fn write_artifacts(
    output_root: &Path,
    ruc: &str,
    period: FiscalPeriod,
    xml: &str,
) -> Result<Artifacts, AtsError> {
    let dir = output_root.join(ruc);
    fs::create_dir_all(&dir)?;

    let xml_name = format!("ATS{}.xml", period.file_suffix());
    let xml_path = dir.join(&xml_name);
    fs::write(&xml_path, xml.as_bytes())?;

    let archive = archive_xml(&xml_name, xml)?;
    let zip_path = dir.join(format!("AT{}.zip", period.file_suffix()));
    fs::write(&zip_path, &archive)?;

    Ok(Artifacts {
        xml_path,
        zip_path,
        archive,
    })
}
