//! Compaction of voided documents into contiguous sequential ranges.

use serde::{Deserialize, Serialize};

use crate::core::VoidedDocumentStub;

/// One `detalleAnulados` entry: a maximal run of consecutive sequentials
/// voided under the same document type, establishment and emission point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoidedRange {
    /// `tipoComprobante`.
    pub document_type: String,
    /// `establecimiento`, 3 digits.
    pub establishment: String,
    /// `puntoEmision`, 3 digits.
    pub point_of_emission: String,
    /// `secuencialInicio`.
    pub start: u64,
    /// `secuencialFin`.
    pub end: u64,
    /// `autorizacion`, taken from the first stub of the run.
    pub authorization: String,
}

/// Compact voided stubs into maximal contiguous ranges.
///
/// Stubs are sorted by (document type, establishment, emission point,
/// sequential); a range ends when that key triple changes or the next
/// sequential is not exactly one past the current end. Unparseable
/// sequentials degrade to 0 instead of failing the run. The authorization
/// kept for a range is the first stub's; take-first again, as with the sale
/// groups.
pub fn compact_voided(stubs: &[VoidedDocumentStub]) -> Vec<VoidedRange> {
    let mut ordered: Vec<(&VoidedDocumentStub, u64)> = stubs
        .iter()
        .map(|s| (s, s.document.sequential.parse::<u64>().unwrap_or(0)))
        .collect();
    ordered.sort_by(|(a, a_seq), (b, b_seq)| {
        (
            &a.document_type,
            &a.document.establishment,
            &a.document.point_of_emission,
            a_seq,
        )
            .cmp(&(
                &b.document_type,
                &b.document.establishment,
                &b.document.point_of_emission,
                b_seq,
            ))
    });

    let mut ranges: Vec<VoidedRange> = Vec::new();
    for (stub, sequential) in ordered {
        let extends = ranges.last().is_some_and(|r| {
            r.document_type == stub.document_type
                && r.establishment == stub.document.establishment
                && r.point_of_emission == stub.document.point_of_emission
                && sequential == r.end + 1
        });
        if extends {
            if let Some(range) = ranges.last_mut() {
                range.end = sequential;
            }
        } else {
            ranges.push(VoidedRange {
                document_type: stub.document_type.clone(),
                establishment: stub.document.establishment.clone(),
                point_of_emission: stub.document.point_of_emission.clone(),
                start: sequential,
                end: sequential,
                authorization: stub.document.authorization.clone(),
            });
        }
    }
    ranges
}
