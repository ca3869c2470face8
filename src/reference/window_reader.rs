//! Reference-window access for a block (C1).
//!
//! Every character the detector will ever index against is validated once,
//! here, up front — `A/C/G/T/N` and IUPAC ambiguity codes are accepted (the
//! accumulator treats ambiguity codes as positions that can carry no
//! coverage), anything else fails the whole block immediately.

use crate::errors::{DetectError, Result};
use crate::sources::ReferenceSource;

const VALID_BASES: &[u8] = b"ACGTNRYSWKMBDHV";

pub struct ReferenceWindow;

impl ReferenceWindow {
    /// Fetches `[start, end]` plus, where the chromosome extends past the
    /// window, the single base immediately outside each end — needed to
    /// polymer-flag the window's own first and last positions.
    pub fn fetch(source: &dyn ReferenceSource, chrname: &str, start: i64, end: i64) -> Result<(Vec<u8>, Option<u8>, Option<u8>)> {
        let bases = source.fetch(chrname, start, end)?;
        for (offset, &b) in bases.iter().enumerate() {
            if !VALID_BASES.contains(&b.to_ascii_uppercase()) {
                return Err(DetectError::invalid_reference(
                    "ReferenceWindow::fetch",
                    format!("{}:{} has unrecognized base {:?}", chrname, start + offset as i64, b as char),
                ));
            }
        }
        let chrom_len = source.chrom_len(chrname)?;
        let left_flank = if start > 1 { Some(fetch_one(source, chrname, start - 1)?) } else { None };
        let right_flank = if end < chrom_len { Some(fetch_one(source, chrname, end + 1)?) } else { None };
        Ok((bases, left_flank, right_flank))
    }
}

fn fetch_one(source: &dyn ReferenceSource, chrname: &str, pos: i64) -> Result<u8> {
    let bases = source.fetch(chrname, pos, pos)?;
    let base = *bases
        .first()
        .ok_or_else(|| DetectError::invalid_reference("ReferenceWindow::fetch", format!("{}:{} flank base missing", chrname, pos)))?;
    if !VALID_BASES.contains(&base.to_ascii_uppercase()) {
        return Err(DetectError::invalid_reference(
            "ReferenceWindow::fetch",
            format!("{}:{} has unrecognized base {:?}", chrname, pos, base as char),
        ));
    }
    Ok(base)
}
