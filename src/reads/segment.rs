//! Segment-level alignment representation (C2).
//!
//! A `SegmentDecoder` walks one alignment record's CIGAR (and, where
//! present, its `MD` tag) and turns it into a flat list of `AlignmentSegment`
//! values: one per run of matches, one per mismatched base, one per
//! insertion, one per deletion, one per clip. Everything downstream (the
//! per-base accumulator, C3) consumes this uniform representation and never
//! has to look at a CIGAR again.

use rust_htslib::bam::record::Cigar;

/// Which decoding rule applies to a record, decided once up front instead of
/// branching per-segment. `rust-htslib`'s `Cigar::Equal`/`Cigar::Diff` already
/// carry mismatch information directly in the CIGAR, so that dialect never
/// consults `MD` even when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarDialect {
    /// `M`-only CIGAR with an `MD` tag: segments come from walking both in
    /// lockstep.
    MatchWithMd,
    /// `M`-only CIGAR with no `MD` tag: mismatches are found by comparing
    /// each aligned base against the reference array already built for this
    /// block.
    MatchNoMd,
    /// CIGAR already spells mismatches out via `=`/`X` operators.
    EqualDiff,
}

impl CigarDialect {
    pub fn detect(cigar: &[Cigar], has_md: bool) -> crate::errors::Result<CigarDialect> {
        let has_eqx = cigar.iter().any(|c| matches!(c, Cigar::Equal(_) | Cigar::Diff(_)));
        if has_eqx {
            return Ok(CigarDialect::EqualDiff);
        }
        let has_m = cigar.iter().any(|c| matches!(c, Cigar::Match(_)));
        if has_m && has_md {
            return Ok(CigarDialect::MatchWithMd);
        }
        if has_m {
            return Ok(CigarDialect::MatchNoMd);
        }
        Err(crate::errors::DetectError::unsupported_cigar(
            "CigarDialect::detect",
            "cigar contains neither M nor =/X operators",
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentOp {
    Match,
    Mismatch,
    Ins,
    Del,
    Clip { hard: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentPayload {
    None,
    /// Inserted or deleted reference/read bases, in reference orientation.
    Bases(Vec<u8>),
    /// A single mismatching observed base.
    Base(u8),
    /// Clip length; kept as the run length rather than the base payload,
    /// matching what the clip reconciler needs downstream.
    ClipLen(u32),
}

/// One contiguous run of one alignment operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentSegment {
    /// 1-based reference position of the first base this segment touches.
    /// For an insertion or a clip this is the reference position it is
    /// anchored to (the base immediately before/after the event).
    pub start_ref_pos: i64,
    /// 1-based query (read) position of the first base this segment
    /// consumes, or of the anchor base for a pure reference-consuming op.
    pub start_query_pos: i64,
    pub seg_len: i64,
    pub op: SegmentOp,
    pub payload: SegmentPayload,
}
