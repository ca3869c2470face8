//! Decodes one alignment record's CIGAR (+ optional `MD`) into
//! `AlignmentSegment`s, dispatching on `CigarDialect` so the three decoding
//! rules never have to guess which one applies mid-walk.

use rust_htslib::bam::record::Cigar;

use crate::errors::{DetectError, Result};
use super::segment::{AlignmentSegment, CigarDialect, SegmentOp, SegmentPayload};

/// Looks up the reference base already known for a 1-based reference
/// position. Implemented by the block accumulator so the `MatchNoMd` dialect
/// can compare read bases against the reference without re-reading FASTA.
pub trait RefBaseLookup {
    fn ref_base_at(&self, pos1: i64) -> Option<u8>;
}

/// A narrow, decoder-facing view of one alignment record. Built by the
/// `AlignmentSource` adapter from a `rust_htslib::bam::Record`; kept
/// independent of the live record so tests can construct one directly.
#[derive(Debug, Clone)]
pub struct AlnRecord {
    /// 0-based leftmost reference position of the first reference-consuming
    /// CIGAR operation (BAM convention).
    pub pos0: i64,
    pub cigar: Vec<Cigar>,
    pub md: Option<String>,
    /// Upper-case read bases, length equal to the query length implied by
    /// the CIGAR's read-consuming ops (hard-clipped bases are never
    /// present, matching what `rust-htslib` returns from `record.seq()`).
    pub seq: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
enum MdOp {
    Match(u32),
    Mismatch(u8),
}

fn parse_md(md: &str) -> Result<Vec<MdOpOrDel>> {
    let bytes = md.as_bytes();
    let mut i = 0;
    let mut ops = Vec::new();
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let num: u32 = md[start..i].parse().map_err(|_| {
                DetectError::unsupported_cigar("parse_md", format!("bad number in MD {:?}", md))
            })?;
            ops.push(MdOpOrDel::Op(MdOp::Match(num)));
        } else if bytes[i] == b'^' {
            i += 1;
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                i += 1;
            }
            ops.push(MdOpOrDel::Del(bytes[start..i].to_vec()));
        } else if bytes[i].is_ascii_alphabetic() {
            ops.push(MdOpOrDel::Op(MdOp::Mismatch(bytes[i])));
            i += 1;
        } else {
            return Err(DetectError::unsupported_cigar(
                "parse_md",
                format!("unexpected character in MD {:?}", md),
            ));
        }
    }
    Ok(ops)
}

#[derive(Debug, Clone)]
enum MdOpOrDel {
    Op(MdOp),
    Del(Vec<u8>),
}

struct MdCursor {
    ops: Vec<MdOpOrDel>,
    idx: usize,
    match_remaining: u32,
}

impl MdCursor {
    fn new(ops: Vec<MdOpOrDel>) -> Self {
        let mut cur = MdCursor { ops, idx: 0, match_remaining: 0 };
        cur.load();
        cur
    }

    fn load(&mut self) {
        while self.idx < self.ops.len() {
            if let MdOpOrDel::Op(MdOp::Match(n)) = self.ops[self.idx] {
                if n == 0 {
                    self.idx += 1;
                    continue;
                }
                self.match_remaining = n;
            }
            return;
        }
    }

    fn take_matches(&mut self, want: u32) -> u32 {
        if self.match_remaining == 0 {
            return 0;
        }
        let take = want.min(self.match_remaining);
        self.match_remaining -= take;
        if self.match_remaining == 0 {
            self.idx += 1;
            self.load();
        }
        take
    }

    fn peek_mismatch(&self) -> Option<u8> {
        if self.match_remaining > 0 {
            return None;
        }
        match self.ops.get(self.idx) {
            Some(MdOpOrDel::Op(MdOp::Mismatch(b))) => Some(*b),
            _ => None,
        }
    }

    fn take_mismatch(&mut self) -> u8 {
        let b = self.peek_mismatch().expect("take_mismatch called without a pending mismatch");
        self.idx += 1;
        self.load();
        b
    }

    fn take_del(&mut self, expect_len: usize) -> Result<Vec<u8>> {
        if self.match_remaining != 0 {
            return Err(DetectError::alignment_corrupt(
                "MdCursor::take_del",
                "MD deletion marker did not align with cigar D op",
            ));
        }
        match self.ops.get(self.idx).cloned() {
            Some(MdOpOrDel::Del(bases)) if bases.len() == expect_len => {
                self.idx += 1;
                self.load();
                Ok(bases)
            }
            _ => Err(DetectError::alignment_corrupt(
                "MdCursor::take_del",
                "MD deletion marker length mismatch with cigar D op",
            )),
        }
    }
}

pub struct SegmentDecoder;

impl SegmentDecoder {
    pub fn decode(record: &AlnRecord, ref_lookup: &dyn RefBaseLookup) -> Result<Vec<AlignmentSegment>> {
        let dialect = CigarDialect::detect(&record.cigar, record.md.is_some())?;
        match dialect {
            CigarDialect::MatchWithMd => Self::decode_with_md(record),
            CigarDialect::MatchNoMd => Self::decode_no_md(record, ref_lookup),
            CigarDialect::EqualDiff => Self::decode_eqx(record, ref_lookup),
        }
    }

    fn decode_with_md(record: &AlnRecord) -> Result<Vec<AlignmentSegment>> {
        let md_str = record.md.as_ref().expect("MatchWithMd dialect requires MD");
        let mut md = MdCursor::new(parse_md(md_str)?);

        let mut segments = Vec::new();
        let mut ref_pos = record.pos0 + 1;
        let mut query_pos: i64 = 1;

        for cig in &record.cigar {
            match cig {
                Cigar::Match(len) => {
                    let mut remaining = *len;
                    while remaining > 0 {
                        let took = md.take_matches(remaining);
                        if took > 0 {
                            segments.push(AlignmentSegment {
                                start_ref_pos: ref_pos,
                                start_query_pos: query_pos,
                                seg_len: took as i64,
                                op: SegmentOp::Match,
                                payload: SegmentPayload::None,
                            });
                            ref_pos += took as i64;
                            query_pos += took as i64;
                            remaining -= took;
                            continue;
                        }
                        if md.peek_mismatch().is_some() {
                            md.take_mismatch();
                            let observed = *record.seq.get((query_pos - 1) as usize).ok_or_else(|| {
                                DetectError::alignment_corrupt(
                                    "SegmentDecoder::decode_with_md",
                                    "query position beyond read sequence length",
                                )
                            })?;
                            segments.push(AlignmentSegment {
                                start_ref_pos: ref_pos,
                                start_query_pos: query_pos,
                                seg_len: 1,
                                op: SegmentOp::Mismatch,
                                payload: SegmentPayload::Base(observed),
                            });
                            ref_pos += 1;
                            query_pos += 1;
                            remaining -= 1;
                            continue;
                        }
                        return Err(DetectError::alignment_corrupt(
                            "SegmentDecoder::decode_with_md",
                            "MD tag exhausted before cigar M run finished",
                        ));
                    }
                }
                Cigar::Ins(len) => {
                    let bases = read_slice(&record.seq, query_pos, *len, "SegmentDecoder::decode_with_md")?;
                    segments.push(AlignmentSegment {
                        start_ref_pos: ref_pos,
                        start_query_pos: query_pos,
                        seg_len: *len as i64,
                        op: SegmentOp::Ins,
                        payload: SegmentPayload::Bases(bases),
                    });
                    query_pos += *len as i64;
                }
                Cigar::Del(len) => {
                    // MD already names the deleted bases; cross-check against
                    // the reference array rather than trusting MD blindly.
                    let md_bases = md.take_del(*len as usize)?;
                    segments.push(AlignmentSegment {
                        start_ref_pos: ref_pos,
                        start_query_pos: query_pos,
                        seg_len: *len as i64,
                        op: SegmentOp::Del,
                        payload: SegmentPayload::Bases(md_bases),
                    });
                    ref_pos += *len as i64;
                }
                Cigar::SoftClip(len) => {
                    push_clip(&mut segments, ref_pos, query_pos, *len, false);
                    query_pos += *len as i64;
                }
                Cigar::HardClip(len) => {
                    push_clip(&mut segments, ref_pos, query_pos, *len, true);
                }
                Cigar::RefSkip(_) => {
                    return Err(DetectError::unsupported_cigar(
                        "SegmentDecoder::decode_with_md",
                        "N operator is not supported",
                    ));
                }
                Cigar::Pad(_) => {
                    return Err(DetectError::unsupported_cigar(
                        "SegmentDecoder::decode_with_md",
                        "P operator is not supported",
                    ));
                }
                Cigar::Equal(_) | Cigar::Diff(_) => {
                    return Err(DetectError::unsupported_cigar(
                        "SegmentDecoder::decode_with_md",
                        "=/X operator present in an MD-dialect cigar",
                    ));
                }
            }
        }
        Ok(segments)
    }

    fn decode_no_md(record: &AlnRecord, ref_lookup: &dyn RefBaseLookup) -> Result<Vec<AlignmentSegment>> {
        let mut segments = Vec::new();
        let mut ref_pos = record.pos0 + 1;
        let mut query_pos: i64 = 1;

        for cig in &record.cigar {
            match cig {
                Cigar::Match(len) => {
                    let mut run_start_ref = ref_pos;
                    let mut run_start_query = query_pos;
                    let mut run_len: i64 = 0;
                    for _ in 0..*len {
                        let observed = *record.seq.get((query_pos - 1) as usize).ok_or_else(|| {
                            DetectError::alignment_corrupt(
                                "SegmentDecoder::decode_no_md",
                                "query position beyond read sequence length",
                            )
                        })?;
                        let refb = ref_lookup.ref_base_at(ref_pos).ok_or_else(|| {
                            DetectError::reference_corrupt(
                                "SegmentDecoder::decode_no_md",
                                format!("no reference base known at position {}", ref_pos),
                            )
                        })?;
                        if observed.to_ascii_uppercase() == refb.to_ascii_uppercase() {
                            if run_len == 0 {
                                run_start_ref = ref_pos;
                                run_start_query = query_pos;
                            }
                            run_len += 1;
                        } else {
                            if run_len > 0 {
                                segments.push(AlignmentSegment {
                                    start_ref_pos: run_start_ref,
                                    start_query_pos: run_start_query,
                                    seg_len: run_len,
                                    op: SegmentOp::Match,
                                    payload: SegmentPayload::None,
                                });
                                run_len = 0;
                            }
                            segments.push(AlignmentSegment {
                                start_ref_pos: ref_pos,
                                start_query_pos: query_pos,
                                seg_len: 1,
                                op: SegmentOp::Mismatch,
                                payload: SegmentPayload::Base(observed),
                            });
                        }
                        ref_pos += 1;
                        query_pos += 1;
                    }
                    if run_len > 0 {
                        segments.push(AlignmentSegment {
                            start_ref_pos: run_start_ref,
                            start_query_pos: run_start_query,
                            seg_len: run_len,
                            op: SegmentOp::Match,
                            payload: SegmentPayload::None,
                        });
                    }
                }
                _ => handle_non_m_op(cig, &record.seq, ref_lookup, &mut ref_pos, &mut query_pos, &mut segments, "SegmentDecoder::decode_no_md")?,
            }
        }
        Ok(segments)
    }

    fn decode_eqx(record: &AlnRecord, ref_lookup: &dyn RefBaseLookup) -> Result<Vec<AlignmentSegment>> {
        let mut segments = Vec::new();
        let mut ref_pos = record.pos0 + 1;
        let mut query_pos: i64 = 1;

        for cig in &record.cigar {
            match cig {
                Cigar::Equal(len) => {
                    segments.push(AlignmentSegment {
                        start_ref_pos: ref_pos,
                        start_query_pos: query_pos,
                        seg_len: *len as i64,
                        op: SegmentOp::Match,
                        payload: SegmentPayload::None,
                    });
                    ref_pos += *len as i64;
                    query_pos += *len as i64;
                }
                Cigar::Diff(len) => {
                    for k in 0..*len {
                        let observed = *record.seq.get((query_pos - 1) as usize).ok_or_else(|| {
                            DetectError::alignment_corrupt(
                                "SegmentDecoder::decode_eqx",
                                "query position beyond read sequence length",
                            )
                        })?;
                        segments.push(AlignmentSegment {
                            start_ref_pos: ref_pos,
                            start_query_pos: query_pos,
                            seg_len: 1,
                            op: SegmentOp::Mismatch,
                            payload: SegmentPayload::Base(observed),
                        });
                        ref_pos += 1;
                        query_pos += 1;
                        let _ = k;
                    }
                }
                Cigar::Match(_) => {
                    return Err(DetectError::unsupported_cigar(
                        "SegmentDecoder::decode_eqx",
                        "M operator present in an =/X-dialect cigar",
                    ));
                }
                _ => handle_non_m_op(cig, &record.seq, ref_lookup, &mut ref_pos, &mut query_pos, &mut segments, "SegmentDecoder::decode_eqx")?,
            }
        }
        Ok(segments)
    }
}

fn read_slice(seq: &[u8], query_pos: i64, len: u32, function: &'static str) -> Result<Vec<u8>> {
    let start = (query_pos - 1) as usize;
    let end = start + len as usize;
    seq.get(start..end)
        .map(|s| s.to_vec())
        .ok_or_else(|| DetectError::alignment_corrupt(function, "insertion runs past end of read sequence"))
}

fn push_clip(segments: &mut Vec<AlignmentSegment>, ref_pos: i64, query_pos: i64, len: u32, hard: bool) {
    // A clip encountered with query_pos == 1 is the read's leading clip and
    // anchors to the first aligned base (ref_pos, unmodified). A clip
    // encountered after alignment has already consumed reference bases is
    // the trailing clip and anchors to the last aligned base (ref_pos - 1).
    let anchor = if query_pos == 1 { ref_pos } else { ref_pos - 1 };
    segments.push(AlignmentSegment {
        start_ref_pos: anchor,
        start_query_pos: query_pos,
        seg_len: len as i64,
        op: SegmentOp::Clip { hard },
        payload: SegmentPayload::ClipLen(len),
    });
}

fn handle_non_m_op(
    cig: &Cigar,
    seq: &[u8],
    ref_lookup: &dyn RefBaseLookup,
    ref_pos: &mut i64,
    query_pos: &mut i64,
    segments: &mut Vec<AlignmentSegment>,
    function: &'static str,
) -> Result<()> {
    match cig {
        Cigar::Ins(len) => {
            let bases = read_slice(seq, *query_pos, *len, function)?;
            segments.push(AlignmentSegment {
                start_ref_pos: *ref_pos,
                start_query_pos: *query_pos,
                seg_len: *len as i64,
                op: SegmentOp::Ins,
                payload: SegmentPayload::Bases(bases),
            });
            *query_pos += *len as i64;
        }
        Cigar::Del(len) => {
            let bases: Vec<u8> = (0..*len as i64).map(|k| ref_lookup.ref_base_at(*ref_pos + k).unwrap_or(b'N')).collect();
            segments.push(AlignmentSegment {
                start_ref_pos: *ref_pos,
                start_query_pos: *query_pos,
                seg_len: *len as i64,
                op: SegmentOp::Del,
                payload: SegmentPayload::Bases(bases),
            });
            *ref_pos += *len as i64;
        }
        Cigar::SoftClip(len) => {
            push_clip(segments, *ref_pos, *query_pos, *len, false);
            *query_pos += *len as i64;
        }
        Cigar::HardClip(len) => {
            push_clip(segments, *ref_pos, *query_pos, *len, true);
        }
        Cigar::RefSkip(_) => {
            return Err(DetectError::unsupported_cigar(function, "N operator is not supported"));
        }
        Cigar::Pad(_) => {
            return Err(DetectError::unsupported_cigar(function, "P operator is not supported"));
        }
        Cigar::Match(_) | Cigar::Equal(_) | Cigar::Diff(_) => {
            return Err(DetectError::unsupported_cigar(function, "unexpected match-class op in non-M branch"));
        }
    }
    Ok(())
}
