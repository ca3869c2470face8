//! Block-scoped per-base evidence accumulator (C3).
//!
//! Owns one dense `Base` array covering `[start_pos, end_pos]` and folds in
//! one alignment record at a time. Each record is decoded once via
//! `SegmentDecoder`, then every segment updates the counters/event lists of
//! the bases it touches. `finalize` derives the per-base consensus-indel
//! fields once ingestion is done.

use crate::errors::{DetectError, Result};
use crate::reads::{AlnRecord, RefBaseLookup, SegmentDecoder, SegmentOp, SegmentPayload};

use super::base::{base_char_idx, homopolymer_leading_base, Base, ConIndelType};

pub struct BlockAccumulator {
    pub chrname: String,
    pub start_pos: i64,
    pub end_pos: i64,
    pub bases: Vec<Base>,
    left_flank: Option<u8>,
    right_flank: Option<u8>,
    min_ins_size_filt: u32,
    min_del_size_filt: u32,
    min_clip_size_filt: u32,
}

impl BlockAccumulator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chrname: impl Into<String>,
        start_pos: i64,
        end_pos: i64,
        ref_bases: &[u8],
        left_flank: Option<u8>,
        right_flank: Option<u8>,
        min_ins_size_filt: u32,
        min_del_size_filt: u32,
        min_clip_size_filt: u32,
    ) -> Result<Self> {
        let expected_len = (end_pos - start_pos + 1) as usize;
        if ref_bases.len() != expected_len {
            return Err(DetectError::invalid_reference(
                "BlockAccumulator::new",
                format!("expected {} reference bases, got {}", expected_len, ref_bases.len()),
            ));
        }
        let bases = ref_bases.iter().map(|&c| Base::new(c)).collect();
        Ok(BlockAccumulator {
            chrname: chrname.into(),
            start_pos,
            end_pos,
            bases,
            left_flank,
            right_flank,
            min_ins_size_filt,
            min_del_size_filt,
            min_clip_size_filt,
        })
    }

    fn idx(&self, pos1: i64) -> Option<usize> {
        if pos1 >= self.start_pos && pos1 <= self.end_pos {
            Some((pos1 - self.start_pos) as usize)
        } else {
            None
        }
    }

    pub fn ingest(&mut self, record: &AlnRecord) -> Result<()> {
        let segments = SegmentDecoder::decode(record, self)?;
        for seg in &segments {
            match seg.op {
                SegmentOp::Match => {
                    for p in seg.start_ref_pos..seg.start_ref_pos + seg.seg_len {
                        if let Some(i) = self.idx(p) {
                            let ref_idx = self.bases[i].ref_base.idx().ok_or_else(|| {
                                DetectError::reference_corrupt(
                                    "BlockAccumulator::ingest",
                                    format!("aligned base at ambiguous reference position {}", p),
                                )
                            })?;
                            self.bases[i].num_bases[ref_idx] += 1;
                        }
                    }
                }
                SegmentOp::Mismatch => {
                    if let Some(i) = self.idx(seg.start_ref_pos) {
                        let observed = match &seg.payload {
                            SegmentPayload::Base(b) => *b,
                            _ => {
                                return Err(DetectError::alignment_corrupt(
                                    "BlockAccumulator::ingest",
                                    "mismatch segment missing observed base payload",
                                ))
                            }
                        };
                        let obs_idx = base_char_idx(observed).ok_or_else(|| {
                            DetectError::alignment_corrupt(
                                "BlockAccumulator::ingest",
                                format!("observed base {:?} is not A/C/G/T/N", observed as char),
                            )
                        })?;
                        self.bases[i].num_bases[obs_idx] += 1;
                    }
                }
                SegmentOp::Ins => {
                    if let Some(i) = self.idx(seg.start_ref_pos) {
                        let bases = match &seg.payload {
                            SegmentPayload::Bases(b) => b.clone(),
                            _ => Vec::new(),
                        };
                        if seg.seg_len as u32 >= self.min_ins_size_filt {
                            self.bases[i].ins_events.push(super::base::InsEvent { pos: seg.start_ref_pos, seq: bases });
                        } else {
                            self.bases[i].num_short_ins += 1;
                        }
                    }
                }
                SegmentOp::Del => {
                    let bases = match &seg.payload {
                        SegmentPayload::Bases(b) => b.clone(),
                        _ => Vec::new(),
                    };
                    let qualifies = seg.seg_len as u32 >= self.min_del_size_filt;
                    let lo = seg.start_ref_pos.max(self.start_pos);
                    let hi = (seg.start_ref_pos + seg.seg_len - 1).min(self.end_pos);
                    if lo > hi {
                        continue;
                    }
                    if qualifies {
                        if let Some(i) = self.idx(lo) {
                            self.bases[i].del_events.push(super::base::DelEvent { pos: lo, seq: bases });
                        }
                        for p in lo..=hi {
                            if let Some(i) = self.idx(p) {
                                self.bases[i].del_span_count += 1;
                            }
                        }
                    } else if let Some(i) = self.idx(lo) {
                        self.bases[i].num_short_del += 1;
                    }
                }
                SegmentOp::Clip { hard } => {
                    if seg.seg_len as u32 >= self.min_clip_size_filt {
                        if let Some(i) = self.idx(seg.start_ref_pos) {
                            self.bases[i].clip_events.push(super::base::ClipEvent {
                                pos: seg.start_ref_pos,
                                hard,
                                left_end: seg.start_query_pos == 1,
                                length: seg.seg_len as u32,
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Computes derived per-base fields: total coverage, polymer context and
    /// the consensus-indel summary used by window classification.
    pub fn finalize(&mut self) {
        for base in &mut self.bases {
            base.num_bases[5] = base.num_bases[0..5].iter().sum();
        }
        compute_polymer_flags(&mut self.bases, self.left_flank, self.right_flank);
        for base in &mut self.bases {
            let ins_max = bucket_ins_max(&base.ins_events);
            let del_total = base.del_span_count + base.num_short_del;
            if ins_max == 0 && del_total == 0 {
                base.max_con_type = ConIndelType::Unused;
                base.max_con_indel_num = 0;
                base.max_con_indel_ratio = 0.0;
                continue;
            }
            let (con_type, con_num) = if ins_max > del_total {
                (ConIndelType::Insertion, ins_max)
            } else {
                (ConIndelType::Deletion, del_total)
            };
            base.max_con_type = con_type;
            base.max_con_indel_num = con_num;
            let denom = base.total_coverage() + base.del_span_count + base.num_short_del;
            base.max_con_indel_ratio = if denom > 0 { con_num as f32 / denom as f32 } else { 0.0 };
        }
    }
}

impl RefBaseLookup for BlockAccumulator {
    fn ref_base_at(&self, pos1: i64) -> Option<u8> {
        self.idx(pos1).map(|i| self.bases[i].ref_char)
    }
}

/// A base is flagged iff its reference character equals the base on either
/// side of it. Inner positions compare against their block neighbours; the
/// block's first and last positions fall back to the flank base fetched from
/// outside the block when one is available (no flank at a chromosome end).
fn compute_polymer_flags(bases: &mut [Base], left_flank: Option<u8>, right_flank: Option<u8>) {
    let n = bases.len();
    if n == 0 {
        return;
    }
    let ref_chars: Vec<u8> = bases.iter().map(|b| b.ref_char.to_ascii_uppercase()).collect();
    for i in 0..n {
        let this = ref_chars[i];
        let left_eq = if i > 0 {
            ref_chars[i - 1] == this
        } else {
            left_flank.map(|b| b.to_ascii_uppercase() == this).unwrap_or(false)
        };
        let right_eq = if i + 1 < n {
            ref_chars[i + 1] == this
        } else {
            right_flank.map(|b| b.to_ascii_uppercase() == this).unwrap_or(false)
        };
        if left_eq || right_eq {
            bases[i].polymer_flag = true;
        }
    }
}

/// Size of the largest bucket of insertion events at one position, where two
/// events bucket together when their payloads are byte-identical or both are
/// homopolymer runs that start with the same base.
fn bucket_ins_max(events: &[super::base::InsEvent]) -> u32 {
    let n = events.len();
    if n == 0 {
        return 0;
    }
    let mut used = vec![false; n];
    let mut best = 0u32;
    for i in 0..n {
        if used[i] {
            continue;
        }
        used[i] = true;
        let mut count = 1u32;
        let homopolymer_i = homopolymer_leading_base(&events[i].seq);
        for (j, event) in events.iter().enumerate().skip(i + 1) {
            if used[j] {
                continue;
            }
            let same = event.seq == events[i].seq
                || (homopolymer_i.is_some() && homopolymer_i == homopolymer_leading_base(&event.seq));
            if same {
                used[j] = true;
                count += 1;
            }
        }
        best = best.max(count);
    }
    best
}
