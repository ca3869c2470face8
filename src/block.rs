//! Block tiling and the per-block window pipeline (C7).
//!
//! A block is the unit of parallel work: it owns one `BlockAccumulator` and
//! walks that block's windows end to end (classify -> mis-align filter ->
//! extract -> merge) without touching any other block's data. Adjacent
//! blocks share a `2 * slide_size` overlap purely so each block's edge
//! windows have real flanking coverage; exactly one side of each shared
//! overlap actually emits windows over it (see `head_ign_flag`/
//! `tail_ign_flag` below), so every position is windowed exactly once.

use crate::candidates::{CandidateExtractor, CandidateRegion};
use crate::config::DetectParams;
use crate::errors::Result;
use crate::evidence::BlockAccumulator;
use crate::window::{MisAlignFilter, MisAlignReg, Region, RegionKind, WindowClassifier};

#[derive(Debug, Clone, Copy)]
pub struct BlockSpec {
    pub start_pos: i64,
    pub end_pos: i64,
    /// True unless this is the chromosome's first block: skip emitting a
    /// window over this block's own first `2 * slide_size` bases, because
    /// the previous block's windows already reached across that span.
    pub head_ign_flag: bool,
    /// True unless this is the chromosome's last block: skip emitting a
    /// window over this block's own last `2 * slide_size` bases, leaving
    /// that span to the next block's windows.
    pub tail_ign_flag: bool,
}

/// Partitions `[1, chrom_len]` into blocks of `block_size` with an exact
/// `2 * slide_size` overlap between neighbors; the final block is truncated
/// so it ends exactly at `chrom_len`.
pub fn tile_chromosome(chrom_len: i64, block_size: i64, slide_size: i64) -> Vec<BlockSpec> {
    let overlap = 2 * slide_size;
    let mut blocks = Vec::new();
    let mut start = 1i64;
    loop {
        let mut end = start + block_size - 1;
        let is_tail = end >= chrom_len;
        if is_tail {
            end = chrom_len;
        }
        blocks.push(BlockSpec { start_pos: start, end_pos: end, head_ign_flag: start != 1, tail_ign_flag: !is_tail });
        if is_tail {
            break;
        }
        start = end - overlap + 1;
    }
    blocks
}

fn window_bounds(spec: &BlockSpec, slide_size: i64) -> Vec<(i64, i64, RegionKind)> {
    let mut out = Vec::new();
    let win_w = 3 * slide_size;

    let mut cursor = if spec.head_ign_flag {
        spec.start_pos + 2 * slide_size
    } else {
        let head_end = spec.start_pos + 2 * slide_size - 1;
        out.push((spec.start_pos, head_end, RegionKind::Head));
        spec.start_pos + slide_size
    };

    let last_start_limit = if spec.tail_ign_flag {
        spec.end_pos - 2 * slide_size - win_w + 1
    } else {
        spec.end_pos - win_w + 1
    };
    while cursor <= last_start_limit {
        out.push((cursor, cursor + win_w - 1, RegionKind::Inner));
        cursor += slide_size;
    }

    if !spec.tail_ign_flag {
        let tail_start = spec.end_pos - 2 * slide_size + 1;
        out.push((tail_start, spec.end_pos, RegionKind::Tail));
    }
    out
}

#[derive(Debug, Default)]
pub struct BlockResult {
    pub indel_regions: Vec<CandidateRegion>,
    pub snv_positions: Vec<i64>,
    pub clip_regions: Vec<CandidateRegion>,
    pub mis_aln_regions: Vec<MisAlignReg>,
}

pub struct BlockOrchestrator<'a> {
    pub params: &'a DetectParams,
}

impl<'a> BlockOrchestrator<'a> {
    pub fn new(params: &'a DetectParams) -> Self {
        BlockOrchestrator { params }
    }

    pub fn process(&self, chrname: &str, spec: &BlockSpec, accumulator: &BlockAccumulator) -> Result<BlockResult> {
        let bounds = window_bounds(spec, self.params.slide_size);
        let classifier = WindowClassifier::from_params(self.params);
        let extractor = CandidateExtractor::from_params(self.params);

        let mut mis_aln_regs = Vec::with_capacity(bounds.len());
        let mut regions = Vec::with_capacity(bounds.len());
        for (start_r, end_r, kind) in &bounds {
            let lo = (*start_r - accumulator.start_pos) as usize;
            let hi = (*end_r - accumulator.start_pos) as usize;
            let region = Region::new(chrname, *start_r, *end_r, &accumulator.bases[lo..=hi], *kind, self.params.slide_size);
            if region.whole_ref_gap() {
                regions.push(None);
                mis_aln_regs.push(None);
                continue;
            }
            let sig = classifier.classify(&region);
            mis_aln_regs.push(Some(MisAlignReg::from_signature(region.start_mid_pos, region.end_mid_pos, &sig)));
            regions.push(Some(region));
        }

        let mut committed: Vec<MisAlignReg> = mis_aln_regs.iter().filter_map(|r| *r).collect();
        let filter = MisAlignFilter::from_params(self.params);
        filter.extract_runs(&mut committed);

        let mut indel_regions = Vec::new();
        let mut snv_positions = Vec::new();
        let mut clip_regions = Vec::new();
        for region in regions.into_iter().flatten() {
            if self.params.mask_misaln_regions
                && committed.iter().any(|m| m.start_r_pos <= region.end_mid_pos && region.start_mid_pos <= m.end_r_pos)
            {
                continue;
            }
            let window_candidates = extractor.extract_window(&region);
            indel_regions.extend(window_candidates.indel_regions);
            snv_positions.extend(window_candidates.snv_positions);
            clip_regions.extend(window_candidates.clip_regions);
        }

        let indel_regions = extractor.merge_regions(indel_regions);
        let clip_regions = extractor.merge_regions(clip_regions);
        snv_positions.sort_unstable();
        snv_positions.dedup();
        extractor.retain_snvs_outside_indels(&indel_regions, &mut snv_positions, chrname);

        Ok(BlockResult { indel_regions, snv_positions, clip_regions, mis_aln_regions: committed })
    }
}
