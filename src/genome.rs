//! Chromosome-level orchestration and mate-clip reconciliation (C8).
//!
//! Blocks run in parallel via `rayon`; once every block for a chromosome has
//! returned, the (deterministic, single-threaded) mate-clip reconciler pairs
//! up high-clip regions into typed SV records and removes any indel/SNV
//! candidate that falls inside confirmed mated-clip territory.

use std::io::Write;
use std::sync::{Mutex, OnceLock};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::block::{tile_chromosome, BlockOrchestrator, BlockResult};
use crate::candidates::{CandidateExtractor, CandidateRegion, RegionArena, RegionId, SvType};
use crate::config::DetectParams;
use crate::errors::{DetectError, Result};
use crate::evidence::BlockAccumulator;
use crate::reference::ReferenceWindow;
use crate::sink::{append_misaln_regions, CandidateSink};
use crate::sources::{AlignmentSourceFactory, ReferenceSource};

/// Resources shared (behind locks) across a chromosome's parallel block
/// workers, rather than process-wide globals.
pub struct WorkerContext {
    misaln_writer: Mutex<Box<dyn Write + Send>>,
    progress: ProgressBar,
}

impl WorkerContext {
    pub fn new(misaln_writer: Box<dyn Write + Send>, progress: ProgressBar) -> Self {
        WorkerContext { misaln_writer: Mutex::new(misaln_writer), progress }
    }
}

pub struct ChromosomeOutcome {
    pub indel_regions: Vec<CandidateRegion>,
    pub snv_positions: Vec<i64>,
    pub mate_clip_arena: RegionArena,
    pub mate_clip_regions: Vec<MateClipRegion>,
}

pub struct ChromosomeOrchestrator<'a> {
    pub params: &'a DetectParams,
}

impl<'a> ChromosomeOrchestrator<'a> {
    pub fn new(params: &'a DetectParams) -> Self {
        ChromosomeOrchestrator { params }
    }

    pub fn run(
        &self,
        chrname: &str,
        ref_source: &dyn ReferenceSource,
        aln_factory: &dyn AlignmentSourceFactory,
        analyzer: &dyn ClipRegionAnalyzer,
        sink: &CandidateSink,
    ) -> Result<ChromosomeOutcome> {
        let chrom_len = ref_source.chrom_len(chrname)?;
        let blocks = tile_chromosome(chrom_len, self.params.block_size, self.params.slide_size);

        let progress = ProgressBar::new(blocks.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{prefix} [{bar:40}] {pos}/{len} blocks").unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        progress.set_prefix(chrname.to_string());
        let ctx = WorkerContext::new(Box::new(sink.open_misaln_writer(chrname)?), progress);

        let first_error: OnceLock<DetectError> = OnceLock::new();
        let orchestrator = BlockOrchestrator::new(self.params);

        let block_results: Vec<BlockResult> = blocks
            .par_iter()
            .filter_map(|spec| {
                if first_error.get().is_some() {
                    return None;
                }
                let outcome = self.run_one_block(chrname, spec, ref_source, aln_factory, &orchestrator, &ctx);
                match outcome {
                    Ok(result) => Some(result),
                    Err(e) => {
                        let _ = first_error.set(e);
                        None
                    }
                }
            })
            .collect();

        if let Some(e) = first_error.into_inner() {
            return Err(e);
        }

        let extractor = CandidateExtractor::from_params(self.params);
        let mut indel_regions = Vec::new();
        let mut snv_positions = Vec::new();
        let mut clip_regions = Vec::new();
        for r in block_results {
            indel_regions.extend(r.indel_regions);
            snv_positions.extend(r.snv_positions);
            clip_regions.extend(r.clip_regions);
        }
        let indel_regions = extractor.merge_regions(indel_regions);
        let clip_regions = extractor.merge_regions(clip_regions);
        snv_positions.sort_unstable();
        snv_positions.dedup();
        extractor.retain_snvs_outside_indels(&indel_regions, &mut snv_positions, chrname);

        let reconciler = MateClipReconciler { analyzer, max_clip_reg_size: self.params.max_clip_reg_size, clip_end_extend_size: self.params.clip_end_extend_size };
        let (arena, mut mate_clip_regions) = reconciler.reconcile(clip_regions)?;

        let mut indel_regions = indel_regions;
        let mut snv_positions = snv_positions;
        reconciler.drop_fps_in_mated_territory(&arena, &mate_clip_regions, &mut indel_regions, &mut snv_positions);
        reconciler.reject_duplicates(&arena, &mut mate_clip_regions);

        sink.write_indel_candidates(chrname, &indel_regions)?;
        sink.write_snv_candidates(chrname, &snv_positions)?;
        sink.write_clip_candidates(chrname, &arena, &mate_clip_regions)?;

        Ok(ChromosomeOutcome { indel_regions, snv_positions, mate_clip_arena: arena, mate_clip_regions })
    }

    fn run_one_block(
        &self,
        chrname: &str,
        spec: &crate::block::BlockSpec,
        ref_source: &dyn ReferenceSource,
        aln_factory: &dyn AlignmentSourceFactory,
        orchestrator: &BlockOrchestrator,
        ctx: &WorkerContext,
    ) -> Result<BlockResult> {
        let (ref_bases, left_flank, right_flank) = ReferenceWindow::fetch(ref_source, chrname, spec.start_pos, spec.end_pos)?;
        let mut accumulator = BlockAccumulator::new(
            chrname,
            spec.start_pos,
            spec.end_pos,
            &ref_bases,
            left_flank,
            right_flank,
            self.params.min_ins_size_filt,
            self.params.min_del_size_filt,
            self.params.min_clip_size_filt,
        )?;

        let mut aln_source = aln_factory.open()?;
        let mut ingest_err = None;
        aln_source.for_each_record(chrname, spec.start_pos, spec.end_pos, &mut |record| {
            if let Err(e) = accumulator.ingest(&record) {
                ingest_err = Some(e);
            }
            Ok(())
        })?;
        if let Some(e) = ingest_err {
            return Err(e);
        }
        accumulator.finalize();

        let result = orchestrator.process(chrname, spec, &accumulator)?;

        {
            let mut writer = ctx.misaln_writer.lock().expect("misaln writer mutex poisoned");
            append_misaln_regions(&mut *writer, chrname, &result.mis_aln_regions)?;
        }
        ctx.progress.inc(1);

        Ok(result)
    }
}

// ---------------------------------------------------------------------
// Mate-clip reconciliation
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraLink {
    pub pos_left2: i64,
    pub pos_right2: i64,
}

#[derive(Debug, Clone)]
pub struct MateClipRegion {
    pub left: Option<RegionId>,
    pub right: Option<RegionId>,
    pub left_clip_pos_num: u32,
    pub right_clip_pos_num: u32,
    pub left_mean_clip_pos: f64,
    pub right_mean_clip_pos: f64,
    pub reg_mated_flag: bool,
    pub valid_flag: bool,
    pub sv_type: SvType,
    pub dup_num: u32,
    /// Populated only for `SvType::Tra`: the anchor positions on the
    /// partner chromosome, named on the analyzed region's own chromosome
    /// and recorded separately for the genome-level merge pass.
    pub tra_chrname2: Option<String>,
    pub tra_link: Option<TraLink>,
}

/// One analyzed high-clip region's mate-pairing outcome, produced by an
/// external collaborator (an aligner/assembler-backed clip analyzer) that
/// this crate treats as opaque, exactly as it treats the BAM/FASTA readers.
pub struct MateClipAnalysis {
    pub left: Option<CandidateRegion>,
    pub right: Option<CandidateRegion>,
    pub left_clip_pos_num: u32,
    pub right_clip_pos_num: u32,
    pub left_mean_clip_pos: f64,
    pub right_mean_clip_pos: f64,
    pub reg_mated_flag: bool,
    pub valid_flag: bool,
    pub sv_type: SvType,
    pub dup_num: u32,
    pub tra_chrname2: Option<String>,
    pub tra_link: Option<TraLink>,
}

pub trait ClipRegionAnalyzer: Sync {
    fn analyze(&self, region: &CandidateRegion) -> Result<MateClipAnalysis>;
}

pub struct MateClipReconciler<'a> {
    pub analyzer: &'a dyn ClipRegionAnalyzer,
    pub max_clip_reg_size: i64,
    pub clip_end_extend_size: i64,
}

impl<'a> MateClipReconciler<'a> {
    pub fn reconcile(&self, clip_regions: Vec<CandidateRegion>) -> Result<(RegionArena, Vec<MateClipRegion>)> {
        let mut arena = RegionArena::new();
        let ids: Vec<RegionId> = clip_regions.into_iter().map(|r| arena.alloc(r)).collect();
        let mut processed = vec![false; ids.len()];
        let mut mates = Vec::new();

        for i in 0..ids.len() {
            if processed[i] {
                continue;
            }
            processed[i] = true;
            let region = arena.get(ids[i]).clone();
            let analysis = self.analyzer.analyze(&region)?;

            let left_id = analysis.left.map(|r| arena.alloc(r));
            let right_id = analysis.right.map(|r| arena.alloc(r));

            for (j, id) in ids.iter().enumerate() {
                if processed[j] {
                    continue;
                }
                let candidate = arena.get(*id);
                let hits_left = left_id.map(|l| candidate.overlaps(arena.get(l))).unwrap_or(false);
                let hits_right = right_id.map(|r| candidate.overlaps(arena.get(r))).unwrap_or(false);
                if hits_left || hits_right {
                    processed[j] = true;
                }
            }

            mates.push(MateClipRegion {
                left: left_id,
                right: right_id,
                left_clip_pos_num: analysis.left_clip_pos_num,
                right_clip_pos_num: analysis.right_clip_pos_num,
                left_mean_clip_pos: analysis.left_mean_clip_pos,
                right_mean_clip_pos: analysis.right_mean_clip_pos,
                reg_mated_flag: analysis.reg_mated_flag,
                valid_flag: analysis.valid_flag,
                sv_type: analysis.sv_type,
                dup_num: analysis.dup_num,
                tra_chrname2: analysis.tra_chrname2,
                tra_link: analysis.tra_link,
            });
        }

        self.reject_overlong(&arena, &mut mates);
        Ok((arena, mates))
    }

    /// Drops any record the analyzer never actually mated, and for mated
    /// same-chromosome pairs drops ones whose anchors are farther apart
    /// than `max_clip_reg_size` or whose left anchor starts past the
    /// right anchor's end — a loose pairing like that is noise, not a
    /// structural variant.
    fn reject_overlong(&self, arena: &RegionArena, mates: &mut Vec<MateClipRegion>) {
        mates.retain(|m| {
            if !m.reg_mated_flag {
                return false;
            }
            match (m.left, m.right) {
                (Some(l), Some(r)) => {
                    let left = arena.get(l);
                    let right = arena.get(r);
                    if left.chrname != right.chrname {
                        return true;
                    }
                    let span = (right.start_ref_pos - left.end_ref_pos).abs();
                    if span > self.max_clip_reg_size {
                        return false;
                    }
                    left.start_ref_pos <= right.end_ref_pos
                }
                _ => false,
            }
        });
    }

    /// Deduplicates mate pairs whose regions overlap by keeping the one
    /// backed by more clip-position evidence.
    pub fn reject_duplicates(&self, arena: &RegionArena, mates: &mut Vec<MateClipRegion>) {
        let mut kept: Vec<MateClipRegion> = Vec::with_capacity(mates.len());
        'outer: for m in mates.drain(..) {
            for existing in kept.iter_mut() {
                if mate_overlaps(arena, existing, &m) {
                    if total_support(&m) > total_support(existing) {
                        *existing = m;
                    }
                    continue 'outer;
                }
            }
            kept.push(m);
        }
        *mates = kept;
    }

    /// Removes any indel or SNV candidate that falls inside confirmed
    /// mated-clip territory: a breakpoint the reconciler already explained
    /// should not also surface as a smaller, redundant indel/SNV call.
    pub fn drop_fps_in_mated_territory(&self, arena: &RegionArena, mates: &[MateClipRegion], indels: &mut Vec<CandidateRegion>, snvs: &mut Vec<i64>) {
        let territories: Vec<(String, i64, i64)> = mates
            .iter()
            .filter(|m| m.reg_mated_flag)
            .flat_map(|m| [m.left, m.right])
            .flatten()
            .map(|id| {
                let r = arena.get(id);
                (r.chrname.clone(), r.start_ref_pos - self.clip_end_extend_size, r.end_ref_pos + self.clip_end_extend_size)
            })
            .collect();
        indels.retain(|r| !territories.iter().any(|(c, s, e)| *c == r.chrname && *s <= r.end_ref_pos && r.start_ref_pos <= *e));
        snvs.retain(|&pos| {
            // SNV positions carry no chromosome tag of their own here; the
            // caller only ever has one chromosome's worth in scope at once.
            !territories.iter().any(|(_, s, e)| *s <= pos && pos <= *e)
        });
    }
}

fn mate_overlaps(arena: &RegionArena, a: &MateClipRegion, b: &MateClipRegion) -> bool {
    let sides = [(a.left, b.left), (a.left, b.right), (a.right, b.left), (a.right, b.right)];
    sides.into_iter().any(|(x, y)| match (x, y) {
        (Some(x), Some(y)) => arena.get(x).overlaps(arena.get(y)),
        _ => false,
    })
}

fn total_support(m: &MateClipRegion) -> u32 {
    m.left_clip_pos_num + m.right_clip_pos_num
}

// ---------------------------------------------------------------------
// Genome-level (cross-chromosome) reconciliation
// ---------------------------------------------------------------------

/// Merges TRA calls detected independently from each side of a
/// translocation (once while processing the donor chromosome, once while
/// processing the acceptor) into a single record, and drops near-duplicate
/// TRA clusters in favor of the one with more total clip support.
pub struct GenomeReconciler {
    pub clip_end_extend_size: i64,
}

impl GenomeReconciler {
    pub fn merge_translocations(&self, chrom_outcomes: &mut [(String, RegionArena, Vec<MateClipRegion>)]) {
        let mut consumed: Vec<Vec<bool>> = chrom_outcomes.iter().map(|(_, _, m)| vec![false; m.len()]).collect();

        for i in 0..chrom_outcomes.len() {
            for mi in 0..chrom_outcomes[i].2.len() {
                if consumed[i][mi] || chrom_outcomes[i].2[mi].sv_type != SvType::Tra {
                    continue;
                }
                let partner_chr = match &chrom_outcomes[i].2[mi].tra_chrname2 {
                    Some(c) => c.clone(),
                    None => continue,
                };
                let tra_i = match chrom_outcomes[i].2[mi].tra_link {
                    Some(t) => t,
                    None => continue,
                };

                for j in 0..chrom_outcomes.len() {
                    if j == i || chrom_outcomes[j].0 != partner_chr {
                        continue;
                    }
                    for mj in 0..chrom_outcomes[j].2.len() {
                        if consumed[j][mj] || chrom_outcomes[j].2[mj].sv_type != SvType::Tra {
                            continue;
                        }
                        let partner_anchor = self.primary_anchor(&chrom_outcomes[j], mj);
                        let close_left = (partner_anchor - tra_i.pos_left2).abs() <= self.clip_end_extend_size
                            || (partner_anchor - tra_i.pos_right2).abs() <= self.clip_end_extend_size;
                        if close_left {
                            let combined = total_support(&chrom_outcomes[i].2[mi]) + total_support(&chrom_outcomes[j].2[mj]);
                            if total_support(&chrom_outcomes[j].2[mj]) > total_support(&chrom_outcomes[i].2[mi]) {
                                chrom_outcomes[i].2[mi] = chrom_outcomes[j].2[mj].clone();
                            }
                            chrom_outcomes[i].2[mi].left_clip_pos_num = combined;
                            consumed[j][mj] = true;
                        }
                    }
                }
            }
        }

        for (outcomes_idx, consumed_flags) in consumed.into_iter().enumerate() {
            let mut keep_iter = consumed_flags.into_iter();
            chrom_outcomes[outcomes_idx].2.retain(|_| !keep_iter.next().unwrap_or(false));
        }
    }

    fn primary_anchor(&self, outcome: &(String, RegionArena, Vec<MateClipRegion>), idx: usize) -> i64 {
        let m = &outcome.2[idx];
        m.left.map(|id| outcome.1.get(id).start_ref_pos).or_else(|| m.right.map(|id| outcome.1.get(id).start_ref_pos)).unwrap_or(0)
    }
}
