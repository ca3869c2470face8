//! Long-read structural variant detect core: sliding-window candidate
//! discovery from an indexed BAM against an indexed FASTA reference.
//!
//! This crate covers only the detect stage of a longer pipeline (detect ->
//! assemble -> call). Assembly, re-alignment and genotyping, and the
//! mate-clip analyzer that actually resolves a clip region's structure, are
//! all external collaborators this crate reaches through narrow traits
//! (`ReferenceSource`, `AlignmentSource`, `ClipRegionAnalyzer`).

pub mod block;
pub mod candidates;
pub mod config;
pub mod errors;
pub mod evidence;
pub mod genome;
pub mod reads;
pub mod reference;
pub mod sink;
pub mod sources;
pub mod window;

use std::path::Path;

use config::DetectParams;
use errors::Result;
use genome::{ChromosomeOrchestrator, ClipRegionAnalyzer};
use sink::CandidateSink;
use sources::{AlignmentSourceFactory, ReferenceSource};

/// Runs detect over every requested chromosome and writes candidates to
/// `out_dir`. Chromosomes are processed one at a time; within a chromosome,
/// blocks run in parallel.
pub fn run_detect(
    chrnames: &[String],
    ref_source: &dyn ReferenceSource,
    aln_factory: &dyn AlignmentSourceFactory,
    analyzer: &dyn ClipRegionAnalyzer,
    out_dir: &Path,
    params: &DetectParams,
) -> Result<()> {
    params.validate()?;
    sink::ensure_out_dir(out_dir)?;
    let sink = CandidateSink::new(out_dir.to_path_buf());
    let orchestrator = ChromosomeOrchestrator::new(params);

    let mut chrom_outcomes = Vec::with_capacity(chrnames.len());
    for chrname in chrnames {
        log::info!("detect: starting chromosome {}", chrname);
        let outcome = orchestrator.run(chrname, ref_source, aln_factory, analyzer, &sink)?;
        log::info!(
            "detect: {} indel candidates, {} SNV candidates, {} mate-clip records on {}",
            outcome.indel_regions.len(),
            outcome.snv_positions.len(),
            outcome.mate_clip_regions.len(),
            chrname
        );
        chrom_outcomes.push((chrname.clone(), outcome.mate_clip_arena, outcome.mate_clip_regions));
    }

    let genome_reconciler = genome::GenomeReconciler { clip_end_extend_size: params.clip_end_extend_size };
    genome_reconciler.merge_translocations(&mut chrom_outcomes);

    Ok(())
}
