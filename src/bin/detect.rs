use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use longsv_detect::config::DetectParams;
use longsv_detect::genome::{ClipRegionAnalyzer, MateClipAnalysis};
use longsv_detect::run_detect;
use longsv_detect::sources::{BamAlignmentSourceFactory, FastaReferenceSource};

/// Sliding-window structural variant candidate discovery from an indexed
/// BAM against an indexed FASTA reference.
#[derive(Parser, Debug)]
#[command(name = "detect", version, about)]
struct DetectArgs {
    /// Indexed FASTA reference (expects a `.fai` alongside it).
    #[arg(long = "ref")]
    reference: PathBuf,

    /// Coordinate-sorted, indexed BAM.
    #[arg(long)]
    bam: PathBuf,

    /// Directory candidate files are written under.
    #[arg(long = "out-dir")]
    out_dir: PathBuf,

    /// Chromosomes to process; defaults to every contig in the BAM header
    /// when omitted.
    #[arg(long = "chroms", value_delimiter = ',')]
    chroms: Option<Vec<String>>,

    #[arg(long = "block-size")]
    block_size: Option<i64>,

    #[arg(long = "slide-size")]
    slide_size: Option<i64>,

    #[arg(long = "min-sv-size")]
    min_sv_size: Option<i64>,

    #[arg(long)]
    threads: Option<usize>,

    #[arg(long = "mask-misaln-regions", default_value_t = true)]
    mask_misaln_regions: bool,

    #[arg(long = "min-ins-size-filt")]
    min_ins_size_filt: Option<u32>,

    #[arg(long = "min-del-size-filt")]
    min_del_size_filt: Option<u32>,

    #[arg(long = "min-clip-size-filt")]
    min_clip_size_filt: Option<u32>,
}

/// Placeholder analyzer until a real assembler/aligner-backed clip
/// resolver is wired in: treats every clip region as unmated, so no
/// indel/SNV gets suppressed by mate-clip territory and every clip region
/// surfaces on its own in `<chr>_clipReg_candidate`.
struct UnresolvedClipAnalyzer;

impl ClipRegionAnalyzer for UnresolvedClipAnalyzer {
    fn analyze(&self, region: &longsv_detect::candidates::CandidateRegion) -> longsv_detect::errors::Result<MateClipAnalysis> {
        Ok(MateClipAnalysis {
            left: Some(region.clone()),
            right: None,
            left_clip_pos_num: 1,
            right_clip_pos_num: 0,
            left_mean_clip_pos: region.start_ref_pos as f64,
            right_mean_clip_pos: 0.0,
            reg_mated_flag: false,
            valid_flag: true,
            sv_type: longsv_detect::candidates::SvType::Uncertain,
            dup_num: 0,
            tra_chrname2: None,
            tra_link: None,
        })
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = DetectArgs::parse();

    if let Some(threads) = args.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global() {
            log::error!("detect: failed to configure thread pool: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let mut params = DetectParams::default();
    if let Some(v) = args.block_size {
        params.block_size = v;
    }
    if let Some(v) = args.slide_size {
        params.slide_size = v;
    }
    if let Some(v) = args.min_sv_size {
        params.min_sv_size_usr = v;
    }
    if let Some(v) = args.min_ins_size_filt {
        params.min_ins_size_filt = v;
    }
    if let Some(v) = args.min_del_size_filt {
        params.min_del_size_filt = v;
    }
    if let Some(v) = args.min_clip_size_filt {
        params.min_clip_size_filt = v;
    }
    params.mask_misaln_regions = args.mask_misaln_regions;

    let ref_path = args.reference.to_string_lossy().into_owned();
    let bam_path = args.bam.to_string_lossy().into_owned();

    let reference = match FastaReferenceSource::open(&ref_path) {
        Ok(r) => r,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let aln_factory = BamAlignmentSourceFactory { path: bam_path };
    let analyzer = UnresolvedClipAnalyzer;

    let chroms = match args.chroms {
        Some(c) => c,
        None => {
            log::error!("detect: --chroms is required until header introspection is wired into the CLI");
            return ExitCode::FAILURE;
        }
    };

    match run_detect(&chroms, &reference, &aln_factory, &analyzer, &args.out_dir, &params) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
