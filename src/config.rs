//! Parameter bundle for a detect run.
//!
//! `DetectParams` collects every tunable the detect core consumes. Most of
//! these are normally produced by an upstream parameter-estimation pass
//! (out of scope here, per the Non-goals); the defaults below are the values
//! this crate falls back to when a caller supplies none of its own.

#[derive(Debug, Clone)]
pub struct DetectParams {
    /// Length of a block along the chromosome, in bases.
    pub block_size: i64,
    /// Slide step; windows are `3 * slide_size` wide and step by `slide_size`.
    /// Adjacent blocks overlap by `2 * slide_size`.
    pub slide_size: i64,
    /// Minimum insertion length worth recording as an `InsEvent` rather than
    /// folding into the short-insertion counter.
    pub min_ins_size_filt: u32,
    /// Minimum deletion length worth recording as a `DelEvent`.
    pub min_del_size_filt: u32,
    /// Minimum clip length worth counting toward high-clip classification.
    pub min_clip_size_filt: u32,
    /// Minimum merged indel-region span reported as a candidate.
    pub min_sv_size_usr: i64,
    /// Per-base non-reference count at/above which a base counts toward a
    /// window's disagreement tally.
    pub non_ref_count_thres: u32,
    /// Per-base consensus-indel ratio above which a base counts toward a
    /// window's disagreement tally even without enough raw mismatches.
    pub indel_noise_ratio_thres: f32,
    /// Per-base clip-event count above which a base is "high-clip".
    pub clip_count_thres: u32,
    /// Disagreement-ratio threshold (mid-window fraction of disagreeing
    /// bases) at/above which a window is a mis-alignment candidate.
    pub sub_mis_aln_reg_ratio_thres: f64,
    /// Maximum run of non-candidate windows tolerated inside an otherwise
    /// contiguous mis-alignment run.
    pub gapped_mis_aln_reg_num_thres: usize,
    /// Minimum contiguous candidate-window run length to commit as a
    /// mis-alignment region.
    pub min_mis_aln_reg_num_thres: usize,
    /// Per-base disagreement ratio (non-ref / coverage) above which a base
    /// contributes to an indel or SNV candidate run.
    pub indel_disagree_ratio_thres: f32,
    /// Per-base mismatch ratio above which a base is an SNV candidate.
    pub snv_mismatch_ratio_thres: f32,
    /// Distance within which adjacent high-clip runs (and indel/clip
    /// candidates) are bridged into one region.
    pub clip_end_extend_size: i64,
    /// Maximum separation between two clip anchors considered a same-
    /// chromosome mate pair (beyond this, a pairing is rejected as overlong).
    pub max_clip_reg_size: i64,
    /// If true, mis-aligned windows are masked out of candidate extraction
    /// entirely rather than merely written to the mis-align report.
    pub mask_misaln_regions: bool,
}

impl Default for DetectParams {
    fn default() -> Self {
        DetectParams {
            block_size: 1_000_000,
            slide_size: 200,
            min_ins_size_filt: 5,
            min_del_size_filt: 5,
            min_clip_size_filt: 5,
            min_sv_size_usr: 2,
            non_ref_count_thres: 3,
            indel_noise_ratio_thres: 0.3,
            clip_count_thres: 3,
            sub_mis_aln_reg_ratio_thres: 0.6,
            gapped_mis_aln_reg_num_thres: 2,
            min_mis_aln_reg_num_thres: 5,
            indel_disagree_ratio_thres: 0.3,
            snv_mismatch_ratio_thres: 0.2,
            clip_end_extend_size: 20,
            max_clip_reg_size: 1_000_000,
            mask_misaln_regions: true,
        }
    }
}

impl DetectParams {
    pub fn validate(&self) -> crate::errors::Result<()> {
        if self.slide_size <= 0 {
            return Err(crate::errors::DetectError::invalid_reference(
                "DetectParams::validate",
                format!("slide_size must be positive, got {}", self.slide_size),
            ));
        }
        if self.block_size < 3 * self.slide_size {
            return Err(crate::errors::DetectError::invalid_reference(
                "DetectParams::validate",
                format!(
                    "block_size {} must be at least 3 * slide_size ({})",
                    self.block_size,
                    3 * self.slide_size
                ),
            ));
        }
        if self.min_sv_size_usr < 2 {
            return Err(crate::errors::DetectError::invalid_reference(
                "DetectParams::validate",
                format!("min_sv_size_usr must be >= 2, got {}", self.min_sv_size_usr),
            ));
        }
        Ok(())
    }

    pub fn window_size(&self) -> i64 {
        3 * self.slide_size
    }
}
