//! Mis-alignment region detection (C5).
//!
//! A run of windows with a high disagreement ratio is a candidate
//! mis-alignment artifact, *unless* the window also carries clip evidence —
//! a real SV breakpoint looks like disagreement plus clipping, while a
//! mapping artifact tends to be disagreement with no clipping at all. Short
//! gaps of "clean" windows inside an otherwise bad run are tolerated so one
//! stray good window doesn't split a long artifact in two.

use crate::config::DetectParams;

use super::classifier::WindowSignature;

#[derive(Debug, Clone, Copy)]
pub struct MisAlignReg {
    pub start_r_pos: i64,
    pub end_r_pos: i64,
    pub disagr_reg_ratio: f64,
    pub high_clip_base_count: usize,
    pub mis_aln_flag: bool,
}

impl MisAlignReg {
    pub fn from_signature(start_r_pos: i64, end_r_pos: i64, sig: &WindowSignature) -> Self {
        MisAlignReg {
            start_r_pos,
            end_r_pos,
            disagr_reg_ratio: sig.disagr_reg_ratio,
            high_clip_base_count: sig.high_clip_base_count,
            mis_aln_flag: false,
        }
    }

    fn is_candidate(&self, thres: f64) -> bool {
        self.disagr_reg_ratio >= thres
    }

    fn is_clean_candidate(&self, thres: f64) -> bool {
        self.disagr_reg_ratio >= thres && self.high_clip_base_count == 0
    }
}

pub struct MisAlignFilter {
    pub sub_mis_aln_reg_ratio_thres: f64,
    pub gapped_mis_aln_reg_num_thres: usize,
    pub min_mis_aln_reg_num_thres: usize,
}

impl MisAlignFilter {
    pub fn from_params(params: &DetectParams) -> Self {
        MisAlignFilter {
            sub_mis_aln_reg_ratio_thres: params.sub_mis_aln_reg_ratio_thres,
            gapped_mis_aln_reg_num_thres: params.gapped_mis_aln_reg_num_thres,
            min_mis_aln_reg_num_thres: params.min_mis_aln_reg_num_thres,
        }
    }

    /// Walks `regs` in order, committing contiguous (gap-tolerant) runs of
    /// clean-disagreement windows as mis-alignment regions, then drops
    /// everything that wasn't committed.
    pub fn extract_runs(&self, regs: &mut Vec<MisAlignReg>) {
        let n = regs.len();
        let mut i = 0usize;
        while i < n {
            if !regs[i].is_candidate(self.sub_mis_aln_reg_ratio_thres) {
                i += 1;
                continue;
            }
            let mut contiguous = 0usize;
            let mut gapped = 0usize;
            let mut j = i;
            let mut broke = false;
            while j < n {
                if regs[j].is_clean_candidate(self.sub_mis_aln_reg_ratio_thres) {
                    if gapped <= self.gapped_mis_aln_reg_num_thres {
                        contiguous += gapped;
                    }
                    gapped = 0;
                    contiguous += 1;
                } else {
                    gapped += 1;
                    if gapped > self.gapped_mis_aln_reg_num_thres {
                        broke = true;
                        break;
                    }
                }
                j += 1;
            }
            let flag = if broke {
                contiguous >= self.min_mis_aln_reg_num_thres
            } else {
                contiguous > 0
            };
            if flag {
                for reg in regs.iter_mut().skip(i).take(contiguous) {
                    reg.mis_aln_flag = reg.high_clip_base_count == 0;
                }
            }
            i += contiguous + gapped;
        }
        regs.retain(|r| r.mis_aln_flag);
    }
}
