//! Scores a `Region`'s mid-part into a disagreement/clip signature (C4).

use crate::config::DetectParams;

use super::region::Region;

#[derive(Debug, Clone, Copy, Default)]
pub struct WindowSignature {
    pub disagreement_count: usize,
    pub high_clip_base_count: usize,
    pub mid_len: usize,
    pub disagr_reg_ratio: f64,
}

pub struct WindowClassifier {
    pub non_ref_count_thres: u32,
    pub indel_noise_ratio_thres: f32,
    pub clip_count_thres: u32,
}

impl WindowClassifier {
    pub fn from_params(params: &DetectParams) -> Self {
        WindowClassifier {
            non_ref_count_thres: params.non_ref_count_thres,
            indel_noise_ratio_thres: params.indel_noise_ratio_thres,
            clip_count_thres: params.clip_count_thres,
        }
    }

    pub fn classify(&self, region: &Region) -> WindowSignature {
        let mid = region.mid_bases();
        let disagreement_count = mid
            .iter()
            .filter(|b| b.non_ref_count() >= self.non_ref_count_thres || b.max_con_indel_ratio > self.indel_noise_ratio_thres)
            .count();
        let high_clip_base_count = mid.iter().filter(|b| b.is_high_clip(self.clip_count_thres)).count();
        let disagr_reg_ratio = if mid.is_empty() { 0.0 } else { disagreement_count as f64 / mid.len() as f64 };
        WindowSignature { disagreement_count, high_clip_base_count, mid_len: mid.len(), disagr_reg_ratio }
    }
}
