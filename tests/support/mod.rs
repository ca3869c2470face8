use std::collections::HashMap;
use std::sync::Arc;

use rust_htslib::bam::record::Cigar;

use longsv_detect::candidates::CandidateRegion;
use longsv_detect::errors::Result;
use longsv_detect::genome::{ClipRegionAnalyzer, MateClipAnalysis};
use longsv_detect::reads::AlnRecord;
use longsv_detect::sources::{AlignmentSource, AlignmentSourceFactory, ReferenceSource};

pub struct FakeReferenceSource {
    pub sequences: HashMap<String, Vec<u8>>,
}

impl ReferenceSource for FakeReferenceSource {
    fn fetch(&self, chrname: &str, start: i64, end: i64) -> Result<Vec<u8>> {
        let seq = &self.sequences[chrname];
        Ok(seq[(start - 1) as usize..end as usize].to_vec())
    }

    fn chrom_len(&self, chrname: &str) -> Result<i64> {
        Ok(self.sequences[chrname].len() as i64)
    }
}

fn ref_span(cigar: &[Cigar]) -> i64 {
    cigar
        .iter()
        .map(|c| match c {
            Cigar::Match(l) | Cigar::Del(l) | Cigar::RefSkip(l) | Cigar::Equal(l) | Cigar::Diff(l) => *l as i64,
            _ => 0,
        })
        .sum()
}

#[derive(Clone)]
pub struct FakeAlignmentFactory {
    pub records: Arc<HashMap<String, Vec<AlnRecord>>>,
}

impl AlignmentSourceFactory for FakeAlignmentFactory {
    fn open(&self) -> Result<Box<dyn AlignmentSource>> {
        Ok(Box::new(FakeAlignmentSource { records: self.records.clone() }))
    }
}

struct FakeAlignmentSource {
    records: Arc<HashMap<String, Vec<AlnRecord>>>,
}

impl AlignmentSource for FakeAlignmentSource {
    fn for_each_record(&mut self, chrname: &str, start: i64, end: i64, visit: &mut dyn FnMut(AlnRecord) -> Result<()>) -> Result<()> {
        if let Some(recs) = self.records.get(chrname) {
            for r in recs {
                let rec_start = r.pos0 + 1;
                let rec_end = rec_start + ref_span(&r.cigar) - 1;
                if rec_start <= end && start <= rec_end {
                    visit(r.clone())?;
                }
            }
        }
        Ok(())
    }
}

/// Treats every clip region as unmated and standalone; used by tests that
/// only care about indel/SNV/clip extraction, not mate-clip pairing.
pub struct PassthroughClipAnalyzer;

impl ClipRegionAnalyzer for PassthroughClipAnalyzer {
    fn analyze(&self, region: &CandidateRegion) -> Result<MateClipAnalysis> {
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

pub fn make_record(pos0: i64, cigar: Vec<Cigar>, md: Option<&str>, seq: &str) -> AlnRecord {
    AlnRecord { pos0, cigar, md: md.map(|s| s.to_string()), seq: seq.bytes().collect() }
}
