use longsv_detect::candidates::{CandidateExtractor, CandidateRegion, SvType};
use longsv_detect::config::DetectParams;
use longsv_detect::evidence::{Base, ConIndelType};
use longsv_detect::window::{Region, RegionKind};

fn extractor() -> CandidateExtractor {
    CandidateExtractor::from_params(&DetectParams::default())
}

fn plain_base(ref_char: u8, coverage: u32) -> Base {
    let mut b = Base::new(ref_char);
    let idx = longsv_detect::evidence::base::base_char_idx(ref_char).unwrap();
    b.num_bases[idx] = coverage;
    b.num_bases[5] = coverage;
    b
}

#[test]
fn merge_regions_bridges_gaps_within_the_extend_size() {
    let ex = extractor();
    let a = CandidateRegion::new("chr1", 100, 120, SvType::Ins);
    let b = CandidateRegion::new("chr1", 125, 140, SvType::Ins);
    let merged = ex.merge_regions(vec![a, b]);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].start_ref_pos, 100);
    assert_eq!(merged[0].end_ref_pos, 140);
}

#[test]
fn merge_regions_keeps_far_apart_regions_separate() {
    let ex = extractor();
    let a = CandidateRegion::new("chr1", 100, 120, SvType::Ins);
    let b = CandidateRegion::new("chr1", 500, 520, SvType::Del);
    let merged = ex.merge_regions(vec![a, b]);
    assert_eq!(merged.len(), 2);
}

#[test]
fn merging_an_insertion_with_a_deletion_region_produces_a_mixed_type() {
    let ex = extractor();
    let a = CandidateRegion::new("chr1", 100, 110, SvType::Ins);
    let b = CandidateRegion::new("chr1", 112, 120, SvType::Del);
    let merged = ex.merge_regions(vec![a, b]);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].var_type, SvType::Mix);
}

#[test]
fn merge_is_idempotent() {
    let ex = extractor();
    let regions = vec![CandidateRegion::new("chr1", 100, 120, SvType::Ins), CandidateRegion::new("chr1", 200, 220, SvType::Del)];
    let once = ex.merge_regions(regions);
    let twice = ex.merge_regions(once.clone());
    assert_eq!(once.len(), twice.len());
    for (a, b) in once.iter().zip(twice.iter()) {
        assert_eq!(a.start_ref_pos, b.start_ref_pos);
        assert_eq!(a.end_ref_pos, b.end_ref_pos);
    }
}

#[test]
fn retain_snvs_outside_indels_drops_positions_covered_by_an_indel_region() {
    let ex = extractor();
    let indels = vec![CandidateRegion::new("chr1", 100, 120, SvType::Ins)];
    let mut snvs = vec![50, 110, 200];
    ex.retain_snvs_outside_indels(&indels, &mut snvs, "chr1");
    assert_eq!(snvs, vec![50, 200]);
}

#[test]
fn a_clean_run_of_mismatches_surfaces_as_snv_positions_not_an_indel() {
    let ex = extractor();
    let bases: Vec<Base> = (0..30)
        .map(|i| {
            if i == 15 {
                let mut b = plain_base(b'A', 10);
                b.num_bases[0] = 0;
                b.num_bases[1] = 10; // all observed as C: clean mismatch, no indel signal
                b
            } else {
                plain_base(b'A', 10)
            }
        })
        .collect();
    let region = Region::new("chr1", 1, 30, &bases, RegionKind::Head, 10);
    let wc = ex.extract_window(&region);
    assert!(wc.indel_regions.is_empty());
    assert_eq!(wc.snv_positions, vec![16]);
}

#[test]
fn a_dominant_insertion_run_surfaces_as_an_ins_region() {
    let ex = extractor();
    let mut bases: Vec<Base> = (0..30).map(|_| plain_base(b'A', 10)).collect();
    for i in 10..13 {
        bases[i].max_con_type = ConIndelType::Insertion;
        bases[i].max_con_indel_num = 8;
        bases[i].max_con_indel_ratio = 0.8;
    }
    let region = Region::new("chr1", 1, 30, &bases, RegionKind::Head, 10);
    let wc = ex.extract_window(&region);
    assert_eq!(wc.indel_regions.len(), 1);
    assert_eq!(wc.indel_regions[0].var_type, SvType::Ins);
    assert_eq!(wc.indel_regions[0].start_ref_pos, 11);
    assert_eq!(wc.indel_regions[0].end_ref_pos, 13);
}
