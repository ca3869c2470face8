use longsv_detect::candidates::{CandidateRegion, SvType};
use longsv_detect::errors::Result;
use longsv_detect::genome::{ClipRegionAnalyzer, MateClipAnalysis, MateClipReconciler, TraLink};

struct DupAnalyzer {
    gap: i64,
}

impl ClipRegionAnalyzer for DupAnalyzer {
    fn analyze(&self, region: &CandidateRegion) -> Result<MateClipAnalysis> {
        let right = CandidateRegion::new(region.chrname.clone(), region.end_ref_pos + self.gap, region.end_ref_pos + self.gap + 20, SvType::Dup);
        Ok(MateClipAnalysis {
            left: Some(region.clone()),
            right: Some(right),
            left_clip_pos_num: 5,
            right_clip_pos_num: 5,
            left_mean_clip_pos: region.start_ref_pos as f64,
            right_mean_clip_pos: (region.end_ref_pos + self.gap) as f64,
            reg_mated_flag: true,
            valid_flag: true,
            sv_type: SvType::Dup,
            dup_num: 1,
            tra_chrname2: None,
            tra_link: None,
        })
    }
}

fn reconciler<'a>(analyzer: &'a dyn ClipRegionAnalyzer, max_clip_reg_size: i64) -> MateClipReconciler<'a> {
    MateClipReconciler { analyzer, max_clip_reg_size, clip_end_extend_size: 20 }
}

#[test]
fn reconcile_pairs_a_clip_region_into_a_left_and_right_anchor() {
    let analyzer = DupAnalyzer { gap: 500 };
    let r = reconciler(&analyzer, 10_000);
    let clip_regions = vec![CandidateRegion::new("chr1", 100, 120, SvType::Uncertain)];
    let (arena, mates) = r.reconcile(clip_regions).unwrap();
    assert_eq!(mates.len(), 1);
    assert!(mates[0].left.is_some());
    assert!(mates[0].right.is_some());
    assert_eq!(arena.get(mates[0].right.unwrap()).var_type, SvType::Dup);
}

#[test]
fn reject_overlong_drops_pairs_farther_apart_than_max_clip_reg_size() {
    let analyzer = DupAnalyzer { gap: 50_000 };
    let r = reconciler(&analyzer, 1_000);
    let clip_regions = vec![CandidateRegion::new("chr1", 100, 120, SvType::Uncertain)];
    let (_arena, mates) = r.reconcile(clip_regions).unwrap();
    assert!(mates.is_empty(), "a pair farther apart than max_clip_reg_size is rejected as noise");
}

#[test]
fn reject_overlong_keeps_pairs_within_max_clip_reg_size() {
    let analyzer = DupAnalyzer { gap: 500 };
    let r = reconciler(&analyzer, 10_000);
    let clip_regions = vec![CandidateRegion::new("chr1", 100, 120, SvType::Uncertain)];
    let (_arena, mates) = r.reconcile(clip_regions).unwrap();
    assert_eq!(mates.len(), 1);
}

struct UnmatedAnalyzer;

impl ClipRegionAnalyzer for UnmatedAnalyzer {
    fn analyze(&self, region: &CandidateRegion) -> Result<MateClipAnalysis> {
        let right = CandidateRegion::new(region.chrname.clone(), region.end_ref_pos + 500, region.end_ref_pos + 520, SvType::Dup);
        Ok(MateClipAnalysis {
            left: Some(region.clone()),
            right: Some(right),
            left_clip_pos_num: 5,
            right_clip_pos_num: 5,
            left_mean_clip_pos: region.start_ref_pos as f64,
            right_mean_clip_pos: (region.end_ref_pos + 500) as f64,
            reg_mated_flag: false,
            valid_flag: true,
            sv_type: SvType::Dup,
            dup_num: 1,
            tra_chrname2: None,
            tra_link: None,
        })
    }
}

#[test]
fn reject_overlong_drops_unmated_records_even_with_both_sides_populated() {
    let analyzer = UnmatedAnalyzer;
    let r = reconciler(&analyzer, 10_000);
    let clip_regions = vec![CandidateRegion::new("chr1", 100, 120, SvType::Uncertain)];
    let (_arena, mates) = r.reconcile(clip_regions).unwrap();
    assert!(mates.is_empty(), "reg_mated_flag=false must invalidate the pair regardless of populated sides");
}

struct InvertedDupAnalyzer;

impl ClipRegionAnalyzer for InvertedDupAnalyzer {
    fn analyze(&self, region: &CandidateRegion) -> Result<MateClipAnalysis> {
        // Right anchor lands entirely upstream of the left anchor.
        let right = CandidateRegion::new(region.chrname.clone(), region.start_ref_pos - 200, region.start_ref_pos - 180, SvType::Dup);
        Ok(MateClipAnalysis {
            left: Some(region.clone()),
            right: Some(right),
            left_clip_pos_num: 5,
            right_clip_pos_num: 5,
            left_mean_clip_pos: region.start_ref_pos as f64,
            right_mean_clip_pos: (region.start_ref_pos - 200) as f64,
            reg_mated_flag: true,
            valid_flag: true,
            sv_type: SvType::Dup,
            dup_num: 1,
            tra_chrname2: None,
            tra_link: None,
        })
    }
}

#[test]
fn reject_overlong_drops_inverted_spans_regardless_of_sv_type() {
    let analyzer = InvertedDupAnalyzer;
    let r = reconciler(&analyzer, 10_000);
    let clip_regions = vec![CandidateRegion::new("chr1", 1000, 1020, SvType::Uncertain)];
    let (_arena, mates) = r.reconcile(clip_regions).unwrap();
    assert!(mates.is_empty(), "a DUP-typed pair with an inverted span is still rejected");
}

#[test]
fn reject_duplicates_keeps_the_pair_with_more_clip_support() {
    let analyzer = DupAnalyzer { gap: 500 };
    let r = reconciler(&analyzer, 10_000);
    let mut arena = longsv_detect::candidates::RegionArena::new();
    let weak_left = arena.alloc(CandidateRegion::new("chr1", 100, 120, SvType::Uncertain));
    let weak_right = arena.alloc(CandidateRegion::new("chr1", 600, 620, SvType::Dup));
    let strong_left = arena.alloc(CandidateRegion::new("chr1", 105, 125, SvType::Uncertain));
    let strong_right = arena.alloc(CandidateRegion::new("chr1", 605, 625, SvType::Dup));

    let weak = longsv_detect::genome::MateClipRegion {
        left: Some(weak_left),
        right: Some(weak_right),
        left_clip_pos_num: 2,
        right_clip_pos_num: 2,
        left_mean_clip_pos: 100.0,
        right_mean_clip_pos: 600.0,
        reg_mated_flag: true,
        valid_flag: true,
        sv_type: SvType::Dup,
        dup_num: 1,
        tra_chrname2: None,
        tra_link: None,
    };
    let strong = longsv_detect::genome::MateClipRegion {
        left: Some(strong_left),
        right: Some(strong_right),
        left_clip_pos_num: 8,
        right_clip_pos_num: 8,
        left_mean_clip_pos: 105.0,
        right_mean_clip_pos: 605.0,
        reg_mated_flag: true,
        valid_flag: true,
        sv_type: SvType::Dup,
        dup_num: 1,
        tra_chrname2: None,
        tra_link: None,
    };

    let mut mates = vec![weak, strong];
    r.reject_duplicates(&arena, &mut mates);
    assert_eq!(mates.len(), 1);
    assert_eq!(mates[0].left_clip_pos_num, 8);
}

#[test]
fn drop_fps_in_mated_territory_removes_indels_and_snvs_inside_a_confirmed_pair() {
    let analyzer = DupAnalyzer { gap: 500 };
    let r = reconciler(&analyzer, 10_000);
    let mut arena = longsv_detect::candidates::RegionArena::new();
    let left = arena.alloc(CandidateRegion::new("chr1", 100, 120, SvType::Uncertain));
    let right = arena.alloc(CandidateRegion::new("chr1", 600, 620, SvType::Dup));
    let mated = longsv_detect::genome::MateClipRegion {
        left: Some(left),
        right: Some(right),
        left_clip_pos_num: 5,
        right_clip_pos_num: 5,
        left_mean_clip_pos: 100.0,
        right_mean_clip_pos: 600.0,
        reg_mated_flag: true,
        valid_flag: true,
        sv_type: SvType::Dup,
        dup_num: 1,
        tra_chrname2: None,
        tra_link: None,
    };
    let mut indels = vec![
        CandidateRegion::new("chr1", 105, 110, SvType::Ins), // inside left territory
        CandidateRegion::new("chr1", 900, 910, SvType::Del), // untouched
    ];
    let mut snvs = vec![115_i64, 950];
    r.drop_fps_in_mated_territory(&arena, &[mated], &mut indels, &mut snvs);
    assert_eq!(indels.len(), 1);
    assert_eq!(indels[0].start_ref_pos, 900);
    assert_eq!(snvs, vec![950]);
}

#[test]
fn tra_link_carries_the_partner_chromosome_anchor_through_untouched() {
    let link = TraLink { pos_left2: 1000, pos_right2: 1050 };
    assert_eq!(link.pos_left2, 1000);
    assert_eq!(link.pos_right2, 1050);
}
