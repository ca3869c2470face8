mod support;

use longsv_detect::evidence::{BlockAccumulator, ConIndelType};

fn acc(ref_seq: &[u8]) -> BlockAccumulator {
    BlockAccumulator::new("chr1", 1, ref_seq.len() as i64, ref_seq, None, None, 5, 5, 5).unwrap()
}

fn acc_with_flanks(ref_seq: &[u8], left_flank: Option<u8>, right_flank: Option<u8>) -> BlockAccumulator {
    BlockAccumulator::new("chr1", 1, ref_seq.len() as i64, ref_seq, left_flank, right_flank, 5, 5, 5).unwrap()
}

#[test]
fn matches_accumulate_into_the_reference_base_slot() {
    let mut a = acc(b"AAAAAAAAAA");
    let rec = support::make_record(0, vec![rust_htslib::bam::record::Cigar::Match(10)], Some("10"), "AAAAAAAAAA");
    a.ingest(&rec).unwrap();
    a.finalize();
    assert_eq!(a.bases[0].num_bases[0], 1);
    assert_eq!(a.bases[0].total_coverage(), 1);
}

#[test]
fn mismatches_land_in_the_observed_bases_slot_not_the_reference_slot() {
    let mut a = acc(b"AAAAAAAAAA");
    let rec = support::make_record(0, vec![rust_htslib::bam::record::Cigar::Match(10)], Some("4C5"), "AAAACAAAAA");
    a.ingest(&rec).unwrap();
    a.finalize();
    assert_eq!(a.bases[4].num_bases[1], 1);
    assert_eq!(a.bases[4].num_bases[0], 0);
    assert_eq!(a.bases[4].non_ref_count(), 1);
}

#[test]
fn short_insertions_below_the_size_filter_are_counted_not_recorded() {
    use rust_htslib::bam::record::Cigar;
    let mut a = acc(b"AAAAAAAAAA");
    let rec = support::make_record(0, vec![Cigar::Match(5), Cigar::Ins(2), Cigar::Match(5)], Some("10"), "AAAAAGGAAAAA");
    a.ingest(&rec).unwrap();
    a.finalize();
    assert_eq!(a.bases[4].num_short_ins, 1);
    assert!(a.bases[4].ins_events.is_empty());
}

#[test]
fn qualifying_insertions_are_recorded_and_drive_consensus_indel_fields() {
    use rust_htslib::bam::record::Cigar;
    let ref_seq = b"AAAAAAAAAA";
    let mut a = acc(ref_seq);
    for _ in 0..4 {
        let rec = support::make_record(0, vec![Cigar::Match(5), Cigar::Ins(6), Cigar::Match(5)], Some("10"), "AAAAAGGGGGGAAAAA");
        a.ingest(&rec).unwrap();
    }
    a.finalize();
    let base = &a.bases[4];
    assert_eq!(base.ins_events.len(), 4);
    assert_eq!(base.max_con_type, ConIndelType::Insertion);
    assert_eq!(base.max_con_indel_num, 4);
    assert!(base.max_con_indel_ratio > 0.9);
}

#[test]
fn qualifying_deletions_populate_del_span_across_their_whole_extent() {
    use rust_htslib::bam::record::Cigar;
    let ref_seq = b"AAAAAAAAAA";
    let mut a = acc(ref_seq);
    let rec = support::make_record(0, vec![Cigar::Match(4), Cigar::Del(3), Cigar::Match(3)], Some("4^AAA3"), "AAAAAAA");
    a.ingest(&rec).unwrap();
    a.finalize();
    assert_eq!(a.bases[4].del_events.len(), 1);
    assert_eq!(a.bases[4].del_span_count, 1);
    assert_eq!(a.bases[5].del_span_count, 1);
    assert_eq!(a.bases[6].del_span_count, 1);
    assert!(a.bases[5].del_events.is_empty(), "only the anchor base gets a DelEvent");
}

#[test]
fn homopolymer_insertions_bucket_together_even_when_not_byte_identical() {
    use rust_htslib::bam::record::Cigar;
    let ref_seq = b"AAAAAAAAAA";
    let mut a = acc(ref_seq);
    let variants = ["GGG", "GGGG", "GGGGG"];
    for v in variants {
        let seq = format!("AAAAA{}AAAAA", v);
        let rec = support::make_record(0, vec![Cigar::Match(5), Cigar::Ins(v.len() as u32), Cigar::Match(5)], Some("10"), &seq);
        a.ingest(&rec).unwrap();
    }
    a.finalize();
    assert_eq!(a.bases[4].max_con_indel_num, 3, "all three homopolymer-G insertions bucket together");
}

#[test]
fn polymer_flag_marks_exact_two_length_homopolymer_runs() {
    let mut a = acc(b"CAATG");
    a.finalize();
    assert!(a.bases[1].polymer_flag, "first A of the AA pair");
    assert!(a.bases[2].polymer_flag, "second A of the AA pair");
    assert!(!a.bases[0].polymer_flag);
    assert!(!a.bases[3].polymer_flag);
    assert!(!a.bases[4].polymer_flag);
}

#[test]
fn polymer_flag_uses_flank_base_at_block_edges() {
    let mut a = acc_with_flanks(b"ATG", Some(b'A'), None);
    a.finalize();
    assert!(a.bases[0].polymer_flag, "left flank matches the first base");
    assert!(!a.bases[2].polymer_flag, "no right flank available");
}

#[test]
fn qualifying_clips_are_recorded_with_left_end_flag() {
    use rust_htslib::bam::record::Cigar;
    let mut a = acc(b"AAAAAAAAAA");
    let rec = support::make_record(0, vec![Cigar::SoftClip(6), Cigar::Match(4)], Some("4"), "CCCCCCAAAA");
    a.ingest(&rec).unwrap();
    a.finalize();
    assert_eq!(a.bases[0].clip_events.len(), 1);
    assert!(a.bases[0].clip_events[0].left_end);
}
