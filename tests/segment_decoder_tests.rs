mod support;

use rust_htslib::bam::record::Cigar;

use longsv_detect::evidence::RefBase;
use longsv_detect::reads::{AlignmentSegment, CigarDialect, RefBaseLookup, SegmentDecoder, SegmentOp, SegmentPayload};

struct ConstRef(u8);
impl RefBaseLookup for ConstRef {
    fn ref_base_at(&self, _pos1: i64) -> Option<u8> {
        Some(self.0)
    }
}

#[test]
fn dialect_detection_prefers_eqx_over_md() {
    let cigar = vec![Cigar::Equal(5), Cigar::Diff(1), Cigar::Equal(4)];
    assert_eq!(CigarDialect::detect(&cigar, true).unwrap(), CigarDialect::EqualDiff);
}

#[test]
fn dialect_detection_falls_back_to_no_md() {
    let cigar = vec![Cigar::Match(10)];
    assert_eq!(CigarDialect::detect(&cigar, false).unwrap(), CigarDialect::MatchNoMd);
}

#[test]
fn dialect_detection_rejects_cigar_without_m_or_eqx() {
    let cigar = vec![Cigar::Ins(3), Cigar::Del(2)];
    assert!(CigarDialect::detect(&cigar, false).is_err());
}

#[test]
fn decode_with_md_splits_matches_and_mismatches() {
    let record = support::make_record(0, vec![Cigar::Match(10)], Some("4A5"), "AAAACAAAAA");
    let segs = SegmentDecoder::decode(&record, &ConstRef(b'A')).unwrap();
    assert_eq!(segs.len(), 3);
    assert!(matches!(segs[0].op, SegmentOp::Match));
    assert_eq!(segs[0].seg_len, 4);
    assert!(matches!(segs[1].op, SegmentOp::Mismatch));
    assert_eq!(segs[1].payload, SegmentPayload::Base(b'C'));
    assert_eq!(segs[1].start_ref_pos, 5);
    assert!(matches!(segs[2].op, SegmentOp::Match));
    assert_eq!(segs[2].seg_len, 5);
}

#[test]
fn decode_with_md_handles_insertion_and_deletion() {
    let record = support::make_record(0, vec![Cigar::Match(3), Cigar::Ins(2), Cigar::Match(3), Cigar::Del(2), Cigar::Match(2)], Some("3^TT2"), "AAAGGAAA");
    let segs = SegmentDecoder::decode(&record, &ConstRef(b'A')).unwrap();
    let ins = segs.iter().find(|s| matches!(s.op, SegmentOp::Ins)).unwrap();
    assert_eq!(ins.payload, SegmentPayload::Bases(b"GG".to_vec()));
    let del = segs.iter().find(|s| matches!(s.op, SegmentOp::Del)).unwrap();
    assert_eq!(del.payload, SegmentPayload::Bases(b"TT".to_vec()));
    assert_eq!(del.seg_len, 2);
}

#[test]
fn decode_no_md_compares_against_reference_lookup() {
    let record = support::make_record(0, vec![Cigar::Match(5)], None, "AACAA");
    let segs = SegmentDecoder::decode(&record, &ConstRef(b'A')).unwrap();
    assert_eq!(segs.len(), 3);
    assert_eq!(segs[0].seg_len, 2);
    assert!(matches!(segs[1].op, SegmentOp::Mismatch));
    assert_eq!(segs[2].seg_len, 2);
}

#[test]
fn decode_eqx_emits_per_base_mismatches() {
    let record = support::make_record(0, vec![Cigar::Equal(2), Cigar::Diff(2), Cigar::Equal(1)], None, "AATTA");
    let segs = SegmentDecoder::decode(&record, &ConstRef(b'A')).unwrap();
    let mismatches: Vec<&AlignmentSegment> = segs.iter().filter(|s| matches!(s.op, SegmentOp::Mismatch)).collect();
    assert_eq!(mismatches.len(), 2);
    assert_eq!(mismatches[0].seg_len, 1);
}

#[test]
fn clip_anchors_to_start_query_position_one() {
    // leading soft clip: anchors at the first aligned base.
    let leading = support::make_record(9, vec![Cigar::SoftClip(4), Cigar::Match(6)], Some("6"), "CCCCAAAAAA");
    let segs = SegmentDecoder::decode(&leading, &ConstRef(b'A')).unwrap();
    let clip = segs.iter().find(|s| matches!(s.op, SegmentOp::Clip { .. })).unwrap();
    assert_eq!(clip.start_query_pos, 1);
    assert_eq!(clip.start_ref_pos, 10);

    // trailing soft clip: anchors at the last aligned base, not past it.
    let trailing = support::make_record(9, vec![Cigar::Match(6), Cigar::SoftClip(4)], Some("6"), "AAAAAACCCC");
    let segs = SegmentDecoder::decode(&trailing, &ConstRef(b'A')).unwrap();
    let clip = segs.iter().find(|s| matches!(s.op, SegmentOp::Clip { .. })).unwrap();
    assert_ne!(clip.start_query_pos, 1);
    assert_eq!(clip.start_ref_pos, 15);
}

#[test]
fn decode_with_md_rejects_ref_skip_and_pad_ops() {
    let skip = support::make_record(0, vec![Cigar::Match(3), Cigar::RefSkip(2), Cigar::Match(3)], Some("6"), "AAAAAA");
    assert!(SegmentDecoder::decode(&skip, &ConstRef(b'A')).is_err());

    let pad = support::make_record(0, vec![Cigar::Match(3), Cigar::Pad(2), Cigar::Match(3)], Some("6"), "AAAAAA");
    assert!(SegmentDecoder::decode(&pad, &ConstRef(b'A')).is_err());
}

#[test]
fn decode_no_md_rejects_ref_skip_and_pad_ops() {
    let skip = support::make_record(0, vec![Cigar::Match(3), Cigar::RefSkip(2), Cigar::Match(3)], None, "AAAAAA");
    assert!(SegmentDecoder::decode(&skip, &ConstRef(b'A')).is_err());

    let pad = support::make_record(0, vec![Cigar::Match(3), Cigar::Pad(2), Cigar::Match(3)], None, "AAAAAA");
    assert!(SegmentDecoder::decode(&pad, &ConstRef(b'A')).is_err());
}

#[test]
fn ref_base_idx_maps_ambiguity_codes_out_of_band() {
    assert_eq!(RefBase::from_char(b'R').idx(), None);
    assert_eq!(RefBase::from_char(b'n').idx(), Some(4));
}
