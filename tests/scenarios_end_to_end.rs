mod support;

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use rust_htslib::bam::record::Cigar;

use longsv_detect::candidates::{CandidateRegion, SvType};
use longsv_detect::config::DetectParams;
use longsv_detect::errors::Result;
use longsv_detect::genome::{ClipRegionAnalyzer, MateClipAnalysis};
use longsv_detect::reads::AlnRecord;
use longsv_detect::run_detect;

use support::{FakeAlignmentFactory, FakeReferenceSource, PassthroughClipAnalyzer};

fn uniform_chrom(len: usize) -> Vec<u8> {
    vec![b'A'; len]
}

/// Builds an MD string for a pure-`M` record by walking reference and
/// observed bases in lockstep; only valid when the record carries no
/// insertions or deletions.
fn build_md(reference: &[u8], observed: &[u8]) -> String {
    let mut out = String::new();
    let mut run = 0u32;
    for (r, o) in reference.iter().zip(observed.iter()) {
        if r.eq_ignore_ascii_case(o) {
            run += 1;
        } else {
            out.push_str(&run.to_string());
            run = 0;
            out.push(*r as char);
        }
    }
    out.push_str(&run.to_string());
    out
}

fn read_candidate_file(out_dir: &std::path::Path, chrname: &str, suffix: &str) -> String {
    let path = out_dir.join("1_candidates").join(chrname).join(format!("{}_{}", chrname, suffix));
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {}: {}", path.display(), e))
}

fn run(chrname: &str, chrom: Vec<u8>, records: Vec<AlnRecord>, analyzer: &dyn ClipRegionAnalyzer, params: &DetectParams) -> tempfile::TempDir {
    let reference = FakeReferenceSource { sequences: HashMap::from([(chrname.to_string(), chrom)]) };
    let factory = FakeAlignmentFactory { records: Arc::new(HashMap::from([(chrname.to_string(), records)])) };
    let out_dir = tempfile::tempdir().unwrap();
    run_detect(&[chrname.to_string()], &reference, &factory, analyzer, out_dir.path(), params).unwrap();
    out_dir
}

fn default_test_params() -> DetectParams {
    let mut p = DetectParams::default();
    p.slide_size = 20;
    p.block_size = 1_000;
    p
}

#[test]
fn pure_insertion_surfaces_as_an_ins_candidate() {
    // Two reads anchor their insertion at position 150, two at 151 — together
    // a 2-base-wide consensus-insertion run, wide enough to clear
    // min_sv_size_usr.
    let chrom = uniform_chrom(300);
    let ins = "GGGGGG";
    let mut records = Vec::new();
    for _ in 0..2 {
        let cigar = vec![Cigar::Match(149), Cigar::Ins(6), Cigar::Match(151)];
        let seq = format!("{}{}{}", "A".repeat(149), ins, "A".repeat(151));
        records.push(support::make_record(0, cigar, Some("300"), &seq));
    }
    for _ in 0..2 {
        let cigar = vec![Cigar::Match(150), Cigar::Ins(6), Cigar::Match(150)];
        let seq = format!("{}{}{}", "A".repeat(150), ins, "A".repeat(150));
        records.push(support::make_record(0, cigar, Some("300"), &seq));
    }

    let analyzer = PassthroughClipAnalyzer;
    let out_dir = run("chr1", chrom, records, &analyzer, &default_test_params());

    let indels = read_candidate_file(out_dir.path(), "chr1", "INDEL_candidate");
    assert!(indels.contains("150"), "expected an indel candidate around position 150, got: {}", indels);
    let line = indels.lines().next().expect("expected one indel candidate line");
    assert_eq!(line.split('\t').count(), 3, "INDEL_candidate lines carry exactly chrname/startRefPos/endRefPos");
}

#[test]
fn pure_deletion_surfaces_as_a_del_candidate_spanning_the_whole_deleted_run() {
    let chrom = uniform_chrom(300);
    let mut records = Vec::new();
    for _ in 0..3 {
        let cigar = vec![Cigar::Match(149), Cigar::Del(10), Cigar::Match(141)];
        let seq = "A".repeat(290);
        let md = format!("149^{}141", "A".repeat(10));
        records.push(support::make_record(0, cigar, Some(&md), &seq));
    }

    let analyzer = PassthroughClipAnalyzer;
    let out_dir = run("chr1", chrom, records, &analyzer, &default_test_params());

    let indels = read_candidate_file(out_dir.path(), "chr1", "INDEL_candidate");
    let line = indels.lines().next().expect("expected one del candidate line");
    let fields: Vec<&str> = line.split('\t').collect();
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[1].parse::<i64>().unwrap(), 150);
    assert_eq!(fields[2].parse::<i64>().unwrap(), 159);
}

#[test]
fn clean_mismatch_surfaces_as_an_snv_not_an_indel() {
    let chrom = uniform_chrom(300);
    let mut observed = chrom.clone();
    observed[209] = b'C'; // position 210, 1-based

    let mut records = Vec::new();
    for _ in 0..3 {
        let md = build_md(&chrom, &observed);
        records.push(support::make_record(0, vec![Cigar::Match(300)], Some(&md), &String::from_utf8(observed.clone()).unwrap()));
    }

    let analyzer = PassthroughClipAnalyzer;
    let out_dir = run("chr1", chrom, records, &analyzer, &default_test_params());

    let snvs = read_candidate_file(out_dir.path(), "chr1", "SNV_candidate");
    assert!(snvs.contains("210"), "expected position 210 in SNV candidates, got: {}", snvs);
    let indels = read_candidate_file(out_dir.path(), "chr1", "INDEL_candidate");
    assert!(indels.is_empty(), "a clean mismatch must never also surface as an indel");
}

struct DupAnalyzer;

impl ClipRegionAnalyzer for DupAnalyzer {
    fn analyze(&self, region: &CandidateRegion) -> Result<MateClipAnalysis> {
        let right = CandidateRegion::new(region.chrname.clone(), region.start_ref_pos + 50, region.start_ref_pos + 70, SvType::Dup);
        Ok(MateClipAnalysis {
            left: Some(region.clone()),
            right: Some(right),
            left_clip_pos_num: 5,
            right_clip_pos_num: 5,
            left_mean_clip_pos: region.start_ref_pos as f64,
            right_mean_clip_pos: (region.start_ref_pos + 50) as f64,
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
fn split_read_clip_pair_reconciles_into_a_dup_candidate() {
    let chrom = uniform_chrom(300);
    let mut records = Vec::new();
    for _ in 0..5 {
        let cigar = vec![Cigar::SoftClip(8), Cigar::Match(100)];
        let seq = format!("{}{}", "C".repeat(8), "A".repeat(100));
        records.push(support::make_record(69, cigar, Some("100"), &seq));
    }

    let analyzer = DupAnalyzer;
    let out_dir = run("chr1", chrom, records, &analyzer, &default_test_params());

    let clips = read_candidate_file(out_dir.path(), "chr1", "clipReg_candidate");
    assert_eq!(clips.lines().count(), 1, "one mate-clip record line per reconciled pair");
    let line = clips.lines().next().unwrap();
    let fields: Vec<&str> = line.split('\t').collect();
    assert_eq!(fields.len(), 14, "chr1/ls1/le1/chr2/ls2/le2/mated_flag/####/leftMeanClipPos/rightMeanClipPos/sv_type/dup_num/leftClipPosNum/rightClipPosNum");
    assert_eq!(fields[6], "1", "reg_mated_flag");
    assert_eq!(fields[7], "####");
    assert_eq!(fields[10], "DUP");
    assert_eq!(fields[11], "1", "dup_num is populated for a DUP pair");
}

#[test]
fn a_heavily_mismatched_run_is_masked_as_mis_alignment_and_never_becomes_an_snv() {
    let chrom = uniform_chrom(100);
    let mut observed = chrom.clone();
    for p in 40..=69 {
        observed[p - 1] = b'C';
    }
    let mut isolated = chrom.clone();
    isolated[84] = b'G'; // position 85

    let mut records = Vec::new();
    for _ in 0..3 {
        let md = build_md(&chrom, &observed);
        records.push(support::make_record(0, vec![Cigar::Match(100)], Some(&md), &String::from_utf8(observed.clone()).unwrap()));
    }
    for _ in 0..3 {
        let md = build_md(&chrom, &isolated);
        records.push(support::make_record(0, vec![Cigar::Match(100)], Some(&md), &String::from_utf8(isolated.clone()).unwrap()));
    }

    let mut params = DetectParams::default();
    params.slide_size = 5;
    params.block_size = 1_000;
    params.sub_mis_aln_reg_ratio_thres = 0.5;
    params.gapped_mis_aln_reg_num_thres = 0;
    params.min_mis_aln_reg_num_thres = 3;
    params.non_ref_count_thres = 2;

    let analyzer = PassthroughClipAnalyzer;
    let out_dir = run("chr1", chrom, records, &analyzer, &params);

    let misaln = read_candidate_file(out_dir.path(), "chr1", "misaln_reg");
    assert!(!misaln.is_empty(), "the heavy-mismatch run must be reported as mis-aligned");

    let snvs = read_candidate_file(out_dir.path(), "chr1", "SNV_candidate");
    // windows masked as mis-aligned cover mid positions 41..=70; the zone's
    // first base (40) belongs to an earlier, non-candidate window and is not
    // part of this assertion.
    for p in 41..=69 {
        assert!(!snvs.contains(&format!("\t{}\n", p)), "position {} is inside the masked run and must not surface as an SNV", p);
    }
    assert!(snvs.contains("85"), "the isolated mismatch outside the masked run must still surface");
}
