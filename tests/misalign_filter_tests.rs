use longsv_detect::window::{MisAlignFilter, WindowSignature};

fn reg(start: i64, end: i64, ratio: f64, high_clip: usize) -> longsv_detect::window::MisAlignReg {
    let sig = WindowSignature { disagreement_count: 0, high_clip_base_count: high_clip, mid_len: 100, disagr_reg_ratio: ratio };
    longsv_detect::window::MisAlignReg::from_signature(start, end, &sig)
}

fn filter() -> MisAlignFilter {
    MisAlignFilter { sub_mis_aln_reg_ratio_thres: 0.6, gapped_mis_aln_reg_num_thres: 1, min_mis_aln_reg_num_thres: 3 }
}

#[test]
fn a_short_run_below_the_minimum_length_with_a_break_is_dropped() {
    let f = filter();
    let mut regs = vec![reg(1, 100, 0.9, 0), reg(101, 200, 0.1, 0), reg(201, 300, 0.1, 0), reg(301, 400, 0.1, 0)];
    f.extract_runs(&mut regs);
    assert!(regs.is_empty());
}

#[test]
fn a_long_enough_contiguous_run_is_committed() {
    let f = filter();
    let mut regs = vec![reg(1, 100, 0.9, 0), reg(101, 200, 0.9, 0), reg(201, 300, 0.9, 0), reg(301, 400, 0.1, 0)];
    f.extract_runs(&mut regs);
    assert_eq!(regs.len(), 3);
    assert!(regs.iter().all(|r| r.mis_aln_flag));
}

#[test]
fn a_single_tolerated_gap_is_absorbed_into_the_surrounding_run_rather_than_splitting_it() {
    let f = filter();
    let mut regs = vec![
        reg(1, 100, 0.9, 0),
        reg(101, 200, 0.9, 0),
        reg(201, 300, 0.1, 0), // tolerated gap (<= gapped_mis_aln_reg_num_thres): one stray clean window
        reg(301, 400, 0.9, 0),
        reg(401, 500, 0.9, 0),
    ];
    f.extract_runs(&mut regs);
    assert_eq!(regs.len(), 5, "the whole run, gap included, is treated as one mis-alignment artifact");
}

#[test]
fn too_wide_a_gap_breaks_the_run_in_two() {
    let f = filter();
    // Two short candidate runs (length 2 each, below min_mis_aln_reg_num_thres
    // of 3), each sealed off by a 2-window non-candidate gap that exceeds
    // gapped_mis_aln_reg_num_thres (1) -- both runs end via a real break, so
    // both are subject to the minimum-length check and neither commits.
    let mut regs = vec![
        reg(1, 100, 0.9, 0),
        reg(101, 200, 0.9, 0),
        reg(201, 300, 0.1, 0),
        reg(301, 400, 0.1, 0),
        reg(401, 500, 0.9, 0),
        reg(501, 600, 0.9, 0),
        reg(601, 700, 0.1, 0),
        reg(701, 800, 0.1, 0),
    ];
    f.extract_runs(&mut regs);
    assert!(regs.is_empty(), "each side of the break is shorter than min_mis_aln_reg_num_thres on its own");
}

#[test]
fn clip_evidence_excludes_only_its_own_window_from_the_mis_alignment_flag() {
    let f = filter();
    let mut regs = vec![reg(1, 100, 0.9, 0), reg(101, 200, 0.9, 2), reg(201, 300, 0.9, 0)];
    f.extract_runs(&mut regs);
    assert_eq!(regs.len(), 2, "the high-clip window is dropped even though its neighbors still commit");
    assert!(regs.iter().all(|r| r.high_clip_base_count == 0));
}

#[test]
fn windows_below_the_disagreement_threshold_are_never_candidates() {
    let f = filter();
    let mut regs = vec![reg(1, 100, 0.2, 0), reg(101, 200, 0.3, 0)];
    f.extract_runs(&mut regs);
    assert!(regs.is_empty());
}
