use longsv_detect::block::tile_chromosome;

#[test]
fn tiles_cover_chromosome_with_exact_overlap() {
    let blocks = tile_chromosome(10_000, 1_000, 100);
    assert!(blocks.len() > 1);
    for w in blocks.windows(2) {
        let overlap = w[0].end_pos - w[1].start_pos + 1;
        assert_eq!(overlap, 200, "adjacent blocks must overlap by exactly 2*slide_size");
    }
    assert_eq!(blocks.first().unwrap().start_pos, 1);
    assert_eq!(blocks.last().unwrap().end_pos, 10_000);
}

#[test]
fn only_the_first_block_keeps_its_own_head_window() {
    let blocks = tile_chromosome(10_000, 1_000, 100);
    assert!(!blocks[0].head_ign_flag);
    for b in &blocks[1..] {
        assert!(b.head_ign_flag);
    }
}

#[test]
fn only_the_last_block_keeps_its_own_tail_window() {
    let blocks = tile_chromosome(10_000, 1_000, 100);
    let last = blocks.len() - 1;
    for (i, b) in blocks.iter().enumerate() {
        assert_eq!(b.tail_ign_flag, i != last);
    }
}

#[test]
fn single_block_chromosome_is_both_head_and_tail() {
    let blocks = tile_chromosome(500, 1_000, 100);
    assert_eq!(blocks.len(), 1);
    assert!(!blocks[0].head_ign_flag);
    assert!(!blocks[0].tail_ign_flag, "the only block has nothing downstream to cover its tail span");
    assert_eq!(blocks[0].start_pos, 1);
    assert_eq!(blocks[0].end_pos, 500);
}

#[test]
fn tail_block_is_truncated_to_chromosome_length_not_padded() {
    let blocks = tile_chromosome(2_150, 1_000, 100);
    let tail = blocks.last().unwrap();
    assert_eq!(tail.end_pos, 2_150);
    assert!(tail.end_pos - tail.start_pos + 1 <= 1_000);
}
