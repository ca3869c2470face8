//! Sliding windows over a block's `Base` array (C4).

use crate::evidence::Base;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    /// The first `2 * slide_size` bases of the chromosome (half-width).
    Head,
    /// A full-width `3 * slide_size` window in the interior of a block.
    Inner,
    /// The last `2 * slide_size` bases of the chromosome (half-width).
    Tail,
}

/// One sliding window. Only the middle third (`start_mid_pos..=end_mid_pos`)
/// ever contributes candidate signatures; head and tail windows have no
/// flanking context so their "mid part" is the whole window.
pub struct Region<'a> {
    pub chrname: String,
    pub start_r_pos: i64,
    pub end_r_pos: i64,
    pub start_mid_pos: i64,
    pub end_mid_pos: i64,
    pub bases: &'a [Base],
    pub kind: RegionKind,
}

impl<'a> Region<'a> {
    pub fn new(chrname: impl Into<String>, start_r_pos: i64, end_r_pos: i64, bases: &'a [Base], kind: RegionKind, slide_size: i64) -> Region<'a> {
        let (start_mid_pos, end_mid_pos) = match kind {
            RegionKind::Inner => (start_r_pos + slide_size, start_r_pos + 2 * slide_size - 1),
            RegionKind::Head | RegionKind::Tail => (start_r_pos, end_r_pos),
        };
        Region { chrname: chrname.into(), start_r_pos, end_r_pos, start_mid_pos, end_mid_pos, bases, kind }
    }

    pub fn mid_bases(&self) -> &[Base] {
        let lo = (self.start_mid_pos - self.start_r_pos) as usize;
        let hi = (self.end_mid_pos - self.start_r_pos) as usize;
        &self.bases[lo..=hi]
    }

    /// True when every base in the window sits on an undefined (`N`/
    /// ambiguous) reference stretch — such windows carry no evidence at all
    /// and are skipped rather than scored.
    pub fn whole_ref_gap(&self) -> bool {
        self.bases.iter().all(|b| matches!(b.ref_base, crate::evidence::RefBase::N | crate::evidence::RefBase::Ambiguous))
    }
}
