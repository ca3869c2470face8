//! Candidate-region representation, owned by an arena rather than by
//! pointers shared between the block that found it and the mate-clip
//! reconciler that later re-groups it — see spec section 9's ownership
//! redesign note.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SvType {
    Uncertain,
    Ins,
    Del,
    Dup,
    Inv,
    Tra,
    Bnd,
    Mix,
}

#[derive(Debug, Clone)]
pub struct CandidateRegion {
    pub chrname: String,
    pub start_ref_pos: i64,
    pub end_ref_pos: i64,
    pub var_type: SvType,
    pub sv_len: i64,
    pub short_sv_flag: bool,
}

impl CandidateRegion {
    pub fn new(chrname: impl Into<String>, start_ref_pos: i64, end_ref_pos: i64, var_type: SvType) -> Self {
        let sv_len = end_ref_pos - start_ref_pos + 1;
        CandidateRegion { chrname: chrname.into(), start_ref_pos, end_ref_pos, var_type, sv_len, short_sv_flag: false }
    }

    pub fn overlaps(&self, other: &CandidateRegion) -> bool {
        self.chrname == other.chrname && self.start_ref_pos <= other.end_ref_pos && other.start_ref_pos <= self.end_ref_pos
    }

    pub fn overlaps_within(&self, other: &CandidateRegion, slop: i64) -> bool {
        self.chrname == other.chrname
            && self.start_ref_pos - slop <= other.end_ref_pos
            && other.start_ref_pos - slop <= self.end_ref_pos
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId(pub usize);

/// Owns every `CandidateRegion` a chromosome's mate-clip reconciliation
/// touches. Everything downstream holds a `RegionId` instead of a
/// reference, so a region can be looked up from many owners (a
/// `MateClipRegion`'s four anchor slots) without Rust's borrow checker or a
/// runtime ref-count needing to arbitrate who frees it.
#[derive(Debug, Default)]
pub struct RegionArena {
    regions: Vec<CandidateRegion>,
}

impl RegionArena {
    pub fn new() -> Self {
        RegionArena { regions: Vec::new() }
    }

    pub fn alloc(&mut self, region: CandidateRegion) -> RegionId {
        self.regions.push(region);
        RegionId(self.regions.len() - 1)
    }

    pub fn get(&self, id: RegionId) -> &CandidateRegion {
        &self.regions[id.0]
    }

    pub fn get_mut(&mut self, id: RegionId) -> &mut CandidateRegion {
        &mut self.regions[id.0]
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
