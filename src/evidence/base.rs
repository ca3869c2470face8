//! Per-base evidence accumulated while a block ingests alignment records.

/// Reference-base classification used to index `Base::num_bases`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefBase {
    A,
    C,
    G,
    T,
    N,
    /// IUPAC ambiguity code (anything other than A/C/G/T/N). A block never
    /// accumulates coverage at one of these positions; doing so means the
    /// reference and the alignment disagree about what's even possible here,
    /// which is a `ReferenceCorrupt` condition, not a variant call.
    Ambiguous,
}

impl RefBase {
    pub fn from_char(c: u8) -> RefBase {
        match c.to_ascii_uppercase() {
            b'A' => RefBase::A,
            b'C' => RefBase::C,
            b'G' => RefBase::G,
            b'T' => RefBase::T,
            b'N' => RefBase::N,
            _ => RefBase::Ambiguous,
        }
    }

    /// Index into the 0..=4 base-count slots, or `None` for an ambiguity
    /// code (which has no count slot of its own).
    pub fn idx(self) -> Option<usize> {
        match self {
            RefBase::A => Some(0),
            RefBase::C => Some(1),
            RefBase::G => Some(2),
            RefBase::T => Some(3),
            RefBase::N => Some(4),
            RefBase::Ambiguous => None,
        }
    }
}

pub fn base_char_idx(c: u8) -> Option<usize> {
    match c.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        b'N' => Some(4),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct InsEvent {
    pub pos: i64,
    pub seq: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct DelEvent {
    pub pos: i64,
    pub seq: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipEvent {
    pub pos: i64,
    pub hard: bool,
    /// True when the clip is anchored at the read's start-query-position 1
    /// (the decoder's single anchoring rule — see `SegmentDecoder`).
    pub left_end: bool,
    pub length: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConIndelType {
    Unused,
    Insertion,
    Deletion,
}

/// One reference position's worth of accumulated alignment evidence.
#[derive(Debug, Clone)]
pub struct Base {
    pub ref_base: RefBase,
    pub ref_char: u8,
    /// Per-base-category counts: `[A, C, G, T, N, total]`. `total` is filled
    /// in by `BlockAccumulator::finalize` as the sum of the first five.
    pub num_bases: [u32; 6],
    pub ins_events: Vec<InsEvent>,
    pub del_events: Vec<DelEvent>,
    pub clip_events: Vec<ClipEvent>,
    pub num_short_ins: u32,
    pub num_short_del: u32,
    /// Count of deletions (long enough to have earned a `DelEvent`) that
    /// span this position, whether or not their anchor base is here.
    pub del_span_count: u32,
    pub polymer_flag: bool,
    pub max_con_type: ConIndelType,
    pub max_con_indel_num: u32,
    pub max_con_indel_ratio: f32,
}

impl Base {
    pub fn new(ref_char: u8) -> Base {
        Base {
            ref_base: RefBase::from_char(ref_char),
            ref_char,
            num_bases: [0; 6],
            ins_events: Vec::new(),
            del_events: Vec::new(),
            clip_events: Vec::new(),
            num_short_ins: 0,
            num_short_del: 0,
            del_span_count: 0,
            polymer_flag: false,
            max_con_type: ConIndelType::Unused,
            max_con_indel_num: 0,
            max_con_indel_ratio: 0.0,
        }
    }

    pub fn total_coverage(&self) -> u32 {
        self.num_bases[5]
    }

    /// Number of observed bases at this position that disagree with the
    /// reference base. Always zero at an ambiguous reference position
    /// (no valid "non-reference" count can be formed there).
    pub fn non_ref_count(&self) -> u32 {
        match self.ref_base.idx() {
            Some(ref_idx) => self.num_bases.iter().take(5).enumerate()
                .filter(|(i, _)| *i != ref_idx)
                .map(|(_, c)| *c)
                .sum(),
            None => 0,
        }
    }

    pub fn is_high_clip(&self, clip_count_thres: u32) -> bool {
        self.clip_events.len() as u32 > clip_count_thres
    }
}

/// True when `seq` is a run of one repeated base (a homopolymer), returning
/// that base. Used to bucket insertion events that are not byte-identical
/// but are "the same kind of slip" (e.g. `AAA` vs `AAAAA`).
pub fn homopolymer_leading_base(seq: &[u8]) -> Option<u8> {
    let first = *seq.first()?;
    if seq.iter().all(|&b| b == first) {
        Some(first)
    } else {
        None
    }
}
