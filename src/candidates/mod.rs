pub mod reg;
pub mod extractor;

pub use reg::{CandidateRegion, RegionArena, RegionId, SvType};
pub use extractor::CandidateExtractor;
