pub mod segment;
pub mod decoder;

pub use segment::{AlignmentSegment, SegmentOp, SegmentPayload, CigarDialect};
pub use decoder::{AlnRecord, SegmentDecoder, RefBaseLookup};
