pub mod base;
pub mod accumulator;

pub use base::{Base, ConIndelType, RefBase, InsEvent, DelEvent, ClipEvent};
pub use accumulator::BlockAccumulator;
