pub mod window_reader;

pub use window_reader::ReferenceWindow;
