//! Destinations a sink can deliver lines to

#[cfg(feature = "file")]
pub mod file;
pub mod memory;
pub mod writer;

#[cfg(feature = "file")]
pub use file::FileDestination;
pub use memory::{MemoryBuffer, MemoryDestination};
pub use writer::WriterDestination;
