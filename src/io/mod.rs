/// I/O abstractions for reading disk images

/// Random-access byte sources
pub mod source;

pub use source::{read_prefix, ByteSource};
