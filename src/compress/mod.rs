// Transparent decompression of delta streams.
//
// - `algorithm`: Compression enum, magic detection, packed descriptors
// - `backend`:   Per-algorithm decoder dispatch (gzip, bzip2, lzma, xz)
// - `reader`:    DecompressReader: exact reads, skips, digest tee

pub mod algorithm;
pub mod backend;
pub mod reader;

pub use algorithm::{Compression, CompressionDescriptor};
pub use reader::DecompressReader;
