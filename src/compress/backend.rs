// Decompressor dispatch for delta streams.
//
// Each algorithm maps to a `Read` adapter over the raw input:
//   - gzip  (via flate2, feature-gated `gzip`)
//   - bzip2 (via bzip2, feature-gated `bzip2`)
//   - lzma / xz (via xz2, feature-gated `lzma`)
//   - none  (passthrough)
//
// Every decoder is incremental: plaintext is produced only as the caller
// reads it. lzip has no decoder here.

use std::io::Read;

use super::algorithm::Compression;
use crate::error::{Error, Result};

/// A boxed plaintext reader produced by [`open_decoder`].
pub type PlainReader<'a> = Box<dyn Read + 'a>;

/// Wrap `input` in the decoder for `algorithm`.
pub fn open_decoder<'a, R: Read + 'a>(algorithm: Compression, input: R) -> Result<PlainReader<'a>> {
    match algorithm {
        Compression::None => Ok(Box::new(input)),

        #[cfg(feature = "gzip")]
        Compression::Gzip => Ok(Box::new(flate2::read::GzDecoder::new(input))),

        #[cfg(not(feature = "gzip"))]
        Compression::Gzip => Err(not_compiled_in(algorithm, "gzip")),

        #[cfg(feature = "bzip2")]
        Compression::Bzip2 => Ok(Box::new(bzip2::read::BzDecoder::new(input))),

        #[cfg(not(feature = "bzip2"))]
        Compression::Bzip2 => Err(not_compiled_in(algorithm, "bzip2")),

        #[cfg(feature = "lzma")]
        Compression::Lzma => {
            let stream = xz2::stream::Stream::new_lzma_decoder(u64::MAX)
                .map_err(|e| Error::Internal(format!("lzma decoder setup failed: {e}")))?;
            Ok(Box::new(xz2::read::XzDecoder::new_stream(input, stream)))
        }

        #[cfg(feature = "lzma")]
        Compression::Xz => Ok(Box::new(xz2::read::XzDecoder::new(input))),

        #[cfg(not(feature = "lzma"))]
        Compression::Lzma | Compression::Xz => Err(not_compiled_in(algorithm, "lzma")),

        Compression::Lzip => Err(Error::format(
            "lzip-compressed delta streams are not supported",
        )),
    }
}

#[cfg(not(all(feature = "gzip", feature = "bzip2", feature = "lzma")))]
fn not_compiled_in(algorithm: Compression, feature: &str) -> Error {
    Error::format(format!(
        "{algorithm} delta stream requires the '{feature}' feature"
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
