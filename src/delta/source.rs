// Capability seams of the delta decoder.
//
// The tail and prefix decoding is written against two traits:
//   - `CompressedReader`: exact reads and skips over the delta tail stream
//   - `EmbeddedRpmSource`: what a standard delta needs from its leading RPM

use crate::codec;
use crate::compress::{Compression, DecompressReader};
use crate::error::Result;
use crate::rpm::RpmPackage;

/// Growth step of `CompressedReader::read_vec`.
const READ_CHUNK: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// CompressedReader
// ---------------------------------------------------------------------------

/// Plaintext view of the (possibly compressed) delta tail.
pub trait CompressedReader {
    /// Algorithm the stream was detected as.
    fn algorithm(&self) -> Compression;

    /// Fill `buf` completely; a short stream is a truncation error.
    fn read_into(&mut self, buf: &mut [u8], context: &str) -> Result<()>;

    /// Discard exactly `len` bytes without buffering them all.
    fn skip(&mut self, len: u64, context: &str) -> Result<()>;

    /// Close the stream. Only called once the whole tail decoded cleanly.
    fn finish(self) -> Result<()>
    where
        Self: Sized;

    /// Read `len` bytes into a fresh buffer, growing it chunk by chunk as
    /// the bytes arrive.
    fn read_vec(&mut self, len: usize, context: &str) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        while buf.len() < len {
            let start = buf.len();
            let n = (len - start).min(READ_CHUNK);
            buf.try_reserve(n)?;
            buf.resize(start + n, 0);
            self.read_into(&mut buf[start..], context)?;
        }
        Ok(buf)
    }

    fn read_be32(&mut self, context: &str) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_into(&mut buf, context)?;
        Ok(codec::decode_u32(buf))
    }

    fn read_be64(&mut self, context: &str) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_into(&mut buf, context)?;
        Ok(codec::decode_u64(buf))
    }
}

impl CompressedReader for DecompressReader<'_> {
    fn algorithm(&self) -> Compression {
        DecompressReader::algorithm(self)
    }

    fn read_into(&mut self, buf: &mut [u8], context: &str) -> Result<()> {
        DecompressReader::read_into(self, buf, context)
    }

    fn skip(&mut self, len: u64, context: &str) -> Result<()> {
        DecompressReader::skip(self, len, context)
    }

    fn finish(self) -> Result<()> {
        DecompressReader::finish(self).map(|_| ())
    }

    fn read_vec(&mut self, len: usize, context: &str) -> Result<Vec<u8>> {
        DecompressReader::read_vec(self, len, context)
    }
}

// ---------------------------------------------------------------------------
// EmbeddedRpmSource
// ---------------------------------------------------------------------------

/// The RPM a standard delta begins with.
pub trait EmbeddedRpmSource {
    /// `name-[epoch:]version-release` of the target package.
    fn nevr(&self) -> Result<String>;

    /// Payload compression of the target package.
    fn payload_compression(&self) -> Result<Compression>;

    /// File offset where the delta tail starts.
    fn size_full(&self) -> u64;
}

impl EmbeddedRpmSource for RpmPackage {
    fn nevr(&self) -> Result<String> {
        RpmPackage::nevr(self)
    }

    fn payload_compression(&self) -> Result<Compression> {
        RpmPackage::payload_compression(self)
    }

    fn size_full(&self) -> u64 {
        RpmPackage::size_full(self)
    }
}
