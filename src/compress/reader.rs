// Framed decompression reader.
//
// DecompressReader wraps a raw byte source with:
//   - algorithm detection from the leading magic (or a caller-supplied one)
//   - exact-length reads, big-endian integers, bounded-memory skips
//   - an optional digest tee fed with every plaintext byte handed out

use std::io::{self, Read};

use sha2::digest::DynDigest;

use super::algorithm::{Compression, MAGIC_PEEK_LEN};
use super::backend::{self, PlainReader};
use crate::codec;
use crate::error::{Error, Result};

/// Scratch size used by `skip`.
const SKIP_CHUNK: usize = 8 * 1024;

// ---------------------------------------------------------------------------
// DecompressReader
// ---------------------------------------------------------------------------

/// Reads the plaintext of a (possibly) compressed stream.
///
/// The reader is open from construction until [`finish`](Self::finish)
/// consumes it. Dropping it early releases the decompressor as well.
pub struct DecompressReader<'a> {
    algorithm: Compression,
    inner: PlainReader<'a>,
    digest: Option<Box<dyn DynDigest>>,
    bytes_read: u64,
}

impl<'a> DecompressReader<'a> {
    /// Detect the compression from the first bytes of `input`.
    pub fn new<R: Read + 'a>(input: R) -> Result<Self> {
        Self::detect(input, None)
    }

    /// Like [`new`](Self::new), teeing all plaintext into `digest`.
    pub fn with_digest<R: Read + 'a>(input: R, digest: Box<dyn DynDigest>) -> Result<Self> {
        Self::detect(input, Some(digest))
    }

    /// Use `algorithm` instead of detecting it.
    pub fn with_algorithm<R: Read + 'a>(input: R, algorithm: Compression) -> Result<Self> {
        Self::build(input, algorithm, None)
    }

    fn detect<R: Read + 'a>(mut input: R, digest: Option<Box<dyn DynDigest>>) -> Result<Self> {
        let mut head = [0u8; MAGIC_PEEK_LEN];
        let n = read_up_to(&mut input, &mut head)?;
        let algorithm = Compression::detect(&head[..n]);
        log::debug!("delta stream compression: {algorithm}");

        // Hand the peeked bytes back to the decoder.
        let replay = io::Cursor::new(head[..n].to_vec()).chain(input);
        Self::build(replay, algorithm, digest)
    }

    fn build<R: Read + 'a>(
        input: R,
        algorithm: Compression,
        digest: Option<Box<dyn DynDigest>>,
    ) -> Result<Self> {
        Ok(Self {
            algorithm,
            inner: backend::open_decoder(algorithm, input)?,
            digest,
            bytes_read: 0,
        })
    }

    /// Algorithm the stream is decoded with.
    pub fn algorithm(&self) -> Compression {
        self.algorithm
    }

    /// Plaintext bytes consumed so far (reads and skips).
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Fill `buf` completely or fail with `Truncated`.
    pub fn read_into(&mut self, buf: &mut [u8], context: &str) -> Result<()> {
        self.inner
            .read_exact(buf)
            .map_err(|e| Error::from_stream(e, context))?;
        self.consumed(buf);
        Ok(())
    }

    /// Read exactly `len` plaintext bytes into a fresh buffer.
    ///
    /// The buffer grows with the bytes actually produced, so a stream that
    /// ends early never costs the full declared length.
    pub fn read_vec(&mut self, len: usize, context: &str) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let got = self
            .by_ref()
            .take(len as u64)
            .read_to_end(&mut buf)
            .map_err(|e| Error::from_stream(e, context))?;
        if got < len {
            return Err(Error::truncated(context));
        }
        Ok(buf)
    }

    pub fn read_be32(&mut self, context: &str) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_into(&mut buf, context)?;
        Ok(codec::decode_u32(buf))
    }

    pub fn read_be64(&mut self, context: &str) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_into(&mut buf, context)?;
        Ok(codec::decode_u64(buf))
    }

    /// Discard `len` plaintext bytes through a fixed scratch buffer.
    ///
    /// Skipped bytes still go through the digest tee.
    pub fn skip(&mut self, len: u64, context: &str) -> Result<()> {
        let mut scratch = [0u8; SKIP_CHUNK];
        let mut remaining = len;
        while remaining > 0 {
            let n = remaining.min(SKIP_CHUNK as u64) as usize;
            self.read_into(&mut scratch[..n], context)?;
            remaining -= n as u64;
        }
        Ok(())
    }

    /// Drain the stream to its end.
    pub fn drain(&mut self, context: &str) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.inner
            .read_to_end(&mut out)
            .map_err(|e| Error::from_stream(e, context))?;
        self.consumed(&out);
        Ok(out)
    }

    /// Close the stream, returning the finalized tee digest if one was attached.
    pub fn finish(self) -> Result<Option<Box<[u8]>>> {
        log::trace!(
            "closing {} stream after {} plaintext bytes",
            self.algorithm,
            self.bytes_read
        );
        Ok(self.digest.map(|d| d.finalize()))
    }

    fn consumed(&mut self, bytes: &[u8]) {
        if let Some(digest) = self.digest.as_mut() {
            digest.update(bytes);
        }
        self.bytes_read += bytes.len() as u64;
    }
}

impl Read for DecompressReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.consumed(&buf[..n]);
        Ok(n)
    }
}

impl std::fmt::Debug for DecompressReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecompressReader")
            .field("algorithm", &self.algorithm)
            .field("bytes_read", &self.bytes_read)
            .field("digest", &self.digest.is_some())
            .finish()
    }
}

/// Read until `buf` is full or the input ends; returns the byte count.
fn read_up_to<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(Error::Io(e)),
        }
    }
    Ok(filled)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::to_hex;
    use crate::digest::DigestAlgorithm;

    fn plain_stream() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"DLT3");
        data.extend_from_slice(&codec::encode_u32(0xDEAD_BEEF));
        data.extend_from_slice(&codec::encode_u64(1 << 40));
        data.extend(std::iter::repeat_n(0xAB, 20_000));
        data.extend_from_slice(b"tail");
        data
    }

    #[test]
    fn uncompressed_fields() {
        let data = plain_stream();
        let mut r = DecompressReader::new(data.as_slice()).unwrap();
        assert_eq!(r.algorithm(), Compression::None);
        assert_eq!(r.read_vec(4, "magic").unwrap(), b"DLT3");
        assert_eq!(r.read_be32("u32").unwrap(), 0xDEAD_BEEF);
        assert_eq!(r.read_be64("u64").unwrap(), 1 << 40);
        r.skip(20_000, "filler").unwrap();
        assert_eq!(r.read_vec(4, "tail").unwrap(), b"tail");
        assert_eq!(r.bytes_read(), data.len() as u64);
        assert!(r.drain("rest").unwrap().is_empty());
        assert_eq!(r.finish().unwrap(), None);
    }

    #[test]
    fn short_input_is_truncated() {
        let mut r = DecompressReader::new(&b"DLT"[..]).unwrap();
        let err = r.read_be32("version").unwrap_err();
        assert!(matches!(err, Error::Truncated { .. }));

        let mut r = DecompressReader::new(&b"abcdef"[..]).unwrap();
        let err = r.skip(7, "add data").unwrap_err();
        assert!(matches!(err, Error::Truncated { .. }));

        // The declared length is never reserved up front.
        let mut r = DecompressReader::new(&b"abcdef"[..]).unwrap();
        let err = r.read_vec(usize::MAX, "target lead").unwrap_err();
        assert!(matches!(err, Error::Truncated { ref context } if context == "target lead"));
        assert_eq!(r.bytes_read(), 6);
    }

    #[test]
    fn empty_input() {
        let mut r = DecompressReader::new(io::empty()).unwrap();
        assert_eq!(r.algorithm(), Compression::None);
        assert!(r.drain("all").unwrap().is_empty());
    }

    #[test]
    fn digest_tee_sees_every_byte_once() {
        let data = plain_stream();
        let mut r =
            DecompressReader::with_digest(data.as_slice(), DigestAlgorithm::Md5.hasher()).unwrap();
        r.read_vec(4, "magic").unwrap();
        r.read_be32("u32").unwrap();
        r.skip(8, "u64").unwrap();
        let rest = r.drain("rest").unwrap();
        assert_eq!(rest.len(), data.len() - 16);
        let digest = r.finish().unwrap().unwrap();

        let mut expected = DigestAlgorithm::Md5.hasher();
        expected.update(&data);
        assert_eq!(to_hex(&digest), to_hex(&expected.finalize()));
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn detects_gzip_and_reads_through_it() {
        use std::io::Write;

        let data = plain_stream();
        let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
        enc.write_all(&data).unwrap();
        let compressed = enc.finish().unwrap();

        let mut r =
            DecompressReader::with_digest(compressed.as_slice(), DigestAlgorithm::Sha256.hasher())
                .unwrap();
        assert_eq!(r.algorithm(), Compression::Gzip);
        assert_eq!(r.read_vec(4, "magic").unwrap(), b"DLT3");
        let rest = r.drain("rest").unwrap();
        assert_eq!(rest, &data[4..]);

        let mut expected = DigestAlgorithm::Sha256.hasher();
        expected.update(&data);
        assert_eq!(
            r.finish().unwrap().unwrap().as_ref(),
            expected.finalize().as_ref()
        );
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn corrupt_gzip_is_reported() {
        let bogus = [0x1F, 0x8B, 0x08, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x03, 0xFF, 0xFF];
        let mut r = DecompressReader::new(&bogus[..]).unwrap();
        let err = r.read_be32("version").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Format);
    }

    #[test]
    fn caller_supplied_algorithm_skips_detection() {
        // Looks like gzip, but the caller says it is raw.
        let data = [0x1F, 0x8B, 0, 0, 0, 1];
        let mut r = DecompressReader::with_algorithm(&data[..], Compression::None).unwrap();
        assert_eq!(r.read_vec(6, "raw").unwrap(), data);
    }

    #[test]
    fn std_read_adapter_feeds_the_tee() {
        let mut r =
            DecompressReader::with_digest(&b"abc"[..], DigestAlgorithm::Md5.hasher()).unwrap();
        let mut out = Vec::new();
        io::copy(&mut r, &mut out).unwrap();
        assert_eq!(out, b"abc");
        assert_eq!(
            to_hex(&r.finish().unwrap().unwrap()),
            "900150983cd24fb0d6963f7d28e17f72"
        );
    }
}
