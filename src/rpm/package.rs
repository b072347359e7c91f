// Minimal RPM package reader.
//
// Reads lead, signature header, padding and main header, then optionally
// the payload archive. Only what the delta reader and its callers need is
// exposed: NEVR, payload description, section sizes and offsets.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::digest::DynDigest;

use super::header::{Header, tags};
use crate::codec;
use crate::compress::{Compression, DecompressReader};
use crate::digest::DigestAlgorithm;
use crate::error::{Error, Result};

pub const RPM_LEAD_MAGIC: [u8; 4] = [0xED, 0xAB, 0xEE, 0xDB];
pub const RPM_LEAD_SIZE: usize = 96;

const BUF_SIZE: usize = 64 * 1024;

/// What to do with the payload archive following the main header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArchiveMode {
    /// Stop right after the main header.
    #[default]
    Skip,
    /// Keep the archive bytes as stored.
    Raw,
    /// Keep the archive plaintext, decompressing it on the way.
    Decompress,
}

/// Container format of the payload archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Cpio,
    Xar,
}

/// An RPM package read up to (and optionally including) its archive.
#[derive(Debug, Clone)]
pub struct RpmPackage {
    lead: [u8; RPM_LEAD_SIZE],
    signature: Header,
    header: Header,
    archive: Option<Vec<u8>>,
    archive_compression: Option<Compression>,
    full_md5: Option<String>,
}

impl RpmPackage {
    /// Open and read the package at `path`.
    pub fn open(path: &Path, mode: ArchiveMode) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::with_capacity(BUF_SIZE, file);
        Self::read_from(&mut reader, mode)
    }

    /// Read a package from a stream positioned at its first byte.
    pub fn read_from<R: Read>(reader: &mut R, mode: ArchiveMode) -> Result<Self> {
        let mut lead = [0u8; RPM_LEAD_SIZE];
        reader
            .read_exact(&mut lead)
            .map_err(|e| Error::from_stream(e, "rpm lead"))?;
        if lead[..4] != RPM_LEAD_MAGIC {
            return Err(Error::format(format!(
                "bad rpm lead magic {}",
                codec::to_hex(&lead[..4])
            )));
        }

        let signature = Header::read_from(reader, "signature header")?;
        let mut padding = [0u8; 8];
        let pad = signature_padding(signature.size());
        reader
            .read_exact(&mut padding[..pad])
            .map_err(|e| Error::from_stream(e, "signature padding"))?;

        let header = Header::read_from(reader, "main header")?;
        log::debug!(
            "rpm: signature {} bytes (+{pad} padding), header {} bytes",
            signature.size(),
            header.size()
        );

        let mut pkg = Self {
            lead,
            signature,
            header,
            archive: None,
            archive_compression: None,
            full_md5: None,
        };

        let (bytes, digest) = match mode {
            ArchiveMode::Skip => return Ok(pkg),
            ArchiveMode::Raw => {
                let mut bytes = Vec::new();
                reader
                    .read_to_end(&mut bytes)
                    .map_err(|e| Error::from_stream(e, "rpm archive"))?;
                let mut md5 = pkg.sections_md5();
                md5.update(&bytes);
                (bytes, md5.finalize())
            }
            ArchiveMode::Decompress => {
                let mut stream = DecompressReader::with_digest(&mut *reader, pkg.sections_md5())?;
                pkg.archive_compression = Some(stream.algorithm());
                let bytes = stream.drain("rpm archive")?;
                let digest = stream
                    .finish()?
                    .ok_or_else(|| Error::Internal("archive digest missing".into()))?;
                (bytes, digest)
            }
        };

        log::debug!("rpm: archive {} bytes", bytes.len());
        pkg.archive = Some(bytes);
        pkg.full_md5 = Some(codec::to_hex(&digest));
        Ok(pkg)
    }

    /// MD5 context primed with lead, signature and header.
    fn sections_md5(&self) -> Box<dyn DynDigest> {
        let mut md5 = DigestAlgorithm::Md5.hasher();
        md5.update(&self.lead);
        md5.update(self.signature.as_bytes());
        md5.update(self.header.as_bytes());
        md5
    }

    fn required_string(&self, tag: u32, what: &str) -> Result<&str> {
        self.header
            .string(tag)?
            .ok_or_else(|| Error::format(format!("rpm header has no {what}")))
    }

    pub fn lead(&self) -> &[u8; RPM_LEAD_SIZE] {
        &self.lead
    }

    pub fn signature(&self) -> &Header {
        &self.signature
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Main header block as stored.
    pub fn header_bytes(&self) -> &[u8] {
        self.header.as_bytes()
    }

    pub fn signature_size(&self) -> u64 {
        self.signature.size() as u64
    }

    pub fn header_size(&self) -> u64 {
        self.header.size() as u64
    }

    /// Absolute file offset where the payload archive starts.
    pub fn archive_offset(&self) -> u64 {
        (RPM_LEAD_SIZE + self.signature.size() + signature_padding(self.signature.size())) as u64
            + self.header_size()
    }

    /// The archive, if it was read.
    pub fn archive(&self) -> Option<&[u8]> {
        self.archive.as_deref()
    }

    /// Detected compression of the archive when read with [`ArchiveMode::Decompress`].
    pub fn archive_compression(&self) -> Option<Compression> {
        self.archive_compression
    }

    /// Lead + signature + padding + header + archive bytes read.
    pub fn size_full(&self) -> u64 {
        self.archive_offset() + self.archive.as_ref().map_or(0, |a| a.len() as u64)
    }

    /// Lead bytes followed by the signature header, as stored.
    pub fn lead_and_signature(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(RPM_LEAD_SIZE + self.signature.size());
        out.extend_from_slice(&self.lead);
        out.extend_from_slice(self.signature.as_bytes());
        out
    }

    /// Hex MD5 over lead, signature, header and archive (padding excluded).
    ///
    /// Only available when the archive was read.
    pub fn full_md5(&self) -> Option<&str> {
        self.full_md5.as_deref()
    }

    /// `name-[epoch:]version-release` of the package.
    pub fn nevr(&self) -> Result<String> {
        let name = self.required_string(tags::NAME, "name")?;
        let version = self.required_string(tags::VERSION, "version")?;
        let release = self.required_string(tags::RELEASE, "release")?;
        Ok(match self.header.u32(tags::EPOCH)? {
            Some(epoch) => format!("{name}-{epoch}:{version}-{release}"),
            None => format!("{name}-{version}-{release}"),
        })
    }

    /// Compression of the payload, from the PAYLOADCOMPRESSOR tag.
    pub fn payload_compression(&self) -> Result<Compression> {
        let name = self
            .header
            .string(tags::PAYLOAD_COMPRESSOR)?
            .ok_or_else(|| Error::format("rpm header has no payload compressor"))?;
        Compression::from_payload_compressor(name)
            .ok_or_else(|| Error::format(format!("unknown payload compressor '{name}'")))
    }

    /// Compression level from PAYLOADFLAGS (a single digit 1-9).
    pub fn compression_level(&self) -> Result<u8> {
        let flags = self
            .header
            .string(tags::PAYLOAD_FLAGS)?
            .ok_or_else(|| Error::format("rpm header has no payload flags"))?;
        match flags.as_bytes() {
            [d @ b'1'..=b'9'] => Ok(d - b'0'),
            _ => Err(Error::format(format!("unusable payload flags '{flags}'"))),
        }
    }

    pub fn payload_format(&self) -> Result<PayloadFormat> {
        match self.header.string(tags::PAYLOAD_FORMAT)? {
            Some("cpio") => Ok(PayloadFormat::Cpio),
            Some("xar") => Ok(PayloadFormat::Xar),
            Some(other) => Err(Error::format(format!("unknown payload format '{other}'"))),
            None => Err(Error::format("rpm header has no payload format")),
        }
    }

    /// Offset of the PAYLOADFORMAT value inside the header data store.
    pub fn payload_format_offset(&self) -> Result<u32> {
        self.header
            .entry(tags::PAYLOAD_FORMAT)
            .map(|e| e.offset)
            .ok_or_else(|| Error::format("rpm header has no payload format"))
    }

    /// File digest algorithm; MD5 when the tag is absent.
    pub fn digest_algorithm(&self) -> Result<DigestAlgorithm> {
        match self.header.u32(tags::FILE_DIGEST_ALGO)? {
            None => Ok(DigestAlgorithm::Md5),
            Some(id) => DigestAlgorithm::from_rfc4880(id)
                .ok_or_else(|| Error::format(format!("unknown file digest algorithm {id}"))),
        }
    }
}

/// Bytes of zero padding after a signature header of `size` bytes.
pub fn signature_padding(size: usize) -> usize {
    (8 - size % 8) % 8
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
