// Digest algorithms used by RPM packages and the decompression tee.

use sha2::digest::DynDigest;

/// File digest algorithm of an RPM package (RFC 4880 hash ids).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    #[default]
    Md5,
    Sha256,
}

impl DigestAlgorithm {
    /// Map an RFC 4880 section 9.4 hash algorithm id.
    pub fn from_rfc4880(id: u32) -> Option<Self> {
        match id {
            1 => Some(Self::Md5),
            8 => Some(Self::Sha256),
            _ => None,
        }
    }

    pub const fn output_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha256 => 32,
        }
    }

    /// A fresh streaming hasher for this algorithm.
    pub fn hasher(self) -> Box<dyn DynDigest> {
        match self {
            Self::Md5 => Box::new(md5::Md5::default()),
            Self::Sha256 => Box::new(sha2::Sha256::default()),
        }
    }
}
