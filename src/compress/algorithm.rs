// Compression algorithm identifiers.
//
// Three encodings of the same enum show up in a delta RPM:
//   - the magic bytes at the start of a compressed stream (detection)
//   - the packed "compression descriptor" u32 in the delta tail
//   - the PAYLOADCOMPRESSOR string tag of an RPM header

use std::fmt;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Stream magics
// ---------------------------------------------------------------------------

pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];
pub const BZIP2_MAGIC: [u8; 3] = *b"BZh";
pub const XZ_MAGIC: [u8; 6] = [0xFD, b'7', b'z', b'X', b'Z', 0x00];
pub const LZIP_MAGIC: [u8; 4] = *b"LZIP";
/// lzma-alone: default properties byte followed by a little-endian dict size
/// whose two low bytes are zero for every preset.
pub const LZMA_MAGIC: [u8; 3] = [0x5D, 0x00, 0x00];

/// Longest magic we need to look at.
pub const MAGIC_PEEK_LEN: usize = 6;

// ---------------------------------------------------------------------------
// Descriptor codes (low byte of the packed u32 in the delta tail)
// ---------------------------------------------------------------------------

pub const DESC_UNCOMPRESSED: u8 = 0;
pub const DESC_GZIP: u8 = 1;
pub const DESC_BZIP2_OLD: u8 = 2;
pub const DESC_GZIP_RSYNC: u8 = 3;
pub const DESC_BZIP2: u8 = 4;
pub const DESC_LZMA: u8 = 5;
pub const DESC_XZ: u8 = 6;

/// Compression algorithm of a delta stream or of a target payload.
///
/// The discriminants are the stable numeric codes returned by
/// [`DeltaRpm::get_uint`](crate::DeltaRpm::get_uint).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Compression {
    #[default]
    None = 0,
    Gzip = 1,
    Bzip2 = 2,
    Lzma = 3,
    Xz = 4,
    Lzip = 5,
}

impl Compression {
    pub const fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Self::None,
            1 => Self::Gzip,
            2 => Self::Bzip2,
            3 => Self::Lzma,
            4 => Self::Xz,
            5 => Self::Lzip,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Lzma => "lzma",
            Self::Xz => "xz",
            Self::Lzip => "lzip",
        }
    }

    /// Identify a stream from its first bytes. Unknown data is taken to be
    /// uncompressed.
    pub fn detect(head: &[u8]) -> Self {
        if head.starts_with(&GZIP_MAGIC) {
            Self::Gzip
        } else if head.starts_with(&BZIP2_MAGIC) {
            Self::Bzip2
        } else if head.starts_with(&XZ_MAGIC) {
            Self::Xz
        } else if head.starts_with(&LZIP_MAGIC) {
            Self::Lzip
        } else if head.starts_with(&LZMA_MAGIC) {
            Self::Lzma
        } else {
            Self::None
        }
    }

    /// Map an RPM `PAYLOADCOMPRESSOR` value. "none" is not a valid value there.
    pub fn from_payload_compressor(name: &str) -> Option<Self> {
        Some(match name {
            "gzip" => Self::Gzip,
            "bzip2" => Self::Bzip2,
            "lzip" => Self::Lzip,
            "lzma" => Self::Lzma,
            "xz" => Self::Xz,
            _ => return None,
        })
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Packed compression descriptor
// ---------------------------------------------------------------------------

/// Decoded form of the packed target-compression u32 of the delta tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionDescriptor {
    pub algorithm: Compression,
    /// Compression level (byte 1 of the packed value); 0 when unspecified.
    pub level: u8,
}

impl CompressionDescriptor {
    pub fn decode(raw: u32) -> Result<Self> {
        let code = (raw % 256) as u8;
        let algorithm = match code {
            DESC_UNCOMPRESSED => Compression::None,
            DESC_GZIP | DESC_GZIP_RSYNC => Compression::Gzip,
            DESC_BZIP2_OLD | DESC_BZIP2 => Compression::Bzip2,
            DESC_LZMA => Compression::Lzma,
            DESC_XZ => Compression::Xz,
            other => {
                return Err(Error::format(format!(
                    "unknown target compression code {other} (descriptor {raw:#010x})"
                )));
            }
        };
        Ok(Self {
            algorithm,
            level: (raw >> 8) as u8,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
