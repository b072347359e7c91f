// RPM tag-value header blocks (signature header and main header).
//
// On-disk layout:
//   magic    8 bytes  (8e ad e8 01 + 4 reserved)
//   il       u32      number of index entries
//   dl       u32      size of the data store
//   index    il * 16  (tag, type, offset, count), all big-endian u32
//   store    dl bytes

use std::io::Read;

use crate::codec::{self, u32_at};
use crate::error::{Error, Result};

pub const HEADER_MAGIC: [u8; 4] = [0x8E, 0xAD, 0xE8, 0x01];
/// Magic, reserved bytes, il and dl.
pub const HEADER_INTRO_LEN: usize = 16;
pub const INDEX_ENTRY_LEN: usize = 16;

/// Same limits rpm applies when loading a header.
pub const MAX_INDEX_ENTRIES: u32 = 0xFFFF;
pub const MAX_DATA_LEN: u32 = 256 * 1024 * 1024;

/// Tags this crate looks at.
pub mod tags {
    pub const NAME: u32 = 1000;
    pub const VERSION: u32 = 1001;
    pub const RELEASE: u32 = 1002;
    pub const EPOCH: u32 = 1003;
    pub const PAYLOAD_FORMAT: u32 = 1124;
    pub const PAYLOAD_COMPRESSOR: u32 = 1125;
    pub const PAYLOAD_FLAGS: u32 = 1126;
    pub const FILE_DIGEST_ALGO: u32 = 5011;

    /// Signature header: header+payload size.
    pub const SIG_SIZE: u32 = 1000;
    /// Signature header: MD5 of header+payload.
    pub const SIG_MD5: u32 = 1004;
}

// ---------------------------------------------------------------------------
// Index entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TagType {
    Null = 0,
    Char = 1,
    Int8 = 2,
    Int16 = 3,
    Int32 = 4,
    Int64 = 5,
    String = 6,
    Bin = 7,
    StringArray = 8,
    I18nString = 9,
}

impl TagType {
    fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::Null,
            1 => Self::Char,
            2 => Self::Int8,
            3 => Self::Int16,
            4 => Self::Int32,
            5 => Self::Int64,
            6 => Self::String,
            7 => Self::Bin,
            8 => Self::StringArray,
            9 => Self::I18nString,
            _ => return None,
        })
    }

    fn is_string(self) -> bool {
        matches!(self, Self::String | Self::StringArray | Self::I18nString)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub tag: u32,
    pub ty: TagType,
    /// Offset of the value inside the data store.
    pub offset: u32,
    pub count: u32,
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// A parsed header block. The raw on-disk bytes are kept alongside the index.
#[derive(Debug, Clone)]
pub struct Header {
    raw: Vec<u8>,
    entries: Vec<IndexEntry>,
}

impl Header {
    /// Read one header block (magic included) from `r`.
    pub fn read_from<R: Read + ?Sized>(r: &mut R, context: &str) -> Result<Self> {
        let mut intro = [0u8; HEADER_INTRO_LEN];
        r.read_exact(&mut intro)
            .map_err(|e| Error::from_stream(e, context))?;

        if intro[..4] != HEADER_MAGIC {
            return Err(Error::format(format!(
                "{context}: bad header magic {}",
                codec::to_hex(&intro[..4])
            )));
        }

        let il = codec::decode_u32([intro[8], intro[9], intro[10], intro[11]]);
        let dl = codec::decode_u32([intro[12], intro[13], intro[14], intro[15]]);
        if il > MAX_INDEX_ENTRIES {
            return Err(Error::format(format!("{context}: {il} index entries")));
        }
        if dl > MAX_DATA_LEN {
            return Err(Error::format(format!("{context}: data store of {dl} bytes")));
        }

        // Both factors are bounded above, so this cannot overflow.
        let body_len = il as usize * INDEX_ENTRY_LEN + dl as usize;
        let mut raw = intro.to_vec();
        let got = (&mut *r)
            .take(body_len as u64)
            .read_to_end(&mut raw)
            .map_err(|e| Error::from_stream(e, context))?;
        if got < body_len {
            return Err(Error::truncated(context));
        }

        Self::parse(raw, context)
    }

    /// Parse a complete header block already held in memory.
    pub fn parse(raw: Vec<u8>, context: &str) -> Result<Self> {
        let il = u32_at(&raw, 8).ok_or_else(|| Error::truncated(context))?;
        let dl = u32_at(&raw, 12).ok_or_else(|| Error::truncated(context))?;
        if il > MAX_INDEX_ENTRIES || dl > MAX_DATA_LEN {
            return Err(Error::format(format!("{context}: header too large")));
        }
        if raw.len() != HEADER_INTRO_LEN + il as usize * INDEX_ENTRY_LEN + dl as usize {
            return Err(Error::truncated(context));
        }

        let mut entries = Vec::with_capacity(il as usize);
        for i in 0..il as usize {
            let base = HEADER_INTRO_LEN + i * INDEX_ENTRY_LEN;
            let field = |n: usize| u32_at(&raw, base + n * 4).ok_or_else(|| Error::truncated(context));
            let tag = field(0)?;
            let raw_ty = field(1)?;
            let offset = field(2)?;
            let count = field(3)?;

            let ty = TagType::from_raw(raw_ty).ok_or_else(|| {
                Error::format(format!("{context}: tag {tag} has unknown type {raw_ty}"))
            })?;
            if offset > dl {
                return Err(Error::format(format!(
                    "{context}: tag {tag} offset {offset} outside {dl}-byte store"
                )));
            }
            entries.push(IndexEntry {
                tag,
                ty,
                offset,
                count,
            });
        }

        Ok(Self { raw, entries })
    }

    /// Size of the block on disk, magic included.
    pub fn size(&self) -> usize {
        self.raw.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn entry(&self, tag: u32) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.tag == tag)
    }

    fn store(&self) -> &[u8] {
        &self.raw[HEADER_INTRO_LEN + self.entries.len() * INDEX_ENTRY_LEN..]
    }

    /// First string of a string-typed tag, or `None` if the tag is absent.
    pub fn string(&self, tag: u32) -> Result<Option<&str>> {
        let Some(entry) = self.entry(tag) else {
            return Ok(None);
        };
        if !entry.ty.is_string() {
            return Err(Error::format(format!(
                "tag {tag} has type {:?}, expected a string",
                entry.ty
            )));
        }
        let value = &self.store()[entry.offset as usize..];
        let end = value
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::format(format!("tag {tag} string is not terminated")))?;
        std::str::from_utf8(&value[..end])
            .map(Some)
            .map_err(|_| Error::format(format!("tag {tag} string is not valid UTF-8")))
    }

    /// First value of an INT32 tag, or `None` if the tag is absent.
    pub fn u32(&self, tag: u32) -> Result<Option<u32>> {
        let Some(entry) = self.entry(tag) else {
            return Ok(None);
        };
        if entry.ty != TagType::Int32 || entry.count == 0 {
            return Err(Error::format(format!("tag {tag} is not an INT32 value")));
        }
        u32_at(self.store(), entry.offset as usize)
            .map(Some)
            .ok_or_else(|| Error::format(format!("tag {tag} value outside the data store")))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal header builder: (tag, type, value bytes) triples.
    pub(crate) fn build_header(values: &[(u32, TagType, &[u8])]) -> Vec<u8> {
        let mut index = Vec::new();
        let mut store: Vec<u8> = Vec::new();
        for &(tag, ty, value) in values {
            if ty == TagType::Int32 {
                while store.len() % 4 != 0 {
                    store.push(0);
                }
            }
            let count = match ty {
                TagType::Int32 => (value.len() / 4) as u32,
                TagType::String | TagType::I18nString | TagType::StringArray => 1,
                _ => value.len() as u32,
            };
            index.extend_from_slice(&codec::encode_u32(tag));
            index.extend_from_slice(&codec::encode_u32(ty as u32));
            index.extend_from_slice(&codec::encode_u32(store.len() as u32));
            index.extend_from_slice(&codec::encode_u32(count));
            store.extend_from_slice(value);
        }
        let mut out = Vec::new();
        out.extend_from_slice(&HEADER_MAGIC);
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&codec::encode_u32(values.len() as u32));
        out.extend_from_slice(&codec::encode_u32(store.len() as u32));
        out.extend_from_slice(&index);
        out.extend_from_slice(&store);
        out
    }

    #[test]
    fn reads_strings_and_ints() {
        let raw = build_header(&[
            (tags::NAME, TagType::String, &b"bash\0"[..]),
            (tags::EPOCH, TagType::Int32, &[0, 0, 0, 2][..]),
            (tags::PAYLOAD_COMPRESSOR, TagType::String, &b"xz\0"[..]),
        ]);
        let len = raw.len();
        let h = Header::read_from(&mut raw.as_slice(), "header").unwrap();
        assert_eq!(h.size(), len);
        assert_eq!(h.entries().len(), 3);
        assert_eq!(h.string(tags::NAME).unwrap(), Some("bash"));
        assert_eq!(h.u32(tags::EPOCH).unwrap(), Some(2));
        assert_eq!(h.string(tags::PAYLOAD_COMPRESSOR).unwrap(), Some("xz"));
        assert_eq!(h.string(tags::VERSION).unwrap(), None);
        assert!(h.u32(tags::NAME).is_err());
    }

    #[test]
    fn bad_magic_rejected() {
        let mut raw = build_header(&[(tags::NAME, TagType::String, &b"x\0"[..])]);
        raw[0] = 0;
        let err = Header::read_from(&mut raw.as_slice(), "signature").unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn truncated_store_rejected() {
        let raw = build_header(&[(tags::NAME, TagType::String, &b"bash\0"[..])]);
        let err = Header::read_from(&mut &raw[..raw.len() - 1], "header").unwrap_err();
        assert!(matches!(err, Error::Truncated { .. }));
    }

    #[test]
    fn declared_store_without_bytes_is_truncated() {
        let mut raw = build_header(&[]);
        raw[12..16].copy_from_slice(&codec::encode_u32(MAX_DATA_LEN));
        let err = Header::read_from(&mut raw.as_slice(), "main header").unwrap_err();
        assert!(matches!(err, Error::Truncated { ref context } if context == "main header"));
    }

    #[test]
    fn oversized_index_rejected_before_reading() {
        let mut raw = build_header(&[]);
        raw[8..12].copy_from_slice(&codec::encode_u32(MAX_INDEX_ENTRIES + 1));
        let err = Header::read_from(&mut raw.as_slice(), "header").unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn unterminated_string_rejected() {
        let raw = build_header(&[(tags::NAME, TagType::String, &b"bash"[..])]);
        let h = Header::read_from(&mut raw.as_slice(), "header").unwrap();
        assert!(matches!(h.string(tags::NAME), Err(Error::Format(_))));
    }

    #[test]
    fn offset_outside_store_rejected() {
        let mut raw = build_header(&[(tags::NAME, TagType::String, &b"bash\0"[..])]);
        // offset field of the only entry
        raw[24..28].copy_from_slice(&codec::encode_u32(99));
        let err = Header::read_from(&mut raw.as_slice(), "header").unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }
}
