// The decoded delta record and its tag-based query API.

use std::fmt;

use crate::compress::Compression;
use crate::error::{Error, Result};

/// Container variant, selected by the file magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DeltaType {
    /// Starts with the complete target RPM lead, signature and header.
    Standard = 0,
    /// Starts with the `drpm` magic; only the target header is delta-encoded.
    RpmOnly = 1,
}

impl DeltaType {
    pub const fn code(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for DeltaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Standard => "standard",
            Self::RpmOnly => "rpm-only",
        })
    }
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

/// Field selector for the `get_*` queries. The discriminants are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Tag {
    Filename = 0,
    Version = 1,
    Type = 2,
    Comp = 3,
    Sequence = 4,
    SrcNevr = 5,
    TgtNevr = 6,
    TgtSize = 7,
    TgtMd5 = 8,
    TgtComp = 9,
    TgtCompParam = 10,
    TgtHeaderLen = 11,
    AdjElems = 12,
    TgtLead = 13,
    PayloadFmtOff = 14,
    IntCopies = 15,
    ExtCopies = 16,
    ExtDataLen = 17,
    IntDataLen = 18,
}

impl Tag {
    pub const ALL: [Tag; 19] = [
        Tag::Filename,
        Tag::Version,
        Tag::Type,
        Tag::Comp,
        Tag::Sequence,
        Tag::SrcNevr,
        Tag::TgtNevr,
        Tag::TgtSize,
        Tag::TgtMd5,
        Tag::TgtComp,
        Tag::TgtCompParam,
        Tag::TgtHeaderLen,
        Tag::AdjElems,
        Tag::TgtLead,
        Tag::PayloadFmtOff,
        Tag::IntCopies,
        Tag::ExtCopies,
        Tag::ExtDataLen,
        Tag::IntDataLen,
    ];

    pub const fn code(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for Tag {
    type Error = Error;

    fn try_from(code: u32) -> Result<Self> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or_else(|| Error::args(format!("unknown tag {code}")))
    }
}

// ---------------------------------------------------------------------------
// DeltaRpm
// ---------------------------------------------------------------------------

/// A fully decoded delta RPM.
///
/// Byte blocks (sequence, digests, lead, compression parameters) are held as
/// lowercase hex. The record is immutable; it only exists if every field
/// decoded successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaRpm {
    pub(crate) filename: String,
    pub(crate) version: u32,
    pub(crate) delta_type: DeltaType,
    pub(crate) comp: Compression,
    pub(crate) src_nevr: String,
    pub(crate) tgt_nevr: String,
    pub(crate) sequence: String,
    pub(crate) tgt_md5: String,
    pub(crate) tgt_size: u32,
    pub(crate) tgt_comp: Compression,
    pub(crate) tgt_comp_level: u8,
    pub(crate) tgt_comp_param: Option<String>,
    pub(crate) tgt_header_len: u32,
    pub(crate) offset_adjustments: Vec<(u32, u32)>,
    pub(crate) tgt_lead: String,
    pub(crate) payload_fmt_off: u32,
    pub(crate) int_copies: Vec<(u32, u32)>,
    pub(crate) ext_copies: Vec<(u32, u32)>,
    pub(crate) ext_data_len: u64,
    pub(crate) int_data_len: u64,
}

impl DeltaRpm {
    // -- tag queries --------------------------------------------------------

    /// 32-bit integer fields. Compression and type values are returned as
    /// their numeric codes.
    pub fn get_uint(&self, tag: Tag) -> Result<u32> {
        match tag {
            Tag::Version => Ok(self.version),
            Tag::Type => Ok(self.delta_type.code()),
            Tag::Comp => Ok(self.comp.code()),
            Tag::TgtSize => Ok(self.tgt_size),
            Tag::TgtComp => Ok(self.tgt_comp.code()),
            Tag::TgtHeaderLen => Ok(self.tgt_header_len),
            Tag::PayloadFmtOff => Ok(self.payload_fmt_off),
            other => Err(wrong_type(other, "an integer")),
        }
    }

    /// 64-bit integer fields.
    pub fn get_ulong(&self, tag: Tag) -> Result<u64> {
        match tag {
            Tag::ExtDataLen => Ok(self.ext_data_len),
            Tag::IntDataLen => Ok(self.int_data_len),
            other => Err(wrong_type(other, "a 64-bit integer")),
        }
    }

    /// String fields. `TgtCompParam` fails with `InvalidArguments` when the
    /// delta carries no compression parameters.
    pub fn get_string(&self, tag: Tag) -> Result<&str> {
        match tag {
            Tag::Filename => Ok(&self.filename),
            Tag::Sequence => Ok(&self.sequence),
            Tag::SrcNevr => Ok(&self.src_nevr),
            Tag::TgtNevr => Ok(&self.tgt_nevr),
            Tag::TgtMd5 => Ok(&self.tgt_md5),
            Tag::TgtLead => Ok(&self.tgt_lead),
            Tag::TgtCompParam => self
                .tgt_comp_param
                .as_deref()
                .ok_or_else(|| Error::args("delta has no target compression parameters")),
            other => Err(wrong_type(other, "a string")),
        }
    }

    /// Pair tables.
    pub fn get_pairs(&self, tag: Tag) -> Result<&[(u32, u32)]> {
        match tag {
            Tag::AdjElems => Ok(&self.offset_adjustments),
            Tag::IntCopies => Ok(&self.int_copies),
            Tag::ExtCopies => Ok(&self.ext_copies),
            other => Err(wrong_type(other, "a pair table")),
        }
    }

    /// Release the record. Equivalent to dropping it.
    pub fn close(self) {
        log::trace!("closing delta {}", self.filename);
    }

    // -- typed accessors ----------------------------------------------------

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Format version, 1 to 3.
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn delta_type(&self) -> DeltaType {
        self.delta_type
    }

    /// Compression of the delta tail stream itself.
    pub fn comp(&self) -> Compression {
        self.comp
    }

    pub fn src_nevr(&self) -> &str {
        &self.src_nevr
    }

    pub fn tgt_nevr(&self) -> &str {
        &self.tgt_nevr
    }

    /// Hex sequence id.
    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    /// Hex MD5 of the target package.
    pub fn tgt_md5(&self) -> &str {
        &self.tgt_md5
    }

    /// Target size; 0 for version 1 deltas.
    pub fn tgt_size(&self) -> u32 {
        self.tgt_size
    }

    pub fn tgt_comp(&self) -> Compression {
        self.tgt_comp
    }

    pub fn tgt_comp_level(&self) -> u8 {
        self.tgt_comp_level
    }

    pub fn tgt_comp_param(&self) -> Option<&str> {
        self.tgt_comp_param.as_deref()
    }

    pub fn tgt_header_len(&self) -> u32 {
        self.tgt_header_len
    }

    /// (offset, adjustment) pairs; empty before version 3.
    pub fn offset_adjustments(&self) -> &[(u32, u32)] {
        &self.offset_adjustments
    }

    /// Hex lead and signature of the target package.
    pub fn tgt_lead(&self) -> &str {
        &self.tgt_lead
    }

    pub fn payload_fmt_off(&self) -> u32 {
        self.payload_fmt_off
    }

    pub fn int_copies(&self) -> &[(u32, u32)] {
        &self.int_copies
    }

    pub fn ext_copies(&self) -> &[(u32, u32)] {
        &self.ext_copies
    }

    pub fn ext_data_len(&self) -> u64 {
        self.ext_data_len
    }

    pub fn int_data_len(&self) -> u64 {
        self.int_data_len
    }
}

fn wrong_type(tag: Tag, expected: &str) -> Error {
    Error::args(format!("tag {tag:?} is not {expected}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
