// Delta RPM decoder.
//
// Layout of a delta file (all integers big-endian):
//
//   magic                          "drpm" (rpm-only) or the RPM lead magic
//   prefix, uncompressed           rpm-only: "DLT3", target NEVR, add data
//                                  standard: complete target lead/sig/header
//   tail, through one decompressor "DLT"+digit, source NEVR, sequence,
//                                  target MD5, [v2+: size, compression,
//                                  params, [v3: header len, adjustments]],
//                                  lead, copy tables, data lengths
//
// Pair tables are stored de-interleaved: all first elements, then all
// second elements.

use std::io::{Read, Seek, SeekFrom};

use super::record::{DeltaRpm, DeltaType};
use super::source::{CompressedReader, EmbeddedRpmSource};
use crate::codec;
use crate::compress::{Compression, CompressionDescriptor, DecompressReader};
use crate::config::ReadOptions;
use crate::error::{Error, Result};
use crate::rpm::{ArchiveMode, RPM_LEAD_MAGIC, RpmPackage};

/// "drpm"
pub const RPMONLY_MAGIC: u32 = 0x6472_706D;
/// First four lead bytes of an RPM package.
pub const STANDARD_MAGIC: u32 = u32::from_be_bytes(RPM_LEAD_MAGIC);

/// "DLT" in the top three bytes of a version word.
const DLT_TAG: u32 = 0x0044_4C54;
/// "DLT3"
const DLT3: u32 = 0x444C_5433;

pub const MD5_LEN: usize = 16;
/// Smallest target lead + signature accepted.
pub const MIN_LEAD_LEN: u32 = 112;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

impl DeltaRpm {
    /// Decode a delta from any seekable reader positioned at its start.
    ///
    /// `filename` is recorded verbatim and returned for [`Tag::Filename`](super::Tag::Filename).
    pub fn from_reader<R: Read + Seek>(
        mut reader: R,
        filename: impl Into<String>,
        opts: &ReadOptions,
    ) -> Result<Self> {
        read_delta(&mut reader, filename.into(), opts)
    }
}

fn read_delta<R: Read + Seek>(reader: &mut R, filename: String, opts: &ReadOptions) -> Result<DeltaRpm> {
    let magic = codec::read_be32(reader, "magic")?;
    let delta_type = match magic {
        RPMONLY_MAGIC => DeltaType::RpmOnly,
        STANDARD_MAGIC => DeltaType::Standard,
        other => {
            return Err(Error::format(format!("unrecognized magic {other:#010x}")));
        }
    };
    log::debug!("{filename}: {delta_type} delta");

    let prefix = match delta_type {
        DeltaType::RpmOnly => read_rpmonly_prefix(reader, opts)?,
        DeltaType::Standard => {
            reader.seek(SeekFrom::Start(0))?;
            let rpm = RpmPackage::read_from(reader, ArchiveMode::Skip)?;
            let prefix = standard_prefix(&rpm)?;
            reader.seek(SeekFrom::Start(rpm.size_full()))?;
            prefix
        }
    };

    let mut stream = DecompressReader::new(&mut *reader)?;
    let tail = read_tail(&mut stream, delta_type, opts)?;
    let comp = CompressedReader::algorithm(&stream);
    CompressedReader::finish(stream)?;

    Ok(DeltaRpm {
        filename,
        version: tail.version,
        delta_type,
        comp,
        src_nevr: tail.src_nevr,
        tgt_nevr: prefix.tgt_nevr,
        sequence: tail.sequence,
        tgt_md5: tail.tgt_md5,
        tgt_size: tail.tgt_size,
        tgt_comp: tail.tgt_comp.unwrap_or(prefix.tgt_comp),
        tgt_comp_level: tail.tgt_comp_level,
        tgt_comp_param: tail.tgt_comp_param,
        tgt_header_len: tail.tgt_header_len,
        offset_adjustments: tail.offset_adjustments,
        tgt_lead: tail.tgt_lead,
        payload_fmt_off: tail.payload_fmt_off,
        int_copies: tail.int_copies,
        ext_copies: tail.ext_copies,
        ext_data_len: tail.ext_data_len,
        int_data_len: tail.int_data_len,
    })
}

// ---------------------------------------------------------------------------
// Variant prefixes
// ---------------------------------------------------------------------------

/// What the uncompressed prefix contributes to the record.
#[derive(Debug)]
struct Prefix {
    tgt_nevr: String,
    /// Fallback target compression when the tail carries no descriptor.
    tgt_comp: Compression,
}

fn read_rpmonly_prefix<R: Read + ?Sized>(reader: &mut R, opts: &ReadOptions) -> Result<Prefix> {
    let version = codec::read_be32(reader, "rpm-only version")?;
    if version != DLT3 {
        return Err(Error::format(format!(
            "rpm-only delta has version word {version:#010x}, expected DLT3"
        )));
    }

    let len = codec::read_be32(reader, "target nevr length")?;
    let raw = codec::read_block(reader, len.into(), opts.max_string_len.into(), "target nevr")?;
    let tgt_nevr = nevr_from_bytes(raw, "target nevr")?;
    log::debug!("target nevr: {tgt_nevr}");

    // Opaque; only its length matters.
    let add_len = codec::read_be32(reader, "rpm-only add data length")?;
    log::trace!("skipping {add_len} bytes of rpm-only add data");
    codec::skip_block(reader, add_len.into(), "rpm-only add data")?;

    Ok(Prefix {
        tgt_nevr,
        tgt_comp: Compression::None,
    })
}

fn standard_prefix<S: EmbeddedRpmSource>(rpm: &S) -> Result<Prefix> {
    let tgt_nevr = rpm.nevr()?;
    let tgt_comp = rpm.payload_compression()?;
    log::debug!(
        "target nevr: {tgt_nevr}, payload {tgt_comp}, tail at {}",
        rpm.size_full()
    );
    Ok(Prefix { tgt_nevr, tgt_comp })
}

// ---------------------------------------------------------------------------
// Shared tail
// ---------------------------------------------------------------------------

/// Fields decoded from the compressed tail.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Tail {
    pub version: u32,
    pub src_nevr: String,
    pub sequence: String,
    pub tgt_md5: String,
    pub tgt_size: u32,
    /// `None` before version 2.
    pub tgt_comp: Option<Compression>,
    pub tgt_comp_level: u8,
    pub tgt_comp_param: Option<String>,
    pub tgt_header_len: u32,
    pub offset_adjustments: Vec<(u32, u32)>,
    pub tgt_lead: String,
    pub payload_fmt_off: u32,
    pub int_copies: Vec<(u32, u32)>,
    pub ext_copies: Vec<(u32, u32)>,
    pub ext_data_len: u64,
    pub int_data_len: u64,
}

/// Decode the tail from `stream`. The stream is left open.
pub(crate) fn read_tail<C: CompressedReader>(
    stream: &mut C,
    delta_type: DeltaType,
    opts: &ReadOptions,
) -> Result<Tail> {
    let rpm_only = delta_type == DeltaType::RpmOnly;
    let mut tail = Tail::default();

    let word = stream.read_be32("delta version")?;
    tail.version = parse_version(word)?;
    if rpm_only && tail.version != 3 {
        return Err(Error::format(format!(
            "rpm-only delta needs format version 3, found {}",
            tail.version
        )));
    }
    log::debug!("delta version: {}", tail.version);

    let len = stream.read_be32("source nevr length")?;
    let raw = read_block(stream, len, opts.max_string_len, "source nevr")?;
    tail.src_nevr = nevr_from_bytes(raw, "source nevr")?;
    log::debug!("source nevr: {}", tail.src_nevr);

    let len = stream.read_be32("sequence length")?;
    if (len as usize) < MD5_LEN || (rpm_only && len as usize != MD5_LEN) {
        return Err(Error::format(format!("sequence of {len} bytes")));
    }
    tail.sequence = codec::to_hex(&read_block(stream, len, opts.max_block_len, "sequence")?);
    log::debug!("sequence: {}", tail.sequence);

    tail.tgt_md5 = codec::to_hex(&stream.read_vec(MD5_LEN, "target md5")?);
    log::debug!("target md5: {}", tail.tgt_md5);

    if tail.version >= 2 {
        tail.tgt_size = stream.read_be32("target size")?;
        let descriptor = CompressionDescriptor::decode(stream.read_be32("target compression")?)?;
        tail.tgt_comp = Some(descriptor.algorithm);
        tail.tgt_comp_level = descriptor.level;
        log::debug!(
            "target size: {}, compression: {} (level {})",
            tail.tgt_size,
            descriptor.algorithm,
            descriptor.level
        );

        let len = stream.read_be32("compression parameter length")?;
        if len > 0 {
            let params = read_block(stream, len, opts.max_block_len, "compression parameters")?;
            tail.tgt_comp_param = Some(codec::to_hex(&params));
        }

        if tail.version == 3 {
            tail.tgt_header_len = stream.read_be32("target header length")?;
            log::debug!("target header length: {}", tail.tgt_header_len);
            tail.offset_adjustments = read_pairs(stream, opts, "offset adjustments")?;
        }
    }

    if rpm_only && tail.tgt_header_len == 0 {
        return Err(Error::format("rpm-only delta with zero target header length"));
    }

    let len = stream.read_be32("target lead length")?;
    if len < MIN_LEAD_LEN {
        return Err(Error::format(format!("target lead of {len} bytes")));
    }
    tail.tgt_lead = codec::to_hex(&read_block(stream, len, opts.max_block_len, "target lead")?);
    log::debug!("target lead: {len} bytes");

    tail.payload_fmt_off = stream.read_be32("payload format offset")?;
    let int_count = stream.read_be32("internal copy count")?;
    let ext_count = stream.read_be32("external copy count")?;
    log::debug!(
        "payload format offset: {}, {int_count} internal / {ext_count} external copies",
        tail.payload_fmt_off
    );
    tail.int_copies = read_pair_table(stream, int_count, opts, "internal copies")?;
    tail.ext_copies = read_pair_table(stream, ext_count, opts, "external copies")?;

    tail.ext_data_len = read_data_len(stream, tail.version, "external data length")?;
    log::debug!("external data: {} bytes", tail.ext_data_len);

    let add_len = stream.read_be32("add data length")?;
    if add_len > 0 {
        if rpm_only {
            return Err(Error::format("rpm-only delta carries add data"));
        }
        log::trace!("skipping {add_len} bytes of add data");
        stream.skip(add_len.into(), "add data")?;
    }

    tail.int_data_len = read_data_len(stream, tail.version, "internal data length")?;
    log::debug!("internal data: {} bytes", tail.int_data_len);

    Ok(tail)
}

/// Map a "DLT"+digit word to a version in 1..=3.
pub(crate) fn parse_version(word: u32) -> Result<u32> {
    if word >> 8 != DLT_TAG {
        return Err(Error::format(format!("bad version word {word:#010x}")));
    }
    match (word & 0xFF) as u8 {
        digit @ b'1'..=b'3' => Ok(u32::from(digit - b'0')),
        other => Err(Error::format(format!(
            "unsupported delta version {:?}",
            char::from(other)
        ))),
    }
}

fn read_block<C: CompressedReader>(stream: &mut C, len: u32, limit: u32, context: &str) -> Result<Vec<u8>> {
    if len > limit {
        return Err(Error::format(format!(
            "{context}: declared length {len} exceeds limit {limit}"
        )));
    }
    stream.read_vec(len as usize, context)
}

/// 64-bit in version 3 (high word first), 32-bit before.
fn read_data_len<C: CompressedReader>(stream: &mut C, version: u32, context: &str) -> Result<u64> {
    if version == 3 {
        stream.read_be64(context)
    } else {
        stream.read_be32(context).map(u64::from)
    }
}

/// A count word followed by a de-interleaved pair table.
fn read_pairs<C: CompressedReader>(
    stream: &mut C,
    opts: &ReadOptions,
    context: &str,
) -> Result<Vec<(u32, u32)>> {
    let count = stream.read_be32(context)?;
    read_pair_table(stream, count, opts, context)
}

/// `count` first elements, then `count` second elements, zipped.
fn read_pair_table<C: CompressedReader>(
    stream: &mut C,
    count: u32,
    opts: &ReadOptions,
    context: &str,
) -> Result<Vec<(u32, u32)>> {
    if count > opts.max_pairs {
        return Err(Error::format(format!(
            "{context}: {count} pairs exceeds limit {}",
            opts.max_pairs
        )));
    }
    let count = count as usize;

    let mut pairs = Vec::new();
    pairs.try_reserve_exact(count)?;
    for _ in 0..count {
        pairs.push((stream.read_be32(context)?, 0));
    }
    for pair in &mut pairs {
        pair.1 = stream.read_be32(context)?;
    }
    log::trace!("{context}: {pairs:?}");
    Ok(pairs)
}

/// NEVR bytes up to the first NUL, as UTF-8.
fn nevr_from_bytes(mut raw: Vec<u8>, context: &str) -> Result<String> {
    if let Some(nul) = raw.iter().position(|&b| b == 0) {
        raw.truncate(nul);
    }
    codec::block_to_string(raw, context)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
