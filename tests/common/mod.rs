//! Builders for synthetic delta RPM files.

#![allow(dead_code)]

use std::io::Write;

pub const LEAD_MAGIC: [u8; 4] = [0xED, 0xAB, 0xEE, 0xDB];
const HEADER_MAGIC: [u8; 4] = [0x8E, 0xAD, 0xE8, 0x01];

const TAG_NAME: u32 = 1000;
const TAG_VERSION: u32 = 1001;
const TAG_RELEASE: u32 = 1002;
const TAG_EPOCH: u32 = 1003;
const TAG_PAYLOAD_COMPRESSOR: u32 = 1125;
const TAG_SIG_SIZE: u32 = 1000;

const TYPE_INT32: u32 = 4;
const TYPE_STRING: u32 = 6;

// ---------------------------------------------------------------------------
// Tail
// ---------------------------------------------------------------------------

/// Every field of the shared tail, in wire order.
#[derive(Debug, Clone)]
pub struct TailSpec {
    pub version: u8,
    pub src_nevr: String,
    pub sequence: Vec<u8>,
    pub tgt_md5: [u8; 16],
    pub tgt_size: u32,
    pub comp_descriptor: u32,
    pub comp_param: Vec<u8>,
    pub header_len: u32,
    pub adjustments: Vec<(u32, u32)>,
    pub lead: Vec<u8>,
    pub payload_fmt_off: u32,
    pub int_copies: Vec<(u32, u32)>,
    pub ext_copies: Vec<(u32, u32)>,
    pub ext_data_len: u64,
    pub add_data: Vec<u8>,
    pub int_data_len: u64,
}

impl TailSpec {
    /// A minimal, well-formed tail of the given format version.
    pub fn minimal(version: u8) -> Self {
        Self {
            version,
            src_nevr: "bash-5.2.21-1.fc40".into(),
            sequence: (0u8..16).collect(),
            tgt_md5: [0xC3; 16],
            tgt_size: 0,
            comp_descriptor: 0,
            comp_param: Vec::new(),
            header_len: 0,
            adjustments: Vec::new(),
            lead: lead_bytes(112),
            payload_fmt_off: 0,
            int_copies: Vec::new(),
            ext_copies: Vec::new(),
            ext_data_len: 0,
            add_data: Vec::new(),
            int_data_len: 0,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = b"DLT".to_vec();
        out.push(b'0' + self.version);
        put_block(&mut out, self.src_nevr.as_bytes());
        put_block(&mut out, &self.sequence);
        out.extend_from_slice(&self.tgt_md5);
        if self.version >= 2 {
            put_u32(&mut out, self.tgt_size);
            put_u32(&mut out, self.comp_descriptor);
            put_block(&mut out, &self.comp_param);
            if self.version == 3 {
                put_u32(&mut out, self.header_len);
                put_u32(&mut out, self.adjustments.len() as u32);
                put_pairs(&mut out, &self.adjustments);
            }
        }
        put_block(&mut out, &self.lead);
        put_u32(&mut out, self.payload_fmt_off);
        put_u32(&mut out, self.int_copies.len() as u32);
        put_u32(&mut out, self.ext_copies.len() as u32);
        put_pairs(&mut out, &self.int_copies);
        put_pairs(&mut out, &self.ext_copies);
        put_len(&mut out, self.version, self.ext_data_len);
        put_block(&mut out, &self.add_data);
        put_len(&mut out, self.version, self.int_data_len);
        out
    }
}

/// Lead-like filler starting with the RPM lead magic.
pub fn lead_bytes(len: usize) -> Vec<u8> {
    let mut lead = vec![0u8; len];
    lead[..4].copy_from_slice(&LEAD_MAGIC);
    lead
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn put_block(out: &mut Vec<u8>, bytes: &[u8]) {
    put_u32(out, bytes.len() as u32);
    out.extend_from_slice(bytes);
}

/// De-interleaved: all firsts, then all seconds.
fn put_pairs(out: &mut Vec<u8>, pairs: &[(u32, u32)]) {
    for &(first, _) in pairs {
        put_u32(out, first);
    }
    for &(_, second) in pairs {
        put_u32(out, second);
    }
}

fn put_len(out: &mut Vec<u8>, version: u8, len: u64) {
    if version == 3 {
        out.extend_from_slice(&len.to_be_bytes());
    } else {
        put_u32(out, len as u32);
    }
}

// ---------------------------------------------------------------------------
// Tail compression
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrap {
    None,
    Gzip,
    Bzip2,
    Xz,
    Lzma,
}

pub fn wrap(data: &[u8], how: Wrap) -> Vec<u8> {
    match how {
        Wrap::None => data.to_vec(),
        Wrap::Gzip => {
            let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
            enc.write_all(data).unwrap();
            enc.finish().unwrap()
        }
        Wrap::Bzip2 => {
            let mut enc = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::best());
            enc.write_all(data).unwrap();
            enc.finish().unwrap()
        }
        Wrap::Xz => {
            let mut enc = xz2::write::XzEncoder::new(Vec::new(), 6);
            enc.write_all(data).unwrap();
            enc.finish().unwrap()
        }
        Wrap::Lzma => {
            let opts = xz2::stream::LzmaOptions::new_preset(6).unwrap();
            let stream = xz2::stream::Stream::new_lzma_encoder(&opts).unwrap();
            let mut enc = xz2::write::XzEncoder::new_stream(Vec::new(), stream);
            enc.write_all(data).unwrap();
            enc.finish().unwrap()
        }
    }
}

// ---------------------------------------------------------------------------
// Variant prefixes
// ---------------------------------------------------------------------------

/// rpm-only delta: magic, "DLT3", target NEVR, add data, then `tail`.
pub fn rpm_only(tgt_nevr: &str, add_data: &[u8], tail: &[u8]) -> Vec<u8> {
    let mut out = b"drpm".to_vec();
    out.extend_from_slice(b"DLT3");
    put_block(&mut out, tgt_nevr.as_bytes());
    put_block(&mut out, add_data);
    out.extend_from_slice(tail);
    out
}

/// Target package description for a standard delta.
#[derive(Debug, Clone)]
pub struct TargetRpm {
    pub name: &'static str,
    pub version: &'static str,
    pub release: &'static str,
    pub epoch: Option<u32>,
    pub compressor: &'static str,
}

impl Default for TargetRpm {
    fn default() -> Self {
        Self {
            name: "bash",
            version: "5.2.26",
            release: "3.fc40",
            epoch: None,
            compressor: "xz",
        }
    }
}

impl TargetRpm {
    /// Lead, signature header, padding and main header.
    pub fn encode(&self) -> Vec<u8> {
        let mut lead = vec![0u8; 96];
        lead[..4].copy_from_slice(&LEAD_MAGIC);
        lead[4] = 3;

        let sig = header(&[(TAG_SIG_SIZE, TYPE_INT32, 4096u32.to_be_bytes().to_vec())]);

        let mut main = vec![
            (TAG_NAME, TYPE_STRING, cstr(self.name)),
            (TAG_VERSION, TYPE_STRING, cstr(self.version)),
            (TAG_RELEASE, TYPE_STRING, cstr(self.release)),
            (TAG_PAYLOAD_COMPRESSOR, TYPE_STRING, cstr(self.compressor)),
        ];
        if let Some(epoch) = self.epoch {
            main.push((TAG_EPOCH, TYPE_INT32, epoch.to_be_bytes().to_vec()));
        }

        let mut out = lead;
        out.extend_from_slice(&sig);
        out.resize(out.len() + (8 - sig.len() % 8) % 8, 0);
        out.extend_from_slice(&header(&main));
        out
    }
}

/// Standard delta: the target RPM sections, then `tail`.
pub fn standard(target: &TargetRpm, tail: &[u8]) -> Vec<u8> {
    let mut out = target.encode();
    out.extend_from_slice(tail);
    out
}

fn cstr(s: &str) -> Vec<u8> {
    let mut v = s.as_bytes().to_vec();
    v.push(0);
    v
}

fn header(values: &[(u32, u32, Vec<u8>)]) -> Vec<u8> {
    let mut index = Vec::new();
    let mut store = Vec::new();
    for (tag, ty, value) in values {
        if *ty == TYPE_INT32 {
            store.resize(store.len().next_multiple_of(4), 0);
        }
        let count = if *ty == TYPE_INT32 { value.len() as u32 / 4 } else { 1 };
        put_u32(&mut index, *tag);
        put_u32(&mut index, *ty);
        put_u32(&mut index, store.len() as u32);
        put_u32(&mut index, count);
        store.extend_from_slice(value);
    }
    let mut out = HEADER_MAGIC.to_vec();
    out.extend_from_slice(&[0; 4]);
    put_u32(&mut out, values.len() as u32);
    put_u32(&mut out, store.len() as u32);
    out.extend_from_slice(&index);
    out.extend_from_slice(&store);
    out
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

pub fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".drpm").tempfile().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}
