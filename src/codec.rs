// Big-endian integer codec and hex rendering.
//
// Every multi-byte integer in a DRPM container is big-endian. Byte blocks
// (digests, sequence ids, lead bytes) are kept in memory as lowercase hex.

use std::io::{self, Read};

use crate::error::{Error, Result};

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

// ---------------------------------------------------------------------------
// Fixed-width integers
// ---------------------------------------------------------------------------

#[inline]
pub fn decode_u32(buf: [u8; 4]) -> u32 {
    u32::from_be_bytes(buf)
}

#[inline]
pub fn decode_u64(buf: [u8; 8]) -> u64 {
    u64::from_be_bytes(buf)
}

#[inline]
pub fn encode_u32(value: u32) -> [u8; 4] {
    value.to_be_bytes()
}

#[inline]
pub fn encode_u64(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Decode the big-endian u32 at `offset` in `data`, if it is in bounds.
#[inline]
pub fn u32_at(data: &[u8], offset: usize) -> Option<u32> {
    let end = offset.checked_add(4)?;
    let bytes: [u8; 4] = data.get(offset..end)?.try_into().ok()?;
    Some(decode_u32(bytes))
}

// ---------------------------------------------------------------------------
// Hex
// ---------------------------------------------------------------------------

/// Render `bytes` as lowercase hex; the output is exactly twice as long.
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(HEX_DIGITS[(b >> 4) as usize] as char);
        out.push(HEX_DIGITS[(b & 0x0F) as usize] as char);
    }
    out
}

/// Parse a hex string (either case) back into bytes.
///
/// Returns `None` for odd lengths or non-hex characters.
pub fn from_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    let nibble = |c: u8| -> Option<u8> {
        match c {
            b'0'..=b'9' => Some(c - b'0'),
            b'a'..=b'f' => Some(c - b'a' + 10),
            b'A'..=b'F' => Some(c - b'A' + 10),
            _ => None,
        }
    };
    s.as_bytes()
        .chunks_exact(2)
        .map(|pair| Some(nibble(pair[0])? << 4 | nibble(pair[1])?))
        .collect()
}

// ---------------------------------------------------------------------------
// Raw (uncompressed) stream helpers
// ---------------------------------------------------------------------------

/// Read a big-endian u32 from an uncompressed stream.
pub fn read_be32<R: Read + ?Sized>(r: &mut R, context: &str) -> Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)
        .map_err(|e| Error::from_stream(e, context))?;
    Ok(decode_u32(buf))
}

/// Read a big-endian u64 from an uncompressed stream.
pub fn read_be64<R: Read + ?Sized>(r: &mut R, context: &str) -> Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)
        .map_err(|e| Error::from_stream(e, context))?;
    Ok(decode_u64(buf))
}

/// Reject a producer-declared length above `limit`.
pub fn check_limit(len: u64, limit: u64, context: &str) -> Result<()> {
    if len > limit {
        return Err(Error::format(format!(
            "{context}: declared length {len} exceeds limit {limit}"
        )));
    }
    Ok(())
}

/// Read exactly `len` bytes from an uncompressed stream into a fresh buffer.
///
/// The limit is checked first; the buffer then grows only as bytes arrive.
pub fn read_block<R: Read + ?Sized>(
    r: &mut R,
    len: u64,
    limit: u64,
    context: &str,
) -> Result<Vec<u8>> {
    check_limit(len, limit, context)?;
    let mut buf = Vec::new();
    let got = r
        .take(len)
        .read_to_end(&mut buf)
        .map_err(|e| Error::from_stream(e, context))?;
    if (got as u64) < len {
        return Err(Error::truncated(context));
    }
    Ok(buf)
}

/// Discard exactly `len` bytes of an uncompressed stream without buffering them.
pub fn skip_block<R: Read + ?Sized>(r: &mut R, len: u64, context: &str) -> Result<()> {
    let got = io::copy(&mut r.take(len), &mut io::sink())
        .map_err(|e| Error::from_stream(e, context))?;
    if got < len {
        return Err(Error::truncated(context));
    }
    Ok(())
}

/// Turn a length-prefixed NEVR-style field into a `String`.
pub fn block_to_string(bytes: Vec<u8>, context: &str) -> Result<String> {
    String::from_utf8(bytes).map_err(|_| Error::format(format!("{context} is not valid UTF-8")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
