//! The OT7 record format: a fixed 24-byte self-indexing header followed by
//! a variable-length encrypted body.

pub mod decode;
pub mod encode;
pub mod header;

pub use decode::{decode, DecodeOutcome};
pub use encode::encode;

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::errors::{Error, IoError, RecordError};
use crate::skein::Skein1024;
use crate::utils::{buffer, min_bytes_for};

/// Size in bytes of the fixed record header.
pub const HEADER_BYTES: usize = 24;

/// Options controlling one encode operation.
pub struct EncodeOptions {
    /// Which key definition to draw OTP bytes from.
    pub key_id: u64,
    /// Password mixed into header derivation and the keystream.
    pub password: String,
    /// Original filename to embed, or `None` to omit the field entirely.
    pub file_name: Option<String>,
    /// Explicit fill size, or `None` to draw one from the key store.
    pub fill_size: Option<u64>,
    /// Whether to zero the consumed OTP bytes after a successful encode.
    pub erase_after_use: bool,
}

/// The recovered contents of a successfully (or partially, in the checksum
/// mismatch case) decoded record.
pub struct DecodedRecord {
    /// Recovered plaintext bytes.
    pub plaintext: Vec<u8>,
    /// Recovered filename, if the field was present.
    pub file_name: Option<String>,
    /// The `KeyID` whose definition decoded this record.
    pub key_id: u64,
    /// Absolute OTP offset the record was keyed to, for committing to the
    /// consumption log.
    pub key_address: u64,
    /// Total OTP bytes consumed by this record (header window + body),
    /// for committing to the consumption log.
    pub consumed_len: u64,
}

/// Minimum bytes needed to represent `value`, and the value itself
/// little-endian-truncated to that width.
pub(crate) fn width_and_bytes(value: u64) -> (u8, Vec<u8>) {
    let width = min_bytes_for(value);
    (width, value.to_le_bytes()[..width as usize].to_vec())
}

/// Interleave `text` and `fill` one byte at a time, continuing with
/// whichever stream has not yet been exhausted.
pub(crate) fn interleave_text_fill(text: &[u8], fill: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + fill.len());
    let mut ti = 0;
    let mut fi = 0;
    while ti < text.len() || fi < fill.len() {
        if ti < text.len() {
            out.push(text[ti]);
            ti += 1;
        }
        if fi < fill.len() {
            out.push(fill[fi]);
            fi += 1;
        }
    }
    out
}

/// Inverse of [`interleave_text_fill`]: split a stream of known text/fill
/// lengths back into its two constituent byte sequences.
pub(crate) fn deinterleave_text_fill(
    data: &[u8],
    text_len: usize,
    fill_len: usize,
) -> (Vec<u8>, Vec<u8>) {
    let mut text = Vec::with_capacity(text_len);
    let mut fill = Vec::with_capacity(fill_len);
    let mut idx = 0;
    let mut ti = 0;
    let mut fi = 0;
    while ti < text_len || fi < fill_len {
        if ti < text_len {
            text.push(data[idx]);
            idx += 1;
            ti += 1;
        }
        if fi < fill_len {
            fill.push(data[idx]);
            idx += 1;
            fi += 1;
        }
    }
    (text, fill)
}

/// `true` if every byte is printable ASCII (0x20..=0x7e), the constraint
/// spec.md places on `FileName`.
pub(crate) fn is_printable_ascii(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| (0x20..=0x7e).contains(&b))
}

/// Read `len` raw (unencrypted) bytes from a key file at `offset`.
pub(crate) fn read_key_bytes(path: &Path, offset: u64, len: usize) -> Result<Vec<u8>, Error> {
    let mut file = File::open(path).map_err(IoError::CantOpenKeyFileForReading)?;
    file.seek(SeekFrom::Start(offset))
        .map_err(IoError::CantSeekInKeyFile)?;
    let mut buf = buffer(len);
    file.read_exact(&mut buf)
        .map_err(|_| RecordError::RanOutOfKeyInOneTimePad)?;
    Ok(buf)
}

/// `SumZ`: an 8-byte Skein1024 checksum over the plaintext-form body
/// fields (`ExtraKeyUsed`, `SizeBits`, `TextSize`, `FillSize`,
/// `FileNameSize`, `FileName`, and the plaintext-only bytes of
/// `TextFill`), computed before encryption at encode time and recomputed
/// for comparison at decode time.
pub(crate) fn compute_sum_z(
    extra_key_used: u8,
    size_bits: u8,
    text_size_bytes: &[u8],
    fill_size_bytes: &[u8],
    file_name_bytes: &[u8],
    text_only_bytes: &[u8],
) -> [u8; 8] {
    let mut ctx = Skein1024::init(64);
    ctx.update(&[extra_key_used]);
    ctx.update(&[size_bits]);
    ctx.update(text_size_bytes);
    ctx.update(fill_size_bytes);
    ctx.update(&(file_name_bytes.len() as u16).to_le_bytes());
    ctx.update(file_name_bytes);
    ctx.update(text_only_bytes);
    let digest = ctx.finish();
    let mut sum = [0u8; 8];
    sum.copy_from_slice(&digest[..8]);
    sum
}
