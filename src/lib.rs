#![deny(missing_docs)]

//! OT7: a one-time-pad file-encryption protocol and its reference tool.
//!
//! A plaintext file is encrypted against a true-random key file addressed
//! by a numeric `KeyID`; the resulting record is self-indexing (its header
//! carries enough information to locate the OTP region it was built from)
//! and appears as uniform random bytes. See [`encode_file`] and
//! [`decode_file`] for the two entry points most callers need.
//!
//! ```no_run
//! # fn main() -> Result<(), ot7::Error> {
//! use ot7::{EncodeRequest, Envelope, KeyStore};
//!
//! let mut store = KeyStore::load("key.map", "ot7.log")?;
//! let request = EncodeRequest {
//!     key_id: 1,
//!     password: "correct horse battery staple".to_string(),
//!     file_name: Some("notes.txt".to_string()),
//!     fill_size: None,
//!     erase_after_use: false,
//! };
//! let record = ot7::encode_bytes(b"meet at dawn", &request, &mut store, Envelope::Binary)?;
//! # Ok(())
//! # }
//! ```

pub mod envelope;
pub mod errors;
pub mod keystore;
pub mod keystream;
pub mod record;
pub mod skein;
mod utils;

pub use envelope::Envelope;
pub use errors::Error;
pub use keystore::{KeyDefinition, KeyMap, KeyStore};
pub use record::{DecodeOutcome, DecodedRecord, EncodeOptions as EncodeRequest};

use std::fs;
use std::path::Path;

use errors::{IoError, RecordError};

/// Encode `plaintext` bytes into a finished record, wrapped in the
/// requested [`Envelope`].
pub fn encode_bytes(
    plaintext: &[u8],
    request: &EncodeRequest,
    store: &mut KeyStore,
    envelope: Envelope,
) -> Result<Vec<u8>, Error> {
    let record = record::encode(plaintext, request, store)?;
    Ok(envelope.wrap(&record))
}

/// Read a plaintext file from `input_path`, encode it, and write the
/// resulting record to `output_path`.
pub fn encode_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    request: &EncodeRequest,
    store: &mut KeyStore,
    envelope: Envelope,
) -> Result<(), Error> {
    let plaintext = fs::read(input_path).map_err(IoError::CantReadPlaintextFile)?;
    let wrapped = encode_bytes(&plaintext, request, store, envelope)?;
    fs::write(output_path, wrapped).map_err(IoError::CantWriteEncryptedFile)?;
    Ok(())
}

/// Decode a finished record's bytes (already stripped of its envelope),
/// optionally committing the consumed OTP range to `store`'s log and
/// erasing it from the key file.
pub fn decode_bytes(
    record_bytes: &[u8],
    store: &mut KeyStore,
    commit: bool,
    erase_after_use: bool,
) -> Result<DecodeOutcome, Error> {
    let outcome = record::decode(record_bytes, store)?;
    if commit {
        let range = outcome.record.key_address..outcome.record.key_address + outcome.record.consumed_len;
        store.commit(outcome.record.key_id, range.clone())?;
        if erase_after_use {
            store.erase(outcome.record.key_id, range)?;
        }
    }
    Ok(outcome)
}

/// Read an encoded file from `input_path` (stripping the given
/// [`Envelope`]), decode it, and write the recovered plaintext to
/// `output_path`.
pub fn decode_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    envelope: Envelope,
    store: &mut KeyStore,
    commit: bool,
    erase_after_use: bool,
) -> Result<DecodeOutcome, Error> {
    let contents = fs::read(input_path).map_err(IoError::CantReadEncryptedFile)?;
    let record_bytes = envelope
        .unwrap(&contents)
        .map_err(|_| RecordError::InvalidEncryptedFileFormat)?;
    let outcome = decode_bytes(&record_bytes, store, commit, erase_after_use)?;
    fs::write(output_path, &outcome.record.plaintext).map_err(IoError::CantWritePlaintextFile)?;
    Ok(outcome)
}
