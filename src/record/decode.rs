//! Decodes an OT7 record by trial-matching every configured
//! `(KeyID, password)` pair against the header.

use std::fs::File;
use std::io::{Seek, SeekFrom};

use crate::errors::{Error, HeaderError, IoError, RecordError};
use crate::keystore::KeyStore;
use crate::keystream::KeystreamMixer;
use crate::skein::PseudoRandomStream;
use crate::utils::read_le;

use super::header::{self, HEADER_WINDOW};
use super::{compute_sum_z, deinterleave_text_fill, read_key_bytes, DecodedRecord, HEADER_BYTES};

/// The result of a successful decode: the recovered record, and, if the
/// checksum did not verify, the non-fatal error to surface alongside it.
pub struct DecodeOutcome {
    /// The recovered plaintext, filename, and consumption bookkeeping.
    pub record: DecodedRecord,
    /// `Some` if `SumZ` did not match; the plaintext is still populated.
    pub checksum_error: Option<Error>,
}

struct ResolvedCandidate {
    key_id: u64,
    password: String,
    key_address: u64,
}

/// Decode a complete binary OT7 record (header plus body).
pub fn decode(data: &[u8], store: &KeyStore) -> Result<DecodeOutcome, Error> {
    if data.len() < HEADER_BYTES {
        return Err(RecordError::InvalidEncryptedFileFormat.into());
    }

    let stored_header_key: [u8; 8] = data[0..8].try_into().unwrap();
    let stored_key_id_hash: [u8; 8] = data[8..16].try_into().unwrap();
    let stored_masked_key_address: [u8; 8] = data[16..24].try_into().unwrap();

    let candidate = resolve_candidate(
        &stored_header_key,
        &stored_key_id_hash,
        &stored_masked_key_address,
        store,
    )?;

    let body = &data[HEADER_BYTES..];
    let key_definition = store.definition(candidate.key_id)?;

    let otp_window = read_key_bytes(&key_definition.key_file, candidate.key_address, HEADER_WINDOW)?;

    let mut key_file =
        File::open(&key_definition.key_file).map_err(IoError::CantOpenKeyFileForReading)?;
    key_file
        .seek(SeekFrom::Start(candidate.key_address + HEADER_WINDOW as u64))
        .map_err(IoError::CantSeekInKeyFile)?;

    let keystream_seed = [&otp_window[..], candidate.password.as_bytes(), b"keystream"].concat();
    let mut mixer = KeystreamMixer::new(key_file, PseudoRandomStream::new(&keystream_seed));

    let mut cursor = 0usize;
    let mut take = |n: usize| -> Result<Vec<u8>, Error> {
        if cursor + n > body.len() {
            return Err(RecordError::InvalidEncryptedFileFormat.into());
        }
        let mut field = body[cursor..cursor + n].to_vec();
        cursor += n;
        mixer.crypt_bytes(&mut field)?;
        Ok(field)
    };

    let extra_key_used = take(1)?[0];
    let size_bits = take(1)?[0];
    let text_bytes_width = (size_bits & 0x0f) as usize;
    let fill_bytes_width = (size_bits >> 4) as usize;

    let text_size_bytes = take(text_bytes_width)?;
    let fill_size_bytes = take(fill_bytes_width)?;
    let text_len = read_le(&text_size_bytes) as usize;
    let fill_len = read_le(&fill_size_bytes) as usize;

    let file_name_size_bytes = take(2)?;
    let file_name_len = u16::from_le_bytes(file_name_size_bytes.clone().try_into().unwrap()) as usize;
    let file_name_bytes = take(file_name_len)?;

    let text_fill = take(text_len + fill_len)?;
    let (plaintext, _fill_bytes) = deinterleave_text_fill(&text_fill, text_len, fill_len);

    let stored_sum_z = take(8)?;

    let expected_sum_z = compute_sum_z(
        extra_key_used,
        size_bits,
        &text_size_bytes,
        &fill_size_bytes,
        &file_name_bytes,
        &plaintext,
    );

    let checksum_error = if stored_sum_z.as_slice() != expected_sum_z.as_slice() {
        Some(RecordError::InvalidChecksumDecrypted.into())
    } else {
        None
    };

    let consumed_len = HEADER_WINDOW as u64 + cursor as u64;

    let record = DecodedRecord {
        plaintext,
        file_name: if file_name_len > 0 {
            Some(String::from_utf8_lossy(&file_name_bytes).into_owned())
        } else {
            None
        },
        key_id: candidate.key_id,
        key_address: candidate.key_address,
        consumed_len,
    };

    Ok(DecodeOutcome {
        record,
        checksum_error,
    })
}

fn resolve_candidate(
    stored_header_key: &[u8; 8],
    stored_key_id_hash: &[u8; 8],
    stored_masked_key_address: &[u8; 8],
    store: &KeyStore,
) -> Result<ResolvedCandidate, Error> {
    let mut any_key_id_hash_matched = false;

    for definition in store.definitions() {
        let key_address = match header::try_candidate(
            stored_header_key,
            stored_key_id_hash,
            stored_masked_key_address,
            definition.key_id,
            &definition.password,
        ) {
            Some(addr) => addr,
            None => continue,
        };
        any_key_id_hash_matched = true;

        let otp_window = match read_key_bytes(&definition.key_file, key_address, HEADER_WINDOW) {
            Ok(window) => window,
            Err(_) => continue,
        };

        if header::verify_header_key(&otp_window, &definition.password, stored_header_key) {
            return Ok(ResolvedCandidate {
                key_id: definition.key_id,
                password: definition.password.clone(),
                key_address,
            });
        }
    }

    if any_key_id_hash_matched {
        Err(HeaderError::CantIdentifyKeyAddressForDecryption.into())
    } else {
        Err(HeaderError::CantIdentifyKeyIdForDecryption.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::KeyStore;
    use crate::record::encode::encode;
    use crate::record::EncodeOptions;
    use std::io::Write;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(tag: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("ot7-decode-test-{}-{}", tag, nanos));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn make_store(dir: &std::path::Path, key_bytes: &[u8]) -> KeyStore {
        let key_path = dir.join("test.key");
        std::fs::File::create(&key_path)
            .unwrap()
            .write_all(key_bytes)
            .unwrap();
        let key_map_path = dir.join("key.map");
        std::fs::write(
            &key_map_path,
            format!(
                "KeyID = 1\nKeyFile = {}\nPassword = pw\nend\n",
                key_path.display()
            ),
        )
        .unwrap();
        let log_path = dir.join("ot7.log");
        std::fs::write(&log_path, b"").unwrap();

        KeyStore::load(&key_map_path, &log_path).unwrap()
    }

    #[test]
    fn round_trip_recovers_plaintext_and_filename() {
        let dir = temp_dir("roundtrip");
        let mut store = make_store(&dir, &vec![0x11u8; 8192]);
        let options = EncodeOptions {
            key_id: 1,
            password: "pw".to_string(),
            file_name: Some("a.txt".to_string()),
            fill_size: Some(1),
            erase_after_use: false,
        };

        let record = encode(b"A", &options, &mut store).unwrap();
        let outcome = decode(&record, &store).unwrap();

        assert!(outcome.checksum_error.is_none());
        assert_eq!(outcome.record.plaintext, b"A".to_vec());
        assert_eq!(outcome.record.file_name.as_deref(), Some("a.txt"));
        assert_eq!(outcome.record.key_id, 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn wrong_password_fails_to_identify_key_id() {
        let dir = temp_dir("wrongpw");
        let mut store = make_store(&dir, &vec![0x22u8; 8192]);
        let options = EncodeOptions {
            key_id: 1,
            password: "right".to_string(),
            file_name: None,
            fill_size: Some(0),
            erase_after_use: false,
        };
        let record = encode(b"secret", &options, &mut store).unwrap();

        let wrong_key_map = dir.join("wrong.map");
        std::fs::write(
            &wrong_key_map,
            format!(
                "KeyID = 1\nKeyFile = {}\nPassword = wrong\nend\n",
                dir.join("test.key").display()
            ),
        )
        .unwrap();
        let wrong_store = KeyStore::load(&wrong_key_map, dir.join("ot7.log")).unwrap();

        let err = decode(&record, &wrong_store).unwrap_err();
        assert!(matches!(
            err,
            Error::Header(HeaderError::CantIdentifyKeyIdForDecryption)
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn flipped_textfill_byte_is_detected() {
        let dir = temp_dir("flipped");
        let mut store = make_store(&dir, &vec![0x33u8; 8192]);
        let options = EncodeOptions {
            key_id: 1,
            password: "pw".to_string(),
            file_name: None,
            fill_size: Some(0),
            erase_after_use: false,
        };
        let mut record = encode(b"hello world", &options, &mut store).unwrap();

        let text_fill_offset = HEADER_BYTES + 1 + 1 + 1 + 0 + 2;
        record[text_fill_offset] ^= 0x01;

        let outcome = decode(&record, &store).unwrap();
        assert!(outcome.checksum_error.is_some());
        assert_ne!(outcome.record.plaintext, b"hello world".to_vec());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_plaintext_and_no_filename_round_trips() {
        let dir = temp_dir("empty");
        let mut store = make_store(&dir, &vec![0x44u8; 4096]);
        let options = EncodeOptions {
            key_id: 1,
            password: "pw".to_string(),
            file_name: None,
            fill_size: Some(0),
            erase_after_use: false,
        };
        let record = encode(b"", &options, &mut store).unwrap();
        assert_eq!(record.len(), 36);

        let outcome = decode(&record, &store).unwrap();
        assert!(outcome.record.plaintext.is_empty());
        assert!(outcome.record.file_name.is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
