//! Encodes a plaintext file into the OT7 record layout.

use std::fs::File;
use std::io::{Seek, SeekFrom};

use crate::errors::{Error, IoError, RecordError};
use crate::keystore::KeyStore;
use crate::keystream::KeystreamMixer;
use crate::skein::PseudoRandomStream;

use super::header::{self, HEADER_WINDOW};
use super::{
    compute_sum_z, interleave_text_fill, is_printable_ascii, read_key_bytes, width_and_bytes,
    EncodeOptions,
};

/// Encode `plaintext` into a complete binary OT7 record, allocating and
/// committing OTP bytes from `store` as it goes.
pub fn encode(
    plaintext: &[u8],
    options: &EncodeOptions,
    store: &mut KeyStore,
) -> Result<Vec<u8>, Error> {
    let definition = store.definition(options.key_id)?.clone();

    let text_len = plaintext.len() as u64;

    let file_name_bytes = match &options.file_name {
        Some(name) => {
            let bytes = name.as_bytes().to_vec();
            if !is_printable_ascii(&bytes) || bytes.len() > u16::MAX as usize {
                return Err(RecordError::InvalidOutputFileName.into());
            }
            bytes
        }
        None => Vec::new(),
    };

    // Draw FillSize: explicit from the caller, or a single raw OTP byte
    // (bound 0..=255) allocated from the key store. The latter is recorded
    // as ExtraKeyUsed so the caller can erase it along with the main
    // region. Committed immediately: the allocator only excludes committed
    // ranges, so the main-region allocation below must not run while this
    // byte is merely allocated but unrecorded, or both calls first-fit to
    // the same offset and the pad gets reused.
    let (fill_size, extra_key_used, extra_range) = match options.fill_size {
        Some(fill_size) => (fill_size, 0u8, None),
        None => {
            let extra_offset = store.allocate(options.key_id, 1)?;
            let extra_range = extra_offset..extra_offset + 1;
            store.commit(options.key_id, extra_range.clone())?;
            let byte = read_key_bytes(&definition.key_file, extra_offset, 1)?[0];
            (byte as u64, 1u8, Some(extra_range))
        }
    };

    let (text_bytes_width, text_size_bytes) = width_and_bytes(text_len);
    let (fill_bytes_width, fill_size_bytes) = width_and_bytes(fill_size);
    let size_bits = (fill_bytes_width << 4) | text_bytes_width;

    let body_len = 1u64
        + 1
        + text_size_bytes.len() as u64
        + fill_size_bytes.len() as u64
        + 2
        + file_name_bytes.len() as u64
        + text_len
        + fill_size
        + 8;

    let main_region_len = HEADER_WINDOW as u64 + body_len;
    let key_address = store.allocate(options.key_id, main_region_len)?;

    let otp_window = read_key_bytes(&definition.key_file, key_address, HEADER_WINDOW)?;
    let header = header::derive_for_encode(&otp_window, &options.password, options.key_id, key_address);

    let mut key_file = File::open(&definition.key_file).map_err(IoError::CantOpenKeyFileForReading)?;
    key_file
        .seek(SeekFrom::Start(key_address + HEADER_WINDOW as u64))
        .map_err(IoError::CantSeekInKeyFile)?;

    let keystream_seed = [&otp_window[..], options.password.as_bytes(), b"keystream"].concat();
    let fill_seed = [&otp_window[..], options.password.as_bytes(), b"fill"].concat();
    let mut mixer = KeystreamMixer::new(key_file, PseudoRandomStream::new(&keystream_seed));
    let fill_bytes = PseudoRandomStream::new(&fill_seed).next_bytes(fill_size as usize);

    let sum_z = compute_sum_z(
        extra_key_used,
        size_bits,
        &text_size_bytes,
        &fill_size_bytes,
        &file_name_bytes,
        plaintext,
    );

    let mut out = Vec::with_capacity(super::HEADER_BYTES + body_len as usize);
    out.extend_from_slice(&header.header_key);
    out.extend_from_slice(&header.key_id_hash);
    out.extend_from_slice(&header.masked_key_address);

    let mut encrypt_field = |field: &[u8], out: &mut Vec<u8>| -> Result<(), Error> {
        let mut field = field.to_vec();
        mixer.crypt_bytes(&mut field)?;
        out.extend_from_slice(&field);
        Ok(())
    };

    encrypt_field(&[extra_key_used], &mut out)?;
    encrypt_field(&[size_bits], &mut out)?;
    encrypt_field(&text_size_bytes, &mut out)?;
    encrypt_field(&fill_size_bytes, &mut out)?;
    encrypt_field(&(file_name_bytes.len() as u16).to_le_bytes(), &mut out)?;
    encrypt_field(&file_name_bytes, &mut out)?;
    encrypt_field(&interleave_text_fill(plaintext, &fill_bytes), &mut out)?;
    encrypt_field(&sum_z, &mut out)?;

    store.commit(options.key_id, key_address..key_address + main_region_len)?;

    if options.erase_after_use {
        if let Some(range) = extra_range {
            store.erase(options.key_id, range)?;
        }
        store.erase(options.key_id, key_address..key_address + main_region_len)?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::KeyStore;
    use crate::record::decode::decode;
    use std::io::Write;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(tag: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("ot7-encode-test-{}-{}", tag, nanos));
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
    fn encode_produces_header_plus_body() {
        let dir = temp_dir("basic");
        let mut store = make_store(&dir, &vec![0xAAu8; 4096]);

        let options = EncodeOptions {
            key_id: 1,
            password: "pw".to_string(),
            file_name: None,
            fill_size: Some(0),
            erase_after_use: false,
        };

        let record = encode(b"hello", &options, &mut store).unwrap();
        // header(24) + ExtraKeyUsed(1) + SizeBits(1) + TextSize(1) + FillSize(0)
        // + FileNameSize(2) + FileName(0) + TextFill(5) + SumZ(8) = 42
        assert_eq!(record.len(), 42);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn consecutive_encodes_consume_disjoint_ranges() {
        let dir = temp_dir("disjoint");
        let mut store = make_store(&dir, &vec![0x55u8; 4096]);
        let options = EncodeOptions {
            key_id: 1,
            password: "pw".to_string(),
            file_name: None,
            fill_size: Some(0),
            erase_after_use: false,
        };

        let first = encode(b"one", &options, &mut store).unwrap();
        let second = encode(b"two", &options, &mut store).unwrap();
        assert_ne!(first, second);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn default_fill_size_does_not_reuse_the_extra_key_byte() {
        let dir = temp_dir("default-fill");
        let mut store = make_store(&dir, &vec![0x66u8; 4096]);
        let options = EncodeOptions {
            key_id: 1,
            password: "pw".to_string(),
            file_name: None,
            fill_size: None,
            erase_after_use: false,
        };

        // Two encodes back to back on the default fill path: the
        // ExtraKeyUsed byte allocated for the first must not be handed out
        // again as part of (or ahead of) the second's main region.
        let first = encode(b"one", &options, &mut store).unwrap();
        let second = encode(b"two", &options, &mut store).unwrap();
        assert_ne!(first, second);

        let outcome_a = decode(&first, &store).unwrap();
        let outcome_b = decode(&second, &store).unwrap();
        let range_a = outcome_a.record.key_address
            ..outcome_a.record.key_address + outcome_a.record.consumed_len;
        let range_b = outcome_b.record.key_address
            ..outcome_b.record.key_address + outcome_b.record.consumed_len;
        assert!(
            range_a.end <= range_b.start || range_b.end <= range_a.start,
            "consumed ranges overlap: {:?} vs {:?}",
            range_a,
            range_b
        );

        let _ = std::fs::remove_dir_all(&dir);
    }
}
