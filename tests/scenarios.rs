use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use ot7::{EncodeRequest, Envelope, Error, KeyStore};

fn temp_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("ot7-scenarios-{}-{}", tag, nanos));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn make_store(dir: &Path, key_bytes: &[u8]) -> KeyStore {
    let key_path = dir.join("test.key");
    std::fs::File::create(&key_path)
        .unwrap()
        .write_all(key_bytes)
        .unwrap();
    let key_map_path = dir.join("key.map");
    std::fs::write(
        &key_map_path,
        format!(
            "KeyID = 123\nKeyFile = {}\nPassword = \nend\n",
            key_path.display()
        ),
    )
    .unwrap();
    let log_path = dir.join("ot7.log");
    std::fs::write(&log_path, b"").unwrap();

    KeyStore::load(&key_map_path, &log_path).unwrap()
}

/// S1: plaintext "hello" (5 bytes), fill=0, KeyID=123, password="": encrypted
/// file has length 42 bytes in binary mode.
#[test]
fn s1_hello_record_is_42_bytes() -> Result<(), Error> {
    let dir = temp_dir("s1");
    let mut store = make_store(&dir, &vec![0xa5u8; 4096]);
    let request = EncodeRequest {
        key_id: 123,
        password: String::new(),
        file_name: None,
        fill_size: Some(0),
        erase_after_use: false,
    };

    let record = ot7::encode_bytes(b"hello", &request, &mut store, Envelope::Binary)?;
    assert_eq!(record.len(), 42);

    let _ = std::fs::remove_dir_all(&dir);
    Ok(())
}

/// S2: 0-byte plaintext, fill=0, no filename: encrypted length 36 bytes;
/// decode returns an empty file.
#[test]
fn s2_empty_plaintext_record_is_36_bytes() -> Result<(), Error> {
    let dir = temp_dir("s2");
    let mut store = make_store(&dir, &vec![0x5au8; 4096]);
    let request = EncodeRequest {
        key_id: 123,
        password: String::new(),
        file_name: None,
        fill_size: Some(0),
        erase_after_use: false,
    };

    let record = ot7::encode_bytes(b"", &request, &mut store, Envelope::Binary)?;
    assert_eq!(record.len(), 36);

    let outcome = ot7::decode_bytes(&record, &mut store, false, false)?;
    assert!(outcome.record.plaintext.is_empty());

    let _ = std::fs::remove_dir_all(&dir);
    Ok(())
}

/// S3: 1-byte plaintext 0x41, fill=1, with filename "a.txt": TextFill is
/// exactly 2 bytes.
#[test]
fn s3_single_byte_plaintext_with_fill_interleaves_two_bytes() -> Result<(), Error> {
    let dir = temp_dir("s3");
    let mut store = make_store(&dir, &vec![0x99u8; 4096]);
    let request = EncodeRequest {
        key_id: 123,
        password: String::new(),
        file_name: Some("a.txt".to_string()),
        fill_size: Some(1),
        erase_after_use: false,
    };

    let record = ot7::encode_bytes(&[0x41], &request, &mut store, Envelope::Binary)?;
    // header(24) + ExtraKeyUsed(1) + SizeBits(1) + TextSize(1) + FillSize(1)
    // + FileNameSize(2) + FileName(5) + TextFill(2) + SumZ(8) = 45
    assert_eq!(record.len(), 45);

    let outcome = ot7::decode_bytes(&record, &mut store, false, false)?;
    assert_eq!(outcome.record.plaintext, vec![0x41]);
    assert_eq!(outcome.record.file_name.as_deref(), Some("a.txt"));

    let _ = std::fs::remove_dir_all(&dir);
    Ok(())
}

/// S4: run encode twice against the same key file; consumption log shows
/// two disjoint ranges; a third encode requesting more bytes than remain
/// free fails with RanOutOfKeyInOneTimePad-class error.
#[test]
fn s4_repeated_encodes_consume_disjoint_ranges_then_exhaust() -> Result<(), Error> {
    let dir = temp_dir("s4");
    let mut store = make_store(&dir, &vec![0x12u8; 90]);
    let request = EncodeRequest {
        key_id: 123,
        password: String::new(),
        file_name: None,
        fill_size: Some(0),
        erase_after_use: false,
    };

    let first = ot7::encode_bytes(b"one", &request, &mut store, Envelope::Binary)?;
    let second = ot7::encode_bytes(b"two", &request, &mut store, Envelope::Binary)?;
    assert_ne!(first, second);

    let third = ot7::encode_bytes(
        b"a message long enough to exceed what remains in the tiny key file",
        &request,
        &mut store,
        Envelope::Binary,
    );
    assert!(third.is_err());

    let _ = std::fs::remove_dir_all(&dir);
    Ok(())
}

/// S5: flip one byte in the TextFill region of a valid encrypted record;
/// decode emits plaintext output and reports an invalid-checksum error.
#[test]
fn s5_flipped_textfill_byte_still_decodes_but_reports_checksum_error() -> Result<(), Error> {
    let dir = temp_dir("s5");
    let mut store = make_store(&dir, &vec![0x77u8; 4096]);
    let request = EncodeRequest {
        key_id: 123,
        password: String::new(),
        file_name: None,
        fill_size: Some(0),
        erase_after_use: false,
    };

    let mut record = ot7::encode_bytes(b"hello world", &request, &mut store, Envelope::Binary)?;
    let text_fill_offset = ot7::record::HEADER_BYTES + 1 + 1 + 1 + 0 + 2;
    record[text_fill_offset] ^= 0x01;

    let outcome = ot7::decode_bytes(&record, &mut store, false, false)?;
    assert!(outcome.checksum_error.is_some());
    assert!(!outcome.record.plaintext.is_empty());

    let _ = std::fs::remove_dir_all(&dir);
    Ok(())
}

/// S6: encode with base64; output contains only the base64 alphabet plus
/// line terminators; decode with base64 reproduces the plaintext.
#[test]
fn s6_base64_output_is_alphabet_only_and_round_trips() -> Result<(), Error> {
    let dir = temp_dir("s6");
    let mut store = make_store(&dir, &vec![0x88u8; 4096]);
    let request = EncodeRequest {
        key_id: 123,
        password: String::new(),
        file_name: None,
        fill_size: Some(0),
        erase_after_use: false,
    };

    let record = ot7::encode_bytes(b"base64 scenario", &request, &mut store, Envelope::Binary)?;
    let wrapped = Envelope::Base64.wrap(&record);
    assert!(wrapped.iter().all(|&b| b == b'\n'
        || b.is_ascii_alphanumeric()
        || b == b'+'
        || b == b'/'
        || b == b'='));

    let unwrapped = Envelope::Base64.unwrap(&wrapped).unwrap();
    let outcome = ot7::decode_bytes(&unwrapped, &mut store, false, false)?;
    assert_eq!(outcome.record.plaintext, b"base64 scenario".to_vec());

    let _ = std::fs::remove_dir_all(&dir);
    Ok(())
}

/// Property 5: encoding with the filename omitted yields FileNameSize = 0
/// and no FileName bytes; decoding reconstructs content but not name.
#[test]
fn filename_omission_yields_zero_length_field() -> Result<(), Error> {
    let dir = temp_dir("filename-omission");
    let mut store = make_store(&dir, &vec![0x66u8; 4096]);
    let request = EncodeRequest {
        key_id: 123,
        password: String::new(),
        file_name: None,
        fill_size: Some(0),
        erase_after_use: false,
    };

    let record = ot7::encode_bytes(b"no name here", &request, &mut store, Envelope::Binary)?;
    let outcome = ot7::decode_bytes(&record, &mut store, false, false)?;
    assert!(outcome.record.file_name.is_none());
    assert_eq!(outcome.record.plaintext, b"no name here".to_vec());

    let _ = std::fs::remove_dir_all(&dir);
    Ok(())
}

/// Property 6: Skein1024 passes its internal-consistency self-test.
#[test]
fn skein_self_test_passes() {
    assert!(ot7::skein::self_test().is_ok());
}
