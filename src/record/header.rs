//! Derivation and validation of the self-indexing 24-byte record header.

use crate::skein::Skein1024;

/// Number of OTP bytes read at `KeyAddress` to derive `HeaderKey`. Fixed
/// once for the whole protocol; encode and decode must agree.
pub const HEADER_WINDOW: usize = 8;

/// The three header fields stored in a record, all written (and read)
/// little-endian.
pub struct DerivedHeader {
    /// First 8 bytes of `Skein1024-1024(OTP window ‖ password)`.
    pub header_key: [u8; 8],
    /// Identifies the `(KeyID, password)` pair without revealing `KeyID`.
    pub key_id_hash: [u8; 8],
    /// `KeyAddress` XORed with the mask derived alongside `key_id_hash`.
    pub masked_key_address: [u8; 8],
}

fn header_key_from_window(otp_window: &[u8], password: &str) -> [u8; 8] {
    let mut ctx = Skein1024::init(1024);
    ctx.update(otp_window);
    ctx.update(password.as_bytes());
    let digest = ctx.finish();
    digest[..8].try_into().unwrap()
}

fn key_id_hash_and_mask(header_key: &[u8; 8], key_id: u64, password: &str) -> ([u8; 8], [u8; 8]) {
    let mut ctx = Skein1024::init(128);
    ctx.update(header_key);
    ctx.update(&key_id.to_le_bytes());
    ctx.update(password.as_bytes());
    let digest = ctx.finish();
    let mut key_id_hash = [0u8; 8];
    let mut mask = [0u8; 8];
    key_id_hash.copy_from_slice(&digest[0..8]);
    mask.copy_from_slice(&digest[8..16]);
    (key_id_hash, mask)
}

/// Derive the header fields for an encode operation, given the OTP window
/// already read at `key_address` and the chosen `key_id`/`password`.
pub fn derive_for_encode(
    otp_window: &[u8],
    password: &str,
    key_id: u64,
    key_address: u64,
) -> DerivedHeader {
    let header_key = header_key_from_window(otp_window, password);
    let (key_id_hash, mask) = key_id_hash_and_mask(&header_key, key_id, password);
    let masked_key_address = (key_address ^ u64::from_le_bytes(mask)).to_le_bytes();
    DerivedHeader {
        header_key,
        key_id_hash,
        masked_key_address,
    }
}

/// Test one `(key_id, password)` candidate against a record's stored
/// `header_key` and `key_id_hash`. Returns the candidate `KeyAddress` if
/// `key_id_hash` matches; `None` otherwise.
///
/// A `Some` result here only means the 8-byte `KeyIDHash` matched — the
/// caller must still read the OTP window at the returned address and call
/// [`verify_header_key`] before trusting the candidate.
pub fn try_candidate(
    stored_header_key: &[u8; 8],
    stored_key_id_hash: &[u8; 8],
    stored_masked_key_address: &[u8; 8],
    key_id: u64,
    password: &str,
) -> Option<u64> {
    let (candidate_hash, mask) = key_id_hash_and_mask(stored_header_key, key_id, password);
    if &candidate_hash != stored_key_id_hash {
        return None;
    }
    let masked = u64::from_le_bytes(*stored_masked_key_address);
    Some(masked ^ u64::from_le_bytes(mask))
}

/// Recompute `HeaderKey` from an OTP window read at a candidate address
/// and compare it against the value stored in the record header.
pub fn verify_header_key(otp_window: &[u8], password: &str, stored_header_key: &[u8; 8]) -> bool {
    header_key_from_window(otp_window, password) == *stored_header_key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_candidate_recovers_key_address() {
        let otp_window = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let password = "hunter2";
        let key_id = 123;
        let key_address = 0xDEAD_BEEFu64;

        let header = derive_for_encode(&otp_window, password, key_id, key_address);
        let recovered = try_candidate(
            &header.header_key,
            &header.key_id_hash,
            &header.masked_key_address,
            key_id,
            password,
        );
        assert_eq!(recovered, Some(key_address));
        assert!(verify_header_key(&otp_window, password, &header.header_key));
    }

    #[test]
    fn wrong_password_does_not_match() {
        let otp_window = [9u8; 8];
        let header = derive_for_encode(&otp_window, "right", 1, 42);
        let recovered = try_candidate(
            &header.header_key,
            &header.key_id_hash,
            &header.masked_key_address,
            1,
            "wrong",
        );
        assert_eq!(recovered, None);
    }

    #[test]
    fn wrong_key_id_does_not_match() {
        let otp_window = [9u8; 8];
        let header = derive_for_encode(&otp_window, "pw", 1, 42);
        let recovered = try_candidate(
            &header.header_key,
            &header.key_id_hash,
            &header.masked_key_address,
            2,
            "pw",
        );
        assert_eq!(recovered, None);
    }
}
