//! Combines an OTP byte source with a password-derived PRF stream into a
//! single keystream, and applies it to plaintext/ciphertext bytes.

use std::io::Read;

use crate::errors::{Error, RecordError};
use crate::skein::PseudoRandomStream;

/// Produces mixed keystream bytes from an OTP reader and a PRF stream, and
/// applies them to data via XOR. Encryption and decryption are the same
/// operation.
pub struct KeystreamMixer<R> {
    otp: R,
    prf: PseudoRandomStream,
}

impl<R: Read> KeystreamMixer<R> {
    /// Wrap an OTP byte reader (already seeked to the start of its
    /// allocated region) and a seeded PRF stream.
    pub fn new(otp: R, prf: PseudoRandomStream) -> KeystreamMixer<R> {
        KeystreamMixer { otp, prf }
    }

    /// Read one byte from the OTP region and one from the PRF, and return
    /// their XOR. Returns [`RecordError::RanOutOfKeyInOneTimePad`] if the
    /// OTP region is exhausted before the record requires it.
    pub fn next_mixed_byte(&mut self) -> Result<u8, Error> {
        let mut otp_byte = [0u8; 1];
        self.otp
            .read_exact(&mut otp_byte)
            .map_err(|_| Error::Record(RecordError::RanOutOfKeyInOneTimePad))?;
        let prf_byte = self.prf.next_byte();
        Ok(otp_byte[0] ^ prf_byte)
    }

    /// Encrypt (or decrypt) one byte in place.
    pub fn crypt_byte(&mut self, byte: u8) -> Result<u8, Error> {
        Ok(byte ^ self.next_mixed_byte()?)
    }

    /// Encrypt (or decrypt) a whole buffer in place.
    pub fn crypt_bytes(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        for byte in buf.iter_mut() {
            *byte ^= self.next_mixed_byte()?;
        }
        Ok(())
    }
}
