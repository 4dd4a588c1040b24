//! Optional base64 textual envelope around a finished binary record. Not
//! part of the cryptographic core; purely a presentation concern at the
//! file boundary.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

const LINE_WIDTH: usize = 76;

/// Which outer presentation a record is read from or written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// The raw binary record, no transformation.
    Binary,
    /// RFC 4648 standard base64, line-wrapped at 76 columns on encode.
    Base64,
}

impl Envelope {
    /// Wrap `record` bytes for writing to disk.
    pub fn wrap(self, record: &[u8]) -> Vec<u8> {
        match self {
            Envelope::Binary => record.to_vec(),
            Envelope::Base64 => {
                let encoded = STANDARD.encode(record);
                let mut out = String::with_capacity(encoded.len() + encoded.len() / LINE_WIDTH + 1);
                for chunk in encoded.as_bytes().chunks(LINE_WIDTH) {
                    out.push_str(std::str::from_utf8(chunk).unwrap());
                    out.push('\n');
                }
                out.into_bytes()
            }
        }
    }

    /// Recover the binary record from file contents read under this
    /// envelope. For [`Envelope::Base64`], any whitespace between base64
    /// characters (including the line-wrap newlines `wrap` inserts) is
    /// ignored.
    pub fn unwrap(self, contents: &[u8]) -> Result<Vec<u8>, base64::DecodeError> {
        match self {
            Envelope::Binary => Ok(contents.to_vec()),
            Envelope::Base64 => {
                let filtered: Vec<u8> = contents
                    .iter()
                    .copied()
                    .filter(|b| !b.is_ascii_whitespace())
                    .collect();
                STANDARD.decode(filtered)
            }
        }
    }
}
