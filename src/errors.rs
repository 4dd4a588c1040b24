//! Error types for ot7.
//!
//! One `thiserror` enum per subsystem, matching the original tool's
//! `RESULT_*` taxonomy, wrapped by the top-level [`Error`] that every public
//! entry point returns.

use thiserror::Error;

#[derive(Error, Debug)]
/// Errors encountered resolving key definitions and allocating key material.
pub enum KeyStoreError {
    /// The key-map file could not be opened or read.
    #[error("can't read key map file - {0}")]
    CantReadKeyMapFile(#[from] std::io::Error),
    /// The key-map file path given on the command line is not usable.
    #[error("invalid key map file name")]
    InvalidKeyMapFileName,
    /// A key definition in the key map is missing its `KeyID` field.
    #[error("missing KeyID in key definition string")]
    MissingKeyIdInKeyDefString,
    /// No key definition in the key map has the requested `KeyID`.
    #[error("can't identify KeyID for encryption")]
    CantIdentifyKeyIdForEncryption,
    /// The key file named in the key definition is not usable.
    #[error("invalid key file name")]
    InvalidKeyFileName,
    /// The log file path is not usable.
    #[error("invalid log file name")]
    InvalidLogFileName,
    /// No free region of the key file is large enough for the request.
    #[error("key file is too small for the requested allocation")]
    KeyFileIsTooSmall,
    /// The allocator could not find any unused range satisfying the request.
    #[error("ran out of key material")]
    RanOutOfKey,
}

#[derive(Error, Debug)]
/// Errors encountered deriving or validating a record header.
pub enum HeaderError {
    /// No configured `(KeyID, password)` pair produced a matching `KeyIDHash`.
    #[error("can't identify KeyID for decryption")]
    CantIdentifyKeyIdForDecryption,
    /// No configured candidate produced a `KeyAddress` usable against its key file.
    #[error("can't identify KeyAddress for decryption")]
    CantIdentifyKeyAddressForDecryption,
    /// A derived `HeaderKey` did not match the stored header after a candidate was chosen.
    #[error("computed HeaderKey is invalid")]
    InvalidComputedHeaderKey,
    /// The key file could not be seeked to the candidate `KeyAddress`.
    #[error("invalid key file pointer")]
    InvalidKeyFilePointer,
}

#[derive(Error, Debug)]
/// Errors encountered encoding or decoding the OT7 record body.
pub enum RecordError {
    /// The record is shorter than the fixed 24-byte header.
    #[error("invalid encrypted file format")]
    InvalidEncryptedFileFormat,
    /// The Keystream Mixer exhausted its allocated OTP region mid-record.
    #[error("ran out of key in one-time pad")]
    RanOutOfKeyInOneTimePad,
    /// The decrypted `SumZ` did not match the recomputed checksum.
    ///
    /// Non-fatal to output: the plaintext is written regardless and this
    /// error is still returned so the caller can report it.
    #[error("invalid checksum on decrypted content")]
    InvalidChecksumDecrypted,
    /// Decoded field widths or sizes are internally inconsistent.
    #[error("invalid decryption output")]
    InvalidDecryptionOutput,
    /// An encode-time filename contained non-printable bytes.
    #[error("invalid output file name")]
    InvalidOutputFileName,
}

#[derive(Error, Debug)]
/// Errors encountered performing file I/O for the named roles.
pub enum IoError {
    /// Could not open the plaintext file for reading.
    #[error("can't open plaintext file for reading - {0}")]
    CantOpenPlaintextFileForReading(std::io::Error),
    /// Could not open the plaintext file for writing.
    #[error("can't open plaintext file for writing - {0}")]
    CantOpenPlaintextFileForWriting(std::io::Error),
    /// Could not open the encrypted file for reading.
    #[error("can't open encrypted file for reading - {0}")]
    CantOpenEncryptedFileForReading(std::io::Error),
    /// Could not open the encrypted file for writing.
    #[error("can't open encrypted file for writing - {0}")]
    CantOpenEncryptedFileForWriting(std::io::Error),
    /// Could not open the key file for reading.
    #[error("can't open key file for reading - {0}")]
    CantOpenKeyFileForReading(std::io::Error),
    /// Could not open the key file for writing (erase option).
    #[error("can't open key file for writing - {0}")]
    CantOpenKeyFileForWriting(std::io::Error),
    /// Could not open some other output file for writing.
    #[error("can't open file for writing - {0}")]
    CantOpenFileForWriting(std::io::Error),
    /// Could not read the plaintext file.
    #[error("can't read plaintext file - {0}")]
    CantReadPlaintextFile(std::io::Error),
    /// Could not read the encrypted file.
    #[error("can't read encrypted file - {0}")]
    CantReadEncryptedFile(std::io::Error),
    /// Could not read the key file.
    #[error("can't read key file - {0}")]
    CantReadKeyFile(std::io::Error),
    /// Could not write the plaintext file.
    #[error("can't write plaintext file - {0}")]
    CantWritePlaintextFile(std::io::Error),
    /// Could not write the encrypted file.
    #[error("can't write encrypted file - {0}")]
    CantWriteEncryptedFile(std::io::Error),
    /// Could not write the key file (erase option).
    #[error("can't write key file - {0}")]
    CantWriteKeyFile(std::io::Error),
    /// Could not write some other output file.
    #[error("can't write file - {0}")]
    CantWriteFile(std::io::Error),
    /// Could not seek in the plaintext file.
    #[error("can't seek in plaintext file - {0}")]
    CantSeekInPlaintextFile(std::io::Error),
    /// Could not seek in the encrypted file.
    #[error("can't seek in encrypted file - {0}")]
    CantSeekInEncryptedFile(std::io::Error),
    /// Could not seek in the key file.
    #[error("can't seek in key file - {0}")]
    CantSeekInKeyFile(std::io::Error),
    /// Could not close the plaintext file.
    #[error("can't close plaintext file - {0}")]
    CantClosePlaintextFile(std::io::Error),
    /// Could not close the encrypted file.
    #[error("can't close encrypted file - {0}")]
    CantCloseEncryptedFile(std::io::Error),
    /// Could not close the key file.
    #[error("can't close key file - {0}")]
    CantCloseKeyFile(std::io::Error),
    /// Could not close some other file.
    #[error("can't close file - {0}")]
    CantCloseFile(std::io::Error),
    /// Could not overwrite consumed key bytes with zeros.
    #[error("can't erase used key bytes - {0}")]
    CantEraseUsedKeyBytes(std::io::Error),
}

#[derive(Error, Debug)]
/// Errors encountered parsing command-line input, independent of `clap`'s
/// own parse errors (which `clap` reports itself before this crate is
/// reached).
pub enum ConfigError {
    /// No command-line parameters were given at all.
    #[error("no command line parameters given")]
    NoCommandLineParametersGiven,
    /// A required parameter is missing for the requested operation.
    #[error("missing command line parameter")]
    MissingCommandLineParameter,
    /// A parameter value is not valid for its flag.
    #[error("invalid command line parameter")]
    InvalidCommandLineParameter,
    /// The name given for a file to decrypt is not usable.
    #[error("invalid name of file to decrypt")]
    InvalidNameOfFileToDecrypt,
    /// The name given for the plaintext output file is not usable.
    #[error("invalid name of plaintext file")]
    InvalidNameOfPlaintextFile,
    /// A text line read from a configuration or log file exceeded the
    /// fixed parsing buffer.
    #[error("text line too long for buffer")]
    TextLineTooLongForBuffer,
}

#[derive(Error, Debug)]
/// Errors raised by the Skein1024 self-test.
pub enum SkeinError {
    /// The self-test context could not be initialized.
    #[error("Skein self-test initialization failed")]
    SkeinTestInitializationFailed,
    /// The self-test digest did not match the expected internal-consistency
    /// checks.
    #[error("Skein self-test final result is invalid - {0}")]
    SkeinTestFinalResultIsInvalid(&'static str),
}

#[derive(Error, Debug)]
/// Wrapper error type for this crate.
pub enum Error {
    /// Failed to resolve a KeyID or allocate key material.
    #[error("key store error: {0}")]
    KeyStore(#[from] KeyStoreError),
    /// Failed to derive or validate a record header.
    #[error("header error: {0}")]
    Header(#[from] HeaderError),
    /// Failed to encode or decode the record body.
    #[error("record error: {0}")]
    Record(#[from] RecordError),
    /// Failed performing file I/O.
    #[error("io error: {0}")]
    Io(#[from] IoError),
    /// Failed parsing command-line configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// Skein self-test failed.
    #[error("skein error: {0}")]
    Skein(#[from] SkeinError),
    /// The process ran out of memory; surfaced for completeness with the
    /// original taxonomy, not expected to occur in practice.
    #[error("out of memory")]
    OutOfMemory,
}

impl Error {
    /// Stable numeric exit code matching the original tool's `RESULT_*`
    /// enumeration, for use as a process exit status.
    pub fn result_code(&self) -> u8 {
        use Error::*;
        match self {
            KeyStore(KeyStoreError::CantReadKeyMapFile(_)) => 1,
            KeyStore(KeyStoreError::InvalidKeyMapFileName) => 2,
            KeyStore(KeyStoreError::MissingKeyIdInKeyDefString) => 3,
            KeyStore(KeyStoreError::CantIdentifyKeyIdForEncryption) => 4,
            KeyStore(KeyStoreError::InvalidKeyFileName) => 5,
            KeyStore(KeyStoreError::InvalidLogFileName) => 6,
            KeyStore(KeyStoreError::KeyFileIsTooSmall) => 7,
            KeyStore(KeyStoreError::RanOutOfKey) => 8,
            Header(HeaderError::CantIdentifyKeyIdForDecryption) => 9,
            Header(HeaderError::CantIdentifyKeyAddressForDecryption) => 10,
            Header(HeaderError::InvalidComputedHeaderKey) => 11,
            Header(HeaderError::InvalidKeyFilePointer) => 12,
            Record(RecordError::InvalidEncryptedFileFormat) => 13,
            Record(RecordError::RanOutOfKeyInOneTimePad) => 14,
            Record(RecordError::InvalidChecksumDecrypted) => 15,
            Record(RecordError::InvalidDecryptionOutput) => 16,
            Record(RecordError::InvalidOutputFileName) => 17,
            Io(IoError::CantOpenPlaintextFileForReading(_)) => 18,
            Io(IoError::CantOpenPlaintextFileForWriting(_)) => 19,
            Io(IoError::CantOpenEncryptedFileForReading(_)) => 20,
            Io(IoError::CantOpenEncryptedFileForWriting(_)) => 21,
            Io(IoError::CantOpenKeyFileForReading(_)) => 22,
            Io(IoError::CantOpenKeyFileForWriting(_)) => 23,
            Io(IoError::CantOpenFileForWriting(_)) => 24,
            Io(IoError::CantReadPlaintextFile(_)) => 25,
            Io(IoError::CantReadEncryptedFile(_)) => 26,
            Io(IoError::CantReadKeyFile(_)) => 27,
            Io(IoError::CantWritePlaintextFile(_)) => 28,
            Io(IoError::CantWriteEncryptedFile(_)) => 29,
            Io(IoError::CantWriteKeyFile(_)) => 30,
            Io(IoError::CantWriteFile(_)) => 31,
            Io(IoError::CantSeekInPlaintextFile(_)) => 32,
            Io(IoError::CantSeekInEncryptedFile(_)) => 33,
            Io(IoError::CantSeekInKeyFile(_)) => 34,
            Io(IoError::CantClosePlaintextFile(_)) => 35,
            Io(IoError::CantCloseEncryptedFile(_)) => 36,
            Io(IoError::CantCloseKeyFile(_)) => 37,
            Io(IoError::CantCloseFile(_)) => 38,
            Io(IoError::CantEraseUsedKeyBytes(_)) => 39,
            Config(ConfigError::NoCommandLineParametersGiven) => 40,
            Config(ConfigError::MissingCommandLineParameter) => 41,
            Config(ConfigError::InvalidCommandLineParameter) => 42,
            Config(ConfigError::InvalidNameOfFileToDecrypt) => 43,
            Config(ConfigError::InvalidNameOfPlaintextFile) => 44,
            Config(ConfigError::TextLineTooLongForBuffer) => 45,
            Skein(SkeinError::SkeinTestInitializationFailed) => 46,
            Skein(SkeinError::SkeinTestFinalResultIsInvalid(_)) => 47,
            OutOfMemory => 48,
        }
    }
}
