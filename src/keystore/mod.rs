//! Resolves `KeyID`s to key files, allocates unused OTP regions, and tracks
//! consumption so bytes are never reused.

mod keymap;
mod log;

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::ops::Range;
use std::path::Path;

pub use keymap::{KeyDefinition, KeyMap};
pub use log::{key_file_identity, ConsumptionLog};

use crate::errors::{Error, IoError, KeyStoreError};

/// The default key-map file name.
pub const DEFAULT_KEY_MAP_FILE: &str = "key.map";
/// The default consumption-log file name.
pub const DEFAULT_LOG_FILE: &str = "ot7.log";

/// Owns the immutable key map and the mutable consumption log for one run
/// of the tool.
pub struct KeyStore {
    key_map: KeyMap,
    log: ConsumptionLog,
}

impl KeyStore {
    /// Load the key map and consumption log from the given paths.
    pub fn load(key_map_path: impl AsRef<Path>, log_path: impl AsRef<Path>) -> Result<KeyStore, Error> {
        Ok(KeyStore {
            key_map: KeyMap::load(key_map_path)?,
            log: ConsumptionLog::load(log_path)?,
        })
    }

    /// Look up a key definition by `KeyID`.
    pub fn definition(&self, key_id: u64) -> Result<&KeyDefinition, Error> {
        self.key_map
            .find(key_id)
            .ok_or_else(|| KeyStoreError::CantIdentifyKeyIdForEncryption.into())
    }

    /// All configured key definitions, in file order.
    pub fn definitions(&self) -> &[KeyDefinition] {
        self.key_map.definitions()
    }

    /// Allocate `len` unused bytes from the key file named by `key_id`,
    /// returning the absolute offset at which the region begins. Does not
    /// commit the allocation; call [`KeyStore::commit`] only after the
    /// caller has successfully used the region.
    pub fn allocate(&self, key_id: u64, len: u64) -> Result<u64, Error> {
        let definition = self.definition(key_id)?;
        let key_file_len = std::fs::metadata(&definition.key_file)
            .map_err(|_| KeyStoreError::InvalidKeyFileName)?
            .len();
        let identity = key_file_identity(&definition.key_file);
        self.log.allocate(&identity, key_file_len, len)
    }

    /// Commit a successfully used range back to the consumption log.
    pub fn commit(&mut self, key_id: u64, range: Range<u64>) -> Result<(), Error> {
        let identity = key_file_identity(&self.definition(key_id)?.key_file);
        self.log.commit(&identity, range)
    }

    /// Overwrite `range` of the key file named by `key_id` with zero bytes.
    /// A failure here does not roll back the logical consumption already
    /// recorded by [`KeyStore::commit`].
    pub fn erase(&self, key_id: u64, range: Range<u64>) -> Result<(), Error> {
        let definition = self.definition(key_id)?;
        let mut file = OpenOptions::new()
            .write(true)
            .open(&definition.key_file)
            .map_err(IoError::CantOpenKeyFileForWriting)?;
        file.seek(SeekFrom::Start(range.start))
            .map_err(IoError::CantSeekInKeyFile)?;
        let zeros = crate::utils::buffer((range.end - range.start) as usize);
        file.write_all(&zeros).map_err(IoError::CantEraseUsedKeyBytes)?;
        Ok(())
    }
}
