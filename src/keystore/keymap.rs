//! Parses the `key.map` configuration file into [`KeyDefinition`]s.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{Error, KeyStoreError};

/// One key definition from the key map: a `KeyID` plus the key file and
/// defaults it resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDefinition {
    /// The numeric identifier selected with `-KeyID`.
    pub key_id: u64,
    /// Path to the true-random key file this definition draws from.
    pub key_file: PathBuf,
    /// Default password mixed into header derivation and the PRF seed.
    pub password: String,
    /// Default for omitting the filename field.
    pub no_filename: bool,
    /// Default explicit fill size, if the key definition pins one.
    pub fill_size: Option<u64>,
    /// Whether consumed key bytes should be zeroed after use by default.
    pub erase_after_use: bool,
}

/// A parsed key map: an ordered list of key definitions, loaded once and
/// never mutated.
#[derive(Debug, Clone)]
pub struct KeyMap {
    definitions: Vec<KeyDefinition>,
}

impl KeyMap {
    /// Parse a key-map file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<KeyMap, Error> {
        let text = fs::read_to_string(path).map_err(KeyStoreError::CantReadKeyMapFile)?;
        Self::parse(&text)
    }

    /// Parse key-map text directly (used by `load` and by tests).
    pub fn parse(text: &str) -> Result<KeyMap, Error> {
        let mut definitions = Vec::new();
        let mut block: Vec<(&str, &str)> = Vec::new();

        let flush = |block: &mut Vec<(&str, &str)>,
                     definitions: &mut Vec<KeyDefinition>|
         -> Result<(), Error> {
            if block.is_empty() {
                return Ok(());
            }
            definitions.push(definition_from_block(block)?);
            block.clear();
            Ok(())
        };

        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.eq_ignore_ascii_case("end") {
                flush(&mut block, &mut definitions)?;
                continue;
            }
            if line.starts_with('#') {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .ok_or(KeyStoreError::MissingKeyIdInKeyDefString)?;
            block.push((key.trim(), value.trim()));
        }
        flush(&mut block, &mut definitions)?;

        Ok(KeyMap { definitions })
    }

    /// All key definitions, in the order they appear in the file.
    pub fn definitions(&self) -> &[KeyDefinition] {
        &self.definitions
    }

    /// Look up the definition with the given `KeyID`, if any.
    pub fn find(&self, key_id: u64) -> Option<&KeyDefinition> {
        self.definitions.iter().find(|d| d.key_id == key_id)
    }
}

fn definition_from_block(block: &[(&str, &str)]) -> Result<KeyDefinition, Error> {
    let mut key_id = None;
    let mut key_file = None;
    let mut password = String::new();
    let mut no_filename = false;
    let mut fill_size = None;
    let mut erase_after_use = false;

    for (key, value) in block {
        match key.to_ascii_lowercase().as_str() {
            "keyid" => {
                key_id = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| KeyStoreError::MissingKeyIdInKeyDefString)?,
                )
            }
            "keyfile" => key_file = Some(PathBuf::from(value)),
            "password" => password = value.to_string(),
            "nofilename" => no_filename = parse_bool(value),
            "fillsize" => fill_size = value.parse::<u64>().ok(),
            "eraseafteruse" => erase_after_use = parse_bool(value),
            _ => {}
        }
    }

    Ok(KeyDefinition {
        key_id: key_id.ok_or(KeyStoreError::MissingKeyIdInKeyDefString)?,
        key_file: key_file.ok_or(KeyStoreError::InvalidKeyFileName)?,
        password,
        no_filename,
        fill_size,
        erase_after_use,
    })
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "yes" | "1")
}
