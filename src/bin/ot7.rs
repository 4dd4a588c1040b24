//! The `ot7` command-line tool: encrypts and decrypts files using the OT7
//! one-time-pad protocol. Argument parsing and wiring only; all protocol
//! logic lives in the `ot7` library.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::info;

use ot7::errors::ConfigError;
use ot7::{EncodeRequest, Envelope, Error, KeyStore};

/// Encrypt or decrypt a file using the OT7 one-time-pad protocol.
#[derive(Parser, Debug)]
#[command(name = "ot7", about = "OT7 one-time-pad file encryption tool")]
struct Cli {
    /// Encrypt the named plaintext file.
    #[arg(short = 'e', long = "encrypt", value_name = "PATH")]
    encrypt: Option<PathBuf>,

    /// Decrypt the named input file.
    #[arg(short = 'd', long = "decrypt", value_name = "PATH")]
    decrypt: Option<PathBuf>,

    /// Output path for an encrypt operation.
    #[arg(long = "oe", value_name = "PATH")]
    output_encrypted: Option<PathBuf>,

    /// Output path for a decrypt operation.
    #[arg(long = "od", value_name = "PATH")]
    output_decrypted: Option<PathBuf>,

    /// Select which key definition to use.
    #[arg(long = "KeyID", value_name = "N")]
    key_id: Option<u64>,

    /// Explicit fill size in bytes.
    #[arg(short = 'f', long = "fill", value_name = "N")]
    fill_size: Option<u64>,

    /// Omit the filename field when encrypting.
    #[arg(long = "nofilename")]
    no_filename: bool,

    /// Write/read the binary record with no outer envelope.
    #[arg(long = "binary", conflicts_with = "base64")]
    binary: bool,

    /// Write/read the record as RFC 4648 base64 text.
    #[arg(long = "base64", conflicts_with = "binary")]
    base64: bool,

    /// Suppress the user-visible summary line.
    #[arg(long = "silent")]
    silent: bool,

    /// Run the Skein1024 self-test and exit.
    #[arg(long = "testhash")]
    test_hash: bool,

    /// Password for the selected key definition, overriding the key map
    /// default.
    #[arg(long = "password", value_name = "PASSWORD")]
    password: Option<String>,

    /// Path to the key map file.
    #[arg(long = "KeyMap", default_value = "key.map")]
    key_map: PathBuf,

    /// Path to the consumption log file.
    #[arg(long = "Log", default_value = "ot7.log")]
    log: PathBuf,

    /// Overwrite consumed key bytes with zeros after use.
    #[arg(long = "erase")]
    erase_after_use: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ot7: {}", err);
            ExitCode::from(err.result_code())
        }
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    if cli.test_hash {
        return run_self_test();
    }

    let envelope = if cli.base64 {
        Envelope::Base64
    } else {
        Envelope::Binary
    };

    if let Some(input) = &cli.encrypt {
        let key_id = cli.key_id.ok_or(ConfigError::MissingCommandLineParameter)?;
        let output = cli
            .output_encrypted
            .clone()
            .ok_or(ConfigError::MissingCommandLineParameter)?;

        let mut store = KeyStore::load(&cli.key_map, &cli.log)?;
        let password = resolve_password(&cli, key_id, &store)?;
        let request = EncodeRequest {
            key_id,
            password,
            file_name: if cli.no_filename {
                None
            } else {
                Some(file_name_of(input)?)
            },
            fill_size: cli.fill_size,
            erase_after_use: cli.erase_after_use,
        };

        info!("encrypting {} -> {}", input.display(), output.display());
        ot7::encode_file(input, &output, &request, &mut store, envelope)?;
        if !cli.silent {
            println!("wrote {}", output.display());
        }
        return Ok(());
    }

    if let Some(input) = &cli.decrypt {
        let output = cli
            .output_decrypted
            .clone()
            .ok_or(ConfigError::MissingCommandLineParameter)?;

        let mut store = KeyStore::load(&cli.key_map, &cli.log)?;
        info!("decrypting {} -> {}", input.display(), output.display());
        let outcome = ot7::decode_file(input, &output, envelope, &mut store, true, cli.erase_after_use)?;
        if let Some(checksum_error) = outcome.checksum_error {
            if !cli.silent {
                println!("wrote {} (checksum mismatch: {})", output.display(), checksum_error);
            }
            return Err(checksum_error);
        }
        if !cli.silent {
            println!("wrote {}", output.display());
        }
        return Ok(());
    }

    Err(ConfigError::NoCommandLineParametersGiven.into())
}

fn resolve_password(cli: &Cli, key_id: u64, store: &KeyStore) -> Result<String, Error> {
    if let Some(password) = &cli.password {
        return Ok(password.clone());
    }
    Ok(store.definition(key_id)?.password.clone())
}

fn file_name_of(path: &std::path::Path) -> Result<String, Error> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.to_string())
        .ok_or_else(|| ConfigError::InvalidNameOfPlaintextFile.into())
}

fn run_self_test() -> Result<(), Error> {
    match ot7::skein::self_test() {
        Ok(()) => {
            println!("Skein1024 self-test passed");
            Ok(())
        }
        Err(reason) => Err(ot7::errors::SkeinError::SkeinTestFinalResultIsInvalid(reason).into()),
    }
}
