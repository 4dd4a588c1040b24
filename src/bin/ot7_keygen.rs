//! Demo key-file generator, backed by the OS CSPRNG.
//!
//! True-random key material should come from a hardware RNG in real use;
//! this tool exists only so the `ot7` binary has something to try against.
//! Not part of the protocol surface.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use rand::rngs::OsRng;
use rand::RngCore;

/// Generate a sample OT7 key file filled with OS-random bytes.
#[derive(Parser, Debug)]
#[command(name = "ot7-keygen")]
struct Cli {
    /// Where to write the generated key file.
    output: PathBuf,

    /// Number of bytes of key material to generate.
    #[arg(short = 'n', long = "bytes", default_value_t = 1_048_576)]
    bytes: u64,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("ot7-keygen: {}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> std::io::Result<()> {
    let mut file = File::create(&cli.output)?;
    let mut remaining = cli.bytes;
    let mut buf = [0u8; 65536];
    let mut rng = OsRng;
    while remaining > 0 {
        let chunk = remaining.min(buf.len() as u64) as usize;
        rng.fill_bytes(&mut buf[..chunk]);
        file.write_all(&buf[..chunk])?;
        remaining -= chunk as u64;
    }
    println!("wrote {} bytes of key material to {}", cli.bytes, cli.output.display());
    Ok(())
}
