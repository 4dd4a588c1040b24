//! Demo record header inspector: prints the raw 24-byte header fields of
//! an OT7 record without attempting to decrypt it. An investigation tool,
//! not part of the protocol surface.

use std::path::PathBuf;

use clap::Parser;

/// Print the raw header fields of an OT7 record file.
#[derive(Parser, Debug)]
#[command(name = "ot7-dump-header")]
struct Cli {
    /// Path to the record file to inspect.
    path: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("ot7-dump-header: {}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> std::io::Result<()> {
    let data = std::fs::read(&cli.path)?;
    if data.len() < ot7::record::HEADER_BYTES {
        eprintln!(
            "{}: too short to contain a full header ({} bytes)",
            cli.path.display(),
            data.len()
        );
        std::process::exit(1);
    }

    println!("HeaderKey:          {}", hex(&data[0..8]));
    println!("KeyIDHash:          {}", hex(&data[8..16]));
    println!("KeyAddress (masked): {}", hex(&data[16..24]));
    println!("body length:        {} bytes", data.len() - ot7::record::HEADER_BYTES);
    Ok(())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
