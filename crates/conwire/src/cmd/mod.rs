use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::exit::CliResult;

pub mod decode;
pub mod strings;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a console capture, reconstructing packet text.
    Decode(DecodeArgs),
    /// Inspect a compiled string table blob.
    Strings(StringsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args),
        Command::Strings(args) => strings::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file to decode. Omit or pass "-" to read stdin.
    pub input: Option<PathBuf>,
    /// String table blob for extended-layout packets. Without this, packets
    /// are decoded as the base layout.
    #[arg(long, value_name = "FILE")]
    pub strings: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct StringsArgs {
    /// String table blob to inspect.
    pub path: PathBuf,
    /// Print only the entry at this index.
    #[arg(long)]
    pub index: Option<u32>,
}

#[derive(Args, Debug, Default)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
