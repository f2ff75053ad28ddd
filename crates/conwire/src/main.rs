mod cmd;
mod exit;
mod logging;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};

#[derive(Parser, Debug)]
#[command(name = "conwire", version, about = "Embedded console log packet decoder")]
struct Cli {
    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    match cmd::run(cli.command) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decode_subcommand() {
        let cli = Cli::try_parse_from(["conwire", "decode", "/tmp/capture.bin"])
            .expect("decode args should parse");
        assert!(matches!(cli.command, Command::Decode(_)));
    }

    #[test]
    fn parses_decode_with_string_table() {
        let cli = Cli::try_parse_from([
            "conwire",
            "decode",
            "--strings",
            "/tmp/str_blob",
            "/tmp/capture.bin",
        ])
        .expect("decode args should parse");

        match cli.command {
            Command::Decode(args) => assert!(args.strings.is_some()),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_strings_subcommand() {
        let cli = Cli::try_parse_from(["conwire", "strings", "/tmp/str_blob", "--index", "7"])
            .expect("strings args should parse");

        match cli.command {
            Command::Strings(args) => assert_eq!(args.index, Some(7)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_log_level() {
        let err = Cli::try_parse_from(["conwire", "--log-level", "loud", "decode"])
            .expect_err("bad level should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
