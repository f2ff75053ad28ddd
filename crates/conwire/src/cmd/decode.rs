use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Arc;

use conwire_decode::{DecodeReader, Decoder, Output, StringTable, StructRegistry};

use crate::cmd::DecodeArgs;
use crate::exit::{decode_error, io_error, CliResult, SUCCESS};

pub fn run(args: DecodeArgs) -> CliResult<i32> {
    let decoder = match &args.strings {
        Some(path) => {
            let table =
                StringTable::from_file(path).map_err(|err| decode_error("string table", err))?;
            tracing::debug!(entries = table.len(), "loaded string table");
            Decoder::extended(Arc::new(table))
        }
        None => Decoder::base(Arc::new(StructRegistry::with_builtins())),
    };

    let input = open_input(args.input.as_deref())?;
    let mut reader = DecodeReader::new(input, decoder);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    loop {
        let item = match reader.next_output() {
            Ok(Some(item)) => item,
            Ok(None) => break,
            Err(err) => return Err(decode_error("decode failed", err)),
        };
        let written = match item {
            Output::Text(text) => write!(out, "{text}"),
            Output::Packet(text) => writeln!(out, "{text}"),
            Output::Notice(text) => writeln!(out, "{text}"),
        };
        written.map_err(|err| io_error("write failed", err))?;
    }
    out.flush().map_err(|err| io_error("write failed", err))?;

    Ok(SUCCESS)
}

fn open_input(path: Option<&Path>) -> CliResult<Box<dyn Read>> {
    match path {
        Some(path) if path.as_os_str() != "-" => {
            let file = File::open(path).map_err(|err| {
                io_error(&format!("open {} failed", path.display()), err)
            })?;
            Ok(Box::new(file))
        }
        _ => Ok(Box::new(io::stdin())),
    }
}
