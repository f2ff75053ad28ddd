use conwire_decode::StringTable;

use crate::cmd::StringsArgs;
use crate::exit::{decode_error, CliError, CliResult, SUCCESS, USAGE};

pub fn run(args: StringsArgs) -> CliResult<i32> {
    let table =
        StringTable::from_file(&args.path).map_err(|err| decode_error("string table", err))?;

    match args.index {
        Some(index) => match table.get(index) {
            Some(entry) => println!("{entry}"),
            None => {
                return Err(CliError::new(
                    USAGE,
                    format!("index {index} out of range (table holds {})", table.len()),
                ))
            }
        },
        None => {
            for (index, entry) in table.iter().enumerate() {
                println!("{index}: {}", entry.escape_debug());
            }
        }
    }

    Ok(SUCCESS)
}
