use esplink_bus::DEFAULT_HISTORY;
use esplink_frame::{DEFAULT_MAX_BUFFERED, MAX_DATA_LEN, MAX_OPTIONAL_LEN, SYNC_BYTE};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    let version = env!("CARGO_PKG_VERSION");
    if !args.extended {
        println!("esplink {version}");
        return Ok(SUCCESS);
    }

    let rows = [
        ("version", version.to_string()),
        (
            "target",
            option_env!("ESPLINK_BUILD_TARGET")
                .unwrap_or("unknown")
                .to_string(),
        ),
        ("async_codec", cfg!(feature = "async").to_string()),
        ("sync_byte", format!("0x{SYNC_BYTE:02X}")),
        ("max_data_len", MAX_DATA_LEN.to_string()),
        ("max_optional_len", MAX_OPTIONAL_LEN.to_string()),
        ("default_max_buffered", DEFAULT_MAX_BUFFERED.to_string()),
        ("default_history", DEFAULT_HISTORY.to_string()),
    ];
    for (key, value) in rows {
        println!("{key}: {value}");
    }

    Ok(SUCCESS)
}
