use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use esplink_frame::{DecoderConfig, FrameError, PacketReader};

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let (source, input) = open_input(args.file.as_deref())?;

    let mut reader = PacketReader::with_config(
        input,
        DecoderConfig {
            max_buffered: args.max_buffered,
        },
    );
    reader.set_read_chunk_size(args.chunk_size as usize);

    loop {
        match reader.read_packet() {
            Ok(packet) => print_packet(&packet, &source, format),
            Err(FrameError::ConnectionClosed) => break,
            Err(err) => return Err(frame_error(&format!("read {source} failed"), err)),
        }
    }

    if !reader.buffered().is_empty() {
        tracing::warn!(
            bytes = reader.buffered().len(),
            "input ended inside a frame"
        );
    }
    let stats = reader.stats();
    tracing::info!(
        packets = stats.packets,
        unexpected_bytes = stats.unexpected_bytes,
        header_errors = stats.header_errors,
        payload_errors = stats.payload_errors,
        overflows = stats.overflows,
        "decode finished"
    );

    Ok(SUCCESS)
}

fn open_input(path: Option<&Path>) -> CliResult<(String, Box<dyn Read>)> {
    match path {
        None => Ok(("stdin".to_string(), Box::new(io::stdin()))),
        Some(path) if path == Path::new("-") => Ok(("stdin".to_string(), Box::new(io::stdin()))),
        Some(path) => {
            let file = File::open(path)
                .map_err(|err| io_error(&format!("open {} failed", path.display()), err))?;
            Ok((path.display().to_string(), Box::new(file)))
        }
    }
}
