use esplink_frame::Packet;

use crate::cmd::EncodeArgs;
use crate::exit::{frame_error, text_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let packet = Packet::from_text(&args.packet).map_err(|err| text_error("bad packet", err))?;
    let frame = packet
        .to_bytes()
        .map_err(|err| frame_error("encode failed", err))?;

    print_frame(&packet, &frame, format);
    Ok(SUCCESS)
}
