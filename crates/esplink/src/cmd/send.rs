use std::fs::OpenOptions;

use esplink_bus::PacketBus;
use esplink_frame::Packet;

use crate::cmd::SendArgs;
use crate::exit::{bus_error, io_error, text_error, CliResult, SUCCESS};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let packet = Packet::from_text(&args.packet).map_err(|err| text_error("bad packet", err))?;

    // The device must already exist; a mistyped path is an error.
    let device = OpenOptions::new()
        .write(true)
        .open(&args.device)
        .map_err(|err| io_error(&format!("open {} failed", args.device.display()), err))?;

    let mut bus = PacketBus::new();
    bus.attach(device);
    bus.send(&packet)
        .map_err(|err| bus_error("send failed", err))?;

    let target = args.device.display().to_string();
    tracing::info!(device = %target, %packet, "sent");
    print_packet(&packet, &target, format);

    Ok(SUCCESS)
}
