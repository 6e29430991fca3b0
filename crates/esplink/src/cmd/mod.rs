use clap::{Args, Subcommand};
use std::path::PathBuf;

use esplink_frame::DEFAULT_MAX_BUFFERED;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read a device and print decoded packets.
    Listen(ListenArgs),
    /// Decode a capture file (or stdin) and print its packets.
    Decode(DecodeArgs),
    /// Print the wire frame for a packet given in text form.
    Encode(EncodeArgs),
    /// Write a packet given in text form to a device.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Device path to read. Line settings must already be configured.
    pub device: PathBuf,
    /// Only print these packet types (comma-separated, decimal or 0x-hex).
    #[arg(long, value_delimiter = ',', value_parser = parse_packet_type)]
    pub types: Option<Vec<u8>>,
    /// Exit after printing N packets.
    #[arg(long)]
    pub count: Option<usize>,
    /// Print nothing live; on exit print the N most recent packets.
    #[arg(long, value_name = "N")]
    pub recent: Option<usize>,
    /// Reassembly buffer watermark in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_BUFFERED)]
    pub max_buffered: usize,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file. Reads stdin when omitted or "-".
    pub file: Option<PathBuf>,
    /// Feed the decoder in chunks of this many bytes.
    #[arg(long, default_value_t = 4096, value_parser = clap::value_parser!(u32).range(1..))]
    pub chunk_size: u32,
    /// Reassembly buffer watermark in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_BUFFERED)]
    pub max_buffered: usize,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Packet in text form: <type>.<data>.<optional_data> (hex).
    pub packet: String,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Device path to write.
    pub device: PathBuf,
    /// Packet in text form: <type>.<data>.<optional_data> (hex).
    pub packet: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn parse_packet_type(input: &str) -> Result<u8, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|err| format!("invalid packet type {input:?}: {err}"))
}
