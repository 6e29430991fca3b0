use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use esplink_frame::Packet;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
    Text,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PacketOutput<'a> {
    packet_type: u8,
    data: String,
    optional_data: String,
    text: String,
    wire_size: usize,
    source: &'a str,
    timestamp: String,
}

impl<'a> PacketOutput<'a> {
    fn new(packet: &Packet, source: &'a str) -> Self {
        Self {
            packet_type: packet.packet_type(),
            data: hex::encode(packet.data()),
            optional_data: hex::encode(packet.optional_data()),
            text: packet.to_text(),
            wire_size: packet.wire_size(),
            source,
            timestamp: now_unix_seconds(),
        }
    }
}

#[derive(Serialize)]
struct FrameOutput {
    text: String,
    frame: String,
    wire_size: usize,
}

pub fn print_packet(packet: &Packet, source: &str, format: OutputFormat) {
    match format {
        OutputFormat::Table => print_packets(std::slice::from_ref(packet), source, format),
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&PacketOutput::new(packet, source))
                    .unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Pretty => {
            println!("{source}: {packet} text={}", packet.to_text());
        }
        OutputFormat::Raw => match packet.to_bytes() {
            Ok(bytes) => print_raw(&bytes),
            Err(err) => tracing::warn!(error = %err, "packet not encodable"),
        },
        OutputFormat::Text => println!("{}", packet.to_text()),
    }
}

/// Print several packets; the table format renders them as one table.
pub fn print_packets(packets: &[Packet], source: &str, format: OutputFormat) {
    if !matches!(format, OutputFormat::Table) {
        for packet in packets {
            print_packet(packet, source, format);
        }
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["TYPE", "DATA", "OPTIONAL", "TEXT"]);
    for packet in packets {
        table.add_row(vec![
            format!("0x{:02X}", packet.packet_type()),
            hex::encode(packet.data()),
            hex::encode(packet.optional_data()),
            packet.to_text(),
        ]);
    }
    println!("{table}");
}

/// Print an encoded frame for `packet`.
pub fn print_frame(packet: &Packet, frame: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Raw => print_raw(frame),
        OutputFormat::Json => {
            let out = FrameOutput {
                text: packet.to_text(),
                frame: hex::encode(frame),
                wire_size: frame.len(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Pretty | OutputFormat::Table => {
            let spaced: Vec<String> = frame.iter().map(|b| format!("{b:02x}")).collect();
            println!("{}", spaced.join(" "));
        }
        OutputFormat::Text => println!("{}", hex::encode(frame)),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
