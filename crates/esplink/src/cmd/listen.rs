use std::fs::{File, OpenOptions};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use esplink_bus::{Gateway, PacketHistory};
use esplink_frame::{DecoderConfig, DecoderStats, Packet};

use crate::cmd::ListenArgs;
use crate::exit::{bus_error, io_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_packet, print_packets, OutputFormat};

const READ_CHUNK_SIZE: usize = 256;

/// How often the waiting thread re-checks the Ctrl-C flag.
const INTERRUPT_POLL: Duration = Duration::from_millis(100);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let device = OpenOptions::new()
        .read(true)
        .open(&args.device)
        .map_err(|err| io_error(&format!("open {} failed", args.device.display()), err))?;
    let source = args.device.display().to_string();

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut gateway = Gateway::with_decoder_config(DecoderConfig {
        max_buffered: args.max_buffered,
    });

    let accepted = Arc::new(AtomicUsize::new(0));
    let history = args.recent.map(PacketHistory::new);
    {
        let accepted = Arc::clone(&accepted);
        let history = history.clone();
        let source = source.clone();
        let types = args.types.clone();
        let count = args.count;
        gateway.bus_mut().register_fn(move |packet: &Packet| {
            if let Some(types) = &types {
                if !types.contains(&packet.packet_type()) {
                    return;
                }
            }
            if count.is_some_and(|count| accepted.load(Ordering::SeqCst) >= count) {
                return;
            }
            accepted.fetch_add(1, Ordering::SeqCst);
            match &history {
                Some(history) => history.record(packet.clone()),
                None => print_packet(packet, &source, format),
            }
        });
    }

    tracing::info!(device = %source, "listening");

    // Reads block on an idle line, so they run on their own thread and the
    // interrupt flag is polled here. An abandoned reader dies with the process.
    let (done_tx, done_rx) = mpsc::channel();
    let count = args.count;
    thread::Builder::new()
        .name("esplink-rx".to_string())
        .spawn(move || {
            let _ = done_tx.send(pump_until_done(gateway, device, count, &accepted));
        })
        .map_err(|err| io_error("reader thread spawn failed", err))?;

    let stats = wait_for_reader(&done_rx, &running)?;

    if let Some(history) = &history {
        print_packets(&history.snapshot(), &source, format);
    }

    match stats {
        Some(stats) => tracing::info!(
            packets = stats.packets,
            unexpected_bytes = stats.unexpected_bytes,
            header_errors = stats.header_errors,
            payload_errors = stats.payload_errors,
            overflows = stats.overflows,
            "listen finished"
        ),
        None => tracing::info!("listen interrupted"),
    }

    Ok(SUCCESS)
}

/// Drive the gateway until end of input or until `count` packets passed
/// the filter.
fn pump_until_done(
    mut gateway: Gateway,
    mut device: File,
    count: Option<usize>,
    accepted: &AtomicUsize,
) -> CliResult<DecoderStats> {
    let mut buf = [0u8; READ_CHUNK_SIZE];
    loop {
        let read = gateway
            .pump(&mut device, &mut buf)
            .map_err(|err| bus_error("read failed", err))?;
        if read.is_none() {
            tracing::debug!("end of input");
            break;
        }
        if count.is_some_and(|count| accepted.load(Ordering::SeqCst) >= count) {
            break;
        }
    }
    Ok(gateway.stats())
}

/// Returns the reader's stats, or `None` when Ctrl-C arrived first.
fn wait_for_reader(
    done: &mpsc::Receiver<CliResult<DecoderStats>>,
    running: &AtomicBool,
) -> CliResult<Option<DecoderStats>> {
    loop {
        match done.recv_timeout(INTERRUPT_POLL) {
            Ok(result) => return result.map(Some),
            Err(RecvTimeoutError::Timeout) => {
                if !running.load(Ordering::SeqCst) {
                    return Ok(None);
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(CliError::new(INTERNAL, "reader thread exited unexpectedly"));
            }
        }
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
