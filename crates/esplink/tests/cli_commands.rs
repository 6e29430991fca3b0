#![cfg(all(unix, feature = "cli"))]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

use esplink::frame::Packet;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "esplink-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn esplink(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_esplink"))
        .args(["--log-level", "error"])
        .args(args)
        .output()
        .expect("esplink should run")
}

fn capture(packets: &[Packet]) -> Vec<u8> {
    let mut wire = vec![0x00, 0x13];
    for packet in packets {
        wire.extend_from_slice(&packet.to_bytes().expect("packet should encode"));
    }
    wire
}

fn sample_packets() -> Vec<Packet> {
    vec![
        Packet::new(0x01, vec![0xF6, 0x30], vec![0xFF]),
        Packet::new(0x05, vec![0x08], Vec::<u8>::new()),
    ]
}

#[test]
fn encode_prints_frame_hex() {
    let output = esplink(&["--format", "text", "encode", "05.08."]);

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "5500010005700838\n");
}

#[test]
fn encode_rejects_malformed_text_with_data_invalid() {
    let output = esplink(&["encode", "05.0"]);

    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("bad packet"));
}

#[test]
fn decode_file_prints_packets_in_order() {
    let dir = unique_temp_dir("decode");
    let path = dir.join("capture.bin");
    std::fs::write(&path, capture(&sample_packets())).expect("capture should be writable");

    let output = esplink(&[
        "--format",
        "text",
        "decode",
        path.to_str().expect("utf-8 path"),
        "--chunk-size",
        "3",
    ]);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "01.f630.ff\n05.08.\n"
    );
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decode_stdin_json() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_esplink"))
        .args(["--log-level", "error", "--format", "json", "decode"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("decode should start");

    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(&capture(&sample_packets()))
        .expect("stdin should accept capture");
    let output = child.wait_with_output().expect("decode should finish");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be json"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["text"], "01.f630.ff");
    assert_eq!(lines[0]["source"], "stdin");
    assert_eq!(lines[1]["packet_type"], 5);
}

#[test]
fn send_writes_frame_to_device() {
    let dir = unique_temp_dir("send");
    let path = dir.join("device");
    std::fs::File::create(&path).expect("device file should be creatable");

    let output = esplink(&[
        "--format",
        "text",
        "send",
        path.to_str().expect("utf-8 path"),
        "01.f630.ff",
    ]);

    assert!(output.status.success());
    let written = std::fs::read(&path).expect("device file should exist");
    let expected = sample_packets()[0].to_bytes().expect("packet should encode");
    assert_eq!(written, expected.to_vec());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn send_to_missing_device_fails_without_creating_it() {
    let dir = unique_temp_dir("send-missing");
    let path = dir.join("ttyUSB0");

    let output = esplink(&[
        "--format",
        "text",
        "send",
        path.to_str().expect("utf-8 path"),
        "05.08.",
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(!path.exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn listen_until_end_of_input() {
    let dir = unique_temp_dir("listen");
    let path = dir.join("device");
    std::fs::write(&path, capture(&sample_packets())).expect("capture should be writable");
    let device = path.to_str().expect("utf-8 path");

    let all = esplink(&["--format", "text", "listen", device]);
    assert!(all.status.success());
    assert_eq!(String::from_utf8_lossy(&all.stdout), "01.f630.ff\n05.08.\n");

    let filtered = esplink(&["--format", "text", "listen", device, "--types", "0x05"]);
    assert_eq!(String::from_utf8_lossy(&filtered.stdout), "05.08.\n");

    let counted = esplink(&["--format", "text", "listen", device, "--count", "1"]);
    assert_eq!(String::from_utf8_lossy(&counted.stdout), "01.f630.ff\n");

    let recent = esplink(&["--format", "text", "listen", device, "--recent", "10"]);
    assert_eq!(String::from_utf8_lossy(&recent.stdout), "05.08.\n01.f630.ff\n");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn listen_missing_device_fails() {
    let output = esplink(&["listen", "/nonexistent/esplink-device"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn version_extended_lists_decoder_defaults() {
    let output = esplink(&["version", "--extended"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sync_byte: 0x55"));
    assert!(stdout.contains("default_max_buffered: 100"));
    assert!(stdout.contains("default_history: 10"));
}

#[test]
fn listen_exits_on_sigint_while_line_is_idle() {
    let dir = unique_temp_dir("listen-sigint");
    let fifo = dir.join("device");
    let status = Command::new("mkfifo")
        .arg(&fifo)
        .status()
        .expect("mkfifo should run");
    assert!(status.success());

    let mut child = Command::new(env!("CARGO_BIN_EXE_esplink"))
        .args(["--log-level", "error", "--format", "text", "listen"])
        .arg(&fifo)
        .args(["--recent", "10"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("listen should start");

    // Opening the write end waits for the listener; keep it open so the
    // listener sits in a blocking read.
    let mut writer = std::fs::OpenOptions::new()
        .write(true)
        .open(&fifo)
        .expect("fifo should open for writing");
    writer
        .write_all(&sample_packets()[1].to_bytes().expect("packet should encode"))
        .expect("fifo should accept a frame");
    std::thread::sleep(Duration::from_millis(500));

    let status = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .expect("kill should run");
    assert!(status.success());

    let deadline = Instant::now() + Duration::from_secs(5);
    while child.try_wait().expect("child should be pollable").is_none() {
        if Instant::now() > deadline {
            let _ = child.kill();
            panic!("listen still running 5s after SIGINT");
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    let output = child.wait_with_output().expect("listen output should be readable");
    drop(writer);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "05.08.\n");
    let _ = std::fs::remove_dir_all(&dir);
}
