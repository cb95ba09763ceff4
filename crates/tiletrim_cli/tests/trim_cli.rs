//! Drives the tiletrim binary against archives on disk.

use std::fs;
use std::process::Command;
use tiletrim_format::{tile_id, Header};
use tiletrim_testkit::ArchiveBuilder;

fn fixture_archive() -> Vec<u8> {
    let mut builder = ArchiveBuilder::new().zoom_range(0, 2);
    builder = builder.tile(tile_id(0, 0, 0), b"z0");
    for (x, y) in [(0, 0), (1, 1)] {
        builder = builder.tile(tile_id(1, x, y), format!("z1 {x}/{y}").as_bytes());
    }
    builder = builder.tile(tile_id(2, 2, 2), b"z2");
    builder.build().unwrap()
}

#[test]
fn trims_an_archive_on_disk() {
    let exe = env!("CARGO_BIN_EXE_tiletrim");
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.pmtiles");
    let output = dir.path().join("output.pmtiles");

    fs::write(&input, fixture_archive()).unwrap();

    let result = Command::new(exe)
        .args([
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            "1",
        ])
        .output()
        .expect("trim failed to launch");
    assert!(result.status.success());

    let stdout = String::from_utf8(result.stdout).unwrap();
    assert!(stdout.contains("max zoom 1"));
    assert!(stdout.contains("3 entries"));

    let trimmed = fs::read(&output).unwrap();
    let header = Header::decode(&trimmed).unwrap();
    assert_eq!(header.max_zoom, 1);
    assert_eq!(header.tile_entries, 3);
    assert!(trimmed.len() < fixture_archive().len());
}

#[test]
fn rejects_out_of_range_zoom() {
    let exe = env!("CARGO_BIN_EXE_tiletrim");
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.pmtiles");
    fs::write(&input, fixture_archive()).unwrap();

    let status = Command::new(exe)
        .args([
            input.to_str().unwrap(),
            dir.path().join("out.pmtiles").to_str().unwrap(),
            "40",
        ])
        .status()
        .expect("launch failed");
    assert!(!status.success());
}

#[test]
fn rejects_missing_arguments() {
    let exe = env!("CARGO_BIN_EXE_tiletrim");
    let status = Command::new(exe)
        .args(["only-one-arg"])
        .status()
        .expect("launch failed");
    assert!(!status.success());
}

#[test]
fn fails_on_missing_input_file() {
    let exe = env!("CARGO_BIN_EXE_tiletrim");
    let dir = tempfile::tempdir().unwrap();

    let result = Command::new(exe)
        .args([
            dir.path().join("absent.pmtiles").to_str().unwrap(),
            dir.path().join("out.pmtiles").to_str().unwrap(),
            "3",
        ])
        .output()
        .expect("launch failed");
    assert!(!result.status.success());
    let stderr = String::from_utf8(result.stderr).unwrap();
    assert!(stderr.contains("tiletrim:"));
}

#[test]
fn fails_on_garbage_input() {
    let exe = env!("CARGO_BIN_EXE_tiletrim");
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("garbage.pmtiles");
    fs::write(&input, b"this is not an archive").unwrap();

    let status = Command::new(exe)
        .args([
            input.to_str().unwrap(),
            dir.path().join("out.pmtiles").to_str().unwrap(),
            "3",
        ])
        .status()
        .expect("launch failed");
    assert!(!status.success());
}
