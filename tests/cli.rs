//! CLI integration tests for zip-dedup.
//!
//! These run the actual binary and check stdout, exit codes and the
//! archive left in the output directory.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use predicates::prelude::*;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Get a Command for the zip-dedup binary.
fn zip_dedup() -> Command {
    Command::cargo_bin("zip-dedup").unwrap()
}

fn png(vertical: bool) -> Vec<u8> {
    let image = ImageBuffer::from_fn(32, 32, |x, y| {
        let c = if vertical { x } else { y };
        if c < 16 {
            Rgb([255u8, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// a.png and b.png are identical, c.png differs
fn photos_zip(temp: &TempDir) -> assert_fs::fixture::ChildPath {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in [("a.png", png(true)), ("b.png", png(true)), ("c.png", png(false))] {
        writer.start_file(name, SimpleFileOptions::default()).unwrap();
        writer.write_all(&bytes).unwrap();
    }
    let bytes = writer.finish().unwrap().into_inner();

    let input = temp.child("photos.zip");
    input.write_binary(&bytes).unwrap();
    input
}

// ============================================================================
// Help and Usage
// ============================================================================

#[test]
fn help_lists_subcommands() {
    zip_dedup()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("dedup"))
        .stdout(predicate::str::contains("hash"));
}

#[test]
fn dedup_help_shows_options() {
    zip_dedup()
        .args(["dedup", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--threshold"))
        .stdout(predicate::str::contains("--max-zip-size"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn missing_arguments_exit_with_usage_error() {
    zip_dedup().arg("dedup").assert().code(64);
}

#[test]
fn invalid_threshold_exits_with_usage_error() {
    let temp = TempDir::new().unwrap();
    let input = photos_zip(&temp);

    zip_dedup()
        .arg("dedup")
        .arg(input.path())
        .arg(temp.child("out").path())
        .args(["--hash-size", "2", "--threshold", "5"])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("Configuration error"));
}

// ============================================================================
// Dedup
// ============================================================================

#[test]
fn dedup_writes_unique_images() {
    let temp = TempDir::new().unwrap();
    let input = photos_zip(&temp);
    let out = temp.child("out");

    zip_dedup()
        .arg("dedup")
        .arg(input.path())
        .arg(out.path())
        .args(["--output", "minimal"])
        .assert()
        .success()
        .stdout(predicate::eq("b.png\n"));

    out.child("unique_images.zip")
        .assert(predicate::path::is_file());
}

#[test]
fn dedup_json_reports_outcomes() {
    let temp = TempDir::new().unwrap();
    let input = photos_zip(&temp);

    let output = zip_dedup()
        .arg("dedup")
        .arg(input.path())
        .arg(temp.child("out").path())
        .args(["--output", "json", "--dry-run"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["output"], serde_json::Value::Null);
    assert_eq!(report["outcomes"][0]["outcome"], "kept");
    assert_eq!(report["outcomes"][1]["outcome"], "dropped");
    assert_eq!(report["outcomes"][1]["duplicate_of"], "a.png");
    assert_eq!(report["groups"][0]["representative"], "a.png");

    temp.child("out").assert(predicate::path::missing());
}

#[test]
fn custom_output_name_is_used() {
    let temp = TempDir::new().unwrap();
    let input = photos_zip(&temp);
    let out = temp.child("out");

    zip_dedup()
        .arg("dedup")
        .arg(input.path())
        .arg(out.path())
        .args(["--output-name", "cleaned.zip", "--output", "minimal"])
        .assert()
        .success();

    out.child("cleaned.zip").assert(predicate::path::is_file());
    out.child("unique_images.zip")
        .assert(predicate::path::missing());
}

#[test]
fn oversized_archive_exits_with_data_error() {
    let temp = TempDir::new().unwrap();
    let input = photos_zip(&temp);
    let out = temp.child("out");

    zip_dedup()
        .arg("dedup")
        .arg(input.path())
        .arg(out.path())
        .args(["--max-zip-size", "100"])
        .assert()
        .code(65)
        .stderr(predicate::str::contains("ZIP file too large"))
        .stderr(predicate::str::contains("Maximum allowed: 100 bytes"));

    out.child("unique_images.zip")
        .assert(predicate::path::missing());
}

#[test]
fn missing_input_exits_with_no_input() {
    let temp = TempDir::new().unwrap();

    zip_dedup()
        .arg("dedup")
        .arg(temp.child("missing.zip").path())
        .arg(temp.child("out").path())
        .assert()
        .code(66)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn corrupt_input_exits_with_data_error() {
    let temp = TempDir::new().unwrap();
    let input = temp.child("photos.zip");
    input.write_str("this is not a zip archive").unwrap();

    zip_dedup()
        .arg("dedup")
        .arg(input.path())
        .arg(temp.child("out").path())
        .assert()
        .code(65);
}

#[test]
fn corrupted_entry_exits_with_data_error() {
    let temp = TempDir::new().unwrap();
    let image = png(true);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    writer.start_file("a.png", options).unwrap();
    writer.write_all(&image).unwrap();
    let mut bytes = writer.finish().unwrap().into_inner();

    let start = bytes
        .windows(image.len())
        .position(|window| window == image.as_slice())
        .unwrap();
    bytes[start + image.len() / 2] ^= 0xFF;

    let input = temp.child("photos.zip");
    input.write_binary(&bytes).unwrap();
    let out = temp.child("out");

    zip_dedup()
        .arg("dedup")
        .arg(input.path())
        .arg(out.path())
        .assert()
        .code(65)
        .stderr(predicate::str::contains("corrupted at entry a.png"));

    out.child("unique_images.zip")
        .assert(predicate::path::missing());
}

// ============================================================================
// Hash
// ============================================================================

#[test]
fn hash_prints_fingerprints_in_archive_order() {
    let temp = TempDir::new().unwrap();
    let input = photos_zip(&temp);

    zip_dedup()
        .arg("hash")
        .arg(input.path())
        .assert()
        .success()
        .stdout(predicate::eq(
            "f0f0f0f0f0f0f0f0  a.png\n\
             f0f0f0f0f0f0f0f0  b.png\n\
             ffffffff00000000  c.png\n",
        ));
}
