//! Integration tests for the pipeline module.
//!
//! These tests build real ZIP archives on disk and verify end-to-end
//! behavior including:
//! - Near-duplicate removal and first-seen tie-breaking
//! - Path and byte preservation of kept entries
//! - Archive-level limits and per-entry failures
//! - Non-image and hidden entry policies

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, RgbImage};
use std::fs::{self, File};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};
use zip_photo_dedup::core::pipeline::{DedupReport, EntryOutcome, Pipeline, DEFAULT_OUTPUT_NAME};
use zip_photo_dedup::core::{DedupConfig, MatchType, NonImagePolicy};
use zip_photo_dedup::error::{ArchiveError, EntryError};
use zip_photo_dedup::{dedupe_bytes, DedupError};

/// White square centered on black
fn centered_square() -> RgbImage {
    ImageBuffer::from_fn(64, 64, |x, y| {
        if (16..48).contains(&x) && (16..48).contains(&y) {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    })
}

/// Left half white, right half black
fn left_half() -> RgbImage {
    ImageBuffer::from_fn(64, 64, |x, _| {
        if x < 32 {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    })
}

/// High-entropy image whose PNG encoding is large
fn noise(side: u32) -> RgbImage {
    let mut state = 0x2545_F491_4F6C_DD1Du64;
    ImageBuffer::from_fn(side, side, |_, _| {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let [r, g, b, ..] = state.to_le_bytes();
        Rgb([r, g, b])
    })
}

fn png(image: &RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn jpeg(image: &RgbImage, quality: u8) -> Vec<u8> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode_image(image)
        .unwrap();
    bytes
}

/// Build an archive; names ending in `/` become directory entries
fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, bytes) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(bytes).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

fn write_zip(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, zip_bytes(entries)).unwrap();
    path
}

/// Entry names and contents of an archive on disk, in stored order
fn read_zip(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes).unwrap();
            (file.name().to_string(), bytes)
        })
        .collect()
}

fn run(input: &Path, output_dir: &Path) -> Result<DedupReport, DedupError> {
    Pipeline::builder()
        .input(input)
        .output_dir(output_dir)
        .build()?
        .run()
}

fn names(entries: &[(String, Vec<u8>)]) -> Vec<&str> {
    entries.iter().map(|(name, _)| name.as_str()).collect()
}

#[test]
fn reencoded_copy_is_removed() {
    let temp_dir = TempDir::new().unwrap();
    let square = centered_square();
    let a = png(&square);
    let b = jpeg(&square, 90);
    let c = png(&left_half());

    let input = write_zip(
        temp_dir.path(),
        "photos.zip",
        &[("a.png", &a), ("b.png", &b), ("c.png", &c)],
    );
    let out_dir = temp_dir.path().join("out");

    let report = run(&input, &out_dir).unwrap();

    let output = report.output.clone().unwrap();
    assert_eq!(output, out_dir.join(DEFAULT_OUTPUT_NAME));

    let entries = read_zip(&output);
    assert_eq!(names(&entries), vec!["a.png", "c.png"]);
    assert_eq!(entries[0].1, a);
    assert_eq!(entries[1].1, c);

    match &report.outcomes[1] {
        EntryOutcome::Dropped {
            duplicate_of,
            distance,
            ..
        } => {
            assert_eq!(duplicate_of, "a.png");
            assert!(*distance <= 5);
        }
        other => panic!("expected b.png to be dropped, got {other:?}"),
    }
}

#[test]
fn earliest_entry_wins() {
    let temp_dir = TempDir::new().unwrap();
    let square = centered_square();
    let a = png(&square);
    let b = jpeg(&square, 90);

    let input = write_zip(temp_dir.path(), "photos.zip", &[("b.jpg", &b), ("a.png", &a)]);
    let report = run(&input, &temp_dir.path().join("out")).unwrap();

    assert_eq!(report.kept().collect::<Vec<_>>(), vec!["b.jpg"]);
}

#[test]
fn identical_bytes_are_exact_matches() {
    let bytes = png(&centered_square());
    let archive = zip_bytes(&[("one.png", &bytes), ("two.png", &bytes)]);

    let (_, report) = dedupe_bytes(&DedupConfig::default(), archive).unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].duplicates[0].match_type, MatchType::Exact);
    assert_eq!(report.groups[0].duplicates[0].distance, 0);
}

#[test]
fn nested_paths_are_preserved() {
    let temp_dir = TempDir::new().unwrap();
    let a = png(&centered_square());
    let c = png(&left_half());

    let input = write_zip(
        temp_dir.path(),
        "photos.zip",
        &[
            ("2023/", b""),
            ("2023/summer/beach.png", &a),
            ("2024/beach copy.png", &a),
            ("2024/IMG 0001.PNG", &c),
        ],
    );
    let report = run(&input, &temp_dir.path().join("out")).unwrap();

    let entries = read_zip(report.output.as_ref().unwrap());
    assert_eq!(
        names(&entries),
        vec!["2023/summer/beach.png", "2024/IMG 0001.PNG"]
    );
    // Directory entries are neither reported nor reproduced
    assert_eq!(report.outcomes.len(), 3);
}

#[test]
fn second_pass_changes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let square = centered_square();
    let a = png(&square);
    let b = jpeg(&square, 90);
    let c = png(&left_half());

    let input = write_zip(
        temp_dir.path(),
        "photos.zip",
        &[("a.png", &a), ("b.png", &b), ("c.png", &c)],
    );
    let first = run(&input, &temp_dir.path().join("first")).unwrap();
    let second = run(
        first.output.as_ref().unwrap(),
        &temp_dir.path().join("second"),
    )
    .unwrap();

    assert_eq!(second.dropped().count(), 0);
    assert_eq!(
        read_zip(first.output.as_ref().unwrap()),
        read_zip(second.output.as_ref().unwrap())
    );
}

#[test]
fn empty_archive_produces_empty_output() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_zip(temp_dir.path(), "empty.zip", &[]);

    let report = run(&input, &temp_dir.path().join("out")).unwrap();

    assert!(report.outcomes.is_empty());
    assert!(read_zip(report.output.as_ref().unwrap()).is_empty());
}

#[test]
fn oversized_archive_is_rejected_before_output() {
    let temp_dir = TempDir::new().unwrap();
    let a = png(&centered_square());
    let input = write_zip(temp_dir.path(), "photos.zip", &[("a.png", &a)]);
    let out_dir = temp_dir.path().join("out");

    let result = Pipeline::builder()
        .input(&input)
        .output_dir(&out_dir)
        .max_zip_size(64)
        .build()
        .unwrap()
        .run();

    match result {
        Err(DedupError::Archive(ArchiveError::TooLarge { limit, .. })) => assert_eq!(limit, 64),
        other => panic!("expected TooLarge, got {other:?}"),
    }
    assert!(!out_dir.join(DEFAULT_OUTPUT_NAME).exists());
}

#[test]
fn missing_input_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let result = run(
        &temp_dir.path().join("missing.zip"),
        &temp_dir.path().join("out"),
    );

    assert!(matches!(
        result,
        Err(DedupError::Archive(ArchiveError::NotFound { .. }))
    ));
}

#[test]
fn non_zip_input_is_invalid() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("photos.zip");
    fs::write(&input, b"definitely not a zip file").unwrap();

    let result = run(&input, &temp_dir.path().join("out"));

    assert!(matches!(
        result,
        Err(DedupError::Archive(ArchiveError::Invalid { .. }))
    ));
}

#[test]
fn oversized_image_is_skipped_and_siblings_kept() {
    let temp_dir = TempDir::new().unwrap();
    let big = png(&noise(256));
    let small = png(&centered_square());
    assert!(big.len() > 50_000 && small.len() < 50_000);

    let input = write_zip(
        temp_dir.path(),
        "photos.zip",
        &[("big.png", &big), ("small.png", &small)],
    );
    let report = Pipeline::builder()
        .input(&input)
        .output_dir(temp_dir.path().join("out"))
        .max_image_size(50_000)
        .build()
        .unwrap()
        .run()
        .unwrap();

    let skipped: Vec<_> = report.skipped().collect();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].0, "big.png");
    assert!(matches!(skipped[0].1, EntryError::ImageTooLarge { .. }));
    assert_eq!(
        names(&read_zip(report.output.as_ref().unwrap())),
        vec!["small.png"]
    );
}

#[test]
fn undecodable_image_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let a = png(&centered_square());
    let input = write_zip(
        temp_dir.path(),
        "photos.zip",
        &[("broken.jpg", b"not really a jpeg"), ("a.png", &a)],
    );

    let report = run(&input, &temp_dir.path().join("out")).unwrap();

    assert!(matches!(
        report.outcomes[0],
        EntryOutcome::Skipped {
            reason: EntryError::Decode { .. },
            ..
        }
    ));
    assert_eq!(report.kept().collect::<Vec<_>>(), vec!["a.png"]);
}

#[test]
fn non_images_follow_policy() {
    let a = png(&centered_square());
    let archive = zip_bytes(&[("README.txt", b"holiday photos"), ("a.png", &a)]);

    let (_, skipped) = dedupe_bytes(&DedupConfig::default(), archive.clone()).unwrap();
    assert_eq!(skipped.retained_paths().collect::<Vec<_>>(), vec!["a.png"]);

    let config = DedupConfig {
        non_image_policy: NonImagePolicy::PassThrough,
        ..DedupConfig::default()
    };
    let (bytes, kept) = dedupe_bytes(&config, archive).unwrap();
    assert_eq!(
        kept.retained_paths().collect::<Vec<_>>(),
        vec!["README.txt", "a.png"]
    );

    let mut output = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut text = String::new();
    output
        .by_name("README.txt")
        .unwrap()
        .read_to_string(&mut text)
        .unwrap();
    assert_eq!(text, "holiday photos");
}

#[test]
fn dot_named_images_are_processed_by_default() {
    let a = png(&centered_square());
    let c = png(&left_half());
    let archive = zip_bytes(&[("a.png", &a), (".thumbs/c.png", &c), (".thumbs/.a.png", &a)]);

    let (bytes, report) = dedupe_bytes(&DedupConfig::default(), archive).unwrap();

    assert_eq!(
        report.kept().collect::<Vec<_>>(),
        vec!["a.png", ".thumbs/c.png"]
    );
    assert_eq!(report.dropped().count(), 1);
    assert_eq!(report.skipped().count(), 0);

    let output = ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(output.len(), 2);
}

#[test]
fn macos_metadata_is_always_skipped() {
    let a = png(&centered_square());
    let c = png(&left_half());
    let archive = zip_bytes(&[("__MACOSX/._c.png", &c), ("a.png", &a)]);

    for include_hidden in [true, false] {
        let config = DedupConfig {
            include_hidden,
            ..DedupConfig::default()
        };
        let (_, report) = dedupe_bytes(&config, archive.clone()).unwrap();

        assert_eq!(report.kept().collect::<Vec<_>>(), vec!["a.png"]);
        let skipped: Vec<_> = report.skipped().collect();
        assert_eq!(skipped.len(), 1);
        assert!(matches!(skipped[0].1, EntryError::Hidden { .. }));
    }
}

#[test]
fn dot_named_images_can_be_excluded() {
    let a = png(&centered_square());
    let c = png(&left_half());
    let archive = zip_bytes(&[(".thumbs/c.png", &c), ("a.png", &a)]);

    let config = DedupConfig {
        include_hidden: false,
        ..DedupConfig::default()
    };
    let (_, report) = dedupe_bytes(&config, archive).unwrap();

    assert_eq!(report.kept().collect::<Vec<_>>(), vec!["a.png"]);
    assert!(matches!(
        report.skipped().next(),
        Some((".thumbs/c.png", EntryError::Hidden { .. }))
    ));
}

/// Stored archive with the middle byte of `target`'s data flipped
fn corrupted_zip(entries: &[(&str, &[u8])], target: &str) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, bytes) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(bytes).unwrap();
    }
    let mut archive = writer.finish().unwrap().into_inner();

    let (_, data) = entries.iter().find(|(name, _)| *name == target).unwrap();
    let start = archive
        .windows(data.len())
        .position(|window| window == *data)
        .unwrap();
    archive[start + data.len() / 2] ^= 0xFF;
    archive
}

#[test]
fn corrupted_entry_aborts_without_output() {
    let temp_dir = TempDir::new().unwrap();
    let c = png(&left_half());
    let a = png(&centered_square());
    let input = temp_dir.path().join("photos.zip");
    fs::write(&input, corrupted_zip(&[("c.png", &c), ("a.png", &a)], "a.png")).unwrap();
    let out_dir = temp_dir.path().join("out");

    let result = run(&input, &out_dir);

    match result {
        Err(DedupError::Archive(ArchiveError::Corrupted { entry, .. })) => {
            assert_eq!(entry, "a.png")
        }
        other => panic!("expected a corrupted archive, got {:?}", other),
    }
    assert!(!out_dir.join(DEFAULT_OUTPUT_NAME).exists());
}

#[test]
fn escaping_entry_is_skipped_and_left_out() {
    let temp_dir = TempDir::new().unwrap();
    let a = png(&centered_square());
    let c = png(&left_half());
    let input = write_zip(
        temp_dir.path(),
        "photos.zip",
        &[("../evil.png", &c), ("a.png", &a)],
    );
    let out_dir = temp_dir.path().join("out");

    let report = run(&input, &out_dir).unwrap();

    assert!(report.outcomes.iter().any(|outcome| matches!(
        outcome,
        EntryOutcome::Skipped {
            path,
            reason: EntryError::UnsafePath { .. },
        } if path == "../evil.png"
    )));
    let entries = read_zip(&out_dir.join(DEFAULT_OUTPUT_NAME));
    assert_eq!(names(&entries), vec!["a.png"]);
    assert!(!temp_dir.path().join("evil.png").exists());
}

#[test]
fn dry_run_leaves_output_dir_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let a = png(&centered_square());
    let input = write_zip(temp_dir.path(), "photos.zip", &[("a.png", &a), ("b.png", &a)]);
    let out_dir = temp_dir.path().join("out");

    let report = Pipeline::builder()
        .input(&input)
        .output_dir(&out_dir)
        .dry_run(true)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert!(report.output.is_none());
    assert_eq!(report.dropped().count(), 1);
    assert!(!out_dir.exists());
}

#[test]
fn zero_threshold_drops_only_identical_fingerprints() {
    let square = centered_square();
    let a = png(&square);
    let archive = zip_bytes(&[("a.png", &a), ("copy.png", &a), ("c.png", &png(&left_half()))]);

    let config = DedupConfig {
        hash_diff_threshold: 0,
        ..DedupConfig::default()
    };
    let (_, report) = dedupe_bytes(&config, archive).unwrap();

    assert_eq!(report.kept().collect::<Vec<_>>(), vec!["a.png", "c.png"]);
}
