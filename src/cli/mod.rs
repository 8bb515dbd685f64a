//! # CLI Module
//!
//! Command-line interface for the ZIP image deduplicator.
//!
//! ## Usage
//! ```bash
//! # Deduplicate into out/unique_images.zip
//! zip-dedup dedup photos.zip out/
//!
//! # With custom threshold
//! zip-dedup dedup photos.zip out/ --threshold 8
//!
//! # Decide only, as JSON
//! zip-dedup dedup photos.zip out/ --dry-run --output json
//!
//! # Show fingerprints
//! zip-dedup hash photos.zip
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::thread;
use zip_photo_dedup::core::config::{
    DEFAULT_HASH_DIFF_THRESHOLD, DEFAULT_HASH_SIZE, DEFAULT_MAX_IMAGE_SIZE, DEFAULT_MAX_ZIP_SIZE,
};
use zip_photo_dedup::core::pipeline::{DedupReport, EntryOutcome, Pipeline, DEFAULT_OUTPUT_NAME};
use zip_photo_dedup::core::NonImagePolicy;
use zip_photo_dedup::error::{exit_codes, DedupError, Result};
use zip_photo_dedup::events::{EntryEvent, Event, EventChannel, PipelineEvent};
use zip_photo_dedup::init_tracing;

/// ZIP Photo Dedup - drop near-duplicate images from an archive
#[derive(Parser, Debug)]
#[command(name = "zip-dedup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a copy of the archive without near-duplicate images
    Dedup {
        /// Archive to read
        input: PathBuf,

        /// Directory for the output archive (created if missing)
        output_dir: PathBuf,

        /// File name of the output archive
        #[arg(long, default_value = DEFAULT_OUTPUT_NAME)]
        output_name: String,

        /// Largest accepted archive, in bytes
        #[arg(long, default_value_t = DEFAULT_MAX_ZIP_SIZE)]
        max_zip_size: u64,

        /// Largest accepted image, in bytes (uncompressed)
        #[arg(long, default_value_t = DEFAULT_MAX_IMAGE_SIZE)]
        max_image_size: u64,

        /// Fingerprint grid side; fingerprints have hash_size² bits
        #[arg(long, default_value_t = DEFAULT_HASH_SIZE)]
        hash_size: u32,

        /// Largest Hamming distance treated as a duplicate
        #[arg(short, long, default_value_t = DEFAULT_HASH_DIFF_THRESHOLD)]
        threshold: u32,

        /// Comma-separated image extensions to fingerprint
        #[arg(long, value_delimiter = ',')]
        extensions: Option<Vec<String>>,

        /// What to do with entries that are not images
        #[arg(long, default_value = "skip")]
        non_images: NonImages,

        /// Skip entries under dot-directories or with dot-names
        #[arg(long)]
        skip_hidden: bool,

        /// Compare against every kept image instead of using the band index
        #[arg(long)]
        no_bucketing: bool,

        /// Report decisions without writing an archive
        #[arg(long)]
        dry_run: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the fingerprint of every image in the archive
    Hash {
        /// Archive to read
        input: PathBuf,

        /// Fingerprint grid side
        #[arg(long, default_value_t = DEFAULT_HASH_SIZE)]
        hash_size: u32,

        /// Largest accepted archive, in bytes
        #[arg(long, default_value_t = DEFAULT_MAX_ZIP_SIZE)]
        max_zip_size: u64,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum NonImages {
    /// Leave non-image entries out of the output
    Skip,
    /// Copy non-image entries unchanged
    Keep,
}

impl From<NonImages> for NonImagePolicy {
    fn from(value: NonImages) -> Self {
        match value {
            NonImages::Skip => NonImagePolicy::Skip,
            NonImages::Keep => NonImagePolicy::PassThrough,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (dropped paths only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() {
                exit_codes::USAGE_ERROR as i32
            } else {
                0
            });
        }
    };

    match cli.command {
        Commands::Dedup {
            input,
            output_dir,
            output_name,
            max_zip_size,
            max_image_size,
            hash_size,
            threshold,
            extensions,
            non_images,
            skip_hidden,
            no_bucketing,
            dry_run,
            output,
            verbose,
        } => {
            init_tracing(verbose);

            let mut builder = Pipeline::builder()
                .input(input)
                .output_dir(output_dir)
                .output_name(output_name)
                .max_zip_size(max_zip_size)
                .max_image_size(max_image_size)
                .hash_size(hash_size)
                .threshold(threshold)
                .non_image_policy(non_images.into())
                .include_hidden(!skip_hidden)
                .bucketing(!no_bucketing)
                .dry_run(dry_run);
            if let Some(extensions) = extensions {
                builder = builder.extensions(extensions);
            }

            run_dedup(builder.build()?, output, verbose)
        }
        Commands::Hash {
            input,
            hash_size,
            max_zip_size,
            verbose,
        } => {
            init_tracing(verbose);

            let pipeline = Pipeline::builder()
                .input(input)
                .hash_size(hash_size)
                .threshold(0)
                .max_zip_size(max_zip_size)
                .dry_run(true)
                .build()?;
            run_hash(&pipeline)
        }
    }
}

fn run_dedup(pipeline: Pipeline, output: OutputFormat, verbose: bool) -> Result<()> {
    let term = Term::stderr();

    // Print header
    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("ZIP Photo Dedup").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    // Set up event handling
    let (sender, receiver) = EventChannel::new();

    // Progress bar for pretty output
    let progress = if matches!(output, OutputFormat::Pretty) && term.is_term() {
        let pb = ProgressBar::new(0);
        if let Ok(bar_style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(bar_style.progress_chars("█▓░"));
        }
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress_clone else {
                continue;
            };
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_message(format!("{}", phase));
                }
                Event::Entry(EntryEvent::Started { total_entries }) => {
                    pb.set_length(total_entries as u64);
                }
                Event::Entry(EntryEvent::Progress(p)) => {
                    pb.set_position(p.processed as u64);
                    if verbose {
                        pb.set_message(p.current_path);
                    }
                }
                Event::Pipeline(PipelineEvent::Completed { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    // Run the pipeline
    let result = pipeline.run_with_events(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let report = result?;

    // Output results
    match output {
        OutputFormat::Pretty => print_pretty_results(&term, &report, verbose),
        OutputFormat::Json => print_json_results(&report)?,
        OutputFormat::Minimal => print_minimal_results(&report),
    }

    Ok(())
}

fn print_pretty_results(term: &Term, report: &DedupReport, verbose: bool) {
    let summary = report.summary();

    term.write_line(&format!("{} Deduplication Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    // Summary
    term.write_line(&format!(
        "  {} entries read in {:.1}s",
        style(summary.total_entries).cyan(),
        summary.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!("  {} unique images kept", style(summary.kept).cyan()))
        .ok();
    term.write_line(&format!(
        "  {} near-duplicates dropped",
        style(summary.dropped).cyan()
    ))
    .ok();
    if summary.skipped > 0 {
        term.write_line(&format!(
            "  {} entries skipped",
            style(summary.skipped).yellow()
        ))
        .ok();
    }

    term.write_line("").ok();

    // Show groups
    if report.groups.is_empty() {
        term.write_line(&format!("  {} No duplicates found!", style("🎉").green()))
            .ok();
    } else {
        term.write_line(&format!("{}", style("Duplicate Groups:").bold().underlined()))
            .ok();
        term.write_line("").ok();

        for (i, group) in report.groups.iter().enumerate() {
            term.write_line(&format!(
                "  {} {} ({} images)",
                style(format!("Group {}:", i + 1)).bold(),
                style(&group.fingerprint).dim(),
                group.duplicate_count() + 1
            ))
            .ok();
            term.write_line(&format!("    {} {}", style("★").green(), group.representative))
                .ok();
            for member in &group.duplicates {
                term.write_line(&format!(
                    "    {} {} {}",
                    style("○").dim(),
                    member.path,
                    style(format!(
                        "({}, distance {}, {:.0}%)",
                        member.match_type, member.distance, member.similarity_percent
                    ))
                    .dim()
                ))
                .ok();
            }
            term.write_line("").ok();
        }
    }

    if verbose {
        for (path, reason) in report.skipped() {
            term.write_line(&format!("  {} {}: {}", style("skipped").yellow(), path, reason))
                .ok();
        }
    }

    // Footer
    let footer = match &report.output {
        Some(path) => format!(
            "Wrote {} entries to {}",
            style(report.retained_paths().count()).cyan(),
            style(path.display()).bold()
        ),
        None => format!("{}", style("Dry run: no archive was written.").dim()),
    };
    term.write_line(&footer).ok();
}

fn print_json_results(report: &DedupReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| DedupError::Config(format!("could not serialize report: {e}")))?;
    println!("{json}");
    Ok(())
}

fn print_minimal_results(report: &DedupReport) {
    for outcome in report.dropped() {
        if let EntryOutcome::Dropped { path, .. } = outcome {
            println!("{}", path);
        }
    }
}

fn run_hash(pipeline: &Pipeline) -> Result<()> {
    for (path, fingerprint) in pipeline.fingerprints()? {
        match fingerprint {
            Ok(fingerprint) => println!("{}  {}", fingerprint, path),
            Err(reason) if reason.is_warning() => {
                eprintln!("{}  {}", style("skipped").yellow(), reason)
            }
            Err(_) => {}
        }
    }
    Ok(())
}
