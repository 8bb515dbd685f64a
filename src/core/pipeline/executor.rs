//! Pipeline execution implementation.

use super::report::{DedupReport, EntryOutcome};
use crate::core::archive::{
    ArchiveLimits, ArchiveReader, ArchiveWriter, EntryFilter, EntryHeader, OutputArchive,
    ScratchFile, ScratchSpace,
};
use crate::core::comparator::{Decision, DuplicateGroup, FirstSeenGrouper, ThresholdStrategy};
use crate::core::config::{DedupConfig, NonImagePolicy};
use crate::core::hasher::{AverageHasher, Fingerprint};
use crate::error::{DedupError, EntryError};
use crate::events::{
    null_sender, ArchiveEvent, EntryEvent, EntryProgress, Event, EventSender, PipelineEvent,
    PipelinePhase,
};
use std::io::{Cursor, Read, Seek};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

pub use crate::core::archive::DEFAULT_OUTPUT_NAME;

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: DedupConfig,
    input: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    output_name: String,
    dry_run: bool,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: DedupConfig::default(),
            input: None,
            output_dir: None,
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
            dry_run: false,
        }
    }

    /// Archive to deduplicate
    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input = Some(path.into());
        self
    }

    /// Directory receiving the output archive
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// File name of the output archive inside the output directory
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = name.into();
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: DedupConfig) -> Self {
        self.config = config;
        self
    }

    pub fn hash_size(mut self, hash_size: u32) -> Self {
        self.config.hash_size = hash_size;
        self
    }

    /// Set the comparison threshold
    pub fn threshold(mut self, threshold: u32) -> Self {
        self.config.hash_diff_threshold = threshold;
        self
    }

    pub fn max_zip_size(mut self, bytes: u64) -> Self {
        self.config.max_zip_size = bytes;
        self
    }

    pub fn max_image_size(mut self, bytes: u64) -> Self {
        self.config.max_image_size = bytes;
        self
    }

    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config = self.config.with_extensions(extensions);
        self
    }

    pub fn non_image_policy(mut self, policy: NonImagePolicy) -> Self {
        self.config.non_image_policy = policy;
        self
    }

    /// Process dot-named entries (default) or skip them as hidden
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.include_hidden = include;
        self
    }

    pub fn bucketing(mut self, enabled: bool) -> Self {
        self.config.bucketing = enabled;
        self
    }

    /// Decide everything but write nothing
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Validate and build the pipeline
    pub fn build(self) -> Result<Pipeline, DedupError> {
        self.config.validate()?;

        let input = self
            .input
            .ok_or_else(|| DedupError::Config("an input archive is required".to_string()))?;

        let output_dir = match (self.output_dir, self.dry_run) {
            (Some(dir), _) => Some(dir),
            (None, true) => None,
            (None, false) => {
                return Err(DedupError::Config(
                    "an output directory is required".to_string(),
                ))
            }
        };

        if self.output_name.is_empty() || self.output_name.contains(['/', '\\']) {
            return Err(DedupError::Config(format!(
                "invalid output file name: {:?}",
                self.output_name
            )));
        }

        Ok(Pipeline {
            config: self.config,
            input,
            output_dir,
            output_name: self.output_name,
            dry_run: self.dry_run,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The archive deduplication pipeline
#[derive(Debug)]
pub struct Pipeline {
    config: DedupConfig,
    input: PathBuf,
    output_dir: Option<PathBuf>,
    output_name: String,
    dry_run: bool,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    /// Run the pipeline without events
    pub fn run(&self) -> Result<DedupReport, DedupError> {
        self.run_with_events(&null_sender())
    }

    /// Run the pipeline with event reporting.
    ///
    /// Archive-level failures abort the run; the scratch directory and any
    /// half-written output are removed on every path out of this function.
    pub fn run_with_events(&self, events: &EventSender) -> Result<DedupReport, DedupError> {
        let start_time = Instant::now();
        events.send(Event::Pipeline(PipelineEvent::Started));
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Reading,
        }));

        let mut reader = ArchiveReader::open(&self.input, &ArchiveLimits::from_config(&self.config))?;
        events.send(Event::Archive(ArchiveEvent::Opened {
            path: self.input.clone(),
            entries: reader.headers().len(),
            size_bytes: reader.size_bytes(),
        }));

        let mut scratch = match self.dry_run {
            true => None,
            false => Some(ScratchSpace::new()?),
        };

        let selection = Selector::new(&self.config).select(&mut reader, scratch.as_mut(), events)?;

        let output = match (&scratch, &self.output_dir) {
            (Some(scratch), Some(dir)) => {
                events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
                    phase: PipelinePhase::Writing,
                }));
                let mut archive = OutputArchive::create(dir, &self.output_name)?;
                for (path, file) in &selection.retained {
                    archive.add_reader(path, &mut scratch.open(file)?)?;
                }
                Some(archive.persist()?)
            }
            _ => None,
        };

        let report = selection.into_report(self.input.clone(), output, start_time);
        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: report.summary(),
        }));
        Ok(report)
    }

    /// Fingerprint every admitted image without grouping or writing
    pub fn fingerprints(&self) -> Result<Vec<(String, Result<Fingerprint, EntryError>)>, DedupError> {
        let mut reader = ArchiveReader::open(&self.input, &ArchiveLimits::from_config(&self.config))?;
        let selector = Selector::new(&self.config);
        let headers = reader.headers().to_vec();

        let mut fingerprints = Vec::new();
        for header in headers.iter().filter(|h| !h.is_dir) {
            let result = match selector.admit(header) {
                Ok(Admission::Image) => {
                    let bytes = reader.read(header)?;
                    selector.hasher.hash_bytes(&header.path, &bytes)
                }
                Ok(Admission::PassThrough) => continue,
                Err(reason) => Err(reason),
            };
            fingerprints.push((header.path.clone(), result));
        }
        Ok(fingerprints)
    }
}

/// Deduplicate an archive held in memory, returning the new archive's bytes.
///
/// Same semantics as [`Pipeline::run`]; retained entries still go through
/// a scratch directory.
pub fn dedupe_bytes(
    config: &DedupConfig,
    archive: Vec<u8>,
) -> Result<(Vec<u8>, DedupReport), DedupError> {
    config.validate()?;
    let start_time = Instant::now();

    let mut reader = ArchiveReader::from_bytes(archive, &ArchiveLimits::from_config(config))?;
    let mut scratch = ScratchSpace::new()?;
    let selection = Selector::new(config).select(&mut reader, Some(&mut scratch), &null_sender())?;

    let mut writer = ArchiveWriter::new(Cursor::new(Vec::new()));
    for (path, file) in &selection.retained {
        writer.add_reader(path, &mut scratch.open(file)?)?;
    }
    let bytes = writer.finish()?.into_inner();

    let report = selection.into_report(reader.source().to_path_buf(), None, start_time);
    Ok((bytes, report))
}

enum Admission {
    Image,
    PassThrough,
}

/// Decisions for one pass over an archive
struct Selection {
    outcomes: Vec<EntryOutcome>,
    /// Entries to write, in archive order
    retained: Vec<(String, ScratchFile)>,
    groups: Vec<DuplicateGroup>,
}

impl Selection {
    fn into_report(self, input: PathBuf, output: Option<PathBuf>, start: Instant) -> DedupReport {
        DedupReport {
            input,
            output,
            outcomes: self.outcomes,
            groups: self.groups,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// Reads, fingerprints and groups entries strictly one at a time
struct Selector<'a> {
    config: &'a DedupConfig,
    filter: EntryFilter,
    hasher: AverageHasher,
}

impl<'a> Selector<'a> {
    fn new(config: &'a DedupConfig) -> Self {
        Self {
            config,
            filter: EntryFilter::from_config(config),
            hasher: AverageHasher::new(config.hash_size),
        }
    }

    /// Reject an entry from its header alone, before any decompression
    fn admit(&self, header: &EntryHeader) -> Result<Admission, EntryError> {
        let path = || header.path.clone();

        if !header.is_safe {
            return Err(EntryError::UnsafePath { path: path() });
        }
        if self.filter.is_hidden(&header.path) {
            return Err(EntryError::Hidden { path: path() });
        }

        let admission = if self.filter.is_image(&header.path) {
            Admission::Image
        } else {
            match self.config.non_image_policy {
                NonImagePolicy::Skip => return Err(EntryError::UnsupportedFormat { path: path() }),
                NonImagePolicy::PassThrough => Admission::PassThrough,
            }
        };

        if header.size > self.config.max_image_size {
            return Err(EntryError::ImageTooLarge {
                path: path(),
                size: header.size,
                limit: self.config.max_image_size,
            });
        }

        Ok(admission)
    }

    fn select<R: Read + Seek>(
        &self,
        reader: &mut ArchiveReader<R>,
        mut scratch: Option<&mut ScratchSpace>,
        events: &EventSender,
    ) -> Result<Selection, DedupError> {
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Fingerprinting,
        }));

        let headers: Vec<EntryHeader> = reader
            .headers()
            .iter()
            .filter(|h| !h.is_dir)
            .cloned()
            .collect();
        let total = headers.len();
        info!("Found {} entries", total);
        events.send(Event::Entry(EntryEvent::Started {
            total_entries: total,
        }));

        let mut grouper = FirstSeenGrouper::with_bucketing(
            ThresholdStrategy::new(self.config.hash_diff_threshold),
            self.config.bucketing,
        );
        let mut outcomes = Vec::with_capacity(total);
        let mut retained = Vec::new();

        for (processed, header) in headers.iter().enumerate() {
            let path = header.path.clone();

            let outcome = match self.admit(header) {
                Err(reason) => EntryOutcome::Skipped { path, reason },
                Ok(Admission::PassThrough) => {
                    let bytes = reader.read(header)?;
                    if let Some(scratch) = scratch.as_deref_mut() {
                        retained.push((path.clone(), scratch.store(&bytes)?));
                    }
                    EntryOutcome::PassedThrough { path }
                }
                Ok(Admission::Image) => {
                    let bytes = reader.read(header)?;
                    match self.hasher.hash_bytes(&path, &bytes) {
                        Err(reason) => EntryOutcome::Skipped { path, reason },
                        Ok(fingerprint) => match grouper.observe(&path, fingerprint) {
                            Decision::Unique => {
                                if let Some(scratch) = scratch.as_deref_mut() {
                                    retained.push((path.clone(), scratch.store(&bytes)?));
                                }
                                EntryOutcome::Kept { path }
                            }
                            Decision::Duplicate {
                                representative,
                                distance,
                                match_type,
                            } => EntryOutcome::Dropped {
                                path,
                                duplicate_of: representative,
                                distance,
                                match_type,
                            },
                        },
                    }
                }
            };

            log_outcome(&outcome);
            events.send(Event::Entry(EntryEvent::Progress(EntryProgress {
                processed: processed + 1,
                total,
                current_path: outcome.path().to_string(),
            })));
            outcomes.push(outcome);
        }

        let kept = outcomes
            .iter()
            .filter(|o| matches!(o, EntryOutcome::Kept { .. }))
            .count();
        let dropped = outcomes
            .iter()
            .filter(|o| matches!(o, EntryOutcome::Dropped { .. }))
            .count();
        let skipped = outcomes
            .iter()
            .filter(|o| matches!(o, EntryOutcome::Skipped { .. }))
            .count();
        info!(
            "Identified {} unique images and {} duplicates ({} skipped)",
            kept, dropped, skipped
        );
        events.send(Event::Entry(EntryEvent::Completed {
            kept,
            dropped,
            skipped,
        }));

        Ok(Selection {
            outcomes,
            retained,
            groups: grouper.into_groups(),
        })
    }
}

fn log_outcome(outcome: &EntryOutcome) {
    match outcome {
        EntryOutcome::Kept { path } => debug!(path = %path, "Kept"),
        EntryOutcome::PassedThrough { path } => debug!(path = %path, "Passed through"),
        EntryOutcome::Dropped {
            path,
            duplicate_of,
            distance,
            ..
        } => debug!(path = %path, duplicate_of = %duplicate_of, distance, "Dropped duplicate"),
        EntryOutcome::Skipped { path, reason } if reason.is_warning() => {
            warn!("Skipping {}: {}", path, reason)
        }
        EntryOutcome::Skipped { path, reason } => debug!("Skipping {}: {}", path, reason),
    }
}
