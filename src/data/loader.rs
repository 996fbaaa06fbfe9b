use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use serde::{Deserialize, Serialize};

use super::decoder::decode_record;
use super::model::{DecodedRecord, Projection};
use super::projector::{project, ProjectorKind};
use super::schema::PITCH_SCHEMA;
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// What to do with a line that fails to decode or project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Yield the error and stop.
    #[default]
    Abort,
    /// Log the error and continue with the next line.
    Skip,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceOptions {
    pub on_error: ErrorPolicy,
    /// Require the header row to name the schema columns in order.
    pub check_header: bool,
}

// ---------------------------------------------------------------------------
// PitchSource – lazy records from one pass over a reader
// ---------------------------------------------------------------------------

/// Decoded records from a headed pitch CSV, read one line at a time.
///
/// The CSV reader passes over blank lines without yielding a record, so they
/// never reach the error policy. They are counted in
/// [`PitchSource::blank_lines`] and reported at `debug`.
pub struct PitchSource<R: Read> {
    records: StringRecordsIntoIter<R>,
    policy: ErrorPolicy,
    decoded: usize,
    skipped: usize,
    blank_lines: u64,
    // Reader line count after the last record (or the header).
    read_to: u64,
    finished: bool,
}

impl<R: Read> PitchSource<R> {
    /// Wrap a reader positioned at the header line.
    pub fn from_reader(reader: R, options: &SourceOptions) -> Result<Self, LoadError> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            // Field counts are checked by the decoder.
            .flexible(true)
            .delimiter(PITCH_SCHEMA.delimiter)
            .from_reader(reader);

        let headers = csv_reader.headers()?;
        if options.check_header {
            PITCH_SCHEMA
                .check_header(headers.iter())
                .map_err(|(index, expected, found)| LoadError::Header {
                    index,
                    expected,
                    found,
                })?;
        }

        let read_to = csv_reader.position().line();
        Ok(PitchSource {
            records: csv_reader.into_records(),
            policy: options.on_error,
            decoded: 0,
            skipped: 0,
            blank_lines: 0,
            read_to,
            finished: false,
        })
    }

    /// Adapt the source to yield projections instead of raw records.
    pub fn projected(self, kind: ProjectorKind) -> ProjectedSource<R> {
        ProjectedSource { source: self, kind }
    }

    /// Records decoded so far.
    pub fn decoded(&self) -> usize {
        self.decoded
    }

    /// Lines dropped under [`ErrorPolicy::Skip`].
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Blank lines passed over by the reader.
    pub fn blank_lines(&self) -> u64 {
        self.blank_lines
    }

    fn count_blank_lines(&mut self, record: &StringRecord) {
        let read_to = self.records.reader().position().line();
        // One line for the record itself plus any newlines quoted inside it.
        let own = 1 + record.iter().map(|f| f.matches('\n').count() as u64).sum::<u64>();
        let blank = read_to.saturating_sub(self.read_to).saturating_sub(own);
        if blank > 0 {
            self.blank_lines += blank;
            log::debug!("passed over {blank} blank line(s) before line {}", line_of(record));
        }
        self.read_to = read_to;
    }

    /// Next record passed through `f`, applying the error policy to both the
    /// decode and `f`.
    fn next_with<T, F>(&mut self, mut f: F) -> Option<Result<T, LoadError>>
    where
        F: FnMut(u64, DecodedRecord) -> Result<T, LoadError>,
    {
        if self.finished {
            return None;
        }
        loop {
            let result = match self.records.next() {
                None => {
                    self.finished = true;
                    log::debug!(
                        "pitch source exhausted: {} decoded, {} skipped, {} blank",
                        self.decoded,
                        self.skipped,
                        self.blank_lines
                    );
                    return None;
                }
                Some(Err(err)) if err.is_io_error() => {
                    self.finished = true;
                    return Some(Err(LoadError::Csv(err)));
                }
                Some(Err(err)) => Err(LoadError::Csv(err)),
                Some(Ok(record)) => {
                    self.count_blank_lines(&record);
                    let line = line_of(&record);
                    decode_record(&record)
                        .map_err(|source| LoadError::Decode { line, source })
                        .and_then(|decoded| f(line, decoded))
                }
            };

            match (result, self.policy) {
                (Ok(value), _) => {
                    self.decoded += 1;
                    return Some(Ok(value));
                }
                (Err(err), ErrorPolicy::Skip) => {
                    self.skipped += 1;
                    log::warn!("skipping record: {err}");
                }
                (Err(err), ErrorPolicy::Abort) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

impl<R: Read> Iterator for PitchSource<R> {
    type Item = Result<DecodedRecord, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_with(|_, record| Ok(record))
    }
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

// ---------------------------------------------------------------------------
// ProjectedSource – records already projected for a consumer
// ---------------------------------------------------------------------------

pub struct ProjectedSource<R: Read> {
    source: PitchSource<R>,
    kind: ProjectorKind,
}

impl<R: Read> ProjectedSource<R> {
    pub fn kind(&self) -> ProjectorKind {
        self.kind
    }

    pub fn source(&self) -> &PitchSource<R> {
        &self.source
    }
}

impl<R: Read> Iterator for ProjectedSource<R> {
    type Item = Result<Projection, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        let kind = self.kind;
        self.source.next_with(|line, record| {
            project(kind, &record).map_err(|source| LoadError::Projection { line, source })
        })
    }
}

// ---------------------------------------------------------------------------
// PitchFile – a restartable source on disk
// ---------------------------------------------------------------------------

/// A pitch CSV on disk; every [`PitchFile::open`] starts a fresh pass.
#[derive(Debug, Clone)]
pub struct PitchFile {
    path: PathBuf,
    options: SourceOptions,
}

impl PitchFile {
    pub fn new(path: impl Into<PathBuf>, options: SourceOptions) -> Self {
        PitchFile {
            path: path.into(),
            options,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &SourceOptions {
        &self.options
    }

    pub fn open(&self) -> Result<PitchSource<File>, LoadError> {
        log::debug!("opening pitch file {}", self.path.display());
        let file = File::open(&self.path)?;
        PitchSource::from_reader(file, &self.options)
    }
}
