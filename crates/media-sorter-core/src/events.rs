//! Structured diagnostics.
//!
//! The core never writes to a global logger. Every component reports what
//! happened as an [`Event`] to an [`EventSink`] handed in by the caller, which
//! decides where it goes: the `log` facade, a JSON-lines file, memory, or a
//! combination of those.

use std::cell::RefCell;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use log::Level;
use serde::Serialize;

use crate::date::DateSource;
use crate::OrganizeSummary;

/// Where a file ended up, or which bucket a failed copy was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Dated,
    UnknownDate,
    Duplicates,
    NotSupported,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    BatchStarted {
        input: PathBuf,
        files: usize,
    },
    Progress {
        percent: u8,
        processed: usize,
        total: usize,
    },
    DateResolved {
        path: PathBuf,
        date: Option<NaiveDateTime>,
        source: Option<DateSource>,
    },
    FieldMalformed {
        path: PathBuf,
        field: DateSource,
        reason: String,
    },
    MetadataUnreadable {
        path: PathBuf,
        reason: String,
    },
    Unclassified {
        path: PathBuf,
    },
    Ambiguous {
        path: PathBuf,
        winner: String,
        tag: String,
        pattern: String,
    },
    Placed {
        path: PathBuf,
        destination: PathBuf,
        bucket: Bucket,
    },
    Collision {
        path: PathBuf,
        existing: PathBuf,
        duplicate: PathBuf,
    },
    CopyFailed {
        path: PathBuf,
        destination: Option<PathBuf>,
        bucket: Bucket,
        reason: String,
    },
    WalkFailed {
        reason: String,
    },
    BatchFinished {
        summary: OrganizeSummary,
    },
}

impl Event {
    pub fn level(&self) -> Level {
        match self {
            Self::BatchStarted { .. }
            | Self::Progress { .. }
            | Self::Unclassified { .. }
            | Self::BatchFinished { .. } => Level::Info,
            Self::DateResolved { .. } | Self::Placed { .. } => Level::Debug,
            Self::FieldMalformed { .. }
            | Self::Ambiguous { .. }
            | Self::Collision { .. }
            | Self::WalkFailed { .. } => Level::Warn,
            Self::MetadataUnreadable { .. } | Self::CopyFailed { .. } => Level::Error,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BatchStarted { input, files } => {
                write!(f, "Starting organization of {} ({} files)", input.display(), files)
            }
            Self::Progress { percent, processed, total } => {
                write!(f, "Progress: {}% ({}/{})", percent, processed, total)
            }
            Self::DateResolved { path, date, source } => match (date, source) {
                (Some(date), Some(source)) => {
                    write!(f, "File: {} ({} from {})", path.display(), date, source.field_name())
                }
                _ => write!(f, "File: {} (no date)", path.display()),
            },
            Self::FieldMalformed { path, field, reason } => write!(
                f,
                "Ignoring malformed {} in {}: {}",
                field.field_name(),
                path.display(),
                reason
            ),
            Self::MetadataUnreadable { path, reason } => {
                write!(f, "Metadata unreadable, not supported: {} ({})", path.display(), reason)
            }
            Self::Unclassified { path } => {
                write!(f, "File name could not be categorized: {}", path.display())
            }
            Self::Ambiguous { path, winner, tag, pattern } => write!(
                f,
                "File matched multiple file name patterns: {} kept {}, also {} {}",
                path.display(),
                winner,
                tag,
                pattern
            ),
            Self::Placed { path, destination, .. } => {
                write!(f, "Copied {} to {}", path.display(), destination.display())
            }
            Self::Collision { path, existing, duplicate } => write!(
                f,
                "{} already exists, copied {} to {}",
                existing.display(),
                path.display(),
                duplicate.display()
            ),
            Self::CopyFailed { path, reason, .. } => {
                write!(f, "File left unplaced: {} ({})", path.display(), reason)
            }
            Self::WalkFailed { reason } => write!(f, "Skipping unreadable input entry: {}", reason),
            Self::BatchFinished { summary } => write!(
                f,
                "Finished organization: {} files, {} dated, {} unknown date, {} not supported, {} duplicates, {} failed",
                summary.total,
                summary.dated,
                summary.unknown_date,
                summary.not_supported,
                summary.duplicates,
                summary.failed
            ),
        }
    }
}

/// Receives diagnostics. Recording must never fail the caller.
pub trait EventSink {
    fn record(&self, event: &Event);
}

impl<S: EventSink + ?Sized> EventSink for &S {
    fn record(&self, event: &Event) {
        (**self).record(event)
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn record(&self, event: &Event) {
        (**self).record(event)
    }
}

/// Forwards events to the `log` facade at their own level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&self, event: &Event) {
        log::log!(target: "media_sorter", event.level(), "{}", event);
    }
}

/// Appends one JSON object per event to a file.
pub struct JsonLinesSink {
    out: RefCell<LineWriter<File>>,
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn append(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            out: RefCell::new(LineWriter::new(file)),
            path: path.to_path_buf(),
        })
    }
}

impl EventSink for JsonLinesSink {
    fn record(&self, event: &Event) {
        let mut out = self.out.borrow_mut();
        let written = serde_json::to_writer(&mut *out, event)
            .map_err(io::Error::from)
            .and_then(|()| out.write_all(b"\n"));
        if let Err(e) = written {
            log::warn!("failed to write event log {}: {}", self.path.display(), e);
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: RefCell<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: &Event) {
        self.events.borrow_mut().push(event.clone());
    }
}

/// Sends every event to both sinks.
pub struct Tee<A, B>(pub A, pub B);

impl<A: EventSink, B: EventSink> EventSink for Tee<A, B> {
    fn record(&self, event: &Event) {
        self.0.record(event);
        self.1.record(event);
    }
}
