pub mod exif;
pub mod png;
pub mod quicktime;

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::MetadataError;
use crate::events::{Event, EventSink};

/// Which metadata field a date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    /// EXIF DateTimeOriginal, or a movie header creation time.
    Capture,
    /// EXIF DateTime.
    Generic,
    /// EXIF DateTimeDigitized.
    Digitized,
    /// A modification time stored inside the file's own container.
    ContainerModified,
}

impl DateSource {
    /// Resolution order, best first.
    pub const PRIORITY: [DateSource; 4] = [
        DateSource::Capture,
        DateSource::Generic,
        DateSource::Digitized,
        DateSource::ContainerModified,
    ];

    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Capture => "DateTimeOriginal",
            Self::Generic => "DateTime",
            Self::Digitized => "DateTimeDigitized",
            Self::ContainerModified => "container modified time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    pub at: NaiveDateTime,
    pub source: DateSource,
}

/// Candidate dates read from one file. `None` means absent; sentinel values
/// never make it in here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateFields {
    pub capture: Option<NaiveDateTime>,
    pub generic: Option<NaiveDateTime>,
    pub digitized: Option<NaiveDateTime>,
    pub container_modified: Option<NaiveDateTime>,
}

impl DateFields {
    pub fn get(&self, source: DateSource) -> Option<NaiveDateTime> {
        match source {
            DateSource::Capture => self.capture,
            DateSource::Generic => self.generic,
            DateSource::Digitized => self.digitized,
            DateSource::ContainerModified => self.container_modified,
        }
    }

    fn slot(&mut self, source: DateSource) -> &mut Option<NaiveDateTime> {
        match source {
            DateSource::Capture => &mut self.capture,
            DateSource::Generic => &mut self.generic,
            DateSource::Digitized => &mut self.digitized,
            DateSource::ContainerModified => &mut self.container_modified,
        }
    }

    /// Fill a field unless an earlier reader already did.
    pub fn offer(&mut self, source: DateSource, value: Option<NaiveDateTime>) {
        let slot = self.slot(source);
        if slot.is_none() {
            *slot = value;
        }
    }

    /// First present field in [`DateSource::PRIORITY`] order.
    pub fn resolve(&self) -> Option<ResolvedDate> {
        DateSource::PRIORITY
            .iter()
            .find_map(|&source| self.get(source).map(|at| ResolvedDate { at, source }))
    }
}

/// A date field that exists but could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub source: DateSource,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaMetadata {
    pub fields: DateFields,
    pub issues: Vec<FieldIssue>,
}

/// Container families recognized by their leading bytes, on top of what the
/// EXIF reader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    QuickTime,
    Png,
}

impl Container {
    fn sniff(head: &[u8]) -> Option<Self> {
        if png::is_png(head) {
            Some(Self::Png)
        } else if quicktime::is_quicktime(head) {
            Some(Self::QuickTime)
        } else {
            None
        }
    }
}

/// Read every date field the file carries. Never writes to the file.
///
/// `Err` means the file is not readable as media at all, which is different
/// from media that simply has no dates (`Ok` with empty fields).
pub fn read_metadata(path: &Path) -> Result<MediaMetadata, MetadataError> {
    let io_err = |source| MetadataError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let mut reader = BufReader::new(file);
    let container = Container::sniff(reader.fill_buf().map_err(io_err)?);

    let mut meta = MediaMetadata::default();
    if let Err(e) = exif::read_exif(&mut reader, &mut meta) {
        // Movies and plain PNGs routinely fail EXIF parsing; their own
        // container reader below decides whether the file is usable.
        if container.is_none() {
            return Err(exif::into_metadata_error(path, e));
        }
    }

    match container {
        Some(Container::QuickTime) => {
            reader.seek(SeekFrom::Start(0)).map_err(io_err)?;
            let times = quicktime::read_movie_times(&mut reader)
                .map_err(|e| e.into_metadata_error(path))?;
            meta.fields.offer(DateSource::Capture, times.created);
            meta.fields.offer(DateSource::ContainerModified, times.modified);
        }
        Some(Container::Png) => {
            reader.seek(SeekFrom::Start(0)).map_err(io_err)?;
            let modified = png::read_modified_time(&mut reader)
                .map_err(|e| e.into_metadata_error(path))?;
            meta.fields.offer(DateSource::ContainerModified, modified);
        }
        None => {}
    }

    Ok(meta)
}

/// Best available date for a file, reporting unusable fields and the result
/// to `sink`.
pub fn resolve_date(
    path: &Path,
    sink: &dyn EventSink,
) -> Result<Option<ResolvedDate>, MetadataError> {
    let meta = read_metadata(path)?;

    for issue in &meta.issues {
        sink.record(&Event::FieldMalformed {
            path: path.to_path_buf(),
            field: issue.source,
            reason: issue.reason.clone(),
        });
    }

    let resolved = meta.fields.resolve();
    sink.record(&Event::DateResolved {
        path: path.to_path_buf(),
        date: resolved.map(|r| r.at),
        source: resolved.map(|r| r.source),
    });
    Ok(resolved)
}
