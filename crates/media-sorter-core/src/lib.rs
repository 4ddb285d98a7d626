pub mod catalog;
pub mod classify;
pub mod date;
pub mod error;
pub mod events;
pub mod media;
pub mod planner;
pub mod scan;
pub mod writer;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::classify::Classification;
use crate::events::{Bucket, Event, EventSink};
use crate::media::MediaFile;
use crate::planner::OutputLayout;
use crate::writer::Placement;

pub use crate::catalog::{catalog, PatternRule};
pub use crate::classify::{classify, classify_with};
pub use crate::date::{resolve_date, DateSource, ResolvedDate};
pub use crate::error::{MetadataError, PlaceError, TemplateError};
pub use crate::planner::{plan, LayoutOptions, OutputTemplate};
pub use crate::writer::place;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizeOptions {
    pub input: PathBuf,
    #[serde(flatten)]
    pub layout: LayoutOptions,
}

impl OrganizeOptions {
    /// All outputs under one root, with the default bucket names.
    pub fn with_output_root(input: PathBuf, root: &Path) -> Self {
        Self {
            input,
            layout: LayoutOptions::under(root),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizeSummary {
    pub total: u64,
    pub dated: u64,
    pub unknown_date: u64,
    pub not_supported: u64,
    pub duplicates: u64,
    /// Files that could not be copied anywhere.
    pub failed: u64,
    pub unclassified: u64,
    pub ambiguous: u64,
}

/// Reports a progress percentage only when its integer value changes.
#[derive(Debug)]
struct PercentTracker {
    total: usize,
    processed: usize,
    last: u8,
}

impl PercentTracker {
    fn new(total: usize) -> Self {
        Self {
            total,
            processed: 0,
            last: 0,
        }
    }

    fn advance(&mut self) -> Option<u8> {
        self.processed += 1;
        let percent = (self.processed * 100 / self.total.max(1)).min(100) as u8;
        if percent == self.last {
            return None;
        }
        self.last = percent;
        Some(percent)
    }
}

/// Copy every file under `options.input` into the output layout.
///
/// Only an unusable input root or output template is an error; anything
/// that goes wrong with a single file is reported to `sink` and the batch
/// carries on.
pub fn organize(options: &OrganizeOptions, sink: &dyn EventSink) -> anyhow::Result<OrganizeSummary> {
    let layout = options
        .layout
        .compile()
        .with_context(|| format!("invalid dated output template {:?}", options.layout.dated))?;

    let meta = fs::metadata(&options.input)
        .with_context(|| format!("cannot read input directory {}", options.input.display()))?;
    if !meta.is_dir() {
        anyhow::bail!("input {} is not a directory", options.input.display());
    }

    let files = scan::list_files(&options.input, sink);
    sink.record(&Event::BatchStarted {
        input: options.input.clone(),
        files: files.len(),
    });

    let mut summary = OrganizeSummary {
        total: files.len() as u64,
        ..Default::default()
    };
    let mut progress = PercentTracker::new(files.len());

    for path in &files {
        process_file(path, &layout, sink, &mut summary);

        if let Some(percent) = progress.advance() {
            sink.record(&Event::Progress {
                percent,
                processed: progress.processed,
                total: files.len(),
            });
        }
    }

    sink.record(&Event::BatchFinished {
        summary: summary.clone(),
    });
    Ok(summary)
}

fn process_file(path: &Path, layout: &OutputLayout, sink: &dyn EventSink, summary: &mut OrganizeSummary) {
    let mut media = MediaFile::new(path);

    let (dest_dir, bucket) = match date::resolve_date(path, sink) {
        Err(e) => {
            sink.record(&Event::MetadataUnreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
            (layout.not_supported.clone(), Bucket::NotSupported)
        }
        Ok(date) => {
            media.date = date;
            let classification = classify::classify(&media.name);
            report_classification(path, &classification, sink, summary);
            media.tag = classification.tag();

            let dir = planner::plan(media.date.map(|d| d.at.date()), media.tag, layout);
            let bucket = if media.date.is_some() {
                Bucket::Dated
            } else {
                Bucket::UnknownDate
            };
            (dir, bucket)
        }
    };

    match writer::place(path, &dest_dir, &layout.duplicates) {
        Ok(Placement::Placed(destination)) => {
            match bucket {
                Bucket::Dated => summary.dated += 1,
                Bucket::UnknownDate => summary.unknown_date += 1,
                Bucket::NotSupported => summary.not_supported += 1,
                Bucket::Duplicates => summary.duplicates += 1,
            }
            sink.record(&Event::Placed {
                path: path.to_path_buf(),
                destination,
                bucket,
            });
        }
        Ok(Placement::Duplicate { existing, copied_to }) => {
            summary.duplicates += 1;
            sink.record(&Event::Collision {
                path: path.to_path_buf(),
                existing,
                duplicate: copied_to,
            });
        }
        Err(e) => {
            summary.failed += 1;
            let destination = e.destination().cloned();
            let bucket = match (&e, &destination) {
                (PlaceError::DuplicateExists { .. }, _) => Bucket::Duplicates,
                (_, Some(d)) if d.starts_with(&layout.duplicates) => Bucket::Duplicates,
                _ => bucket,
            };
            sink.record(&Event::CopyFailed {
                path: path.to_path_buf(),
                destination,
                bucket,
                reason: e.to_string(),
            });
        }
    }
}

fn report_classification(
    path: &Path,
    classification: &Classification<'_>,
    sink: &dyn EventSink,
    summary: &mut OrganizeSummary,
) {
    let Some(winner) = classification.winner() else {
        summary.unclassified += 1;
        sink.record(&Event::Unclassified {
            path: path.to_path_buf(),
        });
        return;
    };

    if classification.is_ambiguous() {
        summary.ambiguous += 1;
    }
    for extra in classification.extra_matches() {
        sink.record(&Event::Ambiguous {
            path: path.to_path_buf(),
            winner: winner.tag().to_string(),
            tag: extra.tag().to_string(),
            pattern: extra.pattern().to_string(),
        });
    }
}
