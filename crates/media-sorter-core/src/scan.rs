use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::events::{Event, EventSink};

/// Every regular file under `root`, in a stable order (entries sorted by
/// name within each directory). Symlinks are not followed. Entries that
/// cannot be read are reported and skipped.
pub fn list_files(root: &Path, sink: &dyn EventSink) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => sink.record(&Event::WalkFailed {
                reason: e.to_string(),
            }),
        }
    }
    files
}
