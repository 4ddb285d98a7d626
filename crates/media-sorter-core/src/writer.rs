use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::PlaceError;

/// Where a copy landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Copied to the planned destination.
    Placed(PathBuf),
    /// The planned name was taken, so the copy went to the duplicates bucket.
    Duplicate { existing: PathBuf, copied_to: PathBuf },
}

impl Placement {
    pub fn path(&self) -> &Path {
        match self {
            Self::Placed(path) => path,
            Self::Duplicate { copied_to, .. } => copied_to,
        }
    }
}

/// Create `dir` and its parents. Safe to repeat.
pub fn ensure_dir(dir: &Path) -> Result<(), PlaceError> {
    fs::create_dir_all(dir).map_err(|source| PlaceError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Copy `source` into `dest_dir` under its own name, never overwriting.
/// A name clash reroutes the copy into `duplicates_dir`.
pub fn place(source: &Path, dest_dir: &Path, duplicates_dir: &Path) -> Result<Placement, PlaceError> {
    let name = source
        .file_name()
        .ok_or_else(|| PlaceError::NoFileName(source.to_path_buf()))?;

    ensure_dir(dest_dir)?;
    let primary = dest_dir.join(name);
    if copy_new(source, &primary)? {
        return Ok(Placement::Placed(primary));
    }

    ensure_dir(duplicates_dir)?;
    let duplicate = duplicates_dir.join(name);
    if copy_new(source, &duplicate)? {
        return Ok(Placement::Duplicate {
            existing: primary,
            copied_to: duplicate,
        });
    }

    Err(PlaceError::DuplicateExists {
        from: source.to_path_buf(),
        primary,
        duplicate,
    })
}

/// Copy into a file that must not exist yet; creation and the existence
/// check are one step. Returns `Ok(false)` if `dest` was already there.
fn copy_new(source: &Path, dest: &Path) -> Result<bool, PlaceError> {
    let copy_err = |e| PlaceError::Copy {
        from: source.to_path_buf(),
        to: dest.to_path_buf(),
        source: e,
    };

    let mut input = File::open(source).map_err(copy_err)?;
    let output = match OpenOptions::new().write(true).create_new(true).open(dest) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(copy_err(e)),
    };

    let mut output = BufWriter::new(output);
    let copied = io::copy(&mut input, &mut output).and_then(|_| output.flush());
    drop(output);
    if let Err(e) = copied {
        // Don't leave a truncated file behind to collide with a later run.
        fs::remove_file(dest).ok();
        return Err(copy_err(e));
    }

    if let Ok(meta) = input.metadata() {
        let mtime = filetime::FileTime::from_last_modification_time(&meta);
        filetime::set_file_mtime(dest, mtime).ok();
        fs::set_permissions(dest, meta.permissions()).ok();
    }
    Ok(true)
}
