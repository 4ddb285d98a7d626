use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// The file could not be read as media. Callers route it to the
/// not-supported bucket; it is never a "no date" result.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("unsupported or corrupt media {path}: {reason}")]
    Unsupported { path: PathBuf, reason: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A PNG or QuickTime container that is cut short or structurally wrong.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("{0}")]
    Corrupt(String),

    #[error(transparent)]
    Io(io::Error),
}

impl From<io::Error> for ContainerError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Self::Corrupt("file is truncated".into())
        } else {
            Self::Io(e)
        }
    }
}

impl ContainerError {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        Self::Corrupt(reason.into())
    }

    pub(crate) fn into_metadata_error(self, path: &Path) -> MetadataError {
        match self {
            Self::Corrupt(reason) => MetadataError::Unsupported {
                path: path.to_path_buf(),
                reason,
            },
            Self::Io(source) => MetadataError::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum PlaceError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Both the computed destination and the duplicates bucket already hold
    /// a file with this name.
    #[error("{from} collides at {primary} and in the duplicates bucket at {duplicate}")]
    DuplicateExists {
        from: PathBuf,
        primary: PathBuf,
        duplicate: PathBuf,
    },

    #[error("{0} has no file name")]
    NoFileName(PathBuf),
}

impl PlaceError {
    /// Where the failed copy was headed, when there was a destination at all.
    pub fn destination(&self) -> Option<&PathBuf> {
        match self {
            Self::CreateDir { path, .. } => Some(path),
            Self::Copy { to, .. } => Some(to),
            Self::DuplicateExists { duplicate, .. } => Some(duplicate),
            Self::NoFileName(_) => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown placeholder {{{name}}} in output template (expected year, month or day)")]
    UnknownPlaceholder { name: String },

    #[error("unbalanced brace at byte {at} in output template")]
    UnbalancedBrace { at: usize },
}
