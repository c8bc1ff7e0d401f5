//! Error types for ROM image handling

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading and normalizing a ROM image
#[derive(Error, Debug)]
pub enum RomError {
    #[error("Unreadable source {path}: {reason}")]
    UnreadableSource { path: PathBuf, reason: String },

    #[error("Unhandled ROM source kind: {0}")]
    UnsupportedSourceKind(PathBuf),

    #[error("ROM format could not be determined for {0}")]
    FormatUndetermined(PathBuf),

    #[error("Malformed GDI description: {0}")]
    MalformedDescription(String),

    #[error("Unknown canonical name: {0}")]
    UnknownCanonicalName(String),

    #[error("Cannot open {0}: another entry is still open")]
    AlreadyOpen(String),

    #[error("Entry name {0:?} would be written outside the destination")]
    UnsafeEntryName(String),

    #[error("Destination {0} exists and is not a directory")]
    DestinationNotDirectory(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Result type for ROM operations
pub type RomResult<T> = Result<T, RomError>;
