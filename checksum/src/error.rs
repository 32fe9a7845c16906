//! Error types for checksum verification and repair.
//!
//! Each variant names the manifest, file, or entry involved so the top-level
//! command can print a message the operator can act on without re-running
//! in debug mode.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while scanning or repairing checksum manifests.
#[derive(Debug, Error)]
pub enum ChecksumError {
    /// A manifest line does not have the `<digest> *<name>` shape.
    #[error("malformed checksum entry: {reason}")]
    MalformedEntry {
        /// Description of the structural problem.
        reason: String,
    },

    /// A malformed line was found while reading a specific manifest.
    #[error("{path}:{line}: {source}")]
    MalformedManifestLine {
        /// Manifest containing the line.
        path: Utf8PathBuf,
        /// 1-based line number.
        line: usize,
        /// The underlying decode failure.
        #[source]
        source: Box<ChecksumError>,
    },

    /// The manifest itself could not be opened or read.
    #[error("failed to read manifest {path}")]
    ManifestIo {
        /// Path of the manifest.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A manifest entry points to a file that does not exist or cannot be read.
    #[error("referenced file {path} could not be read")]
    MissingReferencedFile {
        /// Resolved path of the referenced file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The repair target has no entry in the manifest.
    #[error("no entry found for {target}")]
    NoSuchEntry {
        /// File name that was searched for.
        target: String,
    },

    /// The replacement line would not occupy the same number of bytes.
    #[error(
        "refusing to rewrite entry for {target}: replacement is {actual} bytes, original is {expected} bytes"
    )]
    LengthMismatch {
        /// File name of the entry being rewritten.
        target: String,
        /// Byte length of the original line.
        expected: usize,
        /// Byte length of the replacement line.
        actual: usize,
    },

    /// Package discovery failed below the root.
    #[error("failed to walk {path}")]
    WalkFailed {
        /// Directory that could not be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The operator's answer could not be read.
    #[error("failed to read confirmation")]
    Prompt {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChecksumError {
    /// Attach the manifest path and line number to a line-level decode error.
    #[must_use]
    pub fn at_line(self, path: &camino::Utf8Path, line: usize) -> Self {
        Self::MalformedManifestLine {
            path: path.to_owned(),
            line,
            source: Box::new(self),
        }
    }

    /// Returns true for errors that indicate a corrupt manifest.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedEntry { .. } | Self::MalformedManifestLine { .. }
        )
    }
}

/// Result type alias using [`ChecksumError`].
pub type Result<T> = std::result::Result<T, ChecksumError>;
