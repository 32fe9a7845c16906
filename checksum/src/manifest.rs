//! Parsing for `checksum.md5` manifests.
//!
//! A manifest holds one entry per line in the binary-mode checksum list
//! format:
//!
//! ```text
//! d41d8cd98f00b204e9800998ecf8427e *empty.txt
//! ```
//!
//! There is no header and blank lines are not permitted. Any line that does
//! not decode is a hard failure for the whole manifest.

use crate::error::{ChecksumError, Result};
use crate::md5_digest::Md5Digest;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::File;
use std::io::{BufRead, BufReader};

/// Conventional file name of the manifest inside each package directory.
pub const MANIFEST_FILE_NAME: &str = "checksum.md5";

/// Prefix on the file name token marking a binary-mode entry.
pub const BINARY_MARKER: char = '*';

/// A single decoded manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Digest recorded for the file.
    pub digest: Md5Digest,
    /// File name relative to the package directory, without the marker.
    pub referenced_name: String,
}

/// Decode one manifest line into its digest and file name.
///
/// Surrounding whitespace, including the line terminator, is ignored. The
/// remainder must be exactly two tokens separated by a single space.
///
/// # Errors
///
/// Returns [`ChecksumError::MalformedEntry`] if the line does not have two
/// tokens, the digest is not 32 hex characters, or the name token lacks the
/// `*` marker or is empty after it.
///
/// # Examples
///
/// ```
/// use hathi_checksum::manifest::parse_entry;
///
/// let entry = parse_entry("d41d8cd98f00b204e9800998ecf8427e *empty.txt\n").unwrap();
/// assert_eq!(entry.digest.as_str(), "d41d8cd98f00b204e9800998ecf8427e");
/// assert_eq!(entry.referenced_name, "empty.txt");
/// ```
pub fn parse_entry(line: &str) -> Result<ManifestEntry> {
    let mut tokens = line.trim().split(' ');
    let (Some(digest), Some(raw_name), None) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(ChecksumError::MalformedEntry {
            reason: format!("expected \"<digest> {BINARY_MARKER}<name>\", got {:?}", line.trim_end()),
        });
    };

    let digest: Md5Digest = digest.parse()?;
    let Some(name) = raw_name.strip_prefix(BINARY_MARKER) else {
        return Err(ChecksumError::MalformedEntry {
            reason: format!("file name {raw_name:?} is missing the {BINARY_MARKER:?} marker"),
        });
    };
    if name.is_empty() {
        return Err(ChecksumError::MalformedEntry {
            reason: "empty file name".to_owned(),
        });
    }

    Ok(ManifestEntry {
        digest,
        referenced_name: name.to_owned(),
    })
}

/// Encode an entry as it appears on disk, without the line terminator.
#[must_use]
pub fn format_entry(digest: &str, referenced_name: &str) -> String {
    format!("{digest} {BINARY_MARKER}{referenced_name}")
}

/// Returns the conventional manifest path for a package directory.
#[must_use]
pub fn manifest_path(package_dir: &Utf8Path) -> Utf8PathBuf {
    package_dir.join(MANIFEST_FILE_NAME)
}

/// Decode the raw bytes of line `line_number` of `path`.
///
/// A line that is not valid UTF-8 is malformed in the same way as a line
/// with the wrong shape.
pub(crate) fn decode_line(
    raw: &[u8],
    path: &Utf8Path,
    line_number: usize,
) -> Result<ManifestEntry> {
    std::str::from_utf8(raw)
        .map_err(|err| ChecksumError::MalformedEntry {
            reason: format!("line is not valid UTF-8: {err}"),
        })
        .and_then(parse_entry)
        .map_err(|err| err.at_line(path, line_number))
}

/// Lazy, file-order iterator over the entries of one manifest.
///
/// The file handle is owned by the iterator and closed when it is dropped,
/// whether the scan ran to the end or stopped early. To scan again, open a
/// new iterator.
#[derive(Debug)]
pub struct ManifestEntries {
    path: Utf8PathBuf,
    reader: BufReader<File>,
    line: Vec<u8>,
    line_number: usize,
}

impl ManifestEntries {
    /// Open `path` read-only and prepare to decode its entries.
    ///
    /// # Errors
    ///
    /// Returns [`ChecksumError::ManifestIo`] if the manifest cannot be opened.
    pub fn open(path: &Utf8Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| ChecksumError::ManifestIo {
            path: path.to_owned(),
            source,
        })?;
        Ok(Self {
            path: path.to_owned(),
            reader: BufReader::new(file),
            line: Vec::new(),
            line_number: 0,
        })
    }

    /// Path of the manifest being read.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Iterator for ManifestEntries {
    type Item = Result<ManifestEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.line.clear();
        match self.reader.read_until(b'\n', &mut self.line) {
            Ok(0) => None,
            Ok(_) => {
                self.line_number += 1;
                Some(decode_line(&self.line, &self.path, self.line_number))
            }
            Err(source) => Some(Err(ChecksumError::ManifestIo {
                path: self.path.clone(),
                source,
            })),
        }
    }
}

/// Read every entry of the manifest at `path`, stopping at the first error.
///
/// # Errors
///
/// Returns the first open, read, or decode error encountered.
pub fn read_entries(path: &Utf8Path) -> Result<Vec<ManifestEntry>> {
    ManifestEntries::open(path)?.collect()
}
