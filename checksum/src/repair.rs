//! In-place repair of stale manifest entries.
//!
//! A repair rewrites one line of `checksum.md5` through the same read/write
//! handle used to find it. Nothing after the rewritten line moves, so the
//! replacement must occupy exactly as many bytes as the original. When it
//! would not, the write is refused and the manifest stays byte-identical.
//!
//! Until a matching entry is found the manifest is only read; a failed
//! lookup never modifies it. The write itself is not crash-atomic.

use crate::detector::{Mismatch, describe, find_failing_checksums_beside};
use crate::digest::compute_md5;
use crate::error::{ChecksumError, Result};
use crate::manifest::{decode_line, format_entry};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use tracing::{debug, error, info, warn};

/// Details of a rewritten manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairedEntry {
    /// Name of the file whose entry was rewritten.
    pub referenced_name: String,
    /// Digest recorded before the repair.
    pub old_digest: String,
    /// Digest written by the repair.
    pub new_digest: String,
    /// Byte offset of the start of the rewritten line.
    pub offset: u64,
}

/// Rewrite the digest of the entry named `target_name` in `manifest`.
///
/// Entries are matched on the exact, case-sensitive file name. The
/// replacement keeps the original line terminator (`\n`, `\r\n`, or none on
/// an unterminated last line).
///
/// # Errors
///
/// - [`ChecksumError::ManifestIo`] if the manifest cannot be opened or read.
/// - [`ChecksumError::MalformedManifestLine`] if a line before the target
///   does not decode.
/// - [`ChecksumError::NoSuchEntry`] if no entry names `target_name`.
/// - [`ChecksumError::LengthMismatch`] if the replacement line would not be
///   the same length as the original.
pub fn repair_entry(
    manifest: &Utf8Path,
    target_name: &str,
    new_digest: &str,
) -> Result<RepairedEntry> {
    let manifest_io = |source| ChecksumError::ManifestIo {
        path: manifest.to_owned(),
        source,
    };
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(manifest)
        .map_err(manifest_io)?;

    let (offset, original, old_digest) = locate_entry(&file, manifest, target_name)?;

    let terminator = line_terminator(&original);
    let mut replacement = format_entry(new_digest, target_name).into_bytes();
    replacement.extend_from_slice(terminator);
    if replacement.len() != original.len() {
        return Err(ChecksumError::LengthMismatch {
            target: target_name.to_owned(),
            expected: original.len(),
            actual: replacement.len(),
        });
    }

    file.seek(SeekFrom::Start(offset)).map_err(manifest_io)?;
    file.write_all(&replacement).map_err(manifest_io)?;
    file.flush().map_err(manifest_io)?;
    file.sync_data().map_err(manifest_io)?;

    Ok(RepairedEntry {
        referenced_name: target_name.to_owned(),
        old_digest,
        new_digest: new_digest.to_owned(),
        offset,
    })
}

/// Scan for the entry named `target_name`, returning the offset of its line,
/// the raw line bytes, and the recorded digest.
fn locate_entry(
    file: &File,
    manifest: &Utf8Path,
    target_name: &str,
) -> Result<(u64, Vec<u8>, String)> {
    let mut reader = BufReader::new(file);
    let mut offset: u64 = 0;
    let mut line_number = 0;
    let mut line = Vec::new();
    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .map_err(|source| ChecksumError::ManifestIo {
                path: manifest.to_owned(),
                source,
            })?;
        if read == 0 {
            return Err(ChecksumError::NoSuchEntry {
                target: target_name.to_owned(),
            });
        }
        line_number += 1;

        let entry = decode_line(&line, manifest, line_number)?;
        if entry.referenced_name == target_name {
            return Ok((offset, line, entry.digest.to_string()));
        }
        offset += read as u64;
    }
}

fn line_terminator(line: &[u8]) -> &'static [u8] {
    if line.ends_with(b"\r\n") {
        b"\r\n"
    } else if line.ends_with(b"\n") {
        b"\n"
    } else {
        b""
    }
}

/// Recompute the digest of `file_path` and rewrite its entry in `manifest`.
///
/// The entry is looked up by the basename of `file_path`, so only entries
/// naming a file beside the manifest can be updated. When `file_path` lies
/// in a subdirectory of the package the lookup misses and a warning says
/// why.
///
/// # Errors
///
/// Returns [`ChecksumError::MissingReferencedFile`] if the file cannot be
/// hashed, plus every error of [`repair_entry`].
pub fn update_checksum(manifest: &Utf8Path, file_path: &Utf8Path) -> Result<RepairedEntry> {
    let Some(target_name) = file_path.file_name() else {
        return Err(ChecksumError::NoSuchEntry {
            target: file_path.to_string(),
        });
    };
    let digest =
        compute_md5(file_path).map_err(|source| ChecksumError::MissingReferencedFile {
            path: file_path.to_owned(),
            source,
        })?;
    let repaired = repair_entry(manifest, target_name, digest.as_str()).inspect_err(|err| {
        if let (ChecksumError::NoSuchEntry { .. }, Some(listed)) =
            (err, nested_entry_name(manifest, file_path))
        {
            warn!(
                "{listed} is listed below a subdirectory of {manifest}; \
                 only entries for files beside the manifest can be updated"
            );
        }
    })?;
    info!("Updated the checksum value for {target_name} in {manifest}");
    debug!("{target_name}: {} -> {}", repaired.old_digest, repaired.new_digest);
    Ok(repaired)
}

/// The manifest-relative name of `file_path` when it has more than one
/// component.
fn nested_entry_name<'a>(manifest: &Utf8Path, file_path: &'a Utf8Path) -> Option<&'a Utf8Path> {
    let relative = file_path.strip_prefix(manifest.parent()?).ok()?;
    (relative.components().count() > 1).then_some(relative)
}

/// Result of one repair attempt.
#[derive(Debug)]
pub struct RepairOutcome {
    /// The mismatch that was repaired.
    pub mismatch: Mismatch,
    /// The rewritten entry, or why the repair failed.
    pub result: Result<RepairedEntry>,
}

/// Results of a batch repair followed by re-verification.
#[derive(Debug, Default)]
pub struct RepairSummary {
    /// One outcome per requested repair, in request order.
    pub outcomes: Vec<RepairOutcome>,
    /// Files still stale after the batch, per touched manifest.
    pub still_stale: Vec<Mismatch>,
    /// Manifests that could not be re-verified.
    pub verify_errors: Vec<(Utf8PathBuf, ChecksumError)>,
}

impl RepairSummary {
    /// Number of entries rewritten successfully.
    #[must_use]
    pub fn repaired(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Number of repairs that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.repaired()
    }

    /// Returns true if every repair succeeded and re-verification found the
    /// touched manifests consistent.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed() == 0 && self.still_stale.is_empty() && self.verify_errors.is_empty()
    }
}

/// Repair every mismatch, then re-verify each touched manifest.
///
/// Each repair is independent: a failure is recorded and the batch moves on
/// to the next mismatch.
pub fn repair_all(mismatches: &[Mismatch]) -> RepairSummary {
    let mut summary = RepairSummary::default();
    for mismatch in mismatches {
        let result = update_checksum(&mismatch.manifest_path, &mismatch.file_path);
        if let Err(err) = &result {
            error!("Failed to update {}: {}", mismatch.file_path, describe(err));
        }
        summary.outcomes.push(RepairOutcome {
            mismatch: mismatch.clone(),
            result,
        });
    }

    let touched: BTreeSet<&Utf8Path> = mismatches
        .iter()
        .map(|m| m.manifest_path.as_path())
        .collect();
    for manifest in touched {
        verify_manifest(manifest, &mut summary);
    }
    summary
}

fn verify_manifest(manifest: &Utf8Path, summary: &mut RepairSummary) {
    debug!("Re-verifying {manifest}");
    let scan = find_failing_checksums_beside(manifest)
        .and_then(|failing| failing.collect::<Result<Vec<_>>>());
    match scan {
        Ok(files) => summary
            .still_stale
            .extend(files.into_iter().map(|file_path| Mismatch {
                manifest_path: manifest.to_owned(),
                file_path,
            })),
        Err(err) => summary.verify_errors.push((manifest.to_owned(), err)),
    }
}
