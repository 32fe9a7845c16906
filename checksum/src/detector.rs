//! Detection of files whose content no longer matches their manifest entry.
//!
//! Detection is lazy: [`find_failing_checksums`] hashes one referenced file
//! per call to `next`, so a caller that stops early never touches the rest
//! of the package. A missing referenced file is reported as
//! [`ChecksumError::MissingReferencedFile`], never as a mismatch.

use crate::digest::compute_md5;
use crate::error::{ChecksumError, Result};
use crate::manifest::{ManifestEntries, manifest_path};
use crate::walker::PackageWalker;
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;
use tracing::{debug, info, warn};

/// A stale file and the manifest whose entry it contradicts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mismatch {
    /// Manifest holding the stale entry.
    pub manifest_path: Utf8PathBuf,
    /// File whose content no longer matches.
    pub file_path: Utf8PathBuf,
}

/// What to do when a package cannot be verified at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PackageFailurePolicy {
    /// Stop the whole scan at the first package that fails.
    #[default]
    Abort,
    /// Warn, remember the package, and carry on with the next one.
    SkipPackage,
}

impl fmt::Display for PackageFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => write!(f, "abort the scan"),
            Self::SkipPackage => write!(f, "skip the package"),
        }
    }
}

/// A package left out of the scan and the reason.
#[derive(Debug)]
pub struct SkippedPackage {
    /// Package directory.
    pub package: Utf8PathBuf,
    /// The failure that stopped verification.
    pub error: ChecksumError,
}

/// Outcome of scanning every package under a root.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Every mismatch found, in walker order then manifest order.
    pub mismatches: Vec<Mismatch>,
    /// Packages that could not be verified under [`PackageFailurePolicy::SkipPackage`].
    pub skipped: Vec<SkippedPackage>,
}

impl ScanReport {
    /// Returns true when every scanned package is consistent.
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Lazy iterator over the stale files listed in one manifest.
#[derive(Debug)]
pub struct FailingChecksums {
    entries: ManifestEntries,
    base_dir: Utf8PathBuf,
}

impl Iterator for FailingChecksums {
    type Item = Result<Utf8PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(err) => return Some(Err(err)),
            };
            debug!("Calculating the md5 checksum hash for {}", entry.referenced_name);
            let file_path = self.base_dir.join(&entry.referenced_name);
            let actual = match compute_md5(&file_path) {
                Ok(digest) => digest,
                Err(source) => {
                    return Some(Err(ChecksumError::MissingReferencedFile {
                        path: file_path,
                        source,
                    }));
                }
            };
            if actual != entry.digest {
                return Some(Ok(file_path));
            }
        }
    }
}

/// Yield every file listed in `manifest` whose content digest differs from
/// the recorded one. Referenced names are resolved against `base_dir`.
///
/// # Errors
///
/// Fails immediately if the manifest cannot be opened; decode and hashing
/// errors are yielded by the iterator.
pub fn find_failing_checksums(
    manifest: &Utf8Path,
    base_dir: &Utf8Path,
) -> Result<FailingChecksums> {
    Ok(FailingChecksums {
        entries: ManifestEntries::open(manifest)?,
        base_dir: base_dir.to_owned(),
    })
}

/// [`find_failing_checksums`] with names resolved beside the manifest.
///
/// # Errors
///
/// Fails immediately if the manifest cannot be opened.
pub fn find_failing_checksums_beside(manifest: &Utf8Path) -> Result<FailingChecksums> {
    let base_dir = manifest.parent().unwrap_or_else(|| Utf8Path::new(""));
    find_failing_checksums(manifest, base_dir)
}

/// Yield a [`Mismatch`] for every stale file in the package at `package_dir`.
///
/// # Errors
///
/// Fails immediately if the package manifest cannot be opened.
pub fn find_checksum_mismatch(
    package_dir: &Utf8Path,
) -> Result<impl Iterator<Item = Result<Mismatch>> + use<>> {
    let manifest = manifest_path(package_dir);
    info!("Validating checksums in {manifest}");
    let failing = find_failing_checksums(&manifest, package_dir)?;
    Ok(failing.map(move |file| {
        file.map(|file_path| Mismatch {
            manifest_path: manifest.clone(),
            file_path,
        })
    }))
}

/// Returns true if at least one entry of the package is stale.
///
/// # Errors
///
/// Returns the first decode or hashing error met before a mismatch.
pub fn is_out_of_date(package_dir: &Utf8Path) -> Result<bool> {
    let manifest = manifest_path(package_dir);
    match find_failing_checksums(&manifest, package_dir)?.next() {
        Some(Ok(_)) => Ok(true),
        Some(Err(err)) => Err(err),
        None => Ok(false),
    }
}

/// Scan every package under `root` and collect all mismatches.
///
/// # Errors
///
/// Returns an error if the walker fails, or, under
/// [`PackageFailurePolicy::Abort`], the first package failure.
pub fn get_outdated_files(
    root: &Utf8Path,
    walker: &dyn PackageWalker,
    policy: PackageFailurePolicy,
) -> Result<ScanReport> {
    let mut report = ScanReport::default();
    for package in walker.packages(root)? {
        match scan_package(&package) {
            Ok(found) => report.mismatches.extend(found),
            Err(error) => match policy {
                PackageFailurePolicy::Abort => return Err(error),
                PackageFailurePolicy::SkipPackage => {
                    warn!("Skipping {package}: {}", describe(&error));
                    report.skipped.push(SkippedPackage { package, error });
                }
            },
        }
    }
    Ok(report)
}

fn scan_package(package: &Utf8Path) -> Result<Vec<Mismatch>> {
    find_checksum_mismatch(package)?.collect()
}

/// Render an error together with its source chain on one line.
#[must_use]
pub fn describe(error: &dyn std::error::Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
