//! Human-readable summaries of scan and repair results.

use crate::detector::{Mismatch, describe};
use crate::repair::RepairSummary;
use std::collections::BTreeMap;

/// Group changed files by manifest for the confirmation prompt.
///
/// Manifests are listed in path order, each followed by the basenames of its
/// changed files in scan order:
///
/// ```text
/// /root/pkg1/checksum.md5:
/// [00000001.jp2, 00000002.jp2]
/// ```
///
/// # Examples
///
/// ```
/// use camino::Utf8PathBuf;
/// use hathi_checksum::detector::Mismatch;
/// use hathi_checksum::report::create_message_list;
///
/// let mismatches = vec![Mismatch {
///     manifest_path: Utf8PathBuf::from("/pkg/checksum.md5"),
///     file_path: Utf8PathBuf::from("/pkg/a.txt"),
/// }];
/// assert_eq!(create_message_list(&mismatches), "/pkg/checksum.md5:\n[a.txt]");
/// ```
#[must_use]
pub fn create_message_list(mismatches: &[Mismatch]) -> String {
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for mismatch in mismatches {
        let name = mismatch
            .file_path
            .file_name()
            .unwrap_or(mismatch.file_path.as_str());
        grouped
            .entry(mismatch.manifest_path.as_str())
            .or_default()
            .push(name);
    }

    grouped
        .into_iter()
        .map(|(manifest, files)| format!("{manifest}:\n[{}]", files.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Describe a batch repair, one line per file plus any re-verification
/// findings.
#[must_use]
pub fn format_repair_summary(summary: &RepairSummary) -> String {
    let mut lines = vec![format!(
        "Updated {} of {} checksum(s)",
        summary.repaired(),
        summary.outcomes.len()
    )];

    for outcome in &summary.outcomes {
        let file = &outcome.mismatch.file_path;
        match &outcome.result {
            Ok(entry) => lines.push(format!(
                "  updated {file}: {} -> {}",
                entry.old_digest, entry.new_digest
            )),
            Err(err) => lines.push(format!("  FAILED {file}: {}", describe(err))),
        }
    }

    for stale in &summary.still_stale {
        lines.push(format!(
            "  still out of date after repair: {} (in {})",
            stale.file_path, stale.manifest_path
        ));
    }
    for (manifest, err) in &summary.verify_errors {
        lines.push(format!("  could not re-verify {manifest}: {}", describe(err)));
    }

    lines.join("\n")
}
