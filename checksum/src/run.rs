//! Top-level verify, confirm, repair flow.
//!
//! Every collaborator is passed in: the walker that finds packages, the
//! confirmation capability, and the `tracing` dispatcher. The dispatcher is
//! the default only while [`run`] executes. The binary wires the real ones;
//! tests substitute fixed packages, scripted answers, and a log capture.

use crate::cli::RunConfig;
use crate::confirm::{Answer, Confirm};
use crate::detector::get_outdated_files;
use crate::error::{ChecksumError, Result};
use crate::repair::{RepairSummary, repair_all};
use crate::report::{create_message_list, format_repair_summary};
use crate::walker::PackageWalker;
use tracing::{Dispatch, error, info, warn};

/// Question put to the operator before any manifest is rewritten.
pub const UPDATE_QUESTION: &str = "Do you wish to update the checksum.md5 files?";

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every scanned package matched its manifest.
    UpToDate,
    /// The operator answered no.
    Declined,
    /// The operator quit at the prompt.
    Aborted,
    /// Repairs were attempted.
    Repaired(RepairSummary),
}

impl RunOutcome {
    /// Process exit code for this outcome.
    ///
    /// Only a repair batch with failures or leftover mismatches is non-zero.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UpToDate | Self::Declined | Self::Aborted => 0,
            Self::Repaired(summary) if summary.is_clean() => 0,
            Self::Repaired(_) => 1,
        }
    }
}

/// Scan the packages under `config.root`, ask before repairing, and repair.
///
/// # Errors
///
/// Returns an error if package discovery fails, if a package fails under
/// the abort policy, or if the operator's answer cannot be read. Individual
/// repair failures are reported in the returned [`RepairSummary`] instead.
pub fn run(
    config: &RunConfig,
    walker: &dyn PackageWalker,
    confirm: &mut dyn Confirm,
    dispatch: &Dispatch,
) -> Result<RunOutcome> {
    tracing::dispatcher::with_default(dispatch, || verify_and_repair(config, walker, confirm))
}

fn verify_and_repair(
    config: &RunConfig,
    walker: &dyn PackageWalker,
    confirm: &mut dyn Confirm,
) -> Result<RunOutcome> {
    let report = get_outdated_files(&config.root, walker, config.failure_policy)?;

    if !report.skipped.is_empty() {
        warn!("{} package(s) could not be verified", report.skipped.len());
    }

    if report.is_up_to_date() {
        info!("All files are up to date");
        return Ok(RunOutcome::UpToDate);
    }

    info!("Found the following files out of date checksums:");
    for mismatch in &report.mismatches {
        info!("{}", mismatch.file_path);
    }

    let intro = format!(
        "The following files have been changed.\n{}",
        create_message_list(&report.mismatches)
    );
    let answer = confirm
        .ask(Some(&intro), UPDATE_QUESTION)
        .map_err(|source| ChecksumError::Prompt { source })?;

    match answer {
        Answer::No => {
            info!("No checksums were updated.");
            Ok(RunOutcome::Declined)
        }
        Answer::Abort => {
            info!("Aborted by user.");
            Ok(RunOutcome::Aborted)
        }
        Answer::Yes => {
            info!("Updating checksums");
            let summary = repair_all(&report.mismatches);
            let text = format_repair_summary(&summary);
            if summary.is_clean() {
                info!("{text}");
            } else {
                error!("{text}");
            }
            Ok(RunOutcome::Repaired(summary))
        }
    }
}
