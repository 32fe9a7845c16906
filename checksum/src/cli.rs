//! CLI argument definitions for `udhtchecksum`.
//!
//! Parsing lives here so the binary stays focused on orchestration; the
//! parsed [`Cli`] is turned into a [`RunConfig`] before anything runs.

use crate::detector::PackageFailurePolicy;
use crate::logging::LogSettings;
use camino::Utf8PathBuf;
use clap::Parser;

/// Verify and repair checksum.md5 manifests in HathiTrust packages.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "udhtchecksum")]
#[command(version, about)]
#[command(long_about = concat!(
    "Verify and repair checksum.md5 manifests in HathiTrust packages.\n\n",
    "Every directory below PATH that contains a checksum.md5 file is treated as ",
    "a package. Each file listed in the manifest is hashed and compared with the ",
    "recorded MD5 digest. When files have changed, the affected manifest lines ",
    "can be rewritten in place after confirmation.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Check a batch of packages and confirm before updating:\n",
    "    $ udhtchecksum D:\\hathi\\batch_095\n\n",
    "  Update without asking and keep a debug log:\n",
    "    $ udhtchecksum --yes --log-debug checksum.log /data/hathi\n",
))]
pub struct Cli {
    /// Path to the Hathi packages.
    #[arg(value_name = "PATH")]
    pub path: Utf8PathBuf,

    /// Run in debug mode.
    #[arg(long, help_heading = "Debug")]
    pub debug: bool,

    /// Save debug information to a file.
    #[arg(long, value_name = "FILE", help_heading = "Debug")]
    pub log_debug: Option<Utf8PathBuf>,

    /// Update out-of-date manifests without asking.
    #[arg(short, long)]
    pub yes: bool,

    /// Skip packages whose manifest is malformed or lists unreadable files
    /// instead of stopping.
    #[arg(long)]
    pub skip_invalid: bool,
}

/// Settings for one run, derived from [`Cli`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Root directory holding the packages.
    pub root: Utf8PathBuf,
    /// Console logging options.
    pub log: LogSettings,
    /// Optional debug log file.
    pub log_file: Option<Utf8PathBuf>,
    /// Repair without prompting.
    pub assume_yes: bool,
    /// What to do with packages that cannot be verified.
    pub failure_policy: PackageFailurePolicy,
}

impl From<&Cli> for RunConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            root: cli.path.clone(),
            log: LogSettings { debug: cli.debug },
            log_file: cli.log_debug.clone(),
            assume_yes: cli.yes,
            failure_policy: if cli.skip_invalid {
                PackageFailurePolicy::SkipPackage
            } else {
                PackageFailurePolicy::Abort
            },
        }
    }
}
