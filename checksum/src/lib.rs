//! HathiTrust package checksum verification and repair.
//!
//! Each package directory carries a `checksum.md5` manifest listing the MD5
//! digest of every file in the package. This crate finds packages whose files
//! no longer match their manifest and, once the operator agrees, rewrites the
//! stale manifest lines in place without disturbing any other byte of the
//! file. It backs the `udhtchecksum` binary and can be driven
//! programmatically.
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions and run configuration
//! - [`confirm`] - Operator yes/no/quit confirmation
//! - [`detector`] - Mismatch detection for one manifest or a whole tree
//! - [`digest`] - Streaming MD5 computation
//! - [`error`] - Error types
//! - [`logging`] - Scoped `tracing` dispatcher for console and file output
//! - [`manifest`] - `checksum.md5` line parsing
//! - [`md5_digest`] - Validated MD5 digest newtype
//! - [`repair`] - In-place, length-preserving manifest repair
//! - [`report`] - Human-readable summaries
//! - [`run`] - Top-level verify, confirm, repair flow
//! - [`walker`] - Package discovery

pub mod cli;
pub mod confirm;
pub mod detector;
pub mod digest;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod md5_digest;
pub mod repair;
pub mod report;
pub mod run;
pub mod walker;
