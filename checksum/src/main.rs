//! `udhtchecksum` CLI entrypoint.
//!
//! Scans every package below the given path, lists files whose content no
//! longer matches `checksum.md5`, and after confirmation rewrites the stale
//! manifest entries.

use clap::Parser;
use hathi_checksum::cli::{Cli, RunConfig};
use hathi_checksum::confirm::{AssumeYes, Confirm, TerminalPrompt};
use hathi_checksum::detector::describe;
use hathi_checksum::error::Result;
use hathi_checksum::logging::{build_dispatch, open_log_file};
use hathi_checksum::run::{RunOutcome, run};
use hathi_checksum::walker::DirectoryWalker;
use std::io::{self, Write};
use tracing::Dispatch;

fn main() {
    let cli = Cli::parse();
    let config = RunConfig::from(&cli);
    let mut stderr = io::stderr();

    let exit_code = match build_logging(&config) {
        Ok(dispatch) => {
            let result = run_with_confirmation(&config, &dispatch);
            exit_code_for_run_result(result, &mut stderr)
        }
        Err(err) => exit_code_for_run_result(Err(err), &mut stderr),
    };
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn build_logging(config: &RunConfig) -> Result<Dispatch> {
    let log_file = config.log_file.as_deref().map(open_log_file).transpose()?;
    Ok(build_dispatch(config.log, io::stdout, log_file))
}

fn run_with_confirmation(config: &RunConfig, dispatch: &Dispatch) -> Result<RunOutcome> {
    let mut confirm: Box<dyn Confirm> = if config.assume_yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalPrompt::stdio())
    };
    run(config, &DirectoryWalker, confirm.as_mut(), dispatch)
}

fn exit_code_for_run_result(result: Result<RunOutcome>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            write_stderr_line(stderr, describe(&err));
            1
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}
