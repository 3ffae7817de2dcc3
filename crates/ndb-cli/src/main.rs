//! CLI entrypoint for the `NickelDBus` command-line bridge.
//!
//! The binary delegates to [`ndb_cli::run`], which loads configuration,
//! parses the sub-command, connects to the bus and prints the outcome.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    ndb_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
