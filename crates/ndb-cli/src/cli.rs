//! CLI argument definitions.

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

/// Command-line bridge to the `NickelDBus` remote object.
#[derive(Parser, Debug)]
#[command(name = "ndb-cli", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Controls how results are rendered on stdout.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub(crate) output: OutputFormat,
    /// The operation to perform.
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Operations on the remote object.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Calls a method, optionally waiting for signals it triggers.
    Method {
        /// Name of the method to call.
        #[arg(value_name = "METHOD")]
        name: String,
        /// Method arguments, converted to the declared parameter types.
        #[arg(value_name = "ARG", allow_negative_numbers = true)]
        arguments: Vec<String>,
        /// Waits for this signal after calling the method. Repeatable.
        #[arg(long = "signal", value_name = "SIGNAL")]
        signals: Vec<String>,
        /// Seconds to wait for a signal; 0 waits indefinitely.
        #[arg(long = "signal-timeout", value_name = "SECONDS", default_value_t = 0)]
        signal_timeout: u64,
    },
    /// Waits for the first of one or more signals.
    Signal {
        /// Signals to wait for.
        #[arg(value_name = "SIGNAL", required = true)]
        names: Vec<String>,
        /// Seconds to wait; 0 waits indefinitely.
        #[arg(long, value_name = "SECONDS", default_value_t = 0)]
        timeout: u64,
    },
    /// Lists the methods and signals the remote object publishes.
    Api,
}
