//! Command-line runtime for the `NickelDBus` bridge.
//!
//! The module owns argument parsing, configuration bootstrapping, telemetry
//! and result rendering. The bus connection is obtained through a
//! [`Connector`](transport::Connector) so the runtime can be exercised from
//! tests with an in-memory bus in place of `zbus`.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use ndb_config::Config;
use ndb_engine::{EngineError, Session, Target};
use tracing::debug;

mod cli;
mod command;
mod config;
mod errors;
mod output;
mod telemetry;
mod transport;

use cli::Cli;
use command::CommandInvocation;
use config::{ConfigLoader, OrthoConfigLoader, command_arguments, split_config_arguments};
pub(crate) use errors::AppError;
use output::OutputFormat;
use transport::{Connector, ZbusConnector};

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

impl<'a, W: Write, E: Write> IoStreams<'a, W, E> {
    pub(crate) const fn new(stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self { stdout, stderr }
    }
}

struct CliRunner<'a, W: Write, E: Write, L: ConfigLoader, C: Connector> {
    io: IoStreams<'a, W, E>,
    loader: &'a L,
    connector: &'a C,
}

impl<W, E, L, C> CliRunner<'_, W, E, L, C>
where
    W: Write,
    E: Write,
    L: ConfigLoader,
    C: Connector,
{
    fn run<I>(&mut self, args: I) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
    {
        let arguments: Vec<OsString> = args.into_iter().collect();
        let split = split_config_arguments(&arguments);

        let cli = match Cli::try_parse_from(command_arguments(&arguments, &split)) {
            Ok(cli) => cli,
            // Help and version requests are successful output.
            Err(error) if !error.use_stderr() => {
                let _ = write!(self.io.stdout, "{error}");
                return ExitCode::SUCCESS;
            }
            Err(error) => return self.fail(&AppError::CliUsage(error)),
        };

        self.execute(cli, &split.config_arguments)
            .map_or_else(|error| self.fail(&error), |()| ExitCode::SUCCESS)
    }

    fn execute(&mut self, cli: Cli, config_arguments: &[OsString]) -> Result<(), AppError> {
        let config = self.loader.load(config_arguments)?;
        telemetry::initialise(&config)?;
        let format = cli.output;
        let invocation = CommandInvocation::try_from(cli)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(AppError::Runtime)?;
        runtime.block_on(dispatch(
            self.connector,
            &config,
            invocation,
            format,
            &mut *self.io.stdout,
        ))
    }

    fn fail(&mut self, error: &AppError) -> ExitCode {
        debug!(%error, "command failed");
        if let Err(flush_error) = self.io.stdout.flush() {
            debug!(%flush_error, "failed to flush stdout");
        }
        let _ = writeln!(self.io.stderr, "{error}");
        ExitCode::FAILURE
    }
}

async fn dispatch<C, W>(
    connector: &C,
    config: &Config,
    invocation: CommandInvocation,
    format: OutputFormat,
    stdout: &mut W,
) -> Result<(), AppError>
where
    C: Connector,
    W: Write,
{
    let bus = connector
        .connect(config.bus())
        .await
        .map_err(|source| EngineError::Connection { source })?;
    let session = Session::open(bus, Target::default()).await?;

    match invocation {
        CommandInvocation::Api => output::write_api(stdout, format, session.descriptor()),
        CommandInvocation::Signal { signals, timeout } => {
            let outcome = session.wait(signals, timeout).await?;
            output::write_outcome(stdout, format, &outcome)
        }
        CommandInvocation::Method {
            name,
            arguments,
            signals,
            timeout,
        } => {
            let report = session
                .invoke_and_wait(&name, &arguments, signals, timeout)
                .await?;
            output::write_reply(stdout, format, &report.reply)?;
            match report.wait {
                Some(Ok(outcome)) => output::write_outcome(stdout, format, &outcome),
                Some(Err(error)) => Err(AppError::SignalAfterCall(error)),
                None => Ok(()),
            }
        }
    }
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with(
        args,
        IoStreams::new(stdout, stderr),
        &OrthoConfigLoader,
        &ZbusConnector,
    )
}

/// Runs the CLI with a custom configuration loader and bus connector.
pub(crate) fn run_with<I, W, E, L, C>(
    args: I,
    io: IoStreams<'_, W, E>,
    loader: &L,
    connector: &C,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
    C: Connector,
{
    CliRunner {
        io,
        loader,
        connector,
    }
    .run(args)
}

#[cfg(test)]
mod tests;
