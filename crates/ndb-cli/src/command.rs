//! Command modelling for CLI requests.
//!
//! Parsed arguments are validated and turned into engine types here so the
//! runtime only orchestrates IO.

use ndb_engine::{SignalSet, WaitTimeout};

use crate::AppError;
use crate::cli::{Cli, CliCommand};

#[derive(Debug, PartialEq)]
pub(crate) enum CommandInvocation {
    Method {
        name: String,
        arguments: Vec<String>,
        signals: SignalSet,
        timeout: WaitTimeout,
    },
    Signal {
        signals: SignalSet,
        timeout: WaitTimeout,
    },
    Api,
}

impl TryFrom<Cli> for CommandInvocation {
    type Error = AppError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        match cli.command {
            CliCommand::Method {
                name,
                arguments,
                signals,
                signal_timeout,
            } => {
                let method = name.trim();
                if method.is_empty() {
                    return Err(AppError::MissingMethod);
                }
                Ok(Self::Method {
                    name: method.to_owned(),
                    arguments,
                    signals: signal_set(signals)?,
                    timeout: WaitTimeout::from_secs(signal_timeout),
                })
            }
            CliCommand::Signal { names, timeout } => {
                let signals = signal_set(names)?;
                if signals.is_empty() {
                    return Err(AppError::MissingSignal);
                }
                Ok(Self::Signal {
                    signals,
                    timeout: WaitTimeout::from_secs(timeout),
                })
            }
            CliCommand::Api => Ok(Self::Api),
        }
    }
}

fn signal_set(names: Vec<String>) -> Result<SignalSet, AppError> {
    names
        .into_iter()
        .map(|raw| {
            let name = raw.trim();
            if name.is_empty() {
                Err(AppError::MissingSignal)
            } else {
                Ok(name.to_owned())
            }
        })
        .collect()
}
