//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use ndb_engine::EngineError;
use thiserror::Error;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("the method name must be provided")]
    MissingMethod,
    #[error("signal names must not be blank")]
    MissingSignal,
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to start the async runtime: {0}")]
    Runtime(io::Error),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("error waiting for signal after method call: {0}")]
    SignalAfterCall(EngineError),
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(serde_json::Error),
    #[error("failed to write output: {0}")]
    WriteOutput(io::Error),
}
