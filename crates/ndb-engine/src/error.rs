//! Failure kinds surfaced by the engine.

use std::fmt;

use thiserror::Error;

use crate::bus::BusError;
use crate::value::CoercionError;
use crate::waiter::WaitTimeout;

/// Errors produced while resolving, invoking or waiting.
///
/// Every variant is terminal for the operation that produced it; the engine
/// never retries.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The bus could not be reached or the introspection query failed.
    #[error("failed to reach the bus: {source}")]
    Connection {
        /// Transport failure.
        #[source]
        source: BusError,
    },
    /// The target object does not publish the expected interface.
    #[error("{interface} not in list of available interfaces")]
    InterfaceNotFound {
        /// Interface that was looked up.
        interface: String,
    },
    /// No method matches the requested name and argument count.
    #[error("method '{method}' taking {arity} argument(s) not found")]
    MethodNotFound {
        /// Requested method.
        method: String,
        /// Number of arguments supplied.
        arity: usize,
    },
    /// A requested signal is not published by the interface.
    #[error("signal '{signal}' not found")]
    SignalNotFound {
        /// First unknown signal name.
        signal: String,
    },
    /// A method matched by name and arity but its arguments did not coerce.
    #[error("invalid arguments for '{method}': {}", Failures(.failures))]
    InvalidArguments {
        /// Requested method.
        method: String,
        /// Every rejected token, grouped by candidate in introspection order.
        failures: Vec<CoercionError>,
    },
    /// Introspection declared a parameter type the engine cannot coerce.
    #[error("method '{method}' declares unsupported parameter type '{tag}'")]
    UnsupportedType {
        /// Requested method.
        method: String,
        /// Offending signature tag.
        tag: String,
    },
    /// The remote method returned a bus error.
    #[error("error calling {method}: {source}")]
    RemoteCallFailed {
        /// Called method.
        method: String,
        /// Error reported by the bus.
        #[source]
        source: BusError,
    },
    /// The signal subscription failed or ended before a match arrived.
    #[error("signal subscription failed: {reason}")]
    Subscription {
        /// Description of the failure.
        reason: String,
    },
    /// No matching signal arrived in time.
    #[error("timeout after {timeout}")]
    Timeout {
        /// Configured wait duration.
        timeout: WaitTimeout,
    },
}

struct Failures<'a>(&'a [CoercionError]);

impl fmt::Display for Failures<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, failure) in self.0.iter().enumerate() {
            if index > 0 {
                formatter.write_str("; ")?;
            }
            write!(formatter, "{failure}")?;
        }
        Ok(())
    }
}
