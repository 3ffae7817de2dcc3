//! A resolved connection to the remote object.
//!
//! [`Session`] pairs a [`Bus`] with the interface descriptor obtained through
//! introspection, so that every later call and wait is checked against what
//! the remote object actually publishes.

use std::pin::pin;

use tracing::{debug, warn};

use crate::bus::{Bus, Target};
use crate::descriptor::InterfaceDescriptor;
use crate::error::EngineError;
use crate::invoker::{self, prepare};
use crate::resolver::resolve;
use crate::value::Value;
use crate::waiter::{self, SignalSet, WaitOutcome, WaitTimeout};

/// Result of a method call that may also have waited for a signal.
#[derive(Debug)]
pub struct CallReport {
    /// Reply body of the method call.
    pub reply: Vec<Value>,
    /// Outcome of the concurrent wait, when one was requested.
    pub wait: Option<Result<WaitOutcome, EngineError>>,
}

/// Bus connection bound to a resolved interface.
pub struct Session<B> {
    bus: B,
    target: Target,
    descriptor: InterfaceDescriptor,
}

impl<B: Bus> Session<B> {
    /// Introspects `target` and binds the resulting interface descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Connection`] or
    /// [`EngineError::InterfaceNotFound`] from resolution.
    pub async fn open(bus: B, target: Target) -> Result<Self, EngineError> {
        let descriptor = resolve(&bus, &target).await?;
        Ok(Self {
            bus,
            target,
            descriptor,
        })
    }

    /// Descriptor of the resolved interface.
    #[must_use]
    pub const fn descriptor(&self) -> &InterfaceDescriptor {
        &self.descriptor
    }

    /// Calls `method` with string arguments coerced to its declared types.
    ///
    /// # Errors
    ///
    /// See [`invoker::invoke`].
    pub async fn invoke<S: AsRef<str>>(
        &self,
        method: &str,
        raw_args: &[S],
    ) -> Result<Vec<Value>, EngineError> {
        invoker::invoke(&self.bus, &self.target, &self.descriptor, method, raw_args).await
    }

    /// Waits for the first of `signals`.
    ///
    /// # Errors
    ///
    /// See [`waiter::wait`].
    pub async fn wait(
        &self,
        signals: SignalSet,
        timeout: WaitTimeout,
    ) -> Result<WaitOutcome, EngineError> {
        waiter::wait(&self.bus, &self.target, &self.descriptor, signals, timeout).await
    }

    /// Calls `method` while waiting for any of `signals`.
    ///
    /// Arguments and signal names are validated and the subscription is
    /// registered before the call goes out, so signals the call emits are
    /// observed. A failed call abandons the wait. A finished wait still lets
    /// the call complete, and a failed wait does not hide the reply.
    ///
    /// # Errors
    ///
    /// Fails with resolution, validation and subscription errors before any
    /// call is made, or with [`EngineError::RemoteCallFailed`]. Wait failures
    /// are reported through [`CallReport::wait`].
    pub async fn invoke_and_wait<S: AsRef<str>>(
        &self,
        method: &str,
        raw_args: &[S],
        signals: SignalSet,
        timeout: WaitTimeout,
    ) -> Result<CallReport, EngineError> {
        if signals.is_empty() {
            let reply = self.invoke(method, raw_args).await?;
            return Ok(CallReport { reply, wait: None });
        }
        let prepared = prepare(&self.descriptor, method, raw_args)?;

        let armed = waiter::arm(&self.bus, &self.target, &self.descriptor, signals).await?;
        let mut call = pin!(invoker::call(&self.bus, &self.target, prepared));
        let mut wait = pin!(armed.wait(timeout));

        tokio::select! {
            replied = &mut call => {
                let reply = replied?;
                debug!(method, "call returned, waiting for signal");
                let outcome = wait.await;
                Ok(CallReport { reply, wait: Some(outcome) })
            }
            waited = &mut wait => {
                if let Err(error) = &waited {
                    warn!(method, %error, "signal wait ended before the call returned");
                }
                let reply = call.await?;
                Ok(CallReport { reply, wait: Some(waited) })
            }
        }
    }
}
