//! Waiting for any one of a set of named signals.
//!
//! A wait is split into two phases. [`arm`] validates the requested names and
//! registers the bus subscription; [`ArmedWait::wait`] then races incoming
//! notifications against the configured timeout. Arming before anything else
//! happens lets a caller issue a method call knowing that signals emitted as
//! its side effect are already being captured.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::bus::{Bus, Subscription, Target};
use crate::descriptor::InterfaceDescriptor;
use crate::error::EngineError;
use crate::value::Value;

/// Unique set of signal names a wait resolves on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalSet(BTreeSet<String>);

impl SignalSet {
    /// Returns true when `name` is a member of the set.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Returns true when the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Names in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for SignalSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Upper bound on how long a wait may take.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaitTimeout(Option<Duration>);

impl WaitTimeout {
    /// Never time out.
    pub const NEVER: Self = Self(None);

    /// Builds a timeout from whole seconds; zero means wait indefinitely.
    #[must_use]
    pub const fn from_secs(seconds: u64) -> Self {
        if seconds == 0 {
            Self::NEVER
        } else {
            Self(Some(Duration::from_secs(seconds)))
        }
    }

    /// Configured duration, `None` for an unbounded wait.
    #[must_use]
    pub const fn duration(self) -> Option<Duration> {
        self.0
    }
}

impl fmt::Display for WaitTimeout {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(duration) = self.0 else {
            return formatter.write_str("no timeout");
        };
        write!(formatter, "{}s", duration.as_secs())
    }
}

/// The signal that ended a wait.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaitOutcome {
    /// Short name of the matched signal.
    pub signal: String,
    /// Signal body in the order received.
    pub values: Vec<Value>,
}

/// Checks that every requested name is published by the interface.
///
/// # Errors
///
/// Returns [`EngineError::SignalNotFound`] naming the first unknown signal.
pub fn validate_signals(
    descriptor: &InterfaceDescriptor,
    signals: &SignalSet,
) -> Result<(), EngineError> {
    signals
        .iter()
        .find(|name| !descriptor.has_signal(name))
        .map_or(Ok(()), |missing| {
            Err(EngineError::SignalNotFound {
                signal: missing.to_owned(),
            })
        })
}

/// A validated wait whose subscription is already live.
pub struct ArmedWait<S> {
    subscription: S,
    signals: SignalSet,
}

/// Validates `signals` and subscribes to the target's notifications.
///
/// No subscription is attempted when validation fails.
///
/// # Errors
///
/// Returns [`EngineError::SignalNotFound`] for unknown names and
/// [`EngineError::Subscription`] when the bus rejects the subscription.
pub async fn arm<B: Bus>(
    bus: &B,
    target: &Target,
    descriptor: &InterfaceDescriptor,
    signals: SignalSet,
) -> Result<ArmedWait<B::Subscription>, EngineError> {
    validate_signals(descriptor, &signals)?;
    let subscription = bus
        .subscribe(target)
        .await
        .map_err(|error| EngineError::Subscription {
            reason: error.to_string(),
        })?;
    debug!(
        path = %target.path,
        interface = %target.interface,
        signals = signals.len(),
        "subscribed to signals"
    );
    Ok(ArmedWait {
        subscription,
        signals,
    })
}

impl<S: Subscription> ArmedWait<S> {
    /// Resolves with the first matching signal or fails once `timeout`
    /// elapses. The subscription is released when this returns.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Timeout`] when no match arrives in time and
    /// [`EngineError::Subscription`] when the notification stream fails or
    /// ends.
    pub async fn wait(self, timeout: WaitTimeout) -> Result<WaitOutcome, EngineError> {
        let Self {
            mut subscription,
            signals,
        } = self;
        let matched = next_match(&mut subscription, &signals);
        match timeout.duration() {
            Some(duration) => tokio::time::timeout(duration, matched)
                .await
                .map_err(|_| EngineError::Timeout { timeout })?,
            None => matched.await,
        }
    }
}

async fn next_match<S: Subscription>(
    subscription: &mut S,
    signals: &SignalSet,
) -> Result<WaitOutcome, EngineError> {
    loop {
        let notification = match subscription.next().await {
            Some(Ok(notification)) => notification,
            Some(Err(error)) => {
                return Err(EngineError::Subscription {
                    reason: error.to_string(),
                });
            }
            None => {
                return Err(EngineError::Subscription {
                    reason: String::from("notification stream closed"),
                });
            }
        };
        let name = notification.short_name();
        if signals.contains(name) {
            return Ok(WaitOutcome {
                signal: name.to_owned(),
                values: notification.values,
            });
        }
        debug!(signal = %notification.member, "discarding unrequested signal");
    }
}

/// Subscribes, then waits for the first matching signal.
///
/// # Errors
///
/// See [`arm`] and [`ArmedWait::wait`].
pub async fn wait<B: Bus>(
    bus: &B,
    target: &Target,
    descriptor: &InterfaceDescriptor,
    signals: SignalSet,
    timeout: WaitTimeout,
) -> Result<WaitOutcome, EngineError> {
    arm(bus, target, descriptor, signals)
        .await?
        .wait(timeout)
        .await
}
