//! Transport boundary between the engine and a concrete message bus.
//!
//! The engine never speaks a wire protocol itself. A [`Bus`] implementation
//! provides introspection, method calls and signal subscriptions for the
//! remote object identified by a [`Target`].

use std::error::Error as StdError;

use thiserror::Error;

use crate::descriptor::InterfaceDescriptor;
use crate::value::Value;

/// Well-known bus name of the remote service.
pub const SERVICE_NAME: &str = "com.github.shermp.nickeldbus";
/// Object path of the remote object.
pub const OBJECT_PATH: &str = "/nickeldbus";
/// Interface exposing the remote object's methods and signals.
pub const INTERFACE_NAME: &str = "com.github.shermp.nickeldbus";

/// Identity of the remote object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Bus name owning the object.
    pub service: String,
    /// Object path.
    pub path: String,
    /// Interface of interest on the object.
    pub interface: String,
}

impl Default for Target {
    fn default() -> Self {
        Self {
            service: SERVICE_NAME.to_owned(),
            path: OBJECT_PATH.to_owned(),
            interface: INTERFACE_NAME.to_owned(),
        }
    }
}

/// A signal delivered by the bus.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Member name, optionally qualified with its interface.
    pub member: String,
    /// Signal body.
    pub values: Vec<Value>,
}

impl Notification {
    /// Creates a notification.
    #[must_use]
    pub fn new(member: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            member: member.into(),
            values,
        }
    }

    /// Member name with any namespace qualification removed.
    #[must_use]
    pub fn short_name(&self) -> &str {
        short_name(&self.member)
    }
}

/// Returns the component after the last `.` of a qualified name.
#[must_use]
pub fn short_name(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(_, short)| short)
}

/// Error reported by a bus implementation.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct BusError(Box<dyn StdError + Send + Sync>);

impl BusError {
    /// Wraps a transport error or message.
    #[must_use]
    pub fn new(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self(source.into())
    }
}

/// Live signal subscription.
///
/// Dropping the subscription releases it on the bus.
#[expect(
    async_fn_in_trait,
    reason = "the engine drives subscriptions on a single task and never requires Send futures"
)]
pub trait Subscription {
    /// Waits for the next signal; `None` once the stream has ended.
    async fn next(&mut self) -> Option<Result<Notification, BusError>>;
}

/// Operations the engine requires from a bus connection.
///
/// Implementations are shared by reference between a method call and a
/// concurrent signal wait, so every operation takes `&self`.
#[expect(
    async_fn_in_trait,
    reason = "the engine drives bus futures on a single task and never requires Send futures"
)]
pub trait Bus {
    /// Subscription handle returned by [`Bus::subscribe`].
    type Subscription: Subscription;

    /// Introspects the target object, returning every interface it publishes.
    async fn introspect(&self, target: &Target) -> Result<Vec<InterfaceDescriptor>, BusError>;

    /// Calls `method` on the target interface and returns the reply body.
    async fn call(
        &self,
        target: &Target,
        method: &str,
        arguments: &[Value],
    ) -> Result<Vec<Value>, BusError>;

    /// Subscribes to every signal emitted by the target object on the target
    /// interface. The subscription is active once this future resolves.
    async fn subscribe(&self, target: &Target) -> Result<Self::Subscription, BusError>;
}
