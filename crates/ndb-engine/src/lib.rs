//! Engine for driving the `NickelDBus` remote object over a message bus.
//!
//! The crate turns command-line style string tokens into typed bus calls. It
//! is split along the lines of what a caller does with the remote object:
//!
//! - [`value`] coerces string tokens to values of a single-character bus type.
//! - [`descriptor`] models the methods and signals an interface publishes.
//! - [`resolver`] finds the interface of interest through introspection.
//! - [`invoker`] selects an overload by arity and issues the call.
//! - [`waiter`] waits for the first of a set of signals, optionally bounded
//!   by a timeout.
//! - [`session`] ties the above together, including calling a method while a
//!   wait for its side-effect signals is already armed.
//!
//! The transport itself sits behind the [`Bus`] trait so the engine can be
//! exercised without a running bus daemon.

pub mod bus;
pub mod descriptor;
pub mod error;
pub mod invoker;
pub mod resolver;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod value;
pub mod waiter;

pub use bus::{
    Bus, BusError, INTERFACE_NAME, Notification, OBJECT_PATH, SERVICE_NAME, Subscription, Target,
    short_name,
};
pub use descriptor::{
    Direction, InterfaceDescriptor, MethodSignature, ParameterSpec, SignalSignature,
};
pub use error::EngineError;
pub use invoker::{PreparedCall, invoke, prepare};
pub use resolver::resolve;
pub use session::{CallReport, Session};
pub use value::{CoercionError, Value, WireType, coerce};
pub use waiter::{ArmedWait, SignalSet, WaitOutcome, WaitTimeout, arm, validate_signals, wait};
