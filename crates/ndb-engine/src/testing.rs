//! In-memory [`Bus`] used by unit and integration tests.
//!
//! The fake records every call and subscription, replays scripted signals
//! with virtual delays and can emit signals as the side effect of a method
//! call, before that call's reply is returned.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::bus::{Bus, BusError, Notification, Subscription, Target};
use crate::descriptor::{InterfaceDescriptor, MethodSignature, ParameterSpec, SignalSignature};
use crate::value::Value;

/// A method call observed by [`FakeBus`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Called member.
    pub method: String,
    /// Arguments in order.
    pub arguments: Vec<Value>,
}

#[derive(Default)]
struct FakeState {
    introspections: usize,
    calls: Vec<RecordedCall>,
    subscriptions: usize,
    active: usize,
    listeners: Vec<mpsc::UnboundedSender<Notification>>,
}

/// Scriptable in-memory bus.
///
/// Clones share recorded state, so a test can keep a handle while the
/// original is moved into a session.
#[derive(Clone, Default)]
pub struct FakeBus {
    interfaces: Vec<InterfaceDescriptor>,
    introspection_error: Option<String>,
    replies: HashMap<String, Vec<Value>>,
    call_errors: HashMap<String, String>,
    emitted_on_call: HashMap<String, Vec<Notification>>,
    reply_delay: Duration,
    scripted: Vec<(Duration, Notification)>,
    subscription_error: Option<String>,
    close_subscriptions: bool,
    state: Arc<Mutex<FakeState>>,
}

impl FakeBus {
    /// Creates a bus publishing `interfaces` on the target object.
    #[must_use]
    pub fn new(interfaces: Vec<InterfaceDescriptor>) -> Self {
        Self {
            interfaces,
            ..Self::default()
        }
    }

    /// Makes introspection fail with `message`.
    #[must_use]
    pub fn failing_introspection(mut self, message: &str) -> Self {
        self.introspection_error = Some(message.to_owned());
        self
    }

    /// Sets the reply body returned by `method`.
    #[must_use]
    pub fn with_reply(mut self, method: &str, values: Vec<Value>) -> Self {
        self.replies.insert(method.to_owned(), values);
        self
    }

    /// Makes calls to `method` fail with `message`.
    #[must_use]
    pub fn with_call_error(mut self, method: &str, message: &str) -> Self {
        self.call_errors
            .insert(method.to_owned(), message.to_owned());
        self
    }

    /// Emits a signal to every live subscription when `method` is called,
    /// before the reply is produced.
    #[must_use]
    pub fn emitting_on_call(mut self, method: &str, member: &str, values: Vec<Value>) -> Self {
        self.emitted_on_call
            .entry(method.to_owned())
            .or_default()
            .push(Notification::new(member, values));
        self
    }

    /// Delays every reply by `delay`.
    #[must_use]
    pub fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = delay;
        self
    }

    /// Queues a signal delivered `delay` after the previous one is read.
    #[must_use]
    pub fn with_notification(mut self, delay: Duration, member: &str, values: Vec<Value>) -> Self {
        self.scripted.push((delay, Notification::new(member, values)));
        self
    }

    /// Makes subscribing fail with `message`.
    #[must_use]
    pub fn failing_subscriptions(mut self, message: &str) -> Self {
        self.subscription_error = Some(message.to_owned());
        self
    }

    /// Ends every subscription stream once its scripted signals are read.
    #[must_use]
    pub fn closing_subscriptions(mut self) -> Self {
        self.close_subscriptions = true;
        self
    }

    /// Calls observed so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state().calls.clone()
    }

    /// Number of introspection queries issued.
    #[must_use]
    pub fn introspection_count(&self) -> usize {
        self.state().introspections
    }

    /// Number of subscriptions ever created.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.state().subscriptions
    }

    /// Number of subscriptions not yet dropped.
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        self.state().active
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        lock(&self.state)
    }
}

fn lock(state: &Mutex<FakeState>) -> MutexGuard<'_, FakeState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Bus for FakeBus {
    type Subscription = FakeSubscription;

    async fn introspect(&self, _target: &Target) -> Result<Vec<InterfaceDescriptor>, BusError> {
        self.state().introspections += 1;
        self.introspection_error.as_ref().map_or_else(
            || Ok(self.interfaces.clone()),
            |message| Err(BusError::new(message.clone())),
        )
    }

    async fn call(
        &self,
        _target: &Target,
        method: &str,
        arguments: &[Value],
    ) -> Result<Vec<Value>, BusError> {
        {
            let mut state = self.state();
            state.calls.push(RecordedCall {
                method: method.to_owned(),
                arguments: arguments.to_vec(),
            });
            let emitted = self.emitted_on_call.get(method).into_iter().flatten();
            for notification in emitted {
                state
                    .listeners
                    .retain(|listener| listener.send(notification.clone()).is_ok());
            }
        }
        if !self.reply_delay.is_zero() {
            tokio::time::sleep(self.reply_delay).await;
        }
        if let Some(message) = self.call_errors.get(method) {
            return Err(BusError::new(message.clone()));
        }
        Ok(self.replies.get(method).cloned().unwrap_or_default())
    }

    async fn subscribe(&self, _target: &Target) -> Result<FakeSubscription, BusError> {
        if let Some(message) = &self.subscription_error {
            return Err(BusError::new(message.clone()));
        }
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut state = self.state();
        state.subscriptions += 1;
        state.active += 1;
        state.listeners.push(sender);
        Ok(FakeSubscription {
            scripted: self.scripted.iter().cloned().collect(),
            live: receiver,
            close: self.close_subscriptions,
            state: Arc::clone(&self.state),
        })
    }
}

/// Subscription handed out by [`FakeBus`].
pub struct FakeSubscription {
    scripted: VecDeque<(Duration, Notification)>,
    live: mpsc::UnboundedReceiver<Notification>,
    close: bool,
    state: Arc<Mutex<FakeState>>,
}

impl Subscription for FakeSubscription {
    async fn next(&mut self) -> Option<Result<Notification, BusError>> {
        if let Some((delay, notification)) = self.scripted.pop_front() {
            tokio::time::sleep(delay).await;
            return Some(Ok(notification));
        }
        if self.close {
            return None;
        }
        self.live.recv().await.map(Ok)
    }
}

impl Drop for FakeSubscription {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        state.active = state.active.saturating_sub(1);
    }
}

/// A representative slice of the `NickelDBus` interface.
///
/// `mwcToast` and `dlgConfirmCreate` are overloaded by arity the way optional
/// parameters are exported.
#[must_use]
pub fn nickel_interface() -> InterfaceDescriptor {
    InterfaceDescriptor::new(crate::bus::INTERFACE_NAME)
        .with_method(MethodSignature::new(
            "ndbVersion",
            vec![ParameterSpec::output("s")],
        ))
        .with_method(MethodSignature::new(
            "miscSignalConnected",
            vec![
                ParameterSpec::input("s").named("signalName"),
                ParameterSpec::output("b"),
            ],
        ))
        .with_method(MethodSignature::new(
            "mwcToast",
            vec![
                ParameterSpec::input("i").named("toastDuration"),
                ParameterSpec::input("s").named("msgMain"),
                ParameterSpec::input("s").named("msgSub"),
            ],
        ))
        .with_method(MethodSignature::new(
            "mwcToast",
            vec![
                ParameterSpec::input("i").named("toastDuration"),
                ParameterSpec::input("s").named("msgMain"),
            ],
        ))
        .with_method(MethodSignature::new(
            "dlgConfirmCreate",
            vec![ParameterSpec::input("b").named("createLineEdit")],
        ))
        .with_method(MethodSignature::new("dlgConfirmCreate", Vec::new()))
        .with_method(MethodSignature::new("pfmRescanBooks", Vec::new()))
        .with_method(MethodSignature::new(
            "wfmSetAirplaneMode",
            vec![ParameterSpec::input("s").named("action")],
        ))
        .with_signal(SignalSignature::new(
            "dlgConfirmResult",
            vec![ParameterSpec::output("i").named("result")],
        ))
        .with_signal(SignalSignature::new("pfmDoneProcessing", Vec::new()))
        .with_signal(SignalSignature::new("wmNetworkConnected", Vec::new()))
        .with_signal(SignalSignature::new("wmScanningFinished", Vec::new()))
        .with_signal(SignalSignature::new(
            "rvPageChanged",
            vec![ParameterSpec::output("i").named("pageNum")],
        ))
}
