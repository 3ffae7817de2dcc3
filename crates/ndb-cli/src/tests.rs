//! Runtime tests driving the CLI against an in-memory bus.

use super::*;

use std::ffi::OsString;

use ndb_engine::testing::{FakeBus, RecordedCall, nickel_interface};
use ndb_engine::{BusError, Value};
use rstest::{fixture, rstest};

struct StaticConfigLoader {
    config: Config,
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

struct FakeConnector {
    bus: Option<FakeBus>,
}

impl Connector for FakeConnector {
    type Bus = FakeBus;

    async fn connect(&self, _kind: ndb_config::BusKind) -> Result<FakeBus, BusError> {
        self.bus
            .clone()
            .ok_or_else(|| BusError::new("org.freedesktop.DBus.Error.FileNotFound: no socket"))
    }
}

struct Outcome {
    exit: ExitCode,
    stdout: String,
    stderr: String,
}

fn run_cli(connector: &FakeConnector, command: &str) -> Outcome {
    let args = std::iter::once("ndb-cli")
        .chain(command.split_whitespace())
        .map(OsString::from);
    let loader = StaticConfigLoader {
        config: Config::default(),
    };
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit = run_with(
        args,
        IoStreams::new(&mut stdout, &mut stderr),
        &loader,
        connector,
    );
    Outcome {
        exit,
        stdout: String::from_utf8(stdout).expect("stdout utf8"),
        stderr: String::from_utf8(stderr).expect("stderr utf8"),
    }
}

#[fixture]
fn bus() -> FakeBus {
    FakeBus::new(vec![nickel_interface()])
}

fn connector(bus: &FakeBus) -> FakeConnector {
    FakeConnector {
        bus: Some(bus.clone()),
    }
}

#[rstest]
fn method_reply_is_printed_space_joined(bus: FakeBus) {
    let scripted = bus.with_reply(
        "ndbVersion",
        vec![Value::Str(String::from("0.2.0")), Value::Int32(3)],
    );
    let outcome = run_cli(&connector(&scripted), "method ndbVersion");
    assert_eq!(outcome.exit, ExitCode::SUCCESS, "{}", outcome.stderr);
    assert_eq!(outcome.stdout, "0.2.0 3\n");
}

#[rstest]
fn method_arguments_are_coerced_to_declared_types(bus: FakeBus) {
    let outcome = run_cli(&connector(&bus), "method mwcToast 3000 hello");
    assert_eq!(outcome.exit, ExitCode::SUCCESS, "{}", outcome.stderr);
    assert_eq!(outcome.stdout, "");
    assert_eq!(
        bus.calls(),
        vec![RecordedCall {
            method: String::from("mwcToast"),
            arguments: vec![Value::Int32(3000), Value::Str(String::from("hello"))],
        }]
    );
}

#[rstest]
fn negative_numbers_are_arguments_not_flags(bus: FakeBus) {
    let outcome = run_cli(&connector(&bus), "method mwcToast -1 hello world");
    assert_eq!(outcome.exit, ExitCode::SUCCESS, "{}", outcome.stderr);
    let call = bus.calls().pop().expect("one call");
    assert_eq!(call.arguments.first(), Some(&Value::Int32(-1)));
    assert_eq!(call.arguments.len(), 3);
}

#[rstest]
fn method_waits_for_signal_it_triggers(bus: FakeBus) {
    let scripted = bus.emitting_on_call("dlgConfirmCreate", "dlgConfirmResult", vec![Value::Int32(1)]);
    let outcome = run_cli(
        &connector(&scripted),
        "method dlgConfirmCreate true --signal dlgConfirmResult --signal-timeout 5",
    );
    assert_eq!(outcome.exit, ExitCode::SUCCESS, "{}", outcome.stderr);
    assert_eq!(outcome.stdout, "dlgConfirmResult 1\n");
    assert_eq!(scripted.active_subscriptions(), 0);
}

#[rstest]
fn json_output_emits_reply_array(bus: FakeBus) {
    let scripted = bus.with_reply("miscSignalConnected", vec![Value::Bool(true)]);
    let outcome = run_cli(
        &connector(&scripted),
        "--output json method miscSignalConnected wmNetworkConnected",
    );
    assert_eq!(outcome.exit, ExitCode::SUCCESS, "{}", outcome.stderr);
    assert_eq!(outcome.stdout, "[true]\n");
}

#[rstest]
fn signal_prints_first_requested_signal(bus: FakeBus) {
    let scripted = bus
        .with_notification(std::time::Duration::ZERO, "rvPageChanged", vec![Value::Int32(4)])
        .with_notification(std::time::Duration::ZERO, "pfmDoneProcessing", Vec::new());
    let outcome = run_cli(
        &connector(&scripted),
        "signal wmNetworkConnected pfmDoneProcessing",
    );
    assert_eq!(outcome.exit, ExitCode::SUCCESS, "{}", outcome.stderr);
    assert_eq!(outcome.stdout, "pfmDoneProcessing\n");
}

#[rstest]
fn signal_json_output_is_an_object(bus: FakeBus) {
    let scripted = bus.with_notification(
        std::time::Duration::ZERO,
        "com.github.shermp.nickeldbus.rvPageChanged",
        vec![Value::Int32(12)],
    );
    let outcome = run_cli(&connector(&scripted), "signal rvPageChanged --output json");
    assert_eq!(outcome.exit, ExitCode::SUCCESS, "{}", outcome.stderr);
    assert_eq!(
        outcome.stdout,
        "{\"signal\":\"rvPageChanged\",\"values\":[12]}\n"
    );
}

#[rstest]
#[case("signal noSuchSignal", "signal 'noSuchSignal' not found")]
#[case(
    "method mwcToast soon hello",
    "could not convert argument 'soon' to type i"
)]
#[case(
    "method mwcToast 1 2 3 4",
    "method 'mwcToast' taking 4 argument(s) not found"
)]
#[case("method ndbVersion --signal nope", "signal 'nope' not found")]
fn engine_failures_are_reported_on_stderr(
    bus: FakeBus,
    #[case] command: &str,
    #[case] message: &str,
) {
    let outcome = run_cli(&connector(&bus), command);
    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(
        outcome.stderr.contains(message),
        "stderr {:?} did not contain {message:?}",
        outcome.stderr
    );
    assert!(bus.calls().is_empty());
}

#[rstest]
fn reply_is_printed_before_wait_failure(bus: FakeBus) {
    let scripted = bus
        .with_reply("ndbVersion", vec![Value::Str(String::from("0.2.0"))])
        .closing_subscriptions();
    let outcome = run_cli(
        &connector(&scripted),
        "method ndbVersion --signal pfmDoneProcessing",
    );
    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert_eq!(outcome.stdout, "0.2.0\n");
    assert_eq!(
        outcome.stderr,
        "error waiting for signal after method call: signal subscription failed: notification stream closed\n"
    );
}

#[rstest]
fn remote_error_names_the_method(bus: FakeBus) {
    let scripted = bus.with_call_error("pfmRescanBooks", "org.freedesktop.DBus.Error.Failed: busy");
    let outcome = run_cli(&connector(&scripted), "method pfmRescanBooks");
    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert_eq!(
        outcome.stderr,
        "error calling pfmRescanBooks: org.freedesktop.DBus.Error.Failed: busy\n"
    );
}

#[rstest]
fn api_lists_methods_and_signals(bus: FakeBus) {
    let outcome = run_cli(&connector(&bus), "api");
    assert_eq!(outcome.exit, ExitCode::SUCCESS, "{}", outcome.stderr);
    assert!(outcome.stdout.contains("    mwcToast <i> toastDuration, <s> msgMain\n"));
    assert!(outcome.stdout.contains("    rvPageChanged <i> pageNum\n"));
    assert!(bus.calls().is_empty());
}

#[test]
fn missing_interface_is_reported() {
    let bus = FakeBus::new(Vec::new());
    let outcome = run_cli(&connector(&bus), "api");
    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert_eq!(
        outcome.stderr,
        "com.github.shermp.nickeldbus not in list of available interfaces\n"
    );
}

#[test]
fn unreachable_bus_is_a_connection_error() {
    let outcome = run_cli(&FakeConnector { bus: None }, "api");
    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(
        outcome.stderr.starts_with("failed to reach the bus: "),
        "{}",
        outcome.stderr
    );
}

#[test]
fn help_goes_to_stdout() {
    let outcome = run_cli(&FakeConnector { bus: None }, "--help");
    assert_eq!(outcome.exit, ExitCode::SUCCESS);
    assert!(outcome.stdout.contains("Usage:"), "{}", outcome.stdout);
    assert!(outcome.stderr.is_empty());
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    let outcome = run_cli(&FakeConnector { bus: None }, "");
    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(outcome.stdout.is_empty());
    assert!(outcome.stderr.contains("Usage:"), "{}", outcome.stderr);
}
