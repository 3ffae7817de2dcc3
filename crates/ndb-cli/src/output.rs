//! Rendering of call replies, signal outcomes and the interface listing.

use std::io::Write;

use clap::ValueEnum;
use ndb_engine::{InterfaceDescriptor, ParameterSpec, Value, WaitOutcome};
use serde::Serialize;

use crate::AppError;

/// Output format selection for command results.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Space-separated values, one result per line.
    #[default]
    Human,
    /// One JSON document per result.
    Json,
}

/// Writes a method reply. Human output prints nothing for an empty reply.
pub(crate) fn write_reply<W: Write>(
    out: &mut W,
    format: OutputFormat,
    reply: &[Value],
) -> Result<(), AppError> {
    match format {
        OutputFormat::Human if reply.is_empty() => Ok(()),
        OutputFormat::Human => writeln!(out, "{}", join_values(reply)).map_err(AppError::WriteOutput),
        OutputFormat::Json => write_json(out, reply),
    }
}

/// Writes the signal that ended a wait, followed by its values.
pub(crate) fn write_outcome<W: Write>(
    out: &mut W,
    format: OutputFormat,
    outcome: &WaitOutcome,
) -> Result<(), AppError> {
    match format {
        OutputFormat::Human if outcome.values.is_empty() => {
            writeln!(out, "{}", outcome.signal).map_err(AppError::WriteOutput)
        }
        OutputFormat::Human => writeln!(out, "{} {}", outcome.signal, join_values(&outcome.values))
            .map_err(AppError::WriteOutput),
        OutputFormat::Json => write_json(out, outcome),
    }
}

/// Writes the callable methods (input parameters only) and the signals that
/// can be waited for.
pub(crate) fn write_api<W: Write>(
    out: &mut W,
    format: OutputFormat,
    descriptor: &InterfaceDescriptor,
) -> Result<(), AppError> {
    if format == OutputFormat::Json {
        return write_json(out, descriptor);
    }
    let mut text = String::from("The following methods and their arguments can be called:\n");
    for method in &descriptor.methods {
        push_member(&mut text, &method.name, method.inputs());
    }
    text.push_str("\nThe following signals and their 'return' value can be waited for:\n");
    for signal in &descriptor.signals {
        push_member(&mut text, &signal.name, signal.parameters.iter());
    }
    out.write_all(text.as_bytes()).map_err(AppError::WriteOutput)
}

fn push_member<'a>(
    text: &mut String,
    name: &str,
    parameters: impl Iterator<Item = &'a ParameterSpec>,
) {
    let rendered: Vec<String> = parameters
        .map(|parameter| {
            parameter.name.as_ref().map_or_else(
                || format!("<{}>", parameter.type_tag),
                |param_name| format!("<{}> {param_name}", parameter.type_tag),
            )
        })
        .collect();
    text.push_str("    ");
    text.push_str(name);
    if !rendered.is_empty() {
        text.push(' ');
        text.push_str(&rendered.join(", "));
    }
    text.push('\n');
}

fn join_values(values: &[Value]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<(), AppError> {
    serde_json::to_writer(&mut *out, value).map_err(AppError::SerialiseOutput)?;
    out.write_all(b"\n").map_err(AppError::WriteOutput)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndb_engine::testing::nickel_interface;
    use rstest::rstest;

    fn render<F>(write: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> Result<(), AppError>,
    {
        let mut buffer = Vec::new();
        write(&mut buffer).expect("rendering should succeed");
        String::from_utf8(buffer).expect("output utf8")
    }

    #[rstest]
    #[case(OutputFormat::Human, vec![], "")]
    #[case(OutputFormat::Human, vec![Value::Bool(true), Value::Int32(-4)], "true -4\n")]
    #[case(OutputFormat::Json, vec![], "[]\n")]
    #[case(
        OutputFormat::Json,
        vec![Value::Str(String::from("0.2.0")), Value::UInt16(7)],
        "[\"0.2.0\",7]\n"
    )]
    fn renders_replies(
        #[case] format: OutputFormat,
        #[case] reply: Vec<Value>,
        #[case] expected: &str,
    ) {
        assert_eq!(render(|out| write_reply(out, format, &reply)), expected);
    }

    #[rstest]
    #[case(OutputFormat::Human, vec![], "pfmDoneProcessing\n")]
    #[case(OutputFormat::Human, vec![Value::Int32(12)], "pfmDoneProcessing 12\n")]
    #[case(
        OutputFormat::Json,
        vec![Value::Int32(12)],
        "{\"signal\":\"pfmDoneProcessing\",\"values\":[12]}\n"
    )]
    fn renders_outcomes(
        #[case] format: OutputFormat,
        #[case] values: Vec<Value>,
        #[case] expected: &str,
    ) {
        let outcome = WaitOutcome {
            signal: String::from("pfmDoneProcessing"),
            values,
        };
        assert_eq!(render(|out| write_outcome(out, format, &outcome)), expected);
    }

    #[test]
    fn api_listing_shows_inputs_and_signal_values() {
        let text = render(|out| write_api(out, OutputFormat::Human, &nickel_interface()));
        assert!(text.starts_with("The following methods and their arguments can be called:\n"));
        assert!(text.contains("\n    mwcToast <i> toastDuration, <s> msgMain\n"));
        assert!(text.contains("\n    miscSignalConnected <s> signalName\n"));
        assert!(text.contains("\n    pfmRescanBooks\n"));
        assert!(text.contains("\n    dlgConfirmResult <i> result\n"));
        assert!(!text.contains("ndbVersion <"));
    }

    #[test]
    fn api_listing_as_json_is_the_descriptor() {
        let text = render(|out| write_api(out, OutputFormat::Json, &nickel_interface()));
        let json: serde_json::Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(
            json.get("name").and_then(serde_json::Value::as_str),
            Some("com.github.shermp.nickeldbus")
        );
    }
}
