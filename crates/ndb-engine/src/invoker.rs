//! Method resolution and invocation.
//!
//! Overloads are told apart only by how many input parameters they declare.
//! Selection walks same-named methods in introspection order and returns the
//! first one whose arity matches and whose parameters accept every token.

use tracing::debug;

use crate::bus::{Bus, Target};
use crate::descriptor::{InterfaceDescriptor, MethodSignature};
use crate::error::EngineError;
use crate::value::{CoercionError, Value, coerce};

/// A method chosen for invocation together with its coerced arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedCall<'a> {
    /// Selected overload.
    pub method: &'a MethodSignature,
    /// Arguments coerced to the overload's input types.
    pub arguments: Vec<Value>,
}

/// Picks the overload of `name` matching `raw_args` and coerces the tokens.
///
/// Candidates sharing a name and arity are tried in introspection order; the
/// first fully coercible one wins.
///
/// # Errors
///
/// - [`EngineError::MethodNotFound`] when no method has this name and arity.
/// - [`EngineError::InvalidArguments`] when every arity match rejected a
///   token.
/// - [`EngineError::UnsupportedType`] when every arity match was rejected
///   for declaring a type that cannot be coerced.
pub fn prepare<'a, S: AsRef<str>>(
    descriptor: &'a InterfaceDescriptor,
    name: &str,
    raw_args: &[S],
) -> Result<PreparedCall<'a>, EngineError> {
    let mut failures = Vec::new();
    let candidates = descriptor
        .methods_named(name)
        .filter(|method| method.arity() == raw_args.len());
    for (index, method) in candidates.enumerate() {
        if index > 0 {
            debug!(method = name, arity = raw_args.len(), "trying overload sharing name and arity");
        }
        match coerce_arguments(method, raw_args) {
            Ok(arguments) => return Ok(PreparedCall { method, arguments }),
            Err(rejected) => {
                debug!(method = name, rejected = rejected.len(), "rejecting candidate");
                failures.extend(rejected);
            }
        }
    }
    Err(rejection(name, raw_args.len(), failures))
}

/// Coerces every token, collecting all failures rather than the first.
fn coerce_arguments<S: AsRef<str>>(
    method: &MethodSignature,
    raw_args: &[S],
) -> Result<Vec<Value>, Vec<CoercionError>> {
    let mut failures = Vec::new();
    let values: Vec<Value> = method
        .inputs()
        .zip(raw_args)
        .filter_map(|(parameter, token)| {
            coerce(&parameter.type_tag, token.as_ref())
                .map_err(|failure| failures.push(failure))
                .ok()
        })
        .collect();
    if failures.is_empty() {
        Ok(values)
    } else {
        Err(failures)
    }
}

fn rejection(name: &str, arity: usize, failures: Vec<CoercionError>) -> EngineError {
    if failures.is_empty() {
        return EngineError::MethodNotFound {
            method: name.to_owned(),
            arity,
        };
    }
    let unsupported = failures.iter().find_map(|failure| match failure {
        CoercionError::UnsupportedType { tag } => Some(tag.clone()),
        CoercionError::InvalidArgument { .. } => None,
    });
    let all_unsupported = failures
        .iter()
        .all(|failure| matches!(failure, CoercionError::UnsupportedType { .. }));
    match unsupported {
        Some(tag) if all_unsupported => EngineError::UnsupportedType {
            method: name.to_owned(),
            tag,
        },
        _ => EngineError::InvalidArguments {
            method: name.to_owned(),
            failures,
        },
    }
}

/// Resolves `name` against the descriptor and calls it on the bus.
///
/// Nothing is sent unless a candidate accepted every argument.
///
/// # Errors
///
/// Resolution errors from [`prepare`], or [`EngineError::RemoteCallFailed`]
/// when the remote method reports an error.
pub async fn invoke<B: Bus, S: AsRef<str>>(
    bus: &B,
    target: &Target,
    descriptor: &InterfaceDescriptor,
    name: &str,
    raw_args: &[S],
) -> Result<Vec<Value>, EngineError> {
    let prepared = prepare(descriptor, name, raw_args)?;
    call(bus, target, prepared).await
}

/// Issues a prepared call.
///
/// # Errors
///
/// Returns [`EngineError::RemoteCallFailed`] when the bus reports an error.
pub async fn call<B: Bus>(
    bus: &B,
    target: &Target,
    prepared: PreparedCall<'_>,
) -> Result<Vec<Value>, EngineError> {
    let method = prepared.method.name.as_str();
    debug!(method, arguments = prepared.arguments.len(), "calling remote method");
    bus.call(target, method, &prepared.arguments)
        .await
        .map_err(|source| EngineError::RemoteCallFailed {
            method: method.to_owned(),
            source,
        })
}
