//! Scalar bus values and the coercion of operator tokens into them.
//!
//! Only the fixed set of primitive wire types is supported. Each type is
//! identified by its single-character signature tag, so parameter types read
//! from introspection data can be looked up directly.

use std::fmt;
use std::num::{IntErrorKind, ParseFloatError, ParseIntError};
use std::str::FromStr;

use serde::Serialize;
use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Primitive wire types accepted as method arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, IntoStaticStr)]
pub enum WireType {
    /// Unsigned 8-bit integer.
    #[strum(serialize = "y")]
    Byte,
    /// Boolean.
    #[strum(serialize = "b")]
    Boolean,
    /// Signed 16-bit integer.
    #[strum(serialize = "n")]
    Int16,
    /// Unsigned 16-bit integer.
    #[strum(serialize = "q")]
    UInt16,
    /// Signed 32-bit integer.
    #[strum(serialize = "i")]
    Int32,
    /// Unsigned 32-bit integer.
    #[strum(serialize = "u")]
    UInt32,
    /// Signed 64-bit integer.
    #[strum(serialize = "x")]
    Int64,
    /// Unsigned 64-bit integer.
    #[strum(serialize = "t")]
    UInt64,
    /// IEEE 754 double.
    #[strum(serialize = "d")]
    Double,
    /// UTF-8 string.
    #[strum(serialize = "s")]
    Str,
}

impl WireType {
    /// Resolves a signature tag.
    ///
    /// # Errors
    ///
    /// Returns [`CoercionError::UnsupportedType`] for anything outside the
    /// scalar set.
    pub fn from_tag(tag: &str) -> Result<Self, CoercionError> {
        Self::from_str(tag).map_err(|_| CoercionError::UnsupportedType {
            tag: tag.to_owned(),
        })
    }

    /// Signature tag for this type.
    #[must_use]
    pub fn tag(self) -> &'static str {
        self.into()
    }

    /// Parses `token` as a value of this type.
    ///
    /// # Errors
    ///
    /// Returns [`CoercionError::InvalidArgument`] when the token is malformed
    /// or out of range.
    pub fn parse(self, token: &str) -> Result<Value, CoercionError> {
        let invalid = |reason: String| CoercionError::InvalidArgument {
            token: token.to_owned(),
            tag: self.tag(),
            reason,
        };
        let value = match self {
            Self::Byte => Value::Byte(token.parse().map_err(|e| invalid(int_reason(&e)))?),
            Self::Boolean => Value::Bool(parse_bool(token).ok_or_else(|| {
                invalid(String::from("expected one of true/false, t/f or 1/0"))
            })?),
            Self::Int16 => Value::Int16(token.parse().map_err(|e| invalid(int_reason(&e)))?),
            Self::UInt16 => Value::UInt16(token.parse().map_err(|e| invalid(int_reason(&e)))?),
            Self::Int32 => Value::Int32(token.parse().map_err(|e| invalid(int_reason(&e)))?),
            Self::UInt32 => Value::UInt32(token.parse().map_err(|e| invalid(int_reason(&e)))?),
            Self::Int64 => Value::Int64(token.parse().map_err(|e| invalid(int_reason(&e)))?),
            Self::UInt64 => Value::UInt64(token.parse().map_err(|e| invalid(int_reason(&e)))?),
            Self::Double => Value::Double(
                token
                    .parse()
                    .map_err(|e: ParseFloatError| invalid(e.to_string()))?,
            ),
            Self::Str => Value::Str(token.to_owned()),
        };
        Ok(value)
    }
}

/// Converts `token` into a value of the type named by the signature `tag`.
///
/// # Errors
///
/// Returns [`CoercionError::UnsupportedType`] when `tag` is not one of the
/// scalar signature tags, and [`CoercionError::InvalidArgument`] when the
/// token is malformed or outside the type's range.
///
/// # Examples
///
/// ```rust
/// use ndb_engine::{Value, coerce};
///
/// assert_eq!(coerce("y", "255").unwrap(), Value::Byte(255));
/// assert!(coerce("y", "256").is_err());
/// ```
pub fn coerce(tag: &str, token: &str) -> Result<Value, CoercionError> {
    WireType::from_tag(tag)?.parse(token)
}

/// Accepts the canonical boolean spellings.
fn parse_bool(token: &str) -> Option<bool> {
    match token {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn int_reason(error: &ParseIntError) -> String {
    match error.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => String::from("out of range"),
        _ => error.to_string(),
    }
}

/// Failure to turn a token into a typed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    /// The signature tag is not a supported scalar type.
    #[error("unsupported bus type '{tag}'")]
    UnsupportedType {
        /// Offending signature tag.
        tag: String,
    },
    /// The token could not be parsed as the requested type.
    #[error("could not convert argument '{token}' to type {tag}: {reason}")]
    InvalidArgument {
        /// Raw operator token.
        token: String,
        /// Target signature tag.
        tag: &'static str,
        /// Parser diagnostic.
        reason: String,
    },
}

/// A dynamically typed bus value.
///
/// Arguments are always one of the scalar variants. Reply and signal bodies
/// may also carry container or special types, which are kept as their
/// textual rendering in [`Value::Other`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// `y`
    Byte(u8),
    /// `b`
    Bool(bool),
    /// `n`
    Int16(i16),
    /// `q`
    UInt16(u16),
    /// `i`
    Int32(i32),
    /// `u`
    UInt32(u32),
    /// `x`
    Int64(i64),
    /// `t`
    UInt64(u64),
    /// `d`
    Double(f64),
    /// `s`
    Str(String),
    /// Any non-scalar element, rendered as text.
    Other(String),
}

impl fmt::Display for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Byte(value) => write!(formatter, "{value}"),
            Self::Bool(value) => write!(formatter, "{value}"),
            Self::Int16(value) => write!(formatter, "{value}"),
            Self::UInt16(value) => write!(formatter, "{value}"),
            Self::Int32(value) => write!(formatter, "{value}"),
            Self::UInt32(value) => write!(formatter, "{value}"),
            Self::Int64(value) => write!(formatter, "{value}"),
            Self::UInt64(value) => write!(formatter, "{value}"),
            Self::Double(value) => write!(formatter, "{value}"),
            Self::Str(value) | Self::Other(value) => formatter.write_str(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("y", "255")]
    #[case("y", "0")]
    #[case("b", "true")]
    #[case("b", "false")]
    #[case("n", "-32768")]
    #[case("n", "32767")]
    #[case("q", "65535")]
    #[case("i", "-2147483648")]
    #[case("u", "4294967295")]
    #[case("x", "-9223372036854775808")]
    #[case("t", "18446744073709551615")]
    #[case("d", "2.5")]
    #[case("d", "-0.125")]
    fn in_range_values_round_trip_through_display(#[case] tag: &str, #[case] token: &str) {
        let value = coerce(tag, token).expect("token should coerce");
        assert_eq!(value.to_string(), token);
    }

    #[rstest]
    #[case("y", "256")]
    #[case("y", "-1")]
    #[case("n", "32768")]
    #[case("q", "65536")]
    #[case("i", "2147483648")]
    #[case("u", "-1")]
    #[case("x", "9223372036854775808")]
    #[case("t", "18446744073709551616")]
    fn out_of_range_values_are_rejected(#[case] tag: &str, #[case] token: &str) {
        let error = coerce(tag, token).expect_err("token should be rejected");
        match error {
            CoercionError::InvalidArgument {
                token: rejected,
                tag: target,
                ..
            } => {
                assert_eq!(rejected, token);
                assert_eq!(target, tag);
            }
            other @ CoercionError::UnsupportedType { .. } => {
                panic!("expected invalid argument, got {other:?}")
            }
        }
    }

    #[rstest]
    #[case("y", "12a")]
    #[case("i", "")]
    #[case("i", "0x10")]
    #[case("d", "two")]
    #[case("b", "yes")]
    #[case("b", "")]
    fn malformed_tokens_are_invalid_arguments(#[case] tag: &str, #[case] token: &str) {
        let error = coerce(tag, token).expect_err("token should be rejected");
        assert!(
            matches!(error, CoercionError::InvalidArgument { .. }),
            "unexpected error: {error:?}"
        );
        assert!(error.to_string().contains(&format!("'{token}'")));
    }

    #[rstest]
    #[case("")]
    #[case("hello world")]
    #[case("--not-a-flag")]
    #[case("ünïcödé")]
    fn strings_are_passed_through_unchanged(#[case] token: &str) {
        assert_eq!(coerce("s", token), Ok(Value::Str(token.to_owned())));
    }

    #[rstest]
    #[case("h", "3")]
    #[case("as", "anything")]
    #[case("v", "")]
    #[case("", "1")]
    #[case("o", "/nickeldbus")]
    fn unknown_tags_are_unsupported_regardless_of_token(#[case] tag: &str, #[case] token: &str) {
        assert_eq!(
            coerce(tag, token),
            Err(CoercionError::UnsupportedType {
                tag: tag.to_owned()
            })
        );
    }

    #[rstest]
    #[case("1", true)]
    #[case("t", true)]
    #[case("T", true)]
    #[case("TRUE", true)]
    #[case("True", true)]
    #[case("0", false)]
    #[case("f", false)]
    #[case("F", false)]
    #[case("FALSE", false)]
    #[case("False", false)]
    fn boolean_accepts_canonical_spellings(#[case] token: &str, #[case] expected: bool) {
        assert_eq!(coerce("b", token), Ok(Value::Bool(expected)));
    }

    #[test]
    fn out_of_range_reason_is_reported() {
        let error = coerce("q", "65536").expect_err("should overflow");
        assert_eq!(
            error.to_string(),
            "could not convert argument '65536' to type q: out of range"
        );
    }

    #[test]
    fn values_serialise_untagged() {
        let values = vec![
            Value::Byte(7),
            Value::Bool(true),
            Value::Str(String::from("hi")),
            Value::Other(String::from("[1, 2]")),
        ];
        let json = serde_json::to_string(&values).expect("serialise values");
        assert_eq!(json, r#"[7,true,"hi","[1, 2]"]"#);
    }
}
