//! Selection of the message bus the CLI connects to.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Message bus instance hosting the remote object.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BusKind {
    /// The machine-wide system bus.
    #[default]
    System,
    /// The per-login session bus.
    Session,
}


#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("system", BusKind::System)]
    #[case("SESSION", BusKind::Session)]
    #[case("Session", BusKind::Session)]
    fn parses_bus_kind_case_insensitively(#[case] input: &str, #[case] expected: BusKind) {
        let parsed: BusKind = input.parse().expect("bus kind should parse");
        assert_eq!(parsed, expected);
    }

    #[test]
    fn rejects_unknown_bus_kind() {
        let result = "starter".parse::<BusKind>();
        assert!(result.is_err(), "unexpected parse success: {result:?}");
    }

    #[test]
    fn displays_snake_case_names() {
        assert_eq!(BusKind::System.to_string(), "system");
        assert_eq!(BusKind::Session.to_string(), "session");
    }
}
