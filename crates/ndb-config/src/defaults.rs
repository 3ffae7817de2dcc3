use crate::bus::BusKind;
use crate::logging::LogFormat;

/// Default log filter expression used by the binaries.
///
/// The CLI shares its stderr with operator-facing diagnostics, so only
/// warnings and errors are emitted unless the operator asks for more.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Default bus the CLI connects to.
#[must_use]
pub const fn default_bus() -> BusKind {
    BusKind::System
}
