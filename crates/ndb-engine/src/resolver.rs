//! Locating the interface of interest in the target's introspection data.

use tracing::info;

use crate::bus::{Bus, Target};
use crate::descriptor::InterfaceDescriptor;
use crate::error::EngineError;

/// Introspects the target object and returns the descriptor of
/// `target.interface`.
///
/// # Errors
///
/// Returns [`EngineError::Connection`] when the introspection query fails and
/// [`EngineError::InterfaceNotFound`] when the interface is not published.
pub async fn resolve<B: Bus>(bus: &B, target: &Target) -> Result<InterfaceDescriptor, EngineError> {
    let interfaces = bus
        .introspect(target)
        .await
        .map_err(|source| EngineError::Connection { source })?;
    let descriptor = find_interface(interfaces, &target.interface)?;
    info!(
        interface = %descriptor.name,
        methods = descriptor.methods.len(),
        signals = descriptor.signals.len(),
        "resolved interface"
    );
    Ok(descriptor)
}

/// Picks the interface named exactly `name`.
///
/// # Errors
///
/// Returns [`EngineError::InterfaceNotFound`] when no interface matches.
pub fn find_interface(
    interfaces: Vec<InterfaceDescriptor>,
    name: &str,
) -> Result<InterfaceDescriptor, EngineError> {
    interfaces
        .into_iter()
        .find(|interface| interface.name == name)
        .ok_or_else(|| EngineError::InterfaceNotFound {
            interface: name.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeBus, nickel_interface};

    fn standard_interfaces() -> Vec<InterfaceDescriptor> {
        vec![
            InterfaceDescriptor::new("org.freedesktop.DBus.Introspectable"),
            InterfaceDescriptor::new("org.freedesktop.DBus.Properties"),
            nickel_interface(),
        ]
    }

    #[tokio::test]
    async fn finds_configured_interface_among_many() {
        let bus = FakeBus::new(standard_interfaces());
        let descriptor = resolve(&bus, &Target::default())
            .await
            .expect("interface should resolve");
        assert_eq!(descriptor, nickel_interface());
        assert_eq!(bus.introspection_count(), 1);
    }

    #[tokio::test]
    async fn missing_interface_is_reported_by_name() {
        let bus = FakeBus::new(vec![InterfaceDescriptor::new(
            "org.freedesktop.DBus.Introspectable",
        )]);
        let error = resolve(&bus, &Target::default())
            .await
            .expect_err("interface is absent");
        assert_eq!(
            error.to_string(),
            "com.github.shermp.nickeldbus not in list of available interfaces"
        );
    }

    #[tokio::test]
    async fn introspection_failure_is_a_connection_error() {
        let bus = FakeBus::new(standard_interfaces())
            .failing_introspection("org.freedesktop.DBus.Error.ServiceUnknown");
        let error = resolve(&bus, &Target::default())
            .await
            .expect_err("introspection fails");
        assert!(matches!(error, EngineError::Connection { .. }), "{error:?}");
        assert_eq!(bus.introspection_count(), 1);
    }

    #[test]
    fn match_must_be_exact() {
        let interfaces = vec![InterfaceDescriptor::new("com.github.shermp.nickeldbus.extra")];
        let error = find_interface(interfaces, "com.github.shermp.nickeldbus")
            .expect_err("prefix is not a match");
        assert!(matches!(error, EngineError::InterfaceNotFound { .. }));
    }
}
